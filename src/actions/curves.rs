//! Response curves
//!
//! Scores come from smooth curves instead of hard thresholds. Traits move
//! the midpoint; the shape stays the same.

/// Logistic ramp: ~0 well below `midpoint`, 0.5 at it, ~1 well above
pub fn ramp_up(value: f32, midpoint: f32, steepness: f32) -> f32 {
    let s = 1.0 / (1.0 + (-steepness * (value - midpoint)).exp());
    s.clamp(0.0, 1.0)
}

/// Mirror of [`ramp_up`]: ~1 well below `midpoint`, ~0 well above
pub fn ramp_down(value: f32, midpoint: f32, steepness: f32) -> f32 {
    1.0 - ramp_up(value, midpoint, steepness)
}

/// 0 at or below `floor`, 1 at or above `ceiling`, linear between
pub fn linear(value: f32, floor: f32, ceiling: f32) -> f32 {
    if ceiling <= floor {
        return if value >= ceiling { 1.0 } else { 0.0 };
    }
    ((value - floor) / (ceiling - floor)).clamp(0.0, 1.0)
}
