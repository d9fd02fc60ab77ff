//! Ember Colony - decision core for a tick-based colony survival simulation
//!
//! Agents pick one action per tick from a utility-scored catalog. Rare
//! dilemmas are escalated to a completion provider whose answer biases the
//! scorer for a while and is checked against what actually happened.

pub mod actions;
pub mod core;
pub mod entity;
pub mod llm;
pub mod simulation;
pub mod world;
