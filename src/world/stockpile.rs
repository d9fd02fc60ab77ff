//! Stockpile - the colony's shared store of food and stone

use serde::{Deserialize, Serialize};

use crate::entity::agent::ResourceKind;

const DEFAULT_CAPACITY: u32 = 200;

/// Shared resources, touched only inside the synchronous tick phase
///
/// Each kind has its own cap; deposits beyond it are refused rather than
/// lost, so the depositor keeps the remainder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stockpile {
    counts: [u32; 2],
    caps: [u32; 2],
}

impl Default for Stockpile {
    fn default() -> Self {
        Self {
            counts: [0; 2],
            caps: [DEFAULT_CAPACITY; 2],
        }
    }
}

impl Stockpile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Change the cap for one kind; anything above it is discarded
    pub fn set_capacity(&mut self, kind: ResourceKind, capacity: u32) {
        let slot = kind.slot();
        self.caps[slot] = capacity;
        self.counts[slot] = self.counts[slot].min(capacity);
    }

    pub fn get(&self, kind: ResourceKind) -> u32 {
        self.counts[kind.slot()]
    }

    pub fn capacity(&self, kind: ResourceKind) -> u32 {
        self.caps[kind.slot()]
    }

    /// Room left for `kind`
    pub fn space(&self, kind: ResourceKind) -> u32 {
        self.capacity(kind).saturating_sub(self.get(kind))
    }

    /// Store up to `amount`, returns how much was accepted
    pub fn add(&mut self, kind: ResourceKind, amount: u32) -> u32 {
        let accepted = amount.min(self.space(kind));
        self.counts[kind.slot()] += accepted;
        accepted
    }

    /// Take up to `amount`, returns how much was handed out
    pub fn remove(&mut self, kind: ResourceKind, amount: u32) -> u32 {
        let slot = kind.slot();
        let taken = amount.min(self.counts[slot]);
        self.counts[slot] -= taken;
        taken
    }

    /// Take exactly `amount` or nothing
    pub fn consume(&mut self, kind: ResourceKind, amount: u32) -> bool {
        if self.get(kind) < amount {
            return false;
        }
        self.counts[kind.slot()] -= amount;
        true
    }
}
