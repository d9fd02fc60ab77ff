use serde::{Deserialize, Serialize};

use crate::core::types::Tick;
use crate::simulation::crisis::CrisisKind;

/// One escalated crisis and what the agent chose to do about it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub tick: Tick,
    pub crisis: CrisisKind,
    /// The decided action, as the provider phrased it
    pub action: String,
    /// Filled in later only when the decision did not work out
    pub outcome: Option<String>,
}

impl MemoryEntry {
    pub fn new(tick: Tick, crisis: CrisisKind, action: impl Into<String>) -> Self {
        Self {
            tick,
            crisis,
            action: action.into(),
            outcome: None,
        }
    }
}

/// Append-only, ordered history of an agent's escalated decisions
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryLog {
    entries: Vec<MemoryEntry>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry, returns its index
    pub fn append(&mut self, entry: MemoryEntry) -> usize {
        self.entries.push(entry);
        self.entries.len() - 1
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&MemoryEntry> {
        self.entries.get(index)
    }

    pub fn entries(&self) -> &[MemoryEntry] {
        &self.entries
    }

    /// Up to `n` most recent entries, oldest first
    pub fn recent(&self, n: usize) -> &[MemoryEntry] {
        let start = self.entries.len().saturating_sub(n);
        &self.entries[start..]
    }

    /// Write an outcome onto an entry that has none yet
    ///
    /// Returns false if the index is unknown or the entry was already
    /// backfilled.
    pub fn backfill(&mut self, index: usize, outcome: impl Into<String>) -> bool {
        match self.entries.get_mut(index) {
            Some(entry) if entry.outcome.is_none() => {
                entry.outcome = Some(outcome.into());
                true
            }
            _ => false,
        }
    }

    /// Copy another log's entries after this one's
    ///
    /// Existing indices stay put, so pending backfills still land on the
    /// entry they were taken for.
    pub fn extend_from(&mut self, other: &MemoryLog) {
        self.entries.extend(other.entries.iter().cloned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recent_returns_tail_in_order() {
        let mut log = MemoryLog::new();
        for t in 0..8 {
            log.append(MemoryEntry::new(t, CrisisKind::HighHunger, format!("act {}", t)));
        }
        let recent = log.recent(5);
        assert_eq!(recent.len(), 5);
        assert_eq!(recent[0].tick, 3);
        assert_eq!(recent[4].tick, 7);
        assert_eq!(log.recent(100).len(), 8);
    }

    #[test]
    fn test_backfill_only_once() {
        let mut log = MemoryLog::new();
        let idx = log.append(MemoryEntry::new(5, CrisisKind::LowMorale, "talk to Bo"));
        assert!(log.backfill(idx, "it did not help"));
        assert!(!log.backfill(idx, "second write"));
        assert_eq!(log.get(idx).unwrap().outcome.as_deref(), Some("it did not help"));
        assert!(!log.backfill(99, "missing"));
    }

    #[test]
    fn test_extend_from_appends_after_own_entries() {
        let mut old = MemoryLog::new();
        old.append(MemoryEntry::new(1, CrisisKind::ImminentThreat, "hold the gate"));
        let mut heir = MemoryLog::new();
        heir.append(MemoryEntry::new(9, CrisisKind::HighHunger, "eat"));

        heir.extend_from(&old);
        assert_eq!(heir.len(), 2);
        assert_eq!(heir.entries()[0].tick, 9);
        assert_eq!(heir.entries()[1].tick, 1);
    }

    #[test]
    fn test_backfill_after_extend_hits_original_entry() {
        let mut log = MemoryLog::new();
        let idx = log.append(MemoryEntry::new(3, CrisisKind::ImminentThreat, "fight"));
        let mut old = MemoryLog::new();
        old.append(MemoryEntry::new(1, CrisisKind::HighHunger, "old"));

        log.extend_from(&old);
        assert!(log.backfill(idx, "missed"));

        assert_eq!(log.get(idx).unwrap().action, "fight");
        assert_eq!(log.get(idx).unwrap().outcome.as_deref(), Some("missed"));
        assert_eq!(log.get(1).unwrap().action, "old");
        assert!(log.get(1).unwrap().outcome.is_none());
    }
}
