//! The per-tick pipeline: selection, crisis detection, event log and the tick loop

pub mod action_select;
pub mod crisis;
pub mod events;
pub mod tick;

pub use action_select::{select_action, select_and_execute, Selection};
pub use crisis::{detect, CrisisKind, CrisisSituation, Tier};
pub use events::{EventLog, EventSink, LogEvent, Severity};
pub use tick::{run_tick, Colony, TickSummary};
