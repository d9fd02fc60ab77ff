//! Log events emitted by the core
//!
//! The sink is write-only from the core's point of view. [`EventLog`]
//! buffers events for the caller and mirrors each one to `tracing`.

use crate::core::types::{AgentId, Tick};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Debug,
    Info,
    Warn,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogEvent {
    pub tick: Tick,
    pub subject: Option<AgentId>,
    pub message: String,
    pub severity: Severity,
}

impl LogEvent {
    pub fn new(tick: Tick, subject: Option<AgentId>, message: impl Into<String>, severity: Severity) -> Self {
        Self {
            tick,
            subject,
            message: message.into(),
            severity,
        }
    }
}

pub trait EventSink {
    fn emit(&mut self, event: LogEvent);

    fn info(&mut self, tick: Tick, subject: AgentId, message: String) {
        self.emit(LogEvent::new(tick, Some(subject), message, Severity::Info));
    }

    fn warn(&mut self, tick: Tick, subject: Option<AgentId>, message: String) {
        self.emit(LogEvent::new(tick, subject, message, Severity::Warn));
    }

    fn debug(&mut self, tick: Tick, subject: AgentId, message: String) {
        self.emit(LogEvent::new(tick, Some(subject), message, Severity::Debug));
    }
}

/// Buffering sink
#[derive(Debug, Default)]
pub struct EventLog {
    events: Vec<LogEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[LogEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Hand buffered events to the caller
    pub fn drain(&mut self) -> Vec<LogEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.events.iter().any(|e| e.message.contains(needle))
    }
}

impl EventSink for EventLog {
    fn emit(&mut self, event: LogEvent) {
        let subject = event.subject.map(|s| s.short()).unwrap_or_default();
        match event.severity {
            Severity::Debug => tracing::debug!(tick = event.tick, %subject, "{}", event.message),
            Severity::Info => tracing::info!(tick = event.tick, %subject, "{}", event.message),
            Severity::Warn => tracing::warn!(tick = event.tick, %subject, "{}", event.message),
        }
        self.events.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_buffers_and_drains() {
        let mut log = EventLog::new();
        let id = AgentId::new();
        log.info(3, id, "ate berries".into());
        log.warn(3, None, "provider timed out".into());

        assert_eq!(log.len(), 2);
        assert!(log.contains("berries"));
        let drained = log.drain();
        assert_eq!(drained[1].severity, Severity::Warn);
        assert!(log.is_empty());
    }
}
