//! Observability subsystem
//!
//! - Structured logging (one JSON object per line)
//! - Monotonic counters
//! - Begin/complete scopes and timers
//!
//! # Principles
//!
//! 1. Observability is read-only: it never changes what the handler decides
//! 2. Synchronous, no background threads
//! 3. Deterministic output layout
//!
//! # Usage
//!
//! ```ignore
//! use prefledger::observability::{log_event_with_fields, Event, ObservationScope};
//!
//! log_event_with_fields(Event::ShrinkProbe, &[("attempt", "1")]);
//!
//! let scope = ObservationScope::new("ITERATION");
//! // ... do work ...
//! scope.complete();
//! ```

mod events;
mod logger;
mod metrics;
mod scope;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};
pub use scope::{ObservationScope, Timer};

/// Log a lifecycle event
pub fn log_event(event: Event) {
    log_event_with_fields(event, &[]);
}

/// Log a lifecycle event with fields.
///
/// Fatal events log at FATAL; every other event at INFO.
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    let severity = if event.is_fatal() {
        Severity::Fatal
    } else {
        Severity::Info
    };
    Logger::log(severity, event.as_str(), fields);
}

/// Log a per-probe event at TRACE
pub fn trace_event(event: Event, fields: &[(&str, &str)]) {
    Logger::trace(event.as_str(), fields);
}
