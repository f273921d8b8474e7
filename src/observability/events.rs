//! Observable events
//!
//! Events are explicit and typed. Their string forms are what appears in the
//! `event` key of a log line.

use std::fmt;

/// Observable events in prefledger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Session configuration loaded
    ConfigLoaded,

    // Decision context lifecycle
    /// Decision context registered with a handler
    ContextRegistered,
    /// Decision context unregistered from a handler
    ContextUnregistered,

    // Ledger
    /// Ledger replaced by a reintroduction result
    HistoryReplaced,

    // Consistency reintroduction
    /// One shrink-phase probe
    ShrinkProbe,
    /// One recover-phase probe
    RecoverProbe,
    /// Recovery candidate re-admitted
    CandidateAccepted,
    /// Recovery candidate discarded permanently
    CandidateRejected,
    /// Constructor broke the empty-sequence guarantee (FATAL)
    ContractViolation,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",

            Event::ContextRegistered => "CONTEXT_REGISTERED",
            Event::ContextUnregistered => "CONTEXT_UNREGISTERED",

            Event::HistoryReplaced => "HISTORY_REPLACED",

            Event::ShrinkProbe => "SHRINK_PROBE",
            Event::RecoverProbe => "RECOVER_PROBE",
            Event::CandidateAccepted => "CANDIDATE_ACCEPTED",
            Event::CandidateRejected => "CANDIDATE_REJECTED",
            Event::ContractViolation => "CONSTRUCTOR_CONTRACT_VIOLATION",
        }
    }

    /// Returns true if this event indicates a fatal condition
    pub fn is_fatal(&self) -> bool {
        matches!(self, Event::ContractViolation)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        assert_eq!(Event::HistoryReplaced.as_str(), "HISTORY_REPLACED");
        assert_eq!(Event::ShrinkProbe.to_string(), "SHRINK_PROBE");
    }

    #[test]
    fn test_only_contract_violation_is_fatal() {
        assert!(Event::ContractViolation.is_fatal());
        assert!(!Event::CandidateAccepted.is_fatal());
        assert!(!Event::CandidateRejected.is_fatal());
    }
}
