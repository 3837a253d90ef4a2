//! Adapter connection status state machine.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::StateMachine;

/// Connection status of one upstream adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AdapterStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    /// Reachable but failing: authentication rejected or polls erroring.
    Degraded,
}

impl AdapterStatus {
    /// Returns true while the adapter is delivering messages.
    pub fn is_live(&self) -> bool {
        matches!(self, AdapterStatus::Connected)
    }
}

impl StateMachine for AdapterStatus {
    const MACHINE: &'static str = "adapter status";

    fn can_transition_to(&self, target: &Self) -> bool {
        use AdapterStatus::*;
        matches!(
            (self, target),
            (Disconnected, Connecting)
                | (Connecting, Connected)
                | (Connecting, Degraded)
                | (Connecting, Disconnected)
                | (Connected, Degraded)
                | (Connected, Disconnected)
                | (Degraded, Connected)
                | (Degraded, Connecting)
                | (Degraded, Disconnected)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use AdapterStatus::*;
        match self {
            Disconnected => vec![Connecting],
            Connecting => vec![Connected, Degraded, Disconnected],
            Connected => vec![Degraded, Disconnected],
            Degraded => vec![Connected, Connecting, Disconnected],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [AdapterStatus; 4] = [
        AdapterStatus::Disconnected,
        AdapterStatus::Connecting,
        AdapterStatus::Connected,
        AdapterStatus::Degraded,
    ];

    #[test]
    fn default_is_disconnected() {
        assert_eq!(AdapterStatus::default(), AdapterStatus::Disconnected);
    }

    #[test]
    fn disconnected_must_pass_through_connecting() {
        assert!(AdapterStatus::Disconnected
            .transition_to(AdapterStatus::Connected)
            .is_err());
        assert_eq!(
            AdapterStatus::Disconnected.transition_to(AdapterStatus::Connecting),
            Ok(AdapterStatus::Connecting)
        );
    }

    #[test]
    fn degraded_adapter_can_retry() {
        assert!(AdapterStatus::Degraded.can_transition_to(&AdapterStatus::Connecting));
    }

    #[test]
    fn no_status_is_terminal() {
        for status in ALL {
            assert!(!status.is_terminal(), "{:?} should not be terminal", status);
        }
    }

    #[test]
    fn can_transition_to_is_consistent_with_valid_transitions() {
        for from in ALL {
            for to in ALL {
                assert_eq!(
                    from.can_transition_to(&to),
                    from.valid_transitions().contains(&to),
                    "{:?} -> {:?}",
                    from,
                    to
                );
            }
        }
    }

    #[test]
    fn only_connected_is_live() {
        assert!(AdapterStatus::Connected.is_live());
        assert!(!AdapterStatus::Degraded.is_live());
    }

    #[test]
    fn serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&AdapterStatus::Degraded).unwrap(),
            "\"degraded\""
        );
    }
}
