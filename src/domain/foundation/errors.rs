//! Domain-level validation failures.

use thiserror::Error;

/// Rejected identifiers, names and lifecycle moves.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("adapter id '{id}' rejected: {reason}")]
    InvalidAdapterId { id: String, reason: &'static str },

    #[error("unknown subscription type '{0}'")]
    UnknownSubscriptionType(String),

    #[error("{machine}: {from} cannot move to {to}")]
    IllegalTransition {
        machine: &'static str,
        from: String,
        to: String,
    },
}

impl ValidationError {
    pub fn adapter_id(id: impl Into<String>, reason: &'static str) -> Self {
        ValidationError::InvalidAdapterId {
            id: id.into(),
            reason,
        }
    }

    /// Builds a transition error from the debug names of both states.
    pub fn illegal_transition<S: std::fmt::Debug>(machine: &'static str, from: &S, to: &S) -> Self {
        ValidationError::IllegalTransition {
            machine,
            from: format!("{:?}", from),
            to: format!("{:?}", to),
        }
    }

    /// True when the error came from a lifecycle move rather than input.
    pub fn is_transition(&self) -> bool {
        matches!(self, ValidationError::IllegalTransition { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adapter_id_error_names_the_id() {
        let err = ValidationError::adapter_id("twitch chat", "contains whitespace");
        assert_eq!(
            err.to_string(),
            "adapter id 'twitch chat' rejected: contains whitespace"
        );
        assert!(!err.is_transition());
    }

    #[test]
    fn transition_error_names_the_machine() {
        #[derive(Debug)]
        enum Door {
            Shut,
            Open,
        }
        let err = ValidationError::illegal_transition("door", &Door::Shut, &Door::Open);
        assert_eq!(err.to_string(), "door: Shut cannot move to Open");
        assert!(err.is_transition());
    }
}
