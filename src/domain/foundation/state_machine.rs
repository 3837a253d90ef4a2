//! Shared transition rules for the lifecycle enums.
//!
//! Adapter status, the chat login sequence and the EventSub phase all
//! describe their legal moves here so that an illegal move surfaces as a
//! [`ValidationError::IllegalTransition`] naming the machine it came from.

use super::ValidationError;

/// A `Copy` enum with a fixed set of legal moves.
///
/// ```ignore
/// impl StateMachine for ChatState {
///     const MACHINE: &'static str = "twitch chat";
///
///     fn can_transition_to(&self, target: &Self) -> bool { /* table */ }
///     fn valid_transitions(&self) -> Vec<Self> { /* same table */ }
/// }
///
/// state.advance(ChatState::Joined)?;
/// ```
pub trait StateMachine: Sized + Copy + PartialEq + std::fmt::Debug {
    /// Name used in error messages and logs.
    const MACHINE: &'static str;

    fn can_transition_to(&self, target: &Self) -> bool;

    /// Every state reachable in one move. Must agree with `can_transition_to`.
    fn valid_transitions(&self) -> Vec<Self>;

    /// Returns `target` if the move is legal.
    fn transition_to(&self, target: Self) -> Result<Self, ValidationError> {
        if self.can_transition_to(&target) {
            Ok(target)
        } else {
            Err(ValidationError::illegal_transition(Self::MACHINE, self, &target))
        }
    }

    /// Moves in place; on error the state is left untouched.
    fn advance(&mut self, target: Self) -> Result<(), ValidationError> {
        *self = self.transition_to(target)?;
        Ok(())
    }

    fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}
