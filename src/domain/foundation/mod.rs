//! Foundation module - Shared domain primitives.
//!
//! Contains identifiers, timestamps, the state machine trait and the
//! validation error that the rest of the live portal domain is built on.

mod errors;
mod ids;
mod state_machine;
mod timestamp;

pub use errors::ValidationError;
pub use ids::{AdapterId, ConsumerId};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
