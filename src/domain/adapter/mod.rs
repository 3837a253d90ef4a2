//! Adapter lifecycle state.
//!
//! Each configured upstream source has exactly one [`AdapterState`]. The
//! state is written only by the task running that adapter and read by
//! status reporting.

mod state;
mod status;

pub use state::{AdapterSession, AdapterState};
pub use status::AdapterStatus;
