//! Application layer - adapter supervision, status reporting and wiring.
//!
//! - [`AdapterSupervisor`] runs every adapter's Connect / Run / Disconnect
//!   loop with reconnect backoff
//! - [`StatusBoard`] holds the one `AdapterState` per configured adapter
//! - [`Portal`] builds the hub and the enabled adapters from configuration

mod portal;
mod status_board;
mod supervisor;

pub use portal::{Portal, PortalError};
pub use status_board::{AdapterReporter, StatusBoard, StatusBoardError};
pub use supervisor::{AdapterSupervisor, BackoffPolicy};
