//! Health agent source.
//!
//! Polls the local agent's `/status` and `/capabilities` endpoints and
//! emits one `agent_status` message per successful poll.

mod client;
mod source;

pub use client::{AgentClient, AgentClientConfig};
pub use source::AgentStatusSource;
