//! Ports - Interfaces between the hub core and the outside world.
//!
//! Following hexagonal architecture, ports define the contracts that
//! adapters implement.
//!
//! ## Producer Ports
//!
//! - `ProducerAdapter` - Connect / Run / Disconnect lifecycle of an upstream
//! - `PollSource` - One fetch of a pull-style upstream
//! - `SubscriptionControl` - Creates event subscriptions for a session
//! - `MessageSink` - The `emit` seam adapters publish through
//! - `StatusReporter` - Write handle for an adapter's own state
//!
//! ## Consumer Ports
//!
//! - `ConsumerTransport` - Outbound half of a viewer connection

mod consumer_transport;
mod message_sink;
mod poll_source;
mod producer_adapter;
mod status_reporter;
mod subscription_control;

pub use consumer_transport::{ConsumerTransport, TransportError};
pub use message_sink::MessageSink;
pub use poll_source::{PollOutcome, PollSource};
pub use producer_adapter::{AdapterError, ProducerAdapter, RunContext};
pub use status_reporter::{NoopStatusReporter, StatusReporter};
pub use subscription_control::{
    ControlError, SubscriptionControl, SubscriptionOutcome, SubscriptionRequest,
};
