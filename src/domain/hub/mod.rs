//! Hub message vocabulary.
//!
//! A [`HubMessage`] is the unit every adapter produces and every consumer
//! session receives. Its [`MessageKind`] is fixed by the producing adapter
//! and maps one-to-one onto the `type` tag of the outbound envelope.

mod message;

pub use message::{ChatSource, EventSource, HubMessage, HubMessageError, MessageKind};
