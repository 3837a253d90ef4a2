//! Domain layer - value types of the live portal.
//!
//! Everything here is synchronous and free of I/O: message vocabulary,
//! lifecycle state machines and the typed payloads each source is
//! normalized into.

pub mod adapter;
pub mod agent;
pub mod chat;
pub mod control;
pub mod foundation;
pub mod hub;
pub mod subscription;
