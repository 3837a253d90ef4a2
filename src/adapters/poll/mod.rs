//! Generic poll adapter.
//!
//! Wraps any [`PollSource`] in the [`ProducerAdapter`] lifecycle: fetch
//! immediately, then once per interval, adopting whatever interval the
//! upstream dictates.
//!
//! [`PollSource`]: crate::ports::PollSource
//! [`ProducerAdapter`]: crate::ports::ProducerAdapter

mod poll_adapter;

pub use poll_adapter::PollAdapter;
