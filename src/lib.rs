//! Live Portal - Live event aggregation hub
//!
//! This crate collects signals from a local health agent, OBS, Twitch chat,
//! Twitch EventSub and YouTube live chat, normalizes them into tagged
//! messages and fans them out to websocket viewers.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
