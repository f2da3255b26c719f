//! Shared domain types for RelayDesk.
//!
//! This crate contains the core domain types used across the relay:
//! conversations, messages, sessions, wire events, and their associated
//! error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod config;
pub mod conversation;
pub mod error;
pub mod event;
pub mod session;
