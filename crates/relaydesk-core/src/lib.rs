//! Session registry, conversation index, and broadcast coordinator for
//! RelayDesk.
//!
//! This crate defines the "ports" (the [`store::ConversationStore`] and
//! [`transport::Transport`] traits) that the infrastructure and application
//! layers implement, plus the in-process relay state machine built on them.
//! It depends only on `relaydesk-types` -- never on `relaydesk-infra` or
//! any database/IO crate.

pub mod relay;
pub mod store;
pub mod transport;
