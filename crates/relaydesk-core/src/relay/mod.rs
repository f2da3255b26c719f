//! The in-process relay: session registry, conversation index, broadcast
//! coordinator, and eviction sweeper.

pub mod coordinator;
pub mod index;
pub mod registry;
pub mod sweeper;

pub use coordinator::Coordinator;
pub use index::ConversationIndex;
pub use registry::SessionRegistry;
pub use sweeper::{EvictionSweeper, SweeperHandle};
