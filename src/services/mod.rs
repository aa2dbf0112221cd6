//! Service layer for I/O.
//!
//! This module contains the services that talk to the outside world: the
//! Trello REST API and the local persistence store.

pub mod requests;
pub mod sample;
pub mod storage;
pub mod trello;

// Re-export commonly used types
pub use requests::{Cancellation, PendingRequest};
pub use storage::{FileStore, KeyValueStore, MemoryStore, Storage};
pub use trello::{TrelloClient, TrelloError};
