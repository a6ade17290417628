//! # Adapters
//!
//! Concrete implementations of the `ports` traits: production and
//! in-memory storage, plus the default wall-clock time source.

pub mod infra;
pub mod storage;

pub use infra::SystemClock;
pub use storage::{FileStorage, InMemoryStorage};
