//! # Ports
//!
//! Driven-port traits the engine depends on. `adapters` provides the
//! concrete implementations.

pub mod storage;

pub use storage::{Storage, TimeSource};
