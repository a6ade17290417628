//! # trie-store
//!
//! Embedded storage engine combining two persistence ideas that share
//! nothing but their `Storage`/`Pointer` primitives:
//!
//! - [`blocklog`] — an append-only time-series log of variable-length
//!   blocks with a parallel pointer index, for sequential writes
//!   streamed back out by insertion-time range.
//! - [`trie`] + [`txn`] — a persistent (copy-on-write) hash-array-mapped
//!   trie serving as a transactional key/value store, with an MVCC-style
//!   transaction manager that publishes a new root atomically per
//!   committed writer.
//!
//! ```text
//! domain/   pure record types + binary codec (Pointer, KeyVal, Block,
//!           Node, TransactionRecord) and FNV-1a key hashing
//! ports/    the Storage + TimeSource traits the engine depends on
//! adapters/ InMemoryStorage, FileStorage, SystemClock
//! blocklog/ BlockLog: write_block / read_block / stream_*_between
//! trie/     TrieEngine: lookup / insert / delete over a Storage
//! txn/      Db: open_kv / view / update, the root-swap discipline
//! config/   EngineConfig: encode-buffer and storage-capacity knobs
//! ```
//!
//! Both subsystems are generic over [`ports::storage::Storage`] and are
//! exercised in tests against [`adapters::storage::InMemoryStorage`];
//! production callers back them with [`adapters::storage::FileStorage`].

pub mod adapters;
pub mod blocklog;
pub mod config;
pub mod domain;
pub mod error;
pub mod ports;
pub mod trie;
pub mod txn;

pub use adapters::storage::{FileStorage, InMemoryStorage};
pub use adapters::SystemClock;
pub use blocklog::BlockLog;
pub use config::EngineConfig;
pub use error::{EngineError, Result};
pub use trie::TrieEngine;
pub use txn::{Db, ReadTransaction, WriteTransaction};
