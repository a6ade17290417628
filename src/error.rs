//! Error taxonomy for the storage engine.
//!
//! Every variant corresponds to a failure kind named in the component
//! design: decode errors are fatal and never retried, storage I/O errors
//! bubble up unchanged, and a *searched-for* absence (a trie `lookup`
//! miss) is never represented here — callers see it as `None`, not
//! `Err`. A *direct-addressed* absence (reading index slot `i` past the
//! committed length) is the one case that does get an `Err`, via
//! [`EngineError::NotFound`].

use thiserror::Error;

/// Errors surfaced at the engine's API boundary.
#[derive(Debug, Error)]
pub enum EngineError {
    /// `decode` received a buffer whose length didn't match the record's
    /// declared size. Deterministic, never retried.
    #[error("bad buffer: expected {expected} bytes, got {actual}")]
    BadBuffer { expected: usize, actual: usize },

    /// A trie descent computed a child index outside `0..fanout`.
    #[error("bad child index: {index} (fanout is {fanout})")]
    BadChildIndex { index: u64, fanout: u64 },

    /// A read ran past the end of the storage before the buffer was
    /// satisfied.
    #[error("read past end of storage: offset {offset}, wanted {len} bytes, storage is {storage_len} bytes")]
    EndOfStorage {
        offset: u64,
        len: usize,
        storage_len: u64,
    },

    /// The underlying `Storage` implementation returned an I/O error.
    #[error("storage I/O error: {0}")]
    StorageIo(#[from] std::io::Error),

    /// Logical absence of a record at a position that was addressed
    /// directly (e.g. a block-log index past the committed length).
    /// Not always an error: a trie `lookup`/`get` miss is surfaced as
    /// `None`, never this variant.
    #[error("not found")]
    NotFound,

    /// A trie walk exhausted all 16 hash levels without resolving to a
    /// null slot or a match. Only reachable via a deliberately engineered
    /// run of colliding keys; see §4.5/§9 of the design notes.
    #[error("trie depth exceeded before insert could resolve a slot")]
    TrieDepthExceeded,
}

pub type Result<T> = std::result::Result<T, EngineError>;
