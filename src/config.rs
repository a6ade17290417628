//! # Engine Configuration
//!
//! Tunable knobs that don't change the on-disk format or the algorithms,
//! only the allocation behavior around them. Mirrors `qc-02`'s
//! `StorageConfig`: a `Default`-backed value object with `with_*`
//! builder methods, threaded into the constructors that need it rather
//! than read from a global.
//!
//! Fanout (and therefore [`crate::domain::node::NODE_SIZE`]) is fixed by
//! the data model at compile time and is not configurable here.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Initial capacity, in bytes, of the scratch buffer [`crate::trie::TrieEngine`]
    /// and [`crate::blocklog::BlockLog`] reuse across successive record
    /// encodes (the buffer pool called for in the component design's
    /// note on bounding node-encoding allocation).
    pub encode_buffer_capacity: usize,

    /// Initial capacity, in bytes, of the backing `Vec<u8>` behind a
    /// freshly constructed [`crate::adapters::storage::InMemoryStorage`].
    pub storage_initial_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            encode_buffer_capacity: 512,
            storage_initial_capacity: 0,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_encode_buffer_capacity(mut self, capacity: usize) -> Self {
        self.encode_buffer_capacity = capacity;
        self
    }

    pub fn with_storage_initial_capacity(mut self, capacity: usize) -> Self {
        self.storage_initial_capacity = capacity;
        self
    }
}
