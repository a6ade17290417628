use parking_lot::Mutex;

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::ports::storage::Storage;

/// In-memory byte storage for unit and integration tests.
///
/// Analogous to the teacher's `InMemoryKVStore` (`qc-02-block-storage`),
/// generalized from a key-value map to a flat append-only byte buffer.
#[derive(Default)]
pub struct InMemoryStorage {
    buf: Mutex<Vec<u8>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Mutex::new(Vec::with_capacity(capacity)),
        }
    }

    /// Builds an in-memory store whose initial capacity comes from
    /// `config.storage_initial_capacity`, mirroring `qc-02`'s
    /// `StorageConfig`-driven constructors.
    pub fn with_config(config: &EngineConfig) -> Self {
        Self::with_capacity(config.storage_initial_capacity)
    }
}

impl Storage for InMemoryStorage {
    fn read_at(&self, offset: u64, len: usize) -> Result<Vec<u8>> {
        let buf = self.buf.lock();
        let start = offset as usize;
        let end = start + len;
        if end > buf.len() {
            return Err(EngineError::EndOfStorage {
                offset,
                len,
                storage_len: buf.len() as u64,
            });
        }
        Ok(buf[start..end].to_vec())
    }

    fn append(&self, bytes: &[u8]) -> Result<u64> {
        let mut buf = self.buf.lock();
        let offset = buf.len() as u64;
        buf.extend_from_slice(bytes);
        Ok(offset)
    }

    fn len(&self) -> Result<u64> {
        Ok(self.buf.lock().len() as u64)
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }
}
