//! # Block Log
//!
//! Append-only time-series log: blocks land in `data_store`, and a
//! pointer to each is appended to `index_store` in the same order. The
//! two stores share nothing but the `Storage`/`Pointer` primitives —
//! the block log is an independent subsystem from the trie engine.

use parking_lot::Mutex;

use crate::adapters::infra::SystemClock;
use crate::config::EngineConfig;
use crate::domain::block::Block;
use crate::domain::pointer::{Pointer, FLAG_VALID};
use crate::error::{EngineError, Result};
use crate::ports::storage::{Storage, TimeSource};

const POINTER_SIZE: u64 = 32;

/// Append-only block log with a parallel pointer index.
///
/// `I` is the index store (dense array of 32-byte `Pointer`s, one per
/// committed block) and `D` is the data store (the blocks themselves).
pub struct BlockLog<I: Storage, D: Storage> {
    index_store: I,
    data_store: D,
    clock: Box<dyn TimeSource>,
    encode_buf: Mutex<Vec<u8>>,
}

impl<I: Storage, D: Storage> BlockLog<I, D> {
    /// Opens a block log over the given index/data storage pair, stamping
    /// new blocks with the system wall clock.
    pub fn open(index_store: I, data_store: D) -> Self {
        Self::with_clock(index_store, data_store, Box::new(SystemClock))
    }

    /// Opens a block log with an explicit time source, for deterministic
    /// tests.
    pub fn with_clock(index_store: I, data_store: D, clock: Box<dyn TimeSource>) -> Self {
        Self::with_clock_and_config(index_store, data_store, clock, EngineConfig::default())
    }

    /// Opens a block log with the system wall clock and a non-default
    /// [`EngineConfig`] (currently just the block-encode scratch
    /// buffer's initial capacity).
    pub fn open_with_config(index_store: I, data_store: D, config: EngineConfig) -> Self {
        Self::with_clock_and_config(index_store, data_store, Box::new(SystemClock), config)
    }

    /// Opens a block log with an explicit time source and config.
    pub fn with_clock_and_config(
        index_store: I,
        data_store: D,
        clock: Box<dyn TimeSource>,
        config: EngineConfig,
    ) -> Self {
        Self {
            index_store,
            data_store,
            clock,
            encode_buf: Mutex::new(Vec::with_capacity(config.encode_buffer_capacity)),
        }
    }

    /// Appends `block`'s encoding to the data store and its pointer to
    /// the index store, stamping `insert_time` with the current wall
    /// clock second.
    ///
    /// If the data append succeeds but the index append fails, the block
    /// bytes are orphaned on disk — the engine does not roll back a
    /// partial write, it surfaces the index error.
    pub fn write_block(&self, mut block: Block) -> Result<Pointer> {
        let stamp = self.clock.now();
        block.insert_time = stamp;

        let mut buf = self.encode_buf.lock();
        let encoded = block.encode_into(&mut buf);
        let addr = self.data_store.append(encoded)?;
        let ptr = Pointer::new(addr, block.bin_size(), FLAG_VALID, stamp);
        drop(buf);

        self.index_store.append(&ptr.encode())?;
        Ok(ptr)
    }

    /// Reads and decodes the block referenced by `ptr`.
    pub fn read_block(&self, ptr: &Pointer) -> Result<Block> {
        let bytes = self.data_store.read_at(ptr.addr, ptr.size as usize)?;
        Block::decode(&bytes)
    }

    /// Reads the `i`-th committed pointer (0-indexed, in write order).
    ///
    /// `i` is a logical index into the committed sequence, not a storage
    /// offset: asking for an index at or past the current length is a
    /// logical absence (`NotFound`), distinct from a `Storage` adapter
    /// hitting end-of-file on a corrupt or truncated read.
    pub fn read_pointer(&self, i: u64) -> Result<Pointer> {
        if i >= self.len()? {
            return Err(EngineError::NotFound);
        }
        let bytes = self.index_store.read_at(i * POINTER_SIZE, POINTER_SIZE as usize)?;
        Pointer::decode(&bytes)
    }

    /// Total number of committed pointers in the index.
    pub fn len(&self) -> Result<u64> {
        Ok(self.index_store.len()? / POINTER_SIZE)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Lazily streams pointers whose `insert_time` falls in `[start, end)`,
    /// in index order, skipping the `insert_time == 0` sentinel.
    pub fn stream_pointers_between(&self, start: u64, end: u64) -> PointerStream<'_, I, D> {
        PointerStream {
            log: self,
            next_index: 0,
            start,
            end,
            done: false,
        }
    }

    /// Composition of [`Self::stream_pointers_between`] and
    /// [`Self::read_block`]: the first block read failure terminates the
    /// stream.
    pub fn stream_blocks_between(&self, start: u64, end: u64) -> BlockStream<'_, I, D> {
        BlockStream {
            pointers: self.stream_pointers_between(start, end),
            log: self,
            done: false,
        }
    }
}

/// Lazy, single-pass, finite sequence of pointers in `[start, end)`.
///
/// Reads each index slot and checks its `insert_time` afterward — fixing
/// the original source's init-order bug, which checked an uninitialized
/// zero-value's `insert_time` before ever reading the real pointer.
pub struct PointerStream<'a, I: Storage, D: Storage> {
    log: &'a BlockLog<I, D>,
    next_index: u64,
    start: u64,
    end: u64,
    done: bool,
}

impl<'a, I: Storage, D: Storage> Iterator for PointerStream<'a, I, D> {
    type Item = Result<Pointer>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            match self.log.read_pointer(self.next_index) {
                Ok(ptr) => {
                    self.next_index += 1;
                    if ptr.insert_time == 0 {
                        continue;
                    }
                    if ptr.insert_time >= self.start && ptr.insert_time < self.end {
                        return Some(Ok(ptr));
                    }
                    continue;
                }
                Err(EngineError::EndOfStorage { .. }) | Err(EngineError::NotFound) => {
                    self.done = true;
                    return None;
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

/// Lazy sequence of decoded blocks; terminates on the first read error.
pub struct BlockStream<'a, I: Storage, D: Storage> {
    pointers: PointerStream<'a, I, D>,
    log: &'a BlockLog<I, D>,
    done: bool,
}

impl<'a, I: Storage, D: Storage> Iterator for BlockStream<'a, I, D> {
    type Item = Result<Block>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.pointers.next()? {
            Ok(ptr) => match self.log.read_block(&ptr) {
                Ok(block) => Some(Ok(block)),
                Err(e) => {
                    self.done = true;
                    Some(Err(e))
                }
            },
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
