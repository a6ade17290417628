//! # Transaction Manager
//!
//! MVCC-style root-swap discipline over a [`TrieEngine`]. A read
//! transaction snapshots `current_root` and never sees later writers; a
//! write transaction builds a new tree against its own snapshot and, on
//! success, publishes it with a single atomic swap. Nothing previously
//! committed is ever touched, so a reader holding an old root keeps
//! reading exactly the tree it started with.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::adapters::infra::SystemClock;
use crate::config::EngineConfig;
use crate::domain::pointer::{Pointer, FLAG_VALID};
use crate::domain::transaction_record::{TransactionRecord, TRANSACTION_RECORD_SIZE};
use crate::domain::Pointer16;
use crate::error::{EngineError, Result};
use crate::ports::storage::{Storage, TimeSource};
use crate::trie::TrieEngine;

const TAIL_POINTER_SIZE: u64 = 32;

/// Transactional key/value store over a persistent trie.
///
/// `open_kv` recovers `current_root` and `tx_counter` from the trailing
/// tail pointer on reopen (see the module doc on [`Db::open_kv`]) rather
/// than requiring a fixed-offset header.
pub struct Db<S: Storage> {
    trie: TrieEngine<S>,
    tx_counter: AtomicU64,
    current_root: Mutex<Pointer16>,
    clock: Box<dyn TimeSource>,
}

impl<S: Storage> Db<S> {
    /// Opens (or initializes) a transactional store over `storage`.
    ///
    /// If `storage` is empty, starts from an absent root and `tx_counter
    /// = 0`. Otherwise the **last 32 bytes of storage are always a
    /// [`Pointer`] addressing the most recently committed
    /// [`TransactionRecord`]** — every commit appends one as its final
    /// act. Reopening decodes that trailing pointer, reads the record it
    /// addresses, and restores `current_root`/`tx_counter` from it. The
    /// "superblock" is never rewritten in place; each commit appends a
    /// fresh tail pointer, keeping the whole discipline append-only.
    pub fn open_kv(storage: S) -> Result<Self> {
        Self::open_kv_with_clock(storage, Box::new(SystemClock))
    }

    /// Opens with an explicit time source, for deterministic tests.
    pub fn open_kv_with_clock(storage: S, clock: Box<dyn TimeSource>) -> Result<Self> {
        Self::open_kv_with_clock_and_config(storage, clock, EngineConfig::default())
    }

    /// Opens with the system wall clock and a non-default [`EngineConfig`]
    /// (sizes the trie's node-encode scratch buffer up front).
    pub fn open_kv_with_config(storage: S, config: EngineConfig) -> Result<Self> {
        Self::open_kv_with_clock_and_config(storage, Box::new(SystemClock), config)
    }

    /// Opens with an explicit time source and config.
    pub fn open_kv_with_clock_and_config(
        storage: S,
        clock: Box<dyn TimeSource>,
        config: EngineConfig,
    ) -> Result<Self> {
        let trie = TrieEngine::with_config(storage, &config);
        let (root, tx_counter) = Self::discover_tail(&trie)?;
        tracing::debug!(tx_counter, root_addr = root.addr, "opened trie store");
        Ok(Self {
            trie,
            tx_counter: AtomicU64::new(tx_counter),
            current_root: Mutex::new(root),
            clock,
        })
    }

    fn discover_tail(trie: &TrieEngine<S>) -> Result<(Pointer16, u64)> {
        let len = trie.storage().len()?;
        if len == 0 {
            return Ok((Pointer16::absent(), 0));
        }
        let tail_bytes = trie.storage().read_at(len - TAIL_POINTER_SIZE, TAIL_POINTER_SIZE as usize)?;
        let tail_ptr = Pointer::decode(&tail_bytes)?;
        let record_bytes = trie.storage().read_at(tail_ptr.addr, TRANSACTION_RECORD_SIZE)?;
        let record = TransactionRecord::decode(&record_bytes)?;
        Ok((record.root, record.id))
    }

    /// Atomic fetch-add on the transaction counter; returns the
    /// post-increment value.
    pub fn next_tx_id(&self) -> u64 {
        self.tx_counter.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Runs a read-only transaction against a snapshot of the current
    /// root. The closure's returned error takes precedence only when no
    /// error latched on the transaction itself — a latched error is the
    /// root cause and is surfaced first.
    pub fn view<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut ReadTransaction<'_, S>) -> Result<T>,
    {
        let root = *self.current_root.lock();
        let id = self.next_tx_id();
        let mut tx = ReadTransaction {
            id,
            root,
            trie: &self.trie,
            error: None,
        };
        let outcome = f(&mut tx);
        match tx.error {
            Some(e) => Err(e),
            None => outcome,
        }
    }

    /// Runs a read-write transaction against a snapshot of the current
    /// root. On success (closure returns `Ok` and no error latched),
    /// appends a [`TransactionRecord`] and tail [`Pointer`], then
    /// publishes the new root with a single atomic swap. On failure,
    /// nothing is published — bytes already appended by the aborted
    /// transaction remain on disk, unreferenced.
    pub fn update<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut WriteTransaction<'_, S>) -> Result<T>,
    {
        let parent = *self.current_root.lock();
        let id = self.next_tx_id();
        let mut tx = WriteTransaction {
            id,
            root: parent,
            trie: &self.trie,
            error: None,
        };
        let outcome = f(&mut tx);
        let new_root = tx.root;
        let result = match tx.error {
            Some(e) => Err(e),
            None => outcome,
        };

        if result.is_ok() {
            self.commit(new_root, id, parent)?;
            *self.current_root.lock() = new_root;
            tracing::debug!(tx_id = id, root_addr = new_root.addr, "committed transaction");
        }
        result
    }

    fn commit(&self, root: Pointer16, tx_id: u64, parent: Pointer16) -> Result<()> {
        let stamp = self.clock.now();
        let record = TransactionRecord::new(tx_id, stamp, root, parent);
        let record_addr = self.trie.storage().append(&record.encode())?;
        let tail = Pointer::new(record_addr, TRANSACTION_RECORD_SIZE as u64, FLAG_VALID, stamp);
        self.trie.storage().append(&tail.encode())?;
        Ok(())
    }
}

/// Read-only view of the store as of the moment it was opened.
///
/// `get`/`id` are no-ops once an error latches: `get` returns `None`
/// without touching storage again, and the latched error is surfaced
/// when [`Db::view`] returns.
pub struct ReadTransaction<'a, S: Storage> {
    id: u64,
    root: Pointer16,
    trie: &'a TrieEngine<S>,
    error: Option<EngineError>,
}

impl<'a, S: Storage> ReadTransaction<'a, S> {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn get(&mut self, key: &[u8]) -> Option<Vec<u8>> {
        if self.error.is_some() {
            return None;
        }
        match self.trie.lookup(self.root, key) {
            Ok(value) => value,
            Err(e) => {
                self.error = Some(e);
                None
            }
        }
    }
}

/// Read-write transaction. `put`/`delete` rebuild the trie
/// copy-on-write against this transaction's own root; nothing is
/// visible to other transactions until [`Db::update`] commits.
pub struct WriteTransaction<'a, S: Storage> {
    id: u64,
    root: Pointer16,
    trie: &'a TrieEngine<S>,
    error: Option<EngineError>,
}

impl<'a, S: Storage> WriteTransaction<'a, S> {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn get(&mut self, key: &[u8]) -> Option<Vec<u8>> {
        if self.error.is_some() {
            return None;
        }
        match self.trie.lookup(self.root, key) {
            Ok(value) => value,
            Err(e) => {
                self.error = Some(e);
                None
            }
        }
    }

    pub fn put(&mut self, key: &[u8], value: &[u8]) {
        if self.error.is_some() {
            return;
        }
        match self.trie.insert(self.root, key, value, self.id) {
            Ok(new_root) => self.root = new_root,
            Err(e) => self.error = Some(e),
        }
    }

    /// Removes `key`, returning its previous value (or `None` if it
    /// wasn't present).
    pub fn delete(&mut self, key: &[u8]) -> Option<Vec<u8>> {
        if self.error.is_some() {
            return None;
        }
        let prev = match self.trie.lookup(self.root, key) {
            Ok(value) => value,
            Err(e) => {
                self.error = Some(e);
                return None;
            }
        };
        match self.trie.delete(self.root, key, self.id) {
            Ok(new_root) => self.root = new_root,
            Err(e) => {
                self.error = Some(e);
                return None;
            }
        }
        prev
    }
}
