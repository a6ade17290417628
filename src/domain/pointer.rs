//! # Pointer
//!
//! Fixed-size descriptors locating a record in storage.
//!
//! Two shapes are authoritative for different contexts (see the design
//! notes on the source's divergent `Pointer` variants): the 32-byte
//! [`Pointer`] for the block log's data/index pair, and the 16-byte
//! [`Pointer16`] for a trie node's key/value/child references, where
//! flags and insert-time would be redundant weight repeated `fanout + 2`
//! times per node.

use crate::error::{EngineError, Result};

/// Pointer is valid and may be dereferenced.
pub const FLAG_VALID: u64 = 1;
/// Pointer's referent is marked for deletion (not yet reclaimed — there
/// is no compaction in this engine).
pub const FLAG_MARKED_FOR_DELETION: u64 = 1 << 1;
/// Pointer addresses a record outside this engine's own storage.
pub const FLAG_FOREIGN: u64 = 1 << 2;
/// Pointer has been superseded and should be followed to a new location.
pub const FLAG_REDIRECT: u64 = 1 << 3;

const POINTER_SIZE: usize = 32;
const POINTER16_SIZE: usize = 16;

/// 32-byte block-log pointer: `{addr, size, flags, insert_time}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pointer {
    pub addr: u64,
    pub size: u64,
    pub flags: u64,
    pub insert_time: u64,
}

impl Pointer {
    pub fn new(addr: u64, size: u64, flags: u64, insert_time: u64) -> Self {
        Self {
            addr,
            size,
            flags,
            insert_time,
        }
    }

    /// A pointer referencing nothing.
    pub const fn absent() -> Self {
        Self {
            addr: 0,
            size: 0,
            flags: 0,
            insert_time: 0,
        }
    }

    pub fn is_absent(&self) -> bool {
        self.addr == 0 && self.size == 0
    }

    pub const fn bin_size(&self) -> usize {
        POINTER_SIZE
    }

    pub fn has(&self, flag: u64) -> bool {
        self.flags & flag == flag
    }

    /// Returns a copy with `flag` set.
    pub fn add(&self, flag: u64) -> Self {
        Self {
            flags: self.flags | flag,
            ..*self
        }
    }

    /// Returns a copy with `flag` cleared. Callers must ensure the flag is
    /// currently set — this toggles the bit (xor), it does not mask it.
    pub fn remove(&self, flag: u64) -> Self {
        Self {
            flags: self.flags ^ flag,
            ..*self
        }
    }

    /// Encodes into `buf`, reusing it if it is at least [`Self::bin_size`]
    /// bytes; otherwise allocates a fresh buffer of the exact size.
    pub fn encode_into(&self, buf: &mut Vec<u8>) -> &[u8] {
        if buf.len() < POINTER_SIZE {
            *buf = vec![0u8; POINTER_SIZE];
        }
        let b = &mut buf[..POINTER_SIZE];
        b[0..8].copy_from_slice(&self.addr.to_le_bytes());
        b[8..16].copy_from_slice(&self.size.to_le_bytes());
        b[16..24].copy_from_slice(&self.flags.to_le_bytes());
        b[24..32].copy_from_slice(&self.insert_time.to_le_bytes());
        &buf[..POINTER_SIZE]
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.encode_into(&mut buf).to_vec()
    }

    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() != POINTER_SIZE {
            return Err(EngineError::BadBuffer {
                expected: POINTER_SIZE,
                actual: buf.len(),
            });
        }
        Ok(Self {
            addr: u64::from_le_bytes(buf[0..8].try_into().unwrap()),
            size: u64::from_le_bytes(buf[8..16].try_into().unwrap()),
            flags: u64::from_le_bytes(buf[16..24].try_into().unwrap()),
            insert_time: u64::from_le_bytes(buf[24..32].try_into().unwrap()),
        })
    }
}

/// 16-byte child/key/value reference used inside a [`super::node::Node`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pointer16 {
    pub addr: u64,
    pub size: u64,
}

impl Pointer16 {
    pub fn new(addr: u64, size: u64) -> Self {
        Self { addr, size }
    }

    pub const fn absent() -> Self {
        Self { addr: 0, size: 0 }
    }

    pub fn is_absent(&self) -> bool {
        self.addr == 0
    }

    pub const fn bin_size(&self) -> usize {
        POINTER16_SIZE
    }

    pub fn write_into(&self, buf: &mut [u8]) {
        buf[0..8].copy_from_slice(&self.addr.to_le_bytes());
        buf[8..16].copy_from_slice(&self.size.to_le_bytes());
    }

    pub fn read_from(buf: &[u8]) -> Self {
        Self {
            addr: u64::from_le_bytes(buf[0..8].try_into().unwrap()),
            size: u64::from_le_bytes(buf[8..16].try_into().unwrap()),
        }
    }

    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() != POINTER16_SIZE {
            return Err(EngineError::BadBuffer {
                expected: POINTER16_SIZE,
                actual: buf.len(),
            });
        }
        Ok(Self::read_from(buf))
    }
}

impl From<Pointer> for Pointer16 {
    fn from(p: Pointer) -> Self {
        Self {
            addr: p.addr,
            size: p.size,
        }
    }
}
