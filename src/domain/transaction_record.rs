//! # Transaction Record
//!
//! The on-disk entry naming the root of a committed version. Committed
//! write transactions form a singly-linked chain of these records; the
//! most recently appended one is the database's live root reference.
//!
//! ```text
//! [id:8][time:8][root:16][parent:16]
//! ```

use super::pointer::Pointer16;
use crate::error::{EngineError, Result};

pub const TRANSACTION_RECORD_SIZE: usize = 8 + 8 + 16 + 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransactionRecord {
    pub id: u64,
    pub time: u64,
    pub root: Pointer16,
    pub parent: Pointer16,
}

impl TransactionRecord {
    pub fn new(id: u64, time: u64, root: Pointer16, parent: Pointer16) -> Self {
        Self {
            id,
            time,
            root,
            parent,
        }
    }

    pub const fn bin_size(&self) -> usize {
        TRANSACTION_RECORD_SIZE
    }

    pub fn encode_into<'a>(&self, buf: &'a mut Vec<u8>) -> &'a [u8] {
        if buf.len() < TRANSACTION_RECORD_SIZE {
            *buf = vec![0u8; TRANSACTION_RECORD_SIZE];
        }
        let b = &mut buf[..TRANSACTION_RECORD_SIZE];
        b[0..8].copy_from_slice(&self.id.to_le_bytes());
        b[8..16].copy_from_slice(&self.time.to_le_bytes());
        self.root.write_into(&mut b[16..32]);
        self.parent.write_into(&mut b[32..48]);
        &buf[..TRANSACTION_RECORD_SIZE]
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.encode_into(&mut buf).to_vec()
    }

    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() != TRANSACTION_RECORD_SIZE {
            return Err(EngineError::BadBuffer {
                expected: TRANSACTION_RECORD_SIZE,
                actual: buf.len(),
            });
        }
        Ok(Self {
            id: u64::from_le_bytes(buf[0..8].try_into().unwrap()),
            time: u64::from_le_bytes(buf[8..16].try_into().unwrap()),
            root: Pointer16::read_from(&buf[16..32]),
            parent: Pointer16::read_from(&buf[32..48]),
        })
    }
}
