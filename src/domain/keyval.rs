//! # KeyVal
//!
//! Self-describing key/value record.
//!
//! ```text
//! [total_size:8][key_len:8][key_bytes][val_len:8][val_bytes]
//! ```
//!
//! `total_size` covers the whole record, including itself.

use crate::error::{EngineError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyVal {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

impl KeyVal {
    pub fn new(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Size once encoded, in bytes: three 8-byte headers plus the raw key
    /// and value bytes.
    pub fn bin_size(&self) -> u64 {
        24 + self.key.len() as u64 + self.value.len() as u64
    }

    /// Encodes into `buf`, reusing it if it is at least [`Self::bin_size`]
    /// bytes; otherwise allocates a fresh buffer of the exact size.
    pub fn encode_into<'a>(&self, buf: &'a mut Vec<u8>) -> &'a [u8] {
        let size = self.bin_size() as usize;
        if buf.len() < size {
            *buf = vec![0u8; size];
        }
        let b = &mut buf[..size];

        b[0..8].copy_from_slice(&(size as u64).to_le_bytes());
        let mut offset = 8;

        b[offset..offset + 8].copy_from_slice(&(self.key.len() as u64).to_le_bytes());
        offset += 8;
        b[offset..offset + self.key.len()].copy_from_slice(&self.key);
        offset += self.key.len();

        b[offset..offset + 8].copy_from_slice(&(self.value.len() as u64).to_le_bytes());
        offset += 8;
        b[offset..offset + self.value.len()].copy_from_slice(&self.value);

        &buf[..size]
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.encode_into(&mut buf).to_vec()
    }

    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < 8 {
            return Err(EngineError::BadBuffer {
                expected: 24,
                actual: buf.len(),
            });
        }
        let total_size = u64::from_le_bytes(buf[0..8].try_into().unwrap()) as usize;
        if buf.len() != total_size {
            return Err(EngineError::BadBuffer {
                expected: total_size,
                actual: buf.len(),
            });
        }

        let mut offset = 8usize;
        let key_len = u64::from_le_bytes(buf[offset..offset + 8].try_into().unwrap()) as usize;
        offset += 8;
        let key = buf[offset..offset + key_len].to_vec();
        offset += key_len;

        let val_len = u64::from_le_bytes(buf[offset..offset + 8].try_into().unwrap()) as usize;
        offset += 8;
        let value = buf[offset..offset + val_len].to_vec();

        Ok(Self { key, value })
    }
}
