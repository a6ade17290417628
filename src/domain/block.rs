//! # Block
//!
//! A time-stamped batch of [`KeyVal`] records, persisted together by the
//! block log.
//!
//! ```text
//! [total_size:8][insert_time:8][kv_count:8][kv_records...]
//! ```

use super::keyval::KeyVal;
use crate::error::{EngineError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub insert_time: u64,
    pub data: Vec<KeyVal>,
}

impl Block {
    pub fn new(insert_time: u64, data: Vec<KeyVal>) -> Self {
        Self { insert_time, data }
    }

    pub fn bin_size(&self) -> u64 {
        let header = 24u64;
        header + self.data.iter().map(KeyVal::bin_size).sum::<u64>()
    }

    pub fn encode_into<'a>(&self, buf: &'a mut Vec<u8>) -> &'a [u8] {
        let size = self.bin_size() as usize;
        if buf.len() < size {
            *buf = vec![0u8; size];
        }
        let b = &mut buf[..size];

        b[0..8].copy_from_slice(&(size as u64).to_le_bytes());
        b[8..16].copy_from_slice(&self.insert_time.to_le_bytes());
        b[16..24].copy_from_slice(&(self.data.len() as u64).to_le_bytes());

        let mut offset = 24usize;
        let mut kv_buf = Vec::new();
        for kv in &self.data {
            let kv_size = kv.bin_size() as usize;
            kv_buf.clear();
            let encoded = kv.encode_into(&mut kv_buf);
            b[offset..offset + kv_size].copy_from_slice(encoded);
            offset += kv_size;
        }

        &buf[..size]
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.encode_into(&mut buf).to_vec()
    }

    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < 24 {
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
        let insert_time = u64::from_le_bytes(buf[8..16].try_into().unwrap());
        let kv_count = u64::from_le_bytes(buf[16..24].try_into().unwrap());

        let mut data = Vec::with_capacity(kv_count as usize);
        let mut offset = 24usize;
        for _ in 0..kv_count {
            // Each KeyVal is itself self-describing: peek its total_size
            // header before slicing the exact record out.
            if offset + 8 > buf.len() {
                return Err(EngineError::BadBuffer {
                    expected: offset + 8,
                    actual: buf.len(),
                });
            }
            let kv_size =
                u64::from_le_bytes(buf[offset..offset + 8].try_into().unwrap()) as usize;
            if offset + kv_size > buf.len() {
                return Err(EngineError::BadBuffer {
                    expected: offset + kv_size,
                    actual: buf.len(),
                });
            }
            data.push(KeyVal::decode(&buf[offset..offset + kv_size])?);
            offset += kv_size;
        }

        Ok(Self { insert_time, data })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Block {
        Block::new(
            42,
            vec![KeyVal::new(*b"a", *b"1"), KeyVal::new(*b"bb", *b"22")],
        )
    }

    #[test]
    fn round_trips() {
        let block = sample();
        let encoded = block.encode();
        assert_eq!(encoded.len(), block.bin_size() as usize);
        assert_eq!(Block::decode(&encoded).unwrap(), block);
    }

    #[test]
    fn round_trips_empty_block() {
        let block = Block::new(7, Vec::new());
        let encoded = block.encode();
        assert_eq!(Block::decode(&encoded).unwrap(), block);
    }

    #[test]
    fn marshals_into_preallocated_buffer() {
        // S6: marshal into a pre-allocated buffer of length 1000, unmarshal
        // the returned slice, and the result equals the original.
        let block = sample();
        let mut buf = vec![0u8; 1000];
        let encoded = block.encode_into(&mut buf).to_vec();
        assert_eq!(Block::decode(&encoded).unwrap(), block);
    }

    #[test]
    fn rejects_truncated_buffer() {
        let block = sample();
        let mut encoded = block.encode();
        encoded.truncate(encoded.len() - 1);
        assert!(matches!(
            Block::decode(&encoded),
            Err(EngineError::BadBuffer { .. })
        ));
    }
}
