//! Retry loops shared by the storage adapters.
//!
//! Mirrors `readFull`/`writeFull` from the original source
//! (`examples/original_source/storage.go`): loop until the buffer is
//! fully drained/filled or a terminal I/O condition is hit. A `read`
//! that returns `0` bytes before the buffer is satisfied is end-of-file,
//! which this engine treats as [`EngineError::EndOfStorage`] rather than
//! a generic I/O error, per §4.1's terminal-error contract.

use std::io::{Read, Write};

use crate::error::{EngineError, Result};

pub fn read_full<R: Read>(r: &mut R, buf: &mut [u8], offset: u64, storage_len: u64) -> Result<()> {
    let want = buf.len();
    let mut filled = 0;
    while filled < want {
        let n = r.read(&mut buf[filled..])?;
        if n == 0 {
            return Err(EngineError::EndOfStorage {
                offset,
                len: want,
                storage_len,
            });
        }
        filled += n;
    }
    Ok(())
}

pub fn write_full<W: Write>(w: &mut W, buf: &[u8]) -> Result<()> {
    let want = buf.len();
    let mut written = 0;
    while written < want {
        let n = w.write(&buf[written..])?;
        written += n;
    }
    Ok(())
}
