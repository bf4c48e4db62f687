//! SRTCP replay database (SPEC_FULL.md §4.3).
//!
//! Unlike RDBX, the SRTCP index travels on the wire in full (31 bits, no
//! rollover ambiguity to estimate), so this database only needs the
//! sliding-window check plus the sender-side monotonic counter
//! (`rdb_get_value`/`rdb_increment`/`rdb_overflow` in the original
//! source).

use crate::error::{Error, Result};

const WINDOW_SIZE: u64 = 64;
pub(crate) const INDEX_MASK: u32 = 0x7fff_ffff;

pub(crate) struct Rdb {
    window_start: u32,
    bitmap: u64,
    sender_index: u32,
}

impl Rdb {
    pub fn new() -> Self {
        Rdb {
            window_start: 0,
            bitmap: 0,
            sender_index: 0,
        }
    }

    /// Current sender index, to be written into the outgoing trailer.
    pub fn get_value(&self) -> u32 {
        self.sender_index
    }

    /// Advance the sender index. Fails with [`Error::IndexLimitReached`]
    /// before the index would overflow past 2^31 - 1, leaving the packet
    /// untouched (`rdb_overflow` / `rdb_increment` in the original).
    pub fn increment(&mut self) -> Result<()> {
        if self.sender_index >= INDEX_MASK {
            return Err(Error::IndexLimitReached);
        }
        self.sender_index += 1;
        Ok(())
    }

    pub fn check(&self, idx: u32) -> Result<()> {
        let delta = idx as i64 - self.window_start as i64;
        if delta > 0 {
            return Ok(());
        }
        let back = -delta;
        if back as u64 >= WINDOW_SIZE {
            return Err(Error::ReplayOld);
        }
        if self.bitmap & (1u64 << back) != 0 {
            return Err(Error::ReplayFail);
        }
        Ok(())
    }

    pub fn add_index(&mut self, idx: u32) {
        let delta = idx as i64 - self.window_start as i64;
        if delta > 0 {
            let shift = delta.min(WINDOW_SIZE as i64) as u32;
            self.bitmap = if shift >= 64 { 0 } else { self.bitmap << shift };
            self.bitmap |= 1;
            self.window_start = idx;
        } else {
            let back = (-delta) as u32;
            self.bitmap |= 1u64 << back;
        }
    }
}
