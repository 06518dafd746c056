//! Block device contract consumed by filesystem engines
//!
//! Uses `maybe_async` to support both sync and async modes.

use crate::chip::ChipDescriptor;
use crate::error::{Error, Result};
use maybe_async::maybe_async;

/// Default maximum file name length handed to the engine
pub const DEFAULT_NAME_MAX: u32 = 255;

/// Operating parameters handed to the filesystem engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockGeometry {
    /// Minimum read unit in bytes
    pub read_size: u32,
    /// Minimum program unit in bytes
    pub prog_size: u32,
    /// Erase block size in bytes
    pub block_size: u32,
    /// Number of erase blocks
    pub block_count: u32,
    /// Engine cache size in bytes
    pub cache_size: u32,
    /// Engine lookahead buffer size in bytes
    pub lookahead_size: u32,
    /// Erase cycles before the engine moves metadata to another block
    pub block_cycles: i32,
    /// Maximum file name length
    pub name_max: u32,
}

impl BlockGeometry {
    /// Geometry for a serial NOR chip
    ///
    /// Reads, programs, the cache and the lookahead buffer are all one page.
    pub const fn from_chip(chip: &ChipDescriptor, block_cycles: i32, name_max: u32) -> Self {
        Self {
            read_size: chip.page_size,
            prog_size: chip.page_size,
            block_size: chip.erase_block_size,
            block_count: chip.block_count(),
            cache_size: chip.page_size,
            lookahead_size: chip.page_size,
            block_cycles,
            name_max,
        }
    }

    /// Total device size in bytes
    pub const fn total_size(&self) -> u64 {
        self.block_size as u64 * self.block_count as u64
    }

    /// Check that `len` bytes at `offset` inside `block` exist on the device
    pub fn check_range(&self, block: u32, offset: u32, len: usize) -> Result<()> {
        if block >= self.block_count {
            return Err(Error::BlockOutOfRange(block));
        }
        let end = offset as u64 + len as u64;
        if end > self.block_size as u64 {
            return Err(Error::BlockOutOfRange(block));
        }
        Ok(())
    }
}

/// Block device as seen by a filesystem engine
///
/// All addressing is `(block, offset)`; the slice length is the transfer
/// size. Engines translate failures to their own codes with
/// [`Error::code`](crate::Error::code).
#[maybe_async(AFIT)]
pub trait BlockDevice {
    /// Static geometry of the device
    fn geometry(&self) -> BlockGeometry;

    /// Read `buf.len()` bytes from `offset` within `block`
    ///
    /// The whole of `buf` is overwritten even when the transfer fails.
    async fn read(&mut self, block: u32, offset: u32, buf: &mut [u8]) -> Result<()>;

    /// Program `data` at `offset` within an erased `block`
    async fn prog(&mut self, block: u32, offset: u32, data: &[u8]) -> Result<()>;

    /// Erase `block` so that it reads as all 0xFF
    async fn erase(&mut self, block: u32) -> Result<()>;

    /// Flush any cached state to the medium
    async fn sync(&mut self) -> Result<()>;
}
