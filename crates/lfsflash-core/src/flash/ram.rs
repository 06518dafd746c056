//! Heap-backed block device
//!
//! Useful for scratch filesystems and for exercising engines without a chip.

use super::{BlockDevice, BlockGeometry};
use crate::error::{Error, Result};
use crate::fs::{EngineResult, FilesystemEngine};
use crate::spi::opcodes::ERASED_VALUE;
use crate::tracking::MutationEpoch;
use alloc::vec;
use alloc::vec::Vec;
use maybe_async::maybe_async;

/// Erase block size of a RAM device
pub const RAM_BLOCK_SIZE: u32 = 256;
/// Read, program, cache and lookahead size of a RAM device
pub const RAM_IO_SIZE: u32 = 64;
/// Block cycles reported to the engine
pub const RAM_BLOCK_CYCLES: i32 = 50;
/// Maximum file name length reported to the engine
pub const RAM_NAME_MAX: u32 = 64;

/// A block device held entirely in memory
pub struct RamBlockDevice {
    data: Vec<u8>,
    geometry: BlockGeometry,
    epoch: u32,
}

impl RamBlockDevice {
    /// Allocate a device of `size` bytes, rounded down to whole blocks
    ///
    /// The memory starts zeroed, so the engine sees no filesystem until it
    /// formats one.
    pub fn new(size: usize) -> Result<Self> {
        let size = size & !(RAM_BLOCK_SIZE as usize - 1);
        if size == 0 {
            return Err(Error::InvalidState);
        }
        let block_count =
            u32::try_from(size / RAM_BLOCK_SIZE as usize).map_err(|_| Error::AddressOutOfBounds)?;
        log::debug!("RAM block device: {} bytes, {} blocks", size, block_count);

        Ok(Self {
            data: vec![0u8; size],
            geometry: BlockGeometry {
                read_size: RAM_IO_SIZE,
                prog_size: RAM_IO_SIZE,
                block_size: RAM_BLOCK_SIZE,
                block_count,
                cache_size: RAM_IO_SIZE,
                lookahead_size: RAM_IO_SIZE,
                block_cycles: RAM_BLOCK_CYCLES,
                name_max: RAM_NAME_MAX,
            },
            epoch: 0,
        })
    }

    /// Size of the device in bytes
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Raw contents
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    fn span(&self, block: u32, offset: u32, len: usize) -> Result<core::ops::Range<usize>> {
        self.geometry.check_range(block, offset, len)?;
        let start = (block * RAM_BLOCK_SIZE + offset) as usize;
        Ok(start..start + len)
    }
}

impl MutationEpoch for RamBlockDevice {
    fn mutation_epoch(&self) -> u32 {
        self.epoch
    }

    fn mark_stale(&mut self) {
        self.epoch = self.epoch.wrapping_add(1);
    }
}

#[maybe_async(AFIT)]
impl BlockDevice for RamBlockDevice {
    fn geometry(&self) -> BlockGeometry {
        self.geometry
    }

    async fn read(&mut self, block: u32, offset: u32, buf: &mut [u8]) -> Result<()> {
        buf.fill(0);
        let span = self.span(block, offset, buf.len())?;
        buf.copy_from_slice(&self.data[span]);
        Ok(())
    }

    async fn prog(&mut self, block: u32, offset: u32, data: &[u8]) -> Result<()> {
        let span = self.span(block, offset, data.len())?;
        self.data[span].copy_from_slice(data);
        self.mark_stale();
        Ok(())
    }

    async fn erase(&mut self, block: u32) -> Result<()> {
        let span = self.span(block, 0, RAM_BLOCK_SIZE as usize)?;
        self.data[span].fill(ERASED_VALUE);
        self.mark_stale();
        Ok(())
    }

    async fn sync(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Format `device` with `engine` and mount it
///
/// A RAM device never holds a filesystem from an earlier run, so it is
/// always formatted first.
#[maybe_async]
pub async fn mount_fresh<E>(engine: &mut E, device: &mut RamBlockDevice) -> EngineResult<()>
where
    E: FilesystemEngine<RamBlockDevice>,
{
    engine.format(device).await?;
    engine.mount(device).await
}
