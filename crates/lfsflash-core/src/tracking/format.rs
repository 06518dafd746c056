//! Blank tracking
//!
//! A block is blank when every byte reads back as the erased value. The
//! tracker only believes this after an erase it issued itself or after
//! reading the block back; any program clears the belief immediately.

use super::Bitset;
use crate::error::Result;
use crate::flash::Transport;
use crate::programmer::SpiMaster;
use crate::spi::opcodes::ERASED_VALUE;
use alloc::vec;
use maybe_async::maybe_async;

/// Set of blocks known to be blank since they were last written
#[derive(Debug, Clone)]
pub struct FormatTracker {
    blank: Bitset,
}

impl FormatTracker {
    /// Create a tracker for `block_count` blocks, none of them known blank
    pub fn new(block_count: u32) -> Self {
        Self {
            blank: Bitset::new(block_count),
        }
    }

    /// Record that `block` reads as all 0xFF
    pub fn mark_blank(&mut self, block: u32) {
        self.blank.set(block);
    }

    /// Forget that `block` was blank
    pub fn clear_blank(&mut self, block: u32) {
        self.blank.clear(block);
    }

    /// Forget every blank flag
    pub fn clear_all(&mut self) {
        self.blank.clear_all();
    }

    /// Returns true if `block` is known to be blank
    pub fn is_blank(&self, block: u32) -> bool {
        self.blank.test(block)
    }

    /// Number of blocks known to be blank
    pub fn blank_count(&self) -> u32 {
        self.blank.count_set()
    }

    /// The underlying bitmap
    pub fn bitmap(&self) -> &Bitset {
        &self.blank
    }

    /// Read `block` back page by page and record whether it is blank
    ///
    /// Stops at the first programmed byte. The blank flag is set on success
    /// and cleared otherwise.
    #[maybe_async]
    pub async fn verify_blank<M: SpiMaster>(
        &mut self,
        transport: &mut Transport<M>,
        block: u32,
    ) -> Result<bool> {
        let chip = transport.chip();
        let page_size = chip.page_size;
        let base = chip.block_address(block);
        let mut page = vec![0u8; page_size as usize];

        let mut offset = 0;
        while offset < chip.erase_block_size {
            if let Err(e) = transport.read_raw(base + offset, &mut page).await {
                self.clear_blank(block);
                return Err(e);
            }
            if page.iter().any(|&b| b != ERASED_VALUE) {
                log::trace!("block {} not blank at offset {}", block, offset);
                self.clear_blank(block);
                return Ok(false);
            }
            offset += page_size;
        }

        self.mark_blank(block);
        Ok(true)
    }
}
