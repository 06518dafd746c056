//! Primitive flash operations with framing and timing
//!
//! [`Transport`] owns the bus master for one chip and knows its addressing
//! width, opcodes and timing budgets. Everything above it works in absolute
//! byte addresses and block numbers.

use crate::chip::ChipDescriptor;
use crate::error::{Error, Result};
use crate::programmer::SpiMaster;
use crate::protocol;
use maybe_async::maybe_async;

/// Interval between status polls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Delay between status reads while a page program runs, in microseconds
    pub program_poll_us: u32,
    /// Delay between status reads while a block erase runs, in microseconds
    pub erase_poll_us: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            program_poll_us: 10,
            erase_poll_us: 1_000,
        }
    }
}

/// Serial flash transport for one identified chip
pub struct Transport<M: SpiMaster> {
    master: M,
    chip: &'static ChipDescriptor,
    poll: PollConfig,
}

impl<M: SpiMaster> Transport<M> {
    /// Create a transport for an identified chip
    pub fn new(master: M, chip: &'static ChipDescriptor, poll: PollConfig) -> Self {
        Self { master, chip, poll }
    }

    /// The chip this transport drives
    pub fn chip(&self) -> &'static ChipDescriptor {
        self.chip
    }

    /// Polling intervals in use
    pub fn poll_config(&self) -> PollConfig {
        self.poll
    }

    /// Get a reference to the underlying bus master
    pub fn master(&self) -> &M {
        &self.master
    }

    /// Get a mutable reference to the underlying bus master
    pub fn master_mut(&mut self) -> &mut M {
        &mut self.master
    }

    /// Consume the transport and return the bus master
    pub fn into_inner(self) -> M {
        self.master
    }

    fn check_range(&self, addr: u32, len: usize) -> Result<()> {
        let end = addr as u64 + len as u64;
        if end > self.chip.total_size as u64 {
            return Err(Error::AddressOutOfBounds);
        }
        Ok(())
    }

    /// Read `buf.len()` bytes starting at `addr`
    #[maybe_async]
    pub async fn read_raw(&mut self, addr: u32, buf: &mut [u8]) -> Result<()> {
        self.check_range(addr, buf.len())?;
        log::trace!("read {} bytes at 0x{:08X}", buf.len(), addr);
        protocol::read(
            &mut self.master,
            self.chip.read_opcode(),
            self.chip.address_width,
            addr,
            buf,
        )
        .await
    }

    /// Program `data` starting at `addr`
    ///
    /// The data is split at page boundaries and at the master's write limit;
    /// each piece gets its own write-enable and busy poll bounded by the
    /// chip's program budget.
    #[maybe_async]
    pub async fn program_raw(&mut self, addr: u32, data: &[u8]) -> Result<()> {
        self.check_range(addr, data.len())?;

        let page_size = self.chip.page_size as usize;
        let max_write = self.master.max_write_len().max(1);
        let mut offset = 0usize;
        let mut current_addr = addr;

        while offset < data.len() {
            // Respect both page boundaries and the master's maximum write length
            let bytes_to_page_end = page_size - (current_addr as usize % page_size);
            let chunk_size = (data.len() - offset).min(bytes_to_page_end).min(max_write);
            let chunk = &data[offset..offset + chunk_size];

            log::trace!("program {} bytes at 0x{:08X}", chunk_size, current_addr);
            protocol::program_page(
                &mut self.master,
                self.chip.program_opcode(),
                self.chip.address_width,
                current_addr,
                chunk,
                self.poll.program_poll_us,
                self.chip.program_timeout_us,
            )
            .await?;

            offset += chunk_size;
            current_addr += chunk_size as u32;
        }

        Ok(())
    }

    /// Erase one erase block
    ///
    /// Waits at most the chip's erase budget for the busy bit to clear.
    #[maybe_async]
    pub async fn erase_raw(&mut self, block: u32) -> Result<()> {
        if block >= self.chip.block_count() {
            return Err(Error::BlockOutOfRange(block));
        }
        let addr = self.chip.block_address(block);
        log::trace!("erase block {} at 0x{:08X}", block, addr);
        protocol::erase_block(
            &mut self.master,
            self.chip.block_erase_opcode(),
            self.chip.address_width,
            addr,
            self.poll.erase_poll_us,
            self.chip.erase_timeout_us,
        )
        .await
    }

    /// Poll the status register until the chip is idle or `timeout_us` elapses
    #[maybe_async]
    pub async fn poll_status(&mut self, timeout_us: u32) -> Result<()> {
        protocol::wait_ready(&mut self.master, self.poll.program_poll_us, timeout_us).await
    }
}
