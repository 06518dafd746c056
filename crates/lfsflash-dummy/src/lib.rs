//! lfsflash-dummy - In-memory SPI NOR flash emulator for testing
//!
//! [`DummyFlash`] answers the SPI25 commands the driver issues the way a
//! real chip does: programs can only clear bits and wrap inside a page,
//! program and erase need a preceding write-enable, and the busy bit stays
//! set for a configurable number of status reads. Counters expose what
//! reached the "chip" so tests can assert on physical work.

use lfsflash_core::chip::ChipDescriptor;
use lfsflash_core::error::{Error, Result};
use lfsflash_core::programmer::SpiMaster;
use lfsflash_core::spi::{opcodes, AddressWidth, CommandHeader, SpiCommand, StatusRegister};
use maybe_async::maybe_async;

/// Configuration for the dummy flash
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// Identity bytes returned by read-identity
    pub id: [u8; 3],
    /// Flash size in bytes
    pub size: usize,
    /// Page size for programming
    pub page_size: usize,
    /// Size erased by any erase opcode
    pub erase_size: usize,
    /// Status reads that report busy after each program or erase
    pub busy_polls: u32,
    /// Never leave the busy state once a program or erase was issued
    pub stuck_busy: bool,
    /// Largest read transaction accepted
    pub max_read_len: usize,
    /// Largest write transaction accepted
    pub max_write_len: usize,
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self {
            id: [0xEF, 0x40, 0x17], // W25Q64JV
            size: 8 * 1024 * 1024,
            page_size: 256,
            erase_size: 4096,
            busy_polls: 0,
            stuck_busy: false,
            max_read_len: 4096,
            max_write_len: 256,
        }
    }
}

impl DummyConfig {
    /// Emulate a chip from the registry
    pub fn from_chip(chip: &ChipDescriptor) -> Self {
        Self {
            id: chip.id,
            size: chip.total_size as usize,
            page_size: chip.page_size as usize,
            erase_size: chip.erase_block_size as usize,
            max_write_len: chip.page_size as usize,
            ..Self::default()
        }
    }

    /// Report busy for `polls` status reads after each program or erase
    pub fn with_busy_polls(mut self, polls: u32) -> Self {
        self.busy_polls = polls;
        self
    }

    /// Stay busy forever after the first program or erase
    pub fn with_stuck_busy(mut self) -> Self {
        self.stuck_busy = true;
        self
    }

    /// Limit read transactions to `len` bytes
    pub fn with_max_read_len(mut self, len: usize) -> Self {
        self.max_read_len = len;
        self
    }
}

/// Dummy flash chip
///
/// Emulates a serial NOR chip in memory. Starts fully erased.
pub struct DummyFlash {
    config: DummyConfig,
    data: Vec<u8>,
    write_enabled: bool,
    busy_remaining: u32,
    stuck: bool,
    erases: Vec<u32>,
    programs: u32,
    status_reads: u32,
    elapsed_us: u64,
    last_header: Option<CommandHeader>,
}

impl DummyFlash {
    /// Create a new dummy flash with the given configuration
    pub fn new(config: DummyConfig) -> Self {
        let data = vec![opcodes::ERASED_VALUE; config.size];
        Self {
            config,
            data,
            write_enabled: false,
            busy_remaining: 0,
            stuck: false,
            erases: Vec::new(),
            programs: 0,
            status_reads: 0,
            elapsed_us: 0,
            last_header: None,
        }
    }

    /// Create a new dummy flash emulating a W25Q64JV
    pub fn new_default() -> Self {
        Self::new(DummyConfig::default())
    }

    /// Create a dummy flash emulating `chip`
    pub fn for_chip(chip: &ChipDescriptor) -> Self {
        Self::new(DummyConfig::from_chip(chip))
    }

    /// Get a reference to the flash data
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Get a mutable reference to the flash data
    ///
    /// Changes made here bypass every counter.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Get the configuration
    pub fn config(&self) -> &DummyConfig {
        &self.config
    }

    /// Number of erase commands executed
    pub fn erase_count(&self) -> usize {
        self.erases.len()
    }

    /// Start address of every executed erase, in order
    pub fn erase_log(&self) -> &[u32] {
        &self.erases
    }

    /// Forget the recorded erases
    pub fn clear_erase_log(&mut self) {
        self.erases.clear();
    }

    /// Number of page program commands executed
    pub fn program_count(&self) -> u32 {
        self.programs
    }

    /// Number of status register reads
    pub fn status_reads(&self) -> u32 {
        self.status_reads
    }

    /// Total time spent in `delay_us`
    pub fn elapsed_us(&self) -> u64 {
        self.elapsed_us
    }

    /// Opcode and address bytes of the most recent transaction
    pub fn last_header(&self) -> Option<&CommandHeader> {
        self.last_header.as_ref()
    }

    fn start_busy(&mut self) {
        self.busy_remaining = self.config.busy_polls;
        if self.config.stuck_busy {
            self.stuck = true;
        }
    }

    fn status(&mut self) -> StatusRegister {
        let mut status = StatusRegister::empty();
        if self.stuck || self.busy_remaining > 0 {
            status |= StatusRegister::BUSY;
            self.busy_remaining = self.busy_remaining.saturating_sub(1);
        }
        if self.write_enabled {
            status |= StatusRegister::WRITE_ENABLE_LATCH;
        }
        status
    }

    /// Validate the address phase against the opcode's address width
    fn get_address(&self, cmd: &SpiCommand<'_>, expected: AddressWidth) -> Result<usize> {
        if cmd.address_width != expected {
            log::warn!(
                "opcode 0x{:02X} sent with {:?} address",
                cmd.opcode,
                cmd.address_width
            );
            return Err(Error::SpiTransferFailed);
        }
        let addr = cmd.address.ok_or(Error::SpiTransferFailed)?;
        let addr = match expected {
            AddressWidth::ThreeByte => addr & 0x00FF_FFFF,
            _ => addr,
        };
        Ok(addr as usize)
    }

    fn handle_read(&mut self, cmd: &mut SpiCommand<'_>, width: AddressWidth) -> Result<()> {
        let addr = self.get_address(cmd, width)?;
        let len = cmd.read_buf.len();

        if addr + len > self.data.len() {
            return Err(Error::AddressOutOfBounds);
        }

        cmd.read_buf.copy_from_slice(&self.data[addr..addr + len]);
        Ok(())
    }

    fn handle_page_program(&mut self, cmd: &SpiCommand<'_>, width: AddressWidth) -> Result<()> {
        if !self.write_enabled {
            return Err(Error::WriteProtected);
        }

        let addr = self.get_address(cmd, width)?;
        if addr >= self.data.len() {
            return Err(Error::AddressOutOfBounds);
        }

        // Writes past the end of a page wrap to its start
        let page_size = self.config.page_size;
        let page_base = addr - addr % page_size;
        for (i, &byte) in cmd.write_data.iter().enumerate() {
            let offset = (addr % page_size + i) % page_size;
            // Flash programming: can only change 1 -> 0
            self.data[page_base + offset] &= byte;
        }

        self.programs += 1;
        self.write_enabled = false;
        self.start_busy();
        Ok(())
    }

    fn handle_erase(&mut self, cmd: &SpiCommand<'_>, width: AddressWidth) -> Result<()> {
        if !self.write_enabled {
            return Err(Error::WriteProtected);
        }

        let addr = self.get_address(cmd, width)?;
        let erase_size = self.config.erase_size;

        // Align address to erase boundary
        let aligned_addr = addr - addr % erase_size;

        if aligned_addr + erase_size > self.data.len() {
            return Err(Error::AddressOutOfBounds);
        }

        self.data[aligned_addr..aligned_addr + erase_size].fill(opcodes::ERASED_VALUE);
        self.erases.push(aligned_addr as u32);

        self.write_enabled = false;
        self.start_busy();
        Ok(())
    }
}

#[maybe_async(AFIT)]
impl SpiMaster for DummyFlash {
    fn max_read_len(&self) -> usize {
        self.config.max_read_len
    }

    fn max_write_len(&self) -> usize {
        self.config.max_write_len
    }

    async fn execute(&mut self, cmd: &mut SpiCommand<'_>) -> Result<()> {
        self.last_header = Some(cmd.header());

        match cmd.opcode {
            opcodes::RDID => {
                let n = cmd.read_buf.len().min(3);
                cmd.read_buf[..n].copy_from_slice(&self.config.id[..n]);
                Ok(())
            }

            opcodes::RDSR => {
                self.status_reads += 1;
                let status = self.status();
                if let Some(byte) = cmd.read_buf.first_mut() {
                    *byte = status.bits();
                }
                Ok(())
            }

            opcodes::WREN => {
                self.write_enabled = true;
                Ok(())
            }

            opcodes::READ => self.handle_read(cmd, AddressWidth::ThreeByte),
            opcodes::READ_4B => self.handle_read(cmd, AddressWidth::FourByte),

            opcodes::PP => self.handle_page_program(cmd, AddressWidth::ThreeByte),
            opcodes::PP_4B => self.handle_page_program(cmd, AddressWidth::FourByte),

            opcodes::SE_20 | opcodes::BE_52 | opcodes::BE_D8 => {
                self.handle_erase(cmd, AddressWidth::ThreeByte)
            }
            opcodes::SE_21 | opcodes::BE_5C | opcodes::BE_DC => {
                self.handle_erase(cmd, AddressWidth::FourByte)
            }

            op => Err(Error::OpcodeNotSupported(op)),
        }
    }

    async fn delay_us(&mut self, us: u32) {
        self.elapsed_us += us as u64;
    }
}
