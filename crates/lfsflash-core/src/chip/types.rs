//! Flash chip type definitions

use crate::flash::BlockGeometry;
use crate::spi::{opcodes, AddressWidth};

/// Flash chip descriptor
///
/// Geometry, addressing and worst-case timing of one chip model. The timing
/// values are the budgets busy polling is allowed to spend before a program
/// or erase is declared failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChipDescriptor {
    /// Vendor name (e.g., "Winbond")
    pub vendor: &'static str,
    /// Chip model name (e.g., "W25Q64JV")
    pub name: &'static str,
    /// Response to the read-identity command (manufacturer, device hi, device lo)
    pub id: [u8; 3],
    /// Addressing used for data commands
    pub address_width: AddressWidth,
    /// Page size in bytes (largest single program)
    pub page_size: u32,
    /// Size of the smallest erasable unit, in bytes
    pub erase_block_size: u32,
    /// Total flash size in bytes
    pub total_size: u32,
    /// 3-byte form of the erase opcode matching `erase_block_size`
    pub erase_opcode: u8,
    /// Worst-case page program time in microseconds
    pub program_timeout_us: u32,
    /// Worst-case block erase time in microseconds
    pub erase_timeout_us: u32,
}

impl ChipDescriptor {
    /// Number of erase blocks on the chip
    pub const fn block_count(&self) -> u32 {
        self.total_size / self.erase_block_size
    }

    /// Check if this chip matches the given identity bytes
    pub fn matches_id(&self, id: &[u8; 3]) -> bool {
        self.id == *id
    }

    /// Check if this chip requires 4-byte addressing
    pub const fn requires_4byte_addr(&self) -> bool {
        matches!(self.address_width, AddressWidth::FourByte)
    }

    /// Opcode for reading data at this chip's address width
    pub const fn read_opcode(&self) -> u8 {
        if self.requires_4byte_addr() {
            opcodes::READ_4B
        } else {
            opcodes::READ
        }
    }

    /// Opcode for page programming at this chip's address width
    pub const fn program_opcode(&self) -> u8 {
        if self.requires_4byte_addr() {
            opcodes::PP_4B
        } else {
            opcodes::PP
        }
    }

    /// Opcode for erasing one block at this chip's address width
    pub const fn block_erase_opcode(&self) -> u8 {
        if self.requires_4byte_addr() {
            opcodes::erase_opcode_4b(self.erase_opcode)
        } else {
            self.erase_opcode
        }
    }

    /// Absolute address of the first byte of `block`
    pub const fn block_address(&self, block: u32) -> u32 {
        block * self.erase_block_size
    }

    /// Engine parameters for a filesystem spanning the whole chip
    pub const fn geometry(&self, block_cycles: i32, name_max: u32) -> BlockGeometry {
        BlockGeometry::from_chip(self, block_cycles, name_max)
    }

    /// Total size in mebibytes, for log output
    pub fn size_mib(&self) -> f32 {
        self.total_size as f32 / (1024.0 * 1024.0)
    }
}

/// JEDEC manufacturer IDs
pub mod manufacturer {
    /// Spansion / Cypress / Infineon
    pub const SPANSION: u8 = 0x01;
    /// Micron (formerly Numonyx / ST)
    pub const MICRON: u8 = 0x20;
    /// ISSI
    pub const ISSI: u8 = 0x9D;
    /// Macronix
    pub const MACRONIX: u8 = 0xC2;
    /// GigaDevice
    pub const GIGADEVICE: u8 = 0xC8;
    /// Winbond
    pub const WINBOND: u8 = 0xEF;
}
