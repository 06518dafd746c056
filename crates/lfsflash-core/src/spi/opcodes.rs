//! JEDEC SPI flash opcodes
//!
//! Only the commands the block driver issues are listed here. Data commands
//! come in pairs: one for 3-byte addressing and one for 4-byte addressing.

// ============================================================================
// Write control
// ============================================================================

/// Write Enable - required before any program/erase operation
pub const WREN: u8 = 0x06;

// ============================================================================
// Status register operations
// ============================================================================

/// Read Status Register 1
pub const RDSR: u8 = 0x05;

// ============================================================================
// Identification
// ============================================================================

/// Read JEDEC ID (manufacturer + 2-byte device ID)
pub const RDID: u8 = 0x9F;

// ============================================================================
// Read commands
// ============================================================================

/// Read Data with 3-byte address
pub const READ: u8 = 0x03;
/// Read Data with 4-byte address
pub const READ_4B: u8 = 0x13;

// ============================================================================
// Page Program
// ============================================================================

/// Page Program with 3-byte address
pub const PP: u8 = 0x02;
/// Page Program with 4-byte address
pub const PP_4B: u8 = 0x12;

// ============================================================================
// Erase commands - 3-byte address
// ============================================================================

/// Sector Erase 4KB with 3-byte address
pub const SE_20: u8 = 0x20;
/// Block Erase 32KB with 3-byte address
pub const BE_52: u8 = 0x52;
/// Block Erase 64KB (256KB on some Spansion parts) with 3-byte address
pub const BE_D8: u8 = 0xD8;

// ============================================================================
// Erase commands - 4-byte address
// ============================================================================

/// Sector Erase 4KB with 4-byte address
pub const SE_21: u8 = 0x21;
/// Block Erase 32KB with 4-byte address
pub const BE_5C: u8 = 0x5C;
/// Block Erase 64KB with 4-byte address
pub const BE_DC: u8 = 0xDC;

/// Map a 3-byte erase opcode to its 4-byte equivalent
pub const fn erase_opcode_4b(opcode: u8) -> u8 {
    match opcode {
        SE_20 => SE_21,
        BE_52 => BE_5C,
        BE_D8 => BE_DC,
        _ => opcode,
    }
}

/// Value every byte reads back as after an erase
pub const ERASED_VALUE: u8 = 0xFF;
