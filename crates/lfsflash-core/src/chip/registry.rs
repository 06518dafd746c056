//! Static table of supported chips
//!
//! Entries are matched by exact 3-byte identity, in table order; the first
//! match wins. Timing columns are worst-case datasheet figures and are used
//! as polling budgets, so keep them conservative.

use super::types::{manufacturer, ChipDescriptor};
use crate::spi::{opcodes, AddressWidth};
use manufacturer::{GIGADEVICE, ISSI, MACRONIX, MICRON, SPANSION, WINBOND};
use AddressWidth::{FourByte, ThreeByte};

const KIB: u32 = 1024;
const MIB: u32 = 1024 * 1024;

/// Describe a uniform-sector chip with 256-byte pages and 4 KiB sector erase
const fn sector_4k(
    vendor: &'static str,
    name: &'static str,
    id: [u8; 3],
    address_width: AddressWidth,
    total_size: u32,
    program_timeout_us: u32,
    erase_timeout_us: u32,
) -> ChipDescriptor {
    ChipDescriptor {
        vendor,
        name,
        id,
        address_width,
        page_size: 256,
        erase_block_size: 4 * KIB,
        total_size,
        erase_opcode: opcodes::SE_20,
        program_timeout_us,
        erase_timeout_us,
    }
}

/// Every chip the driver knows how to operate
pub static KNOWN_CHIPS: &[ChipDescriptor] = &[
    // Winbond W25Q..JV: tPP 3 ms, tSE 400 ms
    sector_4k("Winbond", "W25Q16JV", [WINBOND, 0x40, 0x15], ThreeByte, 2 * MIB, 3_000, 400_000),
    sector_4k("Winbond", "W25Q32JV", [WINBOND, 0x40, 0x16], ThreeByte, 4 * MIB, 3_000, 400_000),
    sector_4k("Winbond", "W25Q64JV", [WINBOND, 0x40, 0x17], ThreeByte, 8 * MIB, 3_000, 400_000),
    sector_4k("Winbond", "W25Q128JV", [WINBOND, 0x40, 0x18], ThreeByte, 16 * MIB, 3_000, 400_000),
    sector_4k("Winbond", "W25Q256JV", [WINBOND, 0x40, 0x19], FourByte, 32 * MIB, 3_000, 400_000),
    sector_4k("Winbond", "W25Q512JV", [WINBOND, 0x40, 0x20], FourByte, 64 * MIB, 3_500, 400_000),
    sector_4k("Winbond", "W25Q01JV", [WINBOND, 0x40, 0x21], FourByte, 128 * MIB, 3_500, 400_000),
    // Macronix
    sector_4k("Macronix", "MX25L3233F", [MACRONIX, 0x20, 0x16], ThreeByte, 4 * MIB, 1_500, 240_000),
    sector_4k("Macronix", "MX25L6433F", [MACRONIX, 0x20, 0x17], ThreeByte, 8 * MIB, 1_500, 240_000),
    sector_4k("Macronix", "MX25L12833F", [MACRONIX, 0x20, 0x18], ThreeByte, 16 * MIB, 1_500, 240_000),
    sector_4k("Macronix", "MX25L25645G", [MACRONIX, 0x20, 0x19], FourByte, 32 * MIB, 750, 400_000),
    sector_4k("Macronix", "MX25L51245G", [MACRONIX, 0x20, 0x1A], FourByte, 64 * MIB, 750, 400_000),
    // GigaDevice
    sector_4k("GigaDevice", "GD25Q64C", [GIGADEVICE, 0x40, 0x17], ThreeByte, 8 * MIB, 2_400, 300_000),
    sector_4k("GigaDevice", "GD25Q127C", [GIGADEVICE, 0x40, 0x18], ThreeByte, 16 * MIB, 2_400, 300_000),
    // Micron
    sector_4k("Micron", "N25Q256A", [MICRON, 0xBA, 0x19], FourByte, 32 * MIB, 5_000, 400_000),
    sector_4k("Micron", "MT25QL512AB", [MICRON, 0xBA, 0x20], FourByte, 64 * MIB, 1_800, 400_000),
    // ISSI
    sector_4k("ISSI", "IS25LP256D", [ISSI, 0x60, 0x19], FourByte, 32 * MIB, 800, 300_000),
    // Spansion S25FL512S: 512-byte page buffer, uniform 256 KiB sectors only
    ChipDescriptor {
        vendor: "Spansion",
        name: "S25FL512S",
        id: [SPANSION, 0x02, 0x20],
        address_width: FourByte,
        page_size: 512,
        erase_block_size: 256 * KIB,
        total_size: 64 * MIB,
        erase_opcode: opcodes::BE_D8,
        program_timeout_us: 2_000,
        erase_timeout_us: 2_600_000,
    },
];

/// Find the descriptor for a chip by its identity bytes
///
/// Returns `None` if no entry matches exactly.
pub fn lookup(id: &[u8; 3]) -> Option<&'static ChipDescriptor> {
    KNOWN_CHIPS.iter().find(|chip| chip.matches_id(id))
}

/// Find a descriptor by model name (case-insensitive exact match)
pub fn find_by_name(name: &str) -> Option<&'static ChipDescriptor> {
    KNOWN_CHIPS
        .iter()
        .find(|chip| chip.name.eq_ignore_ascii_case(name))
}
