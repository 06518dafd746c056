//! Status register 1 decoding

use bitflags::bitflags;

bitflags! {
    /// Status register 1 bits relevant to program/erase sequencing
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct StatusRegister: u8 {
        /// Write In Progress - a program or erase is still running
        const BUSY               = 1 << 0;
        /// Write Enable Latch - set by WREN, cleared when a program/erase completes
        const WRITE_ENABLE_LATCH = 1 << 1;
    }
}

impl StatusRegister {
    /// Returns true while a program or erase is in flight
    pub const fn is_busy(&self) -> bool {
        self.contains(Self::BUSY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_busy_is_bit_zero() {
        assert!(StatusRegister::from_bits_truncate(0x01).is_busy());
        assert!(StatusRegister::from_bits_truncate(0x03).is_busy());
        assert!(!StatusRegister::from_bits_truncate(0x02).is_busy());
        // Protection bits are ignored
        assert!(!StatusRegister::from_bits_truncate(0xFC).is_busy());
    }
}
