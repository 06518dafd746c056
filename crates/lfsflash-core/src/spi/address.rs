//! Address width types

/// Address width for SPI commands
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AddressWidth {
    /// No address phase
    #[default]
    None,
    /// 3-byte (24-bit) address - supports up to 16 MiB
    ThreeByte,
    /// 4-byte (32-bit) address - supports up to 4 GiB
    FourByte,
}

impl AddressWidth {
    /// Address width for a chip with the given number of address bits
    pub const fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            24 => Some(Self::ThreeByte),
            32 => Some(Self::FourByte),
            _ => None,
        }
    }

    /// Returns the number of address bits
    pub const fn bits(&self) -> u8 {
        self.bytes() * 8
    }

    /// Returns the number of address bytes
    pub const fn bytes(&self) -> u8 {
        match self {
            Self::None => 0,
            Self::ThreeByte => 3,
            Self::FourByte => 4,
        }
    }

    /// Returns the maximum addressable size in bytes
    pub const fn max_size(&self) -> u64 {
        match self {
            Self::None => 0,
            Self::ThreeByte => 1 << 24,
            Self::FourByte => 1 << 32,
        }
    }

    /// Encode an address big-endian into `buf`
    ///
    /// Returns the number of bytes written. `buf` must hold at least
    /// [`bytes()`](Self::bytes) bytes.
    pub fn encode(&self, address: u32, buf: &mut [u8]) -> usize {
        let be = address.to_be_bytes();
        match self {
            Self::None => 0,
            Self::ThreeByte => {
                buf[..3].copy_from_slice(&be[1..]);
                3
            }
            Self::FourByte => {
                buf[..4].copy_from_slice(&be);
                4
            }
        }
    }
}
