//! SPI command structure

use super::AddressWidth;

/// Encoded opcode and address bytes (at most 1 + 4)
pub type CommandHeader = heapless::Vec<u8, 5>;

/// A single chip-select framed SPI transaction
///
/// Designed to avoid allocation - uses slices for data.
/// The lifetime parameter `'a` ties the command to the buffers it references.
/// A bus master asserts chip-select, clocks out the header and `write_data`,
/// clocks in `read_buf`, then releases chip-select.
pub struct SpiCommand<'a> {
    /// The opcode byte
    pub opcode: u8,

    /// Address (if any)
    pub address: Option<u32>,

    /// Address width
    pub address_width: AddressWidth,

    /// Data to write after opcode/address
    pub write_data: &'a [u8],

    /// Buffer to read into (mutable)
    pub read_buf: &'a mut [u8],
}

impl<'a> SpiCommand<'a> {
    /// Create a simple command with no address or data (e.g., WREN)
    pub fn simple(opcode: u8) -> Self {
        Self {
            opcode,
            address: None,
            address_width: AddressWidth::None,
            write_data: &[],
            read_buf: &mut [],
        }
    }

    /// Create a read register command with no address (e.g., RDSR, RDID)
    pub fn read_reg(opcode: u8, buf: &'a mut [u8]) -> Self {
        Self {
            opcode,
            address: None,
            address_width: AddressWidth::None,
            write_data: &[],
            read_buf: buf,
        }
    }

    /// Create an addressed read command
    pub fn read(opcode: u8, width: AddressWidth, addr: u32, buf: &'a mut [u8]) -> Self {
        Self {
            opcode,
            address: Some(addr),
            address_width: width,
            write_data: &[],
            read_buf: buf,
        }
    }

    /// Create an addressed write command (e.g., PP)
    pub fn write(opcode: u8, width: AddressWidth, addr: u32, data: &'a [u8]) -> Self {
        Self {
            opcode,
            address: Some(addr),
            address_width: width,
            write_data: data,
            read_buf: &mut [],
        }
    }

    /// Create an addressed erase command
    pub fn erase(opcode: u8, width: AddressWidth, addr: u32) -> Self {
        Self {
            opcode,
            address: Some(addr),
            address_width: width,
            write_data: &[],
            read_buf: &mut [],
        }
    }

    /// Returns true if this command has an address phase
    pub fn has_address(&self) -> bool {
        self.address.is_some()
    }

    /// Number of header bytes (opcode + address)
    pub fn header_len(&self) -> usize {
        1 + if self.has_address() {
            self.address_width.bytes() as usize
        } else {
            0
        }
    }

    /// Encode opcode and address as they go out on the wire
    pub fn header(&self) -> CommandHeader {
        let mut header = CommandHeader::new();
        let mut buf = [0u8; 5];
        buf[0] = self.opcode;
        let addr_len = match self.address {
            Some(addr) => self.address_width.encode(addr, &mut buf[1..]),
            None => 0,
        };
        // Capacity is exactly opcode + widest address
        let _ = header.extend_from_slice(&buf[..1 + addr_len]);
        header
    }

    /// Calculate the total number of bytes clocked on the bus
    pub fn total_bytes(&self) -> usize {
        self.header_len() + self.write_data.len() + self.read_buf.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spi::opcodes;

    #[test]
    fn test_header_three_byte() {
        let mut buf = [0u8; 4];
        let cmd = SpiCommand::read(opcodes::READ, AddressWidth::ThreeByte, 0x012345, &mut buf);
        assert_eq!(cmd.header().as_slice(), &[0x03, 0x01, 0x23, 0x45]);
        assert_eq!(cmd.total_bytes(), 8);
    }

    #[test]
    fn test_header_four_byte() {
        let cmd = SpiCommand::erase(opcodes::SE_21, AddressWidth::FourByte, 0x0123_4567);
        assert_eq!(cmd.header().as_slice(), &[0x21, 0x01, 0x23, 0x45, 0x67]);
    }

    #[test]
    fn test_header_no_address() {
        let cmd = SpiCommand::simple(opcodes::WREN);
        assert_eq!(cmd.header().as_slice(), &[0x06]);
        assert_eq!(cmd.header_len(), 1);
    }
}
