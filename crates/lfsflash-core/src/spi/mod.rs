//! SPI types and command structures
//!
//! This module provides types for representing SPI transactions,
//! status register decoding, and the JEDEC opcodes used by the driver.

mod address;
mod command;
pub mod opcodes;
mod status;

pub use address::AddressWidth;
pub use command::{CommandHeader, SpiCommand};
pub use opcodes::*;
pub use status::StatusRegister;
