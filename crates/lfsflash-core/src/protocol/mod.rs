//! Protocol implementations
//!
//! This module contains the SPI25 command sequences the driver is built on.

mod spi25;

pub use spi25::*;
