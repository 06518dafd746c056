//! lfsflash-core - Block device driver for raw SPI NOR flash
//!
//! This crate lets a log-structured flash filesystem run directly on a serial
//! NOR chip while keeping physical erases to a minimum. It provides:
//!
//! - a static registry of supported chips, keyed by their 3-byte JEDEC identity
//! - the SPI25 wire protocol (command/address framing, write-enable, busy polling)
//! - a [`flash::BlockDevice`] adapter exposing `read`/`prog`/`erase`/`sync`
//! - usage and blank tracking that lets redundant erases be skipped and idle
//!   time be spent pre-erasing spare blocks
//! - [`fs::FlashFs`], the mount/format lifecycle around an external filesystem
//!   engine
//!
//! # Features
//!
//! - `std` - Implement `std::error::Error` for [`Error`]
//! - `is_sync` - Compile the bus-facing API as blocking functions. Without it
//!   every operation is `async` and busy-polling yields between status reads.
//!
//! # Example
//!
//! ```ignore
//! use lfsflash_core::fs::{FlashFs, FsConfig};
//!
//! let mut fs = FlashFs::begin(spi, engine, FsConfig::default())?;
//! // spend an idle window pre-erasing up to 8 spare blocks
//! let erased = fs.format_unused(8)?;
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
// Allow async fn in traits - we use maybe-async for dual sync/async support
#![allow(async_fn_in_trait)]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod chip;
pub mod error;
pub mod flash;
pub mod fs;
pub mod programmer;
pub mod protocol;
pub mod spi;
pub mod tracking;

pub use error::{Error, Result};
