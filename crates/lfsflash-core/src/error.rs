//! Error types for lfsflash-core
//!
//! A single no_std compatible error type is used throughout the crate.
//! Filesystem engines speak in negative integer codes, so every error can be
//! translated with [`Error::code`].

use thiserror::Error;

/// Error codes understood by littlefs-style filesystem engines
pub mod code {
    /// Input/output error during a device operation
    pub const IO: i32 = -5;
    /// Invalid parameter
    pub const INVAL: i32 = -22;
    /// No more memory available
    pub const NOMEM: i32 = -12;
    /// No space left on the device
    pub const NOSPC: i32 = -28;
    /// Corrupted data or metadata
    pub const CORRUPT: i32 = -84;
}

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    // Chip errors
    /// Identity bytes did not match any known chip
    #[error("flash chip not recognized (id {id:02X?})")]
    ChipNotRecognized {
        /// The identity bytes returned by the chip
        id: [u8; 3],
    },

    // Bus errors
    /// The busy bit never cleared within the chip's budget
    #[error("flash stayed busy for more than {timeout_us} us")]
    TransportTimeout {
        /// The budget that was exceeded, in microseconds
        timeout_us: u32,
    },
    /// SPI transfer failed
    #[error("SPI transfer failed")]
    SpiTransferFailed,
    /// Opcode is not supported by the bus master or the chip
    #[error("SPI opcode 0x{0:02X} not supported")]
    OpcodeNotSupported(u8),
    /// Program or erase attempted without the write enable latch set
    #[error("flash chip is write protected")]
    WriteProtected,

    // Address errors
    /// Address is beyond the flash chip size
    #[error("address out of bounds")]
    AddressOutOfBounds,
    /// Block index or in-block range is outside the device geometry
    #[error("block {0} access out of range")]
    BlockOutOfRange(u32),

    // Filesystem lifecycle errors
    /// The filesystem engine rejected the mount
    #[error("mount failed (engine code {0})")]
    MountFailure(i32),
    /// The filesystem engine could not format the device
    #[error("format failed (engine code {0})")]
    FormatFailure(i32),
    /// Usage traversal aborted
    #[error("usage traversal failed (engine code {0})")]
    TraversalFailure(i32),
    /// Operation requires a mounted filesystem
    #[error("filesystem not mounted")]
    NotMounted,
    /// Operation is not valid in the current device state
    #[error("operation not valid in the current device state")]
    InvalidState,
}

impl Error {
    /// Translate this error into a filesystem engine error code
    ///
    /// Every bus failure, timeouts included, surfaces as an I/O error.
    pub const fn code(&self) -> i32 {
        match self {
            Self::TransportTimeout { .. }
            | Self::SpiTransferFailed
            | Self::OpcodeNotSupported(_)
            | Self::WriteProtected
            | Self::ChipNotRecognized { .. } => code::IO,
            Self::AddressOutOfBounds | Self::BlockOutOfRange(_) | Self::InvalidState => {
                code::INVAL
            }
            Self::NotMounted => code::INVAL,
            Self::MountFailure(c) | Self::FormatFailure(c) | Self::TraversalFailure(c) => *c,
        }
    }
}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
