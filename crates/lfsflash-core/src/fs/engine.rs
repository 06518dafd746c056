//! Filesystem engine seam
//!
//! The engine owns allocation, directories and crash consistency. This crate
//! only needs it to format, mount, unmount and enumerate the blocks its
//! committed metadata reaches.

use crate::error::Error;
use crate::flash::BlockDevice;
use core::fmt;
use maybe_async::maybe_async;

/// Negative error code reported by a filesystem engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineError(pub i32);

impl EngineError {
    /// The raw error code
    pub const fn code(self) -> i32 {
        self.0
    }
}

impl From<Error> for EngineError {
    fn from(e: Error) -> Self {
        Self(e.code())
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "filesystem engine error {}", self.0)
    }
}

/// Result type for engine operations
pub type EngineResult<T> = core::result::Result<T, EngineError>;

/// Operations this crate needs from a filesystem engine
///
/// `D` is the block device the engine runs on; engines call back into it
/// for every read, program and erase.
#[maybe_async(AFIT)]
pub trait FilesystemEngine<D: BlockDevice> {
    /// Write a fresh, empty filesystem to the device
    async fn format(&mut self, device: &mut D) -> EngineResult<()>;

    /// Attach to the filesystem on the device
    async fn mount(&mut self, device: &mut D) -> EngineResult<()>;

    /// Detach from the device
    async fn unmount(&mut self, device: &mut D) -> EngineResult<()>;

    /// Call `visit` once for every block reachable from committed metadata
    ///
    /// A negative return from `visit` aborts the traversal and is returned
    /// as the error.
    async fn traverse(
        &mut self,
        device: &mut D,
        visit: &mut dyn FnMut(u32) -> i32,
    ) -> EngineResult<()>;
}
