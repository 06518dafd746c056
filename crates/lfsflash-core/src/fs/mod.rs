//! Filesystem engine integration
//!
//! The engine itself lives outside this crate and is reached through
//! [`FilesystemEngine`]. [`FlashFs`] runs the mount and format lifecycle
//! around it.

mod config;
mod engine;
mod filesystem;

pub use config::{FsConfig, DEFAULT_BLOCK_CYCLES};
pub use engine::{EngineError, EngineResult, FilesystemEngine};
pub use filesystem::{DeviceState, FlashFs, UsageStats};
