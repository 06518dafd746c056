//! Filesystem configuration

use crate::flash::{PollConfig, DEFAULT_NAME_MAX};

/// Default erase cycles before the engine relocates metadata
pub const DEFAULT_BLOCK_CYCLES: i32 = 400;

/// Settings for [`FlashFs`](super::FlashFs)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FsConfig {
    /// Erase cycles before the engine relocates a metadata block
    pub block_cycles: i32,
    /// Maximum file name length
    pub name_max: u32,
    /// Format the device and mount again when the first mount fails
    pub format_on_mount_failure: bool,
    /// Status polling intervals
    pub poll: PollConfig,
}

impl Default for FsConfig {
    fn default() -> Self {
        Self {
            block_cycles: DEFAULT_BLOCK_CYCLES,
            name_max: DEFAULT_NAME_MAX,
            format_on_mount_failure: true,
            poll: PollConfig::default(),
        }
    }
}

impl FsConfig {
    /// Set the block cycle count
    pub fn with_block_cycles(mut self, block_cycles: i32) -> Self {
        self.block_cycles = block_cycles;
        self
    }

    /// Set the maximum file name length
    pub fn with_name_max(mut self, name_max: u32) -> Self {
        self.name_max = name_max;
        self
    }

    /// Enable or disable the format-and-retry fallback on mount failure
    pub fn with_format_on_mount_failure(mut self, enabled: bool) -> Self {
        self.format_on_mount_failure = enabled;
        self
    }

    /// Set the status polling intervals
    pub fn with_poll(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }
}
