//! Flash block devices
//!
//! [`Transport`] issues the primitive chip operations; [`FlashBlockDevice`]
//! puts the [`BlockDevice`] contract on top of it with erase avoidance.
//! [`RamBlockDevice`] offers the same contract backed by memory.

mod block_device;
mod device;
mod probe;
mod ram;
mod transport;

pub use block_device::FlashBlockDevice;
pub use device::{BlockDevice, BlockGeometry, DEFAULT_NAME_MAX};
pub use probe::probe;
pub use ram::{
    mount_fresh, RamBlockDevice, RAM_BLOCK_CYCLES, RAM_BLOCK_SIZE, RAM_IO_SIZE, RAM_NAME_MAX,
};
pub use transport::{PollConfig, Transport};
