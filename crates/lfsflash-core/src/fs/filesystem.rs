//! Device lifecycle
//!
//! [`FlashFs`] ties a bus master, a filesystem engine and the tracking layer
//! together and walks them through identification, mounting and
//! formatting.

use super::{FilesystemEngine, FsConfig};
use crate::chip::ChipDescriptor;
use crate::error::{Error, Result};
use crate::flash::{self, BlockDevice, BlockGeometry, FlashBlockDevice, Transport};
use crate::programmer::SpiMaster;
use crate::tracking::{MutationEpoch, UsageTracker};
use maybe_async::maybe_async;

/// Lifecycle state of a [`FlashFs`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceState {
    /// No chip has been identified yet
    Unconfigured,
    /// Reading the chip identity
    Identifying,
    /// The last mount or format attempt failed
    MountFailed,
    /// The filesystem is mounted
    Mounted,
    /// The chip is identified but no filesystem is mounted
    Unmounted,
    /// A format is in progress
    Formatting,
}

/// Block usage summary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageStats {
    /// Blocks referenced by the mounted filesystem
    pub used: u32,
    /// Blocks known to be blank
    pub blank: u32,
    /// Blocks on the device
    pub total: u32,
}

/// A filesystem engine mounted on a serial NOR chip
pub struct FlashFs<M, E>
where
    M: SpiMaster,
    E: FilesystemEngine<FlashBlockDevice<M>>,
{
    device: FlashBlockDevice<M>,
    engine: E,
    usage: UsageTracker,
    config: FsConfig,
    state: DeviceState,
}

impl<M, E> FlashFs<M, E>
where
    M: SpiMaster,
    E: FilesystemEngine<FlashBlockDevice<M>>,
{
    /// Identify the chip and mount its filesystem
    ///
    /// A failed mount is followed by one format and a second mount when
    /// [`FsConfig::format_on_mount_failure`] is set.
    #[maybe_async]
    pub async fn begin(master: M, engine: E, config: FsConfig) -> Result<Self> {
        let mut fs = Self::attach(master, engine, config).await?;
        fs.mount().await?;
        Ok(fs)
    }

    /// Identify the chip without mounting
    ///
    /// The returned instance is [`DeviceState::Unmounted`].
    #[maybe_async]
    pub async fn attach(mut master: M, engine: E, config: FsConfig) -> Result<Self> {
        let mut state = DeviceState::Unconfigured;
        transition(&mut state, DeviceState::Identifying);
        let chip = flash::probe(&mut master).await?;

        let transport = Transport::new(master, chip, config.poll);
        let device = FlashBlockDevice::new(transport, config.block_cycles, config.name_max);
        transition(&mut state, DeviceState::Unmounted);

        Ok(Self {
            device,
            engine,
            usage: UsageTracker::new(),
            config,
            state,
        })
    }

    /// Current lifecycle state
    pub fn state(&self) -> DeviceState {
        self.state
    }

    /// Returns true while a filesystem is mounted
    pub fn is_mounted(&self) -> bool {
        self.state == DeviceState::Mounted
    }

    /// The identified chip
    pub fn chip(&self) -> &'static ChipDescriptor {
        self.device.chip()
    }

    /// Parameters handed to the engine
    pub fn geometry(&self) -> BlockGeometry {
        self.device.geometry()
    }

    /// Active configuration
    pub fn config(&self) -> &FsConfig {
        &self.config
    }

    /// The block device
    pub fn device(&self) -> &FlashBlockDevice<M> {
        &self.device
    }

    /// Mutable access to the block device
    pub fn device_mut(&mut self) -> &mut FlashBlockDevice<M> {
        &mut self.device
    }

    /// The filesystem engine
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Borrow the engine and the device it runs on together
    pub fn engine_and_device(&mut self) -> (&mut E, &mut FlashBlockDevice<M>) {
        (&mut self.engine, &mut self.device)
    }

    /// The usage cache
    pub fn usage(&self) -> &UsageTracker {
        &self.usage
    }

    /// Tear down and return the device and engine
    pub fn into_parts(self) -> (FlashBlockDevice<M>, E) {
        (self.device, self.engine)
    }

    fn set_state(&mut self, next: DeviceState) {
        transition(&mut self.state, next);
    }

    fn invalidate_usage(&mut self) {
        self.device.mark_stale();
        self.usage.invalidate();
    }

    fn require_mounted(&self) -> Result<()> {
        if self.is_mounted() {
            Ok(())
        } else {
            Err(Error::NotMounted)
        }
    }

    /// Mount the filesystem, formatting once if the first attempt fails
    ///
    /// Does nothing when already mounted.
    #[maybe_async]
    pub async fn mount(&mut self) -> Result<()> {
        match self.state {
            DeviceState::Mounted => return Ok(()),
            DeviceState::Unmounted | DeviceState::MountFailed => {}
            _ => return Err(Error::InvalidState),
        }
        self.invalidate_usage();
        self.device.forget_blank();

        let first = self.engine.mount(&mut self.device).await;
        let Err(e) = first else {
            log::info!("Mounted filesystem on {}", self.chip().name);
            self.set_state(DeviceState::Mounted);
            return Ok(());
        };

        if !self.config.format_on_mount_failure {
            log::warn!("Mount failed ({})", e.code());
            self.set_state(DeviceState::MountFailed);
            return Err(Error::MountFailure(e.code()));
        }

        log::warn!("Mount failed ({}), formatting", e.code());
        self.format_and_mount().await
    }

    #[maybe_async]
    async fn format_and_mount(&mut self) -> Result<()> {
        self.set_state(DeviceState::Formatting);
        self.invalidate_usage();

        if let Err(e) = self.engine.format(&mut self.device).await {
            log::warn!("Format failed ({})", e.code());
            self.set_state(DeviceState::MountFailed);
            return Err(Error::FormatFailure(e.code()));
        }
        log::info!("Formatted {}", self.chip().name);

        self.invalidate_usage();
        if let Err(e) = self.engine.mount(&mut self.device).await {
            log::warn!("Mount after format failed ({})", e.code());
            self.set_state(DeviceState::MountFailed);
            return Err(Error::MountFailure(e.code()));
        }

        log::info!("Mounted filesystem on {}", self.chip().name);
        self.set_state(DeviceState::Mounted);
        Ok(())
    }

    /// Unmount the filesystem
    ///
    /// The device ends up [`DeviceState::Unmounted`] even when the engine
    /// reports an error. Usage and blank tracking are dropped; the chip may
    /// be written by someone else before the next mount.
    #[maybe_async]
    pub async fn unmount(&mut self) -> Result<()> {
        self.require_mounted()?;
        let result = self.engine.unmount(&mut self.device).await;
        self.usage.invalidate();
        self.device.forget_blank();
        self.set_state(DeviceState::Unmounted);
        result.map_err(|e| Error::MountFailure(e.code()))
    }

    /// Unmount if mounted, then mount again
    #[maybe_async]
    pub async fn remount(&mut self) -> Result<()> {
        if self.is_mounted() {
            self.unmount().await?;
        }
        self.mount().await
    }

    /// Wipe the whole chip and create a fresh filesystem
    ///
    /// Blocks that already read as blank are not erased. Returns the number
    /// of physical erases the wipe needed.
    #[maybe_async]
    pub async fn low_level_format(&mut self) -> Result<u32> {
        if self.is_mounted() {
            self.unmount().await?;
        }
        match self.state {
            DeviceState::Unmounted | DeviceState::MountFailed => {}
            _ => return Err(Error::InvalidState),
        }

        self.set_state(DeviceState::Formatting);
        self.device.forget_blank();
        let erased = match self.device.wipe().await {
            Ok(erased) => erased,
            Err(e) => {
                self.set_state(DeviceState::MountFailed);
                return Err(e);
            }
        };

        self.format_and_mount().await?;
        Ok(erased)
    }

    /// Pre-erase up to `max_blocks` blocks the filesystem does not use
    ///
    /// Meant for idle windows; the bound keeps one call's latency
    /// predictable. Returns the number of blocks erased, zero once nothing
    /// is left to do.
    #[maybe_async]
    pub async fn format_unused(&mut self, max_blocks: u32) -> Result<u32> {
        self.require_mounted()?;
        if self.usage.is_stale(self.device.mutation_epoch()) {
            self.usage.refresh(&mut self.engine, &mut self.device).await?;
        }
        // The chip changed while the engine was traversing
        if self.usage.is_stale(self.device.mutation_epoch()) {
            log::debug!("format_unused: usage changed during traversal");
            return Err(Error::InvalidState);
        }
        let Some(used) = self.usage.used() else {
            return Err(Error::InvalidState);
        };
        self.device.format_unused(used, max_blocks).await
    }

    /// Returns true if `block` is referenced by the filesystem
    ///
    /// Anything that cannot be answered reliably, including an unmounted
    /// device, counts as used.
    #[maybe_async]
    pub async fn is_used(&mut self, block: u32) -> bool {
        if !self.is_mounted() {
            return true;
        }
        self.usage
            .is_used(&mut self.engine, &mut self.device, block)
            .await
    }

    /// Rebuild the usage cache now
    #[maybe_async]
    pub async fn refresh_usage(&mut self) -> Result<()> {
        self.require_mounted()?;
        self.usage.refresh(&mut self.engine, &mut self.device).await
    }

    /// Count used, blank and total blocks
    #[maybe_async]
    pub async fn usage_stats(&mut self) -> Result<UsageStats> {
        self.require_mounted()?;
        if self.usage.is_stale(self.device.mutation_epoch()) {
            self.usage.refresh(&mut self.engine, &mut self.device).await?;
        }
        Ok(UsageStats {
            used: self.usage.used().map_or(0, |used| used.count_set()),
            blank: self.device.blank_count(),
            total: self.geometry().block_count,
        })
    }
}

fn transition(state: &mut DeviceState, next: DeviceState) {
    if *state != next {
        log::debug!("state {:?} -> {:?}", state, next);
        *state = next;
    }
}
