//! Usage tracking
//!
//! The set of blocks the mounted filesystem references is obtained by asking
//! the engine to traverse its metadata. The result is cached and tagged with
//! the device's mutation epoch; any program or erase after that makes the
//! cache stale.

use super::Bitset;
use crate::error::{code, Error, Result};
use crate::flash::BlockDevice;
use crate::fs::FilesystemEngine;
use maybe_async::maybe_async;

/// A block device that counts its own mutations
pub trait MutationEpoch {
    /// Value that changes whenever the device contents may have changed
    fn mutation_epoch(&self) -> u32;

    /// Force the epoch forward without touching the medium
    fn mark_stale(&mut self);
}

#[derive(Debug, Clone)]
struct Snapshot {
    used: Bitset,
    epoch: u32,
}

/// Cached set of blocks referenced by the mounted filesystem
#[derive(Debug, Clone, Default)]
pub struct UsageTracker {
    snapshot: Option<Snapshot>,
    refreshes: u32,
}

impl UsageTracker {
    /// Create a tracker with no cached usage
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop the cached usage
    pub fn invalidate(&mut self) {
        self.snapshot = None;
    }

    /// Number of traversals run so far
    pub fn refresh_count(&self) -> u32 {
        self.refreshes
    }

    /// Returns true if the cache is missing or older than `epoch`
    pub fn is_stale(&self, epoch: u32) -> bool {
        match &self.snapshot {
            Some(snapshot) => snapshot.epoch != epoch,
            None => true,
        }
    }

    /// The cached usage bitmap, fresh or not
    pub fn used(&self) -> Option<&Bitset> {
        self.snapshot.as_ref().map(|s| &s.used)
    }

    /// Rebuild the usage bitmap from a full engine traversal
    ///
    /// The traversal fills a scratch bitmap that only replaces the cache once
    /// it completes. The epoch is sampled before traversing, so a mutation
    /// made while it runs leaves the new snapshot stale. On failure the cache
    /// is dropped entirely.
    #[maybe_async]
    pub async fn refresh<D, E>(&mut self, engine: &mut E, device: &mut D) -> Result<()>
    where
        D: BlockDevice + MutationEpoch,
        E: FilesystemEngine<D>,
    {
        let block_count = device.geometry().block_count;
        let epoch = device.mutation_epoch();
        let mut scratch = Bitset::new(block_count);
        self.refreshes += 1;

        let mut visit = |block: u32| -> i32 {
            if block >= block_count {
                return code::CORRUPT;
            }
            scratch.set(block);
            0
        };

        let result = engine.traverse(device, &mut visit).await;
        match result {
            Ok(()) => {
                log::debug!(
                    "usage refreshed: {} of {} block(s) in use",
                    scratch.count_set(),
                    block_count
                );
                self.snapshot = Some(Snapshot {
                    used: scratch,
                    epoch,
                });
                Ok(())
            }
            Err(e) => {
                log::warn!("usage traversal failed ({})", e.code());
                self.snapshot = None;
                Err(Error::TraversalFailure(e.code()))
            }
        }
    }

    /// Returns true if `block` is referenced by the filesystem
    ///
    /// Refreshes once first when the cache is stale. When usage cannot be
    /// determined the block is reported as used.
    #[maybe_async]
    pub async fn is_used<D, E>(&mut self, engine: &mut E, device: &mut D, block: u32) -> bool
    where
        D: BlockDevice + MutationEpoch,
        E: FilesystemEngine<D>,
    {
        if self.is_stale(device.mutation_epoch()) && self.refresh(engine, device).await.is_err() {
            return true;
        }
        match &self.snapshot {
            Some(snapshot) => snapshot.used.test(block),
            None => true,
        }
    }
}

#[cfg(all(test, feature = "is_sync"))]
mod tests {
    use super::*;
    use crate::flash::RamBlockDevice;
    use crate::fs::{EngineError, EngineResult};
    use alloc::vec::Vec;

    /// Engine whose metadata references a fixed list of blocks
    struct ListEngine {
        blocks: Vec<u32>,
        fail: bool,
        write_during_traverse: bool,
        traversals: u32,
    }

    impl ListEngine {
        fn new(blocks: &[u32]) -> Self {
            Self {
                blocks: blocks.to_vec(),
                fail: false,
                write_during_traverse: false,
                traversals: 0,
            }
        }
    }

    impl FilesystemEngine<RamBlockDevice> for ListEngine {
        fn format(&mut self, _device: &mut RamBlockDevice) -> EngineResult<()> {
            Ok(())
        }

        fn mount(&mut self, _device: &mut RamBlockDevice) -> EngineResult<()> {
            Ok(())
        }

        fn unmount(&mut self, _device: &mut RamBlockDevice) -> EngineResult<()> {
            Ok(())
        }

        fn traverse(
            &mut self,
            device: &mut RamBlockDevice,
            visit: &mut dyn FnMut(u32) -> i32,
        ) -> EngineResult<()> {
            self.traversals += 1;
            if self.fail {
                return Err(EngineError(code::IO));
            }
            for &block in &self.blocks {
                let rc = visit(block);
                if rc < 0 {
                    return Err(EngineError(rc));
                }
            }
            if self.write_during_traverse {
                device.prog(0, 0, &[0])?;
            }
            Ok(())
        }
    }

    fn device() -> RamBlockDevice {
        RamBlockDevice::new(8 * 256).unwrap()
    }

    #[test]
    fn test_cached_until_mutation() {
        let mut dev = device();
        let mut engine = ListEngine::new(&[0, 1, 5]);
        let mut usage = UsageTracker::new();

        assert!(usage.is_used(&mut engine, &mut dev, 1));
        assert!(!usage.is_used(&mut engine, &mut dev, 2));
        assert!(usage.is_used(&mut engine, &mut dev, 5));
        assert_eq!(engine.traversals, 1);

        dev.prog(3, 0, &[0; 4]).unwrap();
        engine.blocks.push(3);
        assert!(usage.is_used(&mut engine, &mut dev, 3));
        assert!(!usage.is_used(&mut engine, &mut dev, 4));
        assert_eq!(engine.traversals, 2);
        assert_eq!(usage.refresh_count(), 2);
    }

    #[test]
    fn test_failed_traversal_counts_as_used() {
        let mut dev = device();
        let mut engine = ListEngine::new(&[0]);
        let mut usage = UsageTracker::new();
        usage.refresh(&mut engine, &mut dev).unwrap();
        assert!(usage.used().is_some());

        engine.fail = true;
        assert_eq!(
            usage.refresh(&mut engine, &mut dev),
            Err(Error::TraversalFailure(code::IO))
        );
        assert!(usage.used().is_none());
        assert!(usage.is_used(&mut engine, &mut dev, 7));
    }

    #[test]
    fn test_out_of_range_visit_aborts() {
        let mut dev = device();
        let mut engine = ListEngine::new(&[2, 8, 3]);
        let mut usage = UsageTracker::new();
        assert_eq!(
            usage.refresh(&mut engine, &mut dev),
            Err(Error::TraversalFailure(code::CORRUPT))
        );
        assert!(usage.used().is_none());
    }

    #[test]
    fn test_mutation_during_traversal_leaves_snapshot_stale() {
        let mut dev = device();
        let mut engine = ListEngine::new(&[1]);
        engine.write_during_traverse = true;
        let mut usage = UsageTracker::new();

        usage.refresh(&mut engine, &mut dev).unwrap();
        assert!(usage.is_stale(dev.mutation_epoch()));

        engine.write_during_traverse = false;
        assert!(usage.is_used(&mut engine, &mut dev, 1));
        assert_eq!(engine.traversals, 2);
        assert!(!usage.is_stale(dev.mutation_epoch()));
    }
}
