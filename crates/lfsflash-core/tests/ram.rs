#![cfg(feature = "is_sync")]

mod common;

use common::{init_logging, TestEngine};
use lfsflash_core::flash::{mount_fresh, BlockDevice, RamBlockDevice};
use lfsflash_core::fs::FilesystemEngine;
use lfsflash_core::tracking::UsageTracker;
use pretty_assertions::assert_eq;

#[test]
fn fresh_mount_and_files() {
    init_logging();
    let mut dev = RamBlockDevice::new(64 * 1024).unwrap();
    let mut engine = TestEngine::default();
    mount_fresh(&mut engine, &mut dev).unwrap();
    assert_eq!(engine.formats, 1);

    let block = engine.write_file(&mut dev, b"in memory").unwrap();
    assert_eq!(engine.read_file(&mut dev, block).unwrap(), b"in memory");

    engine.unmount(&mut dev).unwrap();
    engine.mount(&mut dev).unwrap();
    assert_eq!(engine.files(), &[block]);
}

#[test]
fn geometry() {
    let dev = RamBlockDevice::new(10_000).unwrap();
    let g = dev.geometry();
    assert_eq!(g.block_size, 256);
    assert_eq!(g.block_count, 39);
    assert_eq!(g.read_size, 64);
    assert_eq!(g.prog_size, 64);
    assert_eq!(g.cache_size, 64);
    assert_eq!(g.lookahead_size, 64);
    assert_eq!(g.block_cycles, 50);
    assert_eq!(g.name_max, 64);
}

#[test]
fn usage_tracking_over_ram() {
    init_logging();
    let mut dev = RamBlockDevice::new(16 * 256).unwrap();
    let mut engine = TestEngine::default();
    mount_fresh(&mut engine, &mut dev).unwrap();
    let block = engine.write_file(&mut dev, b"abc").unwrap();

    let mut usage = UsageTracker::new();
    assert!(usage.is_used(&mut engine, &mut dev, block));
    assert!(!usage.is_used(&mut engine, &mut dev, 15));
    assert_eq!(usage.refresh_count(), 1);
    assert_eq!(usage.used().unwrap().count_set(), 2);
}
