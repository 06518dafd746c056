#![cfg(feature = "is_sync")]
#![allow(dead_code)]

use lfsflash_core::chip::{self, ChipDescriptor};
use lfsflash_core::error::code;
use lfsflash_core::flash::BlockDevice;
use lfsflash_core::fs::{EngineError, EngineResult, FilesystemEngine, FlashFs, FsConfig};
use lfsflash_dummy::{DummyConfig, DummyFlash};

pub const MAGIC: &[u8; 4] = b"LFST";
/// Superblock header: magic plus a little-endian generation counter
pub const HEADER_LEN: u32 = 8;
pub const ENTRY_LEN: u32 = 4;
/// Entry flag marking a deleted file
pub const TOMBSTONE: u32 = 0x8000_0000;
const EMPTY_ENTRY: u32 = 0xFFFF_FFFF;

pub type TestFs = FlashFs<DummyFlash, TestEngine>;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// W25Q16JV: 512 blocks of 4 KiB, small enough for whole-chip sweeps
pub fn small_chip() -> &'static ChipDescriptor {
    chip::find_by_name("W25Q16JV").unwrap()
}

pub fn small_flash() -> DummyFlash {
    DummyFlash::for_chip(small_chip())
}

pub fn begin(flash: DummyFlash) -> TestFs {
    init_logging();
    FlashFs::begin(flash, TestEngine::default(), FsConfig::default()).unwrap()
}

pub fn dummy(fs: &TestFs) -> &DummyFlash {
    fs.device().transport().master()
}

pub fn dummy_mut(fs: &mut TestFs) -> &mut DummyFlash {
    fs.device_mut().transport_mut().master_mut()
}

/// Dirty `block` behind the driver's back
pub fn scribble(flash: &mut DummyFlash, block: u32) {
    let size = flash.config().erase_size;
    let start = block as usize * size;
    flash.data_mut()[start + 17] = 0x00;
}

pub fn dummy_config() -> DummyConfig {
    DummyConfig::from_chip(small_chip())
}

/// Minimal log-structured engine
///
/// Block 0 holds the superblock: a header followed by an append-only log of
/// 4-byte entries, one per created or deleted file. Each file occupies one
/// block: a little-endian length followed by the contents.
#[derive(Debug, Default)]
pub struct TestEngine {
    mounted: bool,
    files: Vec<u32>,
    log_len: u32,
    pub formats: u32,
    pub mounts: u32,
    pub traversals: u32,
    pub fail_format: bool,
    pub fail_traverse: bool,
    /// Program the superblock while a traversal is running
    pub write_during_traverse: bool,
}

impl TestEngine {
    pub fn files(&self) -> &[u32] {
        &self.files
    }

    fn append_entry<D: BlockDevice>(&mut self, device: &mut D, entry: u32) -> EngineResult<()> {
        let offset = HEADER_LEN + self.log_len * ENTRY_LEN;
        if offset + ENTRY_LEN > device.geometry().block_size {
            return Err(EngineError(code::NOSPC));
        }
        device.prog(0, offset, &entry.to_le_bytes())?;
        self.log_len += 1;
        Ok(())
    }

    fn allocate<D: BlockDevice>(&self, device: &D) -> EngineResult<u32> {
        (1..device.geometry().block_count)
            .find(|b| !self.files.contains(b))
            .ok_or(EngineError(code::NOSPC))
    }

    /// Store `data` in a fresh block and return its number
    pub fn write_file<D: BlockDevice>(&mut self, device: &mut D, data: &[u8]) -> EngineResult<u32> {
        if !self.mounted {
            return Err(EngineError(code::INVAL));
        }
        let block = self.allocate(device)?;
        device.erase(block)?;
        device.prog(block, 0, &(data.len() as u32).to_le_bytes())?;
        device.prog(block, 4, data)?;
        device.sync()?;
        self.append_entry(device, block)?;
        self.files.push(block);
        Ok(block)
    }

    pub fn read_file<D: BlockDevice>(&mut self, device: &mut D, block: u32) -> EngineResult<Vec<u8>> {
        if !self.files.contains(&block) {
            return Err(EngineError(code::INVAL));
        }
        let mut len = [0u8; 4];
        device.read(block, 0, &mut len)?;
        let mut data = vec![0u8; u32::from_le_bytes(len) as usize];
        device.read(block, 4, &mut data)?;
        Ok(data)
    }

    pub fn delete_file<D: BlockDevice>(&mut self, device: &mut D, block: u32) -> EngineResult<()> {
        if !self.files.contains(&block) {
            return Err(EngineError(code::INVAL));
        }
        self.append_entry(device, block | TOMBSTONE)?;
        self.files.retain(|&b| b != block);
        Ok(())
    }
}

impl<D: BlockDevice> FilesystemEngine<D> for TestEngine {
    fn format(&mut self, device: &mut D) -> EngineResult<()> {
        self.formats += 1;
        if self.fail_format {
            return Err(EngineError(code::IO));
        }
        self.mounted = false;
        device.erase(0)?;
        let mut header = [0u8; HEADER_LEN as usize];
        header[..4].copy_from_slice(MAGIC);
        header[4..].copy_from_slice(&self.formats.to_le_bytes());
        device.prog(0, 0, &header)?;
        device.sync()?;
        Ok(())
    }

    fn mount(&mut self, device: &mut D) -> EngineResult<()> {
        self.mounts += 1;
        let mut header = [0u8; HEADER_LEN as usize];
        device.read(0, 0, &mut header)?;
        if &header[..4] != MAGIC {
            return Err(EngineError(code::CORRUPT));
        }

        self.files.clear();
        self.log_len = 0;
        let capacity = (device.geometry().block_size - HEADER_LEN) / ENTRY_LEN;
        while self.log_len < capacity {
            let mut raw = [0u8; ENTRY_LEN as usize];
            device.read(0, HEADER_LEN + self.log_len * ENTRY_LEN, &mut raw)?;
            let entry = u32::from_le_bytes(raw);
            if entry == EMPTY_ENTRY {
                break;
            }
            if entry & TOMBSTONE != 0 {
                let block = entry & !TOMBSTONE;
                self.files.retain(|&b| b != block);
            } else {
                self.files.push(entry);
            }
            self.log_len += 1;
        }

        self.mounted = true;
        Ok(())
    }

    fn unmount(&mut self, device: &mut D) -> EngineResult<()> {
        device.sync()?;
        self.mounted = false;
        Ok(())
    }

    fn traverse(&mut self, device: &mut D, visit: &mut dyn FnMut(u32) -> i32) -> EngineResult<()> {
        self.traversals += 1;
        if !self.mounted {
            return Err(EngineError(code::INVAL));
        }
        if self.fail_traverse {
            return Err(EngineError(code::CORRUPT));
        }
        for block in core::iter::once(0).chain(self.files.iter().copied()) {
            let rc = visit(block);
            if rc < 0 {
                return Err(EngineError(rc));
            }
        }
        if self.write_during_traverse {
            // All-ones leaves the bytes as they were but still counts as a write
            let last = device.geometry().block_size - 1;
            device.prog(0, last, &[0xFF])?;
        }
        Ok(())
    }
}
