//! Block device over a serial NOR chip

use super::{BlockDevice, BlockGeometry, Transport};
use crate::chip::ChipDescriptor;
use crate::error::Result;
use crate::programmer::SpiMaster;
use crate::tracking::{
    Bitset, EraseCoordinator, EraseIntent, EraseOutcome, EraseStats, MutationEpoch,
};
use maybe_async::maybe_async;

/// A serial NOR chip presented as a [`BlockDevice`]
///
/// Engine erases are routed through an [`EraseCoordinator`] so that blocks
/// already known blank are not erased twice. Every program and every
/// physical erase advances the mutation epoch.
pub struct FlashBlockDevice<M: SpiMaster> {
    transport: Transport<M>,
    geometry: BlockGeometry,
    coordinator: EraseCoordinator,
    epoch: u32,
}

impl<M: SpiMaster> FlashBlockDevice<M> {
    /// Wrap a transport with the given engine parameters
    pub fn new(transport: Transport<M>, block_cycles: i32, name_max: u32) -> Self {
        let geometry = BlockGeometry::from_chip(transport.chip(), block_cycles, name_max);
        Self {
            coordinator: EraseCoordinator::new(geometry.block_count),
            transport,
            geometry,
            epoch: 0,
        }
    }

    /// The chip behind this device
    pub fn chip(&self) -> &'static ChipDescriptor {
        self.transport.chip()
    }

    /// The underlying transport
    pub fn transport(&self) -> &Transport<M> {
        &self.transport
    }

    /// Mutable access to the underlying transport
    pub fn transport_mut(&mut self) -> &mut Transport<M> {
        &mut self.transport
    }

    /// Consume the device and return the transport
    pub fn into_transport(self) -> Transport<M> {
        self.transport
    }

    /// The erase coordinator and its blank set
    pub fn coordinator(&self) -> &EraseCoordinator {
        &self.coordinator
    }

    /// Erase counters
    pub fn erase_stats(&self) -> EraseStats {
        self.coordinator.stats()
    }

    /// Returns true if `block` is known to be blank
    pub fn is_blank(&self, block: u32) -> bool {
        self.coordinator.blank().is_blank(block)
    }

    /// Number of blocks known to be blank
    pub fn blank_count(&self) -> u32 {
        self.coordinator.blank().blank_count()
    }

    /// Record that `block` is blank without checking the medium
    ///
    /// Only for blocks this caller has just erased or verified by other
    /// means. Marking a programmed block blank makes a later erase be skipped.
    pub fn mark_blank(&mut self, block: u32) {
        self.coordinator.blank_mut().mark_blank(block);
    }

    /// Forget which blocks are blank
    ///
    /// Needed whenever the medium may have been written behind this device's
    /// back, such as between an unmount and the next mount.
    pub fn forget_blank(&mut self) {
        self.coordinator.blank_mut().clear_all();
    }

    /// Read `block` back and record whether it is blank
    #[maybe_async]
    pub async fn verify_blank(&mut self, block: u32) -> Result<bool> {
        self.geometry.check_range(block, 0, 0)?;
        self.coordinator
            .blank_mut()
            .verify_blank(&mut self.transport, block)
            .await
    }

    /// Erase `block` on behalf of `intent`
    #[maybe_async]
    pub async fn erase_with_intent(
        &mut self,
        block: u32,
        intent: EraseIntent,
    ) -> Result<EraseOutcome> {
        self.geometry.check_range(block, 0, 0)?;
        let result = self.coordinator.erase(&mut self.transport, block, intent).await;
        if !matches!(result, Ok(EraseOutcome::Skipped)) {
            self.bump_epoch();
        }
        result
    }

    /// Pre-erase up to `max_blocks` blocks that are neither in `used` nor blank
    #[maybe_async]
    pub async fn format_unused(&mut self, used: &Bitset, max_blocks: u32) -> Result<u32> {
        let result = self
            .coordinator
            .format_unused(&mut self.transport, used, max_blocks)
            .await;
        if result != Ok(0) {
            self.bump_epoch();
        }
        result
    }

    /// Erase every block that does not already read as blank
    #[maybe_async]
    pub async fn wipe(&mut self) -> Result<u32> {
        let result = self.coordinator.wipe(&mut self.transport).await;
        if result != Ok(0) {
            self.bump_epoch();
        }
        result
    }

    fn bump_epoch(&mut self) {
        self.epoch = self.epoch.wrapping_add(1);
    }
}

impl<M: SpiMaster> MutationEpoch for FlashBlockDevice<M> {
    fn mutation_epoch(&self) -> u32 {
        self.epoch
    }

    fn mark_stale(&mut self) {
        self.bump_epoch();
    }
}

#[maybe_async(AFIT)]
impl<M: SpiMaster> BlockDevice for FlashBlockDevice<M> {
    fn geometry(&self) -> BlockGeometry {
        self.geometry
    }

    async fn read(&mut self, block: u32, offset: u32, buf: &mut [u8]) -> Result<()> {
        // Never hand stale memory back on a short or failed transfer
        buf.fill(0);
        self.geometry.check_range(block, offset, buf.len())?;
        let addr = self.chip().block_address(block) + offset;
        self.transport.read_raw(addr, buf).await
    }

    async fn prog(&mut self, block: u32, offset: u32, data: &[u8]) -> Result<()> {
        self.geometry.check_range(block, offset, data.len())?;
        self.coordinator.note_program(block);
        self.bump_epoch();
        let addr = self.chip().block_address(block) + offset;
        self.transport.program_raw(addr, data).await
    }

    async fn erase(&mut self, block: u32) -> Result<()> {
        self.erase_with_intent(block, EraseIntent::ForWrite)
            .await
            .map(|_| ())
    }

    async fn sync(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(all(test, feature = "is_sync"))]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::spi::{opcodes, AddressWidth, SpiCommand};
    use alloc::vec;
    use alloc::vec::Vec;

    static TINY: ChipDescriptor = ChipDescriptor {
        vendor: "Test",
        name: "TINY",
        id: [0x00, 0x11, 0x22],
        address_width: AddressWidth::ThreeByte,
        page_size: 16,
        erase_block_size: 64,
        total_size: 256,
        erase_opcode: opcodes::SE_20,
        program_timeout_us: 100,
        erase_timeout_us: 1000,
    };

    /// Four 64-byte blocks, never busy
    struct MemChip {
        data: Vec<u8>,
        erases: u32,
        fail_reads: bool,
    }

    impl MemChip {
        fn new() -> Self {
            Self {
                data: vec![0xFF; 256],
                erases: 0,
                fail_reads: false,
            }
        }
    }

    impl SpiMaster for MemChip {
        fn max_read_len(&self) -> usize {
            64
        }

        fn max_write_len(&self) -> usize {
            16
        }

        fn execute(&mut self, cmd: &mut SpiCommand<'_>) -> Result<()> {
            let addr = cmd.address.unwrap_or(0) as usize;
            match cmd.opcode {
                opcodes::READ if self.fail_reads => Err(Error::SpiTransferFailed),
                opcodes::READ => {
                    let len = cmd.read_buf.len();
                    cmd.read_buf.copy_from_slice(&self.data[addr..addr + len]);
                    Ok(())
                }
                opcodes::PP => {
                    for (i, b) in cmd.write_data.iter().enumerate() {
                        self.data[addr + i] &= b;
                    }
                    Ok(())
                }
                opcodes::SE_20 => {
                    self.data[addr..addr + 64].fill(0xFF);
                    self.erases += 1;
                    Ok(())
                }
                opcodes::RDSR => {
                    cmd.read_buf[0] = 0;
                    Ok(())
                }
                _ => Ok(()),
            }
        }

        fn delay_us(&mut self, _us: u32) {}
    }

    fn device() -> FlashBlockDevice<MemChip> {
        let transport = Transport::new(MemChip::new(), &TINY, Default::default());
        FlashBlockDevice::new(transport, 100, 255)
    }

    fn erases(dev: &FlashBlockDevice<MemChip>) -> u32 {
        dev.transport().master().erases
    }

    #[test]
    fn test_erase_marks_blank_then_write_erase_is_skipped() {
        let mut dev = device();
        dev.erase(1).unwrap();
        assert_eq!(erases(&dev), 1);
        assert!(dev.is_blank(1));

        // Blank flag is consumed by the skipped erase
        dev.erase(1).unwrap();
        assert_eq!(erases(&dev), 1);
        assert!(!dev.is_blank(1));
        assert_eq!(dev.erase_stats(), EraseStats { erased: 1, skipped: 1 });

        dev.erase(1).unwrap();
        assert_eq!(erases(&dev), 2);
    }

    #[test]
    fn test_wipe_intent_keeps_blank_flag() {
        let mut dev = device();
        dev.mark_blank(2);
        let outcome = dev.erase_with_intent(2, EraseIntent::Wipe).unwrap();
        assert_eq!(outcome, EraseOutcome::Skipped);
        assert!(dev.is_blank(2));
        assert_eq!(erases(&dev), 0);
    }

    #[test]
    fn test_forget_blank_forces_physical_erase() {
        let mut dev = device();
        dev.erase(1).unwrap();
        dev.erase_with_intent(2, EraseIntent::Wipe).unwrap();
        assert_eq!(dev.blank_count(), 2);

        dev.forget_blank();
        assert_eq!(dev.blank_count(), 0);
        dev.erase(1).unwrap();
        assert_eq!(erases(&dev), 3);
    }

    #[test]
    fn test_prog_clears_blank_and_bumps_epoch() {
        let mut dev = device();
        dev.mark_blank(0);
        let epoch = dev.mutation_epoch();
        dev.prog(0, 16, &[0xA5; 20]).unwrap();
        assert!(!dev.is_blank(0));
        assert_ne!(dev.mutation_epoch(), epoch);

        let mut buf = [0u8; 20];
        dev.read(0, 16, &mut buf).unwrap();
        assert_eq!(buf, [0xA5; 20]);
    }

    #[test]
    fn test_skipped_erase_does_not_bump_epoch() {
        let mut dev = device();
        dev.mark_blank(3);
        let epoch = dev.mutation_epoch();
        dev.erase(3).unwrap();
        assert_eq!(dev.mutation_epoch(), epoch);
    }

    #[test]
    fn test_read_zero_fills_on_failure() {
        let mut dev = device();
        dev.transport_mut().master_mut().fail_reads = true;
        let mut buf = [0xEEu8; 8];
        assert_eq!(dev.read(0, 0, &mut buf), Err(Error::SpiTransferFailed));
        assert_eq!(buf, [0; 8]);
    }

    #[test]
    fn test_out_of_range() {
        let mut dev = device();
        assert_eq!(dev.erase(4), Err(Error::BlockOutOfRange(4)));
        assert_eq!(dev.prog(0, 60, &[0; 8]), Err(Error::BlockOutOfRange(0)));
        let mut buf = [0u8; 1];
        assert_eq!(dev.read(9, 0, &mut buf), Err(Error::BlockOutOfRange(9)));
    }

    #[test]
    fn test_verify_blank() {
        let mut dev = device();
        assert!(dev.verify_blank(1).unwrap());
        assert!(dev.is_blank(1));

        dev.prog(2, 63, &[0x7F]).unwrap();
        assert!(!dev.verify_blank(2).unwrap());
        assert!(!dev.is_blank(2));
    }

    #[test]
    fn test_wipe_only_erases_dirty_blocks() {
        let mut dev = device();
        dev.prog(1, 0, &[0; 16]).unwrap();
        dev.prog(3, 32, &[0; 16]).unwrap();

        assert_eq!(dev.wipe().unwrap(), 2);
        assert_eq!(erases(&dev), 2);
        assert_eq!(dev.blank_count(), 4);

        // Second wipe finds everything blank
        assert_eq!(dev.wipe().unwrap(), 0);
        assert_eq!(erases(&dev), 2);
    }

    #[test]
    fn test_format_unused_skips_used_and_blank() {
        let mut dev = device();
        let mut used = Bitset::new(4);
        used.set(0);
        dev.mark_blank(2);

        assert_eq!(dev.format_unused(&used, 8).unwrap(), 2);
        assert_eq!(dev.transport().master().data[64..128], [0xFF; 64]);
        assert!(!dev.is_blank(0));
        assert!(dev.is_blank(1));
        assert!(dev.is_blank(3));
        assert_eq!(dev.format_unused(&used, 8).unwrap(), 0);
    }

    #[test]
    fn test_format_unused_respects_limit() {
        let mut dev = device();
        let used = Bitset::new(4);
        assert_eq!(dev.format_unused(&used, 1).unwrap(), 1);
        assert!(dev.is_blank(0));
        assert!(!dev.is_blank(1));
        assert_eq!(dev.format_unused(&used, 1).unwrap(), 1);
        assert!(dev.is_blank(1));
    }
}
