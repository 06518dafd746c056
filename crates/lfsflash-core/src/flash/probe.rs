//! Chip identification

use crate::chip::{self, ChipDescriptor};
use crate::error::{Error, Result};
use crate::programmer::SpiMaster;
use crate::protocol;
use maybe_async::maybe_async;

/// Read the chip identity and look it up in the registry
#[maybe_async]
pub async fn probe<M: SpiMaster + ?Sized>(master: &mut M) -> Result<&'static ChipDescriptor> {
    let id = protocol::read_jedec_id(master).await?;
    log::info!("Flash ID: {:02X} {:02X} {:02X}", id[0], id[1], id[2]);

    match chip::lookup(&id) {
        Some(chip) => {
            log::info!(
                "Found {} {} ({:.0} MiB, {} x {} byte blocks)",
                chip.vendor,
                chip.name,
                chip.size_mib(),
                chip.block_count(),
                chip.erase_block_size
            );
            Ok(chip)
        }
        None => {
            log::warn!("Unknown flash chip {:02X?}", id);
            Err(Error::ChipNotRecognized { id })
        }
    }
}
