//! Erase avoidance
//!
//! Every erase that reaches the chip goes through [`EraseCoordinator`]. It
//! consults the blank set to skip redundant erases and runs the bounded
//! housekeeping passes that pre-erase spare blocks.

use super::{Bitset, FormatTracker};
use crate::error::Result;
use crate::flash::Transport;
use crate::programmer::SpiMaster;
use maybe_async::maybe_async;

/// Why an erase was requested
///
/// The two callers treat the blank flag differently. An engine erasing a
/// block is about to program it, so a skipped erase consumes the flag.
/// A wipe only needs the block blank afterwards, so the flag survives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EraseIntent {
    /// The filesystem engine is preparing the block for new data
    ForWrite,
    /// Low-level format or idle housekeeping
    Wipe,
}

/// What an erase request turned into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EraseOutcome {
    /// The block was already blank; nothing was sent to the chip
    Skipped,
    /// A physical erase was issued and completed
    Erased,
}

/// Erase counters since the device was created
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EraseStats {
    /// Physical erases sent to the chip
    pub erased: u32,
    /// Erase requests satisfied from the blank set
    pub skipped: u32,
}

/// Decides whether an erase reaches the chip
#[derive(Debug, Clone)]
pub struct EraseCoordinator {
    blank: FormatTracker,
    stats: EraseStats,
}

impl EraseCoordinator {
    /// Create a coordinator for `block_count` blocks
    pub fn new(block_count: u32) -> Self {
        Self {
            blank: FormatTracker::new(block_count),
            stats: EraseStats::default(),
        }
    }

    /// The blank set
    pub fn blank(&self) -> &FormatTracker {
        &self.blank
    }

    /// Mutable access to the blank set
    pub fn blank_mut(&mut self) -> &mut FormatTracker {
        &mut self.blank
    }

    /// Erase counters
    pub fn stats(&self) -> EraseStats {
        self.stats
    }

    /// Record that `block` is being programmed
    pub fn note_program(&mut self, block: u32) {
        self.blank.clear_blank(block);
    }

    /// Erase `block` unless it is already known blank
    #[maybe_async]
    pub async fn erase<M: SpiMaster>(
        &mut self,
        transport: &mut Transport<M>,
        block: u32,
        intent: EraseIntent,
    ) -> Result<EraseOutcome> {
        if self.blank.is_blank(block) {
            if intent == EraseIntent::ForWrite {
                self.blank.clear_blank(block);
            }
            self.stats.skipped += 1;
            log::debug!("erase of block {} skipped ({:?})", block, intent);
            return Ok(EraseOutcome::Skipped);
        }

        // Half-erased blocks must not be trusted if the erase fails
        self.blank.clear_blank(block);
        transport.erase_raw(block).await?;
        self.blank.mark_blank(block);
        self.stats.erased += 1;
        Ok(EraseOutcome::Erased)
    }

    /// Pre-erase up to `max_blocks` blocks that are neither used nor blank
    ///
    /// Blocks are visited in ascending order. Returns the number of physical
    /// erases issued; zero once every eligible block is blank.
    #[maybe_async]
    pub async fn format_unused<M: SpiMaster>(
        &mut self,
        transport: &mut Transport<M>,
        used: &Bitset,
        max_blocks: u32,
    ) -> Result<u32> {
        let block_count = transport.chip().block_count();
        let mut erased = 0;

        for block in 0..block_count {
            if erased >= max_blocks {
                break;
            }
            if used.test(block) || self.blank.is_blank(block) {
                continue;
            }
            if self.erase(transport, block, EraseIntent::Wipe).await? == EraseOutcome::Erased {
                erased += 1;
            }
        }

        log::debug!("format_unused: erased {} block(s)", erased);
        Ok(erased)
    }

    /// Bring every block to the blank state with as few erases as possible
    ///
    /// Blocks not already known blank are read back first and only erased
    /// when that check finds programmed bytes. Returns the number of
    /// physical erases issued.
    #[maybe_async]
    pub async fn wipe<M: SpiMaster>(&mut self, transport: &mut Transport<M>) -> Result<u32> {
        let block_count = transport.chip().block_count();
        let mut erased = 0;

        for block in 0..block_count {
            if !self.blank.is_blank(block) && !self.blank.verify_blank(transport, block).await? {
                self.erase(transport, block, EraseIntent::Wipe).await?;
                erased += 1;
            }
        }

        log::info!(
            "wipe: erased {} of {} block(s), {} already blank",
            erased,
            block_count,
            block_count - erased
        );
        Ok(erased)
    }
}
