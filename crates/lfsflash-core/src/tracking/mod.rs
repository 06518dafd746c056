//! Usage and blank tracking
//!
//! Two bitmaps sized to the device: the blocks the mounted filesystem
//! currently references, and the blocks known to be blank. Together they let
//! redundant erases be skipped and idle time be spent pre-erasing spare
//! blocks. Being wrong toward "used" or "not blank" only costs an erase;
//! being wrong the other way loses data, so every uncertain answer takes the
//! conservative side.

mod bitset;
mod coordinator;
mod format;
mod usage;

pub use bitset::Bitset;
pub use coordinator::{EraseCoordinator, EraseIntent, EraseOutcome, EraseStats};
pub use format::FormatTracker;
pub use usage::{MutationEpoch, UsageTracker};
