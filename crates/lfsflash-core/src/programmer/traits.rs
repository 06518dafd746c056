//! Bus master trait definitions
//!
//! These traits use `maybe_async` to support both sync and async modes.
//! - By default (`is_sync`), traits are synchronous
//! - Without `is_sync`, traits are async (suitable for Embassy, WASM, tokio)

use crate::error::Result;
use crate::spi::SpiCommand;
use maybe_async::maybe_async;

/// SPI Master trait (sync or async depending on `is_sync` feature)
///
/// This trait represents the chip-select line plus command channel wired to
/// one flash chip. Each call to [`execute`](SpiMaster::execute) is one
/// complete transaction: assert chip-select, clock out opcode and address,
/// clock the data phase, release chip-select. Taking `&mut self` guarantees
/// no two transactions interleave their phases.
///
/// ## Example
///
/// ```ignore
/// #[maybe_async(AFIT)]
/// impl SpiMaster for BoardSpi {
///     fn max_read_len(&self) -> usize { 4096 }
///     fn max_write_len(&self) -> usize { 256 }
///
///     async fn execute(&mut self, cmd: &mut SpiCommand<'_>) -> Result<()> {
///         self.cs.set_low();
///         self.bus.write(&cmd.header()).await?;
///         self.bus.write(cmd.write_data).await?;
///         self.bus.read(cmd.read_buf).await?;
///         self.cs.set_high();
///         Ok(())
///     }
///
///     async fn delay_us(&mut self, us: u32) {
///         Timer::after_micros(us as u64).await
///     }
/// }
/// ```
#[maybe_async(AFIT)]
pub trait SpiMaster {
    /// Get the maximum number of bytes that can be read in a single transaction
    fn max_read_len(&self) -> usize;

    /// Get the maximum number of bytes that can be written in a single transaction
    fn max_write_len(&self) -> usize;

    /// Execute a single chip-select framed SPI command
    ///
    /// The command contains all the information needed for the transaction:
    /// - `opcode`: The SPI command opcode
    /// - `address`: Optional address (with width)
    /// - `write_data`: Data to write after the header
    /// - `read_buf`: Buffer to read data into
    async fn execute(&mut self, cmd: &mut SpiCommand<'_>) -> Result<()>;

    /// Wait for the specified number of microseconds
    ///
    /// This is the only suspension point of the driver: busy polling calls it
    /// between status reads so other cooperative tasks can run.
    async fn delay_us(&mut self, us: u32);
}
