//! SPI25 protocol implementation
//!
//! This module implements the common SPI flash command sequences
//! as defined by JEDEC.
//!
//! Uses `maybe_async` to support both sync and async modes:
//! - With `is_sync` feature: blocking/synchronous
//! - Without `is_sync` feature: async (for Embassy, WASM)

use crate::error::{Error, Result};
use crate::programmer::SpiMaster;
use crate::spi::{opcodes, AddressWidth, SpiCommand, StatusRegister};
use maybe_async::maybe_async;

/// Read the 3 identity bytes (manufacturer, device hi, device lo)
#[maybe_async]
pub async fn read_jedec_id<M: SpiMaster + ?Sized>(master: &mut M) -> Result<[u8; 3]> {
    let mut buf = [0u8; 3];
    let mut cmd = SpiCommand::read_reg(opcodes::RDID, &mut buf);
    master.execute(&mut cmd).await?;
    Ok(buf)
}

/// Read status register 1
#[maybe_async]
pub async fn read_status<M: SpiMaster + ?Sized>(master: &mut M) -> Result<StatusRegister> {
    let mut buf = [0u8; 1];
    let mut cmd = SpiCommand::read_reg(opcodes::RDSR, &mut buf);
    master.execute(&mut cmd).await?;
    Ok(StatusRegister::from_bits_retain(buf[0]))
}

/// Send the Write Enable command
#[maybe_async]
pub async fn write_enable<M: SpiMaster + ?Sized>(master: &mut M) -> Result<()> {
    let mut cmd = SpiCommand::simple(opcodes::WREN);
    master.execute(&mut cmd).await
}

/// Wait for the busy bit to clear
///
/// Polls the status register, waiting `poll_delay_us` between reads. Elapsed
/// time is the sum of those waits: once it reaches `timeout_us` and the chip
/// still reports busy, `Error::TransportTimeout` is returned. A timeout only
/// stops waiting; the program or erase already issued keeps running on the
/// chip.
///
/// # Arguments
/// * `poll_delay_us` - Delay in microseconds between status register polls
/// * `timeout_us` - Maximum time to wait before giving up
#[maybe_async]
pub async fn wait_ready<M: SpiMaster + ?Sized>(
    master: &mut M,
    poll_delay_us: u32,
    timeout_us: u32,
) -> Result<()> {
    let poll_delay_us = poll_delay_us.max(1);
    let mut waited_us: u32 = 0;

    loop {
        let status = read_status(master).await?;
        if !status.is_busy() {
            log::trace!("ready after {} us", waited_us);
            return Ok(());
        }
        if waited_us >= timeout_us {
            log::warn!("flash still busy after {} us", waited_us);
            return Err(Error::TransportTimeout { timeout_us });
        }
        master.delay_us(poll_delay_us).await;
        waited_us = waited_us.saturating_add(poll_delay_us);
    }
}

/// Read data from flash
///
/// Splits the read into transactions no longer than the master allows.
#[maybe_async]
pub async fn read<M: SpiMaster + ?Sized>(
    master: &mut M,
    opcode: u8,
    width: AddressWidth,
    addr: u32,
    buf: &mut [u8],
) -> Result<()> {
    let max_len = master.max_read_len().max(1);
    let mut offset = 0;

    while offset < buf.len() {
        let chunk_len = core::cmp::min(max_len, buf.len() - offset);
        let chunk = &mut buf[offset..offset + chunk_len];
        let mut cmd = SpiCommand::read(opcode, width, addr + offset as u32, chunk);
        master.execute(&mut cmd).await?;
        offset += chunk_len;
    }

    Ok(())
}

/// Program a single page (up to page_size bytes)
///
/// The data must not cross a page boundary. Sends WREN, the page program
/// command, then polls until the chip is ready or `timeout_us` elapses.
#[maybe_async]
pub async fn program_page<M: SpiMaster + ?Sized>(
    master: &mut M,
    opcode: u8,
    width: AddressWidth,
    addr: u32,
    data: &[u8],
    poll_delay_us: u32,
    timeout_us: u32,
) -> Result<()> {
    write_enable(master).await?;

    let mut cmd = SpiCommand::write(opcode, width, addr, data);
    master.execute(&mut cmd).await?;

    wait_ready(master, poll_delay_us, timeout_us).await
}

/// Erase a sector/block at the given address
///
/// Sends WREN, the erase command, then polls until the chip is ready or
/// `timeout_us` elapses.
#[maybe_async]
pub async fn erase_block<M: SpiMaster + ?Sized>(
    master: &mut M,
    opcode: u8,
    width: AddressWidth,
    addr: u32,
    poll_delay_us: u32,
    timeout_us: u32,
) -> Result<()> {
    write_enable(master).await?;

    let mut cmd = SpiCommand::erase(opcode, width, addr);
    master.execute(&mut cmd).await?;

    wait_ready(master, poll_delay_us, timeout_us).await
}
