//! Register window management
//!
//! This module provides functionality for:
//! - Opening the physical memory device (`/dev/mem`)
//! - Mapping fixed physical register windows into the process
//! - Volatile 32-bit register access within a mapped window
//! - A heap-backed simulated memory for tests and dry runs

pub mod phys;
pub mod sim;

pub use phys::{page_size, MappedWindow, PhysMem, DEV_MEM};
pub use sim::{SimWindow, SimulatedMemory};

use crate::error::{GpioError, GpioResult};

/// One mapped physical register window
pub trait RegisterWindow {
    /// Physical address the window starts at
    fn phys_addr(&self) -> u64;

    /// Usable length in bytes
    fn len(&self) -> usize;

    /// Read the 32-bit register at `offset` bytes from the window start
    fn read(&self, offset: usize) -> GpioResult<u32>;

    /// Store a 32-bit value at `offset` bytes from the window start
    fn write(&mut self, offset: usize, value: u32) -> GpioResult<()>;

    /// Release the mapping. Calling this on an unmapped window is a no-op.
    fn unmap(&mut self);

    fn is_mapped(&self) -> bool;
}

/// Source of register windows: the real `/dev/mem` or a simulation
pub trait WindowMapper {
    /// Map `len` bytes starting at physical address `phys_addr`
    fn map_window(&mut self, phys_addr: u64, len: usize) -> GpioResult<Box<dyn RegisterWindow>>;

    /// Release the underlying device handle. Idempotent.
    fn close(&mut self);

    /// Human-readable source name for logs
    fn describe(&self) -> String;
}

/// Reject offsets that are misaligned or run past the end of a window
pub(crate) fn check_offset(offset: usize, len: usize) -> GpioResult<()> {
    if offset % 4 != 0 || offset.checked_add(4).map_or(true, |end| end > len) {
        return Err(GpioError::RegisterOffset { offset, len });
    }
    Ok(())
}
