//! Simulated register memory
//!
//! A sparse, heap-backed stand-in for `/dev/mem`. Clones share the same
//! backing store, so a test can keep one handle to inspect registers while
//! a [`crate::soc::SocContext`] owns another.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use super::{check_offset, RegisterWindow, WindowMapper};
use crate::error::{GpioError, GpioResult};

#[derive(Debug, Default)]
struct SimState {
    words: RefCell<BTreeMap<u64, u32>>,
    writes: Cell<usize>,
    live_windows: Cell<usize>,
    closed: Cell<bool>,
}

/// Shared simulated physical address space
#[derive(Clone, Debug, Default)]
pub struct SimulatedMemory {
    state: Rc<SimState>,
}

impl SimulatedMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the word at a physical address (unwritten words read as 0)
    pub fn peek(&self, phys_addr: u64) -> u32 {
        self.state
            .words
            .borrow()
            .get(&phys_addr)
            .copied()
            .unwrap_or(0)
    }

    /// Set a word without counting it as a register write, e.g. to model
    /// an external signal on an input register
    pub fn poke(&self, phys_addr: u64, value: u32) {
        self.state.words.borrow_mut().insert(phys_addr, value);
    }

    /// Number of register stores performed through mapped windows
    pub fn write_count(&self) -> usize {
        self.state.writes.get()
    }

    /// Windows mapped and not yet unmapped
    pub fn live_windows(&self) -> usize {
        self.state.live_windows.get()
    }

    pub fn is_closed(&self) -> bool {
        self.state.closed.get()
    }

    /// Copy of every non-default word, for before/after comparisons
    pub fn snapshot(&self) -> BTreeMap<u64, u32> {
        self.state.words.borrow().clone()
    }
}

impl WindowMapper for SimulatedMemory {
    fn map_window(&mut self, phys_addr: u64, len: usize) -> GpioResult<Box<dyn RegisterWindow>> {
        if self.state.closed.get() {
            return Err(GpioError::NotInitialized("simulated memory"));
        }
        self.state.live_windows.set(self.state.live_windows.get() + 1);
        Ok(Box::new(SimWindow {
            state: Rc::clone(&self.state),
            phys_addr,
            len,
            mapped: true,
        }))
    }

    fn close(&mut self) {
        self.state.closed.set(true);
    }

    fn describe(&self) -> String {
        "simulated memory".to_string()
    }
}

/// Window into a [`SimulatedMemory`]
pub struct SimWindow {
    state: Rc<SimState>,
    phys_addr: u64,
    len: usize,
    mapped: bool,
}

impl SimWindow {
    fn addr(&self, offset: usize) -> GpioResult<u64> {
        if !self.mapped {
            return Err(GpioError::NotInitialized("register window"));
        }
        check_offset(offset, self.len)?;
        Ok(self.phys_addr + offset as u64)
    }
}

impl RegisterWindow for SimWindow {
    fn phys_addr(&self) -> u64 {
        self.phys_addr
    }

    fn len(&self) -> usize {
        self.len
    }

    fn read(&self, offset: usize) -> GpioResult<u32> {
        let addr = self.addr(offset)?;
        Ok(self.state.words.borrow().get(&addr).copied().unwrap_or(0))
    }

    fn write(&mut self, offset: usize, value: u32) -> GpioResult<()> {
        let addr = self.addr(offset)?;
        self.state.words.borrow_mut().insert(addr, value);
        self.state.writes.set(self.state.writes.get() + 1);
        Ok(())
    }

    fn unmap(&mut self) {
        if self.mapped {
            self.mapped = false;
            self.state.live_windows.set(self.state.live_windows.get() - 1);
        }
    }

    fn is_mapped(&self) -> bool {
        self.mapped
    }
}

impl Drop for SimWindow {
    fn drop(&mut self) {
        self.unmap();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_windows_share_state() {
        let mut mem = SimulatedMemory::new();
        let probe = mem.clone();

        let mut window = mem.map_window(0xff63_4400, 0x400).unwrap();
        window.write(0x74, 0x1234).unwrap();

        assert_eq!(probe.peek(0xff63_4474), 0x1234);
        assert_eq!(probe.write_count(), 1);
        assert_eq!(probe.live_windows(), 1);

        probe.poke(0xff63_4478, 7);
        assert_eq!(window.read(0x78).unwrap(), 7);
        assert_eq!(probe.write_count(), 1);
    }

    #[test]
    fn test_unmap_is_idempotent() {
        let mut mem = SimulatedMemory::new();
        let mut window = mem.map_window(0x1000, 0x100).unwrap();
        window.unmap();
        window.unmap();
        drop(window);
        assert_eq!(mem.live_windows(), 0);
    }

    #[test]
    fn test_closed_memory_refuses_mapping() {
        let mut mem = SimulatedMemory::new();
        mem.close();
        assert!(mem.is_closed());
        assert!(mem.map_window(0, 0x100).is_err());
    }
}
