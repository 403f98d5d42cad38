//! Rockchip SoCs
//!
//! All Rockchip parts share the same GPIO controller shape: five banks of 32
//! lines (`GPIO0_A0` .. `GPIO4_D7`), a per-bank clock gate in a CRU, and
//! pinmux fields in one or more GRF/IOC blocks. They differ in addresses,
//! mux field width and whether the data registers are split into
//! hi-word-masked `_L`/`_H` halves.

pub mod rk3399;
pub mod rk356x;
pub mod rk3588;

pub use rk3399::RK3399;
pub use rk356x::RK356X;
pub use rk3588::RK3588;

use crate::pin::{Capabilities, PinDescriptor, PinMode, RegBit, RegisterField};

use super::bank_pin_name;

pub(crate) const BANKS: usize = 5;
pub(crate) const PINS_PER_BANK: usize = 32;

/// Placement of direction/data registers inside a bank window
#[derive(Debug, Clone, Copy)]
pub(crate) enum DataLayout {
    /// 32-bit `DR`/`DDR`, written read-modify-write
    Flat { dr: usize, ddr: usize, ext_port: usize },
    /// `DR_L 0x00 / DR_H 0x04`, `DDR_L 0x08 / DDR_H 0x0c`, 16 lines each,
    /// hi-word masked
    Split { ext_port: usize },
}

impl DataLayout {
    fn registers(self, pin: usize) -> (RegBit, RegBit, RegBit) {
        let input = |ext_port| RegBit::new(ext_port, pin as u8);
        match self {
            DataLayout::Flat { dr, ddr, ext_port } => (
                RegBit::new(ddr, pin as u8),
                RegBit::new(dr, pin as u8),
                input(ext_port),
            ),
            DataLayout::Split { ext_port } => {
                let half = pin / 16;
                let bit = (pin % 16) as u8;
                (
                    RegBit::new(0x08 + half * 4, bit),
                    RegBit::new(half * 4, bit),
                    input(ext_port),
                )
            }
        }
    }
}

/// Per-chip register placement
pub(crate) struct Layout {
    pub data: DataLayout,
    pub clock: fn(usize) -> Option<RegisterField>,
    pub mux: fn(usize, usize) -> Option<RegisterField>,
}

/// Build the 160-line table for a Rockchip chip. GPIO windows come first,
/// so a pin's bank index is also its window index.
pub(crate) fn build_pins(layout: &Layout) -> Vec<PinDescriptor> {
    let mut pins = Vec::with_capacity(BANKS * PINS_PER_BANK);
    for bank in 0..BANKS {
        let clock = (layout.clock)(bank);
        for pin in 0..PINS_PER_BANK {
            let (direction, output, input) = layout.data.registers(pin);
            let mux = (layout.mux)(bank, pin);
            let capabilities = if mux.is_some() {
                Capabilities::DIGITAL.union(Capabilities::INTERRUPT)
            } else {
                Capabilities::INTERRUPT
            };
            pins.push(PinDescriptor {
                name: bank_pin_name(bank, pin),
                bank,
                clock,
                mux,
                direction,
                output,
                input,
                sysfs_line: (bank * PINS_PER_BANK + pin) as u32,
                capabilities,
                mode: PinMode::NotSet,
                value_fd: None,
            });
        }
    }
    pins
}

/// Iomux registers hold four lines each, split into `_L` (x0..x3) and
/// `_H` (x4..x7) halves of 4-bit slots.
pub(crate) fn iomux_slot(pin: usize) -> (usize, u8) {
    let sub = pin / 8;
    let hi = (pin % 8) / 4;
    (sub * 8 + hi * 4, ((pin % 4) * 4) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_layout() {
        let layout = DataLayout::Split { ext_port: 0x70 };
        let (dir, out, inp) = layout.registers(23);
        assert_eq!(dir, RegBit::new(0x0c, 7));
        assert_eq!(out, RegBit::new(0x04, 7));
        assert_eq!(inp, RegBit::new(0x70, 23));

        let (dir, out, _) = layout.registers(15);
        assert_eq!(dir, RegBit::new(0x08, 15));
        assert_eq!(out, RegBit::new(0x00, 15));
    }

    #[test]
    fn test_iomux_slot() {
        // GPIO_C4: C_H register, first slot
        assert_eq!(iomux_slot(20), (0x14, 0));
        assert_eq!(iomux_slot(3), (0x00, 12));
        assert_eq!(iomux_slot(31), (0x1c, 12));
    }
}
