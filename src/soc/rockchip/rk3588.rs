//! RK3588 / RK3588S
//!
//! GPIO0 iomux is split across two PMU IOC blocks; banks 1-4 share BUS_IOC.

use super::{build_pins, iomux_slot, DataLayout, Layout};
use crate::driver::{DirectionPolarity, WindowSpec, WriteConvention::HiWordMask};
use crate::pin::{PinDescriptor, RegisterField};
use crate::soc::ChipFamily;

const CRU: usize = 5;
const PMU1CRU: usize = 6;
const PMU1_IOC: usize = 7;
const PMU2_IOC: usize = 8;
const BUS_IOC: usize = 9;

static WINDOWS: [WindowSpec; 10] = [
    WindowSpec::new("GPIO0", 0xfd8a_0000, 0x1000, HiWordMask),
    WindowSpec::new("GPIO1", 0xfec2_0000, 0x1000, HiWordMask),
    WindowSpec::new("GPIO2", 0xfec3_0000, 0x1000, HiWordMask),
    WindowSpec::new("GPIO3", 0xfec4_0000, 0x1000, HiWordMask),
    WindowSpec::new("GPIO4", 0xfec5_0000, 0x1000, HiWordMask),
    WindowSpec::new("CRU", 0xfd7c_0000, 0x1000, HiWordMask),
    WindowSpec::new("PMU1CRU", 0xfd7f_0000, 0x1000, HiWordMask),
    WindowSpec::new("PMU1_IOC", 0xfd5f_0000, 0x1000, HiWordMask),
    WindowSpec::new("PMU2_IOC", 0xfd5f_4000, 0x1000, HiWordMask),
    WindowSpec::new("BUS_IOC", 0xfd5f_8000, 0x1000, HiWordMask),
];

fn clock(bank: usize) -> Option<RegisterField> {
    Some(match bank {
        0 => RegisterField::new(PMU1CRU, 0x814, 5, 1),
        1 => RegisterField::new(CRU, 0x840, 14, 1),
        n => RegisterField::new(CRU, 0x844, ((n - 2) * 2) as u8, 1),
    })
}

fn mux(bank: usize, pin: usize) -> Option<RegisterField> {
    let (offset, bit) = iomux_slot(pin);
    match (bank, pin) {
        // GPIO0_B0 has no GPIO function select
        (0, 8) => None,
        (0, 0..=11) => Some(RegisterField::new(PMU1_IOC, offset, bit, 4)),
        // PMU2_IOC starts at GPIO0B_IOMUX_SEL_H
        (0, _) => Some(RegisterField::new(PMU2_IOC, offset - 0x0c, bit, 4)),
        (3, 30..=31) | (4, 30..=31) => None,
        (n, _) => Some(RegisterField::new(BUS_IOC, n * 0x20 + offset, bit, 4)),
    }
}

pub struct Rk3588;

pub static RK3588: Rk3588 = Rk3588;

impl ChipFamily for Rk3588 {
    fn brand(&self) -> &'static str {
        "rockchip"
    }

    fn chip(&self) -> &'static str {
        "rk3588"
    }

    fn windows(&self) -> &'static [WindowSpec] {
        &WINDOWS
    }

    fn pins(&self) -> Vec<PinDescriptor> {
        build_pins(&Layout {
            data: DataLayout::Split { ext_port: 0x70 },
            clock,
            mux,
        })
    }

    fn direction_polarity(&self) -> DirectionPolarity {
        DirectionPolarity::HighIsOutput
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::soc::table_checks::assert_table_consistent;

    #[test]
    fn test_table_consistent() {
        assert_table_consistent(&RK3588);
    }

    #[test]
    fn test_gpio0_split_iomux() {
        let pins = RK3588.pins();
        // GPIO0_B3 in PMU1_IOC B_L, GPIO0_B5 in PMU2_IOC B_H
        assert_eq!(pins[11].mux, Some(RegisterField::new(PMU1_IOC, 0x08, 12, 4)));
        assert_eq!(pins[13].mux, Some(RegisterField::new(PMU2_IOC, 0x00, 4, 4)));
        assert_eq!(pins[31].mux, Some(RegisterField::new(PMU2_IOC, 0x10, 12, 4)));
        assert!(pins[8].mux.is_none());
    }

    #[test]
    fn test_bus_ioc_and_clocks() {
        let pins = RK3588.pins();
        let p = &pins[3 * 32 + 17];
        assert_eq!(p.name, "GPIO3_C1");
        assert_eq!(p.mux, Some(RegisterField::new(BUS_IOC, 0x70, 4, 4)));
        assert_eq!(p.clock, Some(RegisterField::new(CRU, 0x844, 2, 1)));
        assert!(pins[4 * 32 + 30].mux.is_none());
    }
}
