//! RK3566 / RK3568

use super::{build_pins, iomux_slot, DataLayout, Layout};
use crate::driver::{DirectionPolarity, WindowSpec, WriteConvention::HiWordMask};
use crate::pin::{PinDescriptor, RegisterField};
use crate::soc::ChipFamily;

const CRU: usize = 5;
const PMUCRU: usize = 6;
const PMUGRF: usize = 7;
const SYS_GRF: usize = 8;

static WINDOWS: [WindowSpec; 9] = [
    WindowSpec::new("GPIO0", 0xfdd6_0000, 0x10000, HiWordMask),
    WindowSpec::new("GPIO1", 0xfe74_0000, 0x10000, HiWordMask),
    WindowSpec::new("GPIO2", 0xfe75_0000, 0x10000, HiWordMask),
    WindowSpec::new("GPIO3", 0xfe76_0000, 0x10000, HiWordMask),
    WindowSpec::new("GPIO4", 0xfe77_0000, 0x10000, HiWordMask),
    WindowSpec::new("CRU", 0xfdd2_0000, 0x10000, HiWordMask),
    WindowSpec::new("PMUCRU", 0xfdd0_0000, 0x10000, HiWordMask),
    WindowSpec::new("PMUGRF", 0xfdc2_0000, 0x10000, HiWordMask),
    WindowSpec::new("SYS_GRF", 0xfdc6_0000, 0x10000, HiWordMask),
];

/// `PCLK_GPIOx` / `DBCLK_GPIOx` gates; bank 0 lives in the PMU domain
fn clock(bank: usize) -> Option<RegisterField> {
    Some(match bank {
        0 => RegisterField::new(PMUCRU, 0x184, 9, 1),
        n => RegisterField::new(CRU, 0x37c, (2 * n) as u8, 1),
    })
}

/// 3-bit function select in 4-bit slots
fn mux(bank: usize, pin: usize) -> Option<RegisterField> {
    let (offset, bit) = iomux_slot(pin);
    match bank {
        0 => Some(RegisterField::new(PMUGRF, offset, bit, 3)),
        // GPIO4_D4..D7 are not bonded out
        4 if pin >= 28 => None,
        n => Some(RegisterField::new(SYS_GRF, (n - 1) * 0x20 + offset, bit, 3)),
    }
}

pub struct Rk356x;

pub static RK356X: Rk356x = Rk356x;

impl ChipFamily for Rk356x {
    fn brand(&self) -> &'static str {
        "rockchip"
    }

    fn chip(&self) -> &'static str {
        "rk356x"
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
        assert_table_consistent(&RK356X);
    }

    #[test]
    fn test_gpio3_c4() {
        let pins = RK356X.pins();
        let p = &pins[3 * 32 + 20];
        assert_eq!(p.name, "GPIO3_C4");
        assert_eq!(p.sysfs_line, 116);
        assert_eq!(p.mux, Some(RegisterField::new(SYS_GRF, 0x54, 0, 3)));
        assert_eq!(p.clock, Some(RegisterField::new(CRU, 0x37c, 6, 1)));
        assert_eq!(p.output.offset, 0x04);
        assert_eq!(p.output.bit, 4);
    }

    #[test]
    fn test_unbonded_pins_are_interrupt_only() {
        let pins = RK356X.pins();
        assert!(pins[4 * 32 + 27].is_digital());
        assert!(!pins[4 * 32 + 28].is_digital());
        assert!(pins[4 * 32 + 28].is_interrupt_capable());
    }
}
