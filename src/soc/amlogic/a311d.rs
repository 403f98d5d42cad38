//! Amlogic A311D (G12B)
//!
//! Registers are documented as word indices; byte offset = index * 4.
//! Direction is `EN_N` (0 = output) and inputs are sampled from a separate
//! `I` register. GPIO banks are never clock gated.

use crate::driver::{DirectionPolarity, WindowSpec, WriteConvention::ReadModifyWrite};
use crate::pin::{Capabilities, PinDescriptor, PinMode, RegBit, RegisterField};
use crate::soc::ChipFamily;

const PERIPHS: usize = 0;
const AO: usize = 1;

/// Kernel line number of the first table entry
const SYSFS_BASE: u32 = 412;

static WINDOWS: [WindowSpec; 2] = [
    WindowSpec::new("PERIPHS", 0xff63_4400, 0x400, ReadModifyWrite),
    WindowSpec::new("AO", 0xff80_0000, 0x1000, ReadModifyWrite),
];

struct Group {
    name: &'static str,
    count: usize,
    window: usize,
    /// Word indices of the consecutive mux registers, eight 4-bit slots each
    mux: &'static [usize],
    /// First mux slot used by the group
    mux_slot: usize,
    en_n: usize,
    out: usize,
    input: usize,
    /// Bit of line 0 in the EN_N/O/I registers
    bit: u8,
}

const fn group(
    name: &'static str,
    count: usize,
    window: usize,
    mux: &'static [usize],
    regs: (usize, usize, usize),
) -> Group {
    Group {
        name,
        count,
        window,
        mux,
        mux_slot: 0,
        en_n: regs.0,
        out: regs.1,
        input: regs.2,
        bit: 0,
    }
}

/// Table order; the index of a line in this flattened list is its
/// descriptor index.
static GROUPS: [Group; 8] = [
    group("AO", 12, AO, &[0x05, 0x06], (0x09, 0x0d, 0x0a)),
    // GPIOE shares the AO registers, upper half
    Group {
        mux_slot: 4,
        bit: 16,
        ..group("E", 3, AO, &[0x06], (0x09, 0x0d, 0x0a))
    },
    group("Z", 16, PERIPHS, &[0xb6, 0xb7], (0x1c, 0x1d, 0x1e)),
    group("H", 9, PERIPHS, &[0xbb, 0xbc], (0x19, 0x1a, 0x1b)),
    group("BOOT", 16, PERIPHS, &[0xb0, 0xb1], (0x10, 0x11, 0x12)),
    group("C", 8, PERIPHS, &[0xb9], (0x13, 0x14, 0x15)),
    group("A", 16, PERIPHS, &[0xbd, 0xbe], (0x20, 0x21, 0x22)),
    group("X", 20, PERIPHS, &[0xb3, 0xb4, 0xb5], (0x16, 0x17, 0x18)),
];

fn reg(word: usize, bit: usize) -> RegBit {
    RegBit::new(word * 4, bit as u8)
}

pub struct A311d;

pub static A311D: A311d = A311d;

impl ChipFamily for A311d {
    fn brand(&self) -> &'static str {
        "amlogic"
    }

    fn chip(&self) -> &'static str {
        "a311d"
    }

    fn windows(&self) -> &'static [WindowSpec] {
        &WINDOWS
    }

    fn pins(&self) -> Vec<PinDescriptor> {
        let mut pins = Vec::new();
        for g in &GROUPS {
            for n in 0..g.count {
                let slot = g.mux_slot + n;
                let bit = g.bit as usize + n;
                pins.push(PinDescriptor {
                    name: format!("GPIO{}_{}", g.name, n),
                    bank: g.window,
                    clock: None,
                    mux: Some(RegisterField::new(
                        g.window,
                        g.mux[slot / 8] * 4,
                        ((slot % 8) * 4) as u8,
                        4,
                    )),
                    direction: reg(g.en_n, bit),
                    output: reg(g.out, bit),
                    input: reg(g.input, bit),
                    sysfs_line: SYSFS_BASE + pins.len() as u32,
                    capabilities: Capabilities::DIGITAL.union(Capabilities::INTERRUPT),
                    mode: PinMode::NotSet,
                    value_fd: None,
                });
            }
        }
        pins
    }

    fn direction_polarity(&self) -> DirectionPolarity {
        DirectionPolarity::LowIsOutput
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::soc::table_checks::assert_table_consistent;

    #[test]
    fn test_table_consistent() {
        assert_table_consistent(&A311D);
    }

    #[test]
    fn test_table_order() {
        let pins = A311D.pins();
        assert_eq!(pins.len(), 100);
        assert_eq!(pins[0].name, "GPIOAO_0");
        assert_eq!(pins[12].name, "GPIOE_0");
        assert_eq!(pins[15].name, "GPIOZ_0");
        assert_eq!(pins[99].name, "GPIOX_19");
        assert_eq!(pins[99].sysfs_line, 511);
    }

    #[test]
    fn test_gpioe_upper_half() {
        let pins = A311D.pins();
        let e1 = &pins[13];
        assert_eq!(e1.mux, Some(RegisterField::new(AO, 0x18, 20, 4)));
        assert_eq!(e1.direction, RegBit::new(0x24, 17));
        assert_eq!(e1.input, RegBit::new(0x28, 17));
    }

    #[test]
    fn test_gpiox_third_mux_register() {
        let pins = A311D.pins();
        let x17 = pins.iter().find(|p| p.name == "GPIOX_17").unwrap();
        assert_eq!(x17.mux, Some(RegisterField::new(PERIPHS, 0xb5 * 4, 4, 4)));
        assert_eq!(x17.output, RegBit::new(0x17 * 4, 17));
    }
}
