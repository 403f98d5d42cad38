//! RK3399
//!
//! The GPIO controllers predate the hi-word data registers: `DR`/`DDR` are
//! plain 32-bit registers written read-modify-write. The CRU and GRF blocks
//! still use hi-word write enables.

use super::{build_pins, DataLayout, Layout};
use crate::driver::{
    DirectionPolarity, WindowSpec,
    WriteConvention::{HiWordMask, ReadModifyWrite},
};
use crate::pin::{PinDescriptor, RegisterField};
use crate::soc::ChipFamily;

const CRU: usize = 5;
const PMUCRU: usize = 6;
const PMUGRF: usize = 7;
const GRF: usize = 8;

static WINDOWS: [WindowSpec; 9] = [
    WindowSpec::new("GPIO0", 0xff72_0000, 0x1000, ReadModifyWrite),
    WindowSpec::new("GPIO1", 0xff73_0000, 0x1000, ReadModifyWrite),
    WindowSpec::new("GPIO2", 0xff78_0000, 0x1000, ReadModifyWrite),
    WindowSpec::new("GPIO3", 0xff78_8000, 0x1000, ReadModifyWrite),
    WindowSpec::new("GPIO4", 0xff79_0000, 0x1000, ReadModifyWrite),
    WindowSpec::new("CRU", 0xff76_0000, 0x1000, HiWordMask),
    WindowSpec::new("PMUCRU", 0xff75_0000, 0x1000, HiWordMask),
    WindowSpec::new("PMUGRF", 0xff32_0000, 0x1000, HiWordMask),
    WindowSpec::new("GRF", 0xff77_0000, 0x10000, HiWordMask),
];

fn clock(bank: usize) -> Option<RegisterField> {
    Some(match bank {
        0 | 1 => RegisterField::new(PMUCRU, 0x104, (bank + 3) as u8, 1),
        n => RegisterField::new(CRU, 0x37c, (n + 1) as u8, 1),
    })
}

/// 2-bit function select, eight lines per register
fn mux(bank: usize, pin: usize) -> Option<RegisterField> {
    let sub = pin / 8;
    let bit = ((pin % 8) * 2) as u8;
    match bank {
        // GPIO0_C/D are not bonded out
        0 if sub >= 2 => None,
        0 => Some(RegisterField::new(PMUGRF, sub * 4, bit, 2)),
        1 => Some(RegisterField::new(PMUGRF, 0x10 + sub * 4, bit, 2)),
        n => Some(RegisterField::new(GRF, 0xe000 + (n - 2) * 0x10 + sub * 4, bit, 2)),
    }
}

pub struct Rk3399;

pub static RK3399: Rk3399 = Rk3399;

impl ChipFamily for Rk3399 {
    fn brand(&self) -> &'static str {
        "rockchip"
    }

    fn chip(&self) -> &'static str {
        "rk3399"
    }

    fn windows(&self) -> &'static [WindowSpec] {
        &WINDOWS
    }

    fn pins(&self) -> Vec<PinDescriptor> {
        build_pins(&Layout {
            data: DataLayout::Flat {
                dr: 0x00,
                ddr: 0x04,
                ext_port: 0x50,
            },
            clock,
            mux,
        })
    }

    fn direction_polarity(&self) -> DirectionPolarity {
        DirectionPolarity::HighIsOutput
    }
}
