//! SoC families
//!
//! Each supported chip implements [`ChipFamily`]: the register windows it
//! needs mapped, the write convention of each window, and a descriptor
//! table for every GPIO line. [`SocContext`] drives any of them.

pub mod amlogic;
pub mod context;
pub mod rockchip;

pub use amlogic::A311D;
pub use context::SocContext;
pub use rockchip::{RK3399, RK3588, RK356X};

use std::collections::HashMap;
use once_cell::sync::Lazy;

use crate::driver::{DirectionPolarity, WindowSpec};
use crate::pin::PinDescriptor;
use crate::sysfs::EdgeMode;

/// Register layout of one chip family
pub trait ChipFamily: Send + Sync {
    /// Vendor, e.g. `rockchip`
    fn brand(&self) -> &'static str;

    /// Chip family name, e.g. `rk356x`
    fn chip(&self) -> &'static str;

    /// Windows to map, indexed by the descriptors' window fields
    fn windows(&self) -> &'static [WindowSpec];

    /// A fresh descriptor table with every pin in `NotSet` mode
    fn pins(&self) -> Vec<PinDescriptor>;

    fn direction_polarity(&self) -> DirectionPolarity;

    /// Edge modes the sysfs driver accepts for this chip
    fn edge_modes(&self) -> &'static [EdgeMode] {
        &EdgeMode::ALL
    }
}

/// Registry of built-in chip families
pub static CHIPS: Lazy<HashMap<&'static str, &'static dyn ChipFamily>> = Lazy::new(|| {
    let mut m: HashMap<&'static str, &'static dyn ChipFamily> = HashMap::new();
    m.insert("rk356x", &RK356X);
    m.insert("rk3566", &RK356X);
    m.insert("rk3568", &RK356X);
    m.insert("rk3588", &RK3588);
    m.insert("rk3588s", &RK3588);
    m.insert("rk3399", &RK3399);
    m.insert("a311d", &A311D);
    m.insert("s922x", &A311D);
    m
});

/// Get a chip family by name
pub fn get_chip(name: &str) -> Option<&'static dyn ChipFamily> {
    CHIPS.get(name.to_lowercase().as_str()).copied()
}

/// Canonical chip names (aliases omitted)
pub fn chip_names() -> Vec<&'static str> {
    let mut names = vec!["rk356x", "rk3588", "rk3399", "a311d"];
    names.sort();
    names
}

/// Rockchip-style `GPIO3_C4` name for `pin` (0..32) of `bank`
pub(crate) fn bank_pin_name(bank: usize, pin: usize) -> String {
    let sub = (b'A' + (pin / 8) as u8) as char;
    format!("GPIO{}_{}{}", bank, sub, pin % 8)
}
