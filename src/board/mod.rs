//! Board profiles
//!
//! Built-in wiring for Radxa boards plus support for custom profiles loaded
//! from TOML. [`Board::open`] turns a profile into a ready [`SocContext`].

pub mod profile;
pub mod radxa;

pub use profile::{BoardProfile, NO_PIN};
pub use radxa::{
    RADXA_CM3_IO, RADXA_E23, RADXA_E25, RADXA_ZERO2, ROCK3A_V1_2, ROCK3A_V1_3, ROCK3B, ROCK3C,
    ROCK3_CM3_IO, ROCK5A_V1_1, ROCK5A_V1_2, ROCK5B,
};

use log::info;
use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::config::HalConfig;
use crate::error::{GpioError, GpioResult};
use crate::mem::SimulatedMemory;
use crate::soc::{get_chip, SocContext};

/// Registry of built-in board profiles
pub static BOARDS: Lazy<HashMap<&'static str, &'static BoardProfile>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert("rock3a_v1_2", &*ROCK3A_V1_2);
    m.insert("rock3a_v1_3", &*ROCK3A_V1_3);
    m.insert("rock3a", &*ROCK3A_V1_3);
    m.insert("rock3b", &*ROCK3B);
    m.insert("rock3c", &*ROCK3C);
    m.insert("radxa_cm3_io", &*RADXA_CM3_IO);
    m.insert("rock3_cm3_io", &*ROCK3_CM3_IO);
    m.insert("radxa_e23", &*RADXA_E23);
    m.insert("radxa_e25", &*RADXA_E25);
    m.insert("rock5a_v1_1", &*ROCK5A_V1_1);
    m.insert("rock5a_v1_2", &*ROCK5A_V1_2);
    m.insert("rock5a", &*ROCK5A_V1_2);
    m.insert("rock5b", &*ROCK5B);
    m.insert("radxa_zero2", &*RADXA_ZERO2);
    m
});

/// Get a built-in board profile by name
pub fn get_board(name: &str) -> Option<&'static BoardProfile> {
    BOARDS.get(name.to_lowercase().as_str()).copied()
}

/// Built-in board ids (aliases omitted)
pub fn board_names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = BOARDS
        .iter()
        .filter(|(k, v)| **k == v.id.as_str())
        .map(|(k, _)| *k)
        .collect();
    names.sort();
    names
}

/// Find `name` among `custom` profiles first, then the built-in ones
pub fn find_board(name: &str, custom: &[BoardProfile]) -> GpioResult<BoardProfile> {
    custom
        .iter()
        .find(|b| b.id.eq_ignore_ascii_case(name))
        .cloned()
        .or_else(|| get_board(name).cloned())
        .ok_or_else(|| GpioError::UnknownBoard(name.to_string()))
}

/// A board profile bound to a mapped chip context
#[derive(Debug)]
pub struct Board {
    profile: BoardProfile,
    soc: SocContext,
    sim: Option<SimulatedMemory>,
}

impl Board {
    /// Map the board's chip and install its pin maps.
    ///
    /// With `config.simulate` set, registers live in a [`SimulatedMemory`]
    /// instead of `/dev/mem`.
    pub fn open(profile: &BoardProfile, config: &HalConfig) -> GpioResult<Self> {
        let chip = get_chip(&profile.chip).ok_or_else(|| GpioError::UnknownChip(profile.chip.clone()))?;
        let table = chip.pins();
        let pin_map = profile.pin_map(&table)?;
        let irq_map = profile.irq_map(&table)?;

        let mut soc = SocContext::new(chip)
            .with_sysfs_root(&config.sysfs_root)
            .with_mem_device(&config.mem_device);

        let sim = if config.simulate {
            let mem = SimulatedMemory::new();
            soc.setup_with(mem.clone())?;
            Some(mem)
        } else {
            soc.setup()?;
            None
        };
        soc.set_map(pin_map);
        soc.set_irq(irq_map);

        info!("{} ready ({} header pins)", profile.name, profile.pins.len());
        Ok(Self {
            profile: profile.clone(),
            soc,
            sim,
        })
    }

    pub fn profile(&self) -> &BoardProfile {
        &self.profile
    }

    pub fn soc(&self) -> &SocContext {
        &self.soc
    }

    pub fn soc_mut(&mut self) -> &mut SocContext {
        &mut self.soc
    }

    /// Register store when opened in simulation mode
    pub fn simulated(&self) -> Option<&SimulatedMemory> {
        self.sim.as_ref()
    }

    /// Whether header position `pin` is a usable GPIO
    pub fn valid_gpio(&self, pin: usize) -> bool {
        self.soc.valid_gpio(pin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pin::{Level, PinMode};

    #[test]
    fn test_every_builtin_board_resolves() {
        for name in board_names() {
            let profile = get_board(name).unwrap();
            let chip = get_chip(&profile.chip).unwrap();
            let table = chip.pins();
            let map = profile.pin_map(&table).unwrap();
            assert_eq!(map.len(), 32, "{}", name);
            assert!(profile.irq_map(&table).is_ok());
        }
        assert_eq!(board_names().len(), 12);
    }

    #[test]
    fn test_find_board_prefers_custom() {
        let custom = BoardProfile::new("rock5b", "Custom 5B", "rk3588", &["GPIO0_A0"]);
        let found = find_board("ROCK5B", &[custom]).unwrap();
        assert_eq!(found.name, "Custom 5B");
        assert_eq!(find_board("rock3c", &[]).unwrap().chip, "rk356x");
        assert!(matches!(
            find_board("pi5", &[]),
            Err(GpioError::UnknownBoard(_))
        ));
    }

    #[test]
    fn test_open_simulated_board() {
        let config = HalConfig::new().with_simulate(true);
        let mut board = Board::open(&ROCK3A_V1_3, &config).unwrap();
        assert!(board.valid_gpio(0));
        assert!(!board.valid_gpio(17));
        assert_eq!(board.soc().pin_name(0), Some("GPIO3_C4"));

        board.soc_mut().pin_mode(0, PinMode::Output).unwrap();
        board.soc_mut().digital_write(0, Level::High).unwrap();

        // GPIO3 DR_H, bit 4 with its write enable
        let mem = board.simulated().unwrap();
        assert_eq!(mem.peek(0xfe76_0004), 0x0010_0010);
    }

    #[test]
    fn test_open_simulated_a311d() {
        let config = HalConfig::new().with_simulate(true);
        let mut board = Board::open(&RADXA_ZERO2, &config).unwrap();
        let mem = board.simulated().unwrap().clone();
        mem.poke(0xff63_4400 + 0x1c * 4, 0xffff_ffff);

        // header pin 0 is GPIOZ_3: EN_N cleared for output
        board.soc_mut().pin_mode(0, PinMode::Output).unwrap();
        assert_eq!(mem.peek(0xff63_4400 + 0x1c * 4), 0xffff_fff7);
    }
}
