//! Board profile definitions
//!
//! A profile names the chip a board carries and lists, for each header
//! position, the chip line wired to it. Profiles can be written in TOML:
//!
//! ```toml
//! [[board]]
//! id = "my_carrier"
//! name = "My CM3 carrier"
//! chip = "rk356x"
//! pins = ["GPIO0_C7", "-", "GPIO3_C7"]
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::{GpioError, GpioResult};
use crate::pin::{LogicalPinMap, PinDescriptor};

/// Header position with no GPIO behind it
pub const NO_PIN: &str = "-";

/// Pin wiring of one board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardProfile {
    /// Short identifier (e.g., "rock3a_v1_3")
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Chip family name understood by [`crate::soc::get_chip`]
    pub chip: String,
    /// Line name per header position, `"-"` where unused
    pub pins: Vec<String>,
    /// Interrupt-capable positions; the pin list is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub irq: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct BoardFile {
    #[serde(default)]
    board: Vec<BoardProfile>,
}

impl BoardProfile {
    pub fn new(id: &str, name: &str, chip: &str, pins: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            chip: chip.to_string(),
            pins: pins.iter().map(|p| p.to_string()).collect(),
            irq: None,
        }
    }

    /// Pin names used for interrupts
    pub fn irq_pins(&self) -> &[String] {
        self.irq.as_deref().unwrap_or(&self.pins)
    }

    /// Translate the pin list into indices of `table`
    pub fn pin_map(&self, table: &[PinDescriptor]) -> GpioResult<LogicalPinMap> {
        self.build_map(&self.pins, table)
    }

    /// Translate the interrupt list into indices of `table`
    pub fn irq_map(&self, table: &[PinDescriptor]) -> GpioResult<LogicalPinMap> {
        self.build_map(self.irq_pins(), table)
    }

    fn build_map(&self, names: &[String], table: &[PinDescriptor]) -> GpioResult<LogicalPinMap> {
        let index: HashMap<&str, usize> = table
            .iter()
            .enumerate()
            .map(|(i, p)| (p.name.as_str(), i))
            .collect();

        names
            .iter()
            .map(|name| {
                if name == NO_PIN {
                    return Ok(None);
                }
                index
                    .get(name.to_uppercase().as_str())
                    .copied()
                    .map(Some)
                    .ok_or_else(|| GpioError::UnknownPinName {
                        board: self.id.clone(),
                        chip: self.chip.clone(),
                        name: name.clone(),
                    })
            })
            .collect::<GpioResult<Vec<_>>>()
            .map(LogicalPinMap::new)
    }

    /// Parse every `[[board]]` table in a TOML document
    pub fn from_toml_str(content: &str) -> GpioResult<Vec<BoardProfile>> {
        let file: BoardFile =
            toml::from_str(content).map_err(|e| GpioError::Config(e.to_string()))?;
        Ok(file.board)
    }

    /// Load custom board profiles from a TOML file
    pub fn load(path: &Path) -> GpioResult<Vec<BoardProfile>> {
        let content = fs::read_to_string(path).map_err(|source| GpioError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }
}
