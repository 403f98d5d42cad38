//! HAL configuration
//!
//! Settings can come from a TOML file and be overridden by builder calls
//! (the CLI applies its flags this way):
//!
//! ```toml
//! board = "rock3a"
//! sysfs_root = "/sys/class/gpio"
//! mem_device = "/dev/mem"
//! boards_file = "/etc/sbc-gpio/boards.toml"
//! simulate = false
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::board::BoardProfile;
use crate::error::{GpioError, GpioResult};
use crate::mem::DEV_MEM;
use crate::sysfs::SYSFS_GPIO_ROOT;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HalConfig {
    /// Physical memory device
    pub mem_device: PathBuf,
    /// Sysfs GPIO class directory
    pub sysfs_root: PathBuf,
    /// Board used when none is given on the command line
    pub board: Option<String>,
    /// Extra `[[board]]` profiles
    pub boards_file: Option<PathBuf>,
    /// Use simulated registers instead of `/dev/mem`
    pub simulate: bool,
}

impl Default for HalConfig {
    fn default() -> Self {
        Self {
            mem_device: PathBuf::from(DEV_MEM),
            sysfs_root: PathBuf::from(SYSFS_GPIO_ROOT),
            board: None,
            boards_file: None,
            simulate: false,
        }
    }
}

impl HalConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mem_device(mut self, path: impl Into<PathBuf>) -> Self {
        self.mem_device = path.into();
        self
    }

    pub fn with_sysfs_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.sysfs_root = path.into();
        self
    }

    pub fn with_board(mut self, board: &str) -> Self {
        self.board = Some(board.to_string());
        self
    }

    pub fn with_boards_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.boards_file = Some(path.into());
        self
    }

    pub fn with_simulate(mut self, simulate: bool) -> Self {
        self.simulate = simulate;
        self
    }

    pub fn from_toml_str(content: &str) -> GpioResult<Self> {
        toml::from_str(content).map_err(|e| GpioError::Config(e.to_string()))
    }

    /// Read a TOML config file; missing keys keep their defaults
    pub fn load(path: &Path) -> GpioResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| GpioError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Custom board profiles from `boards_file`, if configured
    pub fn custom_boards(&self) -> GpioResult<Vec<BoardProfile>> {
        match &self.boards_file {
            Some(path) => BoardProfile::load(path),
            None => Ok(Vec::new()),
        }
    }
}
