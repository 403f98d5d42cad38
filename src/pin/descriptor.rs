//! Pin descriptor definitions
//!
//! A descriptor is the static register layout of one physical pin plus its
//! run-time state (mode and, when armed, the open sysfs value file).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::str::FromStr;

use crate::error::GpioError;

/// A single bit inside the pin's own GPIO bank window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegBit {
    /// Byte offset of the register from the bank window start
    pub offset: usize,
    /// Bit position inside the register
    pub bit: u8,
}

impl RegBit {
    pub const fn new(offset: usize, bit: u8) -> Self {
        Self { offset, bit }
    }
}

/// A bit field in an arbitrary window (clock gate, pinmux)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegisterField {
    /// Index of the register window in the chip's window list
    pub window: usize,
    /// Byte offset of the register from the window start
    pub offset: usize,
    /// Lowest bit of the field
    pub bit: u8,
    /// Field width in bits
    pub width: u8,
}

impl RegisterField {
    pub const fn new(window: usize, offset: usize, bit: u8, width: u8) -> Self {
        Self {
            window,
            offset,
            bit,
            width,
        }
    }

    /// Mask of the field, already shifted into position
    pub fn mask(&self) -> u32 {
        field_mask(self.width) << self.bit
    }
}

pub(crate) fn field_mask(width: u8) -> u32 {
    if width >= 32 {
        u32::MAX
    } else {
        (1u32 << width) - 1
    }
}

/// What a pin can be used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities(u8);

impl Capabilities {
    pub const NONE: Capabilities = Capabilities(0);
    pub const DIGITAL: Capabilities = Capabilities(0b01);
    pub const INTERRUPT: Capabilities = Capabilities(0b10);

    pub const fn union(self, other: Capabilities) -> Capabilities {
        Capabilities(self.0 | other.0)
    }

    pub const fn contains(self, other: Capabilities) -> bool {
        self.0 & other.0 == other.0
    }
}

impl fmt::Display for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if self.contains(Capabilities::DIGITAL) {
            parts.push("digital");
        }
        if self.contains(Capabilities::INTERRUPT) {
            parts.push("interrupt");
        }
        if parts.is_empty() {
            write!(f, "none")
        } else {
            write!(f, "{}", parts.join("+"))
        }
    }
}

/// Current configuration of a pin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinMode {
    #[default]
    NotSet,
    Input,
    Output,
    Interrupt,
}

impl fmt::Display for PinMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PinMode::NotSet => "unset",
            PinMode::Input => "input",
            PinMode::Output => "output",
            PinMode::Interrupt => "interrupt",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for PinMode {
    type Err = GpioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "in" | "input" => Ok(PinMode::Input),
            "out" | "output" => Ok(PinMode::Output),
            "irq" | "interrupt" => Ok(PinMode::Interrupt),
            "unset" | "none" => Ok(PinMode::NotSet),
            _ => Err(GpioError::Config(format!("unknown pin mode: {}", s))),
        }
    }
}

/// Digital logic level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Low,
    High,
}

impl Level {
    pub fn as_bit(self) -> u32 {
        match self {
            Level::Low => 0,
            Level::High => 1,
        }
    }

    pub fn from_bit(bit: bool) -> Self {
        if bit {
            Level::High
        } else {
            Level::Low
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Level::Low => Level::High,
            Level::High => Level::Low,
        }
    }
}

impl TryFrom<u8> for Level {
    type Error = GpioError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Level::Low),
            1 => Ok(Level::High),
            other => Err(GpioError::InvalidLevel(other.to_string())),
        }
    }
}

impl FromStr for Level {
    type Err = GpioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "0" | "low" => Ok(Level::Low),
            "1" | "high" => Ok(Level::High),
            _ => Err(GpioError::InvalidLevel(s.to_string())),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_bit())
    }
}

/// Register layout and run-time state of one physical pin
#[derive(Debug)]
pub struct PinDescriptor {
    /// Symbolic name, e.g. `GPIO3_C4` or `GPIOAO_7`
    pub name: String,
    /// Window holding the direction and data registers
    pub bank: usize,
    /// Clock gate for the bank; `None` if the bank is never gated
    pub clock: Option<RegisterField>,
    /// Pin-multiplex field; its window selects the iomux region
    pub mux: Option<RegisterField>,
    /// Direction bit in the bank window
    pub direction: RegBit,
    /// Output data bit in the bank window
    pub output: RegBit,
    /// Input sample bit in the bank window
    pub input: RegBit,
    /// Kernel GPIO line number used by the sysfs interface
    pub sysfs_line: u32,
    pub capabilities: Capabilities,
    pub mode: PinMode,
    /// Open sysfs value file while the pin is armed
    pub value_fd: Option<File>,
}

impl PinDescriptor {
    /// Whether the pin can be driven through registers
    pub fn is_digital(&self) -> bool {
        self.capabilities.contains(Capabilities::DIGITAL) && self.mux.is_some()
    }

    pub fn is_interrupt_capable(&self) -> bool {
        self.capabilities.contains(Capabilities::INTERRUPT)
    }

    /// Every window this descriptor touches, bank first
    pub fn windows(&self) -> impl Iterator<Item = usize> + '_ {
        std::iter::once(self.bank)
            .chain(self.clock.map(|c| c.window))
            .chain(self.mux.map(|m| m.window))
    }
}
