//! Error types for GPIO operations
//!
//! Every fallible library call returns [`GpioResult`]. A timed-out interrupt
//! wait is not an error; see [`crate::sysfs::WaitOutcome`].

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::pin::PinMode;
use crate::sysfs::EdgeMode;

/// Result alias used throughout the crate
pub type GpioResult<T> = Result<T, GpioError>;

/// Errors raised by register access, pin resolution and sysfs interrupts
#[derive(Debug, Error)]
pub enum GpioError {
    /// The physical memory device exists but we lack the privilege to open it
    #[error("access denied opening {path} (are you root?): {source}")]
    AccessDenied {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Any other failure opening the physical memory device
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// mmap of a register window failed
    #[error("failed to map {len:#x} bytes at physical address {addr:#010x}: {source}")]
    Map {
        addr: u64,
        len: usize,
        #[source]
        source: io::Error,
    },

    #[error("{0} not initialized")]
    NotInitialized(&'static str),

    #[error("pin {pin} is out of range (valid: 0..{len})")]
    OutOfRange { pin: usize, len: usize },

    #[error("pin {0} is not connected to a GPIO line")]
    UnmappedPin(usize),

    #[error("pin {pin} ({name}) needs register window {bank}, but only {mapped} are mapped")]
    BankOutOfRange {
        pin: usize,
        name: String,
        bank: usize,
        mapped: usize,
    },

    #[error("{name} is in {actual} mode, expected {expected}")]
    WrongMode {
        name: String,
        expected: PinMode,
        actual: PinMode,
    },

    #[error("{0} is not a valid mode for pin_mode (use input or output)")]
    InvalidMode(PinMode),

    #[error("invalid logic level {0:?} (expected 0/1 or low/high)")]
    InvalidLevel(String),

    #[error("edge mode {edge} is not supported by {chip}")]
    UnsupportedEdgeMode { edge: EdgeMode, chip: String },

    /// export/direction/edge/value file operation failed
    #[error("sysfs {action} failed on {path}: {source}")]
    Sysfs {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{0} is armed for interrupts; release it with gc first")]
    PinArmed(String),

    #[error("{name} does not support {capability}")]
    NotCapable {
        name: String,
        capability: &'static str,
    },

    #[error("register offset {offset:#x} is outside the {len:#x}-byte window or misaligned")]
    RegisterOffset { offset: usize, len: usize },

    #[error("invalid register layout: {0}")]
    RegisterLayout(String),

    #[error("unknown chip: {0}")]
    UnknownChip(String),

    #[error("unknown board: {0}")]
    UnknownBoard(String),

    #[error("board {board}: no pin named {name} on {chip}")]
    UnknownPinName {
        board: String,
        chip: String,
        name: String,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_pin() {
        let err = GpioError::WrongMode {
            name: "GPIO3_C4".to_string(),
            expected: PinMode::Output,
            actual: PinMode::Input,
        };
        assert_eq!(err.to_string(), "GPIO3_C4 is in input mode, expected output");

        let err = GpioError::OutOfRange { pin: 40, len: 32 };
        assert!(err.to_string().contains("0..32"));
    }
}
