//! GPIO register driver
//!
//! Mode configuration and digital I/O against mapped register windows.
//! Every mutation goes through [`RegisterBlock::write_field`], which applies
//! the window's declared [`WriteConvention`]:
//!
//! | Convention        | Store                                        |
//! |-------------------|----------------------------------------------|
//! | `ReadModifyWrite` | `(reg & !mask) \| (value << bit & mask)`     |
//! | `HiWordMask`      | `(mask << 16) \| (value << bit & mask)`      |
//!
//! Neither form disturbs bits outside the target field.

use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{GpioError, GpioResult};
use crate::mem::RegisterWindow;
use crate::pin::descriptor::field_mask;
use crate::pin::{Level, PinDescriptor, PinMode, RegisterField};

/// How a register accepts partial updates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WriteConvention {
    /// Read, clear the field, OR in the value, write back
    ReadModifyWrite,
    /// Upper half-word is a per-bit write enable for the lower half-word
    HiWordMask,
}

impl fmt::Display for WriteConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteConvention::ReadModifyWrite => write!(f, "read-modify-write"),
            WriteConvention::HiWordMask => write!(f, "hi-word write mask"),
        }
    }
}

/// Meaning of a set direction bit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectionPolarity {
    /// 1 = output (Rockchip `SWPORT_DDR`)
    HighIsOutput,
    /// 0 = output (Amlogic `EN_N`)
    LowIsOutput,
}

impl DirectionPolarity {
    fn bit_for(self, mode: PinMode) -> u32 {
        let output = mode == PinMode::Output;
        match self {
            DirectionPolarity::HighIsOutput => output as u32,
            DirectionPolarity::LowIsOutput => !output as u32,
        }
    }
}

/// Static description of one register window a chip needs mapped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSpec {
    pub name: &'static str,
    pub phys_addr: u64,
    pub len: usize,
    pub convention: WriteConvention,
}

impl WindowSpec {
    pub const fn new(
        name: &'static str,
        phys_addr: u64,
        len: usize,
        convention: WriteConvention,
    ) -> Self {
        Self {
            name,
            phys_addr,
            len,
            convention,
        }
    }
}

/// A mapped window together with the write convention it was declared with
pub struct RegisterBlock {
    pub spec: WindowSpec,
    pub window: Box<dyn RegisterWindow>,
}

impl RegisterBlock {
    pub fn new(spec: WindowSpec, window: Box<dyn RegisterWindow>) -> Self {
        Self { spec, window }
    }

    /// Replace `width` bits at `bit` of the register at `offset` with `value`
    pub fn write_field(&mut self, offset: usize, bit: u8, width: u8, value: u32) -> GpioResult<()> {
        let mask = field_mask(width)
            .checked_shl(bit as u32)
            .filter(|_| width > 0 && bit as u32 + width as u32 <= 32)
            .ok_or_else(|| {
                GpioError::RegisterLayout(format!(
                    "{}+{:#x}: field bit {} width {} does not fit a register",
                    self.spec.name, offset, bit, width
                ))
            })?;
        let bits = (value << bit) & mask;

        let stored = match self.spec.convention {
            WriteConvention::ReadModifyWrite => {
                let current = self.window.read(offset)?;
                (current & !mask) | bits
            }
            WriteConvention::HiWordMask => {
                if bit as u32 + width as u32 > 16 {
                    return Err(GpioError::RegisterLayout(format!(
                        "{}+{:#x}: bit {} width {} is outside the masked half-word",
                        self.spec.name, offset, bit, width
                    )));
                }
                (mask << 16) | bits
            }
        };

        debug!(
            "{}+{:#05x} [{}:{}] <- {:#x} (store {:#010x})",
            self.spec.name,
            offset,
            bit as u32 + width as u32 - 1,
            bit,
            value,
            stored
        );
        self.window.write(offset, stored)
    }

    pub fn read_bit(&self, offset: usize, bit: u8) -> GpioResult<bool> {
        let value = self.window.read(offset)?;
        Ok(value & (1 << bit) != 0)
    }
}

fn field_write(blocks: &mut [RegisterBlock], field: &RegisterField, value: u32) -> GpioResult<()> {
    let mapped = blocks.len();
    let block = blocks
        .get_mut(field.window)
        .ok_or_else(|| {
            GpioError::RegisterLayout(format!(
                "window {} referenced but only {} mapped",
                field.window, mapped
            ))
        })?;
    block.write_field(field.offset, field.bit, field.width, value)
}

fn bank<'a>(blocks: &'a mut [RegisterBlock], pin: &PinDescriptor) -> GpioResult<&'a mut RegisterBlock> {
    let mapped = blocks.len();
    blocks.get_mut(pin.bank).ok_or_else(|| {
        GpioError::RegisterLayout(format!(
            "{} lives in window {} but only {} mapped",
            pin.name, pin.bank, mapped
        ))
    })
}

/// Configure a pin as a plain GPIO input or output.
///
/// Order matters: the bank clock is ungated before any other register is
/// touched, then the mux is set to the GPIO function, then the direction.
pub fn set_mode(
    blocks: &mut [RegisterBlock],
    pin: &mut PinDescriptor,
    mode: PinMode,
    polarity: DirectionPolarity,
) -> GpioResult<()> {
    if !matches!(mode, PinMode::Input | PinMode::Output) {
        return Err(GpioError::InvalidMode(mode));
    }
    if pin.mode == PinMode::Interrupt {
        return Err(GpioError::PinArmed(pin.name.clone()));
    }
    let mux = match pin.mux {
        Some(mux) if pin.is_digital() => mux,
        _ => {
            return Err(GpioError::NotCapable {
                name: pin.name.clone(),
                capability: "digital I/O",
            })
        }
    };

    // 0 = clock running
    if let Some(clock) = pin.clock {
        field_write(blocks, &clock, 0)?;
    }

    // function 0 is GPIO on every supported family
    field_write(blocks, &mux, 0)?;

    let direction = pin.direction;
    bank(blocks, pin)?.write_field(direction.offset, direction.bit, 1, polarity.bit_for(mode))?;

    debug!("{} -> {}", pin.name, mode);
    pin.mode = mode;
    Ok(())
}

/// Drive an output pin
pub fn write(blocks: &mut [RegisterBlock], pin: &PinDescriptor, level: Level) -> GpioResult<()> {
    if pin.mode != PinMode::Output {
        return Err(GpioError::WrongMode {
            name: pin.name.clone(),
            expected: PinMode::Output,
            actual: pin.mode,
        });
    }
    let output = pin.output;
    bank(blocks, pin)?.write_field(output.offset, output.bit, 1, level.as_bit())
}

/// Sample an input pin
pub fn read(blocks: &mut [RegisterBlock], pin: &PinDescriptor) -> GpioResult<Level> {
    if pin.mode != PinMode::Input {
        return Err(GpioError::WrongMode {
            name: pin.name.clone(),
            expected: PinMode::Input,
            actual: pin.mode,
        });
    }
    let input = pin.input;
    let high = bank(blocks, pin)?.read_bit(input.offset, input.bit)?;
    Ok(Level::from_bit(high))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mem::{SimulatedMemory, WindowMapper};
    use crate::pin::{Capabilities, RegBit};

    const GPIO: u64 = 0x1000_0000;
    const AUX: u64 = 0x2000_0000;

    fn blocks(mem: &mut SimulatedMemory, convention: WriteConvention) -> Vec<RegisterBlock> {
        [
            WindowSpec::new("gpio", GPIO, 0x100, convention),
            WindowSpec::new("aux", AUX, 0x100, convention),
        ]
        .into_iter()
        .map(|spec| RegisterBlock::new(spec, mem.map_window(spec.phys_addr, spec.len).unwrap()))
        .collect()
    }

    fn pin(bit: u8) -> PinDescriptor {
        PinDescriptor {
            name: format!("TEST_{}", bit),
            bank: 0,
            clock: Some(RegisterField::new(1, 0x10, 3, 1)),
            mux: Some(RegisterField::new(1, 0x20, 4, 4)),
            direction: RegBit::new(0x08, bit),
            output: RegBit::new(0x00, bit),
            input: RegBit::new(0x70, bit),
            sysfs_line: bit as u32,
            capabilities: Capabilities::DIGITAL,
            mode: PinMode::NotSet,
            value_fd: None,
        }
    }

    #[test]
    fn test_rmw_preserves_neighbours() {
        let mut mem = SimulatedMemory::new();
        let mut blocks = blocks(&mut mem, WriteConvention::ReadModifyWrite);
        mem.poke(AUX + 0x10, 0xffff_ffff);
        mem.poke(AUX + 0x20, 0xffff_ffff);
        mem.poke(GPIO, 0xa5a5_0000);

        let mut p = pin(5);
        set_mode(&mut blocks, &mut p, PinMode::Output, DirectionPolarity::HighIsOutput).unwrap();
        write(&mut blocks, &p, Level::High).unwrap();

        assert_eq!(mem.peek(AUX + 0x10), 0xffff_fff7);
        assert_eq!(mem.peek(AUX + 0x20), 0xffff_ff0f);
        assert_eq!(mem.peek(GPIO + 0x08), 1 << 5);
        assert_eq!(mem.peek(GPIO), 0xa5a5_0020);

        write(&mut blocks, &p, Level::Low).unwrap();
        assert_eq!(mem.peek(GPIO), 0xa5a5_0000);
    }

    #[test]
    fn test_hiword_mask_stores() {
        let mut mem = SimulatedMemory::new();
        let mut blocks = blocks(&mut mem, WriteConvention::HiWordMask);

        let mut p = pin(5);
        set_mode(&mut blocks, &mut p, PinMode::Output, DirectionPolarity::HighIsOutput).unwrap();
        write(&mut blocks, &p, Level::High).unwrap();

        assert_eq!(mem.peek(AUX + 0x10), 0x0008_0000);
        assert_eq!(mem.peek(AUX + 0x20), 0x00f0_0000);
        assert_eq!(mem.peek(GPIO + 0x08), 0x0020_0020);
        assert_eq!(mem.peek(GPIO), 0x0020_0020);

        // a masked store never needs the old value
        set_mode(&mut blocks, &mut p, PinMode::Input, DirectionPolarity::HighIsOutput).unwrap();
        assert_eq!(mem.peek(GPIO + 0x08), 0x0020_0000);
    }

    #[test]
    fn test_hiword_rejects_upper_half() {
        let mut mem = SimulatedMemory::new();
        let mut blocks = blocks(&mut mem, WriteConvention::HiWordMask);
        let err = blocks[0].write_field(0, 16, 1, 1).unwrap_err();
        assert!(matches!(err, GpioError::RegisterLayout(_)));
        assert_eq!(mem.write_count(), 0);
    }

    #[test]
    fn test_inverted_direction() {
        let mut mem = SimulatedMemory::new();
        let mut blocks = blocks(&mut mem, WriteConvention::ReadModifyWrite);
        mem.poke(GPIO + 0x08, 0xffff_ffff);

        let mut p = pin(2);
        set_mode(&mut blocks, &mut p, PinMode::Output, DirectionPolarity::LowIsOutput).unwrap();
        assert_eq!(mem.peek(GPIO + 0x08), 0xffff_fffb);
        set_mode(&mut blocks, &mut p, PinMode::Input, DirectionPolarity::LowIsOutput).unwrap();
        assert_eq!(mem.peek(GPIO + 0x08), 0xffff_ffff);
    }

    #[test]
    fn test_wrong_mode_touches_nothing() {
        let mut mem = SimulatedMemory::new();
        let mut blocks = blocks(&mut mem, WriteConvention::ReadModifyWrite);
        let mut p = pin(1);

        assert!(matches!(
            write(&mut blocks, &p, Level::High),
            Err(GpioError::WrongMode { expected: PinMode::Output, .. })
        ));
        assert!(matches!(
            read(&mut blocks, &p),
            Err(GpioError::WrongMode { expected: PinMode::Input, .. })
        ));
        assert!(matches!(
            set_mode(&mut blocks, &mut p, PinMode::Interrupt, DirectionPolarity::HighIsOutput),
            Err(GpioError::InvalidMode(PinMode::Interrupt))
        ));
        assert_eq!(mem.write_count(), 0);
        assert_eq!(p.mode, PinMode::NotSet);
    }

    #[test]
    fn test_read_samples_input_register() {
        let mut mem = SimulatedMemory::new();
        let mut blocks = blocks(&mut mem, WriteConvention::ReadModifyWrite);
        let mut p = pin(9);
        set_mode(&mut blocks, &mut p, PinMode::Input, DirectionPolarity::HighIsOutput).unwrap();

        assert_eq!(read(&mut blocks, &p).unwrap(), Level::Low);
        mem.poke(GPIO + 0x70, 1 << 9);
        assert_eq!(read(&mut blocks, &p).unwrap(), Level::High);
    }

    #[test]
    fn test_pin_without_mux_is_not_digital() {
        let mut mem = SimulatedMemory::new();
        let mut blocks = blocks(&mut mem, WriteConvention::ReadModifyWrite);
        let mut p = pin(3);
        p.mux = None;
        assert!(matches!(
            set_mode(&mut blocks, &mut p, PinMode::Output, DirectionPolarity::HighIsOutput),
            Err(GpioError::NotCapable { .. })
        ));
        assert_eq!(mem.write_count(), 0);
    }
}
