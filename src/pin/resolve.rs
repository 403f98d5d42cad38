//! Logical pin resolution
//!
//! [`resolve`] is the single validation gate between a caller-supplied pin
//! number and the descriptor table. Nothing downstream re-checks bounds.

use super::{LogicalPinMap, PinDescriptor};
use crate::error::{GpioError, GpioResult};

/// Translate a logical pin through `map` into its descriptor.
///
/// `mapped` is the number of register windows currently mapped; every
/// window the descriptor refers to must be below it.
pub fn resolve<'a>(
    pin: usize,
    map: Option<&LogicalPinMap>,
    table: &'a mut [PinDescriptor],
    mapped: usize,
) -> GpioResult<&'a mut PinDescriptor> {
    let map = map.ok_or(GpioError::NotInitialized("pin map"))?;

    let index = match map.get(pin) {
        None => {
            return Err(GpioError::OutOfRange {
                pin,
                len: map.len(),
            })
        }
        Some(None) => return Err(GpioError::UnmappedPin(pin)),
        Some(Some(index)) => index,
    };

    let table_len = table.len();
    let descriptor = table.get_mut(index).ok_or(GpioError::OutOfRange {
        pin: index,
        len: table_len,
    })?;

    if let Some(bank) = descriptor.windows().find(|&w| w >= mapped) {
        return Err(GpioError::BankOutOfRange {
            pin,
            name: descriptor.name.clone(),
            bank,
            mapped,
        });
    }

    Ok(descriptor)
}
