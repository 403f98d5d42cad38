//! Pin descriptors, logical pin maps and pin resolution

pub mod descriptor;
pub mod map;
pub mod resolve;

pub use descriptor::{Capabilities, Level, PinDescriptor, PinMode, RegBit, RegisterField};
pub use map::LogicalPinMap;
pub use resolve::resolve;
