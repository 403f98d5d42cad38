//! Amlogic SoCs

pub mod a311d;

pub use a311d::A311D;
