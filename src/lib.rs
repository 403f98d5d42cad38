//! Userspace GPIO for single-board computers
//!
//! Drives GPIO lines of Rockchip and Amlogic SoCs directly through their
//! registers (`/dev/mem`) and arms edge interrupts through the kernel's
//! sysfs GPIO interface.
//!
//! # Layers
//!
//! - [`mem`]: physical register windows (real or simulated)
//! - [`pin`]: descriptors, logical pin maps and [`pin::resolve`]
//! - [`driver`]: mode, read and write under each window's write convention
//! - [`sysfs`]: export / edge / poll interrupt protocol
//! - [`soc`]: chip families and the per-chip [`SocContext`]
//! - [`board`]: header wiring of supported boards
//!
//! # Example
//!
//! ```no_run
//! use sbc_gpio::{Board, HalConfig, Level, PinMode};
//!
//! let config = HalConfig::new();
//! let profile = sbc_gpio::board::get_board("rock3a").unwrap();
//! let mut board = Board::open(profile, &config)?;
//! let soc = board.soc_mut();
//! soc.pin_mode(0, PinMode::Output)?;
//! soc.digital_write(0, Level::High)?;
//! # Ok::<(), sbc_gpio::GpioError>(())
//! ```

#[cfg(not(unix))]
compile_error!("sbc-gpio needs a Unix target (mmap, poll and sysfs)");

pub mod board;
pub mod config;
pub mod driver;
pub mod error;
pub mod mem;
pub mod pin;
pub mod soc;
pub mod sysfs;

pub use board::{Board, BoardProfile};
pub use config::HalConfig;
pub use driver::{DirectionPolarity, WindowSpec, WriteConvention};
pub use error::{GpioError, GpioResult};
pub use pin::{Level, LogicalPinMap, PinMode};
pub use soc::{ChipFamily, SocContext};
pub use sysfs::{EdgeMode, WaitOutcome};
