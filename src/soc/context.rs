//! Per-chip runtime context
//!
//! [`SocContext`] owns everything one active chip needs: the mapped register
//! blocks, the physical memory handle, the descriptor table and the board's
//! logical pin maps. It replaces process-wide state, so two contexts (for
//! example two simulated chips in one test) never interfere.

use log::{debug, info, warn};
use std::fmt;
use std::os::unix::io::{AsRawFd, RawFd};
use std::path::{Path, PathBuf};

use super::ChipFamily;
use crate::driver::{self, DirectionPolarity, RegisterBlock};
use crate::error::{GpioError, GpioResult};
use crate::mem::{PhysMem, WindowMapper, DEV_MEM};
use crate::pin::{resolve, Level, LogicalPinMap, PinDescriptor, PinMode};
use crate::sysfs::{self, EdgeMode, SysfsGpio, WaitOutcome};

pub struct SocContext {
    family: &'static dyn ChipFamily,
    polarity: DirectionPolarity,
    pins: Vec<PinDescriptor>,
    blocks: Vec<RegisterBlock>,
    mem: Option<Box<dyn WindowMapper>>,
    map: Option<LogicalPinMap>,
    irq: Option<LogicalPinMap>,
    sysfs: SysfsGpio,
    mem_device: PathBuf,
}

impl fmt::Debug for SocContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SocContext")
            .field("chip", &self.family.chip())
            .field("mapped", &self.blocks.len())
            .field("pins", &self.pins.len())
            .field("sysfs", &self.sysfs.root())
            .finish()
    }
}

impl SocContext {
    /// Create an unmapped context for `family`
    pub fn new(family: &'static dyn ChipFamily) -> Self {
        Self {
            family,
            polarity: family.direction_polarity(),
            pins: family.pins(),
            blocks: Vec::new(),
            mem: None,
            map: None,
            irq: None,
            sysfs: SysfsGpio::default(),
            mem_device: PathBuf::from(DEV_MEM),
        }
    }

    /// Set the sysfs GPIO class directory
    pub fn with_sysfs_root(mut self, root: impl AsRef<Path>) -> Self {
        self.sysfs = SysfsGpio::new(root);
        self
    }

    /// Set the physical memory device opened by [`SocContext::setup`]
    pub fn with_mem_device(mut self, path: impl AsRef<Path>) -> Self {
        self.mem_device = path.as_ref().to_path_buf();
        self
    }

    /// Open the physical memory device and map every window of the chip
    pub fn setup(&mut self) -> GpioResult<()> {
        if self.is_mapped() {
            return Ok(());
        }
        let mem = PhysMem::open_path(&self.mem_device)?;
        self.setup_with(mem)
    }

    /// Map every window of the chip through `mapper`.
    ///
    /// On failure the windows mapped so far are released and the mapper is
    /// closed; the context stays unmapped. A second call on a mapped context
    /// does nothing.
    pub fn setup_with<M: WindowMapper + 'static>(&mut self, mapper: M) -> GpioResult<()> {
        if self.is_mapped() {
            debug!("{} already mapped, ignoring setup", self.family.chip());
            return Ok(());
        }

        let mut mapper: Box<dyn WindowMapper> = Box::new(mapper);
        let mut blocks = Vec::with_capacity(self.family.windows().len());
        for spec in self.family.windows() {
            match mapper.map_window(spec.phys_addr, spec.len) {
                Ok(window) => {
                    debug!(
                        "mapped {} at {:#010x} ({:#x} bytes, {})",
                        spec.name, spec.phys_addr, spec.len, spec.convention
                    );
                    blocks.push(RegisterBlock::new(*spec, window));
                }
                Err(e) => {
                    for block in blocks.iter_mut() {
                        block.window.unmap();
                    }
                    mapper.close();
                    return Err(e);
                }
            }
        }

        info!(
            "{} {}: {} register windows mapped from {}",
            self.family.brand(),
            self.family.chip(),
            blocks.len(),
            mapper.describe()
        );
        self.blocks = blocks;
        self.mem = Some(mapper);
        Ok(())
    }

    /// Install the board's logical pin map
    pub fn set_map(&mut self, map: LogicalPinMap) {
        self.map = Some(map);
    }

    /// Install the board's interrupt pin map
    pub fn set_irq(&mut self, map: LogicalPinMap) {
        self.irq = Some(map);
    }

    pub fn is_mapped(&self) -> bool {
        self.mem.is_some()
    }

    fn ensure_mapped(&self) -> GpioResult<()> {
        if self.is_mapped() {
            Ok(())
        } else {
            Err(GpioError::NotInitialized("register windows"))
        }
    }

    /// Configure `pin` as a GPIO input or output
    pub fn pin_mode(&mut self, pin: usize, mode: PinMode) -> GpioResult<()> {
        self.ensure_mapped()?;
        let desc = resolve(pin, self.map.as_ref(), &mut self.pins, self.blocks.len())?;
        driver::set_mode(&mut self.blocks, desc, mode, self.polarity)
    }

    pub fn digital_write(&mut self, pin: usize, level: Level) -> GpioResult<()> {
        self.ensure_mapped()?;
        let desc = resolve(pin, self.map.as_ref(), &mut self.pins, self.blocks.len())?;
        driver::write(&mut self.blocks, desc, level)
    }

    pub fn digital_read(&mut self, pin: usize) -> GpioResult<Level> {
        self.ensure_mapped()?;
        let desc = resolve(pin, self.map.as_ref(), &mut self.pins, self.blocks.len())?;
        driver::read(&mut self.blocks, desc)
    }

    /// Arm `pin` (through the interrupt map) for `edge` notifications.
    ///
    /// The pin only enters `Interrupt` mode if every sysfs step succeeded.
    pub fn isr(&mut self, pin: usize, edge: EdgeMode) -> GpioResult<()> {
        self.ensure_mapped()?;
        if !self.family.edge_modes().contains(&edge) {
            return Err(GpioError::UnsupportedEdgeMode {
                edge,
                chip: self.family.chip().to_string(),
            });
        }
        let desc = resolve(pin, self.irq.as_ref(), &mut self.pins, self.blocks.len())?;
        if desc.mode == PinMode::Interrupt {
            return Err(GpioError::PinArmed(desc.name.clone()));
        }
        if !desc.is_interrupt_capable() {
            return Err(GpioError::NotCapable {
                name: desc.name.clone(),
                capability: "interrupts",
            });
        }

        let file = self.sysfs.arm(desc.sysfs_line, edge)?;
        desc.value_fd = Some(file);
        desc.mode = PinMode::Interrupt;
        info!("{} (gpio{}) armed for {} edges", desc.name, desc.sysfs_line, edge);
        Ok(())
    }

    fn armed(&mut self, pin: usize) -> GpioResult<&mut PinDescriptor> {
        self.ensure_mapped()?;
        let desc = resolve(pin, self.irq.as_ref(), &mut self.pins, self.blocks.len())?;
        if desc.mode != PinMode::Interrupt {
            return Err(GpioError::WrongMode {
                name: desc.name.clone(),
                expected: PinMode::Interrupt,
                actual: desc.mode,
            });
        }
        Ok(desc)
    }

    /// Block until `pin` sees an edge or `timeout_ms` elapses (negative
    /// waits forever)
    pub fn wait_for_interrupt(&mut self, pin: usize, timeout_ms: i32) -> GpioResult<WaitOutcome> {
        let desc = self.armed(pin)?;
        let file = desc
            .value_fd
            .as_ref()
            .ok_or(GpioError::NotInitialized("interrupt value file"))?;
        sysfs::wait(file, timeout_ms)
    }

    /// Raw descriptor of the armed value file, for use with an external
    /// `poll`/`epoll` loop. Valid until [`SocContext::gc`].
    pub fn selectable_fd(&mut self, pin: usize) -> GpioResult<RawFd> {
        let desc = self.armed(pin)?;
        desc.value_fd
            .as_ref()
            .map(|f| f.as_raw_fd())
            .ok_or(GpioError::NotInitialized("interrupt value file"))
    }

    /// Release everything: outputs back to input, armed lines unexported,
    /// value files closed, windows unmapped, memory device closed.
    ///
    /// Never fails and may be called any number of times. The pin maps stay
    /// installed so a later `setup` can reuse them.
    pub fn gc(&mut self) {
        let mapped = self.blocks.len();
        let mut restored = 0;
        let mut unexported = 0;

        for pin in self.pins.iter_mut() {
            match pin.mode {
                PinMode::Output if pin.windows().all(|w| w < mapped) => {
                    match driver::set_mode(&mut self.blocks, pin, PinMode::Input, self.polarity) {
                        Ok(()) => restored += 1,
                        Err(e) => warn!("failed to return {} to input: {}", pin.name, e),
                    }
                }
                PinMode::Interrupt if self.sysfs.is_exported(pin.sysfs_line) => {
                    match self.sysfs.unexport(pin.sysfs_line) {
                        Ok(()) => unexported += 1,
                        Err(e) => warn!("failed to unexport {}: {}", pin.name, e),
                    }
                }
                _ => {}
            }
            pin.value_fd = None;
            pin.mode = PinMode::NotSet;
        }

        for block in self.blocks.iter_mut() {
            block.window.unmap();
        }
        self.blocks.clear();

        if let Some(mut mem) = self.mem.take() {
            mem.close();
            info!(
                "{}: released ({} outputs restored, {} lines unexported)",
                self.family.chip(),
                restored,
                unexported
            );
        }
    }

    /// Whether `pin` resolves to a GPIO line through the board map
    pub fn valid_gpio(&self, pin: usize) -> bool {
        self.descriptor_index(pin).is_some()
    }

    /// Symbolic name of the line behind `pin`
    pub fn pin_name(&self, pin: usize) -> Option<&str> {
        self.descriptor_index(pin)
            .map(|index| self.pins[index].name.as_str())
    }

    /// Current mode of the line behind `pin`
    pub fn mode(&self, pin: usize) -> Option<PinMode> {
        self.descriptor_index(pin).map(|index| self.pins[index].mode)
    }

    fn descriptor_index(&self, pin: usize) -> Option<usize> {
        self.map
            .as_ref()?
            .get(pin)
            .flatten()
            .filter(|&index| index < self.pins.len())
    }

    pub fn brand(&self) -> &'static str {
        self.family.brand()
    }

    pub fn chip(&self) -> &'static str {
        self.family.chip()
    }

    pub fn family(&self) -> &'static dyn ChipFamily {
        self.family
    }

    /// The descriptor table, in chip order
    pub fn pins(&self) -> &[PinDescriptor] {
        &self.pins
    }

    pub fn map(&self) -> Option<&LogicalPinMap> {
        self.map.as_ref()
    }

    pub fn irq_map(&self) -> Option<&LogicalPinMap> {
        self.irq.as_ref()
    }
}

impl Drop for SocContext {
    fn drop(&mut self) {
        self.gc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{WindowSpec, WriteConvention};
    use crate::mem::SimulatedMemory;
    use crate::pin::{Capabilities, RegBit, RegisterField};
    use std::fs;
    use tempfile::tempdir;

    const GPIO0: u64 = 0x1000_0000;
    const CRU: u64 = 0x2000_0000;
    const GRF: u64 = 0x3000_0000;

    static RMW_WINDOWS: [WindowSpec; 3] = [
        WindowSpec::new("GPIO0", GPIO0, 0x1000, WriteConvention::ReadModifyWrite),
        WindowSpec::new("CRU", CRU, 0x1000, WriteConvention::ReadModifyWrite),
        WindowSpec::new("GRF", GRF, 0x1000, WriteConvention::ReadModifyWrite),
    ];

    static HIWORD_WINDOWS: [WindowSpec; 3] = [
        WindowSpec::new("GPIO0", GPIO0, 0x1000, WriteConvention::HiWordMask),
        WindowSpec::new("CRU", CRU, 0x1000, WriteConvention::HiWordMask),
        WindowSpec::new("GRF", GRF, 0x1000, WriteConvention::HiWordMask),
    ];

    /// One 32-line bank with flat 32-bit registers
    struct TestChip {
        windows: &'static [WindowSpec],
    }

    static RMW_CHIP: TestChip = TestChip {
        windows: &RMW_WINDOWS,
    };
    static HIWORD_CHIP: TestChip = TestChip {
        windows: &HIWORD_WINDOWS,
    };

    impl ChipFamily for TestChip {
        fn brand(&self) -> &'static str {
            "test"
        }

        fn chip(&self) -> &'static str {
            "testchip"
        }

        fn windows(&self) -> &'static [WindowSpec] {
            self.windows
        }

        fn pins(&self) -> Vec<PinDescriptor> {
            (0..32)
                .map(|n| PinDescriptor {
                    name: format!("T{}", n),
                    bank: 0,
                    clock: Some(RegisterField::new(1, 0x0, 0, 1)),
                    // hi-word windows only reach the lower half-word
                    mux: Some(RegisterField::new(2, (n / 4) * 4, ((n % 4) * 2) as u8, 2)),
                    direction: RegBit::new(0x04 + (n / 16) * 0x10, (n % 16) as u8),
                    output: RegBit::new((n / 16) * 0x10, (n % 16) as u8),
                    input: RegBit::new(0x50, n as u8),
                    sysfs_line: 100 + n as u32,
                    capabilities: Capabilities::DIGITAL.union(Capabilities::INTERRUPT),
                    mode: PinMode::NotSet,
                    value_fd: None,
                })
                .collect()
        }

        fn direction_polarity(&self) -> DirectionPolarity {
            DirectionPolarity::HighIsOutput
        }

        fn edge_modes(&self) -> &'static [EdgeMode] {
            &[EdgeMode::Rising, EdgeMode::Both]
        }
    }

    fn context(chip: &'static TestChip) -> (SocContext, SimulatedMemory) {
        let mem = SimulatedMemory::new();
        let mut soc = SocContext::new(chip);
        soc.setup_with(mem.clone()).unwrap();
        soc.set_map(LogicalPinMap::from_signed(&[23, -1, 15]));
        soc.set_irq(LogicalPinMap::from_signed(&[7, -1]));
        (soc, mem)
    }

    #[test]
    fn test_board_map_scenario() {
        for chip in [&RMW_CHIP, &HIWORD_CHIP] {
            let (mut soc, mem) = context(chip);
            // pin 23: output bit 7 of the high data register at 0x10
            mem.poke(GPIO0 + 0x10, 0x0000_0f0f);

            assert!(matches!(
                soc.pin_mode(1, PinMode::Output),
                Err(GpioError::UnmappedPin(1))
            ));

            soc.pin_mode(0, PinMode::Output).unwrap();
            soc.digital_write(0, Level::High).unwrap();

            let reg = mem.peek(GPIO0 + 0x10);
            match chip.windows[0].convention {
                WriteConvention::ReadModifyWrite => assert_eq!(reg, 0x0000_0f8f),
                WriteConvention::HiWordMask => assert_eq!(reg, 0x0080_0080),
            }
            assert_eq!(soc.mode(0), Some(PinMode::Output));
        }
    }

    #[test]
    fn test_loopback_round_trip() {
        let (mut soc, mem) = context(&RMW_CHIP);
        soc.pin_mode(2, PinMode::Output).unwrap();
        soc.digital_write(2, Level::High).unwrap();
        soc.pin_mode(2, PinMode::Input).unwrap();

        // model the external loopback: the input register follows the line
        let driven = mem.peek(GPIO0) & (1 << 15) != 0;
        mem.poke(GPIO0 + 0x50, (driven as u32) << 15);
        assert_eq!(soc.digital_read(2).unwrap(), Level::High);
    }

    #[test]
    fn test_bad_pins_touch_nothing() {
        let (mut soc, mem) = context(&HIWORD_CHIP);
        let before = mem.snapshot();

        assert!(matches!(
            soc.pin_mode(3, PinMode::Output),
            Err(GpioError::OutOfRange { pin: 3, len: 3 })
        ));
        assert!(matches!(
            soc.pin_mode(1, PinMode::Output),
            Err(GpioError::UnmappedPin(1))
        ));
        assert!(matches!(
            soc.digital_write(1, Level::High),
            Err(GpioError::UnmappedPin(1))
        ));
        assert!(matches!(soc.digital_read(1), Err(GpioError::UnmappedPin(1))));
        assert!(matches!(
            soc.digital_write(0, Level::High),
            Err(GpioError::WrongMode { .. })
        ));
        assert!(matches!(
            soc.digital_read(0),
            Err(GpioError::WrongMode { .. })
        ));
        assert_eq!(mem.write_count(), 0);
        assert_eq!(mem.snapshot(), before);
    }

    #[test]
    fn test_not_initialized() {
        let mut soc = SocContext::new(&RMW_CHIP);
        soc.set_map(LogicalPinMap::from_signed(&[0]));
        assert!(matches!(
            soc.pin_mode(0, PinMode::Output),
            Err(GpioError::NotInitialized(_))
        ));

        let mut soc = SocContext::new(&RMW_CHIP);
        soc.setup_with(SimulatedMemory::new()).unwrap();
        assert!(matches!(
            soc.digital_read(0),
            Err(GpioError::NotInitialized("pin map"))
        ));
        assert!(matches!(
            soc.wait_for_interrupt(0, 0),
            Err(GpioError::NotInitialized("pin map"))
        ));
    }

    #[test]
    fn test_second_setup_is_noop() {
        let (mut soc, mem) = context(&RMW_CHIP);
        assert_eq!(mem.live_windows(), 3);
        let other = SimulatedMemory::new();
        soc.setup_with(other.clone()).unwrap();
        assert_eq!(other.live_windows(), 0);
        assert_eq!(mem.live_windows(), 3);
    }

    #[test]
    fn test_gc_is_idempotent() {
        let (mut soc, mem) = context(&RMW_CHIP);
        soc.pin_mode(0, PinMode::Output).unwrap();
        soc.digital_write(0, Level::High).unwrap();

        soc.gc();
        // the output was returned to input before unmapping
        assert_eq!(mem.peek(GPIO0 + 0x14) & (1 << 7), 0);
        assert_eq!(mem.live_windows(), 0);
        assert!(mem.is_closed());
        let after_first = mem.snapshot();

        soc.gc();
        assert_eq!(mem.snapshot(), after_first);
        assert!(soc.pins().iter().all(|p| p.mode == PinMode::NotSet));
        assert!(!soc.is_mapped());
        assert!(matches!(
            soc.pin_mode(0, PinMode::Output),
            Err(GpioError::NotInitialized(_))
        ));
    }

    #[test]
    fn test_gc_without_setup() {
        let mut soc = SocContext::new(&HIWORD_CHIP);
        soc.gc();
        soc.gc();
        assert!(!soc.is_mapped());
    }

    #[test]
    fn test_isr_and_wait() {
        let dir = tempdir().unwrap();
        let line = dir.path().join("gpio107");
        fs::create_dir(&line).unwrap();
        fs::write(line.join("direction"), "out").unwrap();
        fs::write(line.join("edge"), "none").unwrap();
        fs::write(line.join("value"), "0\n").unwrap();
        fs::write(dir.path().join("unexport"), "").unwrap();

        let (soc, _mem) = context(&RMW_CHIP);
        let mut soc = soc.with_sysfs_root(dir.path());

        assert!(matches!(
            soc.wait_for_interrupt(0, 0),
            Err(GpioError::WrongMode { expected: PinMode::Interrupt, .. })
        ));

        soc.isr(0, EdgeMode::Rising).unwrap();
        assert_eq!(fs::read_to_string(line.join("edge")).unwrap(), "rising");
        assert_eq!(soc.wait_for_interrupt(0, 0).unwrap(), WaitOutcome::Timeout);
        assert!(soc.selectable_fd(0).unwrap() >= 0);

        // armed pins cannot be reconfigured
        assert!(matches!(
            soc.isr(0, EdgeMode::Both),
            Err(GpioError::PinArmed(_))
        ));

        soc.gc();
        assert_eq!(fs::read_to_string(dir.path().join("unexport")).unwrap(), "107");
        assert!(soc.pins()[7].value_fd.is_none());
    }

    #[test]
    fn test_isr_failure_leaves_pin_unset() {
        let dir = tempdir().unwrap();
        let (soc, _mem) = context(&RMW_CHIP);
        let mut soc = soc.with_sysfs_root(dir.path());

        // no export file and no gpio107 directory
        assert!(matches!(
            soc.isr(0, EdgeMode::Rising),
            Err(GpioError::Sysfs { action: "export", .. })
        ));
        assert_eq!(soc.pins()[7].mode, PinMode::NotSet);
        assert!(soc.pins()[7].value_fd.is_none());
    }

    #[test]
    fn test_failed_isr_unexports_line() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("export"), "").unwrap();
        fs::write(dir.path().join("unexport"), "").unwrap();
        let (soc, _mem) = context(&RMW_CHIP);
        let mut soc = soc.with_sysfs_root(dir.path());

        // the export "succeeds" but gpio107 never appears
        assert!(matches!(
            soc.isr(0, EdgeMode::Rising),
            Err(GpioError::Sysfs { action: "direction", .. })
        ));
        assert_eq!(fs::read_to_string(dir.path().join("export")).unwrap(), "107");
        assert_eq!(fs::read_to_string(dir.path().join("unexport")).unwrap(), "107");
        assert_eq!(soc.pins()[7].mode, PinMode::NotSet);
    }

    #[test]
    fn test_unsupported_edge_checked_first() {
        let dir = tempdir().unwrap();
        let (soc, _mem) = context(&RMW_CHIP);
        let mut soc = soc.with_sysfs_root(dir.path());

        assert!(matches!(
            soc.isr(0, EdgeMode::Falling),
            Err(GpioError::UnsupportedEdgeMode { edge: EdgeMode::Falling, .. })
        ));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_pin_lookup() {
        let (soc, _mem) = context(&RMW_CHIP);
        assert!(soc.valid_gpio(0));
        assert!(!soc.valid_gpio(1));
        assert!(!soc.valid_gpio(5));
        assert_eq!(soc.pin_name(2), Some("T15"));
        assert_eq!(soc.chip(), "testchip");
    }
}
