//! Sysfs GPIO interrupt driver
//!
//! Arms pins for edge notification through the legacy kernel interface:
//!
//! ```text
//! /sys/class/gpio/export            <- "<line>"
//! /sys/class/gpio/gpio<line>/direction <- "in"
//! /sys/class/gpio/gpio<line>/edge      <- "rising" | "falling" | "both" | "none"
//! /sys/class/gpio/gpio<line>/value     -> poll(POLLPRI), then read "0"/"1"
//! /sys/class/gpio/unexport          <- "<line>"
//! ```

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{GpioError, GpioResult};
use crate::pin::Level;

/// Default sysfs GPIO class directory
pub const SYSFS_GPIO_ROOT: &str = "/sys/class/gpio";

/// Edge sensitivity written to the `edge` attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeMode {
    Rising,
    Falling,
    Both,
    None,
}

impl EdgeMode {
    pub const ALL: [EdgeMode; 4] = [
        EdgeMode::Rising,
        EdgeMode::Falling,
        EdgeMode::Both,
        EdgeMode::None,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeMode::Rising => "rising",
            EdgeMode::Falling => "falling",
            EdgeMode::Both => "both",
            EdgeMode::None => "none",
        }
    }
}

impl fmt::Display for EdgeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EdgeMode {
    type Err = GpioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EdgeMode::ALL
            .into_iter()
            .find(|e| e.as_str() == s.to_lowercase())
            .ok_or_else(|| GpioError::Config(format!("unknown edge mode: {}", s)))
    }
}

/// Result of a bounded interrupt wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The edge fired; carries the line level read afterwards
    Edge(Level),
    /// No edge within the timeout
    Timeout,
    /// A signal interrupted the wait
    Interrupted,
}

/// Handle on a sysfs GPIO class directory
#[derive(Debug, Clone)]
pub struct SysfsGpio {
    root: PathBuf,
}

impl Default for SysfsGpio {
    fn default() -> Self {
        Self::new(SYSFS_GPIO_ROOT)
    }
}

impl SysfsGpio {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn line_dir(&self, line: u32) -> PathBuf {
        self.root.join(format!("gpio{}", line))
    }

    pub fn is_exported(&self, line: u32) -> bool {
        self.line_dir(line).is_dir()
    }

    pub fn export(&self, line: u32) -> GpioResult<()> {
        write_attr(&self.root.join("export"), &line.to_string(), "export")
    }

    pub fn unexport(&self, line: u32) -> GpioResult<()> {
        write_attr(&self.root.join("unexport"), &line.to_string(), "unexport")
    }

    pub fn set_direction_in(&self, line: u32) -> GpioResult<()> {
        write_attr(&self.line_dir(line).join("direction"), "in", "direction")
    }

    pub fn set_edge(&self, line: u32, edge: EdgeMode) -> GpioResult<()> {
        write_attr(&self.line_dir(line).join("edge"), edge.as_str(), "edge")
    }

    /// Open the value attribute and consume any pending event
    pub fn open_value(&self, line: u32) -> GpioResult<File> {
        let path = self.line_dir(line).join("value");
        let sysfs_err = |source| GpioError::Sysfs {
            action: "value",
            path: path.clone(),
            source,
        };
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(sysfs_err)?;
        io::copy(&mut file, &mut io::sink()).map_err(sysfs_err)?;
        Ok(file)
    }

    /// Export (if needed), configure as an input with `edge` sensitivity and
    /// open the value file. Nothing is returned unless every step succeeded;
    /// a line exported by this call is unexported again on failure.
    pub fn arm(&self, line: u32, edge: EdgeMode) -> GpioResult<File> {
        let exported = !self.is_exported(line);
        if exported {
            self.export(line)?;
        }
        let configured = self
            .set_direction_in(line)
            .and_then(|()| self.set_edge(line, edge))
            .and_then(|()| self.open_value(line));
        match configured {
            Ok(file) => {
                debug!("gpio{} armed for {} edges", line, edge);
                Ok(file)
            }
            Err(e) => {
                if exported {
                    if let Err(undo) = self.unexport(line) {
                        warn!("gpio{} left exported: {}", line, undo);
                    }
                }
                Err(e)
            }
        }
    }
}

fn write_attr(path: &Path, value: &str, action: &'static str) -> GpioResult<()> {
    debug!("{} <- {}", path.display(), value);
    OpenOptions::new()
        .write(true)
        .truncate(true)
        .open(path)
        .and_then(|mut f| f.write_all(value.as_bytes()))
        .map_err(|source| GpioError::Sysfs {
            action,
            path: path.to_path_buf(),
            source,
        })
}

/// Block until the armed value file reports an edge or `timeout_ms` elapses.
///
/// A negative timeout waits indefinitely.
pub fn wait(file: &File, timeout_ms: i32) -> GpioResult<WaitOutcome> {
    let mut fds = libc::pollfd {
        fd: file.as_raw_fd(),
        events: libc::POLLPRI | libc::POLLERR,
        revents: 0,
    };

    // SAFETY: fds is a single valid pollfd for the duration of the call.
    let ready = unsafe { libc::poll(&mut fds, 1, timeout_ms) };
    if ready < 0 {
        let err = io::Error::last_os_error();
        if err.kind() == io::ErrorKind::Interrupted {
            return Ok(WaitOutcome::Interrupted);
        }
        return Err(GpioError::Sysfs {
            action: "poll",
            path: PathBuf::from(format!("fd {}", fds.fd)),
            source: err,
        });
    }
    if ready == 0 {
        return Ok(WaitOutcome::Timeout);
    }

    read_level(file).map(WaitOutcome::Edge)
}

/// Re-read the value attribute from the start; this also acknowledges the edge
pub fn read_level(mut file: &File) -> GpioResult<Level> {
    let fd = file.as_raw_fd();
    let sysfs_err = |source| GpioError::Sysfs {
        action: "value",
        path: PathBuf::from(format!("fd {}", fd)),
        source,
    };
    file.seek(SeekFrom::Start(0)).map_err(sysfs_err)?;
    let mut buf = [0u8; 8];
    let n = file.read(&mut buf).map_err(sysfs_err)?;
    let text = String::from_utf8_lossy(&buf[..n]);
    text.trim().parse()
}
