//! Physical memory access through `/dev/mem`

use log::{debug, warn};
use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::{AsRawFd, RawFd};
use std::path::{Path, PathBuf};
use std::ptr::{self, NonNull};

use super::{check_offset, RegisterWindow, WindowMapper};
use crate::error::{GpioError, GpioResult};

/// Default physical memory device
pub const DEV_MEM: &str = "/dev/mem";

/// System page size, used to align and size mappings
pub fn page_size() -> usize {
    // SAFETY: sysconf has no memory-safety preconditions.
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if size <= 0 {
        4096
    } else {
        size as usize
    }
}

/// Open handle on the physical memory device
pub struct PhysMem {
    file: Option<File>,
    path: PathBuf,
}

impl PhysMem {
    /// Open `/dev/mem` read/write with synchronous access
    pub fn open() -> GpioResult<Self> {
        Self::open_path(DEV_MEM)
    }

    /// Open an alternative memory device (e.g. `/dev/gpiomem`)
    pub fn open_path(path: impl AsRef<Path>) -> GpioResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_SYNC)
            .open(&path)
            .map_err(|source| match source.kind() {
                io::ErrorKind::PermissionDenied => GpioError::AccessDenied {
                    path: path.clone(),
                    source,
                },
                _ => GpioError::Io {
                    path: path.clone(),
                    source,
                },
            })?;

        debug!("opened {} for raw register access", path.display());
        Ok(Self {
            file: Some(file),
            path,
        })
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }
}

/// Shared read/write mapping of `len` bytes of the device at `offset`.
///
/// glibc goes through `mmap64` so addresses above 2 GiB survive on 32-bit
/// userspace, where `off_t` is 32 bits wide.
#[cfg(all(target_os = "linux", target_env = "gnu"))]
fn mmap_device(fd: RawFd, len: usize, offset: u64) -> io::Result<*mut libc::c_void> {
    let offset = libc::off64_t::try_from(offset)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "offset out of range"))?;
    // SAFETY: a fresh shared mapping of the device file; the kernel validates
    // the range and returns MAP_FAILED on error.
    Ok(unsafe {
        libc::mmap64(
            ptr::null_mut(),
            len,
            libc::PROT_READ | libc::PROT_WRITE,
            libc::MAP_SHARED,
            fd,
            offset,
        )
    })
}

#[cfg(not(all(target_os = "linux", target_env = "gnu")))]
fn mmap_device(fd: RawFd, len: usize, offset: u64) -> io::Result<*mut libc::c_void> {
    let offset = libc::off_t::try_from(offset).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "physical address does not fit off_t; use a 64-bit userspace",
        )
    })?;
    // SAFETY: as above.
    Ok(unsafe {
        libc::mmap(
            ptr::null_mut(),
            len,
            libc::PROT_READ | libc::PROT_WRITE,
            libc::MAP_SHARED,
            fd,
            offset,
        )
    })
}

impl WindowMapper for PhysMem {
    fn map_window(&mut self, phys_addr: u64, len: usize) -> GpioResult<Box<dyn RegisterWindow>> {
        let file = self
            .file
            .as_ref()
            .ok_or(GpioError::NotInitialized("physical memory device"))?;

        // mmap offsets must be page aligned; keep the in-page delta
        let page = page_size() as u64;
        let aligned = phys_addr & !(page - 1);
        let delta = (phys_addr - aligned) as usize;
        let map_len = (delta + len).div_ceil(page as usize) * page as usize;

        let addr = mmap_device(file.as_raw_fd(), map_len, aligned).map_err(|source| {
            GpioError::Map {
                addr: phys_addr,
                len,
                source,
            }
        })?;
        if addr == libc::MAP_FAILED {
            return Err(GpioError::Map {
                addr: phys_addr,
                len,
                source: io::Error::last_os_error(),
            });
        }
        let base = NonNull::new(addr as *mut u8).ok_or_else(|| GpioError::Map {
            addr: phys_addr,
            len,
            source: io::Error::new(io::ErrorKind::Other, "mmap returned null"),
        })?;

        debug!(
            "mapped {:#010x}+{:#x} ({} bytes from {:#010x})",
            phys_addr, len, map_len, aligned
        );
        Ok(Box::new(MappedWindow {
            base: Some(base),
            map_len,
            delta,
            phys_addr,
            len,
        }))
    }

    fn close(&mut self) {
        if self.file.take().is_some() {
            debug!("closed {}", self.path.display());
        }
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// A window of device registers mapped from `/dev/mem`
pub struct MappedWindow {
    base: Option<NonNull<u8>>,
    map_len: usize,
    delta: usize,
    phys_addr: u64,
    len: usize,
}

impl MappedWindow {
    fn register(&self, offset: usize) -> GpioResult<*mut u32> {
        let base = self
            .base
            .ok_or(GpioError::NotInitialized("register window"))?;
        check_offset(offset, self.len)?;
        // SAFETY: delta + offset + 4 <= map_len is guaranteed by check_offset
        // and the mapping length computed in map_window.
        Ok(unsafe { base.as_ptr().add(self.delta + offset) } as *mut u32)
    }
}

impl RegisterWindow for MappedWindow {
    fn phys_addr(&self) -> u64 {
        self.phys_addr
    }

    fn len(&self) -> usize {
        self.len
    }

    fn read(&self, offset: usize) -> GpioResult<u32> {
        let reg = self.register(offset)?;
        // SAFETY: reg points at an aligned u32 inside a live mapping.
        Ok(unsafe { ptr::read_volatile(reg) })
    }

    fn write(&mut self, offset: usize, value: u32) -> GpioResult<()> {
        let reg = self.register(offset)?;
        // SAFETY: as in read.
        unsafe { ptr::write_volatile(reg, value) };
        Ok(())
    }

    fn unmap(&mut self) {
        if let Some(base) = self.base.take() {
            // SAFETY: base/map_len are exactly what mmap returned.
            let rc = unsafe { libc::munmap(base.as_ptr() as *mut libc::c_void, self.map_len) };
            if rc != 0 {
                warn!(
                    "munmap of {:#010x} failed: {}",
                    self.phys_addr,
                    io::Error::last_os_error()
                );
            } else {
                debug!("unmapped {:#010x}", self.phys_addr);
            }
        }
    }

    fn is_mapped(&self) -> bool {
        self.base.is_some()
    }
}

impl Drop for MappedWindow {
    fn drop(&mut self) {
        self.unmap();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_page_size_is_power_of_two() {
        assert!(page_size().is_power_of_two());
    }

    #[test]
    fn test_open_missing_device() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("mem");
        match PhysMem::open_path(&missing) {
            Err(GpioError::Io { path, .. }) => assert_eq!(path, missing),
            Err(e) => panic!("unexpected error: {e}"),
            Ok(_) => panic!("opened a device that does not exist"),
        }
    }

    #[test]
    fn test_map_after_close_is_refused() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mem");
        std::fs::write(&path, vec![0u8; 8192]).unwrap();

        let mut mem = PhysMem::open_path(&path).unwrap();
        assert!(mem.is_open());
        mem.close();
        mem.close();
        assert!(!mem.is_open());
        assert!(matches!(
            mem.map_window(0, 4096),
            Err(GpioError::NotInitialized(_))
        ));
    }

    #[test]
    fn test_map_regular_file_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mem");
        std::fs::write(&path, vec![0u8; 2 * page_size()]).unwrap();

        let mut mem = PhysMem::open_path(&path).unwrap();
        let mut window = mem.map_window(0x10, 0x100).unwrap();
        window.write(0x8, 0xdead_beef).unwrap();
        assert_eq!(window.read(0x8).unwrap(), 0xdead_beef);
        assert!(window.read(0x100).is_err());

        window.unmap();
        window.unmap();
        assert!(!window.is_mapped());
        assert!(matches!(window.read(0), Err(GpioError::NotInitialized(_))));

        // the write landed 0x18 bytes into the file
        drop(window);
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[0x18..0x1c], &0xdead_beef_u32.to_ne_bytes());
    }

    #[test]
    fn test_map_above_two_gib() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mem");
        let high: u64 = 0xfe74_0000;
        // sparse, so only the touched page is allocated
        let file = File::create(&path).unwrap();
        file.set_len(high + 2 * page_size() as u64).unwrap();
        drop(file);

        let mut mem = PhysMem::open_path(&path).unwrap();
        let mut window = mem.map_window(high + 0x10, 0x100).unwrap();
        window.write(0x4, 0x0010_0010).unwrap();
        assert_eq!(window.read(0x4).unwrap(), 0x0010_0010);
    }
}
