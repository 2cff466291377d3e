// Copyright 2024 n64gs Developers <contact@n64gs.dev>
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Kernel `ppdev` backend: claims `/dev/parportN` in nibble mode and talks
//! to it through a handful of `ioctl`s instead of raw port I/O.
//!
//! Doesn't require elevated privileges beyond read/write access to the
//! device node, unlike [`crate::backend::ioport`].

use std::fs::{File, OpenOptions};
use std::os::unix::io::AsRawFd;
use std::path::Path;

use crate::backend::ParallelPort;
use crate::error::{GsError, GsResult};

// From <linux/ppdev.h>. Not exposed by `libc`, so the relevant subset is
// reproduced here.
const PP_IOCTL: u8 = b'p';
const IEEE1284_MODE_NIBBLE: i32 = 0x00;

fn ppclaim() -> libc::c_ulong {
    nix_io(0x8b_u8)
}
fn pprelease() -> libc::c_ulong {
    nix_io(0x8c_u8)
}
fn ppsetmode() -> libc::c_ulong {
    nix_iow::<i32>(0x80_u8)
}
fn pprstatus() -> libc::c_ulong {
    nix_ior::<u8>(0x81_u8)
}
fn ppwdata() -> libc::c_ulong {
    nix_iow::<u8>(0x82_u8)
}

// Minimal re-implementation of the `_IO`/`_IOR`/`_IOW` macros from
// <asm-generic/ioctl.h>, since `ppdev`'s ioctl numbers aren't part of any
// crate we depend on.
const IOC_NONE: libc::c_ulong = 0;
const IOC_WRITE: libc::c_ulong = 1;
const IOC_READ: libc::c_ulong = 2;
const IOC_NRBITS: u32 = 8;
const IOC_TYPEBITS: u32 = 8;
const IOC_SIZEBITS: u32 = 14;
const IOC_NRSHIFT: u32 = 0;
const IOC_TYPESHIFT: u32 = IOC_NRSHIFT + IOC_NRBITS;
const IOC_SIZESHIFT: u32 = IOC_TYPESHIFT + IOC_TYPEBITS;
const IOC_DIRSHIFT: u32 = IOC_SIZESHIFT + IOC_SIZEBITS;

const fn ioc(dir: libc::c_ulong, ty: u8, nr: u8, size: usize) -> libc::c_ulong {
    (dir << IOC_DIRSHIFT)
        | ((ty as libc::c_ulong) << IOC_TYPESHIFT)
        | ((nr as libc::c_ulong) << IOC_NRSHIFT)
        | ((size as libc::c_ulong) << IOC_SIZESHIFT)
}

fn nix_io(nr: u8) -> libc::c_ulong {
    ioc(IOC_NONE, PP_IOCTL, nr, 0)
}
fn nix_ior<T>(nr: u8) -> libc::c_ulong {
    ioc(IOC_READ, PP_IOCTL, nr, std::mem::size_of::<T>())
}
fn nix_iow<T>(nr: u8) -> libc::c_ulong {
    ioc(IOC_WRITE, PP_IOCTL, nr, std::mem::size_of::<T>())
}

/// A `/dev/parportN` device claimed in nibble mode.
pub struct ParportBackend {
    file: File,
}

impl ParportBackend {
    /// Open and claim the given device node.
    #[cfg(target_os = "linux")]
    pub fn open(path: &Path) -> GsResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(GsError::PortUnavailable)?;

        let fd = file.as_raw_fd();
        let mut mode: i32 = IEEE1284_MODE_NIBBLE;

        unsafe {
            if libc::ioctl(fd, ppclaim(), 0) != 0 {
                return Err(GsError::PortUnavailable(std::io::Error::last_os_error()));
            }
            if libc::ioctl(fd, ppsetmode(), &mut mode as *mut i32) != 0 {
                let err = std::io::Error::last_os_error();
                libc::ioctl(fd, pprelease(), 0);
                return Err(GsError::PortUnavailable(err));
            }
        }

        Ok(ParportBackend { file })
    }

    #[cfg(not(target_os = "linux"))]
    pub fn open(_path: &Path) -> GsResult<Self> {
        Err(GsError::Unsupported(
            "the ppdev backend is only available on Linux",
        ))
    }
}

#[cfg(target_os = "linux")]
impl Drop for ParportBackend {
    fn drop(&mut self) {
        unsafe {
            libc::ioctl(self.file.as_raw_fd(), pprelease(), 0);
        }
    }
}

impl ParallelPort for ParportBackend {
    #[cfg(target_os = "linux")]
    fn status_in(&mut self) -> GsResult<u8> {
        let mut status: u8 = 0;
        let rc = unsafe {
            libc::ioctl(
                self.file.as_raw_fd(),
                pprstatus(),
                &mut status as *mut u8,
            )
        };
        if rc != 0 {
            return Err(GsError::Io(std::io::Error::last_os_error()));
        }
        Ok(status)
    }

    #[cfg(not(target_os = "linux"))]
    fn status_in(&mut self) -> GsResult<u8> {
        unreachable!("ParportBackend::open always fails on this platform")
    }

    #[cfg(target_os = "linux")]
    fn data_out(&mut self, byte: u8) -> GsResult<()> {
        let value = byte;
        let rc = unsafe {
            libc::ioctl(self.file.as_raw_fd(), ppwdata(), &value as *const u8)
        };
        if rc != 0 {
            return Err(GsError::Io(std::io::Error::last_os_error()));
        }
        Ok(())
    }

    #[cfg(not(target_os = "linux"))]
    fn data_out(&mut self, _byte: u8) -> GsResult<()> {
        unreachable!("ParportBackend::open always fails on this platform")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(target_os = "linux"))]
    fn unsupported_platforms_report_a_clean_error() {
        let err = ParportBackend::open(Path::new("/dev/parport0")).unwrap_err();
        assert!(matches!(err, GsError::Unsupported(_)));
    }

    #[test]
    fn ioctl_numbers_match_the_expected_direction_bits() {
        // PPCLAIM/PPRELEASE carry no data.
        assert_eq!(ppclaim() >> IOC_DIRSHIFT, IOC_NONE);
        assert_eq!(pprelease() >> IOC_DIRSHIFT, IOC_NONE);
        // PPRSTATUS reads a byte back from the kernel.
        assert_eq!(pprstatus() >> IOC_DIRSHIFT, IOC_READ);
        // PPWDATA/PPSETMODE write data into the kernel.
        assert_eq!(ppwdata() >> IOC_DIRSHIFT, IOC_WRITE);
        assert_eq!(ppsetmode() >> IOC_DIRSHIFT, IOC_WRITE);
    }
}
