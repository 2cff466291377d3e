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

//! Byte-level access to the two parallel-port registers the protocol
//! needs.

use std::path::PathBuf;

use crate::error::GsResult;

pub mod ioport;
pub mod parport;

/// A claimed parallel port, reduced to the two registers this protocol
/// actually touches.
///
/// Implementations don't interpret bit meanings; that's the nibble codec's
/// job. Both operations are expected to be blocking and to complete in
/// microseconds.
pub trait ParallelPort {
    /// Read the STATUS register.
    fn status_in(&mut self) -> GsResult<u8>;

    /// Write the DATA register.
    fn data_out(&mut self, byte: u8) -> GsResult<()>;
}

/// Where to find the parallel port: a numeric I/O-port base address, or a
/// device path (e.g. `/dev/parport0`).
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum PortSpec {
    /// Raw I/O-port base address (`DATA` at `base`, `STATUS` at `base+1`).
    IoPort(u16),
    /// Path to a kernel `ppdev` character device.
    Device(PathBuf),
}

impl PortSpec {
    /// Parse a command-line port specifier.
    ///
    /// A value that parses as an unsigned 16-bit integer (decimal or
    /// `0x`-prefixed hexadecimal) selects [`PortSpec::IoPort`]; anything
    /// else is treated as a filesystem path and selects
    /// [`PortSpec::Device`].
    pub fn parse(spec: &str) -> PortSpec {
        let numeric = spec.strip_prefix("0x").or_else(|| spec.strip_prefix("0X"));
        if let Some(hex) = numeric {
            if let Ok(base) = u16::from_str_radix(hex, 16) {
                return PortSpec::IoPort(base);
            }
        } else if let Ok(base) = spec.parse::<u16>() {
            return PortSpec::IoPort(base);
        }

        PortSpec::Device(PathBuf::from(spec))
    }
}

impl ParallelPort for Box<dyn ParallelPort> {
    fn status_in(&mut self) -> GsResult<u8> {
        (**self).status_in()
    }

    fn data_out(&mut self, byte: u8) -> GsResult<()> {
        (**self).data_out(byte)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_decimal_base_address() {
        assert_eq!(PortSpec::parse("888"), PortSpec::IoPort(888));
    }

    #[test]
    fn parses_hex_base_address() {
        assert_eq!(PortSpec::parse("0x378"), PortSpec::IoPort(0x378));
        assert_eq!(PortSpec::parse("0X3BC"), PortSpec::IoPort(0x3BC));
    }

    #[test]
    fn non_numeric_spec_is_a_device_path() {
        assert_eq!(
            PortSpec::parse("/dev/parport0"),
            PortSpec::Device(PathBuf::from("/dev/parport0"))
        );
    }
}

/// A mock [`ParallelPort`] used by higher-layer unit tests. Scripted with
/// the exact STATUS bytes a cooperating device would present, and records
/// every byte written to DATA.
#[cfg(test)]
pub(crate) struct MockPort {
    pub(crate) status_queue: std::collections::VecDeque<u8>,
    pub(crate) data_writes: Vec<u8>,
}

#[cfg(test)]
impl MockPort {
    pub(crate) fn new(status_queue: impl IntoIterator<Item = u8>) -> Self {
        MockPort {
            status_queue: status_queue.into_iter().collect(),
            data_writes: Vec::new(),
        }
    }
}

#[cfg(test)]
impl ParallelPort for MockPort {
    fn status_in(&mut self) -> GsResult<u8> {
        Ok(self.status_queue.pop_front().unwrap_or(0))
    }

    fn data_out(&mut self, byte: u8) -> GsResult<()> {
        self.data_writes.push(byte);
        Ok(())
    }
}
