// Copyright 2024 n64gs Developers <contact@n64gs.dev>
//
// Based on the previous work of n64rd and GSUpload (Parasyte, kodewerx.org;
// Adam Gashlin).
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

//! The owned session handle: the sole entry point for talking to a
//! GameShark over the parallel port.

use crate::backend::ioport::IoPortBackend;
use crate::backend::parport::ParportBackend;
use crate::backend::{ParallelPort, PortSpec};
use crate::command;
use crate::constants::{Command, DEFAULT_IOPORT_BASE};
use crate::error::GsResult;
use crate::operation;
use crate::progress::Progress;
use crate::range::AddressRange;
use crate::run_mode::RunMode;
use crate::version::VersionInfo;
use crate::word::WordCodec;

/// How to open a [`Session`].
///
/// The single source of truth for session setup; the CLI builds one from
/// parsed arguments and nothing else touches port selection.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    port: String,
}

impl SessionConfig {
    /// Configure a session against the given port specifier: a numeric
    /// I/O-port base address (decimal or `0x`-prefixed hex) or a `ppdev`
    /// device path. See [`PortSpec::parse`].
    pub fn new(port: impl Into<String>) -> Self {
        SessionConfig { port: port.into() }
    }

    /// The port specifier this config was built with.
    pub fn port(&self) -> &str {
        &self.port
    }
}

impl Default for SessionConfig {
    /// Defaults to the standard PC parallel port, `LPT1` (`0x378`).
    fn default() -> Self {
        SessionConfig::new(format!("0x{:X}", DEFAULT_IOPORT_BASE))
    }
}

/// An open, owned link to a GameShark.
///
/// `Session` is `!Clone`: exactly one handle can own the backend at a time,
/// and dropping it releases the port exactly once via the backend's own
/// `Drop` impl. There is no separate `close`.
pub struct Session<P> {
    words: WordCodec<P>,
}

impl Session<Box<dyn ParallelPort>> {
    /// Open a session, selecting the raw-ioport or `ppdev` backend
    /// according to [`PortSpec::parse`] on `config`'s port specifier.
    pub fn open(config: &SessionConfig) -> GsResult<Self> {
        let spec = PortSpec::parse(config.port());
        log::debug!("opening session on {:?}", spec);

        let port: Box<dyn ParallelPort> = match &spec {
            PortSpec::IoPort(base) => Box::new(IoPortBackend::open(*base)?),
            PortSpec::Device(path) => Box::new(ParportBackend::open(path)?),
        };

        Ok(Session::from_backend(port))
    }
}

impl<P> Session<P>
where
    P: ParallelPort,
{
    /// Wrap an already-acquired backend. Mainly useful for tests, which
    /// hand in a mock [`ParallelPort`] instead of going through
    /// [`Session::open`].
    pub fn from_backend(port: P) -> Self {
        Session {
            words: WordCodec::new(port),
        }
    }

    /// Synchronize nibble alignment and put the device into
    /// Awaiting-Command. Must precede the first command, and any command
    /// after one that leaves Awaiting-Command (`where_is`, `unpause`).
    pub fn enter(&mut self) -> GsResult<()> {
        command::enter(&mut self.words)
    }

    /// `READ`: fills `buf` from CPU memory, over one or more ranges.
    ///
    /// `buf` must be exactly as long as the sum of the ranges' sizes.
    pub fn read(
        &mut self,
        ranges: &[AddressRange],
        buf: &mut [u8],
        progress: Progress,
    ) -> GsResult<()> {
        operation::read(&mut self.words, ranges, buf, progress)
    }

    /// `WRITE`: sends `buf` into CPU memory, over one or more ranges.
    ///
    /// `buf` must be exactly as long as the sum of the ranges' sizes.
    pub fn write(
        &mut self,
        ranges: &[AddressRange],
        buf: &[u8],
        progress: Progress,
    ) -> GsResult<()> {
        operation::write(&mut self.words, ranges, buf, progress)
    }

    /// `READ_ROM`: dumps a range of the GameShark's own ROM, 32 bits at a
    /// time, returning the actually-transferred (4-byte-aligned) range
    /// alongside the data.
    pub fn read_rom(
        &mut self,
        range: AddressRange,
        progress: Progress,
    ) -> GsResult<(AddressRange, Vec<u8>)> {
        operation::read_rom(&mut self.words, range, progress)
    }

    /// `VERSION`: queries the firmware version string.
    pub fn version(&mut self) -> GsResult<VersionInfo> {
        operation::version(&mut self.words)
    }

    /// `WHERE`: queries the run-mode. Drops the device out of
    /// Awaiting-Command; the caller must re-[`Session::enter`] before the
    /// next command.
    pub fn where_is(&mut self) -> GsResult<RunMode> {
        operation::where_is(&mut self.words)
    }

    /// `UNPAUSE`: resumes game execution. Also known as `EXIT` in older
    /// tooling. The caller must re-[`Session::enter`] before issuing
    /// further commands.
    pub fn unpause(&mut self) -> GsResult<()> {
        operation::unpause(&mut self.words)
    }

    /// `UPGRADE`: streams a firmware image to the device.
    pub fn upgrade(&mut self, data: &[u8], progress: Progress) -> GsResult<()> {
        operation::upgrade(&mut self.words, data, progress)
    }

    /// Dispatch an arbitrary command code with no operation-layer framing.
    /// Exposed for completeness against the protocol's reserved/unimplemented
    /// codes (see [`Command::Other`]); most callers want one of the typed
    /// methods above instead.
    pub fn dispatch_raw(&mut self, command: Command) -> GsResult<()> {
        command::dispatch(&mut self.words, command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Scripts exact byte replies to successive nibble-pair exchanges,
    /// matching the helper used by the command and operation layer tests.
    struct ScriptedDevice {
        ready: bool,
        last_nibble: u8,
        replies: VecDeque<u8>,
        current_reply: u8,
        nibble_index: u8,
    }

    impl ScriptedDevice {
        fn new(replies: impl IntoIterator<Item = u8>) -> Self {
            ScriptedDevice {
                ready: false,
                last_nibble: 0,
                replies: replies.into_iter().collect(),
                current_reply: 0,
                nibble_index: 0,
            }
        }
    }

    impl ParallelPort for ScriptedDevice {
        fn status_in(&mut self) -> GsResult<u8> {
            if self.ready {
                Ok(((self.last_nibble ^ 0x08) << 4) | 0x08)
            } else {
                Ok(0x00)
            }
        }

        fn data_out(&mut self, byte: u8) -> GsResult<()> {
            if byte & 0x10 != 0 {
                if self.nibble_index == 0 {
                    self.current_reply = self.replies.pop_front().unwrap_or(0);
                    self.last_nibble = self.current_reply >> 4;
                } else {
                    self.last_nibble = self.current_reply & 0x0F;
                }
                self.nibble_index = (self.nibble_index + 1) % 2;
                self.ready = true;
            } else {
                self.ready = false;
            }
            Ok(())
        }
    }

    #[test]
    fn config_defaults_to_the_standard_lpt1_base_address() {
        let config = SessionConfig::default();
        assert_eq!(config.port(), "0x378");
    }

    #[test]
    fn enter_then_unpause_round_trip_through_the_session_api() {
        // One queued byte 0x67 satisfies Enter (nibbles 0x6, then 0x7);
        // the next two satisfy the command handshake. Unpause's own
        // command-byte echo is discarded, so the queue can end there.
        let device = ScriptedDevice::new([0x67, b'g', b't']);
        let mut session = Session::from_backend(device);

        session.enter().unwrap();
        session.unpause().unwrap();
    }
}
