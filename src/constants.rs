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

//! Wire-level constants for the GameShark nibble-mode protocol.

/// STATUS-register handshake/ready bit, shared between host and device.
pub const STATUS_READY_BIT: u8 = 0x08;
/// DATA-register host strobe bit.
pub const DATA_STROBE_BIT: u8 = 0x10;
/// Low-nibble mask on the DATA register.
pub const DATA_NIBBLE_MASK: u8 = 0x0F;

/// Poll budget for a single nibble exchange (drain or wait phase).
pub const NIBBLE_POLL_BUDGET: u32 = 100_000;
/// Attempt budget for the Enter synchronization procedure.
pub const ENTER_ATTEMPT_BUDGET: u32 = 1_000;
/// Attempt budget for the `G`/`T` command handshake.
pub const COMMAND_HANDSHAKE_BUDGET: u32 = 1_000;

/// Nibble repeatedly sent during Enter synchronization.
pub const ENTER_SYNC_NIBBLE: u8 = 0x3;
/// Sliding window value that signals successful synchronization (ASCII
/// `'g'`).
pub const ENTER_SYNC_WINDOW: u8 = b'g';

/// First byte of the command handshake (sent).
pub const HANDSHAKE_GAVIN: u8 = b'G';
/// Expected echo of [`HANDSHAKE_GAVIN`].
pub const HANDSHAKE_GAVIN_ECHO: u8 = b'g';
/// Second byte of the command handshake (sent).
pub const HANDSHAKE_THORNTON: u8 = b'T';
/// Expected echo of [`HANDSHAKE_THORNTON`].
pub const HANDSHAKE_THORNTON_ECHO: u8 = b't';

/// Sentinel byte that precedes the version-string length in a VERSION
/// response.
pub const VERSION_SENTINEL: u8 = 0x2E;

/// Progress callback cadence, in bytes, for READ/WRITE/UPGRADE transfers.
pub const PROGRESS_CHUNK_SIZE: u32 = 16_384;
/// Mask form of [`PROGRESS_CHUNK_SIZE`] used to test transfer offsets.
pub const PROGRESS_CHUNK_MASK: u32 = PROGRESS_CHUNK_SIZE - 1;

/// Default raw I/O-port base address (the standard PC parallel port,
/// `LPT1`).
pub const DEFAULT_IOPORT_BASE: u16 = 0x378;

/// GameShark command codes, as observed on the wire.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
#[non_exhaustive]
pub enum Command {
    /// Read a block of CPU memory.
    Read,
    /// Write a block of CPU memory.
    Write,
    /// Resume game execution (the original source calls this both
    /// `UNPAUSE` and `EXIT`; this crate standardizes on `Unpause`).
    Unpause,
    /// Query the current run-mode (menu or game).
    Where,
    /// Query the firmware version string.
    Version,
    /// Upload a firmware upgrade image.
    Upgrade,
    /// Read a block of the GameShark's own ROM, 32 bits at a time.
    ReadRom,
    /// A command code not defined by this protocol. The command layer can
    /// still dispatch it; no operation-layer framing exists for it.
    Other(u8),
}

impl Command {
    /// The raw byte sent on the wire for this command.
    pub const fn code(self) -> u8 {
        match self {
            Command::Read => 0x01,
            Command::Write => 0x02,
            Command::Unpause => 0x64,
            Command::Where => 0x65,
            Command::Version => 0x66,
            Command::Upgrade => 0x6E,
            Command::ReadRom => 0x7F,
            Command::Other(code) => code,
        }
    }

    /// Decode a raw command byte back into a [`Command`].
    pub const fn from_code(code: u8) -> Command {
        match code {
            0x01 => Command::Read,
            0x02 => Command::Write,
            0x64 => Command::Unpause,
            0x65 => Command::Where,
            0x66 => Command::Version,
            0x6E => Command::Upgrade,
            0x7F => Command::ReadRom,
            other => Command::Other(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_round_trips() {
        for cmd in [
            Command::Read,
            Command::Write,
            Command::Unpause,
            Command::Where,
            Command::Version,
            Command::Upgrade,
            Command::ReadRom,
        ] {
            assert_eq!(Command::from_code(cmd.code()), cmd);
        }
    }

    #[test]
    fn reserved_codes_round_trip_as_other() {
        assert_eq!(Command::from_code(0x69), Command::Other(0x69));
        assert_eq!(Command::Other(0x69).code(), 0x69);
    }
}
