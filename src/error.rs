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

//! Error types shared by every layer of the protocol engine.

use std::io;

use thiserror::Error;

/// Result type used throughout this crate.
pub type GsResult<T> = Result<T, GsError>;

/// Everything that can go wrong talking to a GameShark over the parallel
/// port.
#[derive(Debug, Error)]
pub enum GsError {
    /// Couldn't acquire the parallel port (raw I/O ports or `ppdev`).
    #[error("couldn't acquire parallel port: {0}")]
    PortUnavailable(#[source] io::Error),

    /// The requested operation isn't implemented on the current OS/backend.
    #[error("unsupported on this platform: {0}")]
    Unsupported(&'static str),

    /// A nibble exchange or command handshake exceeded its poll/attempt
    /// budget.
    #[error("timed out waiting for the device in {0}")]
    Timeout(&'static str),

    /// The checksum the device reported doesn't match the one the host
    /// accumulated.
    #[error("checksum mismatch: host computed {host:#04X}, device reported {device:#04X}")]
    ChecksumMismatch {
        /// Checksum accumulated on the host side.
        host: u8,
        /// Checksum byte reported by the device.
        device: u8,
    },

    /// The device responded with a marker indicating it isn't in the state
    /// the operation requires (e.g. a `'g'` byte mid-VERSION-scan).
    #[error("device is not in the expected state: {0}")]
    WrongMode(&'static str),

    /// A caller-supplied argument is invalid (empty buffer, bad range, ...).
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// An I/O failure from the backend that isn't better described by one
    /// of the variants above.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_mismatch_renders_both_values() {
        let err = GsError::ChecksumMismatch {
            host: 0x0a,
            device: 0x0b,
        };
        let msg = err.to_string();
        assert!(msg.contains("0x0A") || msg.contains("0x0a") || msg.contains("0A"));
        assert!(msg.to_uppercase().contains("0B"));
    }

    #[test]
    fn io_error_converts_via_from() {
        let io_err = io::Error::new(io::ErrorKind::TimedOut, "boom");
        let gs_err: GsError = io_err.into();
        assert!(matches!(gs_err, GsError::Io(_)));
    }
}
