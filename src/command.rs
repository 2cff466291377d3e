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

//! Entry synchronization and the per-command handshake.

use crate::backend::ParallelPort;
use crate::constants::{
    Command, COMMAND_HANDSHAKE_BUDGET, ENTER_ATTEMPT_BUDGET, ENTER_SYNC_NIBBLE, ENTER_SYNC_WINDOW,
    HANDSHAKE_GAVIN, HANDSHAKE_GAVIN_ECHO, HANDSHAKE_THORNTON, HANDSHAKE_THORNTON_ECHO,
};
use crate::error::{GsError, GsResult};
use crate::word::WordCodec;

/// Sliding-window state used by [`enter`] to detect synchronization,
/// modeled explicitly rather than as an inline shift-register hack so
/// convergence is easy to reason about.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct SyncWindow(u8);

impl SyncWindow {
    fn push(&mut self, nibble: u8) {
        self.0 = (self.0 << 4) | (nibble & 0x0F);
    }

    fn synchronized(self) -> bool {
        self.0 == ENTER_SYNC_WINDOW
    }
}

/// Repeatedly exchange the sync nibble until the device's sliding 2-nibble
/// (8-bit) window reads `'g'` (0x67), putting it into Awaiting-Command.
pub(crate) fn enter<P>(words: &mut WordCodec<P>) -> GsResult<()>
where
    P: ParallelPort,
{
    log::trace!("entering synchronization");
    let mut window = SyncWindow::default();

    for attempt in 0..ENTER_ATTEMPT_BUDGET {
        let reply = words.exchange_nibble(ENTER_SYNC_NIBBLE)?;
        window.push(reply);
        if window.synchronized() {
            log::debug!("synchronized after {} nibble exchanges", attempt + 1);
            return Ok(());
        }
    }

    Err(GsError::Timeout("Enter synchronization"))
}

/// Send the `G`/`T` handshake and the command byte.
///
/// On a mismatched echo, the whole two-byte handshake is retried from
/// scratch, up to [`COMMAND_HANDSHAKE_BUDGET`] times, matching the
/// original source's double-challenge retry loop.
pub(crate) fn dispatch<P>(words: &mut WordCodec<P>, command: Command) -> GsResult<()>
where
    P: ParallelPort,
{
    log::trace!("dispatching command {:#04X}", command.code());

    for _ in 0..COMMAND_HANDSHAKE_BUDGET {
        if words.exchange_byte(HANDSHAKE_GAVIN)? != HANDSHAKE_GAVIN_ECHO {
            continue;
        }
        if words.exchange_byte(HANDSHAKE_THORNTON)? == HANDSHAKE_THORNTON_ECHO {
            words.exchange_byte(command.code())?;
            return Ok(());
        }
    }

    log::debug!("command handshake exhausted its retry budget");
    Err(GsError::Timeout("command handshake"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ParallelPort;
    use crate::error::GsResult;
    use std::collections::VecDeque;

    /// Scripts exact byte replies to successive `exchange_byte` calls by
    /// driving a loopback-style nibble transport with a queue of bytes to
    /// echo back, ignoring whatever the host actually sent.
    struct ScriptedPort {
        ready: bool,
        last_nibble: u8,
        replies: VecDeque<u8>,
        current_reply: u8,
        nibble_index: u8,
    }

    impl ScriptedPort {
        fn new(replies: impl IntoIterator<Item = u8>) -> Self {
            ScriptedPort {
                ready: false,
                last_nibble: 0,
                replies: replies.into_iter().collect(),
                current_reply: 0,
                nibble_index: 0,
            }
        }
    }

    impl ParallelPort for ScriptedPort {
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
    fn enter_converges_on_the_documented_scenario() {
        // Scenario A: device echoes 0x6 then 0x7 on successive *nibble*
        // exchanges. ScriptedPort pairs up nibbles two at a time, so one
        // queued byte 0x67 yields the nibbles 0x6 then 0x7 in order.
        let port = ScriptedPort::new([0x67]);
        let mut words = WordCodec::new(port);
        enter(&mut words).unwrap();
    }

    #[test]
    fn enter_ignores_noise_before_converging() {
        // Nibbles 0x1, 0xF, 0x6, 0x7 in order, paired up as queued bytes.
        let port = ScriptedPort::new([0x1F, 0x67]);
        let mut words = WordCodec::new(port);
        enter(&mut words).unwrap();
    }

    #[test]
    fn enter_times_out_if_window_never_matches() {
        let port = ScriptedPort::new(std::iter::repeat(0x00).take(10));
        let mut words = WordCodec::new(port);
        let err = enter(&mut words).unwrap_err();
        assert!(matches!(err, GsError::Timeout(_)));
    }

    #[test]
    fn dispatch_sends_handshake_then_command_byte() {
        let port = ScriptedPort::new([b'g', b't']);
        let mut words = WordCodec::new(port);
        dispatch(&mut words, Command::Where).unwrap();
    }

    #[test]
    fn dispatch_retries_on_a_bad_echo() {
        // First attempt: bad Gavin echo, retried. Second attempt
        // succeeds.
        let port = ScriptedPort::new([0x00, b'g', b't']);
        let mut words = WordCodec::new(port);
        dispatch(&mut words, Command::Version).unwrap();
    }

    #[test]
    fn sync_window_push_builds_a_2_nibble_shift_register() {
        let mut window = SyncWindow::default();
        window.push(0x6);
        window.push(0x7);
        assert!(window.synchronized());
    }
}
