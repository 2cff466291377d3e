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

//! The nibble-mode transport: exactly one 4-bit exchange per call.

use crate::backend::ParallelPort;
use crate::constants::{DATA_NIBBLE_MASK, DATA_STROBE_BIT, NIBBLE_POLL_BUDGET, STATUS_READY_BIT};
use crate::error::{GsError, GsResult};

/// Wraps a [`ParallelPort`] and implements the strobe-and-acknowledge
/// nibble exchange. This is the only layer that synthesizes
/// [`GsError::Timeout`]; everything above it propagates it unchanged.
pub(crate) struct NibbleCodec<P> {
    port: P,
}

impl<P> NibbleCodec<P>
where
    P: ParallelPort,
{
    pub(crate) fn new(port: P) -> Self {
        NibbleCodec { port }
    }

    /// Exchange one nibble in each direction.
    ///
    /// `out`'s low 4 bits are sent; the low 4 bits of the return value are
    /// the nibble the device sent back.
    pub(crate) fn exchange(&mut self, out: u8) -> GsResult<u8> {
        // Drain: if the handshake bit is still asserted from a previous
        // exchange, wait for the device to clear it before sending.
        if self.port.status_in()? & STATUS_READY_BIT != 0 {
            self.port.data_out(0x00)?;
            self.spin_until(false, "nibble drain")?;
        }

        // Send: assert the strobe together with the outbound nibble.
        self.port
            .data_out((out & DATA_NIBBLE_MASK) | DATA_STROBE_BIT)?;

        // Wait for the device to assert the handshake bit, indicating its
        // reply nibble is ready.
        self.spin_until(true, "nibble wait")?;

        // Receive: the high nibble of STATUS carries the reply, inverted
        // on the bit shared with the handshake line.
        let status = self.port.status_in()?;
        let received = (status >> 4) ^ STATUS_READY_BIT;

        self.port.data_out(0x00)?;

        Ok(received)
    }

    fn spin_until(&mut self, ready_asserted: bool, where_: &'static str) -> GsResult<()> {
        for _ in 0..NIBBLE_POLL_BUDGET {
            let asserted = self.port.status_in()? & STATUS_READY_BIT != 0;
            if asserted == ready_asserted {
                return Ok(());
            }
        }

        Err(GsError::Timeout(where_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockPort;

    /// A status byte with the ready bit asserted and a given reply nibble
    /// in bits [7:4]. Mirrors what a cooperating device would present.
    fn status_byte(ready: bool, reply_nibble: u8) -> u8 {
        let mut status = ((reply_nibble ^ 0x08) & 0x0F) << 4;
        if ready {
            status |= STATUS_READY_BIT;
        }
        status
    }

    #[test]
    fn exchange_sends_strobed_nibble_and_decodes_reply() {
        // Drain check sees ready=false (no leftover handshake). Once the
        // host strobes, the device holds STATUS steady with the ready bit
        // set and the reply nibble encoded, which the codec reads twice:
        // once to detect the assertion, once more to decode it.
        let port = MockPort::new([
            status_byte(false, 0),
            status_byte(true, 0x5),
            status_byte(true, 0x5),
        ]);
        let mut codec = NibbleCodec::new(port);

        let reply = codec.exchange(0xA).unwrap();
        assert_eq!(reply, 0x5);

        // DATA writes: strobe+nibble, then the trailing reset to 0.
        assert_eq!(codec.port.data_writes, vec![(0xA & 0x0F) | 0x10, 0x00]);
    }

    #[test]
    fn drain_phase_clears_a_stuck_handshake_bit_first() {
        // Ready is already asserted (stale from a previous call): codec
        // must write 0 and wait for it to clear before strobing.
        let port = MockPort::new([
            status_byte(true, 0),  // drain check: still asserted
            status_byte(false, 0), // drain spin: cleared
            status_byte(true, 0x3),
            status_byte(true, 0x3),
        ]);
        let mut codec = NibbleCodec::new(port);

        let reply = codec.exchange(0x1).unwrap();
        assert_eq!(reply, 0x3);
        assert_eq!(codec.port.data_writes[0], 0x00); // drain write
    }

    #[test]
    fn wait_phase_times_out_if_device_never_responds() {
        // status_in never asserts ready; MockPort returns 0 forever once
        // its queue is drained.
        let port = MockPort::new([0u8]);
        let mut codec = NibbleCodec::new(port);

        let err = codec.exchange(0x1).unwrap_err();
        assert!(matches!(err, GsError::Timeout(_)));
    }
}
