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

//! The address/size/payload/checksum block-transfer protocol: READ,
//! WRITE, READ_ROM, VERSION, WHERE, UNPAUSE, and UPGRADE.

use std::convert::TryFrom;

use crate::backend::ParallelPort;
use crate::command;
use crate::constants::{Command, ENTER_SYNC_WINDOW, PROGRESS_CHUNK_MASK, VERSION_SENTINEL};
use crate::error::{GsError, GsResult};
use crate::progress::Progress;
use crate::range::AddressRange;
use crate::run_mode::RunMode;
use crate::version::VersionInfo;
use crate::word::WordCodec;

/// An 8-bit wrapping sum, accumulated one transferred unit at a time.
#[derive(Debug, Default, Clone, Copy)]
struct Checksum(u8);

impl Checksum {
    fn add_byte(&mut self, byte: u8) {
        self.0 = self.0.wrapping_add(byte);
    }

    /// Folds a full 32-bit word value into the sum, as `READ_ROM` does.
    /// Equivalent to summing the word values mod 256, not their
    /// individual bytes.
    fn add_word(&mut self, word: u32) {
        self.0 = self.0.wrapping_add(word as u8);
    }

    fn verify(self, device: u8) -> GsResult<()> {
        if self.0 == device {
            Ok(())
        } else {
            Err(GsError::ChecksumMismatch {
                host: self.0,
                device,
            })
        }
    }
}

fn report_chunk(progress: &mut Progress, done: u32, total: u32) {
    if done & PROGRESS_CHUNK_MASK == 0 || done == total {
        progress.report_byte(done);
    }
}

/// `READ`: fills `buf` from the device, over one or more ranges.
///
/// `buf` must be exactly as long as the sum of the ranges' sizes; bytes
/// land in `buf` in range order.
pub(crate) fn read<P>(
    words: &mut WordCodec<P>,
    ranges: &[AddressRange],
    buf: &mut [u8],
    mut progress: Progress,
) -> GsResult<()>
where
    P: ParallelPort,
{
    let total: usize = ranges.iter().map(|r| r.size as usize).sum();
    if buf.len() != total {
        return Err(GsError::InvalidArgument(
            "buffer length doesn't match the sum of range sizes",
        ));
    }

    log::debug!("READ: {} range(s), {} bytes total", ranges.len(), total);
    command::dispatch(words, Command::Read)?;

    let mut checksum = Checksum::default();
    let mut offset = 0usize;
    for range in ranges {
        words.exchange_u32(range.address)?;
        words.exchange_u32(range.size)?;

        let mut done = 0u32;
        for _ in 0..range.size {
            let byte = words.exchange_byte(0)?;
            buf[offset] = byte;
            offset += 1;
            checksum.add_byte(byte);
            done += 1;
            report_chunk(&mut progress, done, range.size);
        }
    }

    // List terminator.
    words.exchange_u32(0)?;
    words.exchange_u32(0)?;

    let device_checksum = words.exchange_byte(0)?;
    checksum.verify(device_checksum)
}

/// `WRITE`: sends `buf` to the device, over one or more ranges.
///
/// `buf` must be exactly as long as the sum of the ranges' sizes.
pub(crate) fn write<P>(
    words: &mut WordCodec<P>,
    ranges: &[AddressRange],
    buf: &[u8],
    mut progress: Progress,
) -> GsResult<()>
where
    P: ParallelPort,
{
    let total: usize = ranges.iter().map(|r| r.size as usize).sum();
    if buf.len() != total {
        return Err(GsError::InvalidArgument(
            "buffer length doesn't match the sum of range sizes",
        ));
    }

    log::debug!("WRITE: {} range(s), {} bytes total", ranges.len(), total);
    command::dispatch(words, Command::Write)?;

    let mut checksum = Checksum::default();
    let mut offset = 0usize;
    for range in ranges {
        words.exchange_u32(range.address)?;
        words.exchange_u32(range.size)?;

        let mut done = 0u32;
        for _ in 0..range.size {
            let byte = buf[offset];
            offset += 1;
            words.exchange_byte(byte)?;
            checksum.add_byte(byte);
            done += 1;
            report_chunk(&mut progress, done, range.size);
        }
    }

    words.exchange_u32(0)?;
    words.exchange_u32(0)?;

    let device_checksum = words.exchange_byte(0)?;
    checksum.verify(device_checksum)
}

/// `READ_ROM`: dumps a range of the GameShark's own ROM, 32 bits at a
/// time. Address is rounded down and size rounded up to a 4-byte
/// boundary; the aligned range actually transferred is returned alongside
/// the data.
pub(crate) fn read_rom<P>(
    words: &mut WordCodec<P>,
    range: AddressRange,
    mut progress: Progress,
) -> GsResult<(AddressRange, Vec<u8>)>
where
    P: ParallelPort,
{
    let address = range.address & !3;
    let size = (range.size + 3) & !3;
    let aligned = AddressRange::new(address, size);
    log::debug!(
        "READ_ROM: {:#010X}+{:#X} aligned to {:#010X}+{:#X}",
        range.address,
        range.size,
        aligned.address,
        aligned.size
    );

    command::dispatch(words, Command::ReadRom)?;
    words.exchange_u32(address)?;
    words.exchange_u32(size)?;

    let mut checksum = Checksum::default();
    let mut data = Vec::with_capacity(size as usize);
    let mut done = 0u32;
    for _ in 0..(size / 4) {
        let word = words.exchange_u32(0)?;
        data.extend_from_slice(&word.to_be_bytes());
        checksum.add_word(word);
        done += 4;
        progress.report_word(done);
    }

    let device_checksum = words.exchange_byte(0)?;
    checksum.verify(device_checksum)?;

    Ok((aligned, data))
}

/// `VERSION`: scans for the `'.'` sentinel, then reads a length-prefixed
/// ASCII version string.
pub(crate) fn version<P>(words: &mut WordCodec<P>) -> GsResult<VersionInfo>
where
    P: ParallelPort,
{
    command::dispatch(words, Command::Version)?;

    loop {
        let byte = words.exchange_byte(0)?;
        if byte == VERSION_SENTINEL {
            break;
        }
        if byte == ENTER_SYNC_WINDOW {
            return Err(GsError::WrongMode(
                "VERSION saw a synchronization byte instead of the sentinel; \
                 the device isn't in Awaiting-Command",
            ));
        }
    }

    let size = words.exchange_byte(0)?;
    let mut chars = Vec::with_capacity(size as usize);
    for _ in 0..size {
        chars.push(words.exchange_byte(0)?);
    }

    Ok(VersionInfo {
        size,
        version: chars.into_iter().map(|b| b as char).collect(),
    })
}

/// `WHERE`: queries the run-mode. Drops the device out of
/// Awaiting-Command as a side effect; the caller must re-Enter before the
/// next command.
pub(crate) fn where_is<P>(words: &mut WordCodec<P>) -> GsResult<RunMode>
where
    P: ParallelPort,
{
    command::dispatch(words, Command::Where)?;
    let byte = words.exchange_byte(0)?;
    RunMode::try_from(byte)
}

/// `UNPAUSE`: resumes game execution. The caller must re-Enter before
/// issuing further commands.
pub(crate) fn unpause<P>(words: &mut WordCodec<P>) -> GsResult<()>
where
    P: ParallelPort,
{
    command::dispatch(words, Command::Unpause)
}

/// `UPGRADE`: streams a firmware image, length-prefixed, with a trailing
/// checksum. Single implicit range; the device already knows where the
/// image lands, so no address is sent (see `DESIGN.md` for the Open
/// Question this resolves).
pub(crate) fn upgrade<P>(words: &mut WordCodec<P>, data: &[u8], mut progress: Progress) -> GsResult<()>
where
    P: ParallelPort,
{
    command::dispatch(words, Command::Upgrade)?;
    words.exchange_u32(data.len() as u32)?;

    let mut checksum = Checksum::default();
    let total = data.len() as u32;
    let mut done = 0u32;
    for &byte in data {
        words.exchange_byte(byte)?;
        checksum.add_byte(byte);
        done += 1;
        report_chunk(&mut progress, done, total);
    }

    let device_checksum = words.exchange_byte(0)?;
    checksum.verify(device_checksum)
}
