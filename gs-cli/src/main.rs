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

use std::{
    fs::File,
    io::{self, Read, Write},
};

use anyhow::{Context, Result};
use clap::{crate_authors, crate_version, App, AppSettings, Arg};
use indicatif::{ProgressBar, ProgressStyle};

use n64gs::{AddressRange, Progress, RunMode, Session, SessionConfig};

const DEFAULT_PORT: &str = "0x378";
const DEFAULT_ADDRESS: &str = "0x80000000";
const DEFAULT_LENGTH: &str = "0x00400000";

fn main() -> Result<()> {
    let matches = App::new("n64gs")
        .setting(AppSettings::ColoredHelp)
        .version(crate_version!())
        .author(crate_authors!())
        .about("Host-side driver for the Nintendo 64 GameShark Pro parallel-port link")
        .arg(
            Arg::with_name("port")
                .short("p")
                .long("port")
                .default_value(DEFAULT_PORT)
                .help("Port number or device path (Linux ppdev systems can use a path, e.g. /dev/parport0)"),
        )
        .arg(
            Arg::with_name("detect")
                .short("v")
                .long("detect-version")
                .help("Detect GameShark firmware version"),
        )
        .arg(
            Arg::with_name("address")
                .short("a")
                .long("address")
                .default_value(DEFAULT_ADDRESS)
                .help("CPU memory address"),
        )
        .arg(
            Arg::with_name("length")
                .short("l")
                .long("length")
                .default_value(DEFAULT_LENGTH)
                .help("Transfer length, in bytes"),
        )
        .arg(
            Arg::with_name("read_rom")
                .short("d")
                .long("dump-rom")
                .takes_value(true)
                .min_values(0)
                .help("Dump GameShark firmware ROM 32 bits at a time, to [file] or stdout"),
        )
        .arg(
            Arg::with_name("read")
                .short("r")
                .long("read")
                .takes_value(true)
                .min_values(0)
                .help("Read CPU memory, to [file] or stdout as a hex dump"),
        )
        .arg(
            Arg::with_name("write")
                .short("w")
                .long("write")
                .takes_value(true)
                .help("Write CPU memory from <file>"),
        )
        .arg(
            Arg::with_name("upgrade")
                .short("u")
                .long("upgrade")
                .takes_value(true)
                .help("Upload a firmware upgrade image from <file>"),
        )
        .arg(
            Arg::with_name("verbose")
                .short("V")
                .long("verbose")
                .multiple(true)
                .help("Increase log verbosity: -V (debug), -VV (trace)"),
        )
        .get_matches();

    init_logger(match matches.occurrences_of("verbose") {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        2..=u64::MAX => log::LevelFilter::Trace,
    })?;

    let address = parse_u32(matches.value_of("address").unwrap()).context("invalid address")?;
    let length = parse_u32(matches.value_of("length").unwrap()).context("invalid length")?;

    let config = SessionConfig::new(matches.value_of("port").unwrap());
    let mut session = Session::open(&config).context("couldn't open parallel port")?;

    if matches.is_present("detect") {
        detect(&mut session)?;
    }

    if matches.is_present("read_rom") {
        read_rom(&mut session, address, length, matches.value_of("read_rom"))?;
    }

    if matches.is_present("read") {
        read(&mut session, address, length, matches.value_of("read"))?;
    }

    if let Some(file) = matches.value_of("write") {
        write(&mut session, address, file)?;
    }

    if let Some(file) = matches.value_of("upgrade") {
        upgrade(&mut session, file)?;
    }

    Ok(())
}

fn parse_u32(s: &str) -> Result<u32> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Ok(u32::from_str_radix(hex, 16)?)
    } else {
        Ok(s.parse()?)
    }
}

fn detect(session: &mut Session<Box<dyn n64gs::ParallelPort>>) -> Result<()> {
    session.enter().context("couldn't synchronize with device")?;
    let info = session.version().context("VERSION failed")?;
    println!("Detected: {}", info);
    Ok(())
}

fn read(
    session: &mut Session<Box<dyn n64gs::ParallelPort>>,
    address: u32,
    length: u32,
    file: Option<&str>,
) -> Result<()> {
    session.enter().context("couldn't synchronize with device")?;
    let mode = session.where_is().context("WHERE failed")?;
    if mode != RunMode::Game {
        anyhow::bail!("read is only available while in-game");
    }

    session
        .enter()
        .context("couldn't re-synchronize with device")?;

    let bar = progress_bar(length);
    let mut bar_cb = |done: u32| bar.set_position(done as u64);
    let progress = Progress::PerByteRange(&mut bar_cb);

    let ranges = [AddressRange::new(address, length)];
    let mut data = vec![0u8; length as usize];
    session
        .read(&ranges, &mut data, progress)
        .context("READ failed")?;
    bar.finish_and_clear();

    session.unpause().context("UNPAUSE failed")?;

    emit(&data, address, file)
}

fn read_rom(
    session: &mut Session<Box<dyn n64gs::ParallelPort>>,
    address: u32,
    length: u32,
    file: Option<&str>,
) -> Result<()> {
    session.enter().context("couldn't synchronize with device")?;

    let bar = progress_bar(length);
    let mut bar_cb = |done: u32| bar.set_position(done as u64);
    let progress = Progress::PerWord(&mut bar_cb);

    let (aligned, data) = session
        .read_rom(AddressRange::new(address, length), progress)
        .context("READ_ROM failed")?;
    bar.finish_and_clear();

    emit(&data, aligned.address, file)
}

fn write(
    session: &mut Session<Box<dyn n64gs::ParallelPort>>,
    address: u32,
    file: &str,
) -> Result<()> {
    let mut data = Vec::new();
    File::open(file)
        .with_context(|| format!("couldn't open `{}`", file))?
        .read_to_end(&mut data)
        .with_context(|| format!("couldn't read `{}`", file))?;

    session.enter().context("couldn't synchronize with device")?;
    let mode = session.where_is().context("WHERE failed")?;
    if mode != RunMode::Game {
        anyhow::bail!("write is only available while in-game");
    }

    session
        .enter()
        .context("couldn't re-synchronize with device")?;

    let bar = progress_bar(data.len() as u32);
    let mut bar_cb = |done: u32| bar.set_position(done as u64);
    let progress = Progress::PerByteRange(&mut bar_cb);

    let ranges = [AddressRange::new(address, data.len() as u32)];
    session
        .write(&ranges, &data, progress)
        .context("WRITE failed")?;
    bar.finish_and_clear();

    session.unpause().context("UNPAUSE failed")?;

    Ok(())
}

fn upgrade(session: &mut Session<Box<dyn n64gs::ParallelPort>>, file: &str) -> Result<()> {
    let mut data = Vec::new();
    File::open(file)
        .with_context(|| format!("couldn't open `{}`", file))?
        .read_to_end(&mut data)
        .with_context(|| format!("couldn't read `{}`", file))?;

    println!("Uploading `{}`...", file);

    session.enter().context("couldn't synchronize with device")?;

    let bar = progress_bar(data.len() as u32);
    let mut bar_cb = |done: u32| bar.set_position(done as u64);
    let progress = Progress::PerByteRange(&mut bar_cb);

    session
        .upgrade(&data, progress)
        .context("UPGRADE failed")?;
    bar.finish_and_clear();

    println!("Upgrade complete");
    Ok(())
}

fn progress_bar(total: u32) -> ProgressBar {
    let bar = ProgressBar::new(total as u64);
    bar.set_style(
        ProgressStyle::default_bar().template("{bar:40.cyan/blue} {bytes}/{total_bytes} ({eta})"),
    );
    bar
}

fn emit(data: &[u8], address: u32, file: Option<&str>) -> Result<()> {
    match file {
        Some(path) => {
            File::create(path)
                .with_context(|| format!("couldn't create `{}`", path))?
                .write_all(data)
                .with_context(|| format!("couldn't write `{}`", path))?;
        }
        None => hex_dump(data, address),
    }
    Ok(())
}

/// Render `data` as a 16-bytes-per-line hex-and-ASCII dump, matching the
/// original command-line tooling's output.
fn hex_dump(data: &[u8], address: u32) {
    for (i, chunk) in data.chunks(16).enumerate() {
        print!("{:08X}  ", address as usize + i * 16);
        for byte in chunk {
            print!("{:02X} ", byte);
        }
        for _ in chunk.len()..16 {
            print!("   ");
        }
        let ascii: String = chunk
            .iter()
            .map(|&b| if (0x20..=0x7E).contains(&b) { b as char } else { '.' })
            .collect();
        println!(" {}", ascii);
    }
    println!();
}

fn init_logger(level: log::LevelFilter) -> Result<()> {
    let mut logger = env_logger::Builder::from_env("N64GS_LOG");
    logger.filter_level(level);

    #[cfg(unix)]
    logger.format(log_format_color);
    #[cfg(not(unix))]
    logger.format(log_format_no_color);

    logger.try_init().context("failed to initialize logger")
}

#[cfg(unix)]
fn log_format_color(
    fmt: &mut env_logger::fmt::Formatter,
    record: &log::Record<'_>,
) -> io::Result<()> {
    let level = match record.level() {
        log::Level::Error => ansi_term::Color::Red.bold().paint("ERROR"),
        log::Level::Warn => ansi_term::Color::Yellow.bold().paint("WARN"),
        log::Level::Info => ansi_term::Color::Green.bold().paint("INFO"),
        log::Level::Debug => ansi_term::Color::Cyan.bold().paint("DBG"),
        log::Level::Trace => ansi_term::Color::Cyan.bold().paint("TRACE"),
    };

    writeln!(fmt, "[{}] - {}", level, record.args())
}

#[cfg(not(unix))]
fn log_format_no_color(
    fmt: &mut env_logger::fmt::Formatter,
    record: &log::Record<'_>,
) -> io::Result<()> {
    let level = match record.level() {
        log::Level::Error => "ERROR",
        log::Level::Warn => "WARN",
        log::Level::Info => "INFO",
        log::Level::Debug => "DBG",
        log::Level::Trace => "TRACE",
    };

    writeln!(fmt, "[{}] - {}", level, record.args())
}
