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

//! # N64 GameShark Pro protocol driver
//!
//! A host-side driver for talking to a Nintendo 64 GameShark Pro cartridge
//! over the PC parallel port using IEEE-1284 nibble-mode signaling. Through
//! the link this crate opens, the host can read and write the console's CPU
//! memory while a game is running, dump the GameShark's own firmware ROM,
//! query its version and run-mode, and push firmware upgrades.
//!
//! [`Session`] is the entry point: open one with [`Session::open`], then
//! call [`Session::enter`] before issuing any other command.
//!
//! # See also
//!
//! - Action Replay/GameShark Pro v3.2 Communications Protocol, Russ K.,
//!   <http://hitmen.c02.at/files/docs/psx/GS32Comms.htm>.

pub mod backend;
pub mod constants;
mod command;
pub mod error;
mod nibble;
mod operation;
pub mod progress;
pub mod range;
pub mod run_mode;
mod session;
pub mod version;
mod word;

pub use self::backend::{ParallelPort, PortSpec};
pub use self::constants::Command;
pub use self::error::{GsError, GsResult};
pub use self::progress::Progress;
pub use self::range::AddressRange;
pub use self::run_mode::RunMode;
pub use self::session::{Session, SessionConfig};
pub use self::version::VersionInfo;
