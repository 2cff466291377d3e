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

use std::convert::TryFrom;
use std::fmt;

use crate::error::GsError;

/// Whether the cartridge firmware is presenting the menu or executing a
/// game, as reported by [`crate::Session::where_is`].
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum RunMode {
    /// The GameShark is showing its own menu.
    Menu = 0x01,
    /// The GameShark is running a game and presenting the in-game overlay.
    Game = 0x02,
}

impl TryFrom<u8> for RunMode {
    type Error = GsError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x01 => Ok(RunMode::Menu),
            0x02 => Ok(RunMode::Game),
            _ => Err(GsError::WrongMode("WHERE returned an unrecognized mode byte")),
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunMode::Menu => "menu",
            RunMode::Game => "game",
        };
        write!(fmt, "{}", name)
    }
}
