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

//! Firmware version information, as reported by `VERSION`.

/// The ASCII version blob reported by [`crate::Session::version`].
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct VersionInfo {
    /// Length byte the device reported, before any truncation.
    pub size: u8,
    /// The version string itself, decoded from the ASCII bytes the device
    /// sent.
    pub version: String,
}

impl std::fmt::Display for VersionInfo {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(fmt, "{}", self.version)
    }
}
