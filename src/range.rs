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

//! Address ranges for block transfers.

/// A single `{address, size}` pair in a READ/WRITE range list.
///
/// A range list is terminated on the wire by an all-zero pair; callers
/// never construct that terminator themselves, it's appended automatically
/// by [`crate::Session::read`] / [`crate::Session::write`].
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct AddressRange {
    /// Starting CPU memory address.
    pub address: u32,
    /// Number of bytes in this range.
    pub size: u32,
}

impl AddressRange {
    /// Construct a new range.
    pub const fn new(address: u32, size: u32) -> Self {
        AddressRange { address, size }
    }
}
