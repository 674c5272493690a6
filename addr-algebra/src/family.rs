// Copyright 2025 Anapaya Systems
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Address families, bit counts and prefix lengths.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// A number of bits.
pub type BitCount = u32;

/// The family of an address, which fixes the geometry of its segments.
#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum AddressFamily {
    /// IPv4: four 8-bit segments.
    Ipv4,
    /// IPv6: eight 16-bit segments.
    Ipv6,
    /// MAC: six 8-bit segments, or eight for EUI-64.
    Mac,
}

impl AddressFamily {
    /// The number of segments in a standard MAC address.
    pub const MAC_SEGMENT_COUNT: usize = 6;

    /// The number of segments in an extended (EUI-64) MAC address.
    pub const EUI64_SEGMENT_COUNT: usize = 8;

    /// Returns the number of bits in each segment of this family.
    pub const fn bits_per_segment(&self) -> BitCount {
        match self {
            Self::Ipv4 | Self::Mac => 8,
            Self::Ipv6 => 16,
        }
    }

    /// Returns the number of bytes in each segment of this family.
    pub const fn bytes_per_segment(&self) -> usize {
        (self.bits_per_segment() as usize) >> 3
    }

    /// Returns the largest value a segment of this family can hold.
    pub const fn max_segment_value(&self) -> u64 {
        (1 << self.bits_per_segment()) - 1
    }

    /// Returns the maximum number of segments in an address of this family.
    ///
    /// For MAC this is the EUI-64 segment count.
    pub const fn max_segment_count(&self) -> usize {
        match self {
            Self::Ipv4 => 4,
            Self::Ipv6 => 8,
            Self::Mac => Self::EUI64_SEGMENT_COUNT,
        }
    }

    /// Returns the maximum number of bits in an address of this family.
    pub const fn max_bit_count(&self) -> BitCount {
        self.bits_per_segment() * self.max_segment_count() as BitCount
    }

    /// Returns true for the IP families.
    pub const fn is_ip(&self) -> bool {
        matches!(self, Self::Ipv4 | Self::Ipv6)
    }
}

impl Display for AddressFamily {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ipv4 => write!(f, "IPv4"),
            Self::Ipv6 => write!(f, "IPv6"),
            Self::Mac => write!(f, "MAC"),
        }
    }
}

/// The number of leading network bits of a division, grouping or address.
#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
#[repr(transparent)]
pub struct PrefixLen(BitCount);

impl PrefixLen {
    /// A prefix length of zero, marking every bit as a host bit.
    pub const ZERO: Self = Self(0);

    /// Creates a new prefix length.
    pub const fn new(bits: BitCount) -> Self {
        Self(bits)
    }

    /// Returns the number of network bits.
    pub const fn bits(&self) -> BitCount {
        self.0
    }

    /// Returns this prefix length clamped to the given bit count.
    pub const fn capped(self, bit_count: BitCount) -> Self {
        if self.0 > bit_count {
            Self(bit_count)
        } else {
            self
        }
    }
}

impl From<u8> for PrefixLen {
    fn from(bits: u8) -> Self {
        Self(bits.into())
    }
}

impl Display for PrefixLen {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "/{}", self.0)
    }
}

/// Returns the prefix length of a division covering `bit_count` bits, given the number of
/// prefix bits remaining once all preceding divisions are accounted for.
///
/// Divisions entirely inside the network part have no prefix length, the division holding
/// the boundary gets the remaining bits, and every later division gets zero.
pub(crate) fn division_prefix_len(remaining: i64, bit_count: BitCount) -> Option<PrefixLen> {
    if remaining <= 0 {
        Some(PrefixLen::ZERO)
    } else if remaining <= i64::from(bit_count) {
        // remaining is within 1..=bit_count here.
        Some(PrefixLen(remaining as BitCount))
    } else {
        None
    }
}
