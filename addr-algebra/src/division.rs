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

//! The division value model.
//!
//! A division is the smallest unit of an address value: a field of a given bit width which
//! holds a single value or an inclusive range of values, and optionally a prefix length.
//! [`Division`] covers native widths of up to 64 bits, [`Segment`] is a division whose
//! width is fixed by its address family and [`LargeDivision`] covers arbitrary widths.

use num_bigint::BigUint;
use num_traits::One;

pub use self::{
    large::LargeDivision,
    native::Division,
    segment::{Segment, SegmentIter, SegmentOrigin},
};
use crate::family::{AddressFamily, BitCount, PrefixLen};

pub mod large;
pub mod native;
pub mod segment;

/// Accessors shared by every kind of division.
pub trait DivisionValue: Clone {
    /// Returns the width of the division in bits.
    fn bit_count(&self) -> BitCount;

    /// Returns the number of bytes needed to hold the width of the division.
    fn byte_count(&self) -> usize {
        self.bit_count().div_ceil(8) as usize
    }

    /// Returns the prefix length carried by the division, if any.
    fn prefix_len(&self) -> Option<PrefixLen>;

    /// Returns the division with another prefix length.
    fn with_prefix_len(&self, prefix_len: Option<PrefixLen>) -> Self;

    /// Returns whether the division holds more than one value.
    fn is_multiple(&self) -> bool;

    /// Returns the lowest value.
    fn lower_value_big(&self) -> BigUint;

    /// Returns the highest value.
    fn upper_value_big(&self) -> BigUint;

    /// Returns the bounds when both fit in a native word.
    fn native_bounds(&self) -> Option<(u64, u64)>;

    /// Returns the number of values.
    fn count_big(&self) -> BigUint;

    /// Returns the number of distinct values of the first `prefix_bits` bits.
    fn prefix_count_len_big(&self, prefix_bits: BitCount) -> BigUint;

    /// Returns whether every value shares the same first `prefix_bits` bits.
    fn is_single_prefix(&self, prefix_bits: BitCount) -> bool {
        self.prefix_count_len_big(prefix_bits).is_one()
    }

    /// Returns the lowest value as big-endian bytes.
    fn bytes(&self) -> Vec<u8>;

    /// Returns the highest value as big-endian bytes.
    fn upper_bytes(&self) -> Vec<u8>;

    /// Returns whether zero is one of the values.
    fn includes_zero(&self) -> bool;

    /// Returns whether the maximum value is one of the values.
    fn includes_max(&self) -> bool;

    /// Returns whether the division holds every value of its width.
    fn is_full_range(&self) -> bool {
        self.includes_zero() && self.includes_max()
    }

    /// Returns whether zero is the only value.
    fn is_zero(&self) -> bool;

    /// Returns whether the maximum value is the only value.
    fn is_max(&self) -> bool;

    /// Returns whether the values form a union of blocks of the given prefix length.
    fn contains_prefix_block(&self, prefix_len: BitCount) -> bool;

    /// Returns whether the values form exactly one block of the given prefix length.
    fn contains_single_prefix_block(&self, prefix_len: BitCount) -> bool;

    /// Returns the smallest prefix length for which the values form a union of prefix blocks.
    fn min_prefix_len_for_block(&self) -> BitCount;

    /// Returns the prefix length for which the values form exactly one prefix block, if any.
    fn prefix_len_for_single_block(&self) -> Option<PrefixLen>;
}

macro_rules! native_division_value {
    ($ty:ty) => {
        impl DivisionValue for $ty {
            fn bit_count(&self) -> BitCount {
                Division::bit_count(self)
            }

            fn prefix_len(&self) -> Option<PrefixLen> {
                Division::prefix_len(self)
            }

            fn with_prefix_len(&self, prefix_len: Option<PrefixLen>) -> Self {
                <$ty>::with_prefix_len(self, prefix_len)
            }

            fn is_multiple(&self) -> bool {
                Division::is_multiple(self)
            }

            fn lower_value_big(&self) -> BigUint {
                self.value().into()
            }

            fn upper_value_big(&self) -> BigUint {
                self.upper_value().into()
            }

            fn native_bounds(&self) -> Option<(u64, u64)> {
                Some((self.value(), self.upper_value()))
            }

            fn count_big(&self) -> BigUint {
                self.count().into()
            }

            fn prefix_count_len_big(&self, prefix_bits: BitCount) -> BigUint {
                self.prefix_count_len(prefix_bits).into()
            }

            fn is_single_prefix(&self, prefix_bits: BitCount) -> bool {
                Division::is_single_prefix(self, prefix_bits)
            }

            fn bytes(&self) -> Vec<u8> {
                Division::bytes(self)
            }

            fn upper_bytes(&self) -> Vec<u8> {
                Division::upper_bytes(self)
            }

            fn includes_zero(&self) -> bool {
                Division::includes_zero(self)
            }

            fn includes_max(&self) -> bool {
                Division::includes_max(self)
            }

            fn is_zero(&self) -> bool {
                Division::is_zero(self)
            }

            fn is_max(&self) -> bool {
                Division::is_max(self)
            }

            fn contains_prefix_block(&self, prefix_len: BitCount) -> bool {
                Division::contains_prefix_block(self, prefix_len)
            }

            fn contains_single_prefix_block(&self, prefix_len: BitCount) -> bool {
                Division::contains_single_prefix_block(self, prefix_len)
            }

            fn min_prefix_len_for_block(&self) -> BitCount {
                Division::min_prefix_len_for_block(self)
            }

            fn prefix_len_for_single_block(&self) -> Option<PrefixLen> {
                Division::prefix_len_for_single_block(self)
            }
        }
    };
}

native_division_value!(Division);
native_division_value!(Segment);

/// A division of any kind.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum AnyDivision {
    /// An IPv4 segment.
    Ipv4(Segment),
    /// An IPv6 segment.
    Ipv6(Segment),
    /// A MAC segment.
    Mac(Segment),
    /// A native division not tied to a family.
    Native(Division),
    /// A division of arbitrary width.
    Large(LargeDivision),
}

impl AnyDivision {
    /// Returns the family of the division, if it is a segment.
    pub fn family(&self) -> Option<AddressFamily> {
        match self {
            Self::Ipv4(_) => Some(AddressFamily::Ipv4),
            Self::Ipv6(_) => Some(AddressFamily::Ipv6),
            Self::Mac(_) => Some(AddressFamily::Mac),
            Self::Native(_) | Self::Large(_) => None,
        }
    }

    /// Returns the segment, if the division is one.
    pub fn as_segment(&self) -> Option<&Segment> {
        match self {
            Self::Ipv4(segment) | Self::Ipv6(segment) | Self::Mac(segment) => Some(segment),
            Self::Native(_) | Self::Large(_) => None,
        }
    }
}

impl From<Segment> for AnyDivision {
    fn from(segment: Segment) -> Self {
        match segment.family() {
            AddressFamily::Ipv4 => Self::Ipv4(segment),
            AddressFamily::Ipv6 => Self::Ipv6(segment),
            AddressFamily::Mac => Self::Mac(segment),
        }
    }
}

impl From<Division> for AnyDivision {
    fn from(division: Division) -> Self {
        Self::Native(division)
    }
}

impl From<LargeDivision> for AnyDivision {
    fn from(division: LargeDivision) -> Self {
        Self::Large(division)
    }
}

macro_rules! dispatch {
    ($self:ident, $div:ident => $expr:expr) => {
        match $self {
            AnyDivision::Ipv4($div) | AnyDivision::Ipv6($div) | AnyDivision::Mac($div) => $expr,
            AnyDivision::Native($div) => $expr,
            AnyDivision::Large($div) => $expr,
        }
    };
}

impl DivisionValue for AnyDivision {
    fn bit_count(&self) -> BitCount {
        dispatch!(self, div => DivisionValue::bit_count(div))
    }

    fn prefix_len(&self) -> Option<PrefixLen> {
        dispatch!(self, div => DivisionValue::prefix_len(div))
    }

    fn with_prefix_len(&self, prefix_len: Option<PrefixLen>) -> Self {
        match self {
            Self::Ipv4(div) => Self::Ipv4(div.with_prefix_len(prefix_len)),
            Self::Ipv6(div) => Self::Ipv6(div.with_prefix_len(prefix_len)),
            Self::Mac(div) => Self::Mac(div.with_prefix_len(prefix_len)),
            Self::Native(div) => Self::Native(div.with_prefix_len(prefix_len)),
            Self::Large(div) => Self::Large(div.with_prefix_len(prefix_len)),
        }
    }

    fn is_multiple(&self) -> bool {
        dispatch!(self, div => DivisionValue::is_multiple(div))
    }

    fn lower_value_big(&self) -> BigUint {
        dispatch!(self, div => div.lower_value_big())
    }

    fn upper_value_big(&self) -> BigUint {
        dispatch!(self, div => div.upper_value_big())
    }

    fn native_bounds(&self) -> Option<(u64, u64)> {
        dispatch!(self, div => div.native_bounds())
    }

    fn count_big(&self) -> BigUint {
        dispatch!(self, div => div.count_big())
    }

    fn prefix_count_len_big(&self, prefix_bits: BitCount) -> BigUint {
        dispatch!(self, div => div.prefix_count_len_big(prefix_bits))
    }

    fn bytes(&self) -> Vec<u8> {
        dispatch!(self, div => DivisionValue::bytes(div))
    }

    fn upper_bytes(&self) -> Vec<u8> {
        dispatch!(self, div => DivisionValue::upper_bytes(div))
    }

    fn includes_zero(&self) -> bool {
        dispatch!(self, div => DivisionValue::includes_zero(div))
    }

    fn includes_max(&self) -> bool {
        dispatch!(self, div => DivisionValue::includes_max(div))
    }

    fn is_zero(&self) -> bool {
        dispatch!(self, div => DivisionValue::is_zero(div))
    }

    fn is_max(&self) -> bool {
        dispatch!(self, div => DivisionValue::is_max(div))
    }

    fn contains_prefix_block(&self, prefix_len: BitCount) -> bool {
        dispatch!(self, div => DivisionValue::contains_prefix_block(div, prefix_len))
    }

    fn contains_single_prefix_block(&self, prefix_len: BitCount) -> bool {
        dispatch!(self, div => DivisionValue::contains_single_prefix_block(div, prefix_len))
    }

    fn min_prefix_len_for_block(&self) -> BitCount {
        dispatch!(self, div => DivisionValue::min_prefix_len_for_block(div))
    }

    fn prefix_len_for_single_block(&self) -> Option<PrefixLen> {
        dispatch!(self, div => DivisionValue::prefix_len_for_single_block(div))
    }
}
