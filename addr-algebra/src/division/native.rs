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

//! Native divisions of at most 64 bits.

use crate::{
    error::{AddressValueError, IncompatibleRangeError},
    family::{BitCount, PrefixLen},
};

/// Returns the largest value of a field `bit_count` bits wide.
pub(crate) const fn max_value_for(bit_count: BitCount) -> u64 {
    if bit_count >= u64::BITS {
        u64::MAX
    } else {
        (1 << bit_count) - 1
    }
}

/// Shifts right, yielding zero once every bit has been shifted out.
const fn shr(value: u64, shift: BitCount) -> u64 {
    if shift >= u64::BITS { 0 } else { value >> shift }
}

/// A field of at most 64 bits holding a single value or an inclusive range of values.
///
/// Values are masked to the bit width on construction and inverted bounds are swapped, so
/// `value() <= upper_value() <= max_value()` always holds.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Division {
    lower: u64,
    upper: u64,
    bit_count: BitCount,
    prefix_len: Option<PrefixLen>,
}

impl Division {
    /// The widest bit count a native division can hold.
    pub const MAX_BIT_COUNT: BitCount = u64::BITS;

    /// Creates a new division over `bit_count` bits.
    ///
    /// Values beyond the bit width are masked and a prefix length beyond it is clamped.
    pub fn new(
        lower: u64,
        upper: u64,
        bit_count: BitCount,
        prefix_len: Option<PrefixLen>,
    ) -> Result<Self, AddressValueError> {
        if bit_count > Self::MAX_BIT_COUNT {
            return Err(AddressValueError::BitCountTooLarge {
                bit_count,
                max: Self::MAX_BIT_COUNT,
            });
        }
        Ok(Self::with_width(lower, upper, bit_count, prefix_len))
    }

    /// Creates a new single-valued division over `bit_count` bits.
    pub fn single(
        value: u64,
        bit_count: BitCount,
        prefix_len: Option<PrefixLen>,
    ) -> Result<Self, AddressValueError> {
        Self::new(value, value, bit_count, prefix_len)
    }

    /// Creates a division whose bit count is already known to be at most 64.
    pub(crate) const fn with_width(
        lower: u64,
        upper: u64,
        bit_count: BitCount,
        prefix_len: Option<PrefixLen>,
    ) -> Self {
        let max = max_value_for(bit_count);
        let (lower, upper) = (lower & max, upper & max);
        let (lower, upper) = if lower > upper {
            (upper, lower)
        } else {
            (lower, upper)
        };
        let prefix_len = match prefix_len {
            Some(prefix_len) => Some(prefix_len.capped(bit_count)),
            None => None,
        };
        Self {
            lower,
            upper,
            bit_count,
            prefix_len,
        }
    }

    /// Returns a division of the same width with new values and prefix length.
    pub const fn derive_new(&self, lower: u64, upper: u64, prefix_len: Option<PrefixLen>) -> Self {
        Self::with_width(lower, upper, self.bit_count, prefix_len)
    }

    /// Returns this division with another prefix length.
    pub const fn with_prefix_len(&self, prefix_len: Option<PrefixLen>) -> Self {
        self.derive_new(self.lower, self.upper, prefix_len)
    }

    /// Returns the lowest value.
    pub const fn value(&self) -> u64 {
        self.lower
    }

    /// Returns the highest value.
    pub const fn upper_value(&self) -> u64 {
        self.upper
    }

    /// Returns the width of this division.
    pub const fn bit_count(&self) -> BitCount {
        self.bit_count
    }

    /// Returns the number of bytes needed to hold the width of this division.
    pub const fn byte_count(&self) -> usize {
        self.bit_count.div_ceil(8) as usize
    }

    /// Returns the prefix length carried by this division, if any.
    pub const fn prefix_len(&self) -> Option<PrefixLen> {
        self.prefix_len
    }

    /// Returns the largest value this division can hold.
    pub const fn max_value(&self) -> u64 {
        max_value_for(self.bit_count)
    }

    /// Returns whether this division holds more than one value.
    pub const fn is_multiple(&self) -> bool {
        self.lower != self.upper
    }

    /// Returns the number of values in this division.
    pub const fn count(&self) -> u128 {
        (self.upper - self.lower) as u128 + 1
    }

    /// Returns whether zero is one of the values.
    pub const fn includes_zero(&self) -> bool {
        self.lower == 0
    }

    /// Returns whether the maximum value is one of the values.
    pub const fn includes_max(&self) -> bool {
        self.upper == self.max_value()
    }

    /// Returns whether this division holds every value of its width.
    pub const fn is_full_range(&self) -> bool {
        self.includes_zero() && self.includes_max()
    }

    /// Returns whether zero is the only value.
    pub const fn is_zero(&self) -> bool {
        self.upper == 0
    }

    /// Returns whether the maximum value is the only value.
    pub const fn is_max(&self) -> bool {
        self.lower == self.max_value()
    }

    /// Returns the lowest value as big-endian bytes.
    pub fn bytes(&self) -> Vec<u8> {
        self.to_bytes(self.lower)
    }

    /// Returns the highest value as big-endian bytes.
    pub fn upper_bytes(&self) -> Vec<u8> {
        self.to_bytes(self.upper)
    }

    fn to_bytes(&self, value: u64) -> Vec<u8> {
        let bytes = value.to_be_bytes();
        bytes[bytes.len() - self.byte_count()..].to_vec()
    }

    /// Returns the mask of the first `prefix_len` bits of this division.
    pub const fn network_mask(&self, prefix_len: BitCount) -> u64 {
        self.max_value() ^ self.host_mask(prefix_len)
    }

    /// Returns the mask of the bits following the first `prefix_len` bits of this division.
    pub const fn host_mask(&self, prefix_len: BitCount) -> u64 {
        if prefix_len >= self.bit_count {
            0
        } else {
            max_value_for(self.bit_count - prefix_len)
        }
    }

    /// Returns the number of distinct values of the first `prefix_bits` bits.
    pub const fn prefix_count_len(&self, prefix_bits: BitCount) -> u128 {
        if prefix_bits == 0 {
            return 1;
        }
        if prefix_bits >= self.bit_count {
            return self.count();
        }
        let shift = self.bit_count - prefix_bits;
        ((self.upper >> shift) - (self.lower >> shift)) as u128 + 1
    }

    /// Returns the number of distinct prefixes under this division's own prefix length.
    pub const fn prefix_count(&self) -> u128 {
        match self.prefix_len {
            Some(prefix_len) => self.prefix_count_len(prefix_len.bits()),
            None => self.count(),
        }
    }

    /// Returns whether every value shares the same first `prefix_bits` bits.
    pub const fn is_single_prefix(&self, prefix_bits: BitCount) -> bool {
        self.prefix_count_len(prefix_bits) == 1
    }

    /// Returns whether the values form a union of the blocks of the given prefix length.
    pub const fn contains_prefix_block(&self, prefix_len: BitCount) -> bool {
        if prefix_len == 0 {
            return self.is_full_range();
        }
        if prefix_len >= self.bit_count {
            return true;
        }
        let host = self.host_mask(prefix_len);
        self.lower & host == 0 && self.upper & host == host
    }

    /// Returns whether the values form exactly one block of the given prefix length.
    pub const fn contains_single_prefix_block(&self, prefix_len: BitCount) -> bool {
        self.contains_prefix_block(prefix_len) && self.prefix_count_len(prefix_len) == 1
    }

    /// Returns whether the values form a union of blocks of the own prefix length.
    pub const fn is_prefix_block(&self) -> bool {
        match self.prefix_len {
            Some(prefix_len) => self.contains_prefix_block(prefix_len.bits()),
            None => false,
        }
    }

    /// Returns whether the values form exactly one block of the own prefix length.
    pub const fn is_single_prefix_block(&self) -> bool {
        match self.prefix_len {
            Some(prefix_len) => self.contains_single_prefix_block(prefix_len.bits()),
            None => false,
        }
    }

    /// Returns the smallest prefix length for which the values form a union of prefix blocks.
    pub const fn min_prefix_len_for_block(&self) -> BitCount {
        if !self.is_multiple() {
            return self.bit_count;
        }
        let trailing_zeros = if self.lower == 0 {
            self.bit_count
        } else {
            min(self.lower.trailing_zeros(), self.bit_count)
        };
        let trailing_ones = min(self.upper.trailing_ones(), self.bit_count);
        self.bit_count - min(trailing_zeros, trailing_ones)
    }

    /// Returns the prefix length for which the values form exactly one prefix block, if any.
    pub const fn prefix_len_for_single_block(&self) -> Option<PrefixLen> {
        let min_prefix = self.min_prefix_len_for_block();
        if min_prefix == self.bit_count {
            return if self.is_multiple() {
                None
            } else {
                Some(PrefixLen::new(min_prefix))
            };
        }
        let shift = self.bit_count - min_prefix;
        if shr(self.lower, shift) == shr(self.upper, shift) {
            Some(PrefixLen::new(min_prefix))
        } else {
            None
        }
    }

    /// Returns whether this division holds exactly the given value.
    pub const fn matches(&self, value: u64) -> bool {
        !self.is_multiple() && self.lower == value
    }

    /// Returns whether every value of this division equals `value` once masked.
    pub const fn matches_with_mask(&self, value: u64, mask: u64) -> bool {
        if self.is_multiple() {
            // The mask must clear every bit that varies across the range.
            let varying = u64::MAX >> (self.lower ^ self.upper).leading_zeros();
            if varying & mask != 0 {
                return false;
            }
        }
        value == self.lower & mask
    }

    /// Returns the range obtained by masking every value of this division.
    ///
    /// Fails when the masked values do not form a contiguous range.
    pub fn mask_range(&self, mask: u64) -> Result<(u64, u64), IncompatibleRangeError> {
        let mask = mask & self.max_value();
        if !self.is_multiple() {
            return Ok((self.lower & mask, self.lower & mask));
        }
        let highest_differing = u64::BITS - 1 - (self.lower ^ self.upper).leading_zeros();
        let varying = max_value_for(highest_differing + 1);
        let varying_mask = mask & varying;
        if varying_mask == 0 {
            return Ok((self.lower & mask, self.lower & mask));
        }
        let highest_masked = u64::BITS - 1 - varying_mask.leading_zeros();
        let low_bits = max_value_for(highest_masked);
        if mask & low_bits == low_bits {
            if highest_masked == highest_differing {
                return Ok((self.lower & mask, self.upper & mask));
            }
            // The range wraps the kept bits, so it must run through all of their values.
            let kept = max_value_for(highest_masked + 1);
            if self.upper - self.lower >= kept {
                let lower = self.lower & mask & !kept;
                return Ok((lower, lower | kept));
            }
        }
        tracing::debug!(
            lower = self.lower,
            upper = self.upper,
            mask,
            "masked range is not contiguous"
        );
        Err(IncompatibleRangeError::MaskedRange {
            lower: self.lower,
            upper: self.upper,
            mask,
        })
    }

    /// Returns the number of consecutive leading one or zero bits of the lowest value.
    pub const fn leading_bit_count(&self, ones: bool) -> BitCount {
        if self.bit_count == 0 {
            return 0;
        }
        let unused = u64::BITS - self.bit_count;
        let count = if ones {
            (self.lower << unused).leading_ones()
        } else {
            (!self.lower << unused).leading_ones()
        };
        min(count, self.bit_count)
    }

    /// Returns the number of consecutive trailing one or zero bits of the lowest value.
    pub const fn trailing_bit_count(&self, ones: bool) -> BitCount {
        let count = if ones {
            self.lower.trailing_ones()
        } else {
            self.lower.trailing_zeros()
        };
        min(count, self.bit_count)
    }

    /// Returns whether bit `n` of the lowest value is set, counting from the least significant
    /// bit.
    pub const fn test_bit(&self, n: BitCount) -> bool {
        n < self.bit_count && (self.lower >> n) & 1 == 1
    }
}

const fn min(a: BitCount, b: BitCount) -> BitCount {
    if a < b { a } else { b }
}
