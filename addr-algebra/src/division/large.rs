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

//! Divisions of arbitrary bit width backed by unbounded integers.

use num_bigint::BigUint;
use num_traits::{One, ToPrimitive, Zero};

use super::DivisionValue;
use crate::family::{BitCount, PrefixLen};

fn max_value_for(bit_count: BitCount) -> BigUint {
    (BigUint::one() << bit_count) - 1u32
}

/// Keeps the trailing bytes covering `bit_count` bits, masking the excess bits of the top
/// byte.
fn truncate_bytes(bytes: &[u8], bit_count: BitCount) -> BigUint {
    let max_len = bit_count.div_ceil(8) as usize;
    let mut bytes = bytes[bytes.len().saturating_sub(max_len)..].to_vec();
    if bytes.len() == max_len && bit_count % 8 != 0 {
        bytes[0] &= !(0xffu8 << (bit_count % 8));
    }
    BigUint::from_bytes_be(&bytes)
}

/// Counts the trailing zero bits of `value` within `bit_count` bits.
fn trailing_zeros(value: &BigUint, bit_count: BitCount) -> BitCount {
    value
        .trailing_zeros()
        .map_or(bit_count, |zeros| zeros.min(u64::from(bit_count)) as BitCount)
}

/// A field of arbitrary width holding a single value or an inclusive range of values.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LargeDivision {
    lower: BigUint,
    upper: BigUint,
    bit_count: BitCount,
    prefix_len: Option<PrefixLen>,
    max_value: BigUint,
}

impl LargeDivision {
    /// Creates a single-valued division from big-endian bytes.
    ///
    /// Leading bytes beyond the bit width are dropped and the top byte is masked to the exact
    /// width.
    pub fn from_bytes(bytes: &[u8], bit_count: BitCount, prefix_len: Option<PrefixLen>) -> Self {
        Self::from_range_bytes(bytes, bytes, bit_count, prefix_len)
    }

    /// Creates a ranged division from the big-endian bytes of both bounds.
    pub fn from_range_bytes(
        lower: &[u8],
        upper: &[u8],
        bit_count: BitCount,
        prefix_len: Option<PrefixLen>,
    ) -> Self {
        Self::from_values(
            truncate_bytes(lower, bit_count),
            truncate_bytes(upper, bit_count),
            bit_count,
            prefix_len,
        )
    }

    /// Creates a ranged division from its bounds, masking them to the bit width.
    pub fn from_values(
        lower: BigUint,
        upper: BigUint,
        bit_count: BitCount,
        prefix_len: Option<PrefixLen>,
    ) -> Self {
        let max_value = max_value_for(bit_count);
        let lower = lower & &max_value;
        let upper = upper & &max_value;
        let (lower, upper) = if lower > upper {
            (upper, lower)
        } else {
            (lower, upper)
        };
        Self {
            lower,
            upper,
            bit_count,
            prefix_len: prefix_len.map(|prefix_len| prefix_len.capped(bit_count)),
            max_value,
        }
    }

    /// Returns a division of the same width with new values and prefix length.
    pub fn derive_new(
        &self,
        lower: BigUint,
        upper: BigUint,
        prefix_len: Option<PrefixLen>,
    ) -> Self {
        Self::from_values(lower, upper, self.bit_count, prefix_len)
    }

    /// Returns this division with another prefix length.
    pub fn with_prefix_len(&self, prefix_len: Option<PrefixLen>) -> Self {
        Self {
            prefix_len: prefix_len.map(|prefix_len| prefix_len.capped(self.bit_count)),
            ..self.clone()
        }
    }

    /// Returns the lowest value.
    pub fn value(&self) -> &BigUint {
        &self.lower
    }

    /// Returns the highest value.
    pub fn upper_value(&self) -> &BigUint {
        &self.upper
    }

    /// Returns the largest value this division can hold.
    pub fn max_value(&self) -> &BigUint {
        &self.max_value
    }

    /// Returns the number of values.
    pub fn count(&self) -> BigUint {
        &self.upper - &self.lower + 1u32
    }

    fn host_mask(&self, prefix_len: BitCount) -> BigUint {
        max_value_for(self.bit_count - prefix_len)
    }

    fn to_bytes(&self, value: &BigUint) -> Vec<u8> {
        let byte_count = self.byte_count();
        let raw = if value.is_zero() {
            Vec::new()
        } else {
            value.to_bytes_be()
        };
        let mut bytes = vec![0; byte_count.saturating_sub(raw.len())];
        bytes.extend_from_slice(&raw);
        bytes
    }
}

impl DivisionValue for LargeDivision {
    fn bit_count(&self) -> BitCount {
        self.bit_count
    }

    fn prefix_len(&self) -> Option<PrefixLen> {
        self.prefix_len
    }

    fn with_prefix_len(&self, prefix_len: Option<PrefixLen>) -> Self {
        LargeDivision::with_prefix_len(self, prefix_len)
    }

    fn is_multiple(&self) -> bool {
        self.lower != self.upper
    }

    fn lower_value_big(&self) -> BigUint {
        self.lower.clone()
    }

    fn upper_value_big(&self) -> BigUint {
        self.upper.clone()
    }

    fn native_bounds(&self) -> Option<(u64, u64)> {
        Some((self.lower.to_u64()?, self.upper.to_u64()?))
    }

    fn count_big(&self) -> BigUint {
        self.count()
    }

    fn prefix_count_len_big(&self, prefix_bits: BitCount) -> BigUint {
        if prefix_bits == 0 {
            return BigUint::one();
        }
        if prefix_bits >= self.bit_count {
            return self.count();
        }
        let shift = self.bit_count - prefix_bits;
        (&self.upper >> shift) - (&self.lower >> shift) + 1u32
    }

    fn bytes(&self) -> Vec<u8> {
        self.to_bytes(&self.lower)
    }

    fn upper_bytes(&self) -> Vec<u8> {
        self.to_bytes(&self.upper)
    }

    fn includes_zero(&self) -> bool {
        self.lower.is_zero()
    }

    fn includes_max(&self) -> bool {
        self.upper == self.max_value
    }

    fn is_zero(&self) -> bool {
        self.upper.is_zero()
    }

    fn is_max(&self) -> bool {
        self.lower == self.max_value
    }

    fn contains_prefix_block(&self, prefix_len: BitCount) -> bool {
        if prefix_len == 0 {
            return self.is_full_range();
        }
        if prefix_len >= self.bit_count {
            return true;
        }
        let host = self.host_mask(prefix_len);
        (&self.lower & &host).is_zero() && (&self.upper & &host) == host
    }

    fn contains_single_prefix_block(&self, prefix_len: BitCount) -> bool {
        self.contains_prefix_block(prefix_len) && self.prefix_count_len_big(prefix_len).is_one()
    }

    fn min_prefix_len_for_block(&self) -> BitCount {
        if !self.is_multiple() {
            return self.bit_count;
        }
        let lower_zeros = trailing_zeros(&self.lower, self.bit_count);
        let upper_ones = trailing_zeros(&(&self.max_value - &self.upper), self.bit_count);
        self.bit_count - lower_zeros.min(upper_ones)
    }

    fn prefix_len_for_single_block(&self) -> Option<PrefixLen> {
        let min_prefix = self.min_prefix_len_for_block();
        if min_prefix == self.bit_count {
            return (!self.is_multiple()).then_some(PrefixLen::new(min_prefix));
        }
        let shift = self.bit_count - min_prefix;
        ((&self.lower >> shift) == (&self.upper >> shift)).then_some(PrefixLen::new(min_prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_bytes_to_bit_width() {
        let div = LargeDivision::from_bytes(&[0xff, 0xff, 0xff, 0xff, 0xff], 33, None);
        assert_eq!(div.max_value(), &((BigUint::one() << 33u32) - 1u32));
        assert_eq!(div.value(), div.max_value());
        assert_eq!(div.bytes(), vec![0x01, 0xff, 0xff, 0xff, 0xff]);
        assert!(div.is_max());
    }

    #[test]
    fn drops_leading_bytes() {
        let div = LargeDivision::from_bytes(&[0xaa, 0xbb, 0x12, 0x34], 12, None);
        assert_eq!(div.value(), &BigUint::from(0x234u32));
        assert_eq!(div.bytes(), vec![0x02, 0x34]);
    }

    #[test]
    fn swaps_inverted_bounds() {
        let div = LargeDivision::from_range_bytes(&[0x09], &[0x01], 70, None);
        assert_eq!(div.value(), &BigUint::from(1u32));
        assert_eq!(div.upper_value(), &BigUint::from(9u32));
        assert_eq!(div.count(), BigUint::from(9u32));
        assert_eq!(div.bytes().len(), 9);
    }

    #[test]
    fn full_range_prefix_blocks() {
        let max = max_value_for(100);
        let div = LargeDivision::from_values(BigUint::zero(), max, 100, None);
        assert!(div.is_full_range());
        assert!(div.contains_prefix_block(0));
        assert_eq!(div.min_prefix_len_for_block(), 0);
        assert_eq!(div.prefix_len_for_single_block(), Some(PrefixLen::ZERO));
        assert_eq!(div.prefix_count_len_big(0), BigUint::one());
        assert_eq!(div.prefix_count_len_big(10), BigUint::from(1024u32));
    }

    #[test]
    fn aligned_block() {
        // 0x40_0000_0000..=0x7f_ffff_ffff over 40 bits is a /2 block.
        let lower = BigUint::from(0x40u32) << 32u32;
        let upper = (BigUint::from(0x80u32) << 32u32) - 1u32;
        let div = LargeDivision::from_values(lower, upper, 40, Some(PrefixLen::new(2)));
        assert_eq!(div.min_prefix_len_for_block(), 2);
        assert_eq!(div.prefix_len_for_single_block(), Some(PrefixLen::new(2)));
        assert!(div.contains_single_prefix_block(2));
        assert!(!div.contains_prefix_block(1));
        assert_eq!(div.native_bounds(), Some((0x40 << 32, (0x80 << 32) - 1)));
    }

    #[test]
    fn union_of_blocks_is_not_single() {
        let div = LargeDivision::from_values(4u32.into(), 11u32.into(), 65, None);
        assert_eq!(div.min_prefix_len_for_block(), 63);
        assert!(div.contains_prefix_block(63));
        assert_eq!(div.prefix_len_for_single_block(), None);
    }

    #[test]
    fn prefix_len_is_capped() {
        let div = LargeDivision::from_bytes(&[1], 9, Some(PrefixLen::new(20)));
        assert_eq!(div.prefix_len(), Some(PrefixLen::new(9)));
        assert!(!div.is_multiple());
        assert_eq!(div.min_prefix_len_for_block(), 9);
    }
}
