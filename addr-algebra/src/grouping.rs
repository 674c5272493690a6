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

//! Ordered groupings of divisions forming one composite value.

use std::{
    fmt::{Debug, Formatter},
    hash::{Hash, Hasher},
    ops::Range,
    sync::{Arc, OnceLock},
};

use num_bigint::BigUint;
use num_traits::{One, Zero};

use crate::{
    division::{DivisionValue, LargeDivision},
    error::IncompatibleRangeError,
    family::{BitCount, PrefixLen, division_prefix_len},
};

/// Values derived from the divisions on first use.
#[derive(Clone, Default)]
struct GroupingCache {
    count: OnceLock<BigUint>,
    min_prefix_len: OnceLock<BitCount>,
    single_block_prefix_len: OnceLock<Option<PrefixLen>>,
}

/// A fixed-length ordered sequence of divisions, most significant first.
///
/// At most one division holds the boundary between network and host bits: once a division
/// carries a prefix length, every following division carries a prefix length of zero.
#[derive(Clone)]
pub struct DivisionGrouping<D> {
    divisions: Arc<[D]>,
    prefix_len: Option<PrefixLen>,
    is_multiple: bool,
    bit_count: BitCount,
    cache: GroupingCache,
}

impl<D: DivisionValue> DivisionGrouping<D> {
    /// Creates a grouping from its divisions.
    ///
    /// Empty divisions are dropped and the division prefix lengths are normalized so that the
    /// grouping has a single network/host boundary.
    pub fn new(divisions: Vec<D>) -> Self {
        Self::from_normalized(normalize(divisions).into())
    }

    /// Creates a grouping from divisions whose prefix lengths are already normalized.
    pub(crate) fn from_normalized(divisions: Arc<[D]>) -> Self {
        let mut bit_count = 0;
        let mut prefix_len = None;
        let mut is_multiple = false;
        for division in divisions.iter() {
            if prefix_len.is_none() {
                prefix_len = division
                    .prefix_len()
                    .map(|prefix_len| PrefixLen::new(bit_count + prefix_len.bits()));
            }
            is_multiple |= division.is_multiple();
            bit_count += division.bit_count();
        }
        Self {
            divisions,
            prefix_len,
            is_multiple,
            bit_count,
            cache: GroupingCache::default(),
        }
    }

    /// Returns the divisions.
    pub fn divisions(&self) -> &[D] {
        &self.divisions
    }

    /// Returns the division at `index`, if any.
    pub fn division(&self, index: usize) -> Option<&D> {
        self.divisions.get(index)
    }

    /// Returns the number of divisions.
    pub fn division_count(&self) -> usize {
        self.divisions.len()
    }

    /// Returns the total width in bits.
    pub fn bit_count(&self) -> BitCount {
        self.bit_count
    }

    /// Returns the number of bytes needed to hold the total width.
    pub fn byte_count(&self) -> usize {
        self.bit_count.div_ceil(8) as usize
    }

    /// Returns the prefix length, if any division carries one.
    pub fn prefix_len(&self) -> Option<PrefixLen> {
        self.prefix_len
    }

    /// Returns whether the grouping has a prefix length.
    pub fn is_prefixed(&self) -> bool {
        self.prefix_len.is_some()
    }

    /// Returns whether the grouping holds more than one value.
    pub fn is_multiple(&self) -> bool {
        self.is_multiple
    }

    /// Returns the number of values, the product of the division counts.
    pub fn count(&self) -> BigUint {
        if !self.is_multiple {
            return BigUint::one();
        }
        self.cache
            .count
            .get_or_init(|| self.block_count(self.divisions.len()))
            .clone()
    }

    /// Returns the number of distinct values of the first `n` divisions.
    pub fn block_count(&self, n: usize) -> BigUint {
        self.divisions
            .iter()
            .take(n)
            .fold(BigUint::one(), |count, division| count * division.count_big())
    }

    /// Returns the number of distinct prefixes under the own prefix length, or the count when
    /// there is no prefix length.
    pub fn prefix_count(&self) -> BigUint {
        match self.prefix_len {
            Some(prefix_len) => self.prefix_count_len(prefix_len.bits()),
            None => self.count(),
        }
    }

    /// Returns the number of distinct values of the first `prefix_bits` bits.
    pub fn prefix_count_len(&self, prefix_bits: BitCount) -> BigUint {
        if prefix_bits >= self.bit_count {
            return self.count();
        }
        let mut count = BigUint::one();
        let mut offset = 0;
        for division in self.divisions.iter() {
            let bit_count = division.bit_count();
            if offset + bit_count <= prefix_bits {
                count *= division.count_big();
            } else {
                count *= division.prefix_count_len_big(prefix_bits - offset);
                break;
            }
            offset += bit_count;
        }
        count
    }

    /// Returns whether every value shares the same first `prefix_bits` bits.
    pub fn is_single_prefix(&self, prefix_bits: BitCount) -> bool {
        self.prefix_count_len(prefix_bits).is_one()
    }

    /// Returns the minimal index such that every following division is full range.
    pub fn sequential_block_index(&self) -> usize {
        let mut index = self.divisions.len().saturating_sub(1);
        while index > 0 && self.divisions[index].is_full_range() {
            index -= 1;
        }
        index
    }

    /// Returns the number of sequential blocks this grouping decomposes into.
    pub fn sequential_block_count(&self) -> BigUint {
        self.block_count(self.sequential_block_index())
    }

    /// Returns whether the values form one contiguous range.
    pub fn is_sequential(&self) -> bool {
        let Some(first_ranged) = self.divisions.iter().position(D::is_multiple) else {
            return true;
        };
        self.divisions[first_ranged + 1..]
            .iter()
            .all(DivisionValue::is_full_range)
    }

    /// Returns the lowest value.
    pub fn value(&self) -> BigUint {
        self.fold_values(D::lower_value_big)
    }

    /// Returns the highest value.
    pub fn upper_value(&self) -> BigUint {
        self.fold_values(D::upper_value_big)
    }

    fn fold_values(&self, value: impl Fn(&D) -> BigUint) -> BigUint {
        self.divisions.iter().fold(BigUint::zero(), |total, division| {
            (total << division.bit_count()) | value(division)
        })
    }

    /// Returns the lowest value as big-endian bytes.
    pub fn bytes(&self) -> Vec<u8> {
        to_padded_bytes(&self.value(), self.byte_count())
    }

    /// Returns the highest value as big-endian bytes.
    pub fn upper_bytes(&self) -> Vec<u8> {
        to_padded_bytes(&self.upper_value(), self.byte_count())
    }

    /// Returns whether every division holds every value of its width.
    pub fn is_full_range(&self) -> bool {
        self.divisions.iter().all(DivisionValue::is_full_range)
    }

    /// Returns whether zero is one of the values.
    pub fn includes_zero(&self) -> bool {
        self.divisions.iter().all(DivisionValue::includes_zero)
    }

    /// Returns whether the maximum value is one of the values.
    pub fn includes_max(&self) -> bool {
        self.divisions.iter().all(DivisionValue::includes_max)
    }

    /// Returns whether zero is the only value.
    pub fn is_zero(&self) -> bool {
        self.divisions.iter().all(DivisionValue::is_zero)
    }

    /// Returns whether the maximum value is the only value.
    pub fn is_max(&self) -> bool {
        self.divisions.iter().all(DivisionValue::is_max)
    }

    /// Returns whether the values form a union of blocks of the given prefix length.
    pub fn contains_prefix_block(&self, prefix_len: BitCount) -> bool {
        let mut offset = 0;
        for division in self.divisions.iter() {
            let bit_count = division.bit_count();
            if prefix_len < offset + bit_count {
                let division_prefix = prefix_len.saturating_sub(offset);
                if !division.contains_prefix_block(division_prefix) {
                    return false;
                }
            }
            offset += bit_count;
        }
        true
    }

    /// Returns whether the values form exactly one block of the given prefix length.
    pub fn contains_single_prefix_block(&self, prefix_len: BitCount) -> bool {
        let mut offset = 0;
        for division in self.divisions.iter() {
            let bit_count = division.bit_count();
            let holds = if prefix_len >= offset + bit_count {
                !division.is_multiple()
            } else {
                division.contains_single_prefix_block(prefix_len.saturating_sub(offset))
            };
            if !holds {
                return false;
            }
            offset += bit_count;
        }
        true
    }

    /// Returns whether the values form a union of blocks of the own prefix length.
    pub fn is_prefix_block(&self) -> bool {
        self.prefix_len
            .is_some_and(|prefix_len| self.contains_prefix_block(prefix_len.bits()))
    }

    /// Returns whether the values form exactly one block of the own prefix length.
    pub fn is_single_prefix_block(&self) -> bool {
        self.prefix_len
            .is_some_and(|prefix_len| self.contains_single_prefix_block(prefix_len.bits()))
    }

    /// Returns the smallest prefix length for which the values form a union of prefix blocks.
    pub fn min_prefix_len_for_block(&self) -> BitCount {
        *self.cache.min_prefix_len.get_or_init(|| {
            let mut total = self.bit_count;
            for division in self.divisions.iter().rev() {
                let bit_count = division.bit_count();
                let min_prefix = division.min_prefix_len_for_block();
                if min_prefix == bit_count {
                    break;
                }
                total -= bit_count;
                if min_prefix != 0 {
                    total += min_prefix;
                    break;
                }
            }
            total
        })
    }

    /// Returns the prefix length for which the values form exactly one prefix block, if any.
    pub fn prefix_len_for_single_block(&self) -> Option<PrefixLen> {
        *self.cache.single_block_prefix_len.get_or_init(|| {
            let mut total = 0;
            let mut divisions = self.divisions.iter();
            while let Some(division) = divisions.next() {
                let prefix_len = division.prefix_len_for_single_block()?;
                total += prefix_len.bits();
                if prefix_len.bits() < division.bit_count() {
                    if !divisions.all(DivisionValue::is_full_range) {
                        return None;
                    }
                    break;
                }
            }
            Some(PrefixLen::new(total))
        })
    }

    /// Joins the divisions in `range` into a single division.
    ///
    /// Fails when a ranged division is followed by one which is not full range, as the joined
    /// values would not be contiguous.
    pub fn join(&self, range: Range<usize>) -> Result<LargeDivision, IncompatibleRangeError> {
        let end = range.end.min(self.divisions.len());
        let start = range.start.min(end);
        let offset: BitCount = self.divisions[..start].iter().map(D::bit_count).sum();

        let mut lower = BigUint::zero();
        let mut upper = BigUint::zero();
        let mut bit_count = 0;
        let mut ranged = None;
        for (index, division) in self.divisions[start..end].iter().enumerate() {
            match ranged {
                Some(ranged) if !division.is_full_range() => {
                    tracing::debug!(index = ranged, "cannot join ranged division");
                    return Err(IncompatibleRangeError::JoinedRange { index: ranged });
                }
                None if division.is_multiple() => ranged = Some(start + index),
                _ => {}
            }
            lower = (lower << division.bit_count()) | division.lower_value_big();
            upper = (upper << division.bit_count()) | division.upper_value_big();
            bit_count += division.bit_count();
        }

        let prefix_len = self.prefix_len.and_then(|prefix_len| {
            division_prefix_len(
                i64::from(prefix_len.bits()) - i64::from(offset),
                bit_count,
            )
        });
        Ok(LargeDivision::from_values(lower, upper, bit_count, prefix_len))
    }
}

/// Drops empty divisions and makes the first prefixed division the only boundary.
fn normalize<D: DivisionValue>(divisions: Vec<D>) -> Vec<D> {
    let mut normalized: Vec<D> = Vec::with_capacity(divisions.len());
    let mut prefixed = false;
    for division in divisions {
        if division.bit_count() == 0 {
            continue;
        }
        if prefixed {
            if division.prefix_len() == Some(PrefixLen::ZERO) {
                normalized.push(division);
            } else {
                normalized.push(division.with_prefix_len(Some(PrefixLen::ZERO)));
            }
            continue;
        }
        if let Some(prefix_len) = division.prefix_len() {
            // A boundary at the very start of a division belongs to the previous one.
            if prefix_len == PrefixLen::ZERO {
                if let Some(previous) = normalized.last_mut() {
                    *previous =
                        previous.with_prefix_len(Some(PrefixLen::new(previous.bit_count())));
                }
            }
            prefixed = true;
        }
        normalized.push(division);
    }
    normalized
}

pub(crate) fn to_padded_bytes(value: &BigUint, byte_count: usize) -> Vec<u8> {
    let raw = if value.is_zero() {
        Vec::new()
    } else {
        value.to_bytes_be()
    };
    let mut bytes = vec![0; byte_count.saturating_sub(raw.len())];
    bytes.extend_from_slice(&raw);
    bytes
}

impl<D: DivisionValue + PartialEq> PartialEq for DivisionGrouping<D> {
    fn eq(&self, other: &Self) -> bool {
        self.divisions == other.divisions
    }
}

impl<D: DivisionValue + Eq> Eq for DivisionGrouping<D> {}

impl<D: DivisionValue + Hash> Hash for DivisionGrouping<D> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.divisions.hash(state);
    }
}

impl<D: Debug> Debug for DivisionGrouping<D> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DivisionGrouping")
            .field("divisions", &self.divisions)
            .field("prefix_len", &self.prefix_len)
            .finish()
    }
}
