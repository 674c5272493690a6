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

//! Segments: divisions whose width is fixed by the address family.

use std::{
    hash::{Hash, Hasher},
    ops::{Deref, RangeInclusive},
};

use super::native::{Division, max_value_for};
use crate::{
    error::IncompatibleRangeError,
    family::{AddressFamily, PrefixLen},
};

/// Index metadata describing where a segment was found in its source text.
///
/// The value model never interprets it and it never takes part in comparisons.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SegmentOrigin {
    start: usize,
    end: usize,
}

impl SegmentOrigin {
    /// Creates a new origin spanning `start..end`.
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Returns the start index.
    pub const fn start(&self) -> usize {
        self.start
    }

    /// Returns the end index.
    pub const fn end(&self) -> usize {
        self.end
    }
}

/// A division of an address section.
///
/// All division accessors are available through [`Deref`].
#[derive(Copy, Clone, Debug)]
pub struct Segment {
    family: AddressFamily,
    division: Division,
    origin: Option<SegmentOrigin>,
}

impl Segment {
    /// Creates a segment, masking the values to the segment width of the family.
    pub(crate) const fn new(
        family: AddressFamily,
        lower: u64,
        upper: u64,
        prefix_len: Option<PrefixLen>,
    ) -> Self {
        Self {
            family,
            division: Division::with_width(lower, upper, family.bits_per_segment(), prefix_len),
            origin: None,
        }
    }

    /// Returns this segment annotated with its origin.
    pub(crate) const fn with_origin(mut self, origin: SegmentOrigin) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Returns the family of the segment.
    pub const fn family(&self) -> AddressFamily {
        self.family
    }

    /// Returns the origin metadata, if any.
    pub const fn origin(&self) -> Option<SegmentOrigin> {
        self.origin
    }

    /// Returns the underlying division.
    pub const fn division(&self) -> &Division {
        &self.division
    }

    /// Returns a segment of the same family with new values and prefix length.
    pub const fn derive_new(&self, lower: u64, upper: u64, prefix_len: Option<PrefixLen>) -> Self {
        Self::new(self.family, lower, upper, prefix_len)
    }

    /// Returns this segment with another prefix length.
    pub const fn with_prefix_len(&self, prefix_len: Option<PrefixLen>) -> Self {
        Self {
            division: self.division.with_prefix_len(prefix_len),
            ..*self
        }
    }

    /// Returns this segment without a prefix length.
    pub const fn without_prefix_len(&self) -> Self {
        self.with_prefix_len(None)
    }

    /// Returns the segment holding only the lowest value.
    pub fn to_lower(&self) -> Self {
        self.derive_new(self.value(), self.value(), self.prefix_len())
    }

    /// Returns the segment holding only the highest value.
    pub fn to_upper(&self) -> Self {
        self.derive_new(self.upper_value(), self.upper_value(), self.prefix_len())
    }

    /// Returns whether every value of `other` is a value of this segment.
    pub fn contains(&self, other: &Segment) -> bool {
        self.family == other.family
            && self.value() <= other.value()
            && other.upper_value() <= self.upper_value()
    }

    /// Returns whether this segment and `other` share a value.
    pub fn overlaps(&self, other: &Segment) -> bool {
        self.family == other.family
            && self.value() <= other.upper_value()
            && other.value() <= self.upper_value()
    }

    /// Returns the segment with the bits reversed, either across the whole segment or
    /// within each byte.
    ///
    /// A range can only be reversed when the reversed values form the same range, which
    /// requires it to cover every value except possibly the smallest and the largest.
    pub fn reverse_bits(&self, per_byte: bool) -> Result<Self, IncompatibleRangeError> {
        if self.is_multiple() {
            return if per_byte {
                self.reverse_range_bits_per_byte()
            } else if self.is_reversible_range() {
                Ok(self.without_prefix_len())
            } else {
                Err(self.reversed_range_error())
            };
        }
        let value = if per_byte {
            reverse_bits_per_byte(self.value(), self.byte_count())
        } else {
            self.value().reverse_bits() >> (u64::BITS - self.bit_count())
        };
        Ok(self.derive_new(value, value, None))
    }

    /// Returns the segment with the byte order reversed.
    pub fn reverse_bytes(&self) -> Result<Self, IncompatibleRangeError> {
        if self.byte_count() <= 1 {
            return Ok(*self);
        }
        if self.is_multiple() {
            return if self.is_reversible_range() {
                Ok(self.without_prefix_len())
            } else {
                Err(self.reversed_range_error())
            };
        }
        let value = self.value().swap_bytes() >> (u64::BITS - self.bit_count());
        Ok(self.derive_new(value, value, None))
    }

    /// Returns an iterator over every single value of this segment.
    pub fn iter(&self) -> SegmentIter {
        SegmentIter {
            segment: *self,
            values: self.value()..=self.upper_value(),
        }
    }

    fn is_reversible_range(&self) -> bool {
        self.value() <= 1 && self.upper_value() >= self.max_value() - 1
    }

    fn reverse_range_bits_per_byte(&self) -> Result<Self, IncompatibleRangeError> {
        let byte_count = self.byte_count();
        let (lower, upper) = (self.value(), self.upper_value());
        let byte_at = |value: u64, index: usize| (value >> (8 * (byte_count - 1 - index))) as u8;
        let Some(first) = (0..byte_count).find(|&i| byte_at(lower, i) != byte_at(upper, i)) else {
            return Ok(self.without_prefix_len());
        };

        let (low, high) = (byte_at(lower, first), byte_at(upper, first));
        if low > 1 || high < 254 {
            return Err(self.reversed_range_error());
        }
        // A lower byte of 1 forces every following lower byte to 0, an upper byte of 254
        // forces every following upper byte to 255.
        let (mut lower_is_zero, mut upper_is_max) = (low == 1, high == 254);
        for index in first + 1..byte_count {
            let (low, high) = (byte_at(lower, index), byte_at(upper, index));
            if lower_is_zero {
                if low != 0 {
                    return Err(self.reversed_range_error());
                }
            } else if low > 1 {
                return Err(self.reversed_range_error());
            } else {
                lower_is_zero = low == 1;
            }
            if upper_is_max {
                if high != 255 {
                    return Err(self.reversed_range_error());
                }
            } else if high < 254 {
                return Err(self.reversed_range_error());
            } else {
                upper_is_max = high == 254;
            }
        }

        // The fixed leading bytes reverse on their own, the ranged remainder maps onto itself.
        let ranged = max_value_for(8 * (byte_count - first) as u32);
        let fixed = reverse_bits_per_byte(lower, byte_count) & !ranged;
        Ok(self.derive_new(fixed | (lower & ranged), fixed | (upper & ranged), None))
    }

    fn reversed_range_error(&self) -> IncompatibleRangeError {
        tracing::debug!(
            lower = self.value(),
            upper = self.upper_value(),
            "segment range cannot be reversed",
        );
        IncompatibleRangeError::ReversedRange {
            lower: self.value(),
            upper: self.upper_value(),
        }
    }
}

fn reverse_bits_per_byte(value: u64, byte_count: usize) -> u64 {
    (0..byte_count).fold(0, |reversed, index| {
        let shift = 8 * index;
        let byte = (value >> shift) as u8;
        reversed | u64::from(byte.reverse_bits()) << shift
    })
}

impl Deref for Segment {
    type Target = Division;

    fn deref(&self) -> &Self::Target {
        &self.division
    }
}

impl PartialEq for Segment {
    fn eq(&self, other: &Self) -> bool {
        self.family == other.family && self.division == other.division
    }
}

impl Eq for Segment {}

impl Hash for Segment {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.family.hash(state);
        self.division.hash(state);
    }
}

/// Iterator over the single values of a [`Segment`].
#[derive(Clone, Debug)]
pub struct SegmentIter {
    segment: Segment,
    values: RangeInclusive<u64>,
}

impl Iterator for SegmentIter {
    type Item = Segment;

    fn next(&mut self) -> Option<Self::Item> {
        let value = self.values.next()?;
        Some(self.segment.derive_new(value, value, self.segment.prefix_len()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.values.size_hint()
    }
}

impl DoubleEndedIterator for SegmentIter {
    fn next_back(&mut self) -> Option<Self::Item> {
        let value = self.values.next_back()?;
        Some(self.segment.derive_new(value, value, self.segment.prefix_len()))
    }
}
