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

//! Address sections: groupings of segments sharing one address family.

use std::{
    cmp::Ordering,
    ops::{Deref, Range},
};

pub use self::iter::SectionIter;
use crate::{
    division::{AnyDivision, Division, DivisionValue, Segment},
    error::{AddressError, AddressValueError, IncompatibleRangeError},
    family::{AddressFamily, BitCount, PrefixLen, division_prefix_len},
    grouping::DivisionGrouping,
};

mod iter;

/// An ordered sequence of segments of one address family, most significant first.
///
/// All grouping queries are available through [`Deref`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Section {
    family: AddressFamily,
    grouping: DivisionGrouping<Segment>,
}

impl Section {
    /// Creates a section from segments, keeping the prefix lengths they carry.
    pub(crate) fn new(
        family: AddressFamily,
        segments: Vec<Segment>,
    ) -> Result<Self, AddressValueError> {
        check_segments(family, &segments)?;
        Ok(Self {
            family,
            grouping: DivisionGrouping::new(segments),
        })
    }

    /// Creates a section from segments, replacing their prefix lengths with those derived
    /// from `prefix_len`.
    pub(crate) fn with_section_prefix_len(
        family: AddressFamily,
        segments: Vec<Segment>,
        prefix_len: Option<PrefixLen>,
    ) -> Result<Self, AddressValueError> {
        check_segments(family, &segments)?;
        Ok(Self::from_parts(family, segments, prefix_len))
    }

    /// Creates a section from segments known to be of the given family.
    pub(crate) fn from_parts(
        family: AddressFamily,
        mut segments: Vec<Segment>,
        prefix_len: Option<PrefixLen>,
    ) -> Self {
        let bit_count = family.bits_per_segment();
        let total = bit_count * segments.len() as BitCount;
        let prefix_len = prefix_len.map(|prefix_len| prefix_len.capped(total));
        for (index, segment) in segments.iter_mut().enumerate() {
            let segment_prefix = prefix_len.and_then(|prefix_len| {
                let offset = i64::from(bit_count) * index as i64;
                division_prefix_len(i64::from(prefix_len.bits()) - offset, bit_count)
            });
            if segment.prefix_len() != segment_prefix {
                *segment = segment.with_prefix_len(segment_prefix);
            }
        }
        Self {
            family,
            grouping: DivisionGrouping::from_normalized(segments.into()),
        }
    }

    fn derive(&self, segments: Vec<Segment>, prefix_len: Option<PrefixLen>) -> Self {
        Self::from_parts(self.family, segments, prefix_len)
    }

    fn map_segments(
        &self,
        prefix_len: Option<PrefixLen>,
        f: impl FnMut(&Segment) -> Segment,
    ) -> Self {
        self.derive(self.segments().iter().map(f).collect(), prefix_len)
    }

    fn try_map_segments<E>(
        &self,
        prefix_len: Option<PrefixLen>,
        f: impl FnMut(&Segment) -> Result<Segment, E>,
    ) -> Result<Self, E> {
        let segments = self.segments().iter().map(f).collect::<Result<_, _>>()?;
        Ok(self.derive(segments, prefix_len))
    }

    /// Returns the family of the section.
    pub fn family(&self) -> AddressFamily {
        self.family
    }

    /// Returns the underlying grouping.
    pub fn grouping(&self) -> &DivisionGrouping<Segment> {
        &self.grouping
    }

    /// Returns the segments.
    pub fn segments(&self) -> &[Segment] {
        self.grouping.divisions()
    }

    /// Returns the segment at `index`, if any.
    pub fn segment(&self, index: usize) -> Option<&Segment> {
        self.grouping.division(index)
    }

    /// Returns the number of segments.
    pub fn segment_count(&self) -> usize {
        self.grouping.division_count()
    }

    /// Returns the width of each segment.
    pub fn bits_per_segment(&self) -> BitCount {
        self.family.bits_per_segment()
    }

    /// Returns the section holding only the lowest value.
    pub fn lower(&self) -> Self {
        self.map_segments(self.prefix_len(), Segment::to_lower)
    }

    /// Returns the section holding only the highest value.
    pub fn upper(&self) -> Self {
        self.map_segments(self.prefix_len(), Segment::to_upper)
    }

    fn is_comparable(&self, other: &Section) -> bool {
        self.family == other.family && self.segment_count() == other.segment_count()
    }

    /// Returns whether every value of `other` is a value of this section.
    pub fn contains(&self, other: &Section) -> bool {
        self.is_comparable(other)
            && self
                .segments()
                .iter()
                .zip(other.segments())
                .all(|(one, two)| one.contains(two))
    }

    /// Returns whether this section and `other` share a value.
    pub fn overlaps(&self, other: &Section) -> bool {
        self.is_comparable(other)
            && self
                .segments()
                .iter()
                .zip(other.segments())
                .all(|(one, two)| one.overlaps(two))
    }

    /// Returns whether the prefixes of `other` are prefixes of this section, using the prefix
    /// length of this section or the whole section when it has none.
    pub fn prefix_contains(&self, other: &Section) -> bool {
        if !self.is_comparable(other) {
            return false;
        }
        let prefix_len = self.prefix_len().map_or(self.bit_count(), |p| p.bits());
        let bit_count = self.bits_per_segment();
        let mut offset = 0;
        for (one, two) in self.segments().iter().zip(other.segments()) {
            if offset >= prefix_len {
                break;
            }
            if offset + bit_count <= prefix_len {
                if !one.contains(two) {
                    return false;
                }
            } else {
                let shift = bit_count - (prefix_len - offset);
                if two.value() >> shift < one.value() >> shift
                    || two.upper_value() >> shift > one.upper_value() >> shift
                {
                    return false;
                }
            }
            offset += bit_count;
        }
        true
    }

    /// Returns the section with the given prefix length, keeping the values.
    pub fn set_prefix_len(&self, prefix_len: BitCount) -> Self {
        self.derive(self.segments().to_vec(), Some(PrefixLen::new(prefix_len)))
    }

    /// Returns the section with the given prefix length, zeroing the bits that move between
    /// the network and host parts.
    ///
    /// Without an existing prefix length no bits are zeroed.
    pub fn set_prefix_len_zeroed(
        &self,
        prefix_len: BitCount,
    ) -> Result<Self, IncompatibleRangeError> {
        let prefix_len = prefix_len.min(self.bit_count());
        let Some(existing) = self.prefix_len() else {
            return Ok(self.set_prefix_len(prefix_len));
        };
        let (from, to) = if prefix_len < existing.bits() {
            (prefix_len, existing.bits())
        } else {
            (existing.bits(), prefix_len)
        };
        let bit_count = self.bits_per_segment();
        let mut offset = 0;
        self.try_map_segments(Some(PrefixLen::new(prefix_len)), |segment| {
            let start = from.saturating_sub(offset).min(bit_count);
            let end = to.saturating_sub(offset).min(bit_count);
            offset += bit_count;
            let zeroed = segment.host_mask(start) & segment.network_mask(end);
            if zeroed == 0 {
                return Ok(*segment);
            }
            let (lower, upper) = segment.mask_range(segment.max_value() & !zeroed)?;
            Ok(segment.derive_new(lower, upper, None))
        })
    }

    /// Returns the section without a prefix length.
    pub fn without_prefix_len(&self) -> Self {
        if !self.is_prefixed() {
            return self.clone();
        }
        self.derive(self.segments().to_vec(), None)
    }

    /// Returns the section with the prefix length moved by `adjustment` bits.
    ///
    /// Without a prefix length, positive adjustments count from the start and negative ones
    /// from the end of the section.
    pub fn adjust_prefix_len(&self, adjustment: i32) -> Self {
        match self.adjusted_prefix_len(adjustment) {
            Some(prefix_len) => self.set_prefix_len(prefix_len),
            None => self.clone(),
        }
    }

    /// Returns the section with the prefix length moved by `adjustment` bits, zeroing the bits
    /// that move between the network and host parts as [`Section::set_prefix_len_zeroed`]
    /// does.
    pub fn adjust_prefix_len_zeroed(
        &self,
        adjustment: i32,
    ) -> Result<Self, IncompatibleRangeError> {
        match self.adjusted_prefix_len(adjustment) {
            Some(prefix_len) => self.set_prefix_len_zeroed(prefix_len),
            None => Ok(self.clone()),
        }
    }

    /// `None` when the adjustment leaves the prefix length unchanged.
    fn adjusted_prefix_len(&self, adjustment: i32) -> Option<BitCount> {
        let bit_count = i64::from(self.bit_count());
        let adjustment = i64::from(adjustment);
        let adjusted = match self.prefix_len() {
            Some(_) if adjustment == 0 => return None,
            Some(prefix_len) => i64::from(prefix_len.bits()) + adjustment,
            None if adjustment > 0 => adjustment,
            None => bit_count + adjustment,
        };
        // The clamped value lies within 0..=bit_count.
        Some(adjusted.clamp(0, bit_count) as BitCount)
    }

    /// Returns the block of values sharing the prefixes of this section under its prefix
    /// length, or the section itself without one.
    pub fn to_prefix_block(&self) -> Self {
        match self.prefix_len() {
            Some(prefix_len) => self.to_prefix_block_len(prefix_len.bits()),
            None => self.clone(),
        }
    }

    /// Returns the block of values sharing the prefixes of this section under the given
    /// prefix length.
    pub fn to_prefix_block_len(&self, prefix_len: BitCount) -> Self {
        let prefix_len = prefix_len.min(self.bit_count());
        let bit_count = self.bits_per_segment();
        let mut offset = 0;
        self.map_segments(Some(PrefixLen::new(prefix_len)), |segment| {
            let local = prefix_len.saturating_sub(offset);
            offset += bit_count;
            if local >= bit_count {
                return *segment;
            }
            segment.derive_new(
                segment.value() & segment.network_mask(local),
                segment.upper_value() | segment.host_mask(local),
                None,
            )
        })
    }

    /// Returns the section with the host bits zeroed under its prefix length, or the zero
    /// section without one.
    pub fn to_zero_host(&self) -> Result<Self, IncompatibleRangeError> {
        self.to_zero_host_len(self.prefix_len().map_or(0, |p| p.bits()))
    }

    /// Returns the section with the bits following `prefix_len` zeroed.
    ///
    /// The result keeps the prefix length only when it equals the given one. Fails when a
    /// ranged host part cannot be zeroed into a contiguous range.
    pub fn to_zero_host_len(&self, prefix_len: BitCount) -> Result<Self, IncompatibleRangeError> {
        let prefix_len = prefix_len.min(self.bit_count());
        let result_prefix = self
            .prefix_len()
            .filter(|existing| existing.bits() == prefix_len);
        let bit_count = self.bits_per_segment();
        let mut offset = 0;
        self.try_map_segments(result_prefix, |segment| {
            let local = prefix_len.saturating_sub(offset);
            offset += bit_count;
            if local >= bit_count {
                return Ok(*segment);
            }
            let (lower, upper) = segment.mask_range(segment.network_mask(local))?;
            Ok(segment.derive_new(lower, upper, None))
        })
    }

    /// Returns the section with the prefix length for which the values form exactly one
    /// prefix block, if there is one.
    pub fn assign_prefix_for_single_block(&self) -> Option<Self> {
        let prefix_len = self.prefix_len_for_single_block()?;
        Some(self.set_prefix_len(prefix_len.bits()))
    }

    /// Returns the section with the smallest prefix length for which the values form a union
    /// of prefix blocks.
    pub fn assign_min_prefix_for_block(&self) -> Self {
        self.set_prefix_len(self.min_prefix_len_for_block())
    }

    /// Returns the section obtained by masking each value with the lowest value of `mask`.
    ///
    /// The result has no prefix length.
    pub fn mask(&self, mask: &Section) -> Result<Self, AddressError> {
        if self.family != mask.family {
            return Err(AddressValueError::MismatchedFamily {
                expected: self.family,
                actual: mask.family,
            }
            .into());
        }
        if self.segment_count() != mask.segment_count() {
            return Err(AddressValueError::MismatchedLength {
                expected: self.segment_count(),
                actual: mask.segment_count(),
            }
            .into());
        }
        let mut masks = mask.segments().iter();
        let masked = self.try_map_segments(None, |segment| {
            let mask = masks.next().map_or(segment.max_value(), |mask| mask.value());
            let (lower, upper) = segment.mask_range(mask)?;
            Ok::<_, IncompatibleRangeError>(segment.derive_new(lower, upper, None))
        })?;
        Ok(masked)
    }

    /// Returns the block where the segment at `index` spans `lower..=upper`, the preceding
    /// segments are kept and the following segments are full range.
    ///
    /// The result has no prefix length.
    pub fn to_block(&self, index: usize, lower: u64, upper: u64) -> Self {
        if index >= self.segment_count() {
            return self.clone();
        }
        let segments = self
            .segments()
            .iter()
            .enumerate()
            .map(|(i, segment)| match i.cmp(&index) {
                Ordering::Less => segment.without_prefix_len(),
                Ordering::Equal => segment.derive_new(lower, upper, None),
                Ordering::Greater => segment.derive_new(0, segment.max_value(), None),
            })
            .collect();
        self.derive(segments, None)
    }

    /// Returns the section of the segments in `range`.
    ///
    /// The prefix length is shifted accordingly and dropped when the boundary lies beyond the
    /// subsection.
    pub fn subsection(&self, range: Range<usize>) -> Self {
        let end = range.end.min(self.segment_count());
        let start = range.start.min(end);
        if start == 0 && end == self.segment_count() {
            return self.clone();
        }
        Self {
            family: self.family,
            grouping: DivisionGrouping::new(self.segments()[start..end].to_vec()),
        }
    }

    /// Returns the section with the bits reversed, either across the whole section or
    /// within each byte.
    ///
    /// The result has no prefix length.
    pub fn reverse_bits(&self, per_byte: bool) -> Result<Self, IncompatibleRangeError> {
        let segments = if per_byte {
            self.segments()
                .iter()
                .map(|segment| segment.reverse_bits(true))
                .collect::<Result<_, _>>()?
        } else {
            self.segments()
                .iter()
                .rev()
                .map(|segment| segment.reverse_bits(false))
                .collect::<Result<_, _>>()?
        };
        Ok(self.derive(segments, None))
    }

    /// Returns the section with the byte order reversed.
    ///
    /// The result has no prefix length.
    pub fn reverse_bytes(&self) -> Result<Self, IncompatibleRangeError> {
        let segments = self
            .segments()
            .iter()
            .rev()
            .map(Segment::reverse_bytes)
            .collect::<Result<_, _>>()?;
        Ok(self.derive(segments, None))
    }

    /// Returns the section with the byte order reversed within each segment.
    ///
    /// The result has no prefix length.
    pub fn reverse_bytes_per_segment(&self) -> Result<Self, IncompatibleRangeError> {
        self.try_map_segments(None, Segment::reverse_bytes)
    }

    /// Returns the section with the segment order reversed.
    ///
    /// The result has no prefix length.
    pub fn reverse_segments(&self) -> Self {
        self.derive(self.segments().iter().rev().copied().collect(), None)
    }

    /// Returns an iterator over every single value of this section, in ascending order.
    pub fn iter(&self) -> SectionIter {
        SectionIter::new(self.clone(), self.segment_count())
    }

    /// Returns an iterator over the sequential blocks this section decomposes into.
    ///
    /// Each block keeps the segments from the sequential block index on and iterates the
    /// preceding segments value by value.
    pub fn sequential_block_iter(&self) -> SectionIter {
        SectionIter::new(self.clone(), self.sequential_block_index())
    }

    /// Returns an iterator over the distinct prefixes under the prefix length of this section,
    /// each item holding the values of this section sharing one prefix.
    ///
    /// Without a prefix length this iterates every value.
    pub fn prefix_iter(&self) -> SectionIter {
        SectionIter::prefixes(self.clone(), false)
    }

    /// Returns an iterator over the prefix blocks of the distinct prefixes of this section,
    /// each item a full block with the prefix length of this section.
    ///
    /// Without a prefix length this iterates every value.
    pub fn prefix_block_iter(&self) -> SectionIter {
        SectionIter::prefixes(self.clone(), true)
    }

    /// Orders sections by family, bit count and count, then segment by segment by range size
    /// and lowest value.
    ///
    /// Prefix lengths are ignored, so sections with equal values compare equal.
    pub fn compare(&self, other: &Section) -> Ordering {
        family_rank(self.family)
            .cmp(&family_rank(other.family))
            .then_with(|| self.bit_count().cmp(&other.bit_count()))
            .then_with(|| self.compare_size(other))
            .then_with(|| {
                self.segments()
                    .iter()
                    .zip(other.segments())
                    .map(|(one, two)| {
                        (one.upper_value() - one.value())
                            .cmp(&(two.upper_value() - two.value()))
                            .then_with(|| one.value().cmp(&two.value()))
                    })
                    .find(|ordering| ordering.is_ne())
                    .unwrap_or(Ordering::Equal)
            })
    }

    /// Orders sections by the number of values they hold.
    pub fn compare_size(&self, other: &Section) -> Ordering {
        match (self.is_multiple(), other.is_multiple()) {
            (false, false) => Ordering::Equal,
            (false, true) => Ordering::Less,
            (true, false) => Ordering::Greater,
            (true, true) => self.count().cmp(&other.count()),
        }
    }

    /// Returns a grouping where every `segments_per_division` consecutive segments are joined
    /// into one division.
    ///
    /// Fails when a joined ranged segment is followed by one which is not full range.
    pub fn to_joined_grouping(
        &self,
        segments_per_division: usize,
    ) -> Result<DivisionGrouping<AnyDivision>, IncompatibleRangeError> {
        let step = segments_per_division.max(1);
        let mut divisions = Vec::with_capacity(self.segment_count().div_ceil(step));
        for start in (0..self.segment_count()).step_by(step) {
            let joined = self.grouping.join(start..start + step)?;
            let bit_count = joined.bit_count();
            let division = match joined.native_bounds() {
                Some((lower, upper)) if bit_count <= Division::MAX_BIT_COUNT => {
                    AnyDivision::Native(Division::with_width(
                        lower,
                        upper,
                        bit_count,
                        joined.prefix_len(),
                    ))
                }
                _ => AnyDivision::Large(joined),
            };
            divisions.push(division);
        }
        Ok(DivisionGrouping::new(divisions))
    }

    /// Returns the number of consecutive leading one or zero bits of the lowest value.
    pub fn leading_bit_count(&self, ones: bool) -> BitCount {
        let mut count = 0;
        for segment in self.segments() {
            let segment_count = segment.leading_bit_count(ones);
            count += segment_count;
            if segment_count < segment.bit_count() {
                break;
            }
        }
        count
    }

    /// Returns the number of consecutive trailing one or zero bits of the lowest value.
    pub fn trailing_bit_count(&self, ones: bool) -> BitCount {
        let mut count = 0;
        for segment in self.segments().iter().rev() {
            let segment_count = segment.trailing_bit_count(ones);
            count += segment_count;
            if segment_count < segment.bit_count() {
                break;
            }
        }
        count
    }

    /// Returns whether bit `n` of the lowest value is set, counting from the least significant
    /// bit.
    pub fn test_bit(&self, n: BitCount) -> bool {
        if n >= self.bit_count() {
            return false;
        }
        let bit_count = self.bits_per_segment();
        let index = self.segment_count() - 1 - (n / bit_count) as usize;
        self.segments()[index].test_bit(n % bit_count)
    }
}

/// MAC sorts before IPv4, which sorts before IPv6.
fn family_rank(family: AddressFamily) -> u8 {
    match family {
        AddressFamily::Mac => 0,
        AddressFamily::Ipv4 => 1,
        AddressFamily::Ipv6 => 2,
    }
}

fn check_segments(family: AddressFamily, segments: &[Segment]) -> Result<(), AddressValueError> {
    if segments.len() > family.max_segment_count() {
        return Err(AddressValueError::TooManySegments {
            family,
            max: family.max_segment_count(),
            actual: segments.len(),
        });
    }
    match segments.iter().find(|segment| segment.family() != family) {
        Some(segment) => Err(AddressValueError::MismatchedFamily {
            expected: family,
            actual: segment.family(),
        }),
        None => Ok(()),
    }
}

impl Deref for Section {
    type Target = DivisionGrouping<Segment>;

    fn deref(&self) -> &Self::Target {
        &self.grouping
    }
}

impl<'a> IntoIterator for &'a Section {
    type Item = Section;
    type IntoIter = SectionIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
