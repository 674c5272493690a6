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

//! Iteration over the values, prefixes and sequential blocks of a section.

use std::iter::FusedIterator;

use super::Section;
use crate::{family::BitCount, grouping::DivisionGrouping};

/// Iterator over the sections obtained by iterating the leading segments of a section, in
/// ascending order.
///
/// The last iterated segment either steps value by value or, for prefix iteration, one
/// prefix of that segment at a time.
#[derive(Clone, Debug)]
pub struct SectionIter {
    section: Section,
    iterated: usize,
    host_bits: BitCount,
    blocks: bool,
    next: Option<Vec<u64>>,
}

impl SectionIter {
    pub(super) fn new(section: Section, iterated: usize) -> Self {
        let iterated = iterated.min(section.segment_count());
        Self::with_boundary(section, iterated, 0, false)
    }

    /// Iterates the distinct prefixes under the prefix length of `section`, yielding either
    /// the values of `section` sharing each prefix or the full prefix blocks.
    pub(super) fn prefixes(section: Section, blocks: bool) -> Self {
        let Some(prefix_len) = section.prefix_len() else {
            return Self::new(section, usize::MAX);
        };
        let bit_count = section.bits_per_segment();
        let iterated = prefix_len.bits().div_ceil(bit_count) as usize;
        let host_bits = iterated as BitCount * bit_count - prefix_len.bits();
        Self::with_boundary(section, iterated, host_bits, blocks)
    }

    fn with_boundary(section: Section, iterated: usize, host_bits: BitCount, blocks: bool) -> Self {
        let mut iter = Self {
            section,
            iterated,
            host_bits,
            blocks,
            next: None,
        };
        iter.next = Some((0..iterated).map(|index| iter.digit_bounds(index).0).collect());
        iter
    }

    /// Returns the first and last digit of the iterated segment at `index`.
    fn digit_bounds(&self, index: usize) -> (u64, u64) {
        let segment = &self.section.segments()[index];
        let shift = if index + 1 == self.iterated {
            self.host_bits
        } else {
            0
        };
        (segment.value() >> shift, segment.upper_value() >> shift)
    }

    fn current(&self, digits: &[u64]) -> Section {
        let segments = self
            .section
            .segments()
            .iter()
            .enumerate()
            .map(|(index, segment)| {
                let prefix_len = segment.prefix_len();
                match digits.get(index) {
                    Some(&digit) if index + 1 == self.iterated && self.host_bits > 0 => {
                        let host = segment.host_mask(segment.bit_count() - self.host_bits);
                        let lower = digit << self.host_bits;
                        if self.blocks {
                            segment.derive_new(lower, lower | host, prefix_len)
                        } else {
                            segment.derive_new(
                                lower.max(segment.value()),
                                (lower | host).min(segment.upper_value()),
                                prefix_len,
                            )
                        }
                    }
                    Some(&digit) => segment.derive_new(digit, digit, prefix_len),
                    None if self.blocks => segment.derive_new(0, segment.max_value(), prefix_len),
                    None => *segment,
                }
            })
            .collect::<Vec<_>>();
        Section {
            family: self.section.family(),
            grouping: DivisionGrouping::from_normalized(segments.into()),
        }
    }
}

impl Iterator for SectionIter {
    type Item = Section;

    fn next(&mut self) -> Option<Self::Item> {
        let mut digits = self.next.take()?;
        let item = self.current(&digits);
        // Odometer step: the last iterated segment moves fastest.
        for index in (0..self.iterated).rev() {
            let (first, last) = self.digit_bounds(index);
            if digits[index] < last {
                digits[index] += 1;
                self.next = Some(digits);
                break;
            }
            digits[index] = first;
        }
        Some(item)
    }
}

impl FusedIterator for SectionIter {}
