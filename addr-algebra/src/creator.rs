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

//! Family-specific construction of segments, sections and addresses.

use crate::{
    address::{Address, Zone},
    division::{Segment, SegmentOrigin},
    error::AddressValueError,
    family::{AddressFamily, PrefixLen},
    section::Section,
};

/// Creates the values of one address family.
///
/// Values beyond the segment width are masked. Implementors only provide the family and the
/// segment count of a full address.
pub trait AddressCreator {
    /// Returns the family of the created values.
    fn family(&self) -> AddressFamily;

    /// Returns the number of segments of a full address.
    fn segment_count(&self) -> usize;

    /// Creates a single-valued segment.
    fn create_segment(&self, value: u64, prefix_len: Option<PrefixLen>) -> Segment {
        Segment::new(self.family(), value, value, prefix_len)
    }

    /// Creates a segment spanning `lower..=upper`, in either order.
    fn create_range_segment(
        &self,
        lower: u64,
        upper: u64,
        prefix_len: Option<PrefixLen>,
    ) -> Segment {
        Segment::new(self.family(), lower, upper, prefix_len)
    }

    /// Creates a segment annotated with where it was found in its source text.
    fn create_segment_with_origin(
        &self,
        lower: u64,
        upper: u64,
        prefix_len: Option<PrefixLen>,
        origin: SegmentOrigin,
    ) -> Segment {
        self.create_range_segment(lower, upper, prefix_len)
            .with_origin(origin)
    }

    /// Creates a section from segments, keeping their prefix lengths.
    fn create_section(&self, segments: Vec<Segment>) -> Result<Section, AddressValueError> {
        Section::new(self.family(), segments)
    }

    /// Creates a section from segments with the given section prefix length.
    fn create_prefixed_section(
        &self,
        segments: Vec<Segment>,
        prefix_len: Option<PrefixLen>,
    ) -> Result<Section, AddressValueError> {
        Section::with_section_prefix_len(self.family(), segments, prefix_len)
    }

    /// Creates a section from the lower and upper values of each segment.
    fn create_section_from_values(
        &self,
        lower: &[u64],
        upper: &[u64],
        prefix_len: Option<PrefixLen>,
    ) -> Result<Section, AddressValueError> {
        if lower.len() != upper.len() {
            return Err(AddressValueError::MismatchedLength {
                expected: lower.len(),
                actual: upper.len(),
            });
        }
        let segments = lower
            .iter()
            .zip(upper)
            .map(|(&lower, &upper)| self.create_range_segment(lower, upper, None))
            .collect();
        self.create_prefixed_section(segments, prefix_len)
    }

    /// Creates a full-length section from big-endian bytes.
    ///
    /// Shorter input is zero-extended at the front, longer input is accepted as long as the
    /// extra leading bytes are zero.
    fn create_section_from_bytes(
        &self,
        bytes: &[u8],
        prefix_len: Option<PrefixLen>,
    ) -> Result<Section, AddressValueError> {
        let family = self.family();
        let bytes_per_segment = family.bytes_per_segment();
        let expected = self.segment_count() * bytes_per_segment;
        let bytes = if bytes.len() > expected {
            let (extra, bytes) = bytes.split_at(bytes.len() - expected);
            if extra.iter().any(|&byte| byte != 0) {
                return Err(AddressValueError::TooManySegments {
                    family,
                    max: self.segment_count(),
                    actual: self.segment_count() + extra.len().div_ceil(bytes_per_segment),
                });
            }
            bytes.to_vec()
        } else {
            let mut padded = vec![0; expected - bytes.len()];
            padded.extend_from_slice(bytes);
            padded
        };
        let segments = bytes
            .chunks(bytes_per_segment)
            .map(|chunk| {
                let value = chunk
                    .iter()
                    .fold(0, |value, &byte| (value << 8) | u64::from(byte));
                self.create_segment(value, None)
            })
            .collect();
        self.create_prefixed_section(segments, prefix_len)
    }

    /// Creates a full-length section from the low bits of `value`.
    fn create_section_from_u128(&self, value: u128, prefix_len: Option<PrefixLen>) -> Section {
        let family = self.family();
        let bit_count = family.bits_per_segment();
        let count = self.segment_count();
        let segments = (0..count)
            .map(|index| {
                let shift = bit_count * (count - 1 - index) as u32;
                let shifted = value.checked_shr(shift).unwrap_or(0);
                // Masked to the segment width.
                let value = (shifted & u128::from(family.max_segment_value())) as u64;
                self.create_segment(value, None)
            })
            .collect();
        Section::from_parts(family, segments, prefix_len)
    }

    /// Creates an address from a full-length section of this family.
    fn create_address(&self, section: Section) -> Result<Address, AddressValueError> {
        if section.family() != self.family() {
            return Err(AddressValueError::MismatchedFamily {
                expected: self.family(),
                actual: section.family(),
            });
        }
        if section.segment_count() != self.segment_count() {
            return Err(AddressValueError::WrongSegmentCount {
                family: self.family(),
                expected: self.segment_count(),
                actual: section.segment_count(),
            });
        }
        Ok(Address::from_full_section(section))
    }
}

/// Creates IPv4 values.
#[derive(Copy, Clone, Debug, Default)]
pub struct Ipv4Creator;

impl AddressCreator for Ipv4Creator {
    fn family(&self) -> AddressFamily {
        AddressFamily::Ipv4
    }

    fn segment_count(&self) -> usize {
        AddressFamily::Ipv4.max_segment_count()
    }
}

/// Creates IPv6 values.
#[derive(Copy, Clone, Debug, Default)]
pub struct Ipv6Creator;

impl Ipv6Creator {
    /// Creates an address with a zone from a full-length section.
    pub fn create_zoned_address(
        &self,
        section: Section,
        zone: impl Into<Zone>,
    ) -> Result<Address, AddressValueError> {
        self.create_address(section)?.with_zone(zone)
    }
}

impl AddressCreator for Ipv6Creator {
    fn family(&self) -> AddressFamily {
        AddressFamily::Ipv6
    }

    fn segment_count(&self) -> usize {
        AddressFamily::Ipv6.max_segment_count()
    }
}

/// Creates standard 48-bit MAC values.
#[derive(Copy, Clone, Debug, Default)]
pub struct MacCreator;

impl AddressCreator for MacCreator {
    fn family(&self) -> AddressFamily {
        AddressFamily::Mac
    }

    fn segment_count(&self) -> usize {
        AddressFamily::MAC_SEGMENT_COUNT
    }
}

/// Creates extended 64-bit MAC values.
#[derive(Copy, Clone, Debug, Default)]
pub struct Eui64Creator;

impl AddressCreator for Eui64Creator {
    fn family(&self) -> AddressFamily {
        AddressFamily::Mac
    }

    fn segment_count(&self) -> usize {
        AddressFamily::EUI64_SEGMENT_COUNT
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::param_test;

    fn values(section: &Section) -> Vec<u64> {
        section.segments().iter().map(|s| s.value()).collect()
    }

    mod segments {
        use super::*;

        #[test]
        fn values_are_masked() {
            assert_eq!(Ipv4Creator.create_segment(0x1ff, None).value(), 0xff);
            assert_eq!(Ipv6Creator.create_segment(0x1ffff, None).value(), 0xffff);
        }

        #[test]
        fn ranges_are_ordered() {
            let segment = MacCreator.create_range_segment(9, 3, Some(PrefixLen::new(4)));
            assert_eq!((segment.value(), segment.upper_value()), (3, 9));
            assert_eq!(segment.prefix_len(), Some(PrefixLen::new(4)));
        }

        #[test]
        fn origin_is_kept() {
            let origin = SegmentOrigin::new(4, 7);
            let segment = Ipv4Creator.create_segment_with_origin(1, 1, None, origin);
            assert_eq!(segment.origin(), Some(origin));
        }
    }

    mod sections {
        use num_bigint::BigUint;

        use super::*;

        #[test]
        fn from_values() {
            let section = Ipv4Creator
                .create_section_from_values(
                    &[10, 1, 0, 0],
                    &[10, 2, 0, 255],
                    Some(PrefixLen::new(24)),
                )
                .unwrap();
            assert_eq!(section.count(), BigUint::from(512u32));
            assert_eq!(section.prefix_len(), Some(PrefixLen::new(24)));
            assert_eq!(
                Ipv4Creator.create_section_from_values(&[1, 2], &[1], None),
                Err(AddressValueError::MismatchedLength {
                    expected: 2,
                    actual: 1
                })
            );
        }

        #[test]
        fn from_too_many_values() {
            assert_eq!(
                MacCreator.create_section_from_values(&[0; 9], &[0; 9], None),
                Err(AddressValueError::TooManySegments {
                    family: AddressFamily::Mac,
                    max: 8,
                    actual: 9
                })
            );
        }

        param_test! {
            from_bytes -> Result<(), AddressValueError>: [
                exact: (&[192, 168, 1, 2], vec![192, 168, 1, 2]),
                short: (&[1, 2], vec![0, 0, 1, 2]),
                leading_zeros: (&[0, 0, 10, 0, 0, 1], vec![10, 0, 0, 1]),
                empty: (&[], vec![0, 0, 0, 0]),
            ]
        }
        fn from_bytes(bytes: &[u8], expected: Vec<u64>) -> Result<(), AddressValueError> {
            let section = Ipv4Creator.create_section_from_bytes(bytes, None)?;
            assert_eq!(values(&section), expected);
            Ok(())
        }

        #[test]
        fn from_bytes_with_extra_value() {
            assert_eq!(
                Ipv4Creator.create_section_from_bytes(&[1, 0, 0, 0, 1], None),
                Err(AddressValueError::TooManySegments {
                    family: AddressFamily::Ipv4,
                    max: 4,
                    actual: 5
                })
            );
        }

        #[test]
        fn ipv6_from_bytes_pairs_bytes() {
            let mut bytes = [0u8; 16];
            bytes[14] = 0x12;
            bytes[15] = 0x34;
            let section = Ipv6Creator.create_section_from_bytes(&bytes, None).unwrap();
            assert_eq!(section.segment(7).map(|s| s.value()), Some(0x1234));
            assert_eq!(section.bytes(), bytes.to_vec());
        }

        #[test]
        fn from_u128() {
            let section =
                Ipv4Creator.create_section_from_u128(0x0a00_0001, Some(PrefixLen::new(8)));
            assert_eq!(values(&section), vec![10, 0, 0, 1]);
            assert_eq!(section.prefix_len(), Some(PrefixLen::new(8)));
            let mac = MacCreator.create_section_from_u128(0xffff_0102_0304_0506, None);
            assert_eq!(values(&mac), vec![1, 2, 3, 4, 5, 6]);
            let eui = Eui64Creator.create_section_from_u128(u128::MAX, None);
            assert_eq!(eui.segment_count(), 8);
            assert!(eui.is_max());
        }
    }

    mod addresses {
        use super::*;

        #[test]
        fn requires_full_length() {
            let section = Ipv4Creator
                .create_section(vec![Ipv4Creator.create_segment(1, None)])
                .unwrap();
            assert_eq!(
                Ipv4Creator.create_address(section),
                Err(AddressValueError::WrongSegmentCount {
                    family: AddressFamily::Ipv4,
                    expected: 4,
                    actual: 1
                })
            );
        }

        #[test]
        fn requires_matching_family() {
            let section = MacCreator.create_section_from_u128(1, None);
            assert_eq!(
                Ipv6Creator.create_address(section),
                Err(AddressValueError::MismatchedFamily {
                    expected: AddressFamily::Ipv6,
                    actual: AddressFamily::Mac
                })
            );
        }

        #[test]
        fn mac_and_eui64_lengths() {
            let mac = MacCreator
                .create_address(MacCreator.create_section_from_u128(1, None))
                .unwrap();
            assert!(!mac.is_extended());
            let eui = Eui64Creator
                .create_address(Eui64Creator.create_section_from_u128(1, None))
                .unwrap();
            assert!(eui.is_extended());
            assert!(MacCreator.create_address(eui.section().clone()).is_err());
        }

        #[test]
        fn zoned_ipv6() {
            let section = Ipv6Creator.create_section_from_u128(1, None);
            let address = Ipv6Creator.create_zoned_address(section, "eth0").unwrap();
            assert_eq!(address.zone().map(Zone::as_str), Some("eth0"));
        }
    }
}
