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

//! Full-length addresses with their family metadata.

use std::{
    cmp::Ordering,
    fmt::{Display, Formatter},
    net::{IpAddr, Ipv4Addr, Ipv6Addr},
    ops::Deref,
    sync::Arc,
};

use ipnet::IpNet;
use num_bigint::BigInt;
use num_traits::One;

use crate::{
    creator::{AddressCreator, Ipv4Creator, Ipv6Creator},
    error::{AddressError, AddressValueError},
    family::{AddressFamily, BitCount, PrefixLen},
    section::{Section, SectionIter},
};

/// The zone of a scoped IPv6 address, such as an interface name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Zone(Arc<str>);

impl Zone {
    /// Returns the zone as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Zone {
    fn from(zone: &str) -> Self {
        Self(zone.into())
    }
}

impl From<String> for Zone {
    fn from(zone: String) -> Self {
        Self(zone.into())
    }
}

impl Display for Zone {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// An address: a section holding every segment of its family.
///
/// Section queries are available through [`Deref`]. Transformations return addresses of the
/// same family and keep the zone.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Address {
    section: Section,
    zone: Option<Zone>,
}

impl Address {
    pub(crate) fn from_full_section(section: Section) -> Self {
        Self {
            section,
            zone: None,
        }
    }

    fn derive(&self, section: Section) -> Self {
        Self {
            section,
            zone: self.zone.clone(),
        }
    }

    /// Returns the family of the address.
    pub fn family(&self) -> AddressFamily {
        self.section.family()
    }

    /// Returns the section holding the segments.
    pub fn section(&self) -> &Section {
        &self.section
    }

    /// Returns the zone, if any.
    pub fn zone(&self) -> Option<&Zone> {
        self.zone.as_ref()
    }

    /// Returns the address with the given zone.
    ///
    /// Only IPv6 addresses carry a zone.
    pub fn with_zone(&self, zone: impl Into<Zone>) -> Result<Self, AddressValueError> {
        if self.family() != AddressFamily::Ipv6 {
            return Err(AddressValueError::MismatchedFamily {
                expected: AddressFamily::Ipv6,
                actual: self.family(),
            });
        }
        Ok(Self {
            section: self.section.clone(),
            zone: Some(zone.into()),
        })
    }

    /// Returns the address without a zone.
    pub fn without_zone(&self) -> Self {
        Self {
            section: self.section.clone(),
            zone: None,
        }
    }

    /// Returns whether this is an extended (EUI-64) MAC address.
    pub fn is_extended(&self) -> bool {
        self.family() == AddressFamily::Mac
            && self.segment_count() == AddressFamily::EUI64_SEGMENT_COUNT
    }

    /// See [`Section::increment`].
    pub fn increment(&self, n: i64) -> Option<Self> {
        self.section.increment(n).map(|section| self.derive(section))
    }

    /// See [`Section::increment_big`].
    pub fn increment_big(&self, n: &BigInt) -> Option<Self> {
        self.section
            .increment_big(n)
            .map(|section| self.derive(section))
    }

    /// See [`Section::increment_boundary`].
    pub fn increment_boundary(&self, n: i64) -> Option<Self> {
        self.section
            .increment_boundary(n)
            .map(|section| self.derive(section))
    }

    /// See [`Section::enumerate`].
    pub fn enumerate(&self, other: &Address) -> Option<BigInt> {
        self.section.enumerate(&other.section)
    }

    /// Returns the address holding only the lowest value.
    pub fn lower(&self) -> Self {
        self.derive(self.section.lower())
    }

    /// Returns the address holding only the highest value.
    pub fn upper(&self) -> Self {
        self.derive(self.section.upper())
    }

    /// See [`Section::to_prefix_block`].
    pub fn to_prefix_block(&self) -> Self {
        self.derive(self.section.to_prefix_block())
    }

    /// See [`Section::to_prefix_block_len`].
    pub fn to_prefix_block_len(&self, prefix_len: BitCount) -> Self {
        self.derive(self.section.to_prefix_block_len(prefix_len))
    }

    /// See [`Section::set_prefix_len`].
    pub fn set_prefix_len(&self, prefix_len: BitCount) -> Self {
        self.derive(self.section.set_prefix_len(prefix_len))
    }

    /// See [`Section::without_prefix_len`].
    pub fn without_prefix_len(&self) -> Self {
        self.derive(self.section.without_prefix_len())
    }

    /// See [`Section::mask`].
    pub fn mask(&self, mask: &Address) -> Result<Self, AddressError> {
        Ok(self.derive(self.section.mask(&mask.section)?))
    }

    /// Returns whether every value is a loopback address: 127.0.0.0/8 for IPv4 and ::1 for
    /// IPv6.
    pub fn is_loopback(&self) -> bool {
        match self.family() {
            AddressFamily::Ipv4 => self
                .segment(0)
                .is_some_and(|segment| segment.matches(127)),
            AddressFamily::Ipv6 => !self.is_multiple() && self.value().is_one(),
            AddressFamily::Mac => false,
        }
    }

    /// Orders addresses as [`Section::compare`] does, then by zone with unzoned addresses
    /// first.
    pub fn compare(&self, other: &Address) -> Ordering {
        self.section
            .compare(&other.section)
            .then_with(|| self.zone.cmp(&other.zone))
    }

    /// Orders addresses by the number of values they hold.
    pub fn compare_size(&self, other: &Address) -> Ordering {
        self.section.compare_size(&other.section)
    }

    /// Returns an iterator over every single value of this address, in ascending order.
    pub fn iter(&self) -> AddressIter {
        AddressIter {
            sections: self.section.iter(),
            zone: self.zone.clone(),
        }
    }

    /// Returns the standard library address, if this is a single IP address.
    pub fn to_ip_addr(&self) -> Option<IpAddr> {
        if self.is_multiple() {
            return None;
        }
        let bytes = self.bytes();
        match self.family() {
            AddressFamily::Ipv4 => {
                <[u8; 4]>::try_from(bytes.as_slice())
                    .ok()
                    .map(|bytes| IpAddr::V4(Ipv4Addr::from(bytes)))
            }
            AddressFamily::Ipv6 => {
                <[u8; 16]>::try_from(bytes.as_slice())
                    .ok()
                    .map(|bytes| IpAddr::V6(Ipv6Addr::from(bytes)))
            }
            AddressFamily::Mac => None,
        }
    }

    /// Returns the network of this address, if it is a single IP address or a single CIDR
    /// prefix block.
    ///
    /// A single address keeps its host bits and uses its prefix length, or the full length
    /// without one.
    pub fn to_ip_net(&self) -> Option<IpNet> {
        let prefix_len = if self.is_multiple() {
            self.prefix_len_for_single_block()?
        } else {
            self.prefix_len()
                .unwrap_or(PrefixLen::new(self.bit_count()))
        };
        let address = self.lower().to_ip_addr()?;
        IpNet::new(address, u8::try_from(prefix_len.bits()).ok()?).ok()
    }
}

impl Deref for Address {
    type Target = Section;

    fn deref(&self) -> &Self::Target {
        &self.section
    }
}

impl From<Ipv4Addr> for Address {
    fn from(address: Ipv4Addr) -> Self {
        Self::from_full_section(
            Ipv4Creator.create_section_from_u128(u128::from(address.to_bits()), None),
        )
    }
}

impl From<Ipv6Addr> for Address {
    fn from(address: Ipv6Addr) -> Self {
        Self::from_full_section(Ipv6Creator.create_section_from_u128(address.to_bits(), None))
    }
}

impl From<IpAddr> for Address {
    fn from(address: IpAddr) -> Self {
        match address {
            IpAddr::V4(address) => address.into(),
            IpAddr::V6(address) => address.into(),
        }
    }
}

impl From<IpNet> for Address {
    /// Converts the network into its prefix block.
    fn from(network: IpNet) -> Self {
        Address::from(network.addr()).to_prefix_block_len(network.prefix_len().into())
    }
}

impl<'a> IntoIterator for &'a Address {
    type Item = Address;
    type IntoIter = AddressIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the single values of an [`Address`].
#[derive(Clone, Debug)]
pub struct AddressIter {
    sections: SectionIter,
    zone: Option<Zone>,
}

impl Iterator for AddressIter {
    type Item = Address;

    fn next(&mut self) -> Option<Self::Item> {
        let section = self.sections.next()?;
        Some(Address {
            section,
            zone: self.zone.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use num_bigint::BigUint;

    use super::*;
    use crate::{
        creator::{Eui64Creator, MacCreator},
        error::IncompatibleRangeError,
    };

    fn ipv4(address: &str) -> Address {
        Address::from(Ipv4Addr::from_str(address).unwrap())
    }

    fn net(network: &str) -> Address {
        Address::from(IpNet::from_str(network).unwrap())
    }

    mod conversions {
        use super::*;

        #[test]
        fn std_round_trip() {
            let address = ipv4("192.168.1.20");
            assert_eq!(address.family(), AddressFamily::Ipv4);
            assert_eq!(address.segment(0).map(|s| s.value()), Some(192));
            assert_eq!(address.to_ip_addr(), Some("192.168.1.20".parse().unwrap()));
            let v6: IpAddr = "2001:db8::1".parse().unwrap();
            assert_eq!(Address::from(v6).to_ip_addr(), Some(v6));
        }

        #[test]
        fn networks_become_prefix_blocks() {
            let block = net("10.16.0.0/12");
            assert!(block.is_single_prefix_block());
            assert_eq!(block.prefix_len(), Some(PrefixLen::new(12)));
            assert_eq!(block.upper().to_ip_addr(), Some("10.31.255.255".parse().unwrap()));
            assert_eq!(block.to_ip_addr(), None);
            assert_eq!(block.to_ip_net(), Some("10.16.0.0/12".parse().unwrap()));
        }

        #[test]
        fn single_address_network() {
            assert_eq!(
                ipv4("10.1.2.3").to_ip_net(),
                Some("10.1.2.3/32".parse().unwrap())
            );
            assert_eq!(
                ipv4("10.1.2.3").set_prefix_len(8).to_ip_net(),
                Some("10.1.2.3/8".parse().unwrap())
            );
        }

        #[test]
        fn non_block_range_has_no_network() {
            let section = Ipv4Creator
                .create_section_from_values(&[10, 0, 0, 4], &[10, 0, 0, 11], None)
                .unwrap();
            let address = Ipv4Creator.create_address(section).unwrap();
            assert_eq!(address.to_ip_net(), None);
            assert_eq!(address.lower().to_ip_net(), Some("10.0.0.4/32".parse().unwrap()));
        }

        #[test]
        fn mac_has_no_ip_form() {
            let mac = MacCreator
                .create_address(MacCreator.create_section_from_u128(0x0102_0304_0506, None))
                .unwrap();
            assert_eq!(mac.to_ip_addr(), None);
            assert_eq!(mac.to_ip_net(), None);
        }
    }

    mod zones {
        use super::*;

        #[test]
        fn only_ipv6_has_zones() {
            let address = Address::from(Ipv6Addr::LOCALHOST)
                .with_zone("eth0")
                .unwrap();
            assert_eq!(address.zone().map(Zone::as_str), Some("eth0"));
            assert_eq!(address.without_zone().zone(), None);
            assert_eq!(
                ipv4("1.2.3.4").with_zone("eth0"),
                Err(AddressValueError::MismatchedFamily {
                    expected: AddressFamily::Ipv6,
                    actual: AddressFamily::Ipv4
                })
            );
        }

        #[test]
        fn transformations_keep_the_zone() {
            let address = Address::from(Ipv6Addr::LOCALHOST)
                .with_zone(String::from("lo"))
                .unwrap();
            let lo = Zone::from("lo");
            let zone = Some(&lo);
            assert_eq!(address.increment(1).unwrap().zone(), zone);
            assert_eq!(address.set_prefix_len(64).to_prefix_block().zone(), zone);
            assert_eq!(address.iter().next().unwrap().zone(), zone);
            assert_ne!(address, address.without_zone());
        }
    }

    mod arithmetic {
        use super::*;

        #[test]
        fn increment_and_enumerate() {
            let block = net("192.168.0.0/30");
            let third = block.increment(2).unwrap();
            assert_eq!(third.to_ip_addr(), Some("192.168.0.2".parse().unwrap()));
            assert_eq!(block.enumerate(&third), Some(BigInt::from(2)));
            assert_eq!(
                block.increment_boundary(1).unwrap().to_ip_addr(),
                Some("192.168.0.4".parse().unwrap())
            );
            assert_eq!(ipv4("0.0.0.3").increment(-5), None);
        }

        #[test]
        fn iterates_values() {
            let values: Vec<_> = net("10.0.0.0/31")
                .iter()
                .filter_map(|address| address.to_ip_addr())
                .collect();
            assert_eq!(
                values,
                vec![
                    "10.0.0.0".parse::<IpAddr>().unwrap(),
                    "10.0.0.1".parse().unwrap()
                ]
            );
        }

        #[test]
        fn mask_keeps_family() {
            let masked = ipv4("10.1.2.3").mask(&ipv4("255.255.0.0")).unwrap();
            assert_eq!(masked.to_ip_addr(), Some("10.1.0.0".parse().unwrap()));
            let range = net("10.0.0.0/29").without_prefix_len();
            assert_eq!(
                range.mask(&ipv4("255.255.255.5")),
                Err(AddressError::IncompatibleRange(
                    IncompatibleRangeError::MaskedRange {
                        lower: 0,
                        upper: 7,
                        mask: 5
                    }
                ))
            );
            let eui = Eui64Creator
                .create_address(Eui64Creator.create_section_from_u128(1, None))
                .unwrap();
            assert!(matches!(
                ipv4("10.1.2.3").mask(&eui),
                Err(AddressError::Value(AddressValueError::MismatchedFamily { .. }))
            ));
        }
    }

    mod ordering {
        use super::*;

        #[test]
        fn compares_family_size_then_values() {
            assert_eq!(ipv4("10.0.0.1").compare(&ipv4("10.0.0.2")), Ordering::Less);
            assert_eq!(ipv4("10.0.0.2").compare(&ipv4("10.0.0.1")), Ordering::Greater);
            let ipv6 = Address::from(Ipv6Addr::UNSPECIFIED);
            assert_eq!(ipv4("255.255.255.255").compare(&ipv6), Ordering::Less);
            // A single address sorts before any range.
            assert_eq!(net("10.0.0.0/31").compare(&ipv4("99.0.0.0")), Ordering::Greater);
            assert_eq!(net("10.0.0.0/31").compare_size(&net("99.0.0.0/30")), Ordering::Less);
            assert_eq!(ipv4("1.1.1.1").compare_size(&ipv4("2.2.2.2")), Ordering::Equal);
        }

        #[test]
        fn ignores_prefix_length_but_not_zone() {
            let address = ipv4("10.1.2.3");
            assert_eq!(address.compare(&address.set_prefix_len(8)), Ordering::Equal);
            let unzoned = Address::from(Ipv6Addr::LOCALHOST);
            let zoned = unzoned.with_zone("eth0").unwrap();
            assert_eq!(unzoned.compare(&zoned), Ordering::Less);
            assert_eq!(zoned.compare(&unzoned.with_zone("eth1").unwrap()), Ordering::Less);
        }
    }

    #[test]
    fn mask_rejects_short_wrapping_range() {
        let segments = [10, 0, 0]
            .into_iter()
            .map(|value| Ipv4Creator.create_segment(value, None))
            .chain([Ipv4Creator.create_range_segment(3, 4, None)])
            .collect();
        let range = Ipv4Creator
            .create_address(Ipv4Creator.create_section(segments).unwrap())
            .unwrap();
        assert!(range.mask(&ipv4("255.255.255.3")).is_err());
        assert_eq!(
            range.mask(&ipv4("255.255.255.7")).unwrap().count(),
            BigUint::from(2u32)
        );
    }

    #[test]
    fn loopback() {
        assert!(ipv4("127.0.0.1").is_loopback());
        assert!(net("127.0.0.0/8").is_loopback());
        assert!(!ipv4("128.0.0.1").is_loopback());
        assert!(Address::from(Ipv6Addr::LOCALHOST).is_loopback());
        assert!(!Address::from(Ipv6Addr::UNSPECIFIED).is_loopback());
    }
}
