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

//! Process-wide tables of network masks, host masks and loopback addresses.

use std::sync::LazyLock;

use crate::{
    address::Address,
    creator::{AddressCreator, Ipv4Creator, Ipv6Creator, MacCreator},
    family::{AddressFamily, BitCount},
    increment::max_u128,
};

struct MaskTable {
    network: Vec<Address>,
    host: Vec<Address>,
}

impl MaskTable {
    fn build(creator: &impl AddressCreator) -> Self {
        let bit_count = creator.family().bits_per_segment() * creator.segment_count() as BitCount;
        tracing::debug!(family = %creator.family(), bit_count, "building mask tables");
        let all = max_u128(bit_count);
        let mask = |value: u128| {
            Address::from_full_section(creator.create_section_from_u128(value, None))
        };
        let host: Vec<_> = (0..=bit_count)
            .map(|prefix_len| mask(max_u128(bit_count - prefix_len)))
            .collect();
        let network = (0..=bit_count)
            .map(|prefix_len| mask(all ^ max_u128(bit_count - prefix_len)))
            .collect();
        Self { network, host }
    }
}

static IPV4_MASKS: LazyLock<MaskTable> = LazyLock::new(|| MaskTable::build(&Ipv4Creator));
static IPV6_MASKS: LazyLock<MaskTable> = LazyLock::new(|| MaskTable::build(&Ipv6Creator));
static MAC_MASKS: LazyLock<MaskTable> = LazyLock::new(|| MaskTable::build(&MacCreator));

static IPV4_LOOPBACK: LazyLock<Address> =
    LazyLock::new(|| Address::from(std::net::Ipv4Addr::LOCALHOST));
static IPV6_LOOPBACK: LazyLock<Address> =
    LazyLock::new(|| Address::from(std::net::Ipv6Addr::LOCALHOST));

fn masks(family: AddressFamily) -> &'static MaskTable {
    match family {
        AddressFamily::Ipv4 => &*IPV4_MASKS,
        AddressFamily::Ipv6 => &*IPV6_MASKS,
        AddressFamily::Mac => &*MAC_MASKS,
    }
}

/// Returns the address whose first `prefix_len` bits are set, if the prefix length fits the
/// family.
///
/// MAC masks cover the standard 48-bit length.
pub fn network_mask(family: AddressFamily, prefix_len: BitCount) -> Option<&'static Address> {
    masks(family).network.get(prefix_len as usize)
}

/// Returns the address whose bits following the first `prefix_len` are set, if the prefix
/// length fits the family.
pub fn host_mask(family: AddressFamily, prefix_len: BitCount) -> Option<&'static Address> {
    masks(family).host.get(prefix_len as usize)
}

/// Returns the loopback address of an IP family.
pub fn loopback(family: AddressFamily) -> Option<&'static Address> {
    match family {
        AddressFamily::Ipv4 => Some(&*IPV4_LOOPBACK),
        AddressFamily::Ipv6 => Some(&*IPV6_LOOPBACK),
        AddressFamily::Mac => None,
    }
}
