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

//! Value and range algebra for IPv4, IPv6 and MAC addresses
//!
//! Every value in this crate is a *range*: each [division][division] holds a contiguous
//! range of integers, and a [grouping][grouping] of divisions holds the cartesian product of
//! its division ranges. A single address is the degenerate case where every range holds one
//! value. Groupings may carry a prefix length splitting their bits into a network and a host
//! part.
//!
//! The crate provides:
//!
//! - [divisions][division] of native width or of arbitrary width backed by [`num_bigint`];
//! - [groupings][grouping] with counting, prefix-block and sequential-block queries;
//! - [sections][section] of one address family with prefix, mask and reversal transformations;
//! - [ordinal arithmetic][Section::increment] to increment and enumerate within a section;
//! - [creators][creator] building family-specific values;
//! - [addresses][address] with conversions to and from [`std::net`] and [`ipnet`]; and
//! - [lazily built tables][network] of network masks, host masks and loopback addresses.
//!
//! All values are immutable. Transformations return new values and share unchanged
//! divisions. This crate does not parse or format address text.

pub mod address;
pub mod creator;
pub mod division;
pub mod error;
pub mod family;
pub mod grouping;
pub mod network;
pub mod section;

mod increment;

#[cfg(test)]
pub(crate) mod test_utils;

pub use address::{Address, Zone};
pub use creator::{AddressCreator, Eui64Creator, Ipv4Creator, Ipv6Creator, MacCreator};
pub use division::{AnyDivision, Division, DivisionValue, LargeDivision, Segment, SegmentOrigin};
pub use error::{AddressError, AddressValueError, IncompatibleRangeError};
pub use family::{AddressFamily, BitCount, PrefixLen};
pub use grouping::DivisionGrouping;
pub use section::Section;
