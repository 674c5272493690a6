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

//! Errors reported by address construction and range transformations.

use thiserror::Error;

use crate::family::{AddressFamily, BitCount};

/// Malformed input to the construction of a division, grouping or address.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressValueError {
    /// More segments than the family allows.
    #[error("{family} address cannot have more than {max} segments, got {actual}")]
    TooManySegments {
        /// The family the segments were created for.
        family: AddressFamily,
        /// The maximum segment count of the family.
        max: usize,
        /// The number of segments provided.
        actual: usize,
    },
    /// A full address requires an exact number of segments.
    #[error("{family} address requires {expected} segments, got {actual}")]
    WrongSegmentCount {
        /// The family of the address.
        family: AddressFamily,
        /// The required segment count.
        expected: usize,
        /// The number of segments provided.
        actual: usize,
    },
    /// A bit count exceeds what the division kind can store.
    #[error("bit count {bit_count} exceeds the maximum of {max}")]
    BitCountTooLarge {
        /// The requested bit count.
        bit_count: BitCount,
        /// The maximum supported bit count.
        max: BitCount,
    },
    /// Two values of different families were combined.
    #[error("expected {expected} value, got {actual}")]
    MismatchedFamily {
        /// The expected family.
        expected: AddressFamily,
        /// The family that was provided.
        actual: AddressFamily,
    },
    /// Two values of the same family but different lengths were combined.
    #[error("expected {expected} segments, got {actual}")]
    MismatchedLength {
        /// The expected segment count.
        expected: usize,
        /// The segment count that was provided.
        actual: usize,
    },
}

/// The result of an operation on a range cannot be represented as a range.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IncompatibleRangeError {
    /// Reversing the bits or bytes of the range does not produce a contiguous range.
    #[error("reversing the range {lower:#x}-{upper:#x} does not produce a contiguous range")]
    ReversedRange {
        /// Lower value of the range.
        lower: u64,
        /// Upper value of the range.
        upper: u64,
    },
    /// A ranged division is followed by a division which is not full range.
    #[error("division {index} is ranged but a following division is not full range")]
    JoinedRange {
        /// Index of the offending ranged division.
        index: usize,
    },
    /// Masking the range does not produce a contiguous range.
    #[error("masking {lower:#x}-{upper:#x} with {mask:#x} does not produce a contiguous range")]
    MaskedRange {
        /// Lower value of the range.
        lower: u64,
        /// Upper value of the range.
        upper: u64,
        /// The mask that was applied.
        mask: u64,
    },
}

/// Any error reported by an operation that both validates its input and transforms ranges.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    /// The input was malformed.
    #[error(transparent)]
    Value(#[from] AddressValueError),
    /// The transformed range cannot be represented.
    #[error(transparent)]
    IncompatibleRange(#[from] IncompatibleRangeError),
}
