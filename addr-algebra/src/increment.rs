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

//! Ordinal navigation over the values of a section.
//!
//! Values are ordered by iteration order: the last segment moves fastest. Positions past the
//! ends of the range continue numerically from the lowest or highest value. Arithmetic runs on
//! `u128` whenever the section width and count allow it and falls back to [`BigInt`] otherwise.

use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{One, Signed, ToPrimitive, Zero};

use crate::{division::Segment, section::Section};

impl Section {
    /// Returns the value at position `n` of this section.
    ///
    /// Positions at or past the count continue from the highest value, negative positions
    /// count down from the lowest value. Returns `None` when the result lies outside the
    /// values of the family.
    pub fn increment(&self, n: i64) -> Option<Section> {
        match self.increment_native(i128::from(n)) {
            Some(result) => result,
            None => self.increment_big(&BigInt::from(n)),
        }
    }

    /// Returns the value at position `n` of this section, for positions of any size.
    pub fn increment_big(&self, n: &BigInt) -> Option<Section> {
        if let Some(n) = n.to_i128() {
            if let Some(result) = self.increment_native(n) {
                return result;
            }
        }
        tracing::trace!(bit_count = self.bit_count(), "unbounded increment");
        let lower = BigInt::from(self.value());
        if !self.is_multiple() {
            if n.is_zero() {
                return Some(self.clone());
            }
            return self.from_big_value(lower + n);
        }
        if n.is_negative() {
            return self.from_big_value(lower + n);
        }
        let count = BigInt::from(self.count());
        if n < &count {
            return Some(self.ordinal_big(n.magnitude().clone()));
        }
        self.from_big_value(BigInt::from(self.upper_value()) + n - (count - 1))
    }

    /// Returns the value `n` steps past the bounds of this section: below the lowest value for
    /// negative `n`, above the highest value for positive `n`.
    pub fn increment_boundary(&self, n: i64) -> Option<Section> {
        match n {
            0 => Some(self.clone()),
            n if n < 0 => self.lower().increment(n),
            n => self.upper().increment(n),
        }
    }

    /// Returns the position of the single value `other` relative to this section, the inverse
    /// of [`Section::increment`].
    ///
    /// Returns `None` when `other` is multi-valued, of another family or segment count, or
    /// lies between the bounds without being one of the values.
    pub fn enumerate(&self, other: &Section) -> Option<BigInt> {
        if other.is_multiple()
            || self.family() != other.family()
            || self.segment_count() != other.segment_count()
        {
            return None;
        }
        if let Some(result) = self.enumerate_native(other) {
            return result.map(BigInt::from);
        }
        tracing::trace!(bit_count = self.bit_count(), "unbounded enumerate");
        let value = BigInt::from(other.value());
        let lower = BigInt::from(self.value());
        if !self.is_multiple() {
            return Some(value - lower);
        }
        if self.contains(other) {
            let ordinal = self
                .segments()
                .iter()
                .zip(other.segments())
                .fold(BigUint::zero(), |ordinal, (segment, other)| {
                    ordinal * BigUint::from(segment.count()) + (other.value() - segment.value())
                });
            return Some(ordinal.into());
        }
        if value < lower {
            return Some(value - lower);
        }
        let upper = BigInt::from(self.upper_value());
        if value > upper {
            return Some(value - upper + BigInt::from(self.count()) - 1);
        }
        None
    }

    /// Increment on `u128`; `None` when the section does not fit.
    fn increment_native(&self, n: i128) -> Option<Option<Section>> {
        let lower = self.value_u128()?;
        let max = max_u128(self.bit_count());
        if !self.is_multiple() {
            if n == 0 {
                return Some(Some(self.clone()));
            }
            return Some(offset_u128(lower, n, max).map(|value| self.from_u128_value(value)));
        }
        let count = self.count_u128()?;
        if n < 0 {
            return Some(offset_u128(lower, n, max).map(|value| self.from_u128_value(value)));
        }
        let n = n.unsigned_abs();
        if n < count {
            return Some(Some(self.ordinal_u128(n)));
        }
        let upper = self.upper_value_u128()?;
        Some(
            upper
                .checked_add(n - (count - 1))
                .filter(|&value| value <= max)
                .map(|value| self.from_u128_value(value)),
        )
    }

    /// Enumerate on `i128`; `None` when the section or the result does not fit.
    fn enumerate_native(&self, other: &Section) -> Option<Option<i128>> {
        let value = i128::try_from(other.value_u128()?).ok()?;
        let lower = i128::try_from(self.value_u128()?).ok()?;
        if !self.is_multiple() {
            return Some(Some(value - lower));
        }
        let count = i128::try_from(self.count_u128()?).ok()?;
        if self.contains(other) {
            let mut ordinal: i128 = 0;
            for (segment, other) in self.segments().iter().zip(other.segments()) {
                let radix = i128::try_from(segment.count()).ok()?;
                let digit = i128::from(other.value() - segment.value());
                ordinal = ordinal.checked_mul(radix)?.checked_add(digit)?;
            }
            return Some(Some(ordinal));
        }
        if value < lower {
            return Some(Some(value - lower));
        }
        let upper = i128::try_from(self.upper_value_u128()?).ok()?;
        if value > upper {
            return Some(Some((value - upper).checked_add(count - 1)?));
        }
        Some(None)
    }

    fn value_u128(&self) -> Option<u128> {
        self.fold_u128(|segment| segment.value())
    }

    fn upper_value_u128(&self) -> Option<u128> {
        self.fold_u128(|segment| segment.upper_value())
    }

    fn fold_u128(&self, value: impl Fn(&Segment) -> u64) -> Option<u128> {
        if self.bit_count() > u128::BITS {
            return None;
        }
        Some(self.segments().iter().fold(0, |total, segment| {
            total.checked_shl(segment.bit_count()).unwrap_or(0) | u128::from(value(segment))
        }))
    }

    fn count_u128(&self) -> Option<u128> {
        self.segments()
            .iter()
            .try_fold(1u128, |count, segment| count.checked_mul(segment.count()))
    }

    fn ordinal_u128(&self, mut n: u128) -> Section {
        let mut segments = self.segments().to_vec();
        for segment in segments.iter_mut().rev() {
            let radix = segment.count();
            // The digit is below the segment count.
            let value = segment.value() + (n % radix) as u64;
            n /= radix;
            *segment = segment.derive_new(value, value, segment.prefix_len());
        }
        Section::from_parts(self.family(), segments, self.prefix_len())
    }

    fn ordinal_big(&self, mut n: BigUint) -> Section {
        let mut segments = self.segments().to_vec();
        for segment in segments.iter_mut().rev() {
            let radix = BigUint::from(segment.count());
            let digit = (&n % &radix).to_u64().unwrap_or_default();
            n /= radix;
            let value = segment.value() + digit;
            *segment = segment.derive_new(value, value, segment.prefix_len());
        }
        Section::from_parts(self.family(), segments, self.prefix_len())
    }

    fn from_u128_value(&self, mut value: u128) -> Section {
        let mut segments = self.segments().to_vec();
        for segment in segments.iter_mut().rev() {
            // Masked to the segment width.
            let segment_value = (value & u128::from(segment.max_value())) as u64;
            value = value.checked_shr(segment.bit_count()).unwrap_or(0);
            *segment = segment.derive_new(segment_value, segment_value, segment.prefix_len());
        }
        Section::from_parts(self.family(), segments, self.prefix_len())
    }

    fn from_big_value(&self, value: BigInt) -> Option<Section> {
        let (sign, mut value) = value.into_parts();
        let max = (BigUint::one() << self.bit_count()) - 1u8;
        if (sign == Sign::Minus && !value.is_zero()) || value > max {
            return None;
        }
        let mut segments = self.segments().to_vec();
        for segment in segments.iter_mut().rev() {
            let segment_value = (&value & BigUint::from(segment.max_value()))
                .to_u64()
                .unwrap_or_default();
            value >>= segment.bit_count();
            *segment = segment.derive_new(segment_value, segment_value, segment.prefix_len());
        }
        Some(Section::from_parts(self.family(), segments, self.prefix_len()))
    }
}

pub(crate) fn max_u128(bit_count: u32) -> u128 {
    if bit_count == 0 {
        0
    } else {
        u128::MAX >> (u128::BITS - bit_count)
    }
}

fn offset_u128(value: u128, n: i128, max: u128) -> Option<u128> {
    let moved = if n < 0 {
        value.checked_sub(n.unsigned_abs())
    } else {
        value.checked_add(n.unsigned_abs())
    };
    moved.filter(|&moved| moved <= max)
}
