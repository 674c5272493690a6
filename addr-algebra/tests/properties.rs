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

//! Randomized properties of the address value algebra.

use std::{sync::Barrier, thread};

use addr_algebra::{
    AddressCreator, AddressFamily, BitCount, Division, DivisionGrouping, DivisionValue,
    Ipv4Creator, Ipv6Creator, LargeDivision, MacCreator, PrefixLen, Section, network,
};
use num_bigint::{BigInt, BigUint};
use num_traits::{One, ToPrimitive};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const ITERATIONS: usize = 500;

// Single values are more likely than ranges, so that sections mix both.
fn random_section<R: Rng>(rng: &mut R, creator: &impl AddressCreator) -> Section {
    let max = creator.family().max_segment_value();
    let (lower, upper): (Vec<u64>, Vec<u64>) = (0..creator.segment_count())
        .map(|_| {
            if rng.random_bool(0.6) {
                let value = rng.random_range(0..=max);
                (value, value)
            } else {
                (rng.random_range(0..=max), rng.random_range(0..=max))
            }
        })
        .unzip();
    creator
        .create_section_from_values(&lower, &upper, None)
        .unwrap()
}

fn random_prefix_block<R: Rng>(rng: &mut R, min_prefix_len: BitCount) -> Section {
    let prefix_len = rng.random_range(min_prefix_len..=32);
    Ipv4Creator
        .create_section_from_u128(u128::from(rng.random::<u32>()), None)
        .to_prefix_block_len(prefix_len)
}

fn random_member<R: Rng>(rng: &mut R, section: &Section, creator: &impl AddressCreator) -> Section {
    let values: Vec<u64> = section
        .segments()
        .iter()
        .map(|segment| rng.random_range(segment.value()..=segment.upper_value()))
        .collect();
    creator
        .create_section_from_values(&values, &values, None)
        .unwrap()
}

fn count_as_u64(section: &Section) -> u64 {
    section.count().to_u64().unwrap_or(u64::MAX)
}

#[test]
fn division_bounds_are_ordered() {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    for _ in 0..ITERATIONS {
        let bit_count = rng.random_range(0..=64);
        let (a, b) = (rng.random::<u64>(), rng.random::<u64>());
        let division = Division::new(a, b, bit_count, None).unwrap();
        assert!(division.value() <= division.upper_value(), "{division:?}");
        assert!(division.upper_value() <= division.max_value());

        let value = rng.random_range(0..=division.max_value());
        let prefix_len = Some(PrefixLen::new(rng.random_range(0..=bit_count)));
        let single = division.derive_new(value, value, prefix_len);
        assert!(!single.is_multiple());
        assert_eq!(single.value(), value);
        assert_eq!(single.upper_value(), value);
        assert_eq!(single.count(), 1);
    }
}

#[test]
fn min_prefix_len_is_a_block() {
    let mut rng = ChaCha8Rng::seed_from_u64(43);
    for _ in 0..ITERATIONS {
        let bit_count = rng.random_range(1..=64);
        let division = Division::new(rng.random(), rng.random(), bit_count, None).unwrap();
        assert!(
            division.contains_prefix_block(division.min_prefix_len_for_block()),
            "{division:?}"
        );

        let bit_count = rng.random_range(1..=200);
        let mut lower = vec![0u8; 26];
        let mut upper = vec![0u8; 26];
        rng.fill(&mut lower[..]);
        rng.fill(&mut upper[..]);
        let large = LargeDivision::from_range_bytes(&lower, &upper, bit_count, None);
        assert!(DivisionValue::contains_prefix_block(
            &large,
            DivisionValue::min_prefix_len_for_block(&large)
        ));

        let section = random_section(&mut rng, &Ipv6Creator);
        assert!(section.contains_prefix_block(section.min_prefix_len_for_block()));
        let block = random_prefix_block(&mut rng, 0);
        assert!(block.contains_prefix_block(block.min_prefix_len_for_block()));
        assert!(block.min_prefix_len_for_block() <= block.prefix_len().map_or(32, |p| p.bits()));
    }
}

#[test]
fn count_is_the_product_of_division_counts() {
    let mut rng = ChaCha8Rng::seed_from_u64(44);
    for _ in 0..ITERATIONS {
        let section = if rng.random_bool(0.5) {
            random_section(&mut rng, &Ipv6Creator)
        } else {
            random_section(&mut rng, &MacCreator)
        };
        let product = section
            .segments()
            .iter()
            .fold(BigUint::one(), |count, segment| count * segment.count());
        assert_eq!(section.count(), product);
        assert_eq!(section.count().is_one(), !section.is_multiple());
        assert_eq!(section.block_count(section.segment_count()), product);
    }
}

#[test]
fn sequential_increment_walks_every_value() {
    let mut rng = ChaCha8Rng::seed_from_u64(45);
    for _ in 0..50 {
        let block = random_prefix_block(&mut rng, 24);
        assert!(block.is_sequential());
        let count = count_as_u64(&block);
        let lower = block.value();
        let mut previous = None;
        for k in 0..count {
            let value = block.increment(k as i64).unwrap();
            assert!(!value.is_multiple());
            assert!(block.contains(&value));
            assert_eq!(value.value(), &lower + k);
            if let Some(previous) = previous {
                assert!(value.value() > previous);
            }
            previous = Some(value.value());
        }
        let iterated: Vec<_> = block.iter().map(|value| value.value()).collect();
        assert_eq!(iterated.len() as u64, count);
        assert_eq!(iterated.first(), Some(&lower));

        let outside = [block.increment(count as i64), block.increment(-1)];
        for outside in outside.into_iter().flatten() {
            assert!(!block.contains(&outside));
        }
    }
}

#[test]
fn enumerate_inverts_increment() {
    let mut rng = ChaCha8Rng::seed_from_u64(46);
    for _ in 0..ITERATIONS {
        let section = random_section(&mut rng, &Ipv4Creator);
        let count = count_as_u64(&section).min(i64::MAX as u64) as i64;
        let n = rng.random_range(-1000..count.saturating_add(1000));
        if let Some(value) = section.increment(n) {
            assert_eq!(section.enumerate(&value), Some(BigInt::from(n)), "{section:?} {n}");
        }

        let member = random_member(&mut rng, &section, &Ipv4Creator);
        let ordinal = section.enumerate(&member).unwrap();
        assert!(ordinal >= BigInt::from(0) && ordinal < BigInt::from(section.count()));
        let found = section.increment_big(&ordinal).unwrap();
        assert_eq!(found.value(), member.value());
    }
}

#[test]
fn unbounded_increment_agrees_with_value_arithmetic() {
    let mut rng = ChaCha8Rng::seed_from_u64(47);
    let full = Ipv6Creator
        .create_section_from_values(&[0; 8], &[0xffff; 8], None)
        .unwrap();
    for _ in 0..ITERATIONS {
        let n = rng.random::<u64>();
        let value = full.increment(n as i64);
        if (n as i64) < 0 {
            assert_eq!(value, None);
        } else {
            let value = value.unwrap();
            assert_eq!(value.value(), BigUint::from(n));
            assert_eq!(full.enumerate(&value), Some(BigInt::from(n)));
        }

        let section = random_section(&mut rng, &Ipv6Creator);
        let step = BigInt::from(rng.random::<u64>()) * BigInt::from(rng.random::<u64>());
        if let Some(above) = section.increment_boundary(1) {
            assert_eq!(above.value(), section.upper_value() + 1u32);
        }
        let beyond = section.increment_big(&(BigInt::from(section.count()) - 1 + &step));
        if let Some(beyond) = beyond {
            let expected = BigInt::from(section.upper_value()) + &step;
            assert_eq!(BigInt::from(beyond.value()), expected);
        }
    }
}

#[test]
fn shared_caches_agree_across_threads() {
    const THREADS: usize = 8;
    let mut rng = ChaCha8Rng::seed_from_u64(48);
    for _ in 0..20 {
        let section = random_section(&mut rng, &Ipv6Creator);
        // Built apart from `section` so that its caches start out empty.
        let expected_section = Ipv6Creator
            .create_section(section.segments().to_vec())
            .unwrap();
        let expected = (
            expected_section.count(),
            expected_section.min_prefix_len_for_block(),
            expected_section.prefix_len_for_single_block(),
        );
        let barrier = Barrier::new(THREADS);
        let seen: Vec<_> = thread::scope(|scope| {
            let handles: Vec<_> = (0..THREADS)
                .map(|i| {
                    let (section, barrier) = (&section, &barrier);
                    scope.spawn(move || {
                        barrier.wait();
                        let prefix_len = (i * 16) as BitCount;
                        let mask = network::network_mask(AddressFamily::Ipv6, prefix_len).unwrap();
                        (
                            section.count(),
                            section.min_prefix_len_for_block(),
                            section.prefix_len_for_single_block(),
                            mask,
                            prefix_len,
                        )
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        for (count, min_prefix_len, single_block, mask, prefix_len) in seen {
            assert_eq!((count, min_prefix_len, single_block), expected);
            assert!(std::ptr::eq(
                mask,
                network::network_mask(AddressFamily::Ipv6, prefix_len).unwrap()
            ));
            assert_eq!(mask.leading_bit_count(true), prefix_len);
        }
    }
}

mod scenarios {
    use super::*;

    #[test]
    fn multiple_ipv4_section() {
        let section = Ipv4Creator
            .create_section_from_values(&[10, 0, 0, 0], &[10, 0, 255, 0], None)
            .unwrap();
        assert!(section.is_multiple());
        assert_eq!(section.count(), BigUint::from(256u32));
        assert_eq!(section.sequential_block_index(), 3);
        assert_eq!(section.sequential_block_count(), BigUint::from(256u32));
        assert_eq!(section.sequential_block_iter().count(), 256);
    }

    #[test]
    fn zero_prefix_segment() {
        let segment = Ipv4Creator.create_segment(192, Some(PrefixLen::ZERO));
        assert_eq!(segment.prefix_count_len(0), 1);
    }

    #[test]
    fn full_range_ipv6_segment() {
        let segment = Ipv6Creator.create_range_segment(0, 0xffff, None);
        assert!(segment.is_full_range());
        assert!(segment.includes_zero());
        assert!(segment.includes_max());
    }

    #[test]
    fn decrement_below_zero() {
        let section = Ipv4Creator.create_section_from_u128(3, None);
        assert_eq!(section.increment(-5), None);
    }

    #[test]
    fn large_division_truncates_bytes() {
        let division = LargeDivision::from_bytes(&[0xff; 5], 33, None);
        assert_eq!(division.max_value(), &((BigUint::one() << 33u32) - 1u32));
        assert_eq!(division.value(), division.max_value());
        assert_eq!(DivisionValue::bytes(&division).len(), 5);
    }

    #[test]
    fn joined_grouping_keeps_values() {
        let section = Ipv4Creator
            .create_section_from_values(&[10, 1, 0, 0], &[10, 2, 255, 255], None)
            .unwrap();
        let joined: DivisionGrouping<_> = section.to_joined_grouping(4).unwrap();
        assert_eq!(joined.count(), section.count());
        assert_eq!(joined.bit_count(), 32);
        assert_eq!(section.family(), AddressFamily::Ipv4);
    }
}
