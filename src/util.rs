// -*- coding: utf-8 -*-
//
// Copyright 2021-2025 Michael Büsch <m@bues.ch>
//
// Licensed under the Apache License version 2.0
// or the MIT license, at your option.
// SPDX-License-Identifier: Apache-2.0 OR MIT
//

use std::ops::{Bound, Range, RangeBounds};

/// Convert a `RangeBounds<usize>` into a `start..end` range
/// within a container of `length` elements.
///
/// Panics, if the range is out of bounds or if start is bigger than end.
#[inline]
pub fn checked_range(range: &impl RangeBounds<usize>, length: usize) -> Range<usize> {
    let start = match range.start_bound() {
        Bound::Included(x) => *x,
        Bound::Excluded(x) => {
            assert!(*x < usize::MAX);
            *x + 1
        }
        Bound::Unbounded => 0,
    };
    let end = match range.end_bound() {
        Bound::Included(x) => {
            assert!(*x < usize::MAX);
            *x + 1 // to excluded
        }
        Bound::Excluded(x) => *x,
        Bound::Unbounded => length,
    };
    if start > end {
        panic!("Invalid range. Start is bigger than end.");
    }
    if end > length {
        panic!("Range is out of bounds.");
    }
    start..end
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_range() {
        assert_eq!(checked_range(&(10..20), 20), 10..20);
        assert_eq!(checked_range(&(10..=20), 21), 10..21);
        assert_eq!(checked_range(&(..20), 20), 0..20);
        assert_eq!(checked_range(&(..=20), 30), 0..21);
        assert_eq!(checked_range(&(10..), 42), 10..42);
        assert_eq!(checked_range(&(..), 42), 0..42);
        assert_eq!(checked_range(&(42..), 42), 42..42);
        assert_eq!(
            checked_range(&(Bound::Excluded(3), Bound::Excluded(5)), 10),
            4..5
        );
    }

    #[test]
    #[should_panic(expected = "< usize::MAX")]
    fn test_checked_range_end_panic() {
        checked_range(&(..=usize::MAX), 0);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_checked_range_oob() {
        checked_range(&(2..11), 10);
    }

    #[test]
    #[should_panic(expected = "Start is bigger than end")]
    #[allow(clippy::reversed_empty_ranges)]
    fn test_checked_range_inverted() {
        checked_range(&(5..4), 10);
    }
}

// vim: ts=4 sw=4 expandtab
