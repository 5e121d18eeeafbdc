// -*- coding: utf-8 -*-
//
// Copyright 2021-2025 Michael Büsch <m@bues.ch>
//
// Licensed under the Apache License version 2.0
// or the MIT license, at your option.
// SPDX-License-Identifier: Apache-2.0 OR MIT
//

use std::ops::Range;

/// Conflict predicate between two ranges of type `R`.
///
/// The predicate must be symmetric: `overlaps(a, b) == overlaps(b, a)`.
/// [crate::RangeLock] never inspects ranges by itself.
/// Two ranges may only be held at the same time, if this returns `false`.
///
/// Any context the predicate needs can be captured by the implementing value.
/// Closures `Fn(&R, &R) -> bool` implement this trait.
pub trait Overlap<R> {
    /// Returns `true`, if `a` and `b` must not be locked at the same time.
    fn overlaps(&self, a: &R, b: &R) -> bool;
}

impl<R, F> Overlap<R> for F
where
    F: Fn(&R, &R) -> bool,
{
    #[inline]
    fn overlaps(&self, a: &R, b: &R) -> bool {
        self(a, b)
    }
}

/// Half-open interval intersection test.
///
/// `[s1, e1)` and `[s2, e2)` overlap iff `s1 < e2 && s2 < e1`.
/// Empty intervals never overlap anything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HalfOpen;

/// Half-open intersection test of two [Range]s. Empty ranges never overlap.
#[inline]
pub(crate) fn overlaps<T: PartialOrd>(a: &Range<T>, b: &Range<T>) -> bool {
    a.end > b.start && a.start < b.end && !a.is_empty() && !b.is_empty()
}

impl<T: PartialOrd> Overlap<Range<T>> for HalfOpen {
    #[inline]
    fn overlaps(&self, a: &Range<T>, b: &Range<T>) -> bool {
        overlaps(a, b)
    }
}

impl Overlap<Extent> for HalfOpen {
    #[inline]
    fn overlaps(&self, a: &Extent, b: &Extent) -> bool {
        !a.is_empty()
            && !b.is_empty()
            && u128::from(a.start) < b.end()
            && u128::from(b.start) < a.end()
    }
}

/// A `(start, len)` interval over a `u64` keyspace,
/// e.g. byte offsets in a file or block indices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Extent {
    pub start: u64,
    pub len: u64,
}

impl Extent {
    #[inline]
    pub const fn new(start: u64, len: u64) -> Self {
        Self { start, len }
    }

    /// Exclusive end of the extent.
    ///
    /// This is a `u128`, because an extent may reach up to and including
    /// the last key `u64::MAX`. Its end is `u64::MAX + 1` then.
    #[inline]
    pub const fn end(&self) -> u128 {
        self.start as u128 + self.len as u128
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl From<Range<u64>> for Extent {
    #[inline]
    fn from(r: Range<u64>) -> Self {
        Self::new(r.start, r.end.saturating_sub(r.start))
    }
}


// vim: ts=4 sw=4 expandtab
