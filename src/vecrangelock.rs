// -*- coding: utf-8 -*-
//
// Copyright 2021-2025 Michael Büsch <m@bues.ch>
//
// Licensed under the Apache License version 2.0
// or the MIT license, at your option.
// SPDX-License-Identifier: Apache-2.0 OR MIT
//

use crate::{
    error::{Result, TryLockResult},
    overlap::HalfOpen,
    rangelock::{DefaultAdminLock, DefaultHolderLock, RangeLock, RangeLockGuard},
    util::checked_range,
};
use std::{
    fmt,
    marker::PhantomData,
    ops::{Deref, DerefMut, Range, RangeBounds},
    ptr,
};

type IndexLock = RangeLock<Range<usize>, HalfOpen, DefaultAdminLock, DefaultHolderLock>;
type IndexGuard<'a> = RangeLockGuard<'a, Range<usize>, HalfOpen, DefaultAdminLock, DefaultHolderLock>;

/// A [Vec] whose elements are locked by index range.
///
/// Each guard grants exclusive access to a sub-slice.
/// [VecRangeLock::lock] blocks while an overlapping sub-slice is held elsewhere.
///
/// # Example
///
/// ```
/// use range_lock_manager::VecRangeLock;
/// use std::thread;
///
/// let data = VecRangeLock::new(vec![0_u32; 8]);
///
/// thread::scope(|s| {
///     let mut head = data.lock(0..4).expect("Failed to lock 0..4");
///     let reader = s.spawn(|| {
///         // Overlaps with 0..4. Blocks until `head` is dropped.
///         let tail = data.lock(2..6).expect("Failed to lock 2..6");
///         tail[0] + tail[1]
///     });
///     while head.waiters() == 0 {
///         thread::yield_now();
///     }
///     head[2] = 20;
///     head[3] = 22;
///     drop(head);
///     assert_eq!(reader.join().expect("Reader panicked"), 42);
/// });
///
/// assert_eq!(data.into_inner(), vec![0, 0, 20, 22, 0, 0, 0, 0]);
/// ```
pub struct VecRangeLock<T> {
    /// Locked index ranges.
    index: IndexLock,
    /// First element. Stays valid, because `data` is never resized while shared.
    base: *mut T,
    len: usize,
    data: Vec<T>,
}

// SAFETY: The lock owns all elements. Moving it moves them.
unsafe impl<T: Send> Send for VecRangeLock<T> {}

// SAFETY:
// Elements are only reachable through guards.
// Guards with overlapping ranges never exist at the same time,
// so an element is accessed by one thread at a time. T only has to be Send.
unsafe impl<T: Send> Sync for VecRangeLock<T> {}

impl<T> VecRangeLock<T> {
    /// Construct a new [VecRangeLock] protecting `data`.
    pub fn new(mut data: Vec<T>) -> Self {
        Self {
            index: RangeLock::new_unchecked(HalfOpen),
            base: data.as_mut_ptr(),
            len: data.len(),
            data,
        }
    }

    /// Get the number of elements.
    #[inline]
    pub fn data_len(&self) -> usize {
        self.len
    }

    /// Unwrap the protected [Vec].
    #[inline]
    pub fn into_inner(self) -> Vec<T> {
        debug_assert!(self.index.is_empty());
        self.data
    }

    /// Lock the elements in `range`.
    ///
    /// Blocks until no overlapping range is locked anymore.
    /// Empty ranges are never registered and never block.
    ///
    /// # Panics
    ///
    /// Panics, if the range is out of bounds.
    pub fn lock(&self, range: impl RangeBounds<usize>) -> Result<VecRangeLockGuard<'_, T>> {
        let range = checked_range(&range, self.len);
        let guard = if range.is_empty() {
            None
        } else {
            Some(self.index.guard(range.clone())?)
        };
        Ok(VecRangeLockGuard::new(self.slice_ptr(&range), guard))
    }

    /// Lock the elements in `range` without blocking.
    ///
    /// Returns [crate::TryLockError::WouldBlock], if an overlapping range is locked.
    ///
    /// # Panics
    ///
    /// Panics, if the range is out of bounds.
    pub fn try_lock(&self, range: impl RangeBounds<usize>) -> TryLockResult<VecRangeLockGuard<'_, T>> {
        let range = checked_range(&range, self.len);
        let guard = if range.is_empty() {
            None
        } else {
            Some(self.index.try_guard(range.clone())?)
        };
        Ok(VecRangeLockGuard::new(self.slice_ptr(&range), guard))
    }

    #[inline]
    fn slice_ptr(&self, range: &Range<usize>) -> *mut [T] {
        debug_assert!(range.end <= self.len);
        // SAFETY: `range` has been checked against the length of the data.
        let first = unsafe { self.base.add(range.start) };
        ptr::slice_from_raw_parts_mut(first, range.len())
    }
}

impl<T> fmt::Debug for VecRangeLock<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VecRangeLock")
            .field("len", &self.len)
            .field("index", &self.index)
            .finish()
    }
}

/// Exclusive access to a sub-slice of a [VecRangeLock].
///
/// Dereferences to the locked elements. Unlocks on drop.
pub struct VecRangeLockGuard<'a, T> {
    slice: *mut [T],
    /// `None` for empty ranges.
    guard: Option<IndexGuard<'a>>,
    _p: PhantomData<&'a mut [T]>,
}

impl<'a, T> VecRangeLockGuard<'a, T> {
    #[inline]
    fn new(slice: *mut [T], guard: Option<IndexGuard<'a>>) -> Self {
        Self {
            slice,
            guard,
            _p: PhantomData,
        }
    }

    /// Get the number of threads waiting for an overlapping range.
    pub fn waiters(&self) -> usize {
        self.guard.as_ref().map_or(0, |g| g.waiters())
    }
}

impl<T> Deref for VecRangeLockGuard<'_, T> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &[T] {
        // SAFETY:
        // The elements belong to this guard alone until it is dropped.
        // The data outlives the guard.
        unsafe { &*self.slice }
    }
}

impl<T> DerefMut for VecRangeLockGuard<'_, T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut [T] {
        // SAFETY: See deref(). The borrow of `self` rules out a coexisting shared slice.
        unsafe { &mut *self.slice }
    }
}

impl<T: fmt::Debug> fmt::Debug for VecRangeLockGuard<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("VecRangeLockGuard").field(&&**self).finish()
    }
}


// vim: ts=4 sw=4 expandtab
