// -*- coding: utf-8 -*-
//
// Copyright 2021-2025 Michael Büsch <m@bues.ch>
//
// Licensed under the Apache License version 2.0
// or the MIT license, at your option.
// SPDX-License-Identifier: Apache-2.0 OR MIT
//

use crate::{
    entry::LockEntry,
    error::{Error, Result, TryLockError, TryLockResult},
    lockedranges::LockedRanges,
    overlap::{HalfOpen, Overlap},
};
use lock_api::{RawMutex, RawMutexTimed};
use std::{
    fmt,
    marker::PhantomData,
    mem::size_of,
    sync::Arc,
    time::{Duration, Instant},
};
use tracing::{debug, error, trace};

/// Default administrative lock. Held only for short bookkeeping.
pub type DefaultAdminLock = spin::mutex::SpinMutex<()>;

/// Default holder lock. Conflicting requesters park on it.
pub type DefaultHolderLock = parking_lot::RawMutex;

/// Generic multi-thread range lock manager.
///
/// Threads lock arbitrary ranges of type `R`.
/// Two ranges can be held at the same time, if the predicate `P` says they don't overlap.
/// A conflicting [RangeLock::lock] call blocks until the conflicting range is unlocked.
///
/// The lock primitives are selected by type:
///
/// * `A`: The administrative lock protecting the set of active ranges.
///        It is never held while a thread blocks. A spinlock by default.
/// * `H`: The holder lock embedded in every active range.
///        Conflicting requesters park on it. A parking mutex by default.
///        Admission order among waiters follows the wake policy of `H`.
///        Use a fair primitive like [parking_lot::RawFairMutex] for fairness.
///
/// # Example
///
/// ```
/// use range_lock_manager::{Extent, HalfOpen, RangeLock};
/// use std::{sync::{Arc, Barrier}, thread};
///
/// let lock = Arc::new(RangeLock::new(HalfOpen).expect("Failed to create lock"));
/// let lock0 = Arc::clone(&lock);
/// let lock1 = Arc::clone(&lock);
///
/// let barrier0 = Arc::new(Barrier::new(2));
/// let barrier1 = Arc::clone(&barrier0);
///
/// thread::scope(|s| {
///     s.spawn(move || {
///         let h = lock0.lock(Extent::new(0, 2)).expect("T0: Failed to lock [0, 2)");
///         barrier0.wait(); // Both ranges are held now.
///         lock0.unlock(h);
///     });
///     s.spawn(move || {
///         let h = lock1.lock(Extent::new(2, 2)).expect("T1: Failed to lock [2, 4)");
///         barrier1.wait(); // Both ranges are held now.
///         lock1.unlock(h);
///     });
/// });
///
/// assert!(lock.is_empty());
/// Arc::try_unwrap(lock).expect("Arc unwrap failed").destroy().expect("Lock is still busy");
/// ```
pub struct RangeLock<R, P = HalfOpen, A = DefaultAdminLock, H = DefaultHolderLock>
where
    A: RawMutex,
{
    /// Set of the currently locked ranges.
    ranges: lock_api::Mutex<A, LockedRanges<R, H>>,
    /// Conflict predicate.
    predicate: P,
}

impl<R, P> RangeLock<R, P>
where
    P: Overlap<R>,
{
    /// Construct a new [RangeLock] with the default lock primitives.
    ///
    /// * `predicate`: The conflict test between two ranges.
    ///                Any context it needs can be captured by it.
    pub fn new(predicate: P) -> Result<Self> {
        Self::with_primitives(predicate)
    }
}

impl<R, P, A, H> RangeLock<R, P, A, H>
where
    P: Overlap<R>,
    A: RawMutex,
    H: RawMutex,
{
    /// Construct a new [RangeLock] with the lock primitives `A` and `H`.
    ///
    /// ```
    /// use range_lock_manager::{HalfOpen, RangeLock};
    /// use spin::mutex::TicketMutex;
    ///
    /// // FIFO admission among waiters on the same range.
    /// let lock: RangeLock<std::ops::Range<u64>, HalfOpen, TicketMutex<()>, parking_lot::RawFairMutex> =
    ///     RangeLock::with_primitives(HalfOpen).unwrap();
    /// let h = lock.lock(10..20).unwrap();
    /// lock.unlock(h);
    /// ```
    pub fn with_primitives(predicate: P) -> Result<Self> {
        if size_of::<R>() == 0 {
            return Err(Error::Config(
                "The range descriptor type must not be zero-sized.".to_string(),
            ));
        }
        Ok(Self::new_unchecked(predicate))
    }

    /// Construct a new [RangeLock] for a range type known not to be zero-sized.
    pub(crate) fn new_unchecked(predicate: P) -> Self {
        debug_assert_ne!(size_of::<R>(), 0);
        debug!(
            admin = std::any::type_name::<A>(),
            holder = std::any::type_name::<H>(),
            range_size = size_of::<R>(),
            "RangeLock: created"
        );
        Self {
            ranges: lock_api::Mutex::new(LockedRanges::new()),
            predicate,
        }
    }

    /// Get the number of currently locked ranges.
    ///
    /// This is a snapshot. Other threads may lock or unlock ranges
    /// before the caller looks at the result.
    #[inline]
    pub fn active_count(&self) -> usize {
        self.ranges.lock().len()
    }

    /// Returns `true`, if no range is locked.
    ///
    /// Like [RangeLock::active_count] the result may already be stale when it is returned.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ranges.lock().is_empty()
    }

    /// Lock the given `range`.
    ///
    /// Blocks until no conflicting range is held anymore.
    /// There is no ordering among multiple waiters on the same range.
    /// Locking a range that conflicts with a range held by the calling thread deadlocks.
    ///
    /// Returns a [LockHandle] that must be passed to [RangeLock::unlock].
    /// Fails with [Error::OutOfMemory] without locking anything,
    /// if the entry could not be allocated.
    pub fn lock(&self, range: R) -> Result<LockHandle<R, H>> {
        loop {
            let mut ranges = self.ranges.lock();
            match ranges.find_conflict(&range, &self.predicate) {
                None => return Self::admit(&mut ranges, range),
                Some(conflict) => {
                    conflict.add_waiter();
                    // Never block on a holder lock with the administrative lock held.
                    drop(ranges);
                    trace!(conflict = conflict.id(), "RangeLock: waiting");
                    conflict.wait();
                }
            }
        }
    }

    /// Try to lock the given `range` without blocking.
    ///
    /// * On success: Returns a [LockHandle] that must be passed to [RangeLock::unlock].
    /// * On failure: Returns [TryLockError::WouldBlock], if the range is contended.
    ///               The locking attempt may be retried by the caller upon contention.
    pub fn try_lock(&self, range: R) -> TryLockResult<LockHandle<R, H>> {
        let mut ranges = self.ranges.lock();
        if ranges.find_conflict(&range, &self.predicate).is_some() {
            Err(TryLockError::WouldBlock)
        } else {
            Ok(Self::admit(&mut ranges, range)?)
        }
    }

    /// Lock the given `range` and return a guard that unlocks on drop.
    pub fn guard(&self, range: R) -> Result<RangeLockGuard<'_, R, P, A, H>> {
        let handle = self.lock(range)?;
        Ok(RangeLockGuard::new(self, handle))
    }

    /// Try to lock the given `range` and return a guard that unlocks on drop.
    pub fn try_guard(&self, range: R) -> TryLockResult<RangeLockGuard<'_, R, P, A, H>> {
        let handle = self.try_lock(range)?;
        Ok(RangeLockGuard::new(self, handle))
    }

    /// Unlock a range that has been locked by this [RangeLock].
    ///
    /// Wakes up the threads that wait for this range.
    ///
    /// # Panics
    ///
    /// Panics, if `handle` has been locked by another [RangeLock].
    pub fn unlock(&self, handle: LockHandle<R, H>) {
        let entry = handle.entry;
        let mut ranges = self.ranges.lock();
        assert!(
            ranges.remove(&entry),
            "RangeLock: Unlocking a range that is not locked by this lock."
        );
        // SAFETY:
        // The entry was active in this lock and the handle has been consumed.
        // It cannot be released twice.
        unsafe { entry.release() };
        drop(ranges);
        trace!(entry = entry.id(), "RangeLock: unlocked");
    }

    /// Destroy the lock.
    ///
    /// Fails with [Error::ActiveEntries], if ranges are still locked.
    /// This indicates a leaked [LockHandle].
    /// The leaked ranges are forgotten in that case.
    pub fn destroy(mut self) -> Result<()> {
        let ranges = self.ranges.get_mut();
        let active = ranges.len();
        if active == 0 {
            debug!("RangeLock: destroyed");
            Ok(())
        } else {
            error!(active, "RangeLock: destroyed with active ranges");
            // Already reported. Keep drop() quiet.
            ranges.clear();
            Err(Error::ActiveEntries(active))
        }
    }

    /// Insert a new entry for `range`.
    /// The administrative lock must be held.
    fn admit(ranges: &mut LockedRanges<R, H>, range: R) -> Result<LockHandle<R, H>> {
        let id = ranges.prepare_insert()?;
        let entry = Arc::new(LockEntry::new_locked(id, range));
        ranges.insert(Arc::clone(&entry));
        trace!(entry = id, "RangeLock: admitted");
        Ok(LockHandle::new(entry))
    }
}

impl<R, P, A, H> RangeLock<R, P, A, H>
where
    P: Overlap<R>,
    A: RawMutex,
    H: RawMutexTimed<Instant = Instant>,
{
    /// Lock the given `range`, but wait no longer than `timeout` in total.
    ///
    /// Fails with [Error::TimedOut], if the range could not be locked in time.
    /// Nothing is locked in that case.
    pub fn lock_timeout(&self, range: R, timeout: Duration) -> Result<LockHandle<R, H>> {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            // The deadline is not representable. Treat it as no deadline.
            return self.lock(range);
        };
        loop {
            let mut ranges = self.ranges.lock();
            match ranges.find_conflict(&range, &self.predicate) {
                None => return Self::admit(&mut ranges, range),
                Some(conflict) => {
                    conflict.add_waiter();
                    drop(ranges);
                    if !conflict.wait_until(deadline) {
                        trace!(conflict = conflict.id(), "RangeLock: timed out");
                        return Err(Error::TimedOut);
                    }
                }
            }
        }
    }
}

impl<R, P, A, H> Drop for RangeLock<R, P, A, H>
where
    A: RawMutex,
{
    fn drop(&mut self) {
        let active = self.ranges.get_mut().len();
        if active != 0 {
            error!(active, "RangeLock: dropped with active ranges");
        }
    }
}

impl<R, P, A, H> fmt::Debug for RangeLock<R, P, A, H>
where
    A: RawMutex,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("RangeLock");
        match self.ranges.try_lock() {
            Some(ranges) => d.field("active", &ranges.len()),
            None => d.field("active", &format_args!("<locked>")),
        };
        d.finish_non_exhaustive()
    }
}

/// Handle of a range locked by [RangeLock::lock].
///
/// The handle must be passed to [RangeLock::unlock].
/// Dropping it without unlocking leaks the locked range.
#[must_use = "the range stays locked until the handle is passed to RangeLock::unlock"]
pub struct LockHandle<R, H: RawMutex> {
    /// The active entry.
    entry: Arc<LockEntry<R, H>>,

    /// The handle is only Send, if the holder lock may be released on another thread.
    _p: PhantomData<H::GuardMarker>,
}

impl<R, H: RawMutex> LockHandle<R, H> {
    #[inline]
    fn new(entry: Arc<LockEntry<R, H>>) -> Self {
        Self {
            entry,
            _p: PhantomData,
        }
    }

    /// Get the locked range.
    #[inline]
    pub fn range(&self) -> &R {
        self.entry.range()
    }

    /// Get the number of threads currently waiting for this range.
    #[inline]
    pub fn waiters(&self) -> usize {
        self.entry.waiters()
    }
}

impl<R: fmt::Debug, H: RawMutex> fmt::Debug for LockHandle<R, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockHandle")
            .field("id", &self.entry.id())
            .field("range", self.entry.range())
            .finish()
    }
}

/// Lock guard variable type for [RangeLock].
///
/// Unlocks the range on drop.
pub struct RangeLockGuard<'a, R, P, A, H>
where
    P: Overlap<R>,
    A: RawMutex,
    H: RawMutex,
{
    /// Reference to the underlying lock.
    lock: &'a RangeLock<R, P, A, H>,
    /// The locked range. Only `None` during drop.
    handle: Option<LockHandle<R, H>>,
}

impl<'a, R, P, A, H> RangeLockGuard<'a, R, P, A, H>
where
    P: Overlap<R>,
    A: RawMutex,
    H: RawMutex,
{
    #[inline]
    fn new(lock: &'a RangeLock<R, P, A, H>, handle: LockHandle<R, H>) -> Self {
        Self {
            lock,
            handle: Some(handle),
        }
    }

    /// Get the locked range.
    #[inline]
    pub fn range(&self) -> &R {
        match &self.handle {
            Some(handle) => handle.range(),
            None => unreachable!(),
        }
    }

    /// Get the number of threads currently waiting for the locked range.
    #[inline]
    pub fn waiters(&self) -> usize {
        match &self.handle {
            Some(handle) => handle.waiters(),
            None => unreachable!(),
        }
    }
}

impl<'a, R, P, A, H> Drop for RangeLockGuard<'a, R, P, A, H>
where
    P: Overlap<R>,
    A: RawMutex,
    H: RawMutex,
{
    #[inline]
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.lock.unlock(handle);
        }
    }
}

impl<'a, R, P, A, H> fmt::Debug for RangeLockGuard<'a, R, P, A, H>
where
    R: fmt::Debug,
    P: Overlap<R>,
    A: RawMutex,
    H: RawMutex,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RangeLockGuard")
            .field("handle", &self.handle)
            .finish()
    }
}


// vim: ts=4 sw=4 expandtab
