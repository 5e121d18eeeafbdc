// -*- coding: utf-8 -*-
//
// Copyright 2021-2025 Michael Büsch <m@bues.ch>
//
// Licensed under the Apache License version 2.0
// or the MIT license, at your option.
// SPDX-License-Identifier: Apache-2.0 OR MIT
//

use lock_api::{RawMutex, RawMutexTimed};
use std::{
    sync::atomic::{AtomicUsize, Ordering},
    time::Instant,
};

/// One admitted range and its holder lock.
///
/// The holder lock is locked for the whole time the entry is active.
/// Conflicting requesters park on it until the owner unlocks the entry.
#[derive(Debug)]
pub(crate) struct LockEntry<R, H> {
    /// Identity of the entry within its manager.
    id: u64,
    /// The locked range. Immutable after admission.
    range: R,
    /// Holder lock. Locked by the owner of the entry.
    holder: H,
    /// Number of threads currently parked on `holder`.
    waiters: AtomicUsize,
}

impl<R, H> LockEntry<R, H> {
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[inline]
    pub fn range(&self) -> &R {
        &self.range
    }

    #[inline]
    pub fn waiters(&self) -> usize {
        self.waiters.load(Ordering::Acquire)
    }

    /// Announce that the calling thread is about to park on this entry.
    /// Must be called while the administrative lock is held.
    #[inline]
    pub fn add_waiter(&self) {
        self.waiters.fetch_add(1, Ordering::AcqRel);
    }
}

impl<R, H: RawMutex> LockEntry<R, H> {
    /// Create a new entry with its holder lock already taken.
    pub fn new_locked(id: u64, range: R) -> Self {
        let entry = Self {
            id,
            range,
            holder: H::INIT,
            waiters: AtomicUsize::new(0),
        };
        // Nobody else can see the entry yet. This never blocks.
        entry.holder.lock();
        entry
    }

    /// Park until the owner released the holder lock.
    /// The caller must have called [Self::add_waiter] before.
    pub fn wait(&self) {
        self.holder.lock();
        // SAFETY: The holder has been locked right above in this context.
        unsafe { self.holder.unlock() };
        self.waiters.fetch_sub(1, Ordering::AcqRel);
    }

    /// Release the holder lock and wake up the parked threads.
    ///
    /// # SAFETY
    ///
    /// The caller must be the owner of the entry
    /// and the entry must not be released twice.
    #[inline]
    pub unsafe fn release(&self) {
        // SAFETY: The holder was locked in new_locked() and the caller owns it.
        unsafe { self.holder.unlock() };
    }
}

impl<R, H> LockEntry<R, H>
where
    H: RawMutexTimed<Instant = Instant>,
{
    /// Park until the owner released the holder lock or until `deadline` passed.
    /// Returns `false` on timeout.
    pub fn wait_until(&self, deadline: Instant) -> bool {
        let acquired = self.holder.try_lock_until(deadline);
        if acquired {
            // SAFETY: The holder has been locked right above in this context.
            unsafe { self.holder.unlock() };
        }
        self.waiters.fetch_sub(1, Ordering::AcqRel);
        acquired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        sync::{Arc, Barrier},
        thread,
        time::Duration,
    };

    type Entry = LockEntry<u32, parking_lot::RawMutex>;

    #[test]
    fn test_new_locked() {
        let e = Entry::new_locked(7, 42);
        assert_eq!(e.id(), 7);
        assert_eq!(*e.range(), 42);
        assert_eq!(e.waiters(), 0);
        assert!(e.holder.is_locked());
        // SAFETY: Locked by new_locked().
        unsafe { e.release() };
        assert!(!e.holder.is_locked());
    }

    #[test]
    fn test_wait_release() {
        let e = Arc::new(Entry::new_locked(0, 1));
        let e1 = Arc::clone(&e);
        let ba0 = Arc::new(Barrier::new(2));
        let ba1 = Arc::clone(&ba0);
        let j = thread::spawn(move || {
            e1.add_waiter();
            ba1.wait();
            e1.wait();
        });
        ba0.wait();
        while e.waiters() == 0 {
            thread::yield_now();
        }
        // SAFETY: Locked by new_locked().
        unsafe { e.release() };
        j.join().expect("Waiter panicked.");
        assert_eq!(e.waiters(), 0);
        assert!(!e.holder.is_locked());
    }

    #[test]
    fn test_wait_until_timeout() {
        let e = Entry::new_locked(0, 1);
        e.add_waiter();
        assert!(!e.wait_until(Instant::now() + Duration::from_millis(10)));
        assert_eq!(e.waiters(), 0);
        // SAFETY: Locked by new_locked().
        unsafe { e.release() };
        e.add_waiter();
        assert!(e.wait_until(Instant::now() + Duration::from_millis(10)));
    }
}

// vim: ts=4 sw=4 expandtab
