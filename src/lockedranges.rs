// -*- coding: utf-8 -*-
//
// Copyright 2021-2025 Michael Büsch <m@bues.ch>
//
// Licensed under the Apache License version 2.0
// or the MIT license, at your option.
// SPDX-License-Identifier: Apache-2.0 OR MIT
//

use crate::{entry::LockEntry, error::Result, overlap::Overlap};
use std::sync::Arc;

/// Set of the currently active lock entries.
///
/// The set is unordered. Conflicts are found by a full scan
/// against the caller supplied predicate.
#[derive(Debug)]
pub struct LockedRanges<R, H> {
    entries: Vec<Arc<LockEntry<R, H>>>,
    next_id: u64,
}

impl<R, H> LockedRanges<R, H> {
    #[inline]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 0,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Find an active entry that conflicts with `range`.
    pub fn find_conflict<P>(&self, range: &R, predicate: &P) -> Option<Arc<LockEntry<R, H>>>
    where
        P: Overlap<R>,
    {
        self.entries
            .iter()
            .find(|e| predicate.overlaps(range, e.range()))
            .map(Arc::clone)
    }

    /// Allocate an id and room for one more entry.
    ///
    /// After this succeeded, [Self::insert] cannot fail.
    #[inline]
    pub fn prepare_insert(&mut self) -> Result<u64> {
        self.entries.try_reserve(1)?;
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        Ok(id)
    }

    #[inline]
    pub fn insert(&mut self, entry: Arc<LockEntry<R, H>>) {
        debug_assert!(self.entries.len() < self.entries.capacity());
        self.entries.push(entry);
    }

    /// Remove `entry` from the set.
    /// Returns `false`, if the entry is not in the set.
    #[inline]
    pub fn remove(&mut self, entry: &Arc<LockEntry<R, H>>) -> bool {
        match self.entries.iter().position(|e| Arc::ptr_eq(e, entry)) {
            Some(index) => {
                self.entries.swap_remove(index);
                true
            }
            None => false,
        }
    }

    /// Forget all entries. Their holder locks stay as they are.
    #[inline]
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}


// vim: ts=4 sw=4 expandtab
