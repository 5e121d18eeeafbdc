// -*- coding: utf-8 -*-
//
// Copyright 2021-2025 Michael Büsch <m@bues.ch>
//
// Licensed under the Apache License version 2.0
// or the MIT license, at your option.
// SPDX-License-Identifier: Apache-2.0 OR MIT
//

//! Generic multi-thread range lock manager.
//!
//! [RangeLock] lets threads take exclusive ownership of arbitrary ranges of a shared keyspace.
//! Two ranges can be held at the same time, if a caller supplied [Overlap] predicate
//! says they don't conflict. The administrative and the per-range holder lock
//! primitives are pluggable via [lock_api::RawMutex].
//!
//! [VecRangeLock] builds on top of it to protect the elements of a [Vec].

mod entry;
mod error;
mod lockedranges;
mod overlap;
mod rangelock;
mod util;
mod vecrangelock;

pub use error::{Error, Result, TryLockError, TryLockResult};
pub use overlap::{Extent, HalfOpen, Overlap};
pub use rangelock::{
    DefaultAdminLock,
    DefaultHolderLock,
    LockHandle,
    RangeLock,
    RangeLockGuard,
};
pub use vecrangelock::{
    VecRangeLock,
    VecRangeLockGuard,
};

// vim: ts=4 sw=4 expandtab
