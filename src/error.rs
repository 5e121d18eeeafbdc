// -*- coding: utf-8 -*-
//
// Copyright 2021-2025 Michael Büsch <m@bues.ch>
//
// Licensed under the Apache License version 2.0
// or the MIT license, at your option.
// SPDX-License-Identifier: Apache-2.0 OR MIT
//

use std::collections::TryReserveError;
use thiserror::Error;

/// Errors reported by [crate::RangeLock].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The manager cannot be constructed with the given configuration.
    #[error("Invalid range lock configuration: {0}")]
    Config(String),

    /// Memory for a new lock entry could not be allocated.
    /// Nothing has been locked.
    #[error("Out of memory while allocating a lock entry")]
    OutOfMemory,

    /// The manager still tracks active entries.
    #[error("Range lock still has {0} active entries")]
    ActiveEntries(usize),

    /// A timed lock request expired before the range became available.
    #[error("Timed out while waiting for a conflicting range")]
    TimedOut,
}

impl From<TryReserveError> for Error {
    fn from(_: TryReserveError) -> Self {
        Error::OutOfMemory
    }
}

/// Result type alias for range lock operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors reported by the non-blocking lock operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TryLockError {
    /// The range is contended. Nothing has been locked.
    #[error("Range is locked by someone else")]
    WouldBlock,

    /// Locking failed.
    #[error(transparent)]
    Failed(#[from] Error),
}

/// Result type alias for the non-blocking lock operations.
pub type TryLockResult<T> = std::result::Result<T, TryLockError>;


// vim: ts=4 sw=4 expandtab
