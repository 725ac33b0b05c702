// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Outcome and error types for [`crate::decoder::Decoder::feed`].
//!
//! These replace an overloaded `int` return code
//! (`FRAG_DEC_ONGOING`/`FRAG_DEC_ERR_INVALID_FRAME`/
//! `FRAG_DEC_ERR_TOO_MANY_FRAME_LOST`/residual-count) with a sum type, so
//! callers match on cases instead of comparing against magic negative
//! numbers.

/// Result of feeding a single fragment to the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedOutcome {
    /// The session continues; keep delivering fragments.
    Ongoing,
    /// All uncoded fragments are now recovered and persisted to the block
    /// store. `recovered_lost` is the number of fragments that were missing
    /// at the time recovery completed (for diagnostics only).
    Done {
        /// Number of fragments that had to be recovered (0 if every uncoded
        /// fragment arrived directly).
        recovered_lost: u16,
    },
}

/// Recoverable and unrecoverable failures of [`crate::decoder::Decoder::feed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError<E> {
    /// `payload.len() != frag_size`. The fragment is dropped; the session
    /// may continue.
    InvalidFrame,
    /// More than `T` uncoded fragments were lost by the time the first
    /// coded fragment arrived. Unrecoverable; the caller should abandon the
    /// session.
    TooManyLost,
    /// The block store reported an I/O failure.
    Store(E),
}

impl<E> From<E> for DecodeError<E> {
    fn from(e: E) -> Self {
        DecodeError::Store(e)
    }
}
