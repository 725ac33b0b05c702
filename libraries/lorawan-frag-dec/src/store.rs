// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! The fragment block-storage capability interface.
//!
//! Grounded on `tickfs::flash_controller::FlashController`'s
//! `read_region`/`write_region` shape (see `capsules/src/kv_store.rs`): a
//! small trait with an associated error type, passed by reference into the
//! decoder rather than baked in as a concrete medium. This lets tests use
//! an in-memory double and lets real boards plug in whatever flash/EEPROM
//! driver they have, without this crate depending on `kernel`.

/// Byte-addressable persistent storage for fragment bodies.
///
/// The decoder addresses uncoded slot `k` at byte offset `k * frag_size`
/// and never reads or writes outside `[0, m * frag_size)`.
pub trait FragmentStore {
    /// Error type surfaced by a failed read or write.
    type Error;

    /// Populates `buf` with `buf.len()` bytes starting at `offset`.
    fn read(&mut self, offset: u32, buf: &mut [u8]) -> Result<(), Self::Error>;

    /// Persists `buf` starting at `offset`.
    fn write(&mut self, offset: u32, buf: &[u8]) -> Result<(), Self::Error>;
}
