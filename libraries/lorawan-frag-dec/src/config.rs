// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Compile-time configuration envelope.
//!
//! A board picks `IMAGE_SIZE`, `MIN_FRAG_SIZE`, `MAX_FRAG_SIZE`, and
//! `MAX_REDUNDANCY_PERCENT` the way a Tock board crate picks Kconfig-style
//! constants for a capsule's static bitmaps (compare
//! `FRAG_MAX_NB`/`FRAG_TOLERANCE` in `frag_dec_jiapengli.c`). The derived
//! `m_max`/`t_max` bound how large the const-generic `BitSet`/`TriMatrix`
//! word arrays a `Decoder` instance needs to be.

/// Upper bound, in fragment count, on the number of uncoded fragments a
/// board-sized decoder can track: `ceil(image_size / min_frag_size) + 1`.
pub const fn m_max(image_size: usize, min_frag_size: usize) -> usize {
    image_size.div_ceil(min_frag_size) + 1
}

/// Upper bound on recoverable loss for a given `m_max` and redundancy
/// percentage: `floor(m_max * redundancy / 100)`.
pub const fn t_max(m_max: usize, max_redundancy_percent: usize) -> usize {
    (m_max * max_redundancy_percent) / 100
}

/// Number of `u32` words needed to hold `bits` bits.
pub const fn words_for_bits(bits: usize) -> usize {
    bits.div_ceil(32)
}

/// Runtime session parameters, immutable once a [`crate::decoder::Decoder`]
/// is created. Corresponds to `frag_dec_cfg_t` in `frag_dec_jiapengli.c`.
#[derive(Debug, Clone, Copy)]
pub struct DecoderConfig {
    /// Number of uncoded fragments in the image (`M`).
    pub m: usize,
    /// Fragment body size in bytes.
    pub frag_size: usize,
    /// Tolerance: maximum number of lost uncoded fragments this decoder
    /// will attempt to recover (`T`).
    pub tolerance: usize,
}
