// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! The decoder state machine and the online XOR-reduction engine.
//!
//! Ported from `frag_dec()` in
//! `original_source/subsys/lorawan/services/frag_dec_jiapengli.c`, with the
//! overloaded `int` return value (`FRAG_DEC_ONGOING`,
//! `FRAG_DEC_ERR_INVALID_FRAME`, `FRAG_DEC_ERR_TOO_MANY_FRAME_LOST`, or the
//! residual lost-frame count on success) re-expressed as
//! [`FeedOutcome`]/[`DecodeError`].

use crate::bitvec::BitSet;
use crate::config::DecoderConfig;
use crate::error::{DecodeError, FeedOutcome};
use crate::parity;
use crate::store::FragmentStore;
use crate::trimat::TriMatrix;

/// Decoder lifecycle state. Monotonic: `Uncoded -> Coded -> Done`, never
/// regresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecoderStatus {
    /// Waiting for uncoded fragments; `frameCounter in [1, M]` absorbs
    /// directly into the block store.
    Uncoded,
    /// Waiting for coded fragments; uncoded fragments delivered from here
    /// on are processed through the coded path instead.
    Coded,
    /// Terminal: every uncoded fragment is recovered and persisted.
    Done,
}

fn xor_bytes(dst: &mut [u8], src: &[u8]) {
    for (d, s) in dst.iter_mut().zip(src.iter()) {
        *d ^= *s;
    }
}

/// The fragmented-transport decoder.
///
/// `M_WORDS` and `FRAG_MAX` must be sized from the session's `m` and
/// `frag_size` (via [`crate::config::words_for_bits`] and the board's
/// `MAX_FRAG_SIZE`); `T_WORDS` and `TRI_WORDS` likewise from `tolerance`
/// (`TRI_WORDS` must cover `tolerance * tolerance` bits). All storage is
/// inline, fixed-capacity, and owned by the `Decoder` value — no heap
/// allocation, matching the "constant memory proportional to M and T"
/// requirement of a memory-constrained receiver.
pub struct Decoder<
    const M_WORDS: usize,
    const T_WORDS: usize,
    const TRI_WORDS: usize,
    const FRAG_MAX: usize,
> {
    config: DecoderConfig,
    status: DecoderStatus,
    lost_frm_bm: BitSet<M_WORDS>,
    lost_frame_count: usize,
    lost_frm_matrix_bm: TriMatrix<TRI_WORDS>,
    filled_lost_frm_count: usize,
    matrix_line_bm: BitSet<M_WORDS>,
    matched_lost_frm_bm0: BitSet<T_WORDS>,
    matched_lost_frm_bm1: BitSet<T_WORDS>,
    xor_row_data_buf: [u8; FRAG_MAX],
    row_data_buf: [u8; FRAG_MAX],
}

impl<const M_WORDS: usize, const T_WORDS: usize, const TRI_WORDS: usize, const FRAG_MAX: usize>
    Decoder<M_WORDS, T_WORDS, TRI_WORDS, FRAG_MAX>
{
    /// Creates a decoder for a new session: zero-fills the block store's
    /// first `m * frag_size` bytes, marks every uncoded slot lost, and sets
    /// `status = Uncoded`.
    pub fn new<S: FragmentStore>(config: DecoderConfig, store: &mut S) -> Result<Self, S::Error> {
        debug_assert!(config.m > 0);
        debug_assert!(config.frag_size > 0 && config.frag_size <= FRAG_MAX);
        debug_assert!(config.tolerance <= config.m);

        let mut lost_frm_bm = BitSet::new();
        for i in 0..config.m {
            lost_frm_bm.set(i);
        }

        let zero = [0u8; FRAG_MAX];
        for slot in 0..config.m {
            store.write((slot * config.frag_size) as u32, &zero[..config.frag_size])?;
        }

        log::debug!(
            "lorawan-frag-dec: init m={} frag_size={} tolerance={}",
            config.m,
            config.frag_size,
            config.tolerance
        );

        Ok(Decoder {
            config,
            status: DecoderStatus::Uncoded,
            lost_frm_bm,
            lost_frame_count: config.m,
            lost_frm_matrix_bm: TriMatrix::new(),
            filled_lost_frm_count: 0,
            matrix_line_bm: BitSet::new(),
            matched_lost_frm_bm0: BitSet::new(),
            matched_lost_frm_bm1: BitSet::new(),
            xor_row_data_buf: [0; FRAG_MAX],
            row_data_buf: [0; FRAG_MAX],
        })
    }

    /// Number of uncoded fragments not yet recovered. Diagnostic only: the
    /// reconstructed image lives in the block store, not in this value.
    pub fn lost_frame_count(&self) -> usize {
        self.lost_frame_count
    }

    /// Whether the decoder has finished (terminal state).
    pub fn is_done(&self) -> bool {
        self.status == DecoderStatus::Done
    }

    /// Processes one received fragment.
    ///
    /// `frame_counter` is 1-based: `[1, m]` for uncoded fragments, `> m`
    /// for coded ones. Once [`DecoderStatus::Done`] is reached, further
    /// calls are side-effect-free and return `Done` again.
    pub fn feed<S: FragmentStore>(
        &mut self,
        frame_counter: u16,
        payload: &[u8],
        store: &mut S,
    ) -> Result<FeedOutcome, DecodeError<S::Error>> {
        if self.status == DecoderStatus::Done {
            return Ok(FeedOutcome::Done {
                recovered_lost: self.lost_frame_count as u16,
            });
        }

        if payload.len() != self.config.frag_size {
            log::warn!(
                "lorawan-frag-dec: invalid frame length {} (want {})",
                payload.len(),
                self.config.frag_size
            );
            return Err(DecodeError::InvalidFrame);
        }

        if self.status == DecoderStatus::Uncoded && (frame_counter as usize) <= self.config.m {
            self.absorb_uncoded(frame_counter, payload, store)
        } else {
            self.absorb_coded(frame_counter, payload, store)
        }
    }

    fn absorb_uncoded<S: FragmentStore>(
        &mut self,
        frame_counter: u16,
        payload: &[u8],
        store: &mut S,
    ) -> Result<FeedOutcome, DecodeError<S::Error>> {
        let i = frame_counter as usize - 1;
        if self.lost_frm_bm.test(i) {
            self.lost_frm_bm.clear(i);
            self.lost_frame_count -= 1;
        }
        store.write((i * self.config.frag_size) as u32, payload)?;

        if self.lost_frame_count == 0 {
            self.status = DecoderStatus::Done;
            log::debug!(
                "lorawan-frag-dec: all {} uncoded fragments received directly",
                self.config.m
            );
            return Ok(FeedOutcome::Done { recovered_lost: 0 });
        }
        Ok(FeedOutcome::Ongoing)
    }

    fn absorb_coded<S: FragmentStore>(
        &mut self,
        frame_counter: u16,
        payload: &[u8],
        store: &mut S,
    ) -> Result<FeedOutcome, DecodeError<S::Error>> {
        if self.status == DecoderStatus::Uncoded {
            self.status = DecoderStatus::Coded;
            log::debug!(
                "lorawan-frag-dec: transition to coded phase, L={}",
                self.lost_frame_count
            );
        }

        // lost_frame_count is now frozen; the triangular store's dimensions
        // depend on it and must never change again.
        if self.lost_frame_count > self.config.tolerance {
            log::warn!(
                "lorawan-frag-dec: too many lost fragments: {} > tolerance {}",
                self.lost_frame_count,
                self.config.tolerance
            );
            return Err(DecodeError::TooManyLost);
        }

        let m = self.config.m;
        let l = self.lost_frame_count;
        let frag_size = self.config.frag_size;

        // Step A: residue against already-received uncoded frames.
        self.matched_lost_frm_bm0.clear_region(l);
        self.matched_lost_frm_bm1.clear_region(l);
        self.xor_row_data_buf[..frag_size].copy_from_slice(payload);

        // frame_counter <= m can happen for a late uncoded-numbered
        // duplicate delivered after the Coded transition; this wraps the
        // same way the original uint16_t subtraction does rather than
        // panicking.
        let n = frame_counter.wrapping_sub(m as u16) as u32;
        parity::parity_row(m, n, &mut self.matrix_line_bm);

        let mut unmatched = 0usize;
        for i in 0..m {
            if !self.matrix_line_bm.test(i) {
                continue;
            }
            if self.lost_frm_bm.test(i) {
                let k = self.lost_frm_bm.popcount_prefix(i) - 1;
                self.matched_lost_frm_bm0.set(k);
                unmatched += 1;
            } else {
                store.read((i * frag_size) as u32, &mut self.row_data_buf[..frag_size])?;
                xor_bytes(
                    &mut self.xor_row_data_buf[..frag_size],
                    &self.row_data_buf[..frag_size],
                );
            }
        }

        if unmatched == 0 {
            log::trace!("lorawan-frag-dec: coded fragment {} carried no new information (fully known support)", frame_counter);
            return Ok(FeedOutcome::Ongoing);
        }

        // Step B: reduce residue against the history matrix.
        let mut stored_new_info = false;
        loop {
            let lost_frame_index = self
                .matched_lost_frm_bm0
                .find_first_set(l)
                .expect("residue became empty without the loop observing it");
            let frame_index = self
                .lost_frm_bm
                .find_nth_set(lost_frame_index + 1, m)
                .expect("lost-frame coordinate must map back to a lost global index");

            if !self.lost_frm_matrix_bm.has_pivot(lost_frame_index, l) {
                self.lost_frm_matrix_bm
                    .write_line(lost_frame_index, &self.matched_lost_frm_bm0, l);
                store.write(
                    (frame_index * frag_size) as u32,
                    &self.xor_row_data_buf[..frag_size],
                )?;
                self.filled_lost_frm_count += 1;
                stored_new_info = true;
                log::trace!(
                    "lorawan-frag-dec: stored pivot row {} (global slot {})",
                    lost_frame_index,
                    frame_index
                );
                break;
            }

            self.lost_frm_matrix_bm
                .read_line(lost_frame_index, &mut self.matched_lost_frm_bm1, l);
            self.matched_lost_frm_bm0
                .xor_in_place(&self.matched_lost_frm_bm1, l);
            store.read((frame_index * frag_size) as u32, &mut self.row_data_buf[..frag_size])?;
            xor_bytes(
                &mut self.xor_row_data_buf[..frag_size],
                &self.row_data_buf[..frag_size],
            );

            if self.matched_lost_frm_bm0.is_region_cleared(l) {
                log::trace!(
                    "lorawan-frag-dec: coded fragment {} was linearly dependent",
                    frame_counter
                );
                break;
            }
        }

        if !stored_new_info {
            return Ok(FeedOutcome::Ongoing);
        }

        // Step C: completion check.
        if self.filled_lost_frm_count != l {
            return Ok(FeedOutcome::Ongoing);
        }
        if l >= 2 {
            self.back_substitute(store)?;
        }
        self.status = DecoderStatus::Done;
        log::debug!(
            "lorawan-frag-dec: recovery complete, {} fragment(s) recovered",
            l
        );
        Ok(FeedOutcome::Done {
            recovered_lost: l as u16,
        })
    }

    /// Step D: walks the triangular store in reverse to recover every
    /// missing frame body. Only called once every row of an `L >= 2` store
    /// holds a pivot.
    fn back_substitute<S: FragmentStore>(
        &mut self,
        store: &mut S,
    ) -> Result<(), DecodeError<S::Error>> {
        let m = self.config.m;
        let l = self.lost_frame_count;
        let frag_size = self.config.frag_size;

        let mut i = l - 2;
        loop {
            let frame_index = self
                .lost_frm_bm
                .find_nth_set(i + 1, m)
                .expect("lost-frame coordinate must map back to a lost global index");
            store.read((frame_index * frag_size) as u32, &mut self.xor_row_data_buf[..frag_size])?;
            self.lost_frm_matrix_bm
                .read_line(i, &mut self.matched_lost_frm_bm1, l);

            let mut j = l - 1;
            while j > i {
                if self.matched_lost_frm_bm1.test(j) {
                    let lost_frame_index = self
                        .lost_frm_bm
                        .find_nth_set(j + 1, m)
                        .expect("lost-frame coordinate must map back to a lost global index");
                    store.read(
                        (lost_frame_index * frag_size) as u32,
                        &mut self.row_data_buf[..frag_size],
                    )?;
                    self.lost_frm_matrix_bm
                        .read_line(j, &mut self.matched_lost_frm_bm0, l);
                    self.matched_lost_frm_bm1
                        .xor_in_place(&self.matched_lost_frm_bm0, l);
                    xor_bytes(
                        &mut self.xor_row_data_buf[..frag_size],
                        &self.row_data_buf[..frag_size],
                    );
                    self.lost_frm_matrix_bm
                        .write_line(i, &self.matched_lost_frm_bm1, l);
                }
                if j == 0 {
                    break;
                }
                j -= 1;
            }

            store.write(
                (frame_index * frag_size) as u32,
                &self.xor_row_data_buf[..frag_size],
            )?;

            if i == 0 {
                break;
            }
            i -= 1;
        }
        Ok(())
    }
}
