// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Receiver-side decoder for the LoRaWAN Fragmented Data Block Transport
//! application layer (TS004-1.0.0).
//!
//! An image is split by the sender into `m` fixed-size uncoded fragments,
//! numbered `1..=m`, plus a stream of coded fragments numbered `m+1..`,
//! each the XOR of a pseudorandomly chosen subset of the uncoded fragments.
//! This crate reassembles the image from whatever subset arrives, recovering
//! up to `tolerance` missing uncoded fragments by online Gaussian
//! elimination over GF(2), in memory proportional to `m` and `tolerance`
//! rather than to the image size. Fragment bodies are never held in RAM;
//! they are read from and written to a [`FragmentStore`] the caller supplies
//! (flash, EEPROM, or anything else byte-addressable).
//!
//! ```ignore
//! use lorawan_frag_dec::{config, Decoder, FeedOutcome};
//!
//! const M_MAX: usize = config::m_max(IMAGE_SIZE, MIN_FRAG_SIZE);
//! const T_MAX: usize = config::t_max(M_MAX, MAX_REDUNDANCY_PERCENT);
//! const M_WORDS: usize = config::words_for_bits(M_MAX);
//! const T_WORDS: usize = config::words_for_bits(T_MAX);
//! const TRI_WORDS: usize = config::words_for_bits(T_MAX * T_MAX);
//!
//! let mut decoder: Decoder<M_WORDS, T_WORDS, TRI_WORDS, MAX_FRAG_SIZE> =
//!     Decoder::new(cfg, &mut store)?;
//! match decoder.feed(frame_counter, &payload, &mut store)? {
//!     FeedOutcome::Ongoing => {}
//!     FeedOutcome::Done { recovered_lost } => { /* image complete */ }
//! }
//! ```
#![cfg_attr(not(test), no_std)]

pub mod bitvec;
pub mod config;
pub mod decoder;
pub mod error;
pub mod parity;
pub mod store;
mod trimat;

pub use decoder::Decoder;
pub use error::{DecodeError, FeedOutcome};
pub use store::FragmentStore;
