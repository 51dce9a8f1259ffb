// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Fixed-width bit-vector algebra.
//!
//! Both bit-vector engines (dense matrix and Bloom) are built from the same
//! four primitives: in-place AND, in-place OR, in-place NOT, and an ascending
//! scan that collects set-bit positions as document ids. On top of those sit
//! two shared folds:
//!
//! - [`combine_rows`] — fold a sorted list of matrix row indices into one
//!   vector (AND for Require with short-circuit on all-zero, OR for
//!   Contain/Exclude, inversion for Exclude).
//! - [`ModeFold`] — the cross-mode accumulator: the first mode that produces
//!   a vector primes it, every later mode ANDs in.
//!
//! # Bit order
//!
//! Bit `i` of the universe lives in word `i / 64`, counted from the most
//! significant bit: `doc = word_index * 64 + leading_zeros`. The collect scan
//! therefore emits ids in ascending order without sorting.
//!
//! # Invariants
//!
//! - All vectors combined together share one `bits` universe size, fixed at
//!   construction. Mismatches are a caller bug (`debug_assert`ed).
//! - NOT masks the padding tail of the last word so inverted vectors never
//!   produce phantom ids beyond the universe.

use crate::types::{DocId, Mode};
use serde::{Deserialize, Serialize};

const ELEM_BITS: usize = 64;
const ELEM_MSB: u64 = 1 << (ELEM_BITS - 1);

/// A fixed-length bit vector over a document universe of `bits` entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitVec {
    words: Vec<u64>,
    bits: usize,
}

impl BitVec {
    /// All-zero vector over a universe of `bits` documents.
    pub fn new(bits: usize) -> Self {
        BitVec {
            words: vec![0; bits.div_ceil(ELEM_BITS)],
            bits,
        }
    }

    /// Universe size in bits.
    #[inline]
    pub fn bits(&self) -> usize {
        self.bits
    }

    /// Set the bit for one document.
    ///
    /// Out-of-universe ids are a caller bug.
    pub fn set(&mut self, doc: u32) {
        debug_assert!((doc as usize) < self.bits);
        self.words[doc as usize / ELEM_BITS] |= ELEM_MSB >> (doc as usize % ELEM_BITS);
    }

    /// Whether the bit for `doc` is set.
    pub fn contains(&self, doc: u32) -> bool {
        debug_assert!((doc as usize) < self.bits);
        self.words[doc as usize / ELEM_BITS] & (ELEM_MSB >> (doc as usize % ELEM_BITS)) != 0
    }

    /// Zero every word.
    pub fn clear(&mut self) {
        self.words.fill(0);
    }

    /// Overwrite `self` with the contents of `other`.
    pub fn copy_from(&mut self, other: &BitVec) {
        debug_assert_eq!(self.bits, other.bits);
        self.words.copy_from_slice(&other.words);
    }

    /// AND `other` into `self`. Returns `false` if the result is all-zero —
    /// the cheap early-exit signal for AND folds.
    pub fn and(&mut self, other: &BitVec) -> bool {
        debug_assert_eq!(self.bits, other.bits);
        let mut nonzero = 0u64;
        for (a, b) in self.words.iter_mut().zip(&other.words) {
            *a &= b;
            nonzero |= *a;
        }
        nonzero != 0
    }

    /// OR `other` into `self`. Returns `false` if the result is all-zero.
    pub fn or(&mut self, other: &BitVec) -> bool {
        debug_assert_eq!(self.bits, other.bits);
        let mut nonzero = 0u64;
        for (a, b) in self.words.iter_mut().zip(&other.words) {
            *a |= b;
            nonzero |= *a;
        }
        nonzero != 0
    }

    /// Flip every bit, then clear the padding tail beyond the universe.
    pub fn not(&mut self) {
        for w in &mut self.words {
            *w = !*w;
        }
        let tail = self.bits % ELEM_BITS;
        if tail != 0 {
            if let Some(last) = self.words.last_mut() {
                *last &= !0u64 << (ELEM_BITS - tail);
            }
        }
    }

    /// Append set-bit positions ascending until `max` ids are collected or
    /// the vector is exhausted. Returns how many were appended.
    pub fn collect_into(&self, out: &mut Vec<DocId>, max: usize) -> usize {
        let start = out.len();
        for (n, &word) in self.words.iter().enumerate() {
            let anchor = (n * ELEM_BITS) as u32;
            let mut elem = word;
            while elem != 0 {
                let bit = elem.leading_zeros();
                out.push(DocId(anchor + bit));
                if out.len() - start == max {
                    return max;
                }
                elem &= !(ELEM_MSB >> bit);
            }
        }
        out.len() - start
    }
}

/// Fold the rows named by `indices` into `dst`.
///
/// `indices` must be sorted ascending so duplicates are adjacent and get
/// skipped; duplicates arise when two term references hash or alias to the
/// same row. Require folds with AND and stops as soon as the accumulator goes
/// all-zero (further ANDs cannot resurrect a bit). Contain and Exclude fold
/// with OR; Exclude inverts the result afterwards.
///
/// `indices` must not be empty.
pub fn combine_rows(dst: &mut BitVec, rows: &[BitVec], indices: &[usize], mode: Mode) {
    dst.copy_from(&rows[indices[0]]);
    for i in 1..indices.len() {
        let idx = indices[i];
        if idx == indices[i - 1] {
            continue;
        }
        let nonzero = match mode {
            Mode::Require => dst.and(&rows[idx]),
            Mode::Contain | Mode::Exclude => dst.or(&rows[idx]),
        };
        if !nonzero && mode == Mode::Require {
            break;
        }
    }
    if mode == Mode::Exclude {
        dst.not();
    }
}

/// Cross-mode accumulator.
///
/// Modes run in [`Mode::ALL`] order; the first one that produces a vector
/// initializes the fold, later ones AND in. `primed` distinguishes "no mode
/// contributed" (a valid no-match outcome) from "contributed and empty".
#[derive(Debug)]
pub struct ModeFold {
    result: BitVec,
    primed: bool,
}

impl ModeFold {
    pub fn new(bits: usize) -> Self {
        ModeFold {
            result: BitVec::new(bits),
            primed: false,
        }
    }

    /// Per-query reset. Stale state from the previous query leaking into this
    /// one is a correctness bug, not just a leak.
    pub fn reset(&mut self) {
        self.result.clear();
        self.primed = false;
    }

    /// Fold one mode's finished vector into the accumulator.
    pub fn absorb(&mut self, mode_vec: &BitVec) {
        if self.primed {
            self.result.and(mode_vec);
        } else {
            self.result.copy_from(mode_vec);
            self.primed = true;
        }
    }

    /// Whether any mode has contributed.
    pub fn primed(&self) -> bool {
        self.primed
    }

    /// Collect up to `max` result ids ascending.
    pub fn collect_into(&self, out: &mut Vec<DocId>, max: usize) -> usize {
        self.result.collect_into(out, max)
    }
}
