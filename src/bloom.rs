// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Bloom-matrix query engine.
//!
//! Instead of one bit vector per term, the index keeps one bit vector per
//! *Bloom bit position*: a 2-D matrix of `bits` rows over the document
//! universe. A term's membership vector is derived at query time by hashing
//! the term into `k` positions and AND-ing those `k` rows. Documents the term
//! was inserted for survive every AND (no false negatives); unrelated
//! documents survive only if colliding terms set all `k` of their bits
//! (false positives, bounded by the `(bits, hashes)` build parameters — a
//! property of the encoding, not a query-time defect to fix).
//!
//! # Folding
//!
//! REQUIRE pools every term's probe bits into **one** sorted list and
//! AND-folds the whole pool in a single pass: AND-ing terms T1 and T2 is the
//! same as AND-ing their k1 + k2 matrix rows regardless of grouping, and one
//! pooled fold dedupes colliding probes across terms and short-circuits
//! earlier. CONTAIN and EXCLUDE need each term's own membership vector first
//! (OR distributes over nothing), so they AND-fold per term and OR across
//! terms; EXCLUDE then inverts. Cross-mode combination is identical to the
//! dense engine's.

use crate::bitset::{combine_rows, BitVec, ModeFold};
use crate::hash::murmur3_x64_128;
use crate::sort::sort_indices;
use crate::types::{Mode, Query, QueryError, QueryResults, MAX_QUERY_TERMS, MAX_RESULTS};
use serde::{Deserialize, Serialize};

/// Hash seed shared by the build and query sides.
const PROBE_SEED: u32 = 0;

/// The shared Bloom bit matrix: one document bit vector per bit position.
///
/// `(bits, hashes)` are fixed per index build and must match between build
/// and query — a mismatch silently probes the wrong rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BloomMatrix {
    bits: usize,
    hashes: u32,
    docs: usize,
    rows: Vec<BitVec>,
}

impl BloomMatrix {
    /// An empty matrix of `bits` rows over `docs` documents, probed `hashes`
    /// times per term.
    ///
    /// # Panics
    ///
    /// `bits` and `hashes` must be nonzero; both are build-time constants.
    pub fn new(bits: usize, hashes: u32, docs: usize) -> Self {
        assert!(bits > 0, "bloom matrix needs at least one bit row");
        assert!(hashes > 0, "bloom matrix needs at least one hash probe");
        BloomMatrix {
            bits,
            hashes,
            docs,
            rows: vec![BitVec::new(docs); bits],
        }
    }

    /// Build-side insert: set the document bit in each probed row.
    pub fn insert(&mut self, term: &str, doc: u32) {
        let (a, b) = murmur3_x64_128(term.as_bytes(), PROBE_SEED);
        for i in 0..self.hashes {
            let bit = probe_bit(a, b, i, self.bits);
            self.rows[bit].set(doc);
        }
    }

    /// Number of bit rows.
    pub fn bit_count(&self) -> usize {
        self.bits
    }

    /// Probes per term.
    pub fn hash_count(&self) -> u32 {
        self.hashes
    }

    /// Document universe size.
    pub fn doc_count(&self) -> usize {
        self.docs
    }

    pub(crate) fn rows(&self) -> &[BitVec] {
        &self.rows
    }

    /// Append the probe bit positions for `term` to `out`.
    fn probe_into(&self, term: &str, out: &mut Vec<usize>) {
        let (a, b) = murmur3_x64_128(term.as_bytes(), PROBE_SEED);
        for i in 0..self.hashes {
            out.push(probe_bit(a, b, i, self.bits));
        }
    }
}

/// Probe `i` of a term hashed to halves `(a, b)`.
#[inline]
fn probe_bit(a: u64, b: u64, i: u32, bits: usize) -> usize {
    (a.wrapping_add(u64::from(i).wrapping_mul(b)) % bits as u64) as usize
}

/// Query evaluator over a [`BloomMatrix`].
#[derive(Debug)]
pub struct BloomEngine {
    matrix: BloomMatrix,
    working: BitVec,
    term_acc: BitVec,
    fold: ModeFold,
    probes: Vec<usize>,
}

impl BloomEngine {
    pub fn new(matrix: BloomMatrix) -> Self {
        let docs = matrix.doc_count();
        let probe_capacity = MAX_QUERY_TERMS * matrix.hash_count() as usize;
        BloomEngine {
            matrix,
            working: BitVec::new(docs),
            term_acc: BitVec::new(docs),
            fold: ModeFold::new(docs),
            probes: Vec::with_capacity(probe_capacity),
        }
    }

    pub fn matrix(&self) -> &BloomMatrix {
        &self.matrix
    }

    /// Evaluate one query of literal terms.
    ///
    /// Matching documents are always returned (100% recall); extra documents
    /// may appear at the encoding's false-positive rate.
    pub fn search<T: AsRef<str>>(&mut self, query: &Query<T>) -> Result<QueryResults, QueryError> {
        if query.term_count() > MAX_QUERY_TERMS {
            return Err(QueryError::TooManyTerms {
                count: query.term_count(),
                max: MAX_QUERY_TERMS,
            });
        }

        self.fold.reset();
        for mode in Mode::ALL {
            let terms = query.terms(mode);
            if terms.is_empty() {
                continue;
            }
            match mode {
                Mode::Require => self.require_fold(terms),
                Mode::Contain | Mode::Exclude => self.or_fold(mode, terms),
            }
        }

        if !self.fold.primed() {
            return Ok(QueryResults::default());
        }

        let mut documents = Vec::with_capacity(MAX_RESULTS + 1);
        let count = self.fold.collect_into(&mut documents, MAX_RESULTS + 1);
        let more = count == MAX_RESULTS + 1;
        if more {
            documents.truncate(MAX_RESULTS);
        }
        Ok(QueryResults { documents, more })
    }

    /// Pool every term's probes into one sorted AND fold.
    fn require_fold<T: AsRef<str>>(&mut self, terms: &[T]) {
        self.probes.clear();
        for term in terms {
            self.matrix.probe_into(term.as_ref(), &mut self.probes);
        }
        sort_indices(&mut self.probes);
        combine_rows(&mut self.working, self.matrix.rows(), &self.probes, Mode::Require);
        self.fold.absorb(&self.working);
    }

    /// Per-term AND fold, OR across terms, inversion for Exclude, then the
    /// named AND-into-accumulator step. Exclude never shares Contain's path.
    fn or_fold<T: AsRef<str>>(&mut self, mode: Mode, terms: &[T]) {
        for (term_no, term) in terms.iter().enumerate() {
            self.probes.clear();
            self.matrix.probe_into(term.as_ref(), &mut self.probes);
            sort_indices(&mut self.probes);
            combine_rows(&mut self.working, self.matrix.rows(), &self.probes, Mode::Require);
            if term_no == 0 {
                self.term_acc.copy_from(&self.working);
            } else {
                self.term_acc.or(&self.working);
            }
        }
        if mode == Mode::Exclude {
            self.term_acc.not();
        }
        self.fold.absorb(&self.term_acc);
    }
}
