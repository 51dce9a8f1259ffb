// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Dense bit-matrix query engine.
//!
//! The simplest of the three encodings: one pre-built bit vector per term
//! (row), produced by the index build and read-only from then on. A query
//! arrives as row indices; per mode the engine sorts them, skips adjacent
//! duplicates, folds the rows (AND with early exit for Require, OR for
//! Contain/Exclude, inversion for Exclude), then ANDs the mode results
//! together in mode order and collects up to `MAX_RESULTS + 1` ids — the
//! extra one is the overflow signal.
//!
//! # Scratch ownership
//!
//! The engine owns its working vector, cross-mode accumulator, and index
//! scratch, and resets them at the top of every [`MatrixEngine::search`].
//! One query start-to-finish, no suspension, no sharing: the single-threaded
//! synchronous contract the whole crate assumes.

use crate::bitset::{combine_rows, BitVec, ModeFold};
use crate::sort::sort_indices;
use crate::types::{Mode, Query, QueryError, QueryResults, MAX_QUERY_TERMS, MAX_RESULTS};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One bit vector per term over a fixed document universe.
///
/// Built offline, queried read-only. `set` exists so embedders and tests can
/// hand an in-memory matrix over; there is no mutation at query time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BitMatrix {
    rows: Vec<BitVec>,
    docs: usize,
}

impl BitMatrix {
    /// An all-zero matrix of `rows` terms over `docs` documents.
    pub fn new(rows: usize, docs: usize) -> Self {
        BitMatrix {
            rows: vec![BitVec::new(docs); rows],
            docs,
        }
    }

    /// Mark `doc` as present in term `row`.
    pub fn set(&mut self, row: usize, doc: u32) {
        self.rows[row].set(doc);
    }

    /// Number of term rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Document universe size.
    pub fn doc_count(&self) -> usize {
        self.docs
    }

    pub(crate) fn rows(&self) -> &[BitVec] {
        &self.rows
    }
}

/// Term → row lookup for resolving literal words to matrix rows.
///
/// Row order is the build order of the term list; a term absent from the
/// table has no row (and therefore matches nothing).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TermTable {
    rows: HashMap<String, usize>,
}

impl TermTable {
    /// Build from terms in row order.
    pub fn from_terms<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TermTable {
            rows: terms
                .into_iter()
                .enumerate()
                .map(|(row, term)| (term.into(), row))
                .collect(),
        }
    }

    /// The row for a term, if indexed.
    pub fn row(&self, term: &str) -> Option<usize> {
        self.rows.get(term).copied()
    }

    /// Number of indexed terms.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Query evaluator over a [`BitMatrix`].
#[derive(Debug)]
pub struct MatrixEngine {
    matrix: BitMatrix,
    working: BitVec,
    fold: ModeFold,
    indices: Vec<usize>,
}

impl MatrixEngine {
    pub fn new(matrix: BitMatrix) -> Self {
        let bits = matrix.doc_count();
        MatrixEngine {
            matrix,
            working: BitVec::new(bits),
            fold: ModeFold::new(bits),
            indices: Vec::with_capacity(MAX_QUERY_TERMS),
        }
    }

    pub fn matrix(&self) -> &BitMatrix {
        &self.matrix
    }

    /// Evaluate one query.
    ///
    /// Returns the capped, overflow-flagged result list. A query where no
    /// mode lists any term is a valid no-match outcome, not an error.
    pub fn search(&mut self, query: &Query<usize>) -> Result<QueryResults, QueryError> {
        if query.term_count() > MAX_QUERY_TERMS {
            return Err(QueryError::TooManyTerms {
                count: query.term_count(),
                max: MAX_QUERY_TERMS,
            });
        }
        for mode in Mode::ALL {
            for &row in query.terms(mode) {
                if row >= self.matrix.row_count() {
                    return Err(QueryError::RowOutOfRange {
                        row,
                        rows: self.matrix.row_count(),
                    });
                }
            }
        }

        self.fold.reset();
        for mode in Mode::ALL {
            let terms = query.terms(mode);
            if terms.is_empty() {
                continue;
            }
            self.indices.clear();
            self.indices.extend_from_slice(terms);
            sort_indices(&mut self.indices);
            combine_rows(&mut self.working, self.matrix.rows(), &self.indices, mode);
            self.fold.absorb(&self.working);
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
}
