// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The building blocks of a boolean query.
//!
//! Every engine in this crate answers the same question — "which documents
//! satisfy REQUIRE ∧ CONTAIN ∧ ¬EXCLUDE?" — over a different set encoding.
//! The types here are the shared vocabulary: modes, queries, result shapes,
//! and the capacity constants all engines respect.
//!
//! # Invariants (the stuff that breaks if you ignore it)
//!
//! - **Mode order is load-bearing**: evaluation always runs
//!   Require → Contain → Exclude. The first mode that produces a vector
//!   initializes the cross-mode accumulator; later modes AND into it.
//!   Reordering modes changes which mode primes the accumulator.
//!
//! - **Capacity is fixed**: `MAX_RESULTS` and `MAX_QUERY_TERMS` are build
//!   constants. Engines validate against them; they never grow buffers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;

/// Hard ceiling on documents returned by a single query.
///
/// Engines internally look one past this (`MAX_RESULTS + 1`) so that overflow
/// is detectable: seeing the extra result proves more matches exist without
/// counting them all.
pub const MAX_RESULTS: usize = 200;

/// Hard ceiling on term references across all three modes of one query.
pub const MAX_QUERY_TERMS: usize = 64;

/// Type-safe document identifier.
///
/// Documents are dense small integers assigned at index build time; results
/// are ordered ascending by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct DocId(pub u32);

impl DocId {
    /// Get the underlying value.
    #[inline]
    pub fn get(self) -> u32 {
        self.0
    }

    /// Convert to usize for array indexing.
    #[inline]
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for DocId {
    fn from(id: u32) -> Self {
        DocId(id)
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Query mode. Ordinal-significant: see the module docs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Mode {
    /// Every listed term must match (AND).
    Require = 0,
    /// At least one listed term must match (OR).
    Contain = 1,
    /// No listed term may match (AND-NOT).
    Exclude = 2,
}

impl Mode {
    /// All modes in evaluation order.
    pub const ALL: [Mode; 3] = [Mode::Require, Mode::Contain, Mode::Exclude];
}

/// A query: one ordered term-reference list per mode.
///
/// `T` is whatever the target engine resolves a term to — a row index for the
/// dense matrix engine, a term string for the Bloom engine, a serialized
/// bitmap span for the postings engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query<T> {
    pub require: Vec<T>,
    pub contain: Vec<T>,
    pub exclude: Vec<T>,
}

impl<T> Query<T> {
    /// An empty query (matches nothing in every engine).
    pub fn new() -> Self {
        Query {
            require: Vec::new(),
            contain: Vec::new(),
            exclude: Vec::new(),
        }
    }

    /// The term list for one mode.
    pub fn terms(&self, mode: Mode) -> &[T] {
        match mode {
            Mode::Require => &self.require,
            Mode::Contain => &self.contain,
            Mode::Exclude => &self.exclude,
        }
    }

    /// Total term references across all modes.
    pub fn term_count(&self) -> usize {
        self.require.len() + self.contain.len() + self.exclude.len()
    }

    /// True if no mode lists any term.
    pub fn is_empty(&self) -> bool {
        self.term_count() == 0
    }
}

/// Capped result list: up to [`MAX_RESULTS`] ids ascending, plus an overflow
/// flag.
///
/// `more == true` means at least one further match exists beyond the returned
/// documents; the exact total is unknown (and deliberately not computed).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResults {
    pub documents: Vec<DocId>,
    pub more: bool,
}

impl QueryResults {
    /// Number of documents returned.
    pub fn count(&self) -> usize {
        self.documents.len()
    }
}

/// One page of a rank-paginated result.
///
/// `continuation` is the rank to resume from, or `None` when this page ends
/// the enumeration. `total` is the exact cardinality of the full match set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub documents: Vec<DocId>,
    pub total: u64,
    pub continuation: Option<u64>,
}

impl Page {
    /// Number of documents on this page.
    pub fn count(&self) -> usize {
        self.documents.len()
    }
}

/// Errors surfaced by query evaluation.
///
/// Capacity overflow is *not* here: it is a result flag
/// ([`QueryResults::more`] / [`Page::continuation`]), not a failure.
#[derive(Debug)]
pub enum QueryError {
    /// The query references more terms than the engine's fixed capacity.
    TooManyTerms { count: usize, max: usize },
    /// A term reference names a row outside the matrix.
    RowOutOfRange { row: usize, rows: usize },
    /// A serialized posting-list bitmap failed to deserialize.
    Bitmap(io::Error),
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryError::TooManyTerms { count, max } => {
                write!(f, "query references {} terms, maximum is {}", count, max)
            }
            QueryError::RowOutOfRange { row, rows } => {
                write!(f, "term row {} out of range for {} rows", row, rows)
            }
            QueryError::Bitmap(err) => write!(f, "malformed posting-list bytes: {}", err),
        }
    }
}

impl std::error::Error for QueryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            QueryError::Bitmap(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for QueryError {
    fn from(err: io::Error) -> Self {
        QueryError::Bitmap(err)
    }
}
