//! Boolean document retrieval over three interchangeable set encodings.
//!
//! A query names three term groups — REQUIRE (AND), CONTAIN (OR), EXCLUDE
//! (AND-NOT) — and the engine returns matching document ids, ranked
//! ascending and capped, with bounded intermediate state throughout. The
//! same algebra runs over three encodings with different size/precision
//! trade-offs, and a chunk locator finds serialized posting bytes inside a
//! partitioned index.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────┐   ┌──────────┐   ┌───────────┐
//! │ bitset.rs │◀──│ matrix.rs│   │ postings.rs│──▶ roaring bitmaps
//! │ (algebra, │   │ (dense   │   │ (compressed│
//! │  folds)   │◀┐ │  rows)   │   │  sets,     │
//! └───────────┘ │ └──────────┘   │  pagination)│
//!   ▲     ▲     │ ┌──────────┐   └───────────┘
//!   │     │     └─│ bloom.rs │         ▲
//! sort.rs hash.rs │ (k-probe │   ┌───────────┐
//! (dedupe) (mmh3) │  rows)   │   │ chunks.rs │
//!                 └──────────┘   │ (locator)  │
//!                                └───────────┘
//! ```
//!
//! The dense engine ANDs/ORs pre-built per-term rows. The Bloom engine
//! derives each term's row set by hashing (smaller index, false positives
//! allowed, never false negatives). The postings engine runs the algebra on
//! compressed Roaring sets and adds rank pagination. All three agree on the
//! boolean semantics; `tests/` holds the cross-engine agreement suite.
//!
//! # Execution model
//!
//! Single-threaded, synchronous, non-reentrant. Engines own fixed scratch
//! buffers and reset them at the start of every search — the moral
//! equivalent of the embedded per-request heap rewind this design grew out
//! of, expressed as ownership.

mod bitset;
mod bloom;
mod chunks;
mod hash;
mod matrix;
pub mod postings;
mod sort;
mod types;

pub use bitset::BitVec;
pub use bloom::{BloomEngine, BloomMatrix};
pub use chunks::{find_chunk, search_chunk, ChunkError, ChunkKey, ChunkRef, ChunkStore};
pub use hash::murmur3_x64_128;
pub use matrix::{BitMatrix, MatrixEngine, TermTable};
pub use types::{
    DocId, Mode, Page, Query, QueryError, QueryResults, MAX_QUERY_TERMS, MAX_RESULTS,
};
