// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Compressed posting-list query engine.
//!
//! Each term reference is a span of serialized Roaring bitmap bytes (the
//! portable, CRoaring-compatible layout — indexes are built by one toolchain
//! and queried by another, so the format must survive bit-for-bit). Every
//! deserialized bitmap is scratch state for one query; nothing is cached
//! across calls.
//!
//! The boolean algebra runs directly on the compressed sets:
//! REQUIRE intersect-folds, CONTAIN and EXCLUDE union their terms first,
//! and the cross-mode combination is intersect → intersect → difference.
//! Subtracting the EXCLUDE union (`-=`) instead of AND-ing a complement
//! matters twice over: a full-universe complement of a sparse compressed set
//! is enormous, and the difference form needs no knowledge of the universe
//! size at all. For the same reason an EXCLUDE-only query yields no matches
//! here — there is no positive set to subtract from.
//!
//! Result extraction never materializes the full match set just to truncate
//! it: cardinality and rank-select find the boundary id, and only the
//! surviving range is decoded into ids.

use crate::types::{DocId, Page, Query, QueryError, QueryResults, MAX_QUERY_TERMS, MAX_RESULTS};
use roaring::RoaringBitmap;

fn deserialize(span: &[u8]) -> Result<RoaringBitmap, QueryError> {
    RoaringBitmap::deserialize_from(span).map_err(QueryError::Bitmap)
}

/// Union one mode's term bitmaps, or `None` if the mode lists no terms.
fn union_terms<T: AsRef<[u8]>>(spans: &[T]) -> Result<Option<RoaringBitmap>, QueryError> {
    let mut combined: Option<RoaringBitmap> = None;
    for span in spans {
        let bitmap = deserialize(span.as_ref())?;
        combined = Some(match combined {
            None => bitmap,
            Some(mut acc) => {
                acc |= bitmap;
                acc
            }
        });
    }
    Ok(combined)
}

/// Evaluate a query down to one result bitmap.
///
/// `Ok(None)` means no mode contributed a positive set — "no matches", as
/// distinct from `Ok(Some(empty))`, an accumulator that exists but ended up
/// empty (e.g. REQUIRE over disjoint terms).
pub fn evaluate<T: AsRef<[u8]>>(query: &Query<T>) -> Result<Option<RoaringBitmap>, QueryError> {
    if query.term_count() > MAX_QUERY_TERMS {
        return Err(QueryError::TooManyTerms {
            count: query.term_count(),
            max: MAX_QUERY_TERMS,
        });
    }

    let mut result: Option<RoaringBitmap> = None;

    // REQUIRE: intersect as we go; no need to hold all operands at once.
    for span in &query.require {
        let bitmap = deserialize(span.as_ref())?;
        result = Some(match result {
            None => bitmap,
            Some(mut acc) => {
                acc &= bitmap;
                acc
            }
        });
    }

    // CONTAIN: union the terms, then intersect into the accumulator.
    if let Some(combined) = union_terms(&query.contain)? {
        result = Some(match result {
            None => combined,
            Some(mut acc) => {
                acc &= combined;
                acc
            }
        });
    }

    // EXCLUDE: union the terms, then subtract. Subtraction from nothing is
    // nothing: without a positive set the complement is unrepresentable.
    if let Some(combined) = union_terms(&query.exclude)? {
        if let Some(acc) = result.as_mut() {
            *acc -= combined;
        }
    }

    Ok(result)
}

/// Ids in `[lo, hi]`, extracted via a range mask rather than a full scan.
fn extract_range(bitmap: &RoaringBitmap, lo: u32, hi: u32) -> Vec<DocId> {
    let mut mask = RoaringBitmap::new();
    mask.insert_range(lo..=hi);
    mask &= bitmap;
    mask.iter().map(DocId).collect()
}

/// Evaluate and return the capped list shape.
///
/// `more` comes from comparing cardinality against [`MAX_RESULTS`]; when it
/// overflows, rank-select finds the last surviving id and only `[0, boundary]`
/// is decoded.
pub fn search_capped<T: AsRef<[u8]>>(
    query: &Query<T>,
) -> Result<Option<QueryResults>, QueryError> {
    let Some(bitmap) = evaluate(query)? else {
        return Ok(None);
    };

    let cardinality = bitmap.len();
    let more = cardinality > MAX_RESULTS as u64;
    let documents = if more {
        match bitmap.select(MAX_RESULTS as u32 - 1) {
            Some(boundary) => extract_range(&bitmap, 0, boundary),
            // Unreachable given cardinality > MAX_RESULTS; stay safe anyway.
            None => bitmap.iter().take(MAX_RESULTS).map(DocId).collect(),
        }
    } else {
        bitmap.iter().map(DocId).collect()
    };

    Ok(Some(QueryResults { documents, more }))
}

/// Evaluate and return one page of the rank-ordered match set.
///
/// Ranks are 0-based positions in ascending id order. The page covers
/// `[first_rank, min(cardinality - 1, first_rank + MAX_RESULTS - 1)]`;
/// `continuation` is the next rank, or `None` on the final page. A cursor at
/// or past the end yields an empty page with no continuation — re-issuing a
/// query with the advancing cursor therefore enumerates every match exactly
/// once and then stops.
pub fn search_page<T: AsRef<[u8]>>(
    query: &Query<T>,
    first_rank: u64,
) -> Result<Option<Page>, QueryError> {
    let Some(bitmap) = evaluate(query)? else {
        return Ok(None);
    };

    let total = bitmap.len();
    if first_rank >= total {
        return Ok(Some(Page {
            documents: Vec::new(),
            total,
            continuation: None,
        }));
    }

    let last_rank = (total - 1).min(first_rank + MAX_RESULTS as u64 - 1);
    let documents = match (
        bitmap.select(first_rank as u32),
        bitmap.select(last_rank as u32),
    ) {
        (Some(lo), Some(hi)) => extract_range(&bitmap, lo, hi),
        // Unreachable: both ranks are < total.
        _ => Vec::new(),
    };
    let continuation = if last_rank == total - 1 {
        None
    } else {
        Some(last_rank + 1)
    };

    Ok(Some(Page {
        documents,
        total,
        continuation,
    }))
}
