//! Property-based tests using proptest.
//!
//! The core correctness claim is cross-engine agreement: three encodings of
//! the same boolean algebra must give the same answer wherever their
//! contracts overlap. The oracle is a naive per-document scan kept separate
//! from every encoding under test.

mod common;

use common::Fixture;
use proptest::prelude::*;
use roaring::RoaringBitmap;
use trifold::{postings, BitVec, BloomEngine, MatrixEngine, Query};

const VOCAB: [&str; 8] = [
    "alpha", "beta", "gamma", "delta", "epsilon", "zeta", "eta", "theta",
];

/// A corpus: each document is a small bag of vocab terms.
fn corpus_strategy() -> impl Strategy<Value = Vec<Vec<&'static str>>> {
    prop::collection::vec(
        prop::collection::vec(prop::sample::select(&VOCAB[..]), 0..5),
        1..25,
    )
}

/// Up to three terms for one query mode.
fn mode_terms_strategy() -> impl Strategy<Value = Vec<&'static str>> {
    prop::collection::vec(prop::sample::select(&VOCAB[..]), 0..4)
}

fn results_ids(results: &trifold::QueryResults) -> Vec<u32> {
    results.documents.iter().map(|d| d.get()).collect()
}

proptest! {
    /// The dense engine matches the oracle exactly, for every query shape.
    #[test]
    fn matrix_agrees_with_oracle(
        docs in corpus_strategy(),
        require in mode_terms_strategy(),
        contain in mode_terms_strategy(),
        exclude in mode_terms_strategy(),
    ) {
        let fixture = Fixture::build(&VOCAB, &docs);
        let mut engine = MatrixEngine::new(fixture.matrix.clone());
        let results = engine
            .search(&fixture.matrix_query(&require, &contain, &exclude))
            .unwrap();
        let expected = fixture.oracle(&require, &contain, &exclude).unwrap_or_default();
        prop_assert_eq!(results_ids(&results), expected);
        prop_assert!(!results.more);
    }

    /// Dense and postings engines agree whenever a positive mode exists.
    /// (An exclude-only query is the one divergence: the dense matrix knows
    /// the universe and can invert; compressed sets cannot.)
    #[test]
    fn postings_agrees_with_matrix(
        docs in corpus_strategy(),
        require in mode_terms_strategy(),
        contain in mode_terms_strategy(),
        exclude in mode_terms_strategy(),
    ) {
        prop_assume!(!require.is_empty() || !contain.is_empty());
        let fixture = Fixture::build(&VOCAB, &docs);

        let mut engine = MatrixEngine::new(fixture.matrix.clone());
        let dense = engine
            .search(&fixture.matrix_query(&require, &contain, &exclude))
            .unwrap();
        let compressed = postings::search_capped(
            &fixture.postings_query(&require, &contain, &exclude),
        )
        .unwrap()
        .expect("positive mode always contributes a bitmap");

        prop_assert_eq!(results_ids(&dense), results_ids(&compressed));
        prop_assert_eq!(dense.more, compressed.more);
    }

    /// The Bloom engine may return extra documents, never fewer. Holds for
    /// queries without EXCLUDE (a false positive inside an excluded term can
    /// legitimately suppress a match; that is the encoding's documented
    /// trade-off, not a recall bug).
    #[test]
    fn bloom_has_total_recall(
        docs in corpus_strategy(),
        require in mode_terms_strategy(),
        contain in mode_terms_strategy(),
    ) {
        let fixture = Fixture::build(&VOCAB, &docs);
        let mut engine = BloomEngine::new(fixture.bloom.clone());
        let results = engine
            .search(&fixture.bloom_query(&require, &contain, &[]))
            .unwrap();
        let got = results_ids(&results);
        let expected = fixture.oracle(&require, &contain, &[]).unwrap_or_default();
        for doc in expected {
            prop_assert!(got.contains(&doc), "false negative for doc {}", doc);
        }
    }

    /// Walking pages from rank 0 with the returned continuation enumerates
    /// every match exactly once, ascending, then stops.
    #[test]
    fn pagination_enumerates_exactly_once(
        ids in prop::collection::btree_set(0u32..100_000, 0..600),
    ) {
        let bitmap: RoaringBitmap = ids.iter().copied().collect();
        let mut span = Vec::new();
        bitmap.serialize_into(&mut span).unwrap();
        let query = Query {
            require: vec![span],
            contain: vec![],
            exclude: vec![],
        };

        let mut seen = Vec::new();
        let mut cursor = Some(0u64);
        let mut pages = 0;
        while let Some(rank) = cursor {
            let page = postings::search_page(&query, rank).unwrap().unwrap();
            prop_assert_eq!(page.total, ids.len() as u64);
            seen.extend(page.documents.iter().map(|d| d.get()));
            cursor = page.continuation;
            pages += 1;
            prop_assert!(pages <= ids.len() + 2, "cursor failed to advance");
        }
        let expected: Vec<u32> = ids.into_iter().collect();
        prop_assert_eq!(seen, expected);
    }

    /// AND is idempotent: (a & b) & b == a & b.
    #[test]
    fn and_is_idempotent(
        a in prop::collection::btree_set(0u32..512, 0..64),
        b in prop::collection::btree_set(0u32..512, 0..64),
    ) {
        let mut va = BitVec::new(512);
        for &d in &a {
            va.set(d);
        }
        let mut vb = BitVec::new(512);
        for &d in &b {
            vb.set(d);
        }
        va.and(&vb);
        let once = va.clone();
        va.and(&vb);
        prop_assert_eq!(va, once);
    }

    /// Double inversion restores a union: !!(a | b) == a | b.
    #[test]
    fn not_is_involutive_over_or(
        a in prop::collection::btree_set(0u32..300, 0..64),
        b in prop::collection::btree_set(0u32..300, 0..64),
    ) {
        let mut v = BitVec::new(300);
        for &d in a.union(&b) {
            v.set(d);
        }
        let orig = v.clone();
        v.not();
        v.not();
        prop_assert_eq!(v, orig);
    }
}
