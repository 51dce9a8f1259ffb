//! Shared fixtures: one corpus, three encodings.
//!
//! `Fixture::build` takes documents as term lists and produces the dense
//! matrix, the Bloom matrix, and serialized Roaring posting spans from the
//! same data, so suites can ask all three engines the same question. The
//! chunk helpers serialize BST chunks and packed streams in the layout
//! `chunks.rs` reads — build-side tooling lives here because the library
//! deliberately ships only the query side.

use roaring::RoaringBitmap;
use std::collections::HashMap;
use trifold::{BitMatrix, BloomMatrix, ChunkKey, Query, TermTable};

pub const BLOOM_BITS: usize = 2048;
pub const BLOOM_HASHES: u32 = 3;

pub struct Fixture {
    pub terms: Vec<String>,
    pub table: TermTable,
    pub matrix: BitMatrix,
    pub bloom: BloomMatrix,
    pub spans: HashMap<String, Vec<u8>>,
    pub doc_count: usize,
    /// Ground truth kept independently of every encoding under test.
    members: HashMap<String, Vec<u32>>,
}

impl Fixture {
    /// Build every encoding from `docs[i]` = the terms document `i` contains.
    ///
    /// `vocab` fixes the term/row universe so that terms appearing in no
    /// document still resolve (to an empty set) in every encoding.
    pub fn build(vocab: &[&str], docs: &[Vec<&str>]) -> Fixture {
        let terms: Vec<String> = vocab.iter().map(|s| s.to_string()).collect();
        let table = TermTable::from_terms(terms.iter().cloned());
        let mut matrix = BitMatrix::new(terms.len(), docs.len());
        let mut bloom = BloomMatrix::new(BLOOM_BITS, BLOOM_HASHES, docs.len());
        let mut postings: HashMap<String, RoaringBitmap> = terms
            .iter()
            .map(|t| (t.clone(), RoaringBitmap::new()))
            .collect();

        let mut members: HashMap<String, Vec<u32>> =
            terms.iter().map(|t| (t.clone(), Vec::new())).collect();
        for (doc, doc_terms) in docs.iter().enumerate() {
            let doc = doc as u32;
            for term in doc_terms {
                let row = table.row(term).expect("term outside fixture vocab");
                matrix.set(row, doc);
                bloom.insert(term, doc);
                postings
                    .get_mut(*term)
                    .expect("term outside fixture vocab")
                    .insert(doc);
                let m = members.get_mut(*term).expect("term outside fixture vocab");
                if !m.contains(&doc) {
                    m.push(doc);
                }
            }
        }

        let spans = postings
            .into_iter()
            .map(|(term, bitmap)| {
                let mut bytes = Vec::with_capacity(bitmap.serialized_size());
                bitmap.serialize_into(&mut bytes).expect("serialize bitmap");
                (term, bytes)
            })
            .collect();

        Fixture {
            terms,
            table,
            matrix,
            bloom,
            spans,
            doc_count: docs.len(),
            members,
        }
    }

    pub fn row(&self, term: &str) -> usize {
        self.table.row(term).expect("term outside fixture vocab")
    }

    pub fn span(&self, term: &str) -> Vec<u8> {
        self.spans.get(term).expect("term outside fixture vocab").clone()
    }

    pub fn matrix_query(&self, require: &[&str], contain: &[&str], exclude: &[&str]) -> Query<usize> {
        Query {
            require: require.iter().map(|t| self.row(t)).collect(),
            contain: contain.iter().map(|t| self.row(t)).collect(),
            exclude: exclude.iter().map(|t| self.row(t)).collect(),
        }
    }

    pub fn bloom_query(&self, require: &[&str], contain: &[&str], exclude: &[&str]) -> Query<String> {
        Query {
            require: require.iter().map(|t| t.to_string()).collect(),
            contain: contain.iter().map(|t| t.to_string()).collect(),
            exclude: exclude.iter().map(|t| t.to_string()).collect(),
        }
    }

    pub fn postings_query(
        &self,
        require: &[&str],
        contain: &[&str],
        exclude: &[&str],
    ) -> Query<Vec<u8>> {
        Query {
            require: require.iter().map(|t| self.span(t)).collect(),
            contain: contain.iter().map(|t| self.span(t)).collect(),
            exclude: exclude.iter().map(|t| self.span(t)).collect(),
        }
    }

    /// The reference answer, computed the slow obvious way.
    ///
    /// `None` means no mode listed any term. Exclude participates as a
    /// subtraction from the docs the positive modes admitted (or, with no
    /// positive mode, from the whole universe — which only the encodings
    /// that know the universe can reproduce).
    pub fn oracle(&self, require: &[&str], contain: &[&str], exclude: &[&str]) -> Option<Vec<u32>> {
        if require.is_empty() && contain.is_empty() && exclude.is_empty() {
            return None;
        }
        let contains = |doc: u32, term: &str| {
            self.members
                .get(term)
                .expect("term outside fixture vocab")
                .contains(&doc)
        };
        let matches: Vec<u32> = (0..self.doc_count as u32)
            .filter(|&doc| {
                let req = require.iter().all(|t| contains(doc, t));
                let con = contain.is_empty() || contain.iter().any(|t| contains(doc, t));
                let exc = exclude.iter().any(|t| contains(doc, t));
                req && con && !exc
            })
            .collect();
        Some(matches)
    }
}

// ============================================================================
// CHUNK SERIALIZATION (build side, test only)
// ============================================================================

fn key_bytes(key: &ChunkKey, out: &mut Vec<u8>) {
    match key {
        ChunkKey::Num(n) => out.extend_from_slice(&n.to_le_bytes()),
        ChunkKey::Str(s) => {
            out.push(s.len() as u8);
            out.extend_from_slice(s.as_bytes());
        }
    }
}

fn write_node(out: &mut Vec<u8>, left: i32, right: i32, key: &ChunkKey, value: &[u8]) -> i32 {
    let pos = out.len() as i32;
    key_bytes(key, out);
    out.extend_from_slice(&left.to_le_bytes());
    out.extend_from_slice(&right.to_le_bytes());
    out.extend_from_slice(&(value.len() as u32).to_le_bytes());
    out.extend_from_slice(value);
    pos
}

fn write_area(out: &mut Vec<u8>, entries: &[(ChunkKey, Vec<u8>)], lo: usize, hi: usize) -> i32 {
    match hi + 1 - lo {
        0 => unreachable!(),
        1 => {
            let (key, value) = &entries[lo];
            write_node(out, -1, -1, key, value)
        }
        2 => {
            let (left_key, left_value) = &entries[lo];
            let (key, value) = &entries[hi];
            let left = write_node(out, -1, -1, left_key, left_value);
            write_node(out, left, -1, key, value)
        }
        dist => {
            let mid = lo + dist / 2;
            let left = write_area(out, entries, lo, mid - 1);
            let right = write_area(out, entries, mid + 1, hi);
            let (key, value) = &entries[mid];
            write_node(out, left, right, key, value)
        }
    }
}

/// Serialize sorted entries into one BST chunk; returns `(mid_pos, bytes)`.
pub fn bst_chunk(entries: &[(ChunkKey, Vec<u8>)]) -> (u32, Vec<u8>) {
    assert!(!entries.is_empty());
    let mut out = Vec::new();
    let mid = write_area(&mut out, entries, 0, entries.len() - 1);
    (mid as u32, out)
}

/// Pack chunks into the length-prefixed stream with its CRC32 footer.
pub fn pack_chunks(chunks: &[Vec<u8>]) -> Vec<u8> {
    let mut body = Vec::new();
    for chunk in chunks {
        body.extend_from_slice(&(chunk.len() as u32).to_be_bytes());
        body.extend_from_slice(chunk);
    }
    let crc = crc32fast::hash(&body);
    body.extend_from_slice(&crc.to_le_bytes());
    body
}
