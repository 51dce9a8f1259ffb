// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Chunk locator: which partition holds a key, and where inside it.
//!
//! Large indexes are split into serialized chunks, each independently
//! searchable. Lookup is two-level:
//!
//! 1. [`find_chunk`] — binary search over the chunk descriptor array, sorted
//!    by each chunk's *first* key. Because `first_key` marks the start of a
//!    range, a greater-than comparison keeps `mid` as a live lower-bound
//!    candidate (`lo = mid`, not `mid + 1`), and midpoint arithmetic
//!    degenerates at two remaining candidates — that case compares against
//!    the upper candidate explicitly instead of looping forever.
//! 2. [`search_chunk`] — a binary search tree laid out inline in the chunk's
//!    bytes. Each node is its key, two `i32` child offsets (−1 = none), a
//!    value length, and the value bytes; the walk starts at the serialized
//!    root (`mid_pos`) and descends by key comparison.
//!
//! Keys are polymorphic — `u32` document ids or term strings — with one
//! comparator per variant. String order is byte-wise, then by length, which
//! is exactly what `Ord` on `String` gives us. A descriptor array holds one
//! key kind only.
//!
//! Running out of candidates (`dist <= 0`) means the descriptor array is
//! empty or corrupt: that is a reported error, never a silent "no match".

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::io;

/// A chunk lookup key: numeric (document id) or string (term).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ChunkKey {
    Num(u32),
    Str(String),
}

impl ChunkKey {
    /// Serialized length of this key inside a chunk node.
    fn node_len(&self) -> usize {
        match self {
            ChunkKey::Num(_) => 4,
            ChunkKey::Str(s) => 1 + s.len(),
        }
    }
}

impl From<u32> for ChunkKey {
    fn from(id: u32) -> Self {
        ChunkKey::Num(id)
    }
}

impl From<&str> for ChunkKey {
    fn from(term: &str) -> Self {
        ChunkKey::Str(term.to_string())
    }
}

/// Descriptor for one serialized chunk. Built offline, read-only at query
/// time; the containing array is sorted ascending by `first_key`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRef {
    /// Position of the chunk in the packed store.
    pub id: u32,
    /// Byte offset of the serialized BST root within the chunk.
    pub mid_pos: u32,
    /// Smallest key stored in the chunk.
    pub first_key: ChunkKey,
}

/// Chunk lookup failures. All of these mean the index bytes or descriptors
/// are corrupt; none of them mean "key not present".
#[derive(Debug)]
pub enum ChunkError {
    /// The descriptor binary search exhausted its range.
    OutOfBounds,
    /// A chunk node walk left the chunk's bounds or cycled.
    Corrupt { pos: usize },
}

impl fmt::Display for ChunkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChunkError::OutOfBounds => {
                write!(f, "search went out of bounds while looking for chunk")
            }
            ChunkError::Corrupt { pos } => {
                write!(f, "chunk bytes corrupt at offset {}", pos)
            }
        }
    }
}

impl std::error::Error for ChunkError {}

/// Locate the chunk whose key range contains `key`.
///
/// Keys below the first chunk's `first_key` resolve to the first chunk
/// (range semantics — the caller's in-chunk search then reports absence).
pub fn find_chunk<'a>(chunks: &'a [ChunkRef], key: &ChunkKey) -> Result<&'a ChunkRef, ChunkError> {
    let mut lo: isize = 0;
    let mut hi: isize = chunks.len() as isize - 1;
    loop {
        let dist = hi + 1 - lo;
        if dist <= 0 {
            return Err(ChunkError::OutOfBounds);
        }
        if dist == 1 {
            return Ok(&chunks[lo as usize]);
        }
        if dist == 2 {
            // Midpoint arithmetic degenerates here: decide between the two
            // remaining candidates against the upper one's first key.
            return Ok(if *key < chunks[hi as usize].first_key {
                &chunks[lo as usize]
            } else {
                &chunks[hi as usize]
            });
        }
        let mid = lo + dist / 2;
        match key.cmp(&chunks[mid as usize].first_key) {
            Ordering::Less => hi = mid - 1,
            Ordering::Equal => return Ok(&chunks[mid as usize]),
            // first_key starts a range: mid itself stays a candidate.
            Ordering::Greater => lo = mid,
        }
    }
}

fn read_u32(chunk: &[u8], pos: usize) -> Result<u32, ChunkError> {
    chunk
        .get(pos..pos + 4)
        .map(|b| u32::from_le_bytes(b.try_into().unwrap_or([0; 4])))
        .ok_or(ChunkError::Corrupt { pos })
}

fn read_i32(chunk: &[u8], pos: usize) -> Result<i32, ChunkError> {
    read_u32(chunk, pos).map(|v| v as i32)
}

/// Compare the target key against the node key at `pos`; returns the
/// ordering and the offset just past the node key.
fn compare_node_key(
    chunk: &[u8],
    pos: usize,
    key: &ChunkKey,
) -> Result<(Ordering, usize), ChunkError> {
    match key {
        ChunkKey::Num(target) => {
            let cur = read_u32(chunk, pos)?;
            Ok((target.cmp(&cur), pos + 4))
        }
        ChunkKey::Str(target) => {
            let len = *chunk.get(pos).ok_or(ChunkError::Corrupt { pos })? as usize;
            let cur = chunk
                .get(pos + 1..pos + 1 + len)
                .ok_or(ChunkError::Corrupt { pos })?;
            Ok((target.as_bytes().cmp(cur), pos + 1 + len))
        }
    }
}

/// Walk the serialized BST inside `chunk`, starting at `mid_pos`.
///
/// Returns the matched entry's value span, or `None` if the key is absent.
/// Every read is bounds-checked, and the walk is step-limited so cyclic
/// child offsets in corrupt bytes cannot loop forever.
pub fn search_chunk<'a>(
    chunk: &'a [u8],
    mid_pos: u32,
    key: &ChunkKey,
) -> Result<Option<&'a [u8]>, ChunkError> {
    let mut pos = mid_pos as usize;
    let mut steps = 0usize;
    loop {
        steps += 1;
        if steps > chunk.len() {
            return Err(ChunkError::Corrupt { pos });
        }

        let (ordering, after_key) = compare_node_key(chunk, pos, key)?;
        let left = read_i32(chunk, after_key)?;
        let right = read_i32(chunk, after_key + 4)?;
        let value_len = read_u32(chunk, after_key + 8)? as usize;
        let value_start = after_key + 12;

        match ordering {
            Ordering::Less => {
                if left < 0 {
                    return Ok(None);
                }
                pos = left as usize;
            }
            Ordering::Equal => {
                return chunk
                    .get(value_start..value_start + value_len)
                    .map(Some)
                    .ok_or(ChunkError::Corrupt { pos: value_start });
            }
            Ordering::Greater => {
                if right < 0 {
                    return Ok(None);
                }
                pos = right as usize;
            }
        }
    }
}

/// Footer length of a packed chunk stream: CRC32 of everything before it.
const PACKED_FOOTER_LEN: usize = 4;

/// An in-memory set of chunks plus their descriptors, loaded from the packed
/// byte stream the index builder emits (`u32` big-endian length before each
/// chunk, CRC32 footer over the whole body).
#[derive(Debug, Clone)]
pub struct ChunkStore {
    refs: Vec<ChunkRef>,
    chunks: Vec<Vec<u8>>,
}

impl ChunkStore {
    /// Parse a packed stream. The CRC footer is validated before anything is
    /// trusted; truncation and length overruns are `InvalidData`.
    pub fn from_packed(refs: Vec<ChunkRef>, data: &[u8]) -> io::Result<Self> {
        if data.len() < PACKED_FOOTER_LEN {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "packed chunk stream shorter than its footer",
            ));
        }
        let (body, footer) = data.split_at(data.len() - PACKED_FOOTER_LEN);
        let expected = u32::from_le_bytes(footer.try_into().unwrap_or([0; 4]));
        let actual = crc32fast::hash(body);
        if expected != actual {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("packed chunk checksum mismatch: stored {expected:#010x}, computed {actual:#010x}"),
            ));
        }

        let mut chunks = Vec::with_capacity(refs.len());
        let mut pos = 0usize;
        while pos < body.len() {
            let len_bytes = body.get(pos..pos + 4).ok_or_else(|| {
                io::Error::new(io::ErrorKind::UnexpectedEof, "truncated chunk length")
            })?;
            let len = u32::from_be_bytes(len_bytes.try_into().unwrap_or([0; 4])) as usize;
            pos += 4;
            let chunk = body.get(pos..pos + len).ok_or_else(|| {
                io::Error::new(io::ErrorKind::UnexpectedEof, "truncated chunk body")
            })?;
            chunks.push(chunk.to_vec());
            pos += len;
        }

        for chunk_ref in &refs {
            if chunk_ref.id as usize >= chunks.len() {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("descriptor references chunk {} of {}", chunk_ref.id, chunks.len()),
                ));
            }
        }

        Ok(ChunkStore { refs, chunks })
    }

    /// Number of chunks in the store.
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Full lookup: locate the chunk for `key`, then walk its BST.
    pub fn lookup(&self, key: &ChunkKey) -> Result<Option<&[u8]>, ChunkError> {
        let chunk_ref = find_chunk(&self.refs, key)?;
        let chunk = &self.chunks[chunk_ref.id as usize];
        search_chunk(chunk, chunk_ref.mid_pos, key)
    }
}
