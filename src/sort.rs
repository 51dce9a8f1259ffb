// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! In-place sort for row/bit index scratch arrays.
//!
//! The engines gather matrix row indices (or Bloom probe bits) into a scratch
//! slice, sort it ascending, and then skip adjacent duplicates during the AND
//! fold. The arrays are tiny — a handful of rows per term, at most
//! `MAX_QUERY_TERMS * hashes` entries — so a plain quicksort with explicit
//! fast paths for 0/1/2 elements beats anything adaptive. No stability
//! requirement: the values are indices, equal means interchangeable.

/// Sort a slice of indices ascending, in place.
pub fn sort_indices(values: &mut [usize]) {
    match values.len() {
        0 | 1 => {}
        2 => {
            if values[0] > values[1] {
                values.swap(0, 1);
            }
        }
        _ => quicksort(values),
    }
}

/// Hoare partition around the midpoint element, recursing on both halves.
///
/// After the scan loops cross, everything in `[0, r]` is <= pivot and
/// everything in `[r+1, len)` is >= pivot, so both halves strictly shrink.
fn quicksort(values: &mut [usize]) {
    match values.len() {
        0 | 1 => return,
        2 => {
            if values[0] > values[1] {
                values.swap(0, 1);
            }
            return;
        }
        _ => {}
    }

    let pivot = values[values.len() / 2];
    let mut l = 0;
    let mut r = values.len() - 1;
    loop {
        while values[l] < pivot {
            l += 1;
        }
        while values[r] > pivot {
            r -= 1;
        }
        if l >= r {
            break;
        }
        values.swap(l, r);
        l += 1;
        r -= 1;
    }

    let (lower, upper) = values.split_at_mut(r + 1);
    quicksort(lower);
    quicksort(upper);
}
