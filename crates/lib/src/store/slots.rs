//! Slot planning for sibling insertion.
//!
//! A sibling set is the sorted list of segment values its members occupy.
//! Inserting at index `k` needs a free value that sorts between `v[k-1]` and
//! `v[k]`. Planning is pure: it picks that value and lists which existing
//! siblings (with their whole subtrees) must be renumbered first.

use crate::path::PathError;

/// Where a new sibling goes and what has to move out of its way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SlotPlan {
    /// Segment value for the new node.
    pub(crate) value: u64,
    /// `(from, to)` renumberings, in the order they must be applied.
    pub(crate) moves: Vec<(u64, u64)>,
}

impl SlotPlan {
    fn free(value: u64) -> Self {
        Self {
            value,
            moves: Vec::new(),
        }
    }
}

/// Plan the insertion of a new sibling before `values[index]` (or at the end
/// when `index == values.len()`).
///
/// Prefers, in order: the next value after the last sibling when appending,
/// an unused value directly before `values[index]`, shifting the contiguous
/// run starting at `index` up by one. If the shift or the append would leave
/// the level's capacity, the whole level is compacted to `0..=n`.
///
/// `values` must be strictly ascending and below `capacity`. `parent` only
/// labels the overflow error.
pub(crate) fn plan(
    parent: &str,
    values: &[u64],
    index: usize,
    capacity: u64,
) -> Result<SlotPlan, PathError> {
    let n = values.len();
    if n as u64 >= capacity {
        return Err(PathError::PathOverflow {
            parent: parent.to_string(),
            capacity,
        });
    }
    let k = index.min(n);

    if k == n {
        let next = values.last().map_or(0, |last| last + 1);
        if next < capacity {
            return Ok(SlotPlan::free(next));
        }
        return Ok(compact(values, k));
    }

    if k == 0 && values[0] > 0 {
        return Ok(SlotPlan::free(values[0] - 1));
    }
    if k > 0 && values[k - 1] + 1 < values[k] {
        return Ok(SlotPlan::free(values[k - 1] + 1));
    }

    let mut end = k;
    while end + 1 < n && values[end + 1] == values[end] + 1 {
        end += 1;
    }
    if values[end] + 1 >= capacity {
        return Ok(compact(values, k));
    }
    // Top of the run first, so each target is already vacated.
    let moves = (k..=end).rev().map(|i| (values[i], values[i] + 1)).collect();
    Ok(SlotPlan {
        value: values[k],
        moves,
    })
}

/// Renumber the level densely with a hole at `k`.
///
/// Downward moves go first in ascending order, then upward moves in
/// descending order; with a strictly increasing target assignment every
/// target is free at the moment it is written.
fn compact(values: &[u64], k: usize) -> SlotPlan {
    let target = |i: usize| if i < k { i as u64 } else { i as u64 + 1 };

    let mut moves: Vec<(u64, u64)> = values
        .iter()
        .enumerate()
        .filter(|&(i, &v)| target(i) < v)
        .map(|(i, &v)| (v, target(i)))
        .collect();
    moves.extend(
        values
            .iter()
            .enumerate()
            .rev()
            .filter(|&(i, &v)| target(i) > v)
            .map(|(i, &v)| (v, target(i))),
    );

    SlotPlan {
        value: k as u64,
        moves,
    }
}
