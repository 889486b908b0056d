//! Optimal bipartite assignment
//!
//! Kuhn-Munkres on an integer value matrix, maximizing total value. O(n^3)
//! in the larger side. Rectangular inputs are padded to square with
//! zero-value cells; rows assigned to padding come back unassigned.
//!
//! Values must be non-negative and small enough that `n * max_value` stays
//! well inside `i64`; the matcher's layered quantization respects this for
//! section counts into the hundreds.

use std::sync::atomic::{AtomicBool, Ordering};

/// Maximum-value assignment of rows to columns
///
/// Returns `row_to_col[i] = Some(j)` for each assigned real cell, `None`
/// for rows the optimum leaves unmatched. Returns `None` overall when
/// `cancel` is raised mid-solve; no partial assignment escapes.
pub(crate) fn solve_max(values: &[Vec<i64>], cancel: &AtomicBool) -> Option<Vec<Option<usize>>> {
    let rows = values.len();
    let cols = values.first().map_or(0, Vec::len);
    if rows == 0 || cols == 0 {
        return Some(vec![None; rows]);
    }
    let n = rows.max(cols);

    // Minimize the negated matrix. Padding cells cost zero, so padding never
    // competes with a real positive-value cell.
    let cost = |i: usize, j: usize| -> i64 {
        if i < rows && j < cols {
            -values[i][j]
        } else {
            0
        }
    };

    // Potentials method, one augmenting row at a time. Index 0 of each
    // working array is the sentinel for "no column yet".
    let mut u = vec![0i64; n + 1];
    let mut v = vec![0i64; n + 1];
    let mut matched_row = vec![0usize; n + 1];
    let mut way = vec![0usize; n + 1];

    for i in 1..=n {
        if cancel.load(Ordering::Relaxed) {
            return None;
        }
        matched_row[0] = i;
        let mut j0 = 0usize;
        let mut minv = vec![i64::MAX; n + 1];
        let mut used = vec![false; n + 1];

        loop {
            used[j0] = true;
            let i0 = matched_row[j0];
            let mut delta = i64::MAX;
            let mut j1 = 0usize;
            for j in 1..=n {
                if used[j] {
                    continue;
                }
                let reduced = cost(i0 - 1, j - 1) - u[i0] - v[j];
                if reduced < minv[j] {
                    minv[j] = reduced;
                    way[j] = j0;
                }
                if minv[j] < delta {
                    delta = minv[j];
                    j1 = j;
                }
            }
            for j in 0..=n {
                if used[j] {
                    u[matched_row[j]] += delta;
                    v[j] -= delta;
                } else {
                    minv[j] -= delta;
                }
            }
            j0 = j1;
            if matched_row[j0] == 0 {
                break;
            }
        }

        // Walk the alternating path back, flipping matches.
        loop {
            let j1 = way[j0];
            matched_row[j0] = matched_row[j1];
            j0 = j1;
            if j0 == 0 {
                break;
            }
        }
    }

    let mut row_to_col = vec![None; rows];
    for j in 1..=cols.min(n) {
        let i = matched_row[j];
        if (1..=rows).contains(&i) {
            row_to_col[i - 1] = Some(j - 1);
        }
    }
    Some(row_to_col)
}
