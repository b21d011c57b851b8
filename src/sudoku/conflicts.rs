//! Conflict counting.
//!
//! A group (row, column or block) holding a value `c` times contributes
//! `c - 1` conflicts for that value. The total over all `3N` groups is the
//! fitness of a candidate; `0` means the grid is a valid solution.

use super::candidate::Candidate;
use super::puzzle::Value;

/// Conflicts inside one group: `Σ_v max(0, count(v) - 1)`.
///
/// Empty cells (`0`) never conflict.
pub fn group_conflicts(values: &[Value]) -> usize {
    let max = values.iter().copied().max().unwrap_or(0) as usize;
    let mut counts = vec![0usize; max + 1];
    for &value in values {
        counts[value as usize] += 1;
    }
    counts
        .iter()
        .skip(1)
        .map(|&count| count.saturating_sub(1))
        .sum()
}

/// Total conflicts of a full N×N grid with blocks of side `block_size`.
///
/// Always a full recount over every row, column and block.
pub fn grid_conflicts(grid: &[Vec<Value>], block_size: usize) -> usize {
    let n = grid.len();
    let mut total = 0;
    let mut group = Vec::with_capacity(n);

    for row in grid {
        total += group_conflicts(row);
    }

    for col in 0..n {
        group.clear();
        group.extend(grid.iter().map(|row| row[col]));
        total += group_conflicts(&group);
    }

    for block_row in 0..block_size {
        for block_col in 0..block_size {
            group.clear();
            for row in &grid[block_row * block_size..(block_row + 1) * block_size] {
                group.extend_from_slice(&row[block_col * block_size..(block_col + 1) * block_size]);
            }
            total += group_conflicts(&group);
        }
    }

    total
}

/// Total conflicts of a candidate assignment.
pub fn count_conflicts(candidate: &Candidate) -> usize {
    grid_conflicts(&candidate.full_grid(), candidate.puzzle().block_size())
}
