//! Minimum-cost assignment over rectangular cost matrices.
//!
//! This module knows nothing about tracks or detections: it takes a cost
//! matrix and returns, for every row, the column it was assigned to in a
//! minimum-total-cost one-to-one assignment. When the matrix has more rows
//! than columns, some rows necessarily stay unassigned (and vice versa).
//! The solve itself is LAPJV on a square matrix padded with dummy rows or
//! columns.

use ndarray::{Array2, ArrayView2};

use crate::error::AssignmentError;

/// Solve the minimum-cost assignment problem.
///
/// Returns a vector with one entry per row; `Some(col)` is the column
/// assigned to that row. Exactly `min(rows, cols)` rows are assigned.
pub fn minimize(cost: ArrayView2<f64>) -> Result<Vec<Option<usize>>, AssignmentError> {
    let (rows, cols) = cost.dim();

    if let Some(((row, col), _)) = cost.indexed_iter().find(|(_, c)| !c.is_finite()) {
        return Err(AssignmentError::NonFiniteCost { row, col });
    }

    if rows == 0 || cols == 0 {
        return Ok(vec![None; rows]);
    }

    // A dummy row or column costs the same wherever it lands, so any
    // constant pads correctly; the largest real cost keeps the scale.
    let pad = cost.iter().copied().fold(0.0f64, f64::max);
    let size = rows.max(cols);
    let mut padded = Array2::<f64>::from_elem((size, size), pad);
    padded.slice_mut(ndarray::s![..rows, ..cols]).assign(&cost);

    let (row_to_col, _) = lapjv::lapjv(&padded)
        .map_err(|err| AssignmentError::Solver(format!("{err:?}")))?;

    Ok(row_to_col
        .into_iter()
        .take(rows)
        .map(|col| (col < cols).then_some(col))
        .collect())
}

/// Convenience wrapper returning the total cost alongside the assignment.
pub fn minimize_with_cost(
    cost: ArrayView2<f64>,
) -> Result<(f64, Vec<Option<usize>>), AssignmentError> {
    let assignment = minimize(cost)?;
    let total = assignment
        .iter()
        .enumerate()
        .filter_map(|(row, col)| col.map(|col| cost[[row, col]]))
        .sum();
    Ok((total, assignment))
}
