//! Column-wise combination of two step rows that landed on the same grid
//! cell.
//!
//! The note alphabet: `0` rest, `1` tap, `2` hold head, `3` hold/roll
//! tail, `4` roll head, `M` mine; further codes pass through untouched as
//! long as only one side of a column carries one.

use super::{
    RemapError, RemapWarning, Result,
    chart::{ChartId, is_rest},
};

/// What happened to two rows aimed at one cell.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum MergeOutcome {
    /// One side carried no notes; the other is used as-is.
    Placed(String),
    /// Both sides carried notes and every column could be resolved.
    Merged {
        /// The merged row.
        row: String,
        /// What the merge had to do to get there.
        warnings: Vec<RemapWarning>,
    },
}

impl MergeOutcome {
    /// The resulting row text, whichever way it was produced.
    #[must_use]
    pub fn into_row(self) -> String {
        match self {
            Self::Placed(row) | Self::Merged { row, .. } => row,
        }
    }
}

/// Combines two same-width rows column by column.
///
/// A rest column takes the other side's code. A hold tail meeting a hold
/// head (either order) collapses into a single tap — the hold is lost,
/// which is surfaced as [`RemapWarning::ShortHoldDropped`], never
/// absorbed silently. Every non-trivial merge also reports
/// [`RemapWarning::RowsCombined`] with both inputs and the result.
/// The merger keeps no state; callers collect the outcome.
///
/// `measure` and `row_index` locate the cell for diagnostics.
///
/// # Errors
///
/// [`RemapError::ChartWidthMismatch`] when the rows differ in length —
/// that means two different play styles, which must never be combined —
/// and [`RemapError::ChartMergeConflict`] when a column is occupied on
/// both sides with no rule for the pair.
pub fn merge_rows(
    existing: &str,
    incoming: &str,
    chart: &ChartId,
    measure: usize,
    row_index: usize,
) -> Result<MergeOutcome> {
    if existing.len() != incoming.len() {
        return Err(RemapError::ChartWidthMismatch {
            chart: chart.clone(),
            expected: existing.len(),
            found: incoming.len(),
        });
    }
    if is_rest(existing) {
        return Ok(MergeOutcome::Placed(incoming.to_owned()));
    }
    if is_rest(incoming) {
        return Ok(MergeOutcome::Placed(existing.to_owned()));
    }

    let mut warnings = Vec::new();
    let mut merged = String::with_capacity(existing.len());
    for (column, (a, b)) in existing.chars().zip(incoming.chars()).enumerate() {
        match (a, b) {
            ('0', code) | (code, '0') => merged.push(code),
            ('3', '2') | ('2', '3') => {
                // A hold that ends exactly where the next one starts: too
                // short to survive the new grid, degenerate to a tap.
                warnings.push(RemapWarning::ShortHoldDropped {
                    chart: chart.clone(),
                    measure,
                    row: row_index,
                    column,
                });
                merged.push('1');
            }
            _ => {
                return Err(RemapError::ChartMergeConflict {
                    chart: chart.clone(),
                    measure,
                    row: row_index,
                    existing: existing.to_owned(),
                    incoming: incoming.to_owned(),
                });
            }
        }
    }
    warnings.push(RemapWarning::RowsCombined {
        chart: chart.clone(),
        measure,
        row: row_index,
        first: existing.to_owned(),
        second: incoming.to_owned(),
        merged: merged.clone(),
    });
    Ok(MergeOutcome::Merged { row: merged, warnings })
}
