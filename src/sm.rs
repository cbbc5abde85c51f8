//! The `.sm` simfile module: tokenizer, document model, timing conversion
//! and the remapper itself.
//!
//! Raw [String] == [lex] ==> ordered `#KEY:VALUE;` pairs (in
//! [`LexOutput`](lex::LexOutput)) == [model] ==> [`Simfile`](model::Simfile)
//! == [remap] ==> [`RemapOutput`].
//!
//! In detail, our policies are:
//!
//! - Support only UTF-8 (as required `String` to input).
//! - Support only `.sm`; reading `.ssc` or `.dwi` is out of scope.
//! - Keys the remapper does not touch are carried through byte-for-byte,
//!   in their original order.
//! - Library code never prints. Fatal conditions are [`RemapError`];
//!   everything recoverable is collected as [`RemapWarning`] values on the
//!   successful output.

pub mod chart;
pub mod lex;
pub mod merge;
pub mod model;
pub mod prelude;
pub mod remap;
pub mod timing;
pub mod unparse;

use thiserror::Error;

use self::{
    chart::{ChartId, StepChart},
    lex::{LexOutput, LexWarning},
    model::Simfile,
    remap::RemapParams,
};

/// A fatal problem: the input data violates an invariant of the conversion
/// and must be fixed by the user, not papered over.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RemapError {
    /// The `OFFSET`/`BPMS`/`STOPS` data cannot form a usable timing model.
    #[error("invalid {key}: {reason}: `{text}`")]
    InvalidTimingModel {
        /// The simfile key the data came from.
        key: String,
        /// The offending raw text.
        text: String,
        /// What is wrong with it.
        reason: String,
    },
    /// Two rows of different column counts met. Different widths mean
    /// different play styles and must never be silently combined.
    #[error("{chart}: row of width {found} cannot be combined with rows of width {expected}")]
    ChartWidthMismatch {
        /// The difficulty the rows belong to.
        chart: ChartId,
        /// Column count fixed by the first row of the chart.
        expected: usize,
        /// Column count of the offending row.
        found: usize,
    },
    /// Two rows quantized onto the same grid cell and a column is occupied
    /// in both with no merge rule for the pair.
    #[error("{chart}: cannot combine steps `{existing}` and `{incoming}` at measure {measure}, row {row}")]
    ChartMergeConflict {
        /// The difficulty the rows belong to.
        chart: ChartId,
        /// Measure index of the cell, starting at 0.
        measure: usize,
        /// Row index inside the measure, starting at 0.
        row: usize,
        /// The row already placed in the cell.
        existing: String,
        /// The row that arrived second.
        incoming: String,
    },
    /// A difficulty ended up with no steps at all; there is nothing to
    /// rebuild a grid from.
    #[error("{chart}: chart has no steps")]
    EmptyChart {
        /// The difficulty that came up empty.
        chart: ChartId,
    },
    /// A remapped step landed before beat 0 and cannot be placed on the
    /// grid. Usually means the new offset pushes the chart before the
    /// start of the audio.
    #[error("{chart}: step at beat {beat} lies before the first measure")]
    StepBeforeFirstMeasure {
        /// The difficulty the step belongs to.
        chart: ChartId,
        /// The (already quantized) beat the step mapped to.
        beat: f64,
    },
    /// A `NOTES` value does not have the six `:`-separated fields of a
    /// step chart.
    #[error("`NOTES` value has {found} of 6 `:`-separated fields")]
    MalformedChart {
        /// How many fields were actually present.
        found: usize,
    },
    /// The requested snap resolution cannot produce a grid.
    #[error("snap must be at least 1, got {snap}")]
    InvalidSnap {
        /// The rejected value.
        snap: u32,
    },
}

/// A non-fatal anomaly surfaced alongside a successful conversion.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RemapWarning {
    /// The tokenizer skipped something it could not read.
    #[error("lex: {0}")]
    Lex(#[from] LexWarning),
    /// A hold shorter than the new grid spacing collapsed into a single
    /// tap; the hold is lost.
    #[error("{chart}: turned a very short hold into a tap at measure {measure}, row {row}, column {column}")]
    ShortHoldDropped {
        /// The difficulty the hold belonged to.
        chart: ChartId,
        /// Measure index of the cell, starting at 0.
        measure: usize,
        /// Row index inside the measure, starting at 0.
        row: usize,
        /// Column of the collapsed hold, starting at 0.
        column: usize,
    },
    /// Two rows quantized onto the same grid cell and were merged
    /// column by column.
    #[error("{chart}: combined steps `{first}` and `{second}` into `{merged}` at measure {measure}, row {row}")]
    RowsCombined {
        /// The difficulty the rows belong to.
        chart: ChartId,
        /// Measure index of the cell, starting at 0.
        measure: usize,
        /// Row index inside the measure, starting at 0.
        row: usize,
        /// The row already placed in the cell.
        first: String,
        /// The row that arrived second.
        second: String,
        /// The merged result.
        merged: String,
    },
}

/// Type alias of `core::result::Result<T, RemapError>`.
pub type Result<T> = core::result::Result<T, RemapError>;

/// Output of a whole-file conversion.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[must_use]
pub struct RemapOutput {
    /// The converted simfile, ready to be serialized.
    pub simfile: Simfile,
    /// Everything non-fatal that happened on the way, in encounter order.
    pub warnings: Vec<RemapWarning>,
}

/// Converts a whole simfile onto the timing model described by `params`.
///
/// Lexes `source`, reads the old timing model out of it, installs the new
/// one, then re-times every `BGCHANGES` cue and every `NOTES` chart so they
/// play back at the same real-world instants as before.
///
/// # Errors
///
/// Returns [`RemapError`] if either timing model is unusable, or if any
/// difficulty cannot be rebuilt (merge conflict, width mismatch, empty
/// chart). Per-difficulty failures abort the whole conversion; callers that
/// want to skip a broken difficulty can drive [`remap::remap_chart`]
/// themselves.
pub fn remap_simfile(source: &str, params: &RemapParams) -> Result<RemapOutput> {
    if params.snap == 0 {
        return Err(RemapError::InvalidSnap { snap: params.snap });
    }

    let LexOutput { pairs, lex_warnings } = lex::parse(source);
    let old = Simfile::from_pairs(pairs)?;

    let mut new = old.clone();
    new.update_timing(params.offset, &params.bpms, &params.stops)?;
    let new_timing = new.timing().clone();

    let mut warnings: Vec<RemapWarning> =
        lex_warnings.into_iter().map(RemapWarning::from).collect();

    for pair in new.pairs_mut() {
        if pair.key.eq_ignore_ascii_case("bgchanges") {
            pair.value = remap::remap_background_cues(old.timing(), &new_timing, &pair.value)?;
        }
    }

    for pair in new.pairs_mut() {
        if !pair.key.eq_ignore_ascii_case("notes") {
            continue;
        }
        let chart = StepChart::parse(&pair.value)?;
        let (remapped, chart_warnings) =
            remap::remap_chart(old.timing(), &new_timing, &chart, params.snap)?;
        pair.value = remapped.unparse();
        warnings.extend(chart_warnings);
    }

    Ok(RemapOutput { simfile: new, warnings })
}
