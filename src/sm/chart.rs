//! Measure/row grid for one difficulty's step data.
//!
//! A chart encodes steps as comma-separated measures of newline-separated
//! rows. Every row is one character per playable column; a measure spans 4
//! beats, split evenly over however many rows that measure happens to
//! have. Measures of one chart may be split at different resolutions, so
//! the row count is read per measure, never assumed globally.

use std::fmt;

use itertools::Itertools;

use super::{RemapError, RemapWarning, Result, merge};

/// Identifies one difficulty for diagnostics: play mode (`dance-single`,
/// `dance-double`, ...) plus the difficulty slot (`Beginner`..`Challenge`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChartId {
    /// The play mode field of the chart.
    pub mode: String,
    /// The difficulty field of the chart.
    pub difficulty: String,
}

impl fmt::Display for ChartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.mode, self.difficulty)
    }
}

/// One non-empty row lifted off the grid, with the absolute beat it
/// plays at.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChartEvent {
    /// Beat of the row: `measure * 4 + row * 4 / rows_in_measure`.
    pub beat: f64,
    /// The row text, one code per column.
    pub row: String,
}

/// The six `:`-separated fields of one `NOTES` value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StepChart {
    /// Play mode, e.g. `dance-single`.
    pub mode: String,
    /// Free-text author/description field.
    pub description: String,
    /// Difficulty slot, e.g. `Challenge`.
    pub difficulty: String,
    /// Numeric meter, kept as text.
    pub meter: String,
    /// Radar/groove values, kept as text.
    pub radar: String,
    /// The measure data: comma-separated measures of newline-separated
    /// rows.
    pub measures: String,
}

impl StepChart {
    /// Splits a `NOTES` value into its six fields, trimming each. Only the
    /// first five `:` split, so measure data is never cut.
    ///
    /// # Errors
    ///
    /// Returns [`RemapError::MalformedChart`] when fewer than six fields
    /// are present.
    pub fn parse(value: &str) -> Result<Self> {
        let fields: Vec<&str> = value.splitn(6, ':').map(str::trim).collect();
        let [mode, description, difficulty, meter, radar, measures] = fields[..] else {
            return Err(RemapError::MalformedChart { found: fields.len() });
        };
        Ok(Self {
            mode: mode.to_owned(),
            description: description.to_owned(),
            difficulty: difficulty.to_owned(),
            meter: meter.to_owned(),
            radar: radar.to_owned(),
            measures: measures.to_owned(),
        })
    }

    /// The diagnostic identity of this chart.
    #[must_use]
    pub fn id(&self) -> ChartId {
        ChartId {
            mode: self.mode.clone(),
            difficulty: self.difficulty.clone(),
        }
    }

    /// Joins the six fields back into a `NOTES` value, each field on its
    /// own line. The writer supplies the closing `;`.
    #[must_use]
    pub fn unparse(&self) -> String {
        [
            self.mode.as_str(),
            self.description.as_str(),
            self.difficulty.as_str(),
            self.meter.as_str(),
            self.radar.as_str(),
            self.measures.as_str(),
        ]
        .join(":\n")
    }
}

/// Whether a row carries no note in any column.
#[must_use]
pub fn is_rest(row: &str) -> bool {
    !row.is_empty() && row.bytes().all(|b| b == b'0')
}

/// Scans measure data and lifts every non-empty row off the grid with its
/// absolute beat, in source order.
///
/// The beat of a row is `measure * 4 + row * 4 / rows_in_this_measure`;
/// the row count is taken from each measure's own split, so coarse and
/// fine measures mix freely.
#[must_use]
pub fn extract_events(measures: &str) -> Vec<ChartEvent> {
    let mut events = Vec::new();
    for (measure_index, measure) in measures.split(',').enumerate() {
        let rows: Vec<&str> = measure
            .lines()
            .map(str::trim)
            .filter(|row| !row.is_empty())
            .collect();
        for (row_index, row) in rows.iter().enumerate() {
            if is_rest(row) {
                continue;
            }
            let beat =
                measure_index as f64 * 4.0 + row_index as f64 * 4.0 / rows.len() as f64;
            events.push(ChartEvent {
                beat,
                row: (*row).to_owned(),
            });
        }
    }
    events
}

/// Rebuilds measure data from events already quantized to the `snap` grid.
///
/// Lays out `floor(max_beat / 4) + 1` measures of `snap` empty rows, then
/// places each event at `measure = floor(beat / 4)`,
/// `row = round((beat - measure * 4) * snap / 4)`. Row overflow from
/// floating-point edge cases carries into the next measure. Events landing
/// on the same cell are merged via [`merge::merge_rows`]; the merge
/// warnings are collected into the returned list.
///
/// # Errors
///
/// [`RemapError::EmptyChart`] when there are no events,
/// [`RemapError::ChartWidthMismatch`] when an event's width differs from
/// the first event's, [`RemapError::StepBeforeFirstMeasure`] for events
/// before beat 0, and [`RemapError::ChartMergeConflict`] from merging.
pub fn build_grid(
    events: &[ChartEvent],
    snap: u32,
    chart: &ChartId,
) -> Result<(String, Vec<RemapWarning>)> {
    let Some(first) = events.first() else {
        return Err(RemapError::EmptyChart { chart: chart.clone() });
    };
    let width = first.row.len();
    for event in events {
        if event.row.len() != width {
            return Err(RemapError::ChartWidthMismatch {
                chart: chart.clone(),
                expected: width,
                found: event.row.len(),
            });
        }
        if event.beat < 0.0 {
            return Err(RemapError::StepBeforeFirstMeasure {
                chart: chart.clone(),
                beat: event.beat,
            });
        }
    }

    let snap = snap as usize;
    let max_beat = events.iter().fold(0.0_f64, |max, event| max.max(event.beat));
    let measure_count = (max_beat / 4.0).floor() as usize + 1;
    let blank = "0".repeat(width);
    let mut grid: Vec<Vec<String>> = vec![vec![blank; snap]; measure_count];

    let mut warnings = Vec::new();
    for event in events {
        let mut measure = (event.beat / 4.0).floor() as usize;
        let mut row =
            ((event.beat - measure as f64 * 4.0) * snap as f64 / 4.0).round() as usize;
        if row >= snap {
            measure += row / snap;
            row %= snap;
        }
        while measure >= grid.len() {
            grid.push(vec!["0".repeat(width); snap]);
        }
        let cell = &mut grid[measure][row];
        match merge::merge_rows(cell, &event.row, chart, measure, row)? {
            merge::MergeOutcome::Placed(merged) => *cell = merged,
            merge::MergeOutcome::Merged {
                row: merged,
                warnings: cell_warnings,
            } => {
                *cell = merged;
                warnings.extend(cell_warnings);
            }
        }
    }

    let text = grid.iter().map(|rows| rows.join("\n")).join("\n,\n");
    Ok((text, warnings))
}
