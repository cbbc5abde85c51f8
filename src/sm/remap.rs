//! Drives the conversion: old beats → seconds → new beats → re-quantized
//! grid.

use super::{
    RemapError, RemapWarning, Result,
    chart::{self, ChartEvent, StepChart},
    timing::TimingModel,
};

/// Everything the caller chooses for a conversion.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RemapParams {
    /// New `OFFSET` in seconds; `None` keeps the old one.
    pub offset: Option<f64>,
    /// New `BPMS` value text, `beat=bpm` pairs.
    pub bpms: String,
    /// New `STOPS` value text, `beat=seconds` pairs. Empty for none.
    pub stops: String,
    /// Rows per 4-beat measure in the rebuilt charts. Must be at least 1.
    pub snap: u32,
}

/// Snaps a beat to the nearest line of the `snap`-rows-per-measure grid.
///
/// Ties round half away from zero (`f64::round`), so a beat exactly
/// halfway between two grid lines moves to the later one.
#[must_use]
pub fn quantize(beat: f64, snap: u32) -> f64 {
    (beat * f64::from(snap) / 4.0).round() * 4.0 / f64::from(snap)
}

/// Re-times one difficulty onto a new timing model.
///
/// Every non-empty row's beat is converted to the real-world time it plays
/// at under `old`, back to a beat under `new`, quantized to the `snap`
/// grid, and laid out on a fresh measure grid. Two rows quantizing onto
/// the same cell is expected — the grid got coarser or the chart got
/// denser — and is resolved by merging, not treated as an error by itself.
///
/// Returns the rebuilt chart plus the warnings the rebuild produced.
///
/// # Errors
///
/// [`RemapError::InvalidSnap`] for a zero snap; otherwise whatever
/// [`chart::build_grid`] reports for this difficulty.
pub fn remap_chart(
    old: &TimingModel,
    new: &TimingModel,
    step_chart: &StepChart,
    snap: u32,
) -> Result<(StepChart, Vec<RemapWarning>)> {
    if snap == 0 {
        return Err(RemapError::InvalidSnap { snap });
    }
    let id = step_chart.id();
    let events: Vec<ChartEvent> = chart::extract_events(&step_chart.measures)
        .into_iter()
        .map(|event| ChartEvent {
            beat: quantize(new.beat_at(old.time_at(event.beat)), snap),
            row: event.row,
        })
        .collect();
    let (measures, warnings) = chart::build_grid(&events, snap, &id)?;
    let remapped = StepChart {
        measures,
        ..step_chart.clone()
    };
    Ok((remapped, warnings))
}

/// Re-times a `BGCHANGES` value onto a new timing model.
///
/// Each comma-separated `beat=effect` cue is moved to
/// `new.beat_at(old.time_at(beat))` and written back as `%.3f=effect`.
/// Cues are opaque and single-valued: no quantization, no merging; cues
/// that end up on the same beat are all kept, in order. Empty entries
/// (trailing commas) are dropped.
///
/// # Errors
///
/// Returns [`RemapError::InvalidTimingModel`] naming `BGCHANGES` and the
/// offending entry when a cue has no `=` or a non-numeric beat.
pub fn remap_background_cues(
    old: &TimingModel,
    new: &TimingModel,
    value: &str,
) -> Result<String> {
    let mut cues = Vec::new();
    for entry in value.split(',') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        let Some((beat, effect)) = entry.split_once('=') else {
            return Err(malformed_cue(entry, "expected `beat=effect`"));
        };
        let beat: f64 = beat
            .trim()
            .parse()
            .map_err(|_| malformed_cue(entry, "beat is not a number"))?;
        let new_beat = new.beat_at(old.time_at(beat));
        cues.push(format!("{new_beat:.3}={effect}"));
    }
    Ok(cues.join(",\n"))
}

fn malformed_cue(entry: &str, reason: &str) -> RemapError {
    RemapError::InvalidTimingModel {
        key: "BGCHANGES".to_owned(),
        text: entry.to_owned(),
        reason: reason.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::sm::timing::BpmChange;

    fn constant_bpm(bpm: f64) -> TimingModel {
        TimingModel::new(0.0, vec![BpmChange { beat: 0.0, bpm }], vec![])
            .expect("test model must be valid")
    }

    #[test]
    fn quantize_keeps_on_grid_beats() {
        assert_eq!(quantize(2.0, 4), 2.0);
        assert_eq!(quantize(0.5, 8), 0.5);
        assert_eq!(quantize(3.0, 16), 3.0);
    }

    #[test]
    fn quantize_rounds_to_nearest_line() {
        // Snap 16 → grid lines every 0.25 beats.
        assert_eq!(quantize(0.3, 16), 0.25);
        assert_eq!(quantize(0.45, 16), 0.5);
    }

    #[test]
    fn quantize_half_way_rounds_up() {
        // 0.125 sits exactly between the 0.0 and 0.25 lines.
        assert_eq!(quantize(0.125, 16), 0.25);
        assert_eq!(quantize(1.125, 16), 1.25);
    }

    #[test]
    fn half_tempo_doubles_every_beat() {
        // An event on beat 1 at 120 BPM plays at 0.5s; at 60 BPM that
        // time is beat 0.5. Snap 4 puts grid lines one beat apart, so the
        // halfway beat rounds up to 1.0: the second row of measure 0.
        let old = constant_bpm(120.0);
        let new = constant_bpm(60.0);
        let source = StepChart {
            mode: "dance-single".into(),
            description: String::new(),
            difficulty: "Hard".into(),
            meter: "9".into(),
            radar: String::new(),
            measures: "0000\n1000\n0000\n0000".into(),
        };
        let (remapped, warnings) = remap_chart(&old, &new, &source, 4).expect("clean remap");
        assert_eq!(warnings, vec![]);
        assert_eq!(remapped.measures, "0000\n1000\n0000\n0000");
        assert_eq!(remapped.difficulty, "Hard");
    }

    #[test]
    fn identity_remap_reproduces_the_grid() {
        let model = constant_bpm(120.0);
        let source = StepChart {
            mode: "dance-single".into(),
            description: String::new(),
            difficulty: "Hard".into(),
            meter: "9".into(),
            radar: String::new(),
            measures: "1000\n0100\n0010\n0001\n,\n0000\n0000\nM000\n0000".into(),
        };
        let (remapped, warnings) = remap_chart(&model, &model, &source, 4).expect("identity");
        assert_eq!(warnings, vec![]);
        assert_eq!(remapped.measures, source.measures);
    }

    #[test]
    fn zero_snap_is_rejected() {
        let model = constant_bpm(120.0);
        let source = StepChart {
            mode: "dance-single".into(),
            description: String::new(),
            difficulty: "Hard".into(),
            meter: "1".into(),
            radar: String::new(),
            measures: "1000".into(),
        };
        let err = remap_chart(&model, &model, &source, 0).expect_err("snap 0");
        assert_eq!(err, RemapError::InvalidSnap { snap: 0 });
    }

    #[test]
    fn background_cues_move_without_quantization() {
        let old = constant_bpm(120.0);
        let new = constant_bpm(60.0);
        let moved = remap_background_cues(&old, &new, "0.000=song.avi=1=0,8.000=next.avi=1=1")
            .expect("valid cues");
        assert_eq!(moved, "0.000=song.avi=1=0,\n4.000=next.avi=1=1");
    }

    #[test]
    fn background_cues_keep_effect_text_verbatim() {
        let model = constant_bpm(120.0);
        let moved = remap_background_cues(&model, &model, "4=file=1.5=yes").expect("valid cue");
        assert_eq!(moved, "4.000=file=1.5=yes");
    }

    #[test]
    fn background_cues_reject_missing_equals() {
        let model = constant_bpm(120.0);
        let err = remap_background_cues(&model, &model, "nonsense").expect_err("no `=`");
        assert!(matches!(
            err,
            RemapError::InvalidTimingModel { ref key, .. } if key == "BGCHANGES"
        ));
    }
}
