//! Conversion between elapsed seconds and musical beats for one simfile.
//!
//! Tempo is a step function of beat given by the `BPMS` list; `STOPS`
//! freeze elapsed time without advancing the beat. Beat 0 plays at
//! `-OFFSET` seconds into the audio.

use itertools::Itertools;

use super::{RemapError, Result};

/// A tempo change: from `beat` onward the chart runs at `bpm`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BpmChange {
    /// Beat this tempo takes effect at.
    pub beat: f64,
    /// Beats per minute from this beat on. Must be positive.
    pub bpm: f64,
}

/// A stop: once `beat` is reached, elapsed time freezes for `duration`
/// seconds while the beat stands still.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Stop {
    /// Beat the pause happens at.
    pub beat: f64,
    /// Pause length in seconds. Must not be negative.
    pub duration: f64,
}

/// One constant-tempo span of beats, derived from consecutive entries of
/// the `BPMS` list. The last span runs to infinity.
#[derive(Debug, Clone, Copy)]
struct TempoSpan {
    from: f64,
    until: f64,
    seconds_per_beat: f64,
}

/// Converts between absolute time and musical beat for a single chart.
///
/// Pure value type; construction validates the invariants (at least one
/// tempo entry, positive BPMs, beats sorted ascending) and conversion
/// never fails after that. [`time_at`](Self::time_at) and
/// [`beat_at`](Self::beat_at) are exact inverses of each other, including
/// across tempo changes and stops.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimingModel {
    offset: f64,
    bpms: Vec<BpmChange>,
    stops: Vec<Stop>,
}

impl TimingModel {
    /// Builds a timing model from an offset in seconds, the tempo list and
    /// the stop list.
    ///
    /// # Errors
    ///
    /// Returns [`RemapError::InvalidTimingModel`] when the tempo list is
    /// empty, a BPM is not positive, a stop duration is negative, a beat
    /// is negative, any value is not finite, or either list is out of
    /// order.
    pub fn new(offset: f64, bpms: Vec<BpmChange>, stops: Vec<Stop>) -> Result<Self> {
        if !offset.is_finite() {
            return Err(invalid("OFFSET", format!("{offset}"), "offset must be finite"));
        }
        if bpms.is_empty() {
            return Err(invalid("BPMS", "", "at least one BPM entry is required"));
        }
        for entry in &bpms {
            if !entry.beat.is_finite() || !entry.bpm.is_finite() || entry.bpm <= 0.0 {
                return Err(invalid(
                    "BPMS",
                    format!("{}={}", entry.beat, entry.bpm),
                    "BPM must be finite and positive",
                ));
            }
            if entry.beat < 0.0 {
                return Err(invalid(
                    "BPMS",
                    format!("{}={}", entry.beat, entry.bpm),
                    "tempo changes before beat 0 are not supported",
                ));
            }
        }
        for (earlier, later) in bpms.iter().tuple_windows() {
            if later.beat <= earlier.beat {
                return Err(invalid(
                    "BPMS",
                    format!("{}={}", later.beat, later.bpm),
                    "beats must be strictly increasing",
                ));
            }
        }
        for entry in &stops {
            if !entry.beat.is_finite() || !entry.duration.is_finite() || entry.duration < 0.0 {
                return Err(invalid(
                    "STOPS",
                    format!("{}={}", entry.beat, entry.duration),
                    "stop duration must be finite and not negative",
                ));
            }
            if entry.beat < 0.0 {
                return Err(invalid(
                    "STOPS",
                    format!("{}={}", entry.beat, entry.duration),
                    "stops before beat 0 are not supported",
                ));
            }
        }
        for (earlier, later) in stops.iter().tuple_windows() {
            if later.beat < earlier.beat {
                return Err(invalid(
                    "STOPS",
                    format!("{}={}", later.beat, later.duration),
                    "beats must be sorted ascending",
                ));
            }
        }
        Ok(Self { offset, bpms, stops })
    }

    /// The `OFFSET` value: seconds between the start of the audio and
    /// beat 0.
    #[must_use]
    pub const fn offset(&self) -> f64 {
        self.offset
    }

    /// The tempo list, ascending by beat.
    #[must_use]
    pub fn bpms(&self) -> &[BpmChange] {
        &self.bpms
    }

    /// The stop list, ascending by beat.
    #[must_use]
    pub fn stops(&self) -> &[Stop] {
        &self.stops
    }

    fn tempo_spans(&self) -> impl Iterator<Item = TempoSpan> + '_ {
        // The first tempo applies from beat 0 even if its declared beat is
        // later; the last span is open-ended.
        self.bpms.iter().enumerate().map(|(i, entry)| TempoSpan {
            from: if i == 0 { 0.0 } else { entry.beat },
            until: self
                .bpms
                .get(i + 1)
                .map_or(f64::INFINITY, |next| next.beat),
            seconds_per_beat: 60.0 / entry.bpm,
        })
    }

    /// Elapsed seconds at which `beat` plays.
    ///
    /// Negative beats extrapolate linearly with the first tempo. For
    /// positive beats, every stop strictly before `beat` contributes its
    /// full duration.
    #[must_use]
    pub fn time_at(&self, beat: f64) -> f64 {
        if beat == 0.0 {
            return -self.offset;
        }
        if beat < 0.0 {
            return -self.offset + beat * 60.0 / self.bpms[0].bpm;
        }
        let mut time = -self.offset;
        for span in self.tempo_spans() {
            if span.until <= beat {
                time += (span.until - span.from) * span.seconds_per_beat;
            } else {
                time += (beat - span.from) * span.seconds_per_beat;
                break;
            }
        }
        time += self
            .stops
            .iter()
            .take_while(|stop| stop.beat < beat)
            .map(|stop| stop.duration)
            .sum::<f64>();
        time
    }

    /// Beat playing at elapsed time `time`; the exact inverse of
    /// [`time_at`](Self::time_at).
    ///
    /// A stop freezes time over a closed interval; every query time inside
    /// that interval maps to the stop's beat exactly.
    #[must_use]
    pub fn beat_at(&self, time: f64) -> f64 {
        if time == -self.offset {
            return 0.0;
        }
        if time < -self.offset {
            return (time + self.offset) * self.bpms[0].bpm / 60.0;
        }
        // Walk the beat-ordered regions, consuming the seconds elapsed
        // since beat 0. Stops are zero-beat regions interleaved with the
        // tempo spans.
        let mut remaining = time + self.offset;
        let mut beat = 0.0_f64;
        let mut stops = self.stops.iter().peekable();
        for span in self.tempo_spans() {
            while let Some(stop) = stops.peek() {
                if stop.beat >= span.until {
                    break;
                }
                let run = (stop.beat - beat) * span.seconds_per_beat;
                if remaining < run {
                    return beat + remaining / span.seconds_per_beat;
                }
                remaining -= run;
                beat = stop.beat;
                if remaining <= stop.duration {
                    return beat;
                }
                remaining -= stop.duration;
                stops.next();
            }
            let run = (span.until - beat) * span.seconds_per_beat;
            if remaining < run {
                return beat + remaining / span.seconds_per_beat;
            }
            remaining -= run;
            beat = span.until;
        }
        // The last span is unbounded, so the loop always returns.
        beat
    }
}

fn invalid(key: &str, text: impl Into<String>, reason: &str) -> RemapError {
    RemapError::InvalidTimingModel {
        key: key.to_owned(),
        text: text.into(),
        reason: reason.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const EPS: f64 = 1e-9;

    fn model(offset: f64, bpms: &[(f64, f64)], stops: &[(f64, f64)]) -> TimingModel {
        TimingModel::new(
            offset,
            bpms.iter().map(|&(beat, bpm)| BpmChange { beat, bpm }).collect(),
            stops
                .iter()
                .map(|&(beat, duration)| Stop { beat, duration })
                .collect(),
        )
        .expect("test model must be valid")
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < EPS,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn beat_zero_is_minus_offset() {
        let model = model(0.009, &[(0.0, 181.685)], &[]);
        assert_eq!(model.time_at(0.0), -0.009);
        assert_eq!(model.beat_at(-0.009), 0.0);
    }

    #[test]
    fn negative_beats_extrapolate_with_first_bpm() {
        let model = model(0.0, &[(0.0, 120.0)], &[]);
        assert_close(model.time_at(-2.0), -1.0);
        assert_close(model.beat_at(-1.0), -2.0);
    }

    #[test]
    fn single_segment() {
        let model = model(0.0, &[(0.0, 120.0)], &[]);
        assert_close(model.time_at(1.0), 0.5);
        assert_close(model.beat_at(0.5), 1.0);
    }

    #[test]
    fn tempo_change_splits_the_walk() {
        // 4 beats at 120 (2.0s), then 60.
        let model = model(0.0, &[(0.0, 120.0), (4.0, 60.0)], &[]);
        assert_close(model.time_at(4.0), 2.0);
        assert_close(model.time_at(6.0), 4.0);
        assert_close(model.beat_at(2.0), 4.0);
        assert_close(model.beat_at(4.0), 6.0);
        assert_close(model.beat_at(3.0), 5.0);
    }

    #[test]
    fn stop_adds_time_strictly_after_its_beat() {
        let model = model(0.0, &[(0.0, 120.0)], &[(2.0, 1.0)]);
        // At the stop's own beat the pause has not elapsed yet.
        assert_close(model.time_at(2.0), 1.0);
        assert_close(model.time_at(3.0), 2.5);
    }

    #[test]
    fn times_inside_a_stop_pin_to_its_beat() {
        let model = model(0.0, &[(0.0, 120.0)], &[(2.0, 1.0)]);
        assert_close(model.beat_at(1.0), 2.0);
        assert_close(model.beat_at(1.5), 2.0);
        assert_close(model.beat_at(2.0), 2.0);
        assert_close(model.beat_at(2.25), 2.5);
    }

    #[test]
    fn stop_at_beat_zero() {
        let model = model(0.0, &[(0.0, 120.0)], &[(0.0, 2.0)]);
        assert_eq!(model.time_at(0.0), 0.0);
        assert_close(model.time_at(1.0), 2.5);
        assert_close(model.beat_at(1.0), 0.0);
        assert_close(model.beat_at(2.5), 1.0);
    }

    #[test]
    fn round_trip_with_segments_and_stops() {
        let model = model(
            -0.35,
            &[(0.0, 181.685), (16.0, 90.8425), (48.5, 200.0)],
            &[(8.0, 0.5), (16.0, 1.25), (60.0, 0.05)],
        );
        for beat in [0.0, 0.25, 3.75, 8.0, 15.999, 16.0, 16.5, 48.5, 59.9, 60.0, 123.4] {
            assert_close(model.beat_at(model.time_at(beat)), beat);
        }
        // None of these times falls inside a stop's frozen interval; a
        // time inside one maps to the stop's beat, which plays earlier.
        for time in [0.35, 0.5, 2.0, 5.55, 8.875, 20.0, 40.0, 100.0] {
            assert_close(model.time_at(model.beat_at(time)), time);
        }
    }

    #[test]
    fn first_tempo_applies_from_beat_zero_even_if_declared_later() {
        let model = model(0.0, &[(4.0, 120.0), (8.0, 60.0)], &[]);
        assert_close(model.time_at(8.0), 4.0);
        assert_close(model.beat_at(4.0), 8.0);
    }

    #[test]
    fn empty_bpms_is_rejected() {
        let result = TimingModel::new(0.0, vec![], vec![]);
        assert!(matches!(
            result,
            Err(RemapError::InvalidTimingModel { ref key, .. }) if key == "BPMS"
        ));
    }

    #[test]
    fn non_positive_bpm_is_rejected() {
        let result = TimingModel::new(0.0, vec![BpmChange { beat: 0.0, bpm: 0.0 }], vec![]);
        assert!(matches!(result, Err(RemapError::InvalidTimingModel { .. })));
    }

    #[test]
    fn unsorted_bpms_are_rejected() {
        let result = TimingModel::new(
            0.0,
            vec![
                BpmChange { beat: 4.0, bpm: 120.0 },
                BpmChange { beat: 2.0, bpm: 60.0 },
            ],
            vec![],
        );
        assert!(matches!(result, Err(RemapError::InvalidTimingModel { .. })));
    }

    #[test]
    fn negative_stop_beat_is_rejected() {
        let result = TimingModel::new(
            0.0,
            vec![BpmChange { beat: 0.0, bpm: 120.0 }],
            vec![Stop { beat: -1.0, duration: 0.5 }],
        );
        assert!(matches!(result, Err(RemapError::InvalidTimingModel { .. })));
    }
}
