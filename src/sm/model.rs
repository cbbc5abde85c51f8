//! Simfile document model: the ordered key/value pairs plus the timing
//! model parsed out of `OFFSET`, `BPMS` and `STOPS`.

use super::{
    RemapError, Result,
    lex::KeyValue,
    timing::{BpmChange, Stop, TimingModel},
    unparse,
};

/// One `.sm` document.
///
/// Owns every `#KEY:VALUE;` pair in file order — unrecognized keys are kept
/// verbatim — and keeps the parsed [`TimingModel`] in sync with the
/// timing-related pairs. The old document stays untouched during a
/// conversion; the remapper clones it and rewrites the clone.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Simfile {
    pairs: Vec<KeyValue>,
    timing: TimingModel,
}

impl Simfile {
    /// Builds a document from tokenized pairs, parsing the timing keys.
    ///
    /// `OFFSET` defaults to 0 and `STOPS` to empty when absent; a missing
    /// or empty `BPMS` is an error because no chart can be timed without a
    /// tempo.
    ///
    /// # Errors
    ///
    /// Returns [`RemapError::InvalidTimingModel`] with the offending raw
    /// text when a timing value does not parse or violates the model
    /// invariants.
    pub fn from_pairs(pairs: Vec<KeyValue>) -> Result<Self> {
        let mut offset = 0.0_f64;
        let mut bpms = Vec::new();
        let mut stops = Vec::new();
        for pair in &pairs {
            if pair.key.eq_ignore_ascii_case("offset") {
                offset = parse_float("OFFSET", &pair.value)?;
            } else if pair.key.eq_ignore_ascii_case("bpms") {
                bpms = parse_beat_pairs("BPMS", &pair.value)?
                    .into_iter()
                    .map(|(beat, bpm)| BpmChange { beat, bpm })
                    .collect();
            } else if pair.key.eq_ignore_ascii_case("stops") {
                stops = parse_beat_pairs("STOPS", &pair.value)?
                    .into_iter()
                    .map(|(beat, duration)| Stop { beat, duration })
                    .collect();
            }
        }
        let timing = TimingModel::new(offset, bpms, stops)?;
        Ok(Self { pairs, timing })
    }

    /// The parsed timing model.
    #[must_use]
    pub const fn timing(&self) -> &TimingModel {
        &self.timing
    }

    /// Every pair, in file order.
    #[must_use]
    pub fn pairs(&self) -> &[KeyValue] {
        &self.pairs
    }

    pub(crate) fn pairs_mut(&mut self) -> &mut Vec<KeyValue> {
        &mut self.pairs
    }

    /// Installs a new timing definition.
    ///
    /// `bpms` and `stops` are raw `.sm` value text; they are validated,
    /// then written into the existing `BPMS`/`STOPS` pairs verbatim. When
    /// `offset` is given, the `OFFSET` pair is rewritten as `%.4f`;
    /// otherwise the old offset stays. Pairs absent from the document are
    /// left absent.
    ///
    /// # Errors
    ///
    /// Returns [`RemapError::InvalidTimingModel`] when the new text does
    /// not form a usable timing model; the document is not modified in
    /// that case.
    pub fn update_timing(&mut self, offset: Option<f64>, bpms: &str, stops: &str) -> Result<()> {
        let new_offset = offset.unwrap_or(self.timing.offset());
        let new_bpms = parse_beat_pairs("BPMS", bpms)?
            .into_iter()
            .map(|(beat, bpm)| BpmChange { beat, bpm })
            .collect();
        let new_stops = parse_beat_pairs("STOPS", stops)?
            .into_iter()
            .map(|(beat, duration)| Stop { beat, duration })
            .collect();
        self.timing = TimingModel::new(new_offset, new_bpms, new_stops)?;

        for pair in &mut self.pairs {
            if pair.key.eq_ignore_ascii_case("bpms") {
                pair.value = bpms.to_owned();
            } else if pair.key.eq_ignore_ascii_case("stops") {
                pair.value = stops.to_owned();
            } else if offset.is_some() && pair.key.eq_ignore_ascii_case("offset") {
                pair.value = format!("{new_offset:.4}");
            }
        }
        Ok(())
    }

    /// Serializes the document back to `.sm` text, one `#KEY:VALUE;` pair
    /// per entry.
    #[must_use]
    pub fn unparse(&self) -> String {
        unparse::unparse(&self.pairs)
    }
}

/// Parses comma-separated `beat=value` text, the common shape of `BPMS`
/// and `STOPS`. Empty or whitespace-only text yields an empty list.
///
/// # Errors
///
/// Returns [`RemapError::InvalidTimingModel`] naming `key` and the
/// offending entry when an entry has no `=` or either side is not a
/// number.
pub fn parse_beat_pairs(key: &str, text: &str) -> Result<Vec<(f64, f64)>> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(Vec::new());
    }
    let mut pairs = Vec::new();
    for item in text.split(',') {
        let Some((beat, value)) = item.split_once('=') else {
            return Err(malformed(key, item, "expected `beat=value`"));
        };
        let beat: f64 = beat
            .trim()
            .parse()
            .map_err(|_| malformed(key, item, "beat is not a number"))?;
        let value: f64 = value
            .trim()
            .parse()
            .map_err(|_| malformed(key, item, "value is not a number"))?;
        pairs.push((beat, value));
    }
    Ok(pairs)
}

fn parse_float(key: &str, text: &str) -> Result<f64> {
    text.trim()
        .parse()
        .map_err(|_| malformed(key, text, "expected a decimal number"))
}

fn malformed(key: &str, text: &str, reason: &str) -> RemapError {
    RemapError::InvalidTimingModel {
        key: key.to_owned(),
        text: text.trim().to_owned(),
        reason: reason.to_owned(),
    }
}
