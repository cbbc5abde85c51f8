//! Prelude module for the `.sm` remapper.
//!
//! Re-exports the public types for convenient access: `use
//! sm_remap::sm::prelude::*;`.

pub use super::{
    RemapError, RemapOutput, RemapWarning, Result, remap_simfile,
    chart::{ChartEvent, ChartId, StepChart, build_grid, extract_events, is_rest},
    lex::{KeyValue, LexOutput, LexWarning},
    merge::{MergeOutcome, merge_rows},
    model::{Simfile, parse_beat_pairs},
    remap::{RemapParams, quantize, remap_background_cues, remap_chart},
    timing::{BpmChange, Stop, TimingModel},
    unparse::unparse,
};
