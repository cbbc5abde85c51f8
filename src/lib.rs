//! Re-times StepMania `.sm` simfiles onto a new tempo definition.
//!
//! A simfile carries its own timing model (`OFFSET`, `BPMS`, `STOPS`) and
//! step charts laid out on a beat grid relative to that model. This crate
//! converts a chart written against one timing model so that it plays back
//! identically under another: every step's beat is turned into the
//! real-world time it occurs at under the old model, that time is turned
//! back into a beat under the new model, and the step is re-quantized onto
//! a fresh grid. Steps that land on the same grid cell are merged where the
//! notation allows it.
//!
//! The usual entry point is [`sm::remap_simfile`]; the pieces (tokenizer,
//! document model, timing conversion, grid rebuild) are public under [`sm`]
//! for callers that need finer control.

pub mod sm;
