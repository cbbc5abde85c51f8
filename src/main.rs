//! Command-line front end: reads a simfile, re-times it onto the given
//! `BPMS`/`STOPS`/`OFFSET` definition, writes the result.
//!
//! Re-timing often has the side effect of removing a lot of gimmicks.

use std::{fs, path::PathBuf, process::ExitCode};

use clap::Parser;

use sm_remap::sm::{RemapOutput, remap::RemapParams, remap_simfile};

/// Remaps a StepMania `.sm` simfile onto a new tempo definition while
/// preserving the real-world timing of every step.
#[derive(Debug, Parser)]
#[command(name = "sm-remap", version, about)]
struct Args {
    /// Which file to read for input.
    #[arg(long)]
    input: PathBuf,
    /// Where to write the translated file.
    #[arg(long)]
    output: PathBuf,
    /// BPMS to use, in `.sm` `beat=bpm` format.
    #[arg(long)]
    bpms: String,
    /// STOPS to use, in `.sm` `beat=seconds` format.
    #[arg(long, default_value = "")]
    stops: String,
    /// New offset in seconds (omit to keep the existing one).
    #[arg(long)]
    offset: Option<f64>,
    /// Beat division for snapping the steps.
    #[arg(long, default_value_t = 16, value_parser = clap::value_parser!(u32).range(1..))]
    snap: u32,
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let source = fs::read_to_string(&args.input)?;
    let params = RemapParams {
        offset: args.offset,
        bpms: args.bpms.clone(),
        stops: args.stops.clone(),
        snap: args.snap,
    };
    let RemapOutput { simfile, warnings } = remap_simfile(&source, &params)?;
    for warning in &warnings {
        eprintln!("warning: {warning}");
    }
    fs::write(&args.output, simfile.unparse())?;
    Ok(())
}
