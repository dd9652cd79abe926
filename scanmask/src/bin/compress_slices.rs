//! Batch conversion of 16-bit scan slices to 8-bit PNGs
//!
//! Reads `{i:05}.tif` for every index in `start..=end`, clips the sample range,
//! optionally masks out the casing and background, and writes `{i:05}.png`
//! next to the source.
//!
//! # Usage
//!
//! ```bash
//! # Plain clip-and-convert of slices 0-4 in the current directory
//! cargo run --release --bin compress_slices -- --start 0 --end 4
//!
//! # Mask each slice with the clustering pipeline
//! cargo run --release --bin compress_slices -- --dir scans --end 100 --method masked --frame 20
//!
//! # Tuned parameters from a file, deleting the originals afterwards
//! cargo run --release --bin compress_slices -- --method masked --config params.json --remove-original
//! ```

use std::path::PathBuf;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use rayon::prelude::*;
use scanmask::batch::{process_slice, BatchError, Method, Outcome, SliceJob};
use scanmask::{Frame, MaskParams, SeedPoint};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory holding the numbered slices
    #[arg(short, long, default_value = ".")]
    dir: PathBuf,

    /// First slice index
    #[arg(long, default_value_t = 0)]
    start: u32,

    /// Last slice index (inclusive)
    #[arg(long, default_value_t = 4)]
    end: u32,

    /// Raw value mapped to 0
    #[arg(long, default_value_t = 18000.0)]
    clip_min: f64,

    /// Raw value mapped to 255
    #[arg(long, default_value_t = 65535.0)]
    clip_max: f64,

    /// Masking mode
    #[arg(short, long, value_enum, default_value_t = Method::Basic)]
    method: Method,

    /// Delete each source slice once its PNG is written
    #[arg(long, default_value_t = false)]
    remove_original: bool,

    /// JSON parameter file for the masking pipeline
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Border margins forced to background: "m" or "top,bottom,left,right"
    #[arg(long, default_value = "0")]
    frame: Frame,

    #[arg(
        long,
        help = "Seed point inside the specimen as \"row,col\"",
        long_help = "Full-resolution pixel inside the specimen where the region fill \
            starts. Must not land on the casing outline or inside the frame. \
            Defaults to the center of each slice."
    )]
    seed: Option<SeedPoint>,

    /// Keep large interior edge components when pruning
    #[arg(long, default_value_t = false)]
    min_size_check: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    if args.end < args.start {
        return Err(format!("end ({}) is before start ({})", args.end, args.start).into());
    }

    let mut params = match &args.config {
        Some(path) => MaskParams::from_json_file(path)?,
        None => MaskParams::default(),
    };
    // The clip window drives both the written levels and the mask normalization
    params.intensity.low = args.clip_min;
    params.intensity.high = Some(args.clip_max);
    params.validate()?;

    info!(
        "Converting slices {:05}..={:05} in {} with method {}",
        args.start,
        args.end,
        args.dir.display(),
        args.method
    );

    let job = SliceJob {
        dir: args.dir.clone(),
        method: args.method,
        remove_original: args.remove_original,
        frame: args.frame,
        seed: args.seed,
        min_size_check: args.min_size_check,
    };

    let indices: Vec<u32> = (args.start..=args.end).collect();
    let progress = ProgressBar::new(indices.len() as u64);
    progress.set_style(
        ProgressStyle::with_template("{bar:40} {pos}/{len} slices [{elapsed_precise}] {msg}")?
            .progress_chars("=> "),
    );

    let results: Vec<(u32, Result<Outcome, BatchError>)> = indices
        .par_iter()
        .map(|&index| {
            let result = process_slice(index, &job, &params);
            progress.inc(1);
            (index, result)
        })
        .collect();
    progress.finish_with_message("done");

    let mut written = 0;
    let mut missing = 0;
    let mut failed = 0;
    for (index, result) in results {
        match result {
            Ok(Outcome::Written) => written += 1,
            Ok(Outcome::Missing) => missing += 1,
            Err(e) => {
                warn!("Slice {index:05} failed: {e}");
                failed += 1;
            }
        }
    }

    info!("Wrote {written} slices, {missing} missing, {failed} failed");
    if failed > 0 {
        return Err(format!("{failed} slices failed").into());
    }
    Ok(())
}
