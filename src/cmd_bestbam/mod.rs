//! Subcommand modules for the `bestbam` binary.

pub mod check;
pub mod hit;

use bestbam::libs::error::HitError;
use bestbam::libs::scanner::{DecoderSource, LineSource, ReaderSource, StreamScanner};

/// Open one scanner per input, either over SAM text or through the decoder.
pub fn open_scanners(
    infiles: &[String],
    labels: &[String],
    is_sam: bool,
    samtools: &str,
) -> anyhow::Result<Vec<StreamScanner>> {
    if infiles.is_empty() {
        return Err(HitError::Config("must specify at least one input file".to_string()).into());
    }
    if infiles.iter().filter(|f| f.as_str() == "stdin").count() > 1 {
        return Err(HitError::Config("stdin can only be used once".to_string()).into());
    }
    if !is_sam && which::which(samtools).is_err() {
        return Err(HitError::Config(format!(
            "{} not found in PATH. Please install samtools first, or pass --sam for text inputs.",
            samtools
        ))
        .into());
    }

    let mut scanners = Vec::with_capacity(infiles.len());
    for (infile, label) in infiles.iter().zip(labels) {
        let source: Box<dyn LineSource> = if is_sam {
            Box::new(ReaderSource::new(infile, bestbam::reader(infile)?))
        } else {
            Box::new(DecoderSource::new(samtools, infile))
        };
        scanners.push(StreamScanner::new(label, source));
    }

    Ok(scanners)
}
