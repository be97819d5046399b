use crate::libs::error::{HitError, Result};
use std::io::{BufRead, BufReader, BufWriter, Write};

fn is_gz(path: &std::path::Path) -> bool {
    path.extension() == Some(std::ffi::OsStr::new("gz"))
}

/// Open `stdin`, a plain file, or a gzipped file for reading.
///
/// ```
/// use std::io::BufRead;
/// let reader = bestbam::reader("tests/sam/human.sam").unwrap();
/// let lines: Vec<_> = reader.lines().collect();
/// assert_eq!(lines.len(), 7);
/// ```
pub fn reader(input: &str) -> Result<Box<dyn BufRead>> {
    let reader: Box<dyn BufRead> = if input == "stdin" {
        Box::new(BufReader::new(std::io::stdin()))
    } else {
        let path = std::path::Path::new(input);
        let file = std::fs::File::open(path)
            .map_err(|e| HitError::io(format!("could not open {}", path.display()), e))?;

        if is_gz(path) {
            Box::new(BufReader::new(flate2::read::MultiGzDecoder::new(file)))
        } else {
            Box::new(BufReader::new(file))
        }
    };

    Ok(reader)
}

/// Open `stdout`, a plain file, or (for `.gz` names) a gzip stream for writing.
pub fn writer(output: &str) -> Result<Box<dyn Write>> {
    let writer: Box<dyn Write> = if output == "stdout" {
        Box::new(BufWriter::new(std::io::stdout()))
    } else {
        let path = std::path::Path::new(output);
        let file = std::fs::File::create(path)
            .map_err(|e| HitError::io(format!("could not create {}", path.display()), e))?;

        if is_gz(path) {
            Box::new(flate2::write::GzEncoder::new(
                BufWriter::new(file),
                flate2::Compression::default(),
            ))
        } else {
            Box::new(BufWriter::new(file))
        }
    };

    Ok(writer)
}
