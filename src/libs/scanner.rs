//! Name-sorted record streams with one record of lookahead.
//!
//! A [`StreamScanner`] sits on top of a [`LineSource`]. Two sources are provided:
//!
//! * [`DecoderSource`] runs `samtools view <file>` and reads its standard output;
//! * [`ReaderSource`] reads SAM text from any `BufRead`, skipping `@` header lines.
use crate::libs::error::{HitError, Result};
use crate::libs::natord;
use crate::libs::sam::AlignmentRecord;
use std::cmp::Ordering;
use std::io::{BufRead, BufReader};
use std::process::{Child, ChildStdout, Command, Stdio};

/// Something that hands out text lines one at a time.
pub trait LineSource {
    /// Next line without its line terminator, or `None` at the end.
    fn next_line(&mut self) -> Result<Option<String>>;

    /// Called once after the last line, to observe how the producer ended.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<S: LineSource + ?Sized> LineSource for Box<S> {
    fn next_line(&mut self) -> Result<Option<String>> {
        (**self).next_line()
    }

    fn finish(&mut self) -> Result<()> {
        (**self).finish()
    }
}

fn read_trimmed<R: BufRead>(reader: &mut R, name: &str) -> Result<Option<String>> {
    let mut line = String::new();
    let n = reader
        .read_line(&mut line)
        .map_err(|e| HitError::io(format!("reading {}", name), e))?;
    if n == 0 {
        return Ok(None);
    }
    let len = line.trim_end_matches(&['\n', '\r'][..]).len();
    line.truncate(len);
    Ok(Some(line))
}

/// SAM text from a reader. Header lines are skipped.
pub struct ReaderSource<R> {
    name: String,
    reader: R,
}

impl<R: BufRead> ReaderSource<R> {
    pub fn new(name: &str, reader: R) -> Self {
        Self {
            name: name.to_string(),
            reader,
        }
    }
}

impl<R: BufRead> LineSource for ReaderSource<R> {
    fn next_line(&mut self) -> Result<Option<String>> {
        loop {
            match read_trimmed(&mut self.reader, &self.name)? {
                Some(line) if line.starts_with('@') => continue,
                other => return Ok(other),
            }
        }
    }
}

/// Records decoded by an external `samtools view` process.
///
/// The process is started on the first request for a line, and waited for once
/// its output is exhausted. A non-zero exit is reported as an error. Dropping a
/// source whose process is still running kills it.
pub struct DecoderSource {
    program: String,
    infile: String,
    child: Option<Child>,
    stdout: Option<BufReader<ChildStdout>>,
}

impl DecoderSource {
    pub fn new(program: &str, infile: &str) -> Self {
        Self {
            program: program.to_string(),
            infile: infile.to_string(),
            child: None,
            stdout: None,
        }
    }

    fn start(&mut self) -> Result<()> {
        let mut child = Command::new(&self.program)
            .arg("view")
            .arg(&self.infile)
            .stdout(Stdio::piped())
            .spawn()
            .map_err(|e| {
                HitError::io(
                    format!("command failed to start: {} view {}", self.program, self.infile),
                    e,
                )
            })?;
        let stdout = child.stdout.take().ok_or_else(|| HitError::Io {
            context: format!("failed creating pipe for {}", self.infile),
            error: std::io::Error::other("stdout not captured"),
        })?;
        self.stdout = Some(BufReader::new(stdout));
        self.child = Some(child);
        Ok(())
    }
}

impl LineSource for DecoderSource {
    fn next_line(&mut self) -> Result<Option<String>> {
        if self.child.is_none() {
            self.start()?;
        }
        match self.stdout.as_mut() {
            Some(reader) => read_trimmed(reader, &self.infile),
            None => Ok(None),
        }
    }

    fn finish(&mut self) -> Result<()> {
        self.stdout = None;
        if let Some(mut child) = self.child.take() {
            let status = child
                .wait()
                .map_err(|e| HitError::io(format!("wait failed for {}", self.infile), e))?;
            if !status.success() {
                return Err(HitError::Io {
                    context: format!("{} view {}", self.program, self.infile),
                    error: std::io::Error::other(format!("decoder exited with {}", status)),
                });
            }
        }
        Ok(())
    }
}

impl Drop for DecoderSource {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

/// A peekable cursor over one name-sorted stream.
pub struct StreamScanner {
    label: String,
    source: Box<dyn LineSource>,
    line_number: usize,
    prev: Option<String>,
    record: Option<AlignmentRecord>,
    closed: bool,
}

impl StreamScanner {
    pub fn new(label: &str, source: Box<dyn LineSource>) -> Self {
        Self {
            label: label.to_string(),
            source,
            line_number: 0,
            prev: None,
            record: None,
            closed: false,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Lines pulled so far
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// True once the source is exhausted and nothing is buffered. Never reverts.
    pub fn is_closed(&self) -> bool {
        self.closed && self.record.is_none()
    }

    /// The buffered record, pulling and parsing the next line if needed.
    pub fn peek(&mut self) -> Result<Option<&AlignmentRecord>> {
        if self.record.is_none() && !self.closed {
            self.fill()?;
        }
        Ok(self.record.as_ref())
    }

    /// Hand out the buffered record; the next `peek` pulls a new line.
    pub fn advance(&mut self) -> Option<AlignmentRecord> {
        self.record.take()
    }

    /// `peek` followed by `advance`
    pub fn next_record(&mut self) -> Result<Option<AlignmentRecord>> {
        self.peek()?;
        Ok(self.advance())
    }

    /// Skip records ordered before `read` and take the first one named `read`.
    ///
    /// A record ordered after `read` stays buffered for later calls.
    pub fn find(&mut self, read: &str) -> Result<Option<AlignmentRecord>> {
        loop {
            let ord = match self.peek()? {
                None => return Ok(None),
                Some(record) => natord::compare(&record.qname, read),
            };
            match ord {
                // only identical names compare equal
                Ordering::Equal => return Ok(self.advance()),
                Ordering::Less => {
                    self.advance();
                }
                _ => return Ok(None),
            }
        }
    }

    fn fill(&mut self) -> Result<()> {
        let line = match self.source.next_line()? {
            Some(line) => line,
            None => {
                self.closed = true;
                return self.source.finish();
            }
        };
        self.line_number += 1;

        let line = line.trim();
        if line.is_empty() {
            return Err(HitError::structural("empty record").locate(&self.label, self.line_number));
        }
        let record: AlignmentRecord = line
            .parse()
            .map_err(|e: HitError| e.locate(&self.label, self.line_number))?;

        if let Some(prev) = &self.prev {
            if natord::compare(prev, &record.qname) == Ordering::Greater {
                return Err(HitError::structural(format!(
                    "sorting order violated: {} after {}",
                    record.qname, prev
                ))
                .locate(&self.label, self.line_number));
            }
        }
        self.prev = Some(record.qname.clone());
        self.record = Some(record);

        Ok(())
    }
}
