//! Program reading
//!
//! Builds a [`Program`] from text or from a file. Files are streamed through
//! a large buffered reader so multi-million-line programs never need a second
//! copy of the raw text in memory.

use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::Instant;

use gcodetrim_core::{Error, Program, ProgramLine, Result};

use crate::header::{is_header_line, parse_header};
use crate::line::parse_line;

/// Read buffer size (256 KiB)
pub const READ_BUFFER_SIZE: usize = 256 * 1024;

/// Incremental program builder
///
/// Feed it lines in order, then call [`ProgramBuilder::finish`].
#[derive(Debug, Default)]
pub struct ProgramBuilder {
    lines: Vec<ProgramLine>,
    header_lines: Vec<String>,
    in_header: bool,
    bytes: u64,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self {
            in_header: true,
            ..Self::default()
        }
    }

    /// Parse and append the next line
    ///
    /// `raw_len` is the length of the line in the source including its line
    /// terminator.
    pub fn push_line(&mut self, text: &str, raw_len: usize) {
        self.bytes += raw_len as u64;
        let line_number = self.lines.len() + 1;

        if self.in_header {
            if is_header_line(text) {
                self.header_lines.push(text.to_string());
            } else {
                self.in_header = false;
            }
        }

        let line = match parse_line(text, line_number) {
            Ok(instruction) => ProgramLine::Parsed(instruction),
            Err(error) => {
                tracing::trace!("line {} rejected: {}", line_number, error);
                ProgramLine::Malformed {
                    line_number,
                    text: text.to_string(),
                    error,
                }
            }
        };
        self.lines.push(line);
    }

    pub fn finish(self) -> Program {
        let (header, warnings) = parse_header(self.header_lines.iter().map(String::as_str));
        Program {
            header,
            lines: self.lines,
            warnings,
            bytes: self.bytes,
        }
    }
}

/// Parse a complete program held in memory
pub fn parse_program(text: &str) -> Program {
    let mut builder = ProgramBuilder::new();
    for raw in text.split_inclusive('\n') {
        builder.push_line(strip_line_ending(raw), raw.len());
    }
    builder.finish()
}

fn strip_line_ending(raw: &str) -> &str {
    let line = raw.strip_suffix('\n').unwrap_or(raw);
    line.strip_suffix('\r').unwrap_or(line)
}

/// Buffered program file reader
#[derive(Debug, Clone)]
pub struct ProgramReader {
    path: PathBuf,
    file_size: u64,
}

impl ProgramReader {
    /// Open a program file
    ///
    /// # Errors
    /// Returns error if the path does not exist or is not a regular file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if !path.exists() {
            return Err(Error::other(format!(
                "Input file does not exist: {}",
                path.display()
            )));
        }
        if !path.is_file() {
            return Err(Error::other(format!(
                "Input path is not a file: {}",
                path.display()
            )));
        }

        let file_size = fs::metadata(&path)?.len();
        Ok(Self { path, file_size })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Read and parse the whole file
    ///
    /// Invalid UTF-8 is replaced rather than rejected; such lines usually
    /// fail to parse and are reported as malformed.
    pub fn read(&self) -> Result<Program> {
        let start = Instant::now();
        let file = File::open(&self.path)?;
        let mut reader = BufReader::with_capacity(READ_BUFFER_SIZE, file);
        let mut builder = ProgramBuilder::new();
        let mut buf = Vec::new();

        loop {
            buf.clear();
            let read = reader.read_until(b'\n', &mut buf)?;
            if read == 0 {
                break;
            }
            let text = String::from_utf8_lossy(&buf);
            builder.push_line(strip_line_ending(&text), read);
        }

        let program = builder.finish();
        tracing::debug!(
            "Read {} lines ({} bytes) from {} in {:?}",
            program.len(),
            program.bytes,
            self.path.display(),
            start.elapsed()
        );
        Ok(program)
    }
}
