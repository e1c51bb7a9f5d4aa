//! Program serialization

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use gcodetrim_core::{Instruction, InstructionSink, Result};

/// Write buffer size (256 KiB)
pub const WRITE_BUFFER_SIZE: usize = 256 * 1024;

/// Buffered G-code writer
///
/// Parsed instructions are written back with their original text; synthesized
/// ones use the canonical form. Every line ends with `\n`.
pub struct GcodeWriter<W: Write> {
    inner: BufWriter<W>,
    lines_written: u64,
    bytes_written: u64,
}

impl GcodeWriter<File> {
    /// Create (or truncate) a file and write to it
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::create(path.as_ref())?;
        Ok(Self::new(file))
    }
}

impl<W: Write> GcodeWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner: BufWriter::with_capacity(WRITE_BUFFER_SIZE, inner),
            lines_written: 0,
            bytes_written: 0,
        }
    }

    pub fn lines_written(&self) -> u64 {
        self.lines_written
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Write one raw line
    pub fn write_line(&mut self, text: &str) -> Result<()> {
        self.inner.write_all(text.as_bytes())?;
        self.inner.write_all(b"\n")?;
        self.lines_written += 1;
        self.bytes_written += text.len() as u64 + 1;
        Ok(())
    }

    /// Flush and return the underlying writer
    pub fn into_inner(self) -> Result<W> {
        self.inner
            .into_inner()
            .map_err(|err| err.into_error().into())
    }
}

impl<W: Write> InstructionSink for GcodeWriter<W> {
    fn emit(&mut self, instruction: &Instruction) -> Result<()> {
        match &instruction.source {
            Some(source) => self.write_line(source),
            None => self.write_line(&instruction.to_string()),
        }
    }

    fn finish(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }

    fn bytes_written(&self) -> Option<u64> {
        Some(self.bytes_written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gcodetrim_core::{Operation, Param, ParamSet};

    #[test]
    fn test_parsed_lines_are_written_verbatim() {
        let mut writer = GcodeWriter::new(Vec::new());
        let parsed = crate::parse_line("g1  x1.50000 z-2 ; keep spacing  ", 1).unwrap();
        writer.emit(&parsed).unwrap();
        writer.finish().unwrap();

        assert_eq!(writer.lines_written(), 1);
        let out = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        assert_eq!(out, "g1  x1.50000 z-2 ; keep spacing  \n");
    }

    #[test]
    fn test_synthesized_lines_use_canonical_form() {
        let mut writer = GcodeWriter::new(Vec::new());
        let params = ParamSet::new()
            .with(Param::X, 8.0)
            .with(Param::Z, -9.0)
            .with(Param::F, 800.0);
        writer
            .emit(&Instruction::new(Some(Operation::g(1)), params))
            .unwrap();
        writer.emit(&Instruction::blank()).unwrap();

        assert_eq!(writer.bytes_written(), 16);
        let out = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        assert_eq!(out, "G1 X8 Z-9 F800\n\n");
    }

    #[test]
    fn test_create_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.nc");

        let mut writer = GcodeWriter::create(&path).unwrap();
        writer.write_line("G0 Z5").unwrap();
        writer.finish().unwrap();
        drop(writer);

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "G0 Z5\n");
    }
}
