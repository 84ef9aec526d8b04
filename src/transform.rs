//! Line normalization for fetched blocklists.
//!
//! Upstream feeds are hosts-file shaped: an address field, a name field,
//! optional trailing junk, with blank lines and `#` comments in between.
//! Normalization keeps only well-formed entries and renders them in the
//! configured output format, one record per line.

use std::io::{self, Write};
use std::str::FromStr;

/// Rendering applied to each normalized line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Emit the name field alone (plain domain lists).
    #[default]
    NameOnly,
    /// Emit the address and name fields space-joined (hosts-file consumers).
    AddressAndName,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name-only" => Ok(Self::NameOnly),
            "address-and-name" => Ok(Self::AddressAndName),
            _ => Err(format!(
                "invalid output format {s:?}, valid values: name-only, address-and-name"
            )),
        }
    }
}

/// Normalize one raw input line.
///
/// Returns `None` for blank lines, comments and lines with fewer than two
/// whitespace-separated fields.
pub fn render_line(raw: &str, format: OutputFormat) -> Option<String> {
    let line = raw.trim();

    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let mut fields = line.split_whitespace();
    let address = fields.next()?;
    let name = fields.next()?;

    Some(match format {
        OutputFormat::NameOnly => name.to_string(),
        OutputFormat::AddressAndName => format!("{address} {name}"),
    })
}

/// Incremental transformer fed with raw response chunks.
///
/// Splits chunks on `\n` and writes each completed line's rendering to the
/// output, newline-terminated. Only the line currently in flight is buffered,
/// so payload size never affects memory use.
pub struct StreamTransformer {
    format: OutputFormat,
    pending: Vec<u8>,
}

impl StreamTransformer {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            pending: Vec::new(),
        }
    }

    /// Feed one chunk, writing every line it completes.
    pub fn push<W: Write>(&mut self, chunk: &[u8], out: &mut W) -> io::Result<()> {
        self.pending.extend_from_slice(chunk);

        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            self.emit(&String::from_utf8_lossy(&line[..pos]), out)?;
        }

        Ok(())
    }

    /// Flush a trailing line that arrived without a terminator.
    pub fn finish<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let line = std::mem::take(&mut self.pending);
        self.emit(&String::from_utf8_lossy(&line), out)
    }

    fn emit<W: Write>(&self, line: &str, out: &mut W) -> io::Result<()> {
        if let Some(rendered) = render_line(line, self.format) {
            out.write_all(rendered.as_bytes())?;
            out.write_all(b"\n")?;
        }
        Ok(())
    }
}
