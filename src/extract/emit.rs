// src/extract/emit.rs
// =============================================================================
// This module turns resolved links into output lines.
//
// Normalization is intentionally blunt:
// - Anything starting with "http" is already absolute, write it as-is
// - Anything else gets the original page URL glued in front of it
//   (no path joining, no ".." handling, no percent-decoding)
//
// Each link becomes exactly one "\n"-terminated line, written immediately.
// If the sink fails we stop right there; nothing is retried.
//
// Rust concepts:
// - Generics: LinkWriter works with any std::io::Write (File, Stdout, Vec<u8>)
// - Ownership: The writer borrows or owns the sink, but never closes it
// =============================================================================

use std::io::Write;

use tracing::debug;

use super::error::ExtractError;
use super::resolve::Link;

// How each link line is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Bare URL per line
    #[default]
    Text,
    /// One JSON object per line: {"tag", "attribute", "url"}
    Json,
}

// Qualifies a raw link against the page prefix
//
// Examples:
//   normalize("http://example.com", "/page2")             -> "http://example.com/page2"
//   normalize("http://example.com", "https://cdn.test/a") -> "https://cdn.test/a"
//
// The "http" check also covers "https" (it is a prefix of it).
pub fn normalize(prefix: &str, raw: &str) -> String {
    if raw.starts_with("http") {
        raw.to_string()
    } else {
        format!("{}{}", prefix, raw)
    }
}

// Writes links to a sink, one per line
pub struct LinkWriter<W: Write> {
    out: W,
    prefix: String,
    format: OutputFormat,
    written: usize,
}

impl<W: Write> LinkWriter<W> {
    pub fn new(out: W, prefix: &str, format: OutputFormat) -> Self {
        Self {
            out,
            prefix: prefix.to_string(),
            format,
            written: 0,
        }
    }

    // Normalizes and writes a single link
    //
    // Errors:
    //   EmptyLink if the raw value is empty (resolution should never let that through)
    //   SinkWrite if the underlying writer fails
    pub fn write_link(&mut self, link: &Link) -> Result<(), ExtractError> {
        if link.url.is_empty() {
            return Err(ExtractError::EmptyLink {
                tag: link.tag.clone(),
            });
        }

        let url = normalize(&self.prefix, &link.url);
        debug!(tag = %link.tag, attribute = %link.attribute, %url, "link");

        let mut line = match self.format {
            OutputFormat::Text => url,
            OutputFormat::Json => {
                let record = Link {
                    url,
                    ..link.clone()
                };
                serde_json::to_string(&record)
                    .map_err(|e| ExtractError::SinkWrite(e.into()))?
            }
        };
        line.push('\n');

        self.out
            .write_all(line.as_bytes())
            .map_err(ExtractError::SinkWrite)?;
        self.written += 1;
        Ok(())
    }

    // Number of lines written so far
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn flush(&mut self) -> Result<(), ExtractError> {
        self.out.flush().map_err(ExtractError::SinkWrite)
    }
}
