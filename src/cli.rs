// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// The parsed arguments are turned into a plain `Config` value right away,
// and that value is what the rest of the program receives. Nothing reads the
// command line (or any other global state) after that point.
//
// Rust concepts:
// - Derive macros: #[derive(Parser)] generates the argument parser
// - Option<T>: Optional arguments (output file, URL given as a flag)
// - Conversions: `Cli::into_config` consumes the parsed arguments
// =============================================================================

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::Parser;

use crate::extract::{OutputFormat, DEFAULT_MAX_TOKEN_BYTES};
use crate::fetch::DEFAULT_TIMEOUT;

#[derive(Parser, Debug)]
#[command(
    name = "link-tracker",
    version,
    about = "Track all links of a web page into one file",
    long_about = "link-tracker downloads a single page, streams its markup through an HTML \
                  tokenizer and writes every link it finds (anchors, images, scripts, \
                  stylesheets, iframes and meta refresh targets) one per line."
)]
pub struct Cli {
    /// URL of the page to scan
    ///
    /// Example: link-tracker https://example.com
    #[arg(value_name = "URL", required_unless_present = "url_flag")]
    pub url: Option<String>,

    /// URL of the page to scan (flag form)
    #[arg(
        short = 'u',
        long = "url",
        value_name = "URL",
        conflicts_with = "url"
    )]
    pub url_flag: Option<String>,

    /// File to write the links to (created or truncated); stdout if omitted
    #[arg(short = 'f', long = "file", value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Request timeout in seconds (at least 1)
    #[arg(
        long,
        default_value_t = DEFAULT_TIMEOUT.as_secs(),
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout: u64,

    /// Write one JSON object per link instead of a bare URL
    #[arg(long)]
    pub json: bool,

    /// Abort if this many bytes arrive without completing a token (0 = no limit)
    #[arg(long, default_value_t = DEFAULT_MAX_TOKEN_BYTES)]
    pub max_token_bytes: usize,

    /// Log debug output to stderr (RUST_LOG overrides this)
    #[arg(short, long)]
    pub verbose: bool,
}

// Everything one run needs, decided up front
#[derive(Debug, Clone)]
pub struct Config {
    /// Target URL, exactly as given; also the prefix for relative links
    pub url: String,
    pub output: Option<PathBuf>,
    pub timeout: Duration,
    pub format: OutputFormat,
    pub max_token_bytes: usize,
}

impl Cli {
    pub fn into_config(self) -> Result<Config> {
        let url = self
            .url_flag
            .or(self.url)
            .ok_or_else(|| anyhow!("a target URL is required"))?;

        let format = if self.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        };

        Ok(Config {
            url,
            output: self.file,
            timeout: Duration::from_secs(self.timeout),
            format,
            max_token_bytes: self.max_token_bytes,
        })
    }
}
