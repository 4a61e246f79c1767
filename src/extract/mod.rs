// src/extract/mod.rs
// =============================================================================
// The link extractor: everything between "here is a response body" and
// "here are the links, one per line".
//
// Submodules:
// - decode: gzip or pass-through, chosen from Content-Encoding
// - tokens: the streaming tokenizer loop
// - resolve: which attribute of which tag becomes a link
// - emit: prefixing relative links and writing lines
// - error: the ways an extraction can stop
// =============================================================================

mod decode;
mod emit;
mod error;
mod resolve;
mod tokens;

pub use decode::Body;
pub use emit::OutputFormat;
pub use error::ExtractError;
pub use tokens::{extract_links, ExtractOptions, ExtractSummary, DEFAULT_MAX_TOKEN_BYTES};
