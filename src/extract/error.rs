// src/extract/error.rs
// =============================================================================
// Everything that can stop an extraction run.
//
// None of these are retried. Lines already written to the sink stay there;
// the output is simply a prefix of the full link list.
// =============================================================================

use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    /// The body claimed to be gzip but could not be decompressed
    #[error("failed to decode gzip body: {0}")]
    Decode(#[source] io::Error),

    /// Reading the body failed for a reason other than end-of-stream
    #[error("failed to read page body: {0}")]
    Read(#[source] io::Error),

    /// Too much input arrived without the tokenizer finishing a single token
    #[error("token exceeds buffer limit of {limit} bytes")]
    TokenTooLarge { limit: usize },

    /// A link with no content reached the output stage
    #[error("refusing to write an empty link (found on <{tag}>)")]
    EmptyLink { tag: String },

    /// Writing a line to the output sink failed
    #[error("failed to write link to output: {0}")]
    SinkWrite(#[source] io::Error),
}
