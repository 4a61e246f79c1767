// src/extract/decode.rs
// =============================================================================
// Picks the reader the tokenizer pulls from.
//
// Servers that honour our "Accept-Encoding: gzip" header send a compressed
// body. We only look at Content-Encoding: "gzip" gets a streaming decoder,
// everything else is read as-is. Nothing is buffered up front, so large pages
// start tokenizing as soon as the first bytes arrive.
// =============================================================================

use std::io::{self, Read};

use flate2::read::GzDecoder;

use super::error::ExtractError;

// The page body, possibly behind a gzip decoder
pub enum Body<R: Read> {
    Identity(R),
    Gzip(GzDecoder<R>),
}

impl<R: Read> Body<R> {
    // Chooses the decoder from the Content-Encoding header value
    pub fn select(content_encoding: Option<&str>, body: R) -> Self {
        match content_encoding {
            Some("gzip") => Body::Gzip(GzDecoder::new(body)),
            _ => Body::Identity(body),
        }
    }

    pub fn is_gzip(&self) -> bool {
        matches!(self, Body::Gzip(_))
    }

    // Classifies a failed read
    //
    // A corrupt gzip stream shows up as InvalidInput/InvalidData (bad header or
    // deflate data) or UnexpectedEof (missing trailer) from flate2. Anything
    // else is a transport problem and stops the tokenizer loop.
    pub fn read_error(&self, err: io::Error) -> ExtractError {
        let corrupt = matches!(
            err.kind(),
            io::ErrorKind::InvalidInput | io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof
        );
        if self.is_gzip() && corrupt {
            ExtractError::Decode(err)
        } else {
            ExtractError::Read(err)
        }
    }
}

impl<R: Read> Read for Body<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Body::Identity(inner) => inner.read(buf),
            Body::Gzip(inner) => inner.read(buf),
        }
    }
}
