// src/extract/tokens.rs
// =============================================================================
// The tokenizer loop: pull bytes, feed html5ever, react to start tags.
//
// How it works:
// 1. Read the body in small fixed-size chunks (READ_CHUNK bytes per pull)
// 2. Decode each chunk as UTF-8, carrying split characters to the next pull
// 3. Feed the text to html5ever's tokenizer (no tree builder, no DOM)
// 4. Our TokenSink sees every token; start tags go through resolve_link()
//    and, if they produce a link, straight out through the LinkWriter
// 5. End of stream finishes the tokenizer; a half-written trailing tag is
//    simply dropped
//
// Why a tokenizer and not scraper/Html::parse_document?
// - A DOM needs the whole page in memory before we can look at anything
// - The tokenizer lets us write links out while the page is still downloading
//
// Rust concepts:
// - Traits: We implement html5ever's TokenSink for our own struct
// - Generics: Works for any Read (network body, file, &[u8] in tests)
//   and any Write (stdout, file, Vec<u8> in tests)
// =============================================================================

use std::io::{self, Read, Write};

use html5ever::tendril::StrTendril;
use html5ever::tokenizer::states::RawKind;
use html5ever::tokenizer::{
    BufferQueue, Tag, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};
use tracing::{debug, info};

use super::decode::Body;
use super::emit::{LinkWriter, OutputFormat};
use super::error::ExtractError;
use super::resolve::resolve_link;

// Bytes requested from the body per pull
pub const READ_CHUNK: usize = 2048;

// Default cap on input fed without the tokenizer producing a token
pub const DEFAULT_MAX_TOKEN_BYTES: usize = 64 * 1024;

// Settings for one extraction run
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Original page URL, prepended to relative links
    pub prefix: String,
    pub format: OutputFormat,
    /// 0 disables the guard
    pub max_token_bytes: usize,
}

impl ExtractOptions {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            format: OutputFormat::default(),
            max_token_bytes: DEFAULT_MAX_TOKEN_BYTES,
        }
    }
}

// What happened during a run (for logging, never written to the sink)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractSummary {
    pub start_tags: usize,
    pub links: usize,
}

// Receives tokens from html5ever
//
// html5ever's sink can't return an error, so a failed write is parked in
// `error` and picked up by the read loop after the current chunk.
struct LinkSink<W: Write> {
    writer: LinkWriter<W>,
    start_tags: usize,
    tokens: u64,
    error: Option<ExtractError>,
}

impl<W: Write> LinkSink<W> {
    fn new(writer: LinkWriter<W>) -> Self {
        Self {
            writer,
            start_tags: 0,
            tokens: 0,
            error: None,
        }
    }

    fn start_tag(&mut self, tag: &Tag) {
        self.start_tags += 1;

        let attrs = tag
            .attrs
            .iter()
            .map(|attr| (&*attr.name.local, &*attr.value));

        if let Some(link) = resolve_link(&tag.name, attrs) {
            if let Err(e) = self.writer.write_link(&link) {
                self.error = Some(e);
            }
        }
    }
}

impl<W: Write> TokenSink for LinkSink<W> {
    type Handle = ();

    fn process_token(&mut self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
        self.tokens += 1;

        // After a failure, let the tokenizer drain the current chunk quietly
        if self.error.is_some() {
            return TokenSinkResult::Continue;
        }

        match token {
            Token::TagToken(tag) if tag.kind == TagKind::StartTag => {
                self.start_tag(&tag);
                content_mode(&tag.name)
            }
            // Text, comments, end tags, doctypes, parse errors: not our business
            _ => TokenSinkResult::Continue,
        }
    }
}

// Elements whose content is not markup
//
// Without a tree builder the tokenizer doesn't know that "<a href=...>" inside
// a <script> is just a string, so we switch its state the way a browser does.
fn content_mode(tag_name: &str) -> TokenSinkResult<()> {
    match tag_name {
        "script" => TokenSinkResult::RawData(RawKind::ScriptData),
        "style" | "xmp" | "iframe" | "noembed" | "noframes" | "noscript" => {
            TokenSinkResult::RawData(RawKind::Rawtext)
        }
        "title" | "textarea" => TokenSinkResult::RawData(RawKind::Rcdata),
        "plaintext" => TokenSinkResult::Plaintext,
        _ => TokenSinkResult::Continue,
    }
}

// Moves as much of `carry` as possible into the tokenizer queue
//
// Invalid sequences become U+FFFD. An incomplete sequence at the end is kept
// for the next chunk, unless this is the end of the stream.
fn push_utf8(carry: &mut Vec<u8>, queue: &mut BufferQueue, eof: bool) {
    while !carry.is_empty() {
        let (valid, invalid) = match std::str::from_utf8(&carry[..]) {
            Ok(_) => (carry.len(), None),
            Err(e) => (e.valid_up_to(), Some(e.error_len())),
        };

        if valid > 0 {
            let text = String::from_utf8_lossy(&carry[..valid]);
            queue.push_back(StrTendril::from_slice(&text));
        }

        match invalid {
            None => carry.clear(),
            Some(Some(len)) => {
                queue.push_back(StrTendril::from_slice("\u{FFFD}"));
                carry.drain(..valid + len);
            }
            Some(None) if eof => {
                queue.push_back(StrTendril::from_slice("\u{FFFD}"));
                carry.clear();
            }
            Some(None) => {
                carry.drain(..valid);
                return;
            }
        }
    }
}

// Streams a page body through the tokenizer and writes every link to `out`
//
// Parameters:
//   body: the (possibly gzip-wrapped) page body; dropped when we return
//   out: the sink; written and flushed, never closed
//   opts: prefix, output format, token guard
//
// Returns: counts for logging, or the first error that stopped the run.
// Lines written before an error stay written.
pub fn extract_links<R: Read, W: Write>(
    mut body: Body<R>,
    out: W,
    opts: &ExtractOptions,
) -> Result<ExtractSummary, ExtractError> {
    let sink = LinkSink::new(LinkWriter::new(out, &opts.prefix, opts.format));
    let mut tokenizer = Tokenizer::new(sink, TokenizerOpts::default());
    let mut queue = BufferQueue::default();

    let mut chunk = [0u8; READ_CHUNK];
    let mut carry = Vec::new();
    let mut fed_without_token = 0usize;

    loop {
        let n = match body.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(body.read_error(e)),
        };

        carry.extend_from_slice(&chunk[..n]);
        push_utf8(&mut carry, &mut queue, false);

        let tokens_before = tokenizer.sink.tokens;
        // Always Done: the sink never returns TokenSinkResult::Script
        let _ = tokenizer.feed(&mut queue);

        if let Some(err) = tokenizer.sink.error.take() {
            return Err(err);
        }

        if tokenizer.sink.tokens == tokens_before {
            fed_without_token += n;
            if opts.max_token_bytes > 0 && fed_without_token > opts.max_token_bytes {
                return Err(ExtractError::TokenTooLarge {
                    limit: opts.max_token_bytes,
                });
            }
        } else {
            fed_without_token = 0;
        }
    }

    debug!("end of stream, finishing tokenizer");
    push_utf8(&mut carry, &mut queue, true);
    // Always Done, as above
    let _ = tokenizer.feed(&mut queue);
    tokenizer.end();

    let sink = &mut tokenizer.sink;
    if let Some(err) = sink.error.take() {
        return Err(err);
    }
    sink.writer.flush()?;

    let summary = ExtractSummary {
        start_tags: sink.start_tags,
        links: sink.writer.written(),
    };
    info!(
        start_tags = summary.start_tags,
        links = summary.links,
        "extraction finished"
    );
    Ok(summary)
}
