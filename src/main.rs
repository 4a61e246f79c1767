// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments into a Config
// 2. Fetch the page (async, reqwest)
// 3. Stream the body through the link extractor (blocking, on a worker thread)
// 4. Exit with proper code (0 = success, 1 = page not 200, 2 = error)
//
// Logs go to stderr so they never end up mixed into the link list on stdout.
// =============================================================================

mod cli;
mod extract;
mod fetch;

use std::fs::OpenOptions;
use std::io::{self, BufWriter, Write};

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::io::SyncIoBridge;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Config};
use extract::{extract_links, Body, ExtractOptions, ExtractSummary};
use fetch::{FetchError, Page};

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            // {:#} prints the whole context chain on one line
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = cli.into_config()?;
    handle_extract(&config).await
}

// Installs the tracing subscriber (stderr, RUST_LOG aware)
fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

// Fetches the configured page and writes its links to the chosen sink
//
// Returns:
//   Ok(0) = links extracted
//   Ok(1) = server answered with something other than 200
//   Err   = anything else
async fn handle_extract(config: &Config) -> Result<i32> {
    let client = fetch::build_client(config.timeout)?;

    let page = match fetch::fetch_page(&client, &config.url).await {
        Ok(page) => page,
        Err(e @ FetchError::Status { .. }) => {
            eprintln!("Error: {}", e);
            return Ok(1);
        }
        Err(e) => return Err(e.into()),
    };

    let opts = ExtractOptions {
        format: config.format,
        max_token_bytes: config.max_token_bytes,
        ..ExtractOptions::new(&config.url)
    };

    // The sink is opened here and dropped (closed) here, on every path
    let summary = match &config.output {
        Some(path) => {
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(path)
                .with_context(|| format!("failed to open output file {}", path.display()))?;
            info!(path = %path.display(), "writing links to file");
            let (summary, _file) = extract_page(page, opts, BufWriter::new(file)).await?;
            summary
        }
        None => extract_page(page, opts, io::stdout()).await?.0,
    };

    debug!(
        start_tags = summary.start_tags,
        links = summary.links,
        "done"
    );
    Ok(0)
}

// Runs the blocking extractor over the page body on tokio's blocking pool
//
// The async body is bridged to std::io::Read with SyncIoBridge, so the
// extractor pulls from the network one chunk at a time.
async fn extract_page<W>(page: Page, opts: ExtractOptions, out: W) -> Result<(ExtractSummary, W)>
where
    W: Write + Send + 'static,
{
    debug!(
        status = page.status.as_u16(),
        encoding = page.content_encoding.as_deref().unwrap_or("identity"),
        "extracting links"
    );

    let encoding = page.content_encoding.clone();
    let reader = SyncIoBridge::new(page.into_reader());

    let (summary, out) = tokio::task::spawn_blocking(move || {
        let mut out = out;
        let body = Body::select(encoding.as_deref(), reader);
        let summary = extract_links(body, &mut out, &opts)?;
        Ok::<_, extract::ExtractError>((summary, out))
    })
    .await
    .context("extraction task failed")??;

    Ok((summary, out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::testing::{respond, serve_once};
    use flate2::write::GzEncoder;
    use flate2::Compression;

    const PAGE: &[u8] = br#"<html><head>
        <link rel="icon" href="/favicon.ico">
        <script src="https://cdn.test/a.js"></script>
        </head><body><a href="/page2">two</a><p>text</p></body></html>"#;

    async fn fetch_and_extract(response: Vec<u8>) -> (String, String) {
        let (url, _request) = serve_once(response).await;
        let client = fetch::build_client(fetch::DEFAULT_TIMEOUT).unwrap();
        let page = fetch::fetch_page(&client, &url).await.unwrap();

        let prefix = url.trim_end_matches('/').to_string();
        let (summary, out) = extract_page(page, ExtractOptions::new(&prefix), Vec::new())
            .await
            .unwrap();
        assert_eq!(summary.links, 3);
        (prefix, String::from_utf8(out).unwrap())
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_identity_page_end_to_end() {
        let (prefix, out) = fetch_and_extract(respond("200 OK", &[], PAGE)).await;
        let expected = format!(
            "{p}/favicon.ico\nhttps://cdn.test/a.js\n{p}/page2\n",
            p = prefix
        );
        assert_eq!(out, expected);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_gzip_page_matches_identity() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(PAGE).unwrap();
        let compressed = encoder.finish().unwrap();

        let (gz_prefix, gz) =
            fetch_and_extract(respond("200 OK", &[("Content-Encoding", "gzip")], &compressed)).await;
        let (plain_prefix, plain) = fetch_and_extract(respond("200 OK", &[], PAGE)).await;

        // Each server listens on its own port, so compare with the prefix masked
        assert_eq!(
            gz.replace(&gz_prefix, "PREFIX"),
            plain.replace(&plain_prefix, "PREFIX")
        );
    }
}
