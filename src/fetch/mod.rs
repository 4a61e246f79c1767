// src/fetch/mod.rs
// =============================================================================
// This module talks to the web server.
//
// Submodules:
// - http: client construction and the single GET request
// - testing: a local one-shot HTTP server used by tests
// =============================================================================

mod http;

#[cfg(test)]
pub(crate) mod testing;

pub use http::{build_client, fetch_page, FetchError, Page, DEFAULT_TIMEOUT};
