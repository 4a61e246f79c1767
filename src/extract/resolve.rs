// src/extract/resolve.rs
// =============================================================================
// This module decides which link (if any) a single start tag contributes.
//
// Rules:
// - Only a handful of tags can carry links we care about (LINK_TAGS)
// - href / src: any non-empty value is a candidate
// - content: only values that already look absolute ("http...") count,
//   which is how <meta http-equiv="refresh" content="..."> targets are picked up
// - If several attributes qualify, the LAST one in document order wins
//
// Rust concepts:
// - Iterator::fold: Walk a sequence while carrying an accumulator
// - Option<T>: "maybe a link" without sentinel values
// - Serialize: The same struct feeds the JSON output format
// =============================================================================

use serde::Serialize;

// Start tags whose attributes are inspected. Everything else is skipped
// without looking at a single attribute.
pub const LINK_TAGS: [&str; 6] = ["a", "img", "meta", "link", "script", "iframe"];

// A link candidate found on one tag occurrence
//
// `url` is the raw attribute value, exactly as it appeared in the markup.
// Normalization against the page prefix happens later in emit.rs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    /// Tag the link was found on (e.g. "a", "script")
    pub tag: String,
    /// Attribute that supplied the value (href, src or content)
    pub attribute: String,
    /// Raw attribute value
    pub url: String,
}

// Returns true if this tag name belongs to the link-bearing set
pub fn is_link_tag(name: &str) -> bool {
    LINK_TAGS.contains(&name)
}

// Resolves at most one link from a start tag
//
// Parameters:
//   tag: lowercase tag name
//   attrs: (key, value) pairs in the order they appear in the tag
//
// Returns: Some(Link) for the last qualifying attribute, None otherwise
//
// Example:
//   <img href="a.png" src="b.png">  -> Some(src = "b.png")
//   <meta content="width=device-width"> -> None
pub fn resolve_link<'a, I>(tag: &str, attrs: I) -> Option<Link>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    if !is_link_tag(tag) {
        return None;
    }

    // The fold deliberately keeps going after a match: a later qualifying
    // attribute replaces an earlier one.
    let (key, value) = attrs
        .into_iter()
        .fold(None, |best, (key, value)| match key {
            "href" | "src" if !value.is_empty() => Some((key, value)),
            "content" if value.starts_with("http") => Some((key, value)),
            _ => best,
        })?;

    Some(Link {
        tag: tag.to_string(),
        attribute: key.to_string(),
        url: value.to_string(),
    })
}
