//! Content-node naming convention.
//!
//! Content directories follow the same pattern as the CMS this service sits
//! next to: an optional numeric prefix (`NNN-`) that orders the node, followed
//! by the slug that addresses it. The prefix never appears in URIs:
//!
//! - `010-blog/` → `blog`
//! - `010-blog/003-post-1/` → `blog/post-1`
//! - `drafts/` → `drafts` (unnumbered nodes are addressed verbatim)
//!
//! Filenames are never rewritten; only directory names carry the convention.

/// Result of parsing a numbered entry name like `010-blog`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedName {
    /// Number prefix if present (e.g., `10` from `010-blog`)
    pub number: Option<u32>,
    /// Slug after `NNN-`, dashes preserved. Empty if number-only.
    /// For unnumbered entries, this is the full input.
    pub slug: String,
}

/// Parse an entry name following the `NNN-slug` convention.
///
/// Handles these patterns:
/// - `"010-blog"` → number=Some(10), slug="blog"
/// - `"003-post-1"` → number=Some(3), slug="post-1"
/// - `"001"` → number=Some(1), slug=""
/// - `"drafts"` → number=None, slug="drafts"
/// - `"wip-drafts"` → number=None, slug="wip-drafts"
pub fn parse_entry_name(name: &str) -> ParsedName {
    if let Some(dash_pos) = name.find('-') {
        let prefix = &name[..dash_pos];
        if let Ok(num) = prefix.parse::<u32>() {
            return ParsedName {
                number: Some(num),
                slug: name[dash_pos + 1..].to_string(),
            };
        }
    }
    if let Ok(num) = name.parse::<u32>() {
        return ParsedName {
            number: Some(num),
            slug: String::new(),
        };
    }
    ParsedName {
        number: None,
        slug: name.to_string(),
    }
}

/// The URI segment a directory is addressed by.
///
/// Number-only names have no slug and keep their full name so they stay
/// addressable.
pub fn uri_segment(dir_name: &str) -> String {
    let parsed = parse_entry_name(dir_name);
    if parsed.slug.is_empty() {
        dir_name.to_string()
    } else {
        parsed.slug
    }
}

/// Whether a directory named `dir_name` is addressed by `segment`.
pub fn matches_segment(dir_name: &str, segment: &str) -> bool {
    dir_name == segment || uri_segment(dir_name) == segment
}
