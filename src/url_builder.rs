//! Transform URL composition.
//!
//! A transform URL has four parts:
//!
//! ```text
//! https://example.com / imgapi/ blog/post-1/cover.jpg ? width=200&crop=1
//! └──── origin ─────┘   prefix  └──── resource uri ──┘   └── attributes ─┘
//! ```
//!
//! The origin comes from [`OriginPolicy`]: the site's own base URL, the
//! inbound request's scheme and host, or nothing at all (host-relative URL).
//! Composition is pure string work; nothing here touches the network or disk.

use crate::attrs::Attributes;
use std::fmt;
use url::{Url, form_urlencoded};

/// Scheme and host of the request currently being served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOrigin {
    /// Value of the `Host` header, port included if the client sent one.
    pub host: String,
    /// Whether the request reached us over TLS (directly or via a proxy).
    pub tls: bool,
}

impl RequestOrigin {
    pub fn new(host: impl Into<String>, tls: bool) -> Self {
        Self {
            host: host.into(),
            tls,
        }
    }

    /// Port given in the host, if any.
    pub fn port(&self) -> Option<u16> {
        let (_, port) = self.host.rsplit_once(':')?;
        port.parse().ok()
    }

    /// `https` when the request used TLS or arrived on port 443.
    pub fn scheme(&self) -> &'static str {
        if self.tls || self.port() == Some(443) {
            "https"
        } else {
            "http"
        }
    }
}

/// Where the origin part of a URL comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OriginPolicy {
    /// The site's configured base URL (anything other than `/`).
    Site(String),
    /// Scheme and host taken from the inbound request.
    Request(RequestOrigin),
    /// No origin: URLs start with `/`.
    Relative,
}

impl OriginPolicy {
    /// Pick the policy for a site whose base URL is `site_url`.
    ///
    /// Only a bare-root site (`/`) can be made absolute from the request;
    /// any other base URL is already absolute and is used as is. Without a
    /// request to read from, an `absolute` site falls back to relative URLs.
    pub fn resolve(site_url: &str, absolute: bool, request: Option<&RequestOrigin>) -> Self {
        if site_url != "/" {
            return OriginPolicy::Site(site_url.trim_end_matches('/').to_string());
        }
        match request {
            Some(request) if absolute => OriginPolicy::Request(request.clone()),
            _ => OriginPolicy::Relative,
        }
    }
}

impl fmt::Display for OriginPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OriginPolicy::Site(base) => f.write_str(base),
            OriginPolicy::Request(request) => write!(f, "{}://{}", request.scheme(), request.host),
            OriginPolicy::Relative => Ok(()),
        }
    }
}

/// Form-encode attributes as `k=v` pairs joined by `&`, in iteration order.
pub fn encode_query(attrs: &Attributes) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in attrs.iter() {
        serializer.append_pair(key, &value.to_string());
    }
    serializer.finish()
}

/// Percent-encode each `/`-separated segment of `resource_uri`.
///
/// `my photo.png` becomes `my%20photo.png`; `/` between segments is kept.
pub fn encode_path(resource_uri: &str) -> String {
    let resource_uri = resource_uri.trim_start_matches('/');
    // Only used for its path encoder; the host never appears in output.
    let Ok(mut scratch) = Url::parse("http://localhost/") else {
        return resource_uri.to_string();
    };
    if let Ok(mut segments) = scratch.path_segments_mut() {
        segments.clear().extend(resource_uri.split('/'));
    }
    scratch.path().trim_start_matches('/').to_string()
}

/// Build `origin + "/" + prefix + resource_uri`, plus `?query` when
/// `attrs` is non-empty. Path segments of `resource_uri` are
/// percent-encoded.
pub fn build_url(
    origin: &OriginPolicy,
    prefix: &str,
    resource_uri: &str,
    attrs: &Attributes,
) -> String {
    let mut url = format!("{origin}/{prefix}{}", encode_path(resource_uri));
    if !attrs.is_empty() {
        url.push('?');
        url.push_str(&encode_query(attrs));
    }
    url
}
