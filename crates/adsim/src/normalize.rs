//! URL canonicalization and ordering keys.

use adsim_core::psl::DomainResolver;
use adsim_core::url::{extract_authority, extract_host};

/// Prefix `raw` with `http://` unless it already starts with `http://` or
/// `https://`. The prefix test is case-sensitive and nothing else is
/// rewritten.
pub fn canonicalize(raw: &str) -> String {
    if raw.starts_with("http://") || raw.starts_with("https://") {
        raw.to_string()
    } else {
        format!("http://{raw}")
    }
}

/// Network location (userinfo, host and port) of a URL, or `""`.
pub fn host_of(url: &str) -> &str {
    extract_authority(url).unwrap_or("")
}

/// Ordering key for a destination: its registrable domain, else its network
/// location, else the raw input.
pub fn sort_key<R: DomainResolver + ?Sized>(raw: &str, resolver: &R) -> String {
    let url = canonicalize(raw);
    let netloc = host_of(&url);
    if netloc.is_empty() {
        return raw.to_string();
    }

    let hostname = extract_host(&url).unwrap_or(netloc).to_ascii_lowercase();
    match resolver.registrable_domain(&hostname) {
        Some(domain) => domain,
        None => netloc.to_string(),
    }
}
