//! Public Suffix List (PSL) utilities for eTLD+1 extraction
//!
//! Only the ICANN section of a list is honoured; private suffixes such as
//! `github.io` are treated like any other registrable name.
//!
//! # Examples
//!
//! ```
//! use adsim_core::psl::{DomainResolver, PublicSuffixResolver};
//!
//! let psl = PublicSuffixResolver::bundled().unwrap();
//! assert_eq!(psl.registrable_domain("sub.example.com").as_deref(), Some("example.com"));
//! assert_eq!(psl.registrable_domain("sub.example.co.uk").as_deref(), Some("example.co.uk"));
//! ```

use std::net::IpAddr;

use publicsuffix::{List, Psl};

/// ICANN section of the official Public Suffix List shipped with the crate.
const BUNDLED_LIST: &str = include_str!("../data/public_suffix_list.dat");

const ICANN_MARKER: &str = "// ===BEGIN ICANN DOMAINS===";
const PRIVATE_MARKER: &str = "===BEGIN PRIVATE DOMAINS===";

/// Error type for public suffix list loading.
#[derive(Debug, thiserror::Error)]
pub enum PslError {
    #[error("invalid public suffix list: {0}")]
    Parse(String),
}

// =============================================================================
// Resolver
// =============================================================================

/// Computes registrable domains (eTLD+1) for hostnames.
pub trait DomainResolver {
    /// Registrable domain of `host`, or `None` when it has none
    /// (IP literals, bare suffixes, unknown suffixes).
    fn registrable_domain(&self, host: &str) -> Option<String>;
}

/// Site identity used for third-party checks: the registrable domain, or the
/// lowercased host when the resolver has no answer.
pub fn site_of<R: DomainResolver + ?Sized>(resolver: &R, host: &str) -> String {
    resolver
        .registrable_domain(host)
        .unwrap_or_else(|| host.trim_end_matches('.').to_ascii_lowercase())
}

/// Domain resolver backed by the ICANN section of a public suffix list.
pub struct PublicSuffixResolver {
    list: List,
}

impl PublicSuffixResolver {
    /// Resolver over the bundled ICANN list.
    pub fn bundled() -> Result<Self, PslError> {
        Self::from_list_text(BUNDLED_LIST)
    }

    /// Parse a list in the official `public_suffix_list.dat` format.
    ///
    /// Everything from the private-domains marker onwards is discarded. A
    /// list without section markers is read as ICANN rules.
    pub fn from_list_text(text: &str) -> Result<Self, PslError> {
        let icann = match text.find(PRIVATE_MARKER) {
            Some(pos) => &text[..pos],
            None => text,
        };

        let list = if icann.contains("===BEGIN ICANN DOMAINS===") {
            icann.parse::<List>()
        } else {
            format!("{ICANN_MARKER}\n{icann}").parse::<List>()
        }
        .map_err(|e| PslError::Parse(format!("{e:?}")))?;

        log::debug!("public suffix list loaded ({} ICANN lines)", icann.lines().count());
        Ok(Self { list })
    }
}

impl DomainResolver for PublicSuffixResolver {
    fn registrable_domain(&self, host: &str) -> Option<String> {
        let host = host.trim_end_matches('.').to_ascii_lowercase();
        if host.is_empty() || host.starts_with('[') || host.parse::<IpAddr>().is_ok() {
            return None;
        }

        let domain = self.list.domain(host.as_bytes())?;
        if !domain.suffix().is_known() {
            return None;
        }

        std::str::from_utf8(domain.as_bytes()).ok().map(str::to_owned)
    }
}

// =============================================================================
// Host Suffix Walking
// =============================================================================

/// Get the parent domain (strip leftmost label).
pub fn get_parent_domain(host: &str) -> Option<&str> {
    match host.find('.') {
        Some(idx) if idx < host.len() - 1 => Some(&host[idx + 1..]),
        _ => None,
    }
}

/// Iterator for suffix-walking a host from full name to its last label.
pub struct HostSuffixIter<'a> {
    current: Option<&'a str>,
}

impl<'a> Iterator for HostSuffixIter<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let result = self.current?;
        self.current = get_parent_domain(result);
        Some(result)
    }
}

/// Walk host suffixes from most specific to least specific.
pub fn walk_host_suffixes(host: &str) -> HostSuffixIter<'_> {
    let host = host.trim_end_matches('.');
    HostSuffixIter {
        current: if host.is_empty() { None } else { Some(host) },
    }
}
