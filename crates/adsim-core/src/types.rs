//! Core type definitions for adsim
//!
//! These types are shared by the compiler (which produces rules) and the
//! engine (which evaluates them against requests).

use crate::psl::{site_of, DomainResolver};
use crate::url::{extract_host, extract_scheme};

// =============================================================================
// Rule Actions
// =============================================================================

/// Action to take for a matched rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RuleAction {
    /// Exception rule (@@...) - allows the request
    Allow = 0,
    /// Block rule - cancels the request
    Block = 1,
}

// =============================================================================
// Rule Flags
// =============================================================================

bitflags::bitflags! {
    /// Flags for rule behavior.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RuleFlags: u16 {
        /// $important - ignores exception filters
        const IMPORTANT = 1 << 0;
        /// Pattern is a regex
        const IS_REGEX = 1 << 1;
        /// Case-sensitive matching ($match-case)
        const MATCH_CASE = 1 << 2;
        /// Created by $redirect= (block part)
        const FROM_REDIRECT_EQ = 1 << 4;
        /// Rule came from a hosts-format list
        const FROM_HOSTS = 1 << 6;
        /// Rule has right anchor (ends with |)
        const HAS_RIGHT_ANCHOR = 1 << 7;
        /// Rule has hostname anchor (||)
        const HAS_HOST_ANCHOR = 1 << 8;
        /// Rule has left anchor (starts with |)
        const HAS_LEFT_ANCHOR = 1 << 9;
    }
}

// =============================================================================
// Request Types (bit mask for type filtering)
// =============================================================================

bitflags::bitflags! {
    /// Request type bit mask.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RequestType: u32 {
        const OTHER = 1 << 0;
        const SCRIPT = 1 << 1;
        const IMAGE = 1 << 2;
        const STYLESHEET = 1 << 3;
        const OBJECT = 1 << 4;
        const SUBDOCUMENT = 1 << 5;  // iframe/frame
        const MAIN_FRAME = 1 << 6;   // main document
        const XMLHTTPREQUEST = 1 << 7;
        const WEBSOCKET = 1 << 8;
        const FONT = 1 << 9;
        const MEDIA = 1 << 10;
        const PING = 1 << 11;
        const CSP_REPORT = 1 << 12;
        const BEACON = 1 << 13;
        const FETCH = 1 << 14;

        /// All request types
        const ALL = 0x7FFF;
        /// Document types (main_frame + sub_frame)
        const DOCUMENT = Self::MAIN_FRAME.bits() | Self::SUBDOCUMENT.bits();
    }
}

impl RequestType {
    /// Parse from browser request type string.
    ///
    /// Unknown and empty strings map to `OTHER`, so an unspecified type only
    /// meets rules that are not restricted to a concrete resource type.
    pub fn from_str(s: &str) -> Self {
        match s {
            "main_frame" | "document" => Self::MAIN_FRAME,
            "sub_frame" | "subdocument" => Self::SUBDOCUMENT,
            "stylesheet" => Self::STYLESHEET,
            "script" => Self::SCRIPT,
            "image" => Self::IMAGE,
            "font" => Self::FONT,
            "object" => Self::OBJECT,
            "xmlhttprequest" => Self::XMLHTTPREQUEST,
            "ping" => Self::PING,
            "beacon" => Self::BEACON,
            "fetch" => Self::FETCH,
            "csp_report" => Self::CSP_REPORT,
            "media" => Self::MEDIA,
            "websocket" => Self::WEBSOCKET,
            _ => Self::OTHER,
        }
    }
}

// =============================================================================
// Party Masks
// =============================================================================

bitflags::bitflags! {
    /// Party (first-party / third-party) mask.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PartyMask: u8 {
        /// Matches first-party requests
        const FIRST_PARTY = 1 << 0;
        /// Matches third-party requests
        const THIRD_PARTY = 1 << 1;
        /// Matches both
        const ALL = Self::FIRST_PARTY.bits() | Self::THIRD_PARTY.bits();
    }
}

// =============================================================================
// Scheme Masks
// =============================================================================

bitflags::bitflags! {
    /// URL scheme mask.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SchemeMask: u8 {
        const HTTP = 1 << 0;
        const HTTPS = 1 << 1;
        const WS = 1 << 2;
        const WSS = 1 << 3;
        const DATA = 1 << 4;
        const FTP = 1 << 5;
        /// All web schemes
        const ALL = 0x3F;
    }
}

// =============================================================================
// Request Context
// =============================================================================

/// Context for a request being matched.
#[derive(Debug, Clone)]
pub struct RequestContext<'a> {
    /// Full request URL
    pub url: &'a str,
    /// Request hostname (extracted from URL, may be empty)
    pub req_host: &'a str,
    /// Context/initiator URL
    pub source_url: &'a str,
    /// Context/initiator hostname
    pub site_host: &'a str,
    /// Is this a third-party request?
    pub is_third_party: bool,
    /// Request type
    pub request_type: RequestType,
    /// URL scheme (empty when unknown)
    pub scheme: SchemeMask,
}

impl<'a> RequestContext<'a> {
    /// Build a request context for `url` loaded from `source_url`.
    ///
    /// Third-party status compares the registrable domains of both hosts,
    /// falling back to the bare host when the resolver has no answer.
    pub fn new<R: DomainResolver + ?Sized>(
        url: &'a str,
        source_url: &'a str,
        request_type: RequestType,
        resolver: &R,
    ) -> Self {
        let req_host = extract_host(url).unwrap_or("");
        let site_host = extract_host(source_url).unwrap_or("");

        let is_third_party = !req_host.is_empty()
            && !site_host.is_empty()
            && site_of(resolver, req_host) != site_of(resolver, site_host);

        Self {
            url,
            req_host,
            source_url,
            site_host,
            is_third_party,
            request_type,
            scheme: extract_scheme(url).unwrap_or(SchemeMask::empty()),
        }
    }
}

// =============================================================================
// Match Result
// =============================================================================

/// Final decision for a matched request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchDecision {
    /// Request is allowed (no matching block rules, or exception matched)
    Allow,
    /// Request is blocked
    Block,
}

/// Result of matching a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    /// The final decision for this request
    pub decision: MatchDecision,
    /// Rule ID that determined the decision, -1 when nothing matched
    pub rule_id: i32,
    /// List ID the rule came from
    pub list_id: u16,
    /// Text of the rule that determined the decision
    pub filter: Option<String>,
}

impl MatchResult {
    /// True when a blocking rule decided the request.
    pub fn matched(&self) -> bool {
        self.decision == MatchDecision::Block
    }
}

impl Default for MatchResult {
    fn default() -> Self {
        Self {
            decision: MatchDecision::Allow,
            rule_id: -1,
            list_id: 0,
            filter: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoResolver;

    impl DomainResolver for NoResolver {
        fn registrable_domain(&self, _host: &str) -> Option<String> {
            None
        }
    }

    #[test]
    fn unspecified_request_type_is_other() {
        assert_eq!(RequestType::from_str(""), RequestType::OTHER);
        assert_eq!(RequestType::from_str("script"), RequestType::SCRIPT);
    }

    #[test]
    fn context_detects_third_party_by_host_without_resolver() {
        let ctx = RequestContext::new(
            "http://ads.example.com/x.js",
            "http://site.test",
            RequestType::OTHER,
            &NoResolver,
        );
        assert_eq!(ctx.req_host, "ads.example.com");
        assert_eq!(ctx.site_host, "site.test");
        assert!(ctx.is_third_party);
        assert_eq!(ctx.scheme, SchemeMask::HTTP);

        let same = RequestContext::new("https://site.test/a", "http://site.test", RequestType::OTHER, &NoResolver);
        assert!(!same.is_third_party);
        assert_eq!(same.scheme, SchemeMask::HTTPS);
    }

    #[test]
    fn default_result_is_unmatched() {
        let result = MatchResult::default();
        assert!(!result.matched());
        assert_eq!(result.rule_id, -1);
    }
}
