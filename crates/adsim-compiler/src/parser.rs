use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use adsim_core::matcher::DomainConstraint;
use adsim_core::pattern::compile_regex;
use adsim_core::types::{PartyMask, RequestType, RuleAction, RuleFlags, SchemeMask};

use crate::error::ParseError;

/// Syntax a filter list is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FilterFormat {
    /// ABP/uBO network filter syntax
    #[default]
    Standard,
    /// `<ip> <hostname>` lines, or one bare hostname per line
    Hosts,
}

impl FromStr for FilterFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard" => Ok(Self::Standard),
            "hosts" => Ok(Self::Hosts),
            other => Err(format!("unknown filter format '{other}'")),
        }
    }
}

impl fmt::Display for FilterFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Standard => "standard",
            Self::Hosts => "hosts",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledRule {
    pub action: RuleAction,
    pub flags: RuleFlags,
    /// Hostname for pure hostname rules, empty otherwise
    pub domain: String,
    /// URL pattern (regex body when `IS_REGEX` is set); `None` for hostname rules
    pub pattern: Option<String>,
    pub anchor_type: AnchorType,
    pub list_id: u16,
    pub type_mask: RequestType,
    pub party_mask: PartyMask,
    pub scheme_mask: SchemeMask,
    pub domain_constraints: Option<DomainConstraint>,
    pub is_badfilter: bool,
    /// Rule as written in the list
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AnchorType {
    #[default]
    None,
    Left,
    Hostname,
}

/// Hostnames that hosts files map to loopback addresses and that never
/// denote a blocked site.
const HOSTS_IGNORED_NAMES: &[&str] = &[
    "localhost",
    "localhost.localdomain",
    "local",
    "broadcasthost",
    "ip6-localhost",
    "ip6-loopback",
    "ip6-localnet",
    "ip6-mcastprefix",
    "ip6-allnodes",
    "ip6-allrouters",
    "ip6-allhosts",
];

/// Parse a filter list into compiled rules.
///
/// Lines the engine does not support (cosmetic filters, unknown options) are
/// skipped. Binary content and regex rules that do not compile reject the
/// whole list.
pub fn parse_filter_list(text: &str, format: FilterFormat) -> Result<Vec<CompiledRule>, ParseError> {
    let mut rules = Vec::new();

    for (index, raw_line) in text.lines().enumerate() {
        let line_no = index + 1;
        if raw_line.contains('\0') {
            return Err(ParseError::new(line_no, "unexpected NUL byte, input looks binary"));
        }

        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        match format {
            FilterFormat::Standard => parse_standard_line(line, line_no, &mut rules)?,
            FilterFormat::Hosts => parse_hosts_line(line, &mut rules),
        }
    }

    Ok(rules)
}

fn parse_standard_line(line: &str, line_no: usize, rules: &mut Vec<CompiledRule>) -> Result<(), ParseError> {
    if is_comment_line(line) || is_cosmetic_line(line) {
        return Ok(());
    }

    let mut body = line;
    let mut action = RuleAction::Block;
    if let Some(rest) = body.strip_prefix("@@") {
        action = RuleAction::Allow;
        body = rest.trim_start();
    }

    let (pattern_part, options_text) = split_rule_options(body);
    let options = match options_text {
        Some(options_text) => match parse_options(options_text) {
            Some(options) => options,
            None => {
                log::debug!("line {line_no}: skipping rule with unsupported options: {line}");
                return Ok(());
            }
        },
        None => ParsedOptions::default(),
    };

    let pattern_str = pattern_part.trim();
    let base = RuleBase { action, options, text: line };

    if let Some(regex) = parse_regex_rule(pattern_str) {
        let match_case = base.options.flags.contains(RuleFlags::MATCH_CASE);
        if let Err(e) = compile_regex(regex, match_case) {
            return Err(ParseError::new(line_no, format!("invalid regex rule '{line}': {e}")));
        }
        rules.push(base.build(String::new(), Some(regex.to_string()), AnchorType::None, RuleFlags::IS_REGEX));
        return Ok(());
    }

    if let Some(domain) = parse_host_anchor_rule(pattern_str) {
        rules.push(base.build(domain, None, AnchorType::Hostname, RuleFlags::HAS_HOST_ANCHOR));
        return Ok(());
    }

    if let Some(domain) = parse_hosts_file_domain(pattern_str) {
        if !is_ignored_hosts_name(&domain) {
            rules.push(base.build(domain, None, AnchorType::Hostname, RuleFlags::HAS_HOST_ANCHOR | RuleFlags::FROM_HOSTS));
        }
        return Ok(());
    }

    match parse_pattern_rule(pattern_str) {
        Some(parsed) => {
            let mut flags = match parsed.anchor_type {
                AnchorType::Hostname => RuleFlags::HAS_HOST_ANCHOR,
                AnchorType::Left => RuleFlags::HAS_LEFT_ANCHOR,
                AnchorType::None => RuleFlags::empty(),
            };
            if parsed.right_anchor {
                flags |= RuleFlags::HAS_RIGHT_ANCHOR;
            }
            rules.push(base.build(String::new(), Some(parsed.pattern), parsed.anchor_type, flags));
        }
        None => log::debug!("line {line_no}: skipping unsupported rule: {line}"),
    }

    Ok(())
}

fn parse_hosts_line(line: &str, rules: &mut Vec<CompiledRule>) {
    let content = match line.find('#') {
        Some(pos) => line[..pos].trim(),
        None => line,
    };

    let mut parts = content.split_whitespace();
    let Some(first) = parts.next() else {
        return;
    };

    let hosts: Vec<&str> = if first.parse::<IpAddr>().is_ok() {
        parts.collect()
    } else if parts.next().is_none() {
        vec![first]
    } else {
        log::debug!("skipping malformed hosts line: {line}");
        return;
    };

    for host in hosts {
        let Some(domain) = normalize_domain(host) else {
            continue;
        };
        if is_ignored_hosts_name(&domain) {
            continue;
        }

        let base = RuleBase {
            action: RuleAction::Block,
            options: ParsedOptions::default(),
            text: line,
        };
        rules.push(base.build(domain, None, AnchorType::Hostname, RuleFlags::HAS_HOST_ANCHOR | RuleFlags::FROM_HOSTS));
    }
}

fn is_ignored_hosts_name(domain: &str) -> bool {
    HOSTS_IGNORED_NAMES.contains(&domain) || domain.parse::<IpAddr>().is_ok()
}

/// Fields shared by every rule produced from one line.
struct RuleBase<'a> {
    action: RuleAction,
    options: ParsedOptions,
    text: &'a str,
}

impl RuleBase<'_> {
    fn build(&self, domain: String, pattern: Option<String>, anchor_type: AnchorType, extra_flags: RuleFlags) -> CompiledRule {
        CompiledRule {
            action: self.action,
            flags: self.options.flags | extra_flags,
            domain,
            pattern,
            anchor_type,
            list_id: 0,
            type_mask: self.options.type_mask,
            party_mask: self.options.party_mask,
            scheme_mask: self.options.scheme_mask,
            domain_constraints: self.options.domain_constraints.clone(),
            is_badfilter: self.options.is_badfilter,
            text: self.text.to_string(),
        }
    }
}

#[derive(Clone)]
struct ParsedOptions {
    flags: RuleFlags,
    type_mask: RequestType,
    party_mask: PartyMask,
    scheme_mask: SchemeMask,
    domain_constraints: Option<DomainConstraint>,
    is_badfilter: bool,
}

impl Default for ParsedOptions {
    fn default() -> Self {
        Self {
            flags: RuleFlags::empty(),
            type_mask: RequestType::empty(),
            party_mask: PartyMask::empty(),
            scheme_mask: SchemeMask::empty(),
            domain_constraints: None,
            is_badfilter: false,
        }
    }
}

fn split_rule_options(line: &str) -> (&str, Option<&str>) {
    // A regex body may itself contain '$'; its options follow the closing slash.
    if line.starts_with('/') {
        if let Some(pos) = line.rfind("/$").filter(|&pos| pos > 0) {
            return (&line[..=pos], Some(&line[pos + 2..]));
        }
        if line.len() > 2 && line.ends_with('/') {
            return (line, None);
        }
    }

    match line.rfind('$') {
        Some(pos) => (&line[..pos], Some(&line[pos + 1..])),
        None => (line, None),
    }
}

fn parse_options(text: &str) -> Option<ParsedOptions> {
    let mut flags = RuleFlags::empty();
    let mut type_include = 0u32;
    let mut type_exclude = 0u32;
    let mut party_include = 0u8;
    let mut party_exclude = 0u8;
    let mut scheme_include = 0u8;
    let mut scheme_exclude = 0u8;
    let mut domain_constraints: Option<DomainConstraint> = None;
    let mut is_badfilter = false;

    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Some(ParsedOptions::default());
    }

    for raw in trimmed.split(',') {
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }

        let raw_lower = raw.to_ascii_lowercase();
        let raw_lower = raw_lower.as_str();

        match raw_lower {
            "important" => {
                flags |= RuleFlags::IMPORTANT;
                continue;
            }
            "match-case" | "match_case" => {
                flags |= RuleFlags::MATCH_CASE;
                continue;
            }
            "badfilter" => {
                is_badfilter = true;
                continue;
            }
            _ => {}
        }

        if let Some(domain_value) = raw_lower.strip_prefix("domain=") {
            let parsed = parse_domain_option(domain_value)?;
            domain_constraints = Some(merge_constraints(domain_constraints, parsed));
            continue;
        }

        // redirect= still blocks; the surrogate resource itself is irrelevant here
        if raw_lower.strip_prefix("redirect=").is_some_and(|v| !v.is_empty()) {
            flags |= RuleFlags::FROM_REDIRECT_EQ;
            continue;
        }

        let (negated, name) = match raw_lower.strip_prefix('~') {
            Some(rest) => (true, rest),
            None => (false, raw_lower),
        };

        if name.is_empty() || name.contains('=') {
            return None;
        }

        if let Some(mask) = request_type_mask(name) {
            if negated {
                type_exclude |= mask;
            } else {
                type_include |= mask;
            }
            continue;
        }

        if let Some(mask) = party_mask(name) {
            if negated {
                party_exclude |= mask;
            } else {
                party_include |= mask;
            }
            continue;
        }

        if let Some(mask) = scheme_mask(name) {
            if negated {
                scheme_exclude |= mask;
            } else {
                scheme_include |= mask;
            }
            continue;
        }

        return None;
    }

    let type_bits = finalize_mask_u32(type_include, type_exclude, RequestType::ALL.bits())?;
    let party_bits = finalize_mask_u8(party_include, party_exclude, PartyMask::ALL.bits())?;
    let scheme_bits = finalize_mask_u8(scheme_include, scheme_exclude, SchemeMask::ALL.bits())?;

    Some(ParsedOptions {
        flags,
        type_mask: RequestType::from_bits_truncate(type_bits),
        party_mask: PartyMask::from_bits_truncate(party_bits),
        scheme_mask: SchemeMask::from_bits_truncate(scheme_bits),
        domain_constraints,
        is_badfilter,
    })
}

fn merge_constraints(existing: Option<DomainConstraint>, incoming: DomainConstraint) -> DomainConstraint {
    match existing {
        Some(mut current) => {
            current.include.extend(incoming.include);
            current.exclude.extend(incoming.exclude);
            current
        }
        None => incoming,
    }
}

fn parse_domain_option(value: &str) -> Option<DomainConstraint> {
    let mut include = Vec::new();
    let mut exclude = Vec::new();

    for raw in value.split('|') {
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }

        let (is_exclude, domain_raw) = match raw.strip_prefix('~') {
            Some(rest) => (true, rest),
            None => (false, raw),
        };

        let domain = normalize_domain(domain_raw)?;
        if is_exclude {
            exclude.push(domain);
        } else {
            include.push(domain);
        }
    }

    if include.is_empty() && exclude.is_empty() {
        return None;
    }

    Some(DomainConstraint { include, exclude })
}

/// Combine include/exclude bits. `Some(0)` means unrestricted, `None` means
/// the rule can never match.
fn finalize_mask_u32(include: u32, exclude: u32, all: u32) -> Option<u32> {
    let include = include & all;
    let exclude = exclude & all;
    let mut mask = if include != 0 { include & !exclude } else { all & !exclude };
    if mask == 0 {
        return None;
    }
    if mask == all {
        mask = 0;
    }
    Some(mask)
}

fn finalize_mask_u8(include: u8, exclude: u8, all: u8) -> Option<u8> {
    finalize_mask_u32(include as u32, exclude as u32, all as u32).map(|mask| mask as u8)
}

fn request_type_mask(name: &str) -> Option<u32> {
    match name {
        "script" => Some(RequestType::SCRIPT.bits()),
        "image" => Some(RequestType::IMAGE.bits()),
        "stylesheet" | "css" => Some(RequestType::STYLESHEET.bits()),
        "object" => Some(RequestType::OBJECT.bits()),
        "subdocument" | "frame" => Some(RequestType::SUBDOCUMENT.bits()),
        "document" | "doc" | "main_frame" => Some(RequestType::MAIN_FRAME.bits()),
        "xmlhttprequest" | "xhr" => Some(RequestType::XMLHTTPREQUEST.bits()),
        "media" => Some(RequestType::MEDIA.bits()),
        "font" => Some(RequestType::FONT.bits()),
        "ping" => Some(RequestType::PING.bits()),
        "websocket" => Some(RequestType::WEBSOCKET.bits()),
        "beacon" => Some(RequestType::BEACON.bits()),
        "fetch" => Some(RequestType::FETCH.bits()),
        "csp_report" => Some(RequestType::CSP_REPORT.bits()),
        "other" => Some(RequestType::OTHER.bits()),
        _ => None,
    }
}

fn party_mask(name: &str) -> Option<u8> {
    match name {
        "third-party" | "thirdparty" | "3p" => Some(PartyMask::THIRD_PARTY.bits()),
        "first-party" | "firstparty" | "1p" => Some(PartyMask::FIRST_PARTY.bits()),
        _ => None,
    }
}

fn scheme_mask(name: &str) -> Option<u8> {
    match name {
        "http" => Some(SchemeMask::HTTP.bits()),
        "https" => Some(SchemeMask::HTTPS.bits()),
        "ws" => Some(SchemeMask::WS.bits()),
        "wss" => Some(SchemeMask::WSS.bits()),
        "data" => Some(SchemeMask::DATA.bits()),
        "ftp" => Some(SchemeMask::FTP.bits()),
        _ => None,
    }
}

fn is_comment_line(line: &str) -> bool {
    line.starts_with('!') || line.starts_with('[') || line.starts_with('#')
}

fn is_cosmetic_line(line: &str) -> bool {
    ["##", "#@#", "#?#", "#$#", "#%#"].iter().any(|marker| line.contains(marker))
}

/// `/regex/` rule body, if the pattern is one.
fn parse_regex_rule(pattern: &str) -> Option<&str> {
    if pattern.len() > 2 && pattern.starts_with('/') && pattern.ends_with('/') {
        Some(&pattern[1..pattern.len() - 1])
    } else {
        None
    }
}

/// `||host^` (optionally `||host^|`) with nothing else: a pure hostname rule.
fn parse_host_anchor_rule(line: &str) -> Option<String> {
    let rest = line.strip_prefix("||")?;
    let rest = rest.strip_prefix('.').unwrap_or(rest);
    let host = rest.strip_suffix("^|").or_else(|| rest.strip_suffix('^'))?;
    normalize_domain(host)
}

fn parse_hosts_file_domain(line: &str) -> Option<String> {
    let mut parts = line.split_whitespace();
    let first = parts.next()?;
    let second = parts.next()?;

    if first.parse::<IpAddr>().is_ok() {
        return normalize_domain(second);
    }

    None
}

fn normalize_domain(host: &str) -> Option<String> {
    let trimmed = host.trim().trim_matches('.');
    if trimmed.is_empty() {
        return None;
    }

    if !trimmed
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'.' || b == b'-' || b == b'_')
    {
        return None;
    }

    Some(trimmed.to_ascii_lowercase())
}

struct ParsedPattern {
    pattern: String,
    anchor_type: AnchorType,
    right_anchor: bool,
}

fn parse_pattern_rule(line: &str) -> Option<ParsedPattern> {
    let line = line.trim();
    if line.contains(char::is_whitespace) {
        return None;
    }

    let (anchor_type, rest) = if let Some(rest) = line.strip_prefix("||") {
        (AnchorType::Hostname, rest)
    } else if let Some(rest) = line.strip_prefix('|') {
        (AnchorType::Left, rest)
    } else {
        (AnchorType::None, line)
    };

    let (rest, right_anchor) = match rest.strip_suffix('|') {
        Some(stripped) => (stripped, true),
        None => (rest, false),
    };

    if anchor_type == AnchorType::Hostname && rest.is_empty() {
        return None;
    }

    // An empty pattern matches every URL
    let pattern = if rest.is_empty() { "*" } else { rest };

    Some(ParsedPattern {
        pattern: pattern.to_string(),
        anchor_type,
        right_anchor,
    })
}
