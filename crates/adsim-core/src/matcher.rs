//! Core Matching Engine
//!
//! Every destination goes through here. Rules are split into two indexes:
//! pure hostname rules (`||host^`, hosts-file entries) keyed by host, and URL
//! pattern rules that are verified one by one.

use std::collections::HashMap;

use crate::pattern::Pattern;
use crate::psl::walk_host_suffixes;
use crate::types::{
    MatchDecision, MatchResult, PartyMask, RequestContext, RequestType, RuleAction, RuleFlags,
    SchemeMask,
};

/// `$domain=` constraint. Entries are lowercased hostnames.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DomainConstraint {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

/// A network rule ready for evaluation.
#[derive(Debug, Clone)]
pub struct NetworkRule {
    pub action: RuleAction,
    pub flags: RuleFlags,
    /// Set for pure hostname rules, which are looked up by host suffix
    pub hostname: Option<String>,
    /// URL pattern for every other rule
    pub pattern: Option<Pattern>,
    /// Empty masks mean "no restriction"
    pub type_mask: RequestType,
    pub party_mask: PartyMask,
    pub scheme_mask: SchemeMask,
    pub domain_constraints: Option<DomainConstraint>,
    pub list_id: u16,
    /// Original rule text, reported back in [`MatchResult::filter`]
    pub text: String,
}

// =============================================================================
// Engine
// =============================================================================

/// The compiled, read-only matching engine.
#[derive(Debug, Default)]
pub struct Engine {
    rules: Vec<NetworkRule>,
    host_block: HashMap<String, Vec<usize>>,
    host_allow: HashMap<String, Vec<usize>>,
    pattern_rules: Vec<usize>,
}

impl Engine {
    /// Index a set of rules.
    pub fn new(rules: Vec<NetworkRule>) -> Self {
        let mut host_block: HashMap<String, Vec<usize>> = HashMap::new();
        let mut host_allow: HashMap<String, Vec<usize>> = HashMap::new();
        let mut pattern_rules = Vec::new();

        for (rule_id, rule) in rules.iter().enumerate() {
            match (&rule.hostname, &rule.pattern) {
                (Some(host), None) => {
                    let set = match rule.action {
                        RuleAction::Allow => &mut host_allow,
                        RuleAction::Block => &mut host_block,
                    };
                    set.entry(host.clone()).or_default().push(rule_id);
                }
                _ => pattern_rules.push(rule_id),
            }
        }

        Self {
            rules,
            host_block,
            host_allow,
            pattern_rules,
        }
    }

    /// Number of rules in the engine.
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Number of rules served from the hostname index.
    pub fn hostname_rule_count(&self) -> usize {
        self.rules.len() - self.pattern_rules.len()
    }

    /// Match a request and return the decision.
    pub fn check_network_request(&self, ctx: &RequestContext<'_>) -> MatchResult {
        let mut candidates = Vec::new();
        self.match_host_sets(ctx, &mut candidates);
        self.match_pattern_rules(ctx, &mut candidates);
        self.apply_precedence(&candidates)
    }

    /// Match against the hostname indexes by walking host suffixes.
    fn match_host_sets(&self, ctx: &RequestContext<'_>, candidates: &mut Vec<MatchCandidate>) {
        if self.host_block.is_empty() && self.host_allow.is_empty() {
            return;
        }

        let host = ctx.req_host.to_ascii_lowercase();
        for suffix in walk_host_suffixes(&host) {
            for (set, action) in [(&self.host_allow, RuleAction::Allow), (&self.host_block, RuleAction::Block)] {
                let Some(rule_ids) = set.get(suffix) else {
                    continue;
                };
                for &rule_id in rule_ids {
                    if self.check_rule(rule_id, ctx) {
                        candidates.push(MatchCandidate::new(rule_id, action, &self.rules[rule_id]));
                    }
                }
            }
        }
    }

    /// Match against URL pattern rules.
    fn match_pattern_rules(&self, ctx: &RequestContext<'_>, candidates: &mut Vec<MatchCandidate>) {
        for &rule_id in &self.pattern_rules {
            let rule = &self.rules[rule_id];

            // Quick option checks first
            if !self.check_rule(rule_id, ctx) {
                continue;
            }

            if let Some(pattern) = &rule.pattern {
                if !pattern.matches(ctx.url) {
                    continue;
                }
            }

            candidates.push(MatchCandidate::new(rule_id, rule.action, rule));
        }
    }

    fn check_rule(&self, rule_id: usize, ctx: &RequestContext<'_>) -> bool {
        let rule = &self.rules[rule_id];
        check_rule_options(rule, ctx) && check_domain_constraints(rule, ctx)
    }

    /// Apply precedence rules to determine final decision.
    fn apply_precedence(&self, candidates: &[MatchCandidate]) -> MatchResult {
        let mut best_important_block: Option<&MatchCandidate> = None;
        let mut best_important_allow: Option<&MatchCandidate> = None;
        let mut best_allow: Option<&MatchCandidate> = None;
        let mut best_block: Option<&MatchCandidate> = None;

        // First candidate of each class wins; hostname rules are collected first.
        for c in candidates {
            let slot = match (c.action, c.is_important) {
                (RuleAction::Block, true) => &mut best_important_block,
                (RuleAction::Block, false) => &mut best_block,
                (RuleAction::Allow, true) => &mut best_important_allow,
                (RuleAction::Allow, false) => &mut best_allow,
            };
            slot.get_or_insert(c);
        }

        // 1. IMPORTANT ALLOW beats everything (including important block)
        if let Some(c) = best_important_allow {
            return self.result(MatchDecision::Allow, c);
        }

        // 2. IMPORTANT BLOCK wins over regular exceptions
        if let Some(c) = best_important_block {
            return self.result(MatchDecision::Block, c);
        }

        // 3. ALLOW exception overrides normal block
        if let Some(c) = best_allow {
            return self.result(MatchDecision::Allow, c);
        }

        // 4. Normal BLOCK
        if let Some(c) = best_block {
            return self.result(MatchDecision::Block, c);
        }

        MatchResult::default()
    }

    fn result(&self, decision: MatchDecision, candidate: &MatchCandidate) -> MatchResult {
        let rule = &self.rules[candidate.rule_id];
        MatchResult {
            decision,
            rule_id: candidate.rule_id as i32,
            list_id: rule.list_id,
            filter: Some(rule.text.clone()),
        }
    }
}

/// Check if a rule's options match the request context.
fn check_rule_options(rule: &NetworkRule, ctx: &RequestContext<'_>) -> bool {
    if !rule.type_mask.is_empty() && !rule.type_mask.intersects(ctx.request_type) {
        return false;
    }

    if !rule.party_mask.is_empty() {
        let request_party = if ctx.is_third_party {
            PartyMask::THIRD_PARTY
        } else {
            PartyMask::FIRST_PARTY
        };
        if !rule.party_mask.intersects(request_party) {
            return false;
        }
    }

    if !rule.scheme_mask.is_empty() && !rule.scheme_mask.intersects(ctx.scheme) {
        return false;
    }

    true
}

/// Check domain constraints ($domain=) against the source host.
fn check_domain_constraints(rule: &NetworkRule, ctx: &RequestContext<'_>) -> bool {
    let Some(constraints) = &rule.domain_constraints else {
        return true;
    };

    let site_host = ctx.site_host.to_ascii_lowercase();
    let on_list = |list: &[String]| walk_host_suffixes(&site_host).any(|s| list.iter().any(|d| d == s));

    if !constraints.include.is_empty() && !on_list(&constraints.include) {
        return false;
    }

    !on_list(&constraints.exclude)
}

// =============================================================================
// Match Candidate
// =============================================================================

#[derive(Debug)]
struct MatchCandidate {
    rule_id: usize,
    action: RuleAction,
    is_important: bool,
}

impl MatchCandidate {
    fn new(rule_id: usize, action: RuleAction, rule: &NetworkRule) -> Self {
        Self {
            rule_id,
            action,
            is_important: rule.flags.contains(RuleFlags::IMPORTANT),
        }
    }
}
