use std::collections::HashSet;

use adsim_core::types::RuleFlags;

use crate::parser::{AnchorType, CompiledRule};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OptimizeStats {
    pub before: usize,
    pub after: usize,
    pub deduped: usize,
    pub badfilter_rules: usize,
    pub badfiltered_rules: usize,
}

/// Drop `$badfilter` rules together with the rules they cancel, then remove
/// duplicates. The first occurrence of a rule is the one kept.
pub fn optimize_rules(rules: &mut Vec<CompiledRule>) -> OptimizeStats {
    let before = rules.len();
    let mut badfilter_keys: HashSet<RuleKey> = HashSet::new();
    let mut badfilter_rules = 0usize;

    for rule in rules.iter() {
        if rule.is_badfilter {
            badfilter_rules += 1;
            badfilter_keys.insert(RuleKey::from(rule));
        }
    }

    let mut badfiltered_rules = 0usize;
    rules.retain(|rule| {
        if rule.is_badfilter {
            return false;
        }
        if !badfilter_keys.is_empty() && badfilter_keys.contains(&RuleKey::from(rule)) {
            badfiltered_rules += 1;
            return false;
        }
        true
    });

    let mut seen: HashSet<RuleKey> = HashSet::new();
    let mut deduped = 0usize;
    rules.retain(|rule| {
        if seen.insert(RuleKey::from(rule)) {
            true
        } else {
            deduped += 1;
            false
        }
    });

    OptimizeStats {
        before,
        after: rules.len(),
        deduped,
        badfilter_rules,
        badfiltered_rules,
    }
}

/// Everything that affects how a rule matches. The source list, the rule's
/// text and whether it came from a hosts entry do not, so identical rules
/// from different lists collapse and `$badfilter` reaches hosts entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RuleKey {
    action: u8,
    flags: u16,
    type_mask: u32,
    party_mask: u8,
    scheme_mask: u8,
    domain: String,
    pattern: Option<String>,
    anchor_type: AnchorType,
    constraint_include: Vec<String>,
    constraint_exclude: Vec<String>,
}

impl From<&CompiledRule> for RuleKey {
    fn from(rule: &CompiledRule) -> Self {
        let (mut include, mut exclude) = match &rule.domain_constraints {
            Some(c) => (c.include.clone(), c.exclude.clone()),
            None => (Vec::new(), Vec::new()),
        };
        include.sort();
        exclude.sort();
        Self {
            action: rule.action as u8,
            flags: (rule.flags - RuleFlags::FROM_HOSTS).bits(),
            type_mask: rule.type_mask.bits(),
            party_mask: rule.party_mask.bits(),
            scheme_mask: rule.scheme_mask.bits(),
            domain: rule.domain.clone(),
            pattern: rule.pattern.clone(),
            anchor_type: rule.anchor_type,
            constraint_include: include,
            constraint_exclude: exclude,
        }
    }
}
