use adsim_core::matcher::{Engine, NetworkRule};
use adsim_core::pattern::{compile_regex, Pattern, PatternOp};
use adsim_core::types::RuleFlags;

use crate::parser::{AnchorType, CompiledRule};

/// Lower compiled rules into a matching engine.
///
/// Rules must already have been through [`crate::optimize_rules`]; any
/// leftover `$badfilter` rule is ignored here.
pub fn build_engine(rules: &[CompiledRule]) -> Engine {
    let network_rules: Vec<NetworkRule> = rules
        .iter()
        .filter(|rule| !rule.is_badfilter)
        .filter_map(build_network_rule)
        .collect();

    let engine = Engine::new(network_rules);
    log::debug!(
        "built engine: {} rules ({} hostname, {} pattern)",
        engine.rule_count(),
        engine.hostname_rule_count(),
        engine.rule_count() - engine.hostname_rule_count()
    );
    engine
}

fn build_network_rule(rule: &CompiledRule) -> Option<NetworkRule> {
    let match_case = rule.flags.contains(RuleFlags::MATCH_CASE);

    let (hostname, pattern) = match &rule.pattern {
        None => (Some(rule.domain.clone()), None),
        Some(source) if rule.flags.contains(RuleFlags::IS_REGEX) => match compile_regex(source, match_case) {
            Ok(regex) => (None, Some(Pattern::Regex(regex))),
            Err(e) => {
                log::warn!("dropping rule with invalid regex '{}': {e}", rule.text);
                return None;
            }
        },
        Some(source) => {
            let right_anchor = rule.flags.contains(RuleFlags::HAS_RIGHT_ANCHOR);
            let ops = compile_pattern(source, rule.anchor_type, right_anchor, match_case);
            (None, Some(Pattern::Program { ops, match_case }))
        }
    };

    Some(NetworkRule {
        action: rule.action,
        flags: rule.flags,
        hostname,
        pattern,
        type_mask: rule.type_mask,
        party_mask: rule.party_mask,
        scheme_mask: rule.scheme_mask,
        domain_constraints: rule.domain_constraints.clone(),
        list_id: rule.list_id,
        text: rule.text.clone(),
    })
}

/// Translate an ABP pattern body into a pattern program.
pub fn compile_pattern(pattern: &str, anchor_type: AnchorType, right_anchor: bool, match_case: bool) -> Vec<PatternOp> {
    let mut ops = Vec::new();
    let pattern = if match_case { pattern.to_string() } else { pattern.to_lowercase() };

    match anchor_type {
        AnchorType::Hostname => ops.push(PatternOp::HostAnchor),
        AnchorType::Left => ops.push(PatternOp::AssertStart),
        AnchorType::None => {}
    }

    let mut literal_start = None;
    for (pos, ch) in pattern.char_indices() {
        match ch {
            '*' => {
                if let Some(start) = literal_start.take() {
                    emit_literal(&mut ops, &pattern[start..pos]);
                }
                // consecutive wildcards collapse
                if ops.last() != Some(&PatternOp::SkipAny) {
                    ops.push(PatternOp::SkipAny);
                }
            }
            '^' => {
                if let Some(start) = literal_start.take() {
                    emit_literal(&mut ops, &pattern[start..pos]);
                }
                ops.push(PatternOp::AssertBoundary);
            }
            _ => {
                if literal_start.is_none() {
                    literal_start = Some(pos);
                }
            }
        }
    }

    if let Some(start) = literal_start {
        emit_literal(&mut ops, &pattern[start..]);
    }

    if right_anchor {
        ops.push(PatternOp::AssertEnd);
    }

    ops
}

fn emit_literal(ops: &mut Vec<PatternOp>, literal: &str) {
    if !literal.is_empty() {
        ops.push(PatternOp::FindLit(literal.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use adsim_core::psl::DomainResolver;
    use adsim_core::types::{MatchDecision, RequestContext, RequestType};
    use adsim_core::PatternOp::*;

    use crate::optimizer::optimize_rules;
    use crate::parser::{parse_filter_list, AnchorType, FilterFormat};

    use super::{build_engine, compile_pattern};

    struct LastTwoLabels;

    impl DomainResolver for LastTwoLabels {
        fn registrable_domain(&self, host: &str) -> Option<String> {
            let labels: Vec<&str> = host.split('.').collect();
            (labels.len() >= 2).then(|| labels[labels.len() - 2..].join("."))
        }
    }

    fn decide(list: &str, url: &str, source: &str, request_type: RequestType) -> MatchDecision {
        let mut rules = parse_filter_list(list, FilterFormat::Standard).expect("list should parse");
        optimize_rules(&mut rules);
        let engine = build_engine(&rules);
        let ctx = RequestContext::new(url, source, request_type, &LastTwoLabels);
        engine.check_network_request(&ctx).decision
    }

    #[test]
    fn lowers_patterns_into_programs() {
        let ops = compile_pattern("Example.com/ads/**.js", AnchorType::Hostname, true, false);
        assert_eq!(
            ops,
            vec![
                HostAnchor,
                FindLit("example.com/ads/".to_string()),
                SkipAny,
                FindLit(".js".to_string()),
                AssertEnd,
            ]
        );

        let ops = compile_pattern("https://^Pixel", AnchorType::Left, false, true);
        assert_eq!(
            ops,
            vec![AssertStart, FindLit("https://".to_string()), AssertBoundary, FindLit("Pixel".to_string())]
        );
    }

    #[test]
    fn exception_overrides_block() {
        let list = "||example.com^\n||ads.example.com^\n@@||ads.example.com^";
        assert_eq!(decide(list, "https://ads.example.com/script.js", "https://site.test", RequestType::SCRIPT), MatchDecision::Allow);
        assert_eq!(decide(list, "https://www.example.com/", "https://site.test", RequestType::OTHER), MatchDecision::Block);
    }

    #[test]
    fn applies_rule_options() {
        let list = "||ads.example.com^$script,third-party";
        let url = "https://ads.example.com/script.js";
        assert_eq!(decide(list, url, "https://site.test", RequestType::SCRIPT), MatchDecision::Block);
        assert_eq!(decide(list, url, "https://www.example.com", RequestType::SCRIPT), MatchDecision::Allow);
        assert_eq!(decide(list, url, "https://site.test", RequestType::OTHER), MatchDecision::Allow);
    }

    #[test]
    fn matches_url_pattern_rules() {
        let list = "||cdn.example.com/ads/*.js|\n/banner/*/img^";
        assert_eq!(decide(list, "https://cdn.example.com/ads/x.js", "", RequestType::OTHER), MatchDecision::Block);
        assert_eq!(decide(list, "https://cdn.example.com/ads/x.js?v=2", "", RequestType::OTHER), MatchDecision::Allow);
        assert_eq!(decide(list, "http://x.test/banner/foo/img?id=1", "", RequestType::OTHER), MatchDecision::Block);
        assert_eq!(decide(list, "http://x.test/banner/foo/imgs", "", RequestType::OTHER), MatchDecision::Allow);
    }

    #[test]
    fn matches_regex_rules() {
        let list = r"/\/track\d+\.gif/";
        assert_eq!(decide(list, "http://t.test/TRACK12.gif", "", RequestType::OTHER), MatchDecision::Block);
        assert_eq!(decide(list, "http://t.test/track.gif", "", RequestType::OTHER), MatchDecision::Allow);
    }

    #[test]
    fn important_blocks_ignore_exception() {
        let list = "||ads.com^$important\n@@||ads.com^";
        assert_eq!(decide(list, "https://ads.com/a.js", "https://site.test", RequestType::SCRIPT), MatchDecision::Block);
    }

    #[test]
    fn important_exception_beats_important_block() {
        let list = "||ads.com^$important\n@@||ads.com^$important";
        assert_eq!(decide(list, "https://ads.com/a.js", "https://site.test", RequestType::SCRIPT), MatchDecision::Allow);
    }

    #[test]
    fn badfilter_cancels_block_rule() {
        let list = "||ads.com^\n||ads.com^$badfilter";
        assert_eq!(decide(list, "https://ads.com/script.js", "https://site.test", RequestType::SCRIPT), MatchDecision::Allow);
    }

    #[test]
    fn specific_exception_beats_generic_block() {
        let list = "/ads/*\n@@||good.test/ads/$domain=site.test";
        assert_eq!(decide(list, "https://good.test/ads/1.png", "https://www.site.test", RequestType::IMAGE), MatchDecision::Allow);
        assert_eq!(decide(list, "https://good.test/ads/1.png", "https://other.test", RequestType::IMAGE), MatchDecision::Block);
    }

    #[test]
    fn redirect_rules_block() {
        let list = "||ads.com/pixel.gif$image,redirect=1x1.gif";
        assert_eq!(decide(list, "https://ads.com/pixel.gif", "https://site.test", RequestType::IMAGE), MatchDecision::Block);
    }
}
