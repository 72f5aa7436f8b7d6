//! Accumulated filter lists.

use adsim_core::matcher::Engine;

use crate::builder::build_engine;
use crate::error::ParseError;
use crate::optimizer::optimize_rules;
use crate::parser::{parse_filter_list, CompiledRule, FilterFormat};

/// Bookkeeping for one list added to a [`FilterSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListMetadata {
    pub list_id: u16,
    pub format: FilterFormat,
    /// Network rules the list contributed before deduplication
    pub rule_count: usize,
}

/// Every rule added so far, in the order the lists were added.
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    rules: Vec<CompiledRule>,
    lists: Vec<ListMetadata>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `text` and append its rules.
    ///
    /// The whole list is parsed before anything is stored, so a list that
    /// fails to parse leaves the set untouched.
    pub fn add_filter_list(&mut self, text: &str, format: FilterFormat) -> Result<ListMetadata, ParseError> {
        let mut rules = parse_filter_list(text, format)?;

        let list_id = u16::try_from(self.lists.len()).unwrap_or(u16::MAX);
        for rule in &mut rules {
            rule.list_id = list_id;
        }

        let metadata = ListMetadata {
            list_id,
            format,
            rule_count: rules.len(),
        };
        log::debug!("list {list_id} ({format}): {} rules", metadata.rule_count);
        self.lists.push(metadata);
        self.rules.extend(rules);

        Ok(metadata)
    }

    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }

    pub fn lists(&self) -> &[ListMetadata] {
        &self.lists
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Optimize a copy of the accumulated rules and build an engine from it.
    pub fn compile(&self) -> Engine {
        let mut rules = self.rules.clone();
        let stats = optimize_rules(&mut rules);
        log::debug!(
            "optimized {} -> {} rules ({} duplicates, {} badfilter, {} cancelled)",
            stats.before,
            stats.after,
            stats.deduped,
            stats.badfilter_rules,
            stats.badfiltered_rules
        );
        build_engine(&rules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assigns_list_ids_in_order() {
        let mut set = FilterSet::new();
        let first = set.add_filter_list("||a.com^\n||b.com^", FilterFormat::Standard).unwrap();
        let second = set.add_filter_list("0.0.0.0 c.com", FilterFormat::Hosts).unwrap();

        assert_eq!(first.list_id, 0);
        assert_eq!(first.rule_count, 2);
        assert_eq!(second.list_id, 1);
        assert_eq!(second.format, FilterFormat::Hosts);
        assert_eq!(set.rules().len(), 3);
        assert_eq!(set.rules()[2].list_id, 1);
        assert_eq!(set.lists(), &[first, second]);
    }

    #[test]
    fn failed_list_adds_nothing() {
        let mut set = FilterSet::new();
        set.add_filter_list("||a.com^", FilterFormat::Standard).unwrap();
        let err = set.add_filter_list("||b.com^\n/[/", FilterFormat::Standard).unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(set.rules().len(), 1);
        assert_eq!(set.lists().len(), 1);
    }

    #[test]
    fn compile_collapses_repeated_lists() {
        let mut set = FilterSet::new();
        set.add_filter_list("||a.com^", FilterFormat::Standard).unwrap();
        set.add_filter_list("||a.com^", FilterFormat::Standard).unwrap();
        assert_eq!(set.rules().len(), 2);
        assert_eq!(set.compile().rule_count(), 1);
    }

    #[test]
    fn badfilter_cancels_hosts_entry() {
        let mut set = FilterSet::new();
        set.add_filter_list("0.0.0.0 ads.com\n0.0.0.0 cdn.com", FilterFormat::Hosts).unwrap();
        set.add_filter_list("||ads.com^$badfilter", FilterFormat::Standard).unwrap();
        let engine = set.compile();
        assert_eq!(engine.rule_count(), 1);
        assert_eq!(engine.hostname_rule_count(), 1);
    }

    #[test]
    fn empty_set_compiles_to_empty_engine() {
        let set = FilterSet::new();
        assert!(set.is_empty());
        assert_eq!(set.compile().rule_count(), 0);
    }
}
