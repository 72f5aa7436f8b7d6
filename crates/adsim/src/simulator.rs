//! The blocking simulator.
//!
//! A [`Simulator`] accumulates filter lists into one [`FilterSet`] and keeps
//! an [`Engine`] compiled from everything added so far. Each addition
//! replaces the engine; queries only ever see a complete one.

use std::path::Path;

use adsim_compiler::{FilterFormat, FilterSet};
use adsim_core::psl::DomainResolver;
use adsim_core::types::{MatchResult, RequestContext, RequestType};
use adsim_core::Engine;

use crate::config::SimulatorConfig;
use crate::decisions::Decisions;
use crate::error::{Error, Result};
use crate::normalize::{canonicalize, sort_key};
use crate::source::{expand_destinations, read_text, resolve_source, RuleSource};

pub struct Simulator {
    filters: FilterSet,
    engine: Engine,
    resolver: Box<dyn DomainResolver>,
}

impl Simulator {
    /// Simulator using the bundled public suffix data.
    pub fn new() -> Result<Self> {
        Self::with_config(SimulatorConfig::default())
    }

    pub fn with_config(config: SimulatorConfig) -> Result<Self> {
        let resolver = config.load_resolver()?;
        Ok(Self::with_resolver(resolver))
    }

    /// Simulator answering registrable-domain queries with `resolver`.
    pub fn with_resolver<R: DomainResolver + 'static>(resolver: R) -> Self {
        Self {
            filters: FilterSet::new(),
            engine: Engine::default(),
            resolver: Box::new(resolver),
        }
    }

    /// Add each item, in order, as a file path or as literal rule text.
    ///
    /// Stops at the first item that fails. Items added before it stay
    /// added; the failing item contributes nothing.
    pub fn add_filter_list<I, S>(&mut self, items: I, format: FilterFormat) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for item in items {
            match RuleSource::classify(item.as_ref())? {
                RuleSource::File(path) => self.add_filter_list_from_file(&path, format)?,
                RuleSource::Inline(text) => self.add_filter_list_from_string(&text, format)?,
            }
        }
        Ok(())
    }

    /// [`Simulator::add_filter_list`] for hosts-format sources.
    pub fn add_hosts<I, S>(&mut self, items: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.add_filter_list(items, FilterFormat::Hosts)
    }

    pub fn add_filter_list_from_file(&mut self, path: impl AsRef<Path>, format: FilterFormat) -> Result<()> {
        let path = path.as_ref();
        log::debug!("reading {format} list from {}", path.display());
        let text = read_text(path)?;
        self.add_filter_list_from_string(&text, format)
    }

    pub fn add_filter_list_from_string(&mut self, text: &str, format: FilterFormat) -> Result<()> {
        self.filters.add_filter_list(text, format)?;
        self.rebuild();
        Ok(())
    }

    fn rebuild(&mut self) {
        self.engine = self.filters.compile();
        log::info!(
            "engine rebuilt: {} rules from {} lists",
            self.engine.rule_count(),
            self.filters.lists().len()
        );
    }

    pub fn filter_set(&self) -> &FilterSet {
        &self.filters
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Match one canonical destination URL loaded from `source_url`.
    pub fn check(&self, url: &str, source_url: &str) -> MatchResult {
        let ctx = RequestContext::new(url, source_url, RequestType::from_str(""), self.resolver.as_ref());
        self.engine.check_network_request(&ctx)
    }

    /// Decide every destination as if requested from `source`.
    ///
    /// `source` and each destination may name a file. Destinations are
    /// ordered by registrable domain; ties keep their input order.
    pub fn simulate<S: AsRef<str>>(&self, source: &str, destinations: &[S]) -> Result<Decisions> {
        let source_url = canonicalize(&resolve_source(source)?);

        let mut destinations = expand_destinations(destinations)?;
        if destinations.is_empty() {
            return Err(Error::InvalidInput("no destination URLs given".to_string()));
        }

        let resolver = self.resolver.as_ref();
        destinations.sort_by_cached_key(|destination| sort_key(destination, resolver));

        let mut decisions = Decisions::new();
        for destination in &destinations {
            let url = canonicalize(destination);
            let result = self.check(&url, &source_url);
            match &result.filter {
                Some(filter) => log::debug!("{url}: {:?} by {filter}", result.decision),
                None => log::debug!("{url}: no rule matched"),
            }
            decisions.insert(url, !result.matched());
        }

        Ok(decisions)
    }
}
