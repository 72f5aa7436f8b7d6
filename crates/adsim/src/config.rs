use std::path::PathBuf;

use adsim_core::PublicSuffixResolver;

use crate::error::Result;
use crate::source::read_text;

/// Simulator configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimulatorConfig {
    /// Public suffix list to load instead of the bundled one
    pub psl_path: Option<PathBuf>,
}

impl SimulatorConfig {
    pub fn with_psl_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.psl_path = Some(path.into());
        self
    }

    pub(crate) fn load_resolver(&self) -> Result<PublicSuffixResolver> {
        let resolver = match &self.psl_path {
            Some(path) => {
                log::info!("loading public suffix list from {}", path.display());
                PublicSuffixResolver::from_list_text(&read_text(path)?)?
            }
            None => PublicSuffixResolver::bundled()?,
        };
        Ok(resolver)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use adsim_core::DomainResolver;

    use super::*;
    use crate::error::FailureKind;

    #[test]
    fn default_uses_bundled_list() {
        let resolver = SimulatorConfig::default().load_resolver().unwrap();
        assert_eq!(resolver.registrable_domain("a.b.example.org").as_deref(), Some("example.org"));
    }

    #[test]
    fn loads_list_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "// ===BEGIN ICANN DOMAINS===\ntest\n// ===END ICANN DOMAINS===").unwrap();

        let resolver = SimulatorConfig::default().with_psl_path(file.path()).load_resolver().unwrap();
        assert_eq!(resolver.registrable_domain("ads.tracker.test").as_deref(), Some("tracker.test"));
        assert_eq!(resolver.registrable_domain("example.com"), None);
    }

    #[test]
    fn missing_list_is_an_io_error() {
        let config = SimulatorConfig::default().with_psl_path("/nonexistent/psl.dat");
        assert_eq!(config.load_resolver().err().map(|e| e.kind()), Some(FailureKind::Io));
    }
}
