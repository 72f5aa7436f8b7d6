//! adsim: what-if simulation of content-blocking filter lists
//!
//! Load filter lists or hosts files into a [`Simulator`], then ask how a
//! batch of destination URLs would be treated when requested from a source
//! page:
//!
//! ```
//! use adsim::{FilterFormat, Simulator};
//!
//! let mut sim = Simulator::new()?;
//! sim.add_filter_list(["||ads.example.com^"], FilterFormat::Standard)?;
//!
//! let decisions = sim.simulate("http://site.test", &["ads.example.com/x.js", "cdn.example.com/x.js"])?;
//! assert_eq!(decisions.get("http://ads.example.com/x.js"), Some(false));
//! assert_eq!(decisions.get("http://cdn.example.com/x.js"), Some(true));
//! # Ok::<(), adsim::Error>(())
//! ```

pub mod config;
pub mod decisions;
pub mod error;
pub mod normalize;
pub mod simulator;
pub mod source;

pub use adsim_compiler::FilterFormat;
pub use config::SimulatorConfig;
pub use decisions::Decisions;
pub use error::{Error, FailureKind, Result};
pub use simulator::Simulator;
pub use source::RuleSource;
