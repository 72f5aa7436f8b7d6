//! adsim Core Library
//!
//! Shared building blocks for the adsim blocking simulator.
//!
//! # Modules
//!
//! - `psl`: Public Suffix List domain resolver (eTLD+1 extraction)
//! - `url`: URL parsing without allocations
//! - `pattern`: Compiled URL pattern programs
//! - `matcher`: The network request matching engine
//! - `types`: Shared type definitions

pub mod matcher;
pub mod pattern;
pub mod psl;
pub mod types;
pub mod url;

// Re-export commonly used types
pub use matcher::{DomainConstraint, Engine, NetworkRule};
pub use pattern::{Pattern, PatternOp};
pub use psl::{DomainResolver, PslError, PublicSuffixResolver};
pub use types::{MatchDecision, MatchResult, PartyMask, RequestContext, RequestType, RuleAction, RuleFlags, SchemeMask};
