//! adsim Filter List Compiler
//!
//! This crate turns ABP/uBO filter lists and hosts files into the engine
//! defined in `adsim-core`.

pub mod builder;
pub mod error;
pub mod filter_set;
pub mod optimizer;
pub mod parser;

pub use builder::{build_engine, compile_pattern};
pub use error::ParseError;
pub use filter_set::{FilterSet, ListMetadata};
pub use optimizer::{optimize_rules, OptimizeStats};
pub use parser::{parse_filter_list, AnchorType, CompiledRule, FilterFormat};
