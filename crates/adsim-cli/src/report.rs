//! Rendering of simulation results.

use std::io::{self, Write};

use adsim::Decisions;
use serde::Serialize;

const ALLOW_LABEL: &str = "\x1b[32;1mALLOW\x1b[0m";
const BLOCK_LABEL: &str = "\x1b[31;1mBLOCK\x1b[0m";

/// Which destinations text output lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextFilter {
    /// Print allowed URLs bare, hide labelled blocked ones
    pub allowed_only: bool,
    /// Print blocked URLs bare, hide labelled allowed ones
    pub blocked_only: bool,
}

/// Write the decisions as a JSON object indented by four spaces.
pub fn write_json<W: Write>(out: &mut W, decisions: &Decisions) -> io::Result<()> {
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut *out, formatter);
    decisions.serialize(&mut serializer).map_err(io::Error::from)?;
    writeln!(out)
}

/// Write one line per destination.
///
/// With `-a` or `-b` only the selected URLs are printed, without labels.
/// Both flags together print every URL bare.
pub fn write_text<W: Write>(out: &mut W, decisions: &Decisions, filter: TextFilter) -> io::Result<()> {
    for (url, allowed) in decisions {
        let (own_flag, other_flag, label) = if allowed {
            (filter.allowed_only, filter.blocked_only, ALLOW_LABEL)
        } else {
            (filter.blocked_only, filter.allowed_only, BLOCK_LABEL)
        };

        if own_flag {
            writeln!(out, "{url}")?;
        } else if !other_flag {
            writeln!(out, "{label} {url}")?;
        }
    }
    Ok(())
}
