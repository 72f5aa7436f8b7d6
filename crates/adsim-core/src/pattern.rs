//! URL pattern programs
//!
//! Plain ABP patterns are lowered by the compiler into a short list of
//! [`PatternOp`]s. Regex rules (`/.../`) keep a compiled [`Regex`].

use regex::{Regex, RegexBuilder};

use crate::url::{get_host_position, is_boundary_char};

/// Pattern program operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternOp {
    /// Literal substring (already lowercased unless the rule is case-sensitive)
    FindLit(String),
    /// Assert current position is start of URL (`|` left anchor)
    AssertStart,
    /// Assert current position is end of URL (`|` right anchor)
    AssertEnd,
    /// ABP `^` separator: one separator char, or the end of the URL
    AssertBoundary,
    /// `*` wildcard
    SkipAny,
    /// `||` anchor: next op must start on a label boundary inside the host
    HostAnchor,
}

/// A compiled URL pattern.
#[derive(Debug, Clone)]
pub enum Pattern {
    Program { ops: Vec<PatternOp>, match_case: bool },
    Regex(Regex),
}

/// Compile a regex rule body the way the engine evaluates it.
pub fn compile_regex(source: &str, match_case: bool) -> Result<Regex, regex::Error> {
    RegexBuilder::new(source)
        .case_insensitive(!match_case)
        .build()
}

impl Pattern {
    /// Check whether `url` satisfies this pattern.
    pub fn matches(&self, url: &str) -> bool {
        match self {
            Pattern::Regex(re) => re.is_match(url),
            Pattern::Program { ops, match_case } => {
                let host = get_host_position(url).unwrap_or((0, 0));
                let verifier = Verifier {
                    url: url.as_bytes(),
                    host,
                    match_case: *match_case,
                };
                verifier.run(ops, 0, true)
            }
        }
    }
}

struct Verifier<'a> {
    url: &'a [u8],
    host: (usize, usize),
    match_case: bool,
}

impl Verifier<'_> {
    /// Match `ops` starting at `pos`. When `floating` is set the next op may
    /// match anywhere at or after `pos`.
    fn run(&self, ops: &[PatternOp], pos: usize, floating: bool) -> bool {
        let Some((op, rest)) = ops.split_first() else {
            return true;
        };

        match op {
            PatternOp::SkipAny => self.run(rest, pos, true),
            PatternOp::AssertStart => pos == 0 && self.run(rest, 0, false),
            PatternOp::AssertEnd => (floating || pos == self.url.len()) && rest.is_empty(),
            PatternOp::HostAnchor => {
                let (start, end) = self.host;
                (start..end)
                    .filter(|&i| i == start || self.url[i - 1] == b'.')
                    .any(|i| self.run(rest, i, false))
            }
            PatternOp::FindLit(lit) => {
                let lit = lit.as_bytes();
                if lit.len() > self.url.len() {
                    return false;
                }
                if floating {
                    (pos..=self.url.len() - lit.len())
                        .filter(|&i| self.literal_at(lit, i))
                        .any(|i| self.run(rest, i + lit.len(), false))
                } else {
                    self.literal_at(lit, pos) && self.run(rest, pos + lit.len(), false)
                }
            }
            PatternOp::AssertBoundary => {
                if floating {
                    (pos..=self.url.len()).any(|i| self.boundary_then(rest, i))
                } else {
                    self.boundary_then(rest, pos)
                }
            }
        }
    }

    fn boundary_then(&self, rest: &[PatternOp], pos: usize) -> bool {
        if pos >= self.url.len() {
            return pos == self.url.len() && self.run(rest, pos, false);
        }
        is_boundary_char(self.url[pos]) && self.run(rest, pos + 1, false)
    }

    fn literal_at(&self, lit: &[u8], pos: usize) -> bool {
        let Some(window) = self.url.get(pos..pos + lit.len()) else {
            return false;
        };
        if self.match_case {
            window == lit
        } else {
            window.eq_ignore_ascii_case(lit)
        }
    }
}
