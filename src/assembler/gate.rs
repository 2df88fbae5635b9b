//! Content-type gating.
//!
//! # Responsibilities
//! - Compile the configured allow-list of Content-Type patterns once
//! - Decide whether a response is eligible for directive resolution
//!
//! # Design Decisions
//! - Patterns are regular expressions matched anywhere in the header value
//! - Any match is enough; order only affects which rule short-circuits
//! - An empty allow-list disables assembly entirely

use regex::Regex;

use crate::assembler::AssemblerError;

/// Compiled allow-list of Content-Type patterns.
#[derive(Debug, Clone)]
pub struct ContentTypeGate {
    rules: Vec<Regex>,
}

impl ContentTypeGate {
    /// Compile the gate from configured pattern strings.
    pub fn new<I, P>(patterns: I) -> Result<Self, AssemblerError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<str>,
    {
        let rules = patterns
            .into_iter()
            .map(|pattern| {
                let pattern = pattern.as_ref();
                Regex::new(pattern).map_err(|source| AssemblerError::InvalidPattern {
                    pattern: pattern.to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { rules })
    }

    /// Returns true if `content_type` matches any configured rule.
    ///
    /// Callers pass `""` for a missing header.
    pub fn eligible(&self, content_type: &str) -> bool {
        self.rules.iter().any(|rule| rule.is_match(content_type))
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
