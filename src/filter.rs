//! Pattern matching module
//!
//! Provides the three matching strategies (contains, equal, regex) and the
//! case normalization policy that goes with them.

use crate::dedup::dedup_lines;
use regex::Regex;
use std::borrow::Cow;
use std::fmt;

/// Matching strategy for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// Target contains the pattern as a substring
    #[default]
    Contains,
    /// Target is exactly the pattern
    Equal,
    /// Pattern regex finds a match anywhere in the target
    Regex,
}

impl MatchMode {
    /// Resolve the mode from the CLI switches. Regex takes precedence over equal.
    pub fn from_flags(equal: bool, regex: bool) -> Self {
        if regex {
            Self::Regex
        } else if equal {
            Self::Equal
        } else {
            Self::Contains
        }
    }
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Contains => "contains",
            Self::Equal => "equal",
            Self::Regex => "regex",
        };
        f.write_str(name)
    }
}

/// Case normalization applied before matching
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CasePolicy {
    /// Leave target and patterns as authored
    #[default]
    Preserve,
    /// Lowercase the scan target only
    LowercaseTarget,
    /// Lowercase the scan target and the pattern set
    LowercaseBoth,
}

impl CasePolicy {
    /// Build the policy from the CLI switches.
    ///
    /// Regex patterns are used as authored, so any lowercasing is dropped in
    /// regex mode. Case-insensitive regexes should use `(?i)`.
    pub fn new(lowercase_target: bool, lowercase_both: bool, mode: MatchMode) -> Self {
        if mode == MatchMode::Regex {
            Self::Preserve
        } else if lowercase_both {
            Self::LowercaseBoth
        } else if lowercase_target {
            Self::LowercaseTarget
        } else {
            Self::Preserve
        }
    }

    /// Lowercase the whole pattern batch when the policy asks for it.
    ///
    /// Lowercasing may collapse distinct patterns, so the result is
    /// deduplicated again.
    pub fn normalize_patterns(&self, patterns: Vec<String>) -> Vec<String> {
        match self {
            Self::LowercaseBoth => {
                let lowered = patterns.into_iter().map(|p| p.to_lowercase()).collect();
                dedup_lines(lowered)
            }
            _ => patterns,
        }
    }

    /// Lowercase a single scan target when the policy asks for it
    #[inline]
    pub fn normalize_target<'a>(&self, target: Cow<'a, str>) -> Cow<'a, str> {
        match self {
            Self::Preserve => target,
            Self::LowercaseTarget | Self::LowercaseBoth => Cow::Owned(target.to_lowercase()),
        }
    }
}

/// A regex source that failed to compile
#[derive(Debug, Clone)]
pub struct RejectedPattern {
    pub pattern: String,
    pub reason: String,
}

#[derive(Debug, Clone)]
enum Patterns {
    Literal(Vec<String>),
    Regex(Vec<Regex>),
}

/// Ordered, immutable set of active patterns for one match mode
#[derive(Debug, Clone)]
pub struct PatternSet {
    mode: MatchMode,
    patterns: Patterns,
}

impl PatternSet {
    /// Prepare the active pattern set.
    ///
    /// In regex mode each source is compiled on its own; sources that fail
    /// are returned as rejected and left out of the set.
    pub fn compile(sources: Vec<String>, mode: MatchMode) -> (Self, Vec<RejectedPattern>) {
        let mut rejected = Vec::new();

        let patterns = match mode {
            MatchMode::Contains | MatchMode::Equal => Patterns::Literal(sources),
            MatchMode::Regex => {
                let mut compiled = Vec::with_capacity(sources.len());
                for source in sources {
                    match Regex::new(&source) {
                        Ok(regex) => compiled.push(regex),
                        Err(e) => rejected.push(RejectedPattern {
                            pattern: source,
                            reason: e.to_string(),
                        }),
                    }
                }
                Patterns::Regex(compiled)
            }
        };

        (Self { mode, patterns }, rejected)
    }

    /// Index of the first pattern (in file order) that matches the target.
    ///
    /// Evaluation stops at the first hit.
    #[inline]
    pub fn first_match(&self, target: &str) -> Option<usize> {
        match &self.patterns {
            Patterns::Literal(literals) => match self.mode {
                MatchMode::Equal => literals.iter().position(|p| p == target),
                _ => literals.iter().position(|p| target.contains(p.as_str())),
            },
            Patterns::Regex(regexes) => regexes.iter().position(|r| r.is_match(target)),
        }
    }

    /// Check if any pattern matches the target
    #[inline]
    pub fn matches(&self, target: &str) -> bool {
        self.first_match(target).is_some()
    }

    pub fn len(&self) -> usize {
        match &self.patterns {
            Patterns::Literal(p) => p.len(),
            Patterns::Regex(p) => p.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
