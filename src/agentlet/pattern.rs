//! Address pattern matching.
//!
//! Each agentlet owns a [`PatternSet`] that decides whether the agentlet
//! applies to a given address. A set matches if any of its rules match.

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Kind of address rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternKind {
    /// Address contains the value
    Contains,
    /// Address equals the value
    Exact,
    /// Value is a regular expression found anywhere in the address
    Regex,
}

/// A single address rule.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "PatternRepr")]
pub struct Pattern {
    /// Rule kind
    pub kind: PatternKind,
    /// Rule value
    pub value: String,
}

/// Accepted wire shapes: a bare string or `{kind, value}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum PatternRepr {
    Bare(String),
    Tagged { kind: PatternKind, value: String },
}

impl From<PatternRepr> for Pattern {
    fn from(repr: PatternRepr) -> Self {
        match repr {
            PatternRepr::Bare(value) => Pattern::contains(&value),
            PatternRepr::Tagged { kind, value } => Pattern { kind, value },
        }
    }
}

impl Pattern {
    /// Substring rule.
    pub fn contains(value: &str) -> Self {
        Self {
            kind: PatternKind::Contains,
            value: value.to_string(),
        }
    }

    /// Exact-match rule.
    pub fn exact(value: &str) -> Self {
        Self {
            kind: PatternKind::Exact,
            value: value.to_string(),
        }
    }

    /// Regular-expression rule.
    pub fn regex(value: &str) -> Self {
        Self {
            kind: PatternKind::Regex,
            value: value.to_string(),
        }
    }
}

impl From<&str> for Pattern {
    fn from(value: &str) -> Self {
        Pattern::contains(value)
    }
}

impl std::fmt::Display for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            PatternKind::Contains => write!(f, "{}", self.value),
            PatternKind::Exact => write!(f, "={}", self.value),
            PatternKind::Regex => write!(f, "/{}/", self.value),
        }
    }
}

#[derive(Clone, Debug)]
struct CompiledPattern {
    pattern: Pattern,
    // None for non-regex rules and for regex rules that failed to compile
    regex: Option<Regex>,
}

impl CompiledPattern {
    fn compile(pattern: Pattern) -> Self {
        let regex = match pattern.kind {
            PatternKind::Regex => match Regex::new(&pattern.value) {
                Ok(re) => Some(re),
                Err(e) => {
                    warn!(pattern = %pattern.value, error = %e, "invalid regex pattern, it will never match");
                    None
                }
            },
            _ => None,
        };
        Self { pattern, regex }
    }

    fn matches(&self, url: &str) -> bool {
        match self.pattern.kind {
            PatternKind::Contains => url.contains(&self.pattern.value),
            PatternKind::Exact => url == self.pattern.value,
            PatternKind::Regex => self.regex.as_ref().is_some_and(|re| re.is_match(url)),
        }
    }
}

/// Compiled set of address rules.
#[derive(Clone, Debug)]
pub struct PatternSet {
    rules: Vec<CompiledPattern>,
}

impl PatternSet {
    /// Compile a set of patterns. Regex rules are compiled once here.
    pub fn new(patterns: Vec<Pattern>) -> Self {
        Self {
            rules: patterns.into_iter().map(CompiledPattern::compile).collect(),
        }
    }

    /// True if any rule matches the address.
    pub fn matches(&self, url: &str) -> bool {
        self.rules.iter().any(|rule| rule.matches(url))
    }

    /// The source patterns.
    pub fn patterns(&self) -> Vec<Pattern> {
        self.rules.iter().map(|r| r.pattern.clone()).collect()
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// True if the set holds no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
