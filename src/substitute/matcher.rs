//! Keyword matcher strategies.
//!
//! Both strategies find leftmost, non-overlapping occurrences and prefer the
//! longest key at a given position. They are built from keys already sorted
//! longest-first, so leftmost-first semantics give longest-match semantics.

use super::errors::MatcherError;
use aho_corasick::{AhoCorasick, MatchKind};
use regex::Regex;
use std::collections::HashMap;

/// A key occurrence: byte span in the haystack and the index of the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyMatch {
    pub start: usize,
    pub end: usize,
    pub key: usize,
}

/// Multi-keyword search over a fixed key list.
pub trait Matcher {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// All leftmost non-overlapping matches in `haystack`, in order.
    fn find_all(&self, haystack: &str) -> Result<Vec<KeyMatch>, MatcherError>;
}

/// Automaton-based matcher (primary).
#[derive(Debug)]
pub struct TrieMatcher {
    automaton: AhoCorasick,
}

impl TrieMatcher {
    pub fn new(keys: &[&str]) -> Result<Self, MatcherError> {
        let automaton = AhoCorasick::builder()
            .match_kind(MatchKind::LeftmostFirst)
            .build(keys)
            .map_err(|e| MatcherError::Build {
                strategy: "trie",
                message: e.to_string(),
            })?;
        Ok(Self { automaton })
    }
}

impl Matcher for TrieMatcher {
    fn name(&self) -> &'static str {
        "trie"
    }

    fn find_all(&self, haystack: &str) -> Result<Vec<KeyMatch>, MatcherError> {
        let iter = self
            .automaton
            .try_find_iter(haystack)
            .map_err(|e| MatcherError::Search {
                strategy: "trie",
                message: e.to_string(),
            })?;
        Ok(iter
            .map(|m| KeyMatch {
                start: m.start(),
                end: m.end(),
                key: m.pattern().as_usize(),
            })
            .collect())
    }
}

/// Alternation-of-escaped-keys regex (fallback).
#[derive(Debug)]
pub struct AlternationMatcher {
    pattern: Option<Regex>,
    index: HashMap<String, usize>,
}

impl AlternationMatcher {
    pub fn new(keys: &[&str]) -> Result<Self, MatcherError> {
        // An empty alternation would match the empty string everywhere
        let pattern = if keys.is_empty() {
            None
        } else {
            let alternation = keys
                .iter()
                .map(|k| regex::escape(k))
                .collect::<Vec<_>>()
                .join("|");
            let regex = Regex::new(&alternation).map_err(|e| MatcherError::Build {
                strategy: "alternation",
                message: e.to_string(),
            })?;
            Some(regex)
        };

        let index = keys
            .iter()
            .enumerate()
            .map(|(i, k)| (k.to_string(), i))
            .collect();
        Ok(Self { pattern, index })
    }
}

impl Matcher for AlternationMatcher {
    fn name(&self) -> &'static str {
        "alternation"
    }

    fn find_all(&self, haystack: &str) -> Result<Vec<KeyMatch>, MatcherError> {
        let Some(pattern) = &self.pattern else {
            return Ok(Vec::new());
        };
        pattern
            .find_iter(haystack)
            .map(|m| {
                let key = *self
                    .index
                    .get(m.as_str())
                    .ok_or_else(|| MatcherError::Search {
                        strategy: "alternation",
                        message: format!("matched text {:?} is not a key", m.as_str()),
                    })?;
                Ok(KeyMatch {
                    start: m.start(),
                    end: m.end(),
                    key,
                })
            })
            .collect()
    }
}

/// Which strategy to try first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    #[default]
    Trie,
    Alternation,
}

impl Strategy {
    pub fn name(self) -> &'static str {
        match self {
            Strategy::Trie => "trie",
            Strategy::Alternation => "alternation",
        }
    }

    /// The other strategy.
    pub fn fallback(self) -> Self {
        match self {
            Strategy::Trie => Strategy::Alternation,
            Strategy::Alternation => Strategy::Trie,
        }
    }

    pub fn build(self, keys: &[&str]) -> Result<Box<dyn Matcher>, MatcherError> {
        Ok(match self {
            Strategy::Trie => Box::new(TrieMatcher::new(keys)?),
            Strategy::Alternation => Box::new(AlternationMatcher::new(keys)?),
        })
    }
}

/// Builds the matcher of a strategy over a key list.
pub type MatcherBuilder = dyn Fn(Strategy, &[&str]) -> Result<Box<dyn Matcher>, MatcherError>;

/// Build `preferred`, or its fallback if `preferred` cannot be built.
pub fn select_matcher(
    keys: &[&str],
    preferred: Strategy,
) -> Result<(Strategy, Box<dyn Matcher>), MatcherError> {
    select_matcher_with(keys, preferred, &Strategy::build)
}

/// [`select_matcher`] with a custom builder.
pub fn select_matcher_with(
    keys: &[&str],
    preferred: Strategy,
    build: &MatcherBuilder,
) -> Result<(Strategy, Box<dyn Matcher>), MatcherError> {
    match build(preferred, keys) {
        Ok(matcher) => Ok((preferred, matcher)),
        Err(primary) => {
            log::warn!("{primary}; falling back");
            let fallback = preferred.fallback();
            build(fallback, keys)
                .map(|matcher| (fallback, matcher))
                .map_err(|secondary| MatcherError::Exhausted {
                    primary: primary.to_string(),
                    fallback: secondary.to_string(),
                })
        }
    }
}
