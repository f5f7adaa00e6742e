//! Streaming multi-keyword substitution.
//!
//! A [`Substitution`] replaces every leftmost, longest occurrence of a
//! dictionary key with its value. Matching goes through a [`Matcher`]
//! strategy: an Aho-Corasick automaton first, and an alternation regex when
//! the automaton cannot be built or fails mid-run.

pub mod engine;
pub mod errors;
pub mod matcher;

pub use engine::{substitute, Substitution, SubstitutionOptions, DEFAULT_CHUNK_SIZE};
pub use errors::MatcherError;
pub use matcher::{
    select_matcher, select_matcher_with, AlternationMatcher, KeyMatch, Matcher, MatcherBuilder,
    Strategy, TrieMatcher,
};
