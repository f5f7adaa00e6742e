use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MatcherError {
    #[error("{strategy} matcher could not be built: {message}")]
    Build {
        strategy: &'static str,
        message: String,
    },

    #[error("{strategy} matcher failed during search: {message}")]
    Search {
        strategy: &'static str,
        message: String,
    },

    #[error("every matcher strategy failed (primary: {primary}; fallback: {fallback})")]
    Exhausted { primary: String, fallback: String },
}
