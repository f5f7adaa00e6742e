pub mod loader;
pub mod schema;

pub use loader::{load_from_path, load_from_str, ConfigError};
pub use schema::{
    MatcherChoice, ReportSettings, RunConfig, TextSettings, ValidationError, ValidationIssue,
    WrapSettings, BUILTIN_PRESETS, DEFAULT_WRAP_LIMIT,
};
