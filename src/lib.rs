//! Text Replacer: dictionary-driven text substitution and binary patching
//!
//! Two jobs share one engine:
//!
//! - **Text**: a [`TranslationMap`] built from a `key=value` text file or a
//!   two-column CSV is applied to a whole document in chunks, longest key
//!   first, with an optional line-wrapping pass over the result.
//! - **Binary**: a patch table (`Offset`, `Value`, `Bytes`) is validated for
//!   duplicate offsets, overlaps and over-long values, and the accepted rows
//!   are written into a copy of the target file.
//!
//! Data sources with problems are never applied blindly. Duplicate keys abort
//! the dictionary load and land in `Duplicate.csv`; conflicting patch rows are
//! dropped from the run and listed in `Overlap.csv`.
//!
//! All progress, status text and user-facing notices go through a
//! [`Reporter`], so the engine stays free of any UI concerns.
//!
//! # Example
//!
//! ```
//! use text_replacer::dictionary::{build, DictionaryEntry};
//! use text_replacer::progress::NullReporter;
//! use text_replacer::substitute::substitute;
//!
//! let (map, duplicates) = build([
//!     (1, DictionaryEntry::new("cat", "chat")),
//!     (2, DictionaryEntry::new("category", "catégorie")),
//! ]);
//! assert!(duplicates.is_empty());
//!
//! let out = substitute("a cat category", &map, None, &NullReporter).unwrap();
//! assert_eq!(out, "a chat catégorie");
//! ```

pub mod config;
pub mod dictionary;
pub mod encoding;
pub mod errors;
pub mod hex;
pub mod output;
pub mod patch;
pub mod pipeline;
pub mod progress;
pub mod substitute;
pub mod table;
pub mod wrap;

// Re-exports
pub use config::{load_from_path, load_from_str, ConfigError, RunConfig};
pub use dictionary::{DictionaryEntry, DictionaryLoader, DictionarySource, TranslationMap};
pub use errors::EngineError;
pub use patch::{Conflict, ConflictReport, PatchOperation, PatchRow, PatchValidator, Validation};
pub use pipeline::{BinaryJob, PatchOutcome, TextJob};
pub use progress::{ChannelReporter, Event, NullReporter, Reporter};
pub use substitute::{substitute, Substitution, SubstitutionOptions};
pub use wrap::{wrap_text, WrapConfig};
