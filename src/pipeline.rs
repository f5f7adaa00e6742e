//! End-to-end jobs: load data, transform the target, save the result.
//!
//! Jobs only talk to the outside world through a [`Reporter`], so the same
//! job runs behind the CLI's channel or a recording reporter in tests.

use crate::config::RunConfig;
use crate::dictionary::{DictionaryLoader, DictionarySource, TranslationMap};
use crate::encoding;
use crate::errors::EngineError;
use crate::output::{self, SourceKind};
use crate::patch::{self, PatchValidator, Validation};
use crate::progress::Reporter;
use crate::substitute::{Substitution, SubstitutionOptions, DEFAULT_CHUNK_SIZE};
use std::path::{Path, PathBuf};

pub const STATUS_LOADING: &str = "loading dictionary";
pub const STATUS_READING: &str = "reading";
pub const STATUS_VALIDATING: &str = "validating";
pub const STATUS_SUBSTITUTING: &str = "substituting";
pub const STATUS_PATCHING: &str = "patching";
pub const STATUS_SAVING: &str = "saving";
pub const STATUS_DONE: &str = "done";
pub const STATUS_WAITING: &str = "waiting";

/// Translate a text file through a dictionary.
#[derive(Debug, Clone)]
pub struct TextJob {
    pub input: PathBuf,
    /// Explicit dictionary; discovered next to the input when unset.
    pub dictionary: Option<PathBuf>,
    pub config: RunConfig,
}

impl TextJob {
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            dictionary: None,
            config: RunConfig::default(),
        }
    }

    pub fn dictionary(mut self, path: Option<impl Into<PathBuf>>) -> Self {
        self.dictionary = path.map(Into::into);
        self
    }

    pub fn config(mut self, config: RunConfig) -> Self {
        self.config = config;
        self
    }

    /// Run the job and return the path of the translated file.
    pub fn run(&self, reporter: &dyn Reporter) -> Result<PathBuf, EngineError> {
        self.execute(reporter)
            .map_err(|error| report_failure(error, reporter))
    }

    fn execute(&self, reporter: &dyn Reporter) -> Result<PathBuf, EngineError> {
        let dictionary = match &self.dictionary {
            Some(path) => path.clone(),
            None => output::discover_data_source(input_dir(&self.input), SourceKind::Dictionary)?,
        };

        reporter.status(STATUS_LOADING);
        let map = load_dictionary(&dictionary, &self.config, reporter)?;

        reporter.status(STATUS_READING);
        let bytes = output::read_with_progress(&self.input, reporter)?;
        let enc = encoding::resolve(self.config.text.encoding.as_deref(), &bytes)?;
        log::debug!("decoding {} as {}", self.input.display(), enc.name());
        let content = encoding::decode_lossy(&bytes, enc, &self.input);

        reporter.status(STATUS_SUBSTITUTING);
        let options = SubstitutionOptions {
            chunk_size: self.config.text.chunk_size.unwrap_or(DEFAULT_CHUNK_SIZE),
            wrap: self.config.wrap_config(),
            strategy: self.config.text.matcher.into(),
        };
        let translated = Substitution::new(&map, options).run(&content, reporter)?;

        reporter.status(STATUS_SAVING);
        let output_path = output::translated_output_path(&self.input);
        output::write_with_progress(&output_path, translated.as_bytes(), reporter)?;

        reporter.status(STATUS_DONE);
        log::info!("wrote {}", output_path.display());
        Ok(output_path)
    }
}

/// Result of a successful [`BinaryJob`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchOutcome {
    pub output: PathBuf,
    pub applied: usize,
    /// Conflicts written to the report, zero when the table was clean.
    pub conflicts: usize,
    pub skipped: usize,
}

/// Apply a patch table to a binary file.
#[derive(Debug, Clone)]
pub struct BinaryJob {
    pub input: PathBuf,
    /// Explicit patch table; discovered next to the input when unset.
    pub data: Option<PathBuf>,
    pub config: RunConfig,
}

impl BinaryJob {
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            data: None,
            config: RunConfig::default(),
        }
    }

    pub fn data(mut self, path: Option<impl Into<PathBuf>>) -> Self {
        self.data = path.map(Into::into);
        self
    }

    pub fn config(mut self, config: RunConfig) -> Self {
        self.config = config;
        self
    }

    pub fn run(&self, reporter: &dyn Reporter) -> Result<PatchOutcome, EngineError> {
        self.execute(reporter)
            .map_err(|error| report_failure(error, reporter))
    }

    fn execute(&self, reporter: &dyn Reporter) -> Result<PatchOutcome, EngineError> {
        let data = match &self.data {
            Some(path) => path.clone(),
            None => output::discover_data_source(input_dir(&self.input), SourceKind::PatchTable)?,
        };

        reporter.status(STATUS_READING);
        let content = output::read_with_progress(&self.input, reporter)?;

        reporter.status(STATUS_VALIDATING);
        let validation = PatchValidator::new()
            .report_dir(self.config.reports.dir.as_ref())
            .target_len(Some(content.len() as u64))
            .validate_file(&data, reporter)?;
        if validation.operations.is_empty() {
            return Err(EngineError::NoValidPatches(data));
        }

        reporter.status(STATUS_PATCHING);
        let patched = patch::apply(&content, &validation.operations)?;

        reporter.status(STATUS_SAVING);
        let output_path = output::patched_output_path(&self.input);
        output::write_with_progress(&output_path, &patched, reporter)?;

        let conflicts = validation.report.conflicts().len();
        if conflicts == 0 {
            reporter.status(STATUS_DONE);
        } else {
            reporter.status(&format!(
                "{STATUS_DONE} ({conflicts} conflict(s) reported, see {})",
                patch::CONFLICT_REPORT_NAME
            ));
        }
        log::info!(
            "applied {} patch(es) to {}",
            validation.operations.len(),
            output_path.display()
        );
        Ok(PatchOutcome {
            output: output_path,
            applied: validation.operations.len(),
            conflicts,
            skipped: validation.skipped.len(),
        })
    }
}

/// Load a dictionary without touching any target file.
pub fn check_dictionary(
    path: &Path,
    config: &RunConfig,
    reporter: &dyn Reporter,
) -> Result<TranslationMap, EngineError> {
    load_dictionary(path, config, reporter)
}

/// Validate a patch table without a target file, so out-of-range rows are not detected.
pub fn check_patches(
    path: &Path,
    config: &RunConfig,
    reporter: &dyn Reporter,
) -> Result<Validation, EngineError> {
    PatchValidator::new()
        .report_dir(config.reports.dir.as_ref())
        .validate_file(path, reporter)
}

fn load_dictionary(
    path: &Path,
    config: &RunConfig,
    reporter: &dyn Reporter,
) -> Result<TranslationMap, EngineError> {
    let source = DictionarySource::from_path(path)?;
    DictionaryLoader::new()
        .encoding(config.text.dictionary_encoding.as_ref())
        .report_dir(config.reports.dir.as_ref())
        .load(&source, reporter)
}

fn input_dir(input: &Path) -> &Path {
    match input.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

fn report_failure(error: EngineError, reporter: &dyn Reporter) -> EngineError {
    if error.is_duplicate() {
        // the loader already notified; reset so the user can fix and retry
        reporter.status(STATUS_WAITING);
        reporter.progress(0.0);
    } else {
        reporter.status(&format!("error: {error}"));
        reporter.notify("Error", &error.to_string());
    }
    error
}
