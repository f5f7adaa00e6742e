use crate::substitute::Strategy;
use crate::wrap::WrapConfig;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Marker presets shipped with the tool.
pub const BUILTIN_PRESETS: &[(&str, &[&str])] = &[
    ("rtk1011", &["[0x0D]", "[0x0A]"]),
    ("rtk14", &["[0x20]", "[0x29]"]),
    ("other", &["\\r", "\\n"]),
];

/// Line limit used when wrapping is enabled without one.
pub const DEFAULT_WRAP_LIMIT: usize = 80;

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct RunConfig {
    #[serde(default)]
    pub text: TextSettings,
    #[serde(default)]
    pub wrap: WrapSettings,
    #[serde(default)]
    pub reports: ReportSettings,
    /// User-defined marker presets, looked up before the built-in ones.
    #[serde(default)]
    pub presets: BTreeMap<String, Vec<String>>,
}

impl RunConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        for (field, label) in [
            ("text.encoding", &self.text.encoding),
            ("text.dictionary_encoding", &self.text.dictionary_encoding),
        ] {
            if let Some(label) = label {
                if encoding_rs::Encoding::for_label(label.trim().as_bytes()).is_none() {
                    issues.push(ValidationIssue::UnknownEncoding {
                        field,
                        label: label.clone(),
                    });
                }
            }
        }

        if self.text.chunk_size == Some(0) {
            issues.push(ValidationIssue::InvalidValue {
                field: "text.chunk_size",
                message: "must be at least 1 byte".to_string(),
            });
        }

        if self.wrap.enabled && self.wrap.limit == Some(0) {
            issues.push(ValidationIssue::InvalidValue {
                field: "wrap.limit",
                message: "must be positive when wrapping is enabled".to_string(),
            });
        }

        if self.wrap.preset.is_some() && !self.wrap.markers.is_empty() {
            issues.push(ValidationIssue::InvalidCombo {
                message: "wrap.preset and wrap.markers cannot both be set".to_string(),
            });
        }

        if let Some(preset) = &self.wrap.preset {
            if self.marker_preset(preset).is_none() {
                issues.push(ValidationIssue::UnknownPreset(preset.clone()));
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }

    /// Markers of a user or built-in preset.
    pub fn marker_preset(&self, name: &str) -> Option<Vec<String>> {
        if let Some(markers) = self.presets.get(name) {
            return Some(markers.clone());
        }
        BUILTIN_PRESETS
            .iter()
            .find(|(preset, _)| *preset == name)
            .map(|(_, markers)| markers.iter().map(|m| m.to_string()).collect())
    }

    /// Effective wrap settings, or `None` when wrapping is off.
    pub fn wrap_config(&self) -> Option<WrapConfig> {
        if !self.wrap.enabled {
            return None;
        }
        let markers = match &self.wrap.preset {
            Some(preset) => self.marker_preset(preset).unwrap_or_default(),
            None => self.wrap.markers.clone(),
        };
        let limit = self.wrap.limit.unwrap_or(DEFAULT_WRAP_LIMIT);
        Some(WrapConfig::new(limit, markers))
    }
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct TextSettings {
    /// Encoding of the input text; detected when unset.
    #[serde(default)]
    pub encoding: Option<String>,
    /// Encoding of text dictionaries; detected when unset.
    #[serde(default)]
    pub dictionary_encoding: Option<String>,
    #[serde(default)]
    pub chunk_size: Option<usize>,
    #[serde(default)]
    pub matcher: MatcherChoice,
}

#[derive(Debug, Deserialize, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum MatcherChoice {
    #[default]
    Trie,
    Alternation,
}

impl From<MatcherChoice> for Strategy {
    fn from(choice: MatcherChoice) -> Self {
        match choice {
            MatcherChoice::Trie => Strategy::Trie,
            MatcherChoice::Alternation => Strategy::Alternation,
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct WrapSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub markers: Vec<String>,
    #[serde(default)]
    pub preset: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct ReportSettings {
    /// Where `Duplicate.csv` and `Overlap.csv` go; next to the data source when unset.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone)]
pub enum ValidationIssue {
    UnknownEncoding { field: &'static str, label: String },
    InvalidValue { field: &'static str, message: String },
    InvalidCombo { message: String },
    UnknownPreset(String),
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::UnknownEncoding { field, label } => {
                write!(f, "'{field}' names an unknown encoding '{label}'")
            }
            ValidationIssue::InvalidValue { field, message } => {
                write!(f, "invalid '{field}': {message}")
            }
            ValidationIssue::InvalidCombo { message } => {
                write!(f, "invalid run configuration: {message}")
            }
            ValidationIssue::UnknownPreset(name) => write!(f, "unknown marker preset '{name}'"),
        }
    }
}
