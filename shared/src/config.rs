use serde::Deserialize;
use strum_macros::{Display, EnumString};

use crate::error::{AppError, Result};
use crate::ngram::{DEFAULT_MAX_NGRAM_SIZE, DEFAULT_PUNCTUATION};

fn default_database_url() -> String {
    "postgres://catalog@localhost:5432/catalog?sslmode=disable".into()
}

fn default_input_path() -> String {
    "samples.csv".into()
}

fn default_output_path() -> String {
    "results.csv".into()
}

fn default_max_ngram_size() -> usize {
    DEFAULT_MAX_NGRAM_SIZE
}

fn default_punctuation() -> String {
    DEFAULT_PUNCTUATION.iter().collect()
}

fn default_max_parallel() -> usize {
    1
}

/// How n-grams are grouped before they are looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Mode {
    /// One lookup per window size, largest first, with punctuation variants.
    #[default]
    Tiered,
    /// One lookup over every window, exact-cased and normalized.
    Pooled,
}

/// Which result rows the batch driver writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EmitPolicy {
    /// Only rows where the resolved ids differ from the recorded ones.
    DiffOnly,
    #[default]
    AllRows,
}

/// Parameters of the matching core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchConfig {
    pub max_ngram_size: usize,
    pub punctuation: Vec<char>,
    pub mode: Mode,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            max_ngram_size: DEFAULT_MAX_NGRAM_SIZE,
            punctuation: DEFAULT_PUNCTUATION.to_vec(),
            mode: Mode::Tiered,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    #[serde(default = "default_database_url")]
    pub database_url: String,
    /// JSON catalog export; when set the in-memory store replaces Postgres.
    #[serde(default)]
    pub catalog_path: Option<String>,
    #[serde(default = "default_input_path")]
    pub input_path: String,
    #[serde(default = "default_output_path")]
    pub output_path: String,
    #[serde(default = "default_max_ngram_size")]
    pub max_ngram_size: usize,
    #[serde(default = "default_punctuation")]
    pub punctuation_equivalence: String,
    #[serde(default)]
    pub mode: Mode,
    #[serde(default)]
    pub emit_policy: EmitPolicy,
    #[serde(default = "default_max_parallel")]
    pub max_parallel: usize,
}

impl Settings {
    pub fn new() -> Result<Self> {
        let settings: Settings = config::Config::builder()
            .add_source(config::Environment::default())
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.max_ngram_size == 0 {
            return Err(AppError::Config("max_ngram_size must be at least 1".into()));
        }
        if self.max_parallel == 0 {
            return Err(AppError::Config("max_parallel must be at least 1".into()));
        }
        Ok(())
    }

    pub fn match_config(&self) -> MatchConfig {
        let mut punctuation: Vec<char> = Vec::new();
        for c in self.punctuation_equivalence.chars().filter(|c| !c.is_whitespace()) {
            if !punctuation.contains(&c) {
                punctuation.push(c);
            }
        }
        MatchConfig {
            max_ngram_size: self.max_ngram_size,
            punctuation,
            mode: self.mode,
        }
    }
}
