//! Database and API configuration.
//!
//! Loaded from a JSON file and/or `NIMBUS_*` environment variables.
//! Environment values override file values.

use crate::error::{NimbusError, NimbusResult};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable prefix
pub const ENV_PREFIX: &str = "NIMBUS_";

const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_PAGE_SIZE: u32 = 500;

/// SQLite journal mode; values map 1:1 to `PRAGMA journal_mode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JournalMode {
    #[default]
    Wal,
    Delete,
    Memory,
}

impl JournalMode {
    pub const fn pragma_value(self) -> &'static str {
        match self {
            JournalMode::Wal => "WAL",
            JournalMode::Delete => "DELETE",
            JournalMode::Memory => "MEMORY",
        }
    }

    pub fn parse_mode(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "wal" => Some(JournalMode::Wal),
            "delete" => Some(JournalMode::Delete),
            "memory" => Some(JournalMode::Memory),
            _ => None,
        }
    }
}

/// Connection and paging settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database file; in-memory when `None`
    pub path: Option<PathBuf>,
    pub busy_timeout_ms: u64,
    pub journal_mode: JournalMode,
    /// Page size applied to list commands without an explicit `pagesize`
    pub default_page_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: None,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: JournalMode::default(),
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl DatabaseConfig {
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Load from a JSON file, then apply environment overrides.
    pub fn load(path: &Path) -> NimbusResult<Self> {
        let text = fs::read_to_string(path)?;
        let config: DatabaseConfig = serde_json::from_str(&text)?;
        config.apply_overrides(|key| env::var(key).ok())
    }

    /// Defaults plus environment overrides.
    pub fn from_env() -> NimbusResult<Self> {
        Self::default().apply_overrides(|key| env::var(key).ok())
    }

    /// Apply `NIMBUS_*` overrides read through `lookup`, then validate.
    pub fn apply_overrides<F>(mut self, lookup: F) -> NimbusResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        if let Some(path) = var("DB_PATH") {
            self.path = if path.is_empty() {
                None
            } else {
                Some(PathBuf::from(path))
            };
        }
        if let Some(raw) = var("DB_BUSY_TIMEOUT_MS") {
            self.busy_timeout_ms = raw.parse().map_err(|_| {
                NimbusError::Config(format!("{ENV_PREFIX}DB_BUSY_TIMEOUT_MS: invalid value '{raw}'"))
            })?;
        }
        if let Some(raw) = var("DB_JOURNAL_MODE") {
            self.journal_mode = JournalMode::parse_mode(&raw).ok_or_else(|| {
                NimbusError::Config(format!("{ENV_PREFIX}DB_JOURNAL_MODE: unknown mode '{raw}'"))
            })?;
        }
        if let Some(raw) = var("DEFAULT_PAGE_SIZE") {
            self.default_page_size = raw.parse().map_err(|_| {
                NimbusError::Config(format!("{ENV_PREFIX}DEFAULT_PAGE_SIZE: invalid value '{raw}'"))
            })?;
        }

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> NimbusResult<()> {
        if self.default_page_size == 0 {
            return Err(NimbusError::Config(
                "default_page_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
