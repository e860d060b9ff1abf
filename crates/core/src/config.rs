//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into core services as an
//! `Arc<CoreConfig>`. Request handlers never read process-wide environment variables.

use crate::constants::{
    DEFAULT_COMPLETION_BASE_URL, DEFAULT_COMPLETION_MODEL, DEFAULT_DATABASE_URL,
    DEFAULT_DATA_DIR, DEFAULT_MAX_RESULTS, DEFAULT_PAPER_SOURCE_URL, DEFAULT_RELEVANT_PAPERS,
    MAX_RESULTS_LIMIT,
};
use crate::{SynopsisError, SynopsisResult};
use std::path::{Path, PathBuf};

/// Settings for the hosted completion endpoint.
#[derive(Clone, Debug)]
pub struct CompletionConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_COMPLETION_BASE_URL.into(),
            model: DEFAULT_COMPLETION_MODEL.into(),
        }
    }
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_dir: PathBuf,
    database_url: String,
    paper_source_url: String,
    completion: CompletionConfig,
    default_max_results: usize,
    relevant_papers: usize,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns `SynopsisError::InvalidInput` if:
    /// - `database_url` or `paper_source_url` is blank,
    /// - `default_max_results` is zero or above the accepted limit,
    /// - `relevant_papers` is zero.
    pub fn new(
        data_dir: PathBuf,
        database_url: String,
        paper_source_url: String,
        completion: CompletionConfig,
        default_max_results: usize,
        relevant_papers: usize,
    ) -> SynopsisResult<Self> {
        if database_url.trim().is_empty() {
            return Err(SynopsisError::InvalidInput(
                "database_url cannot be empty".into(),
            ));
        }
        if paper_source_url.trim().is_empty() {
            return Err(SynopsisError::InvalidInput(
                "paper_source_url cannot be empty".into(),
            ));
        }
        validate_max_results(default_max_results)?;
        if relevant_papers == 0 {
            return Err(SynopsisError::InvalidInput(
                "relevant_papers must be at least 1".into(),
            ));
        }

        Ok(Self {
            data_dir,
            database_url,
            paper_source_url,
            completion,
            default_max_results,
            relevant_papers,
        })
    }

    /// Configuration rooted at `data_dir` with every other value at its default.
    ///
    /// Used by tests and by the CLI `render` command, which never touches the network.
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            database_url: "sqlite::memory:".into(),
            paper_source_url: DEFAULT_PAPER_SOURCE_URL.into(),
            completion: CompletionConfig::default(),
            default_max_results: DEFAULT_MAX_RESULTS,
            relevant_papers: DEFAULT_RELEVANT_PAPERS,
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    pub fn paper_source_url(&self) -> &str {
        &self.paper_source_url
    }

    pub fn completion(&self) -> &CompletionConfig {
        &self.completion
    }

    pub fn default_max_results(&self) -> usize {
        self.default_max_results
    }

    pub fn relevant_papers(&self) -> usize {
        self.relevant_papers
    }
}

/// Resolve the configuration from process environment variables.
///
/// Intended to be called once from a binary's `main`, after `.env` has been loaded.
///
/// # Environment Variables
/// - `SYNOPSIS_DATA_DIR`: artifact directory (default: `data`)
/// - `DATABASE_URL`: research cache (default: `sqlite://research.db?mode=rwc`)
/// - `PAPER_SOURCE_URL`: paper search endpoint
/// - `GROQ_API_KEY`, `GROQ_BASE_URL`, `GROQ_MODEL`: completion endpoint
/// - `SYNOPSIS_MAX_RESULTS`: default papers per query (default: 10)
/// - `SYNOPSIS_RELEVANT_PAPERS`: references kept per synopsis (default: 3)
///
/// # Errors
///
/// Returns `SynopsisError::InvalidInput` if a count does not parse or any value fails
/// [`CoreConfig::new`] validation.
pub fn config_from_env() -> SynopsisResult<CoreConfig> {
    let var = |name: &str| std::env::var(name).ok();
    let text_or = |name: &str, default: &str| {
        text_from_env_value(var(name)).unwrap_or_else(|| default.to_string())
    };

    let completion = CompletionConfig {
        api_key: text_from_env_value(var("GROQ_API_KEY")),
        base_url: text_or("GROQ_BASE_URL", DEFAULT_COMPLETION_BASE_URL),
        model: text_or("GROQ_MODEL", DEFAULT_COMPLETION_MODEL),
    };

    CoreConfig::new(
        PathBuf::from(text_or("SYNOPSIS_DATA_DIR", DEFAULT_DATA_DIR)),
        text_or("DATABASE_URL", DEFAULT_DATABASE_URL),
        text_or("PAPER_SOURCE_URL", DEFAULT_PAPER_SOURCE_URL),
        completion,
        count_from_env_value(
            "SYNOPSIS_MAX_RESULTS",
            var("SYNOPSIS_MAX_RESULTS"),
            DEFAULT_MAX_RESULTS,
        )?,
        count_from_env_value(
            "SYNOPSIS_RELEVANT_PAPERS",
            var("SYNOPSIS_RELEVANT_PAPERS"),
            DEFAULT_RELEVANT_PAPERS,
        )?,
    )
}

/// Check a requested result count against the accepted range.
pub fn validate_max_results(value: usize) -> SynopsisResult<usize> {
    if value == 0 || value > MAX_RESULTS_LIMIT {
        return Err(SynopsisError::InvalidInput(format!(
            "max_results must be between 1 and {MAX_RESULTS_LIMIT}"
        )));
    }
    Ok(value)
}

/// Parse a count from an optional environment value.
///
/// If `value` is `None` or empty/whitespace, returns `default`.
///
/// # Errors
///
/// Returns `SynopsisError::InvalidInput` naming `name` if the value is not a non-negative integer.
pub fn count_from_env_value(
    name: &str,
    value: Option<String>,
    default: usize,
) -> SynopsisResult<usize> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    match value {
        None => Ok(default),
        Some(v) => v
            .parse::<usize>()
            .map_err(|e| SynopsisError::InvalidInput(format!("{name}: {e}"))),
    }
}

/// Normalise an optional environment value: blank values count as missing.
pub fn text_from_env_value(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
