//! Configuration management.
//!
//! [`GraphConfig`] is assembled in three layers: built-in defaults, an
//! optional TOML file, then `GRAPHREL_*` environment variables.
//!
//! ```toml
//! db_path = "/var/lib/graphrel/graph.db"
//! busy_timeout_ms = 5000
//!
//! [traversal]
//! max_depth = 16
//!
//! [index]
//! max_value_len = 255
//!
//! [logging]
//! format = "json"
//! filter = "graphrel=debug"
//! ```

use crate::observability::{LogFormat, LoggingConfig};
use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Hard ceiling on traversal depth.
///
/// A depth-`n` traversal joins the edge table `n` times and `SQLite` refuses
/// joins over 64 tables.
pub const TRAVERSAL_DEPTH_CAP: u32 = 63;

/// Default maximum traversal depth.
pub const DEFAULT_MAX_TRAVERSAL_DEPTH: u32 = 32;

/// Default maximum length, in characters, of an indexed value.
pub const DEFAULT_MAX_INDEX_VALUE_LEN: usize = 255;

/// Environment variable overriding [`GraphConfig::db_path`].
pub const ENV_DB_PATH: &str = "GRAPHREL_DB_PATH";
/// Environment variable overriding [`GraphConfig::max_traversal_depth`].
pub const ENV_MAX_DEPTH: &str = "GRAPHREL_MAX_DEPTH";
/// Environment variable overriding the log format.
pub const ENV_LOG_FORMAT: &str = "GRAPHREL_LOG_FORMAT";
/// Environment variable overriding the log filter.
pub const ENV_LOG_FILTER: &str = "GRAPHREL_LOG";

/// Main configuration for a graph store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphConfig {
    /// Database file. `None` opens a private in-memory store.
    pub db_path: Option<PathBuf>,
    /// How long a statement waits on a locked database.
    pub busy_timeout: Duration,
    /// Largest `max` accepted in a traversal depth range.
    pub max_traversal_depth: u32,
    /// Longest value accepted by the index manager, in characters.
    pub max_index_value_len: usize,
    /// Logging configuration.
    pub logging: LoggingConfig,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            busy_timeout: crate::storage::sqlite::DEFAULT_BUSY_TIMEOUT,
            max_traversal_depth: DEFAULT_MAX_TRAVERSAL_DEPTH,
            max_index_value_len: DEFAULT_MAX_INDEX_VALUE_LEN,
            logging: LoggingConfig::default(),
        }
    }
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Database file path.
    pub db_path: Option<String>,
    /// Busy timeout in milliseconds.
    pub busy_timeout_ms: Option<u64>,
    /// Traversal section.
    pub traversal: Option<ConfigFileTraversal>,
    /// Index section.
    pub index: Option<ConfigFileIndex>,
    /// Logging section.
    pub logging: Option<ConfigFileLogging>,
}

/// `[traversal]` section.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFileTraversal {
    /// Maximum depth.
    pub max_depth: Option<u32>,
}

/// `[index]` section.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFileIndex {
    /// Maximum value length.
    pub max_value_len: Option<usize>,
}

/// `[logging]` section.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFileLogging {
    /// `pretty` or `json`.
    pub format: Option<LogFormat>,
    /// `EnvFilter` directive string.
    pub filter: Option<String>,
}

impl GraphConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file, merged over the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::OperationFailed {
            operation: "read_config_file".to_string(),
            cause: format!("{}: {e}", path.display()),
        })?;

        Self::from_toml(&contents)
    }

    /// Parses configuration from TOML text, merged over the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid configuration TOML.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(contents).map_err(|e| Error::OperationFailed {
            operation: "parse_config_file".to_string(),
            cause: e.to_string(),
        })?;

        Ok(Self::from_config_file(file))
    }

    /// Loads configuration from the default location.
    ///
    /// Checks the following paths in order:
    /// 1. Platform config dir (`~/Library/Application Support/graphrel/` on macOS)
    /// 2. `~/.config/graphrel/`
    ///
    /// Returns the defaults if no readable file is found. Environment
    /// overrides are not applied; chain [`with_env_overrides`](Self::with_env_overrides).
    #[must_use]
    pub fn load_default() -> Self {
        let Some(base_dirs) = directories::BaseDirs::new() else {
            return Self::default();
        };

        let candidates = [
            base_dirs.config_dir().join("graphrel").join("config.toml"),
            base_dirs
                .home_dir()
                .join(".config")
                .join("graphrel")
                .join("config.toml"),
        ];

        for path in candidates.iter().filter(|p| p.exists()) {
            match Self::load_from_file(path) {
                Ok(config) => return config,
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "ignoring config file"),
            }
        }

        Self::default()
    }

    /// Applies `GRAPHREL_*` environment variables.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Applies overrides read through `lookup` (keyed by the `ENV_*` names).
    ///
    /// Unparseable values are logged and ignored.
    #[must_use]
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(path) = lookup(ENV_DB_PATH).filter(|p| !p.trim().is_empty()) {
            self.db_path = Some(PathBuf::from(path));
        }
        if let Some(raw) = lookup(ENV_MAX_DEPTH) {
            match raw.trim().parse::<u32>() {
                Ok(depth) => self = self.with_max_traversal_depth(depth),
                Err(e) => tracing::warn!(value = %raw, error = %e, "ignoring {ENV_MAX_DEPTH}"),
            }
        }
        if let Some(raw) = lookup(ENV_LOG_FORMAT) {
            match LogFormat::parse(raw.trim()) {
                Some(format) => self.logging.format = format,
                None => tracing::warn!(value = %raw, "ignoring {ENV_LOG_FORMAT}"),
            }
        }
        if let Some(filter) = lookup(ENV_LOG_FILTER).filter(|f| !f.trim().is_empty()) {
            self.logging.filter = filter;
        }
        self
    }

    /// Converts a `ConfigFile` to `GraphConfig`.
    fn from_config_file(file: ConfigFile) -> Self {
        let mut config = Self::default();

        if let Some(db_path) = file.db_path {
            config.db_path = Some(PathBuf::from(db_path));
        }
        if let Some(ms) = file.busy_timeout_ms {
            config.busy_timeout = Duration::from_millis(ms);
        }
        if let Some(depth) = file.traversal.and_then(|t| t.max_depth) {
            config = config.with_max_traversal_depth(depth);
        }
        if let Some(len) = file.index.and_then(|i| i.max_value_len) {
            config.max_index_value_len = len;
        }
        if let Some(logging) = file.logging {
            if let Some(format) = logging.format {
                config.logging.format = format;
            }
            if let Some(filter) = logging.filter {
                config.logging.filter = filter;
            }
        }

        config
    }

    /// Sets the database path.
    #[must_use]
    pub fn with_db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.db_path = Some(path.into());
        self
    }

    /// Sets the busy timeout.
    #[must_use]
    pub const fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Sets the maximum traversal depth, clamped to [`TRAVERSAL_DEPTH_CAP`].
    #[must_use]
    pub fn with_max_traversal_depth(mut self, depth: u32) -> Self {
        if depth > TRAVERSAL_DEPTH_CAP {
            tracing::warn!(depth, cap = TRAVERSAL_DEPTH_CAP, "clamping max traversal depth");
        }
        self.max_traversal_depth = depth.min(TRAVERSAL_DEPTH_CAP);
        self
    }

    /// Sets the maximum index value length.
    #[must_use]
    pub const fn with_max_index_value_len(mut self, len: usize) -> Self {
        self.max_index_value_len = len;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = GraphConfig::default();
        assert!(config.db_path.is_none());
        assert_eq!(config.max_traversal_depth, 32);
        assert_eq!(config.max_index_value_len, 255);
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_from_toml_merges_over_defaults() {
        let config = GraphConfig::from_toml(
            r#"
            db_path = "/tmp/g.db"

            [traversal]
            max_depth = 8

            [logging]
            format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.db_path, Some(PathBuf::from("/tmp/g.db")));
        assert_eq!(config.max_traversal_depth, 8);
        assert_eq!(config.max_index_value_len, DEFAULT_MAX_INDEX_VALUE_LEN);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.filter, crate::observability::DEFAULT_LOG_FILTER);
    }

    #[test]
    fn test_from_toml_rejects_unknown_fields() {
        let err = GraphConfig::from_toml("max_depth = 3").unwrap_err();
        assert!(matches!(err, Error::OperationFailed { ref operation, .. } if operation == "parse_config_file"));
    }

    #[test]
    fn test_depth_is_clamped() {
        let config = GraphConfig::from_toml("[traversal]\nmax_depth = 500").unwrap();
        assert_eq!(config.max_traversal_depth, TRAVERSAL_DEPTH_CAP);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "busy_timeout_ms = 250\n[index]\nmax_value_len = 64").unwrap();

        let config = GraphConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.busy_timeout, Duration::from_millis(250));
        assert_eq!(config.max_index_value_len, 64);
    }

    #[test]
    fn test_load_from_missing_file() {
        let err = GraphConfig::load_from_file(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(err.to_string().contains("read_config_file"));
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_DB_PATH, "/data/graph.db"),
            (ENV_MAX_DEPTH, "not-a-number"),
            (ENV_LOG_FORMAT, "JSON"),
            (ENV_LOG_FILTER, "graphrel=trace"),
        ]);

        let config = GraphConfig::default()
            .with_overrides_from(|key| env.get(key).map(ToString::to_string));

        assert_eq!(config.db_path, Some(PathBuf::from("/data/graph.db")));
        assert_eq!(config.max_traversal_depth, DEFAULT_MAX_TRAVERSAL_DEPTH);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.filter, "graphrel=trace");
    }
}
