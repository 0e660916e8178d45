use clap::Parser;
use std::path::PathBuf;

/// Default object-key prefix holding the raw CSV exports.
pub const DEFAULT_PREFIX: &str = "dengue_data_raw/";

/// Default object key of the aggregate document (also the cache object).
pub const DEFAULT_OUTPUT_KEY: &str = "dengue-tratado.json";

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Normalize dengue CSV exports into a single aggregate JSON document
#[derive(Parser, Debug, Clone)]
#[command(
    name = "dengue-etl",
    about = "Normalize dengue CSV exports into a single aggregate JSON document",
    version
)]
pub struct Settings {
    /// Directory acting as the object bucket
    #[arg(long, env = "DENGUE_BUCKET", default_value = "dengue-csv-data")]
    pub bucket: PathBuf,

    /// Key prefix of the raw CSV exports
    #[arg(long, default_value = DEFAULT_PREFIX)]
    pub prefix: String,

    /// Key of the aggregate JSON document
    #[arg(long, default_value = DEFAULT_OUTPUT_KEY)]
    pub output_key: String,

    /// Rebuild even when the aggregate document already exists
    #[arg(long)]
    pub refresh: bool,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

impl Settings {
    /// Parse process arguments and apply the `--debug` override.
    pub fn load() -> Self {
        Self::resolve(Settings::parse())
    }

    /// Same as [`Settings::load`] with an explicit argument list.
    pub fn load_from_args<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::resolve(Settings::parse_from(args))
    }

    fn resolve(mut settings: Settings) -> Settings {
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }
}

// ── PipelineConfig ─────────────────────────────────────────────────────────────

/// Storage-independent knobs of a single run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Prefix listed for source files.
    pub prefix: String,
    /// Key the aggregate is read from (cache) and written to.
    pub output_key: String,
    /// When `false`, an existing aggregate document is ignored.
    pub use_cache: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            output_key: DEFAULT_OUTPUT_KEY.to_string(),
            use_cache: true,
        }
    }
}

impl From<&Settings> for PipelineConfig {
    fn from(s: &Settings) -> Self {
        PipelineConfig {
            prefix: s.prefix.clone(),
            output_key: s.output_key.clone(),
            use_cache: !s.refresh,
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_default_values() {
        let settings = Settings::parse_from(["dengue-etl"]);

        assert_eq!(settings.prefix, "dengue_data_raw/");
        assert_eq!(settings.output_key, "dengue-tratado.json");
        assert!(!settings.refresh);
        assert_eq!(settings.log_level, "INFO");
        assert!(settings.log_file.is_none());
        assert!(!settings.debug);
    }

    #[test]
    fn test_settings_cli_bucket_and_prefix() {
        let settings = Settings::parse_from([
            "dengue-etl",
            "--bucket",
            "/data/bucket",
            "--prefix",
            "raw/",
            "--output-key",
            "out.json",
        ]);
        assert_eq!(settings.bucket, PathBuf::from("/data/bucket"));
        assert_eq!(settings.prefix, "raw/");
        assert_eq!(settings.output_key, "out.json");
    }

    #[test]
    fn test_settings_debug_overrides_log_level() {
        let settings = Settings::load_from_args(["dengue-etl", "--debug", "--log-level", "ERROR"]);
        assert_eq!(settings.log_level, "DEBUG");
    }

    #[test]
    fn test_settings_rejects_unknown_log_level() {
        let result = Settings::try_parse_from(["dengue-etl", "--log-level", "TRACE"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_pipeline_config_from_settings() {
        let settings = Settings::parse_from(["dengue-etl", "--refresh", "--prefix", "x/"]);
        let config = PipelineConfig::from(&settings);
        assert_eq!(config.prefix, "x/");
        assert_eq!(config.output_key, DEFAULT_OUTPUT_KEY);
        assert!(!config.use_cache);
    }

    #[test]
    fn test_pipeline_config_default_uses_cache() {
        let config = PipelineConfig::default();
        assert!(config.use_cache);
        assert_eq!(config.prefix, DEFAULT_PREFIX);
    }
}
