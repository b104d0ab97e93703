use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub global: GlobalConfig,
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

/// Run-wide settings; command-line flags take precedence
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct GlobalConfig {
    pub out_dir: Option<PathBuf>,
    pub concurrency: Option<usize>,
    pub entry_path: Option<String>,
    pub combined_output: Option<PathBuf>,
    pub schema_output: Option<PathBuf>,
    pub replace_existing: bool,
    pub skip_existing: bool,
    pub max_attempts: Option<u32>,
    pub timeout_secs: Option<u64>,
    pub user_agent: Option<String>,
    pub discord_webhook: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    pub url: String,
    /// Label used in logs only
    pub name: Option<String>,
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse config file")?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_config() {
        let config = Config::parse(
            r#"
            [global]
            out_dir = "out"
            concurrency = 4
            entry_path = "doc.kml"
            combined_output = "data.sql"
            replace_existing = true
            max_attempts = 5

            [[sources]]
            url = "http://example.org/de.kmz"
            name = "Germany"

            [[sources]]
            url = "http://example.org/ch.kmz"
            "#,
        )
        .unwrap();

        assert_eq!(config.global.out_dir, Some(PathBuf::from("out")));
        assert_eq!(config.global.concurrency, Some(4));
        assert!(config.global.replace_existing);
        assert!(!config.global.skip_existing);
        assert_eq!(config.global.max_attempts, Some(5));
        assert_eq!(config.sources.len(), 2);
        assert_eq!(config.sources[0].name.as_deref(), Some("Germany"));
        assert_eq!(config.sources[1].name, None);
    }

    #[test]
    fn test_empty_config() {
        let config = Config::parse("").unwrap();
        assert!(config.sources.is_empty());
        assert_eq!(config.global.concurrency, None);
    }

    #[test]
    fn test_invalid_config() {
        assert!(Config::parse("[global]\nconcurrency = \"many\"").is_err());
    }
}
