use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use url::Url;

use crate::ai::{DEFAULT_API_BASE_URL, DEFAULT_MODEL};
use crate::error::{AppError, Result};
use crate::services::default_topics;

pub const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

/// One year; longer periods would overflow timer deadlines.
pub const MAX_INTERVAL_HOURS: u64 = 24 * 366;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: String,

    pub claude_api_key: Option<String>,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// What the storefront sells; fed into every prompt.
    #[serde(default = "default_store_niche")]
    pub store_niche: String,

    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    #[serde(default)]
    pub generation: GenerationConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub daily_target_min: u32,
    pub daily_target_max: u32,
    pub interval_hours: u64,
    pub run_on_start: bool,
    pub scheduled_delay_secs: u64,
    pub manual_delay_secs: u64,
    pub manual_default_count: u32,
    pub max_manual_posts: u32,
    pub max_keywords_per_post: usize,
    pub manual_counts_toward_daily_target: bool,
    pub topics: Vec<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            daily_target_min: 10,
            daily_target_max: 12,
            interval_hours: 24,
            run_on_start: true,
            scheduled_delay_secs: 2,
            manual_delay_secs: 1,
            manual_default_count: 5,
            max_manual_posts: 20,
            max_keywords_per_post: 3,
            manual_counts_toward_daily_target: false,
            topics: default_topics(),
        }
    }
}

impl GenerationConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_hours.saturating_mul(3600))
    }

    pub fn scheduled_delay(&self) -> Duration {
        Duration::from_secs(self.scheduled_delay_secs)
    }

    pub fn manual_delay(&self) -> Duration {
        Duration::from_secs(self.manual_delay_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.topics.iter().all(|t| t.trim().is_empty()) {
            return Err(AppError::Config("generation.topics must not be empty".to_string()));
        }
        if self.daily_target_min == 0 || self.daily_target_min > self.daily_target_max {
            return Err(AppError::Config(format!(
                "generation daily target range {}..={} is invalid",
                self.daily_target_min, self.daily_target_max
            )));
        }
        if self.interval_hours == 0 || self.interval_hours > MAX_INTERVAL_HOURS {
            return Err(AppError::Config(format!(
                "generation.interval_hours must be between 1 and {}, got {}",
                MAX_INTERVAL_HOURS, self.interval_hours
            )));
        }
        if self.max_manual_posts == 0
            || self.manual_default_count == 0
            || self.manual_default_count > self.max_manual_posts
        {
            return Err(AppError::Config(format!(
                "generation.manual_default_count must be between 1 and {}",
                self.max_manual_posts
            )));
        }
        Ok(())
    }
}

fn default_db_path() -> String {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("trendpress");
    std::fs::create_dir_all(&data_dir).ok();
    data_dir.join("content.db").to_string_lossy().to_string()
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_store_niche() -> String {
    "home goods, decor and lifestyle products".to_string()
}

fn default_listen_addr() -> String {
    "127.0.0.1:8080".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            claude_api_key: None,
            api_base_url: default_api_base_url(),
            model: default_model(),
            store_niche: default_store_niche(),
            listen_addr: default_listen_addr(),
            generation: GenerationConfig::default(),
        }
    }
}

impl Config {
    /// Loads the config at `path` (or the default location), writing defaults
    /// if the file does not exist yet.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::config_path);

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str::<Config>(&content)?
        } else {
            let config = Config::default();
            config.save_to(&config_path)?;
            config
        };

        if config.claude_api_key.is_none() {
            config.claude_api_key = std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty());
        }

        config.validate()?;
        Ok(config)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("trendpress")
            .join("config.toml")
    }

    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.api_base_url)
            .map_err(|e| AppError::Config(format!("invalid api_base_url '{}': {}", self.api_base_url, e)))?;
        if self.store_niche.trim().is_empty() {
            return Err(AppError::Config("store_niche must not be empty".to_string()));
        }
        self.generation.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load(Some(&path)).unwrap();

        assert!(path.exists());
        assert_eq!(config.generation, GenerationConfig::default());
        assert_eq!(config.generation.topics.len(), 12);
        assert_eq!(config.generation.scheduled_delay(), Duration::from_secs(2));
        assert_eq!(config.generation.manual_delay(), Duration::from_secs(1));
        assert_eq!(config.generation.interval(), Duration::from_secs(24 * 3600));
    }

    #[test]
    fn partial_generation_table_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
db_path = "/tmp/content.db"
claude_api_key = "sk-test"

[generation]
daily_target_min = 12
daily_target_max = 12
manual_counts_toward_daily_target = true
"#,
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();

        assert_eq!(config.db_path, "/tmp/content.db");
        assert_eq!(config.claude_api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.generation.daily_target_min, 12);
        assert!(config.generation.manual_counts_toward_daily_target);
        assert_eq!(config.generation.max_keywords_per_post, 3);
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let mut generation = GenerationConfig {
            daily_target_min: 13,
            ..GenerationConfig::default()
        };
        assert!(matches!(generation.validate(), Err(AppError::Config(_))));

        generation.daily_target_min = 10;
        generation.topics = vec!["  ".to_string()];
        assert!(generation.validate().is_err());

        generation.topics = default_topics();
        for hours in [0, MAX_INTERVAL_HOURS + 1, u64::MAX] {
            generation.interval_hours = hours;
            assert!(
                matches!(generation.validate(), Err(AppError::Config(ref m)) if m.contains("interval_hours")),
                "interval {} accepted",
                hours
            );
        }
        generation.interval_hours = MAX_INTERVAL_HOURS;
        assert!(generation.validate().is_ok());
        assert_eq!(
            GenerationConfig {
                interval_hours: u64::MAX,
                ..GenerationConfig::default()
            }
            .interval(),
            Duration::from_secs(u64::MAX)
        );

        let config = Config {
            api_base_url: "not a url".to_string(),
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(AppError::Config(ref m)) if m.contains("api_base_url")));
    }
}
