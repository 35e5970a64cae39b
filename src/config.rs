use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use crate::core::recommender::RecommendLimits;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub recommend: RecommendSettings,
    #[serde(default)]
    pub catalog: CatalogSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
    pub idle_timeout_secs: Option<u64>,
}

/// Score-rank table cache
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_score_rank_capacity")]
    pub score_rank_capacity: u64,
    #[serde(default = "default_score_rank_ttl")]
    pub score_rank_ttl_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            score_rank_capacity: default_score_rank_capacity(),
            score_rank_ttl_secs: default_score_rank_ttl(),
        }
    }
}

fn default_score_rank_capacity() -> u64 { 256 }
fn default_score_rank_ttl() -> u64 { 86_400 }

#[derive(Debug, Clone, Deserialize)]
pub struct RecommendSettings {
    #[serde(default = "default_page_size")]
    pub default_page_size: i64,
    #[serde(default = "default_max_page_size")]
    pub max_page_size: i64,
    #[serde(default = "default_recommend_timeout")]
    pub recommend_timeout_secs: u64,
    #[serde(default = "default_detail_timeout")]
    pub detail_timeout_secs: u64,
    /// Year described by the current admission columns
    #[serde(default = "default_data_year")]
    pub data_year: i32,
}

impl Default for RecommendSettings {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            recommend_timeout_secs: default_recommend_timeout(),
            detail_timeout_secs: default_detail_timeout(),
            data_year: default_data_year(),
        }
    }
}

impl RecommendSettings {
    pub fn limits(&self) -> RecommendLimits {
        RecommendLimits {
            default_page_size: self.default_page_size.max(1),
            max_page_size: self.max_page_size.max(1),
            recommend_timeout: Duration::from_secs(self.recommend_timeout_secs),
            detail_timeout: Duration::from_secs(self.detail_timeout_secs),
        }
    }
}

fn default_page_size() -> i64 { 20 }
fn default_max_page_size() -> i64 { 100 }
fn default_recommend_timeout() -> u64 { 30 }
fn default_detail_timeout() -> u64 { 15 }
fn default_data_year() -> i32 { 2024 }

/// Table names, distribution files and enumeration tables
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogSettings {
    #[serde(default = "default_admission_table")]
    pub admission_table: String,
    #[serde(default = "default_profile_table")]
    pub profile_table: String,
    #[serde(default = "default_distribution_dir")]
    pub distribution_dir: String,
    #[serde(default = "default_ownership_values")]
    pub ownership_values: Vec<String>,
    /// JSON map of province name to its cities
    #[serde(default = "default_province_city_file")]
    pub province_city_file: String,
    /// Empty means the built-in province list
    #[serde(default)]
    pub provinces: Vec<ProvinceSettings>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProvinceSettings {
    pub name: String,
    pub stored: Option<String>,
    pub pinyin: String,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            admission_table: default_admission_table(),
            profile_table: default_profile_table(),
            distribution_dir: default_distribution_dir(),
            ownership_values: default_ownership_values(),
            province_city_file: default_province_city_file(),
            provinces: Vec::new(),
        }
    }
}

fn default_admission_table() -> String { "admission_records".to_string() }
fn default_profile_table() -> String { "user_profiles".to_string() }
fn default_distribution_dir() -> String { "data/score_rank".to_string() }
fn default_ownership_values() -> Vec<String> { vec!["公办".to_string(), "民办".to_string()] }
fn default_province_city_file() -> String { "static/province_city.json".to_string() }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with GAOKAO_)
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., GAOKAO__SERVER__PORT -> server.port
            .add_source(environment())
            .build()?;

        with_database_url(settings)?.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(environment())
            .build()?;

        with_database_url(settings)?.try_deserialize()
    }
}

fn environment() -> Environment {
    Environment::with_prefix("GAOKAO")
        .prefix_separator("__")
        .separator("__")
        .list_separator(",")
        .with_list_parse_key("catalog.ownership_values")
        .try_parsing(true)
}

/// `DATABASE_URL` wins over every other source of `database.url`
fn with_database_url(settings: Config) -> Result<Config, ConfigError> {
    match std::env::var("DATABASE_URL") {
        Ok(url) => Config::builder()
            .add_source(settings)
            .set_override("database.url", url)?
            .build(),
        Err(_) => Ok(settings),
    }
}
