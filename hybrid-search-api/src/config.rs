use std::{path::PathBuf, str::FromStr};

use serde::Deserialize;
use serde_with::serde_as;
use strum::{Display, EnumString};

use crate::domain::search::{FusionMode, SearchConfig};

#[derive(Deserialize, Clone, Debug)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub embedding: EmbeddingSettings,
    pub query_engine: QueryEngineSettings,
    pub search: SearchSettings,
}

#[serde_as]
#[derive(Deserialize, Clone, Debug)]
pub struct ApplicationSettings {
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub port: u16,
    pub host: String,
    /// Include `details` and `debug_info` in 5xx error bodies.
    pub expose_error_details: bool,
    /// Empty allows any origin.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

#[serde_as]
#[derive(Deserialize, Clone)]
pub struct EmbeddingSettings {
    pub api_url: String,
    /// Empty falls back to `OPENAI_API_KEY`.
    #[serde(default)]
    pub api_key: String,
    pub model: String,
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub dimensions: usize,
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub request_timeout_secs: u64,
}

#[serde_as]
#[derive(Deserialize, Clone)]
pub struct QueryEngineSettings {
    /// Empty falls back to `SUPABASE_URL`.
    #[serde(default)]
    pub url: String,
    /// Empty falls back to `SUPABASE_SERVICE_ROLE_KEY`.
    #[serde(default)]
    pub service_role_key: String,
    pub hybrid_function: String,
    pub candidates_function: String,
    pub fusion: FusionMode,
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub candidate_count: u32,
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub request_timeout_secs: u64,
}

#[serde_as]
#[derive(Deserialize, Clone, Debug)]
pub struct SearchSettings {
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub default_match_count: u32,
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub max_match_count: u32,
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub strict_filter_values: bool,
}

// Keys are kept out of debug output.
impl std::fmt::Debug for EmbeddingSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingSettings")
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("dimensions", &self.dimensions)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for QueryEngineSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryEngineSettings")
            .field("url", &self.url)
            .field("hybrid_function", &self.hybrid_function)
            .field("candidates_function", &self.candidates_function)
            .field("fusion", &self.fusion)
            .field("candidate_count", &self.candidate_count)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish_non_exhaustive()
    }
}

impl Settings {
    pub fn search_config(&self) -> SearchConfig {
        SearchConfig {
            default_match_count: self.search.default_match_count,
            max_match_count: self.search.max_match_count,
            strict_filter_values: self.search.strict_filter_values,
            fusion: self.query_engine.fusion,
        }
    }
}

pub fn read_config() -> Result<Settings, config::ConfigError> {
    let config_directory = match std::env::var("APP_CONFIG_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(_) => std::env::current_dir()
            .map_err(|e| {
                config::ConfigError::Message(format!(
                    "Failed to determine the current directory: {}",
                    e
                ))
            })?
            .join("config"),
    };

    let environment = Environment::from_str(
        std::env::var("APP_ENVIRONMENT")
            .unwrap_or_else(|_| "local".into())
            .as_str(),
    )
    .map_err(|e| config::ConfigError::Message(format!("Failed to parse APP_ENVIRONMENT: {}", e)))?;
    let environment_filename = format!("{}.yaml", environment);

    let settings = config::Config::builder()
        .add_source(config::File::from(config_directory.join("base.yaml")))
        .add_source(config::File::from(
            config_directory.join(environment_filename),
        ))
        .add_source(
            config::Environment::with_prefix("HYBRID_SEARCH")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}

#[derive(Display, Debug, EnumString, PartialEq)]
pub enum Environment {
    #[strum(ascii_case_insensitive, serialize = "local")]
    Local,
    #[strum(ascii_case_insensitive, serialize = "production")]
    Production,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(environment: &str) -> Settings {
        let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config");
        config::Config::builder()
            .add_source(config::File::from(dir.join("base.yaml")))
            .add_source(config::File::from(dir.join(format!("{}.yaml", environment))))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn environment_names_are_case_insensitive() {
        assert_eq!(Environment::from_str("LOCAL").unwrap(), Environment::Local);
        assert_eq!(
            Environment::from_str("production").unwrap(),
            Environment::Production
        );
        assert!(Environment::from_str("staging").is_err());
    }

    #[test]
    fn shipped_config_files_deserialize() {
        let local = load("local");
        assert!(local.application.expose_error_details);
        assert_eq!(local.search.default_match_count, 10);
        assert_eq!(local.embedding.dimensions, 1536);
        assert_eq!(local.query_engine.hybrid_function, "search_documents_hybrid");
        assert_eq!(local.query_engine.fusion, FusionMode::Engine);

        let production = load("production");
        assert!(!production.application.expose_error_details);
        assert_eq!(production.application.host, "0.0.0.0");
    }

    #[test]
    fn search_config_follows_settings() {
        let mut settings = load("local");
        settings.search.max_match_count = 7;
        settings.search.strict_filter_values = true;
        settings.query_engine.fusion = FusionMode::InCore;

        let config = settings.search_config();
        assert_eq!(config.max_match_count, 7);
        assert!(config.strict_filter_values);
        assert_eq!(config.fusion, FusionMode::InCore);
    }

    #[test]
    fn debug_output_hides_keys() {
        let mut settings = load("local");
        settings.embedding.api_key = "sk-secret".into();
        settings.query_engine.service_role_key = "service-secret".into();

        let debug = format!("{:?}", settings);
        assert!(!debug.contains("sk-secret"));
        assert!(!debug.contains("service-secret"));
    }
}
