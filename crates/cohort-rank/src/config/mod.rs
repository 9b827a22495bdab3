use crate::pipeline::{CombinationDefinition, SubjectCode};
use std::env;
use std::fmt;

/// Records scored between cooperative yields.
pub const DEFAULT_BATCH_SIZE: usize = 5000;

/// Distinguishes runtime behavior for different stages of deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the ranking tool.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub pipeline: PipelineSettings,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let ansi = env::var("APP_LOG_ANSI")
            .map(|value| matches!(value.trim(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let mut pipeline = PipelineSettings::default();
        if let Ok(raw) = env::var("RANK_BATCH_SIZE") {
            pipeline.batch_size = raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|size| *size > 0)
                .ok_or(ConfigError::InvalidBatchSize)?;
        }
        if let Ok(raw) = env::var("RANK_COMBINATIONS") {
            pipeline.combinations = parse_combinations(&raw)?;
        }

        Ok(Self {
            environment,
            pipeline,
            telemetry: TelemetryConfig { log_level, ansi },
        })
    }
}

/// Vocabulary and batching controls for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub batch_size: usize,
    pub combinations: Vec<CombinationDefinition>,
    pub subject_codes: Vec<SubjectCode>,
    pub rebasing_keywords: Vec<String>,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        let combinations = ["物化生", "物化地", "物生地", "史政地"]
            .into_iter()
            .filter_map(CombinationDefinition::from_label)
            .collect();

        let subject_codes = [
            ('物', &["物理", "physics"]),
            ('化', &["化学", "chemistry"]),
            ('生', &["生物", "biology"]),
            ('史', &["历史", "history"]),
            ('地', &["地理", "geography"]),
            ('政', &["政治", "politics"]),
        ]
        .into_iter()
        .map(|(code, keywords)| SubjectCode::new(code, keywords.iter().copied()))
        .collect();

        let rebasing_keywords = [
            "化学", "生物", "政治", "地理", "chemistry", "biology", "politics", "geography",
        ]
        .into_iter()
        .map(str::to_string)
        .collect();

        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            combinations,
            subject_codes,
            rebasing_keywords,
        }
    }
}

fn parse_combinations(raw: &str) -> Result<Vec<CombinationDefinition>, ConfigError> {
    raw.split([',', '，'])
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .map(|label| {
            CombinationDefinition::from_label(label)
                .ok_or_else(|| ConfigError::InvalidCombination(label.to_string()))
        })
        .collect()
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub ansi: bool,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidBatchSize,
    InvalidCombination(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidBatchSize => {
                write!(f, "RANK_BATCH_SIZE must be a positive integer")
            }
            ConfigError::InvalidCombination(label) => write!(
                f,
                "RANK_COMBINATIONS entry '{}' needs at least two distinct subject codes",
                label
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        env::remove_var("APP_ENV");
        env::remove_var("APP_LOG_LEVEL");
        env::remove_var("APP_LOG_ANSI");
        env::remove_var("RANK_BATCH_SIZE");
        env::remove_var("RANK_COMBINATIONS");
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.telemetry.log_level, "info");
        assert!(!config.telemetry.ansi);
        assert_eq!(config.pipeline.batch_size, DEFAULT_BATCH_SIZE);
        let labels: Vec<_> = config
            .pipeline
            .combinations
            .iter()
            .map(|definition| definition.label.as_str())
            .collect();
        assert_eq!(labels, vec!["物化生", "物化地", "物生地", "史政地"]);
    }

    #[test]
    fn rejects_zero_batch_size() {
        let _lock = env_guard().lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        reset_env();
        env::set_var("RANK_BATCH_SIZE", "0");
        let error = AppConfig::load().expect_err("zero batch size rejected");
        assert!(matches!(error, ConfigError::InvalidBatchSize));
        reset_env();
    }

    #[test]
    fn combinations_can_be_overridden() {
        let _lock = env_guard().lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        reset_env();
        env::set_var("RANK_COMBINATIONS", "物+化+生, 史政地");
        env::set_var("APP_ENV", "ci");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.environment, AppEnvironment::Test);
        assert_eq!(config.pipeline.combinations.len(), 2);
        assert_eq!(config.pipeline.combinations[0].canonical_key(), "化生物");
        reset_env();
    }

    #[test]
    fn single_code_combination_is_rejected() {
        let _lock = env_guard().lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        reset_env();
        env::set_var("RANK_COMBINATIONS", "物");
        let error = AppConfig::load().expect_err("single code rejected");
        assert!(matches!(error, ConfigError::InvalidCombination(label) if label == "物"));
        reset_env();
    }
}
