use std::{env, path::PathBuf};

use thiserror::Error;

use crate::analysis::YearBounds;
use crate::classifier::{NearestCentroidClassifier, TieBreak};
use crate::registry::AnalysisSettings;

#[cfg(test)]
use once_cell::sync::Lazy;
#[cfg(test)]
pub(crate) static ENV_MUTEX: Lazy<std::sync::Mutex<()>> = Lazy::new(|| std::sync::Mutex::new(()));

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    dataset_path: PathBuf,
    output_dir: PathBuf,
    capabilities: Vec<String>,
    year_lower_bound: i32,
    year_upper_bound: i32,
    classifier_temperature: f64,
    tie_break: TieBreak,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable: {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {source}")]
    Invalid {
        name: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl Config {
    /// 環境変数から分析の設定値を読み込み、検証する。
    ///
    /// # Errors
    /// `PODCAST_ANALYTICS_DATASET` が未設定、もしくは各種値のパース・検証に失敗した場合は
    /// [`ConfigError`] を返す。
    pub fn from_env() -> Result<Self, ConfigError> {
        let dataset_path = PathBuf::from(env_var("PODCAST_ANALYTICS_DATASET")?);
        let output_dir = PathBuf::from(
            env::var("PODCAST_ANALYTICS_OUTPUT_DIR")
                .unwrap_or_else(|_| "./rendered-results".to_string()),
        );
        // empty means every registered capability
        let capabilities = parse_csv("PODCAST_ANALYTICS_CAPABILITIES", "");

        let year_lower_bound = parse_i32("PODCAST_ANALYTICS_YEAR_LOWER_BOUND", 2013)?;
        let year_upper_bound = parse_i32("PODCAST_ANALYTICS_YEAR_UPPER_BOUND", 2023)?;
        if year_lower_bound > year_upper_bound {
            return Err(ConfigError::Invalid {
                name: "PODCAST_ANALYTICS_YEAR_LOWER_BOUND",
                source: anyhow::anyhow!(
                    "lower bound {year_lower_bound} is after upper bound {year_upper_bound}"
                ),
            });
        }

        let classifier_temperature = parse_f64(
            "PODCAST_ANALYTICS_CLASSIFIER_TEMPERATURE",
            NearestCentroidClassifier::DEFAULT_TEMPERATURE,
        )?;
        if !classifier_temperature.is_finite() || classifier_temperature <= 0.0 {
            return Err(ConfigError::Invalid {
                name: "PODCAST_ANALYTICS_CLASSIFIER_TEMPERATURE",
                source: anyhow::anyhow!("must be finite and greater than zero"),
            });
        }

        let tie_break_raw =
            env::var("PODCAST_ANALYTICS_TIE_BREAK").unwrap_or_else(|_| "lexicographic".to_string());
        let tie_break = tie_break_raw
            .parse::<TieBreak>()
            .map_err(|source| ConfigError::Invalid {
                name: "PODCAST_ANALYTICS_TIE_BREAK",
                source,
            })?;

        Ok(Self {
            dataset_path,
            output_dir,
            capabilities,
            year_lower_bound,
            year_upper_bound,
            classifier_temperature,
            tie_break,
        })
    }

    #[must_use]
    pub fn dataset_path(&self) -> &PathBuf {
        &self.dataset_path
    }

    #[must_use]
    pub fn output_dir(&self) -> &PathBuf {
        &self.output_dir
    }

    /// 実行対象の機能。空なら登録済みの全機能。
    #[must_use]
    pub fn capabilities(&self) -> &[String] {
        &self.capabilities
    }

    #[must_use]
    pub fn year_bounds(&self) -> YearBounds {
        YearBounds::new(self.year_lower_bound, self.year_upper_bound)
    }

    #[must_use]
    pub fn classifier_temperature(&self) -> f64 {
        self.classifier_temperature
    }

    #[must_use]
    pub fn tie_break(&self) -> TieBreak {
        self.tie_break
    }

    #[must_use]
    pub fn analysis_settings(&self) -> AnalysisSettings {
        AnalysisSettings {
            year_bounds: self.year_bounds(),
            temperature: self.classifier_temperature,
            tie_break: self.tie_break,
        }
    }
}

fn env_var(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::Missing(name))
}

fn parse_i32(name: &'static str, default: i32) -> Result<i32, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.trim().parse::<i32>().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })
}

fn parse_f64(name: &'static str, default: f64) -> Result<f64, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.trim().parse::<f64>().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })
}

fn parse_csv(name: &'static str, default: &str) -> Vec<String> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
