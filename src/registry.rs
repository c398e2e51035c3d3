//! 分析機能のレジストリ。起動時に識別子と関数を明示的に登録する。

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use thiserror::Error;

use crate::analysis::{
    YearBounds, centered_moving_average, duration_by_genre, episode_count_distribution,
    episode_time_distribution, group_by_month, group_by_month_and_year, linear_trend,
    relative_upload_frequency, upload_absolute_frequency, uploads_by_day_of_week, weighted_mean,
};
use crate::classifier::{NearestCentroidClassifier, TieBreak, centroids_from_podcast_stats};
use crate::dataset::PodcastDataset;
use crate::evaluation::{LabeledSample, evaluate};
use crate::report::{CapabilityReport, GenrePrediction};

/// 季節分解に使う周期（月）。
const SEASONAL_PERIOD_MONTHS: usize = 12;

pub const UPLOAD_ABSOLUTE_FREQUENCY: &str = "upload_absolute_frequency";
pub const UPLOAD_RELATIVE_FREQUENCY: &str = "upload_relative_frequency";
pub const UPLOAD_FREQUENCY_BY_DAY_OF_WEEK: &str = "upload_frequency_by_day_of_week";
pub const UPLOAD_FREQUENCY_BY_MONTH: &str = "upload_frequency_by_month";
pub const EPISODE_COUNT_DISTRIBUTION: &str = "episode_count_distribution";
pub const EPISODE_TIME_DISTRIBUTION: &str = "episode_time_distribution";
pub const DURATION_BY_GENRE: &str = "duration_by_genre";
pub const DURATION_GENRE_CLASSIFIER: &str = "duration_genre_classifier";

/// 分析パラメータ。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisSettings {
    pub year_bounds: YearBounds,
    pub temperature: f64,
    pub tie_break: TieBreak,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            year_bounds: YearBounds::default(),
            temperature: NearestCentroidClassifier::DEFAULT_TEMPERATURE,
            tie_break: TieBreak::default(),
        }
    }
}

/// 各機能に渡される入力。
#[derive(Debug, Clone, Copy)]
pub struct AnalysisContext<'a> {
    pub dataset: &'a PodcastDataset,
    pub settings: AnalysisSettings,
}

pub type CapabilityFn = fn(&AnalysisContext<'_>) -> Result<CapabilityReport>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("capability already registered: {0}")]
    Duplicate(String),
    #[error("unknown capability: {0}")]
    Unknown(String),
}

#[derive(Debug, Default, Clone)]
pub struct CapabilityRegistry {
    entries: BTreeMap<&'static str, CapabilityFn>,
}

impl CapabilityRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// 標準の分析機能を全て登録したレジストリ。
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        let defaults: [(&'static str, CapabilityFn); 8] = [
            (UPLOAD_ABSOLUTE_FREQUENCY, upload_absolute_frequency_report),
            (UPLOAD_RELATIVE_FREQUENCY, upload_relative_frequency_report),
            (UPLOAD_FREQUENCY_BY_DAY_OF_WEEK, upload_by_day_of_week_report),
            (UPLOAD_FREQUENCY_BY_MONTH, upload_by_month_report),
            (EPISODE_COUNT_DISTRIBUTION, episode_count_distribution_report),
            (EPISODE_TIME_DISTRIBUTION, episode_time_distribution_report),
            (DURATION_BY_GENRE, duration_by_genre_report),
            (DURATION_GENRE_CLASSIFIER, duration_genre_classifier_report),
        ];
        for (id, capability) in defaults {
            registry.entries.insert(id, capability);
        }
        registry
    }

    /// # Errors
    /// 同じ識別子が登録済みの場合は [`RegistryError::Duplicate`] を返す。
    pub fn register(&mut self, id: &'static str, capability: CapabilityFn) -> Result<(), RegistryError> {
        if self.entries.contains_key(id) {
            return Err(RegistryError::Duplicate(id.to_string()));
        }
        self.entries.insert(id, capability);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<CapabilityFn> {
        self.entries.get(id).copied()
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// 登録済みの識別子（昇順）。
    pub fn ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.keys().copied()
    }

    /// 識別子で指定した機能を実行する。
    ///
    /// # Errors
    /// 未登録の識別子の場合、または機能の実行に失敗した場合はエラーを返す。
    pub fn run(&self, id: &str, context: &AnalysisContext<'_>) -> Result<CapabilityReport> {
        let capability = self
            .get(id)
            .ok_or_else(|| RegistryError::Unknown(id.to_string()))?;
        tracing::info!(capability = id, "running capability");
        capability(context).with_context(|| format!("capability {id} failed"))
    }
}

fn upload_absolute_frequency_report(context: &AnalysisContext<'_>) -> Result<CapabilityReport> {
    Ok(CapabilityReport::UploadAbsoluteFrequency {
        days: upload_absolute_frequency(
            &context.dataset.daily_uploads,
            context.settings.year_bounds,
        ),
    })
}

fn upload_relative_frequency_report(context: &AnalysisContext<'_>) -> Result<CapabilityReport> {
    let dataset = context.dataset;
    let days = relative_upload_frequency(
        &dataset.daily_uploads,
        &dataset.first_releases,
        context.settings.year_bounds,
    );
    let monthly = group_by_month_and_year(&days);

    let series: Vec<f64> = monthly.iter().map(|m| m.relative_uploads).collect();
    let seasonal_trend = centered_moving_average(&series, SEASONAL_PERIOD_MONTHS);
    let inverse_trend: Vec<Option<f64>> = seasonal_trend
        .iter()
        .map(|v| v.filter(|x| *x != 0.0).map(|x| 1.0 / x))
        .collect();

    Ok(CapabilityReport::UploadRelativeFrequency {
        trend: linear_trend(&seasonal_trend),
        days_per_upload_trend: linear_trend(&inverse_trend),
        days,
        monthly,
    })
}

fn upload_by_day_of_week_report(context: &AnalysisContext<'_>) -> Result<CapabilityReport> {
    Ok(CapabilityReport::UploadFrequencyByDayOfWeek {
        days: uploads_by_day_of_week(&context.dataset.daily_uploads),
    })
}

fn upload_by_month_report(context: &AnalysisContext<'_>) -> Result<CapabilityReport> {
    let dataset = context.dataset;
    let days = relative_upload_frequency(
        &dataset.daily_uploads,
        &dataset.first_releases,
        context.settings.year_bounds,
    );
    Ok(CapabilityReport::UploadFrequencyByMonth {
        months: group_by_month(&days),
    })
}

fn episode_count_distribution_report(context: &AnalysisContext<'_>) -> Result<CapabilityReport> {
    let counts = episode_count_distribution(&context.dataset.podcast_stats);
    let mean_episode_count =
        weighted_mean(counts.iter().map(|c| (f64::from(c.episode_count), c.frequency)));
    Ok(CapabilityReport::EpisodeCountDistribution {
        counts,
        mean_episode_count,
    })
}

fn episode_time_distribution_report(context: &AnalysisContext<'_>) -> Result<CapabilityReport> {
    let months = episode_time_distribution(&context.dataset.first_releases);
    let mean_years_since_latest =
        weighted_mean(months.iter().map(|m| (m.years_since_latest, m.first_releases)));
    Ok(CapabilityReport::EpisodeTimeDistribution {
        months,
        mean_years_since_latest,
    })
}

fn duration_by_genre_report(context: &AnalysisContext<'_>) -> Result<CapabilityReport> {
    Ok(CapabilityReport::DurationByGenre {
        genres: duration_by_genre(&context.dataset.podcast_stats),
    })
}

fn duration_genre_classifier_report(context: &AnalysisContext<'_>) -> Result<CapabilityReport> {
    let stats = &context.dataset.podcast_stats;
    let centroids = centroids_from_podcast_stats(stats);

    let classifier = NearestCentroidClassifier::fit(centroids.clone())
        .context("failed to fit genre classifier")?
        .with_temperature(context.settings.temperature)
        .context("invalid classifier temperature")?
        .with_tie_break(context.settings.tie_break);

    let (unknown, known): (Vec<_>, Vec<_>) = stats
        .iter()
        .filter(|podcast| podcast.episode_count > 0)
        .partition(|podcast| podcast.is_unknown_genre());

    let samples: Vec<LabeledSample> = known.into_iter().map(LabeledSample::from).collect();
    let evaluation = evaluate(&classifier, &samples).context("failed to evaluate classifier")?;

    let predictions = unknown
        .into_iter()
        .map(|podcast| -> Result<GenrePrediction> {
            let classification = classifier
                .classify(podcast.avg_duration_ms, f64::from(podcast.episode_count))
                .with_context(|| format!("failed to classify podcast {}", podcast.podcast_id))?;
            Ok(GenrePrediction {
                podcast_id: podcast.podcast_id,
                classification,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CapabilityReport::DurationGenreClassifier {
        centroids,
        evaluation,
        predictions,
    })
}
