//! 正解ジャンル付きのサンプルに対する分類器の正解率集計。

use std::collections::BTreeMap;

use serde::Serialize;

use crate::classifier::{ClassifierError, NearestCentroidClassifier, PodcastEpisodeStats};

/// 正解ラベル付きの評価サンプル。
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledSample {
    pub duration: f64,
    pub episodes: f64,
    pub genre: String,
}

impl From<&PodcastEpisodeStats> for LabeledSample {
    fn from(stats: &PodcastEpisodeStats) -> Self {
        Self {
            duration: stats.avg_duration_ms,
            episodes: f64::from(stats.episode_count),
            genre: stats.genre.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GenreScore {
    /// 正解データに含まれるそのジャンルの件数
    pub support: usize,
    pub correct: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub total: usize,
    pub correct: usize,
    pub accuracy: f64,
    pub mean_confidence: f64,
    pub per_genre: BTreeMap<String, GenreScore>,
}

/// 全サンプルを分類し、正解率と平均信頼度を返す。
///
/// # Errors
/// 分類器が分類できない場合（重心が 2 つ未満など）は [`ClassifierError`] を返す。
pub fn evaluate(
    classifier: &NearestCentroidClassifier,
    samples: &[LabeledSample],
) -> Result<EvaluationReport, ClassifierError> {
    let mut report = EvaluationReport::default();
    let mut confidence_sum = 0.0;

    for sample in samples {
        let predicted = classifier.classify(sample.duration, sample.episodes)?;
        let hit = predicted.genre == sample.genre;

        report.total += 1;
        confidence_sum += predicted.confidence;
        let score = report.per_genre.entry(sample.genre.clone()).or_default();
        score.support += 1;
        if hit {
            report.correct += 1;
            score.correct += 1;
        }
    }

    if report.total > 0 {
        #[allow(clippy::cast_precision_loss)]
        let total = report.total as f64;
        #[allow(clippy::cast_precision_loss)]
        let correct = report.correct as f64;
        report.accuracy = correct / total;
        report.mean_confidence = confidence_sum / total;
    }

    tracing::info!(
        total = report.total,
        correct = report.correct,
        accuracy = report.accuracy,
        mean_confidence = report.mean_confidence,
        "classifier evaluation finished"
    );

    Ok(report)
}
