//! 分析結果の出力。描画は外部の可視化ツールに任せ、ここでは JSON を書き出す。

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::analysis::{
    AbsoluteUploads, DayOfWeekUploads, EpisodeCountFrequency, FirstReleaseMonth, GenreDuration,
    LinearTrend, MonthOfYearUploads, MonthlyUploads, RelativeUploads,
};
use crate::classifier::{Classification, GenreCentroid};
use crate::evaluation::EvaluationReport;

/// ジャンル未設定ポッドキャストへの予測。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenrePrediction {
    pub podcast_id: i64,
    #[serde(flatten)]
    pub classification: Classification,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CapabilityReport {
    UploadAbsoluteFrequency {
        days: Vec<AbsoluteUploads>,
    },
    UploadRelativeFrequency {
        days: Vec<RelativeUploads>,
        monthly: Vec<MonthlyUploads>,
        /// 季節成分を除いた月次トレンドの回帰直線（配信数/日）
        trend: Option<LinearTrend>,
        /// 同トレンドの逆数（日/配信）の回帰直線
        days_per_upload_trend: Option<LinearTrend>,
    },
    UploadFrequencyByDayOfWeek {
        days: Vec<DayOfWeekUploads>,
    },
    UploadFrequencyByMonth {
        months: Vec<MonthOfYearUploads>,
    },
    EpisodeCountDistribution {
        counts: Vec<EpisodeCountFrequency>,
        mean_episode_count: Option<f64>,
    },
    EpisodeTimeDistribution {
        months: Vec<FirstReleaseMonth>,
        mean_years_since_latest: Option<f64>,
    },
    DurationByGenre {
        genres: Vec<GenreDuration>,
    },
    DurationGenreClassifier {
        centroids: Vec<GenreCentroid>,
        evaluation: EvaluationReport,
        predictions: Vec<GenrePrediction>,
    },
}

/// 出力ファイル名 `podcast_<capability>.json`。
#[must_use]
pub fn report_file_name(capability: &str) -> String {
    format!("podcast_{capability}.json")
}

/// レポートを `output_dir` 配下に書き出し、そのパスを返す。
///
/// # Errors
/// ディレクトリ作成、ファイル作成、シリアライズのいずれかに失敗した場合はエラーを返す。
pub fn write_report(
    output_dir: &Path,
    capability: &str,
    report: &CapabilityReport,
) -> Result<PathBuf> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create output dir {}", output_dir.display()))?;

    let path = output_dir.join(report_file_name(capability));
    let file =
        File::create(&path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, report)
        .with_context(|| format!("failed to serialize report {capability}"))?;
    writer
        .flush()
        .with_context(|| format!("failed to flush {}", path.display()))?;

    tracing::info!(capability, path = %path.display(), "report written");
    Ok(path)
}
