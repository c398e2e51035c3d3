//! ランキング DB から書き出された集計済みデータセット。

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::analysis::DailyUploads;
use crate::classifier::PodcastEpisodeStats;

/// 分析の入力となる表データ一式。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PodcastDataset {
    /// ポッドキャストごとの初回配信日
    #[serde(default)]
    pub first_releases: Vec<NaiveDate>,
    /// 日別の配信数
    #[serde(default)]
    pub daily_uploads: Vec<DailyUploads>,
    /// ポッドキャストごとのエピソード集計
    #[serde(default)]
    pub podcast_stats: Vec<PodcastEpisodeStats>,
}

impl PodcastDataset {
    /// JSON ファイルからデータセットを読み込む。
    ///
    /// # Errors
    /// ファイルの読み込み、または JSON のパースに失敗した場合はエラーを返す。
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read dataset {}", path.display()))?;
        let dataset: Self = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse dataset {}", path.display()))?;

        tracing::info!(
            path = %path.display(),
            first_releases = dataset.first_releases.len(),
            daily_uploads = dataset.daily_uploads.len(),
            podcasts = dataset.podcast_stats.len(),
            "dataset loaded"
        );

        Ok(dataset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_tables_default_to_empty() {
        let dataset: PodcastDataset =
            serde_json::from_str(r#"{"first_releases": ["2021-03-04"]}"#).expect("parse");
        assert_eq!(
            dataset.first_releases,
            vec![NaiveDate::from_ymd_opt(2021, 3, 4).expect("date")]
        );
        assert!(dataset.daily_uploads.is_empty());
        assert!(dataset.podcast_stats.is_empty());
    }

    #[test]
    fn load_reports_missing_file() {
        let error = PodcastDataset::load("/nonexistent/rankings.json").expect_err("should fail");
        assert!(error.to_string().contains("failed to read dataset"));
    }
}
