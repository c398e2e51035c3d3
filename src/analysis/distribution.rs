//! エピソード数・初回配信からの経過年数・ジャンル別再生時間の分布。

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::classifier::{PodcastEpisodeStats, centroids_from_podcast_stats};

const DAYS_PER_YEAR: f64 = 365.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EpisodeCountFrequency {
    pub episode_count: u32,
    /// そのエピソード数を持つポッドキャストの数
    pub frequency: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FirstReleaseMonth {
    pub year: i32,
    pub month: u32,
    /// 最も新しい初回配信月からの経過年数
    pub years_since_latest: f64,
    pub first_releases: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenreDuration {
    pub genre: String,
    pub avg_duration_ms: f64,
}

/// エピソード数ごとのポッドキャスト数。エピソードの無いポッドキャストは含めない。
#[must_use]
pub fn episode_count_distribution(stats: &[PodcastEpisodeStats]) -> Vec<EpisodeCountFrequency> {
    let mut frequencies: BTreeMap<u32, u64> = BTreeMap::new();
    for podcast in stats.iter().filter(|p| p.episode_count > 0) {
        *frequencies.entry(podcast.episode_count).or_default() += 1;
    }

    frequencies
        .into_iter()
        .map(|(episode_count, frequency)| EpisodeCountFrequency {
            episode_count,
            frequency,
        })
        .collect()
}

/// 初回配信を月単位で数え、最新の月から何年前かを添えて古い順に返す。
#[must_use]
pub fn episode_time_distribution(first_releases: &[NaiveDate]) -> Vec<FirstReleaseMonth> {
    let mut per_month: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for date in first_releases {
        // day 1 always exists
        let month_start = date.with_day(1).unwrap_or(*date);
        *per_month.entry(month_start).or_default() += 1;
    }

    let Some(latest) = per_month.keys().next_back().copied() else {
        return Vec::new();
    };

    per_month
        .into_iter()
        .map(|(month_start, first_releases)| {
            #[allow(clippy::cast_precision_loss)]
            let days = (latest - month_start).num_days() as f64;
            FirstReleaseMonth {
                year: month_start.year(),
                month: month_start.month(),
                years_since_latest: days / DAYS_PER_YEAR,
                first_releases,
            }
        })
        .collect()
}

/// ジャンルごとのエピソード平均再生時間（長い順）。`"Unknown"` は除く。
#[must_use]
pub fn duration_by_genre(stats: &[PodcastEpisodeStats]) -> Vec<GenreDuration> {
    let mut durations: Vec<GenreDuration> = centroids_from_podcast_stats(stats)
        .into_iter()
        .map(|centroid| GenreDuration {
            genre: centroid.genre,
            avg_duration_ms: centroid.duration,
        })
        .collect();
    durations.sort_by(|a, b| {
        b.avg_duration_ms
            .total_cmp(&a.avg_duration_ms)
            .then_with(|| a.genre.cmp(&b.genre))
    });
    durations
}

/// 度数付きの値の平均。度数の合計が 0 なら `None`。
#[must_use]
pub fn weighted_mean(values: impl IntoIterator<Item = (f64, u64)>) -> Option<f64> {
    let (sum, weight) = values
        .into_iter()
        .fold((0.0, 0u64), |(sum, weight), (value, count)| {
            #[allow(clippy::cast_precision_loss)]
            let count_f = count as f64;
            (sum + value * count_f, weight + count)
        });
    if weight == 0 {
        return None;
    }
    #[allow(clippy::cast_precision_loss)]
    let weight = weight as f64;
    Some(sum / weight)
}
