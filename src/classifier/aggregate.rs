//! ポッドキャスト単位の集計値からジャンル重心テーブルを作る。

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::centroid::GenreCentroid;

/// ジャンル未設定のポッドキャストに付くラベル。重心計算からは除外する。
pub const UNKNOWN_GENRE: &str = "Unknown";

/// ポッドキャスト 1 件分のエピソード集計。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PodcastEpisodeStats {
    pub podcast_id: i64,
    pub genre: String,
    pub episode_count: u32,
    pub avg_duration_ms: f64,
}

impl PodcastEpisodeStats {
    #[must_use]
    pub fn is_unknown_genre(&self) -> bool {
        self.genre == UNKNOWN_GENRE
    }
}

#[derive(Default)]
struct GenreAccumulator {
    podcasts: u32,
    episodes: u64,
    weighted_duration: f64,
}

/// ジャンルごとに重心を計算する。
///
/// エピソード数は単純平均、再生時間はエピソード数で重み付けした平均を使う。
/// 結果はジャンル名順。
#[must_use]
pub fn centroids_from_podcast_stats(stats: &[PodcastEpisodeStats]) -> Vec<GenreCentroid> {
    let mut by_genre: BTreeMap<&str, GenreAccumulator> = BTreeMap::new();
    let mut skipped = 0usize;

    for podcast in stats {
        if podcast.is_unknown_genre() || podcast.episode_count == 0 {
            skipped += 1;
            continue;
        }
        let entry = by_genre.entry(podcast.genre.as_str()).or_default();
        entry.podcasts += 1;
        entry.episodes += u64::from(podcast.episode_count);
        entry.weighted_duration += f64::from(podcast.episode_count) * podcast.avg_duration_ms;
    }

    tracing::debug!(
        podcasts = stats.len(),
        skipped,
        genres = by_genre.len(),
        "aggregated genre centroids"
    );

    by_genre
        .into_iter()
        .map(|(genre, acc)| {
            #[allow(clippy::cast_precision_loss)]
            let episodes = acc.episodes as f64;
            GenreCentroid::new(
                genre,
                acc.weighted_duration / episodes,
                episodes / f64::from(acc.podcasts),
            )
        })
        .collect()
}
