//! 再生時間とエピソード数の 2 次元特徴によるジャンル最近傍重心分類。

pub mod aggregate;
pub mod centroid;

pub use aggregate::{PodcastEpisodeStats, UNKNOWN_GENRE, centroids_from_podcast_stats};
pub use centroid::{
    Classification, ClassifierError, FeatureAxis, GenreCentroid, NearestCentroidClassifier, TieBreak,
    calculate_confidence,
};
