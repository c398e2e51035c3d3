//! Nearest-centroid 分類器の実装。
//! ジャンルごとの重心（平均再生時間, 平均エピソード数）を最大値で正規化し、
//! ユークリッド距離が最小の重心を予測ジャンルとする。

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// ジャンル重心テーブルの 1 行。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenreCentroid {
    pub genre: String,
    /// 平均再生時間（ミリ秒、または正規化済みの値）
    pub duration: f64,
    /// 平均エピソード数（または正規化済みの値）
    pub episodes: f64,
}

impl GenreCentroid {
    #[must_use]
    pub fn new(genre: impl Into<String>, duration: f64, episodes: f64) -> Self {
        Self {
            genre: genre.into(),
            duration,
            episodes,
        }
    }
}

/// 特徴量の軸。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureAxis {
    Duration,
    Episodes,
}

impl fmt::Display for FeatureAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Duration => f.write_str("duration"),
            Self::Episodes => f.write_str("episodes"),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ClassifierError {
    #[error("centroid table is empty")]
    EmptyTable,
    #[error("duplicate genre in centroid table: {0}")]
    DuplicateGenre(String),
    #[error("non-finite {axis} value for genre {genre}")]
    NonFiniteFeature { genre: String, axis: FeatureAxis },
    #[error("maximum {axis} is not positive, cannot normalize")]
    ZeroDivisor { axis: FeatureAxis },
    #[error("at least two centroids are required to score confidence, found {found}")]
    InsufficientCentroids { found: usize },
    #[error("query {axis} value is not finite")]
    NonFiniteQuery { axis: FeatureAxis },
    #[error("temperature must be finite and positive, got {0}")]
    InvalidTemperature(f64),
}

/// 最短距離が同値だった場合の選択規則。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TieBreak {
    /// ジャンル名が辞書順で最小のものを選ぶ
    #[default]
    Lexicographic,
    /// テーブル上で先に現れたものを選ぶ
    TableOrder,
}

impl FromStr for TieBreak {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lexicographic" => Ok(Self::Lexicographic),
            "table-order" | "table_order" => Ok(Self::TableOrder),
            other => Err(anyhow::anyhow!("unknown tie-break rule: {other}")),
        }
    }
}

/// 分類結果。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub genre: String,
    pub confidence: f64,
    pub closest_distance: f64,
    pub second_closest_distance: f64,
}

/// 最近傍重心分類器。`fit` 後は読み取り専用。
#[derive(Debug, Clone)]
pub struct NearestCentroidClassifier {
    centroids: Vec<GenreCentroid>,
    /// 正規化済み重心 (k x 2)
    normalized: Array2<f64>,
    max_duration: f64,
    max_episodes: f64,
    temperature: f64,
    tie_break: TieBreak,
}

impl NearestCentroidClassifier {
    pub const DEFAULT_TEMPERATURE: f64 = 1.0;

    /// 重心テーブルを保持し、正規化用の最大値を一度だけ計算する。
    ///
    /// # Errors
    /// テーブルが空、ジャンルが重複、値が有限でない、または最大値が 0 以下の場合に
    /// [`ClassifierError`] を返す。
    pub fn fit(centroids: Vec<GenreCentroid>) -> Result<Self, ClassifierError> {
        if centroids.is_empty() {
            return Err(ClassifierError::EmptyTable);
        }

        validate_table(&centroids)?;

        let max_duration = centroids
            .iter()
            .map(|c| c.duration)
            .fold(f64::NEG_INFINITY, f64::max);
        let max_episodes = centroids
            .iter()
            .map(|c| c.episodes)
            .fold(f64::NEG_INFINITY, f64::max);

        if max_duration <= 0.0 {
            return Err(ClassifierError::ZeroDivisor {
                axis: FeatureAxis::Duration,
            });
        }
        if max_episodes <= 0.0 {
            return Err(ClassifierError::ZeroDivisor {
                axis: FeatureAxis::Episodes,
            });
        }

        let mut normalized = Array2::<f64>::zeros((centroids.len(), 2));
        for (mut row, centroid) in normalized.axis_iter_mut(Axis(0)).zip(&centroids) {
            row[0] = centroid.duration / max_duration;
            row[1] = centroid.episodes / max_episodes;
        }

        tracing::debug!(
            genres = centroids.len(),
            max_duration,
            max_episodes,
            "nearest-centroid classifier fitted"
        );

        Ok(Self {
            centroids,
            normalized,
            max_duration,
            max_episodes,
            temperature: Self::DEFAULT_TEMPERATURE,
            tie_break: TieBreak::default(),
        })
    }

    /// 信頼度計算の温度を設定する。
    ///
    /// # Errors
    /// 温度が有限の正の値でない場合は [`ClassifierError::InvalidTemperature`] を返す。
    pub fn with_temperature(mut self, temperature: f64) -> Result<Self, ClassifierError> {
        if !temperature.is_finite() || temperature <= 0.0 {
            return Err(ClassifierError::InvalidTemperature(temperature));
        }
        self.temperature = temperature;
        Ok(self)
    }

    #[must_use]
    pub fn with_tie_break(mut self, tie_break: TieBreak) -> Self {
        self.tie_break = tie_break;
        self
    }

    /// 未知のポッドキャスト集計値を最も近いジャンルに割り当てる。
    ///
    /// # Errors
    /// 重心が 2 つ未満の場合は [`ClassifierError::InsufficientCentroids`]、
    /// 入力値が有限でない場合は [`ClassifierError::NonFiniteQuery`] を返す。
    pub fn classify(&self, duration: f64, episodes: f64) -> Result<Classification, ClassifierError> {
        if self.centroids.len() < 2 {
            return Err(ClassifierError::InsufficientCentroids {
                found: self.centroids.len(),
            });
        }
        for (axis, value) in [(FeatureAxis::Duration, duration), (FeatureAxis::Episodes, episodes)] {
            if !value.is_finite() {
                return Err(ClassifierError::NonFiniteQuery { axis });
            }
        }

        let distances = self.distances(duration, episodes);

        let mut closest = 0;
        for (i, distance) in distances.iter().enumerate().skip(1) {
            let best = distances[closest];
            let wins = match distance.total_cmp(&best) {
                std::cmp::Ordering::Less => true,
                std::cmp::Ordering::Equal => {
                    self.tie_break == TieBreak::Lexicographic
                        && self.centroids[i].genre < self.centroids[closest].genre
                }
                std::cmp::Ordering::Greater => false,
            };
            if wins {
                closest = i;
            }
        }

        let closest_distance = distances[closest];
        let second_closest_distance = distances
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != closest)
            .map(|(_, d)| *d)
            .fold(f64::INFINITY, f64::min);

        let confidence =
            calculate_confidence(closest_distance, second_closest_distance, self.temperature);

        Ok(Classification {
            genre: self.centroids[closest].genre.clone(),
            confidence,
            closest_distance,
            second_closest_distance,
        })
    }

    /// 正規化済みの点から各重心までのユークリッド距離。
    fn distances(&self, duration: f64, episodes: f64) -> Array1<f64> {
        let query = Array1::from_vec(vec![
            duration / self.max_duration,
            episodes / self.max_episodes,
        ]);
        let diff = &self.normalized - &query;
        diff.mapv(|v| v * v).sum_axis(Axis(1)).mapv(f64::sqrt)
    }

    #[must_use]
    pub fn centroids(&self) -> &[GenreCentroid] {
        &self.centroids
    }

    #[must_use]
    pub fn max_duration(&self) -> f64 {
        self.max_duration
    }

    #[must_use]
    pub fn max_episodes(&self) -> f64 {
        self.max_episodes
    }

    #[must_use]
    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    #[must_use]
    pub fn tie_break(&self) -> TieBreak {
        self.tie_break
    }
}

fn validate_table(centroids: &[GenreCentroid]) -> Result<(), ClassifierError> {
    let mut seen = HashSet::with_capacity(centroids.len());
    for centroid in centroids {
        if !seen.insert(centroid.genre.as_str()) {
            return Err(ClassifierError::DuplicateGenre(centroid.genre.clone()));
        }
        for (axis, value) in [
            (FeatureAxis::Duration, centroid.duration),
            (FeatureAxis::Episodes, centroid.episodes),
        ] {
            if !value.is_finite() {
                return Err(ClassifierError::NonFiniteFeature {
                    genre: centroid.genre.clone(),
                    axis,
                });
            }
        }
    }
    Ok(())
}

/// 最近傍と次点の距離から信頼度を計算する。
///
/// `1 / (1 + (exp(-d1/T) - exp(-d2/T)))`。d1 <= d2 のとき値は (0.5, 1] に収まり、
/// 差が開くほど小さくなる。確率としては扱えない点に注意。
#[must_use]
pub fn calculate_confidence(closest_distance: f64, second_closest_distance: f64, temperature: f64) -> f64 {
    let unnormalized =
        (-closest_distance / temperature).exp() - (-second_closest_distance / temperature).exp();
    1.0 / (1.0 + unnormalized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn two_genres() -> Vec<GenreCentroid> {
        vec![
            GenreCentroid::new("A", 0.2, 0.8),
            GenreCentroid::new("B", 0.9, 0.1),
        ]
    }

    #[test]
    fn fit_stores_max_divisors() {
        let classifier = NearestCentroidClassifier::fit(two_genres()).expect("fit");
        assert!((classifier.max_duration() - 0.9).abs() < f64::EPSILON);
        assert!((classifier.max_episodes() - 0.8).abs() < f64::EPSILON);
        assert!((classifier.temperature() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn classify_matches_confidence_formula() {
        let classifier = NearestCentroidClassifier::fit(two_genres()).expect("fit");
        let result = classifier.classify(0.25, 0.75).expect("classify");

        let (qx, qy): (f64, f64) = (0.25 / 0.9, 0.75 / 0.8);
        let d_a = ((0.2 / 0.9 - qx).powi(2) + (1.0 - qy).powi(2)).sqrt();
        let d_b = ((1.0 - qx).powi(2) + (0.1 / 0.8 - qy).powi(2)).sqrt();
        let expected = 1.0 / (1.0 + ((-d_a).exp() - (-d_b).exp()));

        assert_eq!(result.genre, "A");
        assert!((result.closest_distance - d_a).abs() < 1e-12);
        assert!((result.second_closest_distance - d_b).abs() < 1e-12);
        assert!((result.confidence - expected).abs() < 1e-12);
    }

    #[test]
    fn classify_is_deterministic() {
        let classifier = NearestCentroidClassifier::fit(two_genres()).expect("fit");
        let first = classifier.classify(0.6, 0.3).expect("classify");
        let second = classifier.classify(0.6, 0.3).expect("classify");
        assert_eq!(first, second);
    }

    #[test]
    fn fit_rejects_empty_table() {
        assert_eq!(
            NearestCentroidClassifier::fit(Vec::new()).unwrap_err(),
            ClassifierError::EmptyTable
        );
    }

    #[rstest]
    #[case(vec![GenreCentroid::new("A", 0.0, 1.0), GenreCentroid::new("B", 0.0, 2.0)], FeatureAxis::Duration)]
    #[case(vec![GenreCentroid::new("A", 1.0, 0.0), GenreCentroid::new("B", 2.0, 0.0)], FeatureAxis::Episodes)]
    fn fit_rejects_zero_divisor(#[case] table: Vec<GenreCentroid>, #[case] axis: FeatureAxis) {
        assert_eq!(
            NearestCentroidClassifier::fit(table).unwrap_err(),
            ClassifierError::ZeroDivisor { axis }
        );
    }

    #[test]
    fn fit_rejects_duplicate_genre() {
        let table = vec![
            GenreCentroid::new("A", 1.0, 1.0),
            GenreCentroid::new("A", 2.0, 2.0),
        ];
        assert_eq!(
            NearestCentroidClassifier::fit(table).unwrap_err(),
            ClassifierError::DuplicateGenre("A".to_string())
        );
    }

    #[test]
    fn fit_rejects_non_finite_values() {
        let table = vec![
            GenreCentroid::new("A", f64::NAN, 1.0),
            GenreCentroid::new("B", 2.0, 2.0),
        ];
        assert!(matches!(
            NearestCentroidClassifier::fit(table),
            Err(ClassifierError::NonFiniteFeature { .. })
        ));
    }

    #[test]
    fn classify_requires_two_centroids() {
        let classifier =
            NearestCentroidClassifier::fit(vec![GenreCentroid::new("A", 1.0, 1.0)]).expect("fit");
        assert_eq!(
            classifier.classify(1.0, 1.0).unwrap_err(),
            ClassifierError::InsufficientCentroids { found: 1 }
        );
    }

    #[rstest]
    #[case(f64::NAN, 0.5, FeatureAxis::Duration)]
    #[case(f64::INFINITY, 0.5, FeatureAxis::Duration)]
    #[case(0.5, f64::NEG_INFINITY, FeatureAxis::Episodes)]
    #[case(0.5, f64::NAN, FeatureAxis::Episodes)]
    fn classify_rejects_non_finite_query(
        #[case] duration: f64,
        #[case] episodes: f64,
        #[case] axis: FeatureAxis,
    ) {
        let classifier = NearestCentroidClassifier::fit(two_genres()).expect("fit");
        assert_eq!(
            classifier.classify(duration, episodes).unwrap_err(),
            ClassifierError::NonFiniteQuery { axis }
        );
    }

    #[rstest]
    #[case(0.0)]
    #[case(-1.0)]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    fn with_temperature_rejects_invalid(#[case] temperature: f64) {
        let classifier = NearestCentroidClassifier::fit(two_genres()).expect("fit");
        assert!(matches!(
            classifier.with_temperature(temperature),
            Err(ClassifierError::InvalidTemperature(_))
        ));
    }

    #[rstest]
    #[case(TieBreak::Lexicographic, "alpha")]
    #[case(TieBreak::TableOrder, "zulu")]
    fn equal_distances_follow_tie_break(#[case] tie_break: TieBreak, #[case] expected: &str) {
        let table = vec![
            GenreCentroid::new("zulu", 1.0, 2.0),
            GenreCentroid::new("alpha", 1.0, 2.0),
            GenreCentroid::new("far", 10.0, 10.0),
        ];
        let classifier = NearestCentroidClassifier::fit(table)
            .expect("fit")
            .with_tie_break(tie_break);
        let result = classifier.classify(1.0, 2.0).expect("classify");
        assert_eq!(result.genre, expected);
        assert!(result.second_closest_distance.abs() < f64::EPSILON);
        assert!((result.confidence - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn temperature_changes_confidence() {
        let classifier = NearestCentroidClassifier::fit(two_genres()).expect("fit");
        let default = classifier.classify(0.3, 0.6).expect("classify");
        let hot = classifier
            .clone()
            .with_temperature(10.0)
            .expect("temperature")
            .classify(0.3, 0.6)
            .expect("classify");
        assert_eq!(default.genre, hot.genre);
        assert!((default.confidence - hot.confidence).abs() > 1e-6);
    }

    #[rstest]
    #[case(0.0, 0.0, 1.0)]
    #[case(0.0, f64::INFINITY, 0.5)]
    fn calculate_confidence_edges(#[case] d1: f64, #[case] d2: f64, #[case] expected: f64) {
        assert!((calculate_confidence(d1, d2, 1.0) - expected).abs() < 1e-12);
    }

    #[test]
    fn tie_break_parses_from_str() {
        assert_eq!("lexicographic".parse::<TieBreak>().unwrap(), TieBreak::Lexicographic);
        assert_eq!("table-order".parse::<TieBreak>().unwrap(), TieBreak::TableOrder);
        assert!("random".parse::<TieBreak>().is_err());
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn confidence_is_finite_for_finite_points(
                points in proptest::collection::vec((0.01f64..100.0, 0.01f64..100.0), 2..8),
                query in (0.0f64..200.0, 0.0f64..200.0),
            ) {
                let table = points
                    .iter()
                    .enumerate()
                    .map(|(i, (d, e))| GenreCentroid::new(format!("g{i}"), *d, *e))
                    .collect();
                let classifier = NearestCentroidClassifier::fit(table).expect("fit");
                let result = classifier.classify(query.0, query.1).expect("classify");
                prop_assert!(result.confidence.is_finite());
                prop_assert!(result.closest_distance <= result.second_closest_distance);
            }
        }
    }
}
