//! 日別の配信数を、その日までに配信を開始していたポッドキャスト数で割った
//! 相対配信頻度と、その月別・曜日別の集計。

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::util::PositionIndex;
use crate::util::time::{day_epoch, weekday_index};

const WEEKDAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// 日別の配信数（日付精度のエピソードのみ）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyUploads {
    pub date: NaiveDate,
    pub uploads: u64,
}

/// 集計対象とする年の範囲（両端を含む）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearBounds {
    pub lower: i32,
    pub upper: i32,
}

impl YearBounds {
    #[must_use]
    pub fn new(lower: i32, upper: i32) -> Self {
        Self { lower, upper }
    }

    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        (self.lower..=self.upper).contains(&date.year())
    }
}

impl Default for YearBounds {
    fn default() -> Self {
        Self::new(2013, 2023)
    }
}

/// 期間内の日別配信数（絶対値）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AbsoluteUploads {
    pub date: NaiveDate,
    pub year: i32,
    pub uploads: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelativeUploads {
    pub date: NaiveDate,
    pub year: i32,
    pub uploads: u64,
    /// その日までに初回配信を済ませたポッドキャスト数
    pub podcast_count: usize,
    pub relative_uploads: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyUploads {
    pub year: i32,
    pub month: u32,
    pub relative_uploads: f64,
    pub days: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthOfYearUploads {
    pub month: u32,
    pub relative_uploads: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayOfWeekUploads {
    /// 日曜 = 0
    pub day: u32,
    pub name: String,
    pub uploads: u64,
}

/// 日別の相対配信頻度（ポッドキャスト 1 件・1 日あたりの配信数）を計算する。
///
/// アクティブなポッドキャストが 0 件の日は除外する。
#[must_use]
pub fn relative_upload_frequency(
    daily: &[DailyUploads],
    first_releases: &[NaiveDate],
    bounds: YearBounds,
) -> Vec<RelativeUploads> {
    let index: PositionIndex = first_releases.iter().copied().map(day_epoch).collect();

    let mut rows: Vec<RelativeUploads> = Vec::with_capacity(daily.len());
    for day in daily.iter().filter(|d| bounds.contains(d.date)) {
        let podcast_count = index.position_of_value_or_one_below(day_epoch(day.date));
        if podcast_count == 0 {
            tracing::warn!(
                date = %day.date,
                uploads = day.uploads,
                "no podcast had released an episode by this date, skipping"
            );
            continue;
        }
        #[allow(clippy::cast_precision_loss)]
        let relative_uploads = day.uploads as f64 / podcast_count as f64;
        rows.push(RelativeUploads {
            date: day.date,
            year: day.date.year(),
            uploads: day.uploads,
            podcast_count,
            relative_uploads,
        });
    }
    rows.sort_by_key(|row| row.date);

    tracing::debug!(
        days = rows.len(),
        first_releases = index.len(),
        lookups = index.invocations(),
        "computed relative upload frequency"
    );

    rows
}

/// 年の範囲内の日別配信数を日付順に返す。同じ日付の行は合算する。
#[must_use]
pub fn upload_absolute_frequency(daily: &[DailyUploads], bounds: YearBounds) -> Vec<AbsoluteUploads> {
    let mut per_day: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for day in daily.iter().filter(|d| bounds.contains(d.date)) {
        *per_day.entry(day.date).or_default() += day.uploads;
    }

    per_day
        .into_iter()
        .map(|(date, uploads)| AbsoluteUploads {
            date,
            year: date.year(),
            uploads,
        })
        .collect()
}

/// 年・月ごとの相対配信頻度の平均。年、月の昇順。
#[must_use]
pub fn group_by_month_and_year(rows: &[RelativeUploads]) -> Vec<MonthlyUploads> {
    let mut groups: BTreeMap<(i32, u32), (f64, usize)> = BTreeMap::new();
    for row in rows {
        let entry = groups.entry((row.year, row.date.month())).or_default();
        entry.0 += row.relative_uploads;
        entry.1 += 1;
    }

    groups
        .into_iter()
        .map(|((year, month), (sum, days))| MonthlyUploads {
            year,
            month,
            relative_uploads: mean(sum, days),
            days,
        })
        .collect()
}

/// 年をまたいだ月ごとの相対配信頻度の平均。
#[must_use]
pub fn group_by_month(rows: &[RelativeUploads]) -> Vec<MonthOfYearUploads> {
    let mut groups: BTreeMap<u32, (f64, usize)> = BTreeMap::new();
    for row in rows {
        let entry = groups.entry(row.date.month()).or_default();
        entry.0 += row.relative_uploads;
        entry.1 += 1;
    }

    groups
        .into_iter()
        .map(|(month, (sum, days))| MonthOfYearUploads {
            month,
            relative_uploads: mean(sum, days),
        })
        .collect()
}

/// 曜日ごとの配信数の合計。日曜始まりで 7 件を必ず返す。
#[must_use]
pub fn uploads_by_day_of_week(daily: &[DailyUploads]) -> Vec<DayOfWeekUploads> {
    let mut totals = [0u64; 7];
    for day in daily {
        totals[weekday_index(day.date) as usize] += day.uploads;
    }

    WEEKDAY_NAMES
        .iter()
        .zip(totals)
        .zip(0u32..)
        .map(|((name, uploads), day)| DayOfWeekUploads {
            day,
            name: (*name).to_string(),
            uploads,
        })
        .collect()
}

fn mean(sum: f64, count: usize) -> f64 {
    if count == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let count = count as f64;
    sum / count
}
