//! 配信頻度と各種分布の分析。集計済みの表データを受け取り、派生値を返す。

pub mod distribution;
pub mod trend;
pub mod upload;

pub use distribution::{
    EpisodeCountFrequency, FirstReleaseMonth, GenreDuration, duration_by_genre,
    episode_count_distribution, episode_time_distribution, weighted_mean,
};
pub use trend::{LinearTrend, centered_moving_average, linear_trend};
pub use upload::{
    AbsoluteUploads, DailyUploads, DayOfWeekUploads, MonthOfYearUploads, MonthlyUploads, RelativeUploads,
    YearBounds, group_by_month, group_by_month_and_year, relative_upload_frequency,
    upload_absolute_frequency, uploads_by_day_of_week,
};
