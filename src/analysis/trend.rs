use serde::Serialize;

/// 最小二乗法による直線 `y = slope * x + intercept`。
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinearTrend {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearTrend {
    #[must_use]
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// 系列の位置 (0, 1, 2, ...) を x として直線を当てはめる。
///
/// 欠損値は x の位置を保ったまま除外する。有効な点が 2 未満、または x が全て同じ場合は `None`。
#[must_use]
pub fn linear_trend(series: &[Option<f64>]) -> Option<LinearTrend> {
    #[allow(clippy::cast_precision_loss)]
    let points: Vec<(f64, f64)> = series
        .iter()
        .enumerate()
        .filter_map(|(i, y)| y.filter(|v| v.is_finite()).map(|v| (i as f64, v)))
        .collect();
    if points.len() < 2 {
        return None;
    }

    #[allow(clippy::cast_precision_loss)]
    let n = points.len() as f64;
    let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / n;

    let (covariance, variance) = points.iter().fold((0.0, 0.0), |(cov, var), (x, y)| {
        let dx = x - mean_x;
        (cov + dx * (y - mean_y), var + dx * dx)
    });
    if variance == 0.0 {
        return None;
    }

    let slope = covariance / variance;
    Some(LinearTrend {
        slope,
        intercept: mean_y - slope * mean_x,
    })
}

/// 中心化移動平均。
///
/// 偶数周期では両端に 0.5 の重みを付けた `period + 1` 点の 2xMA、奇数周期では
/// `period` 点の単純平均を取る。窓が系列からはみ出す位置は `None`。
#[must_use]
pub fn centered_moving_average(series: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut result = vec![None; series.len()];
    if period == 0 {
        return result;
    }

    let half = period / 2;
    if series.len() < 2 * half + 1 {
        return result;
    }

    #[allow(clippy::cast_precision_loss)]
    let divisor = period as f64;
    for (i, slot) in result
        .iter_mut()
        .enumerate()
        .take(series.len() - half)
        .skip(half)
    {
        let window = &series[i - half..=i + half];
        let value = if period % 2 == 0 {
            let inner: f64 = window[1..window.len() - 1].iter().sum();
            (0.5 * window[0] + inner + 0.5 * window[window.len() - 1]) / divisor
        } else {
            window.iter().sum::<f64>() / divisor
        };
        *slot = Some(value);
    }
    result
}
