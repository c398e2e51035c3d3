//! ソート済みタイムスタンプ列に対する位置検索インデックス。
//! 「ある日までに初回配信を済ませたポッドキャスト数」を対数時間で求める。

use std::sync::atomic::{AtomicU64, Ordering};

/// 昇順ソート済みの整数列を保持し、値以下の要素数を返すインデックス。
///
/// 構築後は不変。クエリは結果に影響しない呼び出し回数カウンタのみ更新するため、
/// 同一インスタンスを複数スレッドから共有して読み出せる。
#[derive(Debug, Default)]
pub struct PositionIndex {
    values: Vec<i64>,
    invocations: AtomicU64,
}

impl PositionIndex {
    /// 値の列を受け取り、昇順にソートしてインデックスを構築する。
    ///
    /// 空の列からも構築でき、その場合どのクエリに対しても位置 0 を返す。
    #[must_use]
    pub fn build(values: impl Into<Vec<i64>>) -> Self {
        let mut values = values.into();
        values.sort_unstable();
        Self {
            values,
            invocations: AtomicU64::new(0),
        }
    }

    /// `query` と一致する要素のインデックス、なければ `query` 未満で最大の要素のインデックスを返す。
    ///
    /// 全要素が `query` より大きい場合は -1 を返す。重複値に一致した場合は
    /// 一致する位置のうち最後のものを返すため、戻り値 + 1 は常に `query` 以下の要素数になる。
    #[must_use]
    pub fn index_of_value_or_one_below(&self, query: i64) -> isize {
        self.invocations.fetch_add(1, Ordering::Relaxed);

        let mut start: isize = 0;
        let mut end: isize = isize::try_from(self.values.len()).unwrap_or(isize::MAX) - 1;

        while start <= end {
            let mid = start + (end - start) / 2;
            #[allow(clippy::cast_sign_loss)]
            let value = self.values[mid as usize];
            if value > query {
                end = mid - 1;
            } else {
                // 一致しても右側に同値が続く可能性がある
                start = mid + 1;
            }
        }

        end
    }

    /// `query` 以下の要素数を返す。
    #[must_use]
    pub fn position_of_value_or_one_below(&self, query: i64) -> usize {
        // index >= -1
        usize::try_from(self.index_of_value_or_one_below(query) + 1).unwrap_or(0)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// ソート済みの値を返す。
    #[must_use]
    pub fn as_slice(&self) -> &[i64] {
        &self.values
    }

    /// これまでに実行されたインデックス検索の回数。
    #[must_use]
    pub fn invocations(&self) -> u64 {
        self.invocations.load(Ordering::Relaxed)
    }
}

impl FromIterator<i64> for PositionIndex {
    fn from_iter<T: IntoIterator<Item = i64>>(iter: T) -> Self {
        Self::build(iter.into_iter().collect::<Vec<_>>())
    }
}
