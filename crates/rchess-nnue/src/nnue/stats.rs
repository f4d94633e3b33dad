//! NNUE 統計カウンタ（デバッグ・チューニング用）
//!
//! refresh/差分更新の比率や、差分更新で加減算した行数を測定する。
//! アキュムレータスタックごとに保持するため、探索スレッド間で共有しない。

/// アキュムレータ更新統計
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccumulatorStats {
    /// refresh_accumulator 呼び出し回数
    pub refresh_count: u64,
    /// forward_update_incremental 呼び出し回数（祖先からの差分更新）
    pub incremental_count: u64,
    /// 既に計算済みでスキップされた回数
    pub already_computed_count: u64,
    /// evaluate 呼び出し回数
    pub evaluate_count: u64,
    /// 加減算した重み行の総数（refresh 時のアクティブ特徴量を含む）
    pub rows_applied: u64,
}

impl AccumulatorStats {
    /// カウンタをリセット
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// refresh 比率（%）
    pub fn refresh_rate(&self) -> f64 {
        let total = self.refresh_count + self.incremental_count;
        if total == 0 {
            0.0
        } else {
            self.refresh_count as f64 * 100.0 / total as f64
        }
    }
}
