//! アキュムレータとアキュムレータスタック
//!
//! 探索の手順に合わせて局面ごとのエントリを積み、各エントリに
//! 視点ごとのアキュムレータ（FeatureTransformer の隠れ層入力）を持つ。
//! 差分更新の起点探索（`find_usable_accumulator`）もここで行う。

use super::aligned::AlignedBox;
use super::spec::EncodingKind;
use super::stats::AccumulatorStats;
use crate::position::{BoardState, DirtyPiece};
use crate::types::Color;

/// 初期確保するエントリ数（探索深さ + 余裕）
const INITIAL_STACK_CAPACITY: usize = 128;

// =============================================================================
// Accumulator
// =============================================================================

/// 視点ごとの計算状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccumulatorState {
    /// 未計算（値は不定）
    #[default]
    Empty,
    /// 計算済み
    Computed,
}

/// アキュムレータ
///
/// `accumulation[perspective]` は片側次元分の f32 列。
/// 状態が `Computed` の視点だけ値が有効。
///
/// 状態を進められるのは FeatureTransformer だけで、クレート外からは変更できない。
///
/// ```compile_fail
/// use rchess_nnue::nnue::Accumulator;
/// use rchess_nnue::types::Color;
///
/// let mut acc = Accumulator::new(8);
/// acc.set_computed(Color::White);
/// ```
pub struct Accumulator {
    accumulation: [AlignedBox<f32>; Color::NUM],
    state: [AccumulatorState; Color::NUM],
}

impl Accumulator {
    /// 新規作成
    pub fn new(half_dimensions: usize) -> Self {
        Self {
            accumulation: [
                AlignedBox::new_zeroed(half_dimensions),
                AlignedBox::new_zeroed(half_dimensions),
            ],
            state: [AccumulatorState::Empty; Color::NUM],
        }
    }

    /// 指定視点の累積値を取得
    #[inline]
    pub fn get(&self, perspective: Color) -> &[f32] {
        &self.accumulation[perspective.index()]
    }

    /// 指定視点の累積値を取得（可変）
    #[inline]
    pub(crate) fn get_mut(&mut self, perspective: Color) -> &mut [f32] {
        &mut self.accumulation[perspective.index()]
    }

    #[inline]
    pub fn state(&self, perspective: Color) -> AccumulatorState {
        self.state[perspective.index()]
    }

    #[inline]
    pub fn is_computed(&self, perspective: Color) -> bool {
        self.state(perspective) == AccumulatorState::Computed
    }

    #[inline]
    pub(crate) fn set_computed(&mut self, perspective: Color) {
        self.state[perspective.index()] = AccumulatorState::Computed;
    }

    /// 両視点を未計算に戻す
    #[inline]
    pub(crate) fn invalidate(&mut self) {
        self.state = [AccumulatorState::Empty; Color::NUM];
    }
}

// =============================================================================
// StackEntry
// =============================================================================

/// スタックエントリ
pub struct StackEntry {
    /// この局面の盤面スナップショット
    pub board: BoardState,
    /// 直前局面からの変更駒
    pub dirty_piece: DirtyPiece,
    /// アキュムレータ
    pub accumulator: Accumulator,
    /// 直前のエントリインデックス（ルートは None）
    pub previous: Option<usize>,
}

impl StackEntry {
    pub fn new(half_dimensions: usize) -> Self {
        Self {
            board: BoardState::default(),
            dirty_piece: DirtyPiece::default(),
            accumulator: Accumulator::new(half_dimensions),
            previous: None,
        }
    }
}

// =============================================================================
// AccumulatorStack
// =============================================================================

/// アキュムレータスタック
///
/// エントリは pop 後も解放せずに再利用する。
pub struct AccumulatorStack {
    entries: Vec<StackEntry>,
    current: usize,
    half_dimensions: usize,
    stats: AccumulatorStats,
}

impl AccumulatorStack {
    /// 新規作成（ルートは空の盤面・未計算）
    pub fn new(half_dimensions: usize) -> Self {
        let mut entries = Vec::with_capacity(INITIAL_STACK_CAPACITY);
        entries.push(StackEntry::new(half_dimensions));
        Self {
            entries,
            current: 0,
            half_dimensions,
            stats: AccumulatorStats::default(),
        }
    }

    /// 片側次元
    #[inline]
    pub fn half_dimensions(&self) -> usize {
        self.half_dimensions
    }

    /// 現在のエントリを取得
    #[inline]
    pub fn current(&self) -> &StackEntry {
        &self.entries[self.current]
    }

    /// 現在のエントリを取得（可変）
    #[inline]
    pub(crate) fn current_mut(&mut self) -> &mut StackEntry {
        &mut self.entries[self.current]
    }

    /// 現在のインデックスを取得
    #[inline]
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// 指定インデックスのエントリを取得
    #[inline]
    pub fn entry_at(&self, index: usize) -> &StackEntry {
        &self.entries[index]
    }

    /// 指定インデックスのエントリを取得（可変）
    #[inline]
    pub(crate) fn entry_at_mut(&mut self, index: usize) -> &mut StackEntry {
        &mut self.entries[index]
    }

    /// 統計
    #[inline]
    pub fn stats(&self) -> &AccumulatorStats {
        &self.stats
    }

    /// 統計（可変）
    #[inline]
    pub(crate) fn stats_mut(&mut self) -> &mut AccumulatorStats {
        &mut self.stats
    }

    /// スタックをリセットし、ルート局面を設定
    pub fn reset(&mut self, root: BoardState) {
        self.current = 0;
        let entry = &mut self.entries[0];
        entry.board = root;
        entry.dirty_piece = DirtyPiece::default();
        entry.previous = None;
        entry.accumulator.invalidate();
    }

    /// 子局面をプッシュ（両視点とも未計算）
    pub fn push(&mut self, board: BoardState, dirty_piece: DirtyPiece) {
        let prev = self.current;
        self.current += 1;
        if self.current == self.entries.len() {
            self.entries.push(StackEntry::new(self.half_dimensions));
        }
        let entry = &mut self.entries[self.current];
        entry.board = board;
        entry.dirty_piece = dirty_piece;
        entry.previous = Some(prev);
        entry.accumulator.invalidate();
    }

    /// スタックをポップ
    ///
    /// # Panics
    /// ルートでの pop
    pub fn pop(&mut self) {
        assert!(self.current > 0, "AccumulatorStack::pop called at root");
        self.current -= 1;
    }

    /// 祖先を辿って差分更新の起点にできるアキュムレータを探す
    ///
    /// 現局面から遡りながら、各エントリで
    /// 1. その視点の玉が動いていたら打ち切り
    /// 2. 予算（駒数 - 2）から `dirty_num + 1` を引き、負になったら打ち切り
    /// 3. 直前のエントリが計算済みならそのインデックスを返す
    ///
    /// ルートまで計算済みの祖先がなければ None（全計算が必要）。
    pub fn find_usable_accumulator(
        &self,
        encoding: EncodingKind,
        perspective: Color,
    ) -> Option<usize> {
        let mut gain = self.current().board.piece_count as i64 - 2;
        let mut idx = self.current;

        loop {
            let entry = &self.entries[idx];
            if encoding.needs_refresh(&entry.dirty_piece, perspective) {
                return None;
            }
            gain -= entry.dirty_piece.dirty_num as i64 + 1;
            if gain < 0 {
                return None;
            }
            let prev = entry.previous?;
            if self.entries[prev].accumulator.is_computed(perspective) {
                return Some(prev);
            }
            idx = prev;
        }
    }

    /// 現局面から `source` へ向かう経路上で、`source` の直後のエントリ
    pub fn next_on_path(&self, source: usize) -> Option<usize> {
        let mut idx = self.current;
        loop {
            let prev = self.entries[idx].previous?;
            if prev == source {
                return Some(idx);
            }
            idx = prev;
        }
    }

    /// 2つのエントリを同時に取得（clone不要）
    ///
    /// `split_at_mut` で `from` への不変参照と `to` への可変参照を返す。
    #[inline]
    pub(crate) fn split_pair(&mut self, from: usize, to: usize) -> (&StackEntry, &mut StackEntry) {
        debug_assert!(from < to, "from ({from}) must be < to ({to})");
        let (left, right) = self.entries.split_at_mut(to);
        (&left[from], &mut right[0])
    }
}
