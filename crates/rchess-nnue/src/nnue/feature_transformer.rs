//! FeatureTransformer - 入力特徴量を変換する最初の層
//!
//! アクティブな特徴量インデックスに対応する重み行をバイアスに加算し、
//! 視点ごとに片側 `half_dimensions` 次元のアキュムレータを作る。
//! 出力は手番側・相手側の順に連結し、`[0, ceiling]` にクランプする。

use super::accumulator::AccumulatorStack;
use super::aligned::AlignedBox;
use super::error::NnueResult;
use super::io::{read_f32_into, write_f32_slice};
use super::simd;
use super::spec::EncodingKind;
use crate::types::Color;
use std::io::{self, Read, Write};

/// FeatureTransformerのパラメータ
#[derive(Debug)]
pub struct FeatureTransformer {
    encoding: EncodingKind,
    half_dimensions: usize,
    /// バイアス [half_dimensions]
    biases: AlignedBox<f32>,
    /// 重み [input_dimensions][half_dimensions]
    weights: AlignedBox<f32>,
}

impl FeatureTransformer {
    /// ゼロ初期化
    pub fn new_zeroed(encoding: EncodingKind, half_dimensions: usize) -> Self {
        Self {
            encoding,
            half_dimensions,
            biases: AlignedBox::new_zeroed(half_dimensions),
            weights: AlignedBox::new_zeroed(encoding.dimensions() * half_dimensions),
        }
    }

    /// ストリームから読み込み（バイアス、重みの順）
    pub fn read<R: Read>(
        reader: &mut R,
        encoding: EncodingKind,
        half_dimensions: usize,
    ) -> NnueResult<Self> {
        let mut ft = Self::new_zeroed(encoding, half_dimensions);
        read_f32_into(reader, &mut ft.biases, "transformer biases")?;
        log::debug!("FeatureTransformer: read {} biases", ft.biases.len());
        read_f32_into(reader, &mut ft.weights, "transformer weights")?;
        log::debug!(
            "FeatureTransformer: read {} weights ({} x {})",
            ft.weights.len(),
            encoding.dimensions(),
            half_dimensions
        );
        if ft.weights.iter().all(|&w| w == 0.0) {
            log::warn!("FeatureTransformer: all weights are zero");
        }
        Ok(ft)
    }

    /// ストリームへ書き出し
    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        write_f32_slice(writer, &self.biases)?;
        write_f32_slice(writer, &self.weights)
    }

    #[inline]
    pub fn encoding(&self) -> EncodingKind {
        self.encoding
    }

    #[inline]
    pub fn half_dimensions(&self) -> usize {
        self.half_dimensions
    }

    /// 出力次元（両視点）
    #[inline]
    pub fn output_dimensions(&self) -> usize {
        self.half_dimensions * 2
    }

    /// ハッシュ値
    pub fn hash_value(&self) -> u32 {
        self.encoding.hash_value() ^ self.output_dimensions() as u32
    }

    pub fn biases(&self) -> &[f32] {
        &self.biases
    }

    pub fn biases_mut(&mut self) -> &mut [f32] {
        &mut self.biases
    }

    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    pub fn weights_mut(&mut self) -> &mut [f32] {
        &mut self.weights
    }

    /// 特徴量 `index` の重み行
    #[inline]
    pub fn row(&self, index: usize) -> &[f32] {
        let offset = index * self.half_dimensions;
        &self.weights[offset..offset + self.half_dimensions]
    }

    /// 差分計算を使わずに現局面のアキュムレータを計算
    pub fn refresh_accumulator(&self, stack: &mut AccumulatorStack, perspective: Color) {
        let entry = stack.current_mut();
        let active = self.encoding.collect_active_indices(&entry.board, perspective);
        let accumulation = entry.accumulator.get_mut(perspective);
        accumulation.copy_from_slice(&self.biases);
        for index in active.iter() {
            simd::add_row(accumulation, self.row(index));
        }
        entry.accumulator.set_computed(perspective);

        let stats = stack.stats_mut();
        stats.refresh_count += 1;
        stats.rows_applied += active.len() as u64;
    }

    /// 現局面のアキュムレータを計算済みにする
    ///
    /// 計算済みなら何もしない。差分更新の起点が見つかれば差分更新、
    /// なければ全計算。
    pub fn update_accumulator(&self, stack: &mut AccumulatorStack, perspective: Color) {
        if stack.current().accumulator.is_computed(perspective) {
            stack.stats_mut().already_computed_count += 1;
            return;
        }
        match stack.find_usable_accumulator(self.encoding, perspective) {
            Some(source) => self.forward_update_incremental(stack, source, perspective),
            None => self.refresh_accumulator(stack, perspective),
        }
    }

    /// 計算済みの祖先 `source` から現局面まで差分更新
    ///
    /// 1. `source` の直後のエントリ `next` を `source` との差分で計算
    /// 2. `next` が現局面でなければ、`next` と現局面の盤面差分を一括で適用
    ///
    /// 間のエントリは未計算のまま残る。
    ///
    /// # Panics
    /// `source` が現局面の祖先でない場合、または `perspective` 側が未計算の場合。
    pub fn forward_update_incremental(
        &self,
        stack: &mut AccumulatorStack,
        source: usize,
        perspective: Color,
    ) {
        let current = stack.current_index();
        let next = stack
            .next_on_path(source)
            .expect("source must be an ancestor of the current entry");
        assert!(
            stack.entry_at(source).accumulator.is_computed(perspective),
            "source accumulator must be computed"
        );

        let mut rows = self.apply_changes(stack, source, next, perspective);
        if next != current {
            rows += self.apply_changes(stack, next, current, perspective);
        }

        let stats = stack.stats_mut();
        stats.incremental_count += 1;
        stats.rows_applied += rows as u64;
    }

    /// `from` のアキュムレータに盤面差分を適用して `to` に格納
    fn apply_changes(
        &self,
        stack: &mut AccumulatorStack,
        from: usize,
        to: usize,
        perspective: Color,
    ) -> usize {
        let (source, target) = stack.split_pair(from, to);
        let (removed, added) =
            self.encoding.collect_changed_indices(&source.board, &target.board, perspective);

        let accumulation = target.accumulator.get_mut(perspective);
        accumulation.copy_from_slice(source.accumulator.get(perspective));
        for index in removed.iter() {
            simd::sub_row(accumulation, self.row(index));
        }
        for index in added.iter() {
            simd::add_row(accumulation, self.row(index));
        }
        target.accumulator.set_computed(perspective);

        removed.len() + added.len()
    }

    /// 変換後特徴量を出力
    ///
    /// `output` は `2 * half_dimensions` 要素。前半が手番側、後半が相手側。
    pub fn transform(&self, stack: &mut AccumulatorStack, ceiling: f32, output: &mut [f32]) {
        debug_assert_eq!(output.len(), self.output_dimensions());
        debug_assert_eq!(stack.half_dimensions(), self.half_dimensions);

        let side_to_move = stack.current().board.side_to_move;
        let half = self.half_dimensions;
        for (i, perspective) in [side_to_move, side_to_move.opponent()].into_iter().enumerate() {
            self.update_accumulator(stack, perspective);
            let accumulation = stack.current().accumulator.get(perspective);
            simd::clamp_into(accumulation, &mut output[i * half..(i + 1) * half], 0.0, ceiling);
        }
    }
}
