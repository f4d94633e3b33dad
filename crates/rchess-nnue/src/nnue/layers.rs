//! ネットワーク層の実装
//!
//! - `AffineTransform`: 全結合アフィン変換層（入力×重み + バイアス）
//! - `ClippedReLU`: 下限・上限でクランプする活性化層
//! - `Stage`: パイプラインの1段（列挙型による静的ディスパッチ）

use super::aligned::AlignedBox;
use super::constants::padded_input;
use super::error::{NnueError, NnueResult};
use super::io::{read_f32_into, write_f32_slice};
use super::simd;
use super::spec::{ClipRange, StagePlan};
use std::io::{self, Read, Write};

// =============================================================================
// AffineTransform
// =============================================================================

/// アフィン変換層
///
/// 重みは出力ごとに `padded_input` 要素の行として格納する。
/// パディング列は常に 0 で、計算では実入力次元分だけを使う。
#[derive(Debug)]
pub struct AffineTransform {
    input_dim: usize,
    output_dim: usize,
    padded_input: usize,
    biases: AlignedBox<f32>,
    weights: AlignedBox<f32>,
}

impl AffineTransform {
    /// ゼロ初期化
    pub fn new_zeroed(input_dim: usize, output_dim: usize) -> Self {
        let padded = padded_input(input_dim);
        Self {
            input_dim,
            output_dim,
            padded_input: padded,
            biases: AlignedBox::new_zeroed(output_dim),
            weights: AlignedBox::new_zeroed(output_dim * padded),
        }
    }

    /// ストリームから読み込み（バイアス、重みの順）
    ///
    /// `stage` はエラー報告用の段番号。
    pub fn read<R: Read>(
        reader: &mut R,
        input_dim: usize,
        output_dim: usize,
        stage: usize,
    ) -> NnueResult<Self> {
        let mut layer = Self::new_zeroed(input_dim, output_dim);
        read_f32_into(reader, &mut layer.biases, "affine biases")?;
        read_f32_into(reader, &mut layer.weights, "affine weights")?;

        // パディング列が 0 であることを確認
        for row in 0..output_dim {
            let start = row * layer.padded_input;
            let padding = &layer.weights[start + input_dim..start + layer.padded_input];
            if let Some(offset) = padding.iter().position(|&w| w != 0.0) {
                return Err(NnueError::NonZeroPadding {
                    stage,
                    row,
                    column: input_dim + offset,
                });
            }
        }

        log::debug!(
            "AffineTransform[{stage}]: {input_dim} -> {output_dim} (padded {})",
            layer.padded_input
        );
        Ok(layer)
    }

    /// ストリームへ書き出し
    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        write_f32_slice(writer, &self.biases)?;
        write_f32_slice(writer, &self.weights)
    }

    #[inline]
    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    #[inline]
    pub fn output_dim(&self) -> usize {
        self.output_dim
    }

    #[inline]
    pub fn padded_input(&self) -> usize {
        self.padded_input
    }

    pub fn biases(&self) -> &[f32] {
        &self.biases
    }

    pub fn biases_mut(&mut self) -> &mut [f32] {
        &mut self.biases
    }

    /// 出力 `row` の重み（実入力次元分）
    #[inline]
    pub fn row(&self, row: usize) -> &[f32] {
        let start = row * self.padded_input;
        &self.weights[start..start + self.input_dim]
    }

    /// 出力 `row` の重み（実入力次元分、可変）
    #[inline]
    pub fn row_mut(&mut self, row: usize) -> &mut [f32] {
        let start = row * self.padded_input;
        &mut self.weights[start..start + self.input_dim]
    }

    /// 順伝播
    ///
    /// `output[i] = bias[i] + Σ_j weight[i][j] * input[j]`
    pub fn propagate(&self, input: &[f32], output: &mut [f32]) {
        debug_assert!(input.len() >= self.input_dim);
        debug_assert!(output.len() >= self.output_dim);

        let input = &input[..self.input_dim];
        for (i, out) in output[..self.output_dim].iter_mut().enumerate() {
            *out = self.biases[i] + simd::dot(self.row(i), input);
        }
    }
}

// =============================================================================
// ClippedReLU
// =============================================================================

/// ClippedReLU 層
///
/// `y = clamp(x, lower, upper)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClippedReLU {
    dim: usize,
    clip: ClipRange,
}

impl ClippedReLU {
    pub fn new(dim: usize, clip: ClipRange) -> Self {
        Self { dim, clip }
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// 順伝播
    #[inline]
    pub fn propagate(&self, input: &[f32], output: &mut [f32]) {
        simd::clamp_into(&input[..self.dim], &mut output[..self.dim], self.clip.lower, self.clip.upper);
    }
}

// =============================================================================
// Stage
// =============================================================================

/// パイプラインの1段
#[derive(Debug)]
pub enum Stage {
    Affine(AffineTransform),
    ClippedReLU(ClippedReLU),
}

impl Stage {
    #[inline]
    pub fn input_dim(&self) -> usize {
        match self {
            Self::Affine(layer) => layer.input_dim(),
            Self::ClippedReLU(layer) => layer.dim(),
        }
    }

    #[inline]
    pub fn output_dim(&self) -> usize {
        match self {
            Self::Affine(layer) => layer.output_dim(),
            Self::ClippedReLU(layer) => layer.dim(),
        }
    }

    /// 構成上の段
    pub fn plan(&self) -> StagePlan {
        match self {
            Self::Affine(layer) => StagePlan::Affine {
                input: layer.input_dim(),
                output: layer.output_dim(),
            },
            Self::ClippedReLU(layer) => StagePlan::ClippedReLU { dim: layer.dim() },
        }
    }

    /// 前段のハッシュ値からこの段のハッシュ値を計算
    #[inline]
    pub fn hash_value(&self, prev: u32) -> u32 {
        self.plan().hash_value(prev)
    }

    /// 順伝播
    #[inline]
    pub fn propagate(&self, input: &[f32], output: &mut [f32]) {
        match self {
            Self::Affine(layer) => layer.propagate(input, output),
            Self::ClippedReLU(layer) => layer.propagate(input, output),
        }
    }

    /// パラメータを書き出す（ClippedReLU はパラメータなし）
    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        match self {
            Self::Affine(layer) => layer.write(writer),
            Self::ClippedReLU(_) => Ok(()),
        }
    }
}
