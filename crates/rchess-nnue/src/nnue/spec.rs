//! NNUE アーキテクチャ仕様の型定義
//!
//! エンコーディング・各層の次元・活性化の上下限を保持し、
//! パラメータファイルの fingerprint を計算する。

use super::constants::{
    AFFINE_TRANSFORM_HASH, CLIPPED_RELU_HASH, COMPRESSED_MOBILITY_HASH, DEFAULT_HALF_DIMENSIONS,
    DEFAULT_HIDDEN, INPUT_SLICE_HASH, KERNEL_LANES, MOBILITY_HASH, NUM_SLICES, SQUARE_NB,
};
use super::error::{NnueError, NnueResult};
use serde::{Deserialize, Serialize};

/// 特徴量エンコーディング
///
/// 入力特徴量の空間解像度を表す。どちらも既定ではなく、構成で明示的に選ぶ。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncodingKind {
    /// 全解像度（64升 × 12スライス = 768次元）
    Mobility,
    /// 4×4 グリッド（16セル × 12スライス = 192次元）
    CompressedMobility,
}

impl EncodingKind {
    /// 文字列表現
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mobility => "mobility",
            Self::CompressedMobility => "compressed_mobility",
        }
    }

    /// 1スライスあたりの領域数
    pub const fn slice_width(&self) -> usize {
        match self {
            Self::Mobility => SQUARE_NB,
            Self::CompressedMobility => 16,
        }
    }

    /// 入力特徴量の次元数
    pub const fn dimensions(&self) -> usize {
        self.slice_width() * NUM_SLICES
    }

    /// ハッシュ値
    pub const fn hash_value(&self) -> u32 {
        match self {
            Self::Mobility => MOBILITY_HASH,
            Self::CompressedMobility => COMPRESSED_MOBILITY_HASH,
        }
    }
}

impl std::fmt::Display for EncodingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for EncodingKind {
    type Err = NnueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "mobility" => Ok(Self::Mobility),
            "compressed_mobility" | "compressed" => Ok(Self::CompressedMobility),
            other => Err(NnueError::InvalidArchitecture(format!("unknown encoding: {other}"))),
        }
    }
}

/// 活性化の下限・上限
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClipRange {
    pub lower: f32,
    pub upper: f32,
}

impl Default for ClipRange {
    fn default() -> Self {
        Self {
            lower: 0.0,
            upper: 1.0,
        }
    }
}

/// パイプライン上の1段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StagePlan {
    Affine { input: usize, output: usize },
    ClippedReLU { dim: usize },
}

impl StagePlan {
    pub fn output_dim(&self) -> usize {
        match *self {
            Self::Affine { output, .. } => output,
            Self::ClippedReLU { dim } => dim,
        }
    }

    /// 前段のハッシュ値からこの段のハッシュ値を計算
    pub fn hash_value(&self, prev: u32) -> u32 {
        match *self {
            Self::Affine { output, .. } => {
                let mut hash = AFFINE_TRANSFORM_HASH.wrapping_add(output as u32);
                hash ^= prev >> 1;
                hash ^= prev << 31;
                hash
            }
            Self::ClippedReLU { .. } => CLIPPED_RELU_HASH.wrapping_add(prev),
        }
    }
}

/// アーキテクチャ仕様
///
/// FeatureTransformer の片側次元・隠れ層サイズ・エンコーディングを保持する。
/// パイプラインは `2*half -> hidden[0] -> CReLU -> ... -> hidden[n-1] -> CReLU -> 1`。
///
/// エンコーディングに既定値はない。構成ファイルでも必ず指定する。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchitectureSpec {
    /// 特徴量エンコーディング
    pub encoding: EncodingKind,
    /// FeatureTransformer 片側の出力次元
    #[serde(default = "default_half_dimensions")]
    pub half_dimensions: usize,
    /// 隠れ層の出力次元
    #[serde(default = "default_hidden")]
    pub hidden: Vec<usize>,
    /// 活性化の上下限
    #[serde(default)]
    pub clip: ClipRange,
}

fn default_half_dimensions() -> usize {
    DEFAULT_HALF_DIMENSIONS
}

fn default_hidden() -> Vec<usize> {
    DEFAULT_HIDDEN.to_vec()
}

impl ArchitectureSpec {
    /// 既定の隠れ層構成で作成
    pub fn new(encoding: EncodingKind, half_dimensions: usize) -> Self {
        Self {
            encoding,
            half_dimensions,
            hidden: DEFAULT_HIDDEN.to_vec(),
            clip: ClipRange::default(),
        }
    }

    /// 隠れ層構成を差し替える
    pub fn with_hidden(mut self, hidden: &[usize]) -> Self {
        self.hidden = hidden.to_vec();
        self
    }

    /// 変換後特徴量（両視点を連結）の次元
    pub fn transformed_dimensions(&self) -> usize {
        self.half_dimensions * 2
    }

    /// 構成値の検証
    pub fn validate(&self) -> NnueResult<()> {
        if self.half_dimensions == 0 || self.half_dimensions % KERNEL_LANES != 0 {
            return Err(NnueError::InvalidArchitecture(format!(
                "half_dimensions must be a positive multiple of {KERNEL_LANES}, got {}",
                self.half_dimensions
            )));
        }
        if let Some(pos) = self.hidden.iter().position(|&h| h == 0) {
            return Err(NnueError::InvalidArchitecture(format!(
                "hidden layer {pos} has zero width"
            )));
        }
        let ClipRange { lower, upper } = self.clip;
        if !lower.is_finite() || !upper.is_finite() || lower >= upper {
            return Err(NnueError::InvalidArchitecture(format!(
                "clip range must satisfy lower < upper, got [{lower}, {upper}]"
            )));
        }
        // FeatureTransformer の出力は [0, upper] にクランプされる
        if upper <= 0.0 {
            return Err(NnueError::InvalidArchitecture(format!(
                "clip upper bound must be positive, got {upper}"
            )));
        }
        Ok(())
    }

    /// パイプラインの各段
    pub fn stage_plan(&self) -> Vec<StagePlan> {
        let mut plan = Vec::with_capacity(self.hidden.len() * 2 + 1);
        let mut input = self.transformed_dimensions();
        for &output in &self.hidden {
            plan.push(StagePlan::Affine { input, output });
            plan.push(StagePlan::ClippedReLU { dim: output });
            input = output;
        }
        plan.push(StagePlan::Affine { input, output: 1 });
        plan
    }

    /// FeatureTransformer のハッシュ値
    pub fn transformer_hash(&self) -> u32 {
        self.encoding.hash_value() ^ self.transformed_dimensions() as u32
    }

    /// 層パイプラインのハッシュ値
    pub fn pipeline_hash(&self) -> u32 {
        let input = INPUT_SLICE_HASH ^ self.transformed_dimensions() as u32;
        self.stage_plan().iter().fold(input, |prev, stage| stage.hash_value(prev))
    }

    /// パラメータファイル先頭の fingerprint
    pub fn hash_value(&self) -> u32 {
        self.transformer_hash() ^ self.pipeline_hash()
    }

    /// アーキテクチャ名
    ///
    /// 例: "mobility-256-32-32-1"
    pub fn name(&self) -> String {
        let mut name = format!("{}-{}", self.encoding, self.half_dimensions);
        for h in &self.hidden {
            name.push_str(&format!("-{h}"));
        }
        name.push_str("-1");
        name
    }
}

impl std::fmt::Display for ArchitectureSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
