//! NNUE 定数定義

/// アフィン変換層の入力パディング単位（要素数）
///
/// 重み行はこの倍数の列数で格納される。パディング列の重みは 0 でなければならない。
pub const MAX_SIMD_WIDTH: usize = 32;

/// 数値カーネルのチャンク幅（f32 レーン数、AVX2 = 256bit）
///
/// FeatureTransformer の片側次元はこの倍数である必要がある。
pub const KERNEL_LANES: usize = 8;

/// キャッシュラインサイズ（パラメータ・アキュムレータのアライメント）
pub const CACHE_LINE_SIZE: usize = 64;

/// 盤面の升数
pub const SQUARE_NB: usize = 64;

/// 特徴量スライス数（自分側6駒種 + 相手側6駒種）
pub const NUM_SLICES: usize = 12;

/// 同時にアクティブになりうる特徴量の最大数（全解像度版の次元数）
pub const MAX_ACTIVE_FEATURES: usize = SQUARE_NB * NUM_SLICES;

/// 1回の差分で変化しうる特徴量の最大数
pub const MAX_CHANGED_FEATURES: usize = MAX_ACTIVE_FEATURES;

/// 既定の隠れ層サイズ（2*half -> 32 -> 32 -> 1）
pub const DEFAULT_HIDDEN: [usize; 2] = [32, 32];

/// 既定の FeatureTransformer 片側次元
pub const DEFAULT_HALF_DIMENSIONS: usize = 256;

// =============================================================================
// ハッシュ値（パラメータファイル先頭の fingerprint 計算用）
// =============================================================================

/// Mobility 特徴量のハッシュ値
pub const MOBILITY_HASH: u32 = 0x62924F91;

/// CompressedMobility 特徴量のハッシュ値（次元数 192 を XOR）
pub const COMPRESSED_MOBILITY_HASH: u32 = MOBILITY_HASH ^ (16 * NUM_SLICES as u32);

/// 入力スライス（FeatureTransformer 出力を受ける仮想層）のハッシュ基数
pub const INPUT_SLICE_HASH: u32 = 0xEC42E90D;

/// AffineTransform 層のハッシュ基数
pub const AFFINE_TRANSFORM_HASH: u32 = 0xCC03DAE4;

/// ClippedReLU 層のハッシュ基数
pub const CLIPPED_RELU_HASH: u32 = 0x538D24C7;

/// パディング済み入力次元
#[inline]
pub const fn padded_input(input_dim: usize) -> usize {
    input_dim.div_ceil(MAX_SIMD_WIDTH) * MAX_SIMD_WIDTH
}
