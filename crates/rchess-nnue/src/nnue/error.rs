//! NNUE エラー型

use thiserror::Error;

/// NNUE の読み込み・構成エラー
#[derive(Debug, Error)]
pub enum NnueError {
    /// パラメータストリームが途中で終わった
    #[error("parameter stream truncated while reading {section}")]
    Truncated { section: &'static str },

    /// 先頭の fingerprint が構成から計算した値と一致しない
    #[error("architecture fingerprint mismatch: expected {expected:#010x}, found {found:#010x}")]
    FingerprintMismatch { expected: u32, found: u32 },

    /// 層・バッファの次元が一致しない
    #[error("dimension mismatch in {context}: expected {expected}, got {actual}")]
    DimensionMismatch {
        context: &'static str,
        expected: usize,
        actual: usize,
    },

    /// 構成値が不正
    #[error("invalid architecture: {0}")]
    InvalidArchitecture(String),

    /// アフィン変換層のパディング列に 0 以外の重みがある
    #[error("non-zero padding weight in affine stage {stage} (row {row}, column {column})")]
    NonZeroPadding {
        stage: usize,
        row: usize,
        column: usize,
    },

    /// パラメータストリームの末尾に余分なデータがある
    #[error("trailing data after parameter stream")]
    TrailingData,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// NNUE 用の Result 型
pub type NnueResult<T> = Result<T, NnueError>;
