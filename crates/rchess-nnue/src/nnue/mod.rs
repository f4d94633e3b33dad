//! NNUE (Efficiently Updatable Neural Network) 評価関数
//!
//! - `features`: 盤面ビットボードから特徴量インデックスへの変換
//! - `accumulator`: 局面スタックと視点ごとのアキュムレータ
//! - `feature_transformer`: アキュムレータの全計算・差分更新
//! - `layers`: アフィン変換・ClippedReLU
//! - `network`: パラメータの読み書きと評価

pub mod accumulator;
pub mod aligned;
pub mod constants;
mod error;
pub mod feature_transformer;
pub mod features;
mod io;
pub mod layers;
pub mod network;
pub mod simd;
pub mod spec;
mod stats;

pub use accumulator::{Accumulator, AccumulatorStack, AccumulatorState, StackEntry};
pub use error::{NnueError, NnueResult};
pub use feature_transformer::FeatureTransformer;
pub use features::{CompressedMobility, FeatureSet, IndexList, Mobility, compress};
pub use layers::{AffineTransform, ClippedReLU, Stage};
pub use network::{
    Evaluator, Network, ParamSlot, PropagationBuffers, detect_spec, read_fingerprint,
};
pub use spec::{ArchitectureSpec, ClipRange, EncodingKind, StagePlan};
pub use stats::AccumulatorStats;
