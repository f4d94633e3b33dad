//! # rchess-nnue
//!
//! チェスエンジン向けの差分更新型 NNUE 評価関数ライブラリ。
//!
//! ## モジュール構成
//!
//! - `types`: 基本型（Color, PieceType, Square, Bitboard）
//! - `position`: エンジンから受け取る局面スナップショットと変更駒リスト
//! - `nnue`: 特徴量・アキュムレータ・ネットワーク
//!
//! 合法手生成や探索はエンジン側の責務であり、このクレートには含まない。

pub mod nnue;
pub mod position;
pub mod types;
