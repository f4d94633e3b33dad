//! 基本型モジュール
//!
//! 評価関数が盤面から受け取る最小限の型だけを定義する。
//! 盤面表現そのもの（合法手判定など）はエンジン側の責務。

mod bitboard;
mod color;
mod piece_type;
mod square;

pub use bitboard::{Bitboard, BitboardIter};
pub use color::Color;
pub use piece_type::PieceType;
pub use square::Square;
