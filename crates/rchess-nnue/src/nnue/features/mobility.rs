//! Mobility 特徴量（全解像度）
//!
//! 12スライス × 64升 = 768次元。
//! インデックス = slice * 64 + 升（黒所有のビットボードは 63 - 升）。

use super::FeatureSet;
use crate::nnue::constants::{MOBILITY_HASH, SQUARE_NB};
use crate::types::Bitboard;

/// Mobility 特徴量
pub struct Mobility;

impl FeatureSet for Mobility {
    const NAME: &'static str = "Mobility";
    const HASH_VALUE: u32 = MOBILITY_HASH;
    const SLICE_WIDTH: usize = SQUARE_NB;

    #[inline]
    fn region_bits(bb: Bitboard) -> u64 {
        bb.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::BoardState;
    use crate::types::{Color, PieceType, Square};

    fn sorted(list: impl Iterator<Item = usize>) -> Vec<usize> {
        let mut v: Vec<usize> = list.collect();
        v.sort_unstable();
        v
    }

    #[test]
    fn test_mobility_dimensions() {
        assert_eq!(Mobility::DIMENSIONS, 768);
        assert_eq!(Mobility::MAX_ACTIVE, 768);
    }

    #[test]
    fn test_white_knight_on_b1() {
        // 白番視点: 自分側ナイトのスライス 1、升 b1 = 1
        let mut board = BoardState::new(Color::White);
        board.bitboard_mut(Color::White, PieceType::Knight).set(Square::new(1, 0));

        let white = Mobility::collect_active_indices(&board, Color::White);
        assert_eq!(sorted(white.iter()), vec![64 + 1]);

        // 黒番視点では相手側スライス 7
        let black = Mobility::collect_active_indices(&board, Color::Black);
        assert_eq!(sorted(black.iter()), vec![7 * 64 + 1]);
    }

    #[test]
    fn test_black_bitboard_is_mirrored() {
        // 黒のクイーン d8 (= 59) は 63 - 59 = 4 に写る
        let mut board = BoardState::new(Color::Black);
        board.bitboard_mut(Color::Black, PieceType::Queen).set(Square::new(3, 7));

        let black = Mobility::collect_active_indices(&board, Color::Black);
        assert_eq!(sorted(black.iter()), vec![4 * 64 + 4]);

        let white = Mobility::collect_active_indices(&board, Color::White);
        assert_eq!(sorted(white.iter()), vec![10 * 64 + 4]);
    }

    #[test]
    fn test_changed_indices_for_move() {
        let mut before = BoardState::new(Color::White);
        before.bitboard_mut(Color::White, PieceType::Pawn).set(Square::new(4, 1));
        let mut after = before;
        after.bitboard_mut(Color::White, PieceType::Pawn).clear(Square::new(4, 1));
        after.bitboard_mut(Color::White, PieceType::Pawn).set(Square::new(4, 3));
        after.side_to_move = Color::Black;

        let (removed, added) = Mobility::collect_changed_indices(&before, &after, Color::White);
        assert_eq!(sorted(removed.iter()), vec![12]);
        assert_eq!(sorted(added.iter()), vec![28]);

        let (removed, added) = Mobility::collect_changed_indices(&before, &after, Color::Black);
        assert_eq!(sorted(removed.iter()), vec![6 * 64 + 12]);
        assert_eq!(sorted(added.iter()), vec![6 * 64 + 28]);
    }

    #[test]
    fn test_no_change_yields_empty_diff() {
        let mut board = BoardState::new(Color::White);
        board.bitboard_mut(Color::White, PieceType::King).set(Square::new(4, 0));
        let (removed, added) = Mobility::collect_changed_indices(&board, &board, Color::White);
        assert!(removed.is_empty());
        assert!(added.is_empty());
    }
}
