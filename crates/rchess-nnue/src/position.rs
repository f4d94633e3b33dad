//! 評価関数が外部エンジンから受け取る局面情報
//!
//! - `BoardState`: 1手分の盤面スナップショット（手番・駒種別ビットボード・駒数）
//! - `DirtyPiece`: 直前局面からの変更駒リスト（差分コスト見積りと玉移動検出に使用）
//!
//! 合法手生成や do_move/undo_move はエンジン側の責務であり、ここでは扱わない。

use crate::types::{Bitboard, Color, PieceType, Square};

/// 1手で変化しうる駒の最大数（移動駒・取られた駒・キャスリングの飛車など）
pub const MAX_DIRTY_PIECES: usize = 3;

// =============================================================================
// BoardState - 盤面スナップショット
// =============================================================================

/// 盤面スナップショット
///
/// `bitboards[color][piece_type]` は特徴量の元になる升集合。
/// 駒配置を渡すか利き（mobility）を渡すかはエンジン側が決める。
/// 特徴量エンコーダはこのビットボードだけを見る。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BoardState {
    /// 手番
    pub side_to_move: Color,
    /// 手番・駒種ごとのビットボード
    pub bitboards: [[Bitboard; PieceType::NUM]; Color::NUM],
    /// 盤上の駒数（玉を含む）
    pub piece_count: u32,
}

impl BoardState {
    /// 空の盤面
    pub fn new(side_to_move: Color) -> Self {
        Self {
            side_to_move,
            bitboards: [[Bitboard::EMPTY; PieceType::NUM]; Color::NUM],
            piece_count: 0,
        }
    }

    /// 指定手番・駒種のビットボード
    #[inline]
    pub fn bitboard(&self, color: Color, pt: PieceType) -> Bitboard {
        self.bitboards[color.index()][pt.index()]
    }

    /// 指定手番・駒種のビットボード（可変）
    #[inline]
    pub fn bitboard_mut(&mut self, color: Color, pt: PieceType) -> &mut Bitboard {
        &mut self.bitboards[color.index()][pt.index()]
    }
}

// =============================================================================
// DirtyPiece - 変更駒リスト
// =============================================================================

/// 変化した駒1つ分の情報
///
/// `from == None` は盤上に現れた駒（昇格後の駒など）、
/// `to == None` は盤上から消えた駒（取られた駒など）を表す。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangedPiece {
    pub color: Color,
    pub piece_type: PieceType,
    pub from: Option<Square>,
    pub to: Option<Square>,
}

/// 直前局面からの変更駒リスト（YO/SF の DirtyPiece 相当）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirtyPiece {
    /// 変化した駒
    pub changed_piece: [ChangedPiece; MAX_DIRTY_PIECES],
    /// 有効な要素数
    pub dirty_num: u8,
    /// 手番ごとの玉移動フラグ
    pub king_moved: [bool; Color::NUM],
}

impl DirtyPiece {
    const EMPTY_PIECE: ChangedPiece = ChangedPiece {
        color: Color::White,
        piece_type: PieceType::Pawn,
        from: None,
        to: None,
    };

    /// 空の変更リスト（null move 相当）
    pub const fn new() -> Self {
        Self {
            changed_piece: [Self::EMPTY_PIECE; MAX_DIRTY_PIECES],
            dirty_num: 0,
            king_moved: [false; Color::NUM],
        }
    }

    /// 変化した駒を追加する
    ///
    /// 玉の移動なら該当手番の `king_moved` も立てる。
    pub fn push(&mut self, piece: ChangedPiece) {
        assert!(
            (self.dirty_num as usize) < MAX_DIRTY_PIECES,
            "DirtyPiece overflow: more than {MAX_DIRTY_PIECES} changed pieces"
        );
        if piece.piece_type == PieceType::King {
            self.king_moved[piece.color.index()] = true;
        }
        self.changed_piece[self.dirty_num as usize] = piece;
        self.dirty_num += 1;
    }

    /// 有効な変更駒のスライス
    #[inline]
    pub fn pieces(&self) -> &[ChangedPiece] {
        &self.changed_piece[..self.dirty_num as usize]
    }

    /// 指定手番の玉が動いたか
    #[inline]
    pub fn king_moved(&self, color: Color) -> bool {
        self.king_moved[color.index()]
    }
}

impl Default for DirtyPiece {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(s: &str) -> Square {
        Square::parse(s).unwrap()
    }

    #[test]
    fn test_board_state_bitboard_access() {
        let mut state = BoardState::new(Color::White);
        state.bitboard_mut(Color::Black, PieceType::Knight).set(sq("g8"));
        assert!(state.bitboard(Color::Black, PieceType::Knight).contains(sq("g8")));
        assert!(state.bitboard(Color::White, PieceType::Knight).is_empty());
    }

    #[test]
    fn test_dirty_piece_king_moved_flag() {
        let mut dp = DirtyPiece::new();
        dp.push(ChangedPiece {
            color: Color::Black,
            piece_type: PieceType::King,
            from: Some(sq("e8")),
            to: Some(sq("e7")),
        });
        assert!(dp.king_moved(Color::Black));
        assert!(!dp.king_moved(Color::White));
        assert_eq!(dp.pieces().len(), 1);
    }

    #[test]
    fn test_dirty_piece_capture_has_two_entries() {
        let mut dp = DirtyPiece::new();
        dp.push(ChangedPiece {
            color: Color::White,
            piece_type: PieceType::Pawn,
            from: Some(sq("e4")),
            to: Some(sq("d5")),
        });
        dp.push(ChangedPiece {
            color: Color::Black,
            piece_type: PieceType::Pawn,
            from: Some(sq("d5")),
            to: None,
        });
        assert_eq!(dp.dirty_num, 2);
        assert!(!dp.king_moved(Color::White));
        assert!(!dp.king_moved(Color::Black));
    }

    #[test]
    #[should_panic(expected = "DirtyPiece overflow")]
    fn test_dirty_piece_overflow_panics() {
        let mut dp = DirtyPiece::new();
        let p = ChangedPiece {
            color: Color::White,
            piece_type: PieceType::Pawn,
            from: None,
            to: None,
        };
        for _ in 0..=MAX_DIRTY_PIECES {
            dp.push(p);
        }
    }
}
