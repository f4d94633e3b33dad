//! 統合テスト用の簡易盤面
//!
//! 合法性は見ずに駒を動かし、`BoardState` と `DirtyPiece` を作る。
//! 特徴量ビットボードは駒配置そのもの。

#![allow(dead_code)]

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use rchess_nnue::nnue::{ArchitectureSpec, Network, ParamSlot};
use rchess_nnue::position::{BoardState, ChangedPiece, DirtyPiece};
use rchess_nnue::types::{Color, PieceType, Square};

const BACK_RANK: [PieceType; 8] = [
    PieceType::Rook,
    PieceType::Knight,
    PieceType::Bishop,
    PieceType::Queen,
    PieceType::King,
    PieceType::Bishop,
    PieceType::Knight,
    PieceType::Rook,
];

#[derive(Clone)]
pub struct TestBoard {
    state: BoardState,
}

impl TestBoard {
    /// 初期局面
    pub fn startpos() -> Self {
        let mut state = BoardState::new(Color::White);
        for file in 0..8u8 {
            let pt = BACK_RANK[file as usize];
            state.bitboard_mut(Color::White, pt).set(Square::new(file, 0));
            state.bitboard_mut(Color::White, PieceType::Pawn).set(Square::new(file, 1));
            state.bitboard_mut(Color::Black, PieceType::Pawn).set(Square::new(file, 6));
            state.bitboard_mut(Color::Black, pt).set(Square::new(file, 7));
        }
        state.piece_count = 32;
        Self { state }
    }

    pub fn state(&self) -> BoardState {
        self.state
    }

    pub fn piece_at(&self, sq: Square) -> Option<(Color, PieceType)> {
        for color in Color::ALL {
            for pt in PieceType::ALL {
                if self.state.bitboard(color, pt).contains(sq) {
                    return Some((color, pt));
                }
            }
        }
        None
    }

    /// 駒を動かす（取りを含む）
    pub fn make_move(&mut self, from: Square, to: Square) -> DirtyPiece {
        let (color, pt) = self.piece_at(from).expect("no piece on from-square");
        let mut dirty = DirtyPiece::new();

        if let Some((captured_color, captured_pt)) = self.piece_at(to) {
            assert_ne!(captured_color, color, "cannot capture own piece");
            self.state.bitboard_mut(captured_color, captured_pt).clear(to);
            self.state.piece_count -= 1;
            dirty.push(ChangedPiece {
                color: captured_color,
                piece_type: captured_pt,
                from: Some(to),
                to: None,
            });
        }

        self.state.bitboard_mut(color, pt).clear(from);
        self.state.bitboard_mut(color, pt).set(to);
        dirty.push(ChangedPiece {
            color,
            piece_type: pt,
            from: Some(from),
            to: Some(to),
        });
        self.state.side_to_move = color.opponent();
        dirty
    }

    /// "e2e4" 形式で駒を動かす
    pub fn make_uci(&mut self, mv: &str) -> DirtyPiece {
        let from = Square::parse(&mv[0..2]).expect("bad from-square");
        let to = Square::parse(&mv[2..4]).expect("bad to-square");
        self.make_move(from, to)
    }

    /// 手番側の駒をランダムな升へ動かす（自駒・玉のある升は避ける）
    pub fn random_move<R: Rng>(&mut self, rng: &mut R) -> DirtyPiece {
        let side = self.state.side_to_move;
        let own: Vec<Square> = (0..64)
            .filter_map(Square::from_index)
            .filter(|&sq| matches!(self.piece_at(sq), Some((c, _)) if c == side))
            .collect();
        let targets: Vec<Square> = (0..64)
            .filter_map(Square::from_index)
            .filter(|&sq| match self.piece_at(sq) {
                None => true,
                Some((c, pt)) => c != side && pt != PieceType::King,
            })
            .collect();
        let from = own[rng.random_range(0..own.len())];
        let to = targets[rng.random_range(0..targets.len())];
        self.make_move(from, to)
    }
}

/// k/64 の値で埋めた合成ネットワーク（浮動小数点の和が厳密になる）
pub fn synthetic_network(spec: ArchitectureSpec, seed: u64) -> Network {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    Network::from_fn(spec, |slot| {
        let range = match slot {
            ParamSlot::TransformerBias { .. } | ParamSlot::AffineBias { .. } => 16,
            ParamSlot::TransformerWeight { .. } => 32,
            ParamSlot::AffineWeight { .. } => 8,
        };
        rng.random_range(-range..=range) as f32 / 64.0
    })
    .expect("valid synthetic spec")
}

/// 2つの列がすべて tolerance 以内か
pub fn assert_close(actual: &[f32], expected: &[f32], tolerance: f32) {
    assert_eq!(actual.len(), expected.len());
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        assert!((a - e).abs() <= tolerance, "index {i}: {a} vs {e}");
    }
}
