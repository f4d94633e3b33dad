//! NNUE特徴量モジュール
//!
//! 駒種ごとのビットボードを「自分側6スライス + 相手側6スライス」に並べた
//! 特徴量を定義する。黒のビットボードは 180 度回転して視点を揃える。

mod compressed_mobility;
mod mobility;

pub use compressed_mobility::{CompressedMobility, compress};
pub use mobility::Mobility;

use super::constants::{MAX_ACTIVE_FEATURES, MAX_CHANGED_FEATURES};
use super::spec::EncodingKind;
use crate::position::{BoardState, DirtyPiece};
use crate::types::{Bitboard, Color, PieceType};

// =============================================================================
// IndexList - 固定長の特徴量インデックスリスト
// =============================================================================

/// 固定長の特徴量インデックスリスト
#[derive(Clone)]
pub struct IndexList<const N: usize> {
    indices: [u16; N],
    len: usize,
}

impl<const N: usize> IndexList<N> {
    #[inline]
    pub const fn new() -> Self {
        Self {
            indices: [0; N],
            len: 0,
        }
    }

    /// 追加（容量超過時は false）
    #[inline]
    pub fn push(&mut self, index: usize) -> bool {
        if self.len >= N {
            return false;
        }
        debug_assert!(index <= u16::MAX as usize);
        self.indices[self.len] = index as u16;
        self.len += 1;
        true
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn clear(&mut self) {
        self.len = 0;
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.indices[..self.len].iter().map(|&i| i as usize)
    }

    pub fn contains(&self, index: usize) -> bool {
        self.iter().any(|i| i == index)
    }
}

impl<const N: usize> Default for IndexList<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> std::fmt::Debug for IndexList<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// 差分計算の結果（removed, added）
pub type ChangedFeatures = (IndexList<MAX_CHANGED_FEATURES>, IndexList<MAX_CHANGED_FEATURES>);

// =============================================================================
// FeatureSet trait
// =============================================================================

/// 特徴量セット
///
/// 実装側は空間解像度（`SLICE_WIDTH` と `region_bits`）だけを定義し、
/// スライスの並び・ミラー・差分計算は共通の既定実装を使う。
pub trait FeatureSet {
    /// 名前
    const NAME: &'static str;
    /// ハッシュ値
    const HASH_VALUE: u32;
    /// 1スライスあたりの領域数
    const SLICE_WIDTH: usize;
    /// 特徴量の次元数
    const DIMENSIONS: usize = Self::SLICE_WIDTH * 12;
    /// 同時にアクティブになる最大数
    const MAX_ACTIVE: usize = Self::DIMENSIONS;

    /// ビットボードを領域ビット列に変換（bit i = 領域 i が占有されている）
    fn region_bits(bb: Bitboard) -> u64;

    /// 領域インデックスを 180 度回転
    #[inline]
    fn mirror(region: usize) -> usize {
        Self::SLICE_WIDTH - 1 - region
    }

    /// スライス番号（perspective から見て自分側 0..6、相手側 6..12）
    #[inline]
    fn slice_index(perspective: Color, owner: Color, pt: PieceType) -> usize {
        if owner == perspective {
            pt.index()
        } else {
            PieceType::NUM + pt.index()
        }
    }

    /// 領域ビットを特徴量インデックスに変換して追記
    #[inline]
    fn append_region_bits<const N: usize>(
        mut bits: u64,
        owner: Color,
        slice: usize,
        out: &mut IndexList<N>,
    ) {
        let base = slice * Self::SLICE_WIDTH;
        while bits != 0 {
            let region = bits.trailing_zeros() as usize;
            bits &= bits - 1;
            let region = if owner == Color::Black {
                Self::mirror(region)
            } else {
                region
            };
            out.push(base + region);
        }
    }

    /// アクティブな特徴量インデックスを追記
    fn append_active_indices(
        board: &BoardState,
        perspective: Color,
        active: &mut IndexList<MAX_ACTIVE_FEATURES>,
    ) {
        for owner in Color::ALL {
            for pt in PieceType::ALL {
                let bits = Self::region_bits(board.bitboard(owner, pt));
                let slice = Self::slice_index(perspective, owner, pt);
                Self::append_region_bits(bits, owner, slice, active);
            }
        }
    }

    /// 2局面間で変化した特徴量インデックスを追記
    ///
    /// 領域化した後のビット列で差分を取るため、同じ領域内の移動は変化にならない。
    fn append_changed_indices(
        before: &BoardState,
        after: &BoardState,
        perspective: Color,
        removed: &mut IndexList<MAX_CHANGED_FEATURES>,
        added: &mut IndexList<MAX_CHANGED_FEATURES>,
    ) {
        for owner in Color::ALL {
            for pt in PieceType::ALL {
                let old = Self::region_bits(before.bitboard(owner, pt));
                let new = Self::region_bits(after.bitboard(owner, pt));
                let changed = old ^ new;
                if changed == 0 {
                    continue;
                }
                let slice = Self::slice_index(perspective, owner, pt);
                Self::append_region_bits(changed & old, owner, slice, removed);
                Self::append_region_bits(changed & new, owner, slice, added);
            }
        }
    }

    /// アクティブな特徴量インデックスを取得
    #[inline]
    fn collect_active_indices(
        board: &BoardState,
        perspective: Color,
    ) -> IndexList<MAX_ACTIVE_FEATURES> {
        let mut active = IndexList::new();
        Self::append_active_indices(board, perspective, &mut active);
        active
    }

    /// 変化した特徴量インデックスを取得
    #[inline]
    fn collect_changed_indices(
        before: &BoardState,
        after: &BoardState,
        perspective: Color,
    ) -> ChangedFeatures {
        let mut removed = IndexList::new();
        let mut added = IndexList::new();
        Self::append_changed_indices(before, after, perspective, &mut removed, &mut added);
        (removed, added)
    }

    /// リフレッシュが必要かどうか（自玉が動いた場合）
    #[inline]
    fn needs_refresh(dirty_piece: &DirtyPiece, perspective: Color) -> bool {
        dirty_piece.king_moved(perspective)
    }
}

// =============================================================================
// EncodingKind による静的ディスパッチ
// =============================================================================

impl EncodingKind {
    /// アクティブな特徴量インデックスを取得
    #[inline]
    pub fn collect_active_indices(
        &self,
        board: &BoardState,
        perspective: Color,
    ) -> IndexList<MAX_ACTIVE_FEATURES> {
        match self {
            Self::Mobility => Mobility::collect_active_indices(board, perspective),
            Self::CompressedMobility => {
                CompressedMobility::collect_active_indices(board, perspective)
            }
        }
    }

    /// 変化した特徴量インデックスを取得
    #[inline]
    pub fn collect_changed_indices(
        &self,
        before: &BoardState,
        after: &BoardState,
        perspective: Color,
    ) -> ChangedFeatures {
        match self {
            Self::Mobility => Mobility::collect_changed_indices(before, after, perspective),
            Self::CompressedMobility => {
                CompressedMobility::collect_changed_indices(before, after, perspective)
            }
        }
    }

    /// リフレッシュが必要かどうか
    #[inline]
    pub fn needs_refresh(&self, dirty_piece: &DirtyPiece, perspective: Color) -> bool {
        match self {
            Self::Mobility => Mobility::needs_refresh(dirty_piece, perspective),
            Self::CompressedMobility => CompressedMobility::needs_refresh(dirty_piece, perspective),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_list_push_and_iter() {
        let mut list: IndexList<4> = IndexList::new();
        assert!(list.is_empty());
        assert!(list.push(3));
        assert!(list.push(700));
        assert_eq!(list.iter().collect::<Vec<_>>(), vec![3, 700]);
        assert!(list.contains(700));
        assert!(!list.contains(4));
        list.clear();
        assert_eq!(list.len(), 0);
    }

    #[test]
    fn test_index_list_capacity() {
        let mut list: IndexList<2> = IndexList::new();
        assert!(list.push(0));
        assert!(list.push(1));
        assert!(!list.push(2));
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_feature_set_constants_match_encoding() {
        assert_eq!(Mobility::HASH_VALUE, EncodingKind::Mobility.hash_value());
        assert_eq!(Mobility::DIMENSIONS, EncodingKind::Mobility.dimensions());
        assert_eq!(CompressedMobility::HASH_VALUE, EncodingKind::CompressedMobility.hash_value());
        assert_eq!(CompressedMobility::DIMENSIONS, EncodingKind::CompressedMobility.dimensions());
        assert_ne!(Mobility::NAME, CompressedMobility::NAME);
    }

    #[test]
    fn test_dispatch_matches_feature_sets() {
        let mut board = BoardState::new(Color::White);
        board.bitboard_mut(Color::White, PieceType::Knight).set(crate::types::Square::new(1, 0));
        board.bitboard_mut(Color::Black, PieceType::Queen).set(crate::types::Square::new(3, 7));
        board.piece_count = 2;

        let a = EncodingKind::Mobility.collect_active_indices(&board, Color::White);
        let b = Mobility::collect_active_indices(&board, Color::White);
        assert_eq!(a.iter().collect::<Vec<_>>(), b.iter().collect::<Vec<_>>());

        let a = EncodingKind::CompressedMobility.collect_active_indices(&board, Color::Black);
        let b = CompressedMobility::collect_active_indices(&board, Color::Black);
        assert_eq!(a.iter().collect::<Vec<_>>(), b.iter().collect::<Vec<_>>());
    }
}
