//! 駒種（PieceType）

/// 駒種（先後の区別なし）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PieceType {
    Pawn = 0,
    Knight = 1,
    Bishop = 2,
    Rook = 3,
    Queen = 4,
    King = 5,
}

impl PieceType {
    /// 駒種の数
    pub const NUM: usize = 6;

    /// 全駒種（特徴量スライスの並び順）
    pub const ALL: [PieceType; 6] = [
        PieceType::Pawn,
        PieceType::Knight,
        PieceType::Bishop,
        PieceType::Rook,
        PieceType::Queen,
        PieceType::King,
    ];

    /// インデックスとして使用（配列アクセス用）
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// インデックスから駒種を得る
    #[inline]
    pub const fn from_index(index: usize) -> Option<PieceType> {
        if index < Self::NUM {
            Some(Self::ALL[index])
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_piece_type_index_roundtrip() {
        for pt in PieceType::ALL {
            assert_eq!(PieceType::from_index(pt.index()), Some(pt));
        }
        assert_eq!(PieceType::from_index(PieceType::NUM), None);
    }

    #[test]
    fn test_king_is_last_slice() {
        assert_eq!(PieceType::King.index(), PieceType::NUM - 1);
    }
}
