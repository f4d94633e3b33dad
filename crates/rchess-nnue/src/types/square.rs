//! 升（Square）
//!
//! `index = rank * 8 + file`（a1 = 0, h1 = 7, a8 = 56, h8 = 63）。

/// 升（0-63）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Square(u8);

impl Square {
    /// 升の数
    pub const NUM: usize = 64;

    pub const A1: Square = Square(0);
    pub const H8: Square = Square(63);

    /// 筋（0-7）と段（0-7）から生成
    #[inline]
    pub const fn new(file: u8, rank: u8) -> Self {
        debug_assert!(file < 8 && rank < 8);
        Self(rank * 8 + file)
    }

    /// インデックスから生成（範囲外なら None）
    #[inline]
    pub const fn from_index(index: usize) -> Option<Self> {
        if index < Self::NUM {
            Some(Self(index as u8))
        } else {
            None
        }
    }

    /// 代数表記（"e4" など）から生成
    pub fn parse(s: &str) -> Option<Self> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return None;
        }
        let file = bytes[0].wrapping_sub(b'a');
        let rank = bytes[1].wrapping_sub(b'1');
        if file < 8 && rank < 8 {
            Some(Self::new(file, rank))
        } else {
            None
        }
    }

    /// インデックス（0-63）
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// 筋（a=0 .. h=7）
    #[inline]
    pub const fn file(self) -> u8 {
        self.0 & 7
    }

    /// 段（1=0 .. 8=7）
    #[inline]
    pub const fn rank(self) -> u8 {
        self.0 >> 3
    }

    /// 180度回転した升
    #[inline]
    pub const fn rotate180(self) -> Self {
        Self(63 - self.0)
    }
}

impl std::fmt::Display for Square {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", (b'a' + self.file()) as char, (b'1' + self.rank()) as char)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_file_rank() {
        let sq = Square::new(4, 3);
        assert_eq!(sq.file(), 4);
        assert_eq!(sq.rank(), 3);
        assert_eq!(sq.index(), 28);
    }

    #[test]
    fn test_square_parse_display() {
        let e4 = Square::parse("e4").unwrap();
        assert_eq!(e4, Square::new(4, 3));
        assert_eq!(e4.to_string(), "e4");
        assert_eq!(Square::parse("i1"), None);
        assert_eq!(Square::parse("a9"), None);
        assert_eq!(Square::parse("a"), None);
    }

    #[test]
    fn test_rotate180() {
        assert_eq!(Square::A1.rotate180(), Square::H8);
        let e2 = Square::parse("e2").unwrap();
        assert_eq!(e2.rotate180(), Square::parse("d7").unwrap());
        assert_eq!(e2.rotate180().rotate180(), e2);
    }
}
