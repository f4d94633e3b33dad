//! CompressedMobility 特徴量（4×4 グリッド）
//!
//! 盤面を 2×2 升のブロック 16 個にまとめ、ブロック内のいずれかの升が
//! 立っていればそのセルを立てる。12スライス × 16セル = 192次元。

use super::FeatureSet;
use crate::nnue::constants::COMPRESSED_MOBILITY_HASH;
use crate::types::Bitboard;

/// 64升ビットボードを 16 セルに圧縮
///
/// セル = (file / 2) * 4 + rank / 2
#[inline]
pub fn compress(bb: Bitboard) -> u16 {
    let mut cells = 0u16;
    for sq in bb {
        let cell = (sq.file() / 2) * 4 + sq.rank() / 2;
        cells |= 1u16 << cell;
    }
    cells
}

/// CompressedMobility 特徴量
pub struct CompressedMobility;

impl FeatureSet for CompressedMobility {
    const NAME: &'static str = "CompressedMobility";
    const HASH_VALUE: u32 = COMPRESSED_MOBILITY_HASH;
    const SLICE_WIDTH: usize = 16;

    #[inline]
    fn region_bits(bb: Bitboard) -> u64 {
        compress(bb) as u64
    }
}
