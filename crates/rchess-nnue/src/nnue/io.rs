//! パラメータストリームの読み書き（リトルエンディアン）

use super::error::{NnueError, NnueResult};
use std::io::{self, Read, Write};

/// 読み込みエラーを変換（途中終了はセクション名付きの Truncated）
fn map_read_error(err: io::Error, section: &'static str) -> NnueError {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        NnueError::Truncated { section }
    } else {
        NnueError::Io(err)
    }
}

pub(crate) fn read_u32<R: Read>(reader: &mut R, section: &'static str) -> NnueResult<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf).map_err(|e| map_read_error(e, section))?;
    Ok(u32::from_le_bytes(buf))
}

/// `out.len()` 個の f32 を読み込む
pub(crate) fn read_f32_into<R: Read>(
    reader: &mut R,
    out: &mut [f32],
    section: &'static str,
) -> NnueResult<()> {
    let mut buf = vec![0u8; out.len() * 4];
    reader.read_exact(&mut buf).map_err(|e| map_read_error(e, section))?;
    for (value, bytes) in out.iter_mut().zip(buf.chunks_exact(4)) {
        *value = f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    }
    Ok(())
}

/// ストリームの終端を確認（余分なデータがあればエラー）
pub(crate) fn expect_eof<R: Read>(reader: &mut R) -> NnueResult<()> {
    let mut probe = [0u8; 1];
    loop {
        match reader.read(&mut probe) {
            Ok(0) => return Ok(()),
            Ok(_) => return Err(NnueError::TrailingData),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(NnueError::Io(e)),
        }
    }
}

pub(crate) fn write_u32<W: Write>(writer: &mut W, value: u32) -> io::Result<()> {
    writer.write_all(&value.to_le_bytes())
}

pub(crate) fn write_f32_slice<W: Write>(writer: &mut W, values: &[f32]) -> io::Result<()> {
    let mut buf = Vec::with_capacity(values.len() * 4);
    for value in values {
        buf.extend_from_slice(&value.to_le_bytes());
    }
    writer.write_all(&buf)
}
