//! Network - FeatureTransformer と層パイプラインをまとめた評価関数本体
//!
//! パラメータストリームの構成（リトルエンディアン）:
//!
//! 1. fingerprint (u32)
//! 2. FeatureTransformer バイアス [half] / 重み [dimensions][half]
//! 3. AffineTransform ごとにバイアス [out] / 重み [out][padded_input]
//!
//! ストリームの末尾に余分なデータがあってはならない。

use super::accumulator::AccumulatorStack;
use super::aligned::AlignedBox;
use super::constants::INPUT_SLICE_HASH;
use super::error::{NnueError, NnueResult};
use super::feature_transformer::FeatureTransformer;
use super::io::{expect_eof, read_u32, write_u32};
use super::layers::{AffineTransform, ClippedReLU, Stage};
use super::spec::{ArchitectureSpec, StagePlan};
use super::stats::AccumulatorStats;
use crate::position::{BoardState, DirtyPiece};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Cursor, Read, Write};
use std::path::Path;
use std::sync::Arc;

/// パラメータの位置（`Network::from_fn` の生成関数に渡す）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamSlot {
    TransformerBias { index: usize },
    TransformerWeight { feature: usize, index: usize },
    AffineBias { stage: usize, index: usize },
    AffineWeight { stage: usize, row: usize, column: usize },
}

/// 評価関数ネットワーク
#[derive(Debug)]
pub struct Network {
    spec: ArchitectureSpec,
    transformer: FeatureTransformer,
    stages: Vec<Stage>,
}

impl Network {
    /// 全パラメータ 0 のネットワーク
    pub fn new_zeroed(spec: ArchitectureSpec) -> NnueResult<Self> {
        Self::from_fn(spec, |_| 0.0)
    }

    /// 生成関数でパラメータを埋めたネットワーク
    ///
    /// アフィン変換層のパディング列は生成関数を呼ばずに 0 のまま残す。
    pub fn from_fn(spec: ArchitectureSpec, mut f: impl FnMut(ParamSlot) -> f32) -> NnueResult<Self> {
        spec.validate()?;
        let half = spec.half_dimensions;

        let mut transformer = FeatureTransformer::new_zeroed(spec.encoding, half);
        for (index, b) in transformer.biases_mut().iter_mut().enumerate() {
            *b = f(ParamSlot::TransformerBias { index });
        }
        for (k, w) in transformer.weights_mut().iter_mut().enumerate() {
            *w = f(ParamSlot::TransformerWeight {
                feature: k / half,
                index: k % half,
            });
        }

        let mut stages = Vec::new();
        for (stage, plan) in spec.stage_plan().into_iter().enumerate() {
            match plan {
                StagePlan::Affine { input, output } => {
                    let mut layer = AffineTransform::new_zeroed(input, output);
                    for (index, b) in layer.biases_mut().iter_mut().enumerate() {
                        *b = f(ParamSlot::AffineBias { stage, index });
                    }
                    for row in 0..output {
                        for (column, w) in layer.row_mut(row).iter_mut().enumerate() {
                            *w = f(ParamSlot::AffineWeight { stage, row, column });
                        }
                    }
                    stages.push(Stage::Affine(layer));
                }
                StagePlan::ClippedReLU { dim } => {
                    stages.push(Stage::ClippedReLU(ClippedReLU::new(dim, spec.clip)));
                }
            }
        }

        Ok(Self {
            spec,
            transformer,
            stages,
        })
    }

    /// ファイルから読み込み
    pub fn load<P: AsRef<Path>>(path: P, spec: &ArchitectureSpec) -> NnueResult<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        let network = Self::read(&mut reader, spec)?;
        log::info!("NNUE loaded: {} ({})", path.display(), network.spec);
        Ok(network)
    }

    /// バイト列から読み込み
    pub fn from_bytes(bytes: &[u8], spec: &ArchitectureSpec) -> NnueResult<Self> {
        let mut cursor = Cursor::new(bytes);
        Self::read(&mut cursor, spec)
    }

    /// リーダーから読み込み
    ///
    /// 先頭の fingerprint が `spec` から計算した値と一致しなければエラー。
    pub fn read<R: Read>(reader: &mut R, spec: &ArchitectureSpec) -> NnueResult<Self> {
        spec.validate()?;

        let expected = spec.hash_value();
        let found = read_u32(reader, "fingerprint")?;
        if found != expected {
            return Err(NnueError::FingerprintMismatch { expected, found });
        }
        log::debug!("NNUE fingerprint: {found:#010x}");

        let transformer = FeatureTransformer::read(reader, spec.encoding, spec.half_dimensions)?;

        let mut stages = Vec::new();
        for (stage, plan) in spec.stage_plan().into_iter().enumerate() {
            match plan {
                StagePlan::Affine { input, output } => {
                    stages.push(Stage::Affine(AffineTransform::read(reader, input, output, stage)?));
                }
                StagePlan::ClippedReLU { dim } => {
                    stages.push(Stage::ClippedReLU(ClippedReLU::new(dim, spec.clip)));
                }
            }
        }

        expect_eof(reader)?;

        Ok(Self {
            spec: spec.clone(),
            transformer,
            stages,
        })
    }

    /// ライターへ書き出し
    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        write_u32(writer, self.hash_value())?;
        self.transformer.write(writer)?;
        for stage in &self.stages {
            stage.write(writer)?;
        }
        Ok(())
    }

    /// ファイルへ書き出し
    pub fn save<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.write(&mut writer)?;
        writer.flush()
    }

    #[inline]
    pub fn spec(&self) -> &ArchitectureSpec {
        &self.spec
    }

    #[inline]
    pub fn transformer(&self) -> &FeatureTransformer {
        &self.transformer
    }

    #[inline]
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// ロード済みの層構成から計算した fingerprint
    pub fn hash_value(&self) -> u32 {
        let input = INPUT_SLICE_HASH ^ self.transformer.output_dimensions() as u32;
        let pipeline = self.stages.iter().fold(input, |prev, stage| stage.hash_value(prev));
        self.transformer.hash_value() ^ pipeline
    }

    /// このネットワーク用のアキュムレータスタック
    pub fn new_stack(&self) -> AccumulatorStack {
        AccumulatorStack::new(self.spec.half_dimensions)
    }

    /// 現局面を評価
    ///
    /// アキュムレータは必要な視点だけ更新され、`stack` に残る。
    pub fn evaluate(&self, stack: &mut AccumulatorStack, buffers: &mut PropagationBuffers) -> f32 {
        debug_assert_eq!(stack.half_dimensions(), self.spec.half_dimensions);
        stack.stats_mut().evaluate_count += 1;

        let PropagationBuffers {
            transformed,
            outputs,
        } = buffers;
        self.transformer.transform(stack, self.spec.clip.upper, transformed);

        for (i, stage) in self.stages.iter().enumerate() {
            let (done, rest) = outputs.split_at_mut(i);
            let input: &[f32] = if i == 0 { &transformed[..] } else { &done[i - 1][..] };
            stage.propagate(input, &mut rest[0]);
        }

        outputs.last().map_or(0.0, |out| out[0])
    }
}

/// ストリーム先頭の fingerprint だけを読む
pub fn read_fingerprint<R: Read>(reader: &mut R) -> NnueResult<u32> {
    read_u32(reader, "fingerprint")
}

/// fingerprint に一致する構成を候補から探す
pub fn detect_spec<'a>(
    fingerprint: u32,
    candidates: &'a [ArchitectureSpec],
) -> Option<&'a ArchitectureSpec> {
    candidates.iter().find(|spec| spec.hash_value() == fingerprint)
}

// =============================================================================
// PropagationBuffers
// =============================================================================

/// 順伝播用の作業バッファ（段ごとに出力領域を持つ）
pub struct PropagationBuffers {
    transformed: AlignedBox<f32>,
    outputs: Vec<AlignedBox<f32>>,
}

impl PropagationBuffers {
    pub fn new(network: &Network) -> Self {
        Self {
            transformed: AlignedBox::new_zeroed(network.transformer.output_dimensions()),
            outputs: network
                .stages
                .iter()
                .map(|stage| AlignedBox::new_zeroed(stage.output_dim()))
                .collect(),
        }
    }
}

// =============================================================================
// Evaluator
// =============================================================================

/// ネットワーク・アキュムレータスタック・作業バッファの組
///
/// 探索スレッドごとに1つ持つ。ネットワークは `Arc` で共有する。
pub struct Evaluator {
    network: Arc<Network>,
    stack: AccumulatorStack,
    buffers: PropagationBuffers,
}

impl Evaluator {
    pub fn new(network: Arc<Network>, root: BoardState) -> Self {
        let mut stack = network.new_stack();
        stack.reset(root);
        let buffers = PropagationBuffers::new(&network);
        Self {
            network,
            stack,
            buffers,
        }
    }

    /// 既存のスタックを使う（片側次元が一致しなければエラー）
    pub fn with_stack(network: Arc<Network>, stack: AccumulatorStack) -> NnueResult<Self> {
        let expected = network.spec.half_dimensions;
        if stack.half_dimensions() != expected {
            return Err(NnueError::DimensionMismatch {
                context: "accumulator stack",
                expected,
                actual: stack.half_dimensions(),
            });
        }
        let buffers = PropagationBuffers::new(&network);
        Ok(Self {
            network,
            stack,
            buffers,
        })
    }

    /// ルート局面を設定し直す
    pub fn reset(&mut self, root: BoardState) {
        self.stack.reset(root);
    }

    /// do_move 後に呼ぶ
    pub fn push(&mut self, board: BoardState, dirty_piece: DirtyPiece) {
        self.stack.push(board, dirty_piece);
    }

    /// undo_move 後に呼ぶ
    pub fn pop(&mut self) {
        self.stack.pop();
    }

    /// 現局面を評価
    pub fn evaluate(&mut self) -> f32 {
        self.network.evaluate(&mut self.stack, &mut self.buffers)
    }

    pub fn network(&self) -> &Arc<Network> {
        &self.network
    }

    pub fn stack(&self) -> &AccumulatorStack {
        &self.stack
    }

    pub fn stats(&self) -> &AccumulatorStats {
        self.stack.stats()
    }
}
