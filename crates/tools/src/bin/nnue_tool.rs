//! NNUE パラメータファイルツール
//!
//! - `info`: fingerprint から構成を判定し、ファイルの内容を要約する
//! - `generate`: 合成パラメータ（k/64 の値）でファイルを生成する
//! - `fingerprint`: 構成から fingerprint を計算する

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::Deserialize;
use rchess_nnue::nnue::{
    ArchitectureSpec, EncodingKind, Network, ParamSlot, Stage, detect_spec, read_fingerprint,
};

/// `info` で構成ファイルがない場合に試す片側次元
const CANDIDATE_HALF_DIMENSIONS: [usize; 5] = [64, 128, 256, 512, 1024];

#[derive(Parser, Debug)]
#[command(name = "nnue_tool", about = "NNUE parameter file utilities", version)]
struct Cli {
    /// ログレベル（RUST_LOG が優先）
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// パラメータファイルの構成と統計を表示
    Info(InfoArgs),
    /// 合成パラメータファイルを生成
    Generate(GenerateArgs),
    /// 構成の fingerprint を表示
    Fingerprint(ArchArgs),
}

/// アーキテクチャ指定（TOML ファイルまたはオプション）
#[derive(Args, Debug, Clone)]
struct ArchArgs {
    /// 構成ファイル（TOML）。指定時は他のオプションより優先
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// 特徴量エンコーディング（mobility / compressed_mobility）。`--config` がなければ必須
    #[arg(long, required_unless_present = "config")]
    encoding: Option<EncodingKind>,

    /// FeatureTransformer の片側次元
    #[arg(long, default_value_t = 256)]
    half_dimensions: usize,

    /// 隠れ層の出力次元（カンマ区切り）
    #[arg(long, value_delimiter = ',', default_values_t = [32usize, 32])]
    hidden: Vec<usize>,
}

#[derive(Args, Debug)]
struct InfoArgs {
    /// パラメータファイル
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// 構成ファイル（TOML）。省略時は fingerprint から推定
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    #[command(flatten)]
    arch: ArchArgs,

    /// 出力ファイル
    #[arg(short, long, value_name = "FILE")]
    output: PathBuf,

    /// 乱数シード
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// 重みの絶対値の上限（k/64 の k）
    #[arg(long, default_value_t = 16)]
    magnitude: i32,
}

impl ArchArgs {
    fn to_spec(&self) -> Result<ArchitectureSpec> {
        let spec = match (&self.config, self.encoding) {
            (Some(path), _) => load_config(path)?,
            (None, Some(encoding)) => {
                ArchitectureSpec::new(encoding, self.half_dimensions).with_hidden(&self.hidden)
            }
            (None, None) => bail!("--encoding is required without --config"),
        };
        spec.validate()?;
        Ok(spec)
    }
}

/// 構成ファイル
///
/// ```toml
/// [network]
/// encoding = "compressed_mobility"
/// half_dimensions = 256
/// hidden = [32, 32]
/// clip = { lower = 0.0, upper = 1.0 }
/// ```
#[derive(Debug, Deserialize)]
struct ToolConfig {
    network: ArchitectureSpec,
}

fn load_config(path: &Path) -> Result<ArchitectureSpec> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    let config: ToolConfig = toml::from_str(&text)
        .with_context(|| format!("failed to parse config: {}", path.display()))?;
    Ok(config.network)
}

/// 既定の隠れ層構成で試す候補
fn candidate_specs() -> Vec<ArchitectureSpec> {
    let mut specs = Vec::new();
    for encoding in [EncodingKind::Mobility, EncodingKind::CompressedMobility] {
        for half in CANDIDATE_HALF_DIMENSIONS {
            specs.push(ArchitectureSpec::new(encoding, half));
        }
    }
    specs
}

fn run_info(args: &InfoArgs) -> Result<()> {
    let fingerprint = {
        let file = File::open(&args.file)
            .with_context(|| format!("failed to open: {}", args.file.display()))?;
        read_fingerprint(&mut BufReader::new(file))?
    };
    println!("file:        {}", args.file.display());
    println!("fingerprint: {fingerprint:#010x}");

    let spec = match &args.config {
        Some(path) => load_config(path)?,
        None => {
            let candidates = candidate_specs();
            match detect_spec(fingerprint, &candidates) {
                Some(spec) => spec.clone(),
                None => bail!("unknown architecture (fingerprint {fingerprint:#010x}); pass --config"),
            }
        }
    };

    let network = Network::load(&args.file, &spec)?;
    let transformer = network.transformer();
    println!("architecture: {spec}");
    println!(
        "transformer: {} features x {} (x2 perspectives)",
        spec.encoding.dimensions(),
        spec.half_dimensions
    );
    let zero = transformer.weights().iter().filter(|&&w| w == 0.0).count();
    println!(
        "  weights:   {} ({:.2}% zero)",
        transformer.weights().len(),
        zero as f64 * 100.0 / transformer.weights().len() as f64
    );
    for (i, stage) in network.stages().iter().enumerate() {
        match stage {
            Stage::Affine(layer) => println!(
                "stage {i}: affine {} -> {} (padded input {})",
                layer.input_dim(),
                layer.output_dim(),
                layer.padded_input()
            ),
            Stage::ClippedReLU(layer) => println!("stage {i}: clipped relu {}", layer.dim()),
        }
    }
    Ok(())
}

fn run_generate(args: &GenerateArgs) -> Result<()> {
    if args.magnitude <= 0 {
        bail!("magnitude must be positive: {}", args.magnitude);
    }
    let spec = args.arch.to_spec()?;
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(args.seed);
    let magnitude = args.magnitude;
    let network = Network::from_fn(spec.clone(), |slot| {
        let limit = match slot {
            ParamSlot::TransformerBias { .. } | ParamSlot::AffineBias { .. } => magnitude / 2,
            ParamSlot::TransformerWeight { .. } | ParamSlot::AffineWeight { .. } => magnitude,
        };
        rng.random_range(-limit..=limit) as f32 / 64.0
    })?;
    network
        .save(&args.output)
        .with_context(|| format!("failed to write: {}", args.output.display()))?;

    log::info!(
        "generated {} ({spec}, fingerprint {:#010x}, seed {})",
        args.output.display(),
        network.hash_value(),
        args.seed
    );
    Ok(())
}

fn run_fingerprint(args: &ArchArgs) -> Result<()> {
    let spec = args.to_spec()?;
    println!("{spec}: {:#010x}", spec.hash_value());
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, &cli.log_level),
    )
    .format_timestamp_millis()
    .init();

    match &cli.command {
        Commands::Info(args) => run_info(args),
        Commands::Generate(args) => run_generate(args),
        Commands::Fingerprint(args) => run_fingerprint(args),
    }
}
