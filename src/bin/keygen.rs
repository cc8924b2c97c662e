//! fhew-keygen: generate one party's bootstrapping key share
//!
//! Samples the party's RLWE and LWE secret keys, generates its share of the
//! bootstrapping key against the CRS, writes the canonical encoding and
//! checks that it decodes and re-encodes to identical bytes.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, ValueEnum};
use eyre::{bail, Result, WrapErr};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use threshold_fhew::{
    Codec, FhewBootstrappingKeyShare, FhewCrs, FhewParam, LweSecretKey, RlwePublicKey,
    RlweSecretKey, Seed,
};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Preset {
    /// 4 parties, 54-bit prime, N = 2048
    #[value(name = "i-4p")]
    I4p,
    /// 4 parties, native 2^64, N = 1024
    #[value(name = "i-4p-60")]
    I4p60,
}

#[derive(Parser)]
#[command(name = "fhew-keygen")]
#[command(about = "Generate a threshold FHEW bootstrapping key share")]
#[command(version)]
struct Args {
    /// JSON parameter file (overrides --preset)
    #[arg(long)]
    param_file: Option<PathBuf>,

    /// Built-in parameter set
    #[arg(long, value_enum, default_value = "i-4p")]
    preset: Preset,

    /// CRS seed as hex, shared by all parties (default: all zero)
    #[arg(long)]
    crs_seed: Option<String>,

    /// Secret key seed as hex (default: random)
    #[arg(long)]
    sk_seed: Option<String>,

    /// Share randomness seed as hex (default: random)
    #[arg(long)]
    share_seed: Option<String>,

    /// Encoded joint public key; the party's own key is used if absent
    #[arg(long)]
    pk_file: Option<PathBuf>,

    /// Index of this party
    #[arg(long, default_value = "0")]
    share_idx: usize,

    /// Output path for the encoded share
    #[arg(long, default_value = "share.bin")]
    output: PathBuf,
}

fn parse_seed(name: &str, hex_seed: &str) -> Result<Seed> {
    let bytes = hex::decode(hex_seed.trim_start_matches("0x"))
        .wrap_err_with(|| format!("--{} is not valid hex", name))?;
    Ok(Seed::from_slice(&bytes))
}

fn seed_or_random(name: &str, hex_seed: Option<&str>) -> Result<Seed> {
    match hex_seed {
        Some(s) => parse_seed(name, s),
        None => Ok(Seed::random(&mut rand::thread_rng())),
    }
}

fn load_param(args: &Args) -> Result<FhewParam> {
    match &args.param_file {
        Some(path) => {
            let json = fs::read_to_string(path)
                .wrap_err_with(|| format!("Failed to read {}", path.display()))?;
            FhewParam::from_json(&json)
                .wrap_err_with(|| format!("Invalid parameters in {}", path.display()))
        }
        None => Ok(match args.preset {
            Preset::I4p => FhewParam::i_4p(),
            Preset::I4p60 => FhewParam::i_4p_60(),
        }),
    }
}

fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();
    let param = load_param(&args)?;

    info!("Threshold FHEW key generation");
    info!(
        "Ring: {:?}, N = {}; LWE: {:?}, n = {}",
        param.modulus(),
        param.ring_size(),
        param.lwe_modulus(),
        param.lwe_dimension()
    );
    info!("Party {} of {}", args.share_idx, param.total_shares());

    let crs_seed = match args.crs_seed.as_deref() {
        Some(s) => parse_seed("crs-seed", s)?,
        None => Seed::zero(),
    };
    let sk_seed = seed_or_random("sk-seed", args.sk_seed.as_deref())?;
    let share_seed = seed_or_random("share-seed", args.share_seed.as_deref())?;

    let total_start = Instant::now();

    let crs = FhewCrs::derive(crs_seed, &param);

    info!("Sampling secret keys...");
    let start = Instant::now();
    let sk = RlweSecretKey::sample(param.ring_size(), param.sk_distribution(), &sk_seed)
        .wrap_err("Failed to sample RLWE secret key")?;
    let sk_ks = LweSecretKey::sample(param.lwe_dimension(), param.lwe_sk_distribution(), &sk_seed)
        .wrap_err("Failed to sample LWE secret key")?;
    info!("Key sampling time: {:.2?}", start.elapsed());

    let pk = match &args.pk_file {
        Some(path) => {
            let bytes = fs::read(path).wrap_err_with(|| format!("Failed to read {}", path.display()))?;
            RlwePublicKey::from_bytes(&bytes)
                .wrap_err_with(|| format!("Invalid public key in {}", path.display()))?
        }
        None => sk.pk(&param).wrap_err("Failed to derive public key")?,
    };

    info!("Generating bootstrapping key share...");
    let start = Instant::now();
    let share = FhewBootstrappingKeyShare::generate(
        &param,
        &crs,
        args.share_idx,
        &sk,
        &pk,
        &sk_ks,
        &share_seed,
    )
    .wrap_err("Failed to generate key share")?;
    info!("Share generation time: {:.2?}", start.elapsed());
    info!(
        "Automorphism keys: {}, blind-rotation entries: {}, key-switching rows: {}",
        share.auto_key_shares().len(),
        share.brk_share().len(),
        share.lwe_ks_share().bodies().len()
    );

    info!("Encoding...");
    let start = Instant::now();
    let bytes = share.to_bytes();
    drop(share);
    fs::write(&args.output, &bytes)
        .wrap_err_with(|| format!("Failed to write {}", args.output.display()))?;
    info!(
        "Share saved: {:.2} MB ({:.2?})",
        bytes.len() as f64 / (1024.0 * 1024.0),
        start.elapsed()
    );

    let start = Instant::now();
    let reencoded = FhewBootstrappingKeyShare::from_bytes(&bytes)
        .wrap_err("Failed to decode written share")?
        .to_bytes();
    if reencoded != bytes {
        bail!("Re-encoded share differs from the written bytes");
    }
    info!("Round-trip check passed ({:.2?})", start.elapsed());

    info!("Total time: {:.2?}", total_start.elapsed());
    println!("{}", args.output.display());

    Ok(())
}
