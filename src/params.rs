//! Parameter sets for threshold FHEW key generation
//!
//! A [`FhewParam`] is built from a plain [`FhewParamConfig`] (what a caller
//! writes in JSON or code) and validated once. After construction it is an
//! immutable value shared by reference by every other component.

use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};

use crate::codec::{tag, ByteReader, ByteWriter, Codec};
use crate::error::{invalid_param, malformed, FhewError, Result};
use crate::math::modular::{is_prime, ModQ};

/// Largest supported ring dimension.
pub const MAX_RING_SIZE: usize = 1 << 16;

/// Largest supported LWE dimension.
pub const MAX_LWE_DIMENSION: usize = 1 << 16;

/// Largest supported Gaussian standard deviation.
pub const MAX_SIGMA: f64 = 65536.0;

/// Largest magnitude of a secret key coefficient: the 6σ tail cut of the
/// widest supported Gaussian.
pub const MAX_SECRET_COEFF: i32 = 6 * MAX_SIGMA as i32;

/// Ciphertext modulus kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Modulus {
    /// `2^bits`, with `bits == 64` meaning native u64 arithmetic.
    PowerOfTwo(u32),
    /// A prime modulus.
    Prime(u64),
}

/// Distribution that secret coefficients are drawn from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SecretDistribution {
    /// Uniform over {-1, 0, 1}.
    Ternary,
    /// Discrete Gaussian with the given standard deviation.
    Gaussian(f64),
}

/// Distribution that encryption noise is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum NoiseDistribution {
    /// Discrete Gaussian with the given standard deviation.
    Gaussian(f64),
}

/// Gadget decomposition into `level` digits of `log_base` bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecompositionParam {
    pub log_base: u32,
    pub level: u32,
}

/// Decomposition for RGSW ciphertexts with separate digit counts for the
/// mask rows (`level_a`) and body rows (`level_b`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RgswDecompositionParam {
    pub log_base: u32,
    pub level_a: u32,
    pub level_b: u32,
}

impl RgswDecompositionParam {
    /// Total rows of an RGSW ciphertext under this decomposition.
    pub fn rows(&self) -> usize {
        (self.level_a + self.level_b) as usize
    }
}

/// Unvalidated parameter configuration, as read from JSON or written in code.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FhewParamConfig {
    // Ring
    pub modulus: Modulus,
    pub ring_size: u32,
    pub sk_distribution: SecretDistribution,
    pub noise_distribution: NoiseDistribution,
    pub auto_decomposition_param: DecompositionParam,
    pub rlwe_by_rgsw_decomposition_param: RgswDecompositionParam,
    // LWE
    pub lwe_modulus: Modulus,
    pub lwe_dimension: u32,
    pub lwe_sk_distribution: SecretDistribution,
    pub lwe_noise_distribution: NoiseDistribution,
    pub lwe_ks_decomposition_param: DecompositionParam,
    // Blind rotation
    pub q: u32,
    pub g: u32,
    pub w: u32,
    // Multi-party
    pub u_distribution: SecretDistribution,
    pub rgsw_by_rgsw_decomposition_param: RgswDecompositionParam,
    pub total_shares: u32,
}

/// Validated parameter set.
///
/// Equality is structural. Fields are only reachable through accessors so a
/// value of this type always satisfies the validation rules.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "FhewParamConfig", into = "FhewParamConfig")]
pub struct FhewParam {
    config: FhewParamConfig,
}

/// 4-party preset over a 54-bit NTT-friendly prime.
pub const I_4P: FhewParamConfig = FhewParamConfig {
    modulus: Modulus::Prime(18014398509404161),
    ring_size: 2048,
    sk_distribution: SecretDistribution::Ternary,
    noise_distribution: NoiseDistribution::Gaussian(3.19),
    auto_decomposition_param: DecompositionParam {
        log_base: 24,
        level: 1,
    },
    rlwe_by_rgsw_decomposition_param: RgswDecompositionParam {
        log_base: 17,
        level_a: 1,
        level_b: 1,
    },
    lwe_modulus: Modulus::PowerOfTwo(16),
    lwe_dimension: 620,
    lwe_sk_distribution: SecretDistribution::Ternary,
    lwe_noise_distribution: NoiseDistribution::Gaussian(3.19),
    lwe_ks_decomposition_param: DecompositionParam {
        log_base: 1,
        level: 13,
    },
    q: 2048,
    g: 5,
    w: 10,
    u_distribution: SecretDistribution::Ternary,
    rgsw_by_rgsw_decomposition_param: RgswDecompositionParam {
        log_base: 6,
        level_a: 7,
        level_b: 6,
    },
    total_shares: 4,
};

/// 4-party preset over native `2^64`.
pub const I_4P_60: FhewParamConfig = FhewParamConfig {
    modulus: Modulus::PowerOfTwo(64),
    ring_size: 1024,
    sk_distribution: SecretDistribution::Ternary,
    noise_distribution: NoiseDistribution::Gaussian(3.19),
    auto_decomposition_param: DecompositionParam {
        log_base: 17,
        level: 1,
    },
    rlwe_by_rgsw_decomposition_param: RgswDecompositionParam {
        log_base: 17,
        level_a: 1,
        level_b: 1,
    },
    lwe_modulus: Modulus::PowerOfTwo(18),
    lwe_dimension: 300,
    lwe_sk_distribution: SecretDistribution::Ternary,
    lwe_noise_distribution: NoiseDistribution::Gaussian(3.19),
    lwe_ks_decomposition_param: DecompositionParam {
        log_base: 5,
        level: 3,
    },
    q: 1024,
    g: 5,
    w: 10,
    u_distribution: SecretDistribution::Ternary,
    rgsw_by_rgsw_decomposition_param: RgswDecompositionParam {
        log_base: 16,
        level_a: 3,
        level_b: 2,
    },
    total_shares: 4,
};

impl FhewParam {
    /// Validate a configuration into a parameter set.
    ///
    /// # Errors
    ///
    /// Returns [`FhewError::InvalidParameter`] naming the first inconsistent field.
    pub fn new(config: FhewParamConfig) -> Result<Self> {
        validate_modulus("modulus", config.modulus)?;
        validate_modulus("lwe_modulus", config.lwe_modulus)?;
        if !matches!(config.lwe_modulus, Modulus::PowerOfTwo(_)) {
            return Err(invalid_param!(
                "lwe_modulus must be PowerOfTwo, got {:?}",
                config.lwe_modulus
            ));
        }

        let ring_size = config.ring_size as usize;
        if !ring_size.is_power_of_two() || !(2..=MAX_RING_SIZE).contains(&ring_size) {
            return Err(invalid_param!(
                "ring_size {} must be a power of two in 2..={}",
                ring_size,
                MAX_RING_SIZE
            ));
        }
        let lwe_dimension = config.lwe_dimension as usize;
        if !(1..=MAX_LWE_DIMENSION).contains(&lwe_dimension) {
            return Err(invalid_param!(
                "lwe_dimension {} must be in 1..={}",
                lwe_dimension,
                MAX_LWE_DIMENSION
            ));
        }

        let log_q = ModQ::from(config.modulus).log_q();
        let log_q_ks = ModQ::from(config.lwe_modulus).log_q();
        validate_decomposition(
            "auto_decomposition_param",
            config.auto_decomposition_param.log_base,
            &[config.auto_decomposition_param.level],
            log_q,
        )?;
        validate_rgsw_decomposition(
            "rlwe_by_rgsw_decomposition_param",
            config.rlwe_by_rgsw_decomposition_param,
            log_q,
        )?;
        validate_rgsw_decomposition(
            "rgsw_by_rgsw_decomposition_param",
            config.rgsw_by_rgsw_decomposition_param,
            log_q,
        )?;
        validate_decomposition(
            "lwe_ks_decomposition_param",
            config.lwe_ks_decomposition_param.log_base,
            &[config.lwe_ks_decomposition_param.level],
            log_q_ks,
        )?;

        for (name, dist) in [
            ("sk_distribution", config.sk_distribution),
            ("lwe_sk_distribution", config.lwe_sk_distribution),
            ("u_distribution", config.u_distribution),
        ] {
            dist.validate()
                .map_err(|err| invalid_param!("{}: {}", name, err))?;
        }
        for (name, dist) in [
            ("noise_distribution", config.noise_distribution),
            ("lwe_noise_distribution", config.lwe_noise_distribution),
        ] {
            dist.validate()
                .map_err(|err| invalid_param!("{}: {}", name, err))?;
        }

        let q = config.q as usize;
        if !q.is_power_of_two() || !(2..=2 * ring_size).contains(&q) {
            return Err(invalid_param!(
                "q {} must be a power of two in 2..={}",
                q,
                2 * ring_size
            ));
        }
        let g = config.g as usize;
        if g % 2 == 0 || g <= 1 || g >= q {
            return Err(invalid_param!("g {} must be odd and in 1 < g < q", g));
        }
        let w = config.w as usize;
        if w == 0 || w >= q / 2 {
            return Err(invalid_param!("w {} must be in 1..{}", w, q / 2));
        }
        if config.total_shares == 0 {
            return Err(invalid_param!("total_shares must be at least 1"));
        }

        let param = Self { config };
        let mut indices = param.auto_indices();
        indices.sort_unstable();
        indices.dedup();
        if indices.len() != w + 1 {
            return Err(invalid_param!(
                "g {} yields only {} distinct automorphism indices, need {}",
                g,
                indices.len(),
                w + 1
            ));
        }
        Ok(param)
    }

    /// Parse and validate a JSON configuration.
    ///
    /// Unknown modulus or distribution tags fail with
    /// [`FhewError::UnsupportedConfigVariant`].
    pub fn from_json(json: &str) -> Result<Self> {
        let config: FhewParamConfig = serde_json::from_str(json).map_err(config_error)?;
        Self::new(config)
    }

    /// Serialize the configuration as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.config)
            .map_err(|err| invalid_param!("cannot serialize parameters: {}", err))
    }

    /// The 4-party prime-modulus preset.
    pub fn i_4p() -> Self {
        Self { config: I_4P }
    }

    /// The 4-party native `2^64` preset.
    pub fn i_4p_60() -> Self {
        Self { config: I_4P_60 }
    }

    pub fn config(&self) -> &FhewParamConfig {
        &self.config
    }

    pub fn modulus(&self) -> Modulus {
        self.config.modulus
    }

    pub fn ring_size(&self) -> usize {
        self.config.ring_size as usize
    }

    pub fn sk_distribution(&self) -> SecretDistribution {
        self.config.sk_distribution
    }

    pub fn noise_distribution(&self) -> NoiseDistribution {
        self.config.noise_distribution
    }

    pub fn auto_decomposition_param(&self) -> DecompositionParam {
        self.config.auto_decomposition_param
    }

    pub fn rlwe_by_rgsw_decomposition_param(&self) -> RgswDecompositionParam {
        self.config.rlwe_by_rgsw_decomposition_param
    }

    pub fn lwe_modulus(&self) -> Modulus {
        self.config.lwe_modulus
    }

    pub fn lwe_dimension(&self) -> usize {
        self.config.lwe_dimension as usize
    }

    pub fn lwe_sk_distribution(&self) -> SecretDistribution {
        self.config.lwe_sk_distribution
    }

    pub fn lwe_noise_distribution(&self) -> NoiseDistribution {
        self.config.lwe_noise_distribution
    }

    pub fn lwe_ks_decomposition_param(&self) -> DecompositionParam {
        self.config.lwe_ks_decomposition_param
    }

    /// Blind-rotation modulus.
    pub fn q(&self) -> usize {
        self.config.q as usize
    }

    /// Automorphism generator.
    pub fn g(&self) -> usize {
        self.config.g as usize
    }

    /// Window size for automorphism keys.
    pub fn w(&self) -> usize {
        self.config.w as usize
    }

    pub fn u_distribution(&self) -> SecretDistribution {
        self.config.u_distribution
    }

    pub fn rgsw_by_rgsw_decomposition_param(&self) -> RgswDecompositionParam {
        self.config.rgsw_by_rgsw_decomposition_param
    }

    pub fn total_shares(&self) -> usize {
        self.config.total_shares as usize
    }

    /// Arithmetic for the ring modulus.
    pub fn ring_mod(&self) -> ModQ {
        ModQ::from(self.config.modulus)
    }

    /// Arithmetic for the LWE modulus.
    pub fn lwe_mod(&self) -> ModQ {
        ModQ::from(self.config.lwe_modulus)
    }

    /// Monomial exponent step that maps `Z_q` into `Z_{2N}`.
    pub fn embedding_factor(&self) -> usize {
        2 * self.ring_size() / self.q()
    }

    /// Automorphism indices the blind rotation needs: `-g` followed by
    /// `g^1, ..., g^w`, all modulo `2N`.
    pub fn auto_indices(&self) -> Vec<usize> {
        let two_n = 2 * self.ring_size();
        let g = self.g() % two_n;
        let mut indices = Vec::with_capacity(self.w() + 1);
        indices.push(two_n - g);
        let mut power = g;
        for _ in 0..self.w() {
            indices.push(power);
            power = power * g % two_n;
        }
        indices
    }
}

impl FhewParam {
    /// SHA3-256 of the canonical encoding, used to bind the CRS and key
    /// share randomness to this exact parameter set.
    pub fn digest(&self) -> [u8; 32] {
        Sha3_256::digest(self.to_bytes()).into()
    }
}

impl Codec for FhewParam {
    const TAG: u8 = tag::PARAM;

    fn encode_body(&self, w: &mut ByteWriter) {
        let c = &self.config;
        w.put_modulus(c.modulus);
        w.put_u32(c.ring_size);
        put_secret_dist(w, c.sk_distribution);
        put_noise_dist(w, c.noise_distribution);
        put_decomposition(w, c.auto_decomposition_param);
        put_rgsw_decomposition(w, c.rlwe_by_rgsw_decomposition_param);
        w.put_modulus(c.lwe_modulus);
        w.put_u32(c.lwe_dimension);
        put_secret_dist(w, c.lwe_sk_distribution);
        put_noise_dist(w, c.lwe_noise_distribution);
        put_decomposition(w, c.lwe_ks_decomposition_param);
        w.put_u32(c.q);
        w.put_u32(c.g);
        w.put_u32(c.w);
        put_secret_dist(w, c.u_distribution);
        put_rgsw_decomposition(w, c.rgsw_by_rgsw_decomposition_param);
        w.put_u32(c.total_shares);
    }

    fn decode_body(r: &mut ByteReader<'_>) -> Result<Self> {
        let config = FhewParamConfig {
            modulus: r.get_modulus()?,
            ring_size: r.get_u32()?,
            sk_distribution: get_secret_dist(r)?,
            noise_distribution: get_noise_dist(r)?,
            auto_decomposition_param: get_decomposition(r)?,
            rlwe_by_rgsw_decomposition_param: get_rgsw_decomposition(r)?,
            lwe_modulus: r.get_modulus()?,
            lwe_dimension: r.get_u32()?,
            lwe_sk_distribution: get_secret_dist(r)?,
            lwe_noise_distribution: get_noise_dist(r)?,
            lwe_ks_decomposition_param: get_decomposition(r)?,
            q: r.get_u32()?,
            g: r.get_u32()?,
            w: r.get_u32()?,
            u_distribution: get_secret_dist(r)?,
            rgsw_by_rgsw_decomposition_param: get_rgsw_decomposition(r)?,
            total_shares: r.get_u32()?,
        };
        Self::new(config).map_err(|err| malformed!("embedded parameters: {}", err))
    }
}

fn put_secret_dist(w: &mut ByteWriter, dist: SecretDistribution) {
    match dist {
        SecretDistribution::Ternary => w.put_u8(0),
        SecretDistribution::Gaussian(sigma) => {
            w.put_u8(1);
            w.put_f64(sigma);
        }
    }
}

fn get_secret_dist(r: &mut ByteReader<'_>) -> Result<SecretDistribution> {
    match r.get_u8()? {
        0 => Ok(SecretDistribution::Ternary),
        1 => Ok(SecretDistribution::Gaussian(r.get_f64()?)),
        kind => Err(malformed!("unknown secret distribution {}", kind)),
    }
}

fn put_noise_dist(w: &mut ByteWriter, dist: NoiseDistribution) {
    match dist {
        NoiseDistribution::Gaussian(sigma) => {
            w.put_u8(1);
            w.put_f64(sigma);
        }
    }
}

fn get_noise_dist(r: &mut ByteReader<'_>) -> Result<NoiseDistribution> {
    match r.get_u8()? {
        1 => Ok(NoiseDistribution::Gaussian(r.get_f64()?)),
        kind => Err(malformed!("unknown noise distribution {}", kind)),
    }
}

fn put_decomposition(w: &mut ByteWriter, d: DecompositionParam) {
    w.put_u32(d.log_base);
    w.put_u32(d.level);
}

fn get_decomposition(r: &mut ByteReader<'_>) -> Result<DecompositionParam> {
    Ok(DecompositionParam {
        log_base: r.get_u32()?,
        level: r.get_u32()?,
    })
}

fn put_rgsw_decomposition(w: &mut ByteWriter, d: RgswDecompositionParam) {
    w.put_u32(d.log_base);
    w.put_u32(d.level_a);
    w.put_u32(d.level_b);
}

fn get_rgsw_decomposition(r: &mut ByteReader<'_>) -> Result<RgswDecompositionParam> {
    Ok(RgswDecompositionParam {
        log_base: r.get_u32()?,
        level_a: r.get_u32()?,
        level_b: r.get_u32()?,
    })
}

impl TryFrom<FhewParamConfig> for FhewParam {
    type Error = FhewError;

    fn try_from(config: FhewParamConfig) -> Result<Self> {
        Self::new(config)
    }
}

impl From<FhewParam> for FhewParamConfig {
    fn from(param: FhewParam) -> Self {
        param.config
    }
}

impl SecretDistribution {
    /// Check that the distribution can be sampled from.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Self::Ternary => Ok(()),
            Self::Gaussian(sigma) => validate_sigma(sigma),
        }
    }
}

impl NoiseDistribution {
    /// Check that the distribution can be sampled from.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Self::Gaussian(sigma) => validate_sigma(sigma),
        }
    }
}

pub(crate) fn validate_sigma(sigma: f64) -> Result<()> {
    if sigma.is_finite() && sigma > 0.0 && sigma <= MAX_SIGMA {
        Ok(())
    } else {
        Err(FhewError::InvalidDistribution(format!(
            "gaussian standard deviation {} must be in (0, {}]",
            sigma, MAX_SIGMA
        )))
    }
}

pub(crate) fn validate_modulus(name: &str, modulus: Modulus) -> Result<()> {
    match modulus {
        Modulus::PowerOfTwo(bits) if (1..=64).contains(&bits) => Ok(()),
        Modulus::PowerOfTwo(bits) => Err(invalid_param!(
            "{}: PowerOfTwo({}) must have 1..=64 bits",
            name,
            bits
        )),
        Modulus::Prime(q) if q <= 1 => Err(invalid_param!("{}: modulus {} must be > 1", name, q)),
        Modulus::Prime(q) if !is_prime(q) => {
            Err(invalid_param!("{}: {} is not prime", name, q))
        }
        Modulus::Prime(_) => Ok(()),
    }
}

fn validate_decomposition(name: &str, log_base: u32, levels: &[u32], log_q: u32) -> Result<()> {
    if log_base == 0 {
        return Err(invalid_param!("{}: log_base must be at least 1", name));
    }
    for &level in levels {
        if level == 0 {
            return Err(invalid_param!("{}: level must be at least 1", name));
        }
        if log_base as u64 * level as u64 > log_q as u64 {
            return Err(invalid_param!(
                "{}: log_base {} * level {} exceeds log_q {}",
                name,
                log_base,
                level,
                log_q
            ));
        }
    }
    Ok(())
}

fn validate_rgsw_decomposition(name: &str, param: RgswDecompositionParam, log_q: u32) -> Result<()> {
    validate_decomposition(name, param.log_base, &[param.level_a, param.level_b], log_q)
}

fn config_error(err: serde_json::Error) -> FhewError {
    let msg = err.to_string();
    if msg.starts_with("unknown variant") {
        FhewError::UnsupportedConfigVariant(msg)
    } else {
        invalid_param!("{}", msg)
    }
}
