//! Sampling of secrets and noise
//!
//! Every sampler takes the random stream explicitly. Callers derive those
//! streams from a [`Seed`](crate::rng::Seed), so the same seed always yields
//! the same samples and no sampler owns hidden RNG state.

use rand::Rng;

use crate::error::Result;
use crate::params::{validate_sigma, NoiseDistribution, SecretDistribution, MAX_SECRET_COEFF};

use super::modular::ModQ;
use super::poly::Poly;

/// Tail cut in standard deviations.
const TAILCUT_SIGMAS: f64 = 6.0;

/// Discrete Gaussian sampler over Z using rejection sampling
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GaussianSampler {
    /// Standard deviation σ
    sigma: f64,
    /// Samples beyond this magnitude are never produced
    bound: i64,
}

impl GaussianSampler {
    /// Create a sampler, rejecting a σ that is not finite and positive.
    pub fn new(sigma: f64) -> Result<Self> {
        validate_sigma(sigma)?;
        let bound = (sigma * TAILCUT_SIGMAS).ceil() as i64;
        Ok(Self { sigma, bound })
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Largest magnitude a sample can have.
    pub fn bound(&self) -> i64 {
        self.bound
    }

    /// Sample a single value from the discrete Gaussian D_σ
    pub fn sample<R: Rng>(&self, rng: &mut R) -> i64 {
        let two_sigma_sq = 2.0 * self.sigma * self.sigma;
        loop {
            let x = rng.gen_range(-self.bound..=self.bound);
            let prob = (-((x * x) as f64) / two_sigma_sq).exp();
            if rng.gen::<f64>() < prob {
                return x;
            }
        }
    }

    pub fn sample_vec<R: Rng>(&self, len: usize, rng: &mut R) -> Vec<i64> {
        (0..len).map(|_| self.sample(rng)).collect()
    }

    /// Error polynomial lifted into Z_q.
    pub fn sample_poly<R: Rng>(&self, dim: usize, modulus: ModQ, rng: &mut R) -> Poly {
        Poly::from_signed(&self.sample_vec(dim, rng), modulus)
    }

    /// One error value lifted into Z_q.
    pub fn sample_mod<R: Rng>(&self, modulus: ModQ, rng: &mut R) -> u64 {
        modulus.from_i64(self.sample(rng))
    }
}

/// Whether every coefficient lies within `±MAX_SECRET_COEFF`, the support
/// of every secret distribution.
pub(crate) fn secret_coeffs_in_range(coeffs: &[i32]) -> bool {
    coeffs
        .iter()
        .all(|c| c.unsigned_abs() <= MAX_SECRET_COEFF as u32)
}

/// Uniform sample from {-1, 0, 1}.
pub fn sample_ternary<R: Rng>(rng: &mut R) -> i32 {
    rng.gen_range(-1..=1)
}

impl SecretDistribution {
    /// Sample `len` secret coefficients.
    ///
    /// # Errors
    ///
    /// [`FhewError::InvalidDistribution`](crate::FhewError::InvalidDistribution)
    /// for a Gaussian whose σ is not finite and positive.
    pub fn sample_vec<R: Rng>(&self, len: usize, rng: &mut R) -> Result<Vec<i32>> {
        match *self {
            Self::Ternary => Ok((0..len).map(|_| sample_ternary(rng)).collect()),
            Self::Gaussian(sigma) => {
                let sampler = GaussianSampler::new(sigma)?;
                // |sample| <= 6 * MAX_SIGMA fits an i32
                Ok((0..len).map(|_| sampler.sample(rng) as i32).collect())
            }
        }
    }

    /// Largest magnitude a sampled coefficient can have.
    pub fn bound(&self) -> Result<i64> {
        match *self {
            Self::Ternary => Ok(1),
            Self::Gaussian(sigma) => Ok(GaussianSampler::new(sigma)?.bound()),
        }
    }
}

impl NoiseDistribution {
    pub fn sampler(&self) -> Result<GaussianSampler> {
        match *self {
            Self::Gaussian(sigma) => GaussianSampler::new(sigma),
        }
    }
}
