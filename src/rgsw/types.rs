//! RGSW ciphertext type and public-key encryption.

use rand::Rng;

use crate::error::Result;
use crate::math::{GadgetVector, GaussianSampler, Poly, Ring};
use crate::params::SecretDistribution;
use crate::rlwe::{PreparedPublicKey, RlweCiphertext, RlweSecretKey};

/// RGSW ciphertext: `level_a` mask rows followed by `level_b` body rows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RgswCiphertext {
    /// Rows with the message added to `a`.
    pub a_rows: Vec<RlweCiphertext>,
    /// Rows with the message added to `b`.
    pub b_rows: Vec<RlweCiphertext>,
}

impl RgswCiphertext {
    pub fn from_rows(a_rows: Vec<RlweCiphertext>, b_rows: Vec<RlweCiphertext>) -> Self {
        Self { a_rows, b_rows }
    }

    pub fn level_a(&self) -> usize {
        self.a_rows.len()
    }

    pub fn level_b(&self) -> usize {
        self.b_rows.len()
    }

    /// All rows, mask rows first.
    pub fn rows(&self) -> impl Iterator<Item = &RlweCiphertext> {
        self.a_rows.iter().chain(&self.b_rows)
    }

    /// Encrypt the monomial `X^exp` under a public key.
    ///
    /// Each row is a fresh public-key encryption of zero with
    /// `g_j·X^exp` added to the mask (first `gadget_a.level()` rows) or the
    /// body (next `gadget_b.level()` rows).
    pub(crate) fn pk_encrypt_monomial<R: Rng>(
        pk: &PreparedPublicKey<'_>,
        exp: usize,
        gadget_a: &GadgetVector,
        gadget_b: &GadgetVector,
        u_dist: SecretDistribution,
        sampler: &GaussianSampler,
        rng: &mut R,
    ) -> Result<Self> {
        let a_rows = gadget_a
            .values()
            .iter()
            .map(|&g| {
                let mut ct = pk.encrypt_zero(u_dist, sampler, rng)?;
                ct.a.add_monomial(g, exp);
                Ok(ct)
            })
            .collect::<Result<Vec<_>>>()?;
        let b_rows = gadget_b
            .values()
            .iter()
            .map(|&g| {
                let mut ct = pk.encrypt_zero(u_dist, sampler, rng)?;
                ct.b.add_monomial(g, exp);
                Ok(ct)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { a_rows, b_rows })
    }

    /// Largest distance of every row's phase from its expected message.
    ///
    /// Mask rows are expected to decrypt to `g_j·X^exp·s`, body rows to
    /// `g_j·X^exp`.
    pub fn max_noise(
        &self,
        ring: &Ring,
        sk: &RlweSecretKey,
        exp: usize,
        gadget_a: &GadgetVector,
        gadget_b: &GadgetVector,
    ) -> u64 {
        let mut s_shifted = Poly::zero(ring.dimension(), ring.modulus());
        s_shifted.add_monomial(1, exp);
        let s_shifted = ring.mul_small(&s_shifted, &ring.small_to_eval(sk.coeffs()));

        let a_noise = self.a_rows.iter().zip(gadget_a.values()).map(|(ct, &g)| {
            (&ct.phase(ring, sk) - &s_shifted.scalar_mul(g)).linf_norm()
        });
        let b_noise = self.b_rows.iter().zip(gadget_b.values()).map(|(ct, &g)| {
            let mut phase = ct.phase(ring, sk);
            phase.add_monomial(ring.modulus().neg(g), exp);
            phase.linf_norm()
        });
        a_noise.chain(b_noise).max().unwrap_or(0)
    }
}
