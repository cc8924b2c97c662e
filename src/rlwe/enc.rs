//! RLWE key sampling, public keys and encryption

use rand::Rng;

use crate::crs::FhewCrs;
use crate::error::{invalid_param, FhewError, Result};
use crate::math::sampling::secret_coeffs_in_range;
use crate::math::{EvalPoly, GaussianSampler, Poly, Ring};
use crate::params::{FhewParam, SecretDistribution, MAX_RING_SIZE, MAX_SECRET_COEFF};
use crate::rng::{expand, Domain, Seed};

use super::types::{RlweCiphertext, RlwePublicKey, RlwePublicKeyShare, RlweSecretKey};

impl RlweSecretKey {
    /// Sample a key of `ring_size` coefficients from `dist`.
    ///
    /// The same `(ring_size, dist, seed)` always yields the same key.
    ///
    /// # Errors
    ///
    /// - [`FhewError::InvalidParameter`] if `ring_size` is not a power of two in `2..=2^16`
    /// - [`FhewError::InvalidDistribution`] for a Gaussian σ that is not finite and positive
    pub fn sample(ring_size: usize, dist: SecretDistribution, seed: &Seed) -> Result<Self> {
        if !ring_size.is_power_of_two() || !(2..=MAX_RING_SIZE).contains(&ring_size) {
            return Err(invalid_param!(
                "ring size {} must be a power of two in 2..={}",
                ring_size,
                MAX_RING_SIZE
            ));
        }
        let mut rng = expand(seed, Domain::RlweSecretKey);
        let coeffs = dist.sample_vec(ring_size, &mut rng)?;
        Ok(Self { coeffs })
    }

    /// Public key `(a, -a·s + e)` with fresh randomness.
    pub fn pk(&self, param: &FhewParam) -> Result<RlwePublicKey> {
        let seed = Seed::random(&mut rand::thread_rng());
        self.pk_from_seed(param, &seed)
    }

    /// Public key with `a` and `e` expanded from `seed`.
    ///
    /// # Errors
    ///
    /// [`FhewError::KeyParameterMismatch`] if the key length differs from the ring size
    /// or a coefficient lies outside the support of every secret distribution.
    pub fn pk_from_seed(&self, param: &FhewParam, seed: &Seed) -> Result<RlwePublicKey> {
        self.check_shape(param)?;
        let ring = Ring::new(param.ring_mod(), param.ring_size());
        let sampler = param.noise_distribution().sampler()?;
        let mut rng = expand(seed, Domain::PublicKey);

        let a = Poly::random(param.ring_size(), param.ring_mod(), &mut rng);
        let ct = RlweCiphertext::encrypt_with_mask(
            a,
            &ring,
            &ring.small_to_eval(&self.coeffs),
            None,
            &sampler,
            &mut rng,
        );
        Ok(RlwePublicKey::from_parts(ct.a, ct.b))
    }

    pub(crate) fn check_shape(&self, param: &FhewParam) -> Result<()> {
        if self.ring_size() != param.ring_size() {
            return Err(FhewError::KeyParameterMismatch(format!(
                "rlwe secret key has {} coefficients, ring size is {}",
                self.ring_size(),
                param.ring_size()
            )));
        }
        if !secret_coeffs_in_range(&self.coeffs) {
            return Err(FhewError::KeyParameterMismatch(format!(
                "rlwe secret key coefficient exceeds ±{}",
                MAX_SECRET_COEFF
            )));
        }
        Ok(())
    }
}

impl RlweCiphertext {
    /// Encrypt `message` (zero if `None`) under the key whose evaluation form
    /// is `s_eval`, using the given mask.
    ///
    /// Produces `(a, -a·s + e + m)` with fresh Gaussian `e`.
    pub fn encrypt_with_mask<R: Rng>(
        a: Poly,
        ring: &Ring,
        s_eval: &EvalPoly,
        message: Option<&Poly>,
        sampler: &GaussianSampler,
        rng: &mut R,
    ) -> Self {
        let mut b = -ring.mul_small(&a, s_eval);
        b += &sampler.sample_poly(ring.dimension(), ring.modulus(), rng);
        if let Some(m) = message {
            b += m;
        }
        Self::from_parts(a, b)
    }

    /// Phase `b + a·s = m + e`.
    pub fn phase(&self, ring: &Ring, sk: &RlweSecretKey) -> Poly {
        let a_s = ring.mul_small(&self.a, &ring.small_to_eval(&sk.coeffs));
        &self.b + &a_s
    }
}

impl RlwePublicKeyShare {
    /// Body `b_i = -a·s_i + e_i` against the CRS mask `a`.
    ///
    /// # Errors
    ///
    /// In order of checking:
    /// - [`FhewError::InvalidPartyIndex`] if `share_idx >= total_shares`
    /// - [`FhewError::CrsParameterMismatch`] if `crs` belongs to other parameters
    /// - [`FhewError::KeyParameterMismatch`] if `sk` has the wrong length or an oversized coefficient
    pub fn generate(
        param: &FhewParam,
        crs: &FhewCrs,
        share_idx: usize,
        sk: &RlweSecretKey,
        seed: &Seed,
    ) -> Result<Self> {
        check_share_idx(param, share_idx)?;
        crs.check(param)?;
        sk.check_shape(param)?;

        let ring = Ring::new(param.ring_mod(), param.ring_size());
        let sampler = param.noise_distribution().sampler()?;
        let mut rng = crs
            .party_expander(seed, Domain::PublicKeyShare, share_idx)
            .stream("pk-share", &[]);

        let ct = RlweCiphertext::encrypt_with_mask(
            crs.pk_a(),
            &ring,
            &ring.small_to_eval(&sk.coeffs),
            None,
            &sampler,
            &mut rng,
        );
        Ok(Self {
            share_idx,
            b: ct.b,
        })
    }
}

impl RlwePublicKey {
    /// Joint public key `(a, Σ b_i)` from exactly `total_shares` shares with
    /// distinct indices.
    ///
    /// The sum is order independent, so shares may arrive in any order.
    pub fn aggregate(
        param: &FhewParam,
        crs: &FhewCrs,
        shares: &[RlwePublicKeyShare],
    ) -> Result<Self> {
        crs.check(param)?;
        if shares.len() != param.total_shares() {
            return Err(invalid_param!(
                "expected {} public key shares, got {}",
                param.total_shares(),
                shares.len()
            ));
        }

        let mut seen = vec![false; param.total_shares()];
        let mut b = Poly::zero(param.ring_size(), param.ring_mod());
        for share in shares {
            check_share_idx(param, share.share_idx)?;
            if std::mem::replace(&mut seen[share.share_idx], true) {
                return Err(invalid_param!(
                    "duplicate public key share {}",
                    share.share_idx
                ));
            }
            if share.b.dimension() != param.ring_size() || share.b.modulus() != param.ring_mod() {
                return Err(FhewError::KeyParameterMismatch(format!(
                    "public key share {} is not an element of the ring",
                    share.share_idx
                )));
            }
            b += &share.b;
        }
        Ok(Self::from_parts(crs.pk_a(), b))
    }

    pub(crate) fn check_shape(&self, param: &FhewParam) -> Result<()> {
        let ring_mod = param.ring_mod();
        let shape_ok = [&self.a, &self.b]
            .iter()
            .all(|p| p.dimension() == param.ring_size() && p.modulus() == ring_mod);
        if !shape_ok {
            return Err(FhewError::KeyParameterMismatch(format!(
                "public key over {:?} with ring size {}, expected {:?} with ring size {}",
                self.modulus().modulus(),
                self.ring_dim(),
                param.modulus(),
                param.ring_size()
            )));
        }
        Ok(())
    }
}

pub(crate) fn check_share_idx(param: &FhewParam, share_idx: usize) -> Result<()> {
    if share_idx >= param.total_shares() {
        return Err(FhewError::InvalidPartyIndex {
            index: share_idx,
            total: param.total_shares(),
        });
    }
    Ok(())
}

/// Public key in evaluation form, for repeated encryptions of zero.
pub(crate) struct PreparedPublicKey<'a> {
    ring: &'a Ring,
    a: EvalPoly,
    b: EvalPoly,
}

impl<'a> PreparedPublicKey<'a> {
    pub(crate) fn new(ring: &'a Ring, pk: &RlwePublicKey) -> Self {
        Self {
            ring,
            a: ring.to_eval(&pk.a),
            b: ring.to_eval(&pk.b),
        }
    }

    /// `(pk.a·u + e0, pk.b·u + e1)` with `u` drawn from `u_dist`.
    pub(crate) fn encrypt_zero<R: Rng>(
        &self,
        u_dist: SecretDistribution,
        sampler: &GaussianSampler,
        rng: &mut R,
    ) -> Result<RlweCiphertext> {
        let n = self.ring.dimension();
        let modulus = self.ring.modulus();
        let u = self.ring.small_to_eval(&u_dist.sample_vec(n, rng)?);

        let mut a = self.ring.from_eval(self.ring.eval_mul(&self.a, &u));
        a += &sampler.sample_poly(n, modulus, rng);
        let mut b = self.ring.from_eval(self.ring.eval_mul(&self.b, &u));
        b += &sampler.sample_poly(n, modulus, rng);
        Ok(RlweCiphertext::from_parts(a, b))
    }
}
