//! Bootstrapping key share generation

use rayon::prelude::*;

use crate::crs::FhewCrs;
use crate::error::{FhewError, Result};
use crate::ks::{AutoKeyShare, LweKeySwitchKeyShare};
use crate::lwe::LweSecretKey;
use crate::math::sampling::secret_coeffs_in_range;
use crate::math::{GadgetVector, Ring};
use crate::params::{FhewParam, MAX_SECRET_COEFF};
use crate::rgsw::RgswCiphertext;
use crate::rlwe::{check_share_idx, PreparedPublicKey, RlwePublicKey, RlweSecretKey};
use crate::rng::{Domain, Seed};

use super::FhewBootstrappingKeyShare;

impl FhewBootstrappingKeyShare {
    /// Generate party `share_idx`'s share of the bootstrapping key.
    ///
    /// - `sk`: the party's RLWE secret key
    /// - `pk`: the joint RLWE public key the blind-rotation key is encrypted under
    /// - `sk_ks`: the party's LWE secret key, target of key switching
    /// - `seed`: private randomness, expanded per entry so the result does
    ///   not depend on how rayon schedules the work
    ///
    /// # Errors
    ///
    /// In order of checking:
    /// - [`FhewError::InvalidPartyIndex`] if `share_idx >= total_shares`
    /// - [`FhewError::CrsParameterMismatch`] if `crs` belongs to other parameters
    /// - [`FhewError::KeyParameterMismatch`] if any key has the wrong shape
    pub fn generate(
        param: &FhewParam,
        crs: &FhewCrs,
        share_idx: usize,
        sk: &RlweSecretKey,
        pk: &RlwePublicKey,
        sk_ks: &LweSecretKey,
        seed: &Seed,
    ) -> Result<Self> {
        check_share_idx(param, share_idx)?;
        crs.check(param)?;
        sk.check_shape(param)?;
        pk.check_shape(param)?;
        if sk_ks.dimension() != param.lwe_dimension() {
            return Err(FhewError::KeyParameterMismatch(format!(
                "lwe secret key has {} coefficients, lwe dimension is {}",
                sk_ks.dimension(),
                param.lwe_dimension()
            )));
        }
        if !secret_coeffs_in_range(sk_ks.coeffs()) {
            return Err(FhewError::KeyParameterMismatch(format!(
                "lwe secret key coefficient exceeds ±{}",
                MAX_SECRET_COEFF
            )));
        }

        let ring = Ring::new(param.ring_mod(), param.ring_size());
        let noise = param.noise_distribution().sampler()?;
        let lwe_noise = param.lwe_noise_distribution().sampler()?;
        let expander = crs.party_expander(seed, Domain::KeyShare, share_idx);

        // Automorphism key share
        let auto = param.auto_decomposition_param();
        let auto_gadget = GadgetVector::new(param.ring_mod(), auto.log_base, auto.level);
        let s_eval = ring.small_to_eval(sk.coeffs());
        let auto_keys = param
            .auto_indices()
            .into_par_iter()
            .map(|k| {
                let mut rng = expander.stream("auto-key", &[k as u64]);
                let share =
                    AutoKeyShare::generate(crs, k, &ring, sk, &s_eval, &auto_gadget, &noise, &mut rng);
                (k, share)
            })
            .collect();

        // Blind-rotation key share: RGSW(X^{z_i·2N/q}) under the joint key
        let decomp = param.rgsw_by_rgsw_decomposition_param();
        let gadget_a = GadgetVector::new(param.ring_mod(), decomp.log_base, decomp.level_a);
        let gadget_b = GadgetVector::new(param.ring_mod(), decomp.log_base, decomp.level_b);
        let prepared = PreparedPublicKey::new(&ring, pk);
        let two_n = 2 * param.ring_size() as i64;
        let factor = param.embedding_factor() as i64;
        let brk = sk_ks
            .coeffs()
            .par_iter()
            .enumerate()
            .map(|(i, &z)| {
                let mut rng = expander.stream("brk", &[i as u64]);
                let exp = (z as i64 * factor).rem_euclid(two_n) as usize;
                RgswCiphertext::pk_encrypt_monomial(
                    &prepared,
                    exp,
                    &gadget_a,
                    &gadget_b,
                    param.u_distribution(),
                    &noise,
                    &mut rng,
                )
            })
            .collect::<Result<Vec<_>>>()?;

        // LWE key-switching key share
        let ks = param.lwe_ks_decomposition_param();
        let ks_gadget = GadgetVector::new(param.lwe_mod(), ks.log_base, ks.level);
        let rows: Vec<Vec<u64>> = sk
            .coeffs()
            .par_iter()
            .enumerate()
            .map(|(i, &s_i)| {
                let mut rng = expander.stream("lwe-ks", &[i as u64]);
                LweKeySwitchKeyShare::generate_rows(crs, i, s_i, sk_ks, &ks_gadget, &lwe_noise, &mut rng)
            })
            .collect();
        let lwe_ks = LweKeySwitchKeyShare::from_bodies(ks.level as usize, rows.concat());

        Ok(Self {
            param: *param,
            crs: crs.clone(),
            share_idx,
            auto_keys,
            brk,
            lwe_ks,
        })
    }
}
