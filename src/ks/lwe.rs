//! LWE key-switching key shares

use rand::Rng;

use crate::crs::FhewCrs;
use crate::lwe::{LweCiphertext, LweSecretKey};
use crate::math::{GadgetVector, GaussianSampler};

/// One party's bodies of the LWE key-switching key from the ring key `s` to
/// the LWE key `z`.
///
/// Row `(i, j)` is stored at `i * level + j`; its mask is
/// `crs.lwe_ks_a(i, j)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LweKeySwitchKeyShare {
    pub(crate) level: usize,
    pub(crate) b: Vec<u64>,
}

impl LweKeySwitchKeyShare {
    pub fn from_bodies(level: usize, b: Vec<u64>) -> Self {
        debug_assert!(level > 0 && b.len() % level == 0);
        Self { level, b }
    }

    pub fn level(&self) -> usize {
        self.level
    }

    /// Number of ring coefficients covered.
    pub fn ring_size(&self) -> usize {
        self.b.len() / self.level
    }

    pub fn bodies(&self) -> &[u64] {
        &self.b
    }

    /// Body of row `(i, j)`.
    pub fn body(&self, i: usize, j: usize) -> u64 {
        self.b[i * self.level + j]
    }

    /// Rows for coefficient `i`: `b_j = -<a_crs(i,j), z> + e_j + s_i·g_j`.
    pub(crate) fn generate_rows<R: Rng>(
        crs: &FhewCrs,
        i: usize,
        s_i: i32,
        sk_ks: &LweSecretKey,
        gadget: &GadgetVector,
        sampler: &GaussianSampler,
        rng: &mut R,
    ) -> Vec<u64> {
        let modulus = crs.param().lwe_mod();
        let s_i = modulus.from_i64(s_i as i64);
        gadget
            .values()
            .iter()
            .enumerate()
            .map(|(j, &g)| {
                LweCiphertext::encrypt_with_mask(
                    crs.lwe_ks_a(i, j),
                    sk_ks,
                    modulus.mul(s_i, g),
                    sampler.sample(rng),
                    modulus,
                )
                .b
            })
            .collect()
    }

    /// Full ciphertext of row `(i, j)`, mask expanded from the CRS.
    pub fn ciphertext(&self, crs: &FhewCrs, i: usize, j: usize) -> LweCiphertext {
        LweCiphertext::from_parts(crs.lwe_ks_a(i, j), self.body(i, j))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{FhewParam, SecretDistribution};
    use crate::rng::{expand, Domain, Seed};

    #[test]
    fn test_rows_decrypt_to_scaled_coefficient() {
        let param = FhewParam::i_4p_60();
        let crs = FhewCrs::derive(Seed::zero(), &param);
        let sk_ks = LweSecretKey::sample(param.lwe_dimension(), SecretDistribution::Ternary, &Seed::zero()).unwrap();
        let decomp = param.lwe_ks_decomposition_param();
        let modulus = param.lwe_mod();
        let gadget = GadgetVector::new(modulus, decomp.log_base, decomp.level);
        let sampler = param.lwe_noise_distribution().sampler().unwrap();
        let mut rng = expand(&Seed::zero(), Domain::KeyShare);

        for (i, s_i) in [(0usize, -1i32), (7, 0), (1023, 1)] {
            let b = LweKeySwitchKeyShare::generate_rows(&crs, i, s_i, &sk_ks, &gadget, &sampler, &mut rng);
            let share = LweKeySwitchKeyShare::from_bodies(decomp.level as usize, b);
            assert_eq!(share.ring_size(), 1);
            for (j, &g) in gadget.values().iter().enumerate() {
                // the share above only holds row i, stored at position 0
                let ct = LweCiphertext::from_parts(crs.lwe_ks_a(i, j), share.body(0, j));
                let expected = modulus.mul(modulus.from_i64(s_i as i64), g);
                let noise = modulus.to_i64(modulus.sub(ct.phase(&sk_ks, modulus), expected));
                assert!(noise.unsigned_abs() <= sampler.bound() as u64);
            }
        }
    }
}
