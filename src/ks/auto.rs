//! Automorphism key shares

use rand::Rng;

use crate::crs::FhewCrs;
use crate::math::{EvalPoly, GadgetVector, GaussianSampler, Poly, Ring};
use crate::rlwe::{automorphism_small, RlweCiphertext, RlweSecretKey};

/// One party's rows of the automorphism key for a single index `k`.
///
/// Only bodies are stored; row j's mask is `crs.auto_key_a(k, j)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AutoKeyShare {
    pub(crate) b: Vec<Poly>,
}

impl AutoKeyShare {
    pub fn from_bodies(b: Vec<Poly>) -> Self {
        Self { b }
    }

    /// Body of row `j`.
    pub fn bodies(&self) -> &[Poly] {
        &self.b
    }

    pub fn level(&self) -> usize {
        self.b.len()
    }

    /// Rows for index `k`: `b_j = -a_crs(k,j)·s + e_j + τ_k(s)·g_j`.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn generate<R: Rng>(
        crs: &FhewCrs,
        k: usize,
        ring: &Ring,
        sk: &RlweSecretKey,
        s_eval: &EvalPoly,
        gadget: &GadgetVector,
        sampler: &GaussianSampler,
        rng: &mut R,
    ) -> Self {
        let s_k = Poly::from_signed(&automorphism_small(sk.coeffs(), k), ring.modulus());
        let b = gadget
            .values()
            .iter()
            .enumerate()
            .map(|(j, &g)| {
                let message = s_k.scalar_mul(g);
                RlweCiphertext::encrypt_with_mask(
                    crs.auto_key_a(k, j),
                    ring,
                    s_eval,
                    Some(&message),
                    sampler,
                    rng,
                )
                .b
            })
            .collect();
        Self { b }
    }

    /// Full ciphertexts for index `k`, masks expanded from the CRS.
    pub fn ciphertexts(&self, crs: &FhewCrs, k: usize) -> Vec<RlweCiphertext> {
        self.b
            .iter()
            .enumerate()
            .map(|(j, b)| RlweCiphertext::from_parts(crs.auto_key_a(k, j), b.clone()))
            .collect()
    }
}
