//! One party's share of the joint bootstrapping key
//!
//! # Contents
//!
//! | Part | Shape | Mask |
//! |------|-------|------|
//! | automorphism key share | `w + 1` indices × `level` ring bodies | CRS |
//! | blind-rotation key share | `lwe_dimension` RGSW ciphertexts × `level_a + level_b` rows | fresh, under the joint pk |
//! | LWE key-switching key share | `ring_size` × `level` scalar bodies | CRS |
//!
//! The shape depends only on the parameter set, never on the party or its
//! keys, so shares from all parties line up entry by entry.
//!
//! # Encoding
//!
//! ```text
//! [param body][crs seed: 32][share_idx: u32]
//! [auto: for k in sorted indices, level packed polys]
//! [brk: lwe_dimension × rows × (packed a, packed b)]
//! [lwe ks: one packed block of ring_size × level values]
//! ```

mod generate;

use std::collections::BTreeMap;

use crate::codec::{tag, ByteReader, ByteWriter, Codec};
use crate::crs::FhewCrs;
use crate::error::{malformed, Result};
use crate::ks::{AutoKeyShare, LweKeySwitchKeyShare};
use crate::lwe::LweCiphertext;
use crate::params::FhewParam;
use crate::rgsw::RgswCiphertext;
use crate::rlwe::RlweCiphertext;
use crate::rng::Seed;

/// Bootstrapping key share of party `share_idx`.
#[derive(Clone, Debug, PartialEq)]
pub struct FhewBootstrappingKeyShare {
    param: FhewParam,
    crs: FhewCrs,
    share_idx: usize,
    auto_keys: BTreeMap<usize, AutoKeyShare>,
    brk: Vec<RgswCiphertext>,
    lwe_ks: LweKeySwitchKeyShare,
}

impl FhewBootstrappingKeyShare {
    pub fn param(&self) -> &FhewParam {
        &self.param
    }

    pub fn crs(&self) -> &FhewCrs {
        &self.crs
    }

    pub fn share_idx(&self) -> usize {
        self.share_idx
    }

    /// Automorphism key share, keyed by automorphism index.
    pub fn auto_key_shares(&self) -> &BTreeMap<usize, AutoKeyShare> {
        &self.auto_keys
    }

    /// Blind-rotation key share, one RGSW ciphertext per LWE coefficient.
    pub fn brk_share(&self) -> &[RgswCiphertext] {
        &self.brk
    }

    pub fn lwe_ks_share(&self) -> &LweKeySwitchKeyShare {
        &self.lwe_ks
    }

    /// Rows of the automorphism key for index `k` with their CRS masks, or
    /// `None` if `k` is not one of the parameter set's indices.
    pub fn auto_key_ciphertexts(&self, k: usize) -> Option<Vec<RlweCiphertext>> {
        self.auto_keys.get(&k).map(|share| share.ciphertexts(&self.crs, k))
    }

    /// Row `(i, j)` of the LWE key-switching key with its CRS mask.
    pub fn lwe_ks_ciphertext(&self, i: usize, j: usize) -> Option<LweCiphertext> {
        (i < self.lwe_ks.ring_size() && j < self.lwe_ks.level())
            .then(|| self.lwe_ks.ciphertext(&self.crs, i, j))
    }
}

impl Codec for FhewBootstrappingKeyShare {
    const TAG: u8 = tag::BOOTSTRAPPING_KEY_SHARE;

    fn encode_body(&self, w: &mut ByteWriter) {
        self.param.encode_body(w);
        w.put_bytes(self.crs.seed().as_bytes());
        w.put_u32(self.share_idx as u32);

        for share in self.auto_keys.values() {
            for b in share.bodies() {
                w.put_poly(b);
            }
        }
        for rgsw in &self.brk {
            for row in rgsw.rows() {
                w.put_poly(&row.a);
                w.put_poly(&row.b);
            }
        }
        w.put_packed(self.lwe_ks.bodies(), self.param.lwe_mod());
    }

    fn decode_body(r: &mut ByteReader<'_>) -> Result<Self> {
        let param = FhewParam::decode_body(r)?;
        let crs = FhewCrs::derive(Seed::new(r.get_array()?), &param);
        let share_idx = r.get_u32()? as usize;
        if share_idx >= param.total_shares() {
            return Err(malformed!(
                "share index {} out of range for {} shares",
                share_idx,
                param.total_shares()
            ));
        }

        let n = param.ring_size();
        let ring_mod = param.ring_mod();

        let auto_level = param.auto_decomposition_param().level as usize;
        let mut indices = param.auto_indices();
        indices.sort_unstable();
        let mut auto_keys = BTreeMap::new();
        for k in indices {
            let b = (0..auto_level)
                .map(|_| r.get_poly(n, ring_mod))
                .collect::<Result<Vec<_>>>()?;
            auto_keys.insert(k, AutoKeyShare::from_bodies(b));
        }

        let decomp = param.rgsw_by_rgsw_decomposition_param();
        let mut get_rows = |count: u32| {
            (0..count)
                .map(|_| {
                    let a = r.get_poly(n, ring_mod)?;
                    let b = r.get_poly(n, ring_mod)?;
                    Ok(RlweCiphertext::from_parts(a, b))
                })
                .collect::<Result<Vec<_>>>()
        };
        let brk = (0..param.lwe_dimension())
            .map(|_| {
                let a_rows = get_rows(decomp.level_a)?;
                let b_rows = get_rows(decomp.level_b)?;
                Ok(RgswCiphertext::from_rows(a_rows, b_rows))
            })
            .collect::<Result<Vec<_>>>()?;

        let ks_level = param.lwe_ks_decomposition_param().level as usize;
        let lwe_ks = LweKeySwitchKeyShare::from_bodies(
            ks_level,
            r.get_packed(n * ks_level, param.lwe_mod())?,
        );

        Ok(Self {
            param,
            crs,
            share_idx,
            auto_keys,
            brk,
            lwe_ks,
        })
    }
}
