//! Common reference string
//!
//! All parties agree on one 32-byte seed. Every public mask used in key
//! generation is expanded from it on demand:
//!
//! - `pk_a`: mask of the joint public key
//! - `auto_key_a(k, j)`: mask of automorphism key row `j` for index `k`
//! - `lwe_ks_a(i, j)`: mask of LWE key-switching row `(i, j)`
//!
//! Each mask has its own stream, keyed by the seed and the digest of the
//! parameter set, so masks can be produced in any order or in parallel and
//! a CRS can never be silently reused under different parameters.

use crate::codec::{tag, ByteReader, ByteWriter, Codec};
use crate::error::{FhewError, Result};
use crate::math::Poly;
use crate::params::FhewParam;
use crate::rng::{Domain, Seed, SeedExpander};

/// Common reference string bound to one parameter set.
#[derive(Clone, Debug, PartialEq)]
pub struct FhewCrs {
    seed: Seed,
    param: FhewParam,
    param_digest: [u8; 32],
    expander: SeedExpander,
}

impl FhewCrs {
    /// Derive the CRS for `param` from `seed`. Pure and deterministic.
    pub fn derive(seed: Seed, param: &FhewParam) -> Self {
        let param_digest = param.digest();
        Self {
            seed,
            param: *param,
            param_digest,
            expander: SeedExpander::with_binding(&seed, Domain::Crs, &param_digest),
        }
    }

    pub fn seed(&self) -> &Seed {
        &self.seed
    }

    /// Parameter set the CRS was derived for.
    pub fn param(&self) -> &FhewParam {
        &self.param
    }

    pub fn param_digest(&self) -> &[u8; 32] {
        &self.param_digest
    }

    /// Fail with [`FhewError::CrsParameterMismatch`] unless the CRS was
    /// derived for `param`.
    pub fn check(&self, param: &FhewParam) -> Result<()> {
        if self.param_digest != param.digest() {
            return Err(FhewError::CrsParameterMismatch);
        }
        Ok(())
    }

    /// Mask of the joint public key.
    pub fn pk_a(&self) -> Poly {
        let mut rng = self.expander.stream("pk-a", &[]);
        Poly::random(self.param.ring_size(), self.param.ring_mod(), &mut rng)
    }

    /// Mask of automorphism key row `j` for automorphism index `k`.
    pub fn auto_key_a(&self, k: usize, j: usize) -> Poly {
        let mut rng = self.expander.stream("auto-key", &[k as u64, j as u64]);
        Poly::random(self.param.ring_size(), self.param.ring_mod(), &mut rng)
    }

    /// Mask of LWE key-switching row `j` for ring coefficient `i`.
    pub fn lwe_ks_a(&self, i: usize, j: usize) -> Vec<u64> {
        let mut rng = self.expander.stream("lwe-ks", &[i as u64, j as u64]);
        self.param
            .lwe_mod()
            .sample_uniform_vec(self.param.lwe_dimension(), &mut rng)
    }

    /// Expander for one party's private randomness, bound to this CRS's
    /// parameters and to `share_idx`.
    pub(crate) fn party_expander(&self, seed: &Seed, domain: Domain, share_idx: usize) -> SeedExpander {
        let mut binding = Vec::with_capacity(40);
        binding.extend_from_slice(&self.param_digest);
        binding.extend_from_slice(&(share_idx as u64).to_le_bytes());
        SeedExpander::with_binding(seed, domain, &binding)
    }
}

impl Codec for FhewCrs {
    const TAG: u8 = tag::CRS;

    fn encode_body(&self, writer: &mut ByteWriter) {
        self.param.encode_body(writer);
        writer.put_bytes(self.seed.as_bytes());
    }

    fn decode_body(reader: &mut ByteReader<'_>) -> Result<Self> {
        let param = FhewParam::decode_body(reader)?;
        let seed = Seed::new(reader.get_array()?);
        Ok(Self::derive(seed, &param))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::I_4P;

    #[test]
    fn test_derive_is_deterministic() {
        let param = FhewParam::i_4p();
        let a = FhewCrs::derive(Seed::zero(), &param);
        let b = FhewCrs::derive(Seed::zero(), &param);
        assert_eq!(a, b);
        assert_eq!(a.pk_a(), b.pk_a());
        assert_eq!(a.auto_key_a(5, 0), b.auto_key_a(5, 0));
        assert_eq!(a.lwe_ks_a(17, 3), b.lwe_ks_a(17, 3));
    }

    #[test]
    fn test_masks_are_independent() {
        let param = FhewParam::i_4p();
        let crs = FhewCrs::derive(Seed::zero(), &param);
        assert_ne!(crs.auto_key_a(5, 0), crs.auto_key_a(25, 0));
        assert_ne!(crs.pk_a(), crs.auto_key_a(0, 0));
        assert_ne!(crs.lwe_ks_a(0, 1), crs.lwe_ks_a(1, 0));
    }

    #[test]
    fn test_shapes_follow_param() {
        let param = FhewParam::i_4p();
        let crs = FhewCrs::derive(Seed::new([1; 32]), &param);
        assert_eq!(crs.pk_a().dimension(), 2048);
        assert_eq!(crs.pk_a().modulus(), param.ring_mod());
        let a = crs.lwe_ks_a(2047, 12);
        assert_eq!(a.len(), 620);
        assert!(a.iter().all(|&v| v < 1 << 16));
    }

    #[test]
    fn test_check_rejects_other_param() {
        let crs = FhewCrs::derive(Seed::zero(), &FhewParam::i_4p());
        assert!(crs.check(&FhewParam::i_4p()).is_ok());
        assert_eq!(
            crs.check(&FhewParam::i_4p_60()),
            Err(FhewError::CrsParameterMismatch)
        );

        let mut config = I_4P;
        config.total_shares = 3;
        let other = FhewParam::new(config).unwrap();
        assert!(crs.check(&other).is_err());
        // same seed, different parameters, different masks
        assert_ne!(FhewCrs::derive(Seed::zero(), &other).pk_a(), crs.pk_a());
    }

    #[test]
    fn test_codec_roundtrip() {
        let crs = FhewCrs::derive(Seed::new([42; 32]), &FhewParam::i_4p_60());
        let bytes = crs.to_bytes();
        let decoded = FhewCrs::from_bytes(&bytes).unwrap();
        assert_eq!(decoded, crs);
        assert_eq!(decoded.to_bytes(), bytes);

        assert!(matches!(
            FhewCrs::from_bytes(&bytes[..bytes.len() - 4]),
            Err(FhewError::TruncatedInput { .. })
        ));
    }
}
