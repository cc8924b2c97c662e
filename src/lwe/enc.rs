//! LWE key sampling, encryption and phase computation

use crate::codec::{tag, ByteReader, ByteWriter, Codec};
use crate::error::{invalid_param, malformed, Result};
use crate::math::sampling::secret_coeffs_in_range;
use crate::math::ModQ;
use crate::params::{SecretDistribution, MAX_LWE_DIMENSION, MAX_SECRET_COEFF};
use crate::rng::{expand, Domain, Seed};

use super::types::{LweCiphertext, LweSecretKey};

impl LweSecretKey {
    /// Sample a key of `dimension` coefficients from `dist`.
    ///
    /// Deterministic in `seed`; the stream is separated from RLWE key
    /// sampling so one seed can serve both keys.
    ///
    /// # Errors
    ///
    /// - [`FhewError::InvalidParameter`](crate::FhewError::InvalidParameter) for a zero dimension
    /// - [`FhewError::InvalidDistribution`](crate::FhewError::InvalidDistribution) for a bad σ
    pub fn sample(dimension: usize, dist: SecretDistribution, seed: &Seed) -> Result<Self> {
        if !(1..=MAX_LWE_DIMENSION).contains(&dimension) {
            return Err(invalid_param!(
                "lwe dimension {} must be in 1..={}",
                dimension,
                MAX_LWE_DIMENSION
            ));
        }
        let mut rng = expand(seed, Domain::LweSecretKey);
        let coeffs = dist.sample_vec(dimension, &mut rng)?;
        Ok(Self { coeffs })
    }
}

impl LweCiphertext {
    /// Encrypt `message` under `sk` with a caller-chosen mask.
    ///
    /// The mask typically comes from the CRS, so only `b` carries
    /// party-specific information.
    pub fn encrypt_with_mask(
        a: Vec<u64>,
        sk: &LweSecretKey,
        message: u64,
        error: i64,
        modulus: ModQ,
    ) -> Self {
        debug_assert_eq!(a.len(), sk.dimension(), "mask and key dimensions differ");
        let a_s = inner_product(&a, &sk.coeffs, modulus);
        let b = modulus.add(modulus.sub(modulus.from_i64(error), a_s), message);
        Self { a, b }
    }

    /// Phase `b + <a, s> = m + e mod q`.
    pub fn phase(&self, sk: &LweSecretKey, modulus: ModQ) -> u64 {
        modulus.add(self.b, inner_product(&self.a, &sk.coeffs, modulus))
    }
}

/// `<a, s> mod q` for a small signed `s`.
pub(crate) fn inner_product(a: &[u64], s: &[i32], modulus: ModQ) -> u64 {
    // |a_i * s_i| < 2^83 and n <= 2^16, so the sum fits an i128
    let acc: i128 = a
        .iter()
        .zip(s)
        .map(|(&ai, &si)| ai as i128 * si as i128)
        .sum();
    modulus.reduce_i128(acc)
}

impl Codec for LweSecretKey {
    const TAG: u8 = tag::LWE_SECRET_KEY;

    fn encode_body(&self, writer: &mut ByteWriter) {
        writer.put_u32(self.coeffs.len() as u32);
        for &c in &self.coeffs {
            writer.put_i32(c);
        }
    }

    fn decode_body(reader: &mut ByteReader<'_>) -> Result<Self> {
        let dimension = reader.get_len("lwe dimension", MAX_LWE_DIMENSION)?;
        let coeffs = (0..dimension)
            .map(|_| reader.get_i32())
            .collect::<Result<Vec<_>>>()?;
        if !secret_coeffs_in_range(&coeffs) {
            return Err(malformed!(
                "secret key coefficient exceeds ±{}",
                MAX_SECRET_COEFF
            ));
        }
        Ok(Self { coeffs })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FhewError;
    use crate::math::GaussianSampler;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn test_sample_is_deterministic() {
        let seed = Seed::new([5; 32]);
        let a = LweSecretKey::sample(300, SecretDistribution::Ternary, &seed).unwrap();
        let b = LweSecretKey::sample(300, SecretDistribution::Ternary, &seed).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.dimension(), 300);

        let c = LweSecretKey::sample(300, SecretDistribution::Ternary, &Seed::zero()).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn test_sample_rejects_bad_input() {
        assert!(matches!(
            LweSecretKey::sample(0, SecretDistribution::Ternary, &Seed::zero()),
            Err(FhewError::InvalidParameter(_))
        ));
        assert!(matches!(
            LweSecretKey::sample(16, SecretDistribution::Gaussian(-1.0), &Seed::zero()),
            Err(FhewError::InvalidDistribution(_))
        ));
    }

    #[test]
    fn test_encrypt_phase() {
        let modulus = ModQ::power_of_two(16);
        let sk = LweSecretKey::sample(64, SecretDistribution::Ternary, &Seed::zero()).unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let sampler = GaussianSampler::new(3.19).unwrap();

        let message = 1u64 << 13;
        let e = sampler.sample(&mut rng);
        let a = modulus.sample_uniform_vec(64, &mut rng);
        let ct = LweCiphertext::encrypt_with_mask(a, &sk, message, e, modulus);

        let noise = modulus.to_i64(modulus.sub(ct.phase(&sk, modulus), message));
        assert_eq!(noise, e);
    }

    #[test]
    fn test_inner_product_wraps() {
        let modulus = ModQ::power_of_two(64);
        let a = vec![u64::MAX, u64::MAX];
        let s = vec![1, -1];
        assert_eq!(inner_product(&a, &s, modulus), 0);
        assert_eq!(inner_product(&a, &[2, 0], modulus), u64::MAX - 1);
    }

    #[test]
    fn test_codec_roundtrip() {
        let sk = LweSecretKey::from_coeffs(vec![-1, 0, 1, 7, -400]);
        let bytes = sk.to_bytes();
        assert_eq!(bytes[0], tag::LWE_SECRET_KEY);
        assert_eq!(bytes.len(), 2 + 4 + 5 * 4);
        let decoded = LweSecretKey::from_bytes(&bytes).unwrap();
        assert_eq!(decoded, sk);
        assert_eq!(decoded.to_bytes(), bytes);

        assert!(matches!(
            LweSecretKey::from_bytes(&bytes[..bytes.len() - 1]),
            Err(FhewError::TruncatedInput { .. })
        ));
    }

    #[test]
    fn test_codec_rejects_oversized_coefficient() {
        let mut bytes = LweSecretKey::from_coeffs(vec![1, 0, -1]).to_bytes();
        bytes[6..10].copy_from_slice(&i32::MIN.to_le_bytes());
        assert!(matches!(
            LweSecretKey::from_bytes(&bytes),
            Err(FhewError::MalformedEncoding(_))
        ));
    }

    #[test]
    fn test_serde_json() {
        let sk = LweSecretKey::from_coeffs(vec![-1, 0, 1, 7]);
        let json = serde_json::to_string(&sk).unwrap();
        assert_eq!(serde_json::from_str::<LweSecretKey>(&json).unwrap(), sk);

        let ct = LweCiphertext::from_parts(vec![3, 5, 7], 11);
        let json = serde_json::to_string(&ct).unwrap();
        assert_eq!(serde_json::from_str::<LweCiphertext>(&json).unwrap(), ct);

        let too_big = format!(r#"{{"coeffs":[0,{}]}}"#, MAX_SECRET_COEFF + 1);
        assert!(serde_json::from_str::<LweSecretKey>(&too_big).is_err());
        assert!(serde_json::from_str::<LweSecretKey>(r#"{"coeffs":[]}"#).is_err());
    }
}
