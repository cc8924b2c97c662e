//! RLWE ciphertext and key types.
//!
//! Ring-LWE over R_Q = Z_Q[X]/(X^N + 1).

use std::fmt;

use serde::{de, Deserialize, Deserializer, Serialize};

use crate::codec::{tag, ByteReader, ByteWriter, Codec};
use crate::error::{malformed, Result};
use crate::math::sampling::secret_coeffs_in_range;
use crate::math::{ModQ, Poly};
use crate::params::{MAX_RING_SIZE, MAX_SECRET_COEFF};

/// RLWE secret key: small signed coefficients of a ring element.
///
/// Coefficients are kept signed so that automorphisms and products with
/// uniform ring elements can be computed without fixing a modulus up front.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct RlweSecretKey {
    pub(crate) coeffs: Vec<i32>,
}

/// RLWE ciphertext: (a, b) ∈ R_Q × R_Q where b = -a·s + e + m.
///
/// # Decryption
///
/// The phase `b + a·s = m + e`; recovering `m` is left to the caller.
///
/// # Example
///
/// ```
/// use threshold_fhew::math::{ModQ, Poly};
/// use threshold_fhew::rlwe::RlweCiphertext;
///
/// let q = ModQ::prime(18014398509404161);
/// let ct = RlweCiphertext::from_parts(Poly::zero(256, q), Poly::zero(256, q));
/// assert_eq!(ct.ring_dim(), 256);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RlweCiphertext {
    /// Mask polynomial.
    pub a: Poly,
    /// Body polynomial: b = -a·s + e + m.
    pub b: Poly,
}

/// RLWE public key: an encryption of zero, (a, b = -a·s + e).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RlwePublicKey {
    pub a: Poly,
    pub b: Poly,
}

/// One party's contribution to a joint public key.
///
/// The mask is the CRS polynomial `a`, so only `b_i = -a·s_i + e_i` is kept.
/// Summing the bodies of all parties gives a public key under `Σ s_i`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RlwePublicKeyShare {
    pub(crate) share_idx: usize,
    pub(crate) b: Poly,
}

impl RlweSecretKey {
    /// Wrap existing coefficients.
    pub fn from_coeffs(coeffs: Vec<i32>) -> Self {
        Self { coeffs }
    }

    pub fn ring_size(&self) -> usize {
        self.coeffs.len()
    }

    pub fn coeffs(&self) -> &[i32] {
        &self.coeffs
    }

    /// The key lifted into R_Q.
    pub fn to_poly(&self, modulus: ModQ) -> Poly {
        Poly::from_signed(&self.coeffs, modulus)
    }
}

impl fmt::Debug for RlweSecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RlweSecretKey")
            .field("ring_size", &self.coeffs.len())
            .finish_non_exhaustive()
    }
}

impl<'de> Deserialize<'de> for RlweSecretKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Raw {
            coeffs: Vec<i32>,
        }

        let Raw { coeffs } = Raw::deserialize(deserializer)?;
        let n = coeffs.len();
        if !n.is_power_of_two() || !(2..=MAX_RING_SIZE).contains(&n) {
            return Err(de::Error::custom(format!(
                "ring size {} is not a power of two in 2..={}",
                n, MAX_RING_SIZE
            )));
        }
        if !secret_coeffs_in_range(&coeffs) {
            return Err(de::Error::custom(format!(
                "secret key coefficient exceeds ±{}",
                MAX_SECRET_COEFF
            )));
        }
        Ok(Self { coeffs })
    }
}

impl RlweCiphertext {
    /// Creates a ciphertext from component polynomials.
    ///
    /// # Panics
    ///
    /// Debug-asserts that `a` and `b` have the same dimension and modulus.
    pub fn from_parts(a: Poly, b: Poly) -> Self {
        debug_assert_eq!(
            a.dimension(),
            b.dimension(),
            "ciphertext polynomials must have same dimension"
        );
        debug_assert_eq!(
            a.modulus(),
            b.modulus(),
            "ciphertext polynomials must have same modulus"
        );
        Self { a, b }
    }

    pub fn ring_dim(&self) -> usize {
        self.a.dimension()
    }

    pub fn modulus(&self) -> ModQ {
        self.a.modulus()
    }
}

impl RlwePublicKey {
    pub fn from_parts(a: Poly, b: Poly) -> Self {
        debug_assert_eq!(a.dimension(), b.dimension());
        debug_assert_eq!(a.modulus(), b.modulus());
        Self { a, b }
    }

    pub fn ring_dim(&self) -> usize {
        self.a.dimension()
    }

    pub fn modulus(&self) -> ModQ {
        self.a.modulus()
    }

    /// View the key as the ciphertext it is.
    pub fn as_ciphertext(&self) -> RlweCiphertext {
        RlweCiphertext::from_parts(self.a.clone(), self.b.clone())
    }
}

impl RlwePublicKeyShare {
    pub fn share_idx(&self) -> usize {
        self.share_idx
    }

    /// Body polynomial `b_i`.
    pub fn b(&self) -> &Poly {
        &self.b
    }
}

fn get_ring_size(reader: &mut ByteReader<'_>) -> Result<usize> {
    let n = reader.get_len("ring size", MAX_RING_SIZE)?;
    if !n.is_power_of_two() || n < 2 {
        return Err(malformed!("ring size {} is not a power of two >= 2", n));
    }
    Ok(n)
}

impl Codec for RlweSecretKey {
    const TAG: u8 = tag::RLWE_SECRET_KEY;

    fn encode_body(&self, writer: &mut ByteWriter) {
        writer.put_u32(self.coeffs.len() as u32);
        for &c in &self.coeffs {
            writer.put_i32(c);
        }
    }

    fn decode_body(reader: &mut ByteReader<'_>) -> Result<Self> {
        let n = get_ring_size(reader)?;
        let coeffs = (0..n)
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

impl Codec for RlwePublicKey {
    const TAG: u8 = tag::RLWE_PUBLIC_KEY;

    fn encode_body(&self, writer: &mut ByteWriter) {
        writer.put_modulus(self.modulus().modulus());
        writer.put_u32(self.ring_dim() as u32);
        writer.put_poly(&self.a);
        writer.put_poly(&self.b);
    }

    fn decode_body(reader: &mut ByteReader<'_>) -> Result<Self> {
        let modulus = ModQ::from(reader.get_modulus()?);
        let n = get_ring_size(reader)?;
        let a = reader.get_poly(n, modulus)?;
        let b = reader.get_poly(n, modulus)?;
        Ok(Self { a, b })
    }
}

impl Codec for RlwePublicKeyShare {
    const TAG: u8 = tag::RLWE_PUBLIC_KEY_SHARE;

    fn encode_body(&self, writer: &mut ByteWriter) {
        writer.put_modulus(self.b.modulus().modulus());
        writer.put_u32(self.b.dimension() as u32);
        writer.put_u32(self.share_idx as u32);
        writer.put_poly(&self.b);
    }

    fn decode_body(reader: &mut ByteReader<'_>) -> Result<Self> {
        let modulus = ModQ::from(reader.get_modulus()?);
        let n = get_ring_size(reader)?;
        let share_idx = reader.get_u32()? as usize;
        let b = reader.get_poly(n, modulus)?;
        Ok(Self { share_idx, b })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FhewError;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn test_secret_key_codec() {
        let sk = RlweSecretKey::from_coeffs(vec![1, -1, 0, 3]);
        let bytes = sk.to_bytes();
        assert_eq!(bytes.len(), 2 + 4 + 4 * 4);
        assert_eq!(RlweSecretKey::from_bytes(&bytes).unwrap(), sk);

        // ring size 3 is not a power of two
        let bad = RlweSecretKey::from_coeffs(vec![0, 0, 0]).to_bytes();
        assert!(matches!(
            RlweSecretKey::from_bytes(&bad),
            Err(FhewError::MalformedEncoding(_))
        ));
    }

    #[test]
    fn test_secret_key_codec_rejects_oversized_coefficient() {
        let mut bytes = RlweSecretKey::from_coeffs(vec![0, 1, -1, 0]).to_bytes();
        // second coefficient starts after tag, version and the ring size
        bytes[10..14].copy_from_slice(&i32::MIN.to_le_bytes());
        assert!(matches!(
            RlweSecretKey::from_bytes(&bytes),
            Err(FhewError::MalformedEncoding(_))
        ));

        let edge = RlweSecretKey::from_coeffs(vec![MAX_SECRET_COEFF, -MAX_SECRET_COEFF]);
        assert_eq!(RlweSecretKey::from_bytes(&edge.to_bytes()).unwrap(), edge);
        let over = RlweSecretKey::from_coeffs(vec![0, MAX_SECRET_COEFF + 1]).to_bytes();
        assert!(matches!(
            RlweSecretKey::from_bytes(&over),
            Err(FhewError::MalformedEncoding(_))
        ));
    }

    #[test]
    fn test_serde_json_keys() {
        let sk = RlweSecretKey::from_coeffs(vec![1, -1, 0, 2]);
        let json = serde_json::to_string(&sk).unwrap();
        assert_eq!(serde_json::from_str::<RlweSecretKey>(&json).unwrap(), sk);

        let q = ModQ::prime(18014398509404161);
        let mut rng = ChaCha20Rng::seed_from_u64(8);
        let pk = RlwePublicKey::from_parts(Poly::random(8, q, &mut rng), Poly::random(8, q, &mut rng));
        let json = serde_json::to_string(&pk).unwrap();
        assert_eq!(serde_json::from_str::<RlwePublicKey>(&json).unwrap(), pk);

        let share = RlwePublicKeyShare {
            share_idx: 2,
            b: pk.b.clone(),
        };
        let json = serde_json::to_string(&share).unwrap();
        assert_eq!(serde_json::from_str::<RlwePublicKeyShare>(&json).unwrap(), share);
    }

    #[test]
    fn test_serde_json_rejects_bad_secret_key() {
        let json = format!(r#"{{"coeffs":[0,{},1,0]}}"#, i32::MIN);
        assert!(serde_json::from_str::<RlweSecretKey>(&json).is_err());
        // ring size 3 is not a power of two
        assert!(serde_json::from_str::<RlweSecretKey>(r#"{"coeffs":[0,1,0]}"#).is_err());
    }

    #[test]
    fn test_public_key_codec_native_modulus() {
        let q = ModQ::power_of_two(64);
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let pk = RlwePublicKey::from_parts(Poly::random(32, q, &mut rng), Poly::random(32, q, &mut rng));
        let bytes = pk.to_bytes();
        // tag, version, modulus (2), ring size (4), two packed polys
        assert_eq!(bytes.len(), 2 + 2 + 4 + 2 * 32 * 8);
        let decoded = RlwePublicKey::from_bytes(&bytes).unwrap();
        assert_eq!(decoded, pk);
        assert_eq!(decoded.to_bytes(), bytes);
    }

    #[test]
    fn test_public_key_codec_rejects_wrong_tag() {
        let q = ModQ::prime(18014398509404161);
        let pk = RlwePublicKey::from_parts(Poly::zero(16, q), Poly::zero(16, q));
        let mut bytes = pk.to_bytes();
        bytes[0] = tag::RLWE_PUBLIC_KEY_SHARE;
        assert!(matches!(
            RlwePublicKey::from_bytes(&bytes),
            Err(FhewError::MalformedEncoding(_))
        ));
    }

    #[test]
    fn test_secret_key_debug_is_redacted() {
        let sk = RlweSecretKey::from_coeffs(vec![1, -1]);
        assert_eq!(format!("{:?}", sk), "RlweSecretKey { ring_size: 2, .. }");
    }
}
