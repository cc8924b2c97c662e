//! LWE ciphertext and key types

use std::fmt;

use serde::{de, Deserialize, Deserializer, Serialize};

use crate::math::sampling::secret_coeffs_in_range;
use crate::params::{MAX_LWE_DIMENSION, MAX_SECRET_COEFF};

/// LWE secret key: small signed coefficients, one per LWE dimension.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct LweSecretKey {
    pub(crate) coeffs: Vec<i32>,
}

/// LWE ciphertext: (a, b) where b = -<a, s> + e + m
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LweCiphertext {
    /// Mask in Z_q^n
    pub a: Vec<u64>,
    /// Body in Z_q
    pub b: u64,
}

impl LweSecretKey {
    /// Wrap existing coefficients.
    pub fn from_coeffs(coeffs: Vec<i32>) -> Self {
        Self { coeffs }
    }

    pub fn dimension(&self) -> usize {
        self.coeffs.len()
    }

    pub fn coeffs(&self) -> &[i32] {
        &self.coeffs
    }
}

impl fmt::Debug for LweSecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LweSecretKey")
            .field("dimension", &self.coeffs.len())
            .finish_non_exhaustive()
    }
}

impl<'de> Deserialize<'de> for LweSecretKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Raw {
            coeffs: Vec<i32>,
        }

        let Raw { coeffs } = Raw::deserialize(deserializer)?;
        if !(1..=MAX_LWE_DIMENSION).contains(&coeffs.len()) {
            return Err(de::Error::custom(format!(
                "lwe dimension {} outside 1..={}",
                coeffs.len(),
                MAX_LWE_DIMENSION
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

impl LweCiphertext {
    pub fn from_parts(a: Vec<u64>, b: u64) -> Self {
        Self { a, b }
    }

    pub fn dimension(&self) -> usize {
        self.a.len()
    }
}
