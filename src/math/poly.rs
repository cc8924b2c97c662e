//! Polynomial values over R_q = Z_q[X]/(X^N + 1).
//!
//! A [`Poly`] always holds canonical coefficients in the coefficient domain
//! together with the arithmetic of its modulus. Multiplication lives on
//! [`Ring`](super::ring::Ring), which owns the transform tables.

use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use rand::Rng;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use super::modular::ModQ;
use crate::params::{validate_modulus, Modulus};

/// Polynomial in R_q = Z_q[X]/(X^N + 1).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Poly {
    coeffs: Vec<u64>,
    modulus: ModQ,
}

impl Poly {
    /// The zero polynomial of dimension `dim`.
    pub fn zero(dim: usize, modulus: ModQ) -> Self {
        Self {
            coeffs: vec![0; dim],
            modulus,
        }
    }

    /// Wrap canonical coefficients.
    pub fn from_coeffs(coeffs: Vec<u64>, modulus: ModQ) -> Self {
        debug_assert!(
            coeffs.iter().all(|&c| modulus.contains(c)),
            "coefficients must be reduced"
        );
        Self { coeffs, modulus }
    }

    /// Lift small signed coefficients into Z_q.
    pub fn from_signed<T: Copy + Into<i64>>(values: &[T], modulus: ModQ) -> Self {
        let coeffs = values
            .iter()
            .map(|&v| modulus.from_i64(v.into()))
            .collect();
        Self { coeffs, modulus }
    }

    /// Uniformly random polynomial.
    pub fn random<R: Rng>(dim: usize, modulus: ModQ, rng: &mut R) -> Self {
        Self {
            coeffs: modulus.sample_uniform_vec(dim, rng),
            modulus,
        }
    }

    pub fn dimension(&self) -> usize {
        self.coeffs.len()
    }

    pub fn modulus(&self) -> ModQ {
        self.modulus
    }

    pub fn coeff(&self, i: usize) -> u64 {
        self.coeffs[i]
    }

    pub fn coeffs(&self) -> &[u64] {
        &self.coeffs
    }

    pub fn into_coeffs(self) -> Vec<u64> {
        self.coeffs
    }

    pub fn is_zero(&self) -> bool {
        self.coeffs.iter().all(|&c| c == 0)
    }

    /// Centered representatives of every coefficient.
    pub fn to_signed(&self) -> Vec<i64> {
        self.coeffs.iter().map(|&c| self.modulus.to_i64(c)).collect()
    }

    /// Largest centered coefficient magnitude.
    pub fn linf_norm(&self) -> u64 {
        self.coeffs
            .iter()
            .map(|&c| self.modulus.to_i64(c).unsigned_abs())
            .max()
            .unwrap_or(0)
    }

    /// Multiply every coefficient by `scalar`.
    pub fn scalar_mul(&self, scalar: u64) -> Self {
        let coeffs = self
            .coeffs
            .iter()
            .map(|&c| self.modulus.mul(c, scalar))
            .collect();
        Self {
            coeffs,
            modulus: self.modulus,
        }
    }

    /// Add `scalar * X^exp` with `exp` taken modulo 2N (negacyclic wrap).
    pub fn add_monomial(&mut self, scalar: u64, exp: usize) {
        let n = self.coeffs.len();
        let exp = exp % (2 * n);
        if exp < n {
            self.coeffs[exp] = self.modulus.add(self.coeffs[exp], scalar);
        } else {
            self.coeffs[exp - n] = self.modulus.sub(self.coeffs[exp - n], scalar);
        }
    }
}

impl Add for &Poly {
    type Output = Poly;

    fn add(self, rhs: &Poly) -> Poly {
        let mut out = self.clone();
        out += rhs;
        out
    }
}

impl Add for Poly {
    type Output = Poly;

    fn add(mut self, rhs: Poly) -> Poly {
        self += &rhs;
        self
    }
}

impl AddAssign<&Poly> for Poly {
    fn add_assign(&mut self, rhs: &Poly) {
        debug_assert_eq!(self.dimension(), rhs.dimension(), "dimension mismatch");
        debug_assert_eq!(self.modulus, rhs.modulus, "modulus mismatch");
        for (a, &b) in self.coeffs.iter_mut().zip(&rhs.coeffs) {
            *a = self.modulus.add(*a, b);
        }
    }
}

impl Sub for &Poly {
    type Output = Poly;

    fn sub(self, rhs: &Poly) -> Poly {
        let mut out = self.clone();
        out -= rhs;
        out
    }
}

impl SubAssign<&Poly> for Poly {
    fn sub_assign(&mut self, rhs: &Poly) {
        debug_assert_eq!(self.dimension(), rhs.dimension(), "dimension mismatch");
        debug_assert_eq!(self.modulus, rhs.modulus, "modulus mismatch");
        for (a, &b) in self.coeffs.iter_mut().zip(&rhs.coeffs) {
            *a = self.modulus.sub(*a, b);
        }
    }
}

impl Neg for &Poly {
    type Output = Poly;

    fn neg(self) -> Poly {
        Poly {
            coeffs: self.coeffs.iter().map(|&c| self.modulus.neg(c)).collect(),
            modulus: self.modulus,
        }
    }
}

impl Neg for Poly {
    type Output = Poly;

    fn neg(self) -> Poly {
        -&self
    }
}

#[derive(Serialize)]
struct PolyRef<'a> {
    modulus: Modulus,
    coeffs: &'a [u64],
}

#[derive(Deserialize)]
struct PolyOwned {
    modulus: Modulus,
    coeffs: Vec<u64>,
}

impl Serialize for Poly {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        PolyRef {
            modulus: self.modulus.modulus(),
            coeffs: &self.coeffs,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Poly {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let PolyOwned { modulus, coeffs } = PolyOwned::deserialize(deserializer)?;
        validate_modulus("modulus", modulus).map_err(de::Error::custom)?;
        let m = ModQ::from(modulus);
        if let Some(c) = coeffs.iter().find(|&&c| !m.contains(c)) {
            return Err(de::Error::custom(format!(
                "coefficient {} is not reduced modulo {:?}",
                c, modulus
            )));
        }
        Ok(Self { coeffs, modulus: m })
    }
}
