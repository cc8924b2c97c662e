//! Negacyclic ring R_Q = Z_Q[X]/(X^N + 1) with a multiplication backend
//! chosen from the modulus.
//!
//! - NTT-friendly primes below 2^62 multiply directly in their own NTT.
//! - Every other modulus (powers of two up to 2^64, large or unfriendly
//!   primes) multiplies over the integers through two 62-bit NTT primes and
//!   CRT reconstruction, then reduces modulo Q.
//!
//! The CRT path is exact only while the integer product fits in
//! `(-P/2, P/2)` with `P = p0 * p1 ≈ 2^124`. Every product in this crate is
//! uniform times small (`n * Q * B < 2^16 * 2^64 * 2^20`), which is well
//! inside that range. [`Ring::small_to_eval`] marks the small operand.

use super::crt::{crt_compose_2, CRT_P0, CRT_P0_INV_MOD_P1, CRT_P1};
use super::modular::ModQ;
use super::ntt::NttContext;
use super::poly::Poly;

#[derive(Clone, Debug)]
enum Backend {
    Ntt(NttContext),
    Crt(NttContext),
}

/// Polynomial in evaluation form.
///
/// Only meaningful for the [`Ring`] that produced it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EvalPoly(Vec<u64>);

/// Polynomial ring with precomputed transform tables.
#[derive(Clone, Debug)]
pub struct Ring {
    n: usize,
    modulus: ModQ,
    backend: Backend,
}

impl Ring {
    /// Build the ring for modulus `modulus` and power-of-two dimension `n`.
    ///
    /// # Panics
    ///
    /// Panics if `n` is not a power of two in `2..=2^19`.
    pub fn new(modulus: ModQ, n: usize) -> Self {
        let backend = match modulus.as_prime() {
            Some(q) if NttContext::supports(n, q) => Backend::Ntt(NttContext::new(n, q)),
            _ => Backend::Crt(NttContext::with_moduli(n, &[CRT_P0, CRT_P1])),
        };
        Self {
            n,
            modulus,
            backend,
        }
    }

    pub fn dimension(&self) -> usize {
        self.n
    }

    pub fn modulus(&self) -> ModQ {
        self.modulus
    }

    /// Whether multiplication goes through the two-prime CRT backend.
    pub fn is_crt(&self) -> bool {
        matches!(self.backend, Backend::Crt(_))
    }

    fn ntt(&self) -> &NttContext {
        match &self.backend {
            Backend::Ntt(ntt) | Backend::Crt(ntt) => ntt,
        }
    }

    /// Forward transform of an arbitrary ring element.
    pub fn to_eval(&self, poly: &Poly) -> EvalPoly {
        debug_assert_eq!(poly.dimension(), self.n, "dimension mismatch");
        let mut buf = match &self.backend {
            Backend::Ntt(_) => poly.coeffs().to_vec(),
            Backend::Crt(_) => {
                let mut buf = Vec::with_capacity(2 * self.n);
                buf.extend(poly.coeffs().iter().map(|&c| c % CRT_P0));
                buf.extend(poly.coeffs().iter().map(|&c| c % CRT_P1));
                buf
            }
        };
        self.ntt().forward(&mut buf);
        EvalPoly(buf)
    }

    /// Forward transform of a polynomial with small signed coefficients.
    pub fn small_to_eval<T: Copy + Into<i64>>(&self, values: &[T]) -> EvalPoly {
        debug_assert_eq!(values.len(), self.n, "dimension mismatch");
        let mut buf = match &self.backend {
            Backend::Ntt(_) => values
                .iter()
                .map(|&v| self.modulus.from_i64(v.into()))
                .collect(),
            Backend::Crt(_) => {
                let lift = |v: i64, p: u64| (v as i128).rem_euclid(p as i128) as u64;
                let mut buf = Vec::with_capacity(2 * self.n);
                buf.extend(values.iter().map(|&v| lift(v.into(), CRT_P0)));
                buf.extend(values.iter().map(|&v| lift(v.into(), CRT_P1)));
                buf
            }
        };
        self.ntt().forward(&mut buf);
        EvalPoly(buf)
    }

    /// Pointwise product in evaluation form.
    pub fn eval_mul(&self, a: &EvalPoly, b: &EvalPoly) -> EvalPoly {
        let mut out = vec![0u64; a.0.len()];
        self.ntt().pointwise_mul(&a.0, &b.0, &mut out);
        EvalPoly(out)
    }

    /// Inverse transform back to canonical coefficients modulo Q.
    pub fn from_eval(&self, eval: EvalPoly) -> Poly {
        let EvalPoly(mut buf) = eval;
        self.ntt().inverse(&mut buf);
        match &self.backend {
            Backend::Ntt(_) => Poly::from_coeffs(buf, self.modulus),
            Backend::Crt(_) => {
                let big_p = CRT_P0 as u128 * CRT_P1 as u128;
                let half = big_p / 2;
                let (r0, r1) = buf.split_at(self.n);
                let coeffs = r0
                    .iter()
                    .zip(r1)
                    .map(|(&a0, &a1)| {
                        let x = crt_compose_2(a0, a1, CRT_P0, CRT_P1, CRT_P0_INV_MOD_P1);
                        let signed = if x > half {
                            -((big_p - x) as i128)
                        } else {
                            x as i128
                        };
                        self.modulus.reduce_i128(signed)
                    })
                    .collect();
                Poly::from_coeffs(coeffs, self.modulus)
            }
        }
    }

    /// `a * s` where `s` was produced by [`Ring::small_to_eval`].
    pub fn mul_small(&self, a: &Poly, s: &EvalPoly) -> Poly {
        let a_eval = self.to_eval(a);
        self.from_eval(self.eval_mul(&a_eval, s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha20Rng;

    fn schoolbook(a: &Poly, s: &[i64]) -> Poly {
        let m = a.modulus();
        let n = a.dimension();
        let mut out = vec![0u64; n];
        for i in 0..n {
            for (j, &sj) in s.iter().enumerate() {
                let prod = m.mul(a.coeff(i), m.from_i64(sj));
                let k = i + j;
                if k < n {
                    out[k] = m.add(out[k], prod);
                } else {
                    out[k - n] = m.sub(out[k - n], prod);
                }
            }
        }
        Poly::from_coeffs(out, m)
    }

    fn check_modulus(modulus: ModQ, expect_crt: bool) {
        let n = 64;
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let ring = Ring::new(modulus, n);
        assert_eq!(ring.is_crt(), expect_crt);

        let a = Poly::random(n, modulus, &mut rng);
        let s: Vec<i64> = (0..n).map(|_| rng.gen_range(-20..=20)).collect();

        let got = ring.mul_small(&a, &ring.small_to_eval(&s));
        assert_eq!(got, schoolbook(&a, &s), "product mismatch for {:?}", modulus);
    }

    #[test]
    fn test_ntt_prime_backend() {
        check_modulus(ModQ::prime(18014398509404161), false);
    }

    #[test]
    fn test_crt_backend_power_of_two() {
        check_modulus(ModQ::power_of_two(64), true);
        check_modulus(ModQ::power_of_two(32), true);
        check_modulus(ModQ::power_of_two(5), true);
    }

    #[test]
    fn test_crt_backend_unfriendly_prime() {
        // 2^61 - 1 is prime but not ≡ 1 (mod 128)
        check_modulus(ModQ::prime((1 << 61) - 1), true);
        // prime above 2^62
        check_modulus(ModQ::prime(18446744073709551557), true);
    }

    #[test]
    fn test_small_times_small_ntt() {
        let m = ModQ::prime(18014398509404161);
        let ring = Ring::new(m, 8);
        let x = Poly::from_signed(&[0i64, 1, 0, 0, 0, 0, 0, 0], m);
        let x7 = ring.small_to_eval(&[0i64, 0, 0, 0, 0, 0, 0, 1]);
        let prod = ring.mul_small(&x, &x7);
        assert_eq!(prod.to_signed(), vec![-1, 0, 0, 0, 0, 0, 0, 0]);
    }
}
