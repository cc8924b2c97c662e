//! Number-Theoretic Transform (NTT) for negacyclic polynomial multiplication.
//!
//! Cooley-Tukey forward and Gentleman-Sande inverse transforms over
//! Z_p[X]/(X^n + 1) with twiddles stored in bit-reversed order and all
//! butterflies done in Montgomery form.
//!
//! A context may hold several primes at once. Coefficient buffers are then laid
//! out limb by limb, `[limb_0 (n values), limb_1 (n values), ...]`, which is the
//! layout the CRT ring backend relies on.
//!
//! # Requirements
//!
//! Every prime p must satisfy p ≡ 1 (mod 2n) and p < 2^62 so that lazy sums of
//! two residues never overflow a u64.

/// Precomputed NTT context with twiddle factors.
#[derive(Clone, Debug)]
pub struct NttContext {
    /// Ring dimension (power of two).
    n: usize,
    /// NTT primes (length 1 for single-modulus mode).
    moduli: Vec<u64>,
    /// -p^(-1) mod 2^64 per prime.
    q_inv_neg: Vec<u64>,
    /// 2^128 mod p per prime.
    r_squared: Vec<u64>,
    /// Forward twiddle factors (powers of ψ where ψ^(2n) = 1 and ψ^n = -1).
    psi_powers: Vec<Vec<u64>>,
    /// Inverse twiddle factors (powers of ψ^(-1)).
    psi_inv_powers: Vec<Vec<u64>>,
    /// n^(-1) mod p in Montgomery form.
    n_inv: Vec<u64>,
}

impl NttContext {
    /// Creates an NTT context for a single prime.
    ///
    /// # Panics
    ///
    /// Panics if `n` is not a power of two or `q` is not an NTT-friendly prime
    /// below 2^62.
    pub fn new(n: usize, q: u64) -> Self {
        Self::with_moduli(n, &[q])
    }

    /// Creates an NTT context for several primes processed side by side.
    ///
    /// # Arguments
    ///
    /// * `n` - Ring dimension (power of two)
    /// * `moduli` - NTT primes (each must satisfy p ≡ 1 (mod 2n) and p < 2^62)
    pub fn with_moduli(n: usize, moduli: &[u64]) -> Self {
        assert!(n.is_power_of_two() && n >= 2, "n must be a power of two");
        assert!(!moduli.is_empty(), "moduli must be non-empty");

        let mut q_inv_neg = Vec::with_capacity(moduli.len());
        let mut r_squared = Vec::with_capacity(moduli.len());
        let mut psi_powers = Vec::with_capacity(moduli.len());
        let mut psi_inv_powers = Vec::with_capacity(moduli.len());
        let mut n_inv = Vec::with_capacity(moduli.len());

        for &q in moduli {
            assert!(Self::supports(n, q), "q must be < 2^62 and ≡ 1 (mod 2n)");

            let q_inv = Self::compute_q_inv_neg(q);
            let r2 = Self::compute_r_squared(q);

            let psi = Self::find_primitive_root(2 * n as u64, q);
            let psi_mont = Self::to_montgomery(psi, q, r2, q_inv);
            let psi_inv = Self::mod_pow(psi, q - 2, q);
            let psi_inv_mont = Self::to_montgomery(psi_inv, q, r2, q_inv);

            let n_inv_val = Self::mod_pow(n as u64, q - 2, q);

            q_inv_neg.push(q_inv);
            r_squared.push(r2);
            psi_powers.push(Self::compute_twiddle_factors(n, psi_mont, q, q_inv, r2));
            psi_inv_powers.push(Self::compute_twiddle_factors(n, psi_inv_mont, q, q_inv, r2));
            n_inv.push(Self::to_montgomery(n_inv_val, q, r2, q_inv));
        }

        Self {
            n,
            moduli: moduli.to_vec(),
            q_inv_neg,
            r_squared,
            psi_powers,
            psi_inv_powers,
            n_inv,
        }
    }

    /// Whether `q` can back a negacyclic NTT of dimension `n` in this context.
    pub fn supports(n: usize, q: u64) -> bool {
        q < (1u64 << 62) && q > 2 && q % (2 * n as u64) == 1
    }

    pub fn dimension(&self) -> usize {
        self.n
    }

    pub fn moduli(&self) -> &[u64] {
        &self.moduli
    }

    /// Number of primes (limbs) per buffer.
    pub fn limb_count(&self) -> usize {
        self.moduli.len()
    }

    /// Forward NTT in place.
    ///
    /// Input limbs must hold residues of their own prime. Output is in
    /// Montgomery form, ready for [`NttContext::pointwise_mul`].
    ///
    /// # Panics
    ///
    /// Panics if `coeffs.len() != n * limb_count`.
    pub fn forward(&self, coeffs: &mut [u64]) {
        assert_eq!(
            coeffs.len(),
            self.n * self.limb_count(),
            "Input length must match dimension * limb_count"
        );

        for (idx, limb) in coeffs.chunks_exact_mut(self.n).enumerate() {
            let (q, r2, q_inv) = (self.moduli[idx], self.r_squared[idx], self.q_inv_neg[idx]);
            for c in limb.iter_mut() {
                *c = Self::to_montgomery(*c, q, r2, q_inv);
            }
            self.forward_limb(limb, idx);
        }
    }

    fn forward_limb(&self, coeffs: &mut [u64], idx: usize) {
        let n = self.n;
        let q = self.moduli[idx];
        let psi_powers = &self.psi_powers[idx];

        let mut t = n;
        let mut m = 1;

        while m < n {
            t >>= 1;
            for i in 0..m {
                let j1 = 2 * i * t;
                let w = psi_powers[m + i];

                for j in j1..j1 + t {
                    let u = coeffs[j];
                    let v = self.montgomery_mul_at(coeffs[j + t], w, idx);

                    coeffs[j] = if u + v >= q { u + v - q } else { u + v };
                    coeffs[j + t] = if u >= v { u - v } else { q - v + u };
                }
            }
            m <<= 1;
        }
    }

    /// Inverse NTT in place, leaving plain residues in each limb.
    ///
    /// # Panics
    ///
    /// Panics if `coeffs.len() != n * limb_count`.
    pub fn inverse(&self, coeffs: &mut [u64]) {
        assert_eq!(
            coeffs.len(),
            self.n * self.limb_count(),
            "Input length must match dimension * limb_count"
        );

        for (idx, limb) in coeffs.chunks_exact_mut(self.n).enumerate() {
            self.inverse_limb(limb, idx);
            for c in limb.iter_mut() {
                *c = self.montgomery_mul_at(*c, 1, idx);
            }
        }
    }

    fn inverse_limb(&self, coeffs: &mut [u64], idx: usize) {
        let n = self.n;
        let q = self.moduli[idx];
        let psi_inv_powers = &self.psi_inv_powers[idx];

        let mut t = 1;
        let mut m = n;

        while m > 1 {
            m >>= 1;
            for i in 0..m {
                let j1 = i * 2 * t;
                let w = psi_inv_powers[m + i];

                for j in j1..j1 + t {
                    let u = coeffs[j];
                    let v = coeffs[j + t];

                    coeffs[j] = if u + v >= q { u + v - q } else { u + v };
                    let diff = if u >= v { u - v } else { q - v + u };
                    coeffs[j + t] = self.montgomery_mul_at(diff, w, idx);
                }
            }
            t <<= 1;
        }

        let n_inv = self.n_inv[idx];
        for c in coeffs.iter_mut() {
            *c = self.montgomery_mul_at(*c, n_inv, idx);
        }
    }

    /// Pointwise product of two forward-transformed buffers.
    ///
    /// # Panics
    ///
    /// Panics if any buffer length does not equal `n * limb_count`.
    pub fn pointwise_mul(&self, a: &[u64], b: &[u64], result: &mut [u64]) {
        let len = self.n * self.limb_count();
        assert_eq!(a.len(), len, "Input length must match dimension * limb_count");
        assert_eq!(b.len(), len, "Input length must match dimension * limb_count");
        assert_eq!(result.len(), len, "Output length must match dimension * limb_count");

        for idx in 0..self.limb_count() {
            let range = idx * self.n..(idx + 1) * self.n;
            for i in range {
                result[i] = self.montgomery_mul_at(a[i], b[i], idx);
            }
        }
    }

    /// Pointwise sum of two forward-transformed buffers into `acc`.
    pub fn pointwise_add_assign(&self, acc: &mut [u64], b: &[u64]) {
        for (idx, (acc_limb, b_limb)) in acc
            .chunks_exact_mut(self.n)
            .zip(b.chunks_exact(self.n))
            .enumerate()
        {
            let q = self.moduli[idx];
            for (x, &y) in acc_limb.iter_mut().zip(b_limb) {
                let s = *x + y;
                *x = if s >= q { s - q } else { s };
            }
        }
    }

    #[inline]
    fn montgomery_mul_at(&self, a: u64, b: u64, idx: usize) -> u64 {
        let q = self.moduli[idx];
        let ab = (a as u128) * (b as u128);
        let m = ((ab as u64).wrapping_mul(self.q_inv_neg[idx])) as u128;
        let t = ((ab + m * (q as u128)) >> 64) as u64;
        if t >= q {
            t - q
        } else {
            t
        }
    }

    fn to_montgomery(a: u64, q: u64, r_squared: u64, q_inv_neg: u64) -> u64 {
        let ab = (a as u128) * (r_squared as u128);
        let m = ((ab as u64).wrapping_mul(q_inv_neg)) as u128;
        let t = ((ab + m * (q as u128)) >> 64) as u64;
        if t >= q {
            t - q
        } else {
            t
        }
    }

    fn compute_q_inv_neg(q: u64) -> u64 {
        let mut y: u64 = 1;
        for i in 1..64 {
            let yi = y.wrapping_mul(q) & (1u64 << i);
            y |= yi;
        }
        y.wrapping_neg()
    }

    fn compute_r_squared(q: u64) -> u64 {
        let r_mod_q = (1u128 << 64) % (q as u128);
        ((r_mod_q * r_mod_q) % (q as u128)) as u64
    }

    fn mod_pow(mut base: u64, mut exp: u64, m: u64) -> u64 {
        let mut result = 1u64;
        base %= m;
        while exp > 0 {
            if exp & 1 == 1 {
                result = ((result as u128 * base as u128) % m as u128) as u64;
            }
            exp >>= 1;
            base = ((base as u128 * base as u128) % m as u128) as u64;
        }
        result
    }

    /// Primitive `order`-th root of unity modulo prime `q`.
    fn find_primitive_root(order: u64, q: u64) -> u64 {
        let exp = (q - 1) / order;
        (2..q)
            .map(|g| Self::mod_pow(g, exp, q))
            .find(|&c| Self::mod_pow(c, order / 2, q) != 1)
            .expect("prime q ≡ 1 (mod order) has a primitive root")
    }

    /// Twiddle factors in bit-reversed order: entry `m` for a power of two
    /// is `ψ^(n / 2m)` and every other entry is the product of the entries
    /// for its highest bits and its lowest set bit.
    fn compute_twiddle_factors(
        n: usize,
        psi: u64,
        q: u64,
        q_inv_neg: u64,
        r_squared: u64,
    ) -> Vec<u64> {
        let mont_mul = |a: u64, b: u64| {
            let ab = (a as u128) * (b as u128);
            let mm = ((ab as u64).wrapping_mul(q_inv_neg)) as u128;
            let t = ((ab + mm * (q as u128)) >> 64) as u64;
            if t >= q {
                t - q
            } else {
                t
            }
        };

        let one = Self::to_montgomery(1, q, r_squared, q_inv_neg);
        let mut factors = vec![0u64; n];

        for m in 1..n {
            if m.is_power_of_two() {
                let exp = n / (2 * m);
                let mut pow = one;
                for _ in 0..exp {
                    pow = mont_mul(pow, psi);
                }
                factors[m] = pow;
            } else {
                let prev_idx = m & (m - 1);
                let step_idx = m & m.wrapping_neg();
                factors[m] = mont_mul(factors[prev_idx], factors[step_idx]);
            }
        }

        factors
    }
}
