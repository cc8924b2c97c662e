//! Modular arithmetic over Z_q for prime and power-of-two moduli

use rand::Rng;

use crate::params::Modulus;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Kind {
    Prime(u64),
    /// Stores `2^bits - 1`, so `bits == 64` needs no special casing.
    PowerOfTwo(u64),
}

/// Modular arithmetic operations over Z_q
///
/// Values are always kept in canonical form `[0, q)`. Power-of-two moduli use
/// wrapping arithmetic followed by a mask, which covers the native `2^64` case.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModQ {
    kind: Kind,
}

impl ModQ {
    /// Arithmetic modulo a prime `q`.
    pub fn prime(q: u64) -> Self {
        debug_assert!(q > 1, "modulus must be > 1");
        Self {
            kind: Kind::Prime(q),
        }
    }

    /// Arithmetic modulo `2^bits`, `1 <= bits <= 64`.
    pub fn power_of_two(bits: u32) -> Self {
        debug_assert!((1..=64).contains(&bits), "bits must be in 1..=64");
        let mask = if bits == 64 {
            u64::MAX
        } else {
            (1u64 << bits) - 1
        };
        Self {
            kind: Kind::PowerOfTwo(mask),
        }
    }

    /// Returns the modulus as a configuration value.
    pub fn modulus(&self) -> Modulus {
        match self.kind {
            Kind::Prime(q) => Modulus::Prime(q),
            Kind::PowerOfTwo(mask) => Modulus::PowerOfTwo(mask.count_ones()),
        }
    }

    /// The prime value if this is a prime modulus.
    pub fn as_prime(&self) -> Option<u64> {
        match self.kind {
            Kind::Prime(q) => Some(q),
            Kind::PowerOfTwo(_) => None,
        }
    }

    /// Largest canonical value, `q - 1`.
    #[inline]
    pub fn max_value(&self) -> u64 {
        match self.kind {
            Kind::Prime(q) => q - 1,
            Kind::PowerOfTwo(mask) => mask,
        }
    }

    /// Number of bits needed to store any canonical value.
    pub fn bits(&self) -> u32 {
        64 - self.max_value().leading_zeros()
    }

    /// `ceil(log2(q))`, the width gadget decompositions are measured against.
    pub fn log_q(&self) -> u32 {
        match self.kind {
            Kind::Prime(q) if q.is_power_of_two() => q.trailing_zeros(),
            _ => self.bits(),
        }
    }

    /// Whether `v` is a canonical residue.
    #[inline]
    pub fn contains(&self, v: u64) -> bool {
        v <= self.max_value()
    }

    /// Reduce an arbitrary u64 into `[0, q)`.
    #[inline]
    pub fn reduce(&self, a: u64) -> u64 {
        match self.kind {
            Kind::Prime(q) => a % q,
            Kind::PowerOfTwo(mask) => a & mask,
        }
    }

    /// Reduce an arbitrary u128 into `[0, q)`.
    #[inline]
    pub fn reduce_u128(&self, a: u128) -> u64 {
        match self.kind {
            Kind::Prime(q) => (a % q as u128) as u64,
            Kind::PowerOfTwo(mask) => (a as u64) & mask,
        }
    }

    /// Reduce a signed 128-bit integer into `[0, q)`.
    #[inline]
    pub fn reduce_i128(&self, a: i128) -> u64 {
        match self.kind {
            Kind::Prime(q) => a.rem_euclid(q as i128) as u64,
            Kind::PowerOfTwo(mask) => (a as u64) & mask,
        }
    }

    /// Add two values modulo q
    #[inline]
    pub fn add(&self, a: u64, b: u64) -> u64 {
        match self.kind {
            Kind::Prime(q) => {
                let sum = a as u128 + b as u128;
                if sum >= q as u128 {
                    (sum - q as u128) as u64
                } else {
                    sum as u64
                }
            }
            Kind::PowerOfTwo(mask) => a.wrapping_add(b) & mask,
        }
    }

    /// Subtract two values modulo q
    #[inline]
    pub fn sub(&self, a: u64, b: u64) -> u64 {
        match self.kind {
            Kind::Prime(q) => {
                if a >= b {
                    a - b
                } else {
                    q - (b - a)
                }
            }
            Kind::PowerOfTwo(mask) => a.wrapping_sub(b) & mask,
        }
    }

    /// Negate a value modulo q
    #[inline]
    pub fn neg(&self, a: u64) -> u64 {
        self.sub(0, a)
    }

    /// Multiply two values modulo q
    #[inline]
    pub fn mul(&self, a: u64, b: u64) -> u64 {
        match self.kind {
            Kind::Prime(q) => ((a as u128 * b as u128) % q as u128) as u64,
            Kind::PowerOfTwo(mask) => a.wrapping_mul(b) & mask,
        }
    }

    /// Convert a signed integer to its representation in Z_q
    #[inline]
    pub fn from_i64(&self, v: i64) -> u64 {
        match self.kind {
            Kind::Prime(q) => (v as i128).rem_euclid(q as i128) as u64,
            Kind::PowerOfTwo(mask) => (v as u64) & mask,
        }
    }

    /// Convert from Z_q to the centered representative in `[-q/2, q/2)`
    #[inline]
    pub fn to_i64(&self, v: u64) -> i64 {
        match self.kind {
            Kind::Prime(q) => {
                if v <= q / 2 {
                    v as i64
                } else {
                    (v as i128 - q as i128) as i64
                }
            }
            Kind::PowerOfTwo(u64::MAX) => v as i64,
            Kind::PowerOfTwo(mask) => {
                if v > mask >> 1 {
                    (v as i128 - (mask as i128 + 1)) as i64
                } else {
                    v as i64
                }
            }
        }
    }

    /// `2^e mod q`.
    pub fn pow2(&self, e: u32) -> u64 {
        match self.kind {
            Kind::Prime(q) => {
                let mut acc = 1u64 % q;
                let mut base = 2u64 % q;
                let mut e = e;
                while e > 0 {
                    if e & 1 == 1 {
                        acc = self.mul(acc, base);
                    }
                    base = self.mul(base, base);
                    e >>= 1;
                }
                acc
            }
            Kind::PowerOfTwo(mask) => {
                if e >= 64 {
                    0
                } else {
                    (1u64 << e) & mask
                }
            }
        }
    }

    /// Sample uniformly from `[0, q)`.
    #[inline]
    pub fn sample_uniform<R: Rng>(&self, rng: &mut R) -> u64 {
        match self.kind {
            Kind::Prime(q) => rng.gen_range(0..q),
            Kind::PowerOfTwo(mask) => rng.gen::<u64>() & mask,
        }
    }

    /// Sample `n` uniform residues.
    pub fn sample_uniform_vec<R: Rng>(&self, n: usize, rng: &mut R) -> Vec<u64> {
        (0..n).map(|_| self.sample_uniform(rng)).collect()
    }
}

impl From<Modulus> for ModQ {
    fn from(modulus: Modulus) -> Self {
        match modulus {
            Modulus::Prime(q) => Self::prime(q),
            Modulus::PowerOfTwo(bits) => Self::power_of_two(bits),
        }
    }
}

/// Deterministic Miller-Rabin primality test for 64-bit integers.
pub fn is_prime(n: u64) -> bool {
    const WITNESSES: [u64; 12] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37];

    if n < 2 {
        return false;
    }
    for &p in &WITNESSES {
        if n % p == 0 {
            return n == p;
        }
    }

    let mul = |a: u64, b: u64| ((a as u128 * b as u128) % n as u128) as u64;
    let pow = |mut base: u64, mut e: u64| {
        let mut acc = 1u64;
        while e > 0 {
            if e & 1 == 1 {
                acc = mul(acc, base);
            }
            base = mul(base, base);
            e >>= 1;
        }
        acc
    };

    let s = (n - 1).trailing_zeros();
    let d = (n - 1) >> s;
    'witness: for &a in &WITNESSES {
        let mut x = pow(a, d);
        if x == 1 || x == n - 1 {
            continue;
        }
        for _ in 1..s {
            x = mul(x, x);
            if x == n - 1 {
                continue 'witness;
            }
        }
        return false;
    }
    true
}
