//! CRT (Chinese Remainder Theorem) helpers for the two-prime ring backend.

/// First NTT prime of the CRT backend, ≡ 1 (mod 2^20).
pub const CRT_P0: u64 = 4611686018405367809;

/// Second NTT prime of the CRT backend, ≡ 1 (mod 2^20).
pub const CRT_P1: u64 = 4611686018326724609;

/// `CRT_P0^(-1) mod CRT_P1`.
pub const CRT_P0_INV_MOD_P1: u64 = 3812327049842805530;

/// Compute a modular inverse using the extended Euclidean algorithm.
///
/// Returns `x` such that `(a * x) % modulus == 1`, or `None` when `a` is not
/// invertible.
pub fn mod_inverse(a: u64, modulus: u64) -> Option<u64> {
    let mut t: i128 = 0;
    let mut new_t: i128 = 1;
    let mut r: i128 = modulus as i128;
    let mut new_r: i128 = (a % modulus) as i128;

    while new_r != 0 {
        let quotient = r / new_r;
        (t, new_t) = (new_t, t - quotient * new_t);
        (r, new_r) = (new_r, r - quotient * new_r);
    }

    if r != 1 {
        return None;
    }
    if t < 0 {
        t += modulus as i128;
    }
    Some(t as u64)
}

/// Compose two CRT residues into the unique value modulo `q0 * q1`.
///
/// Formula:
///   x = a0 + q0 * ((a1 - a0) * q0^{-1} mod q1)
#[inline]
pub fn crt_compose_2(a0: u64, a1: u64, q0: u64, q1: u64, q0_inv_mod_q1: u64) -> u128 {
    let a0_mod_q1 = a0 % q1;
    let diff = if a1 >= a0_mod_q1 {
        a1 - a0_mod_q1
    } else {
        (a1 as u128 + q1 as u128 - a0_mod_q1 as u128) as u64
    };
    let t = ((diff as u128 * q0_inv_mod_q1 as u128) % q1 as u128) as u64;
    a0 as u128 + q0 as u128 * t as u128
}
