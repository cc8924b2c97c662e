//! Galois automorphisms of R = Z[X]/(X^N + 1)
//!
//! τ_k: X ↦ X^k for odd k. Coefficient i moves to `i·k mod 2N`, with a sign
//! flip whenever that index lands in `[N, 2N)` because X^N = -1.

use crate::math::Poly;

/// Target index and sign of coefficient `i` under τ_k.
#[inline]
fn image(i: usize, k: usize, n: usize) -> (usize, bool) {
    let idx = (i * k) % (2 * n);
    if idx < n {
        (idx, false)
    } else {
        (idx - n, true)
    }
}

/// Whether `k` defines an automorphism of the ring of dimension `n`.
pub fn is_valid_galois_element(k: usize, n: usize) -> bool {
    k % 2 == 1 && k < 2 * n
}

/// τ_k applied to a polynomial over Z_Q.
pub fn apply_automorphism(poly: &Poly, k: usize) -> Poly {
    let n = poly.dimension();
    let m = poly.modulus();
    debug_assert!(is_valid_galois_element(k, n), "invalid galois element {}", k);

    let mut out = vec![0u64; n];
    for (i, &c) in poly.coeffs().iter().enumerate() {
        let (idx, negate) = image(i, k, n);
        out[idx] = if negate { m.neg(c) } else { c };
    }
    Poly::from_coeffs(out, m)
}

/// τ_k applied to a small signed polynomial, such as a secret key.
pub fn automorphism_small(s: &[i32], k: usize) -> Vec<i32> {
    let n = s.len();
    debug_assert!(is_valid_galois_element(k, n), "invalid galois element {}", k);

    let mut out = vec![0i32; n];
    for (i, &c) in s.iter().enumerate() {
        let (idx, negate) = image(i, k, n);
        out[idx] = if negate { c.wrapping_neg() } else { c };
    }
    out
}
