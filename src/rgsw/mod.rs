//! RGSW ciphertexts for blind-rotation key shares
//!
//! # Overview
//!
//! An RGSW ciphertext of a small message `m` is a stack of RLWE
//! encryptions of zero with `m·g_j` added to one component per row:
//!
//! ```text
//! [ rows 0..ℓ_a:   (c.a + m·g_j, c.b)   phase m·g_j·s + e ]
//! [ rows 0..ℓ_b:   (c.a, c.b + m·g_j)   phase m·g_j + e   ]
//! ```
//!
//! The mask and body rows may use different digit counts, matching the two
//! levels of an [`RgswDecompositionParam`](crate::RgswDecompositionParam).
//!
//! In threshold key generation each party encrypts under the joint public
//! key, so nobody needs the joint secret to produce its share.

mod types;

pub use types::RgswCiphertext;
