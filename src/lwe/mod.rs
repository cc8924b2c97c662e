//! LWE secret keys and ciphertexts over Z_{q_ks}
//!
//! The LWE secret key is the target of the key-switching key share: a
//! vector of small signed coefficients drawn from the LWE secret
//! distribution. Ciphertexts follow the same sign convention as the rest of
//! the crate:
//!
//! ```text
//! b = -<a, s> + e + m
//! ```
//!
//! so that the phase `b + <a, s>` equals `m + e`.
//!
//! # Example
//!
//! ```
//! use threshold_fhew::lwe::LweSecretKey;
//! use threshold_fhew::{SecretDistribution, Seed};
//!
//! let sk = LweSecretKey::sample(620, SecretDistribution::Ternary, &Seed::zero()).unwrap();
//! assert_eq!(sk.dimension(), 620);
//! assert!(sk.coeffs().iter().all(|c| (-1..=1).contains(c)));
//! ```

mod enc;
mod types;

pub use types::{LweCiphertext, LweSecretKey};
