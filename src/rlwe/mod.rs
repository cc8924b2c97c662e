//! RLWE keys and ciphertexts over R_Q = Z_Q[X]/(X^N + 1)
//!
//! # Overview
//!
//! - Secret key `s` is a ring element with small coefficients drawn from the
//!   secret distribution of the parameter set
//! - Ciphertext `(a, b)` encrypts `m` as `b = -a·s + e + m`
//! - A public key is an encryption of zero; in the threshold setting each
//!   party publishes `b_i = -a·s_i + e_i` against a shared CRS mask `a` and
//!   the bodies are summed
//!
//! # Galois Automorphisms
//!
//! τ_k(X) = X^k for odd k. Automorphism key shares encrypt `τ_k(s)` so that
//! the holder of the joint key can evaluate τ_k homomorphically during blind
//! rotation.
//!
//! # Example
//!
//! ```
//! use threshold_fhew::{FhewParam, RlweSecretKey, Seed};
//!
//! let param = FhewParam::i_4p();
//! let sk = RlweSecretKey::sample(param.ring_size(), param.sk_distribution(), &Seed::zero()).unwrap();
//! let pk = sk.pk_from_seed(&param, &Seed::zero()).unwrap();
//! assert_eq!(pk.ring_dim(), 2048);
//! ```

mod enc;
mod galois;
mod types;

pub(crate) use enc::{check_share_idx, PreparedPublicKey};
pub use galois::{apply_automorphism, automorphism_small, is_valid_galois_element};
pub use types::{RlweCiphertext, RlwePublicKey, RlwePublicKeyShare, RlweSecretKey};
