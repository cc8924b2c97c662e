//! Key-switching key shares
//!
//! # Overview
//!
//! Both kinds of key-switching key in the bootstrapping key are gadget
//! encryptions of one secret under another, with every mask taken from the
//! CRS. A party therefore only contributes bodies, and the bodies of all
//! parties add up to a key under the sum of their secrets.
//!
//! - [`AutoKeyShare`]: for automorphism index k, row j encrypts `τ_k(s)·g_j`
//!   under `s` in R_Q
//! - [`LweKeySwitchKeyShare`]: for ring coefficient i, row j encrypts
//!   `s_i·g_j` under the LWE key `z` in Z_{q_ks}
//!
//! ```text
//! auto:   b_{k,j} = -a_crs(k,j)·s + e + τ_k(s)·g_j
//! lwe ks: b_{i,j} = -<a_crs(i,j), z> + e + s_i·g_j
//! ```

mod auto;
mod lwe;

pub use auto::AutoKeyShare;
pub use lwe::LweKeySwitchKeyShare;
