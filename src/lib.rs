//! Threshold key generation for FHEW-style bootstrapping
//!
//! Each party samples its own RLWE and LWE secret keys, publishes an RLWE
//! public key share, and generates its share of the joint bootstrapping key
//! against a common reference string. No party ever sees another party's
//! secret key.
//!
//! Key components:
//! - [`FhewParam`]: validated parameter set with JSON config and presets
//! - [`FhewCrs`]: seed-expanded common reference string
//! - [`RlweSecretKey`], [`LweSecretKey`], [`RlwePublicKey`]: per-party keys
//! - [`FhewBootstrappingKeyShare`]: automorphism, blind-rotation and LWE
//!   key-switching key shares of one party
//! - [`Codec`]: canonical binary encoding for all of the above
//!
//! # Example
//!
//! ```no_run
//! use threshold_fhew::{
//!     Codec, FhewBootstrappingKeyShare, FhewCrs, FhewParam, LweSecretKey, RlweSecretKey, Seed,
//! };
//!
//! let param = FhewParam::i_4p();
//! let crs = FhewCrs::derive(Seed::zero(), &param);
//! let sk = RlweSecretKey::sample(param.ring_size(), param.sk_distribution(), &Seed::zero())?;
//! let pk = sk.pk(&param)?;
//! let sk_ks = LweSecretKey::sample(param.lwe_dimension(), param.lwe_sk_distribution(), &Seed::zero())?;
//!
//! let share = FhewBootstrappingKeyShare::generate(&param, &crs, 0, &sk, &pk, &sk_ks, &Seed::zero())?;
//! let bytes = share.to_bytes();
//! assert_eq!(FhewBootstrappingKeyShare::from_bytes(&bytes)?.to_bytes(), bytes);
//! # Ok::<(), threshold_fhew::FhewError>(())
//! ```

pub mod codec;
pub mod crs;
pub mod error;
pub mod ks;
pub mod lwe;
pub mod math;
pub mod params;
pub mod rgsw;
pub mod rlwe;
pub mod rng;
pub mod share;

pub use codec::Codec;
pub use crs::FhewCrs;
pub use error::{FhewError, Result};
pub use lwe::{LweCiphertext, LweSecretKey};
pub use params::{
    DecompositionParam, FhewParam, FhewParamConfig, Modulus, NoiseDistribution,
    RgswDecompositionParam, SecretDistribution, I_4P, I_4P_60,
};
pub use rgsw::RgswCiphertext;
pub use rlwe::{RlweCiphertext, RlwePublicKey, RlwePublicKeyShare, RlweSecretKey};
pub use rng::{Domain, Seed, SeedExpander};
pub use share::FhewBootstrappingKeyShare;
