//! Deterministic, domain-separated expansion of seeds into random streams
//!
//! A [`Seed`] never feeds an RNG directly. A [`SeedExpander`] first hashes it
//! together with a [`Domain`] tag and an optional binding (for example the
//! parameter digest and a party index) into a key. Each call to
//! [`SeedExpander::stream`] then hashes that key with a label and indices into
//! the seed of an independent ChaCha20 stream.
//!
//! Reusing one seed across roles therefore yields unrelated streams, and
//! work split across threads can draw from per-item streams without
//! depending on scheduling order.

use std::fmt;

use rand::{CryptoRng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};

/// RNG behind every expanded stream.
pub type DefaultRng = ChaCha20Rng;

const PREFIX: &[u8] = b"threshold-fhew/seed-expander/v1";

/// 32-byte seed.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Seed([u8; Seed::LEN]);

impl Seed {
    pub const LEN: usize = 32;

    pub const fn new(bytes: [u8; Self::LEN]) -> Self {
        Self(bytes)
    }

    /// The all-zero seed.
    pub const fn zero() -> Self {
        Self([0; Self::LEN])
    }

    /// Accept a seed of any length.
    ///
    /// Exactly 32 bytes are used as is. Any other length is hashed to 32
    /// bytes, so short seeds stay usable and reproducible.
    pub fn from_slice(bytes: &[u8]) -> Self {
        match <[u8; Self::LEN]>::try_from(bytes) {
            Ok(array) => Self(array),
            Err(_) => {
                let mut hasher = Sha3_256::new();
                hasher.update(PREFIX);
                hasher.update(b"normalize");
                hasher.update((bytes.len() as u64).to_le_bytes());
                hasher.update(bytes);
                Self(hasher.finalize().into())
            }
        }
    }

    /// Fresh seed from a cryptographic RNG.
    pub fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let mut bytes = [0u8; Self::LEN];
        rng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; Self::LEN] {
        &self.0
    }
}

impl From<[u8; Seed::LEN]> for Seed {
    fn from(bytes: [u8; Seed::LEN]) -> Self {
        Self(bytes)
    }
}

impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Seeds of secret keys must not end up in logs.
        f.write_str("Seed(..)")
    }
}

/// Role a stream is used for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Domain {
    /// Public randomness of the common reference string.
    Crs,
    /// RLWE secret key coefficients.
    RlweSecretKey,
    /// LWE secret key coefficients.
    LweSecretKey,
    /// Single-party public key randomness.
    PublicKey,
    /// Public key share noise.
    PublicKeyShare,
    /// Bootstrapping key share noise and encryption randomness.
    KeyShare,
}

impl Domain {
    fn tag(self) -> &'static [u8] {
        match self {
            Self::Crs => b"crs",
            Self::RlweSecretKey => b"rlwe-secret-key",
            Self::LweSecretKey => b"lwe-secret-key",
            Self::PublicKey => b"public-key",
            Self::PublicKeyShare => b"public-key-share",
            Self::KeyShare => b"key-share",
        }
    }
}

/// Keyed source of independent deterministic streams.
#[derive(Clone, PartialEq, Eq)]
pub struct SeedExpander {
    key: [u8; 32],
}

impl SeedExpander {
    pub fn new(seed: &Seed, domain: Domain) -> Self {
        Self::with_binding(seed, domain, &[])
    }

    /// Expander whose streams also depend on `binding`.
    pub fn with_binding(seed: &Seed, domain: Domain, binding: &[u8]) -> Self {
        let mut hasher = Sha3_256::new();
        hasher.update(PREFIX);
        absorb(&mut hasher, domain.tag());
        absorb(&mut hasher, binding);
        hasher.update(seed.as_bytes());
        Self {
            key: hasher.finalize().into(),
        }
    }

    /// Stream identified by `label` and `indices`.
    ///
    /// Distinct `(label, indices)` pairs give independent streams; the same
    /// pair always gives the same stream.
    pub fn stream(&self, label: &str, indices: &[u64]) -> DefaultRng {
        let mut hasher = Sha3_256::new();
        hasher.update(self.key);
        absorb(&mut hasher, label.as_bytes());
        hasher.update((indices.len() as u64).to_le_bytes());
        for index in indices {
            hasher.update(index.to_le_bytes());
        }
        DefaultRng::from_seed(hasher.finalize().into())
    }
}

impl fmt::Debug for SeedExpander {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SeedExpander(..)")
    }
}

/// Single stream for `domain`, for callers that need just one.
pub fn expand(seed: &Seed, domain: Domain) -> DefaultRng {
    SeedExpander::new(seed, domain).stream("main", &[])
}

fn absorb(hasher: &mut Sha3_256, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
}
