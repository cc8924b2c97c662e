//! Gadget vectors for digit decompositions.

use super::modular::ModQ;

/// Gadget vector `[B^0, B^1, ..., B^(ℓ-1)] * 2^ignored` with `B = 2^log_base`.
///
/// Decompositions keep the top `log_base * level` bits of a value and drop
/// the `log_q - log_base * level` least significant ones, so the gadget is
/// shifted up by that many bits.
///
/// # Example
///
/// ```
/// use threshold_fhew::math::{GadgetVector, ModQ};
///
/// let gadget = GadgetVector::new(ModQ::power_of_two(16), 1, 13);
/// assert_eq!(gadget.ignored_bits(), 3);
/// assert_eq!(gadget.values()[0], 1 << 3);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GadgetVector {
    log_base: u32,
    ignored_bits: u32,
    values: Vec<u64>,
}

impl GadgetVector {
    /// Gadget with `level` digits of `log_base` bits over `modulus`.
    ///
    /// `log_base * level` must not exceed the bit length of the modulus,
    /// which parameter validation guarantees.
    pub fn new(modulus: ModQ, log_base: u32, level: u32) -> Self {
        let used = log_base * level;
        debug_assert!(used <= modulus.log_q(), "decomposition wider than modulus");
        let ignored_bits = modulus.log_q().saturating_sub(used);
        let values = (0..level)
            .map(|j| modulus.pow2(ignored_bits + j * log_base))
            .collect();
        Self {
            log_base,
            ignored_bits,
            values,
        }
    }

    pub fn log_base(&self) -> u32 {
        self.log_base
    }

    /// Number of digits ℓ.
    pub fn level(&self) -> usize {
        self.values.len()
    }

    pub fn ignored_bits(&self) -> u32 {
        self.ignored_bits
    }

    /// `g_j mod q` for every digit j.
    pub fn values(&self) -> &[u64] {
        &self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prime_gadget() {
        let m = ModQ::prime(18014398509404161);
        let gadget = GadgetVector::new(m, 6, 7);
        assert_eq!(gadget.ignored_bits(), 54 - 42);
        assert_eq!(gadget.level(), 7);
        for (j, &g) in gadget.values().iter().enumerate() {
            assert_eq!(g, 1u64 << (12 + 6 * j));
        }
    }

    #[test]
    fn test_full_width_native_gadget() {
        let m = ModQ::power_of_two(64);
        let gadget = GadgetVector::new(m, 16, 4);
        assert_eq!(gadget.ignored_bits(), 0);
        assert_eq!(gadget.values(), &[1, 1 << 16, 1 << 32, 1 << 48]);
    }

    #[test]
    fn test_single_level() {
        let m = ModQ::prime(18014398509404161);
        let gadget = GadgetVector::new(m, 24, 1);
        assert_eq!(gadget.values(), &[1u64 << 30]);
    }
}
