//! Mathematical primitives for threshold key generation.
//!
//! - **Modular arithmetic** over Z_q for prime and power-of-two moduli
//! - **Number-Theoretic Transform (NTT)** with Montgomery butterflies
//! - **Ring** R_q = Z_q[X]/(X^N + 1) with an NTT or two-prime CRT backend
//! - **Gadget vectors** for digit decompositions
//! - **Sampling** of ternary and discrete Gaussian values
//!
//! # Example
//!
//! ```
//! use threshold_fhew::math::{ModQ, Poly, Ring};
//!
//! let modulus = ModQ::prime(18014398509404161);
//! let ring = Ring::new(modulus, 256);
//!
//! let mut s = vec![0i32; 256];
//! s[1] = 1;
//! let a = Poly::from_signed(&[1i32; 256], modulus);
//! let product = ring.mul_small(&a, &ring.small_to_eval(&s));
//! assert_eq!(product.dimension(), 256);
//! ```

pub mod crt;
pub mod gadget;
pub mod modular;
pub mod ntt;
pub mod poly;
pub mod ring;
pub mod sampling;

pub use gadget::GadgetVector;
pub use modular::ModQ;
pub use ntt::NttContext;
pub use poly::Poly;
pub use ring::{EvalPoly, Ring};
pub use sampling::GaussianSampler;
