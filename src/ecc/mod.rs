//! Elliptic curve arithmetic
//!
//! A generic prime field and short Weierstrass point group, and the secp256k1
//! parameters and encodings built on top of them.

pub mod field;
pub mod point;
pub mod secp256k1;

pub use field::FieldElement;
pub use point::Point;
pub use secp256k1::{hash160_point, mul_generator, parse_sec, sec, G, N, P};
