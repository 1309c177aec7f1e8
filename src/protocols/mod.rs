//! Quantum Cryptography Protocols.
//!
//! End-to-end QKD scenarios, each pairing a protocol with the attack it is
//! exposed to.

pub mod qkd;
pub use qkd::{bb84, decoy, sarg04};
