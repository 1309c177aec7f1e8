//! Quantum Key Distribution (QKD) Protocols.
//!
//! This module contains the simulated attack scenarios:
//! - **BB84**: weak-pulse BB84 under a photon-number-splitting attack.
//! - **Decoy**: BB84 with decoy pulses, which expose the PNS attack through
//!   their detection yield.
//! - **SARG04**: a BB84 variant announcing state pairs instead of bases,
//!   under a Trojan-horse attack on the receiver.

pub mod bb84;
pub mod decoy;
pub mod sarg04;
