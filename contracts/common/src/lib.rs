//! Shared types and helpers for the confidential feedback contract suite.
//!
//! This crate provides:
//! - [`CommonError`]: error codes shared by every contract in the suite.
//! - [`EncType`]: the ciphertext type tags exchanged between the feedback
//!   contract and the FHE coprocessor.
//! - [`pausable`]: emergency stop flag and guard.
//! - [`ttl`]: storage lifetime constants and bump helpers.
//!
//! Contract error enums reuse these discriminants for the shared cases and
//! put their own codes at **100** and above.

#![no_std]
#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

#[cfg(test)]
extern crate std;

use soroban_sdk::contracterror;

// ── Modules ──────────────────────────────────────────────────────────────────

pub mod enc_type;
pub mod pausable;
pub mod ttl;

pub use enc_type::*;
pub use pausable::*;
pub use ttl::*;

// ── Shared error enum ────────────────────────────────────────────────────────

/// Standardised error codes shared by every contract in the suite.
///
/// # Code ranges
/// | Range   | Purpose                        |
/// |---------|--------------------------------|
/// | 1 – 9   | Lifecycle / initialisation     |
/// | 10 – 19 | Authentication & authorisation |
/// | 20 – 29 | Resource not found             |
/// | 30 – 39 | Validation / input             |
/// | 40 – 49 | Contract state                 |
/// | 100+    | Reserved for contract-specific |
#[contracterror]
#[derive(Clone, Debug, Eq, PartialEq, Copy)]
#[repr(u32)]
pub enum CommonError {
    NotInitialized = 1,
    AlreadyInitialized = 2,
    AccessDenied = 10,
    RecordNotFound = 21,
    InvalidInput = 30,
    // ── Contract state (40–49) ───────────────────────────────
    /// The contract is currently paused and cannot process requests.
    Paused = 40,
}
