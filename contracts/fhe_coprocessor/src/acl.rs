//! Access-control list for ciphertext handles.
//!
//! - **Transient** access: a handle sitting in the caller's scratch map. Every
//!   fresh result is transient for the principal that computed it until that
//!   principal calls `release`.
//! - **Persistent** access: the principal is listed in the handle's stored
//!   `readers`. Needed for decryption, decryption requests and for handles
//!   used across transactions.

use soroban_sdk::{Address, BytesN, Env, Vec};

use crate::handle::{self, SealedValue, StoredCiphertext};
use crate::CoprocessorError;

pub fn is_reader(stored: &StoredCiphertext, principal: &Address) -> bool {
    stored.readers.iter().any(|reader| reader == *principal)
}

pub fn is_allowed_persistent(env: &Env, handle: &BytesN<32>, principal: &Address) -> bool {
    handle::load_persisted(env, handle)
        .map(|stored| is_reader(&stored, principal))
        .unwrap_or(false)
}

/// Resolves an operand for `caller`. Either grant kind is enough; a handle
/// the caller cannot see is reported as not allowed whether or not it exists.
pub fn operand(
    env: &Env,
    caller: &Address,
    handle: &BytesN<32>,
) -> Result<SealedValue, CoprocessorError> {
    if let Some(value) = handle::load_transient(env, caller, handle) {
        return Ok(value);
    }
    match handle::load_persisted(env, handle) {
        Some(stored) if is_reader(&stored, caller) => Ok(SealedValue {
            ty: stored.ty,
            value: stored.value,
        }),
        _ => Err(CoprocessorError::NotAllowed),
    }
}

/// Resolves a handle that must hold a persistent grant for `caller`.
pub fn persisted_for(
    env: &Env,
    caller: &Address,
    handle: &BytesN<32>,
) -> Result<StoredCiphertext, CoprocessorError> {
    match handle::load_persisted(env, handle) {
        Some(stored) if is_reader(&stored, caller) => Ok(stored),
        Some(_) => Err(CoprocessorError::NotAllowed),
        None if handle::load_transient(env, caller, handle).is_some() => {
            Err(CoprocessorError::NotAllowed)
        }
        None => Err(CoprocessorError::UnknownHandle),
    }
}

/// Adds `principal` to the readers of `handle`. The first lasting grant
/// moves a transient value into its own persistent entry.
pub fn grant(
    env: &Env,
    caller: &Address,
    handle: &BytesN<32>,
    principal: &Address,
) -> Result<(), CoprocessorError> {
    let transient = handle::load_transient(env, caller, handle);
    let mut stored = match (handle::load_persisted(env, handle), transient) {
        (Some(stored), transient) => {
            if transient.is_none() && !is_reader(&stored, caller) {
                return Err(CoprocessorError::NotAllowed);
            }
            if is_reader(&stored, principal) {
                return Ok(());
            }
            stored
        }
        (None, Some(value)) => StoredCiphertext {
            ty: value.ty,
            value: value.value,
            readers: Vec::new(env),
        },
        (None, None) => return Err(CoprocessorError::NotAllowed),
    };

    if !is_reader(&stored, principal) {
        stored.readers.push_back(principal.clone());
    }
    handle::persist(env, handle, &stored);
    Ok(())
}
