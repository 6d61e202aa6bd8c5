use soroban_sdk::{symbol_short, Env, Symbol};

use crate::CommonError;

const PAUSED: Symbol = symbol_short!("PAUSED");

/// Sets the contract pause state.
///
/// Callers are responsible for enforcing operator authorization and for
/// emitting their own pause events; this module only owns the flag.
pub fn set_paused(env: &Env, paused: bool) {
    env.storage().instance().set(&PAUSED, &paused);
}

/// Returns `true` when the contract is paused.
pub fn is_paused(env: &Env) -> bool {
    env.storage().instance().get(&PAUSED).unwrap_or(false)
}

/// Guard: returns `CommonError::Paused` when the contract is paused.
///
/// Place this at the top of every state-mutating function that must honour
/// the pause. View-only functions should **not** call this.
pub fn require_not_paused(env: &Env) -> Result<(), CommonError> {
    if is_paused(env) {
        return Err(CommonError::Paused);
    }
    Ok(())
}
