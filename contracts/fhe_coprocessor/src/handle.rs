//! Handle derivation and the two places a value can live.
//!
//! Fresh results go into the caller's scratch map, kept in instance storage
//! under `(SCRATCH, caller)`, so a chain of intermediate operations touches
//! no ledger entry besides the contract instance. A value only gets its own
//! persistent entry once somebody is granted lasting access to it.

use common::{set_persistent, EncType};
use soroban_sdk::{contracttype, symbol_short, Address, Bytes, BytesN, Env, Map, Symbol, Vec};

const CT: Symbol = symbol_short!("CT");
const NONCE: Symbol = symbol_short!("CT_NONCE");
const SCRATCH: Symbol = symbol_short!("SCRATCH");
const DOMAIN: &[u8; 10] = b"fhe-handle";

/// Operation that produced a handle. Mixed into handle derivation so two
/// handles never share a pre-image even across operation kinds.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum Op {
    Encrypt = 1,
    Add = 2,
    Gt = 3,
    Select = 4,
    DivPlain = 5,
    Cast = 6,
}

/// Coprocessor-side value behind a handle.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SealedValue {
    pub ty: EncType,
    pub value: u64,
}

/// A value with lasting grants. `readers` is the persistent ACL of the
/// handle.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StoredCiphertext {
    pub ty: EncType,
    pub value: u64,
    pub readers: Vec<Address>,
}

/// `H("fhe-handle" ‖ op ‖ type ‖ nonce)`.
fn derive(env: &Env, op: Op, ty: EncType) -> BytesN<32> {
    let nonce: u64 = env
        .storage()
        .instance()
        .get(&NONCE)
        .unwrap_or(0u64)
        .wrapping_add(1);
    env.storage().instance().set(&NONCE, &nonce);

    let mut buf = [0u8; 20];
    buf[..10].copy_from_slice(DOMAIN);
    buf[10] = op as u8;
    buf[11] = ty.tag();
    buf[12..].copy_from_slice(&nonce.to_be_bytes());
    env.crypto().sha256(&Bytes::from_slice(env, &buf)).into()
}

fn scratch_key(caller: &Address) -> (Symbol, Address) {
    (SCRATCH, caller.clone())
}

pub fn scratch(env: &Env, caller: &Address) -> Map<BytesN<32>, SealedValue> {
    env.storage()
        .instance()
        .get(&scratch_key(caller))
        .unwrap_or(Map::new(env))
}

pub fn load_transient(env: &Env, caller: &Address, handle: &BytesN<32>) -> Option<SealedValue> {
    scratch(env, caller).get(handle.clone())
}

/// Computes a handle for a fresh result and parks the value in the caller's
/// scratch map.
pub fn store_result(env: &Env, caller: &Address, op: Op, ty: EncType, value: u64) -> BytesN<32> {
    let handle = derive(env, op, ty);
    let mut values = scratch(env, caller);
    values.set(
        handle.clone(),
        SealedValue {
            ty,
            value: ty.wrap(value),
        },
    );
    env.storage().instance().set(&scratch_key(caller), &values);
    handle
}

/// Drops the caller's scratch map. Returns how many values it held.
pub fn release(env: &Env, caller: &Address) -> u32 {
    let key = scratch_key(caller);
    let held = scratch(env, caller).len();
    env.storage().instance().remove(&key);
    held
}

pub fn load_persisted(env: &Env, handle: &BytesN<32>) -> Option<StoredCiphertext> {
    env.storage().persistent().get(&(CT, handle.clone()))
}

pub fn persist(env: &Env, handle: &BytesN<32>, stored: &StoredCiphertext) {
    set_persistent(env, &(CT, handle.clone()), stored);
}
