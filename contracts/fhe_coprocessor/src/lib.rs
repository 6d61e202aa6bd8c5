//! Reference FHE coprocessor.
//!
//! Implements the ciphertext capability set consumed by the confidential
//! feedback contract: `encrypt`, `add`, `gt`, `select`, `div_plain`, `cast`,
//! per-handle access grants and asynchronous decryption requests.
//!
//! Values live behind opaque 32-byte handles. Fresh results are transient:
//! they sit in a scratch map owned by the computing caller and disappear at
//! `release`. Granting lasting access with `allow` gives a value its own
//! persistent entry. This contract evaluates operations directly, which makes it suitable for
//! local networks and tests only: it models the interface and the access
//! rules of a real coprocessor, not its confidentiality. Production
//! deployments point the feedback contract at a coprocessor with the same
//! interface whose state never reaches the ledger in cleartext.

#![no_std]

pub mod acl;
pub mod events;
pub mod handle;


use common::{bump_instance, set_persistent, EncType};
use handle::{Op, SealedValue};
use soroban_sdk::{
    contract, contracterror, contractimpl, contracttype, symbol_short, Address, BytesN, Env,
    Symbol, Vec,
};

// ── Storage keys ────────────────────────────────────────────────────────────────

const ADMIN: Symbol = symbol_short!("ADMIN");
const ORACLE: Symbol = symbol_short!("ORACLE");
const INITIALIZED: Symbol = symbol_short!("INIT");
const REQ_CTR: Symbol = symbol_short!("REQ_CTR");
const REQUEST: Symbol = symbol_short!("DEC_REQ");

// ── Types ──────────────────────────────────────────────────────────────────────

/// A queued decryption request.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DecryptionRequest {
    pub id: u64,
    pub requester: Address,
    pub handles: Vec<BytesN<32>>,
    pub requested_at: u64,
    pub fulfilled: bool,
}

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum CoprocessorError {
    NotInitialized = 1,
    AlreadyInitialized = 2,
    Unauthorized = 3,
    UnknownHandle = 4,
    TypeMismatch = 5,
    DivisionByZero = 6,
    NotAllowed = 7,
    UnknownRequest = 8,
    InvalidInput = 9,
}

// ── Contract ───────────────────────────────────────────────────────────────────

#[contract]
pub struct FheCoprocessor;

#[contractimpl]
impl FheCoprocessor {
    /// Initialize with an admin and the oracle principal that may fetch
    /// plaintexts for queued decryption requests.
    pub fn initialize(env: Env, admin: Address, oracle: Address) -> Result<(), CoprocessorError> {
        if env.storage().instance().has(&INITIALIZED) {
            return Err(CoprocessorError::AlreadyInitialized);
        }
        env.storage().instance().set(&ADMIN, &admin);
        env.storage().instance().set(&ORACLE, &oracle);
        env.storage().instance().set(&INITIALIZED, &true);
        bump_instance(&env);

        events::publish_initialized(&env, admin, oracle);
        Ok(())
    }

    pub fn get_admin(env: Env) -> Result<Address, CoprocessorError> {
        env.storage()
            .instance()
            .get(&ADMIN)
            .ok_or(CoprocessorError::NotInitialized)
    }

    pub fn get_oracle(env: Env) -> Result<Address, CoprocessorError> {
        env.storage()
            .instance()
            .get(&ORACLE)
            .ok_or(CoprocessorError::NotInitialized)
    }

    // ── Ciphertext operations ─────────────────────────────────────────────────

    /// Encrypts a public value under `ty`.
    pub fn trivial_encrypt(
        env: Env,
        caller: Address,
        value: u64,
        ty: EncType,
    ) -> Result<BytesN<32>, CoprocessorError> {
        Self::require_initialized(&env)?;
        caller.require_auth();
        if !ty.fits(value) {
            return Err(CoprocessorError::InvalidInput);
        }
        Ok(handle::store_result(&env, &caller, Op::Encrypt, ty, value))
    }

    /// `lhs + rhs`, wrapping at the operand width.
    pub fn add(
        env: Env,
        caller: Address,
        lhs: BytesN<32>,
        rhs: BytesN<32>,
    ) -> Result<BytesN<32>, CoprocessorError> {
        Self::require_initialized(&env)?;
        caller.require_auth();
        let (a, b) = Self::integer_pair(&env, &caller, &lhs, &rhs)?;
        let sum = a.value.wrapping_add(b.value);
        Ok(handle::store_result(&env, &caller, Op::Add, a.ty, sum))
    }

    /// Encrypted strict greater-than; the result is an encrypted `Bool`.
    pub fn gt(
        env: Env,
        caller: Address,
        lhs: BytesN<32>,
        rhs: BytesN<32>,
    ) -> Result<BytesN<32>, CoprocessorError> {
        Self::require_initialized(&env)?;
        caller.require_auth();
        let (a, b) = Self::integer_pair(&env, &caller, &lhs, &rhs)?;
        let flag = u64::from(a.value > b.value);
        Ok(handle::store_result(&env, &caller, Op::Gt, EncType::Bool, flag))
    }

    /// Oblivious selection: `cond ? if_true : if_false`.
    pub fn select(
        env: Env,
        caller: Address,
        cond: BytesN<32>,
        if_true: BytesN<32>,
        if_false: BytesN<32>,
    ) -> Result<BytesN<32>, CoprocessorError> {
        Self::require_initialized(&env)?;
        caller.require_auth();
        let c = Self::operand(&env, &caller, &cond)?;
        if c.ty != EncType::Bool {
            return Err(CoprocessorError::TypeMismatch);
        }
        let t = Self::operand(&env, &caller, &if_true)?;
        let f = Self::operand(&env, &caller, &if_false)?;
        if t.ty != f.ty {
            return Err(CoprocessorError::TypeMismatch);
        }
        let chosen = if c.value == 1 { t.value } else { f.value };
        Ok(handle::store_result(&env, &caller, Op::Select, t.ty, chosen))
    }

    /// Truncating division by a public divisor.
    pub fn div_plain(
        env: Env,
        caller: Address,
        lhs: BytesN<32>,
        divisor: u64,
    ) -> Result<BytesN<32>, CoprocessorError> {
        Self::require_initialized(&env)?;
        caller.require_auth();
        if divisor == 0 {
            return Err(CoprocessorError::DivisionByZero);
        }
        let a = Self::operand(&env, &caller, &lhs)?;
        if a.ty == EncType::Bool {
            return Err(CoprocessorError::TypeMismatch);
        }
        let quotient = a.value / divisor;
        Ok(handle::store_result(&env, &caller, Op::DivPlain, a.ty, quotient))
    }

    /// Re-types a ciphertext. Narrowing truncates; casting to `Bool` yields
    /// `value != 0`.
    pub fn cast(
        env: Env,
        caller: Address,
        ciphertext: BytesN<32>,
        ty: EncType,
    ) -> Result<BytesN<32>, CoprocessorError> {
        Self::require_initialized(&env)?;
        caller.require_auth();
        let a = Self::operand(&env, &caller, &ciphertext)?;
        let value = match ty {
            EncType::Bool => u64::from(a.value != 0),
            _ => a.value,
        };
        Ok(handle::store_result(&env, &caller, Op::Cast, ty, value))
    }

    // ── Access control ────────────────────────────────────────────────────────

    /// Grants `principal` persistent access to `ciphertext`. Only a principal
    /// that may already use the handle can extend the grant. The first grant
    /// on a transient result persists it.
    pub fn allow(
        env: Env,
        caller: Address,
        ciphertext: BytesN<32>,
        principal: Address,
    ) -> Result<(), CoprocessorError> {
        Self::require_initialized(&env)?;
        caller.require_auth();
        acl::grant(&env, &caller, &ciphertext, &principal)?;
        events::publish_access_granted(&env, ciphertext, caller, principal);
        Ok(())
    }

    /// Drops every transient result the caller computed. Persisted handles
    /// are unaffected. Returns how many transient values were dropped.
    pub fn release(env: Env, caller: Address) -> Result<u32, CoprocessorError> {
        Self::require_initialized(&env)?;
        caller.require_auth();
        Ok(handle::release(&env, &caller))
    }

    pub fn is_allowed(env: Env, ciphertext: BytesN<32>, principal: Address) -> bool {
        acl::is_allowed_persistent(&env, &ciphertext, &principal)
    }

    /// Type of a persisted handle. Transient results are not visible here.
    pub fn get_type(env: Env, ciphertext: BytesN<32>) -> Option<EncType> {
        handle::load_persisted(&env, &ciphertext).map(|stored| stored.ty)
    }

    // ── Decryption ────────────────────────────────────────────────────────────

    /// Queues `handles` for asynchronous decryption and returns the request id.
    /// The caller needs a persistent grant on every handle.
    pub fn request_decryption(
        env: Env,
        caller: Address,
        handles: Vec<BytesN<32>>,
    ) -> Result<u64, CoprocessorError> {
        Self::require_initialized(&env)?;
        caller.require_auth();
        if handles.is_empty() {
            return Err(CoprocessorError::InvalidInput);
        }
        for h in handles.iter() {
            acl::persisted_for(&env, &caller, &h)?;
        }

        let request_id: u64 = env
            .storage()
            .instance()
            .get(&REQ_CTR)
            .unwrap_or(0u64)
            .saturating_add(1);
        env.storage().instance().set(&REQ_CTR, &request_id);

        let request = DecryptionRequest {
            id: request_id,
            requester: caller.clone(),
            handles: handles.clone(),
            requested_at: env.ledger().timestamp(),
            fulfilled: false,
        };
        set_persistent(&env, &(REQUEST, request_id), &request);

        events::publish_decryption_requested(&env, request_id, caller, handles.len());
        Ok(request_id)
    }

    /// Oracle-only: returns the plaintexts of a queued request, in handle
    /// order. May be called again for the same request so a rejected callback
    /// can be resent.
    pub fn fulfil_decryption(
        env: Env,
        oracle: Address,
        request_id: u64,
    ) -> Result<Vec<u64>, CoprocessorError> {
        Self::require_initialized(&env)?;
        oracle.require_auth();
        if oracle != Self::get_oracle(env.clone())? {
            return Err(CoprocessorError::Unauthorized);
        }

        let key = (REQUEST, request_id);
        let mut request: DecryptionRequest = env
            .storage()
            .persistent()
            .get(&key)
            .ok_or(CoprocessorError::UnknownRequest)?;

        let mut values = Vec::new(&env);
        for h in request.handles.iter() {
            let stored = handle::load_persisted(&env, &h).ok_or(CoprocessorError::UnknownHandle)?;
            values.push_back(stored.value);
        }

        if !request.fulfilled {
            request.fulfilled = true;
            set_persistent(&env, &key, &request);
            events::publish_decryption_fulfilled(&env, request_id, oracle);
        }
        Ok(values)
    }

    pub fn get_request(env: Env, request_id: u64) -> Option<DecryptionRequest> {
        env.storage().persistent().get(&(REQUEST, request_id))
    }

    /// Self-service decryption for a principal holding a persistent grant.
    pub fn decrypt(
        env: Env,
        caller: Address,
        ciphertext: BytesN<32>,
    ) -> Result<u64, CoprocessorError> {
        Self::require_initialized(&env)?;
        caller.require_auth();
        Ok(acl::persisted_for(&env, &caller, &ciphertext)?.value)
    }

    // ── Internal helpers ──────────────────────────────────────────────────────

    fn require_initialized(env: &Env) -> Result<(), CoprocessorError> {
        if !env.storage().instance().has(&INITIALIZED) {
            return Err(CoprocessorError::NotInitialized);
        }
        Ok(())
    }

    fn operand(
        env: &Env,
        caller: &Address,
        h: &BytesN<32>,
    ) -> Result<SealedValue, CoprocessorError> {
        acl::operand(env, caller, h)
    }

    fn integer_pair(
        env: &Env,
        caller: &Address,
        lhs: &BytesN<32>,
        rhs: &BytesN<32>,
    ) -> Result<(SealedValue, SealedValue), CoprocessorError> {
        let a = Self::operand(env, caller, lhs)?;
        let b = Self::operand(env, caller, rhs)?;
        if a.ty != b.ty || a.ty == EncType::Bool {
            return Err(CoprocessorError::TypeMismatch);
        }
        Ok((a, b))
    }
}
