//! Asynchronous reveal of the aggregate through an external decryption
//! oracle.
//!
//! `request` and `on_revealed` are two independent calls correlated by the
//! request id. Between them the request sits in the pending table for as long
//! as the oracle takes; a callback is only honoured if it names a pending
//! request and carries an Ed25519 signature by the configured oracle key over
//! [`reveal_message`].

use common::set_persistent;
use soroban_sdk::xdr::ToXdr;
use soroban_sdk::{symbol_short, Address, Bytes, BytesN, Env, Map, Symbol, Vec};

use crate::events;
use crate::fhe::Fhe;
use crate::state;
use crate::types::{FeedbackConfig, PendingReveal, RevealedStats};
use crate::FeedbackError;

const PENDING: Symbol = symbol_short!("PEND_REV");
const REVEALED: Symbol = symbol_short!("REVEALED");

const DOMAIN: &[u8; 8] = b"fbreveal";
pub const SIGNATURE_LEN: u32 = 64;
pub const MESSAGE_LEN: usize = 64;

/// Outstanding requests the pending table holds at most. The table lives in
/// instance storage, so it has to stay small.
pub const MAX_PENDING_REVEALS: u32 = 8;

/// Plaintext aggregate as delivered by the oracle.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Aggregates {
    pub total_submissions: u32,
    pub average_satisfaction: u32,
    pub dominant_category: u32,
    pub average_sentiment: u32,
}

/// `H(contract ‖ handle₁ ‖ … ‖ handle₄ ‖ result_version)`.
///
/// Ties a signature to one deployment and to the exact ciphertexts the
/// request was made for, so the same request id on another contract, or on
/// a later result, needs a fresh signature.
pub fn request_binding(env: &Env, contract: &Address, pending: &PendingReveal) -> BytesN<32> {
    let mut preimage = contract.clone().to_xdr(env);
    for handle in pending.handles.iter() {
        preimage.append(&Bytes::from(handle));
    }
    preimage.extend_from_array(&pending.result_version.to_be_bytes());
    env.crypto().sha256(&preimage).into()
}

/// `"fbreveal" ‖ request_id ‖ binding ‖ total ‖ avg_satisfaction ‖ dominant
/// ‖ avg_sentiment`, all integers big-endian. This is what the oracle signs.
pub fn reveal_message(
    env: &Env,
    request_id: u64,
    binding: &BytesN<32>,
    values: &Aggregates,
) -> Bytes {
    let mut buf = [0u8; MESSAGE_LEN];
    buf[..8].copy_from_slice(DOMAIN);
    buf[8..16].copy_from_slice(&request_id.to_be_bytes());
    buf[16..48].copy_from_slice(&binding.to_array());
    buf[48..52].copy_from_slice(&values.total_submissions.to_be_bytes());
    buf[52..56].copy_from_slice(&values.average_satisfaction.to_be_bytes());
    buf[56..60].copy_from_slice(&values.dominant_category.to_be_bytes());
    buf[60..64].copy_from_slice(&values.average_sentiment.to_be_bytes());
    Bytes::from_slice(env, &buf)
}

/// Submits the current result handles for decryption. Returns immediately.
pub fn request(env: &Env, fhe: &Fhe, operator: &Address) -> Result<u64, FeedbackError> {
    let result = state::analysis_result(env)?;
    if !result.ready {
        return Err(FeedbackError::NotReady);
    }
    let mut table = pending_table(env);
    if table.len() >= MAX_PENDING_REVEALS {
        return Err(FeedbackError::CapacityExceeded);
    }

    let handles = result.handles(env);
    let request_id = fhe.request_decryption(&handles);

    let pending = PendingReveal {
        request_id,
        handles,
        result_version: result.version,
        requested_at: env.ledger().timestamp(),
    };
    table.set(request_id, pending);
    store_table(env, &table);

    events::publish_reveal_requested(env, request_id, operator.clone());
    Ok(request_id)
}

/// Oracle callback. Verifies the proof against the pending request and, on
/// success, records the plaintext aggregate.
pub fn on_revealed(
    env: &Env,
    config: &FeedbackConfig,
    request_id: u64,
    values: Aggregates,
    proof: Bytes,
) -> Result<RevealedStats, FeedbackError> {
    let mut table = pending_table(env);
    let pending = table.get(request_id).ok_or(FeedbackError::UnknownRequest)?;

    if proof.is_empty() {
        return Err(FeedbackError::MissingProof);
    }
    if proof.len() != SIGNATURE_LEN {
        return Err(FeedbackError::InvalidProof);
    }
    let mut signature = [0u8; 64];
    proof.copy_into_slice(&mut signature);
    let binding = request_binding(env, &env.current_contract_address(), &pending);
    let message = reveal_message(env, request_id, &binding, &values);
    // Traps, and so aborts the call, on a signature mismatch.
    env.crypto().ed25519_verify(
        &config.oracle_key,
        &message,
        &BytesN::from_array(env, &signature),
    );

    table.remove(request_id);
    store_table(env, &table);

    let stats = RevealedStats {
        request_id,
        total_submissions: values.total_submissions,
        average_satisfaction: values.average_satisfaction,
        dominant_category: values.dominant_category,
        average_sentiment: values.average_sentiment,
        result_version: pending.result_version,
        revealed_at: env.ledger().timestamp(),
    };
    set_persistent(env, &REVEALED, &stats);

    events::publish_analysis_completed(env, values.total_submissions, true);
    Ok(stats)
}

fn pending_table(env: &Env) -> Map<u64, PendingReveal> {
    env.storage()
        .instance()
        .get(&PENDING)
        .unwrap_or(Map::new(env))
}

fn store_table(env: &Env, table: &Map<u64, PendingReveal>) {
    if table.is_empty() {
        env.storage().instance().remove(&PENDING);
    } else {
        env.storage().instance().set(&PENDING, table);
    }
}

pub fn get_pending(env: &Env, request_id: u64) -> Option<PendingReveal> {
    pending_table(env).get(request_id)
}

/// Outstanding request ids, oldest first.
pub fn pending_ids(env: &Env) -> Vec<u64> {
    pending_table(env).keys()
}

/// Forgets every outstanding request. Called whenever the result they refer
/// to is replaced, so a late callback can never publish superseded values.
pub fn drop_pending(env: &Env) {
    env.storage().instance().remove(&PENDING);
}

pub fn revealed_stats(env: &Env) -> Option<RevealedStats> {
    env.storage().persistent().get(&REVEALED)
}

pub fn clear_revealed(env: &Env) {
    env.storage().persistent().remove(&REVEALED);
}
