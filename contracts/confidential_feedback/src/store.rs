//! Encrypted record store: the append-only feedback table, the per-user
//! index, the per-category running counts and the shared constant
//! ciphertexts.

use common::{bump_instance, bump_persistent, set_persistent, EncType};
use soroban_sdk::{symbol_short, Address, BytesN, Env, Symbol, Vec};

use crate::events;
use crate::fhe::Fhe;
use crate::types::{FeedbackRecord, FheConstants, RunningTotals};
use crate::FeedbackError;

// ── Storage keys ────────────────────────────────────────────────────────────────

const REC_CTR: Symbol = symbol_short!("REC_CTR");
const FOLD_CURSOR: Symbol = symbol_short!("FOLD_CUR");
const RECORD: Symbol = symbol_short!("RECORD");
const USER_REC: Symbol = symbol_short!("USR_REC");
const CAT_TOTALS: Symbol = symbol_short!("CAT_TOTS");
const RUN_TOT: Symbol = symbol_short!("RUN_TOT");
const CONSTANTS: Symbol = symbol_short!("CONSTS");

// ── Bounds ─────────────────────────────────────────────────────────────────────

pub const SATISFACTION_RANGE: (u32, u32) = (1, 5);
pub const CATEGORY_RANGE: (u32, u32) = (1, CATEGORY_COUNT);
pub const SENTIMENT_RANGE: (u32, u32) = (1, 10);
pub const CATEGORY_COUNT: u32 = 10;

/// Submission timestamps are coarsened to this many seconds before encryption.
pub const TIMESTAMP_BUCKET_SECS: u64 = 3_600;

fn in_range(value: u32, (lo, hi): (u32, u32)) -> bool {
    value >= lo && value <= hi
}

/// Rejects out-of-range ratings before anything is encrypted.
pub fn validate_ratings(
    satisfaction: u32,
    category: u32,
    sentiment: u32,
) -> Result<(), FeedbackError> {
    if !in_range(satisfaction, SATISFACTION_RANGE)
        || !in_range(category, CATEGORY_RANGE)
        || !in_range(sentiment, SENTIMENT_RANGE)
    {
        return Err(FeedbackError::InvalidInput);
    }
    Ok(())
}

// ── Records ────────────────────────────────────────────────────────────────────

/// Encrypts and stores one submission, returning its id.
pub fn submit(
    env: &Env,
    fhe: &Fhe,
    submitter: &Address,
    satisfaction: u32,
    category: u32,
    sentiment: u32,
) -> Result<u32, FeedbackError> {
    validate_ratings(satisfaction, category, sentiment)?;

    let record_id = record_count(env)
        .checked_add(1)
        .ok_or(FeedbackError::CapacityExceeded)?;

    let now = env.ledger().timestamp();
    let bucket = now - now % TIMESTAMP_BUCKET_SECS;

    let satisfaction = fhe.encrypt(u64::from(satisfaction), EncType::Uint8);
    let category_ct = fhe.encrypt(u64::from(category), EncType::Uint8);
    let sentiment = fhe.encrypt(u64::from(sentiment), EncType::Uint8);
    let submitted_at = fhe.encrypt(bucket, EncType::Uint64);

    // Submitters may read back their own satisfaction and category.
    let record = FeedbackRecord {
        id: record_id,
        satisfaction: fhe.seal(satisfaction, &[submitter]),
        category: fhe.seal(category_ct, &[submitter]),
        sentiment: fhe.seal(sentiment, &[]),
        submitted_at: fhe.seal(submitted_at, &[]),
        submitter: submitter.clone(),
        analyzed: false,
    };
    put_record(env, &record);
    env.storage().instance().set(&REC_CTR, &record_id);
    bump_instance(env);

    let user_key = (USER_REC, submitter.clone());
    let mut ids: Vec<u32> = env
        .storage()
        .persistent()
        .get(&user_key)
        .unwrap_or(Vec::new(env));
    ids.push_back(record_id);
    set_persistent(env, &user_key, &ids);

    // The category index is public to the caller at this point; only the
    // stored field stays encrypted.
    let mut totals = category_totals(env)?;
    let slot = category - 1;
    let current = totals.get(slot).ok_or(FeedbackError::NotInitialized)?;
    let one = fhe.encrypt(1, EncType::Uint32);
    totals.set(slot, fhe.seal(fhe.add(&current, &one), &[]));
    set_category_totals(env, &totals);

    events::publish_submitted(env, submitter.clone(), record_id);
    Ok(record_id)
}

pub fn record_count(env: &Env) -> u32 {
    env.storage().instance().get(&REC_CTR).unwrap_or(0)
}

pub fn get_record(env: &Env, record_id: u32) -> Option<FeedbackRecord> {
    let key = (RECORD, record_id);
    let record: Option<FeedbackRecord> = env.storage().persistent().get(&key);
    if record.is_some() {
        bump_persistent(env, &key);
    }
    record
}

pub fn put_record(env: &Env, record: &FeedbackRecord) {
    set_persistent(env, &(RECORD, record.id), record);
}

pub fn user_records(env: &Env, user: &Address) -> Vec<u32> {
    env.storage()
        .persistent()
        .get(&(USER_REC, user.clone()))
        .unwrap_or(Vec::new(env))
}

// ── Fold cursor ────────────────────────────────────────────────────────────────
//
// Records are folded strictly in id order, so one id splits the table: every
// record at or below the cursor is either folded or was excluded by a reset,
// every record above it still waits for aggregation.

pub fn fold_cursor(env: &Env) -> u32 {
    env.storage().instance().get(&FOLD_CURSOR).unwrap_or(0)
}

pub fn set_fold_cursor(env: &Env, cursor: u32) {
    env.storage().instance().set(&FOLD_CURSOR, &cursor);
}

/// Records above the cursor.
pub fn pending_count(env: &Env) -> u32 {
    record_count(env).saturating_sub(fold_cursor(env))
}

pub fn mark_analyzed(env: &Env, record: &mut FeedbackRecord) {
    record.analyzed = true;
    put_record(env, record);
}

// ── Constants ──────────────────────────────────────────────────────────────────

pub fn constants(env: &Env) -> Result<FheConstants, FeedbackError> {
    env.storage()
        .persistent()
        .get(&CONSTANTS)
        .ok_or(FeedbackError::NotInitialized)
}

/// Encrypts the shared constants and grants the contract lasting access.
pub fn create_constants(env: &Env, fhe: &Fhe) -> FheConstants {
    let mut category_ids = Vec::new(env);
    for category in 1..=CATEGORY_COUNT {
        let id = fhe.encrypt(u64::from(category), EncType::Uint8);
        category_ids.push_back(fhe.seal(id, &[]));
    }
    let constants = FheConstants {
        zero_u32: fhe.seal(fhe.encrypt(0, EncType::Uint32), &[]),
        zero_u8: fhe.seal(fhe.encrypt(0, EncType::Uint8), &[]),
        category_ids,
    };
    set_persistent(env, &CONSTANTS, &constants);
    constants
}

// ── Category totals ────────────────────────────────────────────────────────────

/// All ten running counts, index 0 holding category 1.
pub fn category_totals(env: &Env) -> Result<Vec<BytesN<32>>, FeedbackError> {
    env.storage()
        .persistent()
        .get(&CAT_TOTALS)
        .ok_or(FeedbackError::NotInitialized)
}

fn set_category_totals(env: &Env, totals: &Vec<BytesN<32>>) {
    set_persistent(env, &CAT_TOTALS, totals);
}

pub fn category_total(env: &Env, category: u32) -> Option<BytesN<32>> {
    category_totals(env).ok()?.get(category.checked_sub(1)?)
}

pub fn zero_category_totals(env: &Env, constants: &FheConstants) {
    let mut totals = Vec::new(env);
    for _ in 1..=CATEGORY_COUNT {
        totals.push_back(constants.zero_u32.clone());
    }
    set_category_totals(env, &totals);
}

// ── Running totals ─────────────────────────────────────────────────────────────

pub fn running_totals(env: &Env) -> Result<RunningTotals, FeedbackError> {
    env.storage()
        .persistent()
        .get(&RUN_TOT)
        .ok_or(FeedbackError::NotInitialized)
}

pub fn set_running_totals(env: &Env, totals: &RunningTotals) {
    set_persistent(env, &RUN_TOT, totals);
}

pub fn zero_running_totals(env: &Env, constants: &FheConstants) {
    let totals = RunningTotals {
        satisfaction_sum: constants.zero_u32.clone(),
        sentiment_sum: constants.zero_u32.clone(),
        folded_count: 0,
    };
    set_running_totals(env, &totals);
}
