use soroban_sdk::{symbol_short, Address, Env, Symbol};

use crate::events;
use crate::store;
use crate::types::FeedbackConfig;
use crate::FeedbackError;

const CONFIG: Symbol = symbol_short!("CONFIG");
const PENDING_OPERATOR: Symbol = symbol_short!("PEND_OP");

pub fn config(env: &Env) -> Result<FeedbackConfig, FeedbackError> {
    env.storage()
        .instance()
        .get(&CONFIG)
        .ok_or(FeedbackError::NotInitialized)
}

pub fn set_config(env: &Env, config: &FeedbackConfig) {
    env.storage().instance().set(&CONFIG, config);
}

pub fn is_initialized(env: &Env) -> bool {
    env.storage().instance().has(&CONFIG)
}

/// Checks that `caller` authorized the call and is the configured operator.
pub fn require_operator(env: &Env, caller: &Address) -> Result<FeedbackConfig, FeedbackError> {
    let config = config(env)?;
    caller.require_auth();
    if *caller != config.operator {
        return Err(FeedbackError::NotAuthorized);
    }
    Ok(config)
}

/// Raises an audit notice naming the record's submitter. No analysis is
/// performed; the event exists for human follow-up.
pub fn flag_anomaly(env: &Env, record_id: u32, reason: Symbol) -> Result<Address, FeedbackError> {
    let record = store::get_record(env, record_id).ok_or(FeedbackError::RecordNotFound)?;
    events::publish_anomaly_flagged(env, record_id, record.submitter.clone(), reason);
    Ok(record.submitter)
}

// ── Operator hand-over ─────────────────────────────────────────────────────────

pub fn pending_operator(env: &Env) -> Option<Address> {
    env.storage().instance().get(&PENDING_OPERATOR)
}

pub fn propose_operator(env: &Env, current: &Address, proposed: &Address) {
    env.storage().instance().set(&PENDING_OPERATOR, proposed);
    events::publish_operator_proposed(env, current.clone(), proposed.clone());
}

pub fn accept_operator(env: &Env, new_operator: &Address) -> Result<(), FeedbackError> {
    new_operator.require_auth();
    let proposed = pending_operator(env).ok_or(FeedbackError::NoPendingTransfer)?;
    if proposed != *new_operator {
        return Err(FeedbackError::NotAuthorized);
    }

    let mut config = config(env)?;
    let old_operator = config.operator.clone();
    config.operator = new_operator.clone();
    set_config(env, &config);
    env.storage().instance().remove(&PENDING_OPERATOR);

    events::publish_operator_accepted(env, old_operator, new_operator.clone());
    Ok(())
}

pub fn cancel_operator_transfer(env: &Env, operator: &Address) -> Result<(), FeedbackError> {
    let proposed = pending_operator(env).ok_or(FeedbackError::NoPendingTransfer)?;
    env.storage().instance().remove(&PENDING_OPERATOR);
    events::publish_operator_cancelled(env, operator.clone(), proposed);
    Ok(())
}
