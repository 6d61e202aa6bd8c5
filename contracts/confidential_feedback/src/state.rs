//! Analysis state machine.
//!
//! The state is derived from stored facts rather than kept as a separate
//! field, so it cannot drift from the record table:
//!
//! ```text
//! Empty ──submit──▶ Unready ──complete pass──▶ Ready ──reveal──▶ Published
//!                      ▲                         │                  │
//!                      └──── submit / reset ─────┴──────────────────┘
//! ```

use common::set_persistent;
use soroban_sdk::{symbol_short, Address, Env, Symbol};

use crate::events;
use crate::reveal;
use crate::store;
use crate::types::{AnalysisResult, AnalysisState, FheConstants};
use crate::FeedbackError;

const RESULT: Symbol = symbol_short!("RESULT");

pub fn analysis_result(env: &Env) -> Result<AnalysisResult, FeedbackError> {
    env.storage()
        .persistent()
        .get(&RESULT)
        .ok_or(FeedbackError::NotInitialized)
}

pub fn set_analysis_result(env: &Env, result: &AnalysisResult) {
    set_persistent(env, &RESULT, result);
}

/// Encrypted-zero result with `ready = false`.
pub fn zeroed_result(constants: &FheConstants, version: u32) -> AnalysisResult {
    AnalysisResult {
        total_submissions: constants.zero_u32.clone(),
        average_satisfaction: constants.zero_u8.clone(),
        dominant_category: constants.zero_u8.clone(),
        overall_sentiment: constants.zero_u8.clone(),
        ready: false,
        version,
    }
}

pub fn current_state(env: &Env) -> Result<AnalysisState, FeedbackError> {
    let total = store::record_count(env);
    if total == 0 {
        return Ok(AnalysisState::Empty);
    }

    let result = analysis_result(env)?;
    if !result.ready || store::pending_count(env) > 0 {
        return Ok(AnalysisState::Unready);
    }

    let published = reveal::revealed_stats(env)
        .map(|stats| stats.result_version == result.version)
        .unwrap_or(false);
    if published {
        Ok(AnalysisState::Published)
    } else {
        Ok(AnalysisState::Ready)
    }
}

/// Zeroes category counts, running sums and the analysis result, and drops
/// revealed and pending reveal data.
///
/// The fold cursor moves up to the current record count. Records at or below
/// it are never folded again, including ones that were still waiting: their
/// category counts were just wiped, so folding their ratings later would
/// mix them into a result they no longer contribute to. Per-record
/// `analyzed` flags are left as they are, so re-aggregation needs new
/// submissions.
pub fn reset(env: &Env, operator: &Address) -> Result<(), FeedbackError> {
    let previous = analysis_result(env)?;
    let constants = store::constants(env)?;

    store::zero_category_totals(env, &constants);
    store::zero_running_totals(env, &constants);
    store::set_fold_cursor(env, store::record_count(env));
    set_analysis_result(env, &zeroed_result(&constants, previous.version.wrapping_add(1)));
    reveal::drop_pending(env);
    reveal::clear_revealed(env);

    events::publish_analysis_reset(env, operator.clone());
    Ok(())
}
