//! Aggregation engine.
//!
//! Work is split into a plaintext **plan** (which records still need
//! folding) and an encrypted **execute** step (homomorphic sums, oblivious
//! dominant-category search, averages). Records are folded in id order and
//! the fold cursor advances with them, so a call that stops early leaves
//! nothing half-done: every folded record is flagged, every flagged record is
//! folded, and the next call resumes right above the cursor.
//!
//! One call folds at most [`MAX_FOLDS_PER_CALL`] records, which keeps a
//! publishing call within the per-transaction ledger-entry limits.

use common::EncType;
use soroban_sdk::{log, BytesN, Env};

use crate::events;
use crate::fhe::Fhe;
use crate::reveal;
use crate::state;
use crate::store::{self, CATEGORY_COUNT};
use crate::types::{AggregationProgress, AnalysisResult, RunningTotals};
use crate::FeedbackError;

/// Upper bound on records folded by a single call. A publishing pass touches
/// about four ledger entries per folded record on top of a fixed set of
/// roughly fifty, against a limit of one hundred per transaction.
pub const MAX_FOLDS_PER_CALL: u32 = 10;

/// Ids a pass will fold, as an inclusive range.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Plan {
    pub first: u32,
    pub last: u32,
    pub remaining: u32,
}

impl Plan {
    pub fn folded(&self) -> u32 {
        self.last - self.first + 1
    }
}

/// Plans the next pass over at most `take` records. Reads no records.
pub fn plan(env: &Env, take: u32) -> Result<Plan, FeedbackError> {
    let count = store::record_count(env);
    let cursor = store::fold_cursor(env);
    let pending = count.saturating_sub(cursor);
    if pending == 0 || take == 0 {
        return Err(FeedbackError::NothingToAnalyze);
    }
    let folded = take.min(pending);
    Ok(Plan {
        first: cursor + 1,
        last: cursor + folded,
        remaining: pending - folded,
    })
}

/// Folds every pending record and publishes. Fails with `CapacityExceeded`
/// when more records wait than one call may fold.
pub fn run_all(env: &Env, fhe: &Fhe) -> Result<AggregationProgress, FeedbackError> {
    if store::pending_count(env) > MAX_FOLDS_PER_CALL {
        return Err(FeedbackError::CapacityExceeded);
    }
    run(env, fhe, MAX_FOLDS_PER_CALL)
}

/// Folds up to `limit` planned records, never more than
/// [`MAX_FOLDS_PER_CALL`], and publishes a new result once nothing is left.
pub fn run(env: &Env, fhe: &Fhe, limit: u32) -> Result<AggregationProgress, FeedbackError> {
    let plan = plan(env, limit.min(MAX_FOLDS_PER_CALL))?;

    let mut totals = store::running_totals(env)?;
    for id in plan.first..=plan.last {
        fold_record(env, fhe, &mut totals, id)?;
    }
    store::set_fold_cursor(env, plan.last);
    let totals = seal_totals(env, fhe, totals);

    let folded = plan.folded();
    log!(env, "aggregation pass", folded, plan.remaining);

    if plan.remaining > 0 {
        events::publish_aggregation_progress(env, folded, plan.remaining);
        return Ok(AggregationProgress {
            folded,
            remaining: plan.remaining,
            published: false,
        });
    }

    publish(env, fhe, &totals)?;
    events::publish_analysis_completed(env, totals.folded_count, false);
    Ok(AggregationProgress {
        folded,
        remaining: 0,
        published: true,
    })
}

/// Adds one record into the running sums and flags it. The flag and the
/// sums are written in the same call, so a record is never marked without
/// its contribution.
fn fold_record(
    env: &Env,
    fhe: &Fhe,
    totals: &mut RunningTotals,
    record_id: u32,
) -> Result<(), FeedbackError> {
    let mut record = store::get_record(env, record_id).ok_or(FeedbackError::RecordNotFound)?;
    if record.analyzed {
        return Ok(());
    }

    // Ratings are stored as Uint8; sums are accumulated at Uint32.
    let satisfaction = fhe.cast(&record.satisfaction, EncType::Uint32);
    let sentiment = fhe.cast(&record.sentiment, EncType::Uint32);
    totals.satisfaction_sum = fhe.add(&totals.satisfaction_sum, &satisfaction);
    totals.sentiment_sum = fhe.add(&totals.sentiment_sum, &sentiment);
    totals.folded_count = totals
        .folded_count
        .checked_add(1)
        .ok_or(FeedbackError::CapacityExceeded)?;

    store::mark_analyzed(env, &mut record);
    Ok(())
}

/// Grants the contract lasting access to the sums a pass ends with, so the
/// next transaction can keep folding into them.
fn seal_totals(env: &Env, fhe: &Fhe, totals: RunningTotals) -> RunningTotals {
    let sealed = RunningTotals {
        satisfaction_sum: fhe.seal(totals.satisfaction_sum, &[]),
        sentiment_sum: fhe.seal(totals.sentiment_sum, &[]),
        folded_count: totals.folded_count,
    };
    store::set_running_totals(env, &sealed);
    sealed
}

/// Arg-max over the ten encrypted category counts.
///
/// Each step evaluates `gt` and selects both the count and the id from its
/// result, so the sequence of coprocessor calls never depends on the data.
/// The best-so-far only moves on a strict `>`, so ties resolve to the
/// lowest category id.
pub fn dominant_category(env: &Env, fhe: &Fhe) -> Result<BytesN<32>, FeedbackError> {
    let counts = store::category_totals(env)?;
    let ids = store::constants(env)?.category_ids;
    let mut best_count = counts.get(0).ok_or(FeedbackError::NotInitialized)?;
    let mut best_id = ids.get(0).ok_or(FeedbackError::NotInitialized)?;

    for slot in 1..CATEGORY_COUNT {
        let candidate = counts.get(slot).ok_or(FeedbackError::NotInitialized)?;
        let candidate_id = ids.get(slot).ok_or(FeedbackError::NotInitialized)?;
        let is_greater = fhe.gt(&candidate, &best_count);
        best_count = fhe.select(&is_greater, &candidate, &best_count);
        best_id = fhe.select(&is_greater, &candidate_id, &best_id);
    }
    Ok(best_id)
}

/// Replaces the analysis result with one derived from `totals`.
fn publish(env: &Env, fhe: &Fhe, totals: &RunningTotals) -> Result<(), FeedbackError> {
    let count = totals.folded_count;
    if count == 0 {
        return Err(FeedbackError::NothingToAnalyze);
    }

    let dominant = dominant_category(env, fhe)?;
    let satisfaction_mean = fhe.div_plain(&totals.satisfaction_sum, count);
    let sentiment_mean = fhe.div_plain(&totals.sentiment_sum, count);
    let avg_satisfaction = fhe.cast(&satisfaction_mean, EncType::Uint8);
    let avg_sentiment = fhe.cast(&sentiment_mean, EncType::Uint8);
    let total = fhe.encrypt(u64::from(count), EncType::Uint32);

    let previous = state::analysis_result(env)?;
    let result = AnalysisResult {
        total_submissions: fhe.seal(total, &[]),
        average_satisfaction: fhe.seal(avg_satisfaction, &[]),
        dominant_category: fhe.seal(dominant, &[]),
        overall_sentiment: fhe.seal(avg_sentiment, &[]),
        ready: true,
        version: previous.version.wrapping_add(1),
    };
    state::set_analysis_result(env, &result);
    reveal::drop_pending(env);
    Ok(())
}
