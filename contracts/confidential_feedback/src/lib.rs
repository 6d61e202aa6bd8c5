//! Confidential feedback contract.
//!
//! Users submit a satisfaction rating (1–5), a category (1–10) and a
//! sentiment score (1–10). Every value is encrypted through the FHE
//! coprocessor before it is stored, and the operator can run an aggregation
//! that computes the average satisfaction, the dominant category and the
//! average sentiment without anything being decrypted. Plaintext aggregates
//! only appear through the two-step reveal: `request_reveal` queues the
//! result handles with the coprocessor, and an oracle later calls
//! `on_revealed` with the values and an Ed25519 signature over them.
//!
//! Individual ratings are never decrypted by this contract.

#![no_std]

pub mod access;
pub mod aggregation;
pub mod events;
pub mod fhe;
pub mod reveal;
pub mod state;
pub mod store;
pub mod types;


use common::{bump_instance, require_not_paused, set_paused, CommonError};
use soroban_sdk::{
    contract, contracterror, contractimpl, Address, Bytes, BytesN, Env, Symbol, Vec,
};

use fhe::Fhe;
use reveal::Aggregates;
use types::{
    AggregationProgress, AnalysisResult, AnalysisState, FeedbackConfig, FeedbackRecord,
    PendingReveal, PublicStats, RevealedStats,
};

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum FeedbackError {
    NotInitialized = 1,
    AlreadyInitialized = 2,
    NotAuthorized = 10,
    RecordNotFound = 21,
    InvalidInput = 30,
    CapacityExceeded = 31,
    Paused = 40,
    NothingToAnalyze = 100,
    NotReady = 101,
    MissingProof = 102,
    InvalidProof = 103,
    UnknownRequest = 104,
    NoPendingTransfer = 105,
}

impl From<CommonError> for FeedbackError {
    fn from(err: CommonError) -> Self {
        match err {
            CommonError::NotInitialized => FeedbackError::NotInitialized,
            CommonError::AlreadyInitialized => FeedbackError::AlreadyInitialized,
            CommonError::AccessDenied => FeedbackError::NotAuthorized,
            CommonError::RecordNotFound => FeedbackError::RecordNotFound,
            CommonError::InvalidInput => FeedbackError::InvalidInput,
            CommonError::Paused => FeedbackError::Paused,
        }
    }
}

#[contract]
pub struct ConfidentialFeedbackContract;

#[contractimpl]
impl ConfidentialFeedbackContract {
    /// One-time setup. Encrypts the shared constants and creates the
    /// encrypted-zero category counts, running sums and analysis result.
    pub fn initialize(
        env: Env,
        operator: Address,
        coprocessor: Address,
        oracle_key: BytesN<32>,
    ) -> Result<(), FeedbackError> {
        if access::is_initialized(&env) {
            return Err(FeedbackError::AlreadyInitialized);
        }
        operator.require_auth();

        let config = FeedbackConfig {
            operator: operator.clone(),
            coprocessor: coprocessor.clone(),
            oracle_key,
            deployed_at: env.ledger().timestamp(),
        };
        access::set_config(&env, &config);
        bump_instance(&env);

        let fhe = Fhe::new(&env, &coprocessor);
        let constants = store::create_constants(&env, &fhe);
        fhe.release();
        store::zero_category_totals(&env, &constants);
        store::zero_running_totals(&env, &constants);
        state::set_analysis_result(&env, &state::zeroed_result(&constants, 0));

        events::publish_initialized(&env, operator, coprocessor);
        Ok(())
    }

    pub fn is_initialized(env: Env) -> bool {
        access::is_initialized(&env)
    }

    pub fn get_config(env: Env) -> Result<FeedbackConfig, FeedbackError> {
        access::config(&env)
    }

    pub fn get_operator(env: Env) -> Result<Address, FeedbackError> {
        Ok(access::config(&env)?.operator)
    }

    // ── Submission ────────────────────────────────────────────────────────────

    /// Encrypts and stores one feedback entry. Returns the new record id.
    pub fn submit(
        env: Env,
        submitter: Address,
        satisfaction: u32,
        category: u32,
        sentiment: u32,
    ) -> Result<u32, FeedbackError> {
        let config = access::config(&env)?;
        require_not_paused(&env)?;
        submitter.require_auth();

        let fhe = Fhe::new(&env, &config.coprocessor);
        let record_id = store::submit(&env, &fhe, &submitter, satisfaction, category, sentiment)?;
        fhe.release();
        Ok(record_id)
    }

    pub fn get_user_record_count(env: Env, user: Address) -> u32 {
        store::user_records(&env, &user).len()
    }

    pub fn has_submitted(env: Env, user: Address) -> bool {
        !store::user_records(&env, &user).is_empty()
    }

    pub fn get_user_records(env: Env, user: Address) -> Vec<u32> {
        store::user_records(&env, &user)
    }

    pub fn get_record(env: Env, record_id: u32) -> Result<FeedbackRecord, FeedbackError> {
        store::get_record(&env, record_id).ok_or(FeedbackError::RecordNotFound)
    }

    pub fn get_record_count(env: Env) -> u32 {
        store::record_count(&env)
    }

    /// Handle of the encrypted count for `category`.
    pub fn get_category_total(env: Env, category: u32) -> Result<BytesN<32>, FeedbackError> {
        if category < store::CATEGORY_RANGE.0 || category > store::CATEGORY_RANGE.1 {
            return Err(FeedbackError::InvalidInput);
        }
        store::category_total(&env, category).ok_or(FeedbackError::NotInitialized)
    }

    /// Records submitted since the last fold or reset.
    pub fn get_pending_count(env: Env) -> u32 {
        store::pending_count(&env)
    }

    // ── Aggregation ───────────────────────────────────────────────────────────

    /// Folds every pending record and publishes a new encrypted result.
    /// Returns the number of records the result covers. When more than
    /// `MAX_FOLDS_PER_CALL` records wait, fails with `CapacityExceeded` and
    /// the batch entry point has to drain them first.
    pub fn run_aggregation(env: Env, operator: Address) -> Result<u32, FeedbackError> {
        let config = access::require_operator(&env, &operator)?;
        require_not_paused(&env)?;

        let fhe = Fhe::new(&env, &config.coprocessor);
        aggregation::run_all(&env, &fhe)?;
        fhe.release();
        Ok(store::running_totals(&env)?.folded_count)
    }

    /// Folds at most `max_records` records, clamped to `MAX_FOLDS_PER_CALL`.
    /// The result is only replaced once a call finds nothing left to fold.
    pub fn run_aggregation_batch(
        env: Env,
        operator: Address,
        max_records: u32,
    ) -> Result<AggregationProgress, FeedbackError> {
        let config = access::require_operator(&env, &operator)?;
        require_not_paused(&env)?;
        if max_records == 0 {
            return Err(FeedbackError::InvalidInput);
        }

        let fhe = Fhe::new(&env, &config.coprocessor);
        let progress = aggregation::run(&env, &fhe, max_records)?;
        fhe.release();
        Ok(progress)
    }

    pub fn get_analysis_state(env: Env) -> Result<AnalysisState, FeedbackError> {
        state::current_state(&env)
    }

    pub fn get_analysis_result(env: Env) -> Result<AnalysisResult, FeedbackError> {
        state::analysis_result(&env)
    }

    /// Zeroes the aggregate. Records submitted before the reset are left out
    /// of every later result.
    pub fn reset_analysis(env: Env, operator: Address) -> Result<(), FeedbackError> {
        access::require_operator(&env, &operator)?;
        state::reset(&env, &operator)
    }

    // ── Reveal ────────────────────────────────────────────────────────────────

    /// Queues the current result for decryption. Returns the request id the
    /// oracle callback must quote.
    pub fn request_reveal(env: Env, operator: Address) -> Result<u64, FeedbackError> {
        let config = access::require_operator(&env, &operator)?;
        let fhe = Fhe::new(&env, &config.coprocessor);
        reveal::request(&env, &fhe, &operator)
    }

    /// Oracle callback carrying the decrypted aggregate. Anyone may relay it;
    /// `proof` must be the oracle's signature over the values.
    pub fn on_revealed(
        env: Env,
        request_id: u64,
        total_submissions: u32,
        average_satisfaction: u32,
        dominant_category: u32,
        average_sentiment: u32,
        proof: Bytes,
    ) -> Result<RevealedStats, FeedbackError> {
        let config = access::config(&env)?;
        let values = Aggregates {
            total_submissions,
            average_satisfaction,
            dominant_category,
            average_sentiment,
        };
        reveal::on_revealed(&env, &config, request_id, values, proof)
    }

    pub fn get_pending_reveal(env: Env, request_id: u64) -> Option<PendingReveal> {
        reveal::get_pending(&env, request_id)
    }

    pub fn get_pending_reveal_ids(env: Env) -> Vec<u64> {
        reveal::pending_ids(&env)
    }

    pub fn get_revealed_stats(env: Env) -> Option<RevealedStats> {
        reveal::revealed_stats(&env)
    }

    // ── Administration ────────────────────────────────────────────────────────

    pub fn flag_anomaly(
        env: Env,
        operator: Address,
        record_id: u32,
        reason: Symbol,
    ) -> Result<(), FeedbackError> {
        access::require_operator(&env, &operator)?;
        access::flag_anomaly(&env, record_id, reason)?;
        Ok(())
    }

    /// First step of the operator hand-over. Replaces any earlier proposal.
    pub fn propose_operator(
        env: Env,
        operator: Address,
        new_operator: Address,
    ) -> Result<(), FeedbackError> {
        access::require_operator(&env, &operator)?;
        access::propose_operator(&env, &operator, &new_operator);
        Ok(())
    }

    pub fn accept_operator(env: Env, new_operator: Address) -> Result<(), FeedbackError> {
        access::accept_operator(&env, &new_operator)
    }

    pub fn cancel_operator_transfer(env: Env, operator: Address) -> Result<(), FeedbackError> {
        access::require_operator(&env, &operator)?;
        access::cancel_operator_transfer(&env, &operator)
    }

    pub fn get_pending_operator(env: Env) -> Option<Address> {
        access::pending_operator(&env)
    }

    /// Stops submissions and aggregation. Reads, reveal callbacks and reset
    /// remain available.
    pub fn pause(env: Env, operator: Address) -> Result<(), FeedbackError> {
        access::require_operator(&env, &operator)?;
        set_paused(&env, true);
        events::publish_paused(&env, operator, true);
        Ok(())
    }

    pub fn unpause(env: Env, operator: Address) -> Result<(), FeedbackError> {
        access::require_operator(&env, &operator)?;
        set_paused(&env, false);
        events::publish_paused(&env, operator, false);
        Ok(())
    }

    pub fn is_paused(env: Env) -> bool {
        common::is_paused(&env)
    }

    // ── Public view ───────────────────────────────────────────────────────────

    pub fn get_public_stats(env: Env) -> Result<PublicStats, FeedbackError> {
        let config = access::config(&env)?;
        let result = state::analysis_result(&env)?;
        Ok(PublicStats {
            total_records: store::record_count(&env),
            analysis_ready: result.ready,
            deployed_at: config.deployed_at,
            state: state::current_state(&env)?,
        })
    }
}
