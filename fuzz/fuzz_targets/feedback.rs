#![no_main]

use arbitrary::Arbitrary;
use confidential_feedback::{ConfidentialFeedbackContract, ConfidentialFeedbackContractClient};
use fhe_coprocessor::{FheCoprocessor, FheCoprocessorClient};
use libfuzzer_sys::fuzz_target;
use soroban_sdk::{
    testutils::{Address as _, Ledger as _},
    Address, BytesN, Env,
};

/// Actions covering every state-changing entry point of the feedback
/// contract. Ratings are raw bytes so out-of-range values are exercised too.
#[derive(Arbitrary, Debug)]
pub enum FuzzAction {
    Submit { satisfaction: u8, category: u8, sentiment: u8 },
    RunAggregation,
    RunAggregationBatch { max_records: u8 },
    Reset,
    RequestReveal,
    ForgedReveal { request_id: u8, value: u8, proof_len: u8 },
    Pause,
    Unpause,
    AdvanceTime { delta: u16 },
}

fuzz_target!(|actions: Vec<FuzzAction>| {
    let env = Env::default();
    env.mock_all_auths();

    let coprocessor_id = env.register(FheCoprocessor, ());
    let coprocessor = FheCoprocessorClient::new(&env, &coprocessor_id);
    let oracle = Address::generate(&env);
    coprocessor.initialize(&Address::generate(&env), &oracle);

    let contract_id = env.register(ConfidentialFeedbackContract, ());
    let client = ConfidentialFeedbackContractClient::new(&env, &contract_id);
    let operator = Address::generate(&env);
    let oracle_key = BytesN::from_array(&env, &[9u8; 32]);
    if client
        .try_initialize(&operator, &coprocessor_id, &oracle_key)
        .is_err()
    {
        return;
    }

    let users: Vec<Address> = (0..3).map(|_| Address::generate(&env)).collect();
    let mut accepted: u32 = 0;
    // Plaintext mirror: records folded so far, the fold cursor, and the
    // per-category counts since the last reset.
    let mut folded: u32 = 0;
    let mut cursor: u32 = 0;
    let mut categories = [0u64; 10];

    for (i, action) in actions.into_iter().take(32).enumerate() {
        let user = &users[i % users.len()];
        match action {
            FuzzAction::Submit { satisfaction, category, sentiment } => {
                let (s, c, se) = (satisfaction as u32, category as u32, sentiment as u32);
                let valid = (1..=5).contains(&s) && (1..=10).contains(&c) && (1..=10).contains(&se);
                let result = client.try_submit(user, &s, &c, &se);
                if result.is_ok() {
                    assert!(valid, "INVARIANT VIOLATION: accepted ({}, {}, {})", s, c, se);
                    accepted += 1;
                    categories[(c - 1) as usize] += 1;
                }
            }
            FuzzAction::RunAggregation => {
                let pending = client.get_pending_count();
                if client.try_run_aggregation(&operator).is_ok() {
                    assert!(pending > 0, "INVARIANT VIOLATION: aggregated an empty backlog");
                    folded += pending;
                    cursor += pending;
                }
            }
            FuzzAction::RunAggregationBatch { max_records } => {
                let max = max_records as u32;
                if let Ok(Ok(progress)) = client.try_run_aggregation_batch(&operator, &max) {
                    assert!(progress.folded <= max, "INVARIANT VIOLATION: batch overran");
                    folded += progress.folded;
                    cursor += progress.folded;
                }
            }
            FuzzAction::Reset => {
                if client.try_reset_analysis(&operator).is_ok() {
                    cursor = accepted;
                    categories = [0; 10];
                }
            }
            FuzzAction::RequestReveal => {
                let _ = client.try_request_reveal(&operator);
            }
            FuzzAction::ForgedReveal { request_id, value, proof_len } => {
                // Nobody but the oracle key holder can sign, so this never lands.
                let proof = soroban_sdk::Bytes::from_slice(&env, &vec![value; proof_len as usize]);
                let v = value as u32;
                let result =
                    client.try_on_revealed(&(request_id as u64), &v, &v, &v, &v, &proof);
                assert!(result.is_err(), "INVARIANT VIOLATION: forged reveal accepted");
            }
            FuzzAction::Pause => {
                let _ = client.try_pause(&operator);
            }
            FuzzAction::Unpause => {
                let _ = client.try_unpause(&operator);
            }
            FuzzAction::AdvanceTime { delta } => {
                let ts = env.ledger().timestamp().saturating_add(delta as u64);
                env.ledger().set_timestamp(ts);
            }
        }

        // ── Post-action invariant checks ──
        let records = client.get_record_count();
        assert_eq!(records, accepted, "INVARIANT VIOLATION: record count drifted");

        let analyzed = (1..=records)
            .filter(|id| client.get_record(id).analyzed)
            .count() as u32;
        assert_eq!(analyzed, folded, "INVARIANT VIOLATION: analyzed flags drifted");
        assert_eq!(
            client.get_pending_count(),
            records - cursor,
            "INVARIANT VIOLATION: pending count drifted"
        );

        for category in 1..=10u32 {
            let handle = client.get_category_total(&category);
            assert_eq!(
                coprocessor.decrypt(&contract_id, &handle),
                categories[(category - 1) as usize],
                "INVARIANT VIOLATION: category {} total drifted",
                category
            );
        }

        assert!(client.get_revealed_stats().is_none(), "INVARIANT VIOLATION: unsigned reveal");
    }
});
