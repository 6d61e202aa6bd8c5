//! # Confidential Feedback Integration Tests
//!
//! Exercises the feedback contract and reference coprocessor together:
//! - Property-based tests over submissions and aggregation
//! - Invariant checks across a scripted lifecycle
//! - State exploration against the plaintext model

extern crate std;

use proptest::prelude::*;

use confidential_feedback::types::AnalysisState;
use confidential_feedback::FeedbackError;
use test_framework::generators::*;
use test_framework::invariants::*;
use test_framework::state_explorer::*;
use test_framework::*;

fn mean(values: &[u32]) -> u64 {
    values.iter().map(|v| u64::from(*v)).sum::<u64>() / values.len() as u64
}

fn lowest_argmax(categories: &[u32]) -> u64 {
    let mut counts = [0u32; 10];
    for c in categories {
        counts[(*c - 1) as usize] += 1;
    }
    let mut best = 0;
    for i in 1..10 {
        if counts[i] > counts[best] {
            best = i;
        }
    }
    best as u64 + 1
}

// ═════════════════════════════════════════════════════════════════════════════
//  Property-Based Tests
// ═════════════════════════════════════════════════════════════════════════════

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// **Property**: a principal's record count equals their submissions.
    #[test]
    fn prop_user_record_count_matches_submissions(batch in rating_batch(8)) {
        let mut env = TestEnv::new();
        let harness = FeedbackHarness::new(&mut env);
        let user = harness.new_user();

        for (s, c, se) in &batch {
            harness.submit(&user, *s, *c, *se);
        }

        prop_assert_eq!(harness.client.get_user_record_count(&user), batch.len() as u32);
    }

    /// **Property**: decrypted category totals equal the plaintext counts.
    #[test]
    fn prop_category_totals_round_trip(batch in rating_batch(12)) {
        let mut env = TestEnv::new();
        let harness = FeedbackHarness::new(&mut env);
        for (s, c, se) in &batch {
            harness.submit_as_new_user(*s, *c, *se);
        }

        let mut expected = [0u64; 10];
        for (_, c, _) in &batch {
            expected[(*c - 1) as usize] += 1;
        }
        prop_assert_eq!(harness.category_counts(), expected);
    }

    /// **Property**: the published aggregate equals the plaintext computation.
    #[test]
    fn prop_aggregate_matches_plaintext(batch in rating_batch(10)) {
        let mut env = TestEnv::new();
        let harness = FeedbackHarness::new(&mut env);
        for (s, c, se) in &batch {
            harness.submit_as_new_user(*s, *c, *se);
        }
        harness.run_aggregation();

        let satisfaction: std::vec::Vec<u32> = batch.iter().map(|r| r.0).collect();
        let categories: std::vec::Vec<u32> = batch.iter().map(|r| r.1).collect();
        let sentiment: std::vec::Vec<u32> = batch.iter().map(|r| r.2).collect();

        let snap = harness.snapshot();
        prop_assert!(snap.ready);
        prop_assert_eq!(snap.total_submissions, batch.len() as u64);
        prop_assert_eq!(snap.average_satisfaction, mean(&satisfaction));
        prop_assert_eq!(snap.dominant_category, lowest_argmax(&categories));
        prop_assert_eq!(snap.average_sentiment, mean(&sentiment));
    }

    /// **Property**: out-of-range ratings are always rejected and store nothing.
    #[test]
    fn prop_invalid_ratings_rejected((s, c, se) in invalid_rating_strategy()) {
        let mut env = TestEnv::new();
        let harness = FeedbackHarness::new(&mut env);
        let user = harness.new_user();

        prop_assert_eq!(
            harness.client.try_submit(&user, &s, &c, &se),
            Err(Ok(FeedbackError::InvalidInput))
        );
        prop_assert_eq!(harness.client.get_record_count(), 0);
    }

    /// **Property**: any batch size reaches the same result as one full pass.
    #[test]
    fn prop_batching_is_transparent(batch in rating_batch(9), step in 1u32..=4u32) {
        let mut env = TestEnv::new();
        let harness = FeedbackHarness::new(&mut env);
        for (s, c, se) in &batch {
            harness.submit_as_new_user(*s, *c, *se);
        }

        let mut calls = 0;
        loop {
            let progress = harness.client.run_aggregation_batch(&harness.operator, &step);
            calls += 1;
            if progress.published {
                break;
            }
            prop_assert!(calls <= batch.len(), "batching never finished");
        }

        let satisfaction: std::vec::Vec<u32> = batch.iter().map(|r| r.0).collect();
        let snap = harness.snapshot();
        prop_assert_eq!(snap.total_submissions, batch.len() as u64);
        prop_assert_eq!(snap.average_satisfaction, mean(&satisfaction));
        prop_assert_eq!(snap.analyzed_count, batch.len() as u32);
    }

    /// **Property**: invariants and the plaintext model hold under random
    /// action sequences.
    #[test]
    fn prop_invariants_hold_under_random_actions(
        actions in feedback_action_sequence(3, 20),
    ) {
        let mut env = TestEnv::new();
        let users = env.generate_addresses(3);
        let harness = FeedbackHarness::new(&mut env);

        let explorer = StateExplorer::with_defaults(&harness, users);
        let result = explorer.explore(&actions);

        prop_assert!(result.passed(),
            "Invariant violations: {:?}", result.summary.invariant_violations);
    }
}

// ═════════════════════════════════════════════════════════════════════════════
//  Invariant Tests
// ═════════════════════════════════════════════════════════════════════════════

#[test]
fn test_all_invariants_hold_on_fresh_contract() {
    let mut env = TestEnv::new();
    let harness = FeedbackHarness::new(&mut env);
    let snapshot = harness.snapshot();

    InvariantSet::feedback_defaults().assert_all(&snapshot);
    assert_eq!(snapshot.state, AnalysisState::Empty);
}

#[test]
fn test_invariants_across_lifecycle() {
    let mut env = TestEnv::new();
    let harness = FeedbackHarness::new(&mut env);
    let invariants = InvariantSet::feedback_defaults();
    let transitions = TransitionInvariantSet::feedback_defaults();

    let mut before = harness.snapshot();
    let step = |before: &mut FeedbackSnapshot| {
        let after = harness.snapshot();
        invariants.assert_all(&after);
        assert!(transitions.check_all(before, &after).is_empty());
        *before = after;
    };

    for (s, c, se) in [(5, 3, 9), (4, 3, 8), (2, 6, 2)] {
        harness.submit_as_new_user(s, c, se);
        step(&mut before);
    }

    harness.run_aggregation();
    step(&mut before);
    assert_eq!(before.state, AnalysisState::Ready);

    harness.reveal();
    step(&mut before);
    assert_eq!(before.state, AnalysisState::Published);

    harness.reset();
    step(&mut before);
    assert_eq!(before.state, AnalysisState::Unready);
    assert_eq!(before.analyzed_count, 3);
    assert_eq!(before.pending_count, 0);

    harness.submit_as_new_user(1, 9, 1);
    harness.run_aggregation();
    step(&mut before);
    assert_eq!(before.total_submissions, 1);
    assert_eq!(before.dominant_category, 9);
}

#[test]
fn test_transition_invariant_detects_lost_records() {
    let mut env = TestEnv::new();
    let harness = FeedbackHarness::new(&mut env);
    harness.submit_as_new_user(3, 3, 3);
    let after = harness.snapshot();

    let mut before = after.clone();
    before.record_count = 2;
    assert!(RecordsAppendOnly.check(&before, &after).is_err());
}

#[test]
fn test_state_invariant_detects_bad_state() {
    let mut env = TestEnv::new();
    let harness = FeedbackHarness::new(&mut env);
    harness.submit_as_new_user(3, 3, 3);

    let mut snapshot = harness.snapshot();
    snapshot.state = AnalysisState::Ready;
    assert!(StateMatchesFacts.check(&snapshot).is_err());
}

// ═════════════════════════════════════════════════════════════════════════════
//  State Space Explorer Tests
// ═════════════════════════════════════════════════════════════════════════════

#[test]
fn test_explorer_scripted_sequence() {
    let mut env = TestEnv::new();
    let users = env.generate_addresses(2);
    let harness = FeedbackHarness::new(&mut env);

    let actions = std::vec![
        FeedbackAction::RunAggregation,
        FeedbackAction::Submit { user_index: 0, satisfaction: 5, category: 1, sentiment: 9 },
        FeedbackAction::Submit { user_index: 1, satisfaction: 2, category: 4, sentiment: 3 },
        FeedbackAction::Submit { user_index: 0, satisfaction: 4, category: 4, sentiment: 6 },
        FeedbackAction::RunAggregationBatch { max_records: 2 },
        FeedbackAction::Reveal,
        FeedbackAction::RunAggregationBatch { max_records: 2 },
        FeedbackAction::Reveal,
        FeedbackAction::UnauthorizedAggregation { user_index: 1 },
        FeedbackAction::Pause,
        FeedbackAction::Submit { user_index: 1, satisfaction: 1, category: 1, sentiment: 1 },
        FeedbackAction::Unpause,
        FeedbackAction::Reset,
        FeedbackAction::Submit { user_index: 1, satisfaction: 1, category: 7, sentiment: 1 },
        FeedbackAction::RunAggregation,
    ];

    let result = StateExplorer::with_defaults(&harness, users).explore(&actions);
    assert!(result.passed(), "{:?}", result.summary.invariant_violations);
    assert_eq!(result.summary.actions_executed, actions.len());
    assert_eq!(
        result.model.result(),
        Some(ExpectedResult {
            total_submissions: 1,
            average_satisfaction: 1,
            dominant_category: 7,
            average_sentiment: 1,
        })
    );
    assert!(result.summary.entry_point_coverage(FEEDBACK_ENTRY_POINTS.len()) > 0.99);
}

#[test]
fn test_explorer_reset_skips_waiting_records() {
    let mut env = TestEnv::new();
    let users = env.generate_addresses(2);
    let harness = FeedbackHarness::new(&mut env);

    let actions = std::vec![
        FeedbackAction::Submit { user_index: 0, satisfaction: 5, category: 3, sentiment: 9 },
        FeedbackAction::Submit { user_index: 1, satisfaction: 5, category: 3, sentiment: 9 },
        FeedbackAction::Reset,
        FeedbackAction::RunAggregation,
        FeedbackAction::Submit { user_index: 0, satisfaction: 2, category: 8, sentiment: 4 },
        FeedbackAction::RunAggregation,
    ];

    let result = StateExplorer::with_defaults(&harness, users).explore(&actions);
    assert!(result.passed(), "{:?}", result.summary.invariant_violations);
    assert_eq!(
        result.action_log[3].1,
        ActionOutcome::ExpectedError(FeedbackError::NothingToAnalyze as u32)
    );
    assert_eq!(
        result.model.result(),
        Some(ExpectedResult {
            total_submissions: 1,
            average_satisfaction: 2,
            dominant_category: 8,
            average_sentiment: 4,
        })
    );

    let snap = harness.snapshot();
    assert_eq!(snap.record_count, 3);
    assert_eq!(snap.analyzed_count, 1);
    assert_eq!(snap.pending_count, 0);
    assert_eq!(snap.state, AnalysisState::Ready);
}

#[test]
fn test_explorer_backlog_drains_in_batches() {
    let mut env = TestEnv::new();
    let users = env.generate_addresses(3);
    let harness = FeedbackHarness::new(&mut env);

    let mut actions: std::vec::Vec<FeedbackAction> = (0..12)
        .map(|i| FeedbackAction::Submit {
            user_index: i % 3,
            satisfaction: 1 + (i as u32 % 5),
            category: 1 + (i as u32 % 4),
            sentiment: i as u32 % 10,
        })
        .collect();
    actions.push(FeedbackAction::RunAggregation);
    actions.push(FeedbackAction::RunAggregationBatch { max_records: 4 });
    actions.push(FeedbackAction::RunAggregation);

    let config = ExplorerConfig {
        max_steps: actions.len(),
        ..ExplorerConfig::default()
    };
    let result = StateExplorer::new(&harness, InvariantSet::feedback_defaults(), config, users)
        .explore(&actions);
    assert!(result.passed(), "{:?}", result.summary.invariant_violations);
    assert_eq!(
        result.action_log[12].1,
        ActionOutcome::ExpectedError(FeedbackError::CapacityExceeded as u32)
    );
    assert_eq!(result.model.result().map(|r| r.total_submissions), Some(12));
    assert_eq!(harness.snapshot().analyzed_count, 12);
}

#[test]
fn test_explorer_records_snapshots() {
    let mut env = TestEnv::new();
    let users = env.generate_addresses(1);
    let harness = FeedbackHarness::new(&mut env);

    let config = ExplorerConfig {
        max_steps: 3,
        fail_fast: false,
        record_snapshots: true,
    };
    let actions = std::vec![
        FeedbackAction::Submit { user_index: 0, satisfaction: 3, category: 2, sentiment: 5 },
        FeedbackAction::AdvanceTime { delta: 3_600 },
        FeedbackAction::RunAggregation,
        FeedbackAction::Reset,
    ];

    let result = StateExplorer::new(&harness, InvariantSet::feedback_defaults(), config, users)
        .explore(&actions);
    assert!(result.passed());
    // Initial snapshot plus one per executed step; the fourth action is cut.
    assert_eq!(result.snapshots.len(), 4);
    assert!(result.snapshots[2].timestamp >= 3_600);
    assert!(result.snapshots[3].ready);
}
