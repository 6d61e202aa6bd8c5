//! # Property-Based Test Generators
//!
//! Composable `proptest` strategies for feedback submissions and operator
//! action sequences.
//!
//! - Rating generators produce values inside the accepted ranges; the
//!   `invalid_*` variants produce values just outside them.
//! - Boundary values (1 and the range maximum) are weighted up so short runs
//!   still hit them.

extern crate std;

use proptest::prelude::*;
use std::vec::Vec;

// ── Scalar Generators ────────────────────────────────────────────────────────

/// Satisfaction rating in 1..=5.
pub fn satisfaction_strategy() -> impl Strategy<Value = u32> {
    prop_oneof![
        1 => Just(1u32),
        1 => Just(5u32),
        6 => (1u32..=5u32),
    ]
}

/// Category id in 1..=10.
pub fn category_strategy() -> impl Strategy<Value = u32> {
    prop_oneof![
        1 => Just(1u32),
        1 => Just(10u32),
        6 => (1u32..=10u32),
    ]
}

/// Sentiment score in 1..=10.
pub fn sentiment_strategy() -> impl Strategy<Value = u32> {
    prop_oneof![
        1 => Just(1u32),
        1 => Just(10u32),
        6 => (1u32..=10u32),
    ]
}

/// One valid `(satisfaction, category, sentiment)` triple.
pub fn rating_strategy() -> impl Strategy<Value = (u32, u32, u32)> {
    (satisfaction_strategy(), category_strategy(), sentiment_strategy())
}

fn out_of_range(max: u32) -> impl Strategy<Value = u32> {
    prop_oneof![Just(0u32), (max + 1..=1_000u32)]
}

/// A triple with at least one field out of range.
pub fn invalid_rating_strategy() -> impl Strategy<Value = (u32, u32, u32)> {
    prop_oneof![
        (out_of_range(5), category_strategy(), sentiment_strategy()),
        (satisfaction_strategy(), out_of_range(10), sentiment_strategy()),
        (satisfaction_strategy(), category_strategy(), out_of_range(10)),
    ]
}

/// Between 1 and `max_len` valid submissions.
pub fn rating_batch(max_len: usize) -> impl Strategy<Value = Vec<(u32, u32, u32)>> {
    prop::collection::vec(rating_strategy(), 1..=max_len)
}

// ── Action Generators ────────────────────────────────────────────────────────

/// Every feedback contract action the explorer can drive.
///
/// `user_index` selects from a pool of test users (modular indexing).
#[derive(Debug, Clone)]
pub enum FeedbackAction {
    Submit {
        user_index: usize,
        satisfaction: u32,
        category: u32,
        sentiment: u32,
    },
    /// A submission with at least one rating out of range.
    SubmitInvalid {
        user_index: usize,
        satisfaction: u32,
        category: u32,
        sentiment: u32,
    },
    RunAggregation,
    RunAggregationBatch { max_records: u32 },
    Reset,
    /// Request a reveal and deliver the oracle's answer.
    Reveal,
    /// Operator-only call made by a user instead.
    UnauthorizedAggregation { user_index: usize },
    AdvanceTime { delta: u64 },
    Pause,
    Unpause,
}

/// Strategy for individual actions. Submissions dominate; operator calls
/// and pauses are rarer.
pub fn feedback_action_strategy(num_users: usize) -> impl Strategy<Value = FeedbackAction> {
    let user_idx = 0..num_users;

    prop_oneof![
        40 => (user_idx.clone(), rating_strategy()).prop_map(|(u, (s, c, se))| {
            FeedbackAction::Submit {
                user_index: u,
                satisfaction: s,
                category: c,
                sentiment: se,
            }
        }),
        5 => (user_idx.clone(), invalid_rating_strategy()).prop_map(|(u, (s, c, se))| {
            FeedbackAction::SubmitInvalid {
                user_index: u,
                satisfaction: s,
                category: c,
                sentiment: se,
            }
        }),
        15 => Just(FeedbackAction::RunAggregation),
        8 => (0u32..=4u32).prop_map(|m| FeedbackAction::RunAggregationBatch { max_records: m }),
        4 => Just(FeedbackAction::Reset),
        6 => Just(FeedbackAction::Reveal),
        4 => user_idx.prop_map(|u| FeedbackAction::UnauthorizedAggregation { user_index: u }),
        8 => (1u64..=86_400u64).prop_map(|d| FeedbackAction::AdvanceTime { delta: d }),
        2 => Just(FeedbackAction::Pause),
        3 => Just(FeedbackAction::Unpause),
    ]
}

/// Between 1 and `max_len` actions.
pub fn feedback_action_sequence(
    num_users: usize,
    max_len: usize,
) -> impl Strategy<Value = Vec<FeedbackAction>> {
    prop::collection::vec(feedback_action_strategy(num_users), 1..=max_len)
}
