#![allow(deprecated)] // events().publish migration tracked separately

//! Externally observable log of the feedback contract.
//!
//! No payload ever carries a rating, a category or any other sensitive
//! plaintext; aggregates appear only through the published-result path.

use soroban_sdk::{contracttype, symbol_short, Address, Env, Symbol};

/// Event published when the contract is initialized.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InitializedEvent {
    pub operator: Address,
    pub coprocessor: Address,
    pub timestamp: u64,
}

/// Event published for every accepted submission.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SubmittedEvent {
    pub submitter: Address,
    pub record_id: u32,
    pub timestamp: u64,
}

/// Event published when an aggregate is produced. `published` is false for
/// an in-protocol aggregation and true once plaintext values were revealed.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AnalysisCompletedEvent {
    pub total_records: u32,
    pub published: bool,
    pub timestamp: u64,
}

/// Event published when an aggregation call stopped before the work-list
/// was exhausted.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AggregationProgressEvent {
    pub folded: u32,
    pub remaining: u32,
    pub timestamp: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RevealRequestedEvent {
    pub request_id: u64,
    pub operator: Address,
    pub timestamp: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AnalysisResetEvent {
    pub operator: Address,
    pub timestamp: u64,
}

/// Audit notice raised by the operator for human review of a record.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AnomalyFlaggedEvent {
    pub record_id: u32,
    pub submitter: Address,
    pub reason: Symbol,
    pub timestamp: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OperatorTransferEvent {
    pub current_operator: Address,
    pub proposed_operator: Address,
    pub timestamp: u64,
}

pub fn publish_initialized(env: &Env, operator: Address, coprocessor: Address) {
    env.events().publish(
        (symbol_short!("INIT"),),
        InitializedEvent {
            operator,
            coprocessor,
            timestamp: env.ledger().timestamp(),
        },
    );
}

pub fn publish_submitted(env: &Env, submitter: Address, record_id: u32) {
    env.events().publish(
        (symbol_short!("SUBMIT"), submitter.clone()),
        SubmittedEvent {
            submitter,
            record_id,
            timestamp: env.ledger().timestamp(),
        },
    );
}

pub fn publish_analysis_completed(env: &Env, total_records: u32, published: bool) {
    env.events().publish(
        (symbol_short!("ANALYZED"),),
        AnalysisCompletedEvent {
            total_records,
            published,
            timestamp: env.ledger().timestamp(),
        },
    );
}

pub fn publish_aggregation_progress(env: &Env, folded: u32, remaining: u32) {
    env.events().publish(
        (symbol_short!("AGG_PROG"),),
        AggregationProgressEvent {
            folded,
            remaining,
            timestamp: env.ledger().timestamp(),
        },
    );
}

pub fn publish_reveal_requested(env: &Env, request_id: u64, operator: Address) {
    env.events().publish(
        (symbol_short!("REV_REQ"), request_id),
        RevealRequestedEvent {
            request_id,
            operator,
            timestamp: env.ledger().timestamp(),
        },
    );
}

pub fn publish_analysis_reset(env: &Env, operator: Address) {
    env.events().publish(
        (symbol_short!("RESET"), operator.clone()),
        AnalysisResetEvent {
            operator,
            timestamp: env.ledger().timestamp(),
        },
    );
}

pub fn publish_anomaly_flagged(env: &Env, record_id: u32, submitter: Address, reason: Symbol) {
    env.events().publish(
        (symbol_short!("ANOMALY"), submitter.clone()),
        AnomalyFlaggedEvent {
            record_id,
            submitter,
            reason,
            timestamp: env.ledger().timestamp(),
        },
    );
}

pub fn publish_paused(env: &Env, operator: Address, paused: bool) {
    let topic = if paused {
        symbol_short!("PAUSED")
    } else {
        symbol_short!("UNPAUSED")
    };
    env.events().publish((topic, operator), paused);
}

pub fn publish_operator_proposed(env: &Env, current_operator: Address, proposed_operator: Address) {
    env.events().publish(
        (symbol_short!("OP_PROP"), current_operator.clone()),
        OperatorTransferEvent {
            current_operator,
            proposed_operator,
            timestamp: env.ledger().timestamp(),
        },
    );
}

pub fn publish_operator_accepted(env: &Env, old_operator: Address, new_operator: Address) {
    env.events().publish(
        (symbol_short!("OP_ACPT"), new_operator.clone()),
        OperatorTransferEvent {
            current_operator: old_operator,
            proposed_operator: new_operator,
            timestamp: env.ledger().timestamp(),
        },
    );
}

pub fn publish_operator_cancelled(env: &Env, operator: Address, cancelled: Address) {
    env.events().publish(
        (symbol_short!("OP_CNCL"), operator.clone()),
        OperatorTransferEvent {
            current_operator: operator,
            proposed_operator: cancelled,
            timestamp: env.ledger().timestamp(),
        },
    );
}
