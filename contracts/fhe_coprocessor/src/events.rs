#![allow(deprecated)] // events().publish migration tracked separately

use soroban_sdk::{contracttype, symbol_short, Address, BytesN, Env};

/// Event published when the coprocessor is initialized.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CoprocessorInitializedEvent {
    pub admin: Address,
    pub oracle: Address,
    pub timestamp: u64,
}

/// Event published when a principal receives a persistent grant on a handle.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AccessGrantedEvent {
    pub handle: BytesN<32>,
    pub grantor: Address,
    pub principal: Address,
    pub timestamp: u64,
}

/// Event picked up by decryption relayers.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DecryptionRequestedEvent {
    pub request_id: u64,
    pub requester: Address,
    pub handle_count: u32,
    pub timestamp: u64,
}

/// Event published when the oracle fetched the plaintexts of a request.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DecryptionFulfilledEvent {
    pub request_id: u64,
    pub oracle: Address,
    pub timestamp: u64,
}

pub fn publish_initialized(env: &Env, admin: Address, oracle: Address) {
    env.events().publish(
        (symbol_short!("INIT"),),
        CoprocessorInitializedEvent {
            admin,
            oracle,
            timestamp: env.ledger().timestamp(),
        },
    );
}

pub fn publish_access_granted(
    env: &Env,
    handle: BytesN<32>,
    grantor: Address,
    principal: Address,
) {
    env.events().publish(
        (symbol_short!("ACL_GRT"), principal.clone()),
        AccessGrantedEvent {
            handle,
            grantor,
            principal,
            timestamp: env.ledger().timestamp(),
        },
    );
}

pub fn publish_decryption_requested(
    env: &Env,
    request_id: u64,
    requester: Address,
    handle_count: u32,
) {
    env.events().publish(
        (symbol_short!("DEC_REQ"), request_id),
        DecryptionRequestedEvent {
            request_id,
            requester,
            handle_count,
            timestamp: env.ledger().timestamp(),
        },
    );
}

pub fn publish_decryption_fulfilled(env: &Env, request_id: u64, oracle: Address) {
    env.events().publish(
        (symbol_short!("DEC_FUL"), request_id),
        DecryptionFulfilledEvent {
            request_id,
            oracle,
            timestamp: env.ledger().timestamp(),
        },
    );
}
