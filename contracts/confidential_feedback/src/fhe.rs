//! Client side of the ciphertext capability layer.
//!
//! The coprocessor is reached only through [`CiphertextCapabilities`], so any
//! contract exposing this interface can back the feedback contract. [`Fhe`]
//! binds a client to the calling contract's own address, which is the
//! principal every operation runs as.

use common::EncType;
use soroban_sdk::{contractclient, Address, BytesN, Env, Vec};

#[contractclient(name = "CoprocessorClient")]
#[allow(dead_code)]
pub trait CiphertextCapabilities {
    fn trivial_encrypt(env: Env, caller: Address, value: u64, ty: EncType) -> BytesN<32>;
    fn add(env: Env, caller: Address, lhs: BytesN<32>, rhs: BytesN<32>) -> BytesN<32>;
    fn gt(env: Env, caller: Address, lhs: BytesN<32>, rhs: BytesN<32>) -> BytesN<32>;
    fn select(
        env: Env,
        caller: Address,
        cond: BytesN<32>,
        if_true: BytesN<32>,
        if_false: BytesN<32>,
    ) -> BytesN<32>;
    fn div_plain(env: Env, caller: Address, lhs: BytesN<32>, divisor: u64) -> BytesN<32>;
    fn cast(env: Env, caller: Address, ciphertext: BytesN<32>, ty: EncType) -> BytesN<32>;
    fn allow(env: Env, caller: Address, ciphertext: BytesN<32>, principal: Address);
    fn release(env: Env, caller: Address) -> u32;
    fn request_decryption(env: Env, caller: Address, handles: Vec<BytesN<32>>) -> u64;
}

pub struct Fhe<'a> {
    client: CoprocessorClient<'a>,
    this: Address,
}

impl<'a> Fhe<'a> {
    pub fn new(env: &'a Env, coprocessor: &Address) -> Self {
        Self {
            client: CoprocessorClient::new(env, coprocessor),
            this: env.current_contract_address(),
        }
    }

    pub fn encrypt(&self, value: u64, ty: EncType) -> BytesN<32> {
        self.client.trivial_encrypt(&self.this, &value, &ty)
    }

    pub fn add(&self, lhs: &BytesN<32>, rhs: &BytesN<32>) -> BytesN<32> {
        self.client.add(&self.this, lhs, rhs)
    }

    pub fn gt(&self, lhs: &BytesN<32>, rhs: &BytesN<32>) -> BytesN<32> {
        self.client.gt(&self.this, lhs, rhs)
    }

    /// Oblivious selection. Always evaluated on both branches; callers never
    /// branch on an encrypted condition themselves.
    pub fn select(
        &self,
        cond: &BytesN<32>,
        if_true: &BytesN<32>,
        if_false: &BytesN<32>,
    ) -> BytesN<32> {
        self.client.select(&self.this, cond, if_true, if_false)
    }

    pub fn div_plain(&self, lhs: &BytesN<32>, divisor: u32) -> BytesN<32> {
        self.client.div_plain(&self.this, lhs, &u64::from(divisor))
    }

    pub fn cast(&self, ciphertext: &BytesN<32>, ty: EncType) -> BytesN<32> {
        self.client.cast(&self.this, ciphertext, &ty)
    }

    /// Pairs a ciphertext that outlives the call with its grant set: the
    /// contract itself always, plus every extra reader. Anything not sealed
    /// is dropped by [`Fhe::release`].
    pub fn seal(&self, ciphertext: BytesN<32>, readers: &[&Address]) -> BytesN<32> {
        self.client.allow(&self.this, &ciphertext, &self.this);
        for reader in readers {
            self.client.allow(&self.this, &ciphertext, reader);
        }
        ciphertext
    }

    /// Discards this contract's intermediate results. Called once a
    /// mutating entry point has sealed everything it keeps.
    pub fn release(&self) {
        self.client.release(&self.this);
    }

    pub fn request_decryption(&self, handles: &Vec<BytesN<32>>) -> u64 {
        self.client.request_decryption(&self.this, handles)
    }
}
