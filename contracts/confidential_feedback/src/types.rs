use soroban_sdk::{contracttype, Address, BytesN, Vec};

/// Deploy-time configuration, fixed at `initialize` (the operator can be
/// handed over with the two-step transfer).
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FeedbackConfig {
    pub operator: Address,
    pub coprocessor: Address,
    /// Ed25519 public key whose signatures authenticate reveal callbacks.
    pub oracle_key: BytesN<32>,
    pub deployed_at: u64,
}

/// One submitted feedback entry. Every rating is a ciphertext handle; only
/// the submitter and the `analyzed` flag are plaintext.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FeedbackRecord {
    pub id: u32,
    pub satisfaction: BytesN<32>,
    pub category: BytesN<32>,
    pub sentiment: BytesN<32>,
    pub submitted_at: BytesN<32>,
    pub submitter: Address,
    pub analyzed: bool,
}

/// Ciphertexts encrypted once at `initialize` and shared by every later
/// call. None of them is ever modified, so one handle can back any number of
/// zeroed fields.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FheConstants {
    pub zero_u32: BytesN<32>,
    pub zero_u8: BytesN<32>,
    /// `enc(c)` as `Uint8` for category `c`, index 0 holding category 1.
    pub category_ids: Vec<BytesN<32>>,
}

/// Encrypted sums carried between aggregation passes.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RunningTotals {
    pub satisfaction_sum: BytesN<32>,
    pub sentiment_sum: BytesN<32>,
    /// Records folded since the last reset.
    pub folded_count: u32,
}

/// Latest published aggregate, replaced wholesale by every completed pass.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AnalysisResult {
    pub total_submissions: BytesN<32>,
    pub average_satisfaction: BytesN<32>,
    pub dominant_category: BytesN<32>,
    pub overall_sentiment: BytesN<32>,
    pub ready: bool,
    /// Bumped on every publish and every reset.
    pub version: u32,
}

impl AnalysisResult {
    /// Handles in the order they are submitted for decryption and signed by
    /// the oracle.
    pub fn handles(&self, env: &soroban_sdk::Env) -> Vec<BytesN<32>> {
        soroban_sdk::vec![
            env,
            self.total_submissions.clone(),
            self.average_satisfaction.clone(),
            self.dominant_category.clone(),
            self.overall_sentiment.clone(),
        ]
    }
}

#[contracttype]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum AnalysisState {
    /// No records yet.
    Empty,
    /// Records exist but no complete pass covers them.
    Unready,
    /// A completed pass covers every record.
    Ready,
    /// The current result has been revealed in plaintext.
    Published,
}

/// Outcome of one aggregation call.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AggregationProgress {
    pub folded: u32,
    pub remaining: u32,
    pub published: bool,
}

/// A decryption request awaiting the oracle callback.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PendingReveal {
    pub request_id: u64,
    pub handles: Vec<BytesN<32>>,
    pub result_version: u32,
    pub requested_at: u64,
}

/// Plaintext aggregate delivered by an authenticated oracle callback.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RevealedStats {
    pub request_id: u64,
    pub total_submissions: u32,
    pub average_satisfaction: u32,
    pub dominant_category: u32,
    pub average_sentiment: u32,
    pub result_version: u32,
    pub revealed_at: u64,
}

/// Non-sensitive public view.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PublicStats {
    pub total_records: u32,
    pub analysis_ready: bool,
    pub deployed_at: u64,
    pub state: AnalysisState,
}
