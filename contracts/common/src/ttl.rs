use soroban_sdk::{Env, IntoVal, Val};

/// Bump entries once their remaining lifetime drops below this many ledgers.
pub const TTL_THRESHOLD: u32 = 17_280; // ~1 day (@ ~5s/ledger)
/// Target lifetime after a bump.
pub const TTL_EXTEND_TO: u32 = 518_400; // ~30 days (@ ~5s/ledger)

/// Extends the contract instance (and its instance storage) lifetime.
pub fn bump_instance(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(TTL_THRESHOLD, TTL_EXTEND_TO);
}

/// Extends the lifetime of a single persistent entry.
pub fn bump_persistent<K>(env: &Env, key: &K)
where
    K: IntoVal<Env, Val>,
{
    env.storage()
        .persistent()
        .extend_ttl(key, TTL_THRESHOLD, TTL_EXTEND_TO);
}

/// Writes a persistent entry and extends its lifetime in one step.
pub fn set_persistent<K, V>(env: &Env, key: &K, value: &V)
where
    K: IntoVal<Env, Val>,
    V: IntoVal<Env, Val>,
{
    env.storage().persistent().set(key, value);
    bump_persistent(env, key);
}
