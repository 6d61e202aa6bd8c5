use soroban_sdk::contracttype;

/// Plaintext type carried by a ciphertext handle.
///
/// Integer types wrap modulo `2^bits` on overflow, matching the semantics of
/// FHE unsigned integers. `Bool` holds `0` or `1`.
#[contracttype]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum EncType {
    Bool,
    Uint8,
    Uint32,
    Uint64,
}

impl EncType {
    /// Bit width of the plaintext domain.
    pub fn bits(self) -> u32 {
        match self {
            EncType::Bool => 1,
            EncType::Uint8 => 8,
            EncType::Uint32 => 32,
            EncType::Uint64 => 64,
        }
    }

    /// Largest representable plaintext.
    pub fn max_value(self) -> u64 {
        match self {
            EncType::Bool => 1,
            EncType::Uint8 => u8::MAX as u64,
            EncType::Uint32 => u32::MAX as u64,
            EncType::Uint64 => u64::MAX,
        }
    }

    /// Whether `value` is representable without truncation.
    pub fn fits(self, value: u64) -> bool {
        value <= self.max_value()
    }

    /// Reduce `value` into the plaintext domain (modular wrap / truncation).
    pub fn wrap(self, value: u64) -> u64 {
        value & self.max_value()
    }

    /// Stable one-byte tag, used when deriving handles.
    pub fn tag(self) -> u8 {
        match self {
            EncType::Bool => 0,
            EncType::Uint8 => 1,
            EncType::Uint32 => 2,
            EncType::Uint64 => 3,
        }
    }
}
