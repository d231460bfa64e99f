//! State Hashing for Verification
//!
//! Provides deterministic hashing of game state for:
//! - Deck fingerprints (same seed, same deck)
//! - Replay validation (same inputs, same session)

use sha2::{Sha256, Digest};

/// Hash output type (256 bits / 32 bytes)
pub type StateHash = [u8; 32];

/// Deterministic hasher for game state.
///
/// Wraps SHA-256 with helpers for the primitive types the session is made of.
/// Order of updates is critical for determinism.
pub struct StateHasher {
    hasher: Sha256,
}

impl StateHasher {
    /// Create a new hasher with domain separator.
    pub fn new(domain: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(domain);
        Self { hasher }
    }

    /// Create hasher for session state.
    pub fn for_session() -> Self {
        Self::new(b"MEMORY_MATCH_SESSION_V1")
    }

    /// Create hasher for a deck layout.
    pub fn for_deck() -> Self {
        Self::new(b"MEMORY_MATCH_DECK_V1")
    }

    /// Update with raw bytes.
    #[inline]
    pub fn update_bytes(&mut self, bytes: &[u8]) {
        self.hasher.update(bytes);
    }

    /// Update with a u8 value.
    #[inline]
    pub fn update_u8(&mut self, value: u8) {
        self.hasher.update([value]);
    }

    /// Update with a u32 value (little-endian).
    #[inline]
    pub fn update_u32(&mut self, value: u32) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with a u64 value (little-endian).
    #[inline]
    pub fn update_u64(&mut self, value: u64) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with a boolean.
    #[inline]
    pub fn update_bool(&mut self, value: bool) {
        self.update_u8(value as u8);
    }

    /// Update with a length-prefixed string.
    ///
    /// The prefix keeps `["ab", "c"]` and `["a", "bc"]` apart.
    #[inline]
    pub fn update_str(&mut self, value: &str) {
        self.update_u32(value.len() as u32);
        self.update_bytes(value.as_bytes());
    }

    /// Finalize and return the hash.
    pub fn finalize(self) -> StateHash {
        self.hasher.finalize().into()
    }
}

/// Compute state hash for session verification.
///
/// Called by `GameStateMachine::compute_hash()`.
/// The parameter is a closure that adds state-specific data.
pub fn compute_state_hash<F>(generation: u64, now_ms: u64, add_state: F) -> StateHash
where
    F: FnOnce(&mut StateHasher),
{
    let mut hasher = StateHasher::for_session();

    // Always hash generation and virtual time first
    hasher.update_u64(generation);
    hasher.update_u64(now_ms);

    add_state(&mut hasher);

    hasher.finalize()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_hasher_determinism() {
        let make_hash = || {
            let mut hasher = StateHasher::for_session();
            hasher.update_u32(100);
            hasher.update_u64(12345);
            hasher.update_str("🥑");
            hasher.update_bool(true);
            hasher.finalize()
        };

        assert_eq!(make_hash(), make_hash());
    }

    #[test]
    fn test_hash_order_matters() {
        let hash1 = {
            let mut h = StateHasher::new(b"test");
            h.update_u32(1);
            h.update_u32(2);
            h.finalize()
        };

        let hash2 = {
            let mut h = StateHasher::new(b"test");
            h.update_u32(2);
            h.update_u32(1);
            h.finalize()
        };

        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_string_boundaries_matter() {
        let split = |parts: &[&str]| {
            let mut h = StateHasher::for_deck();
            for part in parts {
                h.update_str(part);
            }
            h.finalize()
        };

        assert_ne!(split(&["ab", "c"]), split(&["a", "bc"]));
    }

    #[test]
    fn test_domain_separation() {
        let mut deck = StateHasher::for_deck();
        let mut session = StateHasher::for_session();
        deck.update_u32(7);
        session.update_u32(7);

        assert_ne!(deck.finalize(), session.finalize());
    }

    #[test]
    fn test_compute_state_hash() {
        let hash = compute_state_hash(3, 1000, |hasher| {
            hasher.update_u32(4);
            hasher.update_bool(true);
        });

        let hash2 = compute_state_hash(3, 1000, |hasher| {
            hasher.update_u32(4);
            hasher.update_bool(true);
        });

        assert_eq!(hash, hash2);

        // Different input = different hash
        let hash3 = compute_state_hash(4, 1000, |hasher| {
            hasher.update_u32(4);
            hasher.update_bool(true);
        });

        assert_ne!(hash, hash3);
    }
}
