//! Per-producer completion token sequencing.

/// Reserved "no token" value carried by records that nothing waits on.
pub const TOKEN_UNSET: u32 = 0;

/// Monotonic per-producer token counter.
///
/// Every record gets the next value, async and sync alike, so downstream
/// ordering is preserved. Zero is skipped (it means "unset") and the counter
/// wraps past `u32::MAX` back to 1.
#[derive(Debug, Clone)]
pub struct TokenSequence {
    next: u32,
}

impl TokenSequence {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn next(&mut self) -> u32 {
        let token = self.next;
        self.next = if token == u32::MAX { 1 } else { token + 1 };
        token
    }
}

impl Default for TokenSequence {
    fn default() -> Self {
        Self::new()
    }
}
