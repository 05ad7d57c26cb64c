//! Commit hash generation.
//!
//! Hashes are opaque hex strings. The generator is injected into the
//! interpreter so tests can use [`SequentialHashes`] and assert exact values.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of new commit hashes.
pub trait HashGenerator: Send {
    /// Produces the next candidate hash. Uniqueness against existing
    /// commits is enforced by the caller.
    fn next_hash(&mut self) -> String;
}

/// Random lowercase hex hashes of a fixed length.
pub struct RandomHashes {
    rng: StdRng,
    length: usize,
}

impl RandomHashes {
    /// Creates a generator seeded from the OS.
    pub fn new(length: usize) -> Self {
        Self {
            rng: StdRng::from_entropy(),
            length: length.max(4),
        }
    }

    /// Creates a reproducible generator.
    pub fn seeded(seed: u64, length: usize) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            length: length.max(4),
        }
    }
}

impl HashGenerator for RandomHashes {
    fn next_hash(&mut self) -> String {
        (0..self.length)
            .map(|_| {
                let nibble: u32 = self.rng.gen_range(0..16);
                std::char::from_digit(nibble, 16).unwrap_or('0')
            })
            .collect()
    }
}

/// Counting hashes (`c000001`, `c000002`, ...) for deterministic tests.
#[derive(Debug, Clone)]
pub struct SequentialHashes {
    next: u64,
    prefix: char,
}

impl SequentialHashes {
    /// Starts counting at 1 with the `c` prefix.
    pub fn new() -> Self {
        Self::with_prefix('c')
    }

    /// Starts counting at 1 with a custom hex-digit prefix.
    pub fn with_prefix(prefix: char) -> Self {
        Self { next: 1, prefix }
    }
}

impl Default for SequentialHashes {
    fn default() -> Self {
        Self::new()
    }
}

impl HashGenerator for SequentialHashes {
    fn next_hash(&mut self) -> String {
        let hash = format!("{}{:06x}", self.prefix, self.next);
        self.next += 1;
        hash
    }
}
