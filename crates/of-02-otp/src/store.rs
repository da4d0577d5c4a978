//! One-time code store and its per-key state machine.
//!
//! A record's full lifecycle:
//!
//! ```text
//! (absent) --issue--> active(attempts=0)
//! active --verify(correct, fresh, attempts<MAX)--> (absent), true
//! active --verify(incorrect)--> active(attempts+1)   [attempts==MAX -> absent]
//! active --verify(expired)--> (absent), false
//! active --verify(attempts>=MAX)--> (absent), false
//! ```
//!
//! A deleted record is never resurrected: once consumed, expired, or locked
//! out, only a fresh `issue` brings the key back.

use crate::clock::Clock;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rand::Rng;
use std::sync::Arc;
use tracing::debug;

/// How long an issued code stays valid.
pub const CODE_TTL_SECS: u64 = 300;

/// Wrong guesses allowed before the record is destroyed.
pub const MAX_ATTEMPTS: u32 = 3;

const CODE_MIN: u32 = 100_000;
const CODE_MAX: u32 = 999_999;

#[derive(Debug)]
struct CodeRecord {
    code: String,
    expires_at: u64,
    attempts: u32,
}

/// In-memory code store keyed by delivery destination (phone number or any
/// stable identifier). One outstanding code per key.
///
/// All state transitions for a key happen under that key's map entry, so
/// concurrent verify attempts can never stretch the lockout bound.
pub struct OtpStore {
    records: DashMap<String, CodeRecord>,
    clock: Arc<dyn Clock>,
}

impl OtpStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            records: DashMap::new(),
            clock,
        }
    }

    /// Issues a fresh 6-digit code for `key`, replacing any outstanding one.
    pub fn issue(&self, key: &str) -> String {
        let code = generate_code();
        let record = CodeRecord {
            code: code.clone(),
            expires_at: self.clock.now() + CODE_TTL_SECS,
            attempts: 0,
        };
        self.records.insert(key.to_string(), record);
        debug!(key = key, "Issued verification code");
        code
    }

    /// Verifies `code` against the outstanding record for `key`.
    ///
    /// Every `false` is indistinguishable to the caller: missing record,
    /// expiry, lockout, and mismatch all look the same.
    pub fn verify(&self, key: &str, code: &str) -> bool {
        match self.records.entry(key.to_string()) {
            Entry::Vacant(_) => false,
            Entry::Occupied(mut entry) => {
                let record = entry.get();

                if self.clock.now() > record.expires_at {
                    entry.remove();
                    debug!(key = key, "Verification against expired code");
                    return false;
                }

                if record.attempts >= MAX_ATTEMPTS {
                    entry.remove();
                    debug!(key = key, "Verification against locked-out code");
                    return false;
                }

                if record.code != code {
                    let record = entry.get_mut();
                    record.attempts += 1;
                    if record.attempts >= MAX_ATTEMPTS {
                        entry.remove();
                        debug!(key = key, "Attempt limit reached, code destroyed");
                    }
                    return false;
                }

                // Correct, fresh, within the attempt budget. Consume it.
                entry.remove();
                true
            }
        }
    }

    /// Number of outstanding codes (tests, introspection).
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.records.len()
    }
}

/// Uniform 6-digit code.
fn generate_code() -> String {
    let n = rand::thread_rng().gen_range(CODE_MIN..=CODE_MAX);
    n.to_string()
}
