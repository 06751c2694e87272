//! In-process challenge store.
//!
//! Challenges live only for the lifetime of the process. Every read-modify
//! of an individual record happens under its DashMap entry lock, so two
//! concurrent verifies for the same id serialize and exactly one can flip
//! the `used` flag.

use crate::challenge::Challenge;
use crate::types::Mode;
use dashmap::DashMap;

/// How long a consumed challenge stays queryable before eviction.
const USED_RETENTION_MS: u64 = 10 * 60 * 1000;
/// Grace period past expiry before an unused challenge is swept.
const EXPIRED_GRACE_MS: u64 = 60 * 1000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConsumeError {
    NotFound,
    WrongMode,
    AlreadyUsed,
    Expired,
}

#[derive(Default)]
pub struct ChallengeStore {
    inner: DashMap<String, Challenge>,
}

impl ChallengeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, challenge: Challenge) {
        self.inner.insert(challenge.id.clone(), challenge);
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn get_clone(&self, id: &str) -> Option<Challenge> {
        self.inner.get(id).map(|entry| entry.value().clone())
    }

    /// Pre-consumption gate: existence, mode, single-use, and expiry, in
    /// that order. An expired challenge is burned here (marked used) so it
    /// can never be retried, per the one-shot charge rule.
    pub fn precheck(&self, id: &str, expected_mode: Mode, now_ms: u64) -> Result<(), ConsumeError> {
        let mut entry = self.inner.get_mut(id).ok_or(ConsumeError::NotFound)?;
        let ch = entry.value_mut();
        if ch.mode() != expected_mode {
            return Err(ConsumeError::WrongMode);
        }
        if ch.used {
            return Err(ConsumeError::AlreadyUsed);
        }
        if now_ms > ch.expires_at_ms {
            ch.used = true;
            ch.used_at_ms = Some(now_ms);
            return Err(ConsumeError::Expired);
        }
        Ok(())
    }

    /// Atomically flip `used` and return the challenge for analysis. The
    /// used check is repeated under the entry lock so a racing verify that
    /// passed `precheck` first still loses here.
    pub fn consume(&self, id: &str, now_ms: u64) -> Result<Challenge, ConsumeError> {
        let mut entry = self.inner.get_mut(id).ok_or(ConsumeError::NotFound)?;
        let ch = entry.value_mut();
        if ch.used {
            return Err(ConsumeError::AlreadyUsed);
        }
        if now_ms > ch.expires_at_ms {
            ch.used = true;
            ch.used_at_ms = Some(now_ms);
            return Err(ConsumeError::Expired);
        }
        ch.used = true;
        ch.used_at_ms = Some(now_ms);
        Ok(ch.clone())
    }

    /// Periodic eviction: unused challenges go 60 s past expiry, used ones
    /// after their retention window. Returns how many entries were dropped.
    pub fn sweep(&self, now_ms: u64) -> usize {
        let before = self.inner.len();
        self.inner.retain(|_, ch| {
            if ch.used {
                let used_at = ch.used_at_ms.unwrap_or(ch.expires_at_ms);
                now_ms <= used_at + USED_RETENTION_MS
            } else {
                now_ms <= ch.expires_at_ms + EXPIRED_GRACE_MS
            }
        });
        before - self.inner.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::challenge::generate;

    fn standalone(now: u64, ttl: u64) -> Challenge {
        generate::new_standalone(now, ttl)
    }

    #[test]
    fn consume_is_single_use() {
        let store = ChallengeStore::new();
        let ch = standalone(1_000, 180_000);
        let id = ch.id.clone();
        store.insert(ch);

        assert!(store.precheck(&id, Mode::Standalone, 2_000).is_ok());
        assert!(store.consume(&id, 2_000).is_ok());
        assert_eq!(
            store.precheck(&id, Mode::Standalone, 3_000),
            Err(ConsumeError::AlreadyUsed)
        );
        assert_eq!(store.consume(&id, 3_000), Err(ConsumeError::AlreadyUsed));
    }

    #[test]
    fn expiry_burns_the_challenge() {
        let store = ChallengeStore::new();
        let ch = standalone(1_000, 10_000);
        let id = ch.id.clone();
        store.insert(ch);

        assert_eq!(
            store.precheck(&id, Mode::Standalone, 12_000),
            Err(ConsumeError::Expired)
        );
        // Burned: a retry now reports already-used rather than expired.
        assert_eq!(
            store.precheck(&id, Mode::Standalone, 12_001),
            Err(ConsumeError::AlreadyUsed)
        );
    }

    #[test]
    fn mode_mismatch_does_not_consume() {
        let store = ChallengeStore::new();
        let ch = standalone(0, 180_000);
        let id = ch.id.clone();
        store.insert(ch);

        assert_eq!(
            store.precheck(&id, Mode::Embed, 1_000),
            Err(ConsumeError::WrongMode)
        );
        assert!(store.precheck(&id, Mode::Standalone, 1_000).is_ok());
    }

    #[test]
    fn sweeper_honors_both_retention_windows() {
        let store = ChallengeStore::new();

        let fresh = standalone(0, 10_000_000);
        let fresh_id = fresh.id.clone();
        store.insert(fresh);

        let expired = standalone(0, 1_000);
        let expired_id = expired.id.clone();
        store.insert(expired);

        let used = standalone(0, 180_000);
        let used_id = used.id.clone();
        store.insert(used);
        store.consume(&used_id, 5_000).unwrap();

        // Within both grace windows nothing is dropped.
        assert_eq!(store.sweep(30_000), 0);
        assert_eq!(store.len(), 3);

        // Past expiry + 60 s the unused expired one goes.
        assert_eq!(store.sweep(62_000), 1);
        assert!(store.get_clone(&expired_id).is_none());

        // Past used_at + 10 min the consumed one goes too.
        assert_eq!(store.sweep(5_000 + 601_000), 1);
        assert!(store.get_clone(&used_id).is_none());
        assert!(store.get_clone(&fresh_id).is_some());
    }

    #[test]
    fn unknown_ids_report_not_found() {
        let store = ChallengeStore::new();
        assert_eq!(
            store.precheck("missing", Mode::Standalone, 0),
            Err(ConsumeError::NotFound)
        );
    }
}
