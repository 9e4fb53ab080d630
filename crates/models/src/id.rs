//! Attachment identifiers.

use derive_more::Display;
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};
use time::OffsetDateTime;

const SUFFIX_LEN: usize = 9;

/// Globally unique identifier of an [`AttachmentRecord`](crate::AttachmentRecord).
///
/// Identifiers minted by this crate look like `1718000000000-0-k3j9x2a1b`
/// (milliseconds since the epoch, a per-millisecond tie-breaker, and a random
/// suffix), but identifiers read from existing caches are accepted verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttachmentId(String);
impl AttachmentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}
impl From<&str> for AttachmentId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}
impl From<String> for AttachmentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}
impl AsRef<str> for AttachmentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Mints [`AttachmentId`]s that never collide within one process, even when
/// many are minted inside the same millisecond (pasting a package of fifty
/// photos does exactly that).
///
/// The tie-breaker increments while the clock reports the same (or an
/// earlier) millisecond, and resets once the clock moves forward.
#[derive(Debug, Default)]
pub struct IdMinter {
    last: Mutex<(i128, u32)>,
}
impl IdMinter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint an identifier stamped with the current time.
    pub fn mint(&self) -> AttachmentId {
        self.mint_at(OffsetDateTime::now_utc())
    }

    /// Mint an identifier stamped with `now`.
    pub fn mint_at(&self, now: OffsetDateTime) -> AttachmentId {
        let (millis, sequence) = self.tick(now.unix_timestamp_nanos() / 1_000_000);
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(SUFFIX_LEN)
            .map(|c| char::from(c).to_ascii_lowercase())
            .collect();
        AttachmentId(format!("{millis}-{sequence}-{suffix}"))
    }

    fn tick(&self, millis: i128) -> (i128, u32) {
        // The guarded pair is always valid, even if a holder panicked.
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        if millis > last.0 {
            *last = (millis, 0);
        } else {
            last.1 += 1;
        }
        *last
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use time::macros::datetime;

    #[test]
    fn test_same_millisecond_does_not_collide() {
        let minter = IdMinter::new();
        let now = datetime!(2025-03-01 10:00:00 UTC);
        let ids: HashSet<_> = (0..500).map(|_| minter.mint_at(now)).collect();
        assert_eq!(ids.len(), 500);
    }

    #[test]
    fn test_tie_breaker_increments_then_resets() {
        let minter = IdMinter::new();
        let now = datetime!(2025-03-01 10:00:00 UTC);
        assert!(minter.mint_at(now).as_str().starts_with("1740823200000-0-"));
        assert!(minter.mint_at(now).as_str().starts_with("1740823200000-1-"));
        let later = now + time::Duration::milliseconds(1);
        assert!(minter.mint_at(later).as_str().starts_with("1740823200001-0-"));
    }

    #[test]
    fn test_clock_going_backwards_stays_monotonic() {
        let minter = IdMinter::new();
        let now = datetime!(2025-03-01 10:00:00 UTC);
        minter.mint_at(now);
        let earlier = minter.mint_at(now - time::Duration::seconds(5));
        assert!(earlier.as_str().starts_with("1740823200000-1-"));
    }

    #[test]
    fn test_blank_id_is_empty() {
        assert!(AttachmentId::new("  ").is_empty());
        assert!(!AttachmentId::new("abc").is_empty());
    }
}
