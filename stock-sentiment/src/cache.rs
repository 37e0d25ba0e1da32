use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

/// A computed value with the wall-clock time it was produced and how long it stays valid.
#[derive(Debug, Clone, Serialize)]
pub struct CacheEntry<T> {
    pub value: T,
    pub computed_at: DateTime<Utc>,
    #[serde(with = "ttl_secs")]
    pub ttl: Duration,
}

impl<T> CacheEntry<T> {
    pub fn new(value: T, ttl: Duration) -> Self {
        Self::computed_at(value, Utc::now(), ttl)
    }

    pub fn computed_at(value: T, computed_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self { value, computed_at, ttl }
    }

    pub fn is_stale(&self) -> bool {
        self.is_stale_at(Utc::now())
    }

    /// Stale once `ttl` has fully elapsed. A clock that moved backwards keeps the entry fresh.
    pub fn is_stale_at(&self, now: DateTime<Utc>) -> bool {
        match (now - self.computed_at).to_std() {
            Ok(age) => age >= self.ttl,
            Err(_) => false,
        }
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        chrono::Duration::from_std(self.ttl)
            .ok()
            .and_then(|ttl| self.computed_at.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

mod ttl_secs {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(ttl: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(ttl.as_secs())
    }
}
