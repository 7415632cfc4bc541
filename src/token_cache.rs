//! Expiry-aware token storage
//!
//! Tokens are kept in a single shared map guarded by a reader/writer lock.
//! Expired entries are never swept in the background: [`TokenCache::fetch`]
//! removes an expired entry when it finds one, every other read only peeks.

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// Conventional key for the default access token
pub const ACCESS_TOKEN_KEY: &str = "access_token";

/// Conventional key for the default refresh token
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// Source of the current wall-clock time
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> SystemTime;
}

/// Clock backed by the host's system time
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Clock that only moves when told to. Used to simulate the passage of time.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<SystemTime>,
}

impl ManualClock {
    pub fn new(start: SystemTime) -> Self {
        Self { now: Mutex::new(start) }
    }

    /// Start the clock at the current system time
    pub fn starting_now() -> Self {
        Self::new(SystemTime::now())
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }

    pub fn set(&self, instant: SystemTime) {
        *self.now.lock() = instant;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> SystemTime {
        *self.now.lock()
    }
}

/// Requested lifetime of a stored token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ttl {
    Never,
    Seconds(u64),
}

impl From<i64> for Ttl {
    /// Negative values mean the token never expires
    fn from(seconds: i64) -> Self {
        if seconds < 0 {
            Ttl::Never
        } else {
            Ttl::Seconds(seconds as u64)
        }
    }
}

impl From<Option<u64>> for Ttl {
    fn from(seconds: Option<u64>) -> Self {
        match seconds {
            Some(secs) => Ttl::Seconds(secs),
            None => Ttl::Never,
        }
    }
}

/// Absolute expiration of a stored token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    Never,
    At(SystemTime),
}

impl Expiry {
    fn from_ttl(ttl: Ttl, now: SystemTime) -> Self {
        match ttl {
            Ttl::Never => Expiry::Never,
            // A deadline past the representable range can never be reached
            Ttl::Seconds(secs) => now
                .checked_add(Duration::from_secs(secs))
                .map(Expiry::At)
                .unwrap_or(Expiry::Never),
        }
    }

    /// A token is expired once `now` is strictly past its deadline
    pub fn is_expired_at(&self, now: SystemTime) -> bool {
        match self {
            Expiry::Never => false,
            Expiry::At(deadline) => now > *deadline,
        }
    }
}

/// Remaining lifetime of a token as reported by [`TokenCache::remaining_lifetime`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lifetime {
    Never,
    Seconds(u64),
}

impl Lifetime {
    /// Integer form: `-1` for tokens that never expire, otherwise whole seconds
    pub fn as_secs(&self) -> i64 {
        match self {
            Lifetime::Never => -1,
            Lifetime::Seconds(secs) => i64::try_from(*secs).unwrap_or(i64::MAX),
        }
    }
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lifetime::Never => write!(f, "never expires"),
            Lifetime::Seconds(secs) => write!(f, "{}s", secs),
        }
    }
}

/// A token value together with its expiration. Immutable once built.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenRecord {
    value: String,
    expiry: Expiry,
}

impl TokenRecord {
    fn new(value: String, ttl: Ttl, now: SystemTime) -> Self {
        Self {
            value,
            expiry: Expiry::from_ttl(ttl, now),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn expiry(&self) -> Expiry {
        self.expiry
    }

    fn is_expired_at(&self, now: SystemTime) -> bool {
        self.expiry.is_expired_at(now)
    }
}

impl fmt::Debug for TokenRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenRecord")
            .field("value", &"<redacted>")
            .field("expiry", &self.expiry)
            .finish()
    }
}

/// Concurrency-safe, expiry-aware map of named tokens.
///
/// Create one per process (or per test suite) and share it as `Arc<TokenCache>`.
pub struct TokenCache {
    records: RwLock<HashMap<String, TokenRecord>>,
    clock: Arc<dyn Clock>,
}

impl Default for TokenCache {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TokenCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCache")
            .field("entries", &self.records.read().len())
            .field("clock", &self.clock)
            .finish()
    }
}

impl TokenCache {
    /// Create an empty cache using the system clock
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create an empty cache reading time from `clock`
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// Insert or replace the token stored under `key`
    pub fn store(&self, key: impl Into<String>, value: impl Into<String>, ttl: impl Into<Ttl>) {
        let key = key.into();
        let ttl = ttl.into();
        let record = TokenRecord::new(value.into(), ttl, self.clock.now());

        match ttl {
            Ttl::Never => log::debug!("Storing token: {} with expiry: never", key),
            Ttl::Seconds(secs) => log::debug!("Storing token: {} with expiry: {} seconds", key, secs),
        }

        self.records.write().insert(key, record);
    }

    /// Return the token stored under `key` if it has not expired.
    ///
    /// An expired token is removed from the cache as a side effect.
    pub fn fetch(&self, key: &str) -> Option<String> {
        let now = self.clock.now();

        {
            let records = self.records.read();
            match records.get(key) {
                None => {
                    log::debug!("Token not found in store: {}", key);
                    return None;
                }
                Some(record) if !record.is_expired_at(now) => {
                    return Some(record.value.clone());
                }
                Some(_) => {}
            }
        }

        // Re-check under the write lock: the entry may have been replaced meanwhile
        let mut records = self.records.write();
        match records.get(key) {
            Some(record) if record.is_expired_at(now) => {
                log::debug!("Token found but expired: {}", key);
                records.remove(key);
                None
            }
            Some(record) => Some(record.value.clone()),
            None => None,
        }
    }

    /// True if a token exists under `key` and has not expired. Never evicts.
    pub fn has_valid(&self, key: &str) -> bool {
        let now = self.clock.now();
        self.records
            .read()
            .get(key)
            .map(|record| !record.is_expired_at(now))
            .unwrap_or(false)
    }

    /// True if no token exists under `key` or the stored one has expired
    pub fn is_expired(&self, key: &str) -> bool {
        !self.has_valid(key)
    }

    /// Whole seconds left before the token under `key` expires.
    ///
    /// Missing and expired tokens report `Lifetime::Seconds(0)`.
    pub fn remaining_lifetime(&self, key: &str) -> Lifetime {
        let now = self.clock.now();
        let records = self.records.read();

        match records.get(key).map(TokenRecord::expiry) {
            None => Lifetime::Seconds(0),
            Some(Expiry::Never) => Lifetime::Never,
            Some(Expiry::At(deadline)) => Lifetime::Seconds(
                deadline
                    .duration_since(now)
                    .map(|remaining| remaining.as_secs())
                    .unwrap_or(0),
            ),
        }
    }

    /// The stored expiry for `key`, without checking it
    pub fn expiry(&self, key: &str) -> Option<Expiry> {
        self.records.read().get(key).map(TokenRecord::expiry)
    }

    pub fn remove(&self, key: &str) {
        log::debug!("Removing token: {}", key);
        self.records.write().remove(key);
    }

    pub fn clear_all(&self) {
        log::debug!("Clearing all tokens from token store");
        self.records.write().clear();
    }

    /// Replace the expiry of an existing token, keeping its value.
    ///
    /// Returns `false` without touching the cache when `key` is absent.
    pub fn update_expiry(&self, key: &str, ttl: impl Into<Ttl>) -> bool {
        let ttl = ttl.into();
        let now = self.clock.now();
        let mut records = self.records.write();

        let value = match records.get(key) {
            Some(existing) => existing.value.clone(),
            None => {
                log::debug!("Cannot update expiry for non-existent token: {}", key);
                return false;
            }
        };

        match ttl {
            Ttl::Never => log::debug!("Updating token expiry: {} to never expire", key),
            Ttl::Seconds(secs) => log::debug!("Updating token expiry: {} to {} seconds", key, secs),
        }

        records.insert(key.to_string(), TokenRecord::new(value, ttl, now));
        true
    }

    pub fn default_access_token(&self) -> Option<String> {
        self.fetch(ACCESS_TOKEN_KEY)
    }

    pub fn default_refresh_token(&self) -> Option<String> {
        self.fetch(REFRESH_TOKEN_KEY)
    }

    /// Number of stored records, including expired ones not yet evicted
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}
