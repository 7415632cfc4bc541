use bookrunner::{Lifetime, ManualClock, TokenCache, Ttl};
use proptest::prelude::*;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn cache_with_clock() -> (TokenCache, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::starting_now());
    (TokenCache::with_clock(clock.clone()), clock)
}

proptest! {
    #[test]
    fn prop_token_valid_until_deadline(ttl in 0u64..100_000, elapsed in 0u64..200_000) {
        let (cache, clock) = cache_with_clock();
        cache.store("token", "value", Ttl::Seconds(ttl));
        clock.advance(Duration::from_secs(elapsed));

        let expected_valid = elapsed <= ttl;
        prop_assert_eq!(cache.has_valid("token"), expected_valid);
        prop_assert_eq!(
            cache.remaining_lifetime("token"),
            Lifetime::Seconds(ttl.saturating_sub(elapsed))
        );
        prop_assert_eq!(cache.fetch("token").is_some(), expected_valid);

        // fetch evicts expired records
        prop_assert_eq!(cache.len(), usize::from(expected_valid));
    }

    #[test]
    fn prop_negative_ttl_never_expires(ttl in i64::MIN..0, elapsed in 0u64..u32::MAX as u64) {
        let (cache, clock) = cache_with_clock();
        cache.store("token", "forever", ttl);
        clock.advance(Duration::from_secs(elapsed));

        prop_assert_eq!(cache.fetch("token"), Some("forever".to_string()));
        prop_assert_eq!(cache.remaining_lifetime("token").as_secs(), -1);
        prop_assert!(!cache.is_expired("token"));
    }

    #[test]
    fn prop_last_store_wins(values in prop::collection::vec("[a-z0-9]{1,16}", 1..20)) {
        let cache = TokenCache::new();
        for value in &values {
            cache.store("key", value.clone(), -1);
        }

        prop_assert_eq!(cache.fetch("key"), values.last().cloned());
        prop_assert_eq!(cache.len(), 1);
    }

    #[test]
    fn prop_remaining_lifetime_never_increases(ttl in 1u64..10_000, steps in prop::collection::vec(0u64..500, 1..20)) {
        let (cache, clock) = cache_with_clock();
        cache.store("token", "value", Ttl::Seconds(ttl));

        let mut previous = cache.remaining_lifetime("token").as_secs();
        for step in steps {
            clock.advance(Duration::from_secs(step));
            let current = cache.remaining_lifetime("token").as_secs();
            prop_assert!(current <= previous);
            previous = current;
        }
    }
}

#[test]
fn test_update_expiry_restarts_from_now() {
    let (cache, clock) = cache_with_clock();
    cache.store("token", "value", Ttl::Seconds(10));

    clock.advance(Duration::from_secs(8));
    assert!(cache.update_expiry("token", Ttl::Seconds(10)));

    clock.advance(Duration::from_secs(8));
    assert_eq!(cache.fetch("token"), Some("value".to_string()));
    assert_eq!(cache.remaining_lifetime("token"), Lifetime::Seconds(2));
}

#[test]
fn test_update_expiry_on_missing_key() {
    let cache = TokenCache::new();
    assert!(!cache.update_expiry("missing", 60));
    assert!(cache.is_empty());
}

#[test]
fn test_update_expiry_revives_expired_record() {
    let (cache, clock) = cache_with_clock();
    cache.store("token", "stale", Ttl::Seconds(1));
    clock.advance(Duration::from_secs(5));

    assert!(cache.is_expired("token"));
    assert!(cache.update_expiry("token", -1));
    assert_eq!(cache.fetch("token"), Some("stale".to_string()));
}

#[test]
fn test_has_valid_does_not_evict() {
    let (cache, clock) = cache_with_clock();
    cache.store("token", "value", Ttl::Seconds(1));
    clock.advance(Duration::from_secs(2));

    assert!(!cache.has_valid("token"));
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.fetch("token"), None);
    assert_eq!(cache.len(), 0);
}

#[test]
fn test_default_keys() {
    let cache = TokenCache::new();
    cache.store(bookrunner::ACCESS_TOKEN_KEY, "access", -1);
    cache.store(bookrunner::REFRESH_TOKEN_KEY, "refresh", 3600);

    assert_eq!(cache.default_access_token(), Some("access".to_string()));
    assert_eq!(cache.default_refresh_token(), Some("refresh".to_string()));

    cache.clear_all();
    assert_eq!(cache.default_access_token(), None);
}

#[test]
fn test_shared_cache_across_threads() {
    let clock = Arc::new(ManualClock::starting_now());
    let cache = Arc::new(TokenCache::with_clock(clock.clone()));

    let writers: Vec<_> = (0..8)
        .map(|i| {
            let cache = cache.clone();
            thread::spawn(move || {
                for j in 0..100 {
                    cache.store(format!("key-{}", i), format!("value-{}-{}", i, j), Ttl::Seconds(30));
                    assert!(cache.fetch(&format!("key-{}", i)).is_some());
                }
            })
        })
        .collect();

    for writer in writers {
        writer.join().unwrap();
    }

    assert_eq!(cache.len(), 8);
    for i in 0..8 {
        assert_eq!(cache.fetch(&format!("key-{}", i)), Some(format!("value-{}-99", i)));
    }

    clock.advance(Duration::from_secs(31));
    for i in 0..8 {
        assert!(cache.fetch(&format!("key-{}", i)).is_none());
    }
    assert!(cache.is_empty());
}
