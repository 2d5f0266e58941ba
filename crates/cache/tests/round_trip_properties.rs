//! Property tests for cache round-trips

use boltdesk_cache::TtlCache;
use proptest::prelude::*;
use std::collections::HashMap;
use std::time::Duration;

proptest! {
    #[test]
    fn prop_set_then_get_returns_value(
        entries in proptest::collection::hash_map("[a-z0-9-]{1,12}", any::<Vec<u8>>(), 0..32)
    ) {
        let cache = TtlCache::new(Duration::from_secs(3600));
        for (key, value) in &entries {
            cache.set(key.clone(), value.clone());
        }

        for (key, value) in &entries {
            let got = cache.get(key);
            prop_assert_eq!(got.as_ref(), Some(value));
        }
        prop_assert_eq!(cache.len(), entries.len());
    }

    #[test]
    fn prop_invalidated_keys_miss(keys in proptest::collection::vec("[a-z]{1,6}", 1..16)) {
        let cache = TtlCache::new(Duration::from_secs(3600));
        let mut expected = HashMap::new();
        for (i, key) in keys.iter().enumerate() {
            cache.set(key.clone(), i);
            expected.insert(key.clone(), i);
        }

        let victim = &keys[0];
        cache.invalidate(victim);
        expected.remove(victim);

        prop_assert_eq!(cache.get(victim), None);
        for (key, value) in &expected {
            prop_assert_eq!(cache.get(key), Some(*value));
        }
    }
}

#[tokio::test(start_paused = true)]
async fn expired_entries_report_a_miss() {
    let cache = TtlCache::new(Duration::from_millis(20));
    cache.set("inventory", vec!["web-01".to_string()]);
    assert_eq!(cache.get(&"inventory"), Some(vec!["web-01".to_string()]));

    tokio::time::advance(Duration::from_millis(25)).await;
    assert_eq!(cache.get(&"inventory"), None);
}
