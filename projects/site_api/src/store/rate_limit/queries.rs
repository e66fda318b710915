use tracing::debug;

use crate::store::{
    rate_limit::models::{parse_timestamp, RateDecision, RateLimitKey},
    update, Store, StoreError, Write,
};

/// Checks the cooldown for `key` and, when allowed, records `now` in the same
/// locked cycle.
pub fn check_and_record<S: Store + ?Sized>(
    store: &S,
    key: &RateLimitKey,
    now: i64,
    cooldown_secs: u64,
) -> Result<RateDecision, StoreError> {
    let cooldown = cooldown_as_i64(cooldown_secs);
    update(store, key.as_str(), |current| {
        let age = current.and_then(parse_timestamp).map(|last| now.saturating_sub(last));

        match age {
            Some(age) if age < cooldown => {
                let remaining_secs = cooldown.saturating_sub(age.max(0)) as u64;
                (Write::Keep, RateDecision::Limited { remaining_secs })
            }
            _ => (Write::Put(now.to_string()), RateDecision::Allowed),
        }
    })
}

/// Deletes cooldown records that can no longer limit anyone.
pub fn sweep_expired<S: Store + ?Sized>(
    store: &S,
    now: i64,
    cooldown_secs: u64,
) -> Result<usize, StoreError> {
    let cooldown = cooldown_as_i64(cooldown_secs);
    let mut removed = 0;

    for key in store.keys()? {
        if !RateLimitKey::matches(&key) {
            continue;
        }
        let deleted = update(store, &key, |current| {
            let expired = match current.and_then(parse_timestamp) {
                Some(last) => now.saturating_sub(last) >= cooldown,
                None => true,
            };
            if expired {
                (Write::Delete, true)
            } else {
                (Write::Keep, false)
            }
        })?;
        if deleted {
            debug!(%key, "removed expired rate-limit record");
            removed += 1;
        }
    }

    Ok(removed)
}

// Cooldowns past i64::MAX seconds are treated as unbounded.
fn cooldown_as_i64(cooldown_secs: u64) -> i64 {
    i64::try_from(cooldown_secs).unwrap_or(i64::MAX)
}
