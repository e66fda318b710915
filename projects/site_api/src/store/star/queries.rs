use tracing::warn;

use crate::identity::CallerId;
use crate::store::{
    star::models::*,
    update, Store, StoreError, Write,
};

/// Current total and membership. Unreadable state degrades to an empty counter.
pub fn read_star_status<S: Store + ?Sized>(store: &S, user: &CallerId) -> StarStatus {
    let total = match store.read(STAR_TOTAL_KEY) {
        Ok(contents) => contents.as_deref().map(parse_total).unwrap_or(0),
        Err(err) => {
            warn!(error = %err, "star total unreadable, reporting 0");
            0
        }
    };
    let starred = match store.read(STAR_USERS_KEY) {
        Ok(contents) => is_member(contents.as_deref(), user),
        Err(err) => {
            warn!(error = %err, "star users unreadable, reporting not starred");
            false
        }
    };
    StarStatus { total, starred }
}

/// Flips membership of `user`, then moves the total in the same direction.
///
/// Each file is locked on its own; no lock spans both.
pub fn toggle_star<S: Store + ?Sized>(store: &S, user: &CallerId) -> Result<StarToggle, StoreError> {
    let action = update(store, STAR_USERS_KEY, |current| {
        let mut users = current.map(parse_users).unwrap_or_default();
        let action = if let Some(index) = users.iter().position(|u| *u == user.as_str()) {
            users.remove(index);
            StarAction::Unstar
        } else {
            users.push(user.as_str());
            StarAction::Star
        };
        (Write::Put(render_users(&users)), action)
    })?;

    let total = update(store, STAR_TOTAL_KEY, |current| {
        let total = current.map(parse_total).unwrap_or(0);
        let next = match action {
            StarAction::Star => total.saturating_add(1),
            StarAction::Unstar => total.saturating_sub(1),
        };
        (Write::Put(next.to_string()), next)
    })?;

    Ok(StarToggle {
        action,
        total,
        starred: action == StarAction::Star,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::identity;
    use crate::store::MemoryStore;

    fn caller(seed: &str) -> CallerId {
        identity("198.51.100.10".parse().unwrap(), seed)
    }

    /// Every operation fails as an unreadable disk would.
    struct BrokenStore;

    fn broken(key: &str) -> StoreError {
        StoreError::Io {
            key: key.to_string(),
            source: std::io::Error::other("disk unreadable"),
        }
    }

    impl Store for BrokenStore {
        fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
            Err(broken(key))
        }

        fn with_lock(
            &self,
            key: &str,
            _mutate: &mut dyn FnMut(Option<&str>) -> Write,
        ) -> Result<(), StoreError> {
            Err(broken(key))
        }

        fn keys(&self) -> Result<Vec<String>, StoreError> {
            Err(broken("."))
        }
    }

    #[test]
    fn storage_errors_read_as_empty_counter() {
        assert_eq!(
            read_star_status(&BrokenStore, &caller("ua")),
            StarStatus { total: 0, starred: false }
        );
    }

    #[test]
    fn storage_errors_fail_toggle() {
        assert!(matches!(
            toggle_star(&BrokenStore, &caller("ua")),
            Err(StoreError::Io { .. })
        ));
    }

    #[test]
    fn fresh_store_reports_zero() {
        let store = MemoryStore::default();
        assert_eq!(
            read_star_status(&store, &caller("ua")),
            StarStatus { total: 0, starred: false }
        );
    }

    #[test]
    fn toggling_twice_restores_original_state() {
        let store = MemoryStore::default();
        let user = caller("ua");
        let before = read_star_status(&store, &user);

        let first = toggle_star(&store, &user).unwrap();
        assert_eq!(first.action, StarAction::Star);
        assert_eq!(first.total, 1);
        assert!(first.starred);

        let second = toggle_star(&store, &user).unwrap();
        assert_eq!(second.action, StarAction::Unstar);
        assert!(!second.starred);

        assert_eq!(read_star_status(&store, &user), before);
    }

    #[test]
    fn total_tracks_distinct_members() {
        let store = MemoryStore::default();
        for seed in ["a", "b", "c"] {
            toggle_star(&store, &caller(seed)).unwrap();
        }
        toggle_star(&store, &caller("b")).unwrap();

        assert_eq!(read_star_status(&store, &caller("a")).total, 2);
        assert!(!read_star_status(&store, &caller("b")).starred);
        let users = store.read(STAR_USERS_KEY).unwrap().unwrap();
        assert_eq!(parse_users(&users).len(), 2);
    }

    #[test]
    fn unstar_never_drives_total_negative() {
        let store = MemoryStore::default();
        let user = caller("ua");
        store
            .with_lock(STAR_USERS_KEY, &mut |_| Write::Put(format!("{user}\n")))
            .unwrap();
        store
            .with_lock(STAR_TOTAL_KEY, &mut |_| Write::Put("0".to_string()))
            .unwrap();

        let toggle = toggle_star(&store, &user).unwrap();

        assert_eq!(toggle.action, StarAction::Unstar);
        assert_eq!(toggle.total, 0);
        assert!(!toggle.starred);
    }

    #[test]
    fn duplicate_lines_are_collapsed_on_rewrite() {
        let store = MemoryStore::default();
        let user = caller("ua");
        let other = caller("other");
        store
            .with_lock(STAR_USERS_KEY, &mut |_| Write::Put(format!("{other}\n{other}\n\n")))
            .unwrap();

        toggle_star(&store, &user).unwrap();

        let users = store.read(STAR_USERS_KEY).unwrap().unwrap();
        assert_eq!(users, format!("{other}\n{user}\n"));
    }
}
