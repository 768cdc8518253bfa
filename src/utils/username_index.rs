use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use autoscale_cuckoo_filter::CuckooFilter;
use moka::future::Cache;

use crate::{error::StoreError, store::UserStore};

/// Expected capacity and false-positive rate.
/// Tune these based on real user counts.
const FILTER_CAPACITY: usize = 100_000;
const FALSE_POSITIVE_RATE: f64 = 0.001;

const CACHE_CAPACITY: u64 = 500_000;
const CACHE_TTL: Duration = Duration::from_secs(86400);

/// Fast answers to "is this username free?" ahead of the user store.
///
/// The cuckoo filter gives a definite "never seen" (no false negatives), the moka cache a
/// definite "taken". Anything else falls through to the store. Usernames are compared
/// exactly, so "Alice" and "alice" are distinct.
pub struct UsernameIndex {
    filter: RwLock<CuckooFilter<str>>,
    taken: Cache<String, ()>,
}

impl Default for UsernameIndex {
    fn default() -> Self {
        Self {
            filter: RwLock::new(CuckooFilter::<str>::new(FILTER_CAPACITY, FALSE_POSITIVE_RATE)),
            taken: Cache::builder()
                .max_capacity(CACHE_CAPACITY)
                .time_to_live(CACHE_TTL)
                .build(),
        }
    }
}

impl UsernameIndex {
    /// false positives possible, false negatives not
    pub fn might_exist(&self, username: &str) -> bool {
        self.filter
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(username)
    }

    pub async fn mark_taken(&self, username: &str) {
        self.filter
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .add(username);
        self.taken.insert(username.to_string(), ()).await;
    }

    /// true  => username AVAILABLE
    /// false => username TAKEN
    ///
    /// This is only the pre-check; the store still rejects a duplicate at write time.
    pub async fn is_available(
        &self,
        username: &str,
        users: &dyn UserStore,
    ) -> Result<bool, StoreError> {
        if !self.might_exist(username) {
            return Ok(true);
        }

        if self.taken.contains_key(username) {
            return Ok(false);
        }

        match users.find_by_username(username).await? {
            Some(_) => {
                self.taken.insert(username.to_string(), ()).await;
                Ok(false)
            }
            None => Ok(true),
        }
    }

    /// Loads every existing username into the filter, in batches so the write lock is
    /// released between them.
    pub async fn warmup(&self, users: &dyn UserStore, batch_size: usize) -> Result<usize, StoreError> {
        let usernames = users.usernames().await?;

        for batch in usernames.chunks(batch_size.max(1)) {
            let mut filter = self.filter.write().unwrap_or_else(PoisonError::into_inner);
            for username in batch {
                filter.add(username.as_str());
            }
        }

        tracing::info!(users = usernames.len(), "Username index warmup complete");
        Ok(usernames.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{model::user::NewUser, store::memory::MemoryUserStore};

    fn new_user(username: &str) -> NewUser {
        NewUser {
            username: username.into(),
            password_hash: "x".into(),
            role: "USER".into(),
        }
    }

    #[tokio::test]
    async fn unseen_username_is_available() {
        let index = UsernameIndex::default();
        let users = MemoryUserStore::default();

        assert!(!index.might_exist("alice"));
        assert!(index.is_available("alice", &users).await.unwrap());
    }

    #[tokio::test]
    async fn marked_username_is_taken_and_case_sensitive() {
        let index = UsernameIndex::default();
        let users = MemoryUserStore::default();
        index.mark_taken("alice").await;

        assert!(!index.is_available("alice", &users).await.unwrap());
        assert!(index.is_available("Alice", &users).await.unwrap());
    }

    #[tokio::test]
    async fn warmup_loads_existing_users() {
        let users = MemoryUserStore::default();
        users.create(new_user("alice")).await.unwrap();
        users.create(new_user("bob")).await.unwrap();

        let index = UsernameIndex::default();
        assert_eq!(index.warmup(&users, 1).await.unwrap(), 2);

        assert!(index.might_exist("bob"));
        // filter hit with a cache miss falls back to the store
        assert!(!index.is_available("bob", &users).await.unwrap());
    }
}
