//! Bounded log of recently fetched jokes.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A joke kept by [`RecentJokes`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredJoke {
    pub id: u64,
    pub joke: String,
    pub create_date: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: u64,
    // Newest first.
    jokes: VecDeque<StoredJoke>,
}

/// Deduplicated, newest-first joke log with a fixed capacity.
#[derive(Debug)]
pub struct RecentJokes {
    limit: usize,
    inner: Mutex<Inner>,
}

impl RecentJokes {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Record `joke` unless it is already held, evicting the oldest past the limit.
    ///
    /// Returns `true` when the joke was new.
    pub fn record(&self, joke: &str) -> bool {
        let mut inner = self.lock();
        if inner.jokes.iter().any(|j| j.joke == joke) {
            return false;
        }

        inner.next_id += 1;
        let stored = StoredJoke {
            id: inner.next_id,
            joke: joke.to_string(),
            create_date: Utc::now(),
        };
        inner.jokes.push_front(stored);
        inner.jokes.truncate(self.limit);
        true
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Held jokes, newest first.
    pub fn latest(&self) -> Vec<StoredJoke> {
        let inner = self.lock();
        inner.jokes.iter().cloned().collect()
    }
}
