use crate::error::AppError;
use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    expires_at: Instant,
    value: V,
}

/// Process-lifetime response cache with in-flight request coalescing.
///
/// Lock order is `inflight` then `entries`; `register` and `resolve` both
/// hold `inflight` while touching `entries`, so a key is never fetched twice
/// between a leader storing its value and a late caller registering.
#[derive(Debug)]
pub struct ResponseCache<V> {
    entries: Mutex<HashMap<String, CacheEntry<V>>>,
    inflight: Mutex<HashMap<String, Arc<InFlight<V>>>>,
}

/// Shared slot filled once by the leader and read by every follower.
#[derive(Debug)]
pub struct InFlight<V> {
    slot: Mutex<Option<Result<V, AppError>>>,
    ready: Condvar,
}

impl<V: Clone> InFlight<V> {
    fn new() -> Self {
        InFlight {
            slot: Mutex::new(None),
            ready: Condvar::new(),
        }
    }

    /// Blocks until the leader resolves the request.
    pub fn wait(&self) -> Result<V, AppError> {
        let mut slot = lock(&self.slot);
        loop {
            if let Some(result) = slot.as_ref() {
                return result.clone();
            }
            slot = self.ready.wait(slot).unwrap_or_else(|e| e.into_inner());
        }
    }

    fn complete(&self, result: Result<V, AppError>) {
        *lock(&self.slot) = Some(result);
        self.ready.notify_all();
    }
}

pub enum Registration<'a, V: Clone> {
    /// A fresh value was already cached.
    Cached(V),
    /// Caller owns the upstream request and must resolve it.
    Leader(Leader<'a, V>),
    /// Another caller owns the request; wait on its result.
    Follower(Arc<InFlight<V>>),
}

pub struct Leader<'a, V: Clone> {
    cache: &'a ResponseCache<V>,
    key: String,
    slot: Arc<InFlight<V>>,
    resolved: bool,
}

impl<'a, V: Clone> Leader<'a, V> {
    /// Publishes the outcome to all followers. Successful values are cached
    /// for `ttl` (nothing is cached when `ttl` is zero); errors never are.
    pub fn resolve(mut self, result: Result<V, AppError>, ttl: Duration) -> Result<V, AppError> {
        self.resolved = true;
        self.cache.finish(&self.key, &self.slot, result.clone(), ttl);
        result
    }
}

impl<'a, V: Clone> Drop for Leader<'a, V> {
    fn drop(&mut self) {
        if !self.resolved {
            let abandoned = Err(AppError::HttpError(format!("request for {} was abandoned", self.key)));
            self.cache.finish(&self.key, &self.slot, abandoned, Duration::ZERO);
        }
    }
}

impl<V: Clone> Default for ResponseCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone> ResponseCache<V> {
    pub fn new() -> Self {
        ResponseCache {
            entries: Mutex::new(HashMap::new()),
            inflight: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &str) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    /// Returns the value if it has not expired at `now`; stale entries are
    /// evicted on the way out.
    pub fn get_at(&self, key: &str, now: Instant) -> Option<V> {
        lookup(&mut lock(&self.entries), key, now)
    }

    pub fn put(&self, key: &str, value: V, ttl: Duration) {
        self.put_at(key, value, ttl, Instant::now());
    }

    pub fn put_at(&self, key: &str, value: V, ttl: Duration, now: Instant) {
        lock(&self.entries).insert(
            key.to_string(),
            CacheEntry {
                expires_at: now + ttl,
                value,
            },
        );
    }

    pub fn register(&self, key: &str) -> Registration<'_, V> {
        let mut inflight = lock(&self.inflight);
        if let Some(hit) = lookup(&mut lock(&self.entries), key, Instant::now()) {
            return Registration::Cached(hit);
        }
        if let Some(existing) = inflight.get(key) {
            return Registration::Follower(Arc::clone(existing));
        }
        let slot = Arc::new(InFlight::new());
        inflight.insert(key.to_string(), Arc::clone(&slot));
        Registration::Leader(Leader {
            cache: self,
            key: key.to_string(),
            slot,
            resolved: false,
        })
    }

    /// Cache-or-coalesce wrapper: concurrent callers with the same key run
    /// `fetch` once and share its outcome.
    pub fn get_or_fetch<F>(&self, key: &str, ttl: Duration, fetch: F) -> Result<V, AppError>
    where
        F: FnOnce() -> Result<V, AppError>,
    {
        match self.register(key) {
            Registration::Cached(value) => Ok(value),
            Registration::Follower(inflight) => {
                tracing::debug!(key, "joining in-flight request");
                inflight.wait()
            }
            Registration::Leader(leader) => {
                let result = fetch();
                leader.resolve(result, ttl)
            }
        }
    }

    pub fn inflight_len(&self) -> usize {
        lock(&self.inflight).len()
    }

    fn finish(&self, key: &str, slot: &Arc<InFlight<V>>, result: Result<V, AppError>, ttl: Duration) {
        {
            let mut inflight = lock(&self.inflight);
            if let Ok(value) = &result {
                if !ttl.is_zero() {
                    self.put(key, value.clone(), ttl);
                }
            }
            if inflight.get(key).is_some_and(|current| Arc::ptr_eq(current, slot)) {
                inflight.remove(key);
            }
        }
        slot.complete(result);
    }
}

fn lookup<V: Clone>(entries: &mut HashMap<String, CacheEntry<V>>, key: &str, now: Instant) -> Option<V> {
    match entries.get(key) {
        Some(entry) if now > entry.expires_at => {
            entries.remove(key);
            None
        }
        Some(entry) => Some(entry.value.clone()),
        None => None,
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
