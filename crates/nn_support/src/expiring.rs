// nn_support/expiring - Expiring cache with sliding lifetimes
use std::hash::Hash;
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use thiserror::Error;
use tracing::trace;

const ACQUIRE_TIMEOUT: Duration = Duration::from_millis(1000);
const TOUCH_TIMEOUT: Duration = Duration::from_millis(500);

/// Raised when the cache mutex could not be acquired within the operation's
/// timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("timed out acquiring cache mutex")]
pub struct CacheTimeout;

#[derive(Debug, Clone, Copy)]
struct Slider {
    deadline: Instant,
    period: Duration,
}

#[derive(Debug)]
struct Maps<K, V> {
    values: FxHashMap<K, V>,
    sliders: FxHashMap<K, Slider>,
}

impl<K, V> Default for Maps<K, V> {
    fn default() -> Self {
        Self {
            values: FxHashMap::default(),
            sliders: FxHashMap::default(),
        }
    }
}

/// TTL map with sliding expiration and a background purge tick.
///
/// One mutex guards both the value map and the slider-metadata map. Most
/// operations try to acquire it for up to one second; the sliding-expiry
/// touch uses a shorter 500 ms budget and is skipped on contention. The purge
/// thread fires every `interval`, removes entries whose slider deadline has
/// passed, and skips the tick entirely when the mutex is contended.
#[derive(Debug)]
pub struct ExpiringCache<K, V> {
    inner: Arc<Mutex<Maps<K, V>>>,
    purge: Option<JoinHandle<()>>,
}

impl<K, V> ExpiringCache<K, V>
where
    K: Eq + Hash + Clone + Send + 'static,
    V: Clone + Send + 'static,
{
    pub fn new(interval: Duration) -> Self {
        let inner = Arc::new(Mutex::new(Maps::default()));
        let weak: Weak<Mutex<Maps<K, V>>> = Arc::downgrade(&inner);
        let purge = thread::Builder::new()
            .name("nn-cache-purge".into())
            .spawn(move || loop {
                thread::sleep(interval);
                let Some(maps) = weak.upgrade() else {
                    return;
                };
                let Some(mut guard) = maps.try_lock_for(ACQUIRE_TIMEOUT) else {
                    trace!("cache purge tick skipped, mutex contended");
                    continue;
                };
                let now = Instant::now();
                let Maps { values, sliders } = &mut *guard;
                sliders.retain(|key, slider| {
                    if slider.deadline <= now {
                        values.remove(key);
                        false
                    } else {
                        true
                    }
                });
            })
            .ok();

        Self { inner, purge }
    }

    /// Inserts or replaces `value`, giving it a sliding lifetime of
    /// `lifetime` from now.
    pub fn set(&self, key: K, value: V, lifetime: Duration) -> Result<(), CacheTimeout> {
        let mut guard = self.inner.try_lock_for(ACQUIRE_TIMEOUT).ok_or(CacheTimeout)?;
        guard.values.insert(key.clone(), value);
        guard.sliders.insert(
            key,
            Slider {
                deadline: Instant::now() + lifetime,
                period: lifetime,
            },
        );
        Ok(())
    }

    /// Reads a value and, on a hit, slides its expiry forward. The touch uses
    /// its own short lock budget; losing that race leaves the deadline
    /// unchanged but still returns the value.
    pub fn get(&self, key: &K) -> Result<Option<V>, CacheTimeout> {
        let value = {
            let guard = self.inner.try_lock_for(ACQUIRE_TIMEOUT).ok_or(CacheTimeout)?;
            guard.values.get(key).cloned()
        };

        if value.is_some() {
            if let Some(mut guard) = self.inner.try_lock_for(TOUCH_TIMEOUT) {
                if let Some(slider) = guard.sliders.get_mut(key) {
                    slider.deadline = Instant::now() + slider.period;
                }
            }
        }

        Ok(value)
    }

    pub fn remove(&self, key: &K) -> Result<Option<V>, CacheTimeout> {
        let mut guard = self.inner.try_lock_for(ACQUIRE_TIMEOUT).ok_or(CacheTimeout)?;
        guard.sliders.remove(key);
        Ok(guard.values.remove(key))
    }

    pub fn len(&self) -> Result<usize, CacheTimeout> {
        let guard = self.inner.try_lock_for(ACQUIRE_TIMEOUT).ok_or(CacheTimeout)?;
        Ok(guard.values.len())
    }

    pub fn is_empty(&self) -> Result<bool, CacheTimeout> {
        Ok(self.len()? == 0)
    }
}

impl<K, V> Drop for ExpiringCache<K, V> {
    fn drop(&mut self) {
        // The purge thread holds only a Weak handle and exits on its next
        // tick once the maps are gone.
        self.purge.take();
    }
}
