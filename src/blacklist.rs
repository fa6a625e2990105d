//! Per-device fault tracking.
//!
//! A polling loop counts failed exchanges per slave id; once a device passes
//! the configured limit it reports as blocked and the loop can stop wasting
//! bus time on it. A background ticker periodically zeroes all counters so
//! quarantined devices get another chance, firing the `on_clean` callback
//! first; `on_device_blocked` fires exactly once per quarantine, on the
//! increment that crosses the limit.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::sleep;

use crate::protocol::SlaveId;

/// Fired once per reset tick, before the counters are zeroed.
pub type CleanCallback = Arc<dyn Fn() + Send + Sync>;
/// Fired when a device's fault count crosses the limit.
pub type BlockCallback = Arc<dyn Fn(SlaveId) + Send + Sync>;

struct Shared {
    limit: u16,
    interval: Duration,
    list: HashMap<SlaveId, u32>,
    on_clean: Option<CleanCallback>,
    on_device_blocked: Option<BlockCallback>,
}

/// Fault counter with a periodic reset ticker.
///
/// Must be created inside a Tokio runtime; the ticker task exits on its own
/// once the blacklist is dropped.
pub struct Blacklist {
    shared: Arc<Mutex<Shared>>,
    rearm: Arc<Notify>,
}

impl Blacklist {
    /// `limit` faults quarantine a device; counters reset every
    /// `timeout_min` minutes (zero selects the default of 60).
    pub fn new(limit: u16, timeout_min: u64) -> Self {
        let timeout_min = if timeout_min == 0 { 60 } else { timeout_min };
        let shared = Arc::new(Mutex::new(Shared {
            limit,
            interval: Duration::from_secs(timeout_min * 60),
            list: HashMap::new(),
            on_clean: None,
            on_device_blocked: None,
        }));
        let rearm = Arc::new(Notify::new());
        spawn_ticker(Arc::downgrade(&shared), Arc::clone(&rearm));
        Self { shared, rearm }
    }

    pub fn set_limit(&self, limit: u16) {
        if let Ok(mut shared) = self.shared.lock() {
            shared.limit = limit;
        }
    }

    pub fn set_on_clean(&self, callback: CleanCallback) {
        if let Ok(mut shared) = self.shared.lock() {
            shared.on_clean = Some(callback);
        }
    }

    pub fn set_on_device_blocked(&self, callback: BlockCallback) {
        if let Ok(mut shared) = self.shared.lock() {
            shared.on_device_blocked = Some(callback);
        }
    }

    /// Count one more fault against `id` and report whether the device is
    /// quarantined. `on_device_blocked` fires on the call that crosses the
    /// limit and on no other.
    pub fn get(&self, id: SlaveId) -> (bool, u32) {
        let (blocked, count, callback) = {
            let mut shared = match self.shared.lock() {
                Ok(shared) => shared,
                Err(_) => return (false, 0),
            };
            if shared.limit == 0 {
                return (false, 0);
            }
            let limit = u32::from(shared.limit);
            let entry = shared.list.entry(id).or_insert(0);
            let fire = *entry == limit;
            *entry += 1;
            let count = *entry;
            let callback = if fire { shared.on_device_blocked.clone() } else { None };
            (count > limit, count, callback)
        };
        if let Some(callback) = callback {
            callback(id);
        }
        (blocked, count)
    }

    /// Count a fault without asking for the verdict.
    pub fn plus(&self, id: SlaveId) {
        if let Ok(mut shared) = self.shared.lock() {
            if shared.limit > 0 {
                *shared.list.entry(id).or_insert(0) += 1;
            }
        }
    }

    /// Zero the counter of one device.
    pub fn nullify(&self, id: SlaveId) {
        if let Ok(mut shared) = self.shared.lock() {
            shared.list.insert(id, 0);
        }
    }

    /// Zero every counter (keys are kept), firing `on_clean` first.
    pub fn clean(&self) {
        tick_clean(&self.shared);
    }

    /// Re-arm the reset ticker with the currently configured interval.
    pub fn reset_timeout_clean(&self) {
        self.rearm.notify_one();
    }

    /// Current fault count of a device, without incrementing it.
    pub fn count(&self, id: SlaveId) -> u32 {
        self.shared
            .lock()
            .map(|shared| shared.list.get(&id).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Number of devices ever counted against.
    pub fn len(&self) -> usize {
        self.shared.lock().map(|shared| shared.list.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn spawn_ticker(shared: Weak<Mutex<Shared>>, rearm: Arc<Notify>) {
    tokio::spawn(async move {
        loop {
            let interval = match shared.upgrade().and_then(|s| s.lock().ok().map(|s| s.interval)) {
                Some(interval) => interval,
                None => return,
            };
            tokio::select! {
                _ = sleep(interval) => {
                    let Some(strong) = shared.upgrade() else { return };
                    tick_clean(&strong);
                }
                // reset_timeout_clean was called; restart the wait with the
                // current interval.
                _ = rearm.notified() => {}
            }
        }
    });
}

fn tick_clean(shared: &Arc<Mutex<Shared>>) {
    let callback = shared.lock().ok().and_then(|s| s.on_clean.clone());
    if let Some(callback) = callback {
        callback();
    }
    if let Ok(mut shared) = shared.lock() {
        for count in shared.list.values_mut() {
            *count = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_get_transitions_and_block_callback() {
        let blacklist = Blacklist::new(3, 60);
        let fired = Arc::new(AtomicUsize::new(0));
        let fired_for = Arc::new(AtomicU8::new(0));
        {
            let fired = Arc::clone(&fired);
            let fired_for = Arc::clone(&fired_for);
            blacklist.set_on_device_blocked(Arc::new(move |id| {
                fired.fetch_add(1, Ordering::SeqCst);
                fired_for.store(id, Ordering::SeqCst);
            }));
        }

        assert_eq!(blacklist.get(0x05), (false, 1));
        assert_eq!(blacklist.get(0x05), (false, 2));
        assert_eq!(blacklist.get(0x05), (false, 3));
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        // The increment that crosses the limit quarantines the device and
        // fires the callback exactly once.
        assert_eq!(blacklist.get(0x05), (true, 4));
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(fired_for.load(Ordering::SeqCst), 0x05);

        assert_eq!(blacklist.get(0x05), (true, 5));
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_clean_zeroes_but_keeps_keys() {
        let blacklist = Blacklist::new(3, 60);
        let cleans = Arc::new(AtomicUsize::new(0));
        {
            let cleans = Arc::clone(&cleans);
            blacklist.set_on_clean(Arc::new(move || {
                cleans.fetch_add(1, Ordering::SeqCst);
            }));
        }

        blacklist.plus(0x05);
        blacklist.plus(0x05);
        blacklist.plus(0x06);
        assert_eq!(blacklist.count(0x05), 2);
        assert_eq!(blacklist.len(), 2);

        blacklist.clean();
        assert_eq!(cleans.load(Ordering::SeqCst), 1);
        assert_eq!(blacklist.count(0x05), 0);
        assert_eq!(blacklist.count(0x06), 0);
        assert_eq!(blacklist.len(), 2);

        // Counting restarts from scratch after a clean.
        assert_eq!(blacklist.get(0x05), (false, 1));
    }

    #[tokio::test]
    async fn test_nullify_resets_one_device_only() {
        let blacklist = Blacklist::new(2, 60);
        blacklist.plus(0x01);
        blacklist.plus(0x01);
        blacklist.plus(0x02);

        blacklist.nullify(0x01);
        assert_eq!(blacklist.count(0x01), 0);
        assert_eq!(blacklist.count(0x02), 1);
    }

    #[tokio::test]
    async fn test_zero_limit_disables_counting() {
        let blacklist = Blacklist::new(0, 60);
        blacklist.plus(0x01);
        assert_eq!(blacklist.get(0x01), (false, 0));
        assert!(blacklist.is_empty());

        blacklist.set_limit(1);
        assert_eq!(blacklist.get(0x01), (false, 1));
        assert_eq!(blacklist.get(0x01), (true, 2));
    }

    #[tokio::test]
    async fn test_reset_timeout_clean_rearms_ticker() {
        let blacklist = Blacklist::new(3, 60);
        blacklist.plus(0x01);
        blacklist.reset_timeout_clean();
        // The tick is an hour out; the call just must not disturb state.
        assert_eq!(blacklist.count(0x01), 1);
    }
}
