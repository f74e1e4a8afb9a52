//! Virtual-time timer queue and clocks.
//!
//! All waiting in the page runtime is expressed as timers on a [`TimerQueue`].
//! The queue never blocks: a host advances it to a deadline and receives the
//! due timers one at a time, in due order, ties broken by scheduling order.
//! Tests advance time by hand; the terminal driver follows a [`SystemClock`].

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Smallest interval a repeating timer may use.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl TimerId {
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

/// A timer that came due.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiredTimer {
    pub id: TimerId,
    pub label: &'static str,
    pub due: Duration,
    pub repeating: bool,
}

#[derive(Debug, Clone)]
struct TimerEntry {
    id: TimerId,
    label: &'static str,
    interval: Option<Duration>,
}

type SlotKey = (Duration, u64);

#[derive(Debug, Default)]
pub struct TimerQueue {
    now: Duration,
    next_id: u64,
    next_seq: u64,
    slots: BTreeMap<SlotKey, TimerEntry>,
    index: HashMap<TimerId, SlotKey>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time, measured from page start.
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn schedule_once(&mut self, delay: Duration, label: &'static str) -> TimerId {
        let id = self.allocate_id();
        self.insert(self.now + delay, TimerEntry { id, label, interval: None });
        id
    }

    /// Fire every `interval`, first after one full interval.
    pub fn schedule_repeating(&mut self, interval: Duration, label: &'static str) -> TimerId {
        let interval = interval.max(MIN_INTERVAL);
        let id = self.allocate_id();
        self.insert(
            self.now + interval,
            TimerEntry {
                id,
                label,
                interval: Some(interval),
            },
        );
        id
    }

    /// Remove a pending timer. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        match self.index.remove(&id) {
            Some(key) => self.slots.remove(&key).is_some(),
            None => false,
        }
    }

    pub fn next_due(&self) -> Option<Duration> {
        self.slots.keys().next().map(|(due, _)| *due)
    }

    /// Pop the earliest timer due at or before `deadline`, moving virtual time
    /// to its due instant. Repeating timers are re-armed before returning.
    pub fn pop_due(&mut self, deadline: Duration) -> Option<FiredTimer> {
        let key = *self.slots.keys().next()?;
        if key.0 > deadline {
            return None;
        }
        let entry = self.slots.remove(&key)?;
        self.index.remove(&entry.id);
        self.now = self.now.max(key.0);

        let fired = FiredTimer {
            id: entry.id,
            label: entry.label,
            due: key.0,
            repeating: entry.interval.is_some(),
        };
        if let Some(interval) = entry.interval {
            self.insert(key.0 + interval, entry);
        }
        Some(fired)
    }

    /// Move virtual time forward without firing anything.
    pub fn settle_at(&mut self, deadline: Duration) {
        self.now = self.now.max(deadline);
    }

    fn allocate_id(&mut self) -> TimerId {
        self.next_id += 1;
        TimerId(self.next_id)
    }

    fn insert(&mut self, due: Duration, entry: TimerEntry) {
        self.next_seq += 1;
        let key = (due, self.next_seq);
        self.index.insert(entry.id, key);
        self.slots.insert(key, entry);
    }
}

/// Source of "now" for hosts that map wall time onto the page timeline.
pub trait Clock: Send {
    fn elapsed(&self) -> Duration;
}

#[derive(Debug, Clone)]
pub struct SystemClock {
    started: Instant,
}

impl SystemClock {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Hand-driven clock. Clones share the same reading.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    elapsed: Arc<Mutex<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut guard) = self.elapsed.lock() {
            *guard += by;
        }
    }
}

impl Clock for ManualClock {
    fn elapsed(&self) -> Duration {
        self.elapsed.lock().map(|guard| *guard).unwrap_or_default()
    }
}
