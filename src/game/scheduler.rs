//! Timed Task Scheduler
//!
//! A virtual-time timer queue for one-shot and recurring tasks.
//!
//! The scheduler never sleeps. Time moves only when the owner pops due
//! tasks up to some instant, which keeps the game deterministic and lets
//! tests run a full session without waiting. The `runtime` driver maps
//! virtual milliseconds onto a tokio clock.
//!
//! Due tasks come out one at a time, ordered by (due time, schedule order),
//! so handling one task may cancel another that is due at the same instant.

use std::collections::BTreeMap;

use serde::{Serialize, Deserialize};

/// Handle to a scheduled task, used for cancellation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TaskId(u64);

/// Queue key: due time, then insertion sequence.
type QueueKey = (u64, u64);

#[derive(Clone, Debug)]
struct Entry<T> {
    id: TaskId,
    payload: T,
    period_ms: Option<u64>,
}

/// A task popped from the queue.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fired<T> {
    /// Task handle
    pub id: TaskId,
    /// Virtual time the task was due at
    pub due_ms: u64,
    /// Task payload
    pub payload: T,
}

/// Virtual-time timer queue.
#[derive(Clone, Debug)]
pub struct Scheduler<T> {
    now_ms: u64,
    next_id: u64,
    next_seq: u64,
    queue: BTreeMap<QueueKey, Entry<T>>,
    keys: BTreeMap<TaskId, QueueKey>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self {
            now_ms: 0,
            next_id: 0,
            next_seq: 0,
            queue: BTreeMap::new(),
            keys: BTreeMap::new(),
        }
    }
}

impl<T: Clone> Scheduler<T> {
    /// Create an empty scheduler at virtual time 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time in milliseconds.
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Run `payload` once, `delay_ms` from now.
    pub fn schedule_once(&mut self, delay_ms: u64, payload: T) -> TaskId {
        let id = self.allocate_id();
        self.insert(self.now_ms.saturating_add(delay_ms), Entry { id, payload, period_ms: None });
        id
    }

    /// Run `payload` every `period_ms`, first at now + period.
    ///
    /// A zero period is treated as 1ms so the queue can always drain.
    pub fn schedule_repeating(&mut self, period_ms: u64, payload: T) -> TaskId {
        let period_ms = period_ms.max(1);
        let id = self.allocate_id();
        self.insert(
            self.now_ms.saturating_add(period_ms),
            Entry { id, payload, period_ms: Some(period_ms) },
        );
        id
    }

    /// Cancel a pending task. Returns false if it already ran or was cancelled.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        match self.keys.remove(&id) {
            Some(key) => {
                self.queue.remove(&key);
                true
            }
            None => false,
        }
    }

    /// Whether `id` is still waiting to run.
    pub fn is_pending(&self, id: TaskId) -> bool {
        self.keys.contains_key(&id)
    }

    /// Due time of the earliest pending task.
    pub fn next_deadline_ms(&self) -> Option<u64> {
        self.queue.keys().next().map(|(due, _)| *due)
    }

    /// Pop the earliest task due at or before `until_ms`.
    ///
    /// Moves the clock to the task's due time. Recurring tasks are re-armed
    /// before they are returned, so the caller can still cancel them.
    pub fn pop_due(&mut self, until_ms: u64) -> Option<Fired<T>> {
        let (&key, _) = self.queue.iter().next()?;
        let (due_ms, _) = key;
        if due_ms > until_ms {
            return None;
        }

        let entry = self.queue.remove(&key)?;
        self.keys.remove(&entry.id);
        self.now_ms = self.now_ms.max(due_ms);

        if let Some(period_ms) = entry.period_ms {
            self.insert(due_ms.saturating_add(period_ms), entry.clone());
        }

        Some(Fired {
            id: entry.id,
            due_ms,
            payload: entry.payload,
        })
    }

    /// Move the clock forward to `to_ms` without running anything.
    ///
    /// Callers drain [`Scheduler::pop_due`] first; the clock never moves back.
    pub fn advance_clock(&mut self, to_ms: u64) {
        self.now_ms = self.now_ms.max(to_ms);
    }

    fn allocate_id(&mut self) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        id
    }

    fn insert(&mut self, due_ms: u64, entry: Entry<T>) {
        let key = (due_ms, self.next_seq);
        self.next_seq += 1;
        self.keys.insert(entry.id, key);
        self.queue.insert(key, entry);
    }
}

// =============================================================================
// TIMER SLOT
// =============================================================================

/// Holds at most one scheduled task.
///
/// Arming always cancels whatever the slot held before, so repeated
/// start/stop cycles can never stack two clocks.
#[derive(Clone, Copy, Debug, Default)]
pub struct TimerSlot(Option<TaskId>);

impl TimerSlot {
    /// Empty slot.
    pub const fn new() -> Self {
        Self(None)
    }

    /// Replace the slot's task with a one-shot.
    pub fn arm_once<T: Clone>(&mut self, scheduler: &mut Scheduler<T>, delay_ms: u64, payload: T) -> TaskId {
        self.disarm(scheduler);
        let id = scheduler.schedule_once(delay_ms, payload);
        self.0 = Some(id);
        id
    }

    /// Replace the slot's task with a recurring one.
    pub fn arm_repeating<T: Clone>(&mut self, scheduler: &mut Scheduler<T>, period_ms: u64, payload: T) -> TaskId {
        self.disarm(scheduler);
        let id = scheduler.schedule_repeating(period_ms, payload);
        self.0 = Some(id);
        id
    }

    /// Cancel the held task, if any. Returns true if something was pending.
    pub fn disarm<T: Clone>(&mut self, scheduler: &mut Scheduler<T>) -> bool {
        self.0.take().is_some_and(|id| scheduler.cancel(id))
    }

    /// Whether the held task is still pending.
    pub fn is_armed<T: Clone>(&self, scheduler: &Scheduler<T>) -> bool {
        self.0.is_some_and(|id| scheduler.is_pending(id))
    }
}
