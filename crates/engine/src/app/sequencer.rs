//! Deterministic timers. Nothing here reads a wall clock: callers advance
//! time explicitly, which keeps scene pacing reproducible in tests.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

/// Identifies what a timer means to the scene that scheduled it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerTag {
    pub name: &'static str,
    pub index: usize,
}

impl TimerTag {
    pub const fn new(name: &'static str) -> Self {
        Self { name, index: 0 }
    }

    pub const fn indexed(name: &'static str, index: usize) -> Self {
        Self { name, index }
    }
}

/// Ordered `(delay, tag)` steps; each delay counts from the previous step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sequence {
    steps: Vec<(u64, TimerTag)>,
}

impl Sequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, delay_ms: u64, tag: TimerTag) -> Self {
        self.steps.push((delay_ms, tag));
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DueTimer {
    pub id: TimerId,
    pub due_ms: u64,
    pub epoch: u64,
    pub tag: TimerTag,
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    timer: DueTimer,
    order: u64,
}

#[derive(Debug, Default)]
pub struct Scheduler {
    now_ms: u64,
    next_id: u64,
    next_order: u64,
    entries: Vec<Entry>,
}

impl Scheduler {
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn pending(&self) -> usize {
        self.entries.len()
    }

    pub fn pending_for_epoch(&self, epoch: u64) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.timer.epoch == epoch)
            .count()
    }

    pub fn schedule(&mut self, epoch: u64, delay_ms: u64, tag: TimerTag) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        let order = self.next_order;
        self.next_order = self.next_order.saturating_add(1);
        self.entries.push(Entry {
            timer: DueTimer {
                id,
                due_ms: self.now_ms.saturating_add(delay_ms),
                epoch,
                tag,
            },
            order,
        });
        id
    }

    pub fn schedule_sequence(&mut self, epoch: u64, sequence: Sequence) -> Vec<TimerId> {
        let mut offset_ms = 0u64;
        sequence
            .steps
            .into_iter()
            .map(|(delay_ms, tag)| {
                offset_ms = offset_ms.saturating_add(delay_ms);
                self.schedule(epoch, offset_ms, tag)
            })
            .collect()
    }

    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.timer.id != id);
        self.entries.len() != before
    }

    pub fn cancel_epoch(&mut self, epoch: u64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.timer.epoch != epoch);
        before - self.entries.len()
    }

    /// Removes and returns the earliest timer due at or before `now_ms`,
    /// moving the clock to its due time. Ties fire in scheduling order.
    pub fn pop_due(&mut self, now_ms: u64) -> Option<DueTimer> {
        let (index, _) = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.timer.due_ms <= now_ms)
            .min_by_key(|(_, entry)| (entry.timer.due_ms, entry.order))?;
        let entry = self.entries.swap_remove(index);
        self.now_ms = self.now_ms.max(entry.timer.due_ms);
        Some(entry.timer)
    }

    /// Moves the clock forward once nothing else is due. Never goes back.
    pub fn settle_at(&mut self, now_ms: u64) {
        self.now_ms = self.now_ms.max(now_ms);
    }
}
