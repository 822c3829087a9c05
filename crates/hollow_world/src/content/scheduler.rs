//! Tick-based task scheduler.
//!
//! Jobs are opaque payloads; the runtime decides what each one means when it
//! comes due. Handles are monotonically increasing task ids, so cancelling a
//! stale handle is always safe. Determinism: due tasks fire in handle order.

use std::collections::BTreeMap;

use super::types::{TaskId, Tick};

#[derive(Debug, Clone)]
struct ScheduledTask<T> {
    due: Tick,
    every: Option<u64>,
    job: T,
}

#[derive(Debug, Clone)]
pub struct TickScheduler<T: Clone> {
    now: Tick,
    next_task_id: TaskId,
    tasks: BTreeMap<TaskId, ScheduledTask<T>>,
}

impl<T: Clone> TickScheduler<T> {
    pub fn new() -> Self {
        Self {
            now: 0,
            next_task_id: 1,
            tasks: BTreeMap::new(),
        }
    }

    pub fn now(&self) -> Tick {
        self.now
    }

    /// Schedule `job` to fire once, `delay` ticks from now. A zero delay
    /// still lands on the next tick: tasks never fire within the tick that
    /// scheduled them.
    pub fn run_after(&mut self, delay: u64, job: T) -> TaskId {
        self.insert(self.now + delay.max(1), None, job)
    }

    /// Schedule `job` to fire every `interval` ticks, first firing one
    /// interval from now.
    pub fn run_every(&mut self, interval: u64, job: T) -> TaskId {
        let interval = interval.max(1);
        self.insert(self.now + interval, Some(interval), job)
    }

    fn insert(&mut self, due: Tick, every: Option<u64>, job: T) -> TaskId {
        let id = self.next_task_id;
        self.next_task_id += 1;
        self.tasks.insert(id, ScheduledTask { due, every, job });
        id
    }

    /// Cancel a pending task. Returns false if the handle is unknown or the
    /// task already completed.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        self.tasks.remove(&id).is_some()
    }

    pub fn is_scheduled(&self, id: TaskId) -> bool {
        self.tasks.contains_key(&id)
    }

    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    /// Advance the clock by one tick and return the jobs that came due,
    /// paired with their handles. Periodic tasks are re-armed; one-shots are
    /// removed.
    pub fn advance(&mut self) -> Vec<(TaskId, T)> {
        self.now += 1;
        let due_ids: Vec<TaskId> = self
            .tasks
            .iter()
            .filter(|(_, task)| task.due <= self.now)
            .map(|(id, _)| *id)
            .collect();
        let mut fired = Vec::with_capacity(due_ids.len());
        for id in due_ids {
            if let Some(task) = self.tasks.get_mut(&id) {
                fired.push((id, task.job.clone()));
                match task.every {
                    Some(interval) => task.due = self.now + interval,
                    None => {
                        self.tasks.remove(&id);
                    }
                }
            }
        }
        fired
    }
}

impl<T: Clone> Default for TickScheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}
