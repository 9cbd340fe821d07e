//! Cooperative background task driver.
//!
//! Long-running work (a sampling cycle spans a minute of wall-clock time) is
//! written as a state machine that sleeps between steps instead of blocking.
//! The render loop calls [`TaskRunner::step_all`] once per frame; one call
//! advances every due task by a single step and returns immediately, so the
//! frame cadence is preserved no matter what is in flight. Nothing here
//! spawns threads.

use std::time::Instant;

/// What a task wants after one step.
pub enum Step {
    /// Run again once the deadline has passed.
    Sleep(Instant),
    /// Not ready to make progress (waiting on another task's result); poll
    /// again on the next pass.
    Wait,
    /// Finished.
    Done,
    /// Gave up; the runner logs the error and drops the task.
    Failed(Box<dyn std::error::Error>),
}

/// A resumable unit of background work driven by [`TaskRunner`].
///
/// `step` must return quickly. Anything that takes real time is expressed by
/// returning [`Step::Sleep`] and picking up where it left off next time.
pub trait Task {
    fn step(&mut self, now: Instant) -> Step;
}

struct Entry {
    id: u64,
    resume_at: Option<Instant>,
    task: Box<dyn Task>,
}

/// Owns the set of in-progress background tasks, in spawn order.
///
/// The runner itself puts no limit on how many tasks run at once; callers
/// that need "at most one of these" enforce that themselves.
#[derive(Default)]
pub struct TaskRunner {
    tasks: Vec<Entry>,
    next_id: u64,
}

impl TaskRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tasks still in progress.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Adds a task. It takes its first step on the next `step_all` call.
    pub fn spawn(&mut self, task: impl Task + 'static) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.tasks.push(Entry {
            id,
            resume_at: None,
            task: Box::new(task),
        });
        id
    }

    /// Advances every due task by exactly one step.
    ///
    /// Never waits for a deadline that has not elapsed; with no due tasks
    /// (or none at all) this returns immediately.
    pub fn step_all(&mut self, now: Instant) {
        let mut i = 0;
        while i < self.tasks.len() {
            let entry = &mut self.tasks[i];
            if entry.resume_at.is_some_and(|at| now < at) {
                i += 1;
                continue;
            }
            match entry.task.step(now) {
                Step::Sleep(at) => {
                    entry.resume_at = Some(at);
                    i += 1;
                }
                Step::Wait => {
                    entry.resume_at = None;
                    i += 1;
                }
                Step::Done => {
                    self.tasks.remove(i);
                }
                Step::Failed(err) => {
                    log::warn!("background task #{} failed: {err}", entry.id);
                    self.tasks.remove(i);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ValueStore;
    use std::rc::Rc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    struct CountSteps {
        steps: Arc<AtomicUsize>,
        remaining: usize,
        nap: Duration,
    }

    impl Task for CountSteps {
        fn step(&mut self, now: Instant) -> Step {
            self.steps.fetch_add(1, Ordering::Relaxed);
            self.remaining -= 1;
            if self.remaining == 0 {
                Step::Done
            } else {
                Step::Sleep(now + self.nap)
            }
        }
    }

    #[test]
    fn step_all_without_tasks_is_a_noop() {
        let mut runner = TaskRunner::new();
        runner.step_all(Instant::now());
        assert!(runner.is_empty());
    }

    #[test]
    fn spawned_task_runs_on_the_next_pass_only() {
        let steps = Arc::new(AtomicUsize::new(0));
        let mut runner = TaskRunner::new();
        runner.spawn(CountSteps {
            steps: steps.clone(),
            remaining: 2,
            nap: Duration::from_secs(60),
        });
        assert_eq!(steps.load(Ordering::Relaxed), 0);

        let t0 = Instant::now();
        runner.step_all(t0);
        assert_eq!(steps.load(Ordering::Relaxed), 1);
        assert_eq!(runner.len(), 1);

        // Deadline not elapsed: the task must not be resumed.
        runner.step_all(t0 + Duration::from_secs(1));
        assert_eq!(steps.load(Ordering::Relaxed), 1);

        runner.step_all(t0 + Duration::from_secs(61));
        assert_eq!(steps.load(Ordering::Relaxed), 2);
        assert!(runner.is_empty());
    }

    #[test]
    fn each_pass_advances_a_due_task_by_one_step() {
        let steps = Arc::new(AtomicUsize::new(0));
        let mut runner = TaskRunner::new();
        runner.spawn(CountSteps {
            steps: steps.clone(),
            remaining: 3,
            nap: Duration::ZERO,
        });

        // Zero-length naps are due right away, but still cost one pass each.
        for expected in 1..=3 {
            runner.step_all(Instant::now());
            assert_eq!(steps.load(Ordering::Relaxed), expected);
        }
        assert!(runner.is_empty());
    }

    struct Produce(ValueStore<u32>);

    impl Task for Produce {
        fn step(&mut self, _now: Instant) -> Step {
            self.0.set(42);
            Step::Done
        }
    }

    struct Consume {
        source: ValueStore<u32>,
        seen: Rc<std::cell::Cell<Option<u32>>>,
    }

    impl Task for Consume {
        fn step(&mut self, _now: Instant) -> Step {
            match self.source.get() {
                None => Step::Wait,
                Some(value) => {
                    self.seen.set(Some(value));
                    Step::Done
                }
            }
        }
    }

    #[test]
    fn waiting_task_observes_dependency_regardless_of_spawn_order() {
        let slot = ValueStore::default();
        let seen = Rc::new(std::cell::Cell::new(None));
        let mut runner = TaskRunner::new();

        // Consumer first: it must wait a pass, not miss the result.
        runner.spawn(Consume {
            source: slot.clone(),
            seen: seen.clone(),
        });
        runner.spawn(Produce(slot));

        runner.step_all(Instant::now());
        runner.step_all(Instant::now());
        assert_eq!(seen.get(), Some(42));
        assert!(runner.is_empty());
    }

    struct AlwaysFails;

    impl Task for AlwaysFails {
        fn step(&mut self, _now: Instant) -> Step {
            Step::Failed("broken".into())
        }
    }

    #[test]
    fn failed_task_is_dropped_without_disturbing_the_rest() {
        let steps = Arc::new(AtomicUsize::new(0));
        let mut runner = TaskRunner::new();
        runner.spawn(AlwaysFails);
        runner.spawn(CountSteps {
            steps: steps.clone(),
            remaining: 1,
            nap: Duration::ZERO,
        });

        runner.step_all(Instant::now());
        assert_eq!(steps.load(Ordering::Relaxed), 1);
        assert!(runner.is_empty());
    }
}
