//! Simulated kernel: registry and fixed-priority executor
//!
//! Single simulated core, deterministic virtual time. One hardware tick
//! (the only clock source) drives the soft timers, which signal task
//! release semaphores; the executor always dispatches the highest-priority
//! ready task. Work units cost no virtual time except explicit occupancy
//! windows, which hold the processor at the owning task's priority while
//! still being preemptible from above.
//!
//! Event ordering at one instant is fixed: pend timeouts expire first,
//! then occupancy windows close, then the hardware tick fires, then ready
//! tasks dispatch. Replaying the same inputs therefore produces the same
//! trace, which the test suite relies on.

pub mod error;
pub mod mailbox;
pub mod prio;
pub mod task;
pub mod timer;
pub mod types;

use core::mem;

use crate::config::CFG_PRIO_MAX;

use self::error::{KernelError, KernelResult};
use self::mailbox::MailboxSet;
use self::prio::PrioTable;
use self::task::{SlotState, Step, Task, TaskCtx, TaskSlot};
use self::timer::TimerSet;
use self::types::{MboxId, Millis, Prio, TaskId, TimerId};

/// The simulated kernel
pub struct Kernel<M: Copy> {
    now: Millis,
    tick_resolution: Millis,
    next_tick: Millis,
    started: bool,
    prio_tbl: PrioTable,
    by_prio: [Option<usize>; CFG_PRIO_MAX],
    slots: Vec<TaskSlot<M>>,
    timers: TimerSet,
    mboxes: MailboxSet<M>,
    fired: Vec<TaskId>,
}

impl<M: Copy> Kernel<M> {
    /// Acquire the hardware timer and set up an empty kernel.
    ///
    /// A zero tick resolution means no clock is available, which is fatal.
    pub fn new(tick_resolution: Millis) -> KernelResult<Self> {
        if tick_resolution == 0 {
            return Err(KernelError::NoClock);
        }
        Ok(Kernel {
            now: 0,
            tick_resolution,
            next_tick: tick_resolution,
            started: false,
            prio_tbl: PrioTable::new(),
            by_prio: [None; CFG_PRIO_MAX],
            slots: Vec::new(),
            timers: TimerSet::new(),
            mboxes: MailboxSet::new(),
            fired: Vec::new(),
        })
    }

    /// Current virtual time
    pub fn time(&self) -> Millis {
        self.now
    }

    /// Create a single-slot mailbox
    pub fn create_mailbox(&mut self, name: &'static str) -> MboxId {
        self.mboxes.create(name)
    }

    /// Register a task at the given priority. Each priority level holds at
    /// most one task; registering the same level twice is an error.
    pub fn register_task(
        &mut self,
        prio: Prio,
        task: Box<dyn Task<M>>,
    ) -> KernelResult<TaskId> {
        if self.started {
            return Err(KernelError::Running);
        }
        if (prio as usize) >= CFG_PRIO_MAX {
            return Err(KernelError::PrioInvalid);
        }
        if self.by_prio[prio as usize].is_some() {
            return Err(KernelError::PrioExist);
        }
        let idx = self.slots.len();
        self.slots.push(TaskSlot {
            prio,
            state: SlotState::WaitRelease,
            release_pending: 0,
            task,
        });
        self.by_prio[prio as usize] = Some(idx);
        crate::debug!("task '{}' registered at priority {}", self.slots[idx].task.name(), prio);
        Ok(TaskId(idx))
    }

    /// Start a periodic soft timer whose only action is signalling the
    /// target task's release semaphore.
    pub fn start_periodic_timer(
        &mut self,
        period_ms: Millis,
        target: TaskId,
    ) -> KernelResult<TimerId> {
        self.timers.create(period_ms, self.tick_resolution, target)
    }

    /// Start multitasking. At least one task must be registered.
    pub fn start(&mut self) -> KernelResult<()> {
        if self.started {
            return Err(KernelError::Running);
        }
        if self.slots.is_empty() {
            return Err(KernelError::NoAppTask);
        }
        self.started = true;
        crate::info!(
            "kernel started: {} tasks, tick resolution {} ms",
            self.slots.len(),
            self.tick_resolution
        );
        Ok(())
    }

    /// Advance virtual time by `duration`, processing every release,
    /// timeout and occupancy completion in that window.
    pub fn run_for(&mut self, duration: Millis) -> KernelResult<()> {
        if !self.started {
            return Err(KernelError::NotStarted);
        }
        let end = self.now + duration;
        loop {
            self.dispatch();
            let next = self.next_event_time();
            if next > end {
                break;
            }
            self.now = next;
            self.expire_pends();
            self.finish_occupancies();
            if self.now == self.next_tick {
                self.hardware_tick();
            }
        }
        self.now = end;
        Ok(())
    }

    // ============ Event processing ============

    fn next_event_time(&self) -> Millis {
        let mut next = self.next_tick;
        for slot in &self.slots {
            match slot.state {
                SlotState::PendMbox {
                    deadline: Some(d), ..
                } if d < next => next = d,
                SlotState::Occupied { until } if until < next => next = until,
                _ => {}
            }
        }
        next
    }

    /// Hardware tick: advance the soft timers and signal release
    /// semaphores for every timer that fired.
    fn hardware_tick(&mut self) {
        self.next_tick += self.tick_resolution;
        let mut fired = mem::take(&mut self.fired);
        fired.clear();
        self.timers.tick(&mut fired);
        for tid in fired.iter() {
            self.signal_release(*tid);
        }
        self.fired = fired;
    }

    fn signal_release(&mut self, tid: TaskId) {
        let slot = &mut self.slots[tid.0];
        if matches!(slot.state, SlotState::WaitRelease) {
            slot.state = SlotState::Ready;
            let prio = slot.prio;
            self.prio_tbl.insert(prio);
        } else {
            // releases are counting: a busy task keeps the signal
            slot.release_pending = slot.release_pending.saturating_add(1);
        }
    }

    /// Resume every pend whose deadline has passed with a timeout result.
    fn expire_pends(&mut self) {
        for idx in 0..self.slots.len() {
            if let SlotState::PendMbox {
                mbox,
                deadline: Some(d),
            } = self.slots[idx].state
            {
                if d <= self.now {
                    self.mboxes.clear_pender(mbox);
                    self.slots[idx].state = SlotState::Resumed(None);
                    self.sync_prio(idx);
                }
            }
        }
    }

    /// Complete the work unit of every occupancy window that has closed.
    fn finish_occupancies(&mut self) {
        for idx in 0..self.slots.len() {
            if let SlotState::Occupied { until } = self.slots[idx].state {
                if until <= self.now {
                    self.complete_slot(idx);
                }
            }
        }
    }

    // ============ Dispatch ============

    /// Run ready tasks, highest priority first, until none is runnable.
    /// Tasks below an open occupancy window stay parked.
    fn dispatch(&mut self) {
        loop {
            let ceiling = self.occupancy_ceiling();
            let Some(prio) = self.prio_tbl.highest_above(ceiling) else {
                break;
            };
            let Some(idx) = self.by_prio[prio as usize] else {
                debug_assert!(false, "ready bit without a task at priority {prio}");
                break;
            };
            self.run_slot(idx);
        }
    }

    /// Highest priority currently holding the processor in an occupancy
    /// window; `CFG_PRIO_MAX` when none is open.
    fn occupancy_ceiling(&self) -> Prio {
        let mut ceiling = CFG_PRIO_MAX as Prio;
        for slot in &self.slots {
            if matches!(slot.state, SlotState::Occupied { .. }) && slot.prio < ceiling {
                ceiling = slot.prio;
            }
        }
        ceiling
    }

    /// Execute one work unit of the task in `idx`, resolving pends that
    /// can complete immediately from the mailbox slot.
    fn run_slot(&mut self, idx: usize) {
        enum After {
            Completed,
            Parked,
        }

        let now = self.now;
        let after = {
            let slot = &mut self.slots[idx];
            let mut ctx = TaskCtx {
                now,
                mboxes: &mut self.mboxes,
            };
            let mut step = match mem::replace(&mut slot.state, SlotState::WaitRelease) {
                SlotState::Ready => slot.task.run(&mut ctx),
                SlotState::Resumed(taken) => slot.task.resumed(&mut ctx, taken),
                other => {
                    slot.state = other;
                    return;
                }
            };
            loop {
                match step {
                    Step::Done => break After::Completed,
                    Step::Occupy(0) => break After::Completed,
                    Step::Occupy(d) => {
                        slot.state = SlotState::Occupied { until: now + d };
                        break After::Parked;
                    }
                    Step::Pend { mbox, timeout } => {
                        if let Some(value) = ctx.try_take(mbox) {
                            step = slot.task.resumed(&mut ctx, Some(value));
                        } else if timeout == Some(0) {
                            step = slot.task.resumed(&mut ctx, None);
                        } else {
                            crate::trace!(
                                "task '{}' pending on '{}'",
                                slot.task.name(),
                                ctx.mboxes.name(mbox)
                            );
                            ctx.mboxes.set_pender(mbox, TaskId(idx));
                            slot.state = SlotState::PendMbox {
                                mbox,
                                deadline: timeout.map(|d| now + d),
                            };
                            break After::Parked;
                        }
                    }
                }
            }
        };
        match after {
            After::Completed => self.complete_slot(idx),
            After::Parked => self.sync_prio(idx),
        }
        self.drain_wakeups();
    }

    /// A work unit finished: either drain one pending release and stay
    /// ready, or go back to waiting on the release semaphore.
    fn complete_slot(&mut self, idx: usize) {
        let slot = &mut self.slots[idx];
        if slot.release_pending > 0 {
            slot.release_pending -= 1;
            slot.state = SlotState::Ready;
        } else {
            slot.state = SlotState::WaitRelease;
        }
        self.sync_prio(idx);
    }

    /// Mirror the slot's runnability into the priority bitmap.
    fn sync_prio(&mut self, idx: usize) {
        let prio = self.slots[idx].prio;
        match self.slots[idx].state {
            SlotState::Ready | SlotState::Resumed(_) => self.prio_tbl.insert(prio),
            _ => self.prio_tbl.remove(prio),
        }
    }

    /// Make tasks that received a direct mailbox delivery runnable.
    fn drain_wakeups(&mut self) {
        while let Some((tid, value)) = self.mboxes.pop_wakeup() {
            let slot = &mut self.slots[tid.0];
            debug_assert!(matches!(slot.state, SlotState::PendMbox { .. }));
            slot.state = SlotState::Resumed(Some(value));
            let prio = slot.prio;
            self.prio_tbl.insert(prio);
        }
    }
}
