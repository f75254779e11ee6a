//! Task model
//!
//! A task is released by its own counting semaphore, performs one unit of
//! work per release and reports how the unit ends: complete, suspended on
//! a mailbox, or occupying the processor for a stretch of virtual time.
//! The kernel slot carries what a real RTOS would keep in the task
//! control block: priority, run state and the release semaphore count.

use super::mailbox::MailboxSet;
use super::types::{MboxId, Millis, SemCtr, Prio};

/// How one unit of work ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Work unit complete; wait for the next release
    Done,
    /// Suspend on a mailbox. `timeout` of `None` waits forever; the kernel
    /// resumes the task via [`Task::resumed`] with the taken value or
    /// `None` on expiry.
    Pend {
        mbox: MboxId,
        timeout: Option<Millis>,
    },
    /// Hold the processor for this many virtual milliseconds, then
    /// complete. Higher-priority tasks still preempt; lower-priority ones
    /// do not run until the window ends.
    Occupy(Millis),
}

/// One periodic task
pub trait Task<M: Copy> {
    fn name(&self) -> &'static str;

    /// One unit of work, called per release
    fn run(&mut self, ctx: &mut TaskCtx<'_, M>) -> Step;

    /// Completion of a [`Step::Pend`]: `taken` carries the mailbox value,
    /// or `None` when the wait timed out.
    fn resumed(&mut self, ctx: &mut TaskCtx<'_, M>, taken: Option<M>) -> Step {
        let _ = (ctx, taken);
        Step::Done
    }
}

/// Kernel services available to a running task
pub struct TaskCtx<'k, M: Copy> {
    pub(crate) now: Millis,
    pub(crate) mboxes: &'k mut MailboxSet<M>,
}

impl<M: Copy> TaskCtx<'_, M> {
    /// Current virtual time
    pub fn now(&self) -> Millis {
        self.now
    }

    /// Post to a mailbox; non-blocking, always succeeds, last write wins
    pub fn post(&mut self, mbox: MboxId, value: M) {
        self.mboxes.post(mbox, value);
    }

    /// Take the mailbox value if one is present
    pub fn try_take(&mut self, mbox: MboxId) -> Option<M> {
        self.mboxes.try_take(mbox)
    }
}

/// Run state of a task slot
pub(crate) enum SlotState<M> {
    /// Blocked on the release semaphore
    WaitRelease,
    /// Released; dispatch enters through [`Task::run`]
    Ready,
    /// A pend completed; dispatch enters through [`Task::resumed`]
    Resumed(Option<M>),
    /// Suspended on a mailbox
    PendMbox {
        mbox: MboxId,
        deadline: Option<Millis>,
    },
    /// Holding the processor until the given instant
    Occupied { until: Millis },
}

pub(crate) struct TaskSlot<M: Copy> {
    pub prio: Prio,
    pub state: SlotState<M>,
    /// Release semaphore count; releases arriving while the task is busy
    /// accumulate and are drained one work unit at a time
    pub release_pending: SemCtr,
    pub task: Box<dyn Task<M>>,
}
