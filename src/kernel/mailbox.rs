//! Single-slot mailboxes
//!
//! Last-write-wins data handoff between tasks: a post never blocks and
//! overwrites any unread prior value; a take empties the slot. If a task is
//! pending on the mailbox, a post is delivered straight to it instead of
//! the slot and the delivery is queued for the scheduler to act on. The
//! mailbox never remembers history beyond its one slot; consumers that can
//! tolerate a missed update keep their own previous value.

use super::types::{MboxId, TaskId};

struct MboxSlot<M> {
    name: &'static str,
    value: Option<M>,
    pender: Option<TaskId>,
}

/// All mailboxes of one kernel instance
pub(crate) struct MailboxSet<M> {
    slots: Vec<MboxSlot<M>>,
    /// Direct deliveries completed during the current work unit
    wakeups: Vec<(TaskId, M)>,
}

impl<M: Copy> MailboxSet<M> {
    pub(crate) fn new() -> Self {
        MailboxSet {
            slots: Vec::new(),
            wakeups: Vec::new(),
        }
    }

    pub(crate) fn create(&mut self, name: &'static str) -> MboxId {
        self.slots.push(MboxSlot {
            name,
            value: None,
            pender: None,
        });
        MboxId(self.slots.len() - 1)
    }

    /// Post a value; never fails, overwrites stale content
    pub(crate) fn post(&mut self, mbox: MboxId, value: M) {
        let slot = &mut self.slots[mbox.0];
        if let Some(tid) = slot.pender.take() {
            self.wakeups.push((tid, value));
        } else {
            slot.value = Some(value);
        }
    }

    /// Take the current value, if any, emptying the slot
    pub(crate) fn try_take(&mut self, mbox: MboxId) -> Option<M> {
        self.slots[mbox.0].value.take()
    }

    /// Register `tid` as the (single) task suspended on this mailbox
    pub(crate) fn set_pender(&mut self, mbox: MboxId, tid: TaskId) {
        let slot = &mut self.slots[mbox.0];
        debug_assert!(slot.pender.is_none(), "second pender on mailbox {}", slot.name);
        slot.pender = Some(tid);
    }

    /// Drop the pender registration, e.g. when its wait times out
    pub(crate) fn clear_pender(&mut self, mbox: MboxId) {
        self.slots[mbox.0].pender = None;
    }

    pub(crate) fn pop_wakeup(&mut self) -> Option<(TaskId, M)> {
        if self.wakeups.is_empty() {
            None
        } else {
            Some(self.wakeups.remove(0))
        }
    }

    #[allow(dead_code)]
    pub(crate) fn name(&self, mbox: MboxId) -> &'static str {
        self.slots[mbox.0].name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_overwrites_unread_value() {
        let mut set: MailboxSet<u32> = MailboxSet::new();
        let mbox = set.create("numbers");

        set.post(mbox, 1);
        set.post(mbox, 2);
        assert_eq!(set.try_take(mbox), Some(2));
        assert_eq!(set.try_take(mbox), None);
    }

    #[test]
    fn take_empties_the_slot() {
        let mut set: MailboxSet<u32> = MailboxSet::new();
        let mbox = set.create("numbers");

        assert_eq!(set.try_take(mbox), None);
        set.post(mbox, 7);
        assert_eq!(set.try_take(mbox), Some(7));
        assert_eq!(set.try_take(mbox), None);
    }

    #[test]
    fn post_to_pender_bypasses_the_slot() {
        let mut set: MailboxSet<u32> = MailboxSet::new();
        let mbox = set.create("numbers");

        set.set_pender(mbox, TaskId(3));
        set.post(mbox, 9);

        assert_eq!(set.pop_wakeup(), Some((TaskId(3), 9)));
        assert_eq!(set.pop_wakeup(), None);
        // delivered directly, nothing left in the slot
        assert_eq!(set.try_take(mbox), None);
    }

    #[test]
    fn cleared_pender_receives_nothing() {
        let mut set: MailboxSet<u32> = MailboxSet::new();
        let mbox = set.create("numbers");

        set.set_pender(mbox, TaskId(0));
        set.clear_pender(mbox);
        set.post(mbox, 4);

        assert_eq!(set.pop_wakeup(), None);
        assert_eq!(set.try_take(mbox), Some(4));
    }
}
