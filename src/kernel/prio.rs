//! Priority bitmap for O(1) highest-ready lookup
//!
//! One bit per priority level; a set bit means the task at that level is
//! ready to run. Bit 0 is the highest priority.

use crate::config::CFG_PRIO_MAX;

use super::types::Prio;

/// Priority bitmap table
#[derive(Debug, Default)]
pub struct PrioTable {
    bits: u32,
}

impl PrioTable {
    pub const fn new() -> Self {
        PrioTable { bits: 0 }
    }

    /// Mark a priority ready
    #[inline]
    pub fn insert(&mut self, prio: Prio) {
        debug_assert!((prio as usize) < CFG_PRIO_MAX);
        self.bits |= 1 << prio;
    }

    /// Clear a priority
    #[inline]
    pub fn remove(&mut self, prio: Prio) {
        debug_assert!((prio as usize) < CFG_PRIO_MAX);
        self.bits &= !(1 << prio);
    }

    #[inline]
    pub fn is_set(&self, prio: Prio) -> bool {
        self.bits & (1 << prio) != 0
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    /// Highest ready priority, if any
    #[inline]
    pub fn highest(&self) -> Option<Prio> {
        if self.bits == 0 {
            None
        } else {
            Some(self.bits.trailing_zeros() as Prio)
        }
    }

    /// Highest ready priority strictly above `ceiling` (numerically below).
    ///
    /// A `ceiling` of `CFG_PRIO_MAX` or more means no ceiling.
    #[inline]
    pub fn highest_above(&self, ceiling: Prio) -> Option<Prio> {
        if (ceiling as usize) >= CFG_PRIO_MAX {
            return self.highest();
        }
        let masked = self.bits & ((1u32 << ceiling) - 1);
        if masked == 0 {
            None
        } else {
            Some(masked.trailing_zeros() as Prio)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_table() {
        let table = PrioTable::new();
        assert!(table.is_empty());
        assert_eq!(table.highest(), None);
    }

    #[test]
    fn insert_remove() {
        let mut table = PrioTable::new();

        table.insert(5);
        assert!(table.is_set(5));
        assert!(!table.is_set(4));
        assert_eq!(table.highest(), Some(5));

        table.insert(3);
        assert_eq!(table.highest(), Some(3));

        table.remove(3);
        assert_eq!(table.highest(), Some(5));

        table.remove(5);
        assert!(table.is_empty());
    }

    #[test]
    fn priority_order() {
        let mut table = PrioTable::new();

        table.insert(10);
        table.insert(5);
        table.insert(20);
        table.insert(0);
        table.insert(15);

        assert_eq!(table.highest(), Some(0));

        table.remove(0);
        assert_eq!(table.highest(), Some(5));

        table.remove(5);
        assert_eq!(table.highest(), Some(10));
    }

    #[test]
    fn ceiling_masks_lower_priorities() {
        let mut table = PrioTable::new();

        table.insert(8);
        table.insert(14);

        assert_eq!(table.highest_above(13), Some(8));
        assert_eq!(table.highest_above(8), None);
        assert_eq!(table.highest_above(CFG_PRIO_MAX as Prio), Some(8));

        table.remove(8);
        assert_eq!(table.highest_above(13), None);
        assert_eq!(table.highest_above(CFG_PRIO_MAX as Prio), Some(14));
    }
}
