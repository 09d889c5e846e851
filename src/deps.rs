//! The dependency set: an append-only-within-a-state, copy-on-write set of
//! arcs.
//!
//! Sibling states produced by one beam-expansion step usually add different
//! single arcs to the same parent dependency set; backing each `DepSet` with
//! a reference-counted hash set means those siblings share storage until one
//! of them actually mutates (see `add`), rather than each carrying its own
//! full copy of a set that only grows by one element per step.

use fnv::FnvHashSet;
use std::rc::Rc;

/// A directed head→child relation between two token ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Arc {
    pub head: u32,
    pub child: u32,
}

impl Arc {
    pub fn new(head: u32, child: u32) -> Arc {
        Arc { head, child }
    }
}

/// A copy-on-write set of arcs.
#[derive(Debug, Clone)]
pub struct DepSet(Rc<FnvHashSet<Arc>>);

impl DepSet {
    pub fn new() -> DepSet {
        DepSet(Rc::new(FnvHashSet::default()))
    }

    /// Idempotent insert. Clones the backing set only if it is currently
    /// shared with another `DepSet`.
    pub fn add(&mut self, head: u32, child: u32) {
        Rc::make_mut(&mut self.0).insert(Arc::new(head, child));
    }

    pub fn contains(&self, head: u32, child: u32) -> bool {
        self.0.contains(&Arc::new(head, child))
    }

    pub fn contains_arc(&self, arc: &Arc) -> bool {
        self.0.contains(arc)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc> {
        self.0.iter()
    }

    /// Arcs present in `self` but not in `other`.
    pub fn difference(&self, other: &DepSet) -> DepSet {
        let diff: FnvHashSet<Arc> = self.0.difference(&other.0).copied().collect();
        DepSet(Rc::new(diff))
    }

    /// Arcs present in both `self` and `other`.
    pub fn intersection(&self, other: &DepSet) -> DepSet {
        let inter: FnvHashSet<Arc> = self.0.intersection(&other.0).copied().collect();
        DepSet(Rc::new(inter))
    }
}

impl Default for DepSet {
    fn default() -> Self {
        DepSet::new()
    }
}

impl PartialEq for DepSet {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0) || *self.0 == *other.0
    }
}
impl Eq for DepSet {}

impl FromIterator<Arc> for DepSet {
    fn from_iter<T: IntoIterator<Item = Arc>>(iter: T) -> Self {
        DepSet(Rc::new(iter.into_iter().collect()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_is_idempotent() {
        let mut d = DepSet::new();
        d.add(0, 1);
        d.add(0, 1);
        assert_eq!(d.len(), 1);
    }

    #[test]
    fn clone_then_add_does_not_affect_original() {
        let mut a = DepSet::new();
        a.add(0, 1);
        let mut b = a.clone();
        b.add(1, 2);
        assert_eq!(a.len(), 1);
        assert_eq!(b.len(), 2);
        assert!(!a.contains(1, 2));
    }

    #[test]
    fn equality_is_by_arc_set_not_insertion_order() {
        let mut a = DepSet::new();
        a.add(0, 1);
        a.add(1, 2);
        let mut b = DepSet::new();
        b.add(1, 2);
        b.add(0, 1);
        assert_eq!(a, b);
    }

    #[test]
    fn difference_and_intersection() {
        let mut a = DepSet::new();
        a.add(0, 1);
        a.add(1, 2);
        let mut b = DepSet::new();
        b.add(1, 2);
        b.add(2, 3);
        assert_eq!(a.difference(&b).len(), 1);
        assert!(a.difference(&b).contains(0, 1));
        assert_eq!(a.intersection(&b).len(), 1);
        assert!(a.intersection(&b).contains(1, 2));
    }
}
