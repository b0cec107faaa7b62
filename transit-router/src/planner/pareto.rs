//! A set of mutually non-dominated items under an injected comparator.

use std::cmp::Ordering;

/// Outcome of comparing two items on every criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dominance {
    /// The left item dominates the right one.
    Left,
    /// The right item dominates the left one.
    Right,
    /// Equal on every criterion.
    Equal,
    /// Each is better on some criterion.
    Incomparable,
}

impl Dominance {
    /// Combines per-criterion orderings, where `Less` means the left item is
    /// better on that criterion.
    pub fn from_orderings(orderings: impl IntoIterator<Item = Ordering>) -> Self {
        let (mut left, mut right) = (false, false);
        for ordering in orderings {
            match ordering {
                Ordering::Less => left = true,
                Ordering::Greater => right = true,
                Ordering::Equal => {}
            }
        }
        match (left, right) {
            (true, true) => Dominance::Incomparable,
            (true, false) => Dominance::Left,
            (false, true) => Dominance::Right,
            (false, false) => Dominance::Equal,
        }
    }
}

/// Decides dominance between two items.
pub trait ParetoComparator<T> {
    fn compare(&self, left: &T, right: &T) -> Dominance;
}

impl<T, F> ParetoComparator<T> for F
where
    F: Fn(&T, &T) -> Dominance,
{
    fn compare(&self, left: &T, right: &T) -> Dominance {
        self(left, right)
    }
}

/// Items none of which dominates another.
#[derive(Debug, Clone)]
pub struct ParetoSet<T, C> {
    items: Vec<T>,
    comparator: C,
}

impl<T, C: ParetoComparator<T>> ParetoSet<T, C> {
    pub fn new(comparator: C) -> Self {
        Self {
            items: Vec::new(),
            comparator,
        }
    }

    /// True if `item` would be accepted by [`ParetoSet::add`].
    pub fn qualifies(&self, item: &T) -> bool {
        self.items.iter().all(|existing| {
            matches!(
                self.comparator.compare(item, existing),
                Dominance::Left | Dominance::Incomparable
            )
        })
    }

    /// Adds `item` unless a member dominates or equals it.
    ///
    /// Members dominated by `item` are removed. Returns whether the item was
    /// added.
    pub fn add(&mut self, item: T) -> bool {
        if !self.qualifies(&item) {
            return false;
        }
        let comparator = &self.comparator;
        self.items
            .retain(|existing| comparator.compare(&item, existing) != Dominance::Left);
        self.items.push(item);
        true
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Checks that no member dominates or equals another.
    pub fn is_pareto_optimal(&self) -> bool {
        self.items.iter().enumerate().all(|(i, a)| {
            self.items[i + 1..]
                .iter()
                .all(|b| self.comparator.compare(a, b) == Dominance::Incomparable)
        })
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

impl<'a, T, C> IntoIterator for &'a ParetoSet<T, C> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_criteria(a: &(i32, i32), b: &(i32, i32)) -> Dominance {
        Dominance::from_orderings([a.0.cmp(&b.0), a.1.cmp(&b.1)])
    }

    type Cmp = fn(&(i32, i32), &(i32, i32)) -> Dominance;

    fn set() -> ParetoSet<(i32, i32), Cmp> {
        ParetoSet::new(two_criteria as Cmp)
    }

    #[test]
    fn dominance_from_orderings() {
        use Ordering::*;
        assert_eq!(Dominance::from_orderings([Less, Equal]), Dominance::Left);
        assert_eq!(Dominance::from_orderings([Equal, Greater]), Dominance::Right);
        assert_eq!(Dominance::from_orderings([Equal, Equal]), Dominance::Equal);
        assert_eq!(Dominance::from_orderings([Less, Greater]), Dominance::Incomparable);
    }

    #[test]
    fn add_rejects_dominated_and_equal() {
        let mut s = set();
        assert!(s.add((5, 5)));
        assert!(!s.add((6, 5)));
        assert!(!s.add((5, 5)));
        assert!(s.add((4, 6)));
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn add_removes_dominated_members() {
        let mut s = set();
        s.add((5, 5));
        s.add((3, 8));
        s.add((8, 2));
        assert!(s.add((3, 2)));
        assert_eq!(s.iter().copied().collect::<Vec<_>>(), vec![(3, 2)]);
    }

    #[test]
    fn clear_empties() {
        let mut s = set();
        s.add((1, 1));
        s.clear();
        assert!(s.is_empty());
        assert!(s.qualifies(&(9, 9)));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn three_criteria(a: &(u8, u8, u8), b: &(u8, u8, u8)) -> Dominance {
        Dominance::from_orderings([a.0.cmp(&b.0), a.1.cmp(&b.1), a.2.cmp(&b.2)])
    }

    /// Check if `a` dominates `b`.
    fn dominates(a: &(u8, u8, u8), b: &(u8, u8, u8)) -> bool {
        a.0 <= b.0 && a.1 <= b.1 && a.2 <= b.2 && a != b
    }

    proptest! {
        #[test]
        fn set_is_always_pareto_optimal(items in prop::collection::vec((0u8..10, 0u8..10, 0u8..10), 0..40)) {
            let mut set = ParetoSet::new(three_criteria);
            for item in &items {
                set.add(*item);
                prop_assert!(set.is_pareto_optimal());
            }
        }

        #[test]
        fn every_input_is_kept_or_covered(items in prop::collection::vec((0u8..10, 0u8..10, 0u8..10), 0..40)) {
            let mut set = ParetoSet::new(three_criteria);
            for item in &items {
                set.add(*item);
            }
            for item in &items {
                let covered = set.iter().any(|m| m == item || dominates(m, item));
                prop_assert!(covered, "{:?} neither kept nor dominated", item);
            }
        }

        #[test]
        fn result_matches_brute_force(items in prop::collection::vec((0u8..6, 0u8..6, 0u8..6), 0..30)) {
            let mut set = ParetoSet::new(three_criteria);
            for item in &items {
                set.add(*item);
            }

            let mut expected: Vec<_> = items
                .iter()
                .filter(|a| !items.iter().any(|b| dominates(b, a)))
                .copied()
                .collect();
            expected.sort();
            expected.dedup();

            let mut actual: Vec<_> = set.iter().copied().collect();
            actual.sort();
            prop_assert_eq!(actual, expected);
        }
    }
}
