//! Sorted vector with binary-search insert and removal.
//!
//! Elements are kept in ascending order under the supplied comparator and
//! [`OrderedList::pop`] takes from the *end*, i.e. it returns the largest
//! element. To get "soonest first" out of `pop`, the comparator must rank the
//! soonest element as the largest (compare `b` against `a`). The expiry
//! scheduler does exactly that.
//!
//! Removal locates elements with the comparator, not by identity. Two
//! distinct elements comparing `Equal` are indistinguishable to
//! [`OrderedList::remove`], so comparators must be total orders over
//! everything that may share the list.

use std::cmp::Ordering;
use std::fmt;

pub struct OrderedList<T, F>
where
    F: Fn(&T, &T) -> Ordering,
{
    items: Vec<T>,
    compare: F,
}

impl<T, F> OrderedList<T, F>
where
    F: Fn(&T, &T) -> Ordering,
{
    /// Build a list from unsorted items.
    pub fn new(mut items: Vec<T>, compare: F) -> Self {
        items.sort_by(&compare);
        Self { items, compare }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Remove and return the largest element under the comparator.
    pub fn pop(&mut self) -> Option<T> {
        self.items.pop()
    }

    /// The element `pop` would return next.
    pub fn peek(&self) -> Option<&T> {
        self.items.last()
    }

    /// Insert keeping the list sorted. Equal elements are placed after the
    /// existing run of equals.
    pub fn insert(&mut self, element: T) {
        let index = self
            .items
            .partition_point(|probe| (self.compare)(probe, &element) != Ordering::Greater);
        self.items.insert(index, element);
    }

    /// Remove the element comparing equal to `element`, if present.
    pub fn remove(&mut self, element: &T) -> Option<T> {
        match self
            .items
            .binary_search_by(|probe| (self.compare)(probe, element))
        {
            Ok(index) => Some(self.items.remove(index)),
            Err(_) => None,
        }
    }

    /// Iterate in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }
}

impl<T: fmt::Debug, F> fmt::Debug for OrderedList<T, F>
where
    F: Fn(&T, &T) -> Ordering,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.items.iter()).finish()
    }
}
