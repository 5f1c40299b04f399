//! Repetition helpers producing fragments of descriptions.
//!
//! Both helpers are bounded: no more than [`MAX_ITERATIONS`] items are ever
//! produced, and hitting the bound logs a warning instead of looping forever.

use crate::element::{fragment, Element};

/// Upper bound on items produced by [`for_each`] and [`while_loop`].
pub const MAX_ITERATIONS: usize = 1_000_000;

/// `start`, `start + step`, ... while below `end`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForRange {
    pub start: f64,
    pub step: f64,
    pub end: f64,
}

impl ForRange {
    /// `0, 1, 2, ...` below `end`.
    pub fn new(end: f64) -> Self {
        Self {
            start: 0.0,
            step: 1.0,
            end,
        }
    }

    pub fn start(mut self, start: f64) -> Self {
        self.start = start;
        self
    }

    /// A step of zero (or a non-finite step) counts as one.
    pub fn step(mut self, step: f64) -> Self {
        self.step = step;
        self
    }

    pub fn iter(&self) -> ForIter {
        ForIter {
            range: *self,
            index: if self.start.is_finite() { self.start } else { 0.0 },
            count: 0,
        }
    }
}

impl IntoIterator for ForRange {
    type Item = ForContext;
    type IntoIter = ForIter;

    fn into_iter(self) -> ForIter {
        self.iter()
    }
}

/// What the body of [`for_each`] receives per item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForContext {
    pub index: f64,
    pub start: f64,
    pub step: f64,
    pub end: f64,
}

#[derive(Debug, Clone)]
pub struct ForIter {
    range: ForRange,
    index: f64,
    count: usize,
}

impl Iterator for ForIter {
    type Item = ForContext;

    fn next(&mut self) -> Option<ForContext> {
        if !(self.index < self.range.end) {
            return None;
        }
        if self.count == MAX_ITERATIONS {
            log::warn!("for_each stopped after {MAX_ITERATIONS} items; range {:?} is longer", self.range);
            self.index = f64::INFINITY;
            return None;
        }

        let step = if self.range.step == 0.0 || !self.range.step.is_finite() {
            1.0
        } else {
            self.range.step
        };
        let item = ForContext {
            index: self.index,
            start: self.range.start,
            step: self.range.step,
            end: self.range.end,
        };
        self.index += step;
        self.count += 1;
        Some(item)
    }
}

/// A fragment of `body`'s output for every index of `range`.
pub fn for_each<F, E>(range: ForRange, body: F) -> Element
where
    F: FnMut(ForContext) -> E,
    E: Into<Element>,
{
    fragment(range.iter().map(body))
}

/// Runs `body` on a mutable context while `test` holds, at most
/// [`MAX_ITERATIONS`] times by default.
pub struct BoundedWhile<C, T, B> {
    context: C,
    test: T,
    body: B,
    limit: usize,
    count: usize,
    hit_bound: bool,
    finished: bool,
}

impl<C, T, B> BoundedWhile<C, T, B> {
    pub fn new(context: C, test: T, body: B) -> Self {
        Self {
            context,
            test,
            body,
            limit: MAX_ITERATIONS,
            count: 0,
            hit_bound: false,
            finished: false,
        }
    }

    /// Lower the iteration bound.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.min(MAX_ITERATIONS);
        self
    }

    /// Whether iteration stopped because of the bound while `test` still held.
    pub fn hit_bound(&self) -> bool {
        self.hit_bound
    }

    pub fn iterations(&self) -> usize {
        self.count
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    pub fn into_context(self) -> C {
        self.context
    }
}

impl<C, T, B, E> Iterator for BoundedWhile<C, T, B>
where
    T: FnMut(&C) -> bool,
    B: FnMut(&mut C) -> E,
{
    type Item = E;

    fn next(&mut self) -> Option<E> {
        if self.finished {
            return None;
        }
        if !(self.test)(&self.context) {
            self.finished = true;
            return None;
        }
        if self.count == self.limit {
            self.finished = true;
            self.hit_bound = true;
            log::warn!(
                "while loop stopped after {} iterations with its condition still true",
                self.limit
            );
            return None;
        }

        self.count += 1;
        Some((self.body)(&mut self.context))
    }
}

/// A fragment of `body`'s output for each iteration of a bounded while
/// loop over `context`.
pub fn while_loop<C, T, B, E>(context: C, test: T, body: B) -> Element
where
    T: FnMut(&C) -> bool,
    B: FnMut(&mut C) -> E,
    E: Into<Element>,
{
    fragment(BoundedWhile::new(context, test, body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::rectangle;

    fn fragment_len(element: &Element) -> usize {
        match element {
            Element::Fragment(f) => f.children.len(),
            _ => panic!("expected a fragment"),
        }
    }

    #[test]
    fn test_for_range_defaults() {
        let indices: Vec<f64> = ForRange::new(3.0).iter().map(|c| c.index).collect();
        assert_eq!(indices, vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_for_range_start_and_step() {
        let items: Vec<ForContext> = ForRange::new(10.0).start(2.0).step(3.0).into_iter().collect();
        let indices: Vec<f64> = items.iter().map(|c| c.index).collect();
        assert_eq!(indices, vec![2.0, 5.0, 8.0]);
        assert_eq!(items[0].step, 3.0);
        assert_eq!(items[0].end, 10.0);
    }

    #[test]
    fn test_zero_step_counts_as_one() {
        assert_eq!(ForRange::new(4.0).step(0.0).iter().count(), 4);
    }

    #[test]
    fn test_negative_step_is_bounded() {
        assert_eq!(ForRange::new(1.0).step(-1.0).iter().count(), MAX_ITERATIONS);
    }

    #[test]
    fn test_for_each_builds_fragment() {
        let element = for_each(ForRange::new(5.0), |c| rectangle().prop("x", c.index));
        assert_eq!(fragment_len(&element), 5);
    }

    #[test]
    fn test_while_runs_until_test_fails() {
        let element = while_loop(0, |n| *n < 3, |n| {
            *n += 1;
            rectangle().prop("x", *n)
        });
        assert_eq!(fragment_len(&element), 3);
    }

    #[test]
    fn test_while_stops_at_limit() {
        let mut looped = BoundedWhile::new((), |_: &()| true, |_: &mut ()| ()).with_limit(10);
        assert_eq!(looped.by_ref().count(), 10);
        assert!(looped.hit_bound());
        assert_eq!(looped.next(), None);
    }

    #[test]
    fn test_while_clean_exit_is_not_a_bound_hit() {
        let mut looped = BoundedWhile::new(0u32, |n: &u32| *n < 5, |n: &mut u32| *n += 1);
        assert_eq!(looped.by_ref().count(), 5);
        assert!(!looped.hit_bound());
        assert_eq!(looped.into_context(), 5);
    }
}
