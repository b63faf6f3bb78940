//! Lockstep consumer: pairs the i-th value of two concurrent walks.
//!
//! The loop in [`Comparator::run`] keeps pairing values until [`pair_step`]
//! yields a [`Verdict`]; that verdict is terminal and produced exactly once.

use std::fmt;
use std::thread::{self, ScopedJoinHandle};

use tracing::{debug, instrument, trace, warn};

use crate::application::cancel::CancelToken;
use crate::application::channel::{sequence, Received, SequenceReceiver};
use crate::application::error::{ApplicationError, ApplicationResult};
use crate::application::traverser::{Traverser, Walked};
use crate::config::Settings;
use crate::domain::{DomainError, Tree};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => write!(f, "left"),
            Side::Right => write!(f, "right"),
        }
    }
}

/// First position where the two sequences disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Difference {
    Value { index: usize, left: i64, right: i64 },
    /// `exhausted` ran out at `index` while the other side still had a value
    Length { index: usize, exhausted: Side },
}

impl fmt::Display for Difference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difference::Value { index, left, right } => {
                write!(f, "value mismatch at position {index}: {left} != {right}")
            }
            Difference::Length { index, exhausted } => {
                write!(f, "{exhausted} sequence ended after {index} values")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Equivalent { compared: usize },
    Different(Difference),
}

impl Verdict {
    pub fn is_equivalent(&self) -> bool {
        matches!(self, Verdict::Equivalent { .. })
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Equivalent { compared } => write!(f, "equivalent ({compared} values)"),
            Verdict::Different(difference) => write!(f, "different: {difference}"),
        }
    }
}

/// A verdict together with how each walk ended.
///
/// On a mismatch the unfinished walks report [`Walked::Cancelled`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Comparison {
    pub verdict: Verdict,
    pub left: Walked,
    pub right: Walked,
}

/// One transition; `None` keeps the comparison running.
pub fn pair_step(index: usize, left: Received, right: Received) -> Option<Verdict> {
    match (left, right) {
        (Received::Closed, Received::Closed) => Some(Verdict::Equivalent { compared: index }),
        (Received::Closed, Received::Value(_)) => Some(Verdict::Different(Difference::Length {
            index,
            exhausted: Side::Left,
        })),
        (Received::Value(_), Received::Closed) => Some(Verdict::Different(Difference::Length {
            index,
            exhausted: Side::Right,
        })),
        (Received::Value(l), Received::Value(r)) if l != r => {
            Some(Verdict::Different(Difference::Value {
                index,
                left: l,
                right: r,
            }))
        }
        (Received::Value(_), Received::Value(_)) => None,
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Comparator {
    settings: Settings,
}

impl Comparator {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Walk both trees concurrently and compare their in-order sequences.
    pub fn compare(&self, left: &Tree, right: &Tree) -> ApplicationResult<Verdict> {
        self.run(left, right).map(|comparison| comparison.verdict)
    }

    /// Like [`Comparator::compare`], also reporting how each walk ended.
    ///
    /// On a mismatch the remaining walks are cancelled and joined before
    /// returning. A failed walk is reported as an error, never as a verdict.
    #[instrument(level = "debug", skip_all, fields(strategy = %self.settings.strategy, capacity = %self.settings.capacity))]
    pub fn run(&self, left: &Tree, right: &Tree) -> ApplicationResult<Comparison> {
        self.run_with(left, right, &CancelToken::new())
    }

    fn run_with(
        &self,
        left: &Tree,
        right: &Tree,
        cancel: &CancelToken,
    ) -> ApplicationResult<Comparison> {
        let traverser = Traverser::new(&self.settings).with_cancel(cancel.clone());
        let traverser = &traverser;

        thread::scope(|scope| -> ApplicationResult<Comparison> {
            let (left_tx, left_rx) = sequence(self.settings.capacity);
            let (right_tx, right_rx) = sequence(self.settings.capacity);
            let left_walk = scope.spawn(move || traverser.walk(left, left_tx));
            let right_walk = scope.spawn(move || traverser.walk(right, right_tx));

            let verdict = consume(&left_rx, &right_rx);
            if !verdict.is_equivalent() {
                debug!(%verdict, "stopping walks early");
                cancel.cancel();
            }
            drop(left_rx);
            drop(right_rx);

            let left_walked = join(left_walk, Side::Left);
            let right_walked = join(right_walk, Side::Right);
            let comparison = Comparison {
                verdict,
                left: left_walked?,
                right: right_walked?,
            };
            debug!(?comparison, "comparison finished");
            Ok(comparison)
        })
    }
}

fn consume(left: &SequenceReceiver, right: &SequenceReceiver) -> Verdict {
    let mut index = 0;
    loop {
        let l = left.recv();
        let r = right.recv();
        trace!(index, ?l, ?r, "pair");
        if let Some(verdict) = pair_step(index, l, r) {
            return verdict;
        }
        index += 1;
    }
}

fn join(
    handle: ScopedJoinHandle<'_, Result<Walked, DomainError>>,
    side: Side,
) -> ApplicationResult<Walked> {
    let walked = handle
        .join()
        .map_err(|_| ApplicationError::WorkerPanicked { side })??;
    Ok(walked)
}

/// True iff both trees hold the same values in the same in-order sequence.
///
/// Uses default settings; a failed comparison is logged and reported as `false`.
pub fn same(left: &Tree, right: &Tree) -> bool {
    match Comparator::default().compare(left, right) {
        Ok(verdict) => verdict.is_equivalent(),
        Err(e) => {
            warn!(error = %e, "comparison failed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Capacity, Strategy};
    use rstest::rstest;

    #[rstest]
    #[case(Received::Closed, Received::Closed, Some(Verdict::Equivalent { compared: 3 }))]
    #[case(Received::Closed, Received::Value(1), Some(Verdict::Different(Difference::Length { index: 3, exhausted: Side::Left })))]
    #[case(Received::Value(1), Received::Closed, Some(Verdict::Different(Difference::Length { index: 3, exhausted: Side::Right })))]
    #[case(Received::Value(1), Received::Value(2), Some(Verdict::Different(Difference::Value { index: 3, left: 1, right: 2 })))]
    #[case(Received::Value(7), Received::Value(7), None)]
    fn test_pair_step_table(
        #[case] left: Received,
        #[case] right: Received,
        #[case] expected: Option<Verdict>,
    ) {
        assert_eq!(pair_step(3, left, right), expected);
    }

    #[test]
    fn test_verdict_is_equivalent() {
        assert!(Verdict::Equivalent { compared: 0 }.is_equivalent());
        let different = Verdict::Different(Difference::Length {
            index: 0,
            exhausted: Side::Left,
        });
        assert!(!different.is_equivalent());
    }

    #[test]
    fn test_mismatch_cancels_the_shared_token() {
        let left = Tree::from_values(1..=50);
        let right = left.map(|v| v * 2);
        let cancel = CancelToken::new();
        let comparison = Comparator::default()
            .run_with(&left, &right, &cancel)
            .unwrap();
        assert!(!comparison.verdict.is_equivalent());
        assert!(cancel.is_cancelled());
    }

    #[test]
    fn test_equivalence_leaves_the_token_alone() {
        let tree = Tree::from_values([2, 1, 3]);
        let cancel = CancelToken::new();
        let comparison = Comparator::default()
            .run_with(&tree, &tree, &cancel)
            .unwrap();
        assert_eq!(comparison.verdict, Verdict::Equivalent { compared: 3 });
        assert_eq!(comparison.left, Walked::Completed { emitted: 3 });
        assert_eq!(comparison.right, Walked::Completed { emitted: 3 });
        assert!(!cancel.is_cancelled());
    }

    #[test]
    fn test_early_mismatch_cancels_both_walks() {
        let left = Tree::from_values(0..200);
        let right = left.map(|v| v + 1);
        let comparison = Comparator::default().run(&left, &right).unwrap();
        assert_eq!(
            comparison.verdict,
            Verdict::Different(Difference::Value {
                index: 0,
                left: 0,
                right: 1
            })
        );
        for walked in [comparison.left, comparison.right] {
            assert!(!walked.is_completed(), "{walked:?}");
            assert!(walked.emitted() <= 2, "{walked:?}");
        }
    }

    #[rstest]
    #[case(Capacity::Rendezvous)]
    #[case(Capacity::Bounded(3))]
    #[case(Capacity::Unbounded)]
    fn test_compare_reports_first_value_mismatch(#[case] capacity: Capacity) {
        let comparator = Comparator::new(Settings {
            capacity,
            ..Default::default()
        });
        let left = Tree::from_values([3, 1, 2, 5, 4]);
        let right = Tree::from_values([1, 2, 3, 4, 6]);
        let verdict = comparator.compare(&left, &right).unwrap();
        assert_eq!(
            verdict,
            Verdict::Different(Difference::Value {
                index: 4,
                left: 5,
                right: 6
            })
        );
    }

    #[test]
    fn test_compare_counts_equal_values() {
        let left = Tree::from_values([2, 1, 3]);
        let right = Tree::from_values([1, 2, 3]);
        let verdict = Comparator::default().compare(&left, &right).unwrap();
        assert_eq!(verdict, Verdict::Equivalent { compared: 3 });
    }

    #[test]
    fn test_compare_surfaces_depth_failure() {
        let comparator = Comparator::new(Settings {
            strategy: Strategy::Recursive,
            max_depth: Some(2),
            ..Default::default()
        });
        let deep = Tree::from_values(1..=4);
        let err = comparator.compare(&deep, &deep).unwrap_err();
        assert!(matches!(
            err,
            ApplicationError::Domain(DomainError::DepthExceeded { limit: 2 })
        ));
    }

    #[test]
    fn test_same_on_small_trees() {
        assert!(same(&Tree::from_values([1, 2]), &Tree::from_values([1, 2])));
        assert!(!same(&Tree::from_values([1, 2]), &Tree::from_values([1])));
    }

    #[test]
    fn test_difference_display() {
        let d = Difference::Value {
            index: 1,
            left: 2,
            right: 20,
        };
        assert_eq!(d.to_string(), "value mismatch at position 1: 2 != 20");
        let d = Difference::Length {
            index: 9,
            exhausted: Side::Right,
        };
        assert_eq!(d.to_string(), "right sequence ended after 9 values");
    }
}
