//! In-order producer: walks one tree and streams its values onto a channel.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, instrument, trace};

use crate::application::cancel::CancelToken;
use crate::application::channel::{sequence, SequenceReceiver, SequenceSender};
use crate::config::{Settings, Strategy};
use crate::domain::{DomainError, Node, Tree};

/// How a walk ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Walked {
    /// Every value was emitted
    Completed { emitted: usize },
    /// Stopped early: the token was cancelled or the receiver went away
    Cancelled { emitted: usize },
}

impl Walked {
    pub fn emitted(&self) -> usize {
        match self {
            Walked::Completed { emitted } | Walked::Cancelled { emitted } => *emitted,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Walked::Completed { .. })
    }
}

/// Reason a walk stopped before the last value.
enum Halt {
    Cancelled,
    Failed(DomainError),
}

impl From<DomainError> for Halt {
    fn from(e: DomainError) -> Self {
        Halt::Failed(e)
    }
}

struct Emitter<'a> {
    sender: &'a SequenceSender,
    cancel: &'a CancelToken,
    emitted: usize,
}

impl Emitter<'_> {
    fn check(&self) -> Result<(), Halt> {
        if self.cancel.is_cancelled() {
            return Err(Halt::Cancelled);
        }
        Ok(())
    }

    fn emit(&mut self, value: i64) -> Result<(), Halt> {
        self.check()?;
        self.sender.send(value).map_err(|_| Halt::Cancelled)?;
        self.emitted += 1;
        trace!(value, "emitted");
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct Traverser {
    strategy: Strategy,
    max_depth: Option<usize>,
    cancel: CancelToken,
}

impl Traverser {
    pub fn new(settings: &Settings) -> Self {
        Self {
            strategy: settings.strategy,
            max_depth: settings.max_depth,
            cancel: CancelToken::new(),
        }
    }

    /// Observe `token` between steps instead of a private one.
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Emit every value of `tree` in in-order sequence, then close `sender`.
    ///
    /// The channel is closed exactly once on every path, including an empty
    /// tree, cancellation and a depth failure.
    #[instrument(level = "debug", skip_all, fields(strategy = %self.strategy))]
    pub fn walk(&self, tree: &Tree, sender: SequenceSender) -> Result<Walked, DomainError> {
        let mut emitter = Emitter {
            sender: &sender,
            cancel: &self.cancel,
            emitted: 0,
        };
        let result = match self.strategy {
            Strategy::Iterative => self.walk_iterative(tree.root(), &mut emitter),
            Strategy::Recursive => self.walk_recursive(tree.root(), 1, &mut emitter),
        };
        let emitted = emitter.emitted;
        sender.close();

        match result {
            Ok(()) => {
                debug!(emitted, "walk completed");
                Ok(Walked::Completed { emitted })
            }
            Err(Halt::Cancelled) => {
                debug!(emitted, "walk cancelled");
                Ok(Walked::Cancelled { emitted })
            }
            Err(Halt::Failed(e)) => {
                debug!(emitted, error = %e, "walk failed");
                Err(e)
            }
        }
    }

    fn enter(&self, depth: usize) -> Result<(), Halt> {
        match self.max_depth {
            Some(limit) if depth > limit => Err(DomainError::DepthExceeded { limit }.into()),
            _ => Ok(()),
        }
    }

    fn walk_iterative(&self, root: Option<&Node>, emitter: &mut Emitter<'_>) -> Result<(), Halt> {
        let mut stack: Vec<(&Node, usize)> = Vec::new();
        let mut current = root.map(|node| (node, 1));

        loop {
            while let Some((node, depth)) = current {
                self.enter(depth)?;
                emitter.check()?;
                stack.push((node, depth));
                current = node.left.as_deref().map(|left| (left, depth + 1));
            }
            let Some((node, depth)) = stack.pop() else {
                return Ok(());
            };
            emitter.emit(node.value)?;
            current = node.right.as_deref().map(|right| (right, depth + 1));
        }
    }

    fn walk_recursive(
        &self,
        node: Option<&Node>,
        depth: usize,
        emitter: &mut Emitter<'_>,
    ) -> Result<(), Halt> {
        let Some(node) = node else {
            return Ok(());
        };
        self.enter(depth)?;
        emitter.check()?;
        self.walk_recursive(node.left.as_deref(), depth + 1, emitter)?;
        emitter.emit(node.value)?;
        self.walk_recursive(node.right.as_deref(), depth + 1, emitter)
    }
}

/// Walk `tree` on a background thread; the caller drains the receiver.
pub fn walk_spawned(
    tree: Arc<Tree>,
    settings: &Settings,
) -> (SequenceReceiver, JoinHandle<Result<Walked, DomainError>>) {
    let (tx, rx) = sequence(settings.capacity);
    let traverser = Traverser::new(settings);
    let handle = thread::spawn(move || traverser.walk(&tree, tx));
    (rx, handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::channel::Received;
    use crate::config::Capacity;
    use rstest::rstest;

    fn settings(strategy: Strategy) -> Settings {
        Settings {
            strategy,
            capacity: Capacity::Unbounded,
            max_depth: None,
        }
    }

    #[rstest]
    #[case(Strategy::Iterative)]
    #[case(Strategy::Recursive)]
    fn test_walk_emits_in_order_and_closes(#[case] strategy: Strategy) {
        let tree = Tree::from_values([5, 2, 8, 1, 9, 3]);
        let (tx, rx) = sequence(Capacity::Unbounded);
        let walked = Traverser::new(&settings(strategy)).walk(&tree, tx).unwrap();
        assert_eq!(walked, Walked::Completed { emitted: 6 });
        assert_eq!(rx.collect::<Vec<_>>(), vec![1, 2, 3, 5, 8, 9]);
    }

    #[rstest]
    #[case(Strategy::Iterative)]
    #[case(Strategy::Recursive)]
    fn test_empty_tree_closes_without_values(#[case] strategy: Strategy) {
        let (tx, rx) = sequence(Capacity::Unbounded);
        let walked = Traverser::new(&settings(strategy))
            .walk(&Tree::empty(), tx)
            .unwrap();
        assert_eq!(walked, Walked::Completed { emitted: 0 });
        assert_eq!(rx.recv(), Received::Closed);
    }

    #[test]
    fn test_cancelled_token_stops_before_first_value() {
        let traverser = Traverser::new(&settings(Strategy::Iterative));
        traverser.cancel_token().cancel();
        let (tx, rx) = sequence(Capacity::Unbounded);
        let walked = traverser.walk(&Tree::from_values(1..=5), tx).unwrap();
        assert_eq!(walked, Walked::Cancelled { emitted: 0 });
        assert_eq!(rx.recv(), Received::Closed);
    }

    #[test]
    fn test_dropped_receiver_cancels_walk() {
        let (tx, rx) = sequence(Capacity::Bounded(2));
        drop(rx);
        let walked = Traverser::new(&settings(Strategy::Recursive))
            .walk(&Tree::from_values([2, 1, 3]), tx)
            .unwrap();
        assert_eq!(walked, Walked::Cancelled { emitted: 0 });
    }

    #[rstest]
    #[case(Strategy::Iterative)]
    #[case(Strategy::Recursive)]
    fn test_depth_guard_fails_and_closes(#[case] strategy: Strategy) {
        let mut settings = settings(strategy);
        settings.max_depth = Some(3);
        // right spine: 1 -> 2 -> 3 -> 4 -> 5
        let tree = Tree::from_values(1..=5);
        let (tx, rx) = sequence(Capacity::Unbounded);
        let err = Traverser::new(&settings).walk(&tree, tx).unwrap_err();
        assert_eq!(err, DomainError::DepthExceeded { limit: 3 });
        // values above the limit were emitted before the guard tripped
        assert_eq!(rx.collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_depth_guard_allows_tree_at_limit() {
        let mut settings = settings(Strategy::Iterative);
        settings.max_depth = Some(5);
        let (tx, rx) = sequence(Capacity::Unbounded);
        let walked = Traverser::new(&settings)
            .walk(&Tree::from_values(1..=5), tx)
            .unwrap();
        assert!(walked.is_completed());
        assert_eq!(rx.count(), 5);
    }

    #[test]
    fn test_walk_spawned_over_rendezvous() {
        let tree = Arc::new(Tree::from_values([4, 2, 6, 1, 3, 5, 7]));
        let (rx, handle) = walk_spawned(tree, &Settings::default());
        assert_eq!(rx.collect::<Vec<_>>(), (1..=7).collect::<Vec<_>>());
        assert_eq!(handle.join().unwrap().unwrap().emitted(), 7);
    }
}
