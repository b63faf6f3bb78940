//! Owned binary tree of integers.
//!
//! Nodes are boxed, so a tree cannot contain a cycle. Every whole-tree
//! operation that may run on a degenerate (list-like) tree uses an explicit
//! stack instead of recursion, including `Drop`.

use std::fmt;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::instrument;

/// Number of values in a tree built by [`Tree::tour`].
pub const TOUR_SIZE: i64 = 10;

/// Child link, `None` is an empty subtree.
pub type Link = Option<Box<Node>>;

/// One tree position, reached through [`Tree::root`].
///
/// Only [`Tree`]'s whole-tree operations are stack-safe. `Node` has no
/// `Clone` or `PartialEq`, and its `Debug` output stops at the children's
/// values. A detached `Box<Node>` chain still drops recursively.
pub struct Node {
    pub value: i64,
    pub left: Link,
    pub right: Link,
}

impl Node {
    pub fn new(value: i64) -> Self {
        Self {
            value,
            left: None,
            right: None,
        }
    }
}

/// Binary tree, possibly empty.
#[derive(Default)]
pub struct Tree {
    root: Link,
}

impl Tree {
    pub fn empty() -> Self {
        Self { root: None }
    }

    pub fn leaf(value: i64) -> Self {
        Self {
            root: Some(Box::new(Node::new(value))),
        }
    }

    /// Joins two subtrees under a new root holding `value`.
    pub fn node(mut left: Tree, value: i64, mut right: Tree) -> Self {
        Self {
            root: Some(Box::new(Node {
                value,
                left: left.root.take(),
                right: right.root.take(),
            })),
        }
    }

    /// Builds a binary search tree by inserting `values` in iteration order.
    pub fn from_values<I: IntoIterator<Item = i64>>(values: I) -> Self {
        let mut tree = Self::empty();
        for value in values {
            tree.insert(value);
        }
        tree
    }

    /// Builds the tree holding `k, 2k, ..., 10k`, inserted in a random order.
    ///
    /// The shape depends on `rng`, the in-order sequence never does.
    #[instrument(level = "debug", skip(rng))]
    pub fn tour<R: Rng + ?Sized>(k: i64, rng: &mut R) -> Self {
        let mut order: Vec<i64> = (1..=TOUR_SIZE).collect();
        order.shuffle(rng);
        Self::from_values(order.into_iter().map(|v| v * k))
    }

    /// Binary-search-tree insert. Equal values go right.
    pub fn insert(&mut self, value: i64) {
        let mut link = &mut self.root;
        while let Some(node) = link {
            link = if value < node.value {
                &mut node.left
            } else {
                &mut node.right
            };
        }
        *link = Some(Box::new(Node::new(value)));
    }

    pub fn root(&self) -> Option<&Node> {
        self.root.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Number of levels, 0 for an empty tree.
    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack: Vec<(&Node, usize)> = self.root().map(|n| (n, 1)).into_iter().collect();

        while let Some((node, depth)) = stack.pop() {
            max_depth = max_depth.max(depth);
            for child in [node.left.as_deref(), node.right.as_deref()].into_iter().flatten() {
                stack.push((child, depth + 1));
            }
        }

        max_depth
    }

    /// Same shape, every value passed through `f` (applied in post-order).
    pub fn map<F: FnMut(i64) -> i64>(&self, mut f: F) -> Tree {
        let mut work: Vec<(&Node, bool)> = self.root().map(|n| (n, false)).into_iter().collect();
        let mut built: Vec<Box<Node>> = Vec::new();

        while let Some((node, expanded)) = work.pop() {
            if expanded {
                // right subtree was finished last, so it sits on top
                let right = node.right.as_ref().and_then(|_| built.pop());
                let left = node.left.as_ref().and_then(|_| built.pop());
                built.push(Box::new(Node {
                    value: f(node.value),
                    left,
                    right,
                }));
            } else {
                work.push((node, true));
                work.extend(node.right.as_deref().map(|r| (r, false)));
                work.extend(node.left.as_deref().map(|l| (l, false)));
            }
        }

        Tree { root: built.pop() }
    }

    pub fn iter(&self) -> InOrder<'_> {
        InOrder::new(self.root())
    }

    /// Shape rendering for terminal output; missing children show as `·`.
    ///
    /// Recurses once per level, unlike the other whole-tree operations.
    pub fn to_termtree(&self) -> termtree::Tree<String> {
        fn render(node: &Node) -> termtree::Tree<String> {
            let label = node.value.to_string();
            if node.left.is_none() && node.right.is_none() {
                return termtree::Tree::new(label);
            }
            let leaves = [&node.left, &node.right]
                .into_iter()
                .map(|child| match child {
                    Some(child) => render(child),
                    None => termtree::Tree::new("·".to_string()),
                })
                .collect::<Vec<_>>();
            termtree::Tree::new(label).with_leaves(leaves)
        }

        match self.root() {
            Some(root) => render(root),
            None => termtree::Tree::new("(empty)".to_string()),
        }
    }
}

impl Drop for Tree {
    fn drop(&mut self) {
        let mut stack: Vec<Box<Node>> = self.root.take().into_iter().collect();
        while let Some(mut node) = stack.pop() {
            stack.extend(node.left.take());
            stack.extend(node.right.take());
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("value", &self.value)
            .field("left", &self.left.as_ref().map(|n| n.value))
            .field("right", &self.right.as_ref().map(|n| n.value))
            .finish()
    }
}

impl fmt::Debug for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tree")
            .field("values", &self.iter().collect::<Vec<_>>())
            .field("depth", &self.depth())
            .finish()
    }
}

impl Clone for Tree {
    fn clone(&self) -> Self {
        self.map(|v| v)
    }
}

/// Structural equality: same shape and same value at every position.
impl PartialEq for Tree {
    fn eq(&self, other: &Self) -> bool {
        let mut stack = vec![(self.root(), other.root())];
        while let Some(pair) = stack.pop() {
            match pair {
                (None, None) => {}
                (Some(a), Some(b)) if a.value == b.value => {
                    stack.push((a.left.as_deref(), b.left.as_deref()));
                    stack.push((a.right.as_deref(), b.right.as_deref()));
                }
                _ => return false,
            }
        }
        true
    }
}

impl Eq for Tree {}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_termtree())
    }
}

impl FromIterator<i64> for Tree {
    fn from_iter<I: IntoIterator<Item = i64>>(iter: I) -> Self {
        Self::from_values(iter)
    }
}

impl<'a> IntoIterator for &'a Tree {
    type Item = i64;
    type IntoIter = InOrder<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// In-order iterator over tree values, driven by an explicit stack.
pub struct InOrder<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> InOrder<'a> {
    fn new(root: Option<&'a Node>) -> Self {
        let mut iter = Self { stack: Vec::new() };
        iter.push_left_spine(root);
        iter
    }

    fn push_left_spine(&mut self, mut current: Option<&'a Node>) {
        while let Some(node) = current {
            self.stack.push(node);
            current = node.left.as_deref();
        }
    }
}

impl Iterator for InOrder<'_> {
    type Item = i64;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.push_left_spine(node.right.as_deref());
        Some(node.value)
    }
}
