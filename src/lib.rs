//! Concurrent in-order tree walks and lockstep equivalence checking.
//!
//! Two [`Traverser`]s stream the in-order values of two trees over closable
//! channels; the [`Comparator`] pairs them up and stops at the first
//! difference, cancelling whatever walk is still running.
//!
//! ```
//! use treewalk::{same, Tree};
//!
//! let a = Tree::from_values([2, 1, 3]);
//! let b = Tree::from_values([1, 2, 3]);
//! assert!(same(&a, &b));
//! ```

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod util;

pub use application::{
    same, walk_spawned, ApplicationError, CancelToken, Comparator, Comparison, Difference,
    Traverser, Verdict, Walked,
};
pub use config::{Capacity, Settings, Strategy};
pub use domain::{DomainError, Tree};
