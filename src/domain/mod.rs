//! Domain layer: the tree being walked
//!
//! This layer is independent of external concerns (no threads, no CLI, no config loading).

pub mod error;
pub mod tree;

pub use error::DomainError;
pub use tree::{InOrder, Link, Node, Tree, TOUR_SIZE};
