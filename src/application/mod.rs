//! Application layer: concurrent traversal and comparison
//!
//! Traversers produce in-order sequences over closable channels, the
//! comparator consumes two of them in lockstep.

pub mod cancel;
pub mod channel;
pub mod comparator;
pub mod error;
pub mod traverser;

pub use cancel::CancelToken;
pub use channel::{sequence, Disconnected, Received, SequenceReceiver, SequenceSender};
pub use comparator::{pair_step, same, Comparator, Comparison, Difference, Side, Verdict};
pub use error::{ApplicationError, ApplicationResult};
pub use traverser::{walk_spawned, Traverser, Walked};
