//! Operator input routing.
//!
//! A single [`InputRouter`] task owns the stdin pipes of all shards and the
//! current selection.

mod router;

pub use router::InputRouter;
