//! Flow traversal.
//!
//! Walks the runtime graph breadth-first from its starting nodes, running
//! each node at most once and threading the execution context through the
//! node actions.

mod dispatcher;

pub use dispatcher::{Dispatcher, JoinPolicy, Traversal};
