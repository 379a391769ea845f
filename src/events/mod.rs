//! Event types for flow execution.
//!
//! Events are emitted while a flow runs to notify subscribers about node
//! progress and about how the execution ended.

mod flow;
mod node;

pub use flow::*;
pub use node::*;

use crate::{model::NodeId, runtime::ExecutionId};

/// Generic event wrapper.
#[derive(Debug, Clone)]
pub struct Event<T> {
    inner: T,
}

/// Top-level event type for flow graph events.
#[derive(Debug, Clone)]
pub enum GraphEvent {
    /// Flow-level events (start, succeeded, failed, aborted).
    Flow(FlowEvent),
    /// Node-level events (running, succeeded, skipped, error).
    Node(NodeEvent),
}

/// Event message containing execution and node context.
#[derive(Debug, Clone)]
pub struct Message {
    /// Execution that generated this event.
    pub eid: ExecutionId,
    /// Node that generated this event (empty for flow events).
    pub nid: NodeId,
    /// The actual event data.
    pub event: GraphEvent,
}

impl<T> std::ops::Deref for Event<T>
where
    T: std::fmt::Debug + Clone,
{
    type Target = T;
    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<T> Event<T>
where
    T: std::fmt::Debug + Clone,
{
    pub fn new(inner: &T) -> Self {
        Self {
            inner: inner.clone(),
        }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }
}

impl GraphEvent {
    pub fn is_complete(&self) -> bool {
        matches!(self, GraphEvent::Flow(FlowEvent::Succeeded { .. }))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, GraphEvent::Flow(FlowEvent::Failed { .. } | FlowEvent::Aborted { .. }))
    }

    pub fn str(&self) -> &str {
        match self {
            GraphEvent::Flow(e) => e.str(),
            GraphEvent::Node(e) => e.str(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_and_error_kinds() {
        let done = GraphEvent::Flow(FlowEvent::Succeeded {
            elapsed_ms: 3,
        });
        assert!(done.is_complete());
        assert!(!done.is_error());

        let failed = GraphEvent::Flow(FlowEvent::Failed {
            error: "boom".into(),
        });
        assert!(failed.is_error());

        let aborted = GraphEvent::Flow(FlowEvent::Aborted {
            reason: "engine shut down".into(),
        });
        assert!(aborted.is_error());

        let node = GraphEvent::Node(NodeEvent::Error("boom".into()));
        assert!(!node.is_error());
        assert_eq!(node.str(), "Error");
    }
}
