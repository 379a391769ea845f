use crate::model::NodeId;

#[derive(Debug, Clone, PartialEq)]
pub enum FlowEvent {
    Start {
        flow_id: String,
        /// All node ids of the flow, in declaration order
        node_ids: Vec<NodeId>,
    },
    Succeeded {
        elapsed_ms: i64,
    },
    Failed {
        error: String,
    },
    /// timed out or interrupted by engine shutdown
    Aborted {
        reason: String,
    },
}

impl FlowEvent {
    pub fn str(&self) -> &str {
        match self {
            FlowEvent::Start { .. } => "Running",
            FlowEvent::Succeeded { .. } => "Succeeded",
            FlowEvent::Failed { .. } => "Failed",
            FlowEvent::Aborted { .. } => "Aborted",
        }
    }
}
