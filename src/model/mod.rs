mod edge;
mod flow;
mod node;

pub use edge::EdgeModel;
pub use flow::{FlowDraft, FlowModel, FlowStatus, FlowUpdate};
pub use node::{NodeId, NodeModel};
