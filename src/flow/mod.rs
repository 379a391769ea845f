pub mod actions;
pub mod consts;
mod graph;
mod render;

pub use actions::NodeType;
pub use graph::FlowGraph;
