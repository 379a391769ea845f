#[derive(Debug, Clone, PartialEq)]
pub enum NodeEvent {
    /// started at, in milliseconds
    Running(i64),
    /// finished at, in milliseconds
    Succeeded(i64),
    /// the node id could not be resolved
    Skipped(String),
    Error(String),
}

impl NodeEvent {
    pub fn str(&self) -> &str {
        match self {
            NodeEvent::Running(_) => "Running",
            NodeEvent::Succeeded(_) => "Succeeded",
            NodeEvent::Skipped(_) => "Skipped",
            NodeEvent::Error(_) => "Error",
        }
    }
}
