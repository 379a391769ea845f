use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::model::NodeId;

/// Serialized directed connection between two nodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeModel {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub source: NodeId,
    pub target: NodeId,
    /// distinguishes several outputs of one node, e.g. an agent's tool slots
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EdgeModel {
    pub fn new(
        source: impl Into<NodeId>,
        target: impl Into<NodeId>,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            ..Default::default()
        }
    }

    pub fn with_id(
        mut self,
        id: impl Into<String>,
    ) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_handle(
        mut self,
        handle: impl Into<String>,
    ) -> Self {
        self.source_handle = Some(handle.into());
        self
    }

    /// Human readable name used in error messages.
    pub fn label(&self) -> String {
        if self.id.is_empty() {
            format!("{} -> {}", self.source, self.target)
        } else {
            format!("'{}' ({} -> {})", self.id, self.source, self.target)
        }
    }
}
