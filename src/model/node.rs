use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::common::Vars;

/// node id
pub type NodeId = String;

/// Serialized node as produced by the flow editor.
///
/// `node_type` stays a plain string here: an unknown tag is only an error once
/// the engine tries to dispatch the node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeModel {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub node_type: String,
    /// type specific configuration (model, temperature, format, ...)
    #[serde(default)]
    pub data: Vars,
    /// editor-only fields such as `position`, kept verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NodeModel {
    pub fn new(
        id: impl Into<NodeId>,
        node_type: impl Into<String>,
        data: Value,
    ) -> Self {
        Self {
            id: id.into(),
            node_type: node_type.into(),
            data: Vars::from(data),
            extra: Map::new(),
        }
    }
}
