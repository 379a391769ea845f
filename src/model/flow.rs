use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    AgentflowError, Result,
    model::{EdgeModel, NodeId, NodeModel},
    utils,
};

/// Lifecycle status of a flow.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, strum::AsRefStr, strum::EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FlowStatus {
    #[default]
    Draft,
    Published,
}

/// Serialized flow definition: metadata plus the node/edge graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowModel {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub creator: String,
    #[serde(default)]
    pub status: FlowStatus,
    /// creation time in milliseconds
    #[serde(default)]
    pub created_at: i64,
    /// last update time in milliseconds
    #[serde(default)]
    pub updated_at: i64,
    #[serde(default)]
    pub nodes: Vec<NodeModel>,
    #[serde(default)]
    pub edges: Vec<EdgeModel>,
}

/// Fields accepted when creating a flow; id, status and timestamps are generated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowDraft {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub creator: String,
    #[serde(default)]
    pub nodes: Vec<NodeModel>,
    #[serde(default)]
    pub edges: Vec<EdgeModel>,
}

/// Partial update; `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub nodes: Option<Vec<NodeModel>>,
    #[serde(default)]
    pub edges: Option<Vec<EdgeModel>>,
}

impl FlowModel {
    /// Creates a new draft flow with a generated id.
    pub fn create(draft: FlowDraft) -> Self {
        let now = utils::time::time_millis();
        Self {
            id: utils::longid(),
            name: draft.name,
            description: draft.description,
            creator: draft.creator,
            status: FlowStatus::Draft,
            created_at: now,
            updated_at: now,
            nodes: draft.nodes,
            edges: draft.edges,
        }
    }

    pub fn from_json(s: &str) -> Result<Self> {
        serde_json::from_str::<FlowModel>(s).map_err(|e| AgentflowError::Convert(format!("invalid flow: {}", e)))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value::<FlowModel>(value).map_err(|e| AgentflowError::Convert(format!("invalid flow: {}", e)))
    }

    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Checks the structural invariants, reporting the first violation.
    ///
    /// Order: dangling edge endpoints, duplicate node ids, missing starting node.
    pub fn validate(&self) -> Result<()> {
        let ids: HashSet<&str> = self.nodes.iter().map(|n| n.id.as_str()).collect();

        for edge in self.edges.iter() {
            if !ids.contains(edge.source.as_str()) {
                return Err(AgentflowError::Structural(format!(
                    "edge {} references unknown source node '{}'",
                    edge.label(),
                    edge.source
                )));
            }
            if !ids.contains(edge.target.as_str()) {
                return Err(AgentflowError::Structural(format!(
                    "edge {} references unknown target node '{}'",
                    edge.label(),
                    edge.target
                )));
            }
        }

        let mut seen = HashSet::with_capacity(self.nodes.len());
        for node in self.nodes.iter() {
            if !seen.insert(node.id.as_str()) {
                return Err(AgentflowError::Structural(format!("duplicate node id '{}'", node.id)));
            }
        }

        if self.starting_nodes().is_empty() {
            return Err(AgentflowError::Structural("flow has no starting node (every node has an incoming edge)".to_string()));
        }

        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Ids of nodes without an incoming edge, in node order.
    pub fn starting_nodes(&self) -> Vec<NodeId> {
        let targets: HashSet<&str> = self.edges.iter().map(|e| e.target.as_str()).collect();
        self.nodes.iter().filter(|n| !targets.contains(n.id.as_str())).map(|n| n.id.clone()).collect()
    }

    pub fn node(
        &self,
        id: &str,
    ) -> Option<&NodeModel> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Marks the flow published. Callers validate first.
    pub fn publish(&mut self) {
        self.status = FlowStatus::Published;
        self.updated_at = utils::time::time_millis();
    }

    pub fn unpublish(&mut self) {
        self.status = FlowStatus::Draft;
        self.updated_at = utils::time::time_millis();
    }

    pub fn is_published(&self) -> bool {
        self.status == FlowStatus::Published
    }

    /// Replaces the fields present in `update`.
    pub fn apply(
        &mut self,
        update: FlowUpdate,
    ) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(nodes) = update.nodes {
            self.nodes = nodes;
        }
        if let Some(edges) = update.edges {
            self.edges = edges;
        }
        self.updated_at = utils::time::time_millis();
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn node(id: &str) -> NodeModel {
        NodeModel::new(id, "llm", json!({}))
    }

    fn flow(
        nodes: &[&str],
        edges: &[(&str, &str)],
    ) -> FlowModel {
        FlowModel {
            id: "f1".to_string(),
            name: "test".to_string(),
            nodes: nodes.iter().map(|id| node(id)).collect(),
            edges: edges.iter().map(|(s, t)| EdgeModel::new(*s, *t)).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_linear_flow() {
        let f = flow(&["in", "llm", "out"], &[("in", "llm"), ("llm", "out")]);
        assert!(f.validate().is_ok());
        assert_eq!(f.starting_nodes(), vec!["in".to_string()]);
    }

    #[test]
    fn test_dangling_edge() {
        let f = flow(&["a", "b"], &[("a", "b"), ("b", "ghost")]);
        let err = f.validate().unwrap_err();
        assert!(matches!(err, AgentflowError::Structural(_)));
        assert!(err.to_string().contains("ghost"));

        let f = flow(&["a"], &[("ghost", "a")]);
        assert!(f.validate().unwrap_err().to_string().contains("unknown source node 'ghost'"));
    }

    #[test]
    fn test_duplicate_node_id() {
        let f = flow(&["a", "b", "a"], &[("a", "b")]);
        let err = f.validate().unwrap_err();
        assert_eq!(err, AgentflowError::Structural("duplicate node id 'a'".to_string()));
    }

    #[test]
    fn test_no_starting_node() {
        let f = flow(&["a", "b"], &[("a", "b"), ("b", "a")]);
        assert!(f.validate().unwrap_err().to_string().contains("no starting node"));

        let empty = flow(&[], &[]);
        assert!(!empty.is_valid());
    }

    #[test]
    fn test_first_violation_wins() {
        // dangling edge is reported before the duplicate id
        let f = flow(&["a", "a"], &[("a", "missing")]);
        assert!(f.validate().unwrap_err().to_string().contains("missing"));
    }

    #[test]
    fn test_validity_matches_definition_for_all_small_graphs() {
        let ids = ["a", "b", "c"];
        let pairs: Vec<(&str, &str)> = ids.iter().flat_map(|s| ids.iter().map(move |t| (*s, *t))).collect();

        for mask in 0u32..(1 << pairs.len()) {
            let edges: Vec<(&str, &str)> = pairs.iter().enumerate().filter(|(i, _)| mask & (1u32 << *i) != 0).map(|(_, p)| *p).collect();
            let f = flow(&ids, &edges);
            let has_start = ids.iter().any(|id| !edges.iter().any(|(_, t)| t == id));
            assert_eq!(f.is_valid(), has_start, "edges: {:?}", edges);

            let mut dangling = f.clone();
            dangling.edges.push(EdgeModel::new("a", "zz"));
            assert!(!dangling.is_valid());

            let mut duplicated = f.clone();
            duplicated.nodes.push(node("b"));
            assert!(!duplicated.is_valid());
        }
    }

    #[test]
    fn test_round_trip_preserves_everything() {
        let text = r#"{
            "id": "flow-1",
            "name": "Support bot",
            "description": "answers questions",
            "creator": "alice",
            "status": "published",
            "createdAt": 1700000000000,
            "updatedAt": 1700000000500,
            "nodes": [
                {"id": "in", "type": "chatInput", "position": {"x": 10, "y": 20}},
                {"id": "llm", "type": "llm", "data": {"model": "m", "temperature": 0.5}},
                {"id": "x", "type": "webhook", "data": {"url": "http://example.com"}}
            ],
            "edges": [
                {"id": "e1", "source": "in", "target": "llm", "animated": true},
                {"source": "llm", "target": "x", "sourceHandle": "out"}
            ]
        }"#;

        let original = FlowModel::from_json(text).unwrap();
        assert_eq!(original.status, FlowStatus::Published);
        assert_eq!(original.nodes[0].extra["position"], json!({"x": 10, "y": 20}));
        assert_eq!(original.edges[1].source_handle.as_deref(), Some("out"));

        let restored = FlowModel::from_value(original.to_value().unwrap()).unwrap();
        assert_eq!(restored, original);
        assert_eq!(restored.is_valid(), original.is_valid());

        let restored = FlowModel::from_json(&original.to_json().unwrap()).unwrap();
        assert_eq!(restored, original);
    }

    #[test]
    fn test_round_trip_keeps_invalid_flows_invalid() {
        let f = flow(&["a", "b"], &[("a", "b"), ("b", "a")]);
        let restored = FlowModel::from_json(&f.to_json().unwrap()).unwrap();
        assert_eq!(restored, f);
        assert_eq!(restored.validate(), f.validate());
    }

    #[test]
    fn test_lifecycle() {
        let mut f = FlowModel::create(FlowDraft {
            name: "draft".to_string(),
            creator: "bob".to_string(),
            ..Default::default()
        });
        assert!(!f.id.is_empty());
        assert_eq!(f.status, FlowStatus::Draft);

        f.publish();
        assert!(f.is_published());
        f.unpublish();
        assert_eq!(f.status, FlowStatus::Draft);
    }

    #[test]
    fn test_apply_update() {
        let mut f = flow(&["a"], &[]);
        f.apply(FlowUpdate {
            name: Some("renamed".to_string()),
            nodes: Some(vec![node("x"), node("y")]),
            edges: Some(vec![EdgeModel::new("x", "y")]),
            ..Default::default()
        });

        assert_eq!(f.name, "renamed");
        assert_eq!(f.description, "");
        assert_eq!(f.nodes.len(), 2);
        assert_eq!(f.starting_nodes(), vec!["x".to_string()]);
    }

    #[test]
    fn test_invalid_json() {
        let err = FlowModel::from_json("{\"nodes\": 3}").unwrap_err();
        assert!(matches!(err, AgentflowError::Convert(_)));
    }
}
