pub mod agent;
pub mod calculator;
pub mod chat_input;
pub mod chat_output;
pub mod llm;
pub mod search;

use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{
    AgentflowError, Result,
    common::Vars,
    flow::FlowGraph,
    model::NodeModel,
    runtime::ExecutionContext,
    tools::Tools,
};

pub use agent::{AgentAction, AgentTool};
pub use calculator::CalculatorAction;
pub use chat_input::ChatInputAction;
pub use chat_output::ChatOutputAction;
pub use llm::LlmAction;
pub use search::SearchAction;

/// The closed set of node type tags understood by the engine.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, strum::AsRefStr, strum::EnumString, strum::Display)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum NodeType {
    ChatInput,
    ChatOutput,
    Llm,
    Search,
    Calculator,
    Agent,
}

impl NodeType {
    /// Node types an agent can list as tools.
    pub fn is_tool(&self) -> bool {
        matches!(self, NodeType::Llm | NodeType::Search | NodeType::Calculator)
    }
}

/// Everything an action may read besides the context it transforms.
pub struct ActionScope<'a> {
    /// the node being executed
    pub node: &'a NodeModel,
    /// the whole flow, for actions that look at their neighbours
    pub graph: &'a FlowGraph,
    pub tools: &'a Tools,
    /// model used when a node does not configure one
    pub default_model: &'a str,
}

#[async_trait]
pub trait Action: Send + Sync {
    /// Creates a new instance of the action from the node configuration.
    ///
    /// # Arguments
    ///
    /// * `params` - The node's `data` mapping.
    ///
    /// # Returns
    ///
    /// Returns a [`Result`] containing the created action instance.
    fn create(params: &Vars) -> Result<Self>
    where
        Self: Sized;

    /// Returns the JSON schema the node configuration must satisfy.
    fn schema() -> serde_json::Value
    where
        Self: Sized;

    /// Returns the type of the action.
    fn node_type(&self) -> NodeType;

    /// Executes the action, returning the context extended with its output field.
    ///
    /// # Arguments
    ///
    /// * `scope` - The node, flow graph and tool adapters.
    /// * `ctx` - The [`ExecutionContext`] accumulated so far.
    async fn run(
        &self,
        scope: &ActionScope<'_>,
        ctx: ExecutionContext,
    ) -> Result<ExecutionContext>;
}

/// Validates `params` against `schema` and deserializes them.
pub(crate) fn parse_params<T: DeserializeOwned>(
    params: &Vars,
    schema: &serde_json::Value,
) -> Result<T> {
    let instance: serde_json::Value = params.clone().into();
    jsonschema::validate(schema, &instance)?;
    serde_json::from_value::<T>(instance).map_err(|e| AgentflowError::Node(e.to_string()))
}

/// A node's action, one variant per [`NodeType`].
#[derive(Debug, Clone)]
pub enum NodeAction {
    ChatInput(ChatInputAction),
    ChatOutput(ChatOutputAction),
    Llm(LlmAction),
    Search(SearchAction),
    Calculator(CalculatorAction),
    Agent(AgentAction),
}

impl NodeAction {
    /// Resolves the node's type tag and parses its configuration.
    pub fn create(node: &NodeModel) -> Result<Self> {
        let node_type = NodeType::from_str(&node.node_type).map_err(|_| AgentflowError::NodeType {
            node_id: node.id.clone(),
            node_type: node.node_type.clone(),
        })?;

        let params = &node.data;
        let action = match node_type {
            NodeType::ChatInput => ChatInputAction::create(params).map(NodeAction::ChatInput),
            NodeType::ChatOutput => ChatOutputAction::create(params).map(NodeAction::ChatOutput),
            NodeType::Llm => LlmAction::create(params).map(NodeAction::Llm),
            NodeType::Search => SearchAction::create(params).map(NodeAction::Search),
            NodeType::Calculator => CalculatorAction::create(params).map(NodeAction::Calculator),
            NodeType::Agent => AgentAction::create(params).map(NodeAction::Agent),
        };

        action.map_err(|e| AgentflowError::Node(format!("invalid configuration for node '{}': {}", node.id, e)))
    }

    pub fn node_type(&self) -> NodeType {
        match self {
            NodeAction::ChatInput(a) => a.node_type(),
            NodeAction::ChatOutput(a) => a.node_type(),
            NodeAction::Llm(a) => a.node_type(),
            NodeAction::Search(a) => a.node_type(),
            NodeAction::Calculator(a) => a.node_type(),
            NodeAction::Agent(a) => a.node_type(),
        }
    }

    pub async fn run(
        &self,
        scope: &ActionScope<'_>,
        ctx: ExecutionContext,
    ) -> Result<ExecutionContext> {
        match self {
            NodeAction::ChatInput(a) => a.run(scope, ctx).await,
            NodeAction::ChatOutput(a) => a.run(scope, ctx).await,
            NodeAction::Llm(a) => a.run(scope, ctx).await,
            NodeAction::Search(a) => a.run(scope, ctx).await,
            NodeAction::Calculator(a) => a.run(scope, ctx).await,
            NodeAction::Agent(a) => a.run(scope, ctx).await,
        }
    }
}
