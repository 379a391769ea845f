use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    Result,
    common::Vars,
    flow::{FlowGraph, consts},
    model::NodeId,
    runtime::ExecutionContext,
    tools::LlmRequest,
};

use super::{Action, ActionScope, NodeType, parse_params};

/// Lists the tool nodes wired downstream of it and asks the model how to
/// answer with them. The tools themselves are not called.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AgentAction {
    #[serde(default)]
    model: Option<String>,
}

/// A downstream node the agent may mention as a tool.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentTool {
    pub node_id: NodeId,
    pub node_type: NodeType,
}

impl AgentTool {
    fn describe(&self) -> String {
        let description = match self.node_type {
            NodeType::Search => "Search the web for current information.",
            NodeType::Calculator => "Evaluate arithmetic expressions.",
            NodeType::Llm => "Generate text with a language model.",
            _ => "",
        };
        format!("- {} (node `{}`): {}", self.node_type, self.node_id, description)
    }
}

impl AgentAction {
    /// Tool nodes reachable over one outgoing edge, in edge order, each once.
    pub fn discover_tools(
        graph: &FlowGraph,
        nid: &str,
    ) -> Vec<AgentTool> {
        let mut tools: Vec<AgentTool> = Vec::new();
        for target in graph.successors(nid) {
            if tools.iter().any(|t| t.node_id == target) {
                continue;
            }
            let node_type = graph.node(&target).and_then(|n| NodeType::from_str(&n.node_type).ok());
            if let Some(node_type) = node_type.filter(NodeType::is_tool) {
                tools.push(AgentTool {
                    node_id: target,
                    node_type,
                });
            }
        }
        tools
    }

    pub(crate) fn build_prompt(
        tools: &[AgentTool],
        input: &str,
    ) -> String {
        let mut lines = vec!["You are an agent that answers user requests.".to_string()];
        if tools.is_empty() {
            lines.push("No tools are connected to you; answer from your own knowledge.".to_string());
        } else {
            lines.push("You can use the following tools:".to_string());
            lines.extend(tools.iter().map(AgentTool::describe));
        }
        lines.push(String::new());
        lines.push(format!("User request: {}", input));
        lines.push(String::new());
        lines.push("Explain which tools you would use and give your best answer.".to_string());
        lines.join("\n")
    }
}

#[async_trait]
impl Action for AgentAction {
    fn create(params: &Vars) -> Result<Self> {
        parse_params(params, &Self::schema())
    }

    fn schema() -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "model": {
                    "type": "string",
                    "description": "Model name passed to the provider"
                }
            }
        })
    }

    fn node_type(&self) -> NodeType {
        NodeType::Agent
    }

    async fn run(
        &self,
        scope: &ActionScope<'_>,
        ctx: ExecutionContext,
    ) -> Result<ExecutionContext> {
        let tools = Self::discover_tools(scope.graph, &scope.node.id);
        let model = self.model.as_deref().filter(|m| !m.is_empty()).unwrap_or(scope.default_model);
        let request = LlmRequest {
            model: model.to_string(),
            prompt: Self::build_prompt(&tools, ctx.input()),
            temperature: consts::AGENT_TEMPERATURE,
        };

        let reply = scope.tools.llm.invoke(request).await?;
        Ok(ctx.with(consts::AGENT_RESPONSE, reply.content))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::flow::actions::testing::{self, RecordingLlm};

    fn agent_graph() -> FlowGraph {
        testing::graph(
            vec![
                ("in", "chatInput", json!({})),
                ("agent", "agent", json!({"model": "planner"})),
                ("s", "search", json!({})),
                ("c", "calculator", json!({})),
                ("out", "chatOutput", json!({})),
            ],
            vec![("in", "agent"), ("agent", "s"), ("agent", "c"), ("agent", "out"), ("agent", "s")],
        )
    }

    #[test]
    fn test_discovers_tools_in_edge_order() {
        let tools = AgentAction::discover_tools(&agent_graph(), "agent");
        assert_eq!(
            tools,
            vec![
                AgentTool {
                    node_id: "s".to_string(),
                    node_type: NodeType::Search
                },
                AgentTool {
                    node_id: "c".to_string(),
                    node_type: NodeType::Calculator
                },
            ]
        );
    }

    #[test]
    fn test_prompt_without_tools() {
        let prompt = AgentAction::build_prompt(&[], "hi");
        assert!(prompt.contains("No tools are connected"));
        assert!(prompt.contains("User request: hi"));
    }

    #[tokio::test]
    async fn test_prompt_enumerates_tools() {
        let graph = agent_graph();
        let llm = Arc::new(RecordingLlm::default());
        let tools = testing::tools(llm.clone());
        let scope = ActionScope {
            node: graph.node("agent").unwrap(),
            graph: &graph,
            tools: &tools,
            default_model: "fallback",
        };

        let action = AgentAction::create(&graph.node("agent").unwrap().data).unwrap();
        let ctx = action.run(&scope, ExecutionContext::new("weather and 2+2")).await.unwrap();
        assert!(ctx.agent_response().unwrap().starts_with("reply:"));

        let requests = llm.requests.lock().unwrap();
        let request = &requests[0];
        assert_eq!(request.model, "planner");
        assert_eq!(request.temperature, 0.7);
        assert!(request.prompt.contains("- search (node `s`): Search the web for current information."));
        assert!(request.prompt.contains("- calculator (node `c`): Evaluate arithmetic expressions."));
        assert!(!request.prompt.contains("chatOutput"));
        assert!(request.prompt.contains("User request: weather and 2+2"));
    }
}
