use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    Result,
    common::Vars,
    flow::{consts, render},
    runtime::{ExecutionContext, FlowResponse},
};

use super::{Action, ActionScope, NodeType, parse_params};

/// Terminal node: turns whatever the flow produced into `finalOutput`.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ChatOutputAction {
    /// text, markdown or html; unknown formats pass through
    #[serde(default = "default_format")]
    format: String,
}

fn default_format() -> String {
    consts::FORMAT_TEXT.to_string()
}

impl ChatOutputAction {
    /// First non-empty output in priority order.
    fn pick_text(ctx: &ExecutionContext) -> String {
        if let Some(text) = ctx.agent_response().filter(|s| !s.is_empty()) {
            return text.to_string();
        }
        if let Some(text) = ctx.llm_response().filter(|s| !s.is_empty()) {
            return text.to_string();
        }
        if let Some(results) = ctx.search_results().filter(|r| !r.is_empty()) {
            return render::search_results_block(&results);
        }
        if let Some(calc) = ctx.calculation_result() {
            return render::calculation_line(&calc);
        }
        consts::NO_RESPONSE.to_string()
    }

    fn wrap(
        &self,
        text: String,
    ) -> String {
        match self.format.as_str() {
            consts::FORMAT_MARKDOWN => format!("```\n{}\n```", text),
            consts::FORMAT_HTML => format!("<div>{}</div>", text),
            _ => text,
        }
    }
}

#[async_trait]
impl Action for ChatOutputAction {
    fn create(params: &Vars) -> Result<Self> {
        parse_params(params, &Self::schema())
    }

    fn schema() -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "format": {
                    "type": "string",
                    "description": "Output format: text, markdown or html"
                }
            }
        })
    }

    fn node_type(&self) -> NodeType {
        NodeType::ChatOutput
    }

    async fn run(
        &self,
        _: &ActionScope<'_>,
        ctx: ExecutionContext,
    ) -> Result<ExecutionContext> {
        let content = self.wrap(Self::pick_text(&ctx));
        let output = FlowResponse::new(content, self.format.clone());
        Ok(ctx.with(consts::FINAL_OUTPUT, serde_json::to_value(output)?))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::flow::actions::testing;

    async fn run(
        params: serde_json::Value,
        ctx: ExecutionContext,
    ) -> FlowResponse {
        let graph = testing::graph(vec![("out", "chatOutput", params.clone())], vec![]);
        let tools = testing::tools(Arc::default());
        let scope = ActionScope {
            node: graph.node("out").unwrap(),
            graph: &graph,
            tools: &tools,
            default_model: "m",
        };
        let action = ChatOutputAction::create(&params.into()).unwrap();
        action.run(&scope, ctx).await.unwrap().final_output().unwrap()
    }

    #[tokio::test]
    async fn test_priority() {
        let base = ExecutionContext::new("q")
            .with(consts::SEARCH_RESULTS, json!([{"title": "T", "snippet": "S", "url": "U"}]))
            .with(consts::CALCULATION_RESULT, json!({"result": 4, "expression": "2+2"}));

        let out = run(json!({}), base.clone()).await;
        assert_eq!(out.content, "Search results:\n1. T\n   S\n   Source: U");

        let with_llm = base.clone().with(consts::LLM_RESPONSE, "from llm");
        assert_eq!(run(json!({}), with_llm.clone()).await.content, "from llm");

        let with_agent = with_llm.with(consts::AGENT_RESPONSE, "from agent");
        assert_eq!(run(json!({}), with_agent).await.content, "from agent");

        // empty strings do not count as output
        let empty_llm = ExecutionContext::new("q").with(consts::LLM_RESPONSE, "").with(consts::CALCULATION_RESULT, json!({"result": 4, "expression": "2+2"}));
        assert_eq!(run(json!({}), empty_llm).await.content, "2+2 = 4");
    }

    #[tokio::test]
    async fn test_nothing_to_show() {
        let out = run(json!({}), ExecutionContext::new("q")).await;
        assert_eq!(out, FlowResponse::text("No response generated."));
    }

    #[tokio::test]
    async fn test_formats() {
        let ctx = ExecutionContext::new("q").with(consts::LLM_RESPONSE, "hi");

        assert_eq!(run(json!({"format": "markdown"}), ctx.clone()).await, FlowResponse::new("```\nhi\n```", "markdown"));
        assert_eq!(run(json!({"format": "html"}), ctx.clone()).await, FlowResponse::new("<div>hi</div>", "html"));
        assert_eq!(run(json!({"format": "pdf"}), ctx.clone()).await, FlowResponse::new("hi", "pdf"));
        assert_eq!(run(json!({}), ctx).await, FlowResponse::text("hi"));
    }
}
