use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    Result,
    common::Vars,
    flow::{consts, render},
    runtime::ExecutionContext,
    tools::LlmRequest,
};

use super::{Action, ActionScope, NodeType, parse_params};

/// Language model call over the user input, enriched with upstream results.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LlmAction {
    /// falls back to the engine's default model
    #[serde(default)]
    model: Option<String>,
    #[serde(default = "default_temperature")]
    temperature: f64,
    #[serde(default)]
    system_prompt: Option<String>,
}

fn default_temperature() -> f64 {
    consts::DEFAULT_TEMPERATURE
}

impl LlmAction {
    /// Calculation context wins over search context when both are present.
    pub(crate) fn build_prompt(
        &self,
        ctx: &ExecutionContext,
    ) -> String {
        let input = ctx.input();
        let mut prompt = input.to_string();

        if let Some(results) = ctx.search_results().filter(|r| !r.is_empty()) {
            prompt = format!("{}\n\nUser query: {}", render::search_results_block(&results), input);
        }
        if let Some(calc) = ctx.calculation_result() {
            prompt = format!("Calculation: {}\n\nUser query: {}", render::calculation_line(&calc), input);
        }
        if let Some(system) = self.system_prompt.as_deref().filter(|s| !s.is_empty()) {
            prompt = format!("{}\n\n{}", system, prompt);
        }

        prompt
    }
}

#[async_trait]
impl Action for LlmAction {
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
                },
                "temperature": {
                    "type": "number",
                    "minimum": 0,
                    "maximum": 2
                },
                "systemPrompt": {
                    "type": "string",
                    "description": "Instructions placed before the prompt"
                }
            }
        })
    }

    fn node_type(&self) -> NodeType {
        NodeType::Llm
    }

    async fn run(
        &self,
        scope: &ActionScope<'_>,
        ctx: ExecutionContext,
    ) -> Result<ExecutionContext> {
        let model = self.model.as_deref().filter(|m| !m.is_empty()).unwrap_or(scope.default_model);
        let request = LlmRequest {
            model: model.to_string(),
            prompt: self.build_prompt(&ctx),
            temperature: self.temperature,
        };

        let reply = scope.tools.llm.invoke(request).await?;
        Ok(ctx.with(consts::LLM_RESPONSE, reply.content))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::flow::actions::testing::{self, RecordingLlm};

    fn action(params: serde_json::Value) -> LlmAction {
        LlmAction::create(&params.into()).unwrap()
    }

    #[test]
    fn test_defaults_and_validation() {
        let a = action(json!({}));
        assert_eq!(a.temperature, 0.7);
        assert!(a.model.is_none());

        assert!(LlmAction::create(&json!({"temperature": 3}).into()).is_err());
        assert!(LlmAction::create(&json!({"model": 42}).into()).is_err());
    }

    #[test]
    fn test_prompt_is_input_alone() {
        assert_eq!(action(json!({})).build_prompt(&ExecutionContext::new("hello")), "hello");
    }

    #[test]
    fn test_prompt_with_search_results() {
        let ctx = ExecutionContext::new("what is rust").with(consts::SEARCH_RESULTS, json!([{"title": "Rust", "snippet": "A language", "url": "u"}]));
        assert_eq!(
            action(json!({})).build_prompt(&ctx),
            "Search results:\n1. Rust\n   A language\n   Source: u\n\nUser query: what is rust"
        );

        // an empty result list adds nothing
        let ctx = ExecutionContext::new("q").with(consts::SEARCH_RESULTS, json!([]));
        assert_eq!(action(json!({})).build_prompt(&ctx), "q");
    }

    #[test]
    fn test_calculation_wins_over_search() {
        let ctx = ExecutionContext::new("2+2")
            .with(consts::SEARCH_RESULTS, json!([{"title": "t", "snippet": "", "url": ""}]))
            .with(consts::CALCULATION_RESULT, json!({"result": 4, "expression": "2+2"}));
        assert_eq!(action(json!({})).build_prompt(&ctx), "Calculation: 2+2 = 4\n\nUser query: 2+2");
    }

    #[test]
    fn test_system_prompt_prefix() {
        let ctx = ExecutionContext::new("hi");
        assert_eq!(action(json!({"systemPrompt": "Be brief."})).build_prompt(&ctx), "Be brief.\n\nhi");
        assert_eq!(action(json!({"systemPrompt": ""})).build_prompt(&ctx), "hi");
    }

    #[tokio::test]
    async fn test_invokes_adapter() {
        let llm = Arc::new(RecordingLlm::default());
        let graph = testing::graph(vec![("l", "llm", json!({"model": "m", "temperature": 0.5}))], vec![]);
        let tools = testing::tools(llm.clone());
        let scope = ActionScope {
            node: graph.node("l").unwrap(),
            graph: &graph,
            tools: &tools,
            default_model: "fallback",
        };

        let ctx = action(json!({"model": "m", "temperature": 0.5})).run(&scope, ExecutionContext::new("hello")).await.unwrap();
        assert_eq!(ctx.llm_response(), Some("reply:hello"));

        action(json!({})).run(&scope, ExecutionContext::new("again")).await.unwrap();

        let requests = llm.requests.lock().unwrap();
        assert_eq!(requests[0], LlmRequest {
            model: "m".to_string(),
            prompt: "hello".to_string(),
            temperature: 0.5,
        });
        assert_eq!(requests[1].model, "fallback");
        assert_eq!(requests[1].temperature, 0.7);
    }
}
