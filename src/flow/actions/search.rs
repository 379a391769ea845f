use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    Result,
    common::Vars,
    flow::consts,
    runtime::ExecutionContext,
    tools::SearchRequest,
};

use super::{Action, ActionScope, NodeType, parse_params};

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SearchAction {
    #[serde(default = "default_engine")]
    engine: String,
    #[serde(default = "default_result_count")]
    result_count: u32,
}

fn default_engine() -> String {
    consts::DEFAULT_SEARCH_ENGINE.to_string()
}

fn default_result_count() -> u32 {
    consts::DEFAULT_RESULT_COUNT
}

#[async_trait]
impl Action for SearchAction {
    fn create(params: &Vars) -> Result<Self> {
        parse_params(params, &Self::schema())
    }

    fn schema() -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "engine": {
                    "type": "string",
                    "description": "Search engine name"
                },
                "resultCount": {
                    "type": "integer",
                    "minimum": 1,
                    "maximum": consts::MAX_RESULT_COUNT,
                    "description": "Number of results to request"
                }
            }
        })
    }

    fn node_type(&self) -> NodeType {
        NodeType::Search
    }

    async fn run(
        &self,
        scope: &ActionScope<'_>,
        ctx: ExecutionContext,
    ) -> Result<ExecutionContext> {
        let request = SearchRequest {
            engine: self.engine.clone(),
            query: ctx.input().to_string(),
            result_count: self.result_count,
        };
        let results = scope.tools.search.search(request).await?;
        Ok(ctx.with(consts::SEARCH_RESULTS, serde_json::to_value(results)?))
    }
}
