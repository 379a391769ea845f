use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{Result, flow::consts};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub engine: String,
    pub query: String,
    pub result_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    #[serde(default)]
    pub snippet: String,
    #[serde(default)]
    pub url: String,
}

#[async_trait]
pub trait SearchAdapter: Send + Sync {
    async fn search(
        &self,
        request: SearchRequest,
    ) -> Result<Vec<SearchResult>>;
}

/// Produces `result_count` synthetic results derived from the query, at most
/// [`MAX_RESULT_COUNT`](crate::consts::MAX_RESULT_COUNT).
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedSearch;

#[async_trait]
impl SearchAdapter for SimulatedSearch {
    async fn search(
        &self,
        request: SearchRequest,
    ) -> Result<Vec<SearchResult>> {
        let slug: String = request
            .query
            .split_whitespace()
            .map(|w| w.chars().filter(|c| c.is_alphanumeric()).collect::<String>().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect::<Vec<_>>()
            .join("-");

        Ok((1..=request.result_count.min(consts::MAX_RESULT_COUNT))
            .map(|i| SearchResult {
                title: format!("Result {} for \"{}\"", i, request.query),
                snippet: format!("Simulated {} result {} about {}.", request.engine, i, request.query),
                url: format!("https://example.com/{}/{}", slug, i),
            })
            .collect())
    }
}
