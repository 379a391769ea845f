//! Plain-text renderings of context payloads, shared by prompt building and
//! the chat output node.

use crate::{
    runtime::CalculationResult,
    tools::SearchResult,
};

pub fn search_results_block(results: &[SearchResult]) -> String {
    let mut lines = vec!["Search results:".to_string()];
    for (i, r) in results.iter().enumerate() {
        lines.push(format!("{}. {}", i + 1, r.title));
        if !r.snippet.is_empty() {
            lines.push(format!("   {}", r.snippet));
        }
        if !r.url.is_empty() {
            lines.push(format!("   Source: {}", r.url));
        }
    }
    lines.join("\n")
}

pub fn calculation_line(calc: &CalculationResult) -> String {
    match (&calc.result, &calc.error) {
        (Some(result), _) => format!("{} = {}", calc.expression, result),
        (None, Some(error)) => format!("Error evaluating '{}': {}", calc.expression, error),
        (None, None) => format!("{} = ?", calc.expression),
    }
}
