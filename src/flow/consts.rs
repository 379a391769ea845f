//! Execution context field names and node defaults.

/// the user input, set when the context is created
pub const INPUT: &str = "input";
pub const LLM_RESPONSE: &str = "llmResponse";
pub const SEARCH_RESULTS: &str = "searchResults";
pub const CALCULATION_RESULT: &str = "calculationResult";
pub const AGENT_RESPONSE: &str = "agentResponse";
pub const FINAL_OUTPUT: &str = "finalOutput";

/// chatOutput text when no upstream node produced anything
pub const NO_RESPONSE: &str = "No response generated.";
/// execution response when the flow never produced a response field
pub const NO_OUTPUT: &str = "No output generated.";

pub const FORMAT_TEXT: &str = "text";
pub const FORMAT_MARKDOWN: &str = "markdown";
pub const FORMAT_HTML: &str = "html";

pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const AGENT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_SEARCH_ENGINE: &str = "google";
pub const DEFAULT_RESULT_COUNT: u32 = 5;
/// upper bound of a search node's `resultCount`
pub const MAX_RESULT_COUNT: u32 = 100;
pub const DEFAULT_PRECISION: u32 = 2;
