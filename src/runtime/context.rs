use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Number, Value};

use crate::{
    common::Vars,
    flow::consts,
    runtime::FlowResponse,
    tools::SearchResult,
};

/// Payload stored under `calculationResult`.
///
/// Exactly one of `result` and `error` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub expression: String,
}

impl CalculationResult {
    pub fn value(
        expression: impl Into<String>,
        result: Number,
    ) -> Self {
        Self {
            result: Some(result),
            error: None,
            expression: expression.into(),
        }
    }

    pub fn error(
        expression: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            result: None,
            error: Some(error.into()),
            expression: expression.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.result.is_none()
    }
}

/// State threaded through one execution.
///
/// Actions take the context by value and hand back a new one with their own
/// output field added or overwritten, so nothing is shared between nodes
/// except through the fields themselves.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionContext {
    vars: Vars,
}

impl ExecutionContext {
    /// A fresh context holding only `input`.
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            vars: Vars::new().with(consts::INPUT, input.into()),
        }
    }

    /// Returns the context with `key` set to `value`.
    pub fn with<V: Into<Value>>(
        self,
        key: &str,
        value: V,
    ) -> Self {
        Self {
            vars: self.vars.with(key, value),
        }
    }

    pub fn get<T: DeserializeOwned>(
        &self,
        key: &str,
    ) -> Option<T> {
        self.vars.get(key)
    }

    pub fn contains(
        &self,
        key: &str,
    ) -> bool {
        self.vars.contains(key)
    }

    /// The user input; empty when the field is missing or not a string.
    pub fn input(&self) -> &str {
        self.text(consts::INPUT).unwrap_or_default()
    }

    pub fn llm_response(&self) -> Option<&str> {
        self.text(consts::LLM_RESPONSE)
    }

    pub fn agent_response(&self) -> Option<&str> {
        self.text(consts::AGENT_RESPONSE)
    }

    pub fn search_results(&self) -> Option<Vec<SearchResult>> {
        self.get(consts::SEARCH_RESULTS)
    }

    pub fn calculation_result(&self) -> Option<CalculationResult> {
        self.get(consts::CALCULATION_RESULT)
    }

    pub fn final_output(&self) -> Option<FlowResponse> {
        self.get(consts::FINAL_OUTPUT)
    }

    pub fn vars(&self) -> &Vars {
        &self.vars
    }

    fn text(
        &self,
        key: &str,
    ) -> Option<&str> {
        self.vars.get_value(key).and_then(Value::as_str)
    }
}

impl From<ExecutionContext> for Value {
    fn from(ctx: ExecutionContext) -> Self {
        ctx.vars.into()
    }
}
