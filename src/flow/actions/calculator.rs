use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Number, json};

use crate::{
    Result,
    common::Vars,
    flow::consts,
    runtime::{CalculationResult, ExecutionContext},
    tools::Calculation,
};

use super::{Action, ActionScope, NodeType, parse_params};

/// Largest magnitude at which every integer is exactly representable in f64.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CalculatorAction {
    #[serde(default = "default_precision")]
    precision: u32,
}

fn default_precision() -> u32 {
    consts::DEFAULT_PRECISION
}

/// Integral values become JSON integers so `2+2` reads `4`, not `4.0`.
fn to_number(value: f64) -> Option<Number> {
    if value.fract() == 0.0 && value.abs() <= MAX_SAFE_INTEGER {
        Some(Number::from(value as i64))
    } else {
        Number::from_f64(value)
    }
}

#[async_trait]
impl Action for CalculatorAction {
    fn create(params: &Vars) -> Result<Self> {
        parse_params(params, &Self::schema())
    }

    fn schema() -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "precision": {
                    "type": "integer",
                    "minimum": 0,
                    "maximum": 15,
                    "description": "Decimal places kept in the result"
                }
            }
        })
    }

    fn node_type(&self) -> NodeType {
        NodeType::Calculator
    }

    async fn run(
        &self,
        scope: &ActionScope<'_>,
        ctx: ExecutionContext,
    ) -> Result<ExecutionContext> {
        let expression = ctx.input().to_string();
        let result = match scope.tools.calculator.evaluate(&expression, self.precision).await? {
            Calculation::Value(value) => match to_number(value) {
                Some(n) => CalculationResult::value(expression, n),
                None => CalculationResult::error(expression, "result is not a finite number"),
            },
            Calculation::Error(error) => CalculationResult::error(expression, error),
        };
        Ok(ctx.with(consts::CALCULATION_RESULT, serde_json::to_value(result)?))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::flow::actions::testing;

    async fn calculate(
        params: serde_json::Value,
        input: &str,
    ) -> serde_json::Value {
        let graph = testing::graph(vec![("c", "calculator", params.clone())], vec![]);
        let tools = testing::tools(Arc::default());
        let scope = ActionScope {
            node: graph.node("c").unwrap(),
            graph: &graph,
            tools: &tools,
            default_model: "m",
        };
        let action = CalculatorAction::create(&params.into()).unwrap();
        let ctx = action.run(&scope, ExecutionContext::new(input)).await.unwrap();
        ctx.get::<serde_json::Value>(consts::CALCULATION_RESULT).unwrap()
    }

    #[tokio::test]
    async fn test_integral_result_is_integer() {
        assert_eq!(calculate(json!({}), "2+2").await, json!({"result": 4, "expression": "2+2"}));
        assert_eq!(calculate(json!({}), "-3 * 2").await, json!({"result": -6, "expression": "-3 * 2"}));
    }

    #[tokio::test]
    async fn test_precision() {
        assert_eq!(calculate(json!({}), "1/3").await, json!({"result": 0.33, "expression": "1/3"}));
        assert_eq!(calculate(json!({"precision": 4}), "1/3").await, json!({"result": 0.3333, "expression": "1/3"}));
        assert_eq!(calculate(json!({"precision": 0}), "7/2").await, json!({"result": 4, "expression": "7/2"}));
    }

    #[tokio::test]
    async fn test_error_is_data() {
        let out = calculate(json!({}), "2+").await;
        assert_eq!(out["expression"], "2+");
        assert!(out["error"].is_string());
        assert!(out.get("result").is_none());
    }

    #[test]
    fn test_precision_bounds() {
        assert!(CalculatorAction::create(&json!({"precision": 16}).into()).is_err());
        assert!(CalculatorAction::create(&json!({"precision": -1}).into()).is_err());
    }
}
