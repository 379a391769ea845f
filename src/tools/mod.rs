//! External tool adapters.
//!
//! Nodes never talk to a provider directly; they go through the adapter
//! traits defined here so that embedding applications can plug in real
//! backends while tests and offline runs use the deterministic ones.

mod calculator;
mod llm;
mod openai;
mod search;

use std::sync::Arc;

pub use calculator::{ArithmeticCalculator, Calculation, CalculatorAdapter};
pub use llm::{LlmAdapter, LlmReply, LlmRequest, SimulatedLlm};
pub use openai::OpenAiLlm;
pub use search::{SearchAdapter, SearchRequest, SearchResult, SimulatedSearch};

/// The adapters an execution may call.
#[derive(Clone)]
pub struct Tools {
    pub llm: Arc<dyn LlmAdapter>,
    pub search: Arc<dyn SearchAdapter>,
    pub calculator: Arc<dyn CalculatorAdapter>,
}

impl Default for Tools {
    fn default() -> Self {
        Self {
            llm: Arc::new(SimulatedLlm),
            search: Arc::new(SimulatedSearch),
            calculator: Arc::new(ArithmeticCalculator),
        }
    }
}

impl Tools {
    pub fn with_llm(
        mut self,
        llm: Arc<dyn LlmAdapter>,
    ) -> Self {
        self.llm = llm;
        self
    }

    pub fn with_search(
        mut self,
        search: Arc<dyn SearchAdapter>,
    ) -> Self {
        self.search = search;
        self
    }

    pub fn with_calculator(
        mut self,
        calculator: Arc<dyn CalculatorAdapter>,
    ) -> Self {
        self.calculator = calculator;
        self
    }
}
