use std::sync::Arc;

use crate::{
    Config, Engine, LlmProvider, Result,
    store::{FlowStore, MemStore},
    tools::{CalculatorAdapter, LlmAdapter, OpenAiLlm, SearchAdapter, SimulatedLlm, Tools},
};

/// Assembles an [`Engine`].
///
/// Anything not set explicitly comes from the configuration: the language
/// model provider is picked by `llm.provider`, search and calculator default
/// to the built-in adapters and flows are kept in memory.
#[derive(Default)]
pub struct EngineBuilder {
    config: Option<Config>,
    store: Option<Arc<dyn FlowStore>>,
    llm: Option<Arc<dyn LlmAdapter>>,
    search: Option<Arc<dyn SearchAdapter>>,
    calculator: Option<Arc<dyn CalculatorAdapter>>,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(
        mut self,
        config: Config,
    ) -> Self {
        self.config = Some(config);
        self
    }

    pub fn store(
        mut self,
        store: Arc<dyn FlowStore>,
    ) -> Self {
        self.store = Some(store);
        self
    }

    pub fn llm(
        mut self,
        llm: Arc<dyn LlmAdapter>,
    ) -> Self {
        self.llm = Some(llm);
        self
    }

    pub fn search(
        mut self,
        search: Arc<dyn SearchAdapter>,
    ) -> Self {
        self.search = Some(search);
        self
    }

    pub fn calculator(
        mut self,
        calculator: Arc<dyn CalculatorAdapter>,
    ) -> Self {
        self.calculator = Some(calculator);
        self
    }

    pub fn build(&self) -> Result<Engine> {
        let config = self.config.clone().unwrap_or_default();

        let llm: Arc<dyn LlmAdapter> = match &self.llm {
            Some(llm) => llm.clone(),
            None => match config.llm.provider {
                LlmProvider::Simulated => Arc::new(SimulatedLlm),
                LlmProvider::OpenAi => Arc::new(OpenAiLlm::new(&config.llm)?),
            },
        };

        let mut tools = Tools::default().with_llm(llm);
        if let Some(search) = &self.search {
            tools = tools.with_search(search.clone());
        }
        if let Some(calculator) = &self.calculator {
            tools = tools.with_calculator(calculator.clone());
        }

        let store = self.store.clone().unwrap_or_else(|| Arc::new(MemStore::new()) as Arc<dyn FlowStore>);

        Ok(Engine::new(config, store, tools))
    }
}
