//! # Agentflow
//!
//! Agentflow is an embeddable execution engine for "agent flows": directed
//! graphs of typed nodes (chat input/output, language model, search,
//! calculator, agent) composed in a visual editor and run against a single
//! user input to produce a textual response.
//!
//! ## Core Features
//!
//! - **Flow Model**: serializable nodes/edges with structural validation and a draft/published lifecycle
//! - **Breadth-first Engine**: at-most-once node visitation with a selectable join policy
//! - **Pluggable Tools**: language model, search and calculator adapters are injected traits
//! - **Safe Arithmetic**: the built-in calculator only understands numbers, `+ - * /` and parentheses
//! - **Pluggable Storage**: flows persist through the `FlowStore` trait (in-memory by default)
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use agentflow::{EngineBuilder, FlowModel};
//!
//! let engine = EngineBuilder::new().build()?;
//! engine.launch()?;
//!
//! let flow = FlowModel::from_json(json_str)?;
//! let response = engine.execute(flow, "What is 2+2?").await?;
//! println!("{}", response.content);
//! ```

mod builder;
mod common;
mod config;
mod dispatcher;
mod engine;
mod error;
mod events;
mod flow;
mod model;
mod runtime;
mod store;
mod tools;
mod utils;

use std::sync::{Arc, RwLock};

pub use builder::EngineBuilder;
pub use common::Vars;
pub use config::{Config, ExecutionConfig, LlmConfig, LlmProvider};
pub use dispatcher::JoinPolicy;
pub use engine::{Engine, ExecutionOptions};
pub use error::AgentflowError;
pub use events::{Event, FlowEvent, GraphEvent, Message, NodeEvent};
pub use flow::{FlowGraph, NodeType, actions::AgentTool, consts};
pub use model::*;
pub use runtime::{CalculationResult, Channel, ChannelEvent, ChannelOptions, ExecutionContext, ExecutionId, ExecutionReport, FlowResponse, FlowSource};
pub use store::{FlowStore, MemStore, PageData, Query};
pub use tools::{
    ArithmeticCalculator, Calculation, CalculatorAdapter, LlmAdapter, LlmReply, LlmRequest, OpenAiLlm, SearchAdapter, SearchRequest, SearchResult, SimulatedLlm,
    SimulatedSearch, Tools,
};

/// Result type alias for Agentflow operations.
pub type Result<T> = std::result::Result<T, AgentflowError>;

/// Thread-safe shared lock wrapper using Arc<RwLock<T>>.
pub(crate) type ShareLock<T> = Arc<RwLock<T>>;
