//! Error types for Agentflow.
//!
//! All errors in Agentflow are represented by the `AgentflowError` enum.
//! Structural and node-type errors are reported before or during dispatch,
//! tool and timeout errors abort a running execution, and expression errors
//! are normally captured as data by the calculator node.

use std::{io::ErrorKind, string::FromUtf8Error};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for all Agentflow operations.
#[derive(Deserialize, Serialize, Error, Debug, Clone, PartialEq)]
pub enum AgentflowError {
    /// The flow failed structural validation (dangling edge, duplicate node id, no starting node).
    #[error("invalid flow: {0}")]
    Structural(String),

    /// A node carries a type tag the engine does not know.
    #[error("node '{node_id}' has unrecognized type '{node_type}'")]
    NodeType {
        node_id: String,
        node_type: String,
    },

    /// An external tool adapter (language model, search, calculator) failed.
    #[error("{tool} invocation failed: {message}")]
    ToolInvocation {
        tool: String,
        message: String,
    },

    /// Arithmetic expression could not be evaluated.
    #[error("{0}")]
    Expression(String),

    /// The execution exceeded its deadline.
    #[error("execution timed out after {timeout_ms} ms")]
    Timeout {
        timeout_ms: u64,
    },

    /// The execution was aborted before it finished.
    #[error("execution aborted: {0}")]
    Aborted(String),

    /// Node configuration errors.
    #[error("{0}")]
    Node(String),

    /// Configuration parsing or validation errors.
    #[error("{0}")]
    Config(String),

    /// Data conversion errors (JSON, TOML).
    #[error("{0}")]
    Convert(String),

    /// Storage operation errors.
    #[error("{0}")]
    Store(String),

    /// A flow id was not found in the store.
    #[error("flow {0} not found")]
    NotFound(String),

    /// Event channel errors.
    #[error("{0}")]
    Channel(String),

    /// Engine lifecycle errors.
    #[error("{0}")]
    Engine(String),

    /// I/O operation errors.
    #[error("{0}")]
    IoError(String),
}

impl AgentflowError {
    /// Creates a tool invocation error for the named tool.
    pub fn tool(
        tool: impl Into<String>,
        message: impl ToString,
    ) -> Self {
        AgentflowError::ToolInvocation {
            tool: tool.into(),
            message: message.to_string(),
        }
    }

    /// Whether re-running the whole flow may succeed.
    ///
    /// Only provider failures and deadline overruns qualify; structural and
    /// configuration errors fail the same way every time.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AgentflowError::ToolInvocation { .. } | AgentflowError::Timeout { .. })
    }
}

impl From<AgentflowError> for String {
    fn from(val: AgentflowError) -> Self {
        val.to_string()
    }
}

impl From<std::io::Error> for AgentflowError {
    fn from(error: std::io::Error) -> Self {
        AgentflowError::IoError(error.to_string())
    }
}

impl From<AgentflowError> for std::io::Error {
    fn from(val: AgentflowError) -> Self {
        #[allow(clippy::io_other_error)]
        std::io::Error::new(ErrorKind::Other, val.to_string())
    }
}

impl From<FromUtf8Error> for AgentflowError {
    fn from(_: FromUtf8Error) -> Self {
        AgentflowError::Convert("Error with utf-8 string convert".to_string())
    }
}

impl From<serde_json::Error> for AgentflowError {
    fn from(error: serde_json::Error) -> Self {
        AgentflowError::Convert(error.to_string())
    }
}

impl From<toml::de::Error> for AgentflowError {
    fn from(error: toml::de::Error) -> Self {
        AgentflowError::Config(error.to_string())
    }
}

impl From<reqwest::Error> for AgentflowError {
    fn from(error: reqwest::Error) -> Self {
        AgentflowError::tool("http", error)
    }
}

impl From<jsonschema::ValidationError<'_>> for AgentflowError {
    fn from(error: jsonschema::ValidationError<'_>) -> Self {
        AgentflowError::Node(error.to_string())
    }
}
