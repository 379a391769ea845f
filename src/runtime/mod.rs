mod channel;
mod context;
mod execution;

pub use channel::{Channel, ChannelEvent, ChannelOptions};
pub use context::{CalculationResult, ExecutionContext};
pub use execution::{ExecutionId, ExecutionReport, FlowResponse, FlowSource};
