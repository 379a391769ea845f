//! Flow engine - the main entry point for Agentflow.
//!
//! The engine ties the pieces together:
//! - Storing flow definitions and moving them through draft/published
//! - Executing flows against a single input, with deadline and shutdown
//! - Publishing execution events on the channel

use std::{
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use tracing::{debug, info, warn};

use crate::{
    AgentflowError, ChannelEvent, ChannelOptions, Config, Result,
    common::Shutdown,
    dispatcher::{Dispatcher, JoinPolicy, Traversal},
    events::{Event, FlowEvent, GraphEvent, Message},
    flow::FlowGraph,
    model::{FlowDraft, FlowModel, FlowUpdate},
    runtime::{Channel, ExecutionReport, FlowResponse, FlowSource},
    store::{FlowStore, PageData, Query},
    tools::Tools,
    utils,
};

/// Per-call overrides of the execution settings in [`Config`].
#[derive(Debug, Clone, Default)]
pub struct ExecutionOptions {
    /// deadline for this execution, `None` uses the configured one
    pub timeout: Option<Duration>,
    /// join policy for this execution, `None` uses the configured one
    pub join_policy: Option<JoinPolicy>,
}

impl ExecutionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timeout(
        mut self,
        timeout: Duration,
    ) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn join_policy(
        mut self,
        policy: JoinPolicy,
    ) -> Self {
        self.join_policy = Some(policy);
        self
    }
}

/// The main flow engine.
///
/// # Example
///
/// ```rust,ignore
/// let engine = EngineBuilder::new().build()?;
/// engine.launch()?;
///
/// let flow = engine.create_flow(draft)?;
/// engine.publish_flow(&flow.id)?;
/// let response = engine.execute_flow(&flow.id, "hello").await?;
///
/// engine.shutdown();
/// ```
pub struct Engine {
    config: Config,
    /// Event channel for broadcasting execution events.
    channel: Arc<Channel>,
    /// Storage for flow definitions.
    store: Arc<dyn FlowStore>,
    /// Adapters handed to node actions.
    tools: Tools,

    /// Flag indicating if the event channel is being listened to.
    running: AtomicBool,
    /// Aborts in-flight executions once triggered.
    shutdown: Arc<Shutdown>,
}

impl Engine {
    pub(crate) fn new(
        config: Config,
        store: Arc<dyn FlowStore>,
        tools: Tools,
    ) -> Self {
        Self {
            config,
            channel: Arc::new(Channel::new()),
            store,
            tools,
            running: AtomicBool::new(false),
            shutdown: Arc::new(Shutdown::new()),
        }
    }

    /// Starts dispatching events to the handlers registered on the channel.
    ///
    /// Must be called from within a Tokio runtime and before [`Engine::shutdown`].
    /// Executions do not need a launched engine; only event handlers do.
    pub fn launch(&self) -> Result<()> {
        if self.shutdown.is_terminated() {
            return Err(AgentflowError::Engine("engine is shut down".to_string()));
        }
        if tokio::runtime::Handle::try_current().is_err() {
            return Err(AgentflowError::Engine("launch must be called within a Tokio runtime".to_string()));
        }
        if self.running.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        self.channel.listen();
        info!("engine launched");
        Ok(())
    }

    /// Aborts every in-flight execution and stops the event channel.
    ///
    /// Executions started afterwards fail with `Aborted`.
    pub fn shutdown(&self) {
        if self.shutdown.is_terminated() {
            return;
        }

        info!("engine shutting down");
        self.shutdown.shutdown();
        self.channel.shutdown();
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Returns a reference to the event channel.
    pub fn channel(&self) -> Arc<Channel> {
        self.channel.clone()
    }

    /// Shorthand for [`ChannelEvent::channel`] on this engine's channel.
    pub fn subscribe(
        &self,
        options: ChannelOptions,
    ) -> Result<ChannelEvent> {
        ChannelEvent::channel(self.channel.clone(), options)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Stores a new draft flow.
    pub fn create_flow(
        &self,
        draft: FlowDraft,
    ) -> Result<FlowModel> {
        let flow = FlowModel::create(draft);
        self.store.create(&flow)?;
        debug!("created flow {}", flow.id);
        Ok(flow)
    }

    pub fn get_flow(
        &self,
        id: &str,
    ) -> Result<FlowModel> {
        self.store.find(id)
    }

    pub fn list_flows(
        &self,
        query: &Query,
    ) -> Result<PageData<FlowModel>> {
        self.store.query(query)
    }

    pub fn update_flow(
        &self,
        id: &str,
        update: FlowUpdate,
    ) -> Result<FlowModel> {
        let mut flow = self.store.find(id)?;
        flow.apply(update);
        self.store.update(&flow)?;
        Ok(flow)
    }

    pub fn delete_flow(
        &self,
        id: &str,
    ) -> Result<()> {
        if !self.store.delete(id)? {
            return Err(AgentflowError::NotFound(id.to_string()));
        }
        debug!("deleted flow {}", id);
        Ok(())
    }

    /// Publishes a flow after checking its structure.
    pub fn publish_flow(
        &self,
        id: &str,
    ) -> Result<FlowModel> {
        let mut flow = self.store.find(id)?;
        flow.validate()?;
        flow.publish();
        self.store.update(&flow)?;
        info!("published flow {}", id);
        Ok(flow)
    }

    pub fn unpublish_flow(
        &self,
        id: &str,
    ) -> Result<FlowModel> {
        let mut flow = self.store.find(id)?;
        flow.unpublish();
        self.store.update(&flow)?;
        Ok(flow)
    }

    /// Executes `flow` against `input` and returns its response.
    pub async fn execute(
        &self,
        flow: impl Into<FlowSource>,
        input: &str,
    ) -> Result<FlowResponse> {
        let report = self.run(flow, input, ExecutionOptions::default()).await?;
        Ok(report.response)
    }

    /// Executes the stored flow `id`, published or not.
    pub async fn execute_flow(
        &self,
        id: &str,
        input: &str,
    ) -> Result<FlowResponse> {
        let flow = self.store.find(id)?;
        self.execute(flow, input).await
    }

    /// Executes `flow` and returns the full report.
    ///
    /// Fails with `Structural` before any node runs when the flow is invalid,
    /// with `Timeout` when the deadline passes and with `Aborted` when the
    /// engine shuts down meanwhile.
    pub async fn run(
        &self,
        flow: impl Into<FlowSource>,
        input: &str,
        options: ExecutionOptions,
    ) -> Result<ExecutionReport> {
        if self.shutdown.is_terminated() {
            return Err(AgentflowError::Aborted("engine is shut down".to_string()));
        }

        let eid = utils::longid();
        let start = utils::time::time_millis();

        let source: FlowSource = flow.into();
        let model = source.into_model().inspect_err(|e| self.fail(&eid, e))?;
        let graph = FlowGraph::try_from(&model).inspect_err(|e| self.fail(&eid, e))?;

        info!(eid = %eid, flow_id = %model.id, "execution started");
        debug!("{}", graph.schema());
        self.emit(
            &eid,
            FlowEvent::Start {
                flow_id: model.id.clone(),
                node_ids: graph.node_ids(),
            },
        );

        let policy = options.join_policy.unwrap_or(self.config.execution.join_policy);
        let timeout = options.timeout.or(self.config.execution.timeout());
        let dispatcher = Dispatcher::new(eid.clone(), &graph, &self.tools, &self.config.llm.default_model)
            .with_policy(policy)
            .with_events(self.channel.event_queue());

        let outcome = tokio::select! {
            _ = self.shutdown.wait() => Err(AgentflowError::Aborted("engine shut down".to_string())),
            result = with_deadline(dispatcher.run(input), timeout) => result,
        };

        let elapsed_ms = utils::time::elapsed_millis(start);
        match outcome {
            Ok(Traversal {
                context,
                visited,
            }) => {
                let response = FlowResponse::from_context(&context);
                info!(eid = %eid, elapsed_ms, "execution succeeded");
                self.emit(
                    &eid,
                    FlowEvent::Succeeded {
                        elapsed_ms,
                    },
                );
                Ok(ExecutionReport {
                    id: eid,
                    flow_id: model.id,
                    response,
                    context,
                    visited,
                    elapsed_ms,
                })
            }
            Err(e) => {
                self.fail(&eid, &e);
                Err(e)
            }
        }
    }

    fn fail(
        &self,
        eid: &str,
        error: &AgentflowError,
    ) {
        warn!(eid = %eid, "execution failed: {}", error);
        let event = match error {
            AgentflowError::Timeout { .. } | AgentflowError::Aborted(_) => FlowEvent::Aborted {
                reason: error.to_string(),
            },
            _ => FlowEvent::Failed {
                error: error.to_string(),
            },
        };
        self.emit(eid, event);
    }

    fn emit(
        &self,
        eid: &str,
        event: FlowEvent,
    ) {
        let _ = self.channel.event_queue().send(Event::new(&Message {
            eid: eid.to_string(),
            nid: String::new(),
            event: GraphEvent::Flow(event),
        }));
    }
}

/// Runs `fut` to completion or until `timeout` passes, dropping it on expiry.
async fn with_deadline<T>(
    fut: impl Future<Output = Result<T>>,
    timeout: Option<Duration>,
) -> Result<T> {
    match timeout {
        Some(duration) => tokio::time::timeout(duration, fut).await.map_err(|_| AgentflowError::Timeout {
            timeout_ms: duration.as_millis() as u64,
        })?,
        None => fut.await,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_with_deadline() {
        let fast = with_deadline(async { Ok(1) }, Some(Duration::from_millis(50))).await;
        assert_eq!(fast, Ok(1));

        let slow = with_deadline(
            async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            },
            Some(Duration::from_millis(10)),
        )
        .await;
        assert_eq!(
            slow,
            Err(AgentflowError::Timeout {
                timeout_ms: 10
            })
        );

        let unbounded = with_deadline(async { Ok("done") }, None).await;
        assert_eq!(unbounded, Ok("done"));
    }

    #[test]
    fn test_launch_needs_runtime() {
        let engine = crate::EngineBuilder::new().build().unwrap();
        assert!(matches!(engine.launch(), Err(AgentflowError::Engine(_))));
        assert!(!engine.is_running());
    }

    #[tokio::test]
    async fn test_launch_after_shutdown_fails() {
        let engine = crate::EngineBuilder::new().build().unwrap();
        engine.launch().unwrap();
        assert!(engine.is_running());

        engine.shutdown();
        assert!(!engine.is_running());
        assert_eq!(engine.launch(), Err(AgentflowError::Engine("engine is shut down".to_string())));
        assert!(!engine.is_running());
    }
}
