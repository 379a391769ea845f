use std::sync::{Arc, RwLock};

use crate::{
    AgentflowError, Result, ShareLock,
    common::{BroadcastQueue, Shutdown},
    events::{Event, Message},
    runtime::ExecutionId,
};

const EVENT_QUEUE_SIZE: usize = 2048;

pub type ExecutionEventHandle = Arc<dyn Fn(&Event<Message>) + Send + Sync>;

#[derive(Debug, Clone)]
pub struct ChannelOptions {
    /// use the glob pattern to match the execution id
    /// eg. exec1*
    pub eid: String,

    /// use the glob pattern to match the node id
    /// eg. llm*
    pub nid: String,
}

impl Default for ChannelOptions {
    fn default() -> Self {
        Self {
            eid: "*".to_string(),
            nid: "*".to_string(),
        }
    }
}

impl ChannelOptions {
    pub fn new(
        eid: impl Into<String>,
        nid: impl Into<String>,
    ) -> Self {
        Self {
            eid: eid.into(),
            nid: nid.into(),
        }
    }

    pub fn with_eid(eid: impl Into<String>) -> Self {
        Self {
            eid: eid.into(),
            ..Default::default()
        }
    }

    pub fn with_nid(nid: impl Into<String>) -> Self {
        Self {
            nid: nid.into(),
            ..Default::default()
        }
    }
}

/// Fan-out of execution events to registered handlers.
#[derive(Clone)]
pub struct Channel {
    event_queue: Arc<BroadcastQueue<Event<Message>>>,
    events: ShareLock<Vec<ExecutionEventHandle>>,
    shutdown: Arc<Shutdown>,
}

impl Channel {
    pub(crate) fn new() -> Self {
        Self {
            event_queue: BroadcastQueue::new(EVENT_QUEUE_SIZE),
            events: Arc::new(RwLock::new(Vec::new())),
            shutdown: Arc::new(Shutdown::new()),
        }
    }

    pub(crate) fn event_queue(&self) -> Arc<BroadcastQueue<Event<Message>>> {
        self.event_queue.clone()
    }

    /// Spawns the dispatch loop on the current Tokio runtime.
    pub(crate) fn listen(&self) {
        let mut event_queue = self.event_queue.subscribe();
        let events = self.events.clone();
        let shutdown = self.shutdown.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.wait() => break,
                    received = event_queue.recv() => {
                        match received {
                            Ok(e) => {
                                let handlers = events.read().unwrap_or_else(|e| e.into_inner()).clone();
                                for handle in handlers.iter() {
                                    (handle)(&e);
                                }
                            }
                            Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                                tracing::warn!("event listener lagged, {} events dropped", n);
                            }
                            Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                        }
                    }
                }
            }
        });
    }

    pub(crate) fn shutdown(&self) {
        self.shutdown.shutdown();
    }

    fn push(
        &self,
        handle: ExecutionEventHandle,
    ) {
        self.events.write().unwrap_or_else(|e| e.into_inner()).push(handle);
    }
}

/// A filtered view of the channel used to register handlers.
#[derive(Clone)]
pub struct ChannelEvent {
    channel: Arc<Channel>,

    glob: (globset::GlobMatcher, globset::GlobMatcher),
}

impl ChannelEvent {
    pub fn channel(
        channel: Arc<Channel>,
        options: ChannelOptions,
    ) -> Result<Self> {
        Ok(Self {
            channel,
            glob: (compile(&options.eid)?, compile(&options.nid)?),
        })
    }

    /// Called with the execution id when a matching execution succeeds.
    pub fn on_complete(
        &self,
        f: impl Fn(ExecutionId) + Send + Sync + 'static,
    ) {
        let glob = self.glob.clone();

        self.channel.push(Arc::new(move |e| {
            if e.event.is_complete() && is_match(&glob, e) {
                f(e.eid.clone());
            }
        }));
    }

    /// Called for flow failures, timeouts and aborts.
    pub fn on_error(
        &self,
        f: impl Fn(&Event<Message>) + Send + Sync + 'static,
    ) {
        let glob = self.glob.clone();

        self.channel.push(Arc::new(move |e| {
            if e.event.is_error() && is_match(&glob, e) {
                f(e);
            }
        }));
    }

    pub fn on_event(
        &self,
        f: impl Fn(&Event<Message>) + Send + Sync + 'static,
    ) {
        let glob = self.glob.clone();

        self.channel.push(Arc::new(move |e| {
            if is_match(&glob, e) {
                f(e);
            }
        }));
    }
}

fn compile(pattern: &str) -> Result<globset::GlobMatcher> {
    globset::Glob::new(pattern)
        .map(|g| g.compile_matcher())
        .map_err(|e| AgentflowError::Config(format!("invalid glob pattern '{}': {}", pattern, e)))
}

fn is_match(
    glob: &(globset::GlobMatcher, globset::GlobMatcher),
    e: &Event<Message>,
) -> bool {
    let (pat_eid, pat_nid) = glob;
    pat_eid.is_match(&e.eid) && pat_nid.is_match(&e.nid)
}
