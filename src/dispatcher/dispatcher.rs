use std::{
    collections::{HashSet, VecDeque},
    sync::Arc,
};

use serde::{Deserialize, Serialize};

use crate::{
    Result,
    common::BroadcastQueue,
    events::{Event, GraphEvent, Message, NodeEvent},
    flow::{
        FlowGraph,
        actions::{ActionScope, NodeAction},
    },
    model::{NodeId, NodeModel},
    runtime::{ExecutionContext, ExecutionId},
    tools::Tools,
    utils,
};

/// When a node with several incoming edges may run.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, strum::AsRefStr, strum::EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum JoinPolicy {
    /// Run on whichever predecessor reaches the node first.
    #[default]
    FirstArrival,
    /// Wait until every predecessor ran. When nothing else is runnable the
    /// earliest waiting node is released anyway, so cycles and unreachable
    /// predecessors cannot stall the run.
    WaitForAll,
}

/// Outcome of a completed traversal.
#[derive(Debug, Clone)]
pub struct Traversal {
    pub context: ExecutionContext,
    /// node ids in the order they ran
    pub visited: Vec<NodeId>,
}

/// Runs one execution over a borrowed graph.
pub struct Dispatcher<'a> {
    eid: ExecutionId,
    graph: &'a FlowGraph,
    tools: &'a Tools,
    default_model: &'a str,
    policy: JoinPolicy,
    event_queue: Option<Arc<BroadcastQueue<Event<Message>>>>,
}

impl<'a> Dispatcher<'a> {
    pub fn new(
        eid: ExecutionId,
        graph: &'a FlowGraph,
        tools: &'a Tools,
        default_model: &'a str,
    ) -> Self {
        Self {
            eid,
            graph,
            tools,
            default_model,
            policy: JoinPolicy::default(),
            event_queue: None,
        }
    }

    pub fn with_policy(
        mut self,
        policy: JoinPolicy,
    ) -> Self {
        self.policy = policy;
        self
    }

    /// Publish node events to `queue`.
    pub fn with_events(
        mut self,
        queue: Arc<BroadcastQueue<Event<Message>>>,
    ) -> Self {
        self.event_queue = Some(queue);
        self
    }

    /// Traverses the graph starting from a context holding only `input`.
    ///
    /// The first failing node aborts the traversal and its error is returned.
    pub async fn run(
        &self,
        input: &str,
    ) -> Result<Traversal> {
        let mut ctx = ExecutionContext::new(input);
        let mut queue: VecDeque<NodeId> = self.graph.starting_nodes().into();
        let mut visited: Vec<NodeId> = Vec::new();
        let mut seen: HashSet<NodeId> = HashSet::new();
        let mut deferred: Vec<NodeId> = Vec::new();
        let mut released: HashSet<NodeId> = HashSet::new();

        loop {
            let nid = match queue.pop_front() {
                Some(nid) => nid,
                None => match deferred.iter().position(|n| !seen.contains(n)) {
                    Some(i) => {
                        let nid = deferred.remove(i);
                        tracing::debug!(eid = %self.eid, "releasing deferred node {}", nid);
                        released.insert(nid.clone());
                        nid
                    }
                    None => break,
                },
            };

            if seen.contains(&nid) {
                continue;
            }

            let Some(node) = self.graph.node(&nid) else {
                tracing::warn!(eid = %self.eid, "node {} not found, skipping", nid);
                self.emit(&nid, NodeEvent::Skipped(format!("node {} not found", nid)));
                continue;
            };

            if self.policy == JoinPolicy::WaitForAll && !released.contains(&nid) && !self.predecessors_done(&nid, &seen) {
                if !deferred.contains(&nid) {
                    tracing::debug!(eid = %self.eid, "deferring node {} until its predecessors ran", nid);
                    deferred.push(nid);
                }
                continue;
            }

            ctx = self.execute_node(node, ctx).await?;
            seen.insert(nid.clone());
            visited.push(nid.clone());

            queue.extend(self.graph.successors(&nid));
        }

        Ok(Traversal {
            context: ctx,
            visited,
        })
    }

    fn predecessors_done(
        &self,
        nid: &str,
        seen: &HashSet<NodeId>,
    ) -> bool {
        self.graph.predecessors(nid).iter().all(|p| seen.contains(p))
    }

    async fn execute_node(
        &self,
        node: &NodeModel,
        ctx: ExecutionContext,
    ) -> Result<ExecutionContext> {
        self.emit(&node.id, NodeEvent::Running(utils::time::time_millis()));

        let scope = ActionScope {
            node,
            graph: self.graph,
            tools: self.tools,
            default_model: self.default_model,
        };

        let result = match NodeAction::create(node) {
            Ok(action) => {
                tracing::debug!(eid = %self.eid, "running node {} ({})", node.id, action.node_type());
                action.run(&scope, ctx).await
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(ctx) => {
                self.emit(&node.id, NodeEvent::Succeeded(utils::time::time_millis()));
                Ok(ctx)
            }
            Err(e) => {
                tracing::debug!(eid = %self.eid, "node {} failed: {}", node.id, e);
                self.emit(&node.id, NodeEvent::Error(e.to_string()));
                Err(e)
            }
        }
    }

    fn emit(
        &self,
        nid: &str,
        event: NodeEvent,
    ) {
        if let Some(queue) = &self.event_queue {
            // nobody listening is fine
            let _ = queue.send(Event::new(&Message {
                eid: self.eid.clone(),
                nid: nid.to_string(),
                event: GraphEvent::Node(event),
            }));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::{Value, json};

    use super::*;
    use crate::{
        AgentflowError,
        flow::actions::testing::{self, RecordingLlm},
    };

    async fn traverse(
        graph: &FlowGraph,
        policy: JoinPolicy,
    ) -> Result<Traversal> {
        let tools = testing::tools(Arc::default());
        Dispatcher::new("e1".to_string(), graph, &tools, "m").with_policy(policy).run("2+2").await
    }

    fn diamond() -> FlowGraph {
        testing::graph(
            vec![
                ("in", "chatInput", json!({})),
                ("s", "search", json!({})),
                ("c", "calculator", json!({})),
                ("l", "llm", json!({})),
                ("out", "chatOutput", json!({})),
            ],
            vec![("in", "s"), ("in", "c"), ("s", "l"), ("c", "l"), ("l", "out")],
        )
    }

    #[tokio::test]
    async fn test_each_node_runs_once() {
        let t = traverse(&diamond(), JoinPolicy::FirstArrival).await.unwrap();
        assert_eq!(t.visited, vec!["in", "s", "c", "l", "out"]);
    }

    #[tokio::test]
    async fn test_first_arrival_runs_merge_early() {
        // l hears from s directly and from c one hop later through x
        let graph = testing::graph(
            vec![
                ("in", "chatInput", json!({})),
                ("s", "search", json!({})),
                ("x", "chatInput", json!({})),
                ("c", "calculator", json!({})),
                ("l", "llm", json!({})),
            ],
            vec![("in", "s"), ("in", "x"), ("s", "l"), ("x", "c"), ("c", "l")],
        );

        let t = traverse(&graph, JoinPolicy::FirstArrival).await.unwrap();
        assert_eq!(t.visited, vec!["in", "s", "x", "l", "c"]);
        assert!(!t.context.llm_response().unwrap().contains("Calculation:"));
        assert!(t.context.calculation_result().is_some());

        let t = traverse(&graph, JoinPolicy::WaitForAll).await.unwrap();
        assert_eq!(t.visited, vec!["in", "s", "x", "c", "l"]);
        assert!(t.context.llm_response().unwrap().contains("Calculation: 2+2 = 4"));
    }

    #[tokio::test]
    async fn test_wait_for_all_releases_cycles() {
        // b waits on c, which only runs after b
        let graph = testing::graph(
            vec![("a", "chatInput", json!({})), ("b", "llm", json!({})), ("c", "chatInput", json!({}))],
            vec![("a", "b"), ("b", "c"), ("c", "b")],
        );
        let t = traverse(&graph, JoinPolicy::WaitForAll).await.unwrap();
        assert_eq!(t.visited, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_parallel_edges_and_multiple_starts() {
        let graph = testing::graph(
            vec![("a", "chatInput", json!({})), ("b", "chatInput", json!({})), ("l", "llm", json!({}))],
            vec![("a", "l"), ("a", "l"), ("b", "l")],
        );
        let t = traverse(&graph, JoinPolicy::FirstArrival).await.unwrap();
        assert_eq!(t.visited, vec!["a", "b", "l"]);
    }

    #[tokio::test]
    async fn test_failure_aborts_traversal() {
        let graph = testing::graph(
            vec![("in", "chatInput", json!({})), ("s", "search", json!({})), ("l", "llm", json!({}))],
            vec![("in", "s"), ("s", "l")],
        );
        let llm = Arc::new(RecordingLlm::default());
        let tools = testing::tools(llm.clone()).with_search(Arc::new(testing::FailingSearch));

        let err = Dispatcher::new("e1".to_string(), &graph, &tools, "m").run("q").await.unwrap_err();
        assert!(matches!(err, AgentflowError::ToolInvocation { .. }));
        assert!(llm.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_type_fails_at_dispatch() {
        let graph = testing::graph(vec![("in", "chatInput", json!({})), ("w", "webhook", json!({}))], vec![("in", "w")]);
        let err = traverse(&graph, JoinPolicy::FirstArrival).await.unwrap_err();
        assert!(matches!(err, AgentflowError::NodeType { ref node_id, .. } if node_id == "w"));
    }

    #[tokio::test]
    async fn test_emits_node_events() {
        let graph = diamond();
        let tools = testing::tools(Arc::default());
        let queue = BroadcastQueue::new(64);
        let mut rx = queue.subscribe();

        Dispatcher::new("e9".to_string(), &graph, &tools, "m").with_events(queue).run("1+1").await.unwrap();

        let mut running = Vec::new();
        while let Ok(e) = rx.try_recv() {
            assert_eq!(e.eid, "e9");
            if let GraphEvent::Node(NodeEvent::Running(_)) = &e.event {
                running.push(e.nid.clone());
            }
        }
        assert_eq!(running, vec!["in", "s", "c", "l", "out"]);
    }

    #[test]
    fn test_join_policy_names() {
        assert_eq!(serde_json::to_value(JoinPolicy::WaitForAll).unwrap(), Value::from("wait_for_all"));
        assert_eq!(JoinPolicy::FirstArrival.as_ref(), "first_arrival");
    }
}
