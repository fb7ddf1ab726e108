//! The graph data model: named nodes, directed edges (unconditional or
//! conditional), a start node, and a non-empty set of end nodes.

use crate::context::RunContext;
use crate::error::{GraphError, Result};
use crate::messages::Message;
use crate::node::Node;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

pub type NodeId = String;

/// A predicate evaluated fresh on every traversal of the edge that carries
/// it — this is what lets a conditional edge route back through a node
/// already visited, with different state, on a later pass.
pub type Condition = Arc<dyn Fn(&RunContext, &Message) -> bool + Send + Sync>;

#[derive(Clone)]
pub enum EdgeKind {
    Unconditional,
    Conditional(Condition),
}

impl fmt::Debug for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeKind::Unconditional => write!(f, "Unconditional"),
            EdgeKind::Conditional(_) => write!(f, "Conditional(<fn>)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
    pub kind: EdgeKind,
}

impl Edge {
    pub fn unconditional(from: impl Into<NodeId>, to: impl Into<NodeId>) -> Self {
        Self { from: from.into(), to: to.into(), kind: EdgeKind::Unconditional }
    }

    pub fn conditional(
        from: impl Into<NodeId>,
        to: impl Into<NodeId>,
        condition: impl Fn(&RunContext, &Message) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self { from: from.into(), to: to.into(), kind: EdgeKind::Conditional(Arc::new(condition)) }
    }

    /// Evaluate this edge's condition (unconditional edges always fire).
    pub fn fires(&self, ctx: &RunContext, message: &Message) -> bool {
        match &self.kind {
            EdgeKind::Unconditional => true,
            EdgeKind::Conditional(pred) => pred(ctx, message),
        }
    }
}

/// A named, directed computation graph of [`Node`]s.
pub struct Graph {
    pub name: String,
    pub nodes: HashMap<NodeId, Arc<dyn Node>>,
    pub edges: Vec<Edge>,
    pub start_node: NodeId,
    pub end_nodes: HashSet<NodeId>,
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Graph {
    pub fn builder(name: impl Into<String>) -> GraphBuilder {
        GraphBuilder::new(name)
    }

    /// Edges leaving `node`, in the order they were declared.
    pub fn edges_from<'a>(&'a self, node: &str) -> impl Iterator<Item = &'a Edge> {
        self.edges.iter().filter(move |e| e.from == node)
    }

    pub fn is_end_node(&self, node: &str) -> bool {
        self.end_nodes.contains(node)
    }
}

pub struct GraphBuilder {
    name: String,
    nodes: HashMap<NodeId, Arc<dyn Node>>,
    edges: Vec<Edge>,
    start_node: Option<NodeId>,
    end_nodes: HashSet<NodeId>,
    metadata: HashMap<String, serde_json::Value>,
}

impl GraphBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: HashMap::new(),
            edges: Vec::new(),
            start_node: None,
            end_nodes: HashSet::new(),
            metadata: HashMap::new(),
        }
    }

    pub fn add_node(mut self, id: impl Into<NodeId>, node: Arc<dyn Node>) -> Self {
        self.nodes.insert(id.into(), node);
        self
    }

    pub fn add_edge(mut self, from: impl Into<NodeId>, to: impl Into<NodeId>) -> Self {
        self.edges.push(Edge::unconditional(from, to));
        self
    }

    pub fn add_conditional_edge(
        mut self,
        from: impl Into<NodeId>,
        to: impl Into<NodeId>,
        condition: impl Fn(&RunContext, &Message) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.edges.push(Edge::conditional(from, to, condition));
        self
    }

    pub fn start_node(mut self, id: impl Into<NodeId>) -> Self {
        self.start_node = Some(id.into());
        self
    }

    pub fn end_node(mut self, id: impl Into<NodeId>) -> Self {
        self.end_nodes.insert(id.into());
        self
    }

    pub fn metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Validate and produce the [`Graph`]: `startNode` and every `endNode`
    /// must be present in `nodes`, and at least one end node must exist.
    pub fn build(self) -> Result<Graph> {
        let start_node = self
            .start_node
            .ok_or_else(|| GraphError::Validation("start node not set".into()))?;

        if !self.nodes.contains_key(&start_node) {
            return Err(GraphError::Validation(format!(
                "start node '{start_node}' is not a known node"
            )));
        }
        if self.end_nodes.is_empty() {
            return Err(GraphError::Validation("graph has no end nodes".into()));
        }
        for end in &self.end_nodes {
            if !self.nodes.contains_key(end) {
                return Err(GraphError::Validation(format!(
                    "end node '{end}' is not a known node"
                )));
            }
        }
        for edge in &self.edges {
            if !self.nodes.contains_key(&edge.from) {
                return Err(GraphError::Validation(format!(
                    "edge references unknown source node '{}'",
                    edge.from
                )));
            }
            if !self.nodes.contains_key(&edge.to) {
                return Err(GraphError::Validation(format!(
                    "edge references unknown target node '{}'",
                    edge.to
                )));
            }
        }

        Ok(Graph {
            name: self.name,
            nodes: self.nodes,
            edges: self.edges,
            start_node,
            end_nodes: self.end_nodes,
            metadata: self.metadata,
        })
    }
}
