//! Composition patterns: each one assembles a plain [`Graph`] — there is no
//! second interpreter, only different node/edge wiring run through
//! [`crate::runner`].

use crate::context::RunContext;
use crate::graph::{Graph, GraphBuilder};
use crate::messages::Message;
use crate::node::Node;
use crate::error::Result;
use std::sync::Arc;

/// `node_0 → node_1 → … → node_n`; start is the first, end is the last.
pub fn sequential(name: impl Into<String>, nodes: Vec<(String, Arc<dyn Node>)>) -> Result<Graph> {
    assert!(!nodes.is_empty(), "sequential composition needs at least one node");
    let mut builder = GraphBuilder::new(name);
    let ids: Vec<String> = nodes.iter().map(|(id, _)| id.clone()).collect();
    for (id, node) in nodes {
        builder = builder.add_node(id, node);
    }
    for pair in ids.windows(2) {
        builder = builder.add_edge(pair[0].clone(), pair[1].clone());
    }
    builder
        .start_node(ids.first().unwrap().clone())
        .end_node(ids.last().unwrap().clone())
        .build()
}

/// `start → {branch_0..n} → combiner`. Fan-out is implicit in the multiple
/// edges leaving `start`; the combiner must be able to merge whatever the
/// last-arriving branch output looks like, since the interpreter is still a
/// single-threaded queue walk, not true concurrent dispatch.
pub fn parallel(
    name: impl Into<String>,
    start: (String, Arc<dyn Node>),
    branches: Vec<(String, Arc<dyn Node>)>,
    combiner: (String, Arc<dyn Node>),
) -> Result<Graph> {
    assert!(!branches.is_empty(), "parallel composition needs at least one branch");
    let (start_id, start_node) = start;
    let (combiner_id, combiner_node) = combiner;
    let mut builder = GraphBuilder::new(name).add_node(start_id.clone(), start_node);
    for (id, node) in &branches {
        builder = builder.add_node(id.clone(), node.clone());
        builder = builder.add_edge(start_id.clone(), id.clone());
        builder = builder.add_edge(id.clone(), combiner_id.clone());
    }
    builder
        .add_node(combiner_id.clone(), combiner_node)
        .start_node(start_id)
        .end_node(combiner_id)
        .build()
}

/// `condition_node → {if|else} → result`, via two mutually exclusive
/// conditional edges sharing a single predicate (and its negation).
pub fn conditional(
    name: impl Into<String>,
    condition: (String, Arc<dyn Node>),
    if_branch: (String, Arc<dyn Node>),
    else_branch: (String, Arc<dyn Node>),
    result: (String, Arc<dyn Node>),
    predicate: impl Fn(&RunContext, &Message) -> bool + Send + Sync + Clone + 'static,
) -> Result<Graph> {
    let (cond_id, cond_node) = condition;
    let (if_id, if_node) = if_branch;
    let (else_id, else_node) = else_branch;
    let (result_id, result_node) = result;

    let pred_true = predicate.clone();
    let pred_false = predicate;

    GraphBuilder::new(name)
        .add_node(cond_id.clone(), cond_node)
        .add_node(if_id.clone(), if_node)
        .add_node(else_id.clone(), else_node)
        .add_node(result_id.clone(), result_node)
        .add_conditional_edge(cond_id.clone(), if_id.clone(), move |ctx, msg| pred_true(ctx, msg))
        .add_conditional_edge(cond_id.clone(), else_id.clone(), move |ctx, msg| !pred_false(ctx, msg))
        .add_edge(if_id, result_id.clone())
        .add_edge(else_id, result_id.clone())
        .start_node(cond_id)
        .end_node(result_id)
        .build()
}

/// `start → check → body → increment → check …`; `check` routes to `end`
/// once `continue_predicate` goes false.
pub fn loop_pattern(
    name: impl Into<String>,
    start: (String, Arc<dyn Node>),
    check: (String, Arc<dyn Node>),
    body: (String, Arc<dyn Node>),
    increment: (String, Arc<dyn Node>),
    end: (String, Arc<dyn Node>),
    continue_predicate: impl Fn(&RunContext, &Message) -> bool + Send + Sync + Clone + 'static,
) -> Result<Graph> {
    let (start_id, start_node) = start;
    let (check_id, check_node) = check;
    let (body_id, body_node) = body;
    let (incr_id, incr_node) = increment;
    let (end_id, end_node) = end;

    let should_continue = continue_predicate.clone();
    let should_stop = continue_predicate;

    GraphBuilder::new(name)
        .add_node(start_id.clone(), start_node)
        .add_node(check_id.clone(), check_node)
        .add_node(body_id.clone(), body_node)
        .add_node(incr_id.clone(), incr_node)
        .add_node(end_id.clone(), end_node)
        .add_edge(start_id.clone(), check_id.clone())
        .add_conditional_edge(check_id.clone(), body_id.clone(), move |ctx, msg| should_continue(ctx, msg))
        .add_conditional_edge(check_id.clone(), end_id.clone(), move |ctx, msg| !should_stop(ctx, msg))
        .add_edge(body_id, incr_id.clone())
        .add_edge(incr_id, check_id)
        .start_node(start_id)
        .end_node(end_id)
        .build()
}

/// Selector stores a chosen key in metadata; one conditional edge per route
/// key leads to that route's subtree.
pub fn branch_router(
    name: impl Into<String>,
    selector: (String, Arc<dyn Node>),
    routes: Vec<(String, Arc<dyn Node>)>,
    key_of: impl Fn(&Message) -> Option<String> + Send + Sync + 'static,
) -> Result<Graph> {
    assert!(!routes.is_empty(), "branch router needs at least one route");
    let (selector_id, selector_node) = selector;
    let key_of = Arc::new(key_of);

    let mut builder = GraphBuilder::new(name).add_node(selector_id.clone(), selector_node);
    for (route_key, route_node) in &routes {
        builder = builder.add_node(route_key.clone(), route_node.clone());
        let wanted = route_key.clone();
        let key_of = key_of.clone();
        builder = builder.add_conditional_edge(selector_id.clone(), route_key.clone(), move |_ctx, msg| {
            key_of(msg).as_deref() == Some(wanted.as_str())
        });
    }

    let mut builder = builder.start_node(selector_id);
    for (route_key, _) in &routes {
        builder = builder.end_node(route_key.clone());
    }
    builder.build()
}

/// An extractor seeds items, a single node applies the mapper per item, a
/// collector reduces — the body node is expected to track its own position
/// in the input sequence via message metadata and route back to itself
/// through the conditional edge until exhausted.
pub fn map_pattern(
    name: impl Into<String>,
    extractor: (String, Arc<dyn Node>),
    mapper: (String, Arc<dyn Node>),
    collector: (String, Arc<dyn Node>),
    has_more: impl Fn(&RunContext, &Message) -> bool + Send + Sync + Clone + 'static,
) -> Result<Graph> {
    let (extractor_id, extractor_node) = extractor;
    let (mapper_id, mapper_node) = mapper;
    let (collector_id, collector_node) = collector;

    let keep_mapping = has_more.clone();
    let mapping_done = has_more;

    GraphBuilder::new(name)
        .add_node(extractor_id.clone(), extractor_node)
        .add_node(mapper_id.clone(), mapper_node)
        .add_node(collector_id.clone(), collector_node)
        .add_edge(extractor_id.clone(), mapper_id.clone())
        .add_conditional_edge(mapper_id.clone(), mapper_id.clone(), move |ctx, msg| keep_mapping(ctx, msg))
        .add_conditional_edge(mapper_id.clone(), collector_id.clone(), move |ctx, msg| !mapping_done(ctx, msg))
        .start_node(extractor_id)
        .end_node(collector_id)
        .build()
}
