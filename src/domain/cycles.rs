//! Simple cycle enumeration (Johnson's algorithm).
//!
//! Self-loops are reported first as one-node cycles. Longer cycles are
//! enumerated per strongly connected component: the lowest-index node of a
//! component is used as the start, every elementary circuit through it is
//! emitted, then it is removed and the remaining nodes are split into new
//! components. The circuit search itself is iterative, so deep components
//! cannot overflow the stack.

use std::collections::{HashMap, HashSet};

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::debug;

use crate::domain::error::GraphError;

/// Enumerate every simple cycle of `graph`.
///
/// With `max_cycles` set, finding more cycles than the limit is an error
/// rather than a truncated answer.
pub fn simple_cycles<N, E>(
    graph: &DiGraph<N, E>,
    max_cycles: Option<usize>,
) -> Result<Vec<Vec<NodeIndex>>, GraphError> {
    let mut sink = CycleSink {
        cycles: Vec::new(),
        limit: max_cycles,
    };

    for idx in graph.node_indices() {
        if graph.contains_edge(idx, idx) {
            sink.push(vec![idx])?;
        }
    }

    let mut pending: Vec<Vec<NodeIndex>> = tarjan_scc(graph)
        .into_iter()
        .filter(|scc| scc.len() > 1)
        .collect();

    while let Some(component) = pending.pop() {
        let start = component
            .iter()
            .copied()
            .min()
            .ok_or_else(|| GraphError::Algorithm("empty strongly connected component".into()))?;
        let members: HashSet<NodeIndex> = component.iter().copied().collect();

        circuits_through(graph, start, &members, &mut sink)?;

        let rest: Vec<NodeIndex> = component.into_iter().filter(|&n| n != start).collect();
        pending.extend(split_components(graph, &rest));
    }

    debug!(cycles = sink.cycles.len(), "cycle enumeration finished");
    Ok(sink.cycles)
}

struct CycleSink {
    cycles: Vec<Vec<NodeIndex>>,
    limit: Option<usize>,
}

impl CycleSink {
    fn push(&mut self, cycle: Vec<NodeIndex>) -> Result<(), GraphError> {
        if let Some(limit) = self.limit {
            if self.cycles.len() >= limit {
                return Err(GraphError::Algorithm(format!(
                    "more than {} simple cycles; raise the cycle limit to enumerate them all",
                    limit
                )));
            }
        }
        self.cycles.push(cycle);
        Ok(())
    }
}

/// Successors of `node` inside `members`, self-loops excluded, in edge
/// insertion order once popped from the back.
fn scoped_successors<N, E>(
    graph: &DiGraph<N, E>,
    node: NodeIndex,
    members: &HashSet<NodeIndex>,
) -> Vec<NodeIndex> {
    graph
        .neighbors(node)
        .filter(|n| *n != node && members.contains(n))
        .collect()
}

/// Strongly connected components (size > 1) of the subgraph induced by
/// `nodes`, expressed in the input graph's indices.
fn split_components<N, E>(graph: &DiGraph<N, E>, nodes: &[NodeIndex]) -> Vec<Vec<NodeIndex>> {
    if nodes.len() < 2 {
        return Vec::new();
    }

    let mut sub: DiGraph<NodeIndex, ()> = DiGraph::with_capacity(nodes.len(), 0);
    let local: HashMap<NodeIndex, NodeIndex> =
        nodes.iter().map(|&n| (n, sub.add_node(n))).collect();
    for &n in nodes {
        for m in graph.neighbors(n) {
            if m == n {
                continue;
            }
            if let Some(&target) = local.get(&m) {
                sub.update_edge(local[&n], target, ());
            }
        }
    }

    tarjan_scc(&sub)
        .into_iter()
        .filter(|scc| scc.len() > 1)
        .map(|scc| scc.into_iter().map(|i| sub[i]).collect())
        .collect()
}

struct Frame {
    node: NodeIndex,
    successors: Vec<NodeIndex>,
    closed: bool,
}

/// Every elementary circuit through `start` that stays inside `members`.
fn circuits_through<N, E>(
    graph: &DiGraph<N, E>,
    start: NodeIndex,
    members: &HashSet<NodeIndex>,
    sink: &mut CycleSink,
) -> Result<(), GraphError> {
    let mut path = vec![start];
    let mut blocked: HashSet<NodeIndex> = HashSet::from([start]);
    let mut blocked_by: HashMap<NodeIndex, HashSet<NodeIndex>> = HashMap::new();
    let mut stack = vec![Frame {
        node: start,
        successors: scoped_successors(graph, start, members),
        closed: false,
    }];

    while let Some(frame) = stack.last_mut() {
        if let Some(next) = frame.successors.pop() {
            if next == start {
                frame.closed = true;
                sink.push(path.clone())?;
            } else if !blocked.contains(&next) {
                path.push(next);
                blocked.insert(next);
                stack.push(Frame {
                    node: next,
                    successors: scoped_successors(graph, next, members),
                    closed: false,
                });
            }
            continue;
        }

        let Frame { node, closed, .. } = match stack.pop() {
            Some(frame) => frame,
            None => break,
        };
        if closed {
            unblock(node, &mut blocked, &mut blocked_by);
        } else {
            for succ in scoped_successors(graph, node, members) {
                blocked_by.entry(succ).or_default().insert(node);
            }
        }
        if path.pop() != Some(node) {
            return Err(GraphError::Algorithm(
                "circuit search path out of sync with its stack".into(),
            ));
        }
        if let Some(parent) = stack.last_mut() {
            parent.closed |= closed;
        }
    }

    Ok(())
}

fn unblock(
    node: NodeIndex,
    blocked: &mut HashSet<NodeIndex>,
    blocked_by: &mut HashMap<NodeIndex, HashSet<NodeIndex>>,
) {
    let mut work = vec![node];
    while let Some(n) = work.pop() {
        if blocked.remove(&n) {
            if let Some(waiting) = blocked_by.remove(&n) {
                work.extend(waiting);
            }
        }
    }
}
