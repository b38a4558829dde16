//! A minimal linear state graph. Nodes are named state transitions wired with
//! edges; compiling validates the wiring and resolves the execution path.

use crate::{err, error::ShelfError};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

type NodeFn<S> = Box<dyn Fn(S) -> S + Send + Sync>;

/// Builder for a [CompiledGraph].
pub struct StateGraph<S> {
    nodes: Vec<(String, NodeFn<S>)>,
    edges: Vec<(String, String)>,
    entry: Option<String>,
    finish: Option<String>,
}

impl<S> Default for StateGraph<S> {
    fn default() -> Self {
        Self {
            nodes: vec![],
            edges: vec![],
            entry: None,
            finish: None,
        }
    }
}

impl<S> StateGraph<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node<F>(&mut self, name: &str, node: F) -> &mut Self
    where
        F: Fn(S) -> S + Send + Sync + 'static,
    {
        self.nodes.push((name.to_string(), Box::new(node)));
        self
    }

    pub fn add_edge(&mut self, from: &str, to: &str) -> &mut Self {
        self.edges.push((from.to_string(), to.to_string()));
        self
    }

    pub fn set_entry_point(&mut self, name: &str) -> &mut Self {
        self.entry = Some(name.to_string());
        self
    }

    pub fn set_finish_point(&mut self, name: &str) -> &mut Self {
        self.finish = Some(name.to_string());
        self
    }

    /// Validate the graph and resolve the path from the entry to the finish point.
    ///
    /// Errors if the entry or finish point is missing or unknown, a node name is
    /// duplicated, an edge references an unknown node, a node has more than one
    /// outgoing edge, or the finish point cannot be reached from the entry.
    pub fn compile(self) -> Result<CompiledGraph<S>, ShelfError> {
        let Some(entry) = self.entry else {
            return err!(Graph, "entry point not set");
        };

        let Some(finish) = self.finish else {
            return err!(Graph, "finish point not set");
        };

        let mut nodes = HashMap::with_capacity(self.nodes.len());
        for (name, node) in self.nodes {
            if nodes.contains_key(&name) {
                return err!(Graph, "duplicate node '{name}'");
            }
            nodes.insert(name, node);
        }

        for point in [&entry, &finish] {
            if !nodes.contains_key(point) {
                return err!(Graph, "unknown node '{point}'");
            }
        }

        let mut next = HashMap::with_capacity(self.edges.len());
        for (from, to) in self.edges {
            for name in [&from, &to] {
                if !nodes.contains_key(name) {
                    return err!(Graph, "edge '{from}' -> '{to}' references unknown node '{name}'");
                }
            }
            if next.contains_key(&from) {
                return err!(Graph, "node '{from}' has more than one outgoing edge");
            }
            next.insert(from, to);
        }

        let mut path = vec![entry.clone()];
        let mut visited = HashSet::from([entry.clone()]);
        let mut current = entry;

        while current != finish {
            let Some(to) = next.get(&current) else {
                return err!(Graph, "node '{finish}' is not reachable from '{current}'");
            };
            if !visited.insert(to.clone()) {
                return err!(Graph, "cycle detected at node '{to}'");
            }
            path.push(to.clone());
            current = to.clone();
        }

        let mut steps = Vec::with_capacity(path.len());
        for name in path {
            if let Some(node) = nodes.remove(&name) {
                steps.push((name, node));
            }
        }

        for name in nodes.keys() {
            warn!("Node '{name}' is not on the path from the entry to the finish point");
        }

        Ok(CompiledGraph { steps })
    }
}

/// A validated graph, ready to run.
pub struct CompiledGraph<S> {
    steps: Vec<(String, NodeFn<S>)>,
}

impl<S> CompiledGraph<S> {
    /// Names of the nodes in execution order.
    pub fn path(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(|(name, _)| name.as_str())
    }

    /// Pass `state` through every node from the entry to the finish point.
    pub fn invoke(&self, state: S) -> S {
        self.steps.iter().fold(state, |state, (name, node)| {
            debug!("Running node '{name}'");
            node(state)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ShelfErr;

    fn push(c: char) -> impl Fn(String) -> String + Send + Sync {
        move |mut s: String| {
            s.push(c);
            s
        }
    }

    fn assert_graph_err<S>(graph: StateGraph<S>) {
        match graph.compile() {
            Err(e) => assert!(matches!(e.error, ShelfErr::Graph(_))),
            Ok(_) => panic!("graph compiled"),
        }
    }

    #[test]
    fn runs_nodes_in_edge_order() {
        let mut graph = StateGraph::new();
        graph
            .add_node("c", push('c'))
            .add_node("a", push('a'))
            .add_node("b", push('b'))
            .add_edge("b", "c")
            .add_edge("a", "b")
            .set_entry_point("a")
            .set_finish_point("c");

        let graph = graph.compile().unwrap();

        assert_eq!(vec!["a", "b", "c"], graph.path().collect::<Vec<_>>());
        assert_eq!("abc", graph.invoke(String::new()));
    }

    #[test]
    fn single_node() {
        let mut graph = StateGraph::new();
        graph
            .add_node("a", push('a'))
            .set_entry_point("a")
            .set_finish_point("a");

        assert_eq!("a", graph.compile().unwrap().invoke(String::new()));
    }

    #[test]
    fn missing_entry_or_finish() {
        let mut graph = StateGraph::new();
        graph.add_node("a", push('a')).set_finish_point("a");
        assert_graph_err(graph);

        let mut graph = StateGraph::new();
        graph.add_node("a", push('a')).set_entry_point("a");
        assert_graph_err(graph);
    }

    #[test]
    fn unknown_nodes() {
        let mut graph = StateGraph::new();
        graph
            .add_node("a", push('a'))
            .set_entry_point("a")
            .set_finish_point("b");
        assert_graph_err(graph);

        let mut graph = StateGraph::new();
        graph
            .add_node("a", push('a'))
            .add_edge("a", "b")
            .set_entry_point("a")
            .set_finish_point("a");
        assert_graph_err(graph);
    }

    #[test]
    fn duplicate_node() {
        let mut graph = StateGraph::new();
        graph
            .add_node("a", push('a'))
            .add_node("a", push('b'))
            .set_entry_point("a")
            .set_finish_point("a");
        assert_graph_err(graph);
    }

    #[test]
    fn branching() {
        let mut graph = StateGraph::new();
        graph
            .add_node("a", push('a'))
            .add_node("b", push('b'))
            .add_node("c", push('c'))
            .add_edge("a", "b")
            .add_edge("a", "c")
            .set_entry_point("a")
            .set_finish_point("c");
        assert_graph_err(graph);
    }

    #[test]
    fn unreachable_finish() {
        let mut graph = StateGraph::new();
        graph
            .add_node("a", push('a'))
            .add_node("b", push('b'))
            .set_entry_point("a")
            .set_finish_point("b");
        assert_graph_err(graph);
    }

    #[test]
    fn cycle() {
        let mut graph = StateGraph::new();
        graph
            .add_node("a", push('a'))
            .add_node("b", push('b'))
            .add_node("c", push('c'))
            .add_edge("a", "b")
            .add_edge("b", "a")
            .set_entry_point("a")
            .set_finish_point("c");
        assert_graph_err(graph);
    }
}
