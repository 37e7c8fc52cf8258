//! UE Data-Path Graphs
//!
//! Derives, per subscriber, a directed graph over user-plane nodes from the
//! ordered path lists in the UE routing configuration. The first node of a
//! subscriber's first path defines the shared root; every path must start
//! there. Edges are deduplicated consecutive pairs. A node with more than
//! one outgoing edge is a branch point, the candidate location for ULCL
//! traffic-steering decisions.

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet, HashMap};

use thiserror::Error;

use crate::config::PathConf;
use crate::topology::{NodeId, UserPlaneTopology};

/// Data-path validation errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("[{supi}] empty data path in routing configuration")]
    EmptyPath { supi: String },

    #[error("[{supi}] data path starts at {found}, expected root {expected}")]
    InconsistentRoot {
        supi: String,
        expected: NodeId,
        found: NodeId,
    },

    #[error("[{supi}] edge {from} -> {to} would close a cycle")]
    CycleDetected {
        supi: String,
        from: NodeId,
        to: NodeId,
    },

    #[error("[{supi}] data path references unknown user-plane node [{node}]")]
    UnknownNode { supi: String, node: String },
}

/// Directed per-subscriber data-path graph.
///
/// Construction is a pure function of the path list and the topology:
/// identical inputs yield identical node and edge sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UeDataPathGraph {
    supi: String,
    root: NodeId,
    nodes: BTreeSet<NodeId>,
    edges: BTreeMap<NodeId, Vec<NodeId>>,
}

impl UeDataPathGraph {
    /// Build the graph for one subscriber, validating every path against
    /// the user-plane topology.
    pub fn build(
        supi: &str,
        paths: &[PathConf],
        topology: &UserPlaneTopology,
    ) -> Result<Self, RouteError> {
        if paths.is_empty() {
            return Err(RouteError::EmptyPath {
                supi: supi.to_string(),
            });
        }

        let mut root: Option<NodeId> = None;
        let mut nodes = BTreeSet::new();
        let mut edges: BTreeMap<NodeId, Vec<NodeId>> = BTreeMap::new();

        for path in paths {
            if path.upf.is_empty() {
                return Err(RouteError::EmptyPath {
                    supi: supi.to_string(),
                });
            }

            let mut hops = Vec::with_capacity(path.upf.len());
            for reference in &path.upf {
                match topology.resolve(reference) {
                    Some(id) => hops.push(id),
                    None => {
                        return Err(RouteError::UnknownNode {
                            supi: supi.to_string(),
                            node: reference.clone(),
                        })
                    }
                }
            }

            // The first path establishes the root; later paths must agree.
            let first = &hops[0];
            match &root {
                None => root = Some(first.clone()),
                Some(r) if r == first => {}
                Some(r) => {
                    return Err(RouteError::InconsistentRoot {
                        supi: supi.to_string(),
                        expected: r.clone(),
                        found: first.clone(),
                    })
                }
            }
            nodes.insert(first.clone());

            for pair in hops.windows(2) {
                let (a, b) = (&pair[0], &pair[1]);
                if a == b || reaches(&edges, b, a) {
                    return Err(RouteError::CycleDetected {
                        supi: supi.to_string(),
                        from: a.clone(),
                        to: b.clone(),
                    });
                }
                let out = edges.entry(a.clone()).or_default();
                if !out.contains(b) {
                    out.push(b.clone());
                }
                nodes.insert(a.clone());
                nodes.insert(b.clone());
            }
        }

        // paths is non-empty and every path registered its first hop
        let root = root.ok_or_else(|| RouteError::EmptyPath {
            supi: supi.to_string(),
        })?;

        Ok(Self {
            supi: supi.to_string(),
            root,
            nodes,
            edges,
        })
    }

    pub fn supi(&self) -> &str {
        &self.supi
    }

    /// The single in-degree-zero node shared by all of the subscriber's paths
    pub fn root(&self) -> &NodeId {
        &self.root
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.iter()
    }

    pub fn contains_node(&self, node: &NodeId) -> bool {
        self.nodes.contains(node)
    }

    pub fn contains_edge(&self, from: &NodeId, to: &NodeId) -> bool {
        self.edges.get(from).is_some_and(|out| out.contains(to))
    }

    /// Downstream nodes reached directly from `node`
    pub fn successors(&self, node: &NodeId) -> &[NodeId] {
        self.edges.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn out_degree(&self, node: &NodeId) -> usize {
        self.edges.get(node).map_or(0, Vec::len)
    }

    pub fn in_degree(&self, node: &NodeId) -> usize {
        self.edges
            .values()
            .map(|out| out.iter().filter(|n| *n == node).count())
            .sum()
    }

    /// Nodes with more than one outgoing edge, candidate ULCL branch points
    pub fn branch_points(&self) -> Vec<&NodeId> {
        self.edges
            .iter()
            .filter(|(_, out)| out.len() > 1)
            .map(|(node, _)| node)
            .collect()
    }

    /// Nodes with no outgoing edge, the session anchor points
    pub fn leaves(&self) -> Vec<&NodeId> {
        self.nodes
            .iter()
            .filter(|node| self.out_degree(node) == 0)
            .collect()
    }
}

/// DFS reachability over the edges built so far
fn reaches(edges: &BTreeMap<NodeId, Vec<NodeId>>, from: &NodeId, target: &NodeId) -> bool {
    let mut stack = vec![from];
    let mut seen: BTreeSet<&NodeId> = BTreeSet::new();
    while let Some(node) = stack.pop() {
        if node == target {
            return true;
        }
        if !seen.insert(node) {
            continue;
        }
        if let Some(next) = edges.get(node) {
            stack.extend(next.iter());
        }
    }
    false
}

/// Build the per-subscriber graph registry.
///
/// One subscriber's malformed configuration never blocks others: a failed
/// build is logged with the reason and that subscriber is left out of the
/// registry.
pub fn build_registry(
    paths: &HashMap<String, Vec<PathConf>>,
    topology: &UserPlaneTopology,
) -> HashMap<String, UeDataPathGraph> {
    let mut graphs = HashMap::new();
    for (supi, path_list) in paths {
        match UeDataPathGraph::build(supi, path_list, topology) {
            Ok(graph) => {
                log::debug!(
                    "[{}] data-path graph built: {} node(s), {} edge(s)",
                    supi,
                    graph.node_count(),
                    graph.edge_count()
                );
                graphs.insert(supi.clone(), graph);
            }
            Err(e) => log::warn!("[{}] discarding UE routing graph: {}", supi, e),
        }
    }
    graphs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{UpNodeConf, UserPlaneConf};

    fn topology(names: &[&str]) -> UserPlaneTopology {
        UserPlaneTopology::load(&UserPlaneConf {
            up_nodes: names
                .iter()
                .enumerate()
                .map(|(i, name)| UpNodeConf {
                    name: name.to_string(),
                    node_id: Some(format!("10.100.0.{}", i + 1)),
                })
                .collect(),
            links: Vec::new(),
        })
    }

    fn path(hops: &[&str]) -> PathConf {
        PathConf {
            upf: hops.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_build_branching_graph() {
        let topology = topology(&["A", "B", "C", "D"]);
        let graph = UeDataPathGraph::build(
            "imsi-1",
            &[path(&["A", "B", "C"]), path(&["A", "B", "D"])],
            &topology,
        )
        .unwrap();

        let a = topology.resolve("A").unwrap();
        let b = topology.resolve("B").unwrap();
        let c = topology.resolve("C").unwrap();
        let d = topology.resolve("D").unwrap();

        assert_eq!(graph.root(), &a);
        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.edge_count(), 3);
        assert_eq!(graph.out_degree(&b), 2);
        assert_eq!(graph.branch_points(), vec![&b]);
        assert_eq!(graph.leaves(), vec![&c, &d]);
        assert_eq!(graph.in_degree(&a), 0);
        assert!(graph.contains_edge(&a, &b));
        assert!(graph.contains_edge(&b, &c));
        assert!(graph.contains_edge(&b, &d));
    }

    #[test]
    fn test_build_dedups_shared_prefix() {
        let topology = topology(&["A", "B", "C"]);
        let graph = UeDataPathGraph::build(
            "imsi-1",
            &[path(&["A", "B"]), path(&["A", "B", "C"])],
            &topology,
        )
        .unwrap();
        // A -> B appears in both paths but is stored once
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn test_build_empty_path() {
        let topology = topology(&["A"]);
        let err = UeDataPathGraph::build("imsi-1", &[path(&[])], &topology).unwrap_err();
        assert_eq!(
            err,
            RouteError::EmptyPath {
                supi: "imsi-1".to_string()
            }
        );

        let err = UeDataPathGraph::build("imsi-1", &[], &topology).unwrap_err();
        assert!(matches!(err, RouteError::EmptyPath { .. }));
    }

    #[test]
    fn test_build_inconsistent_root() {
        let topology = topology(&["A", "B", "X"]);
        let err = UeDataPathGraph::build(
            "imsi-1",
            &[path(&["A", "B"]), path(&["X", "B"])],
            &topology,
        )
        .unwrap_err();
        assert_eq!(
            err,
            RouteError::InconsistentRoot {
                supi: "imsi-1".to_string(),
                expected: topology.resolve("A").unwrap(),
                found: topology.resolve("X").unwrap(),
            }
        );
    }

    #[test]
    fn test_build_unknown_node() {
        let topology = topology(&["A", "B"]);
        let err =
            UeDataPathGraph::build("imsi-1", &[path(&["A", "Ghost"])], &topology).unwrap_err();
        assert_eq!(
            err,
            RouteError::UnknownNode {
                supi: "imsi-1".to_string(),
                node: "Ghost".to_string(),
            }
        );
    }

    #[test]
    fn test_build_cycle_detected() {
        let topology = topology(&["A", "B", "C"]);
        // second path routes C back to B, closing B -> C -> B
        let err = UeDataPathGraph::build(
            "imsi-1",
            &[path(&["A", "B", "C"]), path(&["A", "B", "C", "B"])],
            &topology,
        )
        .unwrap_err();
        assert!(matches!(err, RouteError::CycleDetected { .. }));
    }

    #[test]
    fn test_build_self_loop_rejected() {
        let topology = topology(&["A", "B"]);
        let err =
            UeDataPathGraph::build("imsi-1", &[path(&["A", "B", "B"])], &topology).unwrap_err();
        assert!(matches!(err, RouteError::CycleDetected { .. }));
    }

    #[test]
    fn test_registry_isolates_failures() {
        let topology = topology(&["A", "B", "C", "X"]);
        let mut paths = HashMap::new();
        paths.insert("imsi-good".to_string(), vec![path(&["A", "B"])]);
        paths.insert("imsi-unknown".to_string(), vec![path(&["A", "Ghost"])]);
        paths.insert(
            "imsi-split-root".to_string(),
            vec![path(&["A", "B"]), path(&["X", "B"])],
        );

        let graphs = build_registry(&paths, &topology);
        assert_eq!(graphs.len(), 1);
        assert!(graphs.contains_key("imsi-good"));
        assert!(!graphs.contains_key("imsi-unknown"));
        assert!(!graphs.contains_key("imsi-split-root"));
    }

    #[test]
    fn test_registry_deterministic() {
        let topology = topology(&["A", "B", "C", "D"]);
        let mut paths = HashMap::new();
        paths.insert(
            "imsi-1".to_string(),
            vec![path(&["A", "B", "C"]), path(&["A", "B", "D"])],
        );
        let first = build_registry(&paths, &topology);
        let second = build_registry(&paths, &topology);
        assert_eq!(first, second);
    }

    #[test]
    fn test_single_hop_path() {
        let topology = topology(&["A"]);
        let graph = UeDataPathGraph::build("imsi-1", &[path(&["A"])], &topology).unwrap();
        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.leaves(), vec![graph.root()]);
    }
}
