//! User-Plane Topology
//!
//! Node identities for control- and user-plane peers and the set of
//! forwarding nodes the SMF knows about, loaded once from configuration.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use crate::config::UserPlaneConf;

/// Node ID type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeIdType {
    Ipv4,
    Ipv6,
    Fqdn,
}

/// Node identity: an address-family tagged value identifying a peer.
/// Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeId {
    Ipv4(Ipv4Addr),
    Ipv6(Ipv6Addr),
    Fqdn(String),
}

impl NodeId {
    /// Create an IPv4 node ID
    pub fn new_ipv4(addr: Ipv4Addr) -> Self {
        NodeId::Ipv4(addr)
    }

    /// Create an IPv6 node ID
    pub fn new_ipv6(addr: Ipv6Addr) -> Self {
        NodeId::Ipv6(addr)
    }

    /// Create an FQDN node ID
    pub fn new_fqdn(fqdn: impl Into<String>) -> Self {
        NodeId::Fqdn(fqdn.into())
    }

    /// Parse a configured identity string: IPv4 literal, IPv6 literal,
    /// otherwise an FQDN.
    pub fn from_config(s: &str) -> Self {
        if let Ok(addr) = s.parse::<Ipv4Addr>() {
            return NodeId::Ipv4(addr);
        }
        if let Ok(addr) = s.parse::<Ipv6Addr>() {
            return NodeId::Ipv6(addr);
        }
        NodeId::Fqdn(s.to_string())
    }

    /// Address family tag
    pub fn id_type(&self) -> NodeIdType {
        match self {
            NodeId::Ipv4(_) => NodeIdType::Ipv4,
            NodeId::Ipv6(_) => NodeIdType::Ipv6,
            NodeId::Fqdn(_) => NodeIdType::Fqdn,
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeId::Ipv4(addr) => write!(f, "{}", addr),
            NodeId::Ipv6(addr) => write!(f, "{}", addr),
            NodeId::Fqdn(fqdn) => write!(f, "{}", fqdn),
        }
    }
}

/// A declared user-plane node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpNode {
    pub name: String,
    pub node_id: NodeId,
}

/// The set of known user-plane node identities and declared links.
///
/// Populated once at bootstrap and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct UserPlaneTopology {
    /// Nodes by configured name
    nodes: HashMap<String, UpNode>,
    /// Identity set used for membership checks
    node_ids: HashSet<NodeId>,
    /// Declared links between node names, both endpoints known
    links: Vec<(String, String)>,
    /// Malformed entries skipped during load
    skipped: usize,
}

impl UserPlaneTopology {
    /// Load the topology from configuration.
    ///
    /// A malformed node entry (missing name or node id) or a link that
    /// references an undeclared node is skipped and logged; the load itself
    /// never fails.
    pub fn load(conf: &UserPlaneConf) -> Self {
        let mut nodes: HashMap<String, UpNode> = HashMap::new();
        let mut node_ids = HashSet::new();
        let mut skipped = 0;

        for entry in &conf.up_nodes {
            if entry.name.is_empty() {
                log::warn!("user-plane node without a name, skipping");
                skipped += 1;
                continue;
            }
            let id_str = match entry.node_id.as_deref().filter(|s| !s.is_empty()) {
                Some(s) => s,
                None => {
                    log::warn!("[{}] user-plane node without a node id, skipping", entry.name);
                    skipped += 1;
                    continue;
                }
            };
            if nodes.contains_key(&entry.name) {
                log::warn!("[{}] duplicate user-plane node name, skipping", entry.name);
                skipped += 1;
                continue;
            }

            let node_id = NodeId::from_config(id_str);
            node_ids.insert(node_id.clone());
            nodes.insert(
                entry.name.clone(),
                UpNode {
                    name: entry.name.clone(),
                    node_id,
                },
            );
        }

        let mut links = Vec::new();
        for link in &conf.links {
            if nodes.contains_key(&link.a) && nodes.contains_key(&link.b) {
                links.push((link.a.clone(), link.b.clone()));
            } else {
                log::warn!(
                    "link [{}]-[{}] references an undeclared node, skipping",
                    link.a,
                    link.b
                );
                skipped += 1;
            }
        }

        log::info!(
            "user-plane topology loaded: {} node(s), {} link(s)",
            nodes.len(),
            links.len()
        );

        Self {
            nodes,
            node_ids,
            links,
            skipped,
        }
    }

    /// Whether the identity is a known user-plane node
    pub fn contains(&self, id: &NodeId) -> bool {
        self.node_ids.contains(id)
    }

    /// Resolve a configured reference to a node identity.
    ///
    /// A reference is either a declared node name or an identity string that
    /// must itself belong to the topology.
    pub fn resolve(&self, reference: &str) -> Option<NodeId> {
        if let Some(node) = self.nodes.get(reference) {
            return Some(node.node_id.clone());
        }
        let id = NodeId::from_config(reference);
        if self.node_ids.contains(&id) {
            Some(id)
        } else {
            None
        }
    }

    /// Look up a node by name
    pub fn node(&self, name: &str) -> Option<&UpNode> {
        self.nodes.get(name)
    }

    /// Declared links, by node name
    pub fn links(&self) -> &[(String, String)] {
        &self.links
    }

    /// Number of known nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Entries skipped as malformed during load
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}
