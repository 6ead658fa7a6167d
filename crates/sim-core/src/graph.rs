//! Road network: nodes, symmetric weighted edges and shortest paths.

use crate::{NodeId, NodeKind, Position, RoadType};
use serde::{Deserialize, Serialize};
use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap};
use thiserror::Error;
use tracing::debug;

/// Errors from building or querying the road network.
#[derive(Debug, Error, PartialEq)]
pub enum GraphError {
    /// A node with this id was already added.
    #[error("duplicate node: {0}")]
    DuplicateNode(NodeId),
    /// Edge endpoint does not exist.
    #[error("unknown node: {0}")]
    UnknownNode(NodeId),
    /// Edge distances must be finite and strictly positive.
    #[error("invalid edge weight {0}, must be > 0")]
    InvalidWeight(f64),
    /// Edges must connect two distinct nodes.
    #[error("edge from {0} to itself")]
    SelfLoop(NodeId),
    /// The nodes are not connected, or one of them is unknown.
    #[error("no path from {from} to {to}")]
    NoPathFound { from: NodeId, to: NodeId },
}

/// A map node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub position: Position,
}

/// Undirected edge view, reported once per connected pair.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub a: NodeId,
    pub b: NodeId,
    pub distance: f64,
    pub road: RoadType,
}

/// Result of a shortest-path query: node sequence from start to end inclusive.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub nodes: Vec<NodeId>,
    pub cost: f64,
}

impl Route {
    /// Number of edges travelled.
    pub fn hops(&self) -> usize {
        self.nodes.len().saturating_sub(1)
    }
}

#[derive(Clone, Copy, Debug)]
struct Link {
    to: usize,
    distance: f64,
    road: RoadType,
}

/// Heap key ordered by `f64::total_cmp`. Weights are validated positive and finite.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Cost(f64);

impl Eq for Cost {}

impl PartialOrd for Cost {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Cost {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Owns nodes and bidirectional edges. Node and edge order follow insertion.
#[derive(Clone, Debug, Default)]
pub struct GraphMap {
    nodes: Vec<Node>,
    index: HashMap<NodeId, usize>,
    adjacency: Vec<Vec<Link>>,
}

impl GraphMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(
        &mut self,
        id: NodeId,
        kind: NodeKind,
        position: Position,
    ) -> Result<(), GraphError> {
        if self.index.contains_key(&id) {
            return Err(GraphError::DuplicateNode(id));
        }
        self.index.insert(id.clone(), self.nodes.len());
        self.nodes.push(Node { id, kind, position });
        self.adjacency.push(Vec::new());
        Ok(())
    }

    /// Insert the symmetric pair a<->b, replacing any existing edge between them.
    pub fn add_edge(
        &mut self,
        a: &NodeId,
        b: &NodeId,
        distance: f64,
        road: RoadType,
    ) -> Result<(), GraphError> {
        let ia = self.idx(a)?;
        let ib = self.idx(b)?;
        if !(distance.is_finite() && distance > 0.0) {
            return Err(GraphError::InvalidWeight(distance));
        }
        if ia == ib {
            return Err(GraphError::SelfLoop(a.clone()));
        }
        self.upsert_link(ia, ib, distance, road);
        self.upsert_link(ib, ia, distance, road);
        debug!(%a, %b, distance, ?road, "edge added");
        Ok(())
    }

    fn upsert_link(&mut self, from: usize, to: usize, distance: f64, road: RoadType) {
        let links = &mut self.adjacency[from];
        match links.iter_mut().find(|l| l.to == to) {
            Some(link) => {
                link.distance = distance;
                link.road = road;
            }
            None => links.push(Link { to, distance, road }),
        }
    }

    fn idx(&self, id: &NodeId) -> Result<usize, GraphError> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| GraphError::UnknownNode(id.clone()))
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.index.contains_key(id)
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    /// All nodes in insertion order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn nodes_of_kind(&self, pred: impl Fn(NodeKind) -> bool) -> Vec<&Node> {
        self.nodes.iter().filter(|n| pred(n.kind)).collect()
    }

    /// Each undirected edge once, ordered by first endpoint insertion.
    pub fn edges(&self) -> Vec<Edge> {
        let mut out = Vec::new();
        for (i, links) in self.adjacency.iter().enumerate() {
            for link in links.iter().filter(|l| l.to > i) {
                out.push(Edge {
                    a: self.nodes[i].id.clone(),
                    b: self.nodes[link.to].id.clone(),
                    distance: link.distance,
                    road: link.road,
                });
            }
        }
        out
    }

    /// Direct connection between two nodes, if any.
    pub fn edge(&self, a: &NodeId, b: &NodeId) -> Option<(f64, RoadType)> {
        let ia = *self.index.get(a)?;
        let ib = *self.index.get(b)?;
        self.adjacency[ia]
            .iter()
            .find(|l| l.to == ib)
            .map(|l| (l.distance, l.road))
    }

    /// Adjacent nodes of `id` in edge insertion order.
    pub fn neighbors<'a>(
        &'a self,
        id: &NodeId,
    ) -> impl Iterator<Item = (&'a NodeId, f64, RoadType)> + 'a {
        let links: &'a [Link] = match self.index.get(id) {
            Some(&i) => &self.adjacency[i],
            None => &[],
        };
        links
            .iter()
            .map(move |l| (&self.nodes[l.to].id, l.distance, l.road))
    }

    /// Total distance along `path`, or None if a hop has no edge.
    pub fn path_cost(&self, path: &[NodeId]) -> Option<f64> {
        let mut total = 0.0;
        for pair in path.windows(2) {
            total += self.edge(&pair[0], &pair[1])?.0;
        }
        Some(total)
    }

    /// Dijkstra over edge distances.
    ///
    /// Equal-cost alternatives resolve to the path discovered first: a node's
    /// predecessor is only replaced on strict improvement, neighbours are
    /// relaxed in edge insertion order and heap ties pop in push order.
    pub fn shortest_path(&self, from: &NodeId, to: &NodeId) -> Result<Route, GraphError> {
        let no_path = || GraphError::NoPathFound {
            from: from.clone(),
            to: to.clone(),
        };
        let start = self.idx(from).map_err(|_| no_path())?;
        let goal = self.idx(to).map_err(|_| no_path())?;
        if start == goal {
            return Ok(Route {
                nodes: vec![from.clone()],
                cost: 0.0,
            });
        }

        let n = self.nodes.len();
        let mut dist = vec![f64::INFINITY; n];
        let mut prev: Vec<Option<usize>> = vec![None; n];
        let mut settled = vec![false; n];
        let mut heap: BinaryHeap<Reverse<(Cost, u64, usize)>> = BinaryHeap::new();
        let mut seq = 0u64;

        dist[start] = 0.0;
        heap.push(Reverse((Cost(0.0), seq, start)));
        while let Some(Reverse((Cost(d), _, u))) = heap.pop() {
            if settled[u] {
                continue;
            }
            settled[u] = true;
            if u == goal {
                break;
            }
            for link in &self.adjacency[u] {
                let v = link.to;
                if settled[v] {
                    continue;
                }
                let nd = d + link.distance;
                if nd < dist[v] {
                    dist[v] = nd;
                    prev[v] = Some(u);
                    seq += 1;
                    heap.push(Reverse((Cost(nd), seq, v)));
                }
            }
        }

        if !settled[goal] {
            debug!(%from, %to, "no path");
            return Err(no_path());
        }
        let mut rev = vec![goal];
        let mut cur = goal;
        while let Some(p) = prev[cur] {
            rev.push(p);
            cur = p;
        }
        Ok(Route {
            nodes: rev
                .into_iter()
                .rev()
                .map(|i| self.nodes[i].id.clone())
                .collect(),
            cost: dist[goal],
        })
    }
}
