//! Building blocks for point to point routing algorithms.

use crate::datastr::graph::*;
use serde::Serialize;

pub mod a_star;
pub mod dijkstra;
pub mod edge_flags;
pub mod partition;

/// Simply a source-target pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Query {
    pub from: NodeId,
    pub to: NodeId,
}

/// Counters and running time of a single query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueryStats {
    pub execution_time_nanos: u64,
    /// Number of nodes extracted from the queue
    pub nodes_scanned: usize,
    /// Number of edges looked at during relaxation, edges pruned by flags are not counted
    pub edges_scanned: usize,
    /// Number of successful relaxations
    pub distance_improvement_count: usize,
}

impl QueryStats {
    /// Sum up the counters of two searches, e.g. the two directions of a bidirectional query.
    pub fn combine(&self, other: &QueryStats) -> QueryStats {
        QueryStats {
            execution_time_nanos: self.execution_time_nanos + other.execution_time_nanos,
            nodes_scanned: self.nodes_scanned + other.nodes_scanned,
            edges_scanned: self.edges_scanned + other.edges_scanned,
            distance_improvement_count: self.distance_improvement_count + other.distance_improvement_count,
        }
    }
}

/// One edge of a shortest path, in the orientation of the forward graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PathEdge {
    pub from: NodeId,
    pub to: NodeId,
    pub weight: Weight,
    pub edge_id: EdgeId,
}

/// Generic container for query results.
/// Since queries modify the state of the internal algorithm data structures,
/// it is impossible to retrieve a path for an older query result once a new query was performed.
/// This type use rusts lifetimes to enforce this behaviour through the method signatures.
#[derive(Debug)]
pub struct QueryResult<P> {
    distance: Option<Weight>,
    stats: QueryStats,
    path_server: P,
}

impl<P: PathServer> QueryResult<P> {
    pub fn new(distance: Option<Weight>, stats: QueryStats, path_server: P) -> Self {
        Self { distance, stats, path_server }
    }

    /// Shortest path distance, `None` if the target is unreachable.
    pub fn distance(&self) -> Option<Weight> {
        self.distance
    }

    pub fn has_path(&self) -> bool {
        self.distance.is_some()
    }

    pub fn stats(&self) -> &QueryStats {
        &self.stats
    }

    /// The edges of the path from source to target. Empty if there is no path.
    pub fn path(&mut self) -> Vec<PathEdge> {
        if self.has_path() {
            self.path_server.path()
        } else {
            Vec::new()
        }
    }

    /// The nodes of the path from source to target. Empty if there is no path.
    pub fn node_path(&mut self, query: Query) -> Vec<NodeId> {
        if !self.has_path() {
            return Vec::new();
        }
        std::iter::once(query.from).chain(self.path().into_iter().map(|edge| edge.to)).collect()
    }
}

pub trait QueryServer {
    type P<'s>: PathServer
    where
        Self: 's;

    fn query(&mut self, query: Query) -> QueryResult<Self::P<'_>>;
}

pub trait PathServer {
    fn path(&mut self) -> Vec<PathEdge>;
}

/// Find an edge `from -> to` with exactly the given weight.
/// With parallel edges the first one in adjacency order wins.
pub(crate) fn find_edge<G: LinkIterable<LinkWithId>>(graph: &G, from: NodeId, to: NodeId, weight: Weight) -> Option<LinkWithId> {
    graph.link_iter(from).find(|link| link.node == to && link.weight == weight)
}
