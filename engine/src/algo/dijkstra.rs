//! Dijkstra's algorithm and the building blocks shared by all query variants.
//!
//! `DijkstraRun` drives the search on a `DijkstraData` scratch state.
//! What happens when an edge gets relaxed is customized through `DijkstraOps`,
//! which allows to prune edges (edge flags) or to modify weights (goal direction) without touching the graph.

use super::*;
use crate::datastr::{index_heap::*, timestamped_vector::*};

pub mod query;

/// Priority Queue entries
#[derive(Copy, Clone, Eq, PartialEq, Debug, PartialOrd, Ord)]
pub struct State<W> {
    pub key: W,
    pub node: NodeId,
}

impl<W> Indexing for State<W> {
    #[inline]
    fn as_index(&self) -> usize {
        self.node as usize
    }
}

/// Customization point for the relaxation of edges.
pub trait DijkstraOps<G> {
    /// Called once at the beginning of each search with the node the search is directed at.
    /// For one to all searches this is `None`.
    fn init(&mut self, _target: Option<NodeId>) {}

    /// The weight with which `link` should be relaxed when leaving `tail`.
    /// `None` means the edge must not be relaxed at all.
    fn link_weight(&mut self, graph: &G, tail: NodeId, link: &LinkWithId) -> Option<Weight>;
}

/// Relax every edge with its original weight.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultOps();

impl<G> DijkstraOps<G> for DefaultOps {
    #[inline(always)]
    fn link_weight(&mut self, _graph: &G, _tail: NodeId, link: &LinkWithId) -> Option<Weight> {
        Some(link.weight)
    }
}

impl<G, O: DijkstraOps<G>> DijkstraOps<G> for &mut O {
    fn init(&mut self, target: Option<NodeId>) {
        (**self).init(target)
    }

    #[inline(always)]
    fn link_weight(&mut self, graph: &G, tail: NodeId, link: &LinkWithId) -> Option<Weight> {
        (**self).link_weight(graph, tail, link)
    }
}

/// Per direction scratch state of a search.
/// Allocated once per graph and reused for every query.
#[derive(Debug, Clone)]
pub struct DijkstraData {
    pub distances: TimestampedVector<Weight>,
    /// Predecessor node and the id of the edge used to reach a node.
    /// Only meaningful for nodes with a finite distance.
    pub predecessors: Vec<(NodeId, EdgeId)>,
    pub settled: TimestampedVector<bool>,
    pub queue: IndexdMinHeap<State<Weight>>,
}

impl DijkstraData {
    pub fn new(n: usize) -> Self {
        Self {
            distances: TimestampedVector::new(n, INFINITY),
            predecessors: vec![(n as NodeId, 0); n],
            settled: TimestampedVector::new(n, false),
            queue: IndexdMinHeap::new(n),
        }
    }

    fn reset(&mut self) {
        self.queue.clear();
        self.distances.reset();
        self.settled.reset();
    }

    /// Tentative distance of a node, `INFINITY` if not reached yet.
    pub fn distance(&self, node: NodeId) -> Weight {
        self.distances[node as usize]
    }

    pub fn is_settled(&self, node: NodeId) -> bool {
        self.settled[node as usize]
    }

    /// Follow the predecessors from `to` back to `from`.
    /// Returns `(tail, edge_id)` pairs in the order from `from` to `to`.
    /// `to` has to be reached by the last search.
    pub fn edge_path(&self, from: NodeId, to: NodeId) -> Vec<(NodeId, EdgeId)> {
        debug_assert!(self.distance(to) < INFINITY);
        let mut path = Vec::new();
        let mut cur = to;

        while cur != from {
            let (pred, edge_id) = self.predecessors[cur as usize];
            path.push((pred, edge_id));
            cur = pred;
        }

        path.reverse();

        path
    }
}

/// Counters of a single search run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchCounters {
    pub nodes_scanned: usize,
    pub edges_scanned: usize,
    pub distance_improvements: usize,
}

impl SearchCounters {
    pub fn into_stats(self, execution_time_nanos: u64) -> QueryStats {
        QueryStats {
            execution_time_nanos,
            nodes_scanned: self.nodes_scanned,
            edges_scanned: self.edges_scanned,
            distance_improvement_count: self.distance_improvements,
        }
    }
}

/// A single Dijkstra search from one source node.
///
/// Nodes move from unseen (distance `INFINITY`) to the queue on their first improvement
/// and become settled when they are popped. Settled nodes are never touched again.
pub struct DijkstraRun<'a, G, O> {
    graph: &'a G,
    data: &'a mut DijkstraData,
    ops: O,
    counters: SearchCounters,
}

impl<'a, G, O> DijkstraRun<'a, G, O>
where
    G: LinkIterable<LinkWithId>,
    O: DijkstraOps<G>,
{
    /// Reset the scratch state and start a search from `source`, heading for `target` if given.
    pub fn query(graph: &'a G, data: &'a mut DijkstraData, mut ops: O, source: NodeId, target: Option<NodeId>) -> Self {
        data.reset();
        ops.init(target);
        data.distances.set(source as usize, 0);
        data.predecessors[source as usize] = (source, 0);
        data.queue.push(State { key: 0, node: source });

        Self {
            graph,
            data,
            ops,
            counters: SearchCounters::default(),
        }
    }

    /// Pop the next node from the queue and mark it as settled.
    /// Its outgoing edges are not relaxed yet.
    pub fn pop_next(&mut self) -> Option<NodeId> {
        let State { node, .. } = self.data.queue.pop()?;
        self.counters.nodes_scanned += 1;
        self.data.settled.set(node as usize, true);
        Some(node)
    }

    /// Relax all outgoing edges of a settled node.
    pub fn relax_outgoing(&mut self, tail: NodeId) {
        debug_assert!(self.data.is_settled(tail));
        let tail_distance = self.data.distances[tail as usize];

        for link in self.graph.link_iter(tail) {
            let weight = match self.ops.link_weight(self.graph, tail, &link) {
                Some(weight) => weight,
                None => continue,
            };
            self.counters.edges_scanned += 1;

            let head = link.node as usize;
            if self.data.settled[head] {
                continue;
            }

            let linked = tail_distance.saturating_add(weight);
            if linked < self.data.distances[head] {
                self.data.distances.set(head, linked);
                self.data.predecessors[head] = (tail, link.edge_id);
                self.counters.distance_improvements += 1;

                let next = State { key: linked, node: link.node };
                if self.data.queue.contains_index(head) {
                    self.data.queue.decrease_key(next);
                } else {
                    self.data.queue.push(next);
                }
            }
        }
    }

    /// Pop the next node and relax its edges.
    pub fn settle_next_node(&mut self) -> Option<NodeId> {
        let node = self.pop_next()?;
        self.relax_outgoing(node);
        Some(node)
    }

    /// Smallest key in the queue
    pub fn min_key(&self) -> Option<Weight> {
        self.data.queue.peek().map(|state| state.key)
    }

    pub fn tentative_distance(&self, node: NodeId) -> Weight {
        self.data.distance(node)
    }

    pub fn is_settled(&self, node: NodeId) -> bool {
        self.data.is_settled(node)
    }

    pub fn counters(&self) -> SearchCounters {
        self.counters
    }
}

impl<'a, G, O> Iterator for DijkstraRun<'a, G, O>
where
    G: LinkIterable<LinkWithId>,
    O: DijkstraOps<G>,
{
    type Item = NodeId;

    #[inline]
    fn next(&mut self) -> Option<NodeId> {
        self.settle_next_node()
    }
}

/// Turn a predecessor edge path of a forward search into `PathEdge`s.
pub(crate) fn forward_path_edges<G: RandomLinkAccessGraph>(graph: &G, edges: &[(NodeId, EdgeId)]) -> Vec<PathEdge> {
    edges
        .iter()
        .map(|&(tail, edge_id)| {
            let Link { node, weight } = graph.link(edge_id);
            PathEdge {
                from: tail,
                to: node,
                weight,
                edge_id,
            }
        })
        .collect()
}
