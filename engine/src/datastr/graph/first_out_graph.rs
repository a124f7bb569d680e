//! Goto static graph representation for route planning algorithms.
//!
//! Nodes and edges can be identified by a unique id, going from `0` to `n-1` and `m-1` respectively, where `n` is the number of nodes and `m` the number of directed arcs.
//! We store the graph as an adjacency array using three collections: `first_out`, `head` and `weight`.
//! `head` and `weight` have each `m` elements.
//! `first_out` has `n+1` elements.
//! The first element of `first_out` is always 0 and the last one `m`.
//! `first_out[x]` contains the id of the first edge that is an outgoing edge of node `x`.
//! Thus, `head[first_out[x]..first_out[x+1]]` contains all neighbors of `x`.

use super::*;

/// Owned adjacency array graph.
/// The structure is immutable after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedGraph {
    // index of first edge of each node +1 entry in the end
    first_out: Vec<EdgeId>,
    // the node ids to which each edge points
    head: Vec<NodeId>,
    // the weight of each edge
    weight: Vec<Weight>,
    // true if this graph was created by reversing another graph
    is_reversed: bool,
}

impl OwnedGraph {
    /// Create a new `OwnedGraph` from the three containers.
    pub fn new(first_out: Vec<EdgeId>, head: Vec<NodeId>, weight: Vec<Weight>) -> OwnedGraph {
        assert!(first_out.len() < <NodeId>::max_value() as usize);
        assert!(head.len() < <EdgeId>::max_value() as usize);
        assert_eq!(first_out.first().copied(), Some(0));
        assert_eq!(first_out.last().map(|&m| m as usize), Some(head.len()));
        assert_eq!(weight.len(), head.len());
        debug_assert!(first_out.windows(2).all(|w| w[0] <= w[1]));
        debug_assert!(head.iter().all(|&h| (h as usize) < first_out.len() - 1));

        OwnedGraph {
            first_out,
            head,
            weight,
            is_reversed: false,
        }
    }

    /// Build a graph with `num_nodes` nodes from a list of `(tail, head, weight)` arcs.
    /// The relative order of the outgoing arcs of each node is the order in `arcs`.
    pub fn from_arcs(num_nodes: usize, arcs: &[(NodeId, NodeId, Weight)]) -> OwnedGraph {
        let mut adjacency_lists: Vec<Vec<Link>> = vec![Vec::new(); num_nodes];
        for &(tail, head, weight) in arcs {
            assert!((tail as usize) < num_nodes && (head as usize) < num_nodes);
            adjacency_lists[tail as usize].push(Link { node: head, weight });
        }
        OwnedGraph::from_adjancecy_lists(adjacency_lists)
    }

    pub fn from_adjancecy_lists(adjancecy_lists: Vec<Vec<Link>>) -> OwnedGraph {
        // create first_out array by doing a prefix sum over the adjancecy list sizes
        let first_out = {
            let degrees = adjancecy_lists.iter().map(|neighbors| neighbors.len() as EdgeId);
            degrees_to_first_out(degrees).collect()
        };

        // append all adjancecy list and split the pairs into two seperate vectors
        let (head, weight) = adjancecy_lists
            .into_iter()
            .flat_map(|neighbors| neighbors.into_iter().map(|Link { node, weight }| (node, weight)))
            .unzip();

        OwnedGraph::new(first_out, head, weight)
    }

    /// Borrow a slice of the first_out data
    pub fn first_out(&self) -> &[EdgeId] {
        &self.first_out
    }
    /// Borrow a slice of the head data
    pub fn head(&self) -> &[NodeId] {
        &self.head
    }
    /// Borrow a slice of the weight data
    pub fn weight(&self) -> &[Weight] {
        &self.weight
    }

    /// Was this graph built by reversing another one?
    pub fn is_reversed(&self) -> bool {
        self.is_reversed
    }

    /// Create the independent reverse graph: every arc flipped, weights preserved.
    pub fn reverse(&self) -> OwnedGraph {
        let mut reversed = <OwnedGraph as BuildReversed<OwnedGraph>>::reversed(self);
        reversed.is_reversed = !self.is_reversed;
        reversed
    }

    /// Tail node of an edge. `O(log n)`.
    pub fn tail(&self, edge_id: EdgeId) -> NodeId {
        debug_assert!((edge_id as usize) < self.num_arcs());
        // first_out is sorted, the tail is the last node whose first edge is not after edge_id
        (self.first_out.partition_point(|&first| first <= edge_id) - 1) as NodeId
    }

    /// Iterate over all edges as `(tail, link with id)` in edge id order.
    pub fn edges(&self) -> impl Iterator<Item = (NodeId, LinkWithId)> + '_ {
        (0..self.num_nodes() as NodeId).flat_map(move |node| LinkIterable::<LinkWithId>::link_iter(self, node).map(move |link| (node, link)))
    }
}

impl<G: LinkIterable<Link>> BuildReversed<G> for OwnedGraph {
    fn reversed(graph: &G) -> Self {
        // vector of adjacency lists for the reverse graph
        let mut reversed: Vec<Vec<Link>> = (0..graph.num_nodes()).map(|_| Vec::<Link>::new()).collect();

        // iterate over all edges and insert them in the reversed structure
        for node in 0..(graph.num_nodes() as NodeId) {
            for Link { node: neighbor, weight } in LinkIterable::<Link>::link_iter(graph, node) {
                reversed[neighbor as usize].push(Link { node, weight });
            }
        }

        OwnedGraph::from_adjancecy_lists(reversed)
    }
}

impl Graph for OwnedGraph {
    fn num_nodes(&self) -> usize {
        self.first_out.len() - 1
    }

    fn num_arcs(&self) -> usize {
        self.head.len()
    }

    fn degree(&self, node: NodeId) -> usize {
        let node = node as usize;
        (self.first_out[node + 1] - self.first_out[node]) as usize
    }
}

impl LinkIterable<Link> for OwnedGraph {
    #[allow(clippy::type_complexity)]
    type Iter<'a> = std::iter::Map<std::iter::Zip<std::slice::Iter<'a, NodeId>, std::slice::Iter<'a, Weight>>, fn((&NodeId, &Weight)) -> Link>;

    #[inline]
    fn link_iter(&self, node: NodeId) -> Self::Iter<'_> {
        let range = self.neighbor_edge_indices_usize(node);
        self.head[range.clone()]
            .iter()
            .zip(self.weight[range].iter())
            .map(|(&neighbor, &weight)| Link { node: neighbor, weight })
    }
}

impl LinkIterable<LinkWithId> for OwnedGraph {
    #[allow(clippy::type_complexity)]
    type Iter<'a> = std::iter::Map<
        std::iter::Zip<Range<EdgeId>, std::iter::Zip<std::slice::Iter<'a, NodeId>, std::slice::Iter<'a, Weight>>>,
        fn((EdgeId, (&NodeId, &Weight))) -> LinkWithId,
    >;

    #[inline]
    fn link_iter(&self, node: NodeId) -> Self::Iter<'_> {
        let range = self.neighbor_edge_indices_usize(node);
        self.neighbor_edge_indices(node)
            .zip(self.head[range.clone()].iter().zip(self.weight[range].iter()))
            .map(|(edge_id, (&neighbor, &weight))| LinkWithId {
                node: neighbor,
                weight,
                edge_id,
            })
    }
}

impl LinkIterable<NodeId> for OwnedGraph {
    type Iter<'a> = std::iter::Cloned<std::slice::Iter<'a, NodeId>>;

    fn link_iter(&self, node: NodeId) -> Self::Iter<'_> {
        self.head[self.neighbor_edge_indices_usize(node)].iter().cloned()
    }
}

impl RandomLinkAccessGraph for OwnedGraph {
    #[inline]
    fn link(&self, edge_id: EdgeId) -> Link {
        Link {
            node: self.head[edge_id as usize],
            weight: self.weight[edge_id as usize],
        }
    }

    fn edge_index(&self, from: NodeId, to: NodeId) -> Option<EdgeId> {
        let first_out = self.first_out[from as usize];
        let range = self.neighbor_edge_indices_usize(from);
        self.head[range].iter().position(|&head| head == to).map(|pos| pos as EdgeId + first_out)
    }

    #[inline]
    fn neighbor_edge_indices(&self, node: NodeId) -> Range<EdgeId> {
        self.first_out[node as usize]..self.first_out[(node + 1) as usize]
    }
}

/// Build a first_out array from an iterator of degrees
pub fn degrees_to_first_out<I: Iterator<Item = EdgeId>>(degrees: I) -> impl Iterator<Item = EdgeId> {
    std::iter::once(0).chain(degrees.scan(0, |state, degree| {
        *state += degree as EdgeId;
        Some(*state)
    }))
}
