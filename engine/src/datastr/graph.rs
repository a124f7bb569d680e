//! Something with graphs 🤷‍♂️
//!
//! Several traits and structs for working with static road graphs.

use std::ops::Range;

pub mod coordinates;
pub mod first_out_graph;

pub use self::coordinates::Coordinates;
pub use self::first_out_graph::{degrees_to_first_out, OwnedGraph};

/// Node ids are 32bit unsigned ints, dense and 0-based.
/// The 1-based ids of the DIMACS files are converted at the I/O boundary.
pub type NodeId = u32;
/// Edge ids are 32bit unsigned ints
pub type EdgeId = u32;
/// Basic weights are 32bit unsigned ints
pub type Weight = u32;
/// A sufficiently large infinity constant.
/// Set to `u32::MAX / 2` so that `INFINITY + x` for `x <= INFINITY` does not overflow.
pub const INFINITY: Weight = std::u32::MAX / 2;

pub trait Arc {
    fn head(&self) -> NodeId;
}

/// Simple struct for weighted links.
/// No behaviour, just a pure data struct.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Link {
    pub node: NodeId,
    pub weight: Weight,
}

impl Arc for Link {
    #[inline(always)]
    fn head(&self) -> NodeId {
        self.node
    }
}

/// A weighted link which also knows its own edge id.
/// Needed wherever per edge data (like edge flags) has to be looked up during a search.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LinkWithId {
    pub node: NodeId,
    pub weight: Weight,
    pub edge_id: EdgeId,
}

impl Arc for LinkWithId {
    #[inline(always)]
    fn head(&self) -> NodeId {
        self.node
    }
}

/// Base trait for graphs.
/// Interesting behaviour will be added through subtraits.
pub trait Graph {
    fn num_nodes(&self) -> usize;
    fn num_arcs(&self) -> usize;
    fn degree(&self, node: NodeId) -> usize;
}

pub trait LinkIterable<L>: Graph {
    /// Type of the outgoing neighbor iterator.
    type Iter<'a>: Iterator<Item = L>
    where
        Self: 'a;

    /// Get a iterator over the outgoing links of the given node.
    fn link_iter(&self, node: NodeId) -> Self::Iter<'_>;
}

/// Trait for graph types which allow random access to links based on edge ids.
pub trait RandomLinkAccessGraph: Graph {
    /// Get the link with the given id.
    fn link(&self, edge_id: EdgeId) -> Link;
    /// Find the id of the first edge from `from` to `to` if it exists.
    fn edge_index(&self, from: NodeId, to: NodeId) -> Option<EdgeId>;
    /// Get the range of edge ids which make up the outgoing edges of `node`
    fn neighbor_edge_indices(&self, node: NodeId) -> Range<EdgeId>;

    /// Get the range of edge ids which make up the outgoing edges of `node` as a `Range<usize>`
    #[inline(always)]
    fn neighbor_edge_indices_usize(&self, node: NodeId) -> Range<usize> {
        let range = self.neighbor_edge_indices(node);
        Range {
            start: range.start as usize,
            end: range.end as usize,
        }
    }
}

/// Generic Trait for building reversed graphs.
/// Type setup similar to `FromIter` for `std::iter::collect`.
pub trait BuildReversed<G> {
    /// Create a new graph with all edges reversed
    fn reversed(graph: &G) -> Self;
}
