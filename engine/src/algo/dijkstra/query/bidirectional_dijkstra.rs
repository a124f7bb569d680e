//! Bidirectional Dijkstra.
//!
//! A forward search on the graph and a backward search on the reversed graph take turns,
//! one node each. The query stops as soon as one side pops a node the other side has already settled.
//! The distance through that meeting node is reported.
//!
//! Note that this stopping rule is weaker than the usual one, which keeps going until the
//! sum of both queue minima exceeds the best meeting distance seen so far.
//! On some graphs the first meeting node is not on a shortest path, and the reported distance is too long.
//! With `EdgeFlagOps` on both sides this is also the bidirectional edge flag query.

use super::*;

pub struct Server<'a, G, FO = DefaultOps, BO = DefaultOps> {
    forward_graph: &'a G,
    backward_graph: &'a G,
    forward_data: DijkstraData,
    backward_data: DijkstraData,
    forward_ops: FO,
    backward_ops: BO,
    meeting_node: Option<NodeId>,
}

impl<'a, G: Graph> Server<'a, G, DefaultOps, DefaultOps> {
    /// `reversed` has to be the reverse graph of `graph`.
    pub fn new(graph: &'a G, reversed: &'a G) -> Self {
        Self::with_ops(graph, reversed, DefaultOps(), DefaultOps())
    }
}

impl<'a, G: Graph, FO, BO> Server<'a, G, FO, BO> {
    pub fn with_ops(graph: &'a G, reversed: &'a G, forward_ops: FO, backward_ops: BO) -> Self {
        assert_eq!(graph.num_nodes(), reversed.num_nodes());
        assert_eq!(graph.num_arcs(), reversed.num_arcs());
        Self {
            forward_graph: graph,
            backward_graph: reversed,
            forward_data: DijkstraData::new(graph.num_nodes()),
            backward_data: DijkstraData::new(graph.num_nodes()),
            forward_ops,
            backward_ops,
            meeting_node: None,
        }
    }

    /// The node where the two searches of the last query met.
    pub fn meeting_node(&self) -> Option<NodeId> {
        self.meeting_node
    }
}

impl<'a, G, FO, BO> Server<'a, G, FO, BO>
where
    G: LinkIterable<LinkWithId> + RandomLinkAccessGraph,
    FO: DijkstraOps<G>,
    BO: DijkstraOps<G>,
{
    fn distance(&mut self, query: Query) -> (Option<Weight>, QueryStats) {
        report!("algo", "Bidirectional Dijkstra Query");
        let (forward_graph, backward_graph) = (self.forward_graph, self.backward_graph);
        let forward_data = &mut self.forward_data;
        let backward_data = &mut self.backward_data;
        let forward_ops = &mut self.forward_ops;
        let backward_ops = &mut self.backward_ops;

        let ((meeting_node, stats), time) = measure(|| {
            let mut forward = DijkstraRun::query(forward_graph, forward_data, forward_ops, query.from, Some(query.to));
            let mut backward = DijkstraRun::query(backward_graph, backward_data, backward_ops, query.to, Some(query.from));

            let meeting_node = loop {
                if forward.min_key().is_none() || backward.min_key().is_none() {
                    break None;
                }

                let node = match forward.pop_next() {
                    Some(node) => node,
                    None => break None,
                };
                if backward.is_settled(node) {
                    break Some(node);
                }
                forward.relax_outgoing(node);

                let node = match backward.pop_next() {
                    Some(node) => node,
                    None => break None,
                };
                if forward.is_settled(node) {
                    break Some(node);
                }
                backward.relax_outgoing(node);
            };

            let stats = forward.counters().into_stats(0).combine(&backward.counters().into_stats(0));
            (meeting_node, stats)
        });

        self.meeting_node = meeting_node;
        let distance = meeting_node.map(|node| self.forward_data.distance(node) + self.backward_data.distance(node));
        let stats = QueryStats {
            execution_time_nanos: time.as_nanos() as u64,
            ..stats
        };
        (distance, stats)
    }

    fn path(&self, query: Query) -> Vec<PathEdge> {
        let meeting_node = match self.meeting_node {
            Some(node) => node,
            None => return Vec::new(),
        };

        let mut path = forward_path_edges(self.forward_graph, &self.forward_data.edge_path(query.from, meeting_node));

        // the backward search tree points from the meeting node towards the target in the forward graph
        for &(tail, rev_edge) in self.backward_data.edge_path(query.to, meeting_node).iter().rev() {
            let Link { node: head, weight } = self.backward_graph.link(rev_edge);
            let link = find_edge(self.forward_graph, head, tail, weight).expect("backward graph is not the reverse of the forward graph");
            path.push(PathEdge {
                from: head,
                to: tail,
                weight,
                edge_id: link.edge_id,
            });
        }

        path
    }
}

pub struct PathServerWrapper<'s, 'a, G, FO, BO>(&'s Server<'a, G, FO, BO>, Query);

impl<'s, 'a, G, FO, BO> PathServer for PathServerWrapper<'s, 'a, G, FO, BO>
where
    G: LinkIterable<LinkWithId> + RandomLinkAccessGraph,
    FO: DijkstraOps<G>,
    BO: DijkstraOps<G>,
{
    fn path(&mut self) -> Vec<PathEdge> {
        Server::path(self.0, self.1)
    }
}

impl<'a, G, FO, BO> QueryServer for Server<'a, G, FO, BO>
where
    G: LinkIterable<LinkWithId> + RandomLinkAccessGraph,
    FO: DijkstraOps<G>,
    BO: DijkstraOps<G>,
{
    type P<'s> = PathServerWrapper<'s, 'a, G, FO, BO> where Self: 's;

    fn query(&mut self, query: Query) -> QueryResult<Self::P<'_>> {
        let (distance, stats) = self.distance(query);
        QueryResult::new(distance, stats, PathServerWrapper(self, query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meets_in_the_middle() {
        let graph = OwnedGraph::from_arcs(5, &[(0, 1, 5), (0, 2, 3), (2, 1, 1), (1, 3, 2), (2, 3, 6)]);
        let reversed = graph.reverse();
        let mut server = Server::new(&graph, &reversed);

        let query = Query { from: 0, to: 3 };
        let mut result = server.query(query);
        assert_eq!(result.distance(), Some(6));
        let path = result.path();
        assert_eq!(path.iter().map(|e| e.weight).sum::<Weight>(), 6);
        assert_eq!(path.first().map(|e| e.from), Some(0));
        assert_eq!(path.last().map(|e| e.to), Some(3));
        for edge in &path {
            assert_eq!(graph.link(edge.edge_id), Link { node: edge.to, weight: edge.weight });
        }
        assert!(server.meeting_node().is_some());

        assert_eq!(server.query(Query { from: 0, to: 4 }).distance(), None);
        assert_eq!(server.meeting_node(), None);

        let mut result = server.query(Query { from: 2, to: 2 });
        assert_eq!(result.distance(), Some(0));
        assert!(result.path().is_empty());
    }

    #[test]
    fn counts_both_directions() {
        let graph = OwnedGraph::from_arcs(5, &[(0, 1, 5), (0, 2, 3), (2, 1, 1), (1, 3, 2), (2, 3, 6)]);
        let reversed = graph.reverse();
        let mut server = Server::new(&graph, &reversed);

        // forward settles 2 and relaxes its two edges, then backward settles 2 and meets
        let stats = *server.query(Query { from: 2, to: 2 }).stats();
        assert_eq!(stats.nodes_scanned, 2);
        assert_eq!(stats.edges_scanned, 2);
        assert_eq!(stats.distance_improvement_count, 2);
    }
}
