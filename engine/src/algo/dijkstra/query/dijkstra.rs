//! Plain unidirectional point to point query.
//! With `EdgeFlagOps` this is also the edge flag query.

use super::*;

pub struct Server<'a, G, O = DefaultOps> {
    graph: &'a G,
    data: DijkstraData,
    ops: O,
}

impl<'a, G: Graph> Server<'a, G, DefaultOps> {
    pub fn new(graph: &'a G) -> Self {
        Self::with_ops(graph, DefaultOps())
    }
}

impl<'a, G: Graph, O> Server<'a, G, O> {
    pub fn with_ops(graph: &'a G, ops: O) -> Self {
        Self {
            graph,
            data: DijkstraData::new(graph.num_nodes()),
            ops,
        }
    }
}

impl<'a, G, O> Server<'a, G, O>
where
    G: LinkIterable<LinkWithId> + RandomLinkAccessGraph,
    O: DijkstraOps<G>,
{
    /// Run the search until `query.to` is settled or the queue runs empty.
    /// The returned distance is in terms of the weights produced by the ops.
    pub(super) fn distance(&mut self, query: Query) -> (Option<Weight>, QueryStats) {
        report!("algo", "Dijkstra Query");
        let graph = self.graph;
        let data = &mut self.data;
        let ops = &mut self.ops;

        let (counters, time) = measure(|| {
            let mut run = DijkstraRun::query(graph, data, ops, query.from, Some(query.to));
            while let Some(node) = run.pop_next() {
                if node == query.to {
                    break;
                }
                run.relax_outgoing(node);
            }
            run.counters()
        });

        let distance = Some(self.data.distance(query.to)).filter(|&dist| dist < INFINITY);
        (distance, counters.into_stats(time.as_nanos() as u64))
    }

    pub(super) fn path(&self, query: Query) -> Vec<PathEdge> {
        forward_path_edges(self.graph, &self.data.edge_path(query.from, query.to))
    }

    /// Tentative distance of any node after the last query.
    pub fn tentative_distance(&self, node: NodeId) -> Weight {
        self.data.distance(node)
    }
}

pub struct PathServerWrapper<'s, 'a, G, O>(pub(super) &'s Server<'a, G, O>, pub(super) Query);

impl<'s, 'a, G, O> PathServer for PathServerWrapper<'s, 'a, G, O>
where
    G: LinkIterable<LinkWithId> + RandomLinkAccessGraph,
    O: DijkstraOps<G>,
{
    fn path(&mut self) -> Vec<PathEdge> {
        Server::path(self.0, self.1)
    }
}

impl<'a, G, O> QueryServer for Server<'a, G, O>
where
    G: LinkIterable<LinkWithId> + RandomLinkAccessGraph,
    O: DijkstraOps<G>,
{
    type P<'s> = PathServerWrapper<'s, 'a, G, O> where Self: 's;

    fn query(&mut self, query: Query) -> QueryResult<Self::P<'_>> {
        let (distance, stats) = self.distance(query);
        QueryResult::new(distance, stats, PathServerWrapper(self, query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_example() {
        // 0 -5-> 1, 0 -3-> 2, 2 -1-> 1, 1 -2-> 3, 2 -6-> 3
        let graph = OwnedGraph::from_arcs(5, &[(0, 1, 5), (0, 2, 3), (2, 1, 1), (1, 3, 2), (2, 3, 6)]);
        let mut server = Server::new(&graph);

        let query = Query { from: 0, to: 3 };
        let mut result = server.query(query);
        assert_eq!(result.distance(), Some(6));
        assert_eq!(result.node_path(query), vec![0, 2, 1, 3]);
        assert_eq!(result.stats().nodes_scanned, 4);

        let mut result = server.query(Query { from: 0, to: 4 });
        assert_eq!(result.distance(), None);
        assert!(!result.has_path());
        assert!(result.path().is_empty());

        let mut result = server.query(Query { from: 3, to: 3 });
        assert_eq!(result.distance(), Some(0));
        assert!(result.path().is_empty());
    }
}
