//! Goal directed Dijkstra on graphs with geo coordinates.
//!
//! Runs the plain query on weights reduced by the great circle distance to the target.
//! The graph itself is never modified, reduced weights only live during relaxation.

use super::*;
use crate::algo::a_star::*;

pub struct Server<'a, G, P = GreatCirclePotential<'a>> {
    dijkstra: dijkstra::Server<'a, G, PotentialOps<P>>,
}

impl<'a, G: Graph> Server<'a, G, GreatCirclePotential<'a>> {
    pub fn new(graph: &'a G, coords: &'a Coordinates) -> Self {
        assert_eq!(graph.num_nodes(), coords.len());
        Self::with_potential(graph, GreatCirclePotential::new(coords))
    }
}

impl<'a, G: Graph, P: Potential> Server<'a, G, P> {
    pub fn with_potential(graph: &'a G, potential: P) -> Self {
        Self {
            dijkstra: dijkstra::Server::with_ops(graph, PotentialOps::new(potential)),
        }
    }
}

impl<'a, G, P> QueryServer for Server<'a, G, P>
where
    G: LinkIterable<LinkWithId> + RandomLinkAccessGraph,
    P: Potential,
{
    type P<'s> = dijkstra::PathServerWrapper<'s, 'a, G, PotentialOps<P>> where Self: 's;

    fn query(&mut self, query: Query) -> QueryResult<Self::P<'_>> {
        let (reduced_distance, stats) = self.dijkstra.distance(query);
        // the search distance is in reduced weights, report the length of the path found
        let distance = reduced_distance.map(|_| self.dijkstra.path(query).iter().map(|edge| edge.weight).sum());
        QueryResult::new(distance, stats, dijkstra::PathServerWrapper(&self.dijkstra, query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_shortest_path_on_line() {
        // three nodes on a meridian, one degree apart, plus a detour node
        let coords = Coordinates::from_pairs(&[(0, 0), (0, 1_000_000), (0, 2_000_000), (1_000_000, 1_000_000)]).unwrap();
        let d = |a: NodeId, b: NodeId| crate::geo::distance(coords.get(a), coords.get(b));
        let graph = OwnedGraph::from_arcs(
            4,
            &[
                (0, 1, d(0, 1) + 10),
                (1, 2, d(1, 2) + 10),
                (0, 3, d(0, 3) + 10),
                (3, 2, d(3, 2) + 10),
            ],
        );

        let mut server = Server::new(&graph, &coords);
        let query = Query { from: 0, to: 2 };
        let mut result = server.query(query);
        assert_eq!(result.distance(), Some(d(0, 1) + d(1, 2) + 20));
        assert_eq!(result.node_path(query), vec![0, 1, 2]);

        let mut plain = dijkstra::Server::new(&graph);
        assert_eq!(plain.query(query).distance(), Some(d(0, 1) + d(1, 2) + 20));
    }

    #[test]
    fn zero_potential_is_plain_dijkstra() {
        let graph = OwnedGraph::from_arcs(4, &[(0, 1, 5), (0, 2, 3), (2, 1, 1), (1, 3, 2), (2, 3, 6)]);
        let mut server = Server::with_potential(&graph, ZeroPotential());
        assert_eq!(server.query(Query { from: 0, to: 3 }).distance(), Some(6));
        assert_eq!(server.query(Query { from: 3, to: 0 }).distance(), None);
    }
}
