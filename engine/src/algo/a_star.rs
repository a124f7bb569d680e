//! Potentials for goal directed search.
//!
//! A potential assigns each node an estimate of its distance to the target.
//! Searching with the reduced weights `w(u, v) - pot(u) + pot(v)` pulls the search towards the target.

use super::*;
use crate::algo::dijkstra::DijkstraOps;
use crate::datastr::timestamped_vector::TimestampedVector;
use crate::geo;

pub trait Potential {
    fn init(&mut self, target: NodeId);
    fn potential(&mut self, node: NodeId) -> Option<Weight>;
}

#[derive(Debug)]
pub struct ZeroPotential();

impl Potential for ZeroPotential {
    fn init(&mut self, _target: NodeId) {}
    fn potential(&mut self, _node: NodeId) -> Option<Weight> {
        Some(0)
    }
}

/// Great circle distance to the target in DIMACS units.
/// Values are computed lazily and cached until the next `init`.
#[derive(Debug, Clone)]
pub struct GreatCirclePotential<'a> {
    coords: &'a Coordinates,
    target: Option<(i32, i32)>,
    cache: TimestampedVector<Weight>,
}

impl<'a> GreatCirclePotential<'a> {
    pub fn new(coords: &'a Coordinates) -> Self {
        Self {
            coords,
            target: None,
            cache: TimestampedVector::new(coords.len(), INFINITY),
        }
    }
}

impl<'a> Potential for GreatCirclePotential<'a> {
    fn init(&mut self, target: NodeId) {
        self.target = Some(self.coords.get(target));
        self.cache.reset();
    }

    fn potential(&mut self, node: NodeId) -> Option<Weight> {
        let target = self.target?;
        if self.cache[node as usize] == INFINITY {
            let dist = geo::distance(self.coords.get(node), target);
            self.cache.set(node as usize, dist);
        }
        Some(self.cache[node as usize])
    }
}

/// Reduced weight of an edge `tail -> head` with the given potentials.
/// When the reduction would become negative the original weight is kept,
/// so the search still runs on non negative weights.
#[inline]
pub fn reduced_weight(weight: Weight, tail_potential: Weight, head_potential: Weight) -> Weight {
    let reduced = i64::from(weight) - i64::from(tail_potential) + i64::from(head_potential);
    if reduced < 0 {
        weight
    } else {
        reduced.min(i64::from(INFINITY)) as Weight
    }
}

/// Relaxation with reduced weights according to a potential.
/// The potential is initialized with the target of each search.
#[derive(Debug)]
pub struct PotentialOps<P> {
    potential: P,
}

impl<P> PotentialOps<P> {
    pub fn new(potential: P) -> Self {
        Self { potential }
    }
}

impl<G, P: Potential> DijkstraOps<G> for PotentialOps<P> {
    fn init(&mut self, target: Option<NodeId>) {
        if let Some(target) = target {
            self.potential.init(target);
        }
    }

    #[inline]
    fn link_weight(&mut self, _graph: &G, tail: NodeId, link: &LinkWithId) -> Option<Weight> {
        match (self.potential.potential(tail), self.potential.potential(link.node)) {
            (Some(tail_pot), Some(head_pot)) => Some(reduced_weight(link.weight, tail_pot, head_pot)),
            _ => Some(link.weight),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_reductions_are_rejected() {
        assert_eq!(reduced_weight(10, 4, 1), 7);
        assert_eq!(reduced_weight(10, 4, 9), 15);
        assert_eq!(reduced_weight(2, 9, 1), 2);
        assert_eq!(reduced_weight(5, 5, 0), 0);
    }

    #[test]
    fn potential_is_distance_to_target() {
        let coords = Coordinates::from_pairs(&[(0, 0), (0, 1_000_000), (0, 2_000_000)]).unwrap();
        let mut pot = GreatCirclePotential::new(&coords);
        pot.init(2);
        assert_eq!(pot.potential(2), Some(0));
        assert_eq!(pot.potential(1), Some(geo::distance((0, 1_000_000), (0, 2_000_000))));
        assert_eq!(pot.potential(1), Some(geo::distance((0, 1_000_000), (0, 2_000_000))));
        pot.init(0);
        assert_eq!(pot.potential(0), Some(0));
        assert_eq!(pot.potential(2), Some(geo::distance((0, 0), (0, 2_000_000))));
    }
}
