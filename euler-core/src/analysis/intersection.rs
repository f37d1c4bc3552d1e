use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::geometry::r2::R2;
use crate::math::deg::Deg;

/// A point where two shapes' boundaries cross, as produced by
/// [`Shape::intersect`]: the world point plus each owner's angular parameter.
///
/// [`Shape::intersect`]: crate::geometry::shape::Shape::intersect
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Intersection {
    pub p: R2,
    pub c0idx: usize,
    pub c1idx: usize,
    pub t0: f64,
    pub t1: f64,
}

impl Display for Intersection {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "I({}, C{}({}), C{}({}))",
            self.p,
            self.c0idx,
            self.t0.deg_str(),
            self.c1idx,
            self.t1.deg_str(),
        )
    }
}

/// Angular parameter of a vertex on one shape's boundary, with the trig of
/// the parameter cached for arc evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Theta {
    pub t: f64,
    pub cos: f64,
    pub sin: f64,
}

impl From<f64> for Theta {
    fn from(t: f64) -> Theta {
        let (sin, cos) = t.sin_cos();
        Theta { t, cos, sin }
    }
}

/// A vertex of the arrangement graph: a merged cluster of pairwise
/// intersections, indexed into the node arena.
///
/// Cross-references are arena indices (`edges` points into the edge arena),
/// never owning references. A shape with no crossings gets one synthetic node
/// at parameter 0 so its whole boundary is traversable as a single edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub idx: usize,
    pub p: R2,
    /// Angular parameter on each shape whose boundary passes through here.
    pub shape_thetas: BTreeMap<usize, Theta>,
    /// Incident edge indices; a self-loop edge appears once.
    pub edges: Vec<usize>,
    /// How many raw pairwise intersections were merged into this vertex.
    pub merged: usize,
}

impl Node {
    pub fn new(idx: usize, i: &Intersection) -> Node {
        let mut shape_thetas = BTreeMap::new();
        shape_thetas.insert(i.c0idx, Theta::from(i.t0));
        shape_thetas.insert(i.c1idx, Theta::from(i.t1));
        Node { idx, p: i.p, shape_thetas, edges: Vec::new(), merged: 1 }
    }

    /// Synthetic whole-boundary vertex for a shape with no crossings.
    pub fn synthetic(idx: usize, shape_idx: usize, p: R2) -> Node {
        let mut shape_thetas = BTreeMap::new();
        shape_thetas.insert(shape_idx, Theta::from(0.));
        Node { idx, p, shape_thetas, edges: Vec::new(), merged: 0 }
    }

    /// Fold another near-coincident intersection into this vertex, averaging
    /// the position and keeping the first parameter seen per shape.
    pub fn merge(&mut self, i: &Intersection) {
        let n = self.merged as f64;
        self.p = (self.p * n + i.p) / (n + 1.);
        self.shape_thetas.entry(i.c0idx).or_insert_with(|| Theta::from(i.t0));
        self.shape_thetas.entry(i.c1idx).or_insert_with(|| Theta::from(i.t1));
        self.merged += 1;
    }

    /// Angular parameter of this vertex on shape `idx`.
    ///
    /// Asking for a shape whose boundary does not pass through this vertex is
    /// a graph-construction bug.
    pub fn theta(&self, idx: usize) -> f64 {
        self.shape_thetas
            .get(&idx)
            .unwrap_or_else(|| panic!("node {} is not on shape {}'s boundary", self.idx, idx))
            .t
    }

    pub fn add_edge(&mut self, edge: usize) {
        self.edges.push(edge);
    }

    /// True for the synthetic whole-boundary vertex of a crossing-free shape.
    pub fn is_synthetic(&self) -> bool {
        self.merged == 0
    }
}

impl Display for Node {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "N{}({}: {})",
            self.idx,
            self.p,
            self.shape_thetas
                .iter()
                .map(|(cidx, theta)| format!("C{}({})", cidx, theta.t.deg_str()))
                .collect::<Vec<_>>()
                .join(", "),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intersection(p: R2, c0idx: usize, c1idx: usize, t0: f64, t1: f64) -> Intersection {
        Intersection { p, c0idx, c1idx, t0, t1 }
    }

    #[test]
    fn merge_averages_position() {
        let mut node = Node::new(0, &intersection(R2 { x: 1., y: 0. }, 0, 1, 0.1, 2.,));
        node.merge(&intersection(R2 { x: 1. + 1e-8, y: 0. }, 0, 2, 0.1, -1.));
        assert_eq!(node.merged, 2);
        assert_relative_eq!(node.p.x, 1. + 5e-9, epsilon = 1e-12);
        assert_eq!(node.shape_thetas.len(), 3);
    }

    #[test]
    #[should_panic(expected = "not on shape")]
    fn theta_for_absent_shape_panics() {
        let node = Node::new(0, &intersection(R2 { x: 0., y: 0. }, 0, 1, 0., 0.));
        node.theta(7);
    }
}
