use std::collections::BTreeSet;
use std::f64::consts::PI;
use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::geometry::r2::R2;
use crate::math::deg::Deg;

/// A directed boundary arc of one shape between two angularly-adjacent
/// vertices, indexed into the edge arena.
///
/// `t0 ≤ t1 ≤ t0 + 2π` always holds (the span is taken the positive way), so
/// one shape's edges tile its boundary exactly once. Endpoints, neighbors,
/// and containers are arena indices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub idx: usize,
    /// Index of the owning shape.
    pub shape: usize,
    pub node0: usize,
    pub node1: usize,
    pub t0: f64,
    pub t1: f64,
    /// Boundary point at the wrapped mean parameter.
    pub midpoint: R2,
    /// Shapes whose interior contains `midpoint`.
    pub containers: BTreeSet<usize>,
    /// No shape connected to the owner contains this arc: it borders the
    /// unbounded face and is traversed from one side only.
    pub is_boundary: bool,
    /// Previous edge in the owner's cyclic boundary order.
    pub prev: usize,
    /// Next edge in the owner's cyclic boundary order.
    pub next: usize,
    /// Area swept by the arc about the shape center: `rx·ry·Δt / 2`.
    pub sector_area: f64,
    /// Area of the center/endpoints triangle: `rx·ry·sin(Δt) / 2`.
    pub triangle_area: f64,
    /// Area between the arc and its chord: sector minus triangle.
    pub secant_area: f64,
}

/// Circular-segment decomposition of the arc spanning `dt` on a shape with
/// the given semi-axes, valid for `dt` in `[0, 2π]`.
pub fn segment_areas(radii: R2, dt: f64) -> (f64, f64, f64) {
    let half = radii.x * radii.y / 2.;
    let sector = half * dt;
    let triangle = half * dt.sin();
    (sector, triangle, sector - triangle)
}

impl Edge {
    /// Angular span `Δt`, always positive.
    pub fn theta(&self) -> f64 {
        let span = self.t1 - self.t0;
        if span < 0. {
            panic!("edge {} has negative angular span {}", self.idx, span);
        }
        span
    }

    /// Whole-boundary edge of a shape with no crossings.
    pub fn is_loop(&self) -> bool {
        self.node0 == self.node1
    }

    pub fn expected_visits(&self) -> usize {
        if self.is_boundary {
            1
        } else {
            2
        }
    }

    /// The endpoint opposite `node`.
    ///
    /// Passing a vertex that is not an endpoint indicates a bug in graph
    /// construction and fails loudly.
    pub fn other_end(&self, node: usize) -> usize {
        if node == self.node0 {
            self.node1
        } else if node == self.node1 {
            self.node0
        } else {
            panic!("node {} is not an endpoint of edge {}", node, self.idx);
        }
    }

    /// The owner plus every container: the shapes this arc is contained by
    /// or runs along the border of.
    pub fn all_idxs(&self) -> BTreeSet<usize> {
        let mut idxs = self.containers.clone();
        idxs.insert(self.shape);
        idxs
    }

    /// SVG path command for this arc: `M x0,y0 A rx,ry rot large-arc sweep x1,y1`.
    ///
    /// The sweep flag assumes the y-up mathematical frame; a y-down screen
    /// renderer flips it. A whole-boundary loop is emitted as two half arcs
    /// through the stored midpoint.
    pub fn svg_path(&self, p0: R2, p1: R2, radii: R2, rotation: f64) -> String {
        let rot = rotation.deg();
        if self.is_loop() {
            let m = self.midpoint;
            format!(
                "M {},{} A {},{} {} 0 1 {},{} A {},{} {} 0 1 {},{}",
                p0.x, p0.y, radii.x, radii.y, rot, m.x, m.y, radii.x, radii.y, rot, p1.x, p1.y,
            )
        } else {
            let large_arc = if self.theta() > PI { 1 } else { 0 };
            format!(
                "M {},{} A {},{} {} {} 1 {},{}",
                p0.x, p0.y, radii.x, radii.y, rot, large_arc, p1.x, p1.y,
            )
        }
    }
}

impl Display for Edge {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let containers: Vec<String> = self.containers.iter().map(|i| i.to_string()).collect();
        write!(
            f,
            "C{}: N{}({}) → N{}({}), containers: [{}] ({})",
            self.shape,
            self.node0,
            self.t0.deg_str(),
            self.node1,
            self.t1.deg_str(),
            containers.join(","),
            if self.is_boundary { "external" } else { "internal" },
        )
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::{FRAC_PI_2, PI, TAU};

    use super::*;

    fn edge(node0: usize, node1: usize, t0: f64, t1: f64) -> Edge {
        let (sector_area, triangle_area, secant_area) =
            segment_areas(R2 { x: 1., y: 1. }, t1 - t0);
        Edge {
            idx: 0,
            shape: 0,
            node0,
            node1,
            t0,
            t1,
            midpoint: R2 { x: 0., y: 0. },
            containers: BTreeSet::new(),
            is_boundary: true,
            prev: 0,
            next: 0,
            sector_area,
            triangle_area,
            secant_area,
        }
    }

    #[test]
    fn unit_semicircle_areas() {
        let e = edge(0, 1, -FRAC_PI_2, FRAC_PI_2);
        assert_relative_eq!(e.sector_area, PI / 2., epsilon = 1e-12);
        assert_relative_eq!(e.triangle_area, 0., epsilon = 1e-12);
        assert_relative_eq!(e.secant_area, PI / 2., epsilon = 1e-12);
    }

    #[test]
    fn full_loop_secant_is_whole_area() {
        let (sector, triangle, secant) = segment_areas(R2 { x: 2., y: 0.5 }, TAU);
        assert_relative_eq!(sector, PI, epsilon = 1e-12);
        assert_relative_eq!(triangle, 0., epsilon = 1e-12);
        assert_relative_eq!(secant, PI, epsilon = 1e-12);
    }

    #[test]
    fn other_end_swaps() {
        let e = edge(3, 5, 0., 1.);
        assert_eq!(e.other_end(3), 5);
        assert_eq!(e.other_end(5), 3);
    }

    #[test]
    #[should_panic(expected = "not an endpoint")]
    fn other_end_rejects_stranger() {
        edge(3, 5, 0., 1.).other_end(4);
    }
}
