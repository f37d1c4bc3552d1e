use std::collections::BTreeSet;
use std::f64::consts::TAU;

use log::{debug, info, warn};
use ordered_float::OrderedFloat;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::ArrangementError;
use crate::geometry::r2::R2;
use crate::geometry::shape::{Shape, ShapeSpec};
use super::edge::{segment_areas, Edge};
use super::intersection::Node;
use super::regions::Regions;

/// Intersection points closer than this merge into one vertex; an adjacent
/// pair at this distance is an apparent tangency and is dropped.
const MERGE_THRESHOLD: f64 = 1e-7;

/// Center offset used to break an exact mutual-containment coincidence,
/// relative to the perturbed shape's mean radius.
const PERTURBATION_SCALE: f64 = 1e-5;

pub const MAX_PERTURBATION_ATTEMPTS: usize = 16;

/// The planar graph induced by a set of shape boundaries: merged intersection
/// vertices, angularly-ordered boundary arcs per shape, and the containment
/// relation between shapes and arcs.
///
/// All cross-references are indices into the flat `shapes`/`nodes`/`edges`
/// arenas. Construction is a pure function of the input shapes except for the
/// mutual-containment perturbation, whose randomness is injected via
/// [`with_rng`].
///
/// [`with_rng`]: Arrangement::with_rng
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Arrangement {
    pub shapes: Vec<Shape>,
    pub nodes: Vec<Node>,
    pub nodes_by_shape: Vec<Vec<usize>>,
    pub edges: Vec<Edge>,
    pub edges_by_shape: Vec<Vec<usize>>,
    /// `containments[i][j]`: `i` and `j` never cross and `i` encloses `j`.
    pub containments: Vec<Vec<bool>>,
    /// Transitive closure of "shares an intersection with".
    pub is_connected: Vec<Vec<bool>>,
    /// Termination oracle for region enumeration: every edge is walked once
    /// per side, except arcs of the unbounded face which are walked once.
    pub total_expected_visits: usize,
}

/// Mutual-containment coincidence between a shape pair; resolved by
/// perturbation, surfaced as an error only once retries run out.
struct Degeneracy {
    i: usize,
    j: usize,
}

impl Arrangement {
    pub fn new(shapes: Vec<Shape>) -> Result<Arrangement, ArrangementError> {
        Self::with_rng(shapes, &mut StdRng::from_entropy())
    }

    pub fn from_specs(specs: &[ShapeSpec]) -> Result<Arrangement, ArrangementError> {
        let shapes = specs
            .iter()
            .map(|spec| spec.shape())
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(shapes)
    }

    /// Builds from a JSON array of [`ShapeSpec`] descriptors.
    pub fn from_json(json: &str) -> Result<Arrangement, ArrangementError> {
        let specs: Vec<ShapeSpec> = serde_json::from_str(json)?;
        Self::from_specs(&specs)
    }

    /// Builds the arrangement, retrying with a small random center offset
    /// whenever two crossing-free shapes each appear to contain the other
    /// (an exactly-coincident placement the intersection math cannot order).
    pub fn with_rng<R: Rng>(
        mut shapes: Vec<Shape>,
        rng: &mut R,
    ) -> Result<Arrangement, ArrangementError> {
        for (idx, shape) in shapes.iter().enumerate() {
            if shape.idx() != idx {
                return Err(ArrangementError::ShapeIndex { expected: idx, found: shape.idx() });
            }
        }
        let mut last = None;
        for attempt in 0..MAX_PERTURBATION_ATTEMPTS {
            match Self::build(&shapes) {
                Ok(arrangement) => return Ok(arrangement),
                Err(Degeneracy { i, j }) => {
                    let radii = shapes[j].radii();
                    let eps = PERTURBATION_SCALE * (radii.x + radii.y) / 2.;
                    let angle = rng.gen_range(0.0..TAU);
                    let v = R2 { x: eps * angle.cos(), y: eps * angle.sin() };
                    warn!(
                        "shapes {} and {} mutually contain each other's centers \
                         (attempt {}); perturbing {} by {}",
                        i, j, attempt, j, v,
                    );
                    shapes[j] = shapes[j].translate(&v);
                    last = Some((i, j));
                }
            }
        }
        let (i, j) = last.expect("retry loop only repeats after a degeneracy");
        Err(ArrangementError::PerturbationExhausted { i, j, attempts: MAX_PERTURBATION_ATTEMPTS })
    }

    /// Enumerates every face of this arrangement with its area.
    pub fn regions(&self) -> Regions {
        Regions::new(self)
    }

    fn build(shapes: &[Shape]) -> Result<Arrangement, Degeneracy> {
        let n = shapes.len();
        let mut nodes: Vec<Node> = Vec::new();
        let mut containments = vec![vec![false; n]; n];
        let mut is_connected = vec![vec![false; n]; n];
        for (idx, row) in is_connected.iter_mut().enumerate() {
            row[idx] = true;
        }

        // Pairwise intersections, merged into shared vertices.
        for i in 0..n {
            for j in (i + 1)..n {
                let mut intersections = shapes[i].intersect(&shapes[j]);
                let mut k = 0;
                while k < intersections.len() {
                    if k + 1 < intersections.len()
                        && intersections[k].p.distance(&intersections[k + 1].p) < MERGE_THRESHOLD
                    {
                        info!(
                            "skipping apparent tangent point: {} == {}",
                            intersections[k],
                            intersections[k + 1],
                        );
                        intersections.remove(k);
                        intersections.remove(k);
                    } else {
                        k += 1;
                    }
                }
                if intersections.is_empty() {
                    let i_holds_j = contains_shape(&shapes[i], &shapes[j]);
                    let j_holds_i = contains_shape(&shapes[j], &shapes[i]);
                    if i_holds_j && j_holds_i {
                        return Err(Degeneracy { i, j });
                    }
                    containments[i][j] = i_holds_j;
                    containments[j][i] = j_holds_i;
                    continue;
                }
                is_connected[i][j] = true;
                is_connected[j][i] = true;
                for intersection in intersections {
                    match nodes
                        .iter_mut()
                        .find(|node| node.p.distance(&intersection.p) < MERGE_THRESHOLD)
                    {
                        Some(node) => {
                            node.merge(&intersection);
                            info!("merged {} into {}", intersection, node);
                        }
                        None => nodes.push(Node::new(nodes.len(), &intersection)),
                    }
                }
            }
        }

        // Transitive closure: shapes reachable through chains of crossings.
        for k in 0..n {
            for a in 0..n {
                if is_connected[a][k] {
                    for b in 0..n {
                        if is_connected[k][b] {
                            is_connected[a][b] = true;
                        }
                    }
                }
            }
        }

        // A shape with no crossings still needs a vertex so its whole
        // boundary is traversable as one edge.
        let mut nodes_by_shape: Vec<Vec<usize>> = vec![Vec::new(); n];
        for node in &nodes {
            for shape_idx in node.shape_thetas.keys() {
                nodes_by_shape[*shape_idx].push(node.idx);
            }
        }
        for (idx, shape) in shapes.iter().enumerate() {
            if nodes_by_shape[idx].is_empty() {
                let node = Node::synthetic(nodes.len(), idx, shape.point(0.));
                nodes_by_shape[idx].push(node.idx);
                nodes.push(node);
            }
        }

        debug!("{} nodes", nodes.len());
        for node in &nodes {
            debug!("  {}", node);
        }

        // Sort each shape's vertices by where they appear on its boundary.
        for (idx, shape_nodes) in nodes_by_shape.iter_mut().enumerate() {
            shape_nodes.sort_by_cached_key(|&node| OrderedFloat(nodes[node].theta(idx)));
        }

        let mut edges: Vec<Edge> = Vec::new();
        let mut edges_by_shape: Vec<Vec<usize>> = Vec::new();
        let mut total_expected_visits = 0;
        for (idx, shape) in shapes.iter().enumerate() {
            let shape_nodes = &nodes_by_shape[idx];
            let m = shape_nodes.len();
            let first = edges.len();
            let radii = shape.radii();
            let mut midpoints = Vec::with_capacity(m);
            for k in 0..m {
                let node0 = shape_nodes[k];
                let node1 = shape_nodes[(k + 1) % m];
                let t0 = nodes[node0].theta(idx);
                let mut t1 = nodes[node1].theta(idx);
                if t1 <= t0 {
                    t1 += TAU;
                }
                let midpoint = shape.arc_midpoint(t0, t1);
                midpoints.push(midpoint);
                let (sector_area, triangle_area, secant_area) = segment_areas(radii, t1 - t0);
                edges.push(Edge {
                    idx: first + k,
                    shape: idx,
                    node0,
                    node1,
                    t0,
                    t1,
                    midpoint,
                    containers: BTreeSet::new(),
                    is_boundary: true,
                    prev: first + (k + m - 1) % m,
                    next: first + (k + 1) % m,
                    sector_area,
                    triangle_area,
                    secant_area,
                });
            }

            // Direct midpoint tests against connected shapes, with a
            // single-edge gap bridged when both cyclic neighbors agree
            // (midpoints that land numerically on a container's boundary
            // near a shared vertex).
            let mut contained = vec![vec![false; n]; m];
            for (k, row) in contained.iter_mut().enumerate() {
                for (cdx, cell) in row.iter_mut().enumerate() {
                    *cell = cdx != idx
                        && is_connected[idx][cdx]
                        && shapes[cdx].contains(&midpoints[k]);
                }
            }
            if m >= 3 {
                let mut bridged = Vec::new();
                for k in 0..m {
                    for cdx in 0..n {
                        if !contained[k][cdx]
                            && contained[(k + m - 1) % m][cdx]
                            && contained[(k + 1) % m][cdx]
                        {
                            bridged.push((k, cdx));
                        }
                    }
                }
                for (k, cdx) in bridged {
                    debug!("bridging containment gap: shape {} edge {} in shape {}", idx, k, cdx);
                    contained[k][cdx] = true;
                }
            }
            for (k, row) in contained.iter().enumerate() {
                let edge = &mut edges[first + k];
                for (cdx, cell) in row.iter().enumerate() {
                    if *cell {
                        edge.containers.insert(cdx);
                        edge.is_boundary = false;
                    }
                }
                // Containers that never cross this shape hold its entire
                // boundary, so every edge gets them; they do not affect
                // which side of the unbounded face the edge is on.
                for cdx in 0..n {
                    if containments[cdx][idx] {
                        edge.containers.insert(cdx);
                    }
                }
                total_expected_visits += edge.expected_visits();
            }
            edges_by_shape.push((first..edges.len()).collect());
        }

        for edge in &edges {
            nodes[edge.node0].add_edge(edge.idx);
            if edge.node1 != edge.node0 {
                nodes[edge.node1].add_edge(edge.idx);
            }
        }

        debug!("{} edges, {} expected visits", edges.len(), total_expected_visits);
        for edge in &edges {
            debug!("  {}", edge);
        }

        Ok(Arrangement {
            shapes: shapes.to_vec(),
            nodes,
            nodes_by_shape,
            edges,
            edges_by_shape,
            containments,
            is_connected,
            total_expected_visits,
        })
    }

    /// SVG arc command for one edge, for the renderer collaborator.
    pub fn edge_path(&self, idx: usize) -> String {
        let edge = &self.edges[idx];
        let shape = &self.shapes[edge.shape];
        edge.svg_path(
            self.nodes[edge.node0].p,
            self.nodes[edge.node1].p,
            shape.radii(),
            shape.rotation(),
        )
    }

    pub fn svg_paths(&self) -> Vec<String> {
        (0..self.edges.len()).map(|idx| self.edge_path(idx)).collect()
    }
}

/// `container` holds `shape` entirely; only meaningful when the two have no
/// boundary crossings. The parameter-0 probe guards against tangency at the
/// center test, the center probe against concentric boundaries.
fn contains_shape(container: &Shape, shape: &Shape) -> bool {
    container.contains(&shape.point(0.)) && container.contains(&shape.center())
}

#[cfg(test)]
mod tests {
    use std::f64::consts::TAU;

    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use test_log::test;

    use crate::geometry::shape::{circle, ellipse};
    use super::*;

    fn boundary_tiling(arrangement: &Arrangement) {
        for (idx, shape) in arrangement.shapes.iter().enumerate() {
            let total: f64 = arrangement.edges_by_shape[idx]
                .iter()
                .map(|&e| arrangement.edges[e].theta())
                .sum();
            assert_relative_eq!(total, TAU, epsilon = 1e-9);
            for &e in &arrangement.edges_by_shape[idx] {
                let (r, _) = shape.polar(&arrangement.edges[e].midpoint);
                assert_relative_eq!(r, 1., epsilon = 1e-9);
            }
            let idxs = &arrangement.edges_by_shape[idx];
            for (k, &e) in idxs.iter().enumerate() {
                assert_eq!(arrangement.edges[e].next, idxs[(k + 1) % idxs.len()]);
                assert_eq!(arrangement.edges[arrangement.edges[e].next].prev, e);
            }
        }
    }

    #[test]
    fn two_circles() {
        let shapes = vec![
            circle(0, 0., 0., 1.).unwrap(),
            circle(1, 1., 0., 1.).unwrap(),
        ];
        let arrangement = Arrangement::new(shapes).unwrap();
        assert_eq!(arrangement.nodes.len(), 2);
        assert_eq!(arrangement.edges.len(), 4);
        for node in &arrangement.nodes {
            assert_relative_eq!(node.p.x, 0.5, epsilon = 1e-9);
            assert_relative_eq!(node.p.y.abs(), 3f64.sqrt() / 2., epsilon = 1e-9);
        }
        // One arc of each circle lies inside the other; the other two border
        // the unbounded face.
        assert_eq!(arrangement.total_expected_visits, 6);
        boundary_tiling(&arrangement);
    }

    #[test]
    fn three_circles() {
        let shapes = vec![
            circle(0, 0., 0., 1.).unwrap(),
            circle(1, 1., 0., 1.).unwrap(),
            circle(2, 0., 1., 1.).unwrap(),
        ];
        let arrangement = Arrangement::new(shapes).unwrap();
        assert_eq!(arrangement.nodes.len(), 6);
        assert_eq!(arrangement.edges.len(), 12);
        assert_eq!(arrangement.total_expected_visits, 21);
        boundary_tiling(&arrangement);
    }

    #[test]
    fn nested_circles() {
        let shapes = vec![
            circle(0, 0., 0., 2.).unwrap(),
            circle(1, 0.2, 0.1, 0.5).unwrap(),
        ];
        let arrangement = Arrangement::new(shapes).unwrap();
        assert!(arrangement.containments[0][1]);
        assert!(!arrangement.containments[1][0]);
        assert_eq!(arrangement.nodes.len(), 2);
        assert!(arrangement.nodes.iter().all(|node| node.is_synthetic()));
        assert_eq!(arrangement.edges.len(), 2);
        let inner = &arrangement.edges[arrangement.edges_by_shape[1][0]];
        assert!(inner.is_loop());
        assert!(inner.containers.contains(&0));
        assert!(inner.is_boundary);
        assert_eq!(arrangement.total_expected_visits, 2);
        boundary_tiling(&arrangement);
    }

    #[test]
    fn rotated_ellipse_and_circle() {
        let shapes = vec![
            ellipse(0, 0., 0., 2., 1., 0.5).unwrap(),
            circle(1, 1.5, 0.5, 1.).unwrap(),
        ];
        let arrangement = Arrangement::new(shapes).unwrap();
        assert_eq!(arrangement.nodes.len(), 2);
        assert_eq!(arrangement.edges.len(), 4);
        boundary_tiling(&arrangement);
    }

    #[test]
    fn coincident_circles_resolve_by_perturbation() {
        let shapes = vec![
            circle(0, 0., 0., 1.).unwrap(),
            circle(1, 0., 0., 1.).unwrap(),
        ];
        let mut rng = StdRng::seed_from_u64(17);
        let arrangement = Arrangement::with_rng(shapes, &mut rng).unwrap();
        // The perturbed pair crosses like any two overlapping circles.
        assert_eq!(arrangement.nodes.len(), 2);
        assert_eq!(arrangement.edges.len(), 4);
        boundary_tiling(&arrangement);
    }

    #[test]
    fn misindexed_shapes_are_rejected() {
        let shapes = vec![circle(1, 0., 0., 1.).unwrap()];
        assert!(matches!(
            Arrangement::new(shapes),
            Err(ArrangementError::ShapeIndex { expected: 0, found: 1 }),
        ));
    }

    #[test]
    fn from_json_descriptors() {
        let arrangement = Arrangement::from_json(
            r#"[
                { "id": 0, "cx": 0.0, "cy": 0.0, "rx": 1.0 },
                { "id": 1, "cx": 1.0, "cy": 0.0, "rx": 1.0 }
            ]"#,
        )
        .unwrap();
        assert_eq!(arrangement.shapes.len(), 2);
        assert_eq!(arrangement.nodes.len(), 2);
    }

    #[test]
    fn svg_paths_cover_all_edges() {
        let shapes = vec![
            circle(0, 0., 0., 1.).unwrap(),
            circle(1, 1., 0., 1.).unwrap(),
        ];
        let arrangement = Arrangement::new(shapes).unwrap();
        let paths = arrangement.svg_paths();
        assert_eq!(paths.len(), arrangement.edges.len());
        for path in &paths {
            assert!(path.starts_with("M "), "{}", path);
            assert!(path.contains(" A "), "{}", path);
        }
    }
}
