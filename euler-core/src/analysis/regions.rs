use std::collections::{BTreeSet, HashMap};
use std::f64::consts::{PI, TAU};

use itertools::Itertools;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::geometry::r2::R2;
use super::arrangement::Arrangement;
use super::edge::Edge;

/// One directed traversal of an edge: `fwd` walks from `node0` to `node1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub edge: usize,
    pub fwd: bool,
}

impl Segment {
    pub fn start(&self, edges: &[Edge]) -> usize {
        let edge = &edges[self.edge];
        if self.fwd {
            edge.node0
        } else {
            edge.node1
        }
    }

    pub fn end(&self, edges: &[Edge]) -> usize {
        let edge = &edges[self.edge];
        if self.fwd {
            edge.node1
        } else {
            edge.node0
        }
    }
}

/// A maximal connected face of the arrangement: its ordered boundary and the
/// set of shapes whose interior contains it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// Sorted shape ids, comma-joined: `"0,2"`.
    pub key: String,
    pub container_idxs: BTreeSet<usize>,
    pub segments: Vec<Segment>,
    pub area: f64,
}

/// Region areas accumulated into every non-empty subset of each region key,
/// so "area covered by at least shapes {A, B}" is a single lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Areas {
    pub map: HashMap<String, f64>,
    pub n: usize,
}

impl Areas {
    pub fn key<I: IntoIterator<Item = usize>>(idxs: I) -> String {
        idxs.into_iter().map(|i| i.to_string()).collect::<Vec<_>>().join(",")
    }

    fn new(regions: &[Region], n: usize) -> Areas {
        let mut map = HashMap::new();
        for region in regions {
            for subset in region.container_idxs.iter().powerset() {
                if subset.is_empty() {
                    continue;
                }
                *map.entry(Areas::key(subset.into_iter().copied())).or_insert(0.) += region.area;
            }
        }
        Areas { map, n }
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.map.get(key).copied()
    }

    pub fn area<I: IntoIterator<Item = usize>>(&self, idxs: I) -> Option<f64> {
        self.get(&Areas::key(idxs))
    }
}

/// Every face of an arrangement, found by exhaustive traversal of its
/// edge/vertex graph, with the powerset-accumulated area table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Regions {
    pub regions: Vec<Region>,
    pub areas: Areas,
    pub total_visits: usize,
}

impl Regions {
    pub fn new(arrangement: &Arrangement) -> Regions {
        let edges = &arrangement.edges;
        let mut visits = vec![0usize; edges.len()];
        let mut total_visits = 0;
        let mut regions: Vec<Region> = Vec::new();

        // Whole-boundary loops first: each is a face on its own, and can
        // never join a multi-edge walk (a walk needs a second shape at the
        // shared vertex).
        for edge in edges.iter().filter(|edge| edge.is_loop()) {
            let mut container_idxs = edge.containers.clone();
            container_idxs.insert(edge.shape);
            visits[edge.idx] += 1;
            total_visits += 1;
            regions.push(Region {
                key: Areas::key(container_idxs.iter().copied()),
                container_idxs,
                segments: vec![Segment { edge: edge.idx, fwd: true }],
                area: edge.secant_area,
            });
        }

        struct Frame {
            successors: Vec<Segment>,
            next: usize,
            containers: BTreeSet<usize>,
        }

        for seed in 0..edges.len() {
            if total_visits == arrangement.total_expected_visits {
                break;
            }
            if visits[seed] == edges[seed].expected_visits() {
                continue;
            }
            // Each face's first edge can be walked forward without loss of
            // generality; the other side is someone else's first edge.
            let seed_segment = Segment { edge: seed, fwd: true };
            let start = seed_segment.start(edges);
            let mut path = vec![seed_segment];
            let mut stack = vec![Frame {
                successors: successors(arrangement, &visits, &seed_segment),
                next: 0,
                containers: edges[seed].all_idxs(),
            }];
            while !stack.is_empty() {
                let depth = stack.len();
                let frame = stack.last_mut().expect("loop condition keeps the stack non-empty");
                if frame.next == frame.successors.len() {
                    stack.pop();
                    path.pop();
                    continue;
                }
                let candidate = frame.successors[frame.next];
                frame.next += 1;
                let containers = frame.containers.clone();
                let edge = &edges[candidate.edge];
                // Budgets move under frames whenever a sibling walk closes a
                // face, so successor lists can be stale.
                if visits[candidate.edge] >= edge.expected_visits() {
                    continue;
                }
                let nxt_idxs = edge.all_idxs();
                let both: BTreeSet<usize> =
                    containers.intersection(&nxt_idxs).copied().collect();
                if depth == 1 {
                    // The first two segments seed the face's shape set; a walk
                    // whose only shared shapes never cross the walk's own
                    // component cannot close into a face.
                    let shape0 = edges[seed].shape;
                    if !both.iter().any(|&c| arrangement.is_connected[shape0][c]) {
                        continue;
                    }
                } else {
                    // Later segments must preserve the set, and may add at
                    // most their own boundary shape.
                    if both.len() < containers.len() {
                        continue;
                    }
                    let extra: Vec<usize> =
                        nxt_idxs.difference(&containers).copied().collect();
                    if extra.len() > 1 || (extra.len() == 1 && extra[0] != edge.shape) {
                        continue;
                    }
                }
                // An edge may repeat within one walk from the other side
                // only.
                if path
                    .iter()
                    .any(|s| s.edge == candidate.edge && s.fwd == candidate.fwd)
                {
                    continue;
                }
                if candidate.end(edges) == start {
                    // Closing the loop: the last edge must also change shape
                    // relative to the first.
                    if edge.shape == edges[path[0].edge].shape {
                        continue;
                    }
                    let mut segments = path.clone();
                    segments.push(candidate);
                    for segment in &segments {
                        visits[segment.edge] += 1;
                        total_visits += 1;
                    }
                    let area = region_area(arrangement, &segments);
                    let region = Region {
                        key: Areas::key(both.iter().copied()),
                        container_idxs: both.clone(),
                        segments,
                        area,
                    };
                    debug!("region {}: area {}", region.key, region.area);
                    regions.push(region);
                    continue;
                }
                path.push(candidate);
                let successors = successors(arrangement, &visits, &candidate);
                stack.push(Frame { successors, next: 0, containers: both });
            }
        }

        if total_visits != arrangement.total_expected_visits {
            panic!(
                "region traversal visited edges {} times, expected {}",
                total_visits, arrangement.total_expected_visits,
            );
        }

        // Crossing-free shapes are holes in the face their container set
        // names; cut their full area out of it.
        for (jdx, shape) in arrangement.shapes.iter().enumerate() {
            let edge_idxs = &arrangement.edges_by_shape[jdx];
            if edge_idxs.len() != 1 {
                continue;
            }
            let edge = &edges[edge_idxs[0]];
            if !edge.is_loop() || !arrangement.nodes[edge.node0].is_synthetic() {
                continue;
            }
            if edge.containers.is_empty() {
                continue;
            }
            let key = Areas::key(edge.containers.iter().copied());
            match regions.iter_mut().find(|region| region.key == key) {
                Some(region) => {
                    debug!("shape {} is a hole in region {}", jdx, key);
                    region.area -= shape.area();
                }
                None => warn!("no region with key {} to cut hole {} out of", key, jdx),
            }
        }

        let areas = Areas::new(&regions, arrangement.shapes.len());
        Regions { regions, areas, total_visits }
    }

    /// Area of the union of all shapes: the faces partition it exactly.
    pub fn total_area(&self) -> f64 {
        self.regions.iter().map(|region| region.area).sum()
    }
}

/// Eligible continuations of a walk: edges at the end vertex that change
/// shape and still have visit budget.
fn successors(arrangement: &Arrangement, visits: &[usize], segment: &Segment) -> Vec<Segment> {
    let edges = &arrangement.edges;
    let end = segment.end(edges);
    let shape = edges[segment.edge].shape;
    arrangement.nodes[end]
        .edges
        .iter()
        .filter_map(|&idx| {
            let edge = &edges[idx];
            if edge.shape == shape || visits[idx] >= edge.expected_visits() {
                return None;
            }
            Some(Segment { edge: idx, fwd: edge.node0 == end })
        })
        .collect()
}

/// Signed-secant face area.
///
/// A lens (two edges) is the sum of its arcs' secant areas, signed by
/// traversal direction. A polygonal face adds the shoelace area of its
/// vertices, with the secant signs flipped when the walk ran clockwise;
/// either way the face area is the absolute value of the total.
fn region_area(arrangement: &Arrangement, segments: &[Segment]) -> f64 {
    let edges = &arrangement.edges;
    if segments.len() <= 2 {
        return segments
            .iter()
            .map(|s| {
                let sign = if s.fwd { 1. } else { -1. };
                sign * edges[s.edge].secant_area
            })
            .sum::<f64>()
            .abs();
    }
    let vertices: Vec<R2> = segments
        .iter()
        .map(|s| arrangement.nodes[s.start(edges)].p)
        .collect();
    let m = vertices.len();
    let shoelace: f64 = (0..m)
        .map(|i| vertices[i].cross(&vertices[(i + 1) % m]))
        .sum::<f64>()
        / 2.;
    let orient = if is_ccw(&vertices) { 1. } else { -1. };
    let secants: f64 = segments
        .iter()
        .map(|s| {
            let sign = if s.fwd { 1. } else { -1. };
            sign * orient * edges[s.edge].secant_area
        })
        .sum();
    (shoelace + secants).abs()
}

/// Traversal orientation from the successive polar angles of the vertices
/// about their centroid: positive accumulated winding is counter-clockwise.
fn is_ccw(vertices: &[R2]) -> bool {
    let m = vertices.len();
    let centroid = vertices.iter().fold(R2 { x: 0., y: 0. }, |acc, v| acc + *v) / m as f64;
    let mut winding = 0.;
    for i in 0..m {
        let a = (vertices[i] - centroid).atan2();
        let b = (vertices[(i + 1) % m] - centroid).atan2();
        let mut d = b - a;
        if d > PI {
            d -= TAU;
        } else if d < -PI {
            d += TAU;
        }
        winding += d;
    }
    winding > 0.
}
