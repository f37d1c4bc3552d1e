//! Planar-arrangement and region-area engine for area-proportional Euler
//! diagrams.
//!
//! Given a set of circles and ellipses, the crate computes every pairwise
//! boundary intersection, builds the induced planar graph ([`Arrangement`]),
//! enumerates its faces ([`Regions`]), and reports the exact area of each
//! face keyed by the subset of shapes containing it. An external optimizer
//! fits shape parameters against target region areas by recomputing this
//! table; the computation here is a pure function of the input shapes.

#[cfg_attr(not(test), allow(unused_imports))]
#[macro_use]
extern crate approx;

pub mod analysis;
pub mod error;
pub mod geometry;
pub mod math;

pub use analysis::arrangement::Arrangement;
pub use analysis::edge::Edge;
pub use analysis::intersection::{Intersection, Node};
pub use analysis::regions::{Areas, Region, Regions, Segment};
pub use error::{ArrangementError, ShapeError};
pub use geometry::circle::Circle;
pub use geometry::conic::Conic;
pub use geometry::ellipse::Ellipse;
pub use geometry::r2::R2;
pub use geometry::shape::{circle, ellipse, Shape, ShapeSpec};
pub use geometry::transform::{Projection, Transform};
