use std::f64::consts::TAU;
use std::fmt::{self, Display, Formatter};

use derive_more::From;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::analysis::intersection::Intersection;
use crate::error::ShapeError;
use super::circle::Circle;
use super::conic::Conic;
use super::ellipse::Ellipse;
use super::r2::R2;
use super::transform::{Projection, Transform};

/// The shape kinds the arrangement operates on.
///
/// Downstream code is written against this capability surface (projection,
/// angular parameterization, containment, intersection) rather than the
/// concrete kinds.
#[derive(Debug, Clone, Copy, From, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Shape {
    Circle(Circle),
    Ellipse(Ellipse),
}

pub fn circle(idx: usize, cx: f64, cy: f64, r: f64) -> Result<Shape, ShapeError> {
    Circle::new(idx, R2 { x: cx, y: cy }, r).map(Shape::Circle)
}

pub fn ellipse(
    idx: usize,
    cx: f64,
    cy: f64,
    rx: f64,
    ry: f64,
    t: f64,
) -> Result<Shape, ShapeError> {
    Ellipse::new(idx, R2 { x: cx, y: cy }, R2 { x: rx, y: ry }, t).map(Shape::Ellipse)
}

impl Shape {
    pub fn idx(&self) -> usize {
        match self {
            Shape::Circle(c) => c.idx,
            Shape::Ellipse(e) => e.idx,
        }
    }

    pub fn center(&self) -> R2 {
        match self {
            Shape::Circle(c) => c.c,
            Shape::Ellipse(e) => e.c,
        }
    }

    pub fn radii(&self) -> R2 {
        match self {
            Shape::Circle(c) => R2 { x: c.r, y: c.r },
            Shape::Ellipse(e) => e.r,
        }
    }

    pub fn rotation(&self) -> f64 {
        match self {
            Shape::Circle(_) => 0.,
            Shape::Ellipse(e) => e.t,
        }
    }

    pub fn area(&self) -> f64 {
        match self {
            Shape::Circle(c) => c.area(),
            Shape::Ellipse(e) => e.area(),
        }
    }

    pub fn conic(&self) -> Conic {
        match self {
            Shape::Circle(c) => c.conic(),
            Shape::Ellipse(e) => e.conic,
        }
    }

    /// Carries the world plane onto this shape's unit-circle frame.
    pub fn projection(&self) -> Projection {
        match self {
            Shape::Circle(c) => c.projection(),
            Shape::Ellipse(e) => e.projection(),
        }
    }

    /// World point → this shape's unit-circle frame.
    pub fn transform(&self, p: &R2) -> R2 {
        p.apply(&self.projection())
    }

    /// Unit-circle-frame point → world; exact inverse of [`transform`].
    ///
    /// [`transform`]: Shape::transform
    pub fn invert(&self, p: &R2) -> R2 {
        p.apply(&-self.projection())
    }

    /// Angular parameter in `[−π, π]` of a point at or near the boundary.
    pub fn theta(&self, p: &R2) -> f64 {
        self.transform(p).atan2()
    }

    /// Unit-frame polar coordinates `(r, t)` of a world point.
    pub fn polar(&self, p: &R2) -> (f64, f64) {
        let u = self.transform(p);
        (u.norm(), u.atan2())
    }

    /// Boundary point at angular parameter `t`.
    pub fn point(&self, t: f64) -> R2 {
        let unit = R2 { x: t.cos(), y: t.sin() };
        self.invert(&unit)
    }

    /// Boundary point at the middle of the arc from `t0` forward to `t1`,
    /// wrapping across ±π.
    pub fn arc_midpoint(&self, t0: f64, t1: f64) -> R2 {
        let t1 = if t1 < t0 { t1 + TAU } else { t1 };
        self.point((t0 + t1) / 2.)
    }

    /// Boundary-inclusive interior test.
    pub fn contains(&self, p: &R2) -> bool {
        self.transform(p).norm2() <= 1.
    }

    pub fn translate(&self, v: &R2) -> Shape {
        match self {
            Shape::Circle(c) => c.translate(v).into(),
            Shape::Ellipse(e) => e.translate(v).into(),
        }
    }

    /// Rotation about the origin.
    pub fn rotate(&self, t: f64) -> Shape {
        match self {
            Shape::Circle(c) => c.rotate(t).into(),
            Shape::Ellipse(e) => e.rotate(t).into(),
        }
    }

    /// Rotation about an arbitrary pivot: translate, rotate, translate back.
    pub fn rotate_about(&self, t: f64, pivot: &R2) -> Shape {
        self.translate(&-*pivot).rotate(t).translate(pivot)
    }

    pub fn scale(&self, s: f64) -> Result<Shape, ShapeError> {
        self.scale_xy(&R2 { x: s, y: s })
    }

    pub fn scale_xy(&self, v: &R2) -> Result<Shape, ShapeError> {
        self.transformed(&Transform::Scale(*v))
    }

    /// One primitive affine map, returning a new shape with the implicit
    /// coefficients recomputed through the conic transform algebra where the
    /// parametric form cannot absorb the map directly.
    pub fn transformed(&self, transform: &Transform) -> Result<Shape, ShapeError> {
        match transform {
            Transform::Translate(v) => Ok(self.translate(v)),
            Transform::Rotate(t) => Ok(self.rotate(*t)),
            Transform::Scale(v) => {
                if !v.is_finite() || v.x == 0. || v.y == 0. {
                    return Err(ShapeError::SingularTransform { idx: self.idx() });
                }
                match self {
                    Shape::Circle(c) if v.x == v.y => Ok(c.scale(v.x).into()),
                    Shape::Circle(c) => Ellipse::new(
                        c.idx,
                        c.c * *v,
                        R2 { x: c.r * v.x.abs(), y: c.r * v.y.abs() },
                        0.,
                    )
                    .map(Shape::Ellipse),
                    Shape::Ellipse(e) if e.sin_t == 0. => Ellipse::new(
                        e.idx,
                        e.c * *v,
                        R2 { x: e.r.x * v.x.abs(), y: e.r.y * v.y.abs() },
                        0.,
                    )
                    .map(Shape::Ellipse),
                    Shape::Ellipse(e) => {
                        // Rotated: scale the implicit form, then recover the
                        // parametric one.
                        let inv = Transform::Scale(R2 { x: 1. / v.x, y: 1. / v.y }).matrix();
                        Ellipse::from_conic(e.idx, &e.conic.transformed(&inv))
                            .map(Shape::Ellipse)
                    }
                }
            }
        }
    }

    /// The composition of primitive maps, applied left to right.
    pub fn affine(&self, projection: &Projection) -> Result<Shape, ShapeError> {
        projection
            .0
            .iter()
            .try_fold(*self, |shape, t| shape.transformed(t))
    }

    /// This shape re-expressed in `o`'s unit-circle frame.
    pub fn project(&self, o: &Shape) -> Result<Shape, ShapeError> {
        self.affine(&o.projection())
    }

    /// Boundary crossings with `o`.
    ///
    /// `o` is projected into this shape's unit-circle frame (at the conic
    /// level, so rotated ellipses need no parametric reconstruction), solved
    /// against the unit circle, and the solutions are mapped back to world
    /// coordinates with both shapes' angular parameters attached.
    pub fn intersect(&self, o: &Shape) -> Vec<Intersection> {
        let inverse = -self.projection();
        let projected = o.conic().transformed(&inverse.matrix());
        let points = projected.unit_intersections();
        debug!("{} ∩ {}: {} unit crossings", self, o, points.len());
        points
            .into_iter()
            .map(|u| {
                let p = u.apply(&inverse);
                Intersection {
                    p,
                    c0idx: self.idx(),
                    c1idx: o.idx(),
                    t0: u.atan2(),
                    t1: o.theta(&p),
                }
            })
            .collect()
    }
}

impl Display for Shape {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Circle(c) => c.fmt(f),
            Shape::Ellipse(e) => e.fmt(f),
        }
    }
}

/// Raw shape descriptor as supplied by the shape editor: either the
/// parametric parameters (rotation in degrees, `ry` omitted for a circle) or
/// the implicit conic coefficients. Labels and colors are opaque passthrough
/// metadata, unused by the math.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeSpec {
    pub id: usize,
    #[serde(flatten)]
    pub params: SpecParams,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SpecParams {
    Parametric {
        cx: f64,
        cy: f64,
        rx: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ry: Option<f64>,
        #[serde(default, alias = "rotationDegrees")]
        rotation_degrees: f64,
    },
    Implicit {
        a: f64,
        b: f64,
        c: f64,
        d: f64,
        e: f64,
        f: f64,
    },
}

impl ShapeSpec {
    /// Degrees become radians here, at the input boundary; everything
    /// downstream is radians.
    pub fn shape(&self) -> Result<Shape, ShapeError> {
        match self.params {
            SpecParams::Parametric { cx, cy, rx, ry, rotation_degrees } => {
                let c = R2 { x: cx, y: cy };
                match ry {
                    None => Circle::new(self.id, c, rx).map(Shape::Circle),
                    Some(ry) => Ellipse::new(
                        self.id,
                        c,
                        R2 { x: rx, y: ry },
                        rotation_degrees.to_radians(),
                    )
                    .map(Shape::Ellipse),
                }
            }
            SpecParams::Implicit { a, b, c, d, e, f } => {
                Ellipse::from_conic(self.id, &Conic { a, b, c, d, e, f }).map(Shape::Ellipse)
            }
        }
    }
}
