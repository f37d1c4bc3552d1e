use std::f64::consts::PI;
use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::error::ShapeError;
use super::conic::Conic;
use super::r2::R2;
use super::transform::{Projection, Transform};

/// A circle, the cheap special case of the ellipse kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub idx: usize,
    pub c: R2,
    pub r: f64,
}

impl Circle {
    pub fn new(idx: usize, c: R2, r: f64) -> Result<Circle, ShapeError> {
        if !c.is_finite() {
            return Err(ShapeError::NonFinite { idx, name: "center", value: if c.x.is_finite() { c.y } else { c.x } });
        }
        if !r.is_finite() {
            return Err(ShapeError::NonFinite { idx, name: "radius", value: r });
        }
        if r <= 0. {
            return Err(ShapeError::NonPositiveRadius { idx, r });
        }
        Ok(Circle { idx, c, r })
    }

    /// Carries the world plane onto this circle's unit-circle frame.
    pub fn projection(&self) -> Projection {
        Projection(vec![
            Transform::Translate(-self.c),
            Transform::Scale(R2 { x: 1. / self.r, y: 1. / self.r }),
        ])
    }

    pub fn conic(&self) -> Conic {
        Conic {
            a: 1.,
            b: 0.,
            c: 1.,
            d: -2. * self.c.x,
            e: -2. * self.c.y,
            f: self.c.x * self.c.x + self.c.y * self.c.y - self.r * self.r,
        }
    }

    pub fn area(&self) -> f64 {
        PI * self.r * self.r
    }

    pub fn translate(&self, v: &R2) -> Circle {
        Circle { idx: self.idx, c: self.c + *v, r: self.r }
    }

    pub fn rotate(&self, t: f64) -> Circle {
        Circle { idx: self.idx, c: self.c.rotate(t), r: self.r }
    }

    pub fn scale(&self, s: f64) -> Circle {
        Circle { idx: self.idx, c: self.c * s, r: self.r * s.abs() }
    }
}

impl Display for Circle {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "C{}{{ c: {}, r: {:.3} }}", self.idx, self.c, self.r)
    }
}
