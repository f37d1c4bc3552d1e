use std::f64::consts::PI;
use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::error::ShapeError;
use crate::math::deg::Deg;
use super::conic::Conic;
use super::r2::R2;
use super::transform::{Projection, Transform};

/// An ellipse: center, semi-axes, rotation, with the rotation's trig and the
/// implicit conic derived at construction.
///
/// Both representations are populated before any other method runs: an
/// `Ellipse` can be built from either the parametric parameters ([`new`]) or
/// the implicit coefficients ([`from_conic`]), and the other form is derived
/// immediately. Shapes are immutable; transforms return new values.
///
/// [`new`]: Ellipse::new
/// [`from_conic`]: Ellipse::from_conic
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "EllipseRepr", into = "EllipseRepr")]
pub struct Ellipse {
    pub idx: usize,
    pub c: R2,
    pub r: R2,
    pub t: f64,
    pub cos_t: f64,
    pub sin_t: f64,
    pub conic: Conic,
}

/// Serialized form: the parametric parameters only; trig and conic caches are
/// rebuilt on deserialization so the two representations cannot drift.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct EllipseRepr {
    idx: usize,
    c: R2,
    r: R2,
    t: f64,
}

impl From<EllipseRepr> for Ellipse {
    fn from(repr: EllipseRepr) -> Ellipse {
        Ellipse::raw(repr.idx, repr.c, repr.r, repr.t)
    }
}

impl From<Ellipse> for EllipseRepr {
    fn from(e: Ellipse) -> EllipseRepr {
        EllipseRepr { idx: e.idx, c: e.c, r: e.r, t: e.t }
    }
}

impl Ellipse {
    pub fn new(idx: usize, c: R2, r: R2, t: f64) -> Result<Ellipse, ShapeError> {
        if !c.is_finite() {
            return Err(ShapeError::NonFinite {
                idx,
                name: "center",
                value: if c.x.is_finite() { c.y } else { c.x },
            });
        }
        for (name, value) in [("rx", r.x), ("ry", r.y), ("rotation", t)] {
            if !value.is_finite() {
                return Err(ShapeError::NonFinite { idx, name, value });
            }
        }
        if r.x <= 0. {
            return Err(ShapeError::NonPositiveRadius { idx, r: r.x });
        }
        if r.y <= 0. {
            return Err(ShapeError::NonPositiveRadius { idx, r: r.y });
        }
        Ok(Ellipse::raw(idx, c, r, t))
    }

    /// Recover the parametric form from implicit coefficients
    /// `A·x² + B·x·y + C·y² + D·x + E·y + F = 0`.
    ///
    /// The center solves the gradient system, the rotation and radii come from
    /// the principal-axis decomposition of the quadratic part. Coefficients
    /// that do not describe a real, non-degenerate ellipse are rejected.
    pub fn from_conic(idx: usize, conic: &Conic) -> Result<Ellipse, ShapeError> {
        let coeffs = [conic.a, conic.b, conic.c, conic.d, conic.e, conic.f];
        for value in coeffs {
            if !value.is_finite() {
                return Err(ShapeError::NotAnEllipse { idx, coeffs });
            }
        }
        // Coefficients are scale-free; fix the sign so the quadratic part is
        // positive-definite for an ellipse.
        let Conic { a, b, c, d, e, f } = if conic.a + conic.c < 0. {
            Conic {
                a: -conic.a,
                b: -conic.b,
                c: -conic.c,
                d: -conic.d,
                e: -conic.e,
                f: -conic.f,
            }
        } else {
            *conic
        };
        let det = 4. * a * c - b * b;
        if det <= 0. {
            return Err(ShapeError::NotAnEllipse { idx, coeffs });
        }
        let center = R2 {
            x: (b * e - 2. * c * d) / det,
            y: (b * d - 2. * a * e) / det,
        };
        let fc = Conic { a, b, c, d, e, f }.eval(&center);
        let s = ((a - c) * (a - c) + b * b).sqrt();
        // Eigenvalues of [[A, B/2], [B/2, C]]; the larger belongs to the
        // principal direction t = atan2(B, A−C)/2.
        let lx = (a + c + s) / 2.;
        let ly = (a + c - s) / 2.;
        if ly <= 0. || fc >= 0. {
            return Err(ShapeError::NotAnEllipse { idx, coeffs });
        }
        let t = 0.5 * b.atan2(a - c);
        // Radius along t pairs with the larger eigenvalue; canonicalize to
        // major-axis-first, with the axis direction reduced modulo π.
        let rt = (-fc / lx).sqrt();
        let rp = (-fc / ly).sqrt();
        let (mut t, r) = if rt >= rp {
            (t, R2 { x: rt, y: rp })
        } else {
            (t + PI / 2., R2 { x: rp, y: rt })
        };
        t -= PI * (t / PI).round();
        Ellipse::new(idx, center, r, t)
    }

    fn raw(idx: usize, c: R2, r: R2, t: f64) -> Ellipse {
        let (sin_t, cos_t) = t.sin_cos();
        let projection = Projection(vec![
            Transform::Translate(-c),
            Transform::Rotate(-t),
            Transform::Scale(R2 { x: 1. / r.x, y: 1. / r.y }),
        ]);
        let conic = Conic::unit_circle().transformed(&projection.matrix());
        Ellipse { idx, c, r, t, cos_t, sin_t, conic }
    }

    /// Carries the world plane onto this ellipse's unit-circle frame.
    pub fn projection(&self) -> Projection {
        Projection(vec![
            Transform::Translate(-self.c),
            Transform::Rotate(-self.t),
            Transform::Scale(R2 { x: 1. / self.r.x, y: 1. / self.r.y }),
        ])
    }

    pub fn area(&self) -> f64 {
        PI * self.r.x * self.r.y
    }

    /// Unit vector along the rotated x-axis.
    fn axis_x(&self) -> R2 {
        R2 { x: self.cos_t, y: self.sin_t }
    }

    /// Unit vector along the rotated y-axis.
    fn axis_y(&self) -> R2 {
        R2 { x: -self.sin_t, y: self.cos_t }
    }

    /// Boundary extremes along both axes: `[+x, −x, +y, −y]`.
    pub fn vertices(&self) -> [R2; 4] {
        let vx = self.axis_x() * self.r.x;
        let vy = self.axis_y() * self.r.y;
        [self.c + vx, self.c - vx, self.c + vy, self.c - vy]
    }

    /// Linear eccentricity: distance from the center to either focus.
    pub fn focal_distance(&self) -> f64 {
        (self.r.x * self.r.x - self.r.y * self.r.y).abs().sqrt()
    }

    pub fn foci(&self) -> [R2; 2] {
        let major = if self.r.x >= self.r.y { self.axis_x() } else { self.axis_y() };
        let fv = major * self.focal_distance();
        [self.c + fv, self.c - fv]
    }

    pub fn translate(&self, v: &R2) -> Ellipse {
        Ellipse::raw(self.idx, self.c + *v, self.r, self.t)
    }

    /// Rotation about the origin.
    pub fn rotate(&self, t: f64) -> Ellipse {
        Ellipse::raw(self.idx, self.c.rotate(t), self.r, self.t + t)
    }

    pub fn scale(&self, s: f64) -> Result<Ellipse, ShapeError> {
        Ellipse::new(self.idx, self.c * s, self.r * s.abs(), self.t)
    }
}

impl Display for Ellipse {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "E{}{{ c: {}, r: {}, {}° }}",
            self.idx,
            self.c,
            self.r,
            self.t.deg().round() as i64,
        )
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;

    use test_log::test;

    use super::*;

    #[test]
    fn conic_round_trip() {
        let e = Ellipse::new(
            0,
            R2 { x: 1., y: -2. },
            R2 { x: 3., y: 0.5 },
            PI / 5.,
        )
        .unwrap();
        let back = Ellipse::from_conic(0, &e.conic).unwrap();
        assert_relative_eq!(back.c.x, e.c.x, epsilon = 1e-9);
        assert_relative_eq!(back.c.y, e.c.y, epsilon = 1e-9);
        assert_relative_eq!(back.r.x, e.r.x, epsilon = 1e-9);
        assert_relative_eq!(back.r.y, e.r.y, epsilon = 1e-9);
        assert_relative_eq!(back.t, e.t, epsilon = 1e-9);
    }

    #[test]
    fn conic_round_trip_major_y() {
        // rx < ry flips the principal direction by π/2; the recovered
        // parameters describe the same point set.
        let e = Ellipse::new(
            1,
            R2 { x: -0.5, y: 0.25 },
            R2 { x: 0.75, y: 2. },
            0.3,
        )
        .unwrap();
        let back = Ellipse::from_conic(1, &e.conic).unwrap();
        assert_relative_eq!(back.area(), e.area(), epsilon = 1e-9);
        for p in e.vertices() {
            assert_relative_eq!(back.conic.eval(&p), 0., epsilon = 1e-9);
        }
    }

    #[test]
    fn boundary_satisfies_conic() {
        let e = Ellipse::new(
            0,
            R2 { x: 2., y: 1. },
            R2 { x: 1.5, y: 0.75 },
            -PI / 3.,
        )
        .unwrap();
        for k in 0..8 {
            let t = 2. * PI * k as f64 / 8.;
            let unit = R2 { x: t.cos(), y: t.sin() };
            let p = unit.apply(&-e.projection());
            assert_relative_eq!(e.conic.eval(&p), 0., epsilon = 1e-9);
        }
    }

    #[test]
    fn landmarks() {
        let e = Ellipse::new(
            0,
            R2 { x: 0., y: 0. },
            R2 { x: 5., y: 3. },
            0.,
        )
        .unwrap();
        assert_relative_eq!(e.focal_distance(), 4., epsilon = 1e-12);
        let [f0, f1] = e.foci();
        assert_relative_eq!(f0.x, 4., epsilon = 1e-12);
        assert_relative_eq!(f1.x, -4., epsilon = 1e-12);
        let [vx, ..] = e.vertices();
        assert_relative_eq!(vx.x, 5., epsilon = 1e-12);
    }

    #[test]
    fn rejects_degenerate() {
        assert!(Ellipse::new(0, R2 { x: 0., y: 0. }, R2 { x: 0., y: 1. }, 0.).is_err());
        assert!(Ellipse::new(0, R2 { x: f64::NAN, y: 0. }, R2 { x: 1., y: 1. }, 0.).is_err());
        // A hyperbola: x² − y² − 1 = 0.
        let hyperbola = Conic { a: 1., b: 0., c: -1., d: 0., e: 0., f: -1. };
        assert!(matches!(
            Ellipse::from_conic(0, &hyperbola),
            Err(ShapeError::NotAnEllipse { .. }),
        ));
    }

    #[test]
    fn serde_rebuilds_caches() {
        let e = Ellipse::new(
            2,
            R2 { x: 1., y: 2. },
            R2 { x: 2., y: 1. },
            PI / 7.,
        )
        .unwrap();
        let json = serde_json::to_string(&e).unwrap();
        let back: Ellipse = serde_json::from_str(&json).unwrap();
        assert_eq!(back, e);
        assert_relative_eq!(back.cos_t, (PI / 7.).cos(), epsilon = 1e-15);
    }
}
