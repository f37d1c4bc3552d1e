use log::debug;
use nalgebra::Matrix3;
use serde::{Deserialize, Serialize};

use crate::math::quartic::quartic;
use super::r2::R2;

/// General conic in implicit form: `A·x² + B·x·y + C·y² + D·x + E·y + F = 0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Conic {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Conic {
    /// `x² + y² − 1 = 0`.
    pub fn unit_circle() -> Conic {
        Conic { a: 1., b: 0., c: 1., d: 0., e: 0., f: -1. }
    }

    /// Symmetric-matrix view: `xᵀ·Q·x = 0` over homogeneous `(x, y, 1)`.
    pub fn matrix(&self) -> Matrix3<f64> {
        Matrix3::new(
            self.a, self.b / 2., self.d / 2.,
            self.b / 2., self.c, self.e / 2.,
            self.d / 2., self.e / 2., self.f,
        )
    }

    pub fn from_matrix(m: &Matrix3<f64>) -> Conic {
        Conic {
            a: m[(0, 0)],
            b: 2. * m[(0, 1)],
            c: m[(1, 1)],
            d: 2. * m[(0, 2)],
            e: 2. * m[(1, 2)],
            f: m[(2, 2)],
        }
    }

    /// Value of the implicit polynomial at `p` (zero on the boundary).
    pub fn eval(&self, p: &R2) -> f64 {
        self.a * p.x * p.x
            + self.b * p.x * p.y
            + self.c * p.y * p.y
            + self.d * p.x
            + self.e * p.y
            + self.f
    }

    /// The same zero set expressed in the coordinates of an affine frame
    /// change; `inv` must map new-frame points back to the current frame
    /// (`Q' = invᵀ·Q·inv`).
    pub fn transformed(&self, inv: &Matrix3<f64>) -> Conic {
        Conic::from_matrix(&(inv.transpose() * self.matrix() * inv))
    }

    /// Intersection points of this conic with the unit circle `x² + y² = 1`.
    ///
    /// Substituting `y = ±√(1−x²)` and squaring away the radical collects a
    /// quartic in `x`. The quartic constrains `x` only, so the sign of `y` is
    /// recovered per root by whichever candidate has the smaller residual; a
    /// double root is a symmetric pair, and both signs are kept.
    pub fn unit_intersections(&self) -> Vec<R2> {
        let Conic { a, b, c, d, e, f } = *self;
        let ac = a - c;
        let cf = c + f;
        let c4 = ac * ac + b * b;
        let c3 = 2. * (d * ac + b * e);
        let c2 = d * d + e * e - b * b + 2. * ac * cf;
        let c1 = 2. * (d * cf - b * e);
        let c0 = cf * cf - e * e;
        let xs = quartic(c4, c3, c2, c1, c0);
        debug!("unit_intersections {:?}: xs {:?}", self, xs);

        let mut points = Vec::new();
        let mut i = 0;
        while i < xs.len() {
            let x = xs[i];
            let y2 = 1. - x * x;
            // Squaring introduces candidates beyond the circle's x-range.
            if y2 < -1e-9 {
                i += 1;
                continue;
            }
            let y = y2.max(0.).sqrt();
            let double = i + 1 < xs.len() && (xs[i + 1] - x).abs() < 1e-9;
            if double {
                points.push(R2 { x, y });
                points.push(R2 { x, y: -y });
                i += 2;
            } else {
                let pos = R2 { x, y };
                let neg = R2 { x, y: -y };
                let p = if self.eval(&pos).abs() <= self.eval(&neg).abs() { pos } else { neg };
                points.push(p);
                i += 1;
            }
        }
        points
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    // x² + y² + D·x + E·y + F = 0 for a circle at (cx, cy) with radius r
    fn circle_conic(cx: f64, cy: f64, r: f64) -> Conic {
        Conic {
            a: 1.,
            b: 0.,
            c: 1.,
            d: -2. * cx,
            e: -2. * cy,
            f: cx * cx + cy * cy - r * r,
        }
    }

    #[test]
    fn symmetric_circle_pair() {
        // Unit circle at (1, 0): crossings at x = 1/2, both y signs.
        let points = circle_conic(1., 0., 1.).unit_intersections();
        assert_eq!(points.len(), 2);
        assert_relative_eq!(points[0].x, 0.5, epsilon = 1e-9);
        assert_relative_eq!(points[0].y, 3f64.sqrt() / 2., epsilon = 1e-9);
        assert_relative_eq!(points[1].x, 0.5, epsilon = 1e-9);
        assert_relative_eq!(points[1].y, -(3f64.sqrt()) / 2., epsilon = 1e-9);
    }

    #[test]
    fn off_axis_circle() {
        let conic = circle_conic(0.4, 0.9, 0.8);
        let points = conic.unit_intersections();
        assert_eq!(points.len(), 2);
        for p in points {
            assert_relative_eq!(p.norm(), 1., epsilon = 1e-9);
            assert_relative_eq!(conic.eval(&p), 0., epsilon = 1e-9);
        }
    }

    #[test]
    fn disjoint_circle() {
        assert!(circle_conic(5., 0., 1.).unit_intersections().is_empty());
    }

    #[test]
    fn contained_circle() {
        assert!(circle_conic(0.1, 0., 0.5).unit_intersections().is_empty());
    }

    #[test]
    fn ellipse_four_crossings() {
        // Wide flat ellipse through the unit circle: x²/4 + 4y² = 1.
        let conic = Conic { a: 0.25, b: 0., c: 4., d: 0., e: 0., f: -1. };
        let points = conic.unit_intersections();
        assert_eq!(points.len(), 4);
        for p in &points {
            assert_relative_eq!(p.norm(), 1., epsilon = 1e-9);
            assert_relative_eq!(conic.eval(p), 0., epsilon = 1e-9);
        }
    }

    #[test]
    fn transformed_round_trip() {
        let conic = circle_conic(0.3, -0.2, 1.5);
        let t = crate::geometry::transform::Projection(vec![
            crate::geometry::transform::Transform::Translate(R2 { x: 1., y: 2. }),
            crate::geometry::transform::Transform::Rotate(0.7),
            crate::geometry::transform::Transform::Scale(R2 { x: 2., y: 0.5 }),
        ]);
        let fwd = t.matrix();
        let inv = (-t).matrix();
        let there = conic.transformed(&inv);
        let back = there.transformed(&fwd);
        // Conic coefficients are scale-free; compare normalized by `a`.
        for (l, r) in [
            (back.b / back.a, conic.b / conic.a),
            (back.c / back.a, conic.c / conic.a),
            (back.d / back.a, conic.d / conic.a),
            (back.e / back.a, conic.e / conic.a),
            (back.f / back.a, conic.f / conic.a),
        ] {
            assert_relative_eq!(l, r, epsilon = 1e-9, max_relative = 1e-9);
        }
    }
}
