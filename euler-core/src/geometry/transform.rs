use std::ops::Neg;

use nalgebra::Matrix3;

use super::r2::R2;

/// One primitive affine map of the plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transform {
    Translate(R2),
    Scale(R2),
    Rotate(f64),
}

impl Transform {
    pub fn apply(&self, p: R2) -> R2 {
        match self {
            Transform::Translate(v) => p + *v,
            Transform::Scale(v) => p * *v,
            Transform::Rotate(t) => p.rotate(*t),
        }
    }

    pub fn matrix(&self) -> Matrix3<f64> {
        match self {
            Transform::Translate(v) => Matrix3::new(
                1., 0., v.x,
                0., 1., v.y,
                0., 0., 1.,
            ),
            Transform::Scale(v) => Matrix3::new(
                v.x, 0., 0.,
                0., v.y, 0.,
                0., 0., 1.,
            ),
            Transform::Rotate(t) => {
                let (sin, cos) = t.sin_cos();
                Matrix3::new(
                    cos, -sin, 0.,
                    sin, cos, 0.,
                    0., 0., 1.,
                )
            }
        }
    }
}

impl Neg for Transform {
    type Output = Transform;
    fn neg(self) -> Transform {
        match self {
            Transform::Translate(v) => Transform::Translate(-v),
            Transform::Scale(v) => Transform::Scale(R2 { x: 1. / v.x, y: 1. / v.y }),
            Transform::Rotate(t) => Transform::Rotate(-t),
        }
    }
}

/// A composition of primitive maps, applied left to right.
///
/// Each shape exposes the projection that carries the world plane onto its
/// own unit-circle frame; negating a projection yields the exact inverse
/// composition (each step inverted, order reversed).
#[derive(Debug, Clone, PartialEq)]
pub struct Projection(pub Vec<Transform>);

impl Projection {
    pub fn matrix(&self) -> Matrix3<f64> {
        self.0
            .iter()
            .fold(Matrix3::identity(), |m, t| t.matrix() * m)
    }
}

impl Neg for Projection {
    type Output = Projection;
    fn neg(self) -> Projection {
        Projection(self.0.into_iter().rev().map(|t| -t).collect())
    }
}

impl R2 {
    pub fn apply(&self, projection: &Projection) -> R2 {
        projection.0.iter().fold(*self, |p, t| t.apply(p))
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;

    use super::*;
    use test_log::test;

    #[test]
    fn inverse_round_trip() {
        let proj = Projection(vec![
            Transform::Translate(R2 { x: -1., y: 2. }),
            Transform::Rotate(PI / 3.),
            Transform::Scale(R2 { x: 0.5, y: 2. }),
        ]);
        let p = R2 { x: 0.3, y: -1.7 };
        let q = p.apply(&proj).apply(&-proj.clone());
        assert_relative_eq!(q.x, p.x, epsilon = 1e-12);
        assert_relative_eq!(q.y, p.y, epsilon = 1e-12);
    }

    #[test]
    fn matrix_matches_pointwise() {
        let proj = Projection(vec![
            Transform::Translate(R2 { x: 2., y: -0.5 }),
            Transform::Rotate(-PI / 5.),
            Transform::Scale(R2 { x: 3., y: 0.25 }),
        ]);
        let p = R2 { x: -0.8, y: 1.1 };
        let q = p.apply(&proj);
        let v = proj.matrix() * nalgebra::Vector3::new(p.x, p.y, 1.);
        assert_relative_eq!(v.x / v.z, q.x, epsilon = 1e-12);
        assert_relative_eq!(v.y / v.z, q.y, epsilon = 1e-12);
    }
}
