use std::fmt::{self, Display, Formatter};
use std::ops::{Add, Div, Mul, Neg, Sub};

use approx::{AbsDiffEq, RelativeEq};
use serde::{Deserialize, Serialize};

/// A point (or vector) in the plane.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct R2 {
    pub x: f64,
    pub y: f64,
}

impl R2 {
    pub fn new(x: f64, y: f64) -> Self {
        R2 { x, y }
    }

    pub fn norm2(&self) -> f64 {
        self.x * self.x + self.y * self.y
    }

    pub fn norm(&self) -> f64 {
        self.norm2().sqrt()
    }

    pub fn distance(&self, o: &R2) -> f64 {
        (*self - *o).norm()
    }

    /// Polar angle in `[−π, π]`.
    pub fn atan2(&self) -> f64 {
        self.y.atan2(self.x)
    }

    /// Counter-clockwise rotation about the origin.
    pub fn rotate(&self, t: f64) -> R2 {
        let (sin, cos) = t.sin_cos();
        R2 {
            x: self.x * cos - self.y * sin,
            y: self.x * sin + self.y * cos,
        }
    }

    /// 2D cross product (signed parallelogram area).
    pub fn cross(&self, o: &R2) -> f64 {
        self.x * o.y - self.y * o.x
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Display for R2 {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}, {:.3})", self.x, self.y)
    }
}

impl Add for R2 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        R2 { x: self.x + rhs.x, y: self.y + rhs.y }
    }
}

impl Sub for R2 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        R2 { x: self.x - rhs.x, y: self.y - rhs.y }
    }
}

impl Mul for R2 {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        R2 { x: self.x * rhs.x, y: self.y * rhs.y }
    }
}

impl Mul<f64> for R2 {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self {
        R2 { x: self.x * rhs, y: self.y * rhs }
    }
}

impl Div for R2 {
    type Output = Self;
    fn div(self, rhs: Self) -> Self {
        R2 { x: self.x / rhs.x, y: self.y / rhs.y }
    }
}

impl Div<f64> for R2 {
    type Output = Self;
    fn div(self, rhs: f64) -> Self {
        R2 { x: self.x / rhs, y: self.y / rhs }
    }
}

impl Neg for R2 {
    type Output = Self;
    fn neg(self) -> Self {
        R2 { x: -self.x, y: -self.y }
    }
}

impl AbsDiffEq for R2 {
    type Epsilon = f64;
    fn default_epsilon() -> f64 {
        f64::default_epsilon()
    }
    fn abs_diff_eq(&self, other: &Self, epsilon: f64) -> bool {
        self.x.abs_diff_eq(&other.x, epsilon) && self.y.abs_diff_eq(&other.y, epsilon)
    }
}

impl RelativeEq for R2 {
    fn default_max_relative() -> f64 {
        f64::default_max_relative()
    }
    fn relative_eq(&self, other: &Self, epsilon: f64, max_relative: f64) -> bool {
        self.x.relative_eq(&other.x, epsilon, max_relative)
            && self.y.relative_eq(&other.y, epsilon, max_relative)
    }
}
