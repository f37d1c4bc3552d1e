use std::f64::consts::PI;

/// Degree rendering for angular parameters in logs and `Display` impls.
pub trait Deg {
    fn deg(&self) -> f64;
    fn deg_str(&self) -> String;
}

impl Deg for f64 {
    fn deg(&self) -> f64 {
        self * 180. / PI
    }
    fn deg_str(&self) -> String {
        format!("{:4}", self.deg().round() as i64)
    }
}
