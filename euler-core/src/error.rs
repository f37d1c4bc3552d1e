/// Caller contract violations, surfaced at shape construction rather than
/// deep inside an arrangement traversal.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ShapeError {
    #[error("shape {idx}: non-positive radius {r}")]
    NonPositiveRadius { idx: usize, r: f64 },

    #[error("shape {idx}: non-finite {name} ({value})")]
    NonFinite { idx: usize, name: &'static str, value: f64 },

    #[error("shape {idx}: coefficients do not describe an ellipse: {coeffs:?}")]
    NotAnEllipse { idx: usize, coeffs: [f64; 6] },

    #[error("shape {idx}: singular affine transform")]
    SingularTransform { idx: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum ArrangementError {
    #[error(
        "shapes {i} and {j} mutually contain each other's centers; \
         perturbation failed to separate them after {attempts} attempts"
    )]
    PerturbationExhausted { i: usize, j: usize, attempts: usize },

    #[error("shape at position {expected} carries idx {found}")]
    ShapeIndex { expected: usize, found: usize },

    #[error(transparent)]
    Shape(#[from] ShapeError),

    #[error("failed to parse shape descriptors: {0}")]
    Parse(#[from] serde_json::Error),
}
