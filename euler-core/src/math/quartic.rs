use super::cubic::cubic;
use super::is_zero::{is_zero, snap};
use super::quadratic::{quadratic, quadratic_scaled};

/// Leading coefficients below this fraction of the largest coefficient make
/// the monic division numerically worthless: the surviving roots are those of
/// the lower-degree polynomial, plus a discarded pair of magnitude
/// ≳ √(1/LEAD_EPSILON), far outside the unit-disc window this solver feeds.
const LEAD_EPSILON: f64 = 1e-7;

/// Real roots of `a4·x⁴ + a3·x³ + a2·x² + a1·x + a0 = 0`, ascending, with
/// multiplicity preserved as duplicate entries.
///
/// No real roots is a normal outcome (empty result). A degenerate leading
/// coefficient falls through to [`cubic`]; intersecting near-concentric
/// shapes routinely produces such degenerate quartics.
pub fn quartic(a4: f64, a3: f64, a2: f64, a1: f64, a0: f64) -> Vec<f64> {
    let mut cs = [a4, a3, a2, a1, a0];
    snap(&mut cs);
    let [a4, a3, a2, a1, a0] = cs;
    let max = cs.iter().fold(0., |m: f64, c| c.abs().max(m));
    if a4.abs() <= LEAD_EPSILON * max {
        return cubic(a3, a2, a1, a0);
    }
    quartic_scaled(a3 / a4, a2 / a4, a1 / a4, a0 / a4)
}

/// Real roots of the monic `x⁴ + b·x³ + c·x² + d·x + e = 0`, ascending.
pub fn quartic_scaled(b: f64, c: f64, d: f64, e: f64) -> Vec<f64> {
    // Ferrari's substitution x = t − b/4 eliminates the cubic term.
    let b4 = b / 4.;
    let b4sq = b4 * b4;
    let p = c - 6. * b4sq;
    let q = 8. * b4sq * b4 - 2. * b4 * c + d;
    let r = -3. * b4sq * b4sq + b4sq * c - b4 * d + e;
    let mut roots = quartic_depressed(p, q, r);
    for t in roots.iter_mut() {
        *t -= b4;
    }
    roots.sort_by(|x, y| x.partial_cmp(y).unwrap());
    roots
}

/// Real roots of the depressed `t⁴ + p·t² + q·t + r = 0`, unsorted.
pub fn quartic_depressed(p: f64, q: f64, r: f64) -> Vec<f64> {
    if is_zero(q) {
        return quartic_biquadratic(p, r);
    }
    // Resolvent cubic: m³ + p·m² + (p²/4 − r)·m − q²/8 = 0. Its value at 0 is
    // −q²/8 < 0, so a positive real root always exists; take the largest.
    let resolvent = cubic(1., p, p * p / 4. - r, -q * q / 8.);
    let m = match resolvent.last() {
        Some(&m) if m > 0. => m,
        // q was snapped-nonzero but effectively vanishes.
        _ => return quartic_biquadratic(p, r),
    };
    let s = (2. * m).sqrt();
    let u = q / (2. * s);
    let t0 = p / 2. + m;
    // x⁴ + px² + qx + r = (x² + sx + t0 − u)(x² − sx + t0 + u); each factor
    // with a negative discriminant contributes nothing.
    let mut roots = quadratic_scaled(s, t0 - u);
    roots.extend(quadratic_scaled(-s, t0 + u));
    roots
}

/// Biquadratic case `t⁴ + p·t² + r = 0`: two nested square roots.
pub fn quartic_biquadratic(p: f64, r: f64) -> Vec<f64> {
    let mut roots = Vec::new();
    for z in quadratic(1., p, r) {
        if is_zero(z) {
            // Double root at the origin.
            roots.push(0.);
            roots.push(0.);
        } else if z > 0. {
            let s = z.sqrt();
            roots.push(-s);
            roots.push(s);
        }
    }
    roots
}
