use std::f64::consts::TAU;

use super::is_zero::{is_zero, snap};
use super::quadratic::quadratic;

/// Real roots of `a3·x³ + a2·x² + a1·x + a0 = 0`, ascending, with a double
/// root repeated.
///
/// A vanishing leading coefficient falls through to [`quadratic`].
pub fn cubic(a3: f64, a2: f64, a1: f64, a0: f64) -> Vec<f64> {
    let mut cs = [a3, a2, a1, a0];
    snap(&mut cs);
    let [a3, a2, a1, a0] = cs;
    if a3 == 0. {
        return quadratic(a2, a1, a0);
    }
    cubic_scaled(a2 / a3, a1 / a3, a0 / a3)
}

/// Real roots of the monic `x³ + b·x² + c·x + d = 0`, ascending.
pub fn cubic_scaled(b: f64, c: f64, d: f64) -> Vec<f64> {
    // Substitute x = t − b/3 to eliminate the quadratic term.
    let shift = b / 3.;
    let p = c - b * b / 3.;
    let q = 2. * shift * shift * shift - shift * c + d;
    let mut roots = cubic_depressed(p, q);
    for r in roots.iter_mut() {
        *r -= shift;
    }
    roots.sort_by(|x, y| x.partial_cmp(y).unwrap());
    roots
}

/// Real roots of the depressed `t³ + p·t + q = 0`, unsorted.
pub fn cubic_depressed(p: f64, q: f64) -> Vec<f64> {
    if is_zero(q) {
        return if p < 0. {
            let s = (-p).sqrt();
            vec![-s, 0., s]
        } else {
            vec![0.]
        };
    }
    if is_zero(p) {
        return vec![-q.cbrt()];
    }
    let r = (q / 2.) * (q / 2.) + (p / 3.) * (p / 3.) * (p / 3.);
    if is_zero(r) {
        // One single and one double root; 27q² = −4p³ here.
        let single = 3. * q / p;
        let double = -3. * q / (2. * p);
        vec![single, double, double]
    } else if r < 0. {
        // Three distinct real roots: x-coordinates of equally spaced points
        // on a circle of radius 2√(−p/3). Requires p < 0.
        let m = -p / 3.;
        let sm = m.sqrt();
        let u = (-(q / 2.) / (m * sm)).clamp(-1., 1.);
        let phi = u.acos();
        (0..3)
            .map(|k| 2. * sm * ((phi - TAU * k as f64) / 3.).cos())
            .collect()
    } else {
        // One real root, via Cardano with two real cube roots.
        let s = r.sqrt();
        vec![(-q / 2. + s).cbrt() + (-q / 2. - s).cbrt()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn check(roots: &[f64], expected: &[f64]) {
        assert_eq!(roots.len(), expected.len(), "{:?} vs {:?}", roots, expected);
        for (a, e) in roots.iter().zip(expected) {
            assert_relative_eq!(a, e, max_relative = 1e-9, epsilon = 1e-9);
        }
    }

    fn coeffs(r0: f64, r1: f64, r2: f64) -> [f64; 4] {
        [
            1.,
            -(r0 + r1 + r2),
            r0 * r1 + r0 * r2 + r1 * r2,
            -(r0 * r1 * r2),
        ]
    }

    #[test]
    fn sweep() {
        let vals = [-10., -1., -0.1, 0.1, 1., 10.];
        let n = vals.len();
        for i0 in 0..n {
            for i1 in (i0 + 1)..n {
                for i2 in (i1 + 1)..n {
                    let mut expected = [vals[i0], vals[i1], vals[i2]];
                    expected.sort_by(|x, y| x.partial_cmp(y).unwrap());
                    let [a3, a2, a1, a0] = coeffs(expected[0], expected[1], expected[2]);
                    check(&cubic(a3, a2, a1, a0), &expected);
                }
            }
        }
    }

    #[test]
    fn double_root() {
        // (x − 2)²(x + 1)
        let [a3, a2, a1, a0] = coeffs(2., 2., -1.);
        check(&cubic(a3, a2, a1, a0), &[-1., 2., 2.]);
    }

    #[test]
    fn depressed_symmetric() {
        // t³ − 4t = t(t − 2)(t + 2)
        check(&cubic(1., 0., -4., 0.), &[-2., 0., 2.]);
        // t³ + 4t only crosses zero once
        check(&cubic(1., 0., 4., 0.), &[0.]);
    }

    #[test]
    fn single_real_root() {
        // (x − 3)(x² + 1)
        check(&cubic(1., -3., 1., -3.), &[3.]);
    }

    #[test]
    fn degenerate_leading_coefficient() {
        check(&cubic(0., 1., -3., 2.), &[1., 2.]);
    }

    #[test]
    fn matches_reference_solver() {
        for (a3, a2, a1, a0) in [
            (2., -3., -11., 6.),
            (1., 1., 1., -3.),
            (5., 0., -2., 0.3),
        ] {
            let mut expected = match roots::find_roots_cubic(a3, a2, a1, a0) {
                roots::Roots::One(rs) => rs.to_vec(),
                roots::Roots::Two(rs) => rs.to_vec(),
                roots::Roots::Three(rs) => rs.to_vec(),
                other => panic!("unexpected root count: {:?}", other),
            };
            expected.sort_by(|x, y| x.partial_cmp(y).unwrap());
            let actual = cubic(a3, a2, a1, a0);
            // The reference solver collapses multiplicities; compare as sets.
            for e in &expected {
                assert!(
                    actual.iter().any(|a| (a - e).abs() < 1e-9),
                    "missing root {} in {:?}",
                    e,
                    actual,
                );
            }
        }
    }
}
