//! Special functions shared by the analytic solvers.
//!
//! The Fresnel integrals follow the usual optics normalisation
//!
//! $$S(x) = \int_0^x \sin\left(\tfrac{\pi t^2}{2}\right) dt, \qquad
//!   C(x) = \int_0^x \cos\left(\tfrac{\pi t^2}{2}\right) dt$$
//!
//! and are evaluated with a power series near the origin and a continued
//! fraction for the complementary error function beyond `|x| = 1.5`
//! (Press et al., *Numerical Recipes*, §6.9).

use num_complex::Complex64;
use std::f64::consts::{FRAC_PI_2, PI};

/// Relative accuracy target for the Fresnel series and continued fraction.
const FRESNEL_EPS: f64 = 1e-15;
/// Iteration cap for both Fresnel branches.
const FRESNEL_MAX_ITER: usize = 300;
/// Smallest representable magnitude used to seed the Lentz recurrence.
const FPMIN: f64 = 1e-300;
/// Switch-over point between series and continued fraction.
const SERIES_LIMIT: f64 = 1.5;

/// Coordinates closer than this to the screen plane are treated as lying on it.
pub const PLANE_TOLERANCE: f64 = 1e-8;

/// Compute the Fresnel integrals `(S(x), C(x))`.
///
/// Both integrals are odd in `x` and tend to `±1/2` as `x → ±∞`.
pub fn fresnel(x: f64) -> (f64, f64) {
    let ax = x.abs();

    let (s, c) = if ax < FPMIN.sqrt() {
        (0.0, ax)
    } else if ax <= SERIES_LIMIT {
        fresnel_series(ax)
    } else {
        fresnel_continued_fraction(ax)
    };

    if x < 0.0 {
        (-s, -c)
    } else {
        (s, c)
    }
}

/// Alternating power series, accumulating the S and C sums in lock-step.
fn fresnel_series(ax: f64) -> (f64, f64) {
    let fact = FRAC_PI_2 * ax * ax;
    let mut sum = 0.0;
    let mut sum_s = 0.0;
    let mut sum_c = ax;
    let mut sign = 1.0;
    let mut odd = true;
    let mut term = ax;
    let mut n = 3.0;

    for k in 1..=FRESNEL_MAX_ITER {
        term *= fact / k as f64;
        sum += sign * term / n;
        let test = sum.abs() * FRESNEL_EPS;
        if odd {
            sign = -sign;
            sum_s = sum;
            sum = sum_c;
        } else {
            sum_c = sum;
            sum = sum_s;
        }
        if term < test {
            break;
        }
        odd = !odd;
        n += 2.0;
    }

    (sum_s, sum_c)
}

/// Modified Lentz evaluation of the erfc continued fraction.
fn fresnel_continued_fraction(ax: f64) -> (f64, f64) {
    let one = Complex64::new(1.0, 0.0);
    let pix2 = PI * ax * ax;

    let mut b = Complex64::new(1.0, -pix2);
    let mut cc = Complex64::new(1.0 / FPMIN, 0.0);
    let mut d = one / b;
    let mut h = d;
    let mut n = -1.0;
    let mut converged = false;

    for _ in 2..=FRESNEL_MAX_ITER {
        n += 2.0;
        let a = -n * (n + 1.0);
        b += 4.0;
        d = one / (a * d + b);
        cc = b + a / cc;
        let del = cc * d;
        h *= del;
        if (del.re - 1.0).abs() + del.im.abs() < FRESNEL_EPS {
            converged = true;
            break;
        }
    }

    if !converged {
        log::debug!("Fresnel continued fraction hit the iteration cap at x = {ax}");
    }

    h *= Complex64::new(ax, -ax);
    let phase = Complex64::from_polar(1.0, 0.5 * pix2);
    let cs = Complex64::new(0.5, 0.5) * (one - phase * h);

    (cs.im, cs.re)
}

/// Complementary Fresnel kernel of the Sommerfeld solution.
///
/// $$G(s) = \left[\frac{1+i}{2} - \bigl(C(z) + i S(z)\bigr)\right] e^{-i s^2},
///   \qquad z = \sqrt{2/\pi}\, s$$
///
/// `G(0) = (1+i)/2`, `G(s) → 0` as `s → +∞` and `|G(s)| → √2` as `s → −∞`.
pub fn fresnel_kernel(s: f64) -> Complex64 {
    let (fs, fc) = fresnel((2.0 / PI).sqrt() * s);
    let bracket = Complex64::new(0.5 - fc, 0.5 - fs);
    bracket * Complex64::from_polar(1.0, -s * s)
}

/// Heaviside step with an explicit value at the origin.
pub fn heaviside(x: f64, at_zero: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        0.0
    } else {
        at_zero
    }
}

/// Polar angle of an observation point in the half-plane coordinate system.
///
/// The screen occupies `φ = 2π` (the `x = 0, y < 0` half-line) and the
/// aperture plane `φ = π`. On the plane itself the angle is chosen from the
/// sign of `y` instead of `atan2`, so the result never depends on the sign of
/// a zero.
pub fn edge_angle(x: f64, y: f64) -> f64 {
    if x.abs() <= PLANE_TOLERANCE {
        (2.0 - heaviside(y, 1.0)) * PI
    } else {
        2.0 * PI + (-x).atan2(-y)
    }
}

/// Principal complex square root of a real number.
///
/// Negative arguments map onto the positive imaginary axis, which makes
/// `exp(i·sqrt(k² − k_y²)·z)` decay for evanescent waveguide modes.
pub fn complex_sqrt(value: f64) -> Complex64 {
    if value >= 0.0 {
        Complex64::new(value.sqrt(), 0.0)
    } else {
        Complex64::new(0.0, (-value).sqrt())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_fresnel_tabulated_values() {
        // Abramowitz & Stegun, Table 7.7
        let cases = [
            (0.5, 0.064_732_432_859_999_29, 0.492_344_225_871_446_2),
            (1.0, 0.438_259_147_390_354_8, 0.779_893_400_376_822_8),
            (2.0, 0.343_415_678_363_698_2, 0.488_253_406_075_340_8),
        ];
        for (x, s_ref, c_ref) in cases {
            let (s, c) = fresnel(x);
            assert_abs_diff_eq!(s, s_ref, epsilon = 1e-10);
            assert_abs_diff_eq!(c, c_ref, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_fresnel_is_odd_and_continuous_at_switch() {
        for &x in &[0.1, 0.7, 1.5, 3.3] {
            let (s, c) = fresnel(x);
            let (sn, cn) = fresnel(-x);
            assert_eq!(s, -sn);
            assert_eq!(c, -cn);
        }

        let (s_lo, c_lo) = fresnel(SERIES_LIMIT);
        let (s_hi, c_hi) = fresnel(SERIES_LIMIT + 1e-9);
        assert_abs_diff_eq!(s_lo, s_hi, epsilon = 1e-8);
        assert_abs_diff_eq!(c_lo, c_hi, epsilon = 1e-8);
    }

    #[test]
    fn test_fresnel_large_argument_limit() {
        let (s, c) = fresnel(200.0);
        assert_abs_diff_eq!(s, 0.5, epsilon = 2e-3);
        assert_abs_diff_eq!(c, 0.5, epsilon = 2e-3);
    }

    #[test]
    fn test_kernel_at_origin() {
        let g = fresnel_kernel(0.0);
        assert_abs_diff_eq!(g.re, 0.5, epsilon = 1e-14);
        assert_abs_diff_eq!(g.im, 0.5, epsilon = 1e-14);
    }

    #[test]
    fn test_edge_angle_on_plane() {
        assert_eq!(edge_angle(0.0, 1.0), PI);
        assert_eq!(edge_angle(0.0, 0.0), PI);
        assert_eq!(edge_angle(-0.0, -1.0), 2.0 * PI);
        assert_eq!(edge_angle(1e-9, -3.0), 2.0 * PI);
    }

    #[test]
    fn test_edge_angle_off_plane_quadrants() {
        // Lit side below the edge plane
        let phi = edge_angle(1.0, 1.0);
        assert_abs_diff_eq!(phi, 1.25 * PI, epsilon = 1e-14);
        // Shadow side below the edge plane
        let phi = edge_angle(1.0, -1.0);
        assert_abs_diff_eq!(phi, 1.75 * PI, epsilon = 1e-14);
        // Geometric shadow boundary
        let phi = edge_angle(2.0, 0.0);
        assert_abs_diff_eq!(phi, 1.5 * PI, epsilon = 1e-14);
    }

    #[test]
    fn test_complex_sqrt_branch() {
        assert_eq!(complex_sqrt(4.0), Complex64::new(2.0, 0.0));
        assert_eq!(complex_sqrt(-9.0), Complex64::new(0.0, 3.0));
    }
}
