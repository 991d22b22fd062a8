//! Legendre polynomials, root isolation, and Lagrange-basis integration.
//!
//! All node families are computed on the reference interval [-1, 1] and
//! mapped to [0, 1] by the callers in the parent module. Roots are isolated
//! by a sign-change scan and tightened by bisection; for the node counts
//! collocation uses this is both robust and exact to machine precision.

/// Value of the Legendre polynomial `P_n` at `x`, by the three-term
/// recurrence `(k+1) P_{k+1} = (2k+1) x P_k - k P_{k-1}`.
pub fn legendre(n: usize, x: f64) -> f64 {
    if n == 0 {
        return 1.0;
    }
    let (mut pm, mut p) = (1.0, x);
    for k in 1..n {
        let next = ((2 * k + 1) as f64 * x * p - k as f64 * pm) / (k + 1) as f64;
        pm = p;
        p = next;
    }
    p
}

/// Derivative `P'_n(x)` for `|x| < 1`.
pub fn legendre_deriv(n: usize, x: f64) -> f64 {
    if n == 0 {
        return 0.0;
    }
    n as f64 * (x * legendre(n, x) - legendre(n - 1, x)) / (x * x - 1.0)
}

/// Isolate `expected` simple roots of `f` on the open interval `(lo, hi)`.
///
/// Scans a uniform grid for sign changes and bisects each bracket down to
/// machine precision. The scan stays strictly inside the interval, so
/// functions singular at the boundary (like the Legendre derivative) are
/// safe. Panics if the scan does not find the expected count; that
/// indicates a programming error in the caller, not bad user input.
pub fn isolate_roots(f: impl Fn(f64) -> f64, lo: f64, hi: f64, expected: usize) -> Vec<f64> {
    let samples = 200 * expected.max(1) * expected.max(1);
    let margin = 1e-9 * (hi - lo);
    let (lo, hi) = (lo + margin, hi - margin);
    let h = (hi - lo) / samples as f64;
    let mut roots = Vec::with_capacity(expected);
    let mut xa = lo;
    let mut fa = f(xa);
    for i in 1..=samples {
        let xb = lo + i as f64 * h;
        let fb = f(xb);
        if fb == 0.0 {
            roots.push(xb);
        } else if fa * fb < 0.0 {
            roots.push(bisect(&f, xa, xb, fa));
        }
        xa = xb;
        fa = fb;
    }
    assert_eq!(
        roots.len(),
        expected,
        "root scan found {} of {} expected roots",
        roots.len(),
        expected
    );
    roots
}

fn bisect(f: &impl Fn(f64) -> f64, mut a: f64, mut b: f64, fa: f64) -> f64 {
    let sa = fa.signum();
    for _ in 0..80 {
        let m = 0.5 * (a + b);
        if m == a || m == b {
            break;
        }
        let fm = f(m);
        if fm == 0.0 {
            return m;
        }
        if fm.signum() == sa {
            a = m;
        } else {
            b = m;
        }
    }
    0.5 * (a + b)
}

/// Monomial coefficients (ascending degree) of the Lagrange basis polynomial
/// `L_j` over the distinct interpolation points `pts`.
pub fn lagrange_coeffs(pts: &[f64], j: usize) -> Vec<f64> {
    let mut coeffs = vec![1.0];
    let mut denom = 1.0;
    for (k, &xk) in pts.iter().enumerate() {
        if k == j {
            continue;
        }
        denom *= pts[j] - xk;
        // multiply coeffs by (x - xk)
        let mut next = vec![0.0; coeffs.len() + 1];
        for (i, &c) in coeffs.iter().enumerate() {
            next[i + 1] += c;
            next[i] -= c * xk;
        }
        coeffs = next;
    }
    for c in coeffs.iter_mut() {
        *c /= denom;
    }
    coeffs
}

/// Integral of a monomial-coefficient polynomial from 0 to `x`.
pub fn integrate_to(coeffs: &[f64], x: f64) -> f64 {
    let mut acc = 0.0;
    let mut xp = x;
    for (i, &c) in coeffs.iter().enumerate() {
        xp *= if i == 0 { 1.0 } else { x };
        acc += c * xp / (i + 1) as f64;
    }
    acc
}

/// Evaluate the Lagrange basis polynomial `L_j` over `pts` at `x` directly
/// from the product formula.
pub fn lagrange_eval(pts: &[f64], j: usize, x: f64) -> f64 {
    let mut num = 1.0;
    let mut den = 1.0;
    for (k, &xk) in pts.iter().enumerate() {
        if k == j {
            continue;
        }
        num *= x - xk;
        den *= pts[j] - xk;
    }
    num / den
}
