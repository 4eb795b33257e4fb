//! Unit-normalized envelope shapes sampled on `(-0.5, 0.5)`.
//!
//! A closed three-variant sum type, dispatched with `enum_dispatch` rather
//! than a trait object, matching how the rest of the crate avoids dynamic
//! dispatch for a fixed set of tags.

use anyhow::{Result, bail};
use enum_dispatch::enum_dispatch;

#[derive(Debug, Clone, PartialEq)]
pub struct Shape(ShapeVariant);

impl Shape {
    #[must_use]
    pub fn new_hann() -> Self {
        Self(ShapeVariant::Hann(Hann))
    }

    #[must_use]
    pub fn new_triangle() -> Self {
        Self(ShapeVariant::Triangle(Triangle))
    }

    /// Barycentric polynomial interpolation over `(xs, ys)`. `xs` must be
    /// sorted and lie within `[-0.5, 0.5]`, with `xs.len() == ys.len()`.
    pub fn new_interpolated(xs: Vec<f64>, ys: Vec<f64>) -> Result<Self> {
        Ok(Self(ShapeVariant::Interp(Interp::new(xs, ys)?)))
    }

    #[must_use]
    pub fn sample(&self, x: f64) -> f64 {
        self.0.sample(x)
    }

    pub fn sample_array(&self, x0: f64, dx: f64, array: &mut [f64]) {
        self.0.sample_array(x0, dx, array);
    }
}

#[enum_dispatch(ShapeTrait)]
#[derive(Debug, Clone, PartialEq)]
enum ShapeVariant {
    Hann,
    Triangle,
    Interp,
}

#[enum_dispatch]
trait ShapeTrait {
    /// Sample the shape at a given position `x`, in the range `[-0.5, 0.5]`.
    /// Both endpoints are strictly open and must evaluate to `0`.
    fn sample(&self, x: f64) -> f64;

    fn sample_array(&self, x0: f64, dx: f64, array: &mut [f64]) {
        for (i, y) in array.iter_mut().enumerate() {
            *y = self.sample(x0 + i as f64 * dx);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Hann;

impl ShapeTrait for Hann {
    fn sample(&self, x: f64) -> f64 {
        if !(x > -0.5 && x < 0.5) {
            return 0.0;
        }
        0.5 * (1.0 + (std::f64::consts::TAU * x).cos())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Triangle;

impl ShapeTrait for Triangle {
    fn sample(&self, x: f64) -> f64 {
        if !(x > -0.5 && x < 0.5) {
            return 0.0;
        }
        (1.0 - 2.0 * x.abs()).max(0.0)
    }
}

/// Barycentric Lagrange interpolation through a fixed set of nodes, as
/// `scipy.interpolate.BarycentricInterpolator` does in the original Python
/// client. Weights are precomputed once at construction so repeated
/// sampling (once per waveform sample) is `O(n)` per call rather than
/// rebuilding the interpolant each time.
#[derive(Debug, Clone, PartialEq)]
struct Interp {
    xs: Vec<f64>,
    ys: Vec<f64>,
    weights: Vec<f64>,
}

impl Interp {
    fn new(xs: Vec<f64>, ys: Vec<f64>) -> Result<Self> {
        if xs.len() != ys.len() {
            bail!("xs and ys must have the same length, got {} and {}", xs.len(), ys.len());
        }
        if xs.is_empty() {
            bail!("interpolated shape needs at least one support point");
        }
        if xs.iter().any(|x| !(-0.5..=0.5).contains(x)) {
            bail!("interpolated shape xs must lie within [-0.5, 0.5]");
        }
        if !xs.windows(2).all(|w| w[0] < w[1]) {
            bail!("interpolated shape xs must be sorted and distinct");
        }
        let weights = barycentric_weights(&xs);
        Ok(Self { xs, ys, weights })
    }
}

impl ShapeTrait for Interp {
    fn sample(&self, x: f64) -> f64 {
        // Both endpoints are strictly open, so a support node placed exactly
        // at x = ±0.5 (xs may lie anywhere within [-0.5, 0.5]) still samples
        // to 0 there rather than its own ys value.
        if !(x > -0.5 && x < 0.5) {
            return 0.0;
        }
        // Exact node hit: the barycentric formula has a removable
        // singularity there, so short-circuit to the stored value.
        if let Some(i) = self.xs.iter().position(|&xi| xi == x) {
            return self.ys[i];
        }
        let mut num = 0.0;
        let mut den = 0.0;
        for ((&xi, &yi), &wi) in self.xs.iter().zip(&self.ys).zip(&self.weights) {
            let t = wi / (x - xi);
            num += t * yi;
            den += t;
        }
        num / den
    }
}

/// Classic barycentric weights `w_j = 1 / prod_{k != j} (x_j - x_k)`.
fn barycentric_weights(xs: &[f64]) -> Vec<f64> {
    xs.iter()
        .enumerate()
        .map(|(j, &xj)| {
            let denom: f64 = xs
                .iter()
                .enumerate()
                .filter(|&(k, _)| k != j)
                .map(|(_, &xk)| xj - xk)
                .product();
            1.0 / denom
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;

    #[test]
    fn hann_matches_known_points() {
        let hann = Hann;
        assert_approx_eq!(f64, hann.sample(-0.5), 0.0);
        assert_approx_eq!(f64, hann.sample(-0.25), 0.5);
        assert_approx_eq!(f64, hann.sample(0.0), 1.0);
        assert_approx_eq!(f64, hann.sample(0.25), 0.5);
        assert_approx_eq!(f64, hann.sample(0.5), 0.0);
    }

    #[test]
    fn triangle_matches_known_points() {
        let triangle = Triangle;
        assert_approx_eq!(f64, triangle.sample(-0.5), 0.0);
        assert_approx_eq!(f64, triangle.sample(-0.25), 0.5);
        assert_approx_eq!(f64, triangle.sample(0.0), 1.0);
        assert_approx_eq!(f64, triangle.sample(0.25), 0.5);
        assert_approx_eq!(f64, triangle.sample(0.5), 0.0);
    }

    #[test]
    fn shapes_are_zero_outside_support() {
        assert_approx_eq!(f64, Hann.sample(0.6), 0.0);
        assert_approx_eq!(f64, Triangle.sample(-0.6), 0.0);
    }

    #[test]
    fn interp_is_zero_at_boundary_even_with_a_nonzero_endpoint_node() {
        let xs = vec![-0.5, 0.0, 0.5];
        let ys = vec![3.0, 1.0, -2.0];
        let interp = Interp::new(xs, ys).unwrap();
        assert_approx_eq!(f64, interp.sample(-0.5), 0.0);
        assert_approx_eq!(f64, interp.sample(0.5), 0.0);
        // the interior node still short-circuits to its own value
        assert_approx_eq!(f64, interp.sample(0.0), 1.0);
    }

    #[test]
    fn interp_reproduces_cosine_through_its_nodes() {
        let xs = vec![-0.5, -0.25, 0.0, 0.25, 0.5];
        let ys: Vec<f64> = xs.iter().map(|x| (std::f64::consts::PI * x).cos()).collect();
        let interp = Interp::new(xs.clone(), ys.clone()).unwrap();
        for (x, y) in xs.iter().zip(ys) {
            assert_approx_eq!(f64, interp.sample(*x), y, epsilon = 1e-9);
        }
        // Interpolated midpoint should be close to the true cosine value.
        let mid = interp.sample(0.125);
        assert_approx_eq!(
            f64,
            mid,
            (std::f64::consts::PI * 0.125).cos(),
            epsilon = 1e-3
        );
    }

    #[test]
    fn interp_rejects_mismatched_lengths() {
        assert!(Interp::new(vec![0.0, 0.1], vec![1.0]).is_err());
    }

    #[test]
    fn interp_rejects_out_of_range_xs() {
        assert!(Interp::new(vec![-0.6, 0.0], vec![0.0, 1.0]).is_err());
    }

    #[test]
    fn interp_rejects_unsorted_xs() {
        assert!(Interp::new(vec![0.1, 0.0], vec![0.0, 1.0]).is_err());
    }
}
