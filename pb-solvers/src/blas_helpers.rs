//! BLAS-style vector operations
//!
//! Inner products, norms, and axpy-type updates shared by the iterative
//! solvers. All routines are straight loops over contiguous data; the
//! compiler vectorizes them well without an external BLAS.

use crate::traits::SolverScalar;
use ndarray::Array1;

/// Compute inner product (x, y) = Σ x_i * y_i
#[inline]
pub fn inner_product<T: SolverScalar>(x: &Array1<T>, y: &Array1<T>) -> T {
    assert_eq!(
        x.len(),
        y.len(),
        "Vector lengths must match for inner product"
    );
    let mut sum = T::zero();
    for (xi, yi) in x.iter().zip(y.iter()) {
        sum += *xi * *yi;
    }
    sum
}

/// Compute vector 2-norm: ||x||_2 = sqrt(Σ x_i^2)
#[inline]
pub fn vector_norm<T: SolverScalar>(x: &Array1<T>) -> T {
    vector_norm_sqr(x).sqrt()
}

/// Compute vector norm squared: ||x||_2^2 = Σ x_i^2
///
/// More efficient than computing norm and squaring when the square root
/// isn't needed.
#[inline]
pub fn vector_norm_sqr<T: SolverScalar>(x: &Array1<T>) -> T {
    let mut sum = T::zero();
    for xi in x.iter() {
        sum += *xi * *xi;
    }
    sum
}

/// Compute axpy: y = α * x + y
#[inline]
pub fn axpy<T: SolverScalar>(alpha: T, x: &Array1<T>, y: &mut Array1<T>) {
    for (xi, yi) in x.iter().zip(y.iter_mut()) {
        *yi += alpha * *xi;
    }
}

/// Compute vector scale in-place: x = α * x
#[inline]
pub fn scale_inplace<T: SolverScalar>(x: &mut Array1<T>, alpha: T) {
    for xi in x.iter_mut() {
        *xi *= alpha;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_inner_product() {
        let x = array![1.0_f64, 2.0, 3.0];
        let y = array![4.0_f64, 5.0, 6.0];

        let ip = inner_product(&x, &y);
        assert_relative_eq!(ip, 1.0 * 4.0 + 2.0 * 5.0 + 3.0 * 6.0, epsilon = 1e-10);
    }

    #[test]
    fn test_vector_norm() {
        let x = array![3.0_f64, 4.0];

        let norm = vector_norm(&x);
        assert_relative_eq!(norm, 5.0, epsilon = 1e-10);
    }

    #[test]
    fn test_vector_norm_zero() {
        let x = array![0.0_f64, 0.0, 0.0];

        let norm = vector_norm(&x);
        assert_relative_eq!(norm, 0.0, epsilon = 1e-15);
    }

    #[test]
    fn test_axpy() {
        let alpha = 2.0_f64;
        let x = array![1.0_f64, 2.0, 3.0];
        let mut y = array![1.0_f64, 1.0, 1.0];

        axpy(alpha, &x, &mut y);

        assert_relative_eq!(y[0], 3.0, epsilon = 1e-10);
        assert_relative_eq!(y[1], 5.0, epsilon = 1e-10);
        assert_relative_eq!(y[2], 7.0, epsilon = 1e-10);
    }

    #[test]
    fn test_scale_inplace() {
        let mut x = array![1.0_f64, 2.0, 3.0];

        scale_inplace(&mut x, 0.5);

        assert_relative_eq!(x[0], 0.5, epsilon = 1e-10);
        assert_relative_eq!(x[1], 1.0, epsilon = 1e-10);
        assert_relative_eq!(x[2], 1.5, epsilon = 1e-10);
    }
}
