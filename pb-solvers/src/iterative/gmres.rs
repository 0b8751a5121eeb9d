//! GMRES (Generalized Minimal Residual) solver
//!
//! Implementation of the restarted GMRES algorithm based on Saad & Schultz
//! (1986), following the structure of the "Templates for the Solution of
//! Linear Systems" reference routine.
//!
//! The solver builds an orthonormal Krylov basis by modified Gram-Schmidt,
//! reduces the Hessenberg matrix with Givens rotations on the fly, and
//! monitors the relative residual from the rotated right-hand side. With
//! left preconditioning it solves M⁻¹Ax = M⁻¹b.

use crate::blas_helpers::{axpy, inner_product, vector_norm};
use crate::traits::{IdentityPreconditioner, LinearOperator, Preconditioner, SolverScalar};
use ndarray::{Array1, Array2};
use thiserror::Error;

/// Errors from invalid GMRES arguments.
///
/// Each variant corresponds to one of the negative info codes of the
/// reference routine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GmresError {
    #[error("system dimension is zero")]
    EmptySystem,
    #[error("restart parameter must be positive")]
    InvalidRestart,
    #[error("maximum iteration count must be positive")]
    InvalidIterationLimit,
    #[error("tolerance must lie in [0, 1]")]
    InvalidTolerance,
}

impl GmresError {
    /// Info code of the reference implementation (-1..-4)
    pub fn code(&self) -> i32 {
        match self {
            GmresError::EmptySystem => -1,
            GmresError::InvalidRestart => -2,
            GmresError::InvalidIterationLimit => -3,
            GmresError::InvalidTolerance => -4,
        }
    }
}

/// GMRES solver configuration
#[derive(Debug, Clone)]
pub struct GmresConfig<R> {
    /// Maximum total number of inner iterations (matrix-vector products)
    pub max_iterations: usize,
    /// Restart parameter (number of inner iterations before restart)
    pub restart: usize,
    /// Relative tolerance for convergence: ||r|| / ||b|| <= tolerance
    pub tolerance: R,
    /// Log progress every N iterations (0 = no output)
    pub print_interval: usize,
}

impl Default for GmresConfig<f64> {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            restart: 10,
            tolerance: 1e-4,
            print_interval: 1,
        }
    }
}

impl Default for GmresConfig<f32> {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            restart: 10,
            tolerance: 1e-3,
            print_interval: 1,
        }
    }
}

impl<R: SolverScalar> GmresConfig<R> {
    fn validate(&self, n: usize) -> Result<(), GmresError> {
        if n == 0 {
            return Err(GmresError::EmptySystem);
        }
        if self.restart == 0 {
            return Err(GmresError::InvalidRestart);
        }
        if self.max_iterations == 0 {
            return Err(GmresError::InvalidIterationLimit);
        }
        if self.tolerance < R::zero() || self.tolerance > R::one() {
            return Err(GmresError::InvalidTolerance);
        }
        Ok(())
    }
}

/// GMRES solver result
#[derive(Debug, Clone)]
pub struct GmresSolution<T: SolverScalar> {
    /// Solution vector (best iterate on non-convergence)
    pub x: Array1<T>,
    /// Total number of matrix-vector products
    pub iterations: usize,
    /// Number of restarts performed
    pub restarts: usize,
    /// Final relative residual
    pub residual: T,
    /// Whether convergence was achieved
    pub converged: bool,
}

/// Solve Ax = b using restarted GMRES without preconditioning
pub fn gmres<T, A>(
    operator: &A,
    b: &Array1<T>,
    config: &GmresConfig<T>,
) -> Result<GmresSolution<T>, GmresError>
where
    T: SolverScalar,
    A: LinearOperator<T>,
{
    gmres_preconditioned(operator, &IdentityPreconditioner, b, config)
}

/// Solve Ax = b using restarted GMRES with left preconditioning
///
/// Solves M⁻¹Ax = M⁻¹b starting from x₀ = 0.
pub fn gmres_preconditioned<T, A, P>(
    operator: &A,
    precond: &P,
    b: &Array1<T>,
    config: &GmresConfig<T>,
) -> Result<GmresSolution<T>, GmresError>
where
    T: SolverScalar,
    A: LinearOperator<T>,
    P: Preconditioner<T>,
{
    gmres_preconditioned_with_guess(operator, precond, b, None, config)
}

/// Solve Ax = b using left-preconditioned restarted GMRES with an
/// optional initial guess
pub fn gmres_preconditioned_with_guess<T, A, P>(
    operator: &A,
    precond: &P,
    b: &Array1<T>,
    x0: Option<&Array1<T>>,
    config: &GmresConfig<T>,
) -> Result<GmresSolution<T>, GmresError>
where
    T: SolverScalar,
    A: LinearOperator<T>,
    P: Preconditioner<T>,
{
    let n = b.len();
    config.validate(n)?;
    let m = config.restart;

    let mut x = match x0 {
        Some(guess) => guess.clone(),
        None => Array1::from_elem(n, T::zero()),
    };

    // Convergence is measured against the unpreconditioned RHS norm; a zero
    // RHS is treated as norm one so the zero solution converges immediately.
    let mut b_norm = vector_norm(b);
    if b_norm == T::zero() {
        b_norm = T::one();
    }

    let mut total_iterations = 0;
    let mut restarts = 0;
    let mut rel_residual;

    'outer: loop {
        // Preconditioned residual r = M⁻¹(b - Ax)
        let ax = operator.apply(&x);
        let residual: Array1<T> = b - &ax;
        let r = precond.apply(&residual);
        let beta = vector_norm(&r);

        rel_residual = beta / b_norm;
        if rel_residual <= config.tolerance {
            return Ok(GmresSolution {
                x,
                iterations: total_iterations,
                restarts,
                residual: rel_residual,
                converged: true,
            });
        }

        // Krylov basis V, Hessenberg H, Givens coefficients, rotated RHS g
        let mut v: Vec<Array1<T>> = Vec::with_capacity(m + 1);
        v.push(r.mapv(|ri| ri / beta));

        let mut h: Array2<T> = Array2::from_elem((m + 1, m), T::zero());
        let mut cs: Vec<T> = Vec::with_capacity(m);
        let mut sn: Vec<T> = Vec::with_capacity(m);

        let mut g: Array1<T> = Array1::from_elem(m + 1, T::zero());
        g[0] = beta;

        let mut breakdown = false;

        for j in 0..m {
            total_iterations += 1;

            // w = M⁻¹ * A * v_j
            let av = operator.apply(&v[j]);
            let mut w = precond.apply(&av);

            // Modified Gram-Schmidt orthogonalization
            for i in 0..=j {
                h[[i, j]] = inner_product(&v[i], &w);
                let h_ij = h[[i, j]];
                axpy(-h_ij, &v[i], &mut w);
            }

            let w_norm = vector_norm(&w);
            h[[j + 1, j]] = w_norm;

            if w_norm < T::breakdown_tolerance() {
                // Happy breakdown: the Krylov space is exhausted
                breakdown = true;
            } else {
                v.push(w.mapv(|wi| wi / w_norm));
            }

            // Apply previous Givens rotations to the new column of H
            for i in 0..j {
                let temp = cs[i] * h[[i, j]] + sn[i] * h[[i + 1, j]];
                h[[i + 1, j]] = -sn[i] * h[[i, j]] + cs[i] * h[[i + 1, j]];
                h[[i, j]] = temp;
            }

            // Construct and apply the new rotation zeroing H(j+1, j)
            let (c, s) = givens_rotation(h[[j, j]], h[[j + 1, j]]);
            cs.push(c);
            sn.push(s);

            h[[j, j]] = c * h[[j, j]] + s * h[[j + 1, j]];
            h[[j + 1, j]] = T::zero();

            let temp = c * g[j] + s * g[j + 1];
            g[j + 1] = -s * g[j];
            g[j] = temp;

            rel_residual = g[j + 1].abs() / b_norm;

            if config.print_interval > 0 && total_iterations % config.print_interval == 0 {
                log::info!(
                    "GMRES iteration {} (restart {}): relative residual = {:e}",
                    total_iterations,
                    restarts,
                    rel_residual.to_f64().unwrap_or(0.0)
                );
            }

            if rel_residual <= config.tolerance || breakdown {
                let y = solve_upper_triangular(&h, &g, j + 1);
                for (i, &yi) in y.iter().enumerate() {
                    axpy(yi, &v[i], &mut x);
                }

                return Ok(GmresSolution {
                    x,
                    iterations: total_iterations,
                    restarts,
                    residual: rel_residual,
                    converged: true,
                });
            }

            if total_iterations >= config.max_iterations {
                // Iteration limit inside the cycle: update with what we have
                let y = solve_upper_triangular(&h, &g, j + 1);
                for (i, &yi) in y.iter().enumerate() {
                    axpy(yi, &v[i], &mut x);
                }
                break 'outer;
            }
        }

        // Restart: fold the current cycle into x
        let y = solve_upper_triangular(&h, &g, m);
        for (i, &yi) in y.iter().enumerate() {
            axpy(yi, &v[i], &mut x);
        }

        restarts += 1;
    }

    // Iteration limit reached: report the true residual of the best iterate
    let ax = operator.apply(&x);
    let residual: Array1<T> = b - &ax;
    let r = precond.apply(&residual);
    rel_residual = vector_norm(&r) / b_norm;

    Ok(GmresSolution {
        x,
        iterations: total_iterations,
        restarts,
        residual: rel_residual,
        converged: false,
    })
}

/// Compute Givens rotation coefficients (c, s) zeroing the second entry
#[inline]
fn givens_rotation<T: SolverScalar>(a: T, b: T) -> (T, T) {
    if b == T::zero() {
        (T::one(), T::zero())
    } else if b.abs() > a.abs() {
        let t = a / b;
        let s = T::one() / (T::one() + t * t).sqrt();
        (s * t, s)
    } else {
        let t = b / a;
        let c = T::one() / (T::one() + t * t).sqrt();
        (c, c * t)
    }
}

/// Solve the upper triangular system Hy = g for the leading k unknowns
fn solve_upper_triangular<T: SolverScalar>(h: &Array2<T>, g: &Array1<T>, k: usize) -> Vec<T> {
    let mut y = vec![T::zero(); k];

    for i in (0..k).rev() {
        let mut sum = g[i];
        for j in (i + 1)..k {
            sum -= h[[i, j]] * y[j];
        }
        if h[[i, i]].abs() > T::breakdown_tolerance() {
            y[i] = sum / h[[i, i]];
        }
    }

    y
}
