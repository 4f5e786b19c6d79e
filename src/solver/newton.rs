/*
MIT License

Copyright (c) 2026 Raja Lehtihet and Wael El Oraiby

Permission is hereby granted, free of charge, to any person obtaining a copy
of this software and associated documentation files (the "Software"), to deal
in the Software without restriction, including without limitation the rights
to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all
copies or substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
SOFTWARE.
*/

//! Newton iteration with a minimum-norm least-squares step.
//!
//! Each iteration evaluates the residual vector `b` and Jacobian `J` at the
//! current parameter values, solves the normal equations `J * Jt * z = b`,
//! and applies the correction `delta = Jt * z`. Working through the normal
//! equations handles exactly-determined, over-determined (the rank-deficient
//! parallel block), and under-determined systems with one routine, always
//! producing the minimum-norm correction so solved geometry stays close to
//! the caller's initial guess.

use log::{debug, trace};

use crate::exp::{Exp, ParamId};
use crate::linalg::{self, Mat};

use super::result::FailureKind;
use super::{Equation, SolverConfig};

/// Successful termination of the iteration.
#[derive(Debug)]
pub(crate) struct NewtonOutcome {
    /// Number of correction steps applied.
    pub(crate) iterations: usize,
    /// Residuals at the accepted point.
    pub(crate) residuals: Vec<f64>,
    /// Symbolic Jacobian rows, reusable for rank analysis.
    pub(crate) jacobian: Vec<Vec<Exp>>,
}

/// Failed termination, carrying enough state to attribute blame.
#[derive(Debug)]
pub(crate) struct NewtonFailure {
    pub(crate) kind: FailureKind,
    pub(crate) message: String,
    pub(crate) iterations: usize,
    pub(crate) residuals: Vec<f64>,
}

/// Iterates the live system to convergence or failure.
///
/// Parameter updates land directly in `values`; on failure the table holds
/// the last (diverged or stalled) state, which the failure report snapshots.
pub(crate) fn iterate(
    config: &SolverConfig,
    equations: &[Equation],
    live_params: &[ParamId],
    values: &mut [f64],
) -> Result<NewtonOutcome, NewtonFailure> {
    let m = equations.len();
    let n = live_params.len();
    let limit = config.divergence_limit;

    let mut residuals: Vec<f64> = equations.iter().map(|eq| eq.exp.eval(values)).collect();

    // Differentiate once; only the numeric evaluation repeats per iteration.
    let jacobian: Vec<Vec<Exp>> = equations
        .iter()
        .map(|eq| live_params.iter().map(|p| eq.exp.derive(*p)).collect())
        .collect();

    if !residuals.iter().all(|r| is_reasonable(*r, limit)) {
        return Err(NewtonFailure {
            kind: FailureKind::NotConvergent,
            message: "residuals are not reasonable at the initial point".to_string(),
            iterations: 0,
            residuals,
        });
    }
    if converged(&residuals, config.convergence_tolerance) {
        debug!("system already satisfied at the initial point");
        return Ok(NewtonOutcome {
            iterations: 0,
            residuals,
            jacobian,
        });
    }
    if n == 0 {
        // Nothing left to move; the remaining residuals can never change.
        return Err(NewtonFailure {
            kind: FailureKind::NotConvergent,
            message: "no free parameters remain but residuals exceed tolerance".to_string(),
            iterations: 0,
            residuals,
        });
    }

    // Buffers are allocated once and refilled in place each iteration.
    let mut j = Mat::zeros(m, n);
    let mut normal = Mat::zeros(m, m);
    let mut z = vec![0.0; m];
    let mut delta = vec![0.0; n];

    for iteration in 1..=config.max_iterations {
        for (r, row) in jacobian.iter().enumerate() {
            for (c, derivative) in row.iter().enumerate() {
                j.set(r, c, derivative.eval(values));
            }
        }

        linalg::normal_matrix(&j, &mut normal);
        z.copy_from_slice(&residuals);
        if linalg::solve_in_place(&mut normal, &mut z, config.pivot_epsilon).is_err() {
            return Err(NewtonFailure {
                kind: FailureKind::SingularMatrix,
                message: format!("singular least-squares system at iteration {iteration}"),
                iterations: iteration,
                residuals,
            });
        }

        linalg::transpose_mul_vec(&j, &z, &mut delta);
        for (p, d) in live_params.iter().zip(&delta) {
            values[p.0] -= d;
        }

        if !live_params.iter().all(|p| is_reasonable(values[p.0], limit)) {
            return Err(NewtonFailure {
                kind: FailureKind::NotConvergent,
                message: format!("parameter values diverged at iteration {iteration}"),
                iterations: iteration,
                residuals,
            });
        }

        for (slot, eq) in residuals.iter_mut().zip(equations) {
            *slot = eq.exp.eval(values);
        }
        trace!(
            "iteration {iteration}: residual norm {:.3e}",
            max_abs(&residuals)
        );

        if !residuals.iter().all(|r| is_reasonable(*r, limit)) {
            return Err(NewtonFailure {
                kind: FailureKind::NotConvergent,
                message: format!("residuals diverged at iteration {iteration}"),
                iterations: iteration,
                residuals,
            });
        }
        if converged(&residuals, config.convergence_tolerance) {
            return Ok(NewtonOutcome {
                iterations: iteration,
                residuals,
                jacobian,
            });
        }
    }

    Err(NewtonFailure {
        kind: FailureKind::IterationLimit,
        message: format!(
            "no convergence after {} iterations (residual {:.3e})",
            config.max_iterations,
            max_abs(&residuals)
        ),
        iterations: config.max_iterations,
        residuals,
    })
}

fn converged(residuals: &[f64], tolerance: f64) -> bool {
    residuals.iter().all(|r| r.abs() <= tolerance)
}

fn max_abs(residuals: &[f64]) -> f64 {
    residuals.iter().fold(0.0f64, |acc, r| acc.max(r.abs()))
}

// Divergence is an expected, user-triggerable outcome; screen values
// explicitly instead of trusting float-exception behavior downstream.
fn is_reasonable(v: f64, limit: f64) -> bool {
    v.is_finite() && v.abs() < limit
}
