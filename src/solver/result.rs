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

//! Solve results and structured failure reporting.

use std::collections::BTreeSet;
use std::fmt;

use rs_math3d::Vec3d;

use crate::constraint::{ConstraintTag, PointId};

use super::newton::NewtonFailure;
use super::{Equation, SolverConfig};

/// Classification for solver failure modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Residuals or parameter values diverged, or cannot change at all.
    NotConvergent,
    /// The iteration cap was reached with residuals above tolerance.
    IterationLimit,
    /// The normal-equations solve met a numerically singular pivot.
    SingularMatrix,
}

/// One registered point with its solved position.
#[derive(Debug, Clone, Copy)]
pub struct SolvedPoint {
    /// Caller-supplied point handle.
    pub index: PointId,
    /// Coordinates satisfying the constraint set.
    pub position: Vec3d,
}

/// A successful solve: updated points plus rank/DOF annotations.
#[derive(Debug, Clone)]
pub struct Solution {
    pub(crate) points: Vec<SolvedPoint>,
    /// Newton iterations spent (zero when substitution solved everything).
    pub iterations: usize,
    /// Largest residual magnitude at the accepted point.
    pub residual_norm: f64,
    /// Numerical row rank of the final Jacobian.
    pub rank: usize,
    /// Whether every live equation was independent at the solution.
    pub rank_ok: bool,
    /// Remaining degrees of freedom, reported only when the rank was full.
    pub dof: Option<usize>,
}

impl Solution {
    /// Returns every registered point with its solved position, ordered by
    /// point handle.
    pub fn points(&self) -> &[SolvedPoint] {
        &self.points
    }

    /// Returns the solved position of one point.
    pub fn point(&self, index: PointId) -> Option<Vec3d> {
        self.points
            .iter()
            .find(|p| p.index == index)
            .map(|p| p.position)
    }
}

/// One high-residual equation mapped back to its constraint declaration.
#[derive(Debug, Clone)]
pub struct ConstraintIssue {
    /// Equation index in the live (post-reduction) equation list.
    pub equation_index: usize,
    /// Tag of the originating constraint declaration.
    pub tag: ConstraintTag,
    /// Signed residual at failure time.
    pub residual: f64,
    /// Absolute residual magnitude (`abs(residual)`).
    pub magnitude: f64,
    /// Human-readable constraint description.
    pub description: String,
}

/// Structured report returned for expected solve failures.
///
/// `tags` is the deduplicated set of implicated constraint declarations; a
/// tag covering several equations (parallel, compound fixes) appears once.
#[derive(Debug, Clone)]
pub struct SolveFailureReport {
    /// High-level failure classification.
    pub kind: FailureKind,
    /// Failure message from the iteration engine.
    pub message: String,
    /// Iteration count reached before failure.
    pub iterations: usize,
    /// Largest residual magnitude at failure time.
    pub error: f64,
    /// Number of live equations in the iterated system.
    pub equation_count: usize,
    /// Number of live parameters in the iterated system.
    pub parameter_count: usize,
    /// Implicated constraint tags.
    pub tags: BTreeSet<ConstraintTag>,
    /// Raw residual vector over the live equations.
    pub residuals: Vec<f64>,
    /// Top residual equations, ranked by magnitude.
    pub issues: Vec<ConstraintIssue>,
}

impl fmt::Display for SolveFailureReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({:?}, residual {:.3e}, iterations {}, {} constraints implicated)",
            self.message,
            self.kind,
            self.error,
            self.iterations,
            self.tags.len()
        )
    }
}

impl std::error::Error for SolveFailureReport {}

/// Maps a numeric failure back onto the originating constraint tags.
pub(crate) fn failure_report(
    config: &SolverConfig,
    equations: &[Equation],
    parameter_count: usize,
    failure: NewtonFailure,
) -> SolveFailureReport {
    let NewtonFailure {
        kind,
        message,
        iterations,
        residuals,
    } = failure;
    let tolerance = config.convergence_tolerance;

    // Every equation still away from zero implicates its declaration.
    let mut tags = BTreeSet::new();
    for (eq, r) in equations.iter().zip(&residuals) {
        if !r.is_finite() || r.abs() > tolerance {
            tags.insert(eq.tag);
        }
    }

    let mut ranked: Vec<(usize, f64)> = residuals
        .iter()
        .enumerate()
        .map(|(idx, r)| (idx, if r.is_finite() { r.abs() } else { f64::INFINITY }))
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

    let issues = ranked
        .into_iter()
        .take(8)
        .map(|(idx, magnitude)| ConstraintIssue {
            equation_index: idx,
            tag: equations[idx].tag,
            residual: residuals[idx],
            magnitude,
            description: equations[idx].description.clone(),
        })
        .collect();

    let error = residuals.iter().fold(0.0f64, |acc, r| {
        if r.is_finite() {
            acc.max(r.abs())
        } else {
            f64::INFINITY
        }
    });

    SolveFailureReport {
        kind,
        message,
        iterations,
        error,
        equation_count: equations.len(),
        parameter_count,
        tags,
        residuals,
        issues,
    }
}
