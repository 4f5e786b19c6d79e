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

//! Geometric constraint solver for interactive 3D mesh editing.
//!
//! This crate provides:
//! - Declarative point constraints: fixed coordinates, distance, parallel,
//!   perpendicular, axis alignment, equal distance, and angle.
//! - Symbolic lowering of each constraint into scalar equations with
//!   per-equation differentiation.
//! - Substitution reduction of directly-invertible linear equations before
//!   the numerical iteration.
//! - A Newton solver with a minimum-norm least-squares step, tolerant of
//!   non-square and rank-deficient systems.
//! - Rank/degrees-of-freedom diagnostics and failure attribution back to
//!   caller-supplied constraint tags.
//!
//! # Pipeline
//!
//! 1. Register points with their current positions (`Solver::add_point`).
//! 2. Declare constraints, each under a caller-chosen tag.
//! 3. `Solver::solve` reduces, iterates, analyzes rank, back-substitutes,
//!    and returns either solved positions or a structured failure report.
//!
//! # Staying close to the input
//!
//! The correction step solves `J * Jt * z = b` and applies `delta = Jt * z`,
//! the minimum-norm update. Under-determined systems therefore settle on the
//! solution nearest the caller's current geometry instead of jumping to an
//! arbitrary valid configuration.
//!
//! ```
//! use mesh_constraint_solver::Solver;
//! use rs_math3d::Vec3d;
//!
//! let mut solver = Solver::new();
//! solver.add_point(0, Vec3d::new(10.0, 10.0, 10.0));
//! solver.add_point(1, Vec3d::new(20.0, 20.0, 20.0));
//! solver.distance(42, 0, 1, 30.0);
//!
//! let solution = solver.solve().expect("satisfiable system");
//! assert!(solution.rank_ok);
//! ```

mod constraint;
mod exp;
mod linalg;
mod solver;

pub use constraint::{Axis, Constraint, ConstraintTag, PointId};
pub use exp::{Exp, ParamId};
pub use solver::{
    ConstraintIssue, FailureKind, Solution, SolveFailureReport, SolvedPoint, Solver, SolverConfig,
};

#[cfg(test)]
mod tests;
