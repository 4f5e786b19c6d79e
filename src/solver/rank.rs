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

//! Rank and degrees-of-freedom diagnostics.
//!
//! Diagnostic only: the numbers annotate a successful solution and never
//! block or alter it. A rank below the equation count means some equations
//! were redundant at the solution (the parallel constraint's three-component
//! block is the common case).

use crate::exp::{Exp, ParamId};
use crate::linalg::{self, Mat};

use super::SolverConfig;

/// Rank annotations attached to a successful solve.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RankReport {
    pub(crate) rank: usize,
    pub(crate) rank_ok: bool,
    /// Free parameter count once the rank is known; only meaningful when the
    /// Jacobian had full row rank.
    pub(crate) dof: Option<usize>,
}

/// Re-evaluates the Jacobian at the final point and counts independent rows.
pub(crate) fn analyze(
    config: &SolverConfig,
    jacobian: &[Vec<Exp>],
    live_params: &[ParamId],
    values: &[f64],
) -> RankReport {
    let m = jacobian.len();
    let n = live_params.len();

    let mut numeric = Mat::zeros(m, n);
    for (r, row) in jacobian.iter().enumerate() {
        for (c, derivative) in row.iter().enumerate() {
            numeric.set(r, c, derivative.eval(values));
        }
    }

    let rank = linalg::row_rank(&numeric, config.rank_tolerance);
    let rank_ok = rank == m;
    RankReport {
        rank,
        rank_ok,
        dof: rank_ok.then(|| n - m),
    }
}
