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

//! Dense matrix primitives for the least-squares step.
//!
//! The systems involved are sized by live equation/parameter counts (tens of
//! rows at most), so a plain row-major buffer with manual elimination keeps
//! the solver free of a linear-algebra dependency.

/// Row-major dense matrix.
#[derive(Debug, Clone)]
pub(crate) struct Mat {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

/// A numerically singular pivot was met during elimination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SingularPivot;

impl Mat {
    pub(crate) fn zeros(rows: usize, cols: usize) -> Mat {
        Mat {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    pub(crate) fn at(&self, r: usize, c: usize) -> f64 {
        self.data[r * self.cols + c]
    }

    pub(crate) fn set(&mut self, r: usize, c: usize, v: f64) {
        self.data[r * self.cols + c] = v;
    }

    pub(crate) fn row(&self, r: usize) -> &[f64] {
        &self.data[r * self.cols..(r + 1) * self.cols]
    }

    fn swap_rows(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        for c in 0..self.cols {
            self.data.swap(a * self.cols + c, b * self.cols + c);
        }
    }
}

/// Fills `out` with the normal matrix `J * Jt`.
///
/// `out` must be square with dimension equal to the row count of `j`.
pub(crate) fn normal_matrix(j: &Mat, out: &mut Mat) {
    debug_assert_eq!(out.rows, j.rows);
    debug_assert_eq!(out.cols, j.rows);
    for r in 0..j.rows {
        for c in 0..j.rows {
            let v = dot(j.row(r), j.row(c));
            out.set(r, c, v);
        }
    }
}

/// Fills `out` with `Jt * z`.
pub(crate) fn transpose_mul_vec(j: &Mat, z: &[f64], out: &mut [f64]) {
    debug_assert_eq!(z.len(), j.rows);
    debug_assert_eq!(out.len(), j.cols);
    for (c, slot) in out.iter_mut().enumerate() {
        let mut acc = 0.0;
        for r in 0..j.rows {
            acc += j.at(r, c) * z[r];
        }
        *slot = acc;
    }
}

/// Solves `A * x = b` in place by Gaussian elimination with partial pivoting.
///
/// On success the solution replaces `b`. Both `a` and `b` are clobbered. A
/// pivot below `pivot_epsilon` is reported as [`SingularPivot`] instead of
/// letting the division blow up; the caller folds it into a solver failure.
pub(crate) fn solve_in_place(
    a: &mut Mat,
    b: &mut [f64],
    pivot_epsilon: f64,
) -> Result<(), SingularPivot> {
    let n = a.rows;
    debug_assert_eq!(a.cols, n);
    debug_assert_eq!(b.len(), n);

    for col in 0..n {
        // Partial pivoting: pick the largest remaining entry in this column.
        let mut pivot_row = col;
        let mut pivot_mag = a.at(col, col).abs();
        for r in col + 1..n {
            let mag = a.at(r, col).abs();
            if mag > pivot_mag {
                pivot_row = r;
                pivot_mag = mag;
            }
        }
        if !pivot_mag.is_finite() || pivot_mag < pivot_epsilon {
            return Err(SingularPivot);
        }
        a.swap_rows(col, pivot_row);
        b.swap(col, pivot_row);

        let pivot = a.at(col, col);
        for r in col + 1..n {
            let factor = a.at(r, col) / pivot;
            if factor == 0.0 {
                continue;
            }
            for c in col..n {
                let v = a.at(r, c) - factor * a.at(col, c);
                a.set(r, c, v);
            }
            b[r] -= factor * b[col];
        }
    }

    // Back substitution.
    for col in (0..n).rev() {
        let mut acc = b[col];
        for c in col + 1..n {
            acc -= a.at(col, c) * b[c];
        }
        b[col] = acc / a.at(col, col);
    }
    Ok(())
}

/// Computes the numerical row rank by Gram-Schmidt orthogonalization.
///
/// Each row is orthogonalized against the accepted basis; rows whose residual
/// norm stays above `tolerance` contribute to the rank.
pub(crate) fn row_rank(m: &Mat, tolerance: f64) -> usize {
    let mut basis: Vec<Vec<f64>> = Vec::new();
    for r in 0..m.rows {
        let mut v = m.row(r).to_vec();
        for b in &basis {
            let proj = dot(&v, b);
            for (vi, bi) in v.iter_mut().zip(b) {
                *vi -= proj * bi;
            }
        }
        let norm = dot(&v, &v).sqrt();
        if norm > tolerance {
            for vi in &mut v {
                *vi /= norm;
            }
            basis.push(v);
        }
    }
    basis.len()
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
