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

//! Substitution reduction of directly-invertible linear equations.
//!
//! Fix-coordinate and axis-alignment constraints lower to equations of the
//! shape `param - constant`, `param - other`, or `param - coeff * other`.
//! Eliminating those before the Newton iteration shrinks both the parameter
//! and equation counts and keeps already-known values out of the Jacobian.

use log::{debug, trace};
use std::collections::BTreeSet;

use crate::exp::{Exp, ParamId};

use super::Equation;

/// Outcome of the reduction pass.
///
/// `live` and the equations consumed into `table` partition the original
/// equation list; equations that fold to a satisfied constant are logged and
/// dropped, unsatisfiable constants stay live for failure attribution.
#[derive(Debug)]
pub(crate) struct Reduction {
    /// Equations left for the numerical iteration.
    pub(crate) live: Vec<Equation>,
    /// Eliminated parameter -> defining expression, in elimination order.
    pub(crate) table: Vec<(ParamId, Exp)>,
}

/// Eliminates linear-binding equations until a pass finds none (fixpoint).
pub(crate) fn reduce(equations: Vec<Equation>, tolerance: f64) -> Reduction {
    let mut live = equations;
    let mut table: Vec<(ParamId, Exp)> = Vec::new();

    loop {
        let binding = live
            .iter()
            .enumerate()
            .find_map(|(idx, eq)| as_linear_binding(&eq.exp).map(|(p, rep)| (idx, p, rep)));
        let Some((idx, param, replacement)) = binding else {
            break;
        };

        let eq = live.remove(idx);
        trace!(
            "eliminating parameter #{} via '{}'",
            param.index(),
            eq.description
        );

        // Chained eliminations: rewrite both the remaining equations and the
        // previously recorded replacement expressions.
        for other in &mut live {
            other.exp = other.exp.substitute(param, &replacement).simplify();
        }
        for (_, rep) in &mut table {
            *rep = rep.substitute(param, &replacement).simplify();
        }
        table.push((param, replacement));

        // Substitution may fold an equation to a constant. A constant within
        // tolerance is satisfied outright; a larger one is kept so the
        // iteration fails with its tag implicated.
        live.retain(|eq| match &eq.exp {
            Exp::Val(v) => {
                if v.abs() <= tolerance {
                    debug!("'{}' satisfied by substitution", eq.description);
                    false
                } else {
                    true
                }
            }
            _ => true,
        });
    }

    Reduction { live, table }
}

/// Back-fills eliminated parameters once the live ones are solved.
///
/// Entries are resolved as their referenced parameters become known, which
/// handles replacements that themselves depend on eliminated parameters.
pub(crate) fn back_substitute(
    table: &[(ParamId, Exp)],
    live_params: &[ParamId],
    values: &mut [f64],
) {
    let mut known = vec![false; values.len()];
    for p in live_params {
        known[p.0] = true;
    }

    let mut pending: Vec<&(ParamId, Exp)> = table.iter().collect();
    while !pending.is_empty() {
        let before = pending.len();
        pending.retain(|(param, replacement)| {
            let mut refs = BTreeSet::new();
            replacement.collect_params(&mut refs);
            if refs.iter().all(|p| known[p.0]) {
                values[param.0] = replacement.eval(values);
                known[param.0] = true;
                false
            } else {
                true
            }
        });
        // Every replacement references only parameters that were live when it
        // was recorded, so each pass must resolve at least one entry.
        assert!(
            pending.len() < before,
            "substitution table failed to resolve"
        );
    }
}

/// Matches `param = constant`, `param = other`, and `param = coeff * other`
/// shapes (after simplification), the only forms the reducer inverts.
fn as_linear_binding(exp: &Exp) -> Option<(ParamId, Exp)> {
    match exp {
        // Simplification strips `- 0.0` and `0.0 -`, so a fix at zero shows
        // up as a bare (possibly negated) parameter.
        Exp::Var(p) => Some((*p, Exp::val(0.0))),
        Exp::Neg(e) => match &**e {
            Exp::Var(p) => Some((*p, Exp::val(0.0))),
            _ => None,
        },
        Exp::Sub(l, r) => match (&**l, &**r) {
            (Exp::Var(p), Exp::Val(c)) | (Exp::Val(c), Exp::Var(p)) => Some((*p, Exp::val(*c))),
            (Exp::Var(p), Exp::Var(q)) if p != q => Some((*p, Exp::var(*q))),
            (Exp::Var(p), Exp::Mul(a, b)) | (Exp::Mul(a, b), Exp::Var(p)) => {
                let (q, coeff) = coeff_times_var(a, b)?;
                if q == *p {
                    return None;
                }
                Some((*p, Exp::mul(Exp::val(coeff), Exp::var(q))))
            }
            _ => None,
        },
        _ => None,
    }
}

// Recognizes `coeff * var` with a literal coefficient on either side.
fn coeff_times_var(a: &Exp, b: &Exp) -> Option<(ParamId, f64)> {
    match (a, b) {
        (Exp::Val(c), Exp::Var(q)) | (Exp::Var(q), Exp::Val(c)) => Some((*q, *c)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eq(exp: Exp) -> Equation {
        Equation {
            exp: exp.simplify(),
            tag: 0,
            description: "test".to_string(),
        }
    }

    fn var(i: usize) -> Exp {
        Exp::var(ParamId(i))
    }

    #[test]
    fn eliminates_fix_shapes() {
        let reduction = reduce(vec![eq(Exp::sub(var(0), Exp::val(4.0)))], 1e-8);
        assert!(reduction.live.is_empty());
        assert_eq!(reduction.table, vec![(ParamId(0), Exp::val(4.0))]);
    }

    #[test]
    fn eliminates_zero_target_fix() {
        // `x - 0` simplifies to a bare `x`, which still binds x = 0.
        let reduction = reduce(vec![eq(Exp::sub(var(0), Exp::val(0.0)))], 1e-8);
        assert!(reduction.live.is_empty());
        assert_eq!(reduction.table, vec![(ParamId(0), Exp::val(0.0))]);
    }

    #[test]
    fn chains_param_to_param_then_constant() {
        // a = b, b = 5 => both end up 5
        let reduction = reduce(
            vec![
                eq(Exp::sub(var(0), var(1))),
                eq(Exp::sub(var(1), Exp::val(5.0))),
            ],
            1e-8,
        );
        assert!(reduction.live.is_empty());
        assert_eq!(reduction.table.len(), 2);

        let mut values = vec![0.0, 0.0];
        back_substitute(&reduction.table, &[], &mut values);
        assert_eq!(values, vec![5.0, 5.0]);
    }

    #[test]
    fn keeps_scaled_binding_coefficient() {
        // a - 2*b = 0, b = 3 => a = 6
        let reduction = reduce(
            vec![
                eq(Exp::sub(var(0), Exp::mul(Exp::val(2.0), var(1)))),
                eq(Exp::sub(var(1), Exp::val(3.0))),
            ],
            1e-8,
        );
        assert!(reduction.live.is_empty());

        let mut values = vec![0.0, 0.0];
        back_substitute(&reduction.table, &[], &mut values);
        assert_eq!(values, vec![6.0, 3.0]);
    }

    #[test]
    fn conflicting_fixes_leave_constant_residual() {
        let reduction = reduce(
            vec![
                eq(Exp::sub(var(0), Exp::val(1.0))),
                eq(Exp::sub(var(0), Exp::val(2.0))),
            ],
            1e-8,
        );
        // Second equation folds to the unsatisfiable constant -1.
        assert_eq!(reduction.live.len(), 1);
        assert_eq!(reduction.live[0].exp, Exp::val(-1.0));
    }

    #[test]
    fn nonlinear_equations_survive() {
        let distance = Exp::sub(Exp::sqrt(Exp::sqr(Exp::sub(var(0), var(1)))), Exp::val(2.0));
        let reduction = reduce(vec![eq(distance.clone())], 1e-8);
        assert_eq!(reduction.live.len(), 1);
        assert!(reduction.table.is_empty());
    }

    #[test]
    fn self_referencing_shape_is_not_a_binding() {
        assert!(as_linear_binding(&Exp::sub(var(0), Exp::mul(Exp::val(2.0), var(0)))).is_none());
    }
}
