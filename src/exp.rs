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

//! Scalar expression trees with symbolic differentiation.
//!
//! Equations are built over [`ParamId`] leaves (one per point coordinate) and
//! support the closed operator set the constraint kinds need: arithmetic,
//! negation, and square root. Partial derivatives are taken symbolically once
//! per equation/parameter pair and evaluated numerically each iteration.

use std::collections::BTreeSet;

/// Identity of one scalar unknown tracked during a solve session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ParamId(pub(crate) usize);

impl ParamId {
    /// Returns the dense table index backing this parameter.
    pub fn index(self) -> usize {
        self.0
    }
}

/// A scalar algebraic expression over solver parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum Exp {
    /// A literal constant.
    Val(f64),
    /// A solver parameter reference.
    Var(ParamId),
    /// Sum of two sub-expressions.
    Add(Box<Exp>, Box<Exp>),
    /// Difference of two sub-expressions.
    Sub(Box<Exp>, Box<Exp>),
    /// Product of two sub-expressions.
    Mul(Box<Exp>, Box<Exp>),
    /// Quotient of two sub-expressions.
    Div(Box<Exp>, Box<Exp>),
    /// Negation of a sub-expression.
    Neg(Box<Exp>),
    /// Square root of a sub-expression.
    Sqrt(Box<Exp>),
}

impl Exp {
    /// Builds a literal constant.
    pub fn val(v: f64) -> Exp {
        Exp::Val(v)
    }

    /// Builds a parameter reference.
    pub fn var(p: ParamId) -> Exp {
        Exp::Var(p)
    }

    /// Builds `l + r`.
    pub fn add(l: Exp, r: Exp) -> Exp {
        Exp::Add(Box::new(l), Box::new(r))
    }

    /// Builds `l - r`.
    pub fn sub(l: Exp, r: Exp) -> Exp {
        Exp::Sub(Box::new(l), Box::new(r))
    }

    /// Builds `l * r`.
    pub fn mul(l: Exp, r: Exp) -> Exp {
        Exp::Mul(Box::new(l), Box::new(r))
    }

    /// Builds `l / r`.
    pub fn div(l: Exp, r: Exp) -> Exp {
        Exp::Div(Box::new(l), Box::new(r))
    }

    /// Builds `-e`.
    pub fn neg(e: Exp) -> Exp {
        Exp::Neg(Box::new(e))
    }

    /// Builds `sqrt(e)`.
    pub fn sqrt(e: Exp) -> Exp {
        Exp::Sqrt(Box::new(e))
    }

    /// Builds `e * e`.
    pub fn sqr(e: Exp) -> Exp {
        Exp::mul(e.clone(), e)
    }

    /// Evaluates the expression against the parameter value table.
    ///
    /// Division by zero and domain errors propagate as non-finite values; the
    /// iteration engine screens those with its reasonable-value check rather
    /// than this evaluator.
    pub fn eval(&self, values: &[f64]) -> f64 {
        match self {
            Exp::Val(v) => *v,
            Exp::Var(p) => values[p.0],
            Exp::Add(l, r) => l.eval(values) + r.eval(values),
            Exp::Sub(l, r) => l.eval(values) - r.eval(values),
            Exp::Mul(l, r) => l.eval(values) * r.eval(values),
            Exp::Div(l, r) => l.eval(values) / r.eval(values),
            Exp::Neg(e) => -e.eval(values),
            Exp::Sqrt(e) => e.eval(values).sqrt(),
        }
    }

    /// Returns the symbolic partial derivative with respect to `param`.
    ///
    /// The result is simplified so that Jacobian entries for unrelated
    /// parameters collapse to plain zero constants.
    pub fn derive(&self, param: ParamId) -> Exp {
        let d = match self {
            Exp::Val(_) => Exp::val(0.0),
            Exp::Var(p) => Exp::val(if *p == param { 1.0 } else { 0.0 }),
            Exp::Add(l, r) => Exp::add(l.derive(param), r.derive(param)),
            Exp::Sub(l, r) => Exp::sub(l.derive(param), r.derive(param)),
            Exp::Mul(l, r) => Exp::add(
                Exp::mul(l.derive(param), (**r).clone()),
                Exp::mul((**l).clone(), r.derive(param)),
            ),
            Exp::Div(l, r) => Exp::div(
                Exp::sub(
                    Exp::mul(l.derive(param), (**r).clone()),
                    Exp::mul((**l).clone(), r.derive(param)),
                ),
                Exp::mul((**r).clone(), (**r).clone()),
            ),
            Exp::Neg(e) => Exp::neg(e.derive(param)),
            Exp::Sqrt(e) => Exp::div(
                e.derive(param),
                Exp::mul(Exp::val(2.0), Exp::sqrt((**e).clone())),
            ),
        };
        d.simplify()
    }

    /// Rewrites every reference to `param` with `replacement`.
    pub fn substitute(&self, param: ParamId, replacement: &Exp) -> Exp {
        match self {
            Exp::Val(_) => self.clone(),
            Exp::Var(p) => {
                if *p == param {
                    replacement.clone()
                } else {
                    self.clone()
                }
            }
            Exp::Add(l, r) => Exp::add(
                l.substitute(param, replacement),
                r.substitute(param, replacement),
            ),
            Exp::Sub(l, r) => Exp::sub(
                l.substitute(param, replacement),
                r.substitute(param, replacement),
            ),
            Exp::Mul(l, r) => Exp::mul(
                l.substitute(param, replacement),
                r.substitute(param, replacement),
            ),
            Exp::Div(l, r) => Exp::div(
                l.substitute(param, replacement),
                r.substitute(param, replacement),
            ),
            Exp::Neg(e) => Exp::neg(e.substitute(param, replacement)),
            Exp::Sqrt(e) => Exp::sqrt(e.substitute(param, replacement)),
        }
    }

    /// Constant-folds literals and strips arithmetic identities.
    ///
    /// The reducer relies on this to expose `param - constant` shapes after a
    /// substitution pass; the derivative rules rely on it to prune zero terms.
    pub fn simplify(&self) -> Exp {
        match self {
            Exp::Val(_) | Exp::Var(_) => self.clone(),
            Exp::Add(l, r) => match (l.simplify(), r.simplify()) {
                (Exp::Val(a), Exp::Val(b)) => Exp::val(a + b),
                (Exp::Val(a), e) if a == 0.0 => e,
                (e, Exp::Val(b)) if b == 0.0 => e,
                (l, r) => Exp::add(l, r),
            },
            Exp::Sub(l, r) => match (l.simplify(), r.simplify()) {
                (Exp::Val(a), Exp::Val(b)) => Exp::val(a - b),
                (e, Exp::Val(b)) if b == 0.0 => e,
                (Exp::Val(a), e) if a == 0.0 => Exp::neg(e).simplify(),
                (l, r) if l == r => Exp::val(0.0),
                (l, r) => Exp::sub(l, r),
            },
            Exp::Mul(l, r) => match (l.simplify(), r.simplify()) {
                (Exp::Val(a), Exp::Val(b)) => Exp::val(a * b),
                (Exp::Val(a), _) | (_, Exp::Val(a)) if a == 0.0 => Exp::val(0.0),
                (Exp::Val(a), e) if a == 1.0 => e,
                (e, Exp::Val(b)) if b == 1.0 => e,
                (l, r) => Exp::mul(l, r),
            },
            Exp::Div(l, r) => match (l.simplify(), r.simplify()) {
                (Exp::Val(a), Exp::Val(b)) if b != 0.0 => Exp::val(a / b),
                (Exp::Val(a), _) if a == 0.0 => Exp::val(0.0),
                (e, Exp::Val(b)) if b == 1.0 => e,
                (l, r) => Exp::div(l, r),
            },
            Exp::Neg(e) => match e.simplify() {
                Exp::Val(v) => Exp::val(-v),
                Exp::Neg(inner) => *inner,
                e => Exp::neg(e),
            },
            Exp::Sqrt(e) => match e.simplify() {
                Exp::Val(v) if v >= 0.0 => Exp::val(v.sqrt()),
                e => Exp::sqrt(e),
            },
        }
    }

    /// Collects every parameter referenced by the expression.
    pub fn collect_params(&self, out: &mut BTreeSet<ParamId>) {
        match self {
            Exp::Val(_) => {}
            Exp::Var(p) => {
                out.insert(*p);
            }
            Exp::Add(l, r) | Exp::Sub(l, r) | Exp::Mul(l, r) | Exp::Div(l, r) => {
                l.collect_params(out);
                r.collect_params(out);
            }
            Exp::Neg(e) | Exp::Sqrt(e) => e.collect_params(out),
        }
    }

    /// Returns `true` when the expression references `param`.
    pub fn references(&self, param: ParamId) -> bool {
        match self {
            Exp::Val(_) => false,
            Exp::Var(p) => *p == param,
            Exp::Add(l, r) | Exp::Sub(l, r) | Exp::Mul(l, r) | Exp::Div(l, r) => {
                l.references(param) || r.references(param)
            }
            Exp::Neg(e) | Exp::Sqrt(e) => e.references(param),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(i: usize) -> ParamId {
        ParamId(i)
    }

    #[test]
    fn evaluates_distance_form() {
        // sqrt((x0 - x1)^2) - 3 with x0 = 7, x1 = 2
        let e = Exp::sub(
            Exp::sqrt(Exp::sqr(Exp::sub(Exp::var(p(0)), Exp::var(p(1))))),
            Exp::val(3.0),
        );
        assert_eq!(e.eval(&[7.0, 2.0]), 2.0);
    }

    #[test]
    fn derives_linear_terms() {
        let e = Exp::sub(Exp::var(p(0)), Exp::mul(Exp::val(2.0), Exp::var(p(1))));
        assert_eq!(e.derive(p(0)), Exp::val(1.0));
        assert_eq!(e.derive(p(1)), Exp::val(-2.0));
        assert_eq!(e.derive(p(2)), Exp::val(0.0));
    }

    #[test]
    fn derives_sqrt_by_chain_rule() {
        // d/dx sqrt(x * x) = 2x / (2 sqrt(x^2)) = x / |x|
        let e = Exp::sqrt(Exp::sqr(Exp::var(p(0))));
        let d = e.derive(p(0));
        let values = [4.0];
        assert!((d.eval(&values) - 1.0).abs() < 1e-12);
        let values = [-4.0];
        assert!((d.eval(&values) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn derives_quotient() {
        // d/dx (x / (x + 1)) = 1 / (x + 1)^2
        let e = Exp::div(
            Exp::var(p(0)),
            Exp::add(Exp::var(p(0)), Exp::val(1.0)),
        );
        let d = e.derive(p(0));
        let values = [3.0];
        assert!((d.eval(&values) - 1.0 / 16.0).abs() < 1e-12);
    }

    #[test]
    fn substitution_then_simplify_folds_constants() {
        let e = Exp::sub(Exp::var(p(0)), Exp::var(p(1)));
        let folded = e.substitute(p(1), &Exp::val(5.0)).simplify();
        assert_eq!(folded, Exp::sub(Exp::var(p(0)), Exp::val(5.0)));
        let folded = folded.substitute(p(0), &Exp::val(5.0)).simplify();
        assert_eq!(folded, Exp::val(0.0));
    }

    #[test]
    fn simplify_prunes_zero_and_one_factors() {
        let e = Exp::add(
            Exp::mul(Exp::val(0.0), Exp::var(p(0))),
            Exp::mul(Exp::val(1.0), Exp::var(p(1))),
        );
        assert_eq!(e.simplify(), Exp::var(p(1)));
    }

    #[test]
    fn collects_referenced_params() {
        let e = Exp::div(
            Exp::sub(Exp::var(p(2)), Exp::var(p(0))),
            Exp::sqrt(Exp::var(p(5))),
        );
        let mut seen = BTreeSet::new();
        e.collect_params(&mut seen);
        assert_eq!(seen.into_iter().collect::<Vec<_>>(), vec![p(0), p(2), p(5)]);
        assert!(e.references(p(5)));
        assert!(!e.references(p(1)));
    }
}
