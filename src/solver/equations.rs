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

//! Lowering of constraint declarations into tagged scalar equations.
//!
//! Each public method appends one or more equations whose value is zero
//! exactly when the constraint holds, all carrying the caller's tag.

use crate::constraint::{Axis, Constraint, ConstraintTag, PointId};
use crate::exp::Exp;

use super::Solver;

impl Solver {
    /// Adds any declared constraint. Dispatch is exhaustive over the closed
    /// kind set, so an unhandled kind cannot reach runtime.
    pub fn add_constraint(&mut self, tag: ConstraintTag, constraint: Constraint) {
        match constraint {
            Constraint::FixX { point, x } => self.fix_x(tag, point, x),
            Constraint::FixY { point, y } => self.fix_y(tag, point, y),
            Constraint::FixZ { point, z } => self.fix_z(tag, point, z),
            Constraint::Distance { p0, p1, distance } => self.distance(tag, p0, p1, distance),
            Constraint::Parallel { a0, a1, b0, b1 } => self.parallel(tag, a0, a1, b0, b1),
            Constraint::Perpendicular { a0, a1, b0, b1 } => {
                self.perpendicular(tag, a0, a1, b0, b1)
            }
            Constraint::OnAxis { p0, p1, axis } => self.on_axis(tag, p0, p1, axis),
            Constraint::SameDistance { a0, a1, b0, b1 } => {
                self.same_distance(tag, a0, a1, b0, b1)
            }
            Constraint::Angle {
                a0,
                a1,
                b0,
                b1,
                degrees,
            } => self.angle(tag, a0, a1, b0, b1, degrees),
        }
    }

    /// Pins the X coordinate of `point` to `x`.
    pub fn fix_x(&mut self, tag: ConstraintTag, point: PointId, x: f64) {
        let [px, _, _] = self.params_of(point);
        let desc = Constraint::FixX { point, x }.describe();
        self.push_equation(tag, desc, Exp::sub(Exp::var(px), Exp::val(x)));
    }

    /// Pins the Y coordinate of `point` to `y`.
    pub fn fix_y(&mut self, tag: ConstraintTag, point: PointId, y: f64) {
        let [_, py, _] = self.params_of(point);
        let desc = Constraint::FixY { point, y }.describe();
        self.push_equation(tag, desc, Exp::sub(Exp::var(py), Exp::val(y)));
    }

    /// Pins the Z coordinate of `point` to `z`.
    pub fn fix_z(&mut self, tag: ConstraintTag, point: PointId, z: f64) {
        let [_, _, pz] = self.params_of(point);
        let desc = Constraint::FixZ { point, z }.describe();
        self.push_equation(tag, desc, Exp::sub(Exp::var(pz), Exp::val(z)));
    }

    /// Pins X and Y of `point` under one tag.
    pub fn fix_xy(&mut self, tag: ConstraintTag, point: PointId, x: f64, y: f64) {
        self.fix_x(tag, point, x);
        self.fix_y(tag, point, y);
    }

    /// Pins X and Z of `point` under one tag.
    pub fn fix_xz(&mut self, tag: ConstraintTag, point: PointId, x: f64, z: f64) {
        self.fix_x(tag, point, x);
        self.fix_z(tag, point, z);
    }

    /// Pins Y and Z of `point` under one tag.
    pub fn fix_yz(&mut self, tag: ConstraintTag, point: PointId, y: f64, z: f64) {
        self.fix_y(tag, point, y);
        self.fix_z(tag, point, z);
    }

    /// Pins all three coordinates of `point` under one tag.
    pub fn fix_xyz(&mut self, tag: ConstraintTag, point: PointId, position: (f64, f64, f64)) {
        self.fix_x(tag, point, position.0);
        self.fix_y(tag, point, position.1);
        self.fix_z(tag, point, position.2);
    }

    /// Requires `distance` between `p0` and `p1`.
    pub fn distance(&mut self, tag: ConstraintTag, p0: PointId, p1: PointId, distance: f64) {
        let desc = Constraint::Distance { p0, p1, distance }.describe();
        let length = self.edge_length(p0, p1);
        self.push_equation(tag, desc, Exp::sub(length, Exp::val(distance)));
    }

    /// Requires the edges `a0 -> a1` and `b0 -> b1` to be parallel.
    ///
    /// Lowered as the three cross-product components, all zero for parallel
    /// vectors. The block is rank 2 at most; the least-squares step and the
    /// rank analyzer both tolerate that.
    pub fn parallel(
        &mut self,
        tag: ConstraintTag,
        a0: PointId,
        a1: PointId,
        b0: PointId,
        b1: PointId,
    ) {
        let desc = Constraint::Parallel { a0, a1, b0, b1 }.describe();
        let [ax, ay, az] = self.edge_vector(a0, a1);
        let [bx, by, bz] = self.edge_vector(b0, b1);
        let cross = [
            Exp::sub(Exp::mul(ay.clone(), bz.clone()), Exp::mul(az.clone(), by.clone())),
            Exp::sub(Exp::mul(az, bx.clone()), Exp::mul(ax.clone(), bz)),
            Exp::sub(Exp::mul(ax, by), Exp::mul(ay, bx)),
        ];
        for (component, axis) in cross.into_iter().zip([Axis::X, Axis::Y, Axis::Z]) {
            self.push_equation(tag, format!("{desc} [{axis}]"), component);
        }
    }

    /// Requires the edges `a0 -> a1` and `b0 -> b1` to be perpendicular.
    pub fn perpendicular(
        &mut self,
        tag: ConstraintTag,
        a0: PointId,
        a1: PointId,
        b0: PointId,
        b1: PointId,
    ) {
        let desc = Constraint::Perpendicular { a0, a1, b0, b1 }.describe();
        let dot = self.edge_dot(a0, a1, b0, b1);
        self.push_equation(tag, desc, dot);
    }

    /// Requires the edge `p0 -> p1` to be aligned with `axis`.
    ///
    /// Expressed by equating the two non-aligned coordinate pairs of the
    /// endpoints, which the substitution reducer eliminates outright.
    pub fn on_axis(&mut self, tag: ConstraintTag, p0: PointId, p1: PointId, axis: Axis) {
        let desc = Constraint::OnAxis { p0, p1, axis }.describe();
        let [x0, y0, z0] = self.params_of(p0);
        let [x1, y1, z1] = self.params_of(p1);
        let pairs = match axis {
            Axis::X => [(y0, y1), (z0, z1)],
            Axis::Y => [(x0, x1), (z0, z1)],
            Axis::Z => [(x0, x1), (y0, y1)],
        };
        for (a, b) in pairs {
            self.push_equation(tag, desc.clone(), Exp::sub(Exp::var(a), Exp::var(b)));
        }
    }

    /// Requires the edges `a0 -> a1` and `b0 -> b1` to have equal length.
    pub fn same_distance(
        &mut self,
        tag: ConstraintTag,
        a0: PointId,
        a1: PointId,
        b0: PointId,
        b1: PointId,
    ) {
        let desc = Constraint::SameDistance { a0, a1, b0, b1 }.describe();
        let len_a = self.edge_length(a0, a1);
        let len_b = self.edge_length(b0, b1);
        self.push_equation(tag, desc, Exp::sub(len_a, len_b));
    }

    /// Requires an angle of `degrees` between the edges `a0 -> a1` and
    /// `b0 -> b1`, via `dot(A, B) / (|A| * |B|) - cos(degrees)`.
    pub fn angle(
        &mut self,
        tag: ConstraintTag,
        a0: PointId,
        a1: PointId,
        b0: PointId,
        b1: PointId,
        degrees: f64,
    ) {
        let desc = Constraint::Angle {
            a0,
            a1,
            b0,
            b1,
            degrees,
        }
        .describe();
        let dot = self.edge_dot(a0, a1, b0, b1);
        let len_a = self.edge_length(a0, a1);
        let len_b = self.edge_length(b0, b1);
        let cosine = Exp::div(dot, Exp::mul(len_a, len_b));
        self.push_equation(
            tag,
            desc,
            Exp::sub(cosine, Exp::val(degrees.to_radians().cos())),
        );
    }

    // Component expressions of the vector p0 -> p1.
    fn edge_vector(&self, p0: PointId, p1: PointId) -> [Exp; 3] {
        let a = self.params_of(p0);
        let b = self.params_of(p1);
        [
            Exp::sub(Exp::var(b[0]), Exp::var(a[0])),
            Exp::sub(Exp::var(b[1]), Exp::var(a[1])),
            Exp::sub(Exp::var(b[2]), Exp::var(a[2])),
        ]
    }

    fn edge_length(&self, p0: PointId, p1: PointId) -> Exp {
        let [dx, dy, dz] = self.edge_vector(p0, p1);
        Exp::sqrt(Exp::add(
            Exp::add(Exp::sqr(dx), Exp::sqr(dy)),
            Exp::sqr(dz),
        ))
    }

    fn edge_dot(&self, a0: PointId, a1: PointId, b0: PointId, b1: PointId) -> Exp {
        let [ax, ay, az] = self.edge_vector(a0, a1);
        let [bx, by, bz] = self.edge_vector(b0, b1);
        Exp::add(
            Exp::add(Exp::mul(ax, bx), Exp::mul(ay, by)),
            Exp::mul(az, bz),
        )
    }
}
