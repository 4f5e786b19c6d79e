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

//! Constraint declarations accepted by the solver.

use std::fmt;

/// Caller-supplied point handle. Opaque to the solver.
pub type PointId = usize;

/// Caller-supplied constraint handle, used only for failure attribution.
///
/// Several equations may carry the same tag (a parallel constraint lowers to
/// three), and the solver never interprets the value.
pub type ConstraintTag = usize;

/// A global coordinate axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::X => write!(f, "x"),
            Axis::Y => write!(f, "y"),
            Axis::Z => write!(f, "z"),
        }
    }
}

/// One declarative geometric relationship between registered points.
///
/// The set of kinds is closed on purpose: the equation builder matches
/// exhaustively, so adding a kind is a compile-time-flagged decision.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// Pin a point's X coordinate to a value.
    FixX { point: PointId, x: f64 },
    /// Pin a point's Y coordinate to a value.
    FixY { point: PointId, y: f64 },
    /// Pin a point's Z coordinate to a value.
    FixZ { point: PointId, z: f64 },
    /// Require a given distance between two points.
    Distance {
        p0: PointId,
        p1: PointId,
        distance: f64,
    },
    /// Require the edge `a0 -> a1` to be parallel to the edge `b0 -> b1`.
    Parallel {
        a0: PointId,
        a1: PointId,
        b0: PointId,
        b1: PointId,
    },
    /// Require the edge `a0 -> a1` to be perpendicular to the edge `b0 -> b1`.
    Perpendicular {
        a0: PointId,
        a1: PointId,
        b0: PointId,
        b1: PointId,
    },
    /// Require the edge `p0 -> p1` to be aligned with a global axis.
    OnAxis {
        p0: PointId,
        p1: PointId,
        axis: Axis,
    },
    /// Require the edges `a0 -> a1` and `b0 -> b1` to have equal length.
    SameDistance {
        a0: PointId,
        a1: PointId,
        b0: PointId,
        b1: PointId,
    },
    /// Require a given angle, in degrees, between the two edges.
    Angle {
        a0: PointId,
        a1: PointId,
        b0: PointId,
        b1: PointId,
        degrees: f64,
    },
}

impl Constraint {
    /// Human-readable form used in failure diagnostics.
    pub fn describe(&self) -> String {
        match self {
            Constraint::FixX { point, x } => format!("fix_x(p{point}) == {x}"),
            Constraint::FixY { point, y } => format!("fix_y(p{point}) == {y}"),
            Constraint::FixZ { point, z } => format!("fix_z(p{point}) == {z}"),
            Constraint::Distance { p0, p1, distance } => {
                format!("distance(p{p0}, p{p1}) == {distance}")
            }
            Constraint::Parallel { a0, a1, b0, b1 } => {
                format!("parallel(p{a0}->p{a1}, p{b0}->p{b1})")
            }
            Constraint::Perpendicular { a0, a1, b0, b1 } => {
                format!("perpendicular(p{a0}->p{a1}, p{b0}->p{b1})")
            }
            Constraint::OnAxis { p0, p1, axis } => format!("on_axis_{axis}(p{p0}->p{p1})"),
            Constraint::SameDistance { a0, a1, b0, b1 } => {
                format!("same_distance(p{a0}->p{a1}, p{b0}->p{b1})")
            }
            Constraint::Angle {
                a0,
                a1,
                b0,
                b1,
                degrees,
            } => format!("angle(p{a0}->p{a1}, p{b0}->p{b1}) == {degrees}deg"),
        }
    }
}
