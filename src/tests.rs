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

//! Crate unit tests.

use super::*;
use approx::assert_abs_diff_eq;
use rs_math3d::Vec3d;

fn distance_between(a: Vec3d, b: Vec3d) -> f64 {
    ((a.x - b.x).powi(2) + (a.y - b.y).powi(2) + (a.z - b.z).powi(2)).sqrt()
}

fn cross(a: Vec3d, b: Vec3d) -> (f64, f64, f64) {
    (
        a.y * b.z - a.z * b.y,
        a.z * b.x - a.x * b.z,
        a.x * b.y - a.y * b.x,
    )
}

fn edge(solution: &Solution, from: PointId, to: PointId) -> Vec3d {
    let a = solution.point(from).expect("missing edge start");
    let b = solution.point(to).expect("missing edge end");
    Vec3d::new(b.x - a.x, b.y - a.y, b.z - a.z)
}

#[test]
fn solves_single_distance_symmetrically() {
    let mut solver = Solver::new();
    solver.add_point(1, Vec3d::new(10.0, 10.0, 10.0));
    solver.add_point(2, Vec3d::new(20.0, 20.0, 20.0));
    solver.distance(42, 1, 2, 30.0);

    let solution = solver.solve().expect("solve should succeed");
    assert_eq!(solution.points().len(), 2);

    let p0 = solution.point(1).expect("missing point 1");
    let p1 = solution.point(2).expect("missing point 2");
    assert_abs_diff_eq!(distance_between(p0, p1), 30.0, epsilon = 1e-6);

    // The minimum-norm step moves both endpoints symmetrically around the
    // original midpoint.
    for value in [p0.x, p0.y, p0.z] {
        assert_abs_diff_eq!(value, 6.33974596215561, epsilon = 1e-6);
    }
    for value in [p1.x, p1.y, p1.z] {
        assert_abs_diff_eq!(value, 23.6602540378444, epsilon = 1e-6);
    }

    // Six parameters, one independent equation.
    assert!(solution.rank_ok);
    assert_eq!(solution.dof, Some(5));
    assert!(solution.iterations > 0);
}

#[test]
fn solves_distance_with_partial_fixes() {
    let mut solver = Solver::new();
    solver.add_point(1, Vec3d::new(10.0, 10.0, 10.0));
    solver.add_point(2, Vec3d::new(20.0, 20.0, 20.0));
    solver.distance(42, 1, 2, 30.0);
    solver.fix_x(43, 1, 10.0);
    solver.fix_z(44, 2, 20.0);

    let solution = solver.solve().expect("solve should succeed");
    let p0 = solution.point(1).expect("missing point 1");
    let p1 = solution.point(2).expect("missing point 2");

    // Fixed coordinates are substituted, not iterated: exact reproduction.
    assert_eq!(p0.x, 10.0);
    assert_eq!(p1.z, 20.0);
    assert_abs_diff_eq!(distance_between(p0, p1), 30.0, epsilon = 1e-6);
}

#[test]
fn conflicting_distances_fail_with_singular_matrix() {
    let mut solver = Solver::new();
    solver.add_point(1, Vec3d::new(10.0, 10.0, 10.0));
    solver.add_point(2, Vec3d::new(20.0, 20.0, 20.0));
    solver.distance(42, 1, 2, 30.0);
    solver.distance(43, 1, 2, 20.0);

    let report = solver.solve().expect_err("solve should fail");
    assert_eq!(report.kind, FailureKind::SingularMatrix);
    assert_eq!(
        report.tags.iter().copied().collect::<Vec<_>>(),
        vec![42, 43]
    );
    assert!(report.error > 0.0);
}

#[test]
fn fully_fixed_conflicting_distance_cannot_move() {
    let mut solver = Solver::new();
    solver.add_point(1, Vec3d::new(10.0, 10.0, 10.0));
    solver.add_point(2, Vec3d::new(20.0, 20.0, 20.0));
    solver.fix_xyz(1, 1, (10.0, 10.0, 10.0));
    solver.fix_xyz(2, 2, (20.0, 20.0, 20.0));
    solver.distance(3, 1, 2, 30.0);

    // Substitution pins every parameter; the distance residual is a constant
    // that no amount of iteration can change.
    let report = solver.solve().expect_err("solve should fail");
    assert_eq!(report.kind, FailureKind::NotConvergent);
    assert_eq!(report.iterations, 0);
    assert_eq!(report.tags.iter().copied().collect::<Vec<_>>(), vec![3]);
    assert_eq!(report.parameter_count, 0);
}

#[test]
fn satisfied_fixed_distance_succeeds_trivially() {
    let mut solver = Solver::new();
    solver.add_point(1, Vec3d::new(0.0, 0.0, 0.0));
    solver.add_point(2, Vec3d::new(30.0, 0.0, 0.0));
    solver.fix_xyz(1, 1, (0.0, 0.0, 0.0));
    solver.fix_xyz(2, 2, (30.0, 0.0, 0.0));
    solver.distance(3, 1, 2, 30.0);

    let solution = solver.solve().expect("solve should succeed");
    assert_eq!(solution.iterations, 0);
    let p1 = solution.point(2).expect("missing point 2");
    assert_eq!((p1.x, p1.y, p1.z), (30.0, 0.0, 0.0));
}

#[test]
fn substitution_only_system_needs_no_iteration() {
    let mut solver = Solver::new();
    solver.add_point(1, Vec3d::new(5.0, 6.0, 7.0));
    solver.add_point(2, Vec3d::new(8.0, 9.0, 1.0));
    solver.fix_xyz(1, 1, (1.0, 2.0, 3.0));
    solver.on_axis(2, 1, 2, Axis::X);

    let solution = solver.solve().expect("solve should succeed");
    assert_eq!(solution.iterations, 0);

    // Fixed and substituted values come back exactly, not within tolerance.
    let p0 = solution.point(1).expect("missing point 1");
    assert_eq!((p0.x, p0.y, p0.z), (1.0, 2.0, 3.0));
    let p1 = solution.point(2).expect("missing point 2");
    assert_eq!((p1.y, p1.z), (2.0, 3.0));
    // X of the second point was never constrained.
    assert_eq!(p1.x, 8.0);
    assert_eq!(solution.dof, Some(1));
}

#[test]
fn chained_substitutions_resolve() {
    // p2.x follows p1.x which follows a constant: a = b, b = 5.
    let mut solver = Solver::new();
    solver.add_point(1, Vec3d::new(0.5, 0.0, 0.0));
    solver.add_point(2, Vec3d::new(0.25, 0.0, 0.0));
    solver.on_axis(1, 2, 1, Axis::Z);
    solver.fix_xy(2, 1, 5.0, 0.0);

    let solution = solver.solve().expect("solve should succeed");
    let p1 = solution.point(1).expect("missing point 1");
    let p2 = solution.point(2).expect("missing point 2");
    assert_eq!(p1.x, 5.0);
    assert_eq!(p2.x, 5.0);
    assert_eq!(p2.y, 0.0);
}

#[test]
fn parallel_with_three_points_fixed() {
    let mut solver = Solver::new();
    solver.add_point(0, Vec3d::new(0.0, 0.0, 0.0));
    solver.add_point(1, Vec3d::new(1.0, 0.0, 0.0));
    solver.add_point(2, Vec3d::new(0.0, 1.0, 0.0));
    solver.add_point(3, Vec3d::new(0.8, 1.3, 0.4));
    solver.fix_xyz(0, 0, (0.0, 0.0, 0.0));
    solver.fix_xyz(1, 1, (1.0, 0.0, 0.0));
    solver.fix_xyz(2, 2, (0.0, 1.0, 0.0));
    solver.parallel(4, 0, 1, 2, 3);

    let solution = solver.solve().expect("solve should succeed");
    let a = edge(&solution, 0, 1);
    let b = edge(&solution, 2, 3);
    let (cx, cy, cz) = cross(a, b);
    assert_abs_diff_eq!(cx, 0.0, epsilon = 1e-6);
    assert_abs_diff_eq!(cy, 0.0, epsilon = 1e-6);
    assert_abs_diff_eq!(cz, 0.0, epsilon = 1e-6);
}

#[test]
fn free_parallel_is_rank_deficient_but_solves() {
    // No fixes at all: the three cross-product equations stay live and drop
    // to rank 2 as the edges become parallel, which the least-squares step
    // must tolerate. Tolerances are loosened so the normal matrix stays away
    // from the pivot cutoff near the solution.
    let config = SolverConfig {
        convergence_tolerance: 1e-6,
        rank_tolerance: 1e-3,
        ..SolverConfig::default()
    };
    let mut solver = Solver::with_config(config);
    solver.add_point(0, Vec3d::new(0.0, 0.0, 0.0));
    solver.add_point(1, Vec3d::new(1.0, 0.2, 0.0));
    solver.add_point(2, Vec3d::new(0.0, 1.0, 0.1));
    solver.add_point(3, Vec3d::new(1.0, 1.4, 0.0));
    solver.parallel(7, 0, 1, 2, 3);

    let solution = solver.solve().expect("solve should succeed");
    let (cx, cy, cz) = cross(edge(&solution, 0, 1), edge(&solution, 2, 3));
    assert_abs_diff_eq!(cx, 0.0, epsilon = 1e-5);
    assert_abs_diff_eq!(cy, 0.0, epsilon = 1e-5);
    assert_abs_diff_eq!(cz, 0.0, epsilon = 1e-5);
    assert!(!solution.rank_ok);
    assert_eq!(solution.dof, None);
}

#[test]
fn perpendicular_is_direction_only() {
    let run = |swap_edge_a: bool| {
        let mut solver = Solver::new();
        solver.add_point(0, Vec3d::new(0.0, 0.0, 0.0));
        solver.add_point(1, Vec3d::new(1.0, 0.0, 0.0));
        solver.add_point(2, Vec3d::new(0.0, 0.0, 0.0));
        solver.add_point(3, Vec3d::new(0.4, 1.0, 0.0));
        solver.fix_xyz(0, 0, (0.0, 0.0, 0.0));
        solver.fix_xyz(1, 1, (1.0, 0.0, 0.0));
        solver.fix_xyz(2, 2, (0.0, 0.0, 0.0));
        if swap_edge_a {
            solver.perpendicular(9, 1, 0, 2, 3);
        } else {
            solver.perpendicular(9, 0, 1, 2, 3);
        }
        solver.solve().expect("solve should succeed")
    };

    for swapped in [false, true] {
        let solution = run(swapped);
        let a = edge(&solution, 0, 1);
        let b = edge(&solution, 2, 3);
        let dot = a.x * b.x + a.y * b.y + a.z * b.z;
        assert_abs_diff_eq!(dot, 0.0, epsilon = 1e-6);
    }
}

#[test]
fn angle_of_ninety_degrees_agrees_with_perpendicular() {
    let mut solver = Solver::new();
    solver.add_point(0, Vec3d::new(0.0, 0.0, 0.0));
    solver.add_point(1, Vec3d::new(1.0, 0.0, 0.0));
    solver.add_point(2, Vec3d::new(0.0, 0.0, 0.0));
    solver.add_point(3, Vec3d::new(0.4, 1.0, 0.0));
    solver.fix_xyz(0, 0, (0.0, 0.0, 0.0));
    solver.fix_xyz(1, 1, (1.0, 0.0, 0.0));
    solver.fix_xyz(2, 2, (0.0, 0.0, 0.0));
    solver.angle(9, 0, 1, 2, 3, 90.0);

    let solution = solver.solve().expect("solve should succeed");
    let a = edge(&solution, 0, 1);
    let b = edge(&solution, 2, 3);
    let dot = a.x * b.x + a.y * b.y + a.z * b.z;
    assert_abs_diff_eq!(dot, 0.0, epsilon = 1e-6);
}

#[test]
fn angle_of_sixty_degrees_converges() {
    let mut solver = Solver::new();
    solver.add_point(0, Vec3d::new(0.0, 0.0, 0.0));
    solver.add_point(1, Vec3d::new(1.0, 0.0, 0.0));
    solver.add_point(2, Vec3d::new(0.0, 0.0, 0.0));
    solver.add_point(3, Vec3d::new(0.9, 0.7, 0.0));
    solver.fix_xyz(0, 0, (0.0, 0.0, 0.0));
    solver.fix_xyz(1, 1, (1.0, 0.0, 0.0));
    solver.fix_xyz(2, 2, (0.0, 0.0, 0.0));
    solver.angle(9, 0, 1, 2, 3, 60.0);

    let solution = solver.solve().expect("solve should succeed");
    let a = edge(&solution, 0, 1);
    let b = edge(&solution, 2, 3);
    let dot = a.x * b.x + a.y * b.y + a.z * b.z;
    let len_a = (a.x * a.x + a.y * a.y + a.z * a.z).sqrt();
    let len_b = (b.x * b.x + b.y * b.y + b.z * b.z).sqrt();
    assert_abs_diff_eq!(dot / (len_a * len_b), 0.5, epsilon = 1e-6);
}

#[test]
fn same_distance_equalizes_edge_lengths() {
    let mut solver = Solver::new();
    solver.add_point(0, Vec3d::new(0.0, 0.0, 0.0));
    solver.add_point(1, Vec3d::new(2.0, 0.0, 0.0));
    solver.add_point(2, Vec3d::new(5.0, 0.0, 0.0));
    solver.add_point(3, Vec3d::new(6.0, 0.0, 0.0));
    solver.fix_xyz(0, 0, (0.0, 0.0, 0.0));
    solver.fix_xyz(1, 1, (2.0, 0.0, 0.0));
    solver.fix_xyz(2, 2, (5.0, 0.0, 0.0));
    solver.same_distance(5, 0, 1, 2, 3);

    let solution = solver.solve().expect("solve should succeed");
    let p2 = solution.point(2).expect("missing point 2");
    let p3 = solution.point(3).expect("missing point 3");
    assert_abs_diff_eq!(distance_between(p2, p3), 2.0, epsilon = 1e-6);
}

#[test]
fn coincident_points_in_angle_do_not_crash() {
    // A zero-length edge makes the cosine expression divide by zero; the
    // reasonable-value screen turns that into a failure, not a panic.
    let mut solver = Solver::new();
    solver.add_point(0, Vec3d::new(1.0, 1.0, 1.0));
    solver.add_point(1, Vec3d::new(1.0, 1.0, 1.0));
    solver.add_point(2, Vec3d::new(0.0, 0.0, 0.0));
    solver.add_point(3, Vec3d::new(1.0, 0.0, 0.0));
    solver.angle(11, 0, 1, 2, 3, 45.0);

    let report = solver.solve().expect_err("solve should fail");
    assert_eq!(report.kind, FailureKind::NotConvergent);
    assert!(report.tags.contains(&11));
}

#[test]
fn iteration_cap_is_reported_with_implicated_tags() {
    let config = SolverConfig {
        max_iterations: 0,
        ..SolverConfig::default()
    };
    let mut solver = Solver::with_config(config);
    solver.add_point(1, Vec3d::new(10.0, 10.0, 10.0));
    solver.add_point(2, Vec3d::new(20.0, 20.0, 20.0));
    solver.distance(42, 1, 2, 30.0);

    let report = solver.solve().expect_err("solve should fail");
    assert_eq!(report.kind, FailureKind::IterationLimit);
    assert_eq!(report.tags.iter().copied().collect::<Vec<_>>(), vec![42]);
}

#[test]
fn failure_issues_are_ranked_by_residual_magnitude() {
    let mut solver = Solver::new();
    solver.add_point(1, Vec3d::new(10.0, 10.0, 10.0));
    solver.add_point(2, Vec3d::new(20.0, 20.0, 20.0));
    solver.distance(42, 1, 2, 30.0);
    solver.distance(43, 1, 2, 100.0);

    let report = solver.solve().expect_err("solve should fail");
    assert!(!report.issues.is_empty());
    for pair in report.issues.windows(2) {
        assert!(pair[0].magnitude >= pair[1].magnitude);
    }
    // The 100-unit target is further from the seed geometry.
    assert_eq!(report.issues[0].tag, 43);
    assert!(report.issues[0].description.contains("distance"));
}

#[test]
fn add_constraint_matches_direct_methods() {
    let mut direct = Solver::new();
    direct.add_point(1, Vec3d::new(0.0, 0.0, 0.0));
    direct.add_point(2, Vec3d::new(3.0, 4.0, 0.0));
    direct.distance(7, 1, 2, 10.0);

    let mut declared = Solver::new();
    declared.add_point(1, Vec3d::new(0.0, 0.0, 0.0));
    declared.add_point(2, Vec3d::new(3.0, 4.0, 0.0));
    declared.add_constraint(
        7,
        Constraint::Distance {
            p0: 1,
            p1: 2,
            distance: 10.0,
        },
    );

    let a = direct.solve().expect("direct solve");
    let b = declared.solve().expect("declared solve");
    for (pa, pb) in a.points().iter().zip(b.points()) {
        assert_abs_diff_eq!(pa.position.x, pb.position.x, epsilon = 1e-12);
        assert_abs_diff_eq!(pa.position.y, pb.position.y, epsilon = 1e-12);
        assert_abs_diff_eq!(pa.position.z, pb.position.z, epsilon = 1e-12);
    }
}

#[test]
fn unconstrained_points_pass_through_unchanged() {
    let solver = Solver::with_points([
        (4, Vec3d::new(1.0, 2.0, 3.0)),
        (9, Vec3d::new(-1.0, 0.5, 0.0)),
    ]);
    let solution = solver.solve().expect("solve should succeed");
    assert_eq!(solution.iterations, 0);
    let a = solution.point(4).expect("missing point 4");
    assert_eq!((a.x, a.y, a.z), (1.0, 2.0, 3.0));
    let b = solution.point(9).expect("missing point 9");
    assert_eq!((b.x, b.y, b.z), (-1.0, 0.5, 0.0));
    assert!(solution.point(5).is_none());
}

#[test]
fn declaration_counts_are_exposed() {
    let mut solver = Solver::new();
    solver.add_point(0, Vec3d::new(0.0, 0.0, 0.0));
    solver.add_point(1, Vec3d::new(1.0, 0.0, 0.0));
    solver.add_point(2, Vec3d::new(0.0, 1.0, 0.0));
    solver.add_point(3, Vec3d::new(1.0, 1.0, 0.0));
    solver.parallel(1, 0, 1, 2, 3);
    solver.on_axis(2, 0, 1, Axis::Y);

    assert_eq!(solver.point_count(), 4);
    assert_eq!(solver.parameter_count(), 12);
    // Parallel lowers to three equations, on-axis to two.
    assert_eq!(solver.equation_count(), 5);
}

#[test]
#[should_panic(expected = "never registered")]
fn unregistered_point_is_a_contract_violation() {
    let mut solver = Solver::new();
    solver.add_point(1, Vec3d::new(0.0, 0.0, 0.0));
    solver.distance(42, 1, 2, 30.0);
}

#[test]
#[should_panic(expected = "already registered")]
fn duplicate_point_registration_panics() {
    let mut solver = Solver::new();
    solver.add_point(1, Vec3d::new(0.0, 0.0, 0.0));
    solver.add_point(1, Vec3d::new(1.0, 0.0, 0.0));
}

#[test]
fn failure_report_display_mentions_kind_and_residual() {
    let mut solver = Solver::new();
    solver.add_point(1, Vec3d::new(10.0, 10.0, 10.0));
    solver.add_point(2, Vec3d::new(20.0, 20.0, 20.0));
    solver.distance(42, 1, 2, 30.0);
    solver.distance(43, 1, 2, 20.0);

    let report = solver.solve().expect_err("solve should fail");
    let text = report.to_string();
    assert!(text.contains("SingularMatrix"));
    assert!(text.contains("residual"));
}
