// SPDX-License-Identifier: MIT
//
// Copyright (c) 2025 Alexandre Severino
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in
// all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.

use approx::assert_relative_eq;
use geokern::{
    CdtInput, CdtOutputType, CdtResult, FillRule, delaunay_2d_calc, delaunay_2d_calc_with_fill_rule,
    geometry::point::Point2, numeric::scalar::Scalar,
};
use rand::{Rng, SeedableRng, rngs::StdRng};
use rug::Rational;

fn rational_input(verts: &[(i32, i32)]) -> CdtInput<Rational> {
    CdtInput {
        vert: verts.iter().map(|&(x, y)| Point2::from_ints([x, y])).collect(),
        ..CdtInput::default()
    }
}

fn has_edge<T: Scalar>(out: &CdtResult<T>, a: usize, b: usize) -> Option<usize> {
    out.edge
        .iter()
        .position(|&(u, v)| (u, v) == (a, b) || (u, v) == (b, a))
}

fn face_area<T: Scalar>(out: &CdtResult<T>, face: &[usize]) -> f64 {
    let n = face.len();
    let mut twice = 0.0;
    for i in 0..n {
        let p = out.vert[face[i]].to_f64();
        let q = out.vert[face[(i + 1) % n]].to_f64();
        twice += p[0] * q[1] - q[0] * p[1];
    }
    twice / 2.0
}

fn total_area<T: Scalar>(out: &CdtResult<T>) -> f64 {
    out.face.iter().map(|f| face_area(out, f)).sum()
}

#[test]
fn test_square_full() {
    let input = rational_input(&[(0, 0), (1, 0), (1, 1), (0, 1)]);
    let out = delaunay_2d_calc(&input, CdtOutputType::Full);
    assert_eq!(out.vert.len(), 4);
    assert_eq!(out.edge.len(), 5);
    assert_eq!(out.face.len(), 2);
    for f in &out.face {
        assert!(face_area(&out, f) > 0.0, "faces come out counter-clockwise");
    }
    assert_relative_eq!(total_area(&out), 1.0);
}

#[test]
fn test_duplicate_points() {
    let input = rational_input(&[(0, 0), (2, 0), (0, 0), (1, 2), (2, 0)]);
    let out = delaunay_2d_calc(&input, CdtOutputType::Full);
    assert_eq!(out.vert.len(), 3);
    assert_eq!(out.face.len(), 1);
    let mut origs: Vec<Vec<usize>> = out.vert_orig.clone();
    origs.sort();
    assert_eq!(origs, vec![vec![0, 2], vec![1, 4], vec![3]]);
}

#[test]
fn test_edge_constraint_forces_flip() {
    // Delaunay alone would connect 2-3.
    let mut input = rational_input(&[(0, 0), (4, 0), (2, 1), (2, -1)]);
    input.edge = vec![(0, 1)];
    let out = delaunay_2d_calc(&input, CdtOutputType::Full);
    let e = has_edge(&out, 0, 1).expect("constrained edge present");
    assert_eq!(out.edge_orig[e], vec![0]);
    assert!(has_edge(&out, 2, 3).is_none());
    assert_eq!(out.face.len(), 2);
}

#[test]
fn test_edge_constraint_through_vertex() {
    let mut input = rational_input(&[(0, 0), (1, 0), (2, 0), (1, 1)]);
    input.edge = vec![(0, 2)];
    let out = delaunay_2d_calc(&input, CdtOutputType::Constraints);
    assert_eq!(out.edge.len(), 2);
    for (a, b) in [(0, 1), (1, 2)] {
        let e = has_edge(&out, a, b).expect("split constraint");
        assert_eq!(out.edge_orig[e], vec![0]);
    }
}

#[test]
fn test_crossing_constraints_add_vertex() {
    let mut input = rational_input(&[(0, 0), (2, 2), (0, 2), (2, 0)]);
    input.edge = vec![(0, 1), (2, 3)];
    let out = delaunay_2d_calc(&input, CdtOutputType::Constraints);
    assert_eq!(out.vert.len(), 5);
    let center = out
        .vert
        .iter()
        .position(|p| p.to_f64() == [1.0, 1.0])
        .expect("intersection vertex");
    assert!(out.vert_orig[center].is_empty());
    assert_eq!(out.edge.len(), 4);
}

#[test]
fn test_output_types() {
    let mut input = rational_input(&[(0, 0), (4, 0), (4, 4), (0, 4), (8, 2)]);
    input.face = vec![vec![0, 1, 2, 3]];

    let full = delaunay_2d_calc(&input, CdtOutputType::Full);
    assert_eq!(full.face.len(), 3);
    assert_relative_eq!(total_area(&full), 24.0);

    let inside = delaunay_2d_calc(&input, CdtOutputType::Inside);
    assert_eq!(inside.face.len(), 2);
    assert_relative_eq!(total_area(&inside), 16.0);
    assert!(inside.face_orig.iter().all(|ids| ids == &vec![0]));

    let constraints = delaunay_2d_calc(&input, CdtOutputType::Constraints);
    assert_eq!(constraints.edge.len(), 4);
    assert_eq!(constraints.face.len(), 1);
    assert_eq!(constraints.face[0].len(), 4);
    // The point outside the face survives without any edges.
    assert_eq!(constraints.vert.len(), 5);
}

#[test]
fn test_overlapping_faces_fill_rules() {
    let mut input = rational_input(&[(0, 0), (2, 0), (2, 2), (0, 2), (1, 1), (3, 1), (3, 3), (1, 3)]);
    input.face = vec![vec![0, 1, 2, 3], vec![4, 5, 6, 7]];

    let even_odd =
        delaunay_2d_calc_with_fill_rule(&input, CdtOutputType::InsideWithHoles, FillRule::EvenOdd);
    assert_relative_eq!(total_area(&even_odd), 6.0);

    let non_zero =
        delaunay_2d_calc_with_fill_rule(&input, CdtOutputType::InsideWithHoles, FillRule::NonZero);
    assert_relative_eq!(total_area(&non_zero), 7.0);

    let inside = delaunay_2d_calc(&input, CdtOutputType::Inside);
    assert_relative_eq!(total_area(&inside), 7.0);
    // Faces in the overlap carry both input faces.
    assert!(inside.face_orig.iter().any(|ids| ids.len() == 2));
}

#[test]
fn test_random_points_make_a_triangulation() {
    let mut rng = StdRng::seed_from_u64(42);
    let pts: Vec<Point2<f64>> = (0..60)
        .map(|_| Point2::new([rng.random_range(0.0..100.0), rng.random_range(0.0..100.0)]))
        .collect();
    let input = CdtInput {
        vert: pts,
        ..CdtInput::default()
    };
    let out = delaunay_2d_calc(&input, CdtOutputType::Full);
    assert_eq!(out.vert.len(), 60);
    assert!(out.face.iter().all(|f| f.len() == 3));
    // Euler for a triangulated disk.
    assert_eq!(out.vert.len() + out.face.len(), out.edge.len() + 1);

    let again = delaunay_2d_calc(&input, CdtOutputType::Full);
    assert_eq!(out.edge, again.edge);
    assert_eq!(out.face, again.face);
}

#[test]
fn test_ids_not_requested() {
    let mut input = rational_input(&[(0, 0), (1, 0), (0, 1)]);
    input.need_ids = false;
    let out = delaunay_2d_calc(&input, CdtOutputType::Full);
    assert_eq!(out.face.len(), 1);
    assert!(out.vert_orig.is_empty());
    assert!(out.edge_orig.is_empty());
    assert!(out.face_orig.is_empty());
}

/// A square with a triangle inside it sharing the square's corner 0.
fn square_with_corner_triangle() -> CdtInput<Rational> {
    let mut input = rational_input(&[(0, 0), (4, 0), (4, 4), (0, 4), (2, 1), (1, 2)]);
    input.face = vec![vec![0, 1, 2, 3], vec![0, 4, 5]];
    input
}

fn repeats_a_vertex(face: &[usize]) -> bool {
    let mut sorted = face.to_vec();
    sorted.sort();
    sorted.windows(2).any(|w| w[0] == w[1])
}

#[test]
fn test_valid_bmesh_keeps_faces_simple() {
    let input = square_with_corner_triangle();

    // Plain constraint output merges the region between the two into one
    // face that passes through corner 0 twice.
    let constraints = delaunay_2d_calc(&input, CdtOutputType::Constraints);
    assert_eq!(constraints.edge.len(), 7);
    assert_eq!(constraints.face.len(), 2);
    assert!(constraints.face.iter().any(|f| repeats_a_vertex(f)));

    let valid = delaunay_2d_calc(&input, CdtOutputType::ConstraintsValidBmesh);
    assert!(valid.face.len() > 2);
    assert!(valid.edge_orig.iter().any(|ids| ids.is_empty()), "a triangulation edge is kept");
    for f in &valid.face {
        assert!(!repeats_a_vertex(f), "face {f:?}");
        assert!(face_area(&valid, f) > 0.0);
    }
    assert_relative_eq!(total_area(&valid), 16.0);
}

#[test]
fn test_valid_bmesh_with_holes() {
    let input = square_with_corner_triangle();
    let out = delaunay_2d_calc(&input, CdtOutputType::ConstraintsValidBmeshWithHoles);
    // The triangle is covered twice, so even-odd makes it a hole.
    assert_relative_eq!(total_area(&out), 14.5);
    assert!(out.face.len() >= 2);
    for (f, ids) in out.face.iter().zip(&out.face_orig) {
        assert!(!repeats_a_vertex(f), "face {f:?}");
        assert_eq!(ids, &vec![0]);
    }
    assert!(out.edge_orig.iter().any(|ids| ids.is_empty()));
}

#[test]
fn test_epsilon_snaps_crossing_to_vertex() {
    // Vertex 2 sits just above the constraint 0-1, which would cross the
    // edge 2-3 at (2, 0).
    let input = |epsilon: f64| CdtInput {
        vert: vec![
            Point2::new([0.0, 0.0]),
            Point2::new([4.0, 0.0]),
            Point2::new([2.0, 1e-3]),
            Point2::new([2.0, -2.0]),
        ],
        edge: vec![(0, 1)],
        epsilon,
        ..CdtInput::default()
    };

    let exact = delaunay_2d_calc(&input(0.0), CdtOutputType::Constraints);
    assert_eq!(exact.vert.len(), 5);
    let added = exact
        .vert_orig
        .iter()
        .position(|ids| ids.is_empty())
        .expect("crossing vertex");
    let co = exact.vert[added].to_f64();
    assert_relative_eq!(co[0], 2.0, epsilon = 1e-9);
    assert_relative_eq!(co[1], 0.0, epsilon = 1e-9);

    let snapped = delaunay_2d_calc(&input(1e-2), CdtOutputType::Constraints);
    assert_eq!(snapped.vert.len(), 4);
    assert_eq!(snapped.edge.len(), 2);
    for (a, b) in [(0, 2), (2, 1)] {
        let e = has_edge(&snapped, a, b).expect("constraint routed through vertex 2");
        assert_eq!(snapped.edge_orig[e], vec![0]);
    }
}
