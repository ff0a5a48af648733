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

use geokern::{
    BoolOpType, BooleanOptions, PolyMesh, PresplitSoup, boolean_mesh,
    geometry::point::Point3,
    mesh_processing::{polymesh_from_trimesh_with_dissolve, triangulate_polymesh},
};
use rug::Rational;

/// Quads of an axis-aligned cube, counter-clockwise seen from outside.
const CUBE_QUADS: [[usize; 4]; 6] = [
    [0, 3, 2, 1],
    [4, 5, 6, 7],
    [0, 1, 5, 4],
    [1, 2, 6, 5],
    [2, 3, 7, 6],
    [3, 0, 4, 7],
];

fn two_quad_cubes(a: ([i32; 3], i32), b: ([i32; 3], i32)) -> PolyMesh<Rational> {
    let corners = [[0, 0, 0], [1, 0, 0], [1, 1, 0], [0, 1, 0], [0, 0, 1], [1, 0, 1], [1, 1, 1], [0, 1, 1]];
    let mut pts = Vec::new();
    let mut faces = Vec::new();
    for (min, size) in [a, b] {
        let off = pts.len();
        pts.extend(
            corners
                .iter()
                .map(|c| Point3::from_ints([min[0] + c[0] * size, min[1] + c[1] * size, min[2] + c[2] * size])),
        );
        faces.extend(CUBE_QUADS.iter().map(|q| q.iter().map(|&v| v + off).collect::<Vec<_>>()));
    }
    PolyMesh::from_faces(pts, faces)
}

fn shape_of(face: usize) -> usize {
    usize::from(face >= 6)
}

fn run(pm: &PolyMesh<Rational>, op: BoolOpType) -> PolyMesh<Rational> {
    let options = BooleanOptions {
        op,
        ..BooleanOptions::default()
    };
    boolean_mesh(pm, &options, 2, shape_of, &PresplitSoup)
}

#[test]
fn test_triangulate_then_dissolve_restores_quads() {
    let pm = two_quad_cubes(([0, 0, 0], 1), ([3, 0, 0], 1));
    let tm = triangulate_polymesh(&pm);
    assert_eq!(tm.tris.len(), 24);
    let back = polymesh_from_trimesh_with_dissolve(&tm, &pm);
    assert_eq!(back.faces.len(), 12);
    for (f, face) in back.faces.iter().enumerate() {
        assert_eq!(face.orig, f);
        assert!(face.cyclic_equal(&pm.faces[f].verts));
    }
}

#[test]
fn test_union_of_disjoint_cubes_keeps_quads() {
    let pm = two_quad_cubes(([0, 0, 0], 1), ([3, 0, 0], 1));
    let out = run(&pm, BoolOpType::Union);
    assert_eq!(out.faces.len(), 12);
    assert_eq!(out.verts.len(), 16);
    assert!(out.faces.iter().all(|f| f.len() == 4));
    let mut origs: Vec<usize> = out.faces.iter().map(|f| f.orig).collect();
    origs.sort();
    assert_eq!(origs, (0..12).collect::<Vec<_>>());
}

#[test]
fn test_hollow_cube_from_difference() {
    let pm = two_quad_cubes(([0, 0, 0], 4), ([1, 1, 1], 2));
    let out = run(&pm, BoolOpType::Difference);
    assert_eq!(out.faces.len(), 12);
    assert!(out.faces.iter().all(|f| f.len() == 4));
    assert_eq!(out.verts.len(), 16);
    // Inner faces now wind the other way round.
    for face in out.faces.iter().filter(|f| f.orig >= 6) {
        let input_verts: Vec<usize> = pm.faces[face.orig]
            .verts
            .iter()
            .rev()
            .map(|&v| {
                out.verts
                    .iter()
                    .position(|ov| ov.orig == Some(v))
                    .expect("input vertex survives")
            })
            .collect();
        assert!(face.cyclic_equal(&input_verts));
    }
}

#[test]
fn test_intersection_of_disjoint_cubes_is_empty() {
    let pm = two_quad_cubes(([0, 0, 0], 1), ([3, 0, 0], 1));
    let out = run(&pm, BoolOpType::Intersect);
    assert!(out.faces.is_empty());
    assert!(out.verts.is_empty());
}
