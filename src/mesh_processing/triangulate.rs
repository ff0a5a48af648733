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

//! Polygon mesh to triangle mesh.

use tracing::trace;

use crate::{
    geometry::point::{Point2, approx},
    mesh::{
        polymesh::{Face, PolyMesh},
        trimesh::{Tri, TriMesh, Vert},
    },
    numeric::scalar::Scalar,
    operations::triangulation::{CdtInput, CdtOutputType, delaunay_2d_calc},
};

/// Triangle over face positions `k`, carrying the face's edge data on the
/// edges that are polygon edges.
fn tri_from_positions(face: &Face, f: usize, k: [usize; 3]) -> Tri {
    let n = face.len();
    let mut tri = Tri::new(k.map(|i| face.verts[i]), f);
    for i in 0..3 {
        let (a, b) = (k[i], k[(i + 1) % 3]);
        let pos = if b == (a + 1) % n {
            Some(a)
        } else if a == (b + 1) % n {
            Some(b)
        } else {
            None
        };
        if let Some(pos) = pos {
            tri.edge_orig[i] = face.edge_orig[pos];
            tri.is_intersect[i] = face.is_intersect[pos];
        }
    }
    tri
}

fn newell_normal<T: Scalar>(pm: &PolyMesh<T>, face: &Face) -> [f64; 3] {
    let mut n = [0.0; 3];
    for i in 0..face.len() {
        let a = &pm.verts[face.verts[i]].co.approx;
        let b = &pm.verts[face.verts[face.next_pos(i)]].co.approx;
        n[0] += (a[1] - b[1]) * (a[2] + b[2]);
        n[1] += (a[2] - b[2]) * (a[0] + b[0]);
        n[2] += (a[0] - b[0]) * (a[1] + b[1]);
    }
    n
}

fn fan(face: &Face, f: usize) -> Vec<Tri> {
    (1..face.len() - 1)
        .map(|i| tri_from_positions(face, f, [0, i, i + 1]))
        .collect()
}

/// Split a quad along its shorter diagonal, among those giving two
/// triangles that face the same way.
fn quad_tris<T: Scalar>(pm: &PolyMesh<T>, face: &Face, f: usize) -> Option<Vec<Tri>> {
    let co = |k: usize| &pm.verts[face.verts[k]].co.approx;
    let normal = |a: usize, b: usize, c: usize| approx::cross(&approx::sub(co(b), co(a)), &approx::sub(co(c), co(a)));
    let valid = |t1: [f64; 3], t2: [f64; 3]| approx::dot(&t1, &t2) > 0.0;
    let valid02 = valid(normal(0, 1, 2), normal(0, 2, 3));
    let valid13 = valid(normal(1, 2, 3), normal(1, 3, 0));
    let d02 = approx::distance_squared(co(0), co(2));
    let d13 = approx::distance_squared(co(1), co(3));
    let split = match (valid02, valid13) {
        (true, true) if d02 <= d13 => [[0, 1, 2], [0, 2, 3]],
        (true, true) | (false, true) => [[1, 2, 3], [1, 3, 0]],
        (true, false) => [[0, 1, 2], [0, 2, 3]],
        (false, false) => return None,
    };
    Some(split.map(|k| tri_from_positions(face, f, k)).to_vec())
}

/// Constrained Delaunay triangulation of the face projected along its
/// dominant normal axis. `None` when the triangulation had to add or merge
/// vertices.
fn cdt_tris<T: Scalar>(pm: &PolyMesh<T>, face: &Face, f: usize) -> Option<Vec<Tri>> {
    let n = face.len();
    let normal = newell_normal(pm, face);
    let axis = (0..3)
        .max_by(|&a, &b| normal[a].abs().total_cmp(&normal[b].abs()))
        .unwrap_or(2);
    let (ax, ay) = ((axis + 1) % 3, (axis + 2) % 3);
    let reversed = normal[axis] < 0.0;
    let input = CdtInput {
        vert: face
            .verts
            .iter()
            .map(|&v| {
                let p = &pm.verts[v].co.exact;
                Point2::new([p[ax].clone(), p[ay].clone()])
            })
            .collect(),
        face: vec![(0..n).collect()],
        ..CdtInput::default()
    };
    let out = delaunay_2d_calc(&input, CdtOutputType::Inside);
    if out.vert.len() != n {
        return None;
    }
    let pos: Vec<usize> = out
        .vert_orig
        .iter()
        .map(|ids| ids.first().copied())
        .collect::<Option<Vec<_>>>()?;
    let tris = out
        .face
        .iter()
        .filter(|cf| cf.len() == 3)
        .map(|cf| {
            let k = [pos[cf[0]], pos[cf[1]], pos[cf[2]]];
            let k = if reversed { [k[0], k[2], k[1]] } else { k };
            tri_from_positions(face, f, k)
        })
        .collect();
    Some(tris)
}

/// Triangulate every face. Output triangle `orig` is the index of the face
/// it came from; output vertex `orig` is the index of the vertex in `pm`.
pub fn triangulate_polymesh<T: Scalar>(pm: &PolyMesh<T>) -> TriMesh<T> {
    let verts = pm
        .verts
        .iter()
        .enumerate()
        .map(|(i, v)| Vert {
            co: v.co.clone(),
            orig: Some(i),
        })
        .collect();
    let mut tris = Vec::new();
    for (f, face) in pm.faces.iter().enumerate() {
        match face.len() {
            0..=2 => trace!(f, "skipping degenerate face"),
            3 => tris.push(tri_from_positions(face, f, [0, 1, 2])),
            n => {
                let split = if n == 4 { quad_tris(pm, face, f) } else { None };
                match split.or_else(|| cdt_tris(pm, face, f)) {
                    Some(ts) => tris.extend(ts),
                    None => {
                        trace!(f, "triangulation added vertices, using a fan");
                        tris.extend(fan(face, f));
                    }
                }
            }
        }
    }
    TriMesh::new(verts, tris)
}
