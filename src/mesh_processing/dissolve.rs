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

//! Merging Boolean output triangles back into the polygons they came from.

use ahash::AHashMap;
use tracing::{debug, trace};

use crate::{
    geometry::point::approx,
    mesh::{
        polymesh::{Face, PolyMesh},
        trimesh::TriMesh,
    },
    numeric::scalar::Scalar,
};

/// Edge of the merge graph. `v1 < v2`; the left face runs along it from
/// `v1` to `v2`.
#[derive(Clone, Debug)]
struct MergeEdge {
    v1: usize,
    v2: usize,
    len_squared: f64,
    left_face: Option<usize>,
    right_face: Option<usize>,
    orig: Option<usize>,
    is_intersect: bool,
    dissolvable: bool,
}

#[derive(Clone, Debug)]
struct MergeFace {
    vert: Vec<usize>,
    /// `edge[i]` runs from `vert[i]` to `vert[i + 1]`.
    edge: Vec<usize>,
    merged: bool,
    orig: usize,
}

#[derive(Default)]
struct FaceMergeState {
    face: Vec<MergeFace>,
    edge: Vec<MergeEdge>,
    edge_map: AHashMap<(usize, usize), usize>,
}

impl FaceMergeState {
    /// Triangles of `tris` whose normal agrees with `norm` (or, with
    /// `include_perpendicular`, is not against it).
    fn new<T: Scalar>(tris: &[usize], tm: &TriMesh<T>, norm: &[f64; 3], include_perpendicular: bool) -> Self {
        let mut fms = FaceMergeState::default();
        for &t in tris {
            let d = approx::dot(norm, &tm.tri_normal_approx(t));
            if d < 0.0 || (d == 0.0 && !include_perpendicular) {
                continue;
            }
            let tri = &tm.tris[t];
            let f = fms.face.len();
            fms.face.push(MergeFace {
                vert: tri.v.to_vec(),
                edge: Vec::with_capacity(3),
                merged: false,
                orig: tri.orig,
            });
            for i in 0..3 {
                let (a, b) = (tri.v[i], tri.v[(i + 1) % 3]);
                let key = (a.min(b), a.max(b));
                let me_index = *fms.edge_map.entry(key).or_insert_with(|| {
                    fms.edge.push(MergeEdge {
                        v1: key.0,
                        v2: key.1,
                        len_squared: approx::distance_squared(&tm.co(key.0).approx, &tm.co(key.1).approx),
                        left_face: None,
                        right_face: None,
                        orig: tri.edge_orig[i],
                        is_intersect: tri.is_intersect[i],
                        dissolvable: tri.edge_orig[i].is_none() && !tri.is_intersect[i],
                    });
                    fms.edge.len() - 1
                });
                let me = &mut fms.edge[me_index];
                if me.dissolvable && tri.edge_orig[i].is_some() {
                    me.dissolvable = false;
                    me.orig = tri.edge_orig[i];
                }
                if me.dissolvable && tri.is_intersect[i] {
                    me.dissolvable = false;
                    me.is_intersect = true;
                }
                if me.v1 == a {
                    me.left_face = Some(f);
                } else {
                    me.right_face = Some(f);
                }
                fms.face[f].edge.push(me_index);
            }
        }
        fms
    }

    /// Removing edge `me_index` between `left` and `right` must not make
    /// the merged face touch itself at an edge or a vertex.
    fn dissolve_leaves_valid_bmesh(&self, me_index: usize, left: usize, right: usize) -> bool {
        let me = &self.edge[me_index];
        let mf_left = &self.face[left];
        let mf_right = &self.face[right];
        let shares_other_edge = mf_left
            .edge
            .iter()
            .any(|&e| e != me_index && (self.edge[e].right_face == Some(right) || self.edge[e].left_face == Some(right)));
        if shares_other_edge {
            return false;
        }
        !mf_left
            .vert
            .iter()
            .filter(|&&v| v != me.v1 && v != me.v2)
            .any(|v| mf_right.vert.contains(v))
    }

    /// Merge `right` into `left` across edge `me_index`.
    fn splice_faces(&mut self, me_index: usize, left: usize, right: usize) {
        let (Some(a_start), Some(b_start)) = (
            self.face[left].edge.iter().position(|&e| e == me_index),
            self.face[right].edge.iter().position(|&e| e == me_index),
        ) else {
            return;
        };
        let a = self.face[left].clone();
        let b = std::mem::take(&mut self.face[right].vert);
        let b_edges = std::mem::take(&mut self.face[right].edge);
        let blen = b.len();
        let mut vert = Vec::with_capacity(a.vert.len() + blen - 2);
        let mut edge = Vec::with_capacity(a.vert.len() + blen - 2);
        vert.extend_from_slice(&a.vert[..a_start]);
        edge.extend_from_slice(&a.edge[..a_start]);
        for j in 1..blen {
            let bi = (b_start + j) % blen;
            vert.push(b[bi]);
            edge.push(b_edges[bi]);
            let be = &mut self.edge[b_edges[bi]];
            if b[bi] == be.v1 {
                be.left_face = Some(left);
            } else {
                be.right_face = Some(left);
            }
        }
        vert.extend_from_slice(&a.vert[a_start + 1..]);
        edge.extend_from_slice(&a.edge[a_start + 1..]);
        self.face[right].merged = true;
        self.face[left].vert = vert;
        self.face[left].edge = edge;
        let me = &mut self.edge[me_index];
        me.left_face = None;
        me.right_face = None;
    }

    /// Dissolve every dissolvable edge that can go, longest first.
    fn do_dissolve(&mut self) {
        let mut dissolve_edges: Vec<usize> = (0..self.edge.len()).filter(|&e| self.edge[e].dissolvable).collect();
        dissolve_edges.sort_by(|&a, &b| self.edge[b].len_squared.total_cmp(&self.edge[a].len_squared));
        for me_index in dissolve_edges {
            let (Some(left), Some(right)) = (self.edge[me_index].left_face, self.edge[me_index].right_face) else {
                continue;
            };
            if left == right || !self.dissolve_leaves_valid_bmesh(me_index, left, right) {
                continue;
            }
            self.splice_faces(me_index, left, right);
        }
    }

    fn into_faces(self, pm_in: &PolyMesh<impl Scalar>) -> Vec<Face> {
        self.face
            .iter()
            .filter(|mf| !mf.merged)
            .map(|mf| Face {
                verts: mf.vert.clone(),
                orig: pm_in.faces.get(mf.orig).map_or(mf.orig, |f| f.orig),
                edge_orig: mf.edge.iter().map(|&e| self.edge[e].orig).collect(),
                is_intersect: mf.edge.iter().map(|&e| self.edge[e].is_intersect).collect(),
            })
            .collect()
    }
}

/// Two triangles that still form exactly the input quad they came from.
fn unchanged_quad<T: Scalar>(tris: &[usize], tm: &TriMesh<T>, pm_in: &PolyMesh<T>) -> Option<Face> {
    let [t1, t2] = tris else {
        return None;
    };
    let (tri1, tri2) = (&tm.tris[*t1], &tm.tris[*t2]);
    let in_face = pm_in.faces.get(tri1.orig)?;
    if in_face.len() != 4 || approx::dot(&tm.tri_normal_approx(*t1), &tm.tri_normal_approx(*t2)) <= 0.0 {
        return None;
    }
    let (i, j) = (0..3).find_map(|i| {
        let (a, b) = (tri1.v[i], tri1.v[(i + 1) % 3]);
        (0..3)
            .find(|&j| tri2.v[j] == b && tri2.v[(j + 1) % 3] == a)
            .map(|j| (i, j))
    })?;
    let shared_dissolvable = tri1.edge_orig[i].is_none()
        && tri2.edge_orig[j].is_none()
        && !tri1.is_intersect[i]
        && !tri2.is_intersect[j];
    if !shared_dissolvable {
        return None;
    }
    let (i1, i2) = ((i + 1) % 3, (i + 2) % 3);
    let (j1, j2) = ((j + 1) % 3, (j + 2) % 3);
    let verts = vec![tri1.v[i], tri2.v[j2], tri1.v[i1], tri1.v[i2]];
    let in_verts: Vec<usize> = verts
        .iter()
        .map(|&v| tm.verts[v].orig)
        .collect::<Option<Vec<_>>>()?;
    if !in_face.cyclic_equal(&in_verts) {
        return None;
    }
    Some(Face {
        verts,
        orig: in_face.orig,
        edge_orig: vec![tri2.edge_orig[j1], tri2.edge_orig[j2], tri1.edge_orig[i1], tri1.edge_orig[i2]],
        is_intersect: vec![
            tri2.is_intersect[j1],
            tri2.is_intersect[j2],
            tri1.is_intersect[i1],
            tri1.is_intersect[i2],
        ],
    })
}

fn merge_tris_for_face<T: Scalar>(tris: &[usize], tm: &TriMesh<T>, pm_in: &PolyMesh<T>) -> Vec<Face> {
    if let Some(quad) = unchanged_quad(tris, tm, pm_in) {
        return vec![quad];
    }
    let first_normal = tm.tri_normal_approx(tris[0]);
    let opposite = first_normal.map(|c| -c);
    let mut ans = Vec::new();
    for (norm, include_perpendicular) in [(first_normal, true), (opposite, false)] {
        let mut fms = FaceMergeState::new(tris, tm, &norm, include_perpendicular);
        fms.do_dissolve();
        ans.extend(fms.into_faces(pm_in));
    }
    ans
}

/// Vertices made by intersection that sit in the middle of a straight
/// run of edges, with the same two neighbours in every face using them.
fn find_dissolve_verts<T: Scalar>(pm: &PolyMesh<T>) -> Vec<bool> {
    let mut dissolve: Vec<bool> = pm.verts.iter().map(|v| v.orig.is_none()).collect();
    let mut neighbors: Vec<Option<(usize, usize)>> = vec![None; pm.verts.len()];
    for face in &pm.faces {
        for i in 0..face.len() {
            let v = face.verts[i];
            if !dissolve[v] {
                continue;
            }
            let n1 = face.verts[face.next_pos(i)];
            let n2 = face.verts[face.prev_pos(i)];
            match neighbors[v] {
                Some((f1, f2)) => {
                    if !((n1 == f2 && n2 == f1) || (n1 == f1 && n2 == f2)) {
                        dissolve[v] = false;
                    }
                }
                None => neighbors[v] = Some((n1, n2)),
            }
        }
    }
    for (v, d) in dissolve.iter_mut().enumerate() {
        if !*d {
            continue;
        }
        *d = neighbors[v].is_some_and(|(n1, n2)| {
            let co = &pm.verts[v].co.approx;
            let dir1 = approx::sub(co, &pm.verts[n1].co.approx);
            let dir2 = approx::sub(&pm.verts[n2].co.approx, co);
            let len = (approx::dot(&dir1, &dir1) * approx::dot(&dir2, &dir2)).sqrt();
            len > 0.0 && (approx::dot(&dir1, &dir2) / len - 1.0).abs() < 1e-4
        });
    }
    dissolve
}

/// Remove the flagged vertices from every face, dropping faces left with
/// fewer than three vertices.
fn dissolve_verts<T: Scalar>(pm: &mut PolyMesh<T>, dissolve: &[bool]) {
    for face in pm.faces.iter_mut() {
        if !face.verts.iter().any(|&v| dissolve[v]) {
            continue;
        }
        let keep: Vec<usize> = (0..face.len()).filter(|&i| !dissolve[face.verts[i]]).collect();
        face.verts = keep.iter().map(|&i| face.verts[i]).collect();
        face.edge_orig = keep.iter().map(|&i| face.edge_orig[i]).collect();
        face.is_intersect = keep.iter().map(|&i| face.is_intersect[i]).collect();
    }
    pm.faces.retain(|f| f.len() >= 3);
}

/// Polygon mesh from the triangles of a Boolean result. Triangles from the
/// same input face of `pm_in` are merged across edges that only the
/// triangulation introduced, then straight-line intersection vertices are
/// removed.
pub fn polymesh_from_trimesh_with_dissolve<T: Scalar>(tm_out: &TriMesh<T>, pm_in: &PolyMesh<T>) -> PolyMesh<T> {
    let mut groups: Vec<(usize, Vec<usize>)> = Vec::new();
    let mut group_of: AHashMap<usize, usize> = AHashMap::new();
    for (t, tri) in tm_out.tris.iter().enumerate() {
        let g = *group_of.entry(tri.orig).or_insert_with(|| {
            groups.push((tri.orig, Vec::new()));
            groups.len() - 1
        });
        groups[g].1.push(t);
    }
    groups.sort_by_key(|(orig, _)| *orig);

    let mut faces = Vec::new();
    for (_, tris) in &groups {
        faces.extend(merge_tris_for_face(tris, tm_out, pm_in));
    }
    let mut pm = PolyMesh {
        verts: tm_out.verts.clone(),
        faces,
    };
    let dissolve = find_dissolve_verts(&pm);
    let count = dissolve.iter().filter(|&&d| d).count();
    if count > 0 {
        trace!(count, "dissolving straight intersection vertices");
        dissolve_verts(&mut pm, &dissolve);
    }
    debug!(
        tris = tm_out.tris.len(),
        faces = pm.faces.len(),
        "polymesh_from_trimesh_with_dissolve"
    );
    pm
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        geometry::point::Point3,
        mesh::trimesh::{Tri, Vert},
        mesh_processing::triangulate::triangulate_polymesh,
    };

    #[test]
    fn triangulated_quad_comes_back() {
        let pts = [[0, 0, 0], [1, 0, 0], [1, 1, 0], [0, 1, 0]]
            .iter()
            .map(|&c| Point3::<f64>::from_ints(c))
            .collect();
        let pm = PolyMesh::from_faces(pts, vec![vec![0, 1, 2, 3]]);
        let tm = triangulate_polymesh(&pm);
        let out = polymesh_from_trimesh_with_dissolve(&tm, &pm);
        assert_eq!(out.faces.len(), 1);
        let f = &out.faces[0];
        assert!(f.cyclic_equal(&[0, 1, 2, 3]));
        let start = f.verts.iter().position(|&v| v == 0).unwrap_or(0);
        assert_eq!(f.edge_orig[start], Some(0));
        assert_eq!(f.edge_orig[(start + 1) % 4], Some(1));
    }

    #[test]
    fn pentagon_merges_into_one_face() {
        let pts = [[0, 0, 0], [2, 0, 0], [3, 1, 0], [1, 3, 0], [-1, 1, 0]]
            .iter()
            .map(|&c| Point3::<f64>::from_ints(c))
            .collect();
        let pm = PolyMesh::from_faces(pts, vec![vec![0, 1, 2, 3, 4]]);
        let tm = triangulate_polymesh(&pm);
        assert_eq!(tm.tris.len(), 3);
        let out = polymesh_from_trimesh_with_dissolve(&tm, &pm);
        assert_eq!(out.faces.len(), 1);
        assert!(out.faces[0].cyclic_equal(&[0, 1, 2, 3, 4]));
        assert!(out.faces[0].edge_orig.iter().all(|e| e.is_some()));
    }

    #[test]
    fn straight_intersection_vertex_is_dissolved() {
        // Square with an extra vertex in the middle of its bottom edge.
        let mut verts: Vec<Vert<f64>> = [[0, 0, 0], [2, 0, 0], [2, 2, 0], [0, 2, 0], [1, 0, 0]]
            .iter()
            .enumerate()
            .map(|(i, &c)| Vert::new(Point3::from_ints(c), Some(i)))
            .collect();
        verts[4].orig = None;
        let tri = |v: [usize; 3], e: [Option<usize>; 3]| {
            let mut t = Tri::new(v, 0);
            t.edge_orig = e;
            t
        };
        let tm = TriMesh::new(
            verts,
            vec![
                tri([0, 4, 3], [Some(0), None, Some(3)]),
                tri([4, 1, 2], [Some(0), Some(1), None]),
                tri([4, 2, 3], [None, Some(2), None]),
            ],
        );
        let pm_in = PolyMesh::from_faces(
            [[0, 0, 0], [2, 0, 0], [2, 2, 0], [0, 2, 0]]
                .iter()
                .map(|&c| Point3::from_ints(c))
                .collect(),
            vec![vec![0, 1, 2, 3]],
        );
        let out = polymesh_from_trimesh_with_dissolve(&tm, &pm_in);
        assert_eq!(out.faces.len(), 1);
        assert!(out.faces[0].cyclic_equal(&[0, 1, 2, 3]));
    }
}
