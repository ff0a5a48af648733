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

use crate::{geometry::point::Point3, mesh::trimesh::Vert, numeric::scalar::Scalar};

/// A polygon of a [`PolyMesh`]. `edge_orig[i]` and `is_intersect[i]`
/// describe the edge from `verts[i]` to the next vertex.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Face {
    pub verts: Vec<usize>,
    pub orig: usize,
    pub edge_orig: Vec<Option<usize>>,
    pub is_intersect: Vec<bool>,
}

impl Face {
    pub fn len(&self) -> usize {
        self.verts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.verts.is_empty()
    }

    pub fn next_pos(&self, i: usize) -> usize {
        (i + 1) % self.verts.len()
    }

    pub fn prev_pos(&self, i: usize) -> usize {
        (i + self.verts.len() - 1) % self.verts.len()
    }

    /// Same vertex cycle, possibly starting at a different position.
    pub fn cyclic_equal(&self, other: &[usize]) -> bool {
        let n = self.verts.len();
        if n != other.len() {
            return false;
        }
        if n == 0 {
            return true;
        }
        (0..n).any(|start| (0..n).all(|i| self.verts[(start + i) % n] == other[i]))
    }
}

#[derive(Clone, Debug)]
pub struct PolyMesh<T: Scalar> {
    pub verts: Vec<Vert<T>>,
    pub faces: Vec<Face>,
}

impl<T: Scalar> Default for PolyMesh<T> {
    fn default() -> Self {
        PolyMesh {
            verts: Vec::new(),
            faces: Vec::new(),
        }
    }
}

impl<T: Scalar> PolyMesh<T> {
    /// Build a mesh where face `f` has `orig = f` and every face corner `k`
    /// (counted over all faces in order) names its outgoing edge with
    /// `edge_orig = Some(k)`.
    pub fn from_faces(points: Vec<Point3<T>>, faces: Vec<Vec<usize>>) -> Self {
        let verts = points
            .into_iter()
            .enumerate()
            .map(|(i, p)| Vert::new(p, Some(i)))
            .collect();
        let mut corner = 0;
        let faces = faces
            .into_iter()
            .enumerate()
            .map(|(f, vs)| {
                let n = vs.len();
                let edge_orig = (corner..corner + n).map(Some).collect();
                corner += n;
                Face {
                    verts: vs,
                    orig: f,
                    edge_orig,
                    is_intersect: vec![false; n],
                }
            })
            .collect();
        PolyMesh { verts, faces }
    }

    /// Drop vertices no face uses and renumber the rest in order.
    pub fn compact(&mut self) {
        let mut remap = vec![usize::MAX; self.verts.len()];
        let mut verts = Vec::new();
        for face in self.faces.iter_mut() {
            for v in face.verts.iter_mut() {
                if remap[*v] == usize::MAX {
                    remap[*v] = verts.len();
                    verts.push(self.verts[*v].clone());
                }
                *v = remap[*v];
            }
        }
        self.verts = verts;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corners_number_edges() {
        let pts = (0..5).map(|i| Point3::<f64>::from_ints([i, 0, 0])).collect();
        let pm = PolyMesh::from_faces(pts, vec![vec![0, 1, 2], vec![2, 3, 4, 0]]);
        assert_eq!(pm.faces[1].orig, 1);
        assert_eq!(pm.faces[1].edge_orig, vec![Some(3), Some(4), Some(5), Some(6)]);
    }

    #[test]
    fn cyclic_equality_ignores_start() {
        let pm = PolyMesh::<f64>::from_faces(Vec::new(), vec![vec![4, 5, 6, 7]]);
        let f = &pm.faces[0];
        assert!(f.cyclic_equal(&[6, 7, 4, 5]));
        assert!(!f.cyclic_equal(&[7, 6, 5, 4]));
        assert_eq!(f.prev_pos(0), 3);
    }
}
