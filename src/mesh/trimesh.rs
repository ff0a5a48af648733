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

use crate::{
    geometry::{fat_co::FatCo3, point::Point3},
    numeric::scalar::Scalar,
};

#[derive(Clone, Debug)]
pub struct Vert<T: Scalar> {
    pub co: FatCo3<T>,
    /// Input vertex this one came from; `None` for vertices created by
    /// intersection.
    pub orig: Option<usize>,
}

impl<T: Scalar> Vert<T> {
    pub fn new(co: Point3<T>, orig: Option<usize>) -> Self {
        Vert {
            co: FatCo3::new(co),
            orig,
        }
    }
}

/// A triangle of a [`TriMesh`].
///
/// `edge_orig[i]` and `is_intersect[i]` describe the edge from `v[i]` to
/// `v[(i + 1) % 3]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tri {
    pub v: [usize; 3],
    /// Input face this triangle is part of.
    pub orig: usize,
    pub edge_orig: [Option<usize>; 3],
    pub is_intersect: [bool; 3],
}

impl Tri {
    pub fn new(v: [usize; 3], orig: usize) -> Self {
        Tri {
            v,
            orig,
            edge_orig: [None; 3],
            is_intersect: [false; 3],
        }
    }

    /// The same triangle with reversed orientation, edge data following
    /// their edges.
    pub fn flipped(&self) -> Tri {
        Tri {
            v: [self.v[0], self.v[2], self.v[1]],
            orig: self.orig,
            edge_orig: [self.edge_orig[2], self.edge_orig[1], self.edge_orig[0]],
            is_intersect: [
                self.is_intersect[2],
                self.is_intersect[1],
                self.is_intersect[0],
            ],
        }
    }

    /// True when both triangles use the same three vertices, in either
    /// orientation.
    pub fn same_verts(&self, other: &Tri) -> bool {
        let mut a = self.v;
        let mut b = other.v;
        a.sort_unstable();
        b.sort_unstable();
        a == b
    }

    pub fn is_degenerate(&self) -> bool {
        self.v[0] == self.v[1] || self.v[1] == self.v[2] || self.v[2] == self.v[0]
    }
}

/// Triangle soup sharing one vertex table.
#[derive(Clone, Debug)]
pub struct TriMesh<T: Scalar> {
    pub verts: Vec<Vert<T>>,
    pub tris: Vec<Tri>,
}

impl<T: Scalar> Default for TriMesh<T> {
    fn default() -> Self {
        TriMesh {
            verts: Vec::new(),
            tris: Vec::new(),
        }
    }
}

impl<T: Scalar> TriMesh<T> {
    pub fn new(verts: Vec<Vert<T>>, tris: Vec<Tri>) -> Self {
        TriMesh { verts, tris }
    }

    /// Vertex `i` gets `orig = Some(i)`, triangle `t` gets `orig = t`.
    pub fn from_soup(points: Vec<Point3<T>>, tris: &[[usize; 3]]) -> Self {
        let verts = points
            .into_iter()
            .enumerate()
            .map(|(i, p)| Vert::new(p, Some(i)))
            .collect();
        let tris = tris
            .iter()
            .enumerate()
            .map(|(t, &v)| Tri::new(v, t))
            .collect();
        TriMesh { verts, tris }
    }

    pub fn is_empty(&self) -> bool {
        self.tris.is_empty()
    }

    pub fn co(&self, v: usize) -> &FatCo3<T> {
        &self.verts[v].co
    }

    pub fn tri_co(&self, t: usize) -> [&FatCo3<T>; 3] {
        self.tris[t].v.map(|v| &self.verts[v].co)
    }

    /// Unnormalized normal of triangle `t` on approximate coordinates.
    pub fn tri_normal_approx(&self, t: usize) -> [f64; 3] {
        use crate::geometry::point::approx::{cross, sub};
        let [a, b, c] = self.tri_co(t);
        cross(&sub(&b.approx, &a.approx), &sub(&c.approx, &a.approx))
    }

    pub fn with_tris(&self, tris: Vec<Tri>) -> TriMesh<T> {
        TriMesh {
            verts: self.verts.clone(),
            tris,
        }
    }

    /// Drop vertices no triangle uses and renumber the rest in order.
    pub fn compact(&self) -> TriMesh<T> {
        let mut remap = vec![usize::MAX; self.verts.len()];
        let mut verts = Vec::new();
        let mut tris = Vec::with_capacity(self.tris.len());
        for tri in &self.tris {
            let mut t = tri.clone();
            for v in t.v.iter_mut() {
                if remap[*v] == usize::MAX {
                    remap[*v] = verts.len();
                    verts.push(self.verts[*v].clone());
                }
                *v = remap[*v];
            }
            tris.push(t);
        }
        TriMesh { verts, tris }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flipping_keeps_edge_data_on_edges() {
        let mut t = Tri::new([0, 1, 2], 7);
        t.edge_orig = [Some(10), Some(11), Some(12)];
        t.is_intersect = [true, false, false];
        let f = t.flipped();
        assert_eq!(f.v, [0, 2, 1]);
        // Edge 0->2 of the flipped triangle is edge 2->0 of the original.
        assert_eq!(f.edge_orig, [Some(12), Some(11), Some(10)]);
        assert_eq!(f.is_intersect, [false, false, true]);
        assert!(f.same_verts(&t));
        assert_eq!(f.flipped(), t);
    }

    #[test]
    fn compact_renumbers_in_first_use_order() {
        let tm = TriMesh::<f64>::from_soup(
            vec![
                Point3::new([9.0, 9.0, 9.0]),
                Point3::new([0.0, 0.0, 0.0]),
                Point3::new([1.0, 0.0, 0.0]),
                Point3::new([0.0, 1.0, 0.0]),
            ],
            &[[1, 2, 3]],
        );
        let c = tm.compact();
        assert_eq!(c.verts.len(), 3);
        assert_eq!(c.tris[0].v, [0, 1, 2]);
        assert_eq!(c.verts[0].orig, Some(1));
    }
}
