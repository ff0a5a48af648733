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

use ahash::AHashMap;
use rayon::prelude::*;
use smallvec::SmallVec;

use crate::{mesh::trimesh::TriMesh, numeric::scalar::Scalar};

/// Undirected edge between two vertex indices, stored smaller index first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Edge {
    v: [usize; 2],
}

impl Edge {
    pub fn new(a: usize, b: usize) -> Self {
        if a <= b {
            Edge { v: [a, b] }
        } else {
            Edge { v: [b, a] }
        }
    }

    pub fn v0(&self) -> usize {
        self.v[0]
    }

    pub fn v1(&self) -> usize {
        self.v[1]
    }

    pub fn other(&self, v: usize) -> usize {
        if self.v[0] == v { self.v[1] } else { self.v[0] }
    }
}

pub type EdgeTris = SmallVec<[usize; 4]>;

/// Edge to incident triangle index, and vertex to incident edges.
pub struct TriMeshTopology {
    edge_tri: AHashMap<Edge, EdgeTris>,
    vert_edges: Vec<SmallVec<[Edge; 8]>>,
}

impl TriMeshTopology {
    pub fn new<T: Scalar>(tm: &TriMesh<T>) -> Self {
        // Per-chunk maps merged pairwise; each list is sorted afterwards so
        // the result does not depend on scheduling.
        let mut edge_tri = tm
            .tris
            .par_iter()
            .enumerate()
            .fold(AHashMap::<Edge, EdgeTris>::new, |mut map, (t, tri)| {
                for i in 0..3 {
                    let e = Edge::new(tri.v[i], tri.v[(i + 1) % 3]);
                    map.entry(e).or_default().push(t);
                }
                map
            })
            .reduce(AHashMap::new, |mut a, b| {
                for (e, tris) in b {
                    a.entry(e).or_default().extend(tris);
                }
                a
            });
        for tris in edge_tri.values_mut() {
            tris.sort_unstable();
            tris.dedup();
        }

        let mut vert_edges: Vec<SmallVec<[Edge; 8]>> = vec![SmallVec::new(); tm.verts.len()];
        let mut edges: Vec<Edge> = edge_tri.keys().copied().collect();
        edges.sort_unstable();
        for e in edges {
            vert_edges[e.v0()].push(e);
            if e.v1() != e.v0() {
                vert_edges[e.v1()].push(e);
            }
        }
        TriMeshTopology {
            edge_tri,
            vert_edges,
        }
    }

    /// The other triangle on `e` when exactly two triangles share it.
    pub fn other_tri_if_manifold(&self, e: Edge, t: usize) -> Option<usize> {
        match self.edge_tri.get(&e) {
            Some(tris) if tris.len() == 2 => Some(if tris[0] == t { tris[1] } else { tris[0] }),
            _ => None,
        }
    }

    pub fn edge_tris(&self, e: Edge) -> Option<&EdgeTris> {
        self.edge_tri.get(&e)
    }

    pub fn vert_edges(&self, v: usize) -> &[Edge] {
        self.vert_edges.get(v).map_or(&[][..], |es| es.as_slice())
    }

    pub fn edges(&self) -> impl Iterator<Item = (&Edge, &EdgeTris)> {
        self.edge_tri.iter()
    }

    pub fn num_edges(&self) -> usize {
        self.edge_tri.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::point::Point3;

    fn tetra() -> TriMesh<f64> {
        TriMesh::from_soup(
            vec![
                Point3::new([0.0, 0.0, 0.0]),
                Point3::new([1.0, 0.0, 0.0]),
                Point3::new([0.0, 1.0, 0.0]),
                Point3::new([0.0, 0.0, 1.0]),
            ],
            &[[0, 2, 1], [0, 1, 3], [1, 2, 3], [0, 3, 2]],
        )
    }

    #[test]
    fn canonical_edge_order() {
        assert_eq!(Edge::new(5, 2), Edge::new(2, 5));
        assert_eq!(Edge::new(5, 2).v0(), 2);
        assert_eq!(Edge::new(5, 2).other(2), 5);
    }

    #[test]
    fn tetrahedron_is_manifold() {
        let tm = tetra();
        let topo = TriMeshTopology::new(&tm);
        assert_eq!(topo.num_edges(), 6);
        assert!(topo.edges().all(|(_, tris)| tris.len() == 2));
        assert_eq!(topo.other_tri_if_manifold(Edge::new(0, 1), 0), Some(1));
        assert_eq!(topo.vert_edges(3).len(), 3);
    }

    #[test]
    fn fin_makes_edge_non_manifold() {
        let mut tm = tetra();
        tm.verts.push(crate::mesh::trimesh::Vert::new(Point3::new([1.0, 1.0, 0.0]), None));
        tm.tris.push(crate::mesh::trimesh::Tri::new([0, 1, 4], 4));
        let topo = TriMeshTopology::new(&tm);
        assert_eq!(topo.edge_tris(Edge::new(0, 1)).map(|t| t.len()), Some(3));
        assert_eq!(topo.other_tri_if_manifold(Edge::new(0, 1), 0), None);
    }
}
