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

//! Grouping of triangles into manifold-connected patches.

use ahash::AHashMap;
use rayon::prelude::*;
use tracing::debug;

use crate::{
    mesh::{
        topology::{Edge, TriMeshTopology},
        trimesh::TriMesh,
    },
    numeric::scalar::Scalar,
};

/// Sentinel for a patch side with no cell assigned yet.
pub const NO_CELL: usize = usize::MAX;

/// A maximal set of triangles joined by edges that have exactly two
/// incident triangles.
#[derive(Clone, Debug)]
pub struct Patch {
    pub tris: Vec<usize>,
    /// Cell on the side the triangle normals point to.
    pub cell_above: usize,
    pub cell_below: usize,
    pub component: Option<usize>,
}

impl Patch {
    fn new() -> Self {
        Patch {
            tris: Vec::new(),
            cell_above: NO_CELL,
            cell_below: NO_CELL,
            component: None,
        }
    }
}

pub struct PatchesInfo {
    pub patches: Vec<Patch>,
    tri_patch: Vec<usize>,
    /// Some edge shared by each pair of incident patches, stored for both
    /// orders of the pair.
    pp_edge: AHashMap<(usize, usize), Edge>,
}

impl PatchesInfo {
    pub fn tri_patch(&self, t: usize) -> usize {
        self.tri_patch[t]
    }

    pub fn len(&self) -> usize {
        self.patches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }

    pub fn patch_patch_edge(&self, p1: usize, p2: usize) -> Option<Edge> {
        self.pp_edge.get(&(p1, p2)).copied()
    }

    /// Distinct non-manifold edges joining two patches, in a stable order.
    pub fn patch_patch_edges(&self) -> Vec<Edge> {
        let mut pairs: Vec<(&(usize, usize), &Edge)> =
            self.pp_edge.iter().filter(|((p, q), _)| p < q).collect();
        pairs.sort_unstable_by_key(|(k, _)| **k);
        let mut seen = ahash::AHashSet::new();
        pairs
            .into_iter()
            .filter_map(|(_, e)| seen.insert(*e).then_some(*e))
            .collect()
    }
}

/// Flood fill triangles across manifold edges. Non-manifold edges met on the
/// way are recorded as patch/patch incidences.
pub fn find_patches<T: Scalar>(tm: &TriMesh<T>, topo: &TriMeshTopology) -> PatchesInfo {
    let ntri = tm.tris.len();
    let manifold_nbrs: Vec<[Option<usize>; 3]> = (0..ntri)
        .into_par_iter()
        .map(|t| {
            let v = tm.tris[t].v;
            std::array::from_fn(|i| topo.other_tri_if_manifold(Edge::new(v[i], v[(i + 1) % 3]), t))
        })
        .collect();

    let mut pinfo = PatchesInfo {
        patches: Vec::new(),
        tri_patch: vec![usize::MAX; ntri],
        pp_edge: AHashMap::new(),
    };
    let mut stack = Vec::new();
    for t in 0..ntri {
        if pinfo.tri_patch[t] != usize::MAX {
            continue;
        }
        let cur = pinfo.patches.len();
        pinfo.patches.push(Patch::new());
        stack.push(t);
        while let Some(tcand) = stack.pop() {
            if pinfo.tri_patch[tcand] != usize::MAX {
                continue;
            }
            pinfo.tri_patch[tcand] = cur;
            pinfo.patches[cur].tris.push(tcand);
            let v = tm.tris[tcand].v;
            for i in 0..3 {
                if let Some(t_other) = manifold_nbrs[tcand][i] {
                    if pinfo.tri_patch[t_other] == usize::MAX {
                        stack.push(t_other);
                    }
                    continue;
                }
                let e = Edge::new(v[i], v[(i + 1) % 3]);
                let Some(etris) = topo.edge_tris(e) else {
                    continue;
                };
                for &t_other in etris {
                    if t_other == tcand || pinfo.tri_patch[t_other] == usize::MAX {
                        continue;
                    }
                    let p_other = pinfo.tri_patch[t_other];
                    if p_other != cur && !pinfo.pp_edge.contains_key(&(cur, p_other)) {
                        pinfo.pp_edge.insert((cur, p_other), e);
                        pinfo.pp_edge.insert((p_other, cur), e);
                    }
                }
            }
        }
    }
    debug!(
        patches = pinfo.patches.len(),
        incidences = pinfo.pp_edge.len() / 2,
        "find_patches"
    );
    pinfo
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::point::Point3;

    #[test]
    fn three_fins_on_one_edge() {
        // Three triangles hinged on edge 0-1, plus one more glued to the
        // first along a manifold edge.
        let tm = TriMesh::<f64>::from_soup(
            vec![
                Point3::new([0.0, 0.0, 0.0]),
                Point3::new([1.0, 0.0, 0.0]),
                Point3::new([0.5, 1.0, 0.0]),
                Point3::new([0.5, -1.0, 0.5]),
                Point3::new([0.5, 0.0, 1.0]),
                Point3::new([1.5, 1.0, 0.0]),
            ],
            &[[0, 1, 2], [1, 0, 3], [0, 1, 4], [1, 5, 2]],
        );
        let topo = TriMeshTopology::new(&tm);
        let pinfo = find_patches(&tm, &topo);
        assert_eq!(pinfo.len(), 3);
        assert_eq!(pinfo.tri_patch(0), pinfo.tri_patch(3));
        assert_eq!(pinfo.patch_patch_edges(), vec![Edge::new(0, 1)]);
        assert_eq!(
            pinfo.patch_patch_edge(pinfo.tri_patch(1), pinfo.tri_patch(2)),
            Some(Edge::new(0, 1))
        );
    }
}
