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

//! Cells: regions of space bounded by patches.

use std::collections::BTreeSet;

use tracing::debug;

use crate::{
    boolean::{
        patch::{NO_CELL, PatchesInfo},
        sort::{find_flap_vert, sort_tris_around_edge},
    },
    error::{GeokernError, GeokernResult},
    mesh::{
        topology::{Edge, TriMeshTopology},
        trimesh::TriMesh,
    },
    numeric::scalar::Scalar,
};

#[derive(Clone, Debug, Default)]
pub struct Cell {
    pub patches: BTreeSet<usize>,
    /// One winding number per input shape.
    pub winding: Vec<i32>,
    pub winding_assigned: bool,
    pub in_output_volume: bool,
    /// Set when the cell is the gap between two coincident triangles.
    pub zero_volume: bool,
}

impl Cell {
    fn add_patch(&mut self, p: usize) {
        self.patches.insert(p);
        self.zero_volume = false;
    }

    /// With exactly two patches, the one that is not `p`.
    pub fn patch_other(&self, p: usize) -> Option<usize> {
        if self.patches.len() != 2 {
            return None;
        }
        self.patches.iter().copied().find(|&q| q != p)
    }

    fn check_for_zero_volume<T: Scalar>(&mut self, pinfo: &PatchesInfo, tm: &TriMesh<T>) {
        if self.patches.len() != 2 {
            return;
        }
        let mut it = self.patches.iter();
        let (Some(&p1), Some(&p2)) = (it.next(), it.next()) else {
            return;
        };
        let (a, b) = (&pinfo.patches[p1], &pinfo.patches[p2]);
        if a.tris.len() == 1 && b.tris.len() == 1 && tm.tris[a.tris[0]].same_verts(&tm.tris[b.tris[0]]) {
            self.zero_volume = true;
        }
    }
}

/// All cells, with a path-compressing union-find for cells merged away.
#[derive(Default)]
pub struct CellsInfo {
    pub cells: Vec<Cell>,
    parent: Vec<usize>,
}

impl CellsInfo {
    pub fn add_cell(&mut self) -> usize {
        let c = self.cells.len();
        self.cells.push(Cell::default());
        self.parent.push(c);
        c
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Representative of the cell `c` was merged into, if any.
    pub fn find(&mut self, c: usize) -> usize {
        let mut root = c;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut cur = c;
        while self.parent[cur] != root {
            let next = self.parent[cur];
            self.parent[cur] = root;
            cur = next;
        }
        root
    }

    pub fn is_merged(&self, c: usize) -> bool {
        self.parent[c] != c
    }

    pub fn init_windings(&mut self, nshapes: usize) {
        for cell in &mut self.cells {
            cell.winding = vec![0; nshapes];
        }
    }

    /// Fold cell `from` into cell `to`. Patches of `from` move to `to`, so
    /// patch sides always name representative cells.
    pub fn merge(&mut self, to: usize, from: usize, pinfo: &mut PatchesInfo) {
        let to = self.find(to);
        let from = self.find(from);
        if to == from {
            return;
        }
        let moved = std::mem::take(&mut self.cells[from].patches);
        for &p in &moved {
            self.cells[to].add_patch(p);
            let patch = &mut pinfo.patches[p];
            if patch.cell_above == from {
                patch.cell_above = to;
            }
            if patch.cell_below == from {
                patch.cell_below = to;
            }
        }
        self.parent[from] = to;
    }
}

#[derive(Clone, Copy)]
enum Side {
    Above,
    Below,
}

fn side(pinfo: &PatchesInfo, p: usize, s: Side) -> usize {
    match s {
        Side::Above => pinfo.patches[p].cell_above,
        Side::Below => pinfo.patches[p].cell_below,
    }
}

fn set_side(pinfo: &mut PatchesInfo, p: usize, s: Side, c: usize) {
    match s {
        Side::Above => pinfo.patches[p].cell_above = c,
        Side::Below => pinfo.patches[p].cell_below = c,
    }
}

/// Assign the cells between consecutive patches around non-manifold edge
/// `e`, creating or merging cells as needed.
fn find_cells_from_edge<T: Scalar>(
    tm: &TriMesh<T>,
    topo: &TriMeshTopology,
    pinfo: &mut PatchesInfo,
    cinfo: &mut CellsInfo,
    e: Edge,
) -> GeokernResult<()> {
    let edge_tris = topo
        .edge_tris(e)
        .ok_or_else(|| GeokernError::PatchCellGraph(format!("no triangles on edge {e:?}")))?;
    let sorted = sort_tris_around_edge(tm, e, edge_tris, edge_tris[0], None);
    let n = sorted.len();
    for i in 0..n {
        let inext = (i + 1) % n;
        let r = pinfo.tri_patch(sorted[i]);
        let rnext = pinfo.tri_patch(sorted[inext]);
        let (_, r_flipped) = find_flap_vert(&tm.tris[sorted[i]].v, e)
            .ok_or_else(|| GeokernError::PatchCellGraph(format!("triangle {} lost edge", sorted[i])))?;
        let (_, rnext_flipped) = find_flap_vert(&tm.tris[sorted[inext]].v, e)
            .ok_or_else(|| GeokernError::PatchCellGraph(format!("triangle {} lost edge", sorted[inext])))?;
        let r_follow = if r_flipped { Side::Below } else { Side::Above };
        let rnext_prev = if rnext_flipped { Side::Above } else { Side::Below };
        let c_follow = side(pinfo, r, r_follow);
        let c_prev = side(pinfo, rnext, rnext_prev);
        match (c_follow == NO_CELL, c_prev == NO_CELL) {
            (true, true) => {
                let c = cinfo.add_cell();
                set_side(pinfo, r, r_follow, c);
                set_side(pinfo, rnext, rnext_prev, c);
                let cell = &mut cinfo.cells[c];
                cell.add_patch(r);
                cell.add_patch(rnext);
                cell.check_for_zero_volume(pinfo, tm);
            }
            (false, true) => {
                set_side(pinfo, rnext, rnext_prev, c_follow);
                let cell = &mut cinfo.cells[c_follow];
                cell.add_patch(rnext);
                cell.check_for_zero_volume(pinfo, tm);
            }
            (true, false) => {
                set_side(pinfo, r, r_follow, c_prev);
                let cell = &mut cinfo.cells[c_prev];
                cell.add_patch(r);
                cell.check_for_zero_volume(pinfo, tm);
            }
            (false, false) => {
                if c_follow != c_prev {
                    if cinfo.cells[c_follow].patches.len() >= cinfo.cells[c_prev].patches.len() {
                        cinfo.merge(c_follow, c_prev, pinfo);
                    } else {
                        cinfo.merge(c_prev, c_follow, pinfo);
                    }
                }
            }
        }
    }
    Ok(())
}

/// Partition space into cells around every patch/patch edge, then give
/// each patch still lacking a side its own fresh cell.
pub fn find_cells<T: Scalar>(
    tm: &TriMesh<T>,
    topo: &TriMeshTopology,
    pinfo: &mut PatchesInfo,
) -> GeokernResult<CellsInfo> {
    let mut cinfo = CellsInfo::default();
    for e in pinfo.patch_patch_edges() {
        find_cells_from_edge(tm, topo, pinfo, &mut cinfo, e)?;
    }
    for p in 0..pinfo.len() {
        if pinfo.patches[p].cell_above == NO_CELL {
            let c = cinfo.add_cell();
            pinfo.patches[p].cell_above = c;
            cinfo.cells[c].add_patch(p);
        }
        if pinfo.patches[p].cell_below == NO_CELL {
            let c = cinfo.add_cell();
            pinfo.patches[p].cell_below = c;
            cinfo.cells[c].add_patch(p);
        }
    }
    debug!(cells = cinfo.len(), "find_cells");
    Ok(cinfo)
}

/// Every live cell has patches, every patch has both cells, and all indices
/// are in range.
pub fn patch_cell_graph_ok(cinfo: &CellsInfo, pinfo: &PatchesInfo) -> GeokernResult<()> {
    for (c, cell) in cinfo.cells.iter().enumerate() {
        if cinfo.is_merged(c) {
            continue;
        }
        if cell.patches.is_empty() {
            return Err(GeokernError::PatchCellGraph(format!("cell {c} has no patches")));
        }
        if let Some(&p) = cell.patches.iter().find(|&&p| p >= pinfo.len()) {
            return Err(GeokernError::InvalidIndex {
                index: p,
                len: pinfo.len(),
            });
        }
    }
    for (p, patch) in pinfo.patches.iter().enumerate() {
        for c in [patch.cell_above, patch.cell_below] {
            if c == NO_CELL {
                return Err(GeokernError::PatchCellGraph(format!("patch {p} is missing a cell")));
            }
            if c >= cinfo.len() {
                return Err(GeokernError::InvalidIndex {
                    index: c,
                    len: cinfo.len(),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{boolean::patch::find_patches, geometry::point::Point3};

    #[test]
    fn union_find_compresses_and_moves_patches() {
        let tm = TriMesh::<f64>::from_soup(
            vec![
                Point3::new([0.0, 0.0, 0.0]),
                Point3::new([1.0, 0.0, 0.0]),
                Point3::new([0.0, 1.0, 0.0]),
            ],
            &[[0, 1, 2]],
        );
        let topo = TriMeshTopology::new(&tm);
        let mut pinfo = find_patches(&tm, &topo);
        let mut cinfo = find_cells(&tm, &topo, &mut pinfo).unwrap_or_default();
        assert_eq!(cinfo.len(), 2);
        let c2 = cinfo.add_cell();
        cinfo.merge(c2, 0, &mut pinfo);
        cinfo.merge(1, c2, &mut pinfo);
        assert_eq!(cinfo.find(0), 1);
        assert_eq!(pinfo.patches[0].cell_above, 1);
        assert_eq!(pinfo.patches[0].cell_below, 1);
        assert!(patch_cell_graph_ok(&cinfo, &pinfo).is_ok());
    }

    #[test]
    fn two_open_sheets_on_an_edge_make_two_cells() {
        // Two triangles hinged on edge 0-1 at a right angle, same orientation
        // of the hinge: space around the hinge splits in two.
        let tm = TriMesh::<f64>::from_soup(
            vec![
                Point3::new([0.0, 0.0, 0.0]),
                Point3::new([1.0, 0.0, 0.0]),
                Point3::new([0.0, 1.0, 0.0]),
                Point3::new([0.0, 0.0, 1.0]),
                Point3::new([0.0, -1.0, 0.0]),
            ],
            &[[0, 1, 2], [1, 0, 3], [1, 0, 4]],
        );
        let topo = TriMeshTopology::new(&tm);
        let mut pinfo = find_patches(&tm, &topo);
        assert_eq!(pinfo.len(), 3);
        let cinfo = find_cells(&tm, &topo, &mut pinfo).unwrap_or_default();
        assert_eq!(cinfo.len(), 3);
        assert!(patch_cell_graph_ok(&cinfo, &pinfo).is_ok());
        for p in &pinfo.patches {
            assert_ne!(p.cell_above, p.cell_below);
        }
    }
}
