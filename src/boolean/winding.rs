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

//! Winding numbers of cells and the Boolean operation applied to them.

use std::collections::VecDeque;

use tracing::debug;

use crate::{
    boolean::{BoolOpType, cell::CellsInfo, patch::PatchesInfo},
    mesh::{topology::TriMeshTopology, trimesh::TriMesh},
    numeric::scalar::Scalar,
};

/// Whether a point with the given per-shape winding numbers is in the
/// result of `op`.
pub fn apply_bool_op(op: BoolOpType, winding: &[i32]) -> bool {
    match op {
        BoolOpType::None => false,
        BoolOpType::Intersect => winding.iter().all(|&w| w != 0),
        BoolOpType::Union => winding.iter().any(|&w| w != 0),
        BoolOpType::Difference => match winding.split_first() {
            Some((&w0, rest)) => w0 != 0 && rest.iter().all(|&w| w == 0),
            None => false,
        },
    }
}

/// Piecewise constant winding number: every edge has an even number of
/// triangles, and the triangles using it forwards balance those using it
/// backwards.
pub fn is_pwn<T: Scalar>(tm: &TriMesh<T>, topo: &TriMeshTopology) -> bool {
    topo.edges().all(|(e, tris)| {
        if tris.len() % 2 == 1 {
            return false;
        }
        let tot_orient: i32 = tris
            .iter()
            .map(|&t| {
                let v = tm.tris[t].v;
                let forward = (0..3).any(|i| v[i] == e.v0() && v[(i + 1) % 3] == e.v1());
                if forward { 1 } else { -1 }
            })
            .sum();
        tot_orient == 0
    })
}

/// Breadth-first from the ambient cell, setting each neighbouring cell's
/// winding from the cell it is reached from and the patch crossed, then
/// deciding membership in the output volume.
pub fn propagate_windings_and_in_output_volume<T: Scalar, F>(
    pinfo: &PatchesInfo,
    cinfo: &mut CellsInfo,
    c_ambient: usize,
    op: BoolOpType,
    nshapes: usize,
    shape_fn: F,
    tm: &TriMesh<T>,
) where
    F: Fn(usize) -> usize,
{
    let ambient = &mut cinfo.cells[c_ambient];
    ambient.winding = vec![0; nshapes];
    ambient.winding_assigned = true;
    ambient.in_output_volume = apply_bool_op(op, &ambient.winding);

    let mut queue = VecDeque::from([c_ambient]);
    let mut assigned = 1usize;
    while let Some(c) = queue.pop_front() {
        let patches: Vec<usize> = cinfo.cells[c].patches.iter().copied().collect();
        for p in patches {
            let patch = &pinfo.patches[p];
            let p_above_c = patch.cell_below == c;
            let c_neighbor = if p_above_c {
                patch.cell_above
            } else {
                patch.cell_below
            };
            if cinfo.cells[c_neighbor].winding_assigned {
                continue;
            }
            let winding_delta = if p_above_c { -1 } else { 1 };
            let shape = shape_fn(tm.tris[patch.tris[0]].orig);
            let mut winding = cinfo.cells[c].winding.clone();
            if let Some(w) = winding.get_mut(shape) {
                *w += winding_delta;
            }
            let neighbor = &mut cinfo.cells[c_neighbor];
            neighbor.in_output_volume = apply_bool_op(op, &winding);
            neighbor.winding = winding;
            neighbor.winding_assigned = true;
            assigned += 1;
            queue.push_back(c_neighbor);
        }
    }
    debug!(assigned, "propagate_windings_and_in_output_volume");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        boolean::{cell::find_cells, nesting::find_ambient_cell, patch::find_patches},
        geometry::point::Point3,
    };

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
    fn bool_ops_on_windings() {
        assert!(apply_bool_op(BoolOpType::Union, &[0, 1]));
        assert!(!apply_bool_op(BoolOpType::Union, &[0, 0]));
        assert!(apply_bool_op(BoolOpType::Intersect, &[1, 2]));
        assert!(!apply_bool_op(BoolOpType::Intersect, &[1, 0]));
        assert!(apply_bool_op(BoolOpType::Difference, &[1, 0, 0]));
        assert!(!apply_bool_op(BoolOpType::Difference, &[1, 0, 1]));
        assert!(!apply_bool_op(BoolOpType::Difference, &[0, 0]));
        assert!(apply_bool_op(BoolOpType::Difference, &[1]));
        assert!(!apply_bool_op(BoolOpType::None, &[1]));
    }

    #[test]
    fn closed_tetrahedron_is_pwn() {
        let tm = tetra();
        assert!(is_pwn(&tm, &TriMeshTopology::new(&tm)));
        let open = tm.with_tris(tm.tris[..3].to_vec());
        assert!(!is_pwn(&open, &TriMeshTopology::new(&open)));
        let mut bad = tm.clone();
        bad.tris[0] = bad.tris[0].flipped();
        assert!(!is_pwn(&bad, &TriMeshTopology::new(&bad)));
    }

    #[test]
    fn inside_of_tetrahedron_has_winding_one() {
        let tm = tetra();
        let topo = TriMeshTopology::new(&tm);
        let mut pinfo = find_patches(&tm, &topo);
        let mut cinfo = find_cells(&tm, &topo, &mut pinfo).unwrap_or_default();
        cinfo.init_windings(1);
        let ambient = find_ambient_cell(&tm, None, &topo, &pinfo).unwrap_or(usize::MAX);
        assert_eq!(ambient, pinfo.patches[0].cell_above);
        propagate_windings_and_in_output_volume(
            &pinfo,
            &mut cinfo,
            ambient,
            BoolOpType::Union,
            1,
            |_| 0,
            &tm,
        );
        let inner = pinfo.patches[0].cell_below;
        assert_eq!(cinfo.cells[inner].winding, vec![1]);
        assert!(cinfo.cells[inner].in_output_volume);
        assert!(!cinfo.cells[ambient].in_output_volume);
    }
}
