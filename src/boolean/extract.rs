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

//! Output triangles: those separating an in-volume cell from an
//! out-of-volume one.

use tracing::trace;

use crate::{
    boolean::{cell::CellsInfo, patch::PatchesInfo},
    mesh::trimesh::{Tri, TriMesh},
    numeric::scalar::Scalar,
};

/// Keep every triangle whose two cells differ in output-volume membership,
/// oriented so that its normal points out of the output volume.
pub fn extract_from_in_output_volume_diffs<T: Scalar>(
    tm: &TriMesh<T>,
    pinfo: &PatchesInfo,
    cinfo: &CellsInfo,
) -> TriMesh<T> {
    let mut out_tris = Vec::with_capacity(tm.tris.len());
    let mut any_zero_volume_cell = false;
    for (t, tri) in tm.tris.iter().enumerate() {
        let patch = &pinfo.patches[pinfo.tri_patch(t)];
        let above = &cinfo.cells[patch.cell_above];
        let below = &cinfo.cells[patch.cell_below];
        if above.zero_volume || below.zero_volume {
            any_zero_volume_cell = true;
            continue;
        }
        if above.in_output_volume ^ below.in_output_volume {
            if above.in_output_volume {
                out_tris.push(tri.flipped());
            } else {
                out_tris.push(tri.clone());
            }
        }
    }
    if any_zero_volume_cell {
        extract_zero_volume_cell_tris(&mut out_tris, tm, pinfo, cinfo);
    }
    tm.with_tris(out_tris)
}

/// Coincident triangles are separated by zero-volume cells. Each stack of
/// them contributes at most one triangle, decided by the real cells above
/// and below the whole stack.
fn extract_zero_volume_cell_tris<T: Scalar>(
    out_tris: &mut Vec<Tri>,
    tm: &TriMesh<T>,
    pinfo: &PatchesInfo,
    cinfo: &CellsInfo,
) {
    let adj_to_zv: Vec<bool> = pinfo
        .patches
        .iter()
        .map(|p| cinfo.cells[p.cell_above].zero_volume || cinfo.cells[p.cell_below].zero_volume)
        .collect();
    let mut allocated_to_stack = vec![false; pinfo.len()];
    let mut nstacks = 0usize;
    for p in 0..pinfo.len() {
        if !adj_to_zv[p] || allocated_to_stack[p] {
            continue;
        }
        nstacks += 1;
        // p's own above/below define the stack's; `flipped` marks members
        // facing the other way.
        let mut stack = vec![p];
        let mut flipped = vec![false];
        allocated_to_stack[p] = true;

        let mut pwalk = p;
        let mut c = pinfo.patches[pwalk].cell_above;
        while cinfo.cells[c].zero_volume {
            let Some(pother) = cinfo.cells[c].patch_other(pwalk) else {
                break;
            };
            if allocated_to_stack[pother] {
                break;
            }
            let flip = pinfo.patches[pother].cell_above == c;
            flipped.push(flip);
            stack.push(pother);
            allocated_to_stack[pother] = true;
            pwalk = pother;
            let pp = &pinfo.patches[pwalk];
            c = if flip { pp.cell_below } else { pp.cell_above };
        }
        let above_stack_in = cinfo.cells[c].in_output_volume;

        pwalk = p;
        c = pinfo.patches[pwalk].cell_below;
        while cinfo.cells[c].zero_volume {
            let Some(pother) = cinfo.cells[c].patch_other(pwalk) else {
                break;
            };
            if allocated_to_stack[pother] {
                break;
            }
            let flip = pinfo.patches[pother].cell_below == c;
            flipped.push(flip);
            stack.push(pother);
            allocated_to_stack[pother] = true;
            pwalk = pother;
            let pp = &pinfo.patches[pwalk];
            c = if flip { pp.cell_above } else { pp.cell_below };
        }
        let below_stack_in = cinfo.cells[c].in_output_volume;

        if above_stack_in ^ below_stack_in {
            let need_flipped = above_stack_in;
            match stack
                .iter()
                .zip(&flipped)
                .find(|&(_, &f)| f == need_flipped)
            {
                Some((&ps, _)) => out_tris.push(tm.tris[pinfo.patches[ps].tris[0]].clone()),
                None => out_tris.push(tm.tris[pinfo.patches[p].tris[0]].flipped()),
            }
        }
    }
    trace!(stacks = nstacks, "extract_zero_volume_cell_tris");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        boolean::{cell::find_cells, patch::find_patches},
        geometry::point::Point3,
        mesh::topology::TriMeshTopology,
    };

    #[test]
    fn triangle_between_in_and_out_cells_is_kept_facing_out() {
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
        let (above, below) = (pinfo.patches[0].cell_above, pinfo.patches[0].cell_below);

        cinfo.cells[below].in_output_volume = true;
        let out = extract_from_in_output_volume_diffs(&tm, &pinfo, &cinfo);
        assert_eq!(out.tris, vec![tm.tris[0].clone()]);

        cinfo.cells[below].in_output_volume = false;
        cinfo.cells[above].in_output_volume = true;
        let out = extract_from_in_output_volume_diffs(&tm, &pinfo, &cinfo);
        assert_eq!(out.tris, vec![tm.tris[0].flipped()]);

        cinfo.cells[below].in_output_volume = true;
        let out = extract_from_in_output_volume_diffs(&tm, &pinfo, &cinfo);
        assert!(out.tris.is_empty());
    }
}
