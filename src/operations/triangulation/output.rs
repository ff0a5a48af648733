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

//! Output preparation: hole detection, edge removal policies and the final
//! renumbering into a [`CdtResult`].

use std::sync::atomic::{AtomicI32, Ordering};

use rayon::prelude::*;
use tracing::trace;

use crate::{
    geometry::{
        fat_co::FatCo2,
        point::Point2,
        segment::{IsectKind, isect_seg_seg},
    },
    kernel::filtered::orient2d,
    numeric::scalar::Scalar,
    operations::triangulation::{
        CdtInput, CdtOutputType, CdtResult, CdtState, FillRule,
        arrangement::{CdtArrangement, NONE, edge_of, sym},
    },
};

/// Far point for hole-detection rays, chosen to avoid hitting vertices or
/// running along edges of typical input.
const RAY_END: (i32, i32) = (123456, 654321);

pub fn prepare_cdt_for_output<T: Scalar>(
    state: &mut CdtState<T>,
    input: &CdtInput<T>,
    output_type: CdtOutputType,
    fill_rule: FillRule,
) {
    let cdt = &mut state.cdt;
    for f in cdt.faces.iter_mut() {
        f.symedge = NONE;
    }
    for e in 0..cdt.edges.len() {
        if cdt.is_deleted_edge(e) {
            continue;
        }
        for se in [2 * e, 2 * e + 1] {
            let f = cdt.face(se);
            if cdt.faces[f].symedge == NONE {
                cdt.faces[f].symedge = se;
            }
        }
    }

    match output_type {
        CdtOutputType::Full => {}
        CdtOutputType::Constraints => remove_non_constraint_edges(cdt),
        CdtOutputType::ConstraintsValidBmesh => remove_non_constraint_edges_leave_valid_bmesh(cdt),
        CdtOutputType::Inside => remove_outer_edges_until_constraints(cdt),
        CdtOutputType::InsideWithHoles => {
            detect_holes(state, input, fill_rule);
            remove_outer_edges_until_constraints(&mut state.cdt);
            remove_faces_in_holes(&mut state.cdt);
        }
        CdtOutputType::ConstraintsValidBmeshWithHoles => {
            detect_holes(state, input, fill_rule);
            remove_non_constraint_edges_leave_valid_bmesh(&mut state.cdt);
            remove_faces_in_holes(&mut state.cdt);
        }
    }
}

fn remove_non_constraint_edges<T: Scalar>(cdt: &mut CdtArrangement<T>) {
    for e in 0..cdt.edges.len() {
        if !cdt.is_deleted_edge(e) && !cdt.is_constrained_edge(e) {
            cdt.dissolve_symedge(2 * e);
        }
    }
}

/// Dissolve unconstrained edges, shortest first, skipping any whose removal
/// would leave a face touching itself along an edge or at a vertex.
fn remove_non_constraint_edges_leave_valid_bmesh<T: Scalar>(cdt: &mut CdtArrangement<T>) {
    let mut dissolvable: Vec<(f64, usize)> = (0..cdt.edges.len())
        .filter(|&e| !cdt.is_deleted_edge(e) && !cdt.is_constrained_edge(e))
        .map(|e| {
            let a = &cdt.co(cdt.vert(2 * e)).approx;
            let b = &cdt.co(cdt.vert(2 * e + 1)).approx;
            (crate::geometry::point::approx::distance_squared(a, b), e)
        })
        .collect();
    dissolvable.sort_by(|a, b| a.0.total_cmp(&b.0));

    for (_, e) in dissolvable {
        let se = 2 * e;
        let fleft = cdt.face(se);
        let fright = cdt.face(sym(se));
        let mut dissolve = true;
        if fleft != cdt.outer_face
            && fright != cdt.outer_face
            && (!cdt.faces[fleft].input_ids.is_empty() || !cdt.faces[fright].input_ids.is_empty())
        {
            let se_dest = cdt.vert(cdt.next(se));
            let mut se2 = cdt.next(se);
            while dissolve && se2 != se {
                if cdt.face(sym(se2)) == fright
                    || (cdt.vert(se2) != se_dest && cdt.vert_touches_face(cdt.vert(se2), fright))
                {
                    dissolve = false;
                }
                se2 = cdt.next(se2);
            }
        }
        if dissolve {
            cdt.dissolve_symedge(se);
        }
    }
}

/// Peel away faces reachable from the outer face without crossing a
/// constrained edge.
fn remove_outer_edges_until_constraints<T: Scalar>(cdt: &mut CdtArrangement<T>) {
    let outer = cdt.outer_face;
    let se_start = cdt.faces[outer].symedge;
    if se_start == NONE {
        return;
    }
    let epoch = cdt.next_epoch();
    cdt.faces[outer].visit = epoch;

    let mut fstack = Vec::new();
    for se in cdt.face_loop(se_start) {
        if !cdt.is_constrained_edge(edge_of(se)) {
            let fsym = cdt.face(sym(se));
            if cdt.faces[fsym].visit != epoch {
                fstack.push(fsym);
            }
        }
    }

    while let Some(f) = fstack.pop() {
        if cdt.faces[f].visit == epoch || cdt.faces[f].deleted {
            continue;
        }
        cdt.faces[f].visit = epoch;
        let mut to_dissolve = Vec::new();
        for se in cdt.face_loop(cdt.faces[f].symedge) {
            if cdt.is_constrained_edge(edge_of(se)) {
                continue;
            }
            let fsym = cdt.face(sym(se));
            if cdt.faces[fsym].visit == epoch {
                to_dissolve.push(se);
            } else {
                fstack.push(fsym);
            }
        }
        for se in to_dissolve.into_iter().rev() {
            if cdt.next(se) != NONE {
                cdt.dissolve_symedge(se);
            }
        }
    }
}

/// Flood-fill faces into regions joined by unconstrained edges and decide
/// per region, by casting a ray to a far point, whether it is a hole.
fn detect_holes<T: Scalar>(state: &mut CdtState<T>, input: &CdtInput<T>, fill_rule: FillRule) {
    let cdt = &mut state.cdt;
    let nfaces = cdt.faces.len();
    let mut region: Vec<Option<usize>> = vec![None; nfaces];
    let mut region_rep_face = Vec::new();
    for start in 0..nfaces {
        if start == cdt.outer_face
            || cdt.faces[start].deleted
            || cdt.faces[start].symedge == NONE
            || region[start].is_some()
        {
            continue;
        }
        let cur_region = region_rep_face.len();
        region_rep_face.push(start);
        let mut fstack = vec![start];
        while let Some(f) = fstack.pop() {
            if region[f].is_some() {
                continue;
            }
            region[f] = Some(cur_region);
            for se in cdt.face_loop(cdt.faces[f].symedge) {
                if cdt.is_constrained_edge(edge_of(se)) {
                    continue;
                }
                let fsym = cdt.face(sym(se));
                if fsym != cdt.outer_face && !cdt.faces[fsym].deleted && region[fsym].is_none() {
                    fstack.push(fsym);
                }
            }
        }
    }
    trace!(regions = region_rep_face.len(), ?fill_rule, "hole detection");

    let ray_end = Point2::<T>::from_ints([RAY_END.0, RAY_END.1]);
    let offset = state.face_edge_offset;
    let cdt_ref: &CdtArrangement<T> = cdt;
    let region_ref = &region;
    let holes: Vec<bool> = region_rep_face
        .iter()
        .map(|&f| {
            let se = cdt_ref.faces[f].symedge;
            let a = &cdt_ref.co(cdt_ref.vert(se)).exact;
            let b = &cdt_ref.co(cdt_ref.vert(cdt_ref.next(se))).exact;
            let c = &cdt_ref.co(cdt_ref.vert(cdt_ref.next(cdt_ref.next(se)))).exact;
            let third = T::from_num_den(1, 3);
            let mid = FatCo2::new(a.add(b).add(c).scale(&third));

            let hits = AtomicI32::new(0);
            (0..cdt_ref.edges.len()).into_par_iter().for_each(|e| {
                if cdt_ref.is_deleted_edge(e) || !cdt_ref.is_constrained_edge(e) {
                    return;
                }
                let r0 = region_of(cdt_ref, region_ref, 2 * e);
                let r1 = region_of(cdt_ref, region_ref, 2 * e + 1);
                if r0 == r1 {
                    return;
                }
                let isect = isect_seg_seg(
                    &ray_end,
                    &mid.exact,
                    &cdt_ref.co(cdt_ref.vert(2 * e)).exact,
                    &cdt_ref.co(cdt_ref.vert(2 * e + 1)).exact,
                );
                if isect.kind != IsectKind::Cross {
                    return;
                }
                let delta = match fill_rule {
                    FillRule::EvenOdd => 1,
                    FillRule::NonZero => {
                        winding_contribution(cdt_ref, &cdt_ref.edges[e].input_ids, offset, input, &mid)
                    }
                };
                hits.fetch_add(delta, Ordering::Relaxed);
            });
            let hits = hits.load(Ordering::Relaxed);
            match fill_rule {
                FillRule::EvenOdd => hits % 2 == 0,
                FillRule::NonZero => hits == 0,
            }
        })
        .collect();

    for (f, r) in region.iter().enumerate() {
        if let Some(r) = r {
            cdt.faces[f].hole = holes[*r];
        }
    }
}

fn region_of<T: Scalar>(cdt: &CdtArrangement<T>, region: &[Option<usize>], se: usize) -> Option<usize> {
    let f = cdt.face(se);
    if f == cdt.outer_face { None } else { region[f] }
}

/// Signed crossing count of a ray from `origin` across an arrangement edge:
/// +1 for every input face boundary edge carried by it that has `origin` on
/// its left, -1 for every one with `origin` on its right.
fn winding_contribution<T: Scalar>(
    cdt: &CdtArrangement<T>,
    ids: &[usize],
    offset: usize,
    input: &CdtInput<T>,
    origin: &FatCo2<T>,
) -> i32 {
    let mut total = 0;
    for &id in ids {
        if offset == 0 || id < offset {
            continue;
        }
        let f = id / offset - 1;
        let k = id % offset;
        let Some(face) = input.face.get(f) else {
            continue;
        };
        if k >= face.len() {
            continue;
        }
        let (a, b) = (face[k], face[(k + 1) % face.len()]);
        if a >= cdt.verts.len() || b >= cdt.verts.len() {
            continue;
        }
        total += orient2d(cdt.co(a), cdt.co(b), origin);
    }
    total
}

fn remove_faces_in_holes<T: Scalar>(cdt: &mut CdtArrangement<T>) {
    let mut doomed = Vec::new();
    for f in 0..cdt.faces.len() {
        if cdt.faces[f].deleted || !cdt.faces[f].hole || cdt.faces[f].symedge == NONE {
            continue;
        }
        for se in cdt.face_loop(cdt.faces[f].symedge) {
            let e = edge_of(se);
            if !cdt.is_deleted_edge(e) && !cdt.is_constrained_edge(e) {
                doomed.push(e);
            }
        }
        cdt.faces[f].deleted = true;
    }
    for e in doomed {
        for se in [2 * e, 2 * e + 1] {
            cdt.symedges[se].next = NONE;
            cdt.symedges[se].rot = NONE;
        }
    }
}

/// Renumber surviving vertices, edges and faces into a [`CdtResult`].
pub fn get_cdt_output<T: Scalar>(state: &CdtState<T>) -> CdtResult<T> {
    let cdt = &state.cdt;
    let mut result = CdtResult {
        face_edge_offset: state.face_edge_offset,
        ..CdtResult::default()
    };

    let mut vert_to_output = vec![NONE; cdt.verts.len()];
    let mut nv = 0;
    for (i, v) in cdt.verts.iter().enumerate() {
        if v.merge_to_index.is_none() {
            vert_to_output[i] = nv;
            nv += 1;
        }
    }
    if nv == 0 {
        return result;
    }
    let mut vert_ids: Vec<Vec<usize>> = vec![Vec::new(); nv];
    for (i, v) in cdt.verts.iter().enumerate() {
        let target = v.merge_to_index.unwrap_or(i);
        vert_to_output[i] = vert_to_output[target];
        if v.merge_to_index.is_none() {
            result.vert.push(v.co.exact.clone());
        }
    }
    // Merged vertices contribute their ids after the target's own.
    for (i, v) in cdt.verts.iter().enumerate() {
        if v.merge_to_index.is_none() {
            vert_ids[vert_to_output[i]].extend(v.input_ids.iter().copied());
        }
    }
    for (i, v) in cdt.verts.iter().enumerate() {
        if v.merge_to_index.is_some() {
            let ids = &mut vert_ids[vert_to_output[i]];
            for &id in &v.input_ids {
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
        }
    }

    for e in 0..cdt.edges.len() {
        if cdt.is_deleted_edge(e) {
            continue;
        }
        let v1 = vert_to_output[cdt.vert(2 * e)];
        let v2 = vert_to_output[cdt.vert(2 * e + 1)];
        result.edge.push((v1, v2));
        if state.need_ids {
            result.edge_orig.push(cdt.edges[e].input_ids.to_vec());
        }
    }

    for (fi, f) in cdt.faces.iter().enumerate() {
        if f.deleted || fi == cdt.outer_face || f.symedge == NONE {
            continue;
        }
        let verts: Vec<usize> = cdt
            .face_loop(f.symedge)
            .map(|se| vert_to_output[cdt.vert(se)])
            .collect();
        result.face.push(verts);
        if state.need_ids {
            result.face_orig.push(f.input_ids.to_vec());
        }
    }

    if state.need_ids {
        result.vert_orig = vert_ids;
    }
    result
}
