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

//! Constrained edge and face insertion.

use tracing::{debug, warn};

use crate::{
    error::{GeokernError, GeokernResult},
    geometry::{
        fat_co::FatCo2,
        point::approx,
        segment::{IsectKind, isect_seg_seg},
    },
    kernel::filtered::{in_line, incircle, orient2d},
    numeric::scalar::Scalar,
    operations::triangulation::{
        CdtInput, CdtState,
        arrangement::{CdtArrangement, NONE, add_to_ids, edge_of, sym},
    },
};

/// Walks longer than this are treated as a broken arrangement.
pub const CROSSING_LIMIT: usize = 100_000;

/// One step of the walk along a constraint segment.
///
/// With `lambda == 0` the walk passes through `vert`; `in_se` is a symedge
/// leaving `vert` in the face the walk arrives from and `out_se` one leaving
/// it in the face the walk departs into. Otherwise the walk crosses the edge
/// of `in_se` at `lambda` from `in_se.vert`, coming from `in_se.face`.
#[derive(Clone, Debug)]
struct CrossData<T: Scalar> {
    lambda: T,
    vert: usize,
    in_se: usize,
    out_se: usize,
    deleted: bool,
}

impl<T: Scalar> CrossData<T> {
    fn through_vert(vert: usize, in_se: usize) -> Self {
        CrossData {
            lambda: T::zero(),
            vert,
            in_se,
            out_se: NONE,
            deleted: false,
        }
    }

    fn across_edge(lambda: T, in_se: usize) -> Self {
        CrossData {
            lambda,
            vert: NONE,
            in_se,
            out_se: NONE,
            deleted: false,
        }
    }

    #[inline]
    fn is_vert(&self) -> bool {
        self.lambda.is_zero()
    }
}

fn fill_crossdata_for_through_vert<T: Scalar>(
    cdt: &CdtArrangement<T>,
    v: usize,
    cd_out: usize,
    cd: &mut CrossData<T>,
) -> CrossData<T> {
    if cd.is_vert() {
        cd.out_se = cd_out;
        return CrossData::through_vert(v, NONE);
    }
    // One of the edges of the triangle beyond the crossed edge starts at v.
    let mut se = sym(cd.in_se);
    if cdt.vert(se) != v {
        se = cdt.next(se);
        if cdt.vert(se) != v {
            se = cdt.next(se);
        }
    }
    debug_assert_eq!(cdt.vert(se), v);
    CrossData::through_vert(v, se)
}

/// The segment `curco -> v2` leaves the triangle of `t` through the edge of
/// `t`, which runs from `va` to `vb`; `vc` is the triangle's third vertex.
fn fill_crossdata_for_intersect<T: Scalar>(
    cdt: &CdtArrangement<T>,
    curco: &FatCo2<T>,
    v2: usize,
    t: usize,
    cd: &mut CrossData<T>,
    epsilon: &T,
) -> CrossData<T> {
    let va = cdt.vert(t);
    let vb = cdt.vert(cdt.next(t));
    let se_vcvb = sym(cdt.next(t));
    let se_vcva = cdt.next(cdt.next(t));
    let isect = isect_seg_seg(
        &cdt.co(va).exact,
        &cdt.co(vb).exact,
        &curco.exact,
        &cdt.co(v2).exact,
    );
    let lambda = isect.lambda;
    let crossing = |lambda: T, cd: &mut CrossData<T>| {
        if cd.is_vert() {
            cd.out_se = se_vcva;
        }
        CrossData::across_edge(lambda, t)
    };
    match isect.kind {
        IsectKind::Cross => {
            if !T::IS_EXACT {
                let len_ab = approx::distance_squared(&cdt.co(va).approx, &cdt.co(vb).approx).sqrt();
                let lam = lambda.to_f64();
                let eps = epsilon.to_f64();
                if lam * len_ab <= eps {
                    return fill_crossdata_for_through_vert(cdt, va, se_vcva, cd);
                }
                if (1.0 - lam) * len_ab <= eps {
                    return fill_crossdata_for_through_vert(cdt, vb, se_vcvb, cd);
                }
            }
            crossing(lambda, cd)
        }
        IsectKind::Exact => {
            if lambda.is_zero() {
                fill_crossdata_for_through_vert(cdt, va, se_vcva, cd)
            } else if lambda == T::one() {
                fill_crossdata_for_through_vert(cdt, vb, se_vcvb, cd)
            } else {
                crossing(lambda, cd)
            }
        }
        IsectKind::None => {
            // Only reachable through rounding: snap to the nearer end.
            debug_assert!(!T::IS_EXACT);
            if lambda <= T::from_num_den(1, 2) {
                fill_crossdata_for_through_vert(cdt, va, se_vcva, cd)
            } else {
                fill_crossdata_for_through_vert(cdt, vb, se_vcvb, cd)
            }
        }
        IsectKind::Colinear => {
            let v2co = &cdt.co(v2).approx;
            if approx::distance_squared(&cdt.co(va).approx, v2co)
                <= approx::distance_squared(&cdt.co(vb).approx, v2co)
            {
                fill_crossdata_for_through_vert(cdt, va, se_vcva, cd)
            } else {
                fill_crossdata_for_through_vert(cdt, vb, se_vcvb, cd)
            }
        }
    }
}

/// From vertex `cd.vert`, find where the segment to `v2` goes next by
/// rotating through the fan of edges around the vertex.
fn get_next_crossing_from_vert<T: Scalar>(
    cdt: &CdtArrangement<T>,
    cd: &mut CrossData<T>,
    v2: usize,
    epsilon: &T,
) -> Option<CrossData<T>> {
    let vcur = cd.vert;
    let tstart = cdt.verts[vcur].symedge;
    if tstart == NONE {
        return None;
    }
    let mut t = tstart;
    loop {
        let va = cdt.vert(cdt.next(t));
        let vb = cdt.vert(cdt.next(cdt.next(t)));
        let orient1 = orient2d(cdt.co(vcur), cdt.co(va), cdt.co(v2));
        if orient1 == 0 && in_line(cdt.co(vcur), cdt.co(va), cdt.co(v2)) {
            return Some(fill_crossdata_for_through_vert(cdt, va, t, cd));
        }
        if cdt.face(t) != cdt.outer_face {
            // The orient2 == 0 case is picked up by the next rotation.
            let orient2 = orient2d(cdt.co(vcur), cdt.co(vb), cdt.co(v2));
            if orient1 > 0 && orient2 < 0 {
                let crossed = cdt.next(t);
                let curco = cdt.co(vcur).clone();
                return Some(fill_crossdata_for_intersect(
                    cdt, &curco, v2, crossed, cd, epsilon,
                ));
            }
        }
        t = cdt.rot(t);
        if t == tstart {
            return None;
        }
    }
}

/// From a point inside the edge of `cd.in_se`, find where the segment to
/// `v2` leaves the triangle beyond that edge.
fn get_next_crossing_from_edge<T: Scalar>(
    cdt: &CdtArrangement<T>,
    cd: &mut CrossData<T>,
    v2: usize,
    epsilon: &T,
) -> CrossData<T> {
    let va = cdt.vert(cd.in_se);
    let vb = cdt.vert(cdt.next(cd.in_se));
    let curco = FatCo2::new(cdt.co(va).exact.interpolate(&cdt.co(vb).exact, &cd.lambda));
    let se_ac = cdt.next(sym(cd.in_se));
    let vc = cdt.vert(cdt.next(se_ac));
    let orient = orient2d(&curco, cdt.co(v2), cdt.co(vc));
    if orient < 0 {
        fill_crossdata_for_intersect(cdt, &curco, v2, cdt.next(se_ac), cd, epsilon)
    } else if orient > 0 {
        fill_crossdata_for_intersect(cdt, &curco, v2, se_ac, cd, epsilon)
    } else {
        CrossData::through_vert(vc, cdt.next(se_ac))
    }
}

/// Restore the Delaunay property in the face left of `se`, a diagonal just
/// added, by fanning out triangles on `se` as a base.
pub fn re_delaunay_triangulate<T: Scalar>(cdt: &mut CdtArrangement<T>, se: usize) {
    if cdt.face(se) == cdt.outer_face || cdt.face(sym(se)) == cdt.outer_face {
        return;
    }
    if cdt.face_len(se) <= 3 {
        return;
    }
    let first = cdt.next(cdt.next(se));
    let a = cdt.vert(se);
    let b = cdt.vert(cdt.next(se));
    let mut c = cdt.vert(first);
    let mut cse = first;
    let mut ss = cdt.next(first);
    while ss != se {
        let v = cdt.vert(ss);
        if incircle(cdt.co(a), cdt.co(b), cdt.co(c), cdt.co(v)) > 0 {
            c = v;
            cse = ss;
        }
        ss = cdt.next(ss);
    }
    let ebc = (!cdt.exists_edge(b, c)).then(|| cdt.add_diagonal(cdt.next(se), cse));
    let eca = (!cdt.exists_edge(c, a)).then(|| cdt.add_diagonal(cse, se));
    if let Some(e) = ebc {
        re_delaunay_triangulate(cdt, 2 * e + 1);
    }
    if let Some(e) = eca {
        re_delaunay_triangulate(cdt, 2 * e + 1);
    }
}

/// Make a chain of edges from `v1` to `v2` tagged with `input_id`.
///
/// Returns the edges of the chain in order from `v1`.
pub fn add_edge_constraint<T: Scalar>(
    cdt: &mut CdtArrangement<T>,
    v1: usize,
    v2: usize,
    input_id: usize,
    epsilon: &T,
) -> GeokernResult<Vec<usize>> {
    if v1 == v2 {
        return Ok(Vec::new());
    }
    if let Some(t) = cdt.find_symedge_between_verts(v1, v2) {
        let e = edge_of(t);
        add_to_ids(&mut cdt.edges[e].input_ids, input_id);
        return Ok(vec![e]);
    }

    let walk_err = GeokernError::CrossingWalk { from: v1, to: v2 };
    let epoch = cdt.next_epoch();
    cdt.verts[v1].visit = epoch;
    let mut crossings: Vec<CrossData<T>> = vec![CrossData::through_vert(v1, NONE)];
    loop {
        let last = crossings.len() - 1;
        if crossings[last].is_vert() && crossings[last].vert == v2 {
            break;
        }
        if crossings.len() >= CROSSING_LIMIT {
            return Err(GeokernError::CrossingLimit {
                from: v1,
                to: v2,
                limit: CROSSING_LIMIT,
            });
        }
        let cd = &mut crossings[last];
        let next = if cd.is_vert() {
            get_next_crossing_from_vert(cdt, cd, v2, epsilon).ok_or(walk_err.clone())?
        } else {
            get_next_crossing_from_edge(cdt, cd, v2, epsilon)
        };
        if next.is_vert() {
            if cdt.verts[next.vert].visit == epoch {
                return Err(walk_err);
            }
            cdt.verts[next.vert].visit = epoch;
        }
        crossings.push(next);
    }

    // An edge crossing followed by a pass through one of that edge's own
    // endpoints is replaced by going straight to the endpoint. This can
    // chain backwards over several edge crossings.
    let ncrossings = crossings.len();
    for i in 2..ncrossings {
        if !crossings[i].is_vert() {
            continue;
        }
        let v = crossings[i].vert;
        let mut j = i - 1;
        while j > 0 {
            let cd_prev = &crossings[j];
            let keep = if cd_prev.is_vert() {
                cd_prev.vert != v
            } else {
                cdt.vert(cd_prev.in_se) != v && cdt.vert(cdt.next(cd_prev.in_se)) != v
            };
            if keep {
                break;
            }
            crossings[j].deleted = true;
            j -= 1;
        }
        if j < i - 1 {
            if crossings[j].is_vert() {
                let se = cdt
                    .find_symedge_between_verts(crossings[j].vert, v)
                    .ok_or(walk_err.clone())?;
                crossings[j].out_se = se;
                crossings[i].in_se = NONE;
            } else {
                let f = cdt.face(sym(crossings[j].in_se));
                let se = cdt.find_symedge_with_face(v, f).ok_or(walk_err.clone())?;
                crossings[i].in_se = se;
            }
        }
    }

    // Split crossed constrained edges, then drop the other crossed edges.
    for cd in crossings.iter_mut() {
        if !cd.deleted && !cd.is_vert() && cdt.is_constrained_edge(edge_of(cd.in_se)) {
            let e = cdt.split_edge(cd.in_se, &cd.lambda);
            cd.vert = cdt.vert(2 * e);
        }
    }
    for cd in &crossings {
        if !cd.deleted && !cd.is_vert() && !cdt.is_constrained_edge(edge_of(cd.in_se)) {
            cdt.delete_edge(cd.in_se);
        }
    }

    let mut r_edges = Vec::new();
    let mut tstart = crossings[0].out_se;
    for i in 1..ncrossings {
        let cd = &crossings[i];
        if cd.deleted {
            continue;
        }
        let mut t = NONE;
        let mut tnext = NONE;
        if !cd.is_vert() {
            if cdt.is_constrained_edge(edge_of(cd.in_se)) {
                t = cdt.verts[cd.vert].symedge;
                tnext = cdt.next(sym(t));
            }
        } else {
            t = cd.in_se;
            tnext = cd.out_se;
            if t == NONE {
                // The previous surviving crossing is a vertex already joined
                // to this one.
                let prev = crossings[..i]
                    .iter()
                    .rev()
                    .find(|c| !c.deleted)
                    .ok_or(walk_err.clone())?;
                debug_assert!(prev.is_vert());
                let e = edge_of(prev.out_se);
                add_to_ids(&mut cdt.edges[e].input_ids, input_id);
                r_edges.push(e);
            }
        }
        if t != NONE {
            let e = if cdt.vert(cdt.next(tstart)) == cdt.vert(t) {
                edge_of(tstart)
            } else {
                cdt.add_diagonal(tstart, t)
            };
            add_to_ids(&mut cdt.edges[e].input_ids, input_id);
            r_edges.push(e);
            re_delaunay_triangulate(cdt, 2 * e);
            re_delaunay_triangulate(cdt, 2 * e + 1);
        }
        if i < ncrossings - 1 && tnext != NONE {
            tstart = tnext;
        }
    }
    Ok(r_edges)
}

pub fn add_edge_constraints<T: Scalar>(state: &mut CdtState<T>, input: &CdtInput<T>) {
    let nv = input.vert.len();
    for (i, &(iv1, iv2)) in input.edge.iter().enumerate() {
        if iv1 >= nv || iv2 >= nv {
            debug!(edge = i, "skipping edge with out-of-range vertex");
            continue;
        }
        let v1 = state.cdt.resolve_merge(iv1);
        let v2 = state.cdt.resolve_merge(iv2);
        if let Err(err) = add_edge_constraint(&mut state.cdt, v1, v2, i, &state.epsilon) {
            warn!(edge = i, %err, "dropping edge constraint");
        }
    }
    state.face_edge_offset = input.edge.len();
}

/// Smallest power of ten that is at least `x` (and at least 1).
pub fn power_of_10_greater_equal_to(x: usize) -> usize {
    let mut r = 1usize;
    while r < x {
        r *= 10;
    }
    r
}

/// Insert every input face boundary as constraints and tag the faces inside
/// each with its face id. Face edge `k` of face `f` gets id
/// `(f + 1) * face_edge_offset + k`.
pub fn add_face_constraints<T: Scalar>(state: &mut CdtState<T>, input: &CdtInput<T>) {
    let nv = input.vert.len();
    let maxflen = input.face.iter().map(Vec::len).max().unwrap_or(0);
    state.face_edge_offset = power_of_10_greater_equal_to(maxflen.max(state.face_edge_offset));
    for (f, face) in input.face.iter().enumerate() {
        let flen = face.len();
        if flen <= 2 {
            debug!(face = f, "skipping face with fewer than 3 vertices");
            continue;
        }
        let fedge_start = (f + 1) * state.face_edge_offset;
        let mut face_symedge0 = NONE;
        for i in 0..flen {
            let iv1 = face[i];
            let iv2 = face[(i + 1) % flen];
            if iv1 >= nv || iv2 >= nv {
                debug!(face = f, edge = i, "skipping face edge with out-of-range vertex");
                continue;
            }
            let v1 = state.cdt.resolve_merge(iv1);
            let v2 = state.cdt.resolve_merge(iv2);
            match add_edge_constraint(&mut state.cdt, v1, v2, fedge_start + i, &state.epsilon) {
                Ok(edges) => {
                    // Later splits may invalidate earlier choices, so keep the
                    // most recent one.
                    if let Some(&e) = edges.first() {
                        if state.cdt.vert(2 * e) == v1 {
                            face_symedge0 = 2 * e;
                        } else if state.cdt.vert(2 * e + 1) == v1 {
                            face_symedge0 = 2 * e + 1;
                        }
                    }
                }
                Err(err) => warn!(face = f, edge = i, %err, "dropping face edge constraint"),
            }
        }
        if face_symedge0 != NONE {
            let fedge_end = fedge_start + flen - 1;
            add_face_ids(&mut state.cdt, face_symedge0, f, fedge_start, fedge_end);
        }
    }
}

/// Flood fill from the face of `face_symedge`, tagging faces with `face_id`
/// without crossing edges whose ids fall in `fedge_start..=fedge_end`.
fn add_face_ids<T: Scalar>(
    cdt: &mut CdtArrangement<T>,
    face_symedge: usize,
    face_id: usize,
    fedge_start: usize,
    fedge_end: usize,
) {
    let epoch = cdt.next_epoch();
    let mut stack = vec![face_symedge];
    while let Some(se_start) = stack.pop() {
        let face = cdt.face(se_start);
        if cdt.faces[face].visit == epoch {
            continue;
        }
        cdt.faces[face].visit = epoch;
        add_to_ids(&mut cdt.faces[face].input_ids, face_id);
        let mut se = cdt.next(se_start);
        while se != se_start {
            let on_boundary = cdt.edges[edge_of(se)]
                .input_ids
                .iter()
                .any(|&id| (fedge_start..=fedge_end).contains(&id));
            if !on_boundary {
                let se_sym = sym(se);
                if cdt.faces[cdt.face(se_sym)].visit != epoch {
                    stack.push(se_sym);
                }
            }
            se = cdt.next(se);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        geometry::point::Point2, operations::triangulation::delaunay::initial_triangulation,
    };

    fn triangulated(coords: &[(i32, i32)]) -> CdtArrangement<rug::Rational> {
        let pts: Vec<Point2<rug::Rational>> =
            coords.iter().map(|&(x, y)| Point2::from_ints([x, y])).collect();
        let mut cdt = CdtArrangement::new(&pts);
        initial_triangulation(&mut cdt);
        cdt
    }

    fn chain_connects(cdt: &CdtArrangement<rug::Rational>, edges: &[usize], v1: usize, v2: usize) -> bool {
        let mut cur = v1;
        for &e in edges {
            let (a, b) = (cdt.vert(2 * e), cdt.vert(2 * e + 1));
            cur = if a == cur {
                b
            } else if b == cur {
                a
            } else {
                return false;
            };
        }
        cur == v2
    }

    #[test]
    fn existing_edge_is_tagged() {
        let mut cdt = triangulated(&[(0, 0), (4, 0), (0, 4)]);
        let zero = rug::Rational::new();
        let edges = add_edge_constraint(&mut cdt, 0, 1, 7, &zero).unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(cdt.edges[edges[0]].input_ids.as_slice(), &[7]);
    }

    #[test]
    fn constraint_crosses_diagonal() {
        // A thin diamond whose Delaunay diagonal is the short one.
        let mut cdt = triangulated(&[(0, 0), (10, -1), (20, 0), (10, 1)]);
        assert!(cdt.exists_edge(1, 3));
        let zero = rug::Rational::new();
        let edges = add_edge_constraint(&mut cdt, 0, 2, 0, &zero).unwrap();
        assert!(chain_connects(&cdt, &edges, 0, 2));
        assert!(cdt.exists_edge(0, 2));
        assert!(!cdt.exists_edge(1, 3));
    }

    #[test]
    fn crossing_constraints_split_each_other() {
        let mut cdt = triangulated(&[(0, 0), (4, 0), (4, 4), (0, 4)]);
        let zero = rug::Rational::new();
        add_edge_constraint(&mut cdt, 0, 2, 0, &zero).unwrap();
        let edges = add_edge_constraint(&mut cdt, 1, 3, 1, &zero).unwrap();
        assert_eq!(edges.len(), 2);
        assert!(chain_connects(&cdt, &edges, 1, 3));
        assert_eq!(cdt.verts.len(), 5);
        assert_eq!(cdt.verts[4].co.approx, [2.0, 2.0]);
        // Both halves of the first diagonal keep its id.
        let tagged0 = (0..cdt.edges.len())
            .filter(|&e| !cdt.is_deleted_edge(e) && cdt.edges[e].input_ids.contains(&0))
            .count();
        assert_eq!(tagged0, 2);
    }

    #[test]
    fn constraint_through_collinear_vertex() {
        let mut cdt = triangulated(&[(0, 0), (2, 0), (4, 0), (2, 3), (2, -3)]);
        let zero = rug::Rational::new();
        let edges = add_edge_constraint(&mut cdt, 0, 2, 5, &zero).unwrap();
        assert_eq!(edges.len(), 2);
        assert!(chain_connects(&cdt, &edges, 0, 2));
    }

    #[test]
    fn powers_of_ten() {
        assert_eq!(power_of_10_greater_equal_to(0), 1);
        assert_eq!(power_of_10_greater_equal_to(1), 1);
        assert_eq!(power_of_10_greater_equal_to(7), 10);
        assert_eq!(power_of_10_greater_equal_to(100), 100);
        assert_eq!(power_of_10_greater_equal_to(101), 1000);
    }
}
