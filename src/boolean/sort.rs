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

//! Angular ordering of the triangles around a shared edge.

use crate::{
    geometry::fat_co::FatCo3,
    kernel::filtered::orient3d,
    mesh::{topology::Edge, trimesh::TriMesh},
    numeric::scalar::Scalar,
};

/// Index standing for the probe triangle in a sort that includes one.
pub const EXTRA_TRI: usize = usize::MAX;
/// Vertex index of the probe point inside the probe triangle.
pub const DUMMY_VERT: usize = usize::MAX;

/// A triangle `[e.v0, e.v1, DUMMY_VERT]` that is not part of the mesh,
/// used to locate a point among the triangles around `e`.
pub struct ExtraTri<T: Scalar> {
    pub v: [usize; 3],
    pub dummy: FatCo3<T>,
}

impl<T: Scalar> ExtraTri<T> {
    pub fn on_edge(e: Edge, dummy: FatCo3<T>) -> Self {
        ExtraTri {
            v: [e.v0(), e.v1(), DUMMY_VERT],
            dummy,
        }
    }
}

struct FanCtx<'a, T: Scalar> {
    tm: &'a TriMesh<T>,
    extra: Option<&'a ExtraTri<T>>,
}

impl<'a, T: Scalar> FanCtx<'a, T> {
    fn verts(&self, t: usize) -> [usize; 3] {
        match self.extra {
            Some(x) if t == EXTRA_TRI => x.v,
            _ => self.tm.tris[t].v,
        }
    }

    fn co(&self, v: usize) -> &'a FatCo3<T> {
        match self.extra {
            Some(x) if v == DUMMY_VERT => &x.dummy,
            _ => &self.tm.verts[v].co,
        }
    }
}

/// The vertex of `tri` not on `e`, and whether `tri` runs along `e` from
/// `e.v1()` to `e.v0()`. `None` when `e` is not an edge of `tri`.
pub fn find_flap_vert(tri: &[usize; 3], e: Edge) -> Option<(usize, bool)> {
    for i in 0..3 {
        let a = tri[i];
        let b = tri[(i + 1) % 3];
        let flap = tri[(i + 2) % 3];
        if a == e.v0() && b == e.v1() {
            return Some((flap, false));
        }
        if a == e.v1() && b == e.v0() {
            return Some((flap, true));
        }
    }
    None
}

/// Classify `t` against reference `t0`, both on edge `e`:
/// 1 coplanar on the same side of `e`, 2 coplanar on the opposite side,
/// 3 below the plane of `t0`, 4 above it. Above and below follow `t0`
/// taken with `e` in its forward direction.
fn sort_tris_class<T: Scalar>(ctx: &FanCtx<'_, T>, t: usize, t0: usize, e: Edge) -> usize {
    let tri0 = ctx.verts(t0);
    let tri = ctx.verts(t);
    let (flap0, rev0) = find_flap_vert(&tri0, e).unwrap_or((tri0[2], false));
    let (flap, _) = find_flap_vert(&tri, e).unwrap_or((tri[2], false));
    let orient = orient3d(
        ctx.co(tri0[0]),
        ctx.co(tri0[1]),
        ctx.co(tri0[2]),
        ctx.co(flap),
    );
    match orient {
        o if o > 0 => {
            if rev0 {
                4
            } else {
                3
            }
        }
        o if o < 0 => {
            if rev0 {
                3
            } else {
                4
            }
        }
        _ => {
            if flap == flap0 {
                1
            } else {
                2
            }
        }
    }
}

/// Coplanar duplicates are ordered by triangle index, negated for those
/// running backwards along `e`, so every edge of a stack sees the stack in
/// the same order.
fn sort_by_signed_triangle_index<T: Scalar>(g: &mut [usize], e: Edge, ctx: &FanCtx<'_, T>) {
    g.sort_by_key(|&t| {
        let rev = find_flap_vert(&ctx.verts(t), e).is_some_and(|(_, rev)| rev);
        let t = t as i128;
        if rev { -t } else { t }
    });
}

fn sort_rec<T: Scalar>(ctx: &FanCtx<'_, T>, e: Edge, tris: &[usize], t0: usize) -> Vec<usize> {
    let Some(&tref) = tris.first() else {
        return Vec::new();
    };
    let mut groups: [Vec<usize>; 4] = [vec![tref], Vec::new(), Vec::new(), Vec::new()];
    for &t in &tris[1..] {
        let class = sort_tris_class(ctx, t, tref, e);
        groups[class - 1].push(t);
    }
    let [mut g1, mut g2, g3, g4] = groups;
    if g1.len() > 1 {
        sort_by_signed_triangle_index(&mut g1, e, ctx);
    }
    if g2.len() > 1 {
        sort_by_signed_triangle_index(&mut g2, e, ctx);
    }
    let g3 = if g3.len() > 1 { sort_rec(ctx, e, &g3, t0) } else { g3 };
    let g4 = if g4.len() > 1 { sort_rec(ctx, e, &g4, t0) } else { g4 };

    let mut ans = Vec::with_capacity(tris.len());
    if tref == t0 {
        ans.extend(g1);
        ans.extend(g4);
        ans.extend(g2);
        ans.extend(g3);
    } else {
        ans.extend(g3);
        ans.extend(g1);
        ans.extend(g4);
        ans.extend(g2);
    }
    ans
}

/// Sort `tris`, which all contain `e`, clockwise as seen looking down `e`
/// from `e.v0()` to `e.v1()`, starting at `t0`. `EXTRA_TRI` in `tris`
/// refers to `extra`.
pub fn sort_tris_around_edge<T: Scalar>(
    tm: &TriMesh<T>,
    e: Edge,
    tris: &[usize],
    t0: usize,
    extra: Option<&ExtraTri<T>>,
) -> Vec<usize> {
    let ctx = FanCtx { tm, extra };
    sort_rec(&ctx, e, tris, t0)
}
