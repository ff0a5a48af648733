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

use smallvec::SmallVec;

use crate::{
    geometry::{fat_co::FatCo2, point::Point2},
    numeric::scalar::Scalar,
};

/// Sentinel for an absent symedge, face or vertex link.
pub const NONE: usize = usize::MAX;

pub type IdList = SmallVec<[usize; 2]>;

/// One direction of an undirected edge.
///
/// Edge `e` owns symedges `2e` and `2e + 1`, so the opposite direction of
/// symedge `s` is always `s ^ 1`. `next` walks counter-clockwise around the
/// face on the left, `rot` rotates counter-clockwise around `vert`.
#[derive(Clone, Debug)]
pub struct SymEdge {
    pub next: usize,
    pub rot: usize,
    pub vert: usize,
    pub face: usize,
}

#[derive(Clone, Debug)]
pub struct CdtVert<T: Scalar> {
    pub co: FatCo2<T>,
    pub symedge: usize,
    pub input_ids: IdList,
    pub index: usize,
    /// Set when this vertex duplicates an earlier input vertex.
    pub merge_to_index: Option<usize>,
    pub visit: u32,
}

#[derive(Clone, Debug, Default)]
pub struct CdtEdge {
    pub input_ids: IdList,
}

#[derive(Clone, Debug)]
pub struct CdtFace {
    /// Only reliable after output preparation.
    pub symedge: usize,
    pub input_ids: IdList,
    pub visit: u32,
    pub deleted: bool,
    pub hole: bool,
}

impl Default for CdtFace {
    fn default() -> Self {
        CdtFace {
            symedge: NONE,
            input_ids: IdList::new(),
            visit: 0,
            deleted: false,
            hole: false,
        }
    }
}

/// Planar subdivision stored in index arenas.
///
/// Nothing is ever removed from the arenas. Deleted edges have both symedge
/// links set to [`NONE`], deleted faces carry the `deleted` flag and merged
/// vertices carry `merge_to_index`.
pub struct CdtArrangement<T: Scalar> {
    pub verts: Vec<CdtVert<T>>,
    pub symedges: Vec<SymEdge>,
    pub edges: Vec<CdtEdge>,
    pub faces: Vec<CdtFace>,
    pub outer_face: usize,
    epoch: u32,
}

#[inline]
pub fn sym(se: usize) -> usize {
    se ^ 1
}

#[inline]
pub fn edge_of(se: usize) -> usize {
    se >> 1
}

pub fn add_to_ids(ids: &mut IdList, id: usize) {
    if !ids.contains(&id) {
        ids.push(id);
    }
}

impl<T: Scalar> CdtArrangement<T> {
    pub fn new(points: &[Point2<T>]) -> Self {
        let mut cdt = CdtArrangement {
            verts: Vec::with_capacity(points.len()),
            symedges: Vec::with_capacity(points.len() * 6),
            edges: Vec::with_capacity(points.len() * 3),
            faces: Vec::with_capacity(points.len() * 2),
            outer_face: NONE,
            epoch: 0,
        };
        for (i, p) in points.iter().enumerate() {
            let v = cdt.add_vert(p.clone());
            cdt.verts[v].input_ids.push(i);
        }
        cdt.outer_face = cdt.add_face();
        cdt
    }

    /// Start a new traversal; entities stamped with an older epoch count as
    /// unvisited.
    pub fn next_epoch(&mut self) -> u32 {
        self.epoch += 1;
        self.epoch
    }

    #[inline]
    pub fn next(&self, se: usize) -> usize {
        self.symedges[se].next
    }

    #[inline]
    pub fn rot(&self, se: usize) -> usize {
        self.symedges[se].rot
    }

    #[inline]
    pub fn vert(&self, se: usize) -> usize {
        self.symedges[se].vert
    }

    #[inline]
    pub fn face(&self, se: usize) -> usize {
        self.symedges[se].face
    }

    /// The symedge whose `next` is `se`.
    #[inline]
    pub fn prev(&self, se: usize) -> usize {
        self.rot(self.next(self.rot(se)))
    }

    #[inline]
    pub fn co(&self, v: usize) -> &FatCo2<T> {
        &self.verts[v].co
    }

    pub fn is_deleted_edge(&self, e: usize) -> bool {
        self.symedges[2 * e].next == NONE
    }

    pub fn is_constrained_edge(&self, e: usize) -> bool {
        !self.edges[e].input_ids.is_empty()
    }

    pub fn is_border_edge(&self, e: usize) -> bool {
        self.symedges[2 * e].face == self.outer_face
            || self.symedges[2 * e + 1].face == self.outer_face
    }

    pub fn resolve_merge(&self, v: usize) -> usize {
        self.verts[v].merge_to_index.unwrap_or(v)
    }

    pub fn add_vert(&mut self, p: Point2<T>) -> usize {
        let index = self.verts.len();
        self.verts.push(CdtVert {
            co: FatCo2::new(p),
            symedge: NONE,
            input_ids: IdList::new(),
            index,
            merge_to_index: None,
            visit: 0,
        });
        index
    }

    pub fn add_face(&mut self) -> usize {
        self.faces.push(CdtFace::default());
        self.faces.len() - 1
    }

    /// New edge `v1 -> v2` with unlinked symedges. Vertices without a
    /// representative symedge adopt the new one.
    pub fn add_edge(&mut self, v1: usize, v2: usize, fleft: usize, fright: usize) -> usize {
        let e = self.edges.len();
        self.edges.push(CdtEdge::default());
        let se = self.symedges.len();
        self.symedges.push(SymEdge {
            next: NONE,
            rot: NONE,
            vert: v1,
            face: fleft,
        });
        self.symedges.push(SymEdge {
            next: NONE,
            rot: NONE,
            vert: v2,
            face: fright,
        });
        if self.verts[v1].symedge == NONE {
            self.verts[v1].symedge = se;
        }
        if self.verts[v2].symedge == NONE {
            self.verts[v2].symedge = se + 1;
        }
        e
    }

    /// Split the face of `s1` and `s2` with a new edge `s1.vert -> s2.vert`.
    /// The part starting at `s2` goes to a new face, to the left of the
    /// returned edge's first symedge.
    pub fn add_diagonal(&mut self, s1: usize, s2: usize) -> usize {
        let fold = self.face(s1);
        let fnew = self.add_face();
        let s1prev = self.prev(s1);
        let s1prevsym = sym(s1prev);
        let s2prev = self.prev(s2);
        let s2prevsym = sym(s2prev);
        let ediag = self.add_edge(self.vert(s1), self.vert(s2), fnew, fold);
        let sdiag = 2 * ediag;
        let sdiagsym = sdiag + 1;
        self.symedges[sdiag].next = s2;
        self.symedges[sdiagsym].next = s1;
        self.symedges[s2prev].next = sdiagsym;
        self.symedges[s1prev].next = sdiag;
        self.symedges[s1].rot = sdiag;
        self.symedges[sdiag].rot = s1prevsym;
        self.symedges[s2].rot = sdiagsym;
        self.symedges[sdiagsym].rot = s2prevsym;
        let mut se = s2;
        while se != sdiag {
            self.symedges[se].face = fnew;
            se = self.next(se);
        }
        let ids = self.faces[fold].input_ids.clone();
        self.faces[fnew].input_ids = ids;
        ediag
    }

    /// Attach isolated vertex `v` to the origin of `se` with a new edge
    /// `v -> se.vert` lying inside `se`'s face.
    pub fn add_vert_to_symedge_edge(&mut self, v: usize, se: usize) -> usize {
        let se_rot = self.rot(se);
        let se_rotsym = sym(se_rot);
        let f = self.face(se);
        let e = self.add_edge(v, self.vert(se), f, f);
        let new_se = 2 * e;
        let new_se_sym = new_se + 1;
        self.symedges[new_se].next = se;
        self.symedges[new_se_sym].next = new_se;
        self.symedges[new_se].rot = new_se;
        self.symedges[new_se_sym].rot = se_rot;
        self.symedges[se].rot = new_se_sym;
        self.symedges[se_rotsym].next = new_se_sym;
        e
    }

    /// Join two separate components through the outer face with an edge
    /// `se1.vert -> se2.vert`.
    pub fn connect_separate_parts(&mut self, se1: usize, se2: usize) -> usize {
        let outer = self.outer_face;
        let e = self.add_edge(self.vert(se1), self.vert(se2), outer, outer);
        let new_se = 2 * e;
        let new_se_sym = new_se + 1;
        let se1_rot = self.rot(se1);
        let se1_rotsym = sym(se1_rot);
        let se2_rot = self.rot(se2);
        let se2_rotsym = sym(se2_rot);
        self.symedges[new_se].next = se2;
        self.symedges[new_se_sym].next = se1;
        self.symedges[new_se].rot = se1_rot;
        self.symedges[new_se_sym].rot = se2_rot;
        self.symedges[se1].rot = new_se;
        self.symedges[se2].rot = new_se_sym;
        self.symedges[se1_rotsym].next = new_se;
        self.symedges[se2_rotsym].next = new_se_sym;
        e
    }

    /// Split the edge of `se` at parameter `lambda` from `se.vert`.
    /// Returns the new edge, which runs from the new vertex to the old
    /// `se.next.vert` and inherits the split edge's input ids.
    pub fn split_edge(&mut self, se: usize, lambda: &T) -> usize {
        let a = self.vert(se);
        let b = self.vert(self.next(se));
        let p = self.verts[a]
            .co
            .exact
            .interpolate(&self.verts[b].co.exact, lambda);
        let sesym = sym(se);
        let sesymprev = self.prev(sesym);
        let sesymprevsym = sym(sesymprev);
        let senext = self.next(se);
        let v = self.add_vert(p);
        let (fl, fr) = (self.face(se), self.face(sesym));
        let e = self.add_edge(v, b, fl, fr);
        self.symedges[sesym].vert = v;
        let newse = 2 * e;
        let newsesym = newse + 1;
        self.symedges[se].next = newse;
        self.symedges[newsesym].next = sesym;
        self.symedges[newse].next = senext;
        self.symedges[newse].rot = sesym;
        self.symedges[sesym].rot = newse;
        self.symedges[senext].rot = newsesym;
        self.symedges[newsesym].rot = sesymprevsym;
        self.symedges[sesymprev].next = newsesym;
        if self.verts[b].symedge == sesym {
            self.verts[b].symedge = newsesym;
        }
        let ids = self.edges[edge_of(se)].input_ids.clone();
        self.edges[e].input_ids = ids;
        e
    }

    /// Remove the edge of `se`, merging its two faces into `se.face` when
    /// they differ.
    pub fn delete_edge(&mut self, se: usize) {
        let sesym = sym(se);
        let v1 = self.vert(se);
        let v2 = self.vert(sesym);
        let aface = self.face(se);
        let bface = self.face(sesym);
        let f = self.next(se);
        let h = self.prev(se);
        let i = self.next(sesym);
        let j = self.prev(sesym);
        let jsym = sym(j);
        let hsym = sym(h);
        let v1_isolated = i == se;
        let v2_isolated = f == sesym;

        if !v1_isolated {
            self.symedges[h].next = i;
            self.symedges[i].rot = hsym;
        }
        if !v2_isolated {
            self.symedges[j].next = f;
            self.symedges[f].rot = jsym;
        }
        let merge_faces = !v1_isolated && !v2_isolated && aface != bface;
        if merge_faces {
            let mut k = i;
            while k != f {
                self.symedges[k].face = aface;
                k = self.next(k);
            }
        }

        if v1_isolated {
            self.verts[v1].symedge = NONE;
        } else if self.verts[v1].symedge == se {
            self.verts[v1].symedge = i;
        }
        if v2_isolated {
            self.verts[v2].symedge = NONE;
        } else if self.verts[v2].symedge == sesym {
            self.verts[v2].symedge = f;
        }

        for s in [se, sesym] {
            self.symedges[s].next = NONE;
            self.symedges[s].rot = NONE;
        }
        if merge_faces {
            self.faces[bface].deleted = true;
            if self.outer_face == bface {
                self.outer_face = aface;
            }
        }
    }

    /// Delete the edge of `se` keeping face representatives valid. When one
    /// side is the outer face, that side survives.
    pub fn dissolve_symedge(&mut self, se: usize) {
        let (se, symse) = if self.face(sym(se)) == self.outer_face {
            (sym(se), se)
        } else {
            (se, sym(se))
        };
        let f = self.next(se);
        let i = self.next(symse);
        let survivor = if f != symse {
            f
        } else if i != se {
            i
        } else {
            NONE
        };
        let aface = self.face(se);
        let bface = self.face(symse);
        for face in [aface, bface] {
            let rep = self.faces[face].symedge;
            if rep == se || rep == symse {
                self.faces[face].symedge = survivor;
            }
        }
        self.delete_edge(se);
    }

    /// The symedge from `v1` to `v2`, if they are joined.
    pub fn find_symedge_between_verts(&self, v1: usize, v2: usize) -> Option<usize> {
        let tstart = self.verts[v1].symedge;
        if tstart == NONE {
            return None;
        }
        let mut t = tstart;
        loop {
            if self.vert(self.next(t)) == v2 {
                return Some(t);
            }
            t = self.rot(t);
            if t == tstart {
                return None;
            }
        }
    }

    /// A symedge leaving `v` whose face is `f`.
    pub fn find_symedge_with_face(&self, v: usize, f: usize) -> Option<usize> {
        let tstart = self.verts[v].symedge;
        if tstart == NONE {
            return None;
        }
        let mut t = tstart;
        loop {
            if self.face(t) == f {
                return Some(t);
            }
            t = self.rot(t);
            if t == tstart {
                return None;
            }
        }
    }

    pub fn exists_edge(&self, v1: usize, v2: usize) -> bool {
        self.find_symedge_between_verts(v1, v2).is_some()
    }

    pub fn vert_touches_face(&self, v: usize, f: usize) -> bool {
        self.find_symedge_with_face(v, f).is_some()
    }

    pub fn face_len(&self, se: usize) -> usize {
        let mut count = 1;
        let mut ss = self.next(se);
        while ss != se {
            count += 1;
            ss = self.next(ss);
        }
        count
    }

    /// Iterate the symedges of the face loop starting at `se`.
    pub fn face_loop(&self, se: usize) -> FaceLoop<'_, T> {
        FaceLoop {
            cdt: self,
            start: se,
            cur: se,
            done: se == NONE,
        }
    }
}

pub struct FaceLoop<'a, T: Scalar> {
    cdt: &'a CdtArrangement<T>,
    start: usize,
    cur: usize,
    done: bool,
}

impl<T: Scalar> Iterator for FaceLoop<'_, T> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.done {
            return None;
        }
        let out = self.cur;
        self.cur = self.cdt.next(self.cur);
        if self.cur == self.start || self.cur == NONE {
            self.done = true;
        }
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(coords: &[(f64, f64)]) -> Vec<Point2<f64>> {
        coords.iter().map(|&(x, y)| Point2::new([x, y])).collect()
    }

    /// Lone edge `0 -> 1` with self-looped symedges, as the divide and
    /// conquer base case builds it.
    fn lone_edge(cdt: &mut CdtArrangement<f64>) -> usize {
        let outer = cdt.outer_face;
        let e = cdt.add_edge(0, 1, outer, outer);
        cdt.symedges[2 * e].next = 2 * e + 1;
        cdt.symedges[2 * e + 1].next = 2 * e;
        cdt.symedges[2 * e].rot = 2 * e;
        cdt.symedges[2 * e + 1].rot = 2 * e + 1;
        e
    }

    #[test]
    fn triangle_by_diagonal() {
        let mut cdt = CdtArrangement::new(&pts(&[(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)]));
        let ea = lone_edge(&mut cdt);
        let eb = cdt.add_vert_to_symedge_edge(2, 2 * ea + 1);
        let ediag = cdt.add_diagonal(2 * eb, 2 * ea);

        let tri = cdt.face(2 * ediag);
        assert_ne!(tri, cdt.outer_face);
        let loop_verts: Vec<usize> = cdt.face_loop(2 * ediag).map(|s| cdt.vert(s)).collect();
        assert_eq!(loop_verts, vec![2, 0, 1]);
        assert_eq!(cdt.face_len(2 * ediag + 1), 3);
        for se in 0..cdt.symedges.len() {
            assert_eq!(cdt.rot(cdt.next(se)), sym(se), "sym link broken at {se}");
        }
    }

    #[test]
    fn split_and_delete() {
        let mut cdt = CdtArrangement::new(&pts(&[(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)]));
        let ea = lone_edge(&mut cdt);
        let eb = cdt.add_vert_to_symedge_edge(2, 2 * ea + 1);
        let ediag = cdt.add_diagonal(2 * eb, 2 * ea);
        let tri = cdt.face(2 * ediag);

        let e2 = cdt.split_edge(2 * ea, &0.5);
        let mid = cdt.vert(2 * e2);
        assert_eq!(cdt.co(mid).approx, [0.5, 0.0]);
        assert_eq!(cdt.find_symedge_between_verts(0, mid), Some(2 * ea));
        assert_eq!(cdt.find_symedge_between_verts(mid, 1), Some(2 * e2));
        assert!(!cdt.exists_edge(0, 1));
        assert_eq!(cdt.face_len(2 * ea), 4);
        for se in 0..cdt.symedges.len() {
            assert_eq!(cdt.rot(cdt.next(se)), sym(se), "sym link broken at {se}");
        }

        let old_outer = cdt.outer_face;
        cdt.delete_edge(2 * ediag);
        assert!(cdt.is_deleted_edge(ediag));
        assert!(cdt.faces[old_outer].deleted);
        assert_eq!(cdt.outer_face, tri);
        assert_eq!(cdt.face_len(2 * ea), 6);
    }
}
