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

//! Unconstrained Delaunay triangulation by Guibas–Stolfi divide and conquer.

use std::cmp::Ordering;

use tracing::trace;

use crate::{
    kernel::filtered::{incircle, orient2d},
    numeric::scalar::Scalar,
    operations::triangulation::arrangement::{CdtArrangement, NONE, sym},
};

#[derive(Clone, Copy, Debug)]
struct Site {
    v: usize,
    orig_index: usize,
}

/// Triangulate all vertices currently in `cdt`.
///
/// Exactly coincident vertices are aliased to the first of their run in
/// lexicographic order and left out of the triangulation.
pub fn initial_triangulation<T: Scalar>(cdt: &mut CdtArrangement<T>) {
    let n = cdt.verts.len();
    if n <= 1 {
        return;
    }
    let mut sites: Vec<Site> = (0..n).map(|i| Site { v: i, orig_index: i }).collect();
    sites.sort_by(|a, b| {
        cdt.verts[a.v]
            .co
            .exact
            .lex_cmp(&cdt.verts[b.v].co.exact)
            .then(a.orig_index.cmp(&b.orig_index))
    });
    find_site_merges(cdt, &sites);
    sites.retain(|s| cdt.verts[s.v].merge_to_index.is_none());
    trace!(sites = sites.len(), merged = n - sites.len(), "divide and conquer");
    dc_tri(cdt, &sites);
}

fn find_site_merges<T: Scalar>(cdt: &mut CdtArrangement<T>, sites: &[Site]) {
    let n = sites.len();
    let mut i = 0;
    while i < n {
        let mut j = i + 1;
        while j < n
            && cdt.verts[sites[j].v].co.exact.lex_cmp(&cdt.verts[sites[i].v].co.exact)
                == Ordering::Equal
        {
            cdt.verts[sites[j].v].merge_to_index = Some(sites[i].orig_index);
            j += 1;
        }
        i = j;
    }
}

#[inline]
fn vert_left_of_symedge<T: Scalar>(cdt: &CdtArrangement<T>, v: usize, se: usize) -> bool {
    let a = cdt.vert(se);
    let b = cdt.vert(cdt.next(se));
    orient2d(cdt.co(v), cdt.co(a), cdt.co(b)) > 0
}

#[inline]
fn vert_right_of_symedge<T: Scalar>(cdt: &CdtArrangement<T>, v: usize, se: usize) -> bool {
    let a = cdt.vert(se);
    let b = cdt.vert(cdt.next(se));
    orient2d(cdt.co(v), cdt.co(b), cdt.co(a)) > 0
}

/// Triangulate `sites` (sorted, duplicate-free) and return the
/// counter-clockwise convex hull symedges leaving the leftmost and the
/// rightmost site, or `None` for fewer than two sites.
fn dc_tri<T: Scalar>(cdt: &mut CdtArrangement<T>, sites: &[Site]) -> Option<(usize, usize)> {
    let n = sites.len();
    if n <= 1 {
        return None;
    }
    if n <= 3 {
        let v1 = sites[0].v;
        let v2 = sites[1].v;
        let outer = cdt.outer_face;
        let ea = cdt.add_edge(v1, v2, outer, outer);
        let (ea0, ea1) = (2 * ea, 2 * ea + 1);
        cdt.symedges[ea0].next = ea1;
        cdt.symedges[ea1].next = ea0;
        cdt.symedges[ea0].rot = ea0;
        cdt.symedges[ea1].rot = ea1;
        if n == 2 {
            return Some((ea0, ea1));
        }
        let v3 = sites[2].v;
        let eb = cdt.add_vert_to_symedge_edge(v3, ea1);
        let eb0 = 2 * eb;
        let orient = orient2d(cdt.co(v1), cdt.co(v2), cdt.co(v3));
        return Some(match orient {
            o if o > 0 => {
                cdt.add_diagonal(eb0, ea0);
                (ea0, eb0)
            }
            o if o < 0 => {
                cdt.add_diagonal(ea0, eb0);
                (cdt.rot(ea0), cdt.rot(eb0))
            }
            _ => (ea0, eb0),
        });
    }

    let n2 = n / 2;
    let (mut ldo, mut ldi) = dc_tri(cdt, &sites[..n2])?;
    let (mut rdi, mut rdo) = dc_tri(cdt, &sites[n2..])?;

    // Lower common tangent of the two halves.
    loop {
        if vert_left_of_symedge(cdt, cdt.vert(rdi), ldi) {
            ldi = cdt.next(ldi);
        } else if vert_right_of_symedge(cdt, cdt.vert(ldi), rdi) {
            rdi = cdt.rot(sym(rdi));
        } else {
            break;
        }
    }

    let ebasel = cdt.connect_separate_parts(cdt.next(sym(rdi)), ldi);
    let mut basel = 2 * ebasel;
    let mut basel_sym = basel + 1;
    if cdt.vert(ldi) == cdt.vert(ldo) {
        ldo = basel_sym;
    }
    if cdt.vert(rdi) == cdt.vert(rdo) {
        rdo = basel;
    }

    let valid = |cdt: &CdtArrangement<T>, se: usize, basel: usize, basel_sym: usize| {
        let dest = cdt.vert(cdt.next(se));
        orient2d(cdt.co(dest), cdt.co(cdt.vert(basel_sym)), cdt.co(cdt.vert(basel))) > 0
    };

    // Zip the halves together from the lower tangent upward.
    loop {
        let mut lcand = cdt.rot(basel_sym);
        let mut rcand = cdt.next(basel_sym);

        if valid(cdt, lcand, basel, basel_sym) {
            loop {
                let a = cdt.vert(basel_sym);
                let b = cdt.vert(basel);
                let c = cdt.vert(cdt.next(lcand));
                let d = cdt.vert(cdt.next(cdt.rot(lcand)));
                if incircle(cdt.co(a), cdt.co(b), cdt.co(c), cdt.co(d)) <= 0 {
                    break;
                }
                let t = cdt.rot(lcand);
                cdt.delete_edge(sym(lcand));
                lcand = t;
            }
        }
        if valid(cdt, rcand, basel, basel_sym) {
            loop {
                let a = cdt.vert(basel_sym);
                let b = cdt.vert(basel);
                let c = cdt.vert(cdt.next(rcand));
                let d = cdt.vert(cdt.next(cdt.next(sym(rcand))));
                if incircle(cdt.co(a), cdt.co(b), cdt.co(c), cdt.co(d)) <= 0 {
                    break;
                }
                let t = cdt.next(sym(rcand));
                cdt.delete_edge(rcand);
                rcand = t;
            }
        }

        let valid_lcand = valid(cdt, lcand, basel, basel_sym);
        let valid_rcand = valid(cdt, rcand, basel, basel_sym);
        if !valid_lcand && !valid_rcand {
            break;
        }
        let use_rcand = !valid_lcand
            || (valid_rcand && {
                let a = cdt.vert(cdt.next(lcand));
                let b = cdt.vert(lcand);
                let c = cdt.vert(rcand);
                let d = cdt.vert(cdt.next(rcand));
                incircle(cdt.co(a), cdt.co(b), cdt.co(c), cdt.co(d)) > 0
            });
        let e = if use_rcand {
            cdt.add_diagonal(cdt.next(rcand), basel_sym)
        } else {
            cdt.add_diagonal(cdt.next(basel_sym), sym(lcand))
        };
        basel = 2 * e;
        basel_sym = basel + 1;
    }
    debug_assert!(ldo != NONE && rdo != NONE);
    Some((ldo, rdo))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::point::Point2;
    use rand::{Rng, SeedableRng, rngs::StdRng};

    fn arrangement(coords: &[(f64, f64)]) -> CdtArrangement<f64> {
        let pts: Vec<Point2<f64>> = coords.iter().map(|&(x, y)| Point2::new([x, y])).collect();
        CdtArrangement::new(&pts)
    }

    fn live_edges<T: Scalar>(cdt: &CdtArrangement<T>) -> usize {
        (0..cdt.edges.len()).filter(|&e| !cdt.is_deleted_edge(e)).count()
    }

    fn live_inner_faces<T: Scalar>(cdt: &CdtArrangement<T>) -> Vec<usize> {
        (0..cdt.faces.len())
            .filter(|&f| !cdt.faces[f].deleted && f != cdt.outer_face)
            .collect()
    }

    #[test]
    fn square_gets_one_diagonal() {
        let mut cdt = arrangement(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]);
        initial_triangulation(&mut cdt);
        assert_eq!(live_edges(&cdt), 5);
        assert_eq!(live_inner_faces(&cdt).len(), 2);
    }

    #[test]
    fn duplicates_are_aliased() {
        let mut cdt = arrangement(&[(1.0, 1.0), (0.0, 0.0), (1.0, 1.0), (2.0, 0.0)]);
        initial_triangulation(&mut cdt);
        assert_eq!(cdt.verts[2].merge_to_index, Some(0));
        assert_eq!(cdt.verts[0].merge_to_index, None);
        assert_eq!(cdt.verts[2].symedge, NONE);
        assert_eq!(live_edges(&cdt), 3);
    }

    #[test]
    fn collinear_points_form_a_chain() {
        let mut cdt = arrangement(&[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (3.0, 3.0), (4.0, 4.0)]);
        initial_triangulation(&mut cdt);
        assert_eq!(live_edges(&cdt), 4);
        assert!(live_inner_faces(&cdt).is_empty());
    }

    #[test]
    fn random_points_are_delaunay_and_euler() {
        let mut rng = StdRng::seed_from_u64(42);
        let coords: Vec<(f64, f64)> = (0..200)
            .map(|_| (rng.random_range(0.0..10.0), rng.random_range(0.0..10.0)))
            .collect();
        let mut cdt = arrangement(&coords);
        initial_triangulation(&mut cdt);

        let faces = live_inner_faces(&cdt);
        let ne = live_edges(&cdt);
        // V - E + F = 2 counting the outer face.
        assert_eq!(coords.len() as i64 - ne as i64 + faces.len() as i64 + 1, 2);

        for e in 0..cdt.edges.len() {
            if cdt.is_deleted_edge(e) || cdt.is_border_edge(e) {
                continue;
            }
            let se = 2 * e;
            let a = cdt.vert(se);
            let b = cdt.vert(cdt.next(se));
            let c = cdt.vert(cdt.next(cdt.next(se)));
            let d = cdt.vert(cdt.next(cdt.next(sym(se))));
            assert!(
                incircle(cdt.co(a), cdt.co(b), cdt.co(c), cdt.co(d)) <= 0,
                "edge {e} is not locally Delaunay"
            );
        }
    }
}
