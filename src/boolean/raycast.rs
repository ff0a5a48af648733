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

//! Inside/outside classification by ray casting, for meshes whose winding
//! number is not piecewise constant.

use rayon::prelude::*;
use tracing::debug;

use crate::{
    boolean::{BoolOpType, patch::PatchesInfo, winding::apply_bool_op},
    geometry::{
        aabb::Aabb,
        aabb_tree::AabbTree,
        point::{
            Point3,
            approx::{dot, normalized},
        },
        ray::ray_triangle,
    },
    mesh::trimesh::{Tri, TriMesh},
    numeric::scalar::Scalar,
};

const OFFSET_AMOUNT: f64 = 1e-5;

const R1: f64 = 0.998_702_529_519_966_3;
const RA: f64 = 0.049_935_126_475_998_32;
const RB: f64 = 0.009_987_025_295_199_663;

/// Unit directions slightly off the axes, so rays rarely graze edges of
/// axis-aligned geometry.
const TEST_RAYS: [[f64; 3]; 6] = [
    [R1, RA, RB],
    [-R1, -RA, -RB],
    [RB, R1, RA],
    [-RB, -R1, -RA],
    [RA, RB, R1],
    [-RA, -RB, -R1],
];

pub type RaycastTree = AabbTree<f64, 3, usize>;

pub fn raycast_tree<T: Scalar>(tm: &TriMesh<T>) -> Option<RaycastTree> {
    let items = (0..tm.tris.len())
        .map(|t| {
            let [a, b, c] = tm.tri_co(t);
            let mut bb = Aabb::from_points(&Point3::new(a.approx), &Point3::new(b.approx));
            bb.add_point(&Point3::new(c.approx));
            (bb, t)
        })
        .collect();
    AabbTree::build(items)
}

/// Fraction of test rays from just above triangle `t` that find themselves
/// inside each shape. The shape of `t` itself counts as fully inside.
pub fn test_tri_inside_shapes<T: Scalar, F>(
    tm: &TriMesh<T>,
    shape_fn: &F,
    nshapes: usize,
    t: usize,
    tree: &RaycastTree,
) -> Vec<f64>
where
    F: Fn(usize) -> usize,
{
    let shape = shape_fn(tm.tris[t].orig);
    let [a, b, c] = tm.tri_co(t);
    let norm = normalized(&tm.tri_normal_approx(t));
    let origin: [f64; 3] =
        std::array::from_fn(|i| (a.approx[i] + b.approx[i] + c.approx[i]) / 3.0 + OFFSET_AMOUNT * norm[i]);

    let mut count_insides = vec![0usize; nshapes];
    let mut hits = Vec::new();
    let mut parity = vec![0i32; nshapes];
    for dir in &TEST_RAYS {
        hits.clear();
        tree.ray_query(&origin, dir, &mut hits);
        parity.iter_mut().for_each(|p| *p = 0);
        for &&th in &hits {
            let [v0, v1, v2] = tm.tri_co(th);
            if ray_triangle(&origin, dir, &v0.approx, &v1.approx, &v2.approx).is_none() {
                continue;
            }
            let Some(p) = parity.get_mut(shape_fn(tm.tris[th].orig)) else {
                continue;
            };
            // Leaving through the back of a triangle means the origin was
            // inside its shape.
            if dot(dir, &tm.tri_normal_approx(th)) > 0.0 {
                *p += 1;
            } else {
                *p -= 1;
            }
        }
        for (j, &p) in parity.iter().enumerate() {
            if j != shape && p > 0 {
                count_insides[j] += 1;
            }
        }
    }
    let mut in_shape: Vec<f64> = count_insides
        .iter()
        .map(|&n| n as f64 / TEST_RAYS.len() as f64)
        .collect();
    if let Some(s) = in_shape.get_mut(shape) {
        *s = 1.0;
    }
    in_shape
}

/// What to do with a triangle of `shape` given its inside fractions.
/// Returns `None` to drop it, or whether to flip it.
fn raycast_test_remove(op: BoolOpType, shape: usize, in_shape: &[f64]) -> Option<bool> {
    let need_high_confidence = (op == BoolOpType::Difference && shape != 0) || op == BoolOpType::Intersect;
    let threshold = if need_high_confidence { 0.5 } else { 0.1 };
    let mut winding: Vec<i32> = in_shape.iter().map(|&f| i32::from(f >= threshold)).collect();
    let slot = winding.get_mut(shape)?;
    *slot = 0;
    let in_output_0 = apply_bool_op(op, &winding);
    winding[shape] = 1;
    let in_output_1 = apply_bool_op(op, &winding);
    if in_output_0 == in_output_1 {
        return None;
    }
    Some(op == BoolOpType::Difference && shape != 0)
}

/// Classify every triangle on its own.
pub fn raycast_tris_boolean<T: Scalar, F>(tm: &TriMesh<T>, op: BoolOpType, nshapes: usize, shape_fn: F) -> TriMesh<T>
where
    F: Fn(usize) -> usize + Sync,
{
    let Some(tree) = raycast_tree(tm) else {
        return tm.clone();
    };
    let out_tris: Vec<Tri> = (0..tm.tris.len())
        .into_par_iter()
        .filter_map(|t| {
            let tri = &tm.tris[t];
            let shape = shape_fn(tri.orig);
            let in_shape = test_tri_inside_shapes(tm, &shape_fn, nshapes, t, &tree);
            raycast_test_remove(op, shape, &in_shape).map(|flip| if flip { tri.flipped() } else { tri.clone() })
        })
        .collect();
    debug!(kept = out_tris.len(), of = tm.tris.len(), "raycast_tris_boolean");
    tm.with_tris(out_tris)
}

/// Classify each patch by one triangle from the middle of its list, which
/// is less likely to touch a neighbouring patch than the first ones.
pub fn raycast_patches_boolean<T: Scalar, F>(
    tm: &TriMesh<T>,
    op: BoolOpType,
    nshapes: usize,
    shape_fn: F,
    pinfo: &PatchesInfo,
) -> TriMesh<T>
where
    F: Fn(usize) -> usize + Sync,
{
    let Some(tree) = raycast_tree(tm) else {
        return tm.clone();
    };
    let per_patch: Vec<Vec<Tri>> = pinfo
        .patches
        .par_iter()
        .map(|patch| {
            let test_t = patch.tris[patch.tris.len() / 2];
            let shape = shape_fn(tm.tris[test_t].orig);
            let in_shape = test_tri_inside_shapes(tm, &shape_fn, nshapes, test_t, &tree);
            match raycast_test_remove(op, shape, &in_shape) {
                None => Vec::new(),
                Some(flip) => patch
                    .tris
                    .iter()
                    .map(|&t| {
                        if flip {
                            tm.tris[t].flipped()
                        } else {
                            tm.tris[t].clone()
                        }
                    })
                    .collect(),
            }
        })
        .collect();
    let out_tris: Vec<Tri> = per_patch.into_iter().flatten().collect();
    debug!(kept = out_tris.len(), of = tm.tris.len(), "raycast_patches_boolean");
    tm.with_tris(out_tris)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Open box (no top) around the unit cube, as shape 0; one triangle in
    /// the middle of it as shape 1.
    fn open_box_and_tri() -> (TriMesh<f64>, Vec<usize>) {
        let pts = vec![
            Point3::new([0.0, 0.0, 0.0]),
            Point3::new([1.0, 0.0, 0.0]),
            Point3::new([1.0, 1.0, 0.0]),
            Point3::new([0.0, 1.0, 0.0]),
            Point3::new([0.0, 0.0, 1.0]),
            Point3::new([1.0, 0.0, 1.0]),
            Point3::new([1.0, 1.0, 1.0]),
            Point3::new([0.0, 1.0, 1.0]),
            Point3::new([0.3, 0.3, 0.5]),
            Point3::new([0.7, 0.3, 0.5]),
            Point3::new([0.3, 0.7, 0.5]),
        ];
        let tris = [
            [0, 2, 1],
            [0, 3, 2],
            [0, 1, 5],
            [0, 5, 4],
            [1, 2, 6],
            [1, 6, 5],
            [2, 3, 7],
            [2, 7, 6],
            [3, 0, 4],
            [3, 4, 7],
            [8, 9, 10],
        ];
        let shapes = vec![0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1];
        (TriMesh::from_soup(pts, &tris), shapes)
    }

    #[test]
    fn point_in_open_box_is_mostly_inside() {
        let (tm, shapes) = open_box_and_tri();
        let tree = raycast_tree(&tm).unwrap();
        let shape_fn = |f: usize| shapes[f];
        let in_shape = test_tri_inside_shapes(&tm, &shape_fn, 2, 10, &tree);
        assert_eq!(in_shape[1], 1.0);
        // Only the ray escaping through the missing top leaves the box.
        assert_relative_eq!(in_shape[0], 5.0 / 6.0);
    }

    #[test]
    fn removal_decisions() {
        assert_eq!(raycast_test_remove(BoolOpType::Union, 1, &[1.0, 1.0]), None);
        assert_eq!(raycast_test_remove(BoolOpType::Union, 1, &[0.0, 1.0]), Some(false));
        assert_eq!(raycast_test_remove(BoolOpType::Intersect, 1, &[0.6, 1.0]), Some(false));
        assert_eq!(raycast_test_remove(BoolOpType::Intersect, 1, &[0.2, 1.0]), None);
        assert_eq!(raycast_test_remove(BoolOpType::Difference, 1, &[1.0, 1.0]), Some(true));
        assert_eq!(raycast_test_remove(BoolOpType::Difference, 0, &[1.0, 0.0]), Some(false));
        assert_eq!(raycast_test_remove(BoolOpType::Difference, 0, &[1.0, 1.0]), None);
    }

    #[test]
    fn union_keeps_the_open_box_drops_the_inner_tri() {
        let (tm, shapes) = open_box_and_tri();
        let out = raycast_tris_boolean(&tm, BoolOpType::Union, 2, |f| shapes[f]);
        assert_eq!(out.tris.len(), 10);
        assert!(out.tris.iter().all(|t| shapes[t.orig] == 0));
    }
}
