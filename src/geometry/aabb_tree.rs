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

use crate::{geometry::aabb::Aabb, numeric::scalar::Scalar};

/// A static AABB-tree of generic data `D`, built by median split.
pub enum AabbTree<T: Scalar, const N: usize, D> {
    Leaf {
        aabb: Aabb<T, N>,
        data: D,
    },
    Node {
        aabb: Aabb<T, N>,
        left: Box<AabbTree<T, N, D>>,
        right: Box<AabbTree<T, N, D>>,
    },
}

impl<T: Scalar, const N: usize, D> AabbTree<T, N, D> {
    /// Build an AABB-tree over `(aabb, data)` pairs, or `None` for no items.
    pub fn build(items: Vec<(Aabb<T, N>, D)>) -> Option<Self> {
        if items.is_empty() {
            return None;
        }
        Some(Self::build_binary_tree(items))
    }

    fn build_binary_tree(mut items: Vec<(Aabb<T, N>, D)>) -> Self {
        if items.len() == 1 {
            if let Some((aabb, data)) = items.pop() {
                return AabbTree::Leaf { aabb, data };
            }
        }

        let mut bounds = items[0].0.clone();
        for (bb, _) in &items[1..] {
            bounds = bounds.union(bb);
        }
        let axis = bounds.longest_axis();
        items.sort_by(|a, b| {
            a.0.center(axis)
                .partial_cmp(&b.0.center(axis))
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mid = items.len() / 2;
        let right_items = items.split_off(mid);
        let left = Box::new(Self::build_binary_tree(items));
        let right = Box::new(Self::build_binary_tree(right_items));
        AabbTree::Node {
            aabb: bounds,
            left,
            right,
        }
    }

    pub fn aabb(&self) -> &Aabb<T, N> {
        match self {
            AabbTree::Leaf { aabb, .. } => aabb,
            AabbTree::Node { aabb, .. } => aabb,
        }
    }

    /// Collect all `&D` whose AABB intersects `query`.
    pub fn query<'a>(&'a self, query: &Aabb<T, N>, out: &mut Vec<&'a D>) {
        match self {
            AabbTree::Leaf { aabb, data } => {
                if aabb.intersects(query) {
                    out.push(data);
                }
            }
            AabbTree::Node { aabb, left, right } => {
                if aabb.intersects(query) {
                    left.query(query, out);
                    right.query(query, out);
                }
            }
        }
    }
}

impl<D> AabbTree<f64, 3, D> {
    /// Collect all `&D` whose AABB is hit by the ray `origin + t * dir`, `t >= 0`.
    pub fn ray_query<'a>(&'a self, origin: &[f64; 3], dir: &[f64; 3], out: &mut Vec<&'a D>) {
        let inv_dir = [1.0 / dir[0], 1.0 / dir[1], 1.0 / dir[2]];
        self.ray_query_inv(origin, &inv_dir, out);
    }

    fn ray_query_inv<'a>(&'a self, origin: &[f64; 3], inv_dir: &[f64; 3], out: &mut Vec<&'a D>) {
        match self {
            AabbTree::Leaf { aabb, data } => {
                if aabb.hit_by_ray(origin, inv_dir) {
                    out.push(data);
                }
            }
            AabbTree::Node { aabb, left, right } => {
                if aabb.hit_by_ray(origin, inv_dir) {
                    left.ray_query_inv(origin, inv_dir, out);
                    right.ray_query_inv(origin, inv_dir, out);
                }
            }
        }
    }
}
