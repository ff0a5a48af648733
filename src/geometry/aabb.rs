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

use std::array::from_fn;

use crate::{geometry::point::Point, numeric::scalar::Scalar};

/// An axis-aligned bounding box in N dimensions.
#[derive(Clone, Debug, PartialEq)]
pub struct Aabb<T: Scalar, const N: usize> {
    pub min: Point<T, N>,
    pub max: Point<T, N>,
}

impl<T: Scalar, const N: usize> Aabb<T, N> {
    pub fn new(min: Point<T, N>, max: Point<T, N>) -> Self {
        Aabb { min, max }
    }

    /// Build the smallest AABB containing two points.
    pub fn from_points(a: &Point<T, N>, b: &Point<T, N>) -> Self {
        let mins = from_fn(|i| min_of(&a[i], &b[i]));
        let maxs = from_fn(|i| max_of(&a[i], &b[i]));
        Aabb::new(Point::new(mins), Point::new(maxs))
    }

    /// Smallest AABB containing every point of `pts`, or `None` when empty.
    pub fn from_iter<'a, I>(pts: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Point<T, N>>,
        T: 'a,
    {
        let mut it = pts.into_iter();
        let first = it.next()?;
        let mut bb = Aabb::new(first.clone(), first.clone());
        for p in it {
            bb.add_point(p);
        }
        Some(bb)
    }

    pub fn add_point(&mut self, p: &Point<T, N>) {
        for i in 0..N {
            if p[i] < self.min[i] {
                self.min[i] = p[i].clone();
            }
            if p[i] > self.max[i] {
                self.max[i] = p[i].clone();
            }
        }
    }

    pub fn union(&self, other: &Aabb<T, N>) -> Aabb<T, N> {
        let mins = from_fn(|i| min_of(&self.min[i], &other.min[i]));
        let maxs = from_fn(|i| max_of(&self.max[i], &other.max[i]));
        Aabb::new(Point::new(mins), Point::new(maxs))
    }

    /// Grow the box by `pad` on every side.
    pub fn padded(&self, pad: &T) -> Aabb<T, N> {
        let mins = from_fn(|i| self.min[i].clone() - pad);
        let maxs = from_fn(|i| self.max[i].clone() + pad);
        Aabb::new(Point::new(mins), Point::new(maxs))
    }

    /// Does this AABB intersect `other`? Touching boxes intersect.
    pub fn intersects(&self, other: &Aabb<T, N>) -> bool {
        for i in 0..N {
            if self.max[i] < other.min[i] || other.max[i] < self.min[i] {
                return false;
            }
        }
        true
    }

    pub fn contains_point(&self, p: &Point<T, N>) -> bool {
        (0..N).all(|i| self.min[i] <= p[i] && p[i] <= self.max[i])
    }

    /// Center coordinate along axis `i`.
    pub fn center(&self, i: usize) -> T {
        let half = T::from_num_den(1, 2);
        (self.min[i].clone() + &self.max[i]) * &half
    }

    fn extent(&self, i: usize) -> T {
        (self.max[i].clone() - &self.min[i]).abs()
    }

    /// Return the axis index with largest extent.
    pub fn longest_axis(&self) -> usize {
        let mut best_i = 0usize;
        let mut best = self.extent(0);
        for i in 1..N {
            let e = self.extent(i);
            if e > best {
                best_i = i;
                best = e;
            }
        }
        best_i
    }
}

impl Aabb<f64, 3> {
    /// Slab test for the ray `origin + t * dir`, `t >= 0`.
    pub fn hit_by_ray(&self, origin: &[f64; 3], inv_dir: &[f64; 3]) -> bool {
        let mut tmin = 0.0f64;
        let mut tmax = f64::INFINITY;
        for i in 0..3 {
            let t1 = (self.min[i] - origin[i]) * inv_dir[i];
            let t2 = (self.max[i] - origin[i]) * inv_dir[i];
            // NaN from 0 * inf (origin on a slab plane, axis-parallel ray) is
            // discarded by min/max, keeping the test conservative.
            tmin = tmin.max(t1.min(t2));
            tmax = tmax.min(t1.max(t2));
        }
        tmin <= tmax
    }
}

#[inline(always)]
fn min_of<T: Scalar>(a: &T, b: &T) -> T {
    if a < b { a.clone() } else { b.clone() }
}

#[inline(always)]
fn max_of<T: Scalar>(a: &T, b: &T) -> T {
    if a > b { a.clone() } else { b.clone() }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bb(min: [f64; 3], max: [f64; 3]) -> Aabb<f64, 3> {
        Aabb::new(Point::new(min), Point::new(max))
    }

    #[test]
    fn union_and_intersection() {
        let a = bb([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]);
        let b = bb([1.0, 0.5, 0.5], [2.0, 3.0, 1.0]);
        let c = bb([5.0, 5.0, 5.0], [6.0, 6.0, 6.0]);
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        let u = a.union(&c);
        assert_eq!(u, bb([0.0, 0.0, 0.0], [6.0, 6.0, 6.0]));
        assert_eq!(b.longest_axis(), 1);
    }

    #[test]
    fn ray_slab() {
        let a = bb([1.0, -1.0, -1.0], [2.0, 1.0, 1.0]);
        let o = [0.0, 0.0, 0.0];
        let inv = |d: [f64; 3]| [1.0 / d[0], 1.0 / d[1], 1.0 / d[2]];
        assert!(a.hit_by_ray(&o, &inv([1.0, 0.0, 0.0])));
        assert!(!a.hit_by_ray(&o, &inv([-1.0, 0.0, 0.0])));
        assert!(!a.hit_by_ray(&o, &inv([0.0, 1.0, 0.0])));
    }
}
