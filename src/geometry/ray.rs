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

use crate::geometry::point::approx::{cross, dot, sub};

/// Möller–Trumbore ray/triangle test on approximate coordinates.
///
/// Returns the ray parameter `t > 0` of the hit, or `None` when the ray
/// misses or runs parallel to the triangle plane.
pub fn ray_triangle(
    origin: &[f64; 3],
    dir: &[f64; 3],
    v0: &[f64; 3],
    v1: &[f64; 3],
    v2: &[f64; 3],
) -> Option<f64> {
    const EPS: f64 = 1e-12;
    let e1 = sub(v1, v0);
    let e2 = sub(v2, v0);
    let p = cross(dir, &e2);
    let det = dot(&e1, &p);
    if det.abs() < EPS {
        return None;
    }
    let inv_det = 1.0 / det;
    let s = sub(origin, v0);
    let u = dot(&s, &p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = cross(&s, &e1);
    let v = dot(dir, &q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = dot(&e2, &q) * inv_det;
    (t > 0.0).then_some(t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hits_and_misses() {
        let (a, b, c) = ([0.0, 0.0, 1.0], [1.0, 0.0, 1.0], [0.0, 1.0, 1.0]);
        let t = ray_triangle(&[0.2, 0.2, 0.0], &[0.0, 0.0, 1.0], &a, &b, &c);
        assert!((t.unwrap() - 1.0).abs() < 1e-12);
        assert!(ray_triangle(&[0.2, 0.2, 0.0], &[0.0, 0.0, -1.0], &a, &b, &c).is_none());
        assert!(ray_triangle(&[0.9, 0.9, 0.0], &[0.0, 0.0, 1.0], &a, &b, &c).is_none());
        assert!(ray_triangle(&[0.2, 0.2, 0.0], &[1.0, 0.0, 0.0], &a, &b, &c).is_none());
    }
}
