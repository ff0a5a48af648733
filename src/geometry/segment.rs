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

use crate::{geometry::point::Point2, numeric::scalar::Scalar};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IsectKind {
    /// Segments do not meet.
    None,
    /// Segments meet at an interior point of both.
    Cross,
    /// Segments meet at an endpoint of at least one of them.
    Exact,
    /// Segments are parallel (possibly on the same line).
    Colinear,
}

#[derive(Clone, Debug)]
pub struct SegIsect<T: Scalar> {
    pub kind: IsectKind,
    /// Parameter along `v1 -> v2`.
    pub lambda: T,
    /// Parameter along `v3 -> v4`.
    pub mu: T,
}

/// Intersect segments `v1 v2` and `v3 v4`.
///
/// Parameters are returned even for `None` so approximate callers can tell
/// which endpoint a near-miss was closest to.
pub fn isect_seg_seg<T: Scalar>(
    v1: &Point2<T>,
    v2: &Point2<T>,
    v3: &Point2<T>,
    v4: &Point2<T>,
) -> SegIsect<T> {
    let d12x = v2[0].clone() - &v1[0];
    let d12y = v2[1].clone() - &v1[1];
    let d34x = v4[0].clone() - &v3[0];
    let d34y = v4[1].clone() - &v3[1];
    let div = d12x.clone() * &d34y - &(d12y.clone() * &d34x);
    if div.is_zero() {
        return SegIsect {
            kind: IsectKind::Colinear,
            lambda: T::zero(),
            mu: T::zero(),
        };
    }
    let d31x = v1[0].clone() - &v3[0];
    let d31y = v1[1].clone() - &v3[1];
    let lambda = (d31y.clone() * &d34x - &(d31x.clone() * &d34y)) / div.clone();
    let mu = (d31y * &d12x - &(d31x * &d12y)) / div;

    let zero = T::zero();
    let one = T::one();
    let kind = if lambda >= zero && lambda <= one && mu >= zero && mu <= one {
        if lambda == zero || lambda == one || mu == zero || mu == one {
            IsectKind::Exact
        } else {
            IsectKind::Cross
        }
    } else {
        IsectKind::None
    };
    SegIsect { kind, lambda, mu }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rug::Rational;

    fn p(x: i32, y: i32) -> Point2<Rational> {
        Point2::from_ints([x, y])
    }

    #[test]
    fn proper_crossing() {
        let r = isect_seg_seg(&p(0, 0), &p(2, 2), &p(0, 2), &p(2, 0));
        assert_eq!(r.kind, IsectKind::Cross);
        assert_eq!(r.lambda, Rational::from((1, 2)));
        assert_eq!(r.mu, Rational::from((1, 2)));
    }

    #[test]
    fn touching_at_endpoint() {
        let r = isect_seg_seg(&p(0, 0), &p(2, 0), &p(1, 0), &p(1, 5));
        assert_eq!(r.kind, IsectKind::Exact);
        assert_eq!(r.lambda, Rational::from((1, 2)));
        assert_eq!(r.mu, Rational::from(0));
    }

    #[test]
    fn parallel_and_disjoint() {
        assert_eq!(
            isect_seg_seg(&p(0, 0), &p(1, 0), &p(0, 1), &p(1, 1)).kind,
            IsectKind::Colinear
        );
        assert_eq!(
            isect_seg_seg(&p(0, 0), &p(1, 0), &p(3, -1), &p(3, 1)).kind,
            IsectKind::None
        );
    }
}
