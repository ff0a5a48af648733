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

//! Floating-point filtered predicates over [`FatCo`] coordinates.
//!
//! Each predicate evaluates its determinant on the cached doubles and bounds
//! the rounding error by `supremum * index * EPSILON`, where the supremum is
//! the same expression evaluated on absolute values and the index counts the
//! rounding steps (Burnikel, Funke and Seel, "Exact geometric computation
//! using cascading"). Only results inside that bound are recomputed exactly.

use crate::geometry::fat_co::FatCo;
use crate::kernel::predicates::{self, to_rational_point};
use crate::numeric::scalar::Scalar;

const INDEX_ORIENT2D: f64 = 6.0;
const INDEX_IN_LINE: f64 = 6.0;
const INDEX_INCIRCLE: f64 = 14.0;
const INDEX_ORIENT3D: f64 = 10.0;
const INDEX_INSPHERE: f64 = 24.0;

#[inline]
fn filter(det: f64, supremum: f64, index: f64) -> Option<i32> {
    let err_bound = supremum * index * f64::EPSILON;
    if det > err_bound {
        Some(1)
    } else if det < -err_bound {
        Some(-1)
    } else {
        None
    }
}

pub fn orient2d<T: Scalar>(a: &FatCo<T, 2>, b: &FatCo<T, 2>, c: &FatCo<T, 2>) -> i32 {
    let det = (a.approx[0] - c.approx[0]) * (b.approx[1] - c.approx[1])
        - (a.approx[1] - c.approx[1]) * (b.approx[0] - c.approx[0]);
    let supremum = (a.abs_approx[0] + c.abs_approx[0]) * (b.abs_approx[1] + c.abs_approx[1])
        + (a.abs_approx[1] + c.abs_approx[1]) * (b.abs_approx[0] + c.abs_approx[0]);
    if let Some(s) = filter(det, supremum, INDEX_ORIENT2D) {
        return s;
    }
    predicates::orient2d(
        &to_rational_point(&a.exact),
        &to_rational_point(&b.exact),
        &to_rational_point(&c.exact),
    )
}

pub fn incircle<T: Scalar>(
    a: &FatCo<T, 2>,
    b: &FatCo<T, 2>,
    c: &FatCo<T, 2>,
    d: &FatCo<T, 2>,
) -> i32 {
    let adx = a.approx[0] - d.approx[0];
    let bdx = b.approx[0] - d.approx[0];
    let cdx = c.approx[0] - d.approx[0];
    let ady = a.approx[1] - d.approx[1];
    let bdy = b.approx[1] - d.approx[1];
    let cdy = c.approx[1] - d.approx[1];
    let alift = adx * adx + ady * ady;
    let blift = bdx * bdx + bdy * bdy;
    let clift = cdx * cdx + cdy * cdy;
    let det = alift * (bdx * cdy - cdx * bdy)
        + blift * (cdx * ady - adx * cdy)
        + clift * (adx * bdy - bdx * ady);

    let sadx = a.abs_approx[0] + d.abs_approx[0];
    let sbdx = b.abs_approx[0] + d.abs_approx[0];
    let scdx = c.abs_approx[0] + d.abs_approx[0];
    let sady = a.abs_approx[1] + d.abs_approx[1];
    let sbdy = b.abs_approx[1] + d.abs_approx[1];
    let scdy = c.abs_approx[1] + d.abs_approx[1];
    let salift = sadx * sadx + sady * sady;
    let sblift = sbdx * sbdx + sbdy * sbdy;
    let sclift = scdx * scdx + scdy * scdy;
    let supremum = salift * (sbdx * scdy + scdx * sbdy)
        + sblift * (scdx * sady + sadx * scdy)
        + sclift * (sadx * sbdy + sbdx * sady);

    if let Some(s) = filter(det, supremum, INDEX_INCIRCLE) {
        return s;
    }
    predicates::incircle(
        &to_rational_point(&a.exact),
        &to_rational_point(&b.exact),
        &to_rational_point(&c.exact),
        &to_rational_point(&d.exact),
    )
}

pub fn orient3d<T: Scalar>(
    a: &FatCo<T, 3>,
    b: &FatCo<T, 3>,
    c: &FatCo<T, 3>,
    d: &FatCo<T, 3>,
) -> i32 {
    let ad: [f64; 3] = std::array::from_fn(|i| a.approx[i] - d.approx[i]);
    let bd: [f64; 3] = std::array::from_fn(|i| b.approx[i] - d.approx[i]);
    let cd: [f64; 3] = std::array::from_fn(|i| c.approx[i] - d.approx[i]);
    let det = ad[0] * (bd[1] * cd[2] - bd[2] * cd[1])
        + bd[0] * (cd[1] * ad[2] - cd[2] * ad[1])
        + cd[0] * (ad[1] * bd[2] - ad[2] * bd[1]);

    let sad: [f64; 3] = std::array::from_fn(|i| a.abs_approx[i] + d.abs_approx[i]);
    let sbd: [f64; 3] = std::array::from_fn(|i| b.abs_approx[i] + d.abs_approx[i]);
    let scd: [f64; 3] = std::array::from_fn(|i| c.abs_approx[i] + d.abs_approx[i]);
    let supremum = sad[0] * (sbd[1] * scd[2] + sbd[2] * scd[1])
        + sbd[0] * (scd[1] * sad[2] + scd[2] * sad[1])
        + scd[0] * (sad[1] * sbd[2] + sad[2] * sbd[1]);

    if let Some(s) = filter(det, supremum, INDEX_ORIENT3D) {
        return s;
    }
    predicates::orient3d(
        &to_rational_point(&a.exact),
        &to_rational_point(&b.exact),
        &to_rational_point(&c.exact),
        &to_rational_point(&d.exact),
    )
}

pub fn insphere<T: Scalar>(
    a: &FatCo<T, 3>,
    b: &FatCo<T, 3>,
    c: &FatCo<T, 3>,
    d: &FatCo<T, 3>,
    e: &FatCo<T, 3>,
) -> i32 {
    let rel = |p: &FatCo<T, 3>| -> [f64; 3] { std::array::from_fn(|i| p.approx[i] - e.approx[i]) };
    let sup = |p: &FatCo<T, 3>| -> [f64; 3] {
        std::array::from_fn(|i| p.abs_approx[i] + e.abs_approx[i])
    };

    let det = insphere_det(rel(a), rel(b), rel(c), rel(d), false);
    let supremum = insphere_det(sup(a), sup(b), sup(c), sup(d), true);
    if let Some(s) = filter(det, supremum, INDEX_INSPHERE) {
        return s;
    }
    predicates::insphere(
        &to_rational_point(&a.exact),
        &to_rational_point(&b.exact),
        &to_rational_point(&c.exact),
        &to_rational_point(&d.exact),
        &to_rational_point(&e.exact),
    )
}

/// With `all_plus` every subtraction becomes an addition, turning the
/// determinant into its supremum when fed absolute values.
fn insphere_det(a: [f64; 3], b: [f64; 3], c: [f64; 3], d: [f64; 3], all_plus: bool) -> f64 {
    let m = |x: f64, y: f64| if all_plus { x + y } else { x - y };
    let ab = m(a[0] * b[1], b[0] * a[1]);
    let bc = m(b[0] * c[1], c[0] * b[1]);
    let cd = m(c[0] * d[1], d[0] * c[1]);
    let da = m(d[0] * a[1], a[0] * d[1]);
    let ac = m(a[0] * c[1], c[0] * a[1]);
    let bd = m(b[0] * d[1], d[0] * b[1]);

    let abc = m(a[2] * bc, b[2] * ac) + c[2] * ab;
    let bcd = m(b[2] * cd, c[2] * bd) + d[2] * bc;
    let cda = c[2] * da + d[2] * ac + a[2] * cd;
    let dab = d[2] * ab + a[2] * bd + b[2] * da;

    let lift = |p: &[f64; 3]| p[0] * p[0] + p[1] * p[1] + p[2] * p[2];
    m(lift(&d) * abc, lift(&c) * dab) + m(lift(&b) * cda, lift(&a) * bcd)
}

/// Given `a`, `b`, `c` collinear per [`orient2d`] and ordered either `a b c`
/// or `b a c`, report whether the order is `a b c`.
pub fn in_line<T: Scalar>(a: &FatCo<T, 2>, b: &FatCo<T, 2>, c: &FatCo<T, 2>) -> bool {
    let ab = [b.approx[0] - a.approx[0], b.approx[1] - a.approx[1]];
    let bc = [c.approx[0] - b.approx[0], c.approx[1] - b.approx[1]];
    let ac = [c.approx[0] - a.approx[0], c.approx[1] - a.approx[1]];
    let sab = [b.abs_approx[0] + a.abs_approx[0], b.abs_approx[1] + a.abs_approx[1]];
    let sbc = [c.abs_approx[0] + b.abs_approx[0], c.abs_approx[1] + b.abs_approx[1]];
    let sac = [c.abs_approx[0] + a.abs_approx[0], c.abs_approx[1] + a.abs_approx[1]];

    let dot_ab_ac = ab[0] * ac[0] + ab[1] * ac[1];
    let err_ab = (sab[0] * sac[0] + sab[1] * sac[1]) * INDEX_IN_LINE * f64::EPSILON;
    if dot_ab_ac < -err_ab {
        return false;
    }
    let dot_bc_ac = bc[0] * ac[0] + bc[1] * ac[1];
    let err_bc = (sbc[0] * sac[0] + sbc[1] * sac[1]) * INDEX_IN_LINE * f64::EPSILON;
    if dot_bc_ac < -err_bc {
        return false;
    }
    if dot_ab_ac > err_ab && dot_bc_ac > err_bc {
        return true;
    }
    predicates::in_line(
        &to_rational_point(&a.exact),
        &to_rational_point(&b.exact),
        &to_rational_point(&c.exact),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::point::Point;
    use rug::Rational;

    fn f2(x: f64, y: f64) -> FatCo<f64, 2> {
        FatCo::from_f64([x, y])
    }

    #[test]
    fn orient2d_near_degenerate_f64() {
        // The third point is the double nearest to a point on the line, so the
        // naive determinant is dominated by rounding.
        let a = f2(0.5, 0.5);
        let b = f2(12.0, 12.0);
        let c = f2(24.0, 24.0);
        assert_eq!(orient2d(&a, &b, &c), 0);

        let nudged = f2(24.0, 24.000000000000004);
        assert_eq!(orient2d(&a, &b, &nudged), 1);
    }

    #[test]
    fn orient2d_matches_exact_for_rationals() {
        let a = FatCo::new(Point::new([Rational::from((1, 3)), Rational::from((1, 3))]));
        let b = FatCo::new(Point::new([Rational::from((2, 3)), Rational::from((2, 3))]));
        let c = FatCo::new(Point::new([Rational::from(1), Rational::from(1)]));
        assert_eq!(orient2d(&a, &b, &c), 0);
        let d = FatCo::new(Point::new([Rational::from(1), Rational::from((1000001, 1000000))]));
        assert_eq!(orient2d(&a, &b, &d), 1);
    }

    #[test]
    fn incircle_cocircular() {
        let a = f2(1.0, 0.0);
        let b = f2(0.0, 1.0);
        let c = f2(-1.0, 0.0);
        assert_eq!(incircle(&a, &b, &c, &f2(0.0, -1.0)), 0);
        assert_eq!(incircle(&a, &b, &c, &f2(0.0, 0.0)), 1);
        assert_eq!(incircle(&a, &b, &c, &f2(0.0, -1.5)), -1);
    }

    #[test]
    fn orient3d_and_insphere_filtered() {
        let a: FatCo<f64, 3> = FatCo::from_f64([0.0, 0.0, 0.0]);
        let b = FatCo::from_f64([1.0, 0.0, 0.0]);
        let c = FatCo::from_f64([0.0, 1.0, 0.0]);
        let d = FatCo::from_f64([0.0, 0.0, -1.0]);
        assert_eq!(orient3d(&a, &b, &c, &d), 1);
        assert_eq!(orient3d(&a, &b, &c, &FatCo::from_f64([0.3, 0.3, 0.0])), 0);
        assert_eq!(insphere(&a, &b, &c, &d, &FatCo::from_f64([0.25, 0.25, -0.25])), 1);
        assert_eq!(insphere(&a, &b, &c, &d, &FatCo::from_f64([1.0, 1.0, -1.0])), 0);
    }

    #[test]
    fn in_line_filtered() {
        assert!(in_line(&f2(0.0, 0.0), &f2(0.5, 0.5), &f2(1.0, 1.0)));
        assert!(!in_line(&f2(0.5, 0.5), &f2(0.0, 0.0), &f2(1.0, 1.0)));
        assert!(in_line(&f2(0.0, 0.0), &f2(1.0, 1.0), &f2(1.0, 1.0)));
    }

    #[test]
    fn in_line_points_sharing_a_double() {
        // `b` rounds to the same double as `a`, so only the exact test sees
        // that it lies before `a`.
        let near_one = Rational::from((10i128.pow(30) - 1, 10i128.pow(30)));
        let p = |x: Rational, y: Rational| FatCo::new(Point::new([x, y]));
        let a = p(Rational::from(1), Rational::from(1));
        let b = p(near_one.clone(), near_one);
        let c = p(Rational::from(2), Rational::from(2));
        assert_eq!(a.approx, b.approx);
        assert!(!in_line(&a, &b, &c));
        assert!(in_line(&b, &a, &c));

        // Short `a b` next to a long `b c`: each dot product has its own bound.
        let a = f2(1e-8, 1e-8);
        let b = f2(2e-8, 2e-8);
        let c = f2(1e8, 1e8);
        assert!(in_line(&a, &b, &c));
        assert!(!in_line(&b, &a, &c));
    }
}
