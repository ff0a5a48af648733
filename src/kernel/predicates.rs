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

//! Exact geometric predicates evaluated in `rug::Rational`.
//!
//! Every predicate returns the sign of a determinant as -1, 0 or +1 and is
//! never affected by rounding. The filtered wrappers in
//! [`crate::kernel::filtered`] fall back to these.

use rug::Rational;

use crate::geometry::point::Point;
use crate::numeric::scalar::Scalar;

pub type RatPoint<const N: usize> = Point<Rational, N>;

pub fn to_rational_point<T: Scalar, const N: usize>(p: &Point<T, N>) -> RatPoint<N> {
    Point::new(std::array::from_fn(|i| p.coords[i].to_rational()))
}

#[inline]
fn sign(r: &Rational) -> i32 {
    <Rational as Scalar>::sign(r) as i32
}

#[inline]
fn diff(a: &Rational, b: &Rational) -> Rational {
    Rational::from(a - b)
}

/// Positive when `a b c` is a counter-clockwise turn.
pub fn orient2d(a: &RatPoint<2>, b: &RatPoint<2>, c: &RatPoint<2>) -> i32 {
    let acx = diff(&a[0], &c[0]);
    let bcy = diff(&b[1], &c[1]);
    let acy = diff(&a[1], &c[1]);
    let bcx = diff(&b[0], &c[0]);
    let det = acx * bcy - acy * bcx;
    sign(&det)
}

/// Positive when `d` lies inside the circle through the counter-clockwise
/// triangle `a b c`.
pub fn incircle(a: &RatPoint<2>, b: &RatPoint<2>, c: &RatPoint<2>, d: &RatPoint<2>) -> i32 {
    let adx = diff(&a[0], &d[0]);
    let ady = diff(&a[1], &d[1]);
    let bdx = diff(&b[0], &d[0]);
    let bdy = diff(&b[1], &d[1]);
    let cdx = diff(&c[0], &d[0]);
    let cdy = diff(&c[1], &d[1]);

    let alift = Rational::from(&adx * &adx) + Rational::from(&ady * &ady);
    let blift = Rational::from(&bdx * &bdx) + Rational::from(&bdy * &bdy);
    let clift = Rational::from(&cdx * &cdx) + Rational::from(&cdy * &cdy);

    let bc = Rational::from(&bdx * &cdy) - Rational::from(&cdx * &bdy);
    let ca = Rational::from(&cdx * &ady) - Rational::from(&adx * &cdy);
    let ab = Rational::from(&adx * &bdy) - Rational::from(&bdx * &ady);

    let det = alift * bc + blift * ca + clift * ab;
    sign(&det)
}

/// Positive when `d` lies below the plane through `a b c`, where "above" is
/// the side from which `a b c` appears counter-clockwise.
pub fn orient3d(a: &RatPoint<3>, b: &RatPoint<3>, c: &RatPoint<3>, d: &RatPoint<3>) -> i32 {
    let adx = diff(&a[0], &d[0]);
    let ady = diff(&a[1], &d[1]);
    let adz = diff(&a[2], &d[2]);
    let bdx = diff(&b[0], &d[0]);
    let bdy = diff(&b[1], &d[1]);
    let bdz = diff(&b[2], &d[2]);
    let cdx = diff(&c[0], &d[0]);
    let cdy = diff(&c[1], &d[1]);
    let cdz = diff(&c[2], &d[2]);

    let m0 = Rational::from(&bdy * &cdz) - Rational::from(&bdz * &cdy);
    let m1 = Rational::from(&cdy * &adz) - Rational::from(&cdz * &ady);
    let m2 = Rational::from(&ady * &bdz) - Rational::from(&adz * &bdy);
    let det = adx * m0 + bdx * m1 + cdx * m2;
    sign(&det)
}

/// Positive when `e` lies inside the sphere through `a b c d`, given that
/// `orient3d(a, b, c, d)` is positive.
pub fn insphere(
    a: &RatPoint<3>,
    b: &RatPoint<3>,
    c: &RatPoint<3>,
    d: &RatPoint<3>,
    e: &RatPoint<3>,
) -> i32 {
    let rel = |p: &RatPoint<3>| -> [Rational; 3] {
        [diff(&p[0], &e[0]), diff(&p[1], &e[1]), diff(&p[2], &e[2])]
    };
    let [aex, aey, aez] = rel(a);
    let [bex, bey, bez] = rel(b);
    let [cex, cey, cez] = rel(c);
    let [dex, dey, dez] = rel(d);

    let ab = Rational::from(&aex * &bey) - Rational::from(&bex * &aey);
    let bc = Rational::from(&bex * &cey) - Rational::from(&cex * &bey);
    let cd = Rational::from(&cex * &dey) - Rational::from(&dex * &cey);
    let da = Rational::from(&dex * &aey) - Rational::from(&aex * &dey);
    let ac = Rational::from(&aex * &cey) - Rational::from(&cex * &aey);
    let bd = Rational::from(&bex * &dey) - Rational::from(&dex * &bey);

    let abc = Rational::from(&aez * &bc) - Rational::from(&bez * &ac) + Rational::from(&cez * &ab);
    let bcd = Rational::from(&bez * &cd) - Rational::from(&cez * &bd) + Rational::from(&dez * &bc);
    let cda = Rational::from(&cez * &da) + Rational::from(&dez * &ac) + Rational::from(&aez * &cd);
    let dab = Rational::from(&dez * &ab) + Rational::from(&aez * &bd) + Rational::from(&bez * &da);

    let lift = |x: &Rational, y: &Rational, z: &Rational| -> Rational {
        Rational::from(x * x) + Rational::from(y * y) + Rational::from(z * z)
    };
    let alift = lift(&aex, &aey, &aez);
    let blift = lift(&bex, &bey, &bez);
    let clift = lift(&cex, &cey, &cez);
    let dlift = lift(&dex, &dey, &dez);

    let det = (dlift * abc - clift * dab) + (blift * cda - alift * bcd);
    sign(&det)
}

/// Given collinear `a`, `b`, `c` known to be ordered either `a b c` or
/// `b a c`, report whether the order is `a b c`.
pub fn in_line(a: &RatPoint<2>, b: &RatPoint<2>, c: &RatPoint<2>) -> bool {
    let ab = b.sub(a);
    let ac = c.sub(a);
    if ab.dot(&ac).is_negative() {
        return false;
    }
    let bc = c.sub(b);
    !bc.dot(&ac).is_negative()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p2(x: i32, y: i32) -> RatPoint<2> {
        Point::from_ints([x, y])
    }

    fn p3(x: i32, y: i32, z: i32) -> RatPoint<3> {
        Point::from_ints([x, y, z])
    }

    #[test]
    fn orient2d_signs() {
        assert_eq!(orient2d(&p2(0, 0), &p2(1, 0), &p2(0, 1)), 1);
        assert_eq!(orient2d(&p2(0, 0), &p2(0, 1), &p2(1, 0)), -1);
        assert_eq!(orient2d(&p2(0, 0), &p2(1, 1), &p2(3, 3)), 0);
    }

    #[test]
    fn incircle_signs() {
        let (a, b, c) = (p2(0, 0), p2(2, 0), p2(0, 2));
        assert_eq!(incircle(&a, &b, &c, &p2(1, 1)), 1);
        assert_eq!(incircle(&a, &b, &c, &p2(2, 2)), 0);
        assert_eq!(incircle(&a, &b, &c, &p2(5, 5)), -1);
    }

    #[test]
    fn orient3d_below_is_positive() {
        let (a, b, c) = (p3(0, 0, 0), p3(1, 0, 0), p3(0, 1, 0));
        assert_eq!(orient3d(&a, &b, &c, &p3(0, 0, -1)), 1);
        assert_eq!(orient3d(&a, &b, &c, &p3(0, 0, 1)), -1);
        assert_eq!(orient3d(&a, &b, &c, &p3(3, 4, 0)), 0);
    }

    #[test]
    fn insphere_signs() {
        let (a, b, c) = (p3(0, 0, 0), p3(1, 0, 0), p3(0, 1, 0));
        let d = p3(0, 0, -1);
        assert_eq!(orient3d(&a, &b, &c, &d), 1);
        let inside = Point::new([
            Rational::from((1, 4)),
            Rational::from((1, 4)),
            Rational::from((-1, 4)),
        ]);
        assert_eq!(insphere(&a, &b, &c, &d, &inside), 1);
        assert_eq!(insphere(&a, &b, &c, &d, &p3(5, 5, 5)), -1);
        assert_eq!(insphere(&a, &b, &c, &d, &p3(1, 1, -1)), 0);
    }

    #[test]
    fn in_line_order() {
        assert!(in_line(&p2(0, 0), &p2(1, 1), &p2(2, 2)));
        assert!(!in_line(&p2(1, 1), &p2(0, 0), &p2(2, 2)));
    }
}
