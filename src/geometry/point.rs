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

use std::{
    array::from_fn,
    cmp::Ordering,
    ops::{Index, IndexMut},
};

use crate::numeric::scalar::Scalar;

#[derive(Clone, Debug, PartialEq)]
pub struct Point<T: Scalar, const N: usize> {
    pub coords: [T; N],
}

pub type Point2<T> = Point<T, 2>;
pub type Point3<T> = Point<T, 3>;

impl<T: Scalar, const N: usize> Point<T, N> {
    pub fn new(coords: [T; N]) -> Self {
        Point { coords }
    }

    pub fn origin() -> Self {
        Point {
            coords: from_fn(|_| T::zero()),
        }
    }

    pub fn from_f64(vals: [f64; N]) -> Self {
        Point {
            coords: vals.map(T::from_f64),
        }
    }

    pub fn from_ints(vals: [i32; N]) -> Self {
        Point {
            coords: vals.map(T::from),
        }
    }

    pub fn to_f64(&self) -> [f64; N] {
        from_fn(|i| self.coords[i].to_f64())
    }

    pub fn sub(&self, other: &Self) -> Self {
        Point {
            coords: from_fn(|i| self.coords[i].clone() - &other.coords[i]),
        }
    }

    pub fn add(&self, other: &Self) -> Self {
        Point {
            coords: from_fn(|i| self.coords[i].clone() + &other.coords[i]),
        }
    }

    pub fn scale(&self, s: &T) -> Self {
        Point {
            coords: from_fn(|i| self.coords[i].clone() * s),
        }
    }

    pub fn dot(&self, other: &Self) -> T {
        let mut acc = T::zero();
        for i in 0..N {
            acc += &(self.coords[i].clone() * &other.coords[i]);
        }
        acc
    }

    pub fn length_squared(&self) -> T {
        self.dot(self)
    }

    pub fn distance_squared(&self, other: &Self) -> T {
        self.sub(other).length_squared()
    }

    /// Point at parameter `t` along the segment `self -> other`.
    pub fn interpolate(&self, other: &Self, t: &T) -> Self {
        Point {
            coords: from_fn(|i| T::lerp(&self.coords[i], &other.coords[i], t)),
        }
    }

    /// Lexicographic comparison, first coordinate most significant.
    pub fn lex_cmp(&self, other: &Self) -> Ordering {
        for i in 0..N {
            match self.coords[i].partial_cmp(&other.coords[i]) {
                Some(Ordering::Equal) | None => continue,
                Some(ord) => return ord,
            }
        }
        Ordering::Equal
    }
}

impl<T: Scalar> Point<T, 3> {
    pub fn cross(&self, other: &Self) -> Self {
        let [ax, ay, az] = &self.coords;
        let [bx, by, bz] = &other.coords;
        Point::new([
            ay.clone() * bz - &(az.clone() * by),
            az.clone() * bx - &(ax.clone() * bz),
            ax.clone() * by - &(ay.clone() * bx),
        ])
    }
}

impl<T: Scalar, const N: usize> Index<usize> for Point<T, N> {
    type Output = T;
    fn index(&self, i: usize) -> &Self::Output {
        &self.coords[i]
    }
}

impl<T: Scalar, const N: usize> IndexMut<usize> for Point<T, N> {
    fn index_mut(&mut self, i: usize) -> &mut Self::Output {
        &mut self.coords[i]
    }
}

/// Small fixed-size helpers for the `[f64; N]` approximations.
pub mod approx {
    pub fn sub<const N: usize>(a: &[f64; N], b: &[f64; N]) -> [f64; N] {
        std::array::from_fn(|i| a[i] - b[i])
    }

    pub fn dot<const N: usize>(a: &[f64; N], b: &[f64; N]) -> f64 {
        (0..N).map(|i| a[i] * b[i]).sum()
    }

    pub fn distance_squared<const N: usize>(a: &[f64; N], b: &[f64; N]) -> f64 {
        let d = sub(a, b);
        dot(&d, &d)
    }

    pub fn cross(a: &[f64; 3], b: &[f64; 3]) -> [f64; 3] {
        [
            a[1] * b[2] - a[2] * b[1],
            a[2] * b[0] - a[0] * b[2],
            a[0] * b[1] - a[1] * b[0],
        ]
    }

    pub fn normalized<const N: usize>(a: &[f64; N]) -> [f64; N] {
        let len = dot(a, a).sqrt();
        if len == 0.0 {
            return *a;
        }
        std::array::from_fn(|i| a[i] / len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rug::Rational;

    #[test]
    fn lexicographic_order() {
        let a = Point2::<f64>::new([0.0, 1.0]);
        let b = Point2::<f64>::new([0.0, 2.0]);
        let c = Point2::<f64>::new([-1.0, 5.0]);
        assert_eq!(a.lex_cmp(&b), Ordering::Less);
        assert_eq!(b.lex_cmp(&c), Ordering::Greater);
        assert_eq!(a.lex_cmp(&a.clone()), Ordering::Equal);
    }

    #[test]
    fn exact_interpolation() {
        let a = Point2::<Rational>::from_ints([0, 0]);
        let b = Point2::<Rational>::from_ints([3, 1]);
        let m = a.interpolate(&b, &Rational::from((1, 3)));
        assert_eq!(m, Point2::new([Rational::from(1), Rational::from((1, 3))]));
    }

    #[test]
    fn cross_product_right_handed() {
        let x = Point3::<f64>::new([1.0, 0.0, 0.0]);
        let y = Point3::<f64>::new([0.0, 1.0, 0.0]);
        assert_eq!(x.cross(&y), Point3::new([0.0, 0.0, 1.0]));
    }
}
