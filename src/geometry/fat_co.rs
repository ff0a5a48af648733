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

/// A coordinate carried in both exact and approximate form.
///
/// `exact` is authoritative. `approx` is its nearest double and `abs_approx`
/// the component-wise absolute value of `approx`; both feed the error bounds
/// of the filtered predicates.
#[derive(Clone, Debug)]
pub struct FatCo<T: Scalar, const N: usize> {
    pub exact: Point<T, N>,
    pub approx: [f64; N],
    pub abs_approx: [f64; N],
}

pub type FatCo2<T> = FatCo<T, 2>;
pub type FatCo3<T> = FatCo<T, 3>;

impl<T: Scalar, const N: usize> FatCo<T, N> {
    pub fn new(exact: Point<T, N>) -> Self {
        let approx = exact.to_f64();
        let abs_approx = from_fn(|i| approx[i].abs());
        FatCo {
            exact,
            approx,
            abs_approx,
        }
    }

    pub fn from_f64(vals: [f64; N]) -> Self {
        Self::new(Point::from_f64(vals))
    }

    /// Replace the exact value and refresh the caches.
    pub fn set(&mut self, exact: Point<T, N>) {
        *self = Self::new(exact);
    }
}

impl<T: Scalar, const N: usize> From<Point<T, N>> for FatCo<T, N> {
    fn from(p: Point<T, N>) -> Self {
        FatCo::new(p)
    }
}

impl<T: Scalar, const N: usize> PartialEq for FatCo<T, N> {
    fn eq(&self, other: &Self) -> bool {
        self.exact == other.exact
    }
}
