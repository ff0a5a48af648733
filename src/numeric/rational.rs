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

use std::cmp::Ordering;

use rug::Rational;

use crate::numeric::scalar::Scalar;

impl Scalar for Rational {
    const IS_EXACT: bool = true;

    fn zero() -> Self {
        Rational::new()
    }

    fn one() -> Self {
        Rational::from(1)
    }

    fn from_f64(v: f64) -> Self {
        Rational::from_f64(v).unwrap_or_default()
    }

    fn from_num_den(num: i32, den: i32) -> Self {
        Rational::from((num, den))
    }

    fn to_f64(&self) -> f64 {
        Rational::to_f64(self)
    }

    fn to_rational(&self) -> Rational {
        self.clone()
    }

    fn sign(&self) -> i8 {
        match self.cmp0() {
            Ordering::Less => -1,
            Ordering::Equal => 0,
            Ordering::Greater => 1,
        }
    }

    fn abs(&self) -> Self {
        self.clone().abs()
    }

    fn is_zero(&self) -> bool {
        self.cmp0() == Ordering::Equal
    }
}
