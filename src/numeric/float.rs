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

use num_traits::{Float, One, Zero};
use rug::Rational;

use crate::numeric::scalar::Scalar;

impl Scalar for f64 {
    const IS_EXACT: bool = false;

    #[inline]
    fn zero() -> Self {
        <f64 as Zero>::zero()
    }

    #[inline]
    fn one() -> Self {
        <f64 as One>::one()
    }

    #[inline]
    fn from_f64(v: f64) -> Self {
        v
    }

    #[inline]
    fn from_num_den(num: i32, den: i32) -> Self {
        num as f64 / den as f64
    }

    #[inline]
    fn to_f64(&self) -> f64 {
        *self
    }

    fn to_rational(&self) -> Rational {
        // NaN and infinities have no rational value; they only arise from
        // invalid input and are treated as zero.
        Rational::from_f64(*self).unwrap_or_default()
    }

    #[inline]
    fn sign(&self) -> i8 {
        if *self > 0.0 {
            1
        } else if *self < 0.0 {
            -1
        } else {
            0
        }
    }

    #[inline]
    fn abs(&self) -> Self {
        Float::abs(*self)
    }

    #[inline]
    fn is_zero(&self) -> bool {
        Zero::is_zero(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_rational_is_exact() {
        let v = 0.1_f64;
        let r = v.to_rational();
        assert_eq!(r.to_f64(), v);
        // 0.1 is not representable, so the rational must not be 1/10.
        assert_ne!(r, Rational::from((1, 10)));
    }

    #[test]
    fn sign_of_signed_zero() {
        assert_eq!((-0.0_f64).sign(), 0);
        assert_eq!(2.5_f64.sign(), 1);
        assert_eq!((-2.5_f64).sign(), -1);
    }
}
