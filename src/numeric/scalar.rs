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

use rug::Rational;

use std::{
    fmt::Debug,
    ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign},
};

/// Coordinate field used by every geometric routine in the crate.
///
/// Two implementations exist: `f64` for the fast approximate configuration and
/// `rug::Rational` for the exact one. Arithmetic takes the right operand by
/// reference so that rationals are not cloned on every operation.
pub trait Scalar:
    Clone
    + Debug
    + Send
    + Sync
    + PartialEq
    + PartialOrd
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + for<'a> Add<&'a Self, Output = Self>
    + for<'a> Sub<&'a Self, Output = Self>
    + for<'a> Mul<&'a Self, Output = Self>
    + for<'a> Div<&'a Self, Output = Self>
    + for<'a> AddAssign<&'a Self>
    + for<'a> SubAssign<&'a Self>
    + From<i32>
{
    /// True when arithmetic on this type never rounds.
    const IS_EXACT: bool;

    fn zero() -> Self;

    fn one() -> Self;

    fn from_f64(v: f64) -> Self;

    fn from_num_den(num: i32, den: i32) -> Self;

    /// Nearest double to this value.
    fn to_f64(&self) -> f64;

    /// Exact rational value. For `f64` every finite value converts exactly.
    fn to_rational(&self) -> Rational;

    /// Returns -1, 0, or +1.
    fn sign(&self) -> i8;

    fn abs(&self) -> Self;

    fn is_zero(&self) -> bool {
        self.sign() == 0
    }

    fn is_positive(&self) -> bool {
        self.sign() > 0
    }

    fn is_negative(&self) -> bool {
        self.sign() < 0
    }

    /// `a + (b - a) * t`
    fn lerp(a: &Self, b: &Self, t: &Self) -> Self {
        let d = b.clone() - a;
        a.clone() + &(d * t)
    }
}
