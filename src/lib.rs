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

//! Exact-geometry kernel: constrained Delaunay triangulation in the plane
//! and Boolean operations on triangle and polygon meshes.
//!
//! Every routine is generic over [`numeric::Scalar`], implemented for `f64`
//! and `rug::Rational`. Geometric predicates are evaluated in floating point
//! first and fall back to exact rational arithmetic when the result is too
//! close to call.

pub mod boolean;
pub mod error;
pub mod geometry;
pub mod kernel;
pub mod mesh;
pub mod mesh_processing;
pub mod numeric;
pub mod operations;

pub use boolean::{BoolOpType, BooleanOptions, IntersectStage, PresplitSoup, boolean_mesh, boolean_trimesh};
pub use error::{GeokernError, GeokernResult};
pub use mesh::{Face, PolyMesh, Tri, TriMesh, Vert};
pub use operations::triangulation::{
    CdtInput, CdtOutputType, CdtResult, FillRule, delaunay_2d_calc, delaunay_2d_calc_with_fill_rule,
};
