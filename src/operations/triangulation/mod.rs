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

//! Constrained Delaunay triangulation of points, segments and polygons.
//!
//! Input points are triangulated by divide and conquer, then every edge and
//! face constraint is inserted by walking its segment through the current
//! triangulation. The result can be trimmed to different extents
//! ([`CdtOutputType`]) and keeps, per output element, the ids of the input
//! elements it came from.

pub mod arrangement;
pub mod constraint;
pub mod delaunay;
pub mod output;

use tracing::debug;

use crate::{
    geometry::point::Point2,
    numeric::scalar::Scalar,
    operations::triangulation::{
        arrangement::CdtArrangement,
        constraint::{add_edge_constraints, add_face_constraints},
        delaunay::initial_triangulation,
        output::{get_cdt_output, prepare_cdt_for_output},
    },
};

/// What to keep of the full triangulation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CdtOutputType {
    /// Every triangle of the convex hull.
    #[default]
    Full,
    /// Only faces enclosed by constraints.
    Inside,
    /// Like `Inside`, also removing regions the fill rule marks as holes.
    InsideWithHoles,
    /// Only the constraint edges; faces are whatever they bound.
    Constraints,
    /// Like `Constraints`, but keep triangulation edges where removing them
    /// would make a face touch itself.
    ConstraintsValidBmesh,
    ConstraintsValidBmeshWithHoles,
}

/// How nested or overlapping face constraints decide what is a hole.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FillRule {
    /// A region is filled when a ray from it crosses an odd number of
    /// constraint edges.
    #[default]
    EvenOdd,
    /// A region is filled when the face boundaries wind around it a
    /// non-zero number of times.
    NonZero,
}

#[derive(Clone, Debug)]
pub struct CdtInput<T: Scalar> {
    pub vert: Vec<Point2<T>>,
    pub edge: Vec<(usize, usize)>,
    pub face: Vec<Vec<usize>>,
    /// Snapping distance for near-vertex crossings. Unused for exact
    /// scalars.
    pub epsilon: T,
    pub need_ids: bool,
}

impl<T: Scalar> Default for CdtInput<T> {
    fn default() -> Self {
        CdtInput {
            vert: Vec::new(),
            edge: Vec::new(),
            face: Vec::new(),
            epsilon: T::zero(),
            need_ids: true,
        }
    }
}

/// Triangulation result. The `*_orig` vectors are parallel to `vert`,
/// `edge` and `face` and stay empty unless ids were requested.
///
/// Edge ids below `face_edge_offset` are input edge indices; an id
/// `(f + 1) * face_edge_offset + k` stands for edge `k` of input face `f`.
#[derive(Clone, Debug)]
pub struct CdtResult<T: Scalar> {
    pub vert: Vec<Point2<T>>,
    pub edge: Vec<(usize, usize)>,
    pub face: Vec<Vec<usize>>,
    pub vert_orig: Vec<Vec<usize>>,
    pub edge_orig: Vec<Vec<usize>>,
    pub face_orig: Vec<Vec<usize>>,
    pub face_edge_offset: usize,
}

impl<T: Scalar> Default for CdtResult<T> {
    fn default() -> Self {
        CdtResult {
            vert: Vec::new(),
            edge: Vec::new(),
            face: Vec::new(),
            vert_orig: Vec::new(),
            edge_orig: Vec::new(),
            face_orig: Vec::new(),
            face_edge_offset: 0,
        }
    }
}

impl<T: Scalar> CdtResult<T> {
    /// Decode an edge id into `(face, position)` when it came from a face
    /// boundary.
    pub fn face_edge(&self, id: usize) -> Option<(usize, usize)> {
        if self.face_edge_offset == 0 || id < self.face_edge_offset {
            return None;
        }
        Some((id / self.face_edge_offset - 1, id % self.face_edge_offset))
    }
}

/// Arrangement plus the bookkeeping carried between construction stages.
pub struct CdtState<T: Scalar> {
    pub cdt: CdtArrangement<T>,
    pub epsilon: T,
    pub face_edge_offset: usize,
    pub need_ids: bool,
}

pub fn delaunay_2d_calc<T: Scalar>(input: &CdtInput<T>, output_type: CdtOutputType) -> CdtResult<T> {
    delaunay_2d_calc_with_fill_rule(input, output_type, FillRule::EvenOdd)
}

pub fn delaunay_2d_calc_with_fill_rule<T: Scalar>(
    input: &CdtInput<T>,
    output_type: CdtOutputType,
    fill_rule: FillRule,
) -> CdtResult<T> {
    debug!(
        verts = input.vert.len(),
        edges = input.edge.len(),
        faces = input.face.len(),
        ?output_type,
        "delaunay_2d_calc"
    );
    let mut state = CdtState {
        cdt: CdtArrangement::new(&input.vert),
        epsilon: input.epsilon.clone(),
        face_edge_offset: 0,
        need_ids: input.need_ids,
    };
    initial_triangulation(&mut state.cdt);
    add_edge_constraints(&mut state, input);
    add_face_constraints(&mut state, input);
    prepare_cdt_for_output(&mut state, input, output_type, fill_rule);
    get_cdt_output(&state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rug::Rational;

    fn input_f64(verts: &[(f64, f64)]) -> CdtInput<f64> {
        CdtInput {
            vert: verts.iter().map(|&(x, y)| Point2::new([x, y])).collect(),
            ..CdtInput::default()
        }
    }

    #[test]
    fn unit_square_full() {
        let input = input_f64(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]);
        let out = delaunay_2d_calc(&input, CdtOutputType::Full);
        assert_eq!(out.vert.len(), 4);
        assert_eq!(out.edge.len(), 5);
        assert_eq!(out.face.len(), 2);
        assert!(out.face.iter().all(|f| f.len() == 3));
    }

    #[test]
    fn coincident_points_merge() {
        let input = input_f64(&[(0.0, 0.0), (0.0, 0.0)]);
        let out = delaunay_2d_calc(&input, CdtOutputType::Full);
        assert_eq!(out.vert.len(), 1);
        assert_eq!(out.vert_orig, vec![vec![0, 1]]);
        assert!(out.edge.is_empty());
    }

    #[test]
    fn square_face_constraint_inside() {
        let mut input = CdtInput::<Rational> {
            vert: [(0, 0), (2, 0), (2, 2), (0, 2), (1, 5)]
                .iter()
                .map(|&(x, y)| Point2::from_ints([x, y]))
                .collect(),
            ..CdtInput::default()
        };
        input.face = vec![vec![0, 1, 2, 3]];
        let out = delaunay_2d_calc(&input, CdtOutputType::Inside);
        assert_eq!(out.face.len(), 2);
        assert!(out.face_orig.iter().all(|ids| ids == &vec![0]));
        assert_eq!(out.face_edge_offset, 10);

        let out = delaunay_2d_calc(&input, CdtOutputType::Constraints);
        assert_eq!(out.edge.len(), 4);
        // The square plus the outside region enclosing it and the lone point.
        assert_eq!(out.face.len(), 1);
        assert_eq!(out.face[0].len(), 4);
        for ids in &out.edge_orig {
            assert_eq!(ids.len(), 1);
            assert_eq!(out.face_edge(ids[0]).map(|(f, _)| f), Some(0));
        }
    }
}
