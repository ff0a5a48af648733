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

use thiserror::Error;

/// Internal failure modes of the triangulation and Boolean engines.
///
/// Public entry points never return these; they log the error and fall back
/// to a partial or unchanged result.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeokernError {
    /// The walk along a constraint segment could not find its next crossing,
    /// or came back to a vertex it already passed through.
    #[error("constraint walk from vertex {from} to vertex {to} got stuck")]
    CrossingWalk { from: usize, to: usize },

    #[error("constraint from vertex {from} to vertex {to} exceeded {limit} crossings")]
    CrossingLimit { from: usize, to: usize, limit: usize },

    #[error("patch/cell graph is inconsistent: {0}")]
    PatchCellGraph(String),

    #[error("could not find an ambient cell for component {0}")]
    NoAmbientCell(usize),

    #[error("index {index} out of range (len {len})")]
    InvalidIndex { index: usize, len: usize },
}

pub type GeokernResult<T> = Result<T, GeokernError>;
