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

//! Boolean operations on closed triangle meshes.
//!
//! The input is assumed to be already intersected: triangles meet only along
//! shared edges and vertices. The triangles are grouped into manifold
//! patches, space is split into cells bounded by patches, each cell gets a
//! winding number per input shape, and the output keeps the triangles that
//! separate cells inside the result from cells outside it. Meshes whose
//! winding number is not piecewise constant are classified by ray casting
//! instead.

pub mod cell;
pub mod extract;
pub mod nesting;
pub mod patch;
pub mod raycast;
pub mod sort;
pub mod winding;

use std::cmp::Ordering;

use tracing::{debug, warn};

use crate::{
    boolean::{
        cell::{find_cells, patch_cell_graph_ok},
        extract::extract_from_in_output_volume_diffs,
        nesting::{find_ambient_cell, finish_patch_cell_graph},
        patch::find_patches,
        raycast::{raycast_patches_boolean, raycast_tris_boolean},
        winding::{is_pwn, propagate_windings_and_in_output_volume},
    },
    error::GeokernResult,
    mesh::{polymesh::PolyMesh, topology::TriMeshTopology, trimesh::TriMesh},
    mesh_processing::{dissolve::polymesh_from_trimesh_with_dissolve, triangulate::triangulate_polymesh},
    numeric::scalar::Scalar,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BoolOpType {
    /// Only the intersection stage runs.
    None,
    Intersect,
    #[default]
    Union,
    /// Shape 0 minus every other shape.
    Difference,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BooleanOptions {
    pub op: BoolOpType,
    /// Also intersect triangles of the same shape with each other.
    pub use_self: bool,
    /// Classify triangle by triangle instead of patch by patch when the
    /// input has holes.
    pub hole_tolerant: bool,
}

/// Produces a mesh where triangles only meet at shared edges and vertices.
/// Output triangles keep the `orig` of the input triangle they lie in.
pub trait IntersectStage<T: Scalar> {
    fn intersect(
        &self,
        tm: &TriMesh<T>,
        nshapes: usize,
        shape_fn: &(dyn Fn(usize) -> usize + Sync),
        use_self: bool,
    ) -> TriMesh<T>;
}

/// Intersection stage for input that is already free of crossings. Merges
/// exactly coincident vertices and drops triangles that collapse.
#[derive(Clone, Copy, Debug, Default)]
pub struct PresplitSoup;

impl<T: Scalar> IntersectStage<T> for PresplitSoup {
    fn intersect(
        &self,
        tm: &TriMesh<T>,
        _nshapes: usize,
        _shape_fn: &(dyn Fn(usize) -> usize + Sync),
        _use_self: bool,
    ) -> TriMesh<T> {
        let mut order: Vec<usize> = (0..tm.verts.len()).collect();
        order.sort_by(|&a, &b| {
            tm.co(a)
                .exact
                .lex_cmp(&tm.co(b).exact)
                .then_with(|| a.cmp(&b))
        });
        let mut remap = vec![0usize; tm.verts.len()];
        let mut verts = Vec::with_capacity(tm.verts.len());
        let mut prev: Option<usize> = None;
        for v in order {
            match prev {
                Some(pv) if tm.co(pv).exact.lex_cmp(&tm.co(v).exact) == Ordering::Equal => {
                    remap[v] = remap[pv];
                }
                _ => {
                    remap[v] = verts.len();
                    verts.push(tm.verts[v].clone());
                    prev = Some(v);
                }
            }
        }
        let tris = tm
            .tris
            .iter()
            .filter_map(|tri| {
                let mut t = tri.clone();
                t.v = t.v.map(|v| remap[v]);
                (!t.is_degenerate()).then_some(t)
            })
            .collect();
        TriMesh::new(verts, tris).compact()
    }
}

/// Run the Boolean `options.op` on `tm`, whose triangle `t` belongs to
/// shape `shape_fn(tm.tris[t].orig)` in `0..nshapes`.
///
/// Output triangles are oriented with normals pointing out of the result.
/// When the patch/cell graph turns out inconsistent the input comes back
/// unchanged.
pub fn boolean_trimesh<T, F, I>(
    tm: &TriMesh<T>,
    options: &BooleanOptions,
    nshapes: usize,
    shape_fn: F,
    intersect: &I,
) -> TriMesh<T>
where
    T: Scalar,
    F: Fn(usize) -> usize + Sync,
    I: IntersectStage<T> + ?Sized,
{
    debug!(tris = tm.tris.len(), nshapes, ?options, "boolean_trimesh");
    let tm_si = intersect.intersect(tm, nshapes, &shape_fn, options.use_self);
    if tm_si.is_empty() || options.op == BoolOpType::None {
        return tm_si;
    }
    let topo = TriMeshTopology::new(&tm_si);
    if !is_pwn(&tm_si, &topo) {
        debug!("input is not piecewise constant winding, ray casting");
        if options.hole_tolerant {
            return raycast_tris_boolean(&tm_si, options.op, nshapes, shape_fn);
        }
        let pinfo = find_patches(&tm_si, &topo);
        return raycast_patches_boolean(&tm_si, options.op, nshapes, shape_fn, &pinfo);
    }
    match winding_boolean(&tm_si, &topo, options.op, nshapes, &shape_fn) {
        Ok(out) => out,
        Err(WindingFailure::Graph(err)) => {
            warn!(%err, "boolean: bad patch/cell graph, returning input");
            tm.clone()
        }
        Err(WindingFailure::Ambient(err)) => {
            warn!(%err, "boolean: returning intersected input");
            tm_si
        }
    }
}

enum WindingFailure {
    Graph(crate::error::GeokernError),
    Ambient(crate::error::GeokernError),
}

fn winding_boolean<T: Scalar, F>(
    tm: &TriMesh<T>,
    topo: &TriMeshTopology,
    op: BoolOpType,
    nshapes: usize,
    shape_fn: &F,
) -> Result<TriMesh<T>, WindingFailure>
where
    F: Fn(usize) -> usize + Sync,
{
    let graph = |r: GeokernResult<()>| r.map_err(WindingFailure::Graph);
    let mut pinfo = find_patches(tm, topo);
    let mut cinfo = find_cells(tm, topo, &mut pinfo).map_err(WindingFailure::Graph)?;
    graph(finish_patch_cell_graph(tm, &mut cinfo, &mut pinfo, topo))?;
    graph(patch_cell_graph_ok(&cinfo, &pinfo))?;
    cinfo.init_windings(nshapes);
    let c_ambient = find_ambient_cell(tm, None, topo, &pinfo).map_err(WindingFailure::Ambient)?;
    let c_ambient = cinfo.find(c_ambient);
    propagate_windings_and_in_output_volume(&pinfo, &mut cinfo, c_ambient, op, nshapes, shape_fn, tm);
    Ok(extract_from_in_output_volume_diffs(tm, &pinfo, &cinfo))
}

/// [`boolean_trimesh`] on a polygon mesh: triangulate, run the Boolean,
/// then merge the output triangles back into polygons. `shape_fn` maps an
/// input face index to its shape.
pub fn boolean_mesh<T, F, I>(
    pm: &PolyMesh<T>,
    options: &BooleanOptions,
    nshapes: usize,
    shape_fn: F,
    intersect: &I,
) -> PolyMesh<T>
where
    T: Scalar,
    F: Fn(usize) -> usize + Sync,
    I: IntersectStage<T> + ?Sized,
{
    let tm_in = triangulate_polymesh(pm);
    let tm_out = boolean_trimesh(&tm_in, options, nshapes, shape_fn, intersect);
    let mut out = polymesh_from_trimesh_with_dissolve(&tm_out, pm);
    out.compact();
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::point::Point3;

    #[test]
    fn presplit_merges_equal_vertices() {
        let tm = TriMesh::<f64>::from_soup(
            vec![
                Point3::new([0.0, 0.0, 0.0]),
                Point3::new([1.0, 0.0, 0.0]),
                Point3::new([0.0, 1.0, 0.0]),
                Point3::new([1.0, 0.0, 0.0]),
                Point3::new([1.0, 1.0, 0.0]),
            ],
            &[[0, 1, 2], [3, 4, 2], [1, 3, 4]],
        );
        let out = PresplitSoup.intersect(&tm, 1, &|_: usize| 0usize, false);
        assert_eq!(out.verts.len(), 4);
        assert_eq!(out.tris.len(), 2);
        assert_eq!(out.tris[0].v[1], out.tris[1].v[0]);
        assert_eq!(out.verts[out.tris[1].v[0]].orig, Some(1));
    }

    #[test]
    fn op_none_returns_the_intersected_mesh() {
        let tm = TriMesh::<f64>::from_soup(
            vec![
                Point3::new([0.0, 0.0, 0.0]),
                Point3::new([1.0, 0.0, 0.0]),
                Point3::new([0.0, 1.0, 0.0]),
            ],
            &[[0, 1, 2]],
        );
        let options = BooleanOptions {
            op: BoolOpType::None,
            ..BooleanOptions::default()
        };
        let out = boolean_trimesh(&tm, &options, 1, |_| 0, &PresplitSoup);
        assert_eq!(out.tris, tm.tris);
    }
}
