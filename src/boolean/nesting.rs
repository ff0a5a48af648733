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

//! Connecting the patch/cell graph of separate, possibly nested solids.

use tracing::{debug, trace};

use crate::{
    boolean::{
        cell::CellsInfo,
        patch::PatchesInfo,
        sort::{EXTRA_TRI, ExtraTri, find_flap_vert, sort_tris_around_edge},
    },
    error::{GeokernError, GeokernResult},
    geometry::{aabb::Aabb, fat_co::FatCo3, point::Point3},
    mesh::{
        topology::{Edge, TriMeshTopology},
        trimesh::TriMesh,
    },
    numeric::scalar::Scalar,
};

/// Patches connected through shared cells. Sets `component` on each patch.
pub fn find_patch_components(cinfo: &CellsInfo, pinfo: &mut PatchesInfo) -> Vec<Vec<usize>> {
    let mut cell_processed = vec![false; cinfo.len()];
    let mut components: Vec<Vec<usize>> = Vec::new();
    let mut stack = Vec::new();
    for pstart in 0..pinfo.len() {
        if pinfo.patches[pstart].component.is_some() {
            continue;
        }
        let comp = components.len();
        components.push(vec![pstart]);
        pinfo.patches[pstart].component = Some(comp);
        stack.push(pstart);
        while let Some(p) = stack.pop() {
            let cells = [pinfo.patches[p].cell_above, pinfo.patches[p].cell_below];
            for c in cells {
                if cell_processed[c] {
                    continue;
                }
                cell_processed[c] = true;
                for &pn in &cinfo.cells[c].patches {
                    if pinfo.patches[pn].component.is_none() {
                        pinfo.patches[pn].component = Some(comp);
                        stack.push(pn);
                        components[comp].push(pn);
                    }
                }
            }
        }
    }
    components
}

/// Which cell around `e` contains `p`: sort a probe triangle through `p`
/// in with the triangles on `e` and read the cell behind its predecessor.
fn find_cell_for_point_near_edge<T: Scalar>(
    p: &Point3<T>,
    e: Edge,
    tm: &TriMesh<T>,
    topo: &TriMeshTopology,
    pinfo: &PatchesInfo,
) -> GeokernResult<usize> {
    let etris = topo
        .edge_tris(e)
        .ok_or_else(|| GeokernError::PatchCellGraph(format!("no triangles on edge {e:?}")))?;
    let extra = ExtraTri::on_edge(e, FatCo3::new(p.clone()));
    let mut tris: Vec<usize> = etris.to_vec();
    tris.push(EXTRA_TRI);
    let sorted = sort_tris_around_edge(tm, e, &tris, tris[0], Some(&extra));
    let n = sorted.len();
    let dummy_index = sorted
        .iter()
        .position(|&t| t == EXTRA_TRI)
        .ok_or_else(|| GeokernError::PatchCellGraph("probe triangle lost in sort".into()))?;
    let prev_tri = sorted[(dummy_index + n - 1) % n];
    let prev_patch = &pinfo.patches[pinfo.tri_patch(prev_tri)];
    let (_, prev_flipped) = find_flap_vert(&tm.tris[prev_tri].v, e)
        .ok_or_else(|| GeokernError::PatchCellGraph(format!("triangle {prev_tri} lost edge")))?;
    Ok(if prev_flipped {
        prev_patch.cell_below
    } else {
        prev_patch.cell_above
    })
}

/// The outermost cell of the whole mesh, or of the given patches only.
///
/// An edge at the vertex of largest x with the steepest XY slope lies on
/// the convex hull; a probe one unit further along +x is outside
/// everything.
pub fn find_ambient_cell<T: Scalar>(
    tm: &TriMesh<T>,
    component_patches: Option<&[usize]>,
    topo: &TriMeshTopology,
    pinfo: &PatchesInfo,
) -> GeokernResult<usize> {
    let tris: Box<dyn Iterator<Item = usize>> = match component_patches {
        Some(patches) => Box::new(
            patches
                .iter()
                .flat_map(move |&p| pinfo.patches[p].tris.iter().copied()),
        ),
        None => Box::new(0..tm.tris.len()),
    };
    let mut v_extreme: Option<usize> = None;
    for t in tris {
        for &v in &tm.tris[t].v {
            let better = match v_extreme {
                None => true,
                Some(ve) => tm.co(v).exact[0] > tm.co(ve).exact[0],
            };
            if better {
                v_extreme = Some(v);
            }
        }
    }
    let v_extreme = v_extreme.ok_or(GeokernError::NoAmbientCell(0))?;
    let co_extreme = &tm.co(v_extreme).exact;

    let mut ehull: Option<Edge> = None;
    let mut max_abs_slope: Option<T> = None;
    for &e in topo.vert_edges(v_extreme) {
        let co_other = &tm.co(e.other(v_extreme)).exact;
        let delta_x = co_other[0].clone() - &co_extreme[0];
        if delta_x.is_zero() {
            ehull = Some(e);
            break;
        }
        let abs_slope = ((co_other[1].clone() - &co_extreme[1]) / delta_x).abs();
        if max_abs_slope.as_ref().is_none_or(|m| abs_slope > *m) {
            ehull = Some(e);
            max_abs_slope = Some(abs_slope);
        }
    }
    let ehull = ehull.ok_or(GeokernError::NoAmbientCell(v_extreme))?;
    let mut p_in_ambient = co_extreme.clone();
    p_in_ambient[0] += &T::one();
    let c = find_cell_for_point_near_edge(&p_in_ambient, ehull, tm, topo, pinfo)?;
    trace!(v_extreme, cell = c, "find_ambient_cell");
    Ok(c)
}

/// An edge at `closest` that is safe to sort a probe triangle through
/// `test` around: the one with the steepest slope when edges are projected
/// on a plane containing `test - closest` as abscissa.
fn find_good_sorting_edge<T: Scalar>(
    test: &Point3<T>,
    closest: usize,
    tm: &TriMesh<T>,
    topo: &TriMeshTopology,
) -> Option<Edge> {
    let co_closest = &tm.co(closest).exact;
    let abscissa = test.sub(co_closest);
    let axis = (0..3).find(|&i| !abscissa[i].is_zero())?;
    let axis_next = (axis + 1) % 3;
    let axis_next_next = (axis_next + 1) % 3;
    let mut ordinate = Point3::<T>::origin();
    ordinate[axis] = abscissa[axis_next].clone();
    ordinate[axis_next] = -abscissa[axis].clone();
    ordinate[axis_next_next] = T::zero();
    let normal = abscissa.cross(&ordinate);
    let nlen2 = normal.length_squared();

    let mut esort = None;
    let mut max_abs_slope: Option<T> = None;
    for &e in topo.vert_edges(closest) {
        let evec = tm.co(e.other(closest)).exact.sub(co_closest);
        let proj = evec.sub(&normal.scale(&(evec.dot(&normal) / nlen2.clone())));
        let evec_a = proj.dot(&abscissa);
        let evec_o = proj.dot(&ordinate);
        if evec_a.is_zero() {
            return Some(e);
        }
        let abs_slope = (evec_o / evec_a).abs();
        if max_abs_slope.as_ref().is_none_or(|m| abs_slope > *m) {
            esort = Some(e);
            max_abs_slope = Some(abs_slope);
        }
    }
    esort
}

/// Part of a triangle nearest to a query point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TriFeature {
    Vert(usize),
    /// Edge `i` runs from corner `i` to corner `(i + 1) % 3`.
    Edge(usize),
    Interior,
}

/// Squared distance from `p` to triangle `(a, b, c)` and the feature
/// holding the nearest point (Ericson, "Real-Time Collision Detection"
/// 5.1.5).
pub fn closest_on_tri_to_point<T: Scalar>(
    p: &Point3<T>,
    a: &Point3<T>,
    b: &Point3<T>,
    c: &Point3<T>,
) -> (T, TriFeature) {
    let ab = b.sub(a);
    let ac = c.sub(a);
    let ap = p.sub(a);
    let d1 = ab.dot(&ap);
    let d2 = ac.dot(&ap);
    if !d1.is_positive() && !d2.is_positive() {
        return (p.distance_squared(a), TriFeature::Vert(0));
    }
    let bp = p.sub(b);
    let d3 = ab.dot(&bp);
    let d4 = ac.dot(&bp);
    if !d3.is_negative() && d4 <= d3 {
        return (p.distance_squared(b), TriFeature::Vert(1));
    }
    let vc = d1.clone() * &d4 - &(d3.clone() * &d2);
    if !vc.is_positive() && !d1.is_negative() && !d3.is_positive() {
        let v = d1.clone() / (d1.clone() - &d3);
        let r = a.add(&ab.scale(&v));
        return (p.distance_squared(&r), TriFeature::Edge(0));
    }
    let cp = p.sub(c);
    let d5 = ab.dot(&cp);
    let d6 = ac.dot(&cp);
    if !d6.is_negative() && d5 <= d6 {
        return (p.distance_squared(c), TriFeature::Vert(2));
    }
    let vb = d5.clone() * &d2 - &(d1.clone() * &d6);
    if !vb.is_positive() && !d2.is_negative() && !d6.is_positive() {
        let w = d2.clone() / (d2.clone() - &d6);
        let r = a.add(&ac.scale(&w));
        return (p.distance_squared(&r), TriFeature::Edge(2));
    }
    let va = d3.clone() * &d6 - &(d5.clone() * &d4);
    let d43 = d4 - &d3;
    let d56 = d5 - &d6;
    if !va.is_positive() && !d43.is_negative() && !d56.is_negative() {
        let w = d43.clone() / (d43 + &d56);
        let r = b.add(&c.sub(b).scale(&w));
        return (p.distance_squared(&r), TriFeature::Edge(1));
    }
    let denom = T::one() / (va + &vb + &vc);
    let v = vb * &denom;
    let w = vc * &denom;
    let r = a.add(&ab.scale(&v)).add(&ac.scale(&w));
    (p.distance_squared(&r), TriFeature::Interior)
}

/// Cell holding vertex `v`, found by sorting around an edge of triangle
/// `t` near `v`.
fn find_containing_cell<T: Scalar>(
    v: usize,
    t: usize,
    feature: TriFeature,
    pinfo: &PatchesInfo,
    tm: &TriMesh<T>,
    topo: &TriMeshTopology,
) -> GeokernResult<usize> {
    let tri = tm.tris[t].v;
    let etest = match feature {
        TriFeature::Edge(i) => Some(Edge::new(tri[i], tri[(i + 1) % 3])),
        TriFeature::Interior => Some(Edge::new(tri[0], tri[1])),
        TriFeature::Vert(i) => find_good_sorting_edge(&tm.co(v).exact, tri[i], tm, topo),
    };
    let etest = etest.ok_or_else(|| GeokernError::PatchCellGraph(format!("no sorting edge near vertex {v}")))?;
    find_cell_for_point_near_edge(&tm.co(v).exact, etest, tm, topo, pinfo)
}

pub struct ComponentContainer<T: Scalar> {
    pub containing_component: usize,
    pub nearest_cell: usize,
    pub dist_to_cell: T,
}

fn component_bounds<T: Scalar>(
    comp: &[usize],
    tm: &TriMesh<T>,
    pinfo: &PatchesInfo,
) -> Option<Aabb<f64, 3>> {
    let mut pts = comp
        .iter()
        .flat_map(|&p| pinfo.patches[p].tris.iter())
        .flat_map(|&t| tm.tris[t].v.iter())
        .map(|&v| Point3::new(tm.co(v).approx));
    let first = pts.next()?;
    let mut bb = Aabb::from_points(&first, &first);
    for p in pts {
        bb.add_point(&p);
    }
    Some(bb)
}

/// Components other than `comp` that hold a vertex of `comp` in one of
/// their non-ambient cells.
fn find_component_containers<T: Scalar>(
    comp: usize,
    components: &[Vec<usize>],
    bounds: &[Option<Aabb<f64, 3>>],
    ambient_cell: &[usize],
    tm: &TriMesh<T>,
    pinfo: &PatchesInfo,
    cinfo: &mut CellsInfo,
    topo: &TriMeshTopology,
) -> GeokernResult<Vec<ComponentContainer<T>>> {
    let mut ans = Vec::new();
    let test_p = components[comp][0];
    let test_t = pinfo.patches[test_p].tris[0];
    let test_v = tm.tris[test_t].v[0];
    let test_co = &tm.co(test_v).exact;
    for (comp_other, other_patches) in components.iter().enumerate() {
        if comp_other == comp {
            continue;
        }
        if let (Some(bb), Some(bb_other)) = (&bounds[comp], &bounds[comp_other]) {
            if !bb.intersects(bb_other) {
                continue;
            }
        }
        let mut nearest: Option<(usize, TriFeature, T)> = None;
        for &p in other_patches {
            for &t in &pinfo.patches[p].tris {
                let [a, b, c] = tm.tri_co(t);
                let (d2, feature) = closest_on_tri_to_point(test_co, &a.exact, &b.exact, &c.exact);
                if nearest.as_ref().is_none_or(|(_, _, best)| d2 < *best) {
                    nearest = Some((t, feature, d2));
                }
            }
        }
        let Some((t, feature, d2)) = nearest else {
            continue;
        };
        let containing = find_containing_cell(test_v, t, feature, pinfo, tm, topo)?;
        if cinfo.find(containing) != cinfo.find(ambient_cell[comp_other]) {
            ans.push(ComponentContainer {
                containing_component: comp_other,
                nearest_cell: containing,
                dist_to_cell: d2,
            });
        }
    }
    Ok(ans)
}

/// Join the separate components of the patch/cell graph: nested
/// components have their ambient cell merged into the nearest cell that
/// contains them, and the ambient cells of all outermost components are
/// merged together.
pub fn finish_patch_cell_graph<T: Scalar>(
    tm: &TriMesh<T>,
    cinfo: &mut CellsInfo,
    pinfo: &mut PatchesInfo,
    topo: &TriMeshTopology,
) -> GeokernResult<()> {
    let components = find_patch_components(cinfo, pinfo);
    if components.len() <= 1 {
        return Ok(());
    }
    debug!(components = components.len(), "finish_patch_cell_graph");
    let ambient_cell = components
        .iter()
        .map(|comp| find_ambient_cell(tm, Some(comp), topo, pinfo))
        .collect::<GeokernResult<Vec<usize>>>()?;
    // Padding keeps touching boxes from being rejected on rounding.
    let bounds: Vec<Option<Aabb<f64, 3>>> = components
        .iter()
        .map(|comp| component_bounds(comp, tm, pinfo).map(|bb| bb.padded(&1e-6)))
        .collect();
    let mut comp_cont = Vec::with_capacity(components.len());
    for comp in 0..components.len() {
        comp_cont.push(find_component_containers(
            comp,
            &components,
            &bounds,
            &ambient_cell,
            tm,
            pinfo,
            cinfo,
            topo,
        )?);
    }
    let mut outer_components = Vec::new();
    for (comp, conts) in comp_cont.iter().enumerate() {
        let closest = conts.iter().reduce(|best, cc| {
            if cc.dist_to_cell < best.dist_to_cell {
                cc
            } else {
                best
            }
        });
        match closest {
            None => outer_components.push(comp),
            Some(cc) => {
                trace!(
                    comp,
                    container = cc.containing_component,
                    cell = cc.nearest_cell,
                    "nested component"
                );
                cinfo.merge(cc.nearest_cell, ambient_cell[comp], pinfo);
            }
        }
    }
    if let Some((&first, rest)) = outer_components.split_first() {
        for &comp in rest {
            cinfo.merge(ambient_cell[first], ambient_cell[comp], pinfo);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rug::Rational;

    fn p(x: i32, y: i32, z: i32) -> Point3<Rational> {
        Point3::from_ints([x, y, z])
    }

    #[test]
    fn closest_point_regions() {
        let (a, b, c) = (p(0, 0, 0), p(4, 0, 0), p(0, 4, 0));
        let (d2, f) = closest_on_tri_to_point(&p(-1, -1, 0), &a, &b, &c);
        assert_eq!((d2, f), (Rational::from(2), TriFeature::Vert(0)));
        let (d2, f) = closest_on_tri_to_point(&p(2, -3, 0), &a, &b, &c);
        assert_eq!((d2, f), (Rational::from(9), TriFeature::Edge(0)));
        let (d2, f) = closest_on_tri_to_point(&p(3, 3, 0), &a, &b, &c);
        assert_eq!((d2, f), (Rational::from(2), TriFeature::Edge(1)));
        let (d2, f) = closest_on_tri_to_point(&p(1, 1, 5), &a, &b, &c);
        assert_eq!((d2, f), (Rational::from(25), TriFeature::Interior));
        let (_, f) = closest_on_tri_to_point(&p(-2, 2, 0), &a, &b, &c);
        assert_eq!(f, TriFeature::Edge(2));
    }
}
