// Copyright (C) 2023 setzer22 and contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mesh smoothing. Runs on the triangulation before any polygon is generated
//! and only ever relocates vertices: connectivity is never touched.
//!
//! Every strategy skips border vertices, vertices with no incident edge and,
//! in region mode, vertices sitting on a boundary between two region ids.

use glam::DVec2;

use crate::geom;
use crate::prelude::*;

/// Iterations stop contributing once the aggregate movement of a pass drops
/// below this fraction of the first observed movement.
const CONVERGENCE_RATIO: f64 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SmoothMethod {
    /// Move each vertex to the average of its neighbors.
    Laplacian,
    /// Laplacian displacement, kept only when it strictly improves the
    /// edge-ratio quality of the surrounding faces.
    LaplacianEdgeRatio,
    /// Spring relaxation towards a target edge length, attraction only.
    Distmesh,
}

/// A per-face quality measure the constrained smoother can optimize. Only two
/// capabilities are needed: evaluating one face and comparing two aggregate
/// values.
pub trait Measure {
    /// Evaluates the face incident to halfedge `e` by walking its next-cycle.
    fn eval_face(&self, mesh: &TriangleMesh, e: usize) -> f64;
    /// Whether quality `a` beats quality `b`.
    fn is_better(&self, a: f64, b: f64) -> bool;
}

/// Shortest to longest edge length of the face. 1 for an equilateral
/// triangle, towards 0 for a sliver.
pub struct EdgeRatio;

impl Measure for EdgeRatio {
    fn eval_face(&self, mesh: &TriangleMesh, e: usize) -> f64 {
        let mut max_edge = -1.0_f64;
        let mut min_edge = -1.0_f64;
        let mut e_curr = e;
        loop {
            let length = mesh.distance(e_curr);
            if max_edge < 0.0 {
                max_edge = length;
            }
            if min_edge < 0.0 {
                min_edge = length;
            }
            max_edge = max_edge.max(length);
            min_edge = min_edge.min(length);
            e_curr = mesh.next(e_curr);
            if e_curr == e {
                break;
            }
        }
        min_edge / max_edge
    }

    fn is_better(&self, a: f64, b: f64) -> bool {
        a > b
    }
}

/// Entry point used by the pipeline. Returns the number of iterations that
/// actually ran.
pub fn smooth_mesh(
    mesh: &mut TriangleMesh,
    method: SmoothMethod,
    iterations: u32,
    target_length: Option<f64>,
    use_regions: bool,
) -> Result<u32> {
    match method {
        SmoothMethod::Laplacian => Ok(smooth_laplacian(mesh, iterations, use_regions)),
        SmoothMethod::LaplacianEdgeRatio => Ok(smooth_laplacian_constrained(
            mesh,
            iterations,
            use_regions,
            &EdgeRatio,
        )),
        SmoothMethod::Distmesh => {
            let target = match target_length {
                Some(t) => t,
                None => mesh.mean_halfedge_length(),
            };
            if target <= 0.0 {
                bail!("Target length must be positive for the distmesh method");
            }
            Ok(smooth_distmesh(mesh, iterations, target, use_regions))
        }
    }
}

/// A vertex sits on a region boundary when any incident edge separates faces
/// with different region ids. Border vertices count as region boundaries too.
fn is_region_boundary_vertex(mesh: &TriangleMesh, v: usize) -> bool {
    let e_init = match mesh.edge_of_vertex(v) {
        Some(e) => e,
        None => return false,
    };
    if mesh.is_border_vertex(v) {
        return true;
    }
    for e in mesh.ccw_fan(e_init) {
        if let (Some(f1), Some(f2)) = (mesh.face_of(e), mesh.face_of(mesh.twin(e))) {
            if mesh.face_region(f1) != mesh.face_region(f2) {
                return true;
            }
        }
    }
    false
}

/// Precomputed once per smoothing session; empty when regions are off.
fn region_boundary_cache(mesh: &TriangleMesh, use_regions: bool) -> Vec<bool> {
    if !use_regions {
        return Vec::new();
    }
    (0..mesh.num_vertices())
        .map(|v| is_region_boundary_vertex(mesh, v))
        .collect()
}

/// Whether the fan around `v` is still untangled after moving it. Scans each
/// fan face, pairing every halfedge against the others of its cycle: skipping
/// identical and head-to-tail adjacent pairs, collinear parallel pairs are
/// rejected when an endpoint of one segment falls strictly inside the other's
/// open bounding box, and non-parallel non-adjacent pairs when they properly
/// intersect.
fn is_valid_move(mesh: &TriangleMesh, v: usize) -> bool {
    let e_init = match mesh.edge_of_vertex(v) {
        Some(e) => e,
        None => return true,
    };
    let mut e_next = e_init;
    loop {
        let first_edge = e_next;
        let mut curr_edge = mesh.prev(first_edge);
        loop {
            let e_init_2 = mesh.next(curr_edge);
            let mut e_next_2 = e_init_2;
            loop {
                let v0 = mesh.origin(curr_edge);
                let v1 = mesh.target(curr_edge);
                let v2 = mesh.origin(e_next_2);
                let v3 = mesh.target(e_next_2);
                if curr_edge != e_next_2 && v3 != v0 {
                    let p0 = mesh.point(v0);
                    let p1 = mesh.point(v1);
                    let p2 = mesh.point(v2);
                    let p3 = mesh.point(v3);
                    if geom::parallel(p0, p1, p2, p3) {
                        if geom::is_collinear(p0, p1, p3) {
                            if v1 == v2 {
                                // adjacent
                                if geom::in_range(p3, p0, p1) || geom::in_range(p0, p2, p3) {
                                    return false;
                                }
                            } else if geom::in_range(p2, p0, p1)
                                || geom::in_range(p3, p0, p1)
                                || geom::in_range(p0, p2, p3)
                                || geom::in_range(p1, p2, p3)
                            {
                                return false;
                            }
                        }
                    } else if v1 != v2 && geom::segments_intersect(p0, p1, p2, p3) {
                        return false;
                    }
                }
                e_next_2 = mesh.next(e_next_2);
                if e_next_2 == e_init_2 {
                    break;
                }
            }
            curr_edge = mesh.next(curr_edge);
            if curr_edge == mesh.next(first_edge) {
                break;
            }
        }
        e_next = mesh.ccw_edge_to_vertex(e_next);
        if e_next == e_init {
            break;
        }
    }
    true
}

/// The Laplacian displacement proposal: the mean of `(neighbor - v)` over the
/// fan around `v`.
fn laplacian_displacement(mesh: &TriangleMesh, v: usize, e_init: usize) -> DVec2 {
    let p = mesh.point(v);
    let mut sum = DVec2::ZERO;
    let mut n = 0;
    for e in mesh.ccw_fan(e_init) {
        sum += mesh.point(mesh.target(e)) - p;
        n += 1;
    }
    sum / n as f64
}

fn smooth_laplacian(mesh: &mut TriangleMesh, max_iterations: u32, use_regions: bool) -> u32 {
    let region_boundary = region_boundary_cache(mesh, use_regions);
    let mut first_movement: Option<f64> = None;
    let mut iterations = 0;
    for iteration in 0..max_iterations {
        iterations += 1;
        let mut movement = 0.0;
        for v in 0..mesh.num_vertices() {
            if mesh.is_border_vertex(v) {
                continue;
            }
            let e_init = match mesh.edge_of_vertex(v) {
                Some(e) => e,
                None => continue,
            };
            if use_regions && region_boundary[v] {
                continue;
            }
            let disp = laplacian_displacement(mesh, v, e_init);
            let p = mesh.point(v);
            mesh.set_point(v, p + disp);

            let step = disp.x.abs() + disp.y.abs();
            if iteration == 0 && first_movement.is_none() && step > 0.0 {
                first_movement = Some(step);
            }
            movement += step;
        }
        if let Some(first) = first_movement {
            if movement.abs() < first * CONVERGENCE_RATIO {
                break;
            }
        }
    }
    iterations
}

fn smooth_laplacian_constrained(
    mesh: &mut TriangleMesh,
    max_iterations: u32,
    use_regions: bool,
    measure: &dyn Measure,
) -> u32 {
    let region_boundary = region_boundary_cache(mesh, use_regions);
    let mut iterations = 0;
    for _ in 0..max_iterations {
        iterations += 1;
        for v in 0..mesh.num_vertices() {
            if mesh.is_border_vertex(v) {
                continue;
            }
            let e_init = match mesh.edge_of_vertex(v) {
                Some(e) => e,
                None => continue,
            };
            if use_regions && region_boundary[v] {
                continue;
            }
            let disp = laplacian_displacement(mesh, v, e_init);

            // Quality of the face fan before the move
            let mut original_sum = 0.0;
            let mut adjacent_faces = 0;
            for e in mesh.ccw_fan(e_init) {
                original_sum += measure.eval_face(mesh, e);
                adjacent_faces += 1;
            }
            let original_avg = original_sum / adjacent_faces as f64;

            let original = mesh.point(v);
            mesh.set_point(v, original + disp);

            let mut new_sum = 0.0;
            for e in mesh.ccw_fan(e_init) {
                new_sum += measure.eval_face(mesh, e);
            }
            let new_avg = new_sum / adjacent_faces as f64;

            // The move must strictly improve the measure and keep the fan
            // untangled; otherwise undo it. Ties revert.
            if !measure.is_better(new_avg, original_avg) || !is_valid_move(mesh, v) {
                mesh.set_point(v, original);
            }
        }
    }
    iterations
}

fn smooth_distmesh(
    mesh: &mut TriangleMesh,
    max_iterations: u32,
    target_length: f64,
    use_regions: bool,
) -> u32 {
    let region_boundary = region_boundary_cache(mesh, use_regions);
    let mut first_movement: Option<f64> = None;
    let mut iterations = 0;
    for iteration in 0..max_iterations {
        iterations += 1;
        let mut movement = 0.0;
        for v in 0..mesh.num_vertices() {
            if mesh.is_border_vertex(v) {
                continue;
            }
            let e_init = match mesh.edge_of_vertex(v) {
                Some(e) => e,
                None => continue,
            };
            if use_regions && region_boundary[v] {
                continue;
            }
            let p = mesh.point(v);
            let mut force = DVec2::ZERO;
            for e in mesh.ccw_fan(e_init) {
                let d = mesh.point(mesh.target(e)) - p;
                let length = d.length();
                // Stretched edges pull the vertex towards the neighbor;
                // compressed edges exert nothing.
                if target_length > length {
                    continue;
                }
                force += d / length * (length - target_length);
            }
            mesh.set_point(v, p + force * 0.5);
            if !is_valid_move(mesh, v) {
                mesh.set_point(v, p);
            }

            let step = force.x.abs() + force.y.abs();
            if iteration == 0 && first_movement.is_none() && step > 0.0 {
                first_movement = Some(step);
            }
            movement += step;
        }
        if let Some(first) = first_movement {
            if movement.abs() < first * CONVERGENCE_RATIO {
                break;
            }
        }
    }
    iterations
}
