// Copyright (C) 2023 setzer22 and contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::io::Write;

use serde::Serialize;

use crate::prelude::*;

/// The flat summary a pipeline run reports: element counts, the counters the
/// traversal and repair phases accumulate, per-phase wall-clock times in
/// milliseconds, and a coarse memory breakdown (capacity times element size
/// for each auxiliary structure, plus the two mesh footprints).
#[derive(Debug, Clone, Serialize)]
pub struct StatsReport {
    pub n_polygons: usize,
    pub n_frontier_edges: usize,
    pub n_barrier_edge_tips: usize,
    pub n_half_edges: usize,
    pub n_faces: usize,
    pub n_vertices: usize,
    pub n_polygons_to_repair: usize,
    pub n_polygons_added_after_repair: usize,
    pub n_smooth_iterations: u32,

    pub time_to_label_max_edges: f64,
    pub time_to_label_frontier_edges: f64,
    pub time_to_label_seed_edges: f64,
    pub time_to_label_total: f64,
    pub time_to_traversal_and_repair: f64,
    pub time_to_traversal: f64,
    pub time_to_repair: f64,
    pub time_to_smooth: f64,
    pub time_to_generate_polygonal_mesh: f64,

    pub memory_max_edges: usize,
    pub memory_frontier_edges: usize,
    pub memory_seed_edges: usize,
    pub memory_seed_bet_mark: usize,
    pub memory_seed_bet_stack: usize,
    pub memory_mesh_input: usize,
    pub memory_mesh_output: usize,
    pub memory_vertices_input: usize,
    pub memory_vertices_output: usize,
    pub memory_total: usize,
}

impl StatsReport {
    pub fn write_json(&self, w: &mut impl Write) -> Result<()> {
        serde_json::to_writer_pretty(&mut *w, self)?;
        writeln!(w)?;
        Ok(())
    }
}
