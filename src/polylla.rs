// Copyright (C) 2023 setzer22 and contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The polygon generation pipeline. Starting from a halfedge triangulation,
//! it labels the longest edge of every triangle, labels every edge that is
//! the longest of neither incident triangle as a frontier edge, and then
//! walks frontier-edge cycles to stitch arbitrary-shape polygons whose union
//! tiles the triangulated domain. Polygons that touch themselves at a vertex
//! (barrier-edge tips) are split until every output polygon is simple.

use std::time::Instant;

use float_ord::FloatOrd;

use crate::prelude::*;
use crate::smooth::{self, SmoothMethod};
use crate::stats::StatsReport;

#[derive(Debug, Clone)]
pub struct PolyllaConfig {
    /// Treat boundaries between faces with different region ids as frontier
    /// edges, and preserve them during smoothing.
    pub use_regions: bool,
    /// Smoothing strategy to run before polygon generation, if any.
    pub smooth_method: Option<SmoothMethod>,
    /// Maximum smoothing passes.
    pub smooth_iterations: u32,
    /// Rest length for the distmesh method. Defaults to the mean halfedge
    /// length of the mesh.
    pub target_length: Option<f64>,
}

impl Default for PolyllaConfig {
    fn default() -> Self {
        Self {
            use_regions: false,
            smooth_method: None,
            smooth_iterations: 50,
            target_length: None,
        }
    }
}

impl PolyllaConfig {
    pub fn validate(&self) -> Result<()> {
        if self.smooth_method.is_some() && self.smooth_iterations == 0 {
            bail!("The number of smoothing iterations must be positive");
        }
        if let Some(target) = self.target_length {
            if target <= 0.0 {
                bail!("Target length must be a positive number");
            }
        }
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct Counters {
    pub n_frontier_edges: usize,
    pub n_barrier_edge_tips: usize,
    pub n_polygons_to_repair: usize,
    pub n_polygons_added_after_repair: usize,
    pub n_smooth_iterations: u32,
}

/// Wall-clock milliseconds per phase.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct PhaseTimings {
    pub label_max_edges: f64,
    pub label_frontier_edges: f64,
    pub label_seed_edges: f64,
    pub traversal_and_repair: f64,
    pub traversal: f64,
    pub repair: f64,
    pub smooth: f64,
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

/// The pipeline object. Construction runs every phase; afterwards the result
/// can be queried polygon by polygon or serialized through the writers in
/// [`crate::mesh::formats`].
///
/// Two meshes, one topology: the input triangulation stays pristine and keeps
/// answering twin/origin/face queries, while traversal stitches the polygon
/// cycles by rewiring `next`/`prev` on the [`PolygonOverlay`] only.
pub struct Polylla {
    config: PolyllaConfig,
    mesh: TriangleMesh,
    overlay: PolygonOverlay,

    /// One bit per halfedge: the longest edge of each interior face.
    max_edges: Vec<bool>,
    /// One bit per halfedge, symmetric across twins.
    frontier_edges: Vec<bool>,
    /// Seed halfedges, in ascending index order.
    seed_edges: Vec<usize>,
    /// One seed per output polygon; its next-cycle on the overlay walks the
    /// polygon boundary.
    output_seeds: Vec<usize>,

    // Deferred seeds produced while splitting barrier-edge tips. The marker
    // array lets a queued seed be cancelled without scanning the stack.
    seed_bet_stack: Vec<usize>,
    seed_bet_mark: Vec<bool>,

    counters: Counters,
    timings: PhaseTimings,
}

impl Polylla {
    pub fn new(mut mesh: TriangleMesh, config: PolyllaConfig) -> Result<Self> {
        config.validate()?;

        log::info!("Creating polygonal mesh...");

        // Smoothing runs first, before any labeling looks at edge lengths.
        let mut counters = Counters::default();
        let mut timings = PhaseTimings::default();
        if let Some(method) = config.smooth_method {
            let t_start = Instant::now();
            if config.use_regions {
                log::info!("Smoothing with region boundary preservation enabled");
            }
            counters.n_smooth_iterations = smooth::smooth_mesh(
                &mut mesh,
                method,
                config.smooth_iterations,
                config.target_length,
                config.use_regions,
            )?;
            timings.smooth = elapsed_ms(t_start);
            log::info!(
                "Optimized mesh in {} ms ({} iterations)",
                timings.smooth,
                counters.n_smooth_iterations
            );
        }

        let num_halfedges = mesh.num_halfedges();
        let overlay = PolygonOverlay::new(&mesh);
        let mut polylla = Self {
            config,
            mesh,
            overlay,
            max_edges: vec![false; num_halfedges],
            frontier_edges: vec![false; num_halfedges],
            seed_edges: Vec::new(),
            output_seeds: Vec::new(),
            seed_bet_stack: Vec::new(),
            seed_bet_mark: vec![false; num_halfedges],
            counters,
            timings,
        };

        polylla.label_max_edges();
        polylla.label_frontier_edges();
        polylla.label_seed_edges();
        polylla.traverse_and_repair();

        log::info!(
            "Mesh with {} polygons, {} edges and {} barrier-edge tips",
            polylla.output_seeds.len(),
            polylla.counters.n_frontier_edges / 2,
            polylla.counters.n_barrier_edge_tips
        );
        Ok(polylla)
    }

    /* ================ */
    /*     Labeling     */
    /* ================ */

    fn label_max_edges(&mut self) {
        let t_start = Instant::now();
        for f in 0..self.mesh.num_faces() {
            let e = self.max_edge_of_face(self.mesh.face_halfedge(f));
            self.max_edges[e] = true;
        }
        self.timings.label_max_edges = elapsed_ms(t_start);
        log::info!("Labeled max edges in {} ms", self.timings.label_max_edges);
    }

    /// The longest of the three edges of the triangle incident to `e`. Exact
    /// ties resolve in the fixed order (e, next, prev).
    fn max_edge_of_face(&self, e: usize) -> usize {
        let dist0 = FloatOrd(self.mesh.distance(e));
        let dist1 = FloatOrd(self.mesh.distance(self.mesh.next(e)));
        let dist2 = FloatOrd(self.mesh.distance(self.mesh.prev(e)));
        let longest = dist0.max(dist1).max(dist2);
        if longest == dist0 {
            e
        } else if longest == dist1 {
            self.mesh.next(e)
        } else {
            self.mesh.prev(e)
        }
    }

    fn label_frontier_edges(&mut self) {
        let t_start = Instant::now();
        for e in 0..self.mesh.num_halfedges() {
            if self.is_frontier_edge(e) {
                self.frontier_edges[e] = true;
                self.counters.n_frontier_edges += 1;
            }
        }
        self.timings.label_frontier_edges = elapsed_ms(t_start);
        log::info!(
            "Labeled frontier edges in {} ms",
            self.timings.label_frontier_edges
        );
    }

    /// An edge is frontier when it bounds the domain, when it is the max edge
    /// of neither incident triangle, or (in region mode) when its triangles
    /// carry different region ids. The rule is symmetric across twins.
    fn is_frontier_edge(&self, e: usize) -> bool {
        let twin = self.mesh.twin(e);
        let is_border_edge = self.mesh.is_border_face(e) || self.mesh.is_border_face(twin);
        let is_not_max_edge = !(self.max_edges[e] || self.max_edges[twin]);
        is_border_edge || is_not_max_edge || self.is_region_boundary_edge(e)
    }

    fn is_region_boundary_edge(&self, e: usize) -> bool {
        if !self.config.use_regions {
            return false;
        }
        let twin = self.mesh.twin(e);
        match (self.mesh.face_of(e), self.mesh.face_of(twin)) {
            (Some(f1), Some(f2)) => self.mesh.face_region(f1) != self.mesh.face_region(f2),
            _ => false,
        }
    }

    fn label_seed_edges(&mut self) {
        let t_start = Instant::now();
        for e in 0..self.mesh.num_halfedges() {
            if self.mesh.is_interior_face(e) && self.is_seed_edge(e) {
                self.seed_edges.push(e);
            }
        }
        self.timings.label_seed_edges = elapsed_ms(t_start);
        log::info!("Labeled seed edges in {} ms", self.timings.label_seed_edges);
    }

    /// Terminal edges (max edge of both incident triangles) seed one polygon
    /// each; only the lower-indexed halfedge of the pair qualifies. A max
    /// edge whose twin bounds the domain, or (in region mode) whose twin lies
    /// in a different region, seeds unconditionally.
    fn is_seed_edge(&self, e: usize) -> bool {
        let twin = self.mesh.twin(e);
        let is_terminal_edge =
            self.mesh.is_interior_face(twin) && self.max_edges[e] && self.max_edges[twin];
        let is_terminal_border_edge = self.mesh.is_border_face(twin) && self.max_edges[e];
        let is_terminal_region_edge = self.is_region_boundary_edge(e) && self.max_edges[e];

        (is_terminal_edge && e < twin) || is_terminal_border_edge || is_terminal_region_edge
    }

    /* ================== */
    /* Traversal & repair */
    /* ================== */

    fn traverse_and_repair(&mut self) {
        let t_start = Instant::now();
        let seed_edges = std::mem::take(&mut self.seed_edges);
        for &e in &seed_edges {
            let polygon_seed = self.travel_triangles(e);
            if !self.has_barrier_edge_tip(polygon_seed) {
                // A simple polygon goes straight into the mesh.
                self.output_seeds.push(polygon_seed);
            } else {
                let t_repair = Instant::now();
                self.repair_barrier_edge_tips(polygon_seed);
                self.timings.repair += elapsed_ms(t_repair);
            }
        }
        self.seed_edges = seed_edges;
        self.timings.traversal_and_repair = elapsed_ms(t_start);
        self.timings.traversal = self.timings.traversal_and_repair - self.timings.repair;
    }

    /// Fans clockwise around the origin of `e` until a frontier edge shows
    /// up. Terminates on any valid labeling: every vertex fan contains at
    /// least one frontier edge.
    fn search_frontier_edge(&self, e: usize) -> usize {
        let mut nxt = e;
        while !self.frontier_edges[nxt] {
            nxt = self.mesh.cw_edge_to_vertex(nxt);
        }
        nxt
    }

    /// Generates one polygon from a seed edge, linking its frontier-edge
    /// cycle on the overlay. Returns the frontier edge the cycle starts at.
    fn travel_triangles(&mut self, e: usize) -> usize {
        let e_init = self.search_frontier_edge(e);
        let mut e_curr = self.mesh.next(e_init);
        let mut e_fe = e_init;
        // Walk the inside of the polygon, frontier edge to frontier edge.
        loop {
            e_curr = self.search_frontier_edge(e_curr);
            self.overlay.set_next(e_fe, e_curr);
            self.overlay.set_prev(e_curr, e_fe);

            let v_curr = self.mesh.target(e_fe);
            self.overlay.set_vertex_edge(v_curr, self.mesh.twin(e_fe));

            e_fe = e_curr;
            e_curr = self.mesh.next(e_curr);
            if e_fe == e_init {
                break;
            }
        }
        e_init
    }

    /// A polygon is non-simple when its boundary pinches: walking the
    /// next-cycle, the twin of some halfedge's next is the halfedge itself.
    fn has_barrier_edge_tip(&self, e_init: usize) -> bool {
        let mut e_curr = self.overlay.next(e_init);
        while e_curr != e_init {
            if self.mesh.twin(self.overlay.next(e_curr)) == e_curr {
                return true;
            }
            e_curr = self.overlay.next(e_curr);
        }
        false
    }

    /// Given a barrier-edge tip `v`, picks the edge incident to `v` that
    /// splits its fan of internal edges in half.
    fn calculate_middle_edge(&self, v: usize) -> usize {
        let e = self
            .mesh
            .edge_of_vertex(v)
            .expect("A barrier-edge tip has incident edges");
        let frontier_with_bet = self.search_frontier_edge(e);
        let internal_edges = self.mesh.degree(v) - 1;
        let adv = if internal_edges % 2 == 0 {
            internal_edges / 2 - 1
        } else {
            internal_edges / 2
        };
        let mut nxt = self.mesh.cw_edge_to_vertex(frontier_with_bet);
        for _ in 0..adv {
            nxt = self.mesh.cw_edge_to_vertex(nxt);
        }
        nxt
    }

    /// Splits a non-simple polygon at every barrier-edge tip. Each tip
    /// promotes its middle edge (both halves) to frontier edge and queues
    /// both halves as deferred seeds; the queue then drains LIFO, skipping
    /// seeds whose marker was cleared by an earlier regeneration.
    fn repair_barrier_edge_tips(&mut self, e_init: usize) {
        self.counters.n_polygons_to_repair += 1;

        let mut e_curr = self.overlay.next(e_init);
        while e_curr != e_init {
            if self.mesh.twin(self.overlay.next(e_curr)) == e_curr {
                self.counters.n_barrier_edge_tips += 1;
                self.counters.n_frontier_edges += 2;

                let v_bet = self.mesh.target(e_curr);
                let middle_edge = self.calculate_middle_edge(v_bet);
                let t1 = middle_edge;
                let t2 = self.mesh.twin(middle_edge);

                self.frontier_edges[t1] = true;
                self.frontier_edges[t2] = true;

                self.seed_bet_stack.push(t1);
                self.seed_bet_stack.push(t2);
                self.seed_bet_mark[t1] = true;
                self.seed_bet_mark[t2] = true;
            }
            e_curr = self.overlay.next(e_curr);
        }

        // Two queued seeds can describe the same polygon; the marker array
        // de-duplicates what the regeneration walk manages to visit.
        while let Some(t_curr) = self.seed_bet_stack.pop() {
            if self.seed_bet_mark[t_curr] {
                self.counters.n_polygons_added_after_repair += 1;
                self.seed_bet_mark[t_curr] = false;
                let new_polygon_seed = self.generate_repaired_polygon(t_curr);
                self.output_seeds.push(new_polygon_seed);
            }
        }
    }

    /// Like [`Self::travel_triangles`], but clears the deferred-seed marker
    /// of every edge the walk passes over, so equivalent seeds inside the
    /// same polygon do not emit it twice.
    fn generate_repaired_polygon(&mut self, e: usize) -> usize {
        let mut e_init = e;
        while !self.frontier_edges[e_init] {
            e_init = self.mesh.cw_edge_to_vertex(e_init);
            self.seed_bet_mark[e_init] = false;
        }
        let mut e_curr = self.mesh.next(e_init);
        self.seed_bet_mark[e_curr] = false;
        let mut e_fe = e_init;
        loop {
            while !self.frontier_edges[e_curr] {
                e_curr = self.mesh.cw_edge_to_vertex(e_curr);
                self.seed_bet_mark[e_curr] = false;
            }
            self.overlay.set_next(e_fe, e_curr);
            self.overlay.set_prev(e_curr, e_fe);

            e_fe = e_curr;
            e_curr = self.mesh.next(e_curr);
            self.seed_bet_mark[e_curr] = false;
            if e_fe == e_init {
                break;
            }
        }
        e_init
    }

    /* ============ */
    /*   Queries    */
    /* ============ */

    pub fn config(&self) -> &PolyllaConfig {
        &self.config
    }

    pub fn mesh(&self) -> &TriangleMesh {
        &self.mesh
    }

    pub fn num_polygons(&self) -> usize {
        self.output_seeds.len()
    }

    /// One seed halfedge per output polygon, in emission order.
    pub fn output_seeds(&self) -> &[usize] {
        &self.output_seeds
    }

    /// The vertex cycle of the polygon seeded at `seed`.
    pub fn polygon_vertices(&self, seed: usize) -> SVec<usize> {
        self.overlay.polygon_vertices(&self.mesh, seed)
    }

    /// Region id of the polygon, taken from the triangle its seed lies in.
    pub fn polygon_region(&self, seed: usize) -> i32 {
        self.mesh
            .face_of(seed)
            .map_or(0, |f| self.mesh.face_region(f))
    }

    /// Undirected frontier edge count, as reported in output headers.
    pub fn num_frontier_edges(&self) -> usize {
        self.counters.n_frontier_edges / 2
    }

    pub fn stats_report(&self) -> StatsReport {
        let c = &self.counters;
        let t = &self.timings;
        let memory_max_edges = self.max_edges.capacity() * std::mem::size_of::<bool>();
        let memory_frontier_edges = self.frontier_edges.capacity() * std::mem::size_of::<bool>();
        let memory_seed_edges = self.seed_edges.capacity() * std::mem::size_of::<usize>();
        let memory_seed_bet_mark = self.seed_bet_mark.capacity() * std::mem::size_of::<bool>();
        let memory_seed_bet_stack = self.seed_bet_stack.capacity() * std::mem::size_of::<usize>();
        let memory_mesh_input = self.mesh.halfedge_bytes();
        let memory_mesh_output = self.overlay.halfedge_bytes();
        let memory_vertices_input = self.mesh.vertex_bytes();
        let memory_vertices_output = self.overlay.vertex_bytes();
        StatsReport {
            n_polygons: self.output_seeds.len(),
            n_frontier_edges: c.n_frontier_edges / 2,
            n_barrier_edge_tips: c.n_barrier_edge_tips,
            n_half_edges: self.mesh.num_halfedges(),
            n_faces: self.mesh.num_faces(),
            n_vertices: self.mesh.num_vertices(),
            n_polygons_to_repair: c.n_polygons_to_repair,
            n_polygons_added_after_repair: c.n_polygons_added_after_repair,
            n_smooth_iterations: c.n_smooth_iterations,
            time_to_label_max_edges: t.label_max_edges,
            time_to_label_frontier_edges: t.label_frontier_edges,
            time_to_label_seed_edges: t.label_seed_edges,
            time_to_label_total: t.label_max_edges
                + t.label_frontier_edges
                + t.label_seed_edges,
            time_to_traversal_and_repair: t.traversal_and_repair,
            time_to_traversal: t.traversal,
            time_to_repair: t.repair,
            time_to_smooth: t.smooth,
            time_to_generate_polygonal_mesh: t.label_max_edges
                + t.label_frontier_edges
                + t.label_seed_edges
                + t.traversal_and_repair
                + t.smooth,
            memory_max_edges,
            memory_frontier_edges,
            memory_seed_edges,
            memory_seed_bet_mark,
            memory_seed_bet_stack,
            memory_mesh_input,
            memory_mesh_output,
            memory_vertices_input,
            memory_vertices_output,
            memory_total: memory_max_edges
                + memory_frontier_edges
                + memory_seed_edges
                + memory_seed_bet_mark
                + memory_seed_bet_stack
                + memory_mesh_input
                + memory_mesh_output
                + memory_vertices_input
                + memory_vertices_output,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::mesh::halfedge::builder::build_from_triangles;
    use glam::DVec2;

    fn run(
        points: Vec<DVec2>,
        triangles: &[[u32; 3]],
        regions: Option<&[i32]>,
        config: PolyllaConfig,
    ) -> Polylla {
        let mesh = build_from_triangles(points, triangles, None, regions).unwrap();
        Polylla::new(mesh, config).unwrap()
    }

    /// Checks the structural invariants every run must satisfy: exactly one
    /// max edge per face, twin-symmetric frontier bits, simple polygons, and
    /// conservation of interior frontier halfedges across polygon cycles.
    fn assert_invariants(polylla: &Polylla) {
        let mesh = &polylla.mesh;
        for f in 0..mesh.num_faces() {
            let e = mesh.face_halfedge(f);
            let marked = [e, mesh.next(e), mesh.prev(e)]
                .iter()
                .filter(|&&h| polylla.max_edges[h])
                .count();
            assert_eq!(marked, 1, "face {f} must have exactly one max edge");
        }
        for h in 0..mesh.num_halfedges() {
            assert_eq!(
                polylla.frontier_edges[h],
                polylla.frontier_edges[mesh.twin(h)],
                "frontier bit must be symmetric across twins"
            );
        }

        let mut visited = vec![false; mesh.num_halfedges()];
        let mut cycle_edges = 0;
        for &seed in polylla.output_seeds() {
            let mut k = seed;
            loop {
                assert!(
                    polylla.mesh.twin(polylla.overlay.next(k)) != k,
                    "polygon at seed {seed} still has a barrier-edge tip"
                );
                assert!(polylla.frontier_edges[k]);
                assert!(mesh.is_interior_face(k));
                assert!(!visited[k], "halfedge {k} appears in two polygons");
                visited[k] = true;
                cycle_edges += 1;
                k = polylla.overlay.next(k);
                if k == seed {
                    break;
                }
            }
        }
        let interior_frontier = (0..mesh.num_halfedges())
            .filter(|&h| polylla.frontier_edges[h] && mesh.is_interior_face(h))
            .count();
        assert_eq!(cycle_edges, interior_frontier);

        // Tiling: flooding each polygon from its seed face across non-frontier
        // edges covers every face exactly once.
        let mut owner = vec![usize::MAX; mesh.num_faces()];
        for (i, &seed) in polylla.output_seeds().iter().enumerate() {
            let mut queue = vec![mesh.face_of(seed).unwrap()];
            while let Some(f) = queue.pop() {
                if owner[f] != usize::MAX {
                    assert_eq!(owner[f], i, "face {f} claimed by two polygons");
                    continue;
                }
                owner[f] = i;
                let e = mesh.face_halfedge(f);
                for h in [e, mesh.next(e), mesh.prev(e)] {
                    if !polylla.frontier_edges[h] {
                        if let Some(g) = mesh.face_of(mesh.twin(h)) {
                            queue.push(g);
                        }
                    }
                }
            }
        }
        assert!(owner.iter().all(|&o| o != usize::MAX));
    }

    #[test]
    fn single_triangle_is_its_own_polygon() {
        let points = vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(1.0, 0.0),
            DVec2::new(0.0, 1.0),
        ];
        let polylla = run(points, &[[0, 1, 2]], None, PolyllaConfig::default());
        assert_eq!(polylla.num_polygons(), 1);
        assert_eq!(polylla.polygon_vertices(polylla.output_seeds()[0]).len(), 3);
        assert_eq!(polylla.counters.n_barrier_edge_tips, 0);
        assert_eq!(polylla.counters.n_polygons_to_repair, 0);
        assert_eq!(polylla.num_frontier_edges(), 3);
        assert_invariants(&polylla);
    }

    #[test]
    fn two_triangles_merge_across_their_terminal_diagonal() {
        let points = vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(1.0, 0.0),
            DVec2::new(0.0, 1.0),
            DVec2::new(1.0, 1.0),
        ];
        let polylla = run(
            points,
            &[[0, 1, 2], [1, 3, 2]],
            None,
            PolyllaConfig::default(),
        );
        // The diagonal is the max edge of both triangles, so it seeds one
        // square polygon.
        assert_eq!(polylla.seed_edges, vec![1]);
        assert_eq!(polylla.num_polygons(), 1);
        let vertices = polylla.polygon_vertices(polylla.output_seeds()[0]);
        assert_eq!(vertices.len(), 4);
        assert_eq!(polylla.num_frontier_edges(), 4);
        assert_invariants(&polylla);
    }

    #[test]
    fn equal_length_strip_collapses_to_one_polygon() {
        // Four triangles in a strip; every shared edge ties with a spoke of
        // the same length, and the (edge, next, prev) tie-break keeps each
        // shared edge non-frontier.
        let points = vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(1.0, 0.0),
            DVec2::new(2.0, 0.0),
            DVec2::new(0.5, 1.0),
            DVec2::new(1.5, 1.0),
            DVec2::new(2.5, 1.0),
        ];
        let triangles = [[0, 1, 3], [1, 4, 3], [1, 2, 4], [2, 5, 4]];
        let polylla = run(points, &triangles, None, PolyllaConfig::default());
        assert_eq!(polylla.num_polygons(), 1);
        let vertices = polylla.polygon_vertices(polylla.output_seeds()[0]);
        assert_eq!(vertices.len(), 6);
        assert_invariants(&polylla);
    }

    #[test]
    fn region_boundaries_split_the_output() {
        let points = vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(1.0, 0.0),
            DVec2::new(0.0, 1.0),
            DVec2::new(1.0, 1.0),
        ];
        let triangles = [[0, 1, 2], [1, 3, 2]];

        let with_regions = run(
            points.clone(),
            &triangles,
            Some(&[0, 1]),
            PolyllaConfig {
                use_regions: true,
                ..Default::default()
            },
        );
        // The diagonal separates two regions: both triangles survive as
        // polygons of their own region.
        assert_eq!(with_regions.num_polygons(), 2);
        for &seed in with_regions.output_seeds() {
            let region = with_regions.polygon_region(seed);
            let vertices = with_regions.polygon_vertices(seed);
            assert_eq!(vertices.len(), 3);
            // No polygon straddles the boundary.
            for k in [seed, with_regions.overlay.next(seed)] {
                if let Some(f) = with_regions.mesh.face_of(k) {
                    assert_eq!(with_regions.mesh.face_region(f), region);
                }
            }
        }
        assert_invariants(&with_regions);

        // Without region mode the hole boundary is not enforced and the two
        // triangles fuse into the square.
        let without_regions = run(points, &triangles, Some(&[0, 1]), PolyllaConfig::default());
        assert_eq!(without_regions.num_polygons(), 1);
        assert_invariants(&without_regions);
    }

    /// A heptagon fan with one widened sector plus a triangular tab. Exactly
    /// one spoke of the fan ends up frontier, so the fan polygon touches
    /// itself at the hub: a barrier-edge tip that repair must split.
    fn tipped_fan() -> Polylla {
        let angles = [0.0_f64, 75.0, 122.5, 170.0, 217.5, 265.0, 312.5];
        let mut points: Vec<DVec2> = angles
            .iter()
            .map(|a| {
                let r = a.to_radians();
                DVec2::new(r.cos(), r.sin())
            })
            .collect();
        points.push(DVec2::ZERO); // hub, index 7
        points.push(DVec2::new(-1.6, -0.5)); // tab apex, index 8
        let triangles = [
            [7, 0, 1],
            [7, 1, 2],
            [7, 2, 3],
            [7, 3, 4],
            [7, 4, 5],
            [7, 5, 6],
            [7, 6, 0],
            [4, 3, 8],
        ];
        run(points, &triangles, None, PolyllaConfig::default())
    }

    #[test]
    fn barrier_edge_tip_is_repaired() {
        let polylla = tipped_fan();
        assert_eq!(polylla.counters.n_polygons_to_repair, 1);
        assert_eq!(polylla.counters.n_barrier_edge_tips, 1);
        assert_eq!(polylla.counters.n_polygons_added_after_repair, 2);
        // One simple polygon (the tab) plus the repaired splits.
        assert_eq!(
            polylla.num_polygons(),
            1 + polylla.counters.n_polygons_added_after_repair
        );
        assert_invariants(&polylla);
    }

    #[test]
    fn repaired_fan_splits_at_the_middle_edge() {
        let polylla = tipped_fan();
        // The hub fan splits into a hexagon and a pentagon, the tab triangle
        // stays whole.
        let mut sizes: Vec<usize> = polylla
            .output_seeds()
            .iter()
            .map(|&s| polylla.polygon_vertices(s).len())
            .collect();
        sizes.sort_unstable();
        assert_eq!(sizes, vec![3, 5, 6]);
        // Both halves of the split share the hub vertex.
        let hub = 7;
        let with_hub = polylla
            .output_seeds()
            .iter()
            .filter(|&&s| polylla.polygon_vertices(s).contains(&hub))
            .count();
        assert_eq!(with_hub, 2);
    }

    #[test]
    fn determinism_across_runs() {
        let make = || {
            let polylla = tipped_fan();
            let polygons: Vec<Vec<usize>> = polylla
                .output_seeds()
                .iter()
                .map(|&s| polylla.polygon_vertices(s).to_vec())
                .collect();
            polygons
        };
        assert_eq!(make(), make());
    }

    #[test]
    fn config_validation() {
        assert!(PolyllaConfig::default().validate().is_ok());
        assert!(PolyllaConfig {
            smooth_method: Some(SmoothMethod::Distmesh),
            target_length: Some(0.0),
            ..Default::default()
        }
        .validate()
        .is_err());
        assert!(PolyllaConfig {
            smooth_method: Some(SmoothMethod::Laplacian),
            smooth_iterations: 0,
            ..Default::default()
        }
        .validate()
        .is_err());
    }

    #[test]
    fn smoothing_runs_before_labeling() {
        // An off-center hub: one Laplacian pass recenters it, which makes
        // the four fan triangles congruent before the max edges are labeled.
        let points = vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(1.0, 0.0),
            DVec2::new(0.0, 1.0),
            DVec2::new(1.0, 1.0),
            DVec2::new(0.62, 0.55),
        ];
        let triangles = [[0, 1, 4], [1, 3, 4], [3, 2, 4], [2, 0, 4]];
        let polylla = run(
            points,
            &triangles,
            None,
            PolyllaConfig {
                smooth_method: Some(SmoothMethod::Laplacian),
                smooth_iterations: 1,
                ..Default::default()
            },
        );
        assert!(polylla
            .mesh()
            .point(4)
            .distance(DVec2::new(0.5, 0.5)) < crate::geom::EPSILON);
        assert_eq!(polylla.counters.n_smooth_iterations, 1);
        assert_invariants(&polylla);
    }
}
