// Copyright (C) 2023 setzer22 and contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use glam::DVec2;
use nonmax::NonMaxU32;

use crate::prelude::*;

/// Construction of a [`TriangleMesh`] from raw points and triangles, plus the
/// manifoldness validation that runs at load time.
pub mod builder;

/// HalfEdge meshes are a type of linked list. This means it is sometimes
/// impossible to ensure some algorithms will terminate when the mesh is
/// malformed. To ensure the code never goes into an infinite loop, this max
/// number of iterations will be performed before giving an error. This error
/// should be large enough, as polygons with a very large number of vertices
/// may trigger it.
pub const MAX_LOOP_ITERATIONS: usize = 8196;

/// A halfedge triangulation storing the halfedge pointers in contiguous
/// arrays. For each of the main arrays, at position `h` there is the data for
/// the halfedge with index `h`.
///
/// The first `3 * num_faces` halfedges are the interior ones: halfedge
/// `3 * t + i` runs along the i-th side of triangle `t`. Halfedges past that
/// point bound the domain: they have no incident face (encoded as `None` via
/// `NonMaxU32`, so the element stays the same size as a `u32`) and their
/// `next`/`prev` pointers chain them into boundary loops. Border halfedges
/// take part in fan traversal like any other halfedge, which is what lets
/// [`TriangleMesh::cw_edge_to_vertex`] cycle the full fan of a boundary
/// vertex.
#[derive(Debug, Clone)]
pub struct TriangleMesh {
    points: Vec<DVec2>,
    vertex_edge: Vec<Option<NonMaxU32>>,
    vertex_border: Vec<bool>,

    origin: Vec<u32>,
    next: Vec<u32>,
    prev: Vec<u32>,
    twin: Vec<u32>,
    face: Vec<Option<NonMaxU32>>,

    face_edge: Vec<u32>,
    face_region: Vec<i32>,
}

impl TriangleMesh {
    /// The vertex the halfedge points away from.
    pub fn origin(&self, h: usize) -> usize {
        self.origin[h] as usize
    }

    /// The vertex the halfedge points at, i.e. the origin of its `next`.
    pub fn target(&self, h: usize) -> usize {
        self.origin(self.next(h))
    }

    pub fn next(&self, h: usize) -> usize {
        self.next[h] as usize
    }

    pub fn prev(&self, h: usize) -> usize {
        self.prev[h] as usize
    }

    pub fn twin(&self, h: usize) -> usize {
        self.twin[h] as usize
    }

    /// The interior face incident to `h`, or `None` for border halfedges.
    pub fn face_of(&self, h: usize) -> Option<usize> {
        self.face[h].map(|f| f.get() as usize)
    }

    pub fn is_border_face(&self, h: usize) -> bool {
        self.face[h].is_none()
    }

    pub fn is_interior_face(&self, h: usize) -> bool {
        self.face[h].is_some()
    }

    /// Some halfedge of the interior face `f`.
    pub fn face_halfedge(&self, f: usize) -> usize {
        self.face_edge[f] as usize
    }

    pub fn face_region(&self, f: usize) -> i32 {
        self.face_region[f]
    }

    /// An outgoing halfedge of `v`, or `None` when the vertex is disconnected
    /// from every triangle.
    pub fn edge_of_vertex(&self, v: usize) -> Option<usize> {
        self.vertex_edge[v].map(|h| h.get() as usize)
    }

    pub fn is_border_vertex(&self, v: usize) -> bool {
        self.vertex_border[v]
    }

    /// Number of edges incident to `v`, border edges included.
    pub fn degree(&self, v: usize) -> usize {
        let h0 = match self.edge_of_vertex(v) {
            Some(h0) => h0,
            None => return 0,
        };
        let mut count = 0;
        let mut h = h0;
        loop {
            count += 1;
            if count > MAX_LOOP_ITERATIONS {
                panic!("Max number of iterations reached. Is the mesh malformed?");
            }
            h = self.cw_edge_to_vertex(h);
            if h == h0 {
                break;
            }
        }
        count
    }

    /// The next outgoing halfedge of `origin(h)`, in clockwise order. Stays
    /// within the fan even across border halfedges.
    pub fn cw_edge_to_vertex(&self, h: usize) -> usize {
        self.next(self.twin(h))
    }

    /// The next outgoing halfedge of `origin(h)`, in counter-clockwise order.
    pub fn ccw_edge_to_vertex(&self, h: usize) -> usize {
        self.twin(self.prev(h))
    }

    /// Euclidean length of the segment under `h`.
    pub fn distance(&self, h: usize) -> f64 {
        self.points[self.target(h)].distance(self.points[self.origin(h)])
    }

    pub fn point(&self, v: usize) -> DVec2 {
        self.points[v]
    }

    pub fn set_point(&mut self, v: usize, p: DVec2) {
        self.points[v] = p;
    }

    pub fn num_vertices(&self) -> usize {
        self.points.len()
    }

    /// Interior and border halfedges together.
    pub fn num_halfedges(&self) -> usize {
        self.origin.len()
    }

    /// Interior faces only. The boundary loops are not counted.
    pub fn num_faces(&self) -> usize {
        self.face_edge.len()
    }

    /// Mean halfedge length over the whole mesh, border halfedges included.
    pub fn mean_halfedge_length(&self) -> f64 {
        let sum: f64 = (0..self.num_halfedges()).map(|h| self.distance(h)).sum();
        sum / self.num_halfedges() as f64
    }

    /// Returns an iterator that cycles the outgoing halfedges of `origin(h0)`
    /// in counter-clockwise order, starting at `h0`, until closing the fan.
    pub fn ccw_fan(&self, h0: usize) -> FanIterator<'_> {
        FanIterator {
            mesh: self,
            start: h0,
            next: h0,
            count: 0,
        }
    }

    /// Byte footprint of the halfedge connectivity arrays.
    pub fn halfedge_bytes(&self) -> usize {
        self.origin.capacity() * std::mem::size_of::<u32>()
            + self.next.capacity() * std::mem::size_of::<u32>()
            + self.prev.capacity() * std::mem::size_of::<u32>()
            + self.twin.capacity() * std::mem::size_of::<u32>()
            + self.face.capacity() * std::mem::size_of::<Option<NonMaxU32>>()
            + self.face_edge.capacity() * std::mem::size_of::<u32>()
            + self.face_region.capacity() * std::mem::size_of::<i32>()
    }

    /// Byte footprint of the per-vertex arrays, coordinates included.
    pub fn vertex_bytes(&self) -> usize {
        self.points.capacity() * std::mem::size_of::<DVec2>()
            + self.vertex_edge.capacity() * std::mem::size_of::<Option<NonMaxU32>>()
            + self.vertex_border.capacity() * std::mem::size_of::<bool>()
    }
}

pub struct FanIterator<'a> {
    mesh: &'a TriangleMesh,
    start: usize,
    next: usize,
    count: usize,
}

impl<'a> Iterator for FanIterator<'a> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        if self.count >= MAX_LOOP_ITERATIONS {
            panic!("Max number of iterations reached. Is the mesh malformed?");
        } else if self.count > 0 && self.next == self.start {
            None
        } else {
            let res = self.next;
            self.next = self.mesh.ccw_edge_to_vertex(self.next);
            self.count += 1;
            Some(res)
        }
    }
}

/// The polygon mesh built by traversal, represented as an overlay over a base
/// [`TriangleMesh`].
///
/// Polygon generation only ever rewires `next`/`prev` and the incident
/// halfedge of each vertex; twins, origins, faces and coordinates keep being
/// answered by the base mesh. Cloning just the three mutated arrays gives the
/// traversal an output mesh to stitch while the base stays pristine for
/// topology queries.
#[derive(Debug, Clone)]
pub struct PolygonOverlay {
    next: Vec<u32>,
    prev: Vec<u32>,
    vertex_edge: Vec<Option<NonMaxU32>>,
}

impl PolygonOverlay {
    pub fn new(mesh: &TriangleMesh) -> Self {
        Self {
            next: mesh.next.clone(),
            prev: mesh.prev.clone(),
            vertex_edge: mesh.vertex_edge.clone(),
        }
    }

    pub fn next(&self, h: usize) -> usize {
        self.next[h] as usize
    }

    pub fn prev(&self, h: usize) -> usize {
        self.prev[h] as usize
    }

    pub fn set_next(&mut self, h: usize, k: usize) {
        self.next[h] = k as u32;
    }

    pub fn set_prev(&mut self, h: usize, k: usize) {
        self.prev[h] = k as u32;
    }

    pub fn vertex_edge(&self, v: usize) -> Option<usize> {
        self.vertex_edge[v].map(|h| h.get() as usize)
    }

    pub fn set_vertex_edge(&mut self, v: usize, h: usize) {
        self.vertex_edge[v] = NonMaxU32::new(h as u32);
    }

    /// The vertices of the polygon seeded at `seed`, in the order of its
    /// next-cycle on the overlay.
    pub fn polygon_vertices(&self, mesh: &TriangleMesh, seed: usize) -> SVec<usize> {
        let mut vertices = SVec::new();
        let mut h = seed;
        let mut count = 0;
        loop {
            if count > MAX_LOOP_ITERATIONS {
                panic!("Max number of iterations reached. Is the mesh malformed?");
            }
            count += 1;

            vertices.push(mesh.origin(h));
            h = self.next(h);
            if h == seed {
                break;
            }
        }
        vertices
    }

    pub fn halfedge_bytes(&self) -> usize {
        self.next.capacity() * std::mem::size_of::<u32>()
            + self.prev.capacity() * std::mem::size_of::<u32>()
    }

    pub fn vertex_bytes(&self) -> usize {
        self.vertex_edge.capacity() * std::mem::size_of::<Option<NonMaxU32>>()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::mesh::halfedge::builder::build_from_triangles;

    fn unit_square() -> TriangleMesh {
        let points = vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(1.0, 0.0),
            DVec2::new(0.0, 1.0),
            DVec2::new(1.0, 1.0),
        ];
        build_from_triangles(points, &[[0, 1, 2], [1, 3, 2]], None, None).unwrap()
    }

    #[test]
    fn navigation_invariants() {
        let mesh = unit_square();
        assert_eq!(mesh.num_vertices(), 4);
        assert_eq!(mesh.num_faces(), 2);
        // 6 interior halfedges plus the 4 on the square's boundary.
        assert_eq!(mesh.num_halfedges(), 10);

        for h in 0..mesh.num_halfedges() {
            assert_eq!(mesh.twin(mesh.twin(h)), h);
            assert_eq!(mesh.next(mesh.prev(h)), h);
            assert_eq!(mesh.prev(mesh.next(h)), h);
            assert_eq!(mesh.origin(mesh.next(h)), mesh.origin(mesh.twin(h)));
        }
        for h in 0..3 * mesh.num_faces() {
            assert!(mesh.is_interior_face(h));
            assert_eq!(mesh.next(mesh.next(mesh.next(h))), h);
        }
        for h in 3 * mesh.num_faces()..mesh.num_halfedges() {
            assert!(mesh.is_border_face(h));
        }
    }

    #[test]
    fn fan_traversal_stays_on_origin() {
        let mesh = unit_square();
        for v in 0..mesh.num_vertices() {
            let h0 = mesh.edge_of_vertex(v).unwrap();
            assert_eq!(mesh.origin(h0), v);

            let mut h = h0;
            for _ in 0..mesh.degree(v) {
                assert_eq!(mesh.origin(h), v);
                h = mesh.cw_edge_to_vertex(h);
            }
            assert_eq!(h, h0);

            let fan: Vec<usize> = mesh.ccw_fan(h0).collect();
            assert_eq!(fan.len(), mesh.degree(v));
        }
    }

    #[test]
    fn degrees_and_borders() {
        let mesh = unit_square();
        // Diagonal endpoints have three incident edges, the others two.
        assert_eq!(mesh.degree(0), 2);
        assert_eq!(mesh.degree(1), 3);
        assert_eq!(mesh.degree(2), 3);
        assert_eq!(mesh.degree(3), 2);
        for v in 0..4 {
            assert!(mesh.is_border_vertex(v));
        }
    }

    #[test]
    fn edge_lengths() {
        let mesh = unit_square();
        // The diagonal of triangle 0 runs from (1,0) to (0,1).
        let diagonal = (0..mesh.num_halfedges())
            .find(|&h| mesh.origin(h) == 1 && mesh.target(h) == 2)
            .unwrap();
        assert!((mesh.distance(diagonal) - 2.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn overlay_starts_equal_to_base() {
        let mesh = unit_square();
        let overlay = PolygonOverlay::new(&mesh);
        for h in 0..mesh.num_halfedges() {
            assert_eq!(overlay.next(h), mesh.next(h));
            assert_eq!(overlay.prev(h), mesh.prev(h));
        }
        for v in 0..mesh.num_vertices() {
            assert_eq!(overlay.vertex_edge(v), mesh.edge_of_vertex(v));
        }
        // A face cycle on the untouched overlay is the original triangle.
        let verts = overlay.polygon_vertices(&mesh, 0);
        assert_eq!(verts.as_slice(), &[0, 1, 2]);
    }
}
