// Copyright (C) 2023 setzer22 and contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use glam::DVec2;
use nonmax::NonMaxU32;

use crate::prelude::*;

use super::TriangleMesh;

/// Builds a halfedge triangulation from a list of points and a list of
/// triangles, containing indices that reference those points. Triangles must
/// all be oriented the same way (counter-clockwise for a Y-up plane).
///
/// Twins are derived from `neighbors` when given (entry `k` of a triangle is
/// the triangle across the edge that skips corner `k`, `-1` for none, as
/// written by triangulators), and by hashing ordered vertex pairs otherwise.
///
/// Any inconsistency makes this fail before the mesh exists: a repeated
/// oriented edge, a neighbor table that disagrees with the edges, or a vertex
/// whose incident triangles do not form a single fan. Vertices referenced by
/// no triangle are allowed and end up with no incident halfedge.
pub fn build_from_triangles(
    points: Vec<DVec2>,
    triangles: &[[u32; 3]],
    neighbors: Option<&[[i32; 3]]>,
    regions: Option<&[i32]>,
) -> Result<TriangleMesh> {
    let num_vertices = points.len();
    let num_faces = triangles.len();
    let num_interior = 3 * num_faces;

    if num_faces == 0 {
        bail!("Cannot build a mesh from an empty triangle list");
    }
    if let Some(neighbors) = neighbors {
        if neighbors.len() != num_faces {
            bail!(
                "Neighbor table has {} entries for {} triangles",
                neighbors.len(),
                num_faces
            );
        }
    }
    if let Some(regions) = regions {
        if regions.len() != num_faces {
            bail!(
                "Region table has {} entries for {} triangles",
                regions.len(),
                num_faces
            );
        }
    }

    // First pass over the triangle data for some sanity checks
    for tri in triangles {
        for &v in tri {
            if v as usize >= num_vertices {
                bail!("Out-of-bounds index in the triangle array: {v}");
            }
        }
        if tri[0] == tri[1] || tri[1] == tri[2] || tri[2] == tri[0] {
            bail!(
                "Cannot build meshes where a triangle has duplicate vertices: {:?}",
                tri
            );
        }
    }

    // Interior halfedge h = 3t + i runs from corner i to corner i + 1 of
    // triangle t; next/prev are the in-face 3-cycle.
    let mut origin = Vec::with_capacity(num_interior);
    let mut next = Vec::with_capacity(num_interior);
    let mut prev = Vec::with_capacity(num_interior);
    let mut face = Vec::with_capacity(num_interior);
    let mut face_edge = Vec::with_capacity(num_faces);
    let mut face_region = Vec::with_capacity(num_faces);

    for (t, tri) in triangles.iter().enumerate() {
        for i in 0..3 {
            origin.push(tri[i]);
            next.push((3 * t + (i + 1) % 3) as u32);
            prev.push((3 * t + (i + 2) % 3) as u32);
            face.push(NonMaxU32::new(t as u32));
        }
        face_edge.push((3 * t) as u32);
        face_region.push(regions.map_or(0, |r| r[t]));
    }

    // Maps oriented vertex pairs to the halfedge spanning them. A repeated
    // pair means either (i) the surface is non-manifold or (ii) triangles are
    // not oriented in the same direction.
    let mut pair_to_halfedge = HashMap::<(u32, u32), u32>::new();
    for (t, tri) in triangles.iter().enumerate() {
        for (i, (&a, &b)) in tri.iter().circular_tuple_windows().enumerate() {
            if pair_to_halfedge.insert((a, b), (3 * t + i) as u32).is_some() {
                bail!(
                    "Found multiple oriented edges with the same endpoints ({a}, {b}). \
                     This means either (i) the triangulation is non-manifold or (ii) \
                     triangles are not oriented in the same direction"
                );
            }
        }
    }

    let mut twin: Vec<Option<u32>> = vec![None; num_interior];
    match neighbors {
        Some(neighbors) => {
            for (t, tri) in triangles.iter().enumerate() {
                for i in 0..3 {
                    let h = 3 * t + i;
                    let (a, b) = (tri[i], tri[(i + 1) % 3]);
                    let n = neighbors[t][(i + 2) % 3];
                    if n < 0 {
                        if pair_to_halfedge.contains_key(&(b, a)) {
                            bail!(
                                "Neighbor table marks edge ({a}, {b}) as boundary, \
                                 but another triangle spans it"
                            );
                        }
                        continue;
                    }
                    let n = n as usize;
                    if n >= num_faces {
                        bail!("Out-of-bounds triangle index in the neighbor table: {n}");
                    }
                    let other = (0..3).find(|&k| {
                        origin[3 * n + k] == b && origin[3 * n + (k + 1) % 3] == a
                    });
                    match other {
                        Some(k) => twin[h] = Some((3 * n + k) as u32),
                        None => bail!(
                            "Neighbor table is inconsistent: triangle {n} does not \
                             share edge ({a}, {b}) with triangle {t}"
                        ),
                    }
                }
            }
        }
        None => {
            for (t, tri) in triangles.iter().enumerate() {
                for (i, (&a, &b)) in tri.iter().circular_tuple_windows().enumerate() {
                    twin[3 * t + i] = pair_to_halfedge.get(&(b, a)).copied();
                }
            }
        }
    }

    // Construct the boundary halfedges. Right now the boundary consists of
    // incomplete edges, i.e. halfedges that do not have a twin. Leaving it
    // like this would complicate fan traversal because we couldn't rely on
    // halfedges always having a twin. We instead create border halfedges:
    // twin halfedges that point to no face, linked in a loop around each
    // closed boundary of the domain.
    let mut border_at = HashMap::<u32, u32>::new();
    for h in 0..num_interior {
        if twin[h].is_some() {
            continue;
        }
        let b = origin.len() as u32;
        let head = origin[next[h] as usize];
        origin.push(head);
        next.push(0);
        prev.push(0);
        face.push(None);
        twin[h] = Some(b);
        twin.push(Some(h as u32));
        if border_at.insert(head, b).is_some() {
            bail!(
                "Vertex {head} lies on more than one boundary, \
                 the triangulation is non-manifold"
            );
        }
    }
    for b in num_interior..origin.len() {
        // The border halfedge after b starts where b's interior twin starts.
        let h = twin[b].unwrap() as usize;
        let nxt = match border_at.get(&origin[h]) {
            Some(&nxt) => nxt,
            None => bail!(
                "Boundary of the triangulation does not close into loops, \
                 the triangulation is non-manifold"
            ),
        };
        next[b] = nxt;
        prev[nxt as usize] = b as u32;
    }

    let twin: Vec<u32> = twin.into_iter().map(|t| t.unwrap()).collect();

    // An outgoing halfedge per vertex; the lowest-index interior one. Border
    // vertices always have one, because each border halfedge's head is also
    // the origin of an interior halfedge.
    let mut vertex_edge: Vec<Option<NonMaxU32>> = vec![None; num_vertices];
    for h in 0..num_interior {
        let v = origin[h] as usize;
        if vertex_edge[v].is_none() {
            vertex_edge[v] = NonMaxU32::new(h as u32);
        }
    }

    let mut vertex_border = vec![false; num_vertices];
    for b in num_interior..origin.len() {
        vertex_border[origin[b] as usize] = true;
    }

    let mesh = TriangleMesh {
        points,
        vertex_edge,
        vertex_border,
        origin,
        next,
        prev,
        twin,
        face,
        face_edge,
        face_region,
    };

    // Check that walking the fan of each vertex visits as many halfedges as
    // there are halfedges with that origin. If this doesn't check out, the
    // vertex is not a polygon fan, but some other (thus, non-manifold)
    // structure.
    let mut occurrences = vec![0usize; num_vertices];
    for h in 0..mesh.num_halfedges() {
        occurrences[mesh.origin(h)] += 1;
    }
    for v in 0..num_vertices {
        let h0 = match mesh.edge_of_vertex(v) {
            Some(h0) => h0,
            None => continue,
        };
        let mut count = 0;
        let mut h = h0;
        loop {
            count += 1;
            if count > occurrences[v] {
                break;
            }
            h = mesh.cw_edge_to_vertex(h);
            if h == h0 {
                break;
            }
        }
        if count != occurrences[v] {
            bail!(
                "At least one of the vertices is not a polygon fan, \
                 but some other nonmanifold structure instead"
            );
        }
    }

    Ok(mesh)
}

#[cfg(test)]
mod test {
    use super::*;

    fn square_points() -> Vec<DVec2> {
        vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(1.0, 0.0),
            DVec2::new(0.0, 1.0),
            DVec2::new(1.0, 1.0),
        ]
    }

    const SQUARE_TRIS: [[u32; 3]; 2] = [[0, 1, 2], [1, 3, 2]];

    #[test]
    fn twins_from_hashing() {
        let mesh = build_from_triangles(square_points(), &SQUARE_TRIS, None, None).unwrap();
        // The diagonal from 1 to 2 is the only interior edge.
        let diagonal = (0..mesh.num_halfedges())
            .find(|&h| mesh.origin(h) == 1 && mesh.target(h) == 2)
            .unwrap();
        assert!(mesh.is_interior_face(mesh.twin(diagonal)));
        for h in 0..6 {
            if h != diagonal && h != mesh.twin(diagonal) {
                assert!(mesh.is_border_face(mesh.twin(h)));
            }
        }
    }

    #[test]
    fn twins_from_neighbor_table() {
        // Entry k of a triangle names the triangle across the edge skipping
        // corner k: the diagonal skips corner 0 of [0, 1, 2] and corner 1 of
        // [1, 3, 2].
        let neighbors = [[1, -1, -1], [-1, 0, -1]];
        let with_table =
            build_from_triangles(square_points(), &SQUARE_TRIS, Some(&neighbors), None).unwrap();
        let hashed = build_from_triangles(square_points(), &SQUARE_TRIS, None, None).unwrap();
        for h in 0..with_table.num_halfedges() {
            assert_eq!(with_table.twin(h), hashed.twin(h));
            assert_eq!(with_table.next(h), hashed.next(h));
        }
    }

    #[test]
    fn border_loop_is_closed() {
        let mesh = build_from_triangles(square_points(), &SQUARE_TRIS, None, None).unwrap();
        let b0 = (0..mesh.num_halfedges())
            .find(|&h| mesh.is_border_face(h))
            .unwrap();
        let mut h = b0;
        let mut count = 0;
        loop {
            assert!(mesh.is_border_face(h));
            count += 1;
            h = mesh.next(h);
            if h == b0 {
                break;
            }
        }
        assert_eq!(count, 4);
    }

    #[test]
    fn duplicate_oriented_edge_is_rejected() {
        let points = square_points();
        // Both triangles contain the oriented edge 0 -> 1.
        assert!(build_from_triangles(points, &[[0, 1, 2], [0, 1, 3]], None, None).is_err());
    }

    #[test]
    fn inconsistent_neighbor_table_is_rejected() {
        // Claims the shared diagonal is a boundary edge on one side only.
        let neighbors = [[1, -1, -1], [-1, -1, -1]];
        assert!(
            build_from_triangles(square_points(), &SQUARE_TRIS, Some(&neighbors), None).is_err()
        );
    }

    #[test]
    fn isolated_vertices_are_kept() {
        let mut points = square_points();
        points.push(DVec2::new(5.0, 5.0));
        let mesh = build_from_triangles(points, &SQUARE_TRIS, None, None).unwrap();
        assert_eq!(mesh.num_vertices(), 5);
        assert_eq!(mesh.edge_of_vertex(4), None);
        assert_eq!(mesh.degree(4), 0);
        assert!(!mesh.is_border_vertex(4));
    }

    #[test]
    fn region_tags_are_stored() {
        let mesh =
            build_from_triangles(square_points(), &SQUARE_TRIS, None, Some(&[7, 9])).unwrap();
        assert_eq!(mesh.face_region(0), 7);
        assert_eq!(mesh.face_region(1), 9);
        let untagged = build_from_triangles(square_points(), &SQUARE_TRIS, None, None).unwrap();
        assert_eq!(untagged.face_region(0), 0);
    }
}
