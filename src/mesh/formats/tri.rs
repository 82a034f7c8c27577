// Copyright (C) 2023 setzer22 and contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Readers for the Shewchuk Triangle file family. `.node` lists points,
//! `.ele` lists triangles by vertex index, `.neigh` lists the three
//! neighboring triangles of each triangle (`-1` for none). Files may number
//! elements from 0 or from 1; the first index column decides.

use std::io::BufRead;

use glam::DVec2;

use crate::prelude::*;

/// Significant lines of a Triangle-format file: trimmed, with blank lines
/// and `#` comments dropped.
fn significant_lines(r: impl BufRead) -> Result<Vec<Vec<String>>> {
    let mut rows = Vec::new();
    for line in r.lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        // Everything after a # is a trailing comment.
        let significant = trimmed.split('#').next().unwrap_or("");
        rows.push(significant.split_whitespace().map(str::to_owned).collect());
    }
    if rows.is_empty() {
        bail!("File has no content");
    }
    Ok(rows)
}

fn index_base(first_index: usize) -> Result<usize> {
    if first_index > 1 {
        bail!("Elements must be numbered from 0 or 1, found {first_index}");
    }
    Ok(first_index)
}

/// Reads a `.node` file. Returns the points and the file's index base.
pub fn read_node(r: impl BufRead) -> Result<(Vec<DVec2>, usize)> {
    let rows = significant_lines(r)?;
    let header = &rows[0];
    if header.len() < 2 {
        bail!("Malformed node header");
    }
    let num_points: usize = header[0].parse().context("Malformed node count")?;
    let dimension: usize = header[1].parse().context("Malformed node dimension")?;
    if dimension != 2 {
        bail!("Only 2D node files are supported, found dimension {dimension}");
    }
    if rows.len() != num_points + 1 {
        bail!(
            "Node file declares {num_points} points but contains {}",
            rows.len() - 1
        );
    }

    let base = index_base(rows[1][0].parse().context("Malformed point index")?)?;
    let mut points = Vec::with_capacity(num_points);
    for row in &rows[1..] {
        if row.len() < 3 {
            bail!("Point line has fewer than three fields");
        }
        let x: f64 = row[1].parse().context("Malformed point coordinate")?;
        let y: f64 = row[2].parse().context("Malformed point coordinate")?;
        points.push(DVec2::new(x, y));
    }
    Ok((points, base))
}

/// Reads an `.ele` file. Vertex references are rebased to 0 using the node
/// file's base; with `read_regions` the first attribute column becomes the
/// triangle's region id. Returns triangles, regions and the file's own base
/// (needed to interpret a `.neigh` table).
pub fn read_ele(
    r: impl BufRead,
    node_base: usize,
    read_regions: bool,
) -> Result<(Vec<[u32; 3]>, Option<Vec<i32>>, usize)> {
    let rows = significant_lines(r)?;
    let header = &rows[0];
    if header.len() < 2 {
        bail!("Malformed ele header");
    }
    let num_triangles: usize = header[0].parse().context("Malformed triangle count")?;
    let nodes_per_triangle: usize = header[1].parse().context("Malformed ele header")?;
    if nodes_per_triangle != 3 {
        bail!("Only linear triangles are supported, found {nodes_per_triangle} nodes per element");
    }
    if rows.len() != num_triangles + 1 {
        bail!(
            "Ele file declares {num_triangles} triangles but contains {}",
            rows.len() - 1
        );
    }

    let base = index_base(rows[1][0].parse().context("Malformed triangle index")?)?;
    let mut triangles = Vec::with_capacity(num_triangles);
    let mut regions = Vec::with_capacity(num_triangles);
    for row in &rows[1..] {
        if row.len() < 4 {
            bail!("Triangle line has fewer than four fields");
        }
        let mut tri = [0u32; 3];
        for (corner, token) in tri.iter_mut().zip(&row[1..4]) {
            let index: usize = token.parse().context("Malformed vertex index")?;
            if index < node_base {
                bail!("Vertex index {index} is below the node numbering base {node_base}");
            }
            *corner = (index - node_base) as u32;
        }
        triangles.push(tri);
        if read_regions {
            let region = match row.get(4) {
                Some(token) => token.parse::<f64>().context("Malformed region attribute")? as i32,
                None => 0,
            };
            regions.push(region);
        }
    }
    let regions = if read_regions { Some(regions) } else { None };
    Ok((triangles, regions, base))
}

/// Reads a `.neigh` file, rebasing triangle references with the `.ele` base.
/// Negative entries mean "no neighbor" and come through as `-1`.
pub fn read_neigh(r: impl BufRead, ele_base: usize) -> Result<Vec<[i32; 3]>> {
    let rows = significant_lines(r)?;
    let header = &rows[0];
    if header.is_empty() {
        bail!("Malformed neigh header");
    }
    let num_triangles: usize = header[0].parse().context("Malformed triangle count")?;
    if rows.len() != num_triangles + 1 {
        bail!(
            "Neigh file declares {num_triangles} entries but contains {}",
            rows.len() - 1
        );
    }

    let mut neighbors = Vec::with_capacity(num_triangles);
    for row in &rows[1..] {
        if row.len() < 4 {
            bail!("Neighbor line has fewer than four fields");
        }
        let mut entry = [0i32; 3];
        for (slot, token) in entry.iter_mut().zip(&row[1..4]) {
            let value: i64 = token.parse().context("Malformed neighbor index")?;
            *slot = if value < 0 {
                -1
            } else {
                if (value as usize) < ele_base {
                    bail!("Neighbor index {value} is below the numbering base {ele_base}");
                }
                (value as usize - ele_base) as i32
            };
        }
        neighbors.push(entry);
    }
    Ok(neighbors)
}

#[cfg(test)]
mod test {
    use super::*;

    const NODE_1BASED: &str = "# unit square\n\
        4 2 0 0\n\
        1 0.0 0.0\n\
        2 1.0 0.0\n\
        3 0.0 1.0\n\
        4 1.0 1.0\n";

    const ELE_1BASED: &str = "2 3 1\n\
        1 1 2 3 10\n\
        2 2 4 3 20\n";

    const NEIGH_1BASED: &str = "2 3\n\
        1 2 -1 -1\n\
        2 -1 1 -1\n";

    #[test]
    fn reads_one_based_files() {
        let (points, node_base) = read_node(NODE_1BASED.as_bytes()).unwrap();
        assert_eq!(node_base, 1);
        assert_eq!(points.len(), 4);
        assert_eq!(points[3], DVec2::new(1.0, 1.0));

        let (triangles, regions, ele_base) =
            read_ele(ELE_1BASED.as_bytes(), node_base, true).unwrap();
        assert_eq!(ele_base, 1);
        assert_eq!(triangles, vec![[0, 1, 2], [1, 3, 2]]);
        assert_eq!(regions, Some(vec![10, 20]));

        let neighbors = read_neigh(NEIGH_1BASED.as_bytes(), ele_base).unwrap();
        assert_eq!(neighbors, vec![[1, -1, -1], [-1, 0, -1]]);
    }

    #[test]
    fn reads_zero_based_files_without_regions() {
        let node = "3 2 0 0\n0 0 0\n1 1 0\n2 0 1\n";
        let ele = "1 3 0\n0 0 1 2\n";
        let (points, node_base) = read_node(node.as_bytes()).unwrap();
        assert_eq!(node_base, 0);
        assert_eq!(points.len(), 3);
        let (triangles, regions, _) = read_ele(ele.as_bytes(), node_base, false).unwrap();
        assert_eq!(triangles, vec![[0, 1, 2]]);
        assert!(regions.is_none());
    }

    #[test]
    fn count_mismatches_are_fatal() {
        assert!(read_node("4 2 0 0\n1 0 0\n".as_bytes()).is_err());
        assert!(read_ele("2 3 0\n1 1 2 3\n".as_bytes(), 1, false).is_err());
        assert!(read_neigh("2 3\n1 -1 -1 -1\n".as_bytes(), 1).is_err());
    }

    #[test]
    fn higher_order_elements_are_rejected() {
        let ele = "1 6 0\n1 1 2 3 4 5 6\n";
        assert!(read_ele(ele.as_bytes(), 1, false).is_err());
    }

    #[test]
    fn whole_family_builds_a_mesh() {
        let (points, node_base) = read_node(NODE_1BASED.as_bytes()).unwrap();
        let (triangles, regions, ele_base) =
            read_ele(ELE_1BASED.as_bytes(), node_base, true).unwrap();
        let neighbors = read_neigh(NEIGH_1BASED.as_bytes(), ele_base).unwrap();
        let mesh = crate::mesh::halfedge::builder::build_from_triangles(
            points,
            &triangles,
            Some(&neighbors),
            regions.as_deref(),
        )
        .unwrap();
        assert_eq!(mesh.num_faces(), 2);
        assert_eq!(mesh.num_halfedges(), 10);
        assert_eq!(mesh.face_region(1), 20);
    }
}
