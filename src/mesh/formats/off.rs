// Copyright (C) 2023 setzer22 and contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::io::{BufRead, Write};

use glam::DVec2;

use crate::mesh::halfedge::builder::build_from_triangles;
use crate::polylla::Polylla;
use crate::prelude::*;

/// Reads a triangulated OFF file. The z coordinate is ignored, faces must be
/// triangles, and with `use_regions` each face line may carry one trailing
/// number read as the triangle's region id (0 when absent).
pub fn read_off(r: impl BufRead, use_regions: bool) -> Result<TriangleMesh> {
    let mut lines = r.lines().enumerate().filter_map(|(i, line)| match line {
        Ok(line) => {
            let trimmed = line.trim().to_owned();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                None
            } else {
                Some(Ok((i + 1, trimmed)))
            }
        }
        Err(err) => Some(Err(err)),
    });

    let mut next_line = || -> Result<(usize, String)> {
        match lines.next() {
            Some(Ok(line)) => Ok(line),
            Some(Err(err)) => Err(err.into()),
            None => bail!("Unexpected end of file"),
        }
    };

    let (_, header) = next_line()?;
    if header != "OFF" {
        bail!("Not an OFF file: expected an OFF header, found {header:?}");
    }

    let (counts_lineno, counts) = next_line()?;
    let counts: Vec<usize> = counts
        .split_whitespace()
        .map(|t| t.parse().map_err(anyhow::Error::from))
        .collect::<Result<_>>()
        .with_context(|| format!("Malformed counts at line {counts_lineno}"))?;
    if counts.len() != 3 {
        bail!("Expected vertex, face and edge counts at line {counts_lineno}");
    }
    let (num_vertices, num_faces) = (counts[0], counts[1]);

    let mut points = Vec::with_capacity(num_vertices);
    for _ in 0..num_vertices {
        let (lineno, line) = next_line()?;
        let coords: Vec<f64> = line
            .split_whitespace()
            .map(|t| t.parse().map_err(anyhow::Error::from))
            .collect::<Result<_>>()
            .with_context(|| format!("Malformed vertex at line {lineno}"))?;
        if coords.len() < 2 {
            bail!("Vertex at line {lineno} has fewer than two coordinates");
        }
        points.push(DVec2::new(coords[0], coords[1]));
    }

    let mut triangles = Vec::with_capacity(num_faces);
    let mut regions = Vec::with_capacity(num_faces);
    for _ in 0..num_faces {
        let (lineno, line) = next_line()?;
        let mut tokens = line.split_whitespace();
        let arity: usize = tokens
            .next()
            .ok_or_else(|| anyhow!("Empty face at line {lineno}"))?
            .parse()
            .with_context(|| format!("Malformed face at line {lineno}"))?;
        if arity != 3 {
            bail!("Face at line {lineno} has {arity} vertices, only triangles are supported");
        }
        let mut tri = [0u32; 3];
        for corner in tri.iter_mut() {
            *corner = tokens
                .next()
                .ok_or_else(|| anyhow!("Face at line {lineno} is missing vertex indices"))?
                .parse()
                .with_context(|| format!("Malformed face at line {lineno}"))?;
        }
        triangles.push(tri);
        if use_regions {
            let region = match tokens.next() {
                Some(token) => token
                    .parse::<f64>()
                    .with_context(|| format!("Malformed region id at line {lineno}"))?
                    as i32,
                None => 0,
            };
            regions.push(region);
        }
    }

    let regions = if use_regions { Some(regions) } else { None };
    build_from_triangles(points, &triangles, None, regions.as_deref())
}

/// Writes the polygon mesh in extended OFF: `x y 0` vertex lines, one
/// `k v0 .. v_{k-1}` line per polygon in emission order, and in region mode a
/// trailing `r g b 1.0` color derived from the polygon's region id. The edge
/// count in the header is the undirected frontier edge count.
pub fn write_off(polylla: &Polylla, w: &mut impl Write) -> Result<()> {
    let mesh = polylla.mesh();
    writeln!(w, "OFF")?;
    writeln!(
        w,
        "{} {} {}",
        mesh.num_vertices(),
        polylla.num_polygons(),
        polylla.num_frontier_edges()
    )?;

    for v in 0..mesh.num_vertices() {
        let p = mesh.point(v);
        writeln!(w, "{} {} 0", p.x, p.y)?;
    }

    for &seed in polylla.output_seeds() {
        let vertices = polylla.polygon_vertices(seed);
        write!(w, "{}", vertices.len())?;
        for v in vertices {
            write!(w, " {v}")?;
        }
        if polylla.config().use_regions {
            let region = polylla.polygon_region(seed);
            let r = (region * 73 % 256) as f32 / 255.0;
            let g = (region * 149 % 256) as f32 / 255.0;
            let b = (region * 233 % 256) as f32 / 255.0;
            write!(w, " {r} {g} {b} 1.0")?;
        }
        writeln!(w)?;
    }
    Ok(())
}
