// Copyright (C) 2023 setzer22 and contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::io::Write;

use crate::polylla::Polylla;
use crate::prelude::*;

/// Writes the polygon mesh in ALE format: nodal coordinates, element
/// connectivity, the Dirichlet boundary nodes (the domain border, walked
/// backwards from the highest-indexed border halfedge), an empty Neumann
/// section and the bounding box.
pub fn write_ale(polylla: &Polylla, w: &mut impl Write) -> Result<()> {
    let mesh = polylla.mesh();

    writeln!(w, "# domain type")?;
    writeln!(w, "Custom")?;
    writeln!(
        w,
        "# nodal coordinates: number of nodes followed by the coordinates"
    )?;
    writeln!(w, "{}", mesh.num_vertices())?;
    for v in 0..mesh.num_vertices() {
        let p = mesh.point(v);
        writeln!(w, "{} {}", p.x, p.y)?;
    }

    writeln!(
        w,
        "# element connectivity: number of elements followed by the elements"
    )?;
    writeln!(w, "{}", polylla.num_polygons())?;
    for &seed in polylla.output_seeds() {
        let vertices = polylla.polygon_vertices(seed);
        write!(w, "{}", vertices.len())?;
        for v in vertices {
            write!(w, " {v}")?;
        }
        writeln!(w)?;
    }

    writeln!(w, "# indices of nodes located on the Dirichlet boundary")?;
    let mut b_init = 0;
    for h in (1..mesh.num_halfedges()).rev() {
        if mesh.is_border_face(h) {
            b_init = h;
            break;
        }
    }
    write!(w, "{}", mesh.origin(b_init))?;
    let mut b_curr = mesh.prev(b_init);
    while b_curr != b_init {
        write!(w, " {}", mesh.origin(b_curr))?;
        b_curr = mesh.prev(b_curr);
    }
    writeln!(w)?;
    writeln!(w, "# indices of nodes located on the Neumann boundary")?;
    writeln!(w, "0")?;

    writeln!(w, "# xmin, xmax, ymin, ymax of the bounding box")?;
    let first = mesh.point(0);
    let (mut xmin, mut xmax, mut ymin, mut ymax) = (first.x, first.x, first.y, first.y);
    for v in 1..mesh.num_vertices() {
        let p = mesh.point(v);
        xmin = xmin.min(p.x);
        xmax = xmax.max(p.x);
        ymin = ymin.min(p.y);
        ymax = ymax.max(p.y);
    }
    writeln!(w, "{xmin} {xmax} {ymin} {ymax}")?;
    Ok(())
}
