// Copyright (C) 2023 setzer22 and contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mesh file formats: readers for the triangulation inputs and writers for
//! the generated polygon mesh.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::prelude::*;

/// OFF import and extended OFF export.
pub mod off;

/// Shewchuk Triangle `.node` / `.ele` / `.neigh` import.
pub mod tri;

/// ALE export.
pub mod ale;

/// Loads a triangulation from an OFF file.
pub fn load_off(path: &Path, use_regions: bool) -> Result<TriangleMesh> {
    let file =
        File::open(path).with_context(|| format!("Could not open {}", path.display()))?;
    off::read_off(BufReader::new(file), use_regions)
        .with_context(|| format!("Could not read OFF file {}", path.display()))
}

/// Loads a triangulation from a `.node` / `.ele` pair, with twins derived
/// from the `.neigh` table when one is given and by edge hashing otherwise.
pub fn load_tri_files(
    node: &Path,
    ele: &Path,
    neigh: Option<&Path>,
    use_regions: bool,
) -> Result<TriangleMesh> {
    let open = |path: &Path| -> Result<BufReader<File>> {
        Ok(BufReader::new(File::open(path).with_context(|| {
            format!("Could not open {}", path.display())
        })?))
    };
    let (points, node_base) = tri::read_node(open(node)?)
        .with_context(|| format!("Could not read node file {}", node.display()))?;
    let (triangles, regions, ele_base) = tri::read_ele(open(ele)?, node_base, use_regions)
        .with_context(|| format!("Could not read ele file {}", ele.display()))?;
    let neighbors = match neigh {
        Some(path) => Some(
            tri::read_neigh(open(path)?, ele_base)
                .with_context(|| format!("Could not read neigh file {}", path.display()))?,
        ),
        None => None,
    };
    crate::mesh::halfedge::builder::build_from_triangles(
        points,
        &triangles,
        neighbors.as_deref(),
        regions.as_deref(),
    )
}
