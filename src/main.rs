// Copyright (C) 2023 setzer22 and contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;

use polylla::cli::{Cli, InputFiles, OutputFormat};
use polylla::mesh::formats;
use polylla::polylla::Polylla;

fn create_output(path: &Path) -> Result<BufWriter<File>> {
    Ok(BufWriter::new(File::create(path).with_context(|| {
        format!("Could not create {}", path.display())
    })?))
}

fn main() -> Result<()> {
    // Setup logging
    env_logger::init();

    let cli = Cli::parse();
    let config = cli.polylla_config();
    config.validate()?;

    let inputs = cli.input_files()?;
    let mesh = match &inputs {
        InputFiles::Off(path) => formats::load_off(path, config.use_regions)?,
        InputFiles::Tri { node, ele, neigh } => {
            formats::load_tri_files(node, ele, neigh.as_deref(), config.use_regions)?
        }
    };
    log::info!(
        "Loaded triangulation with {} vertices, {} triangles and {} halfedges",
        mesh.num_vertices(),
        mesh.num_faces(),
        mesh.num_halfedges()
    );

    let polylla = Polylla::new(mesh, config)?;

    let base = cli.output_base(&inputs);

    let json_path = base.with_extension("json");
    let mut out = create_output(&json_path)?;
    polylla.stats_report().write_json(&mut out)?;
    out.flush()?;
    log::info!("Wrote stats to {}", json_path.display());

    match cli.output_format {
        OutputFormat::Off => {
            let off_path = base.with_extension("off");
            let mut out = create_output(&off_path)?;
            formats::off::write_off(&polylla, &mut out)?;
            out.flush()?;
            log::info!("Wrote polygon mesh to {}", off_path.display());
        }
        OutputFormat::Ale => {
            let ale_path = base.with_extension("ale");
            let mut out = create_output(&ale_path)?;
            formats::ale::write_ale(&polylla, &mut out)?;
            out.flush()?;
            log::info!("Wrote polygon mesh to {}", ale_path.display());
        }
    }

    Ok(())
}
