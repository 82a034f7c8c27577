// Copyright (C) 2023 setzer22 and contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::PathBuf;

use clap::{Parser, ValueEnum, ValueHint};

use crate::polylla::PolyllaConfig;
use crate::prelude::*;
use crate::smooth::SmoothMethod;

/// Polygonal mesh generator (argument schema only)
#[derive(Parser, Debug)]
#[command(name = "polylla", version, about)]
pub struct Cli {
    /// Input triangulation: one .off file, a .node/.ele pair, or a
    /// .node/.ele/.neigh triple
    #[arg(required = true, value_hint = ValueHint::FilePath)]
    pub inputs: Vec<PathBuf>,

    /// Read and process the triangulation considering regions
    #[arg(short, long)]
    pub region: bool,

    /// Smoothing method to run before polygon generation
    #[arg(short, long, value_enum)]
    pub smooth: Option<SmoothMethod>,

    /// Number of smoothing iterations
    #[arg(short, long, default_value_t = 50)]
    pub iterations: u32,

    /// Target edge length for the distmesh method (default: the mean
    /// halfedge length of the mesh)
    #[arg(short, long)]
    pub target_length: Option<f64>,

    /// Output format for the polygon mesh
    #[arg(short = 'O', long, value_enum, default_value = "off")]
    pub output_format: OutputFormat,

    /// Base name for the output files (default: the input base name)
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub output: Option<PathBuf>,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, ValueEnum)]
pub enum OutputFormat {
    Off,
    Ale,
}

/// The input mode, inferred from the extensions of the positional arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputFiles {
    Off(PathBuf),
    Tri {
        node: PathBuf,
        ele: PathBuf,
        neigh: Option<PathBuf>,
    },
}

impl Cli {
    pub fn input_files(&self) -> Result<InputFiles> {
        let by_ext = |ext: &str| {
            self.inputs
                .iter()
                .find(|p| p.extension().map_or(false, |e| e == ext))
        };
        for path in &self.inputs {
            let known = path
                .extension()
                .map_or(false, |e| e == "off" || e == "node" || e == "ele" || e == "neigh");
            if !known {
                bail!(
                    "Unrecognized input file {}: expected .off, .node, .ele or .neigh",
                    path.display()
                );
            }
        }
        match (by_ext("off"), by_ext("node"), by_ext("ele"), by_ext("neigh")) {
            (Some(off), None, None, None) => Ok(InputFiles::Off(off.clone())),
            (None, Some(node), Some(ele), neigh) => Ok(InputFiles::Tri {
                node: node.clone(),
                ele: ele.clone(),
                neigh: neigh.cloned(),
            }),
            _ => bail!(
                "Expected either one .off file, or a .node/.ele pair \
                 optionally accompanied by a .neigh file"
            ),
        }
    }

    /// Output files are `<base>.json` plus `<base>.off` / `<base>.ale`.
    pub fn output_base(&self, inputs: &InputFiles) -> PathBuf {
        match &self.output {
            Some(base) => base.clone(),
            None => match inputs {
                InputFiles::Off(path) => path.with_extension(""),
                InputFiles::Tri { node, .. } => node.with_extension(""),
            },
        }
    }

    pub fn polylla_config(&self) -> PolyllaConfig {
        PolyllaConfig {
            use_regions: self.region,
            smooth_method: self.smooth,
            smooth_iterations: self.iterations,
            target_length: self.target_length,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("polylla").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn infers_the_input_mode_from_extensions() {
        let cli = parse(&["mesh.off"]);
        assert_eq!(
            cli.input_files().unwrap(),
            InputFiles::Off(PathBuf::from("mesh.off"))
        );

        let cli = parse(&["a.node", "a.ele"]);
        assert_eq!(
            cli.input_files().unwrap(),
            InputFiles::Tri {
                node: "a.node".into(),
                ele: "a.ele".into(),
                neigh: None,
            }
        );

        let cli = parse(&["a.ele", "a.neigh", "a.node"]);
        assert_eq!(
            cli.input_files().unwrap(),
            InputFiles::Tri {
                node: "a.node".into(),
                ele: "a.ele".into(),
                neigh: Some("a.neigh".into()),
            }
        );
    }

    #[test]
    fn rejects_ambiguous_or_incomplete_inputs() {
        assert!(parse(&["mesh.off", "a.node"]).input_files().is_err());
        assert!(parse(&["a.node"]).input_files().is_err());
        assert!(parse(&["a.node", "a.ele", "b.txt"]).input_files().is_err());
    }

    #[test]
    fn output_base_defaults_to_the_input_name() {
        let cli = parse(&["meshes/plane.off"]);
        let inputs = cli.input_files().unwrap();
        assert_eq!(cli.output_base(&inputs), PathBuf::from("meshes/plane"));

        let cli = parse(&["a.node", "a.ele", "--output", "out/result"]);
        let inputs = cli.input_files().unwrap();
        assert_eq!(cli.output_base(&inputs), PathBuf::from("out/result"));
    }

    #[test]
    fn smoothing_flags_flow_into_the_config() {
        let cli = parse(&["mesh.off", "-s", "laplacian-edge-ratio", "-i", "10", "-r"]);
        let config = cli.polylla_config();
        assert!(config.use_regions);
        assert_eq!(config.smooth_method, Some(SmoothMethod::LaplacianEdgeRatio));
        assert_eq!(config.smooth_iterations, 10);
        assert_eq!(config.target_length, None);

        let cli = parse(&["mesh.off", "-s", "distmesh", "-t", "0.25"]);
        let config = cli.polylla_config();
        assert_eq!(config.smooth_method, Some(SmoothMethod::Distmesh));
        assert_eq!(config.target_length, Some(0.25));
        assert!(config.validate().is_ok());
    }
}
