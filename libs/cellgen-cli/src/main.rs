//! cellgen: non-linear geometric modelling, analysis and meshing of neuron
//! cell networks.
//!
//! # Usage
//!
//! ```text
//! cellgen -i ri05.CNG [OPTIONS]
//! ```
//!
//! Reads `<NETWORK>.swc` and writes `<NETWORK>.obj`,
//! `<NETWORK>_individual_modelling_surfaces.obj` and
//! `<NETWORK>_post_processed.obj` into the output directory.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use cellgen_network::{run, MeshingOutcome, RunReport};
use clap::Parser;
use config::settings::{CellgenConfig, GecParams, HcParams, PartitionStrategy, PreconditionSettings};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Geometric modelling and meshing of neuron cell networks
#[derive(Parser, Debug)]
#[command(name = "cellgen")]
#[command(about = "Watertight surface meshes from neuron skeletons", long_about = None)]
#[command(version)]
struct Cli {
    /// Network name, the SWC file name with or without ".swc"
    #[arg(short = 'i', value_name = "NETWORK")]
    input: String,

    /// Directory receiving the output meshes
    #[arg(short = 'o', long, default_value = ".")]
    output_dir: PathBuf,

    /// Disable the geometric analysis
    #[arg(long)]
    no_analysis: bool,

    /// Analysis worker threads
    #[arg(long, value_name = "N")]
    ana_nthreads: Option<usize>,

    /// Univariate solver tolerance, from [1e-11, 1e-3]
    #[arg(long, value_name = "EPS")]
    ana_univar_eps: Option<f64>,

    /// Bivariate solver tolerance, from [1e-11, 1e-3]
    #[arg(long, value_name = "EPS")]
    ana_bivar_eps: Option<f64>,

    /// Preconditioning parameters
    #[arg(long, num_args = 3, value_names = ["ALPHA", "BETA", "GAMMA"], conflicts_with = "no_cellnet_pc")]
    cellnet_pc: Option<Vec<f64>>,

    /// Disable preconditioning
    #[arg(long)]
    no_cellnet_pc: bool,

    /// Partition strategy with its filter angle (degrees) and radius ratio
    #[arg(long, num_args = 3, value_names = ["STRATEGY", "ANGLE", "RATIO"])]
    cellnet_partition_strategy: Option<Vec<String>>,

    /// Parametrization: chord-length, centripetal or uniform
    #[arg(long, value_name = "STRATEGY")]
    cellnet_parametrization_strategy: Option<String>,

    /// Disable meshing of the union mesh
    #[arg(long)]
    no_meshing: bool,

    /// Mesh even if the analysis finds conflicts
    #[arg(long)]
    force_meshing: bool,

    /// Render every modelling surface separately
    #[arg(long)]
    meshing_individual_surfaces: bool,

    /// Flush finished faces once the resident mesh holds this many
    #[arg(long, value_name = "FACES", conflicts_with = "no_meshing_flush")]
    meshing_flush: Option<usize>,

    /// Keep the whole mesh in memory
    #[arg(long)]
    no_meshing_flush: bool,

    /// Soma icosphere refinements
    #[arg(long, value_name = "N")]
    meshing_soma_refs: Option<u32>,

    /// Factor applied to every neurite radius
    #[arg(long, value_name = "SCALE")]
    scale_radius: Option<f64>,

    /// Vertices per tube ring, from [3, 64]
    #[arg(long, value_name = "NSEG")]
    meshing_cansurf_angularsegments: Option<u32>,

    /// Ring spacing relative to the optimal triangle height
    #[arg(long, value_name = "H")]
    meshing_triangle_height: Option<f64>,

    /// Attempts between extra radius decrements
    #[arg(long, value_name = "N")]
    meshing_outerloop_maxiter: Option<u32>,

    /// Complex edge splitting rounds per attempt
    #[arg(long, value_name = "N")]
    meshing_innerloop_maxiter: Option<u32>,

    /// Keep tube rings at the segment joints
    #[arg(long)]
    preserve_crease_edges: bool,

    /// Radius factor decrement per failed attempt, from ]0, 0.1]
    #[arg(long, value_name = "D")]
    meshing_merging_radiusfactor_decrement: Option<f64>,

    /// Allowed new complex edges relative to the initial count
    #[arg(long, value_name = "C")]
    meshing_complexedge_max_growthfactor: Option<f64>,

    /// Disable all post-processing
    #[arg(long)]
    no_mesh_pp: bool,

    /// Greedy edge collapse parameters
    #[arg(long, num_args = 4, value_names = ["ALPHA", "LAMBDA", "MU", "D"], conflicts_with = "no_mesh_pp_gec")]
    mesh_pp_gec: Option<Vec<String>>,

    /// Disable greedy edge collapse
    #[arg(long)]
    no_mesh_pp_gec: bool,

    /// HC smoothing parameters
    #[arg(long, num_args = 3, value_names = ["ALPHA", "BETA", "MAXITER"], conflicts_with = "no_mesh_pp_hc")]
    mesh_pp_hc: Option<Vec<String>>,

    /// Disable HC smoothing
    #[arg(long)]
    no_mesh_pp_hc: bool,

    /// Log filter, e.g. "debug" or "cellgen_network=trace"; RUST_LOG wins
    #[arg(long, value_name = "LEVEL", default_value = "info")]
    debug_lvl: String,
}

fn parse_number<T>(value: &str, what: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value.parse().with_context(|| format!("invalid {what}: '{value}'"))
}

impl Cli {
    /// Builds and validates the run configuration.
    fn config(&self) -> Result<CellgenConfig> {
        let mut cfg = CellgenConfig::for_network(&self.input)?;
        cfg.analysis_enabled = !self.no_analysis;
        if let Some(n) = self.ana_nthreads {
            cfg.analysis.nthreads = n;
        }
        if let Some(eps) = self.ana_univar_eps {
            cfg.analysis.univar_eps = eps;
        }
        if let Some(eps) = self.ana_bivar_eps {
            cfg.analysis.bivar_eps = eps;
        }

        if self.no_cellnet_pc {
            cfg.precondition = None;
        } else if let Some([alpha, beta, gamma]) = self.cellnet_pc.as_deref() {
            cfg.precondition = Some(PreconditionSettings {
                alpha: *alpha,
                beta: *beta,
                gamma: *gamma,
            });
        }
        if let Some([name, angle, ratio]) = self.cellnet_partition_strategy.as_deref() {
            cfg.partition =
                PartitionStrategy::from_parts(name, parse_number(angle, "angle")?, parse_number(ratio, "ratio")?)?;
        }
        if let Some(name) = &self.cellnet_parametrization_strategy {
            cfg.parametrization = name.parse()?;
        }
        if let Some(scale) = self.scale_radius {
            cfg.scale_radius = scale;
        }

        cfg.meshing_enabled = !self.no_meshing;
        cfg.force_meshing = self.force_meshing;
        cfg.individual_surfaces = self.meshing_individual_surfaces;
        let m = &mut cfg.meshing;
        if self.no_meshing_flush {
            m.flush_face_limit = None;
        } else if let Some(limit) = self.meshing_flush {
            m.flush_face_limit = Some(limit);
        }
        if let Some(n) = self.meshing_soma_refs {
            m.soma_refinements = n;
        }
        if let Some(n) = self.meshing_cansurf_angularsegments {
            m.angular_segments = n;
        }
        if let Some(h) = self.meshing_triangle_height {
            m.triangle_height_factor = h;
        }
        if let Some(n) = self.meshing_outerloop_maxiter {
            m.outer_loop_maxiter = n;
        }
        if let Some(n) = self.meshing_innerloop_maxiter {
            m.inner_loop_maxiter = n;
        }
        m.preserve_crease_edges = self.preserve_crease_edges;
        if let Some(d) = self.meshing_merging_radiusfactor_decrement {
            m.radius_factor_decrement = d;
        }
        if let Some(c) = self.meshing_complexedge_max_growthfactor {
            m.complex_edge_max_growth_factor = c;
        }

        if self.no_mesh_pp || self.no_mesh_pp_gec {
            cfg.gec = None;
        } else if let Some([alpha, lambda, mu, depth]) = self.mesh_pp_gec.as_deref() {
            cfg.gec = Some(GecParams::new(
                parse_number(alpha, "gec alpha")?,
                parse_number(lambda, "gec lambda")?,
                parse_number(mu, "gec mu")?,
                parse_number(depth, "gec depth")?,
            )?);
        }
        if self.no_mesh_pp || self.no_mesh_pp_hc {
            cfg.hc = None;
        } else if let Some([alpha, beta, maxiter]) = self.mesh_pp_hc.as_deref() {
            cfg.hc = Some(HcParams::new(
                parse_number(alpha, "hc alpha")?,
                parse_number(beta, "hc beta")?,
                parse_number(maxiter, "hc maxiter")?,
            )?);
        }

        cfg.validate()?;
        Ok(cfg)
    }
}

fn summarize(report: &RunReport) {
    if report.degenerate_paths > 0 {
        warn!(paths = report.degenerate_paths, "degenerate paths left without geometry");
    }
    if let Some(analysis) = &report.analysis {
        info!(
            clean = analysis.clean,
            segments = analysis.segments,
            conflicts = analysis.counts.total(),
            anomalies = analysis.anomalies,
            "analysis"
        );
    }
    match &report.meshing {
        MeshingOutcome::Completed(m) => info!(path = %m.path.display(), faces = m.faces_written, "union mesh"),
        MeshingOutcome::Failed(err) => error!(%err, "union mesh failed"),
        MeshingOutcome::Skipped => info!("union mesh skipped"),
    }
}

fn execute(cli: &Cli) -> Result<bool> {
    let cfg = cli.config()?;
    let input = PathBuf::from(format!("{}.swc", cfg.network_name));
    if !cli.output_dir.is_dir() {
        bail!("output directory {} does not exist", cli.output_dir.display());
    }
    let report = run(&cfg, &input, &cli.output_dir).with_context(|| format!("run on {} failed", input.display()))?;
    summarize(&report);
    Ok(report.success())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.debug_lvl));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    match execute(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("cellgen").chain(args.iter().copied())).unwrap()
    }

    /// Test that defaults match the library configuration.
    #[test]
    fn defaults() {
        let cfg = parse(&["-i", "ri05.CNG.swc"]).config().unwrap();
        assert_eq!(cfg, CellgenConfig::for_network("ri05.CNG").unwrap());
    }

    /// Test multi-value switches.
    #[test]
    fn strategies_and_stages() {
        let cli = parse(&[
            "-i",
            "cell",
            "--cellnet-partition-strategy",
            "min-angle",
            "45",
            "2.5",
            "--cellnet-parametrization-strategy",
            "centripetal",
            "--cellnet-pc",
            "2",
            "1.2",
            "8",
            "--mesh-pp-hc",
            "0.2",
            "0.6",
            "4",
            "--no-mesh-pp-gec",
            "--no-meshing-flush",
        ]);
        let cfg = cli.config().unwrap();
        assert_eq!(cfg.partition.name(), "min-angle");
        assert_eq!(cfg.parametrization.to_string(), "centripetal");
        assert_eq!(cfg.precondition.unwrap().gamma, 8.0);
        assert_eq!(cfg.hc.unwrap().maxiter(), 4);
        assert!(cfg.gec.is_none());
        assert!(cfg.meshing.flush_face_limit.is_none());
    }

    /// Test that invalid combinations are rejected.
    #[test]
    fn rejects_invalid_settings() {
        assert!(parse(&["-i", "cell", "--no-analysis", "--force-meshing"]).config().is_err());
        assert!(parse(&["-i", "cell", "--mesh-pp-hc", "0.7", "0.4", "3"]).config().is_err());
        assert!(parse(&["-i", "cell.txt"]).config().is_err());
        assert!(parse(&["-i", "cell", "--meshing-flush", "10"]).config().is_err());
        assert!(parse(&["-i", "cell", "--cellnet-partition-strategy", "longest", "10", "2"]).config().is_err());
    }
}
