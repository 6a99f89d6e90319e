//! # Run Sequencing
//!
//! One cellgen run over one SWC file:
//!
//! ```text
//! read → precondition → scale → partition → parametrize
//!      → analyze → mesh (clean or forced) → individual surfaces
//!      → post-process the written union mesh
//! ```
//!
//! Configuration, input and graph errors abort the run. A meshing failure
//! is part of the report, and a union mesh that cannot be reloaded only
//! skips post-processing.

use std::path::{Path, PathBuf};

use cellgen_mesh::obj::{read_obj, write_obj};
use cellgen_mesh::postprocess::{post_process, GecStats};
use cellgen_mesh::MeshError;
use config::settings::CellgenConfig;
use tracing::{info, warn};

use crate::analysis::{analyze, AnalysisReport};
use crate::error::{CellgenResult, MeshingError};
use crate::meshing::{mesh_individual_surfaces, mesh_network, MeshingReport};
use crate::parametrize::parametrize_paths;
use crate::partition::partition;
use crate::precondition::{precondition, scale_radii, PreconditionStats};
use crate::swc::read_swc;

/// What happened to the union mesh.
#[derive(Debug)]
pub enum MeshingOutcome {
    /// Meshing disabled, or the network is not clean and meshing was not forced.
    Skipped,
    /// Mesh written.
    Completed(MeshingReport),
    /// The network could not be meshed.
    Failed(MeshingError),
}

impl MeshingOutcome {
    /// Report of a completed meshing.
    pub fn report(&self) -> Option<&MeshingReport> {
        match self {
            MeshingOutcome::Completed(report) => Some(report),
            _ => None,
        }
    }
}

/// Result of [`run`].
#[derive(Debug)]
pub struct RunReport {
    /// Preconditioning changes, `None` when disabled.
    pub precondition: Option<PreconditionStats>,
    /// Number of neurite paths.
    pub paths: usize,
    /// Paths without a parametrization, reported as analysis anomalies.
    pub degenerate_paths: usize,
    /// Analysis summary, `None` when disabled.
    pub analysis: Option<AnalysisReport>,
    /// Union mesh.
    pub meshing: MeshingOutcome,
    /// File with the individual modelling surfaces.
    pub individual_surfaces: Option<PathBuf>,
    /// Post-processed mesh file.
    pub post_processed: Option<PathBuf>,
    /// Edge collapse counters of the post-processing.
    pub gec: Option<GecStats>,
}

impl RunReport {
    /// Returns false if the union mesh was requested but failed.
    pub fn success(&self) -> bool {
        !matches!(self.meshing, MeshingOutcome::Failed(_))
    }
}

/// Output file `dir/stem.obj`, using only the file name part of `stem`.
pub fn output_file(dir: &Path, stem: &str) -> PathBuf {
    let name = Path::new(stem).file_name().map_or_else(|| stem.into(), |n| n.to_os_string());
    let mut file = name;
    file.push(".obj");
    dir.join(file)
}

/// Runs the whole pipeline on `input`, writing into `output_dir`.
///
/// # Errors
///
/// Configuration, SWC, graph and analysis setup errors. Degenerate paths
/// are not errors; they make the network unclean.
pub fn run(config: &CellgenConfig, input: impl AsRef<Path>, output_dir: impl AsRef<Path>) -> CellgenResult<RunReport> {
    config.validate()?;
    let input = input.as_ref();
    let output_dir = output_dir.as_ref();
    info!(input = %input.display(), network = %config.network_name, "cellgen run started");

    let mut graph = read_swc(input)?;
    let precondition_stats = match &config.precondition {
        Some(settings) => Some(precondition(&mut graph, settings)?),
        None => None,
    };
    if config.scale_radius != 1.0 {
        scale_radii(&mut graph, config.scale_radius);
    }
    let mut paths = partition(&mut graph, &config.partition)?;
    let degenerate = parametrize_paths(&mut graph, &mut paths, config.parametrization)?;
    info!(
        cells = graph.cells().len(),
        segments = graph.segment_count(),
        paths = paths.len(),
        degenerate = degenerate.len(),
        strategy = config.partition.name(),
        "network prepared"
    );

    let analysis = if config.analysis_enabled {
        Some(analyze(&mut graph, &paths, &config.analysis)?)
    } else {
        None
    };
    let clean = analysis.is_some_and(|a| a.clean);

    let meshing = if !config.meshing_enabled || analysis.is_none() {
        MeshingOutcome::Skipped
    } else if !clean && !config.force_meshing {
        warn!("network is not clean, meshing skipped");
        MeshingOutcome::Skipped
    } else {
        if !clean {
            warn!("meshing forced on a network that is not clean");
        }
        let out = output_file(output_dir, &config.union_mesh_name());
        match mesh_network(&graph, &paths, &config.meshing, &out) {
            Ok(report) => MeshingOutcome::Completed(report),
            Err(err) => {
                warn!(%err, "meshing failed");
                MeshingOutcome::Failed(err)
            }
        }
    };

    let individual_surfaces = if config.individual_surfaces && analysis.is_some() {
        let out = output_file(output_dir, &config.individual_surfaces_name());
        match mesh_individual_surfaces(&graph, &paths, &config.meshing, &out) {
            Ok(_) => Some(out),
            Err(err) => {
                warn!(%err, "individual surfaces not written");
                None
            }
        }
    } else {
        None
    };

    let (post_processed, gec) = match meshing.report() {
        Some(report) if config.gec.is_some() || config.hc.is_some() => {
            let out = output_file(output_dir, &config.post_processed_name());
            post_process_file(config, &report.path, &out)
        }
        _ => (None, None),
    };

    let report = RunReport {
        precondition: precondition_stats,
        paths: paths.len(),
        degenerate_paths: degenerate.len(),
        analysis,
        meshing,
        individual_surfaces,
        post_processed,
        gec,
    };
    info!(success = report.success(), "cellgen run finished");
    Ok(report)
}

/// Reloads the union mesh, improves it and writes the result.
///
/// Any mesh I/O error is logged and skips the stage.
fn post_process_file(config: &CellgenConfig, input: &Path, out: &Path) -> (Option<PathBuf>, Option<GecStats>) {
    let result = read_obj(input).and_then(|mesh| {
        let (improved, stats) = post_process(&mesh, config.gec.as_ref(), config.hc.as_ref());
        write_obj(out, &improved)?;
        Ok::<_, MeshError>(stats)
    });
    match result {
        Ok(stats) => {
            info!(path = %out.display(), "post-processed mesh written");
            (Some(out.to_path_buf()), stats)
        }
        Err(err) => {
            warn!(%err, "post-processing skipped");
            (None, None)
        }
    }
}

#[cfg(test)]
mod tests;
