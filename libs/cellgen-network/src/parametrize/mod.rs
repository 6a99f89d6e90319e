//! # Path Parametrization
//!
//! Assigns a parameter to every vertex of a neurite path and models the path
//! by a C¹ chain of canal surfaces.
//!
//! The spine is the cubic Hermite interpolant of the vertices with
//! Catmull-Rom tangents
//!
//! ```text
//! m_i = (p_{i+1} − p_{i−1}) / (t_{i+1} − t_{i−1})     (one-sided at the ends)
//! ```
//!
//! written per segment in Bézier form with `Δ = t_{i+1} − t_i`:
//!
//! ```text
//! p_i,  p_i + m_i Δ / 3,  p_{i+1} − m_{i+1} Δ / 3,  p_{i+1}
//! ```
//!
//! Paths of a single segment keep a straight spine.

use cellgen_geometry::{CanalSurface, GeometryError, Vec3};
use config::settings::ParametrizationStrategy;
use tracing::{debug, warn};

use crate::error::ParametrizeError;
use crate::graph::SkeletonGraph;
use crate::path::{Partition, PathId};

/// Parameters of one path.
#[derive(Debug, Clone, PartialEq)]
pub struct Parametrization {
    /// Sum of the vertex distances.
    pub chord_length: f64,
    /// One parameter per vertex, starting at 0 and strictly increasing.
    pub parameters: Vec<f64>,
    /// Arc length per parameter unit, `chord_length / (t_n − t_0)`.
    pub scale_factor: f64,
}

/// Computes the vertex parameters of a polyline.
///
/// Returns `None` for fewer than two points or coincident consecutive points.
///
/// # Example
///
/// ```rust
/// use cellgen_geometry::Vec3;
/// use cellgen_network::parametrize::parametrize;
/// use config::settings::ParametrizationStrategy;
///
/// let pts = [Vec3::ZERO, Vec3::X * 4.0, Vec3::X * 13.0];
/// let p = parametrize(&pts, ParametrizationStrategy::Centripetal).unwrap();
/// assert_eq!(p.parameters, vec![0.0, 2.0, 5.0]);
/// assert!((p.scale_factor - 13.0 / 5.0).abs() < 1e-12);
/// ```
pub fn parametrize(points: &[Vec3], strategy: ParametrizationStrategy) -> Option<Parametrization> {
    if points.len() < 2 {
        return None;
    }
    let distances: Vec<f64> = points.windows(2).map(|w| w[0].distance(w[1])).collect();
    if distances.iter().any(|&d| !(d > 0.0)) {
        return None;
    }
    let n = distances.len() as f64;
    let mut parameters = Vec::with_capacity(points.len());
    parameters.push(0.0);
    let mut t = 0.0;
    for (k, &d) in distances.iter().enumerate() {
        t = match strategy {
            ParametrizationStrategy::ChordLength => t + d,
            ParametrizationStrategy::Centripetal => t + d.sqrt(),
            ParametrizationStrategy::Uniform => (k + 1) as f64 / n,
        };
        parameters.push(t);
    }
    let chord_length: f64 = distances.iter().sum();
    Some(Parametrization {
        chord_length,
        scale_factor: chord_length / t,
        parameters,
    })
}

/// Canal surfaces of consecutive path segments.
pub fn spine_surfaces(points: &[Vec3], radii: &[f64], parameters: &[f64]) -> Result<Vec<CanalSurface>, GeometryError> {
    let n = points.len();
    if n < 2 || radii.len() != n || parameters.len() != n {
        return Err(GeometryError::invalid_control_polygon(format!(
            "{n} points, {} radii, {} parameters",
            radii.len(),
            parameters.len()
        )));
    }
    if n == 2 {
        return Ok(vec![CanalSurface::linear(points[0], points[1], radii[0], radii[1])?]);
    }

    let tangents: Vec<Vec3> = (0..n)
        .map(|i| {
            let (a, b) = (i.saturating_sub(1), (i + 1).min(n - 1));
            (points[b] - points[a]) / (parameters[b] - parameters[a])
        })
        .collect();

    (0..n - 1)
        .map(|i| {
            let delta = parameters[i + 1] - parameters[i];
            let controls = [
                points[i],
                points[i] + tangents[i] * (delta / 3.0),
                points[i + 1] - tangents[i + 1] * (delta / 3.0),
                points[i + 1],
            ];
            CanalSurface::cubic(controls, radii[i], radii[i + 1])
        })
        .collect()
}

/// Parametrizes every path and attaches the surfaces to paths and segments.
///
/// Intersection status of every affected segment is reset. Paths whose
/// vertices admit no parametrization or no spine (zero length, coincident
/// consecutive vertices) are marked degenerate: they keep no geometry and
/// every one of their segments records an anomaly. Returns the degenerate
/// paths.
///
/// # Errors
///
/// [`ParametrizeError::Graph`] if a path refers to a missing vertex or edge.
pub fn parametrize_paths(
    graph: &mut SkeletonGraph,
    partition: &mut Partition,
    strategy: ParametrizationStrategy,
) -> Result<Vec<PathId>, ParametrizeError> {
    let mut degenerate = Vec::new();
    for path in &mut partition.paths {
        let mut points = Vec::with_capacity(path.num_vertices());
        let mut radii = Vec::with_capacity(path.num_vertices());
        for &v in path.vertices() {
            let vertex = graph.vertex_checked(v)?;
            points.push(vertex.position);
            radii.push(vertex.radius);
        }
        let geometry = parametrize(&points, strategy)
            .ok_or_else(|| String::from("coincident consecutive vertices"))
            .and_then(|param| {
                spine_surfaces(&points, &radii, &param.parameters)
                    .map(|surfaces| (param, surfaces))
                    .map_err(|err| err.to_string())
            });

        let (param, surfaces) = match geometry {
            Ok(geometry) => geometry,
            Err(reason) => {
                warn!(path = %path.id(), %reason, "degenerate path");
                for &edge in path.edges() {
                    let info = graph.segment_mut_checked(edge)?;
                    info.surface = None;
                    info.magnified = None;
                    info.status.reset();
                    info.status.record_anomaly();
                }
                path.mark_degenerate();
                degenerate.push(path.id());
                continue;
            }
        };

        for (&edge, surface) in path.edges().iter().zip(&surfaces) {
            let info = graph.segment_mut_checked(edge)?;
            info.magnified = Some(surface.magnified());
            info.surface = Some(surface.clone());
            info.status.reset();
        }
        path.update_geometry(param.parameters, param.chord_length, param.scale_factor, surfaces);
    }
    debug!(
        paths = partition.len(),
        degenerate = degenerate.len(),
        strategy = %strategy,
        "paths parametrized"
    );
    Ok(degenerate)
}

#[cfg(test)]
mod tests;
