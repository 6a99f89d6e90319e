//! # Inductive Network Meshing
//!
//! Builds one closed surface for the whole network by merging modelling
//! elements into a resident mesh one at a time.
//!
//! ## Element Order
//!
//! Per cell: the soma, then the paths of its path tree breadth first, so every
//! path is merged after the path (or soma) it grows out of.
//!
//! ## Outer Loop
//!
//! Each element is tessellated at radius factor `f` and handed to
//! [`red_blue_merge`]. A failed attempt lowers `f` by the configured
//! decrement, with one extra decrement every `outer_loop_maxiter` attempts,
//! and rotates the tessellation by the golden angle. Falling below
//! [`RADIUS_FACTOR_FLOOR`] fails the network.
//!
//! ## Flushing
//!
//! When the resident mesh reaches the face limit, faces outside the guard
//! boxes of all unmerged elements can no longer change. They are streamed to
//! the output file and evicted.

use std::path::{Path, PathBuf};

use cellgen_geometry::BoundingBox;
use cellgen_mesh::icosphere::icosphere;
use cellgen_mesh::merge::{red_blue_merge, MergeError, MergeParams, MergeStats, Primitive, Violation};
use cellgen_mesh::obj::{write_obj, ObjStreamWriter};
use cellgen_mesh::tube::{tessellate_tube, TubeParams, TubeSection};
use cellgen_mesh::Mesh;
use config::constants::{GOLDEN_ANGLE, MAGNIFICATION_FACTOR, MAGNIFICATION_MARGIN, RADIUS_FACTOR_FLOOR};
use config::settings::MeshingSettings;
use tracing::{debug, info, warn};

use crate::error::{GraphError, MeshingError};
use crate::graph::{SkeletonGraph, VertexId};
use crate::path::{NeuritePath, Partition, PathId};

/// What a modelling element stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    /// Soma sphere.
    Soma(VertexId),
    /// Neurite path tube.
    Path(PathId),
}

/// Merge history of one element.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementReport {
    /// Element id used in the mesh annotations.
    pub element: u32,
    /// Soma or path.
    pub kind: ElementKind,
    /// Radius factor of every attempt, in order.
    pub radius_factors: Vec<f64>,
    /// Counters of the successful attempt, `None` if the element was placed
    /// without merging.
    pub stats: Option<MergeStats>,
}

impl ElementReport {
    /// Number of attempts.
    pub fn attempts(&self) -> usize {
        self.radius_factors.len()
    }
}

/// Result of [`mesh_network`].
#[derive(Debug, Clone, PartialEq)]
pub struct MeshingReport {
    /// Output file.
    pub path: PathBuf,
    /// One entry per element, in merge order.
    pub elements: Vec<ElementReport>,
    /// Faces in the output file.
    pub faces_written: u64,
    /// Faces evicted before the end of the run.
    pub faces_flushed: u64,
    /// Number of flushes.
    pub flushes: u32,
}

#[derive(Debug, Clone, Copy)]
struct Element {
    id: u32,
    kind: ElementKind,
}

/// Merge order of all elements. Degenerate paths have no surface and are
/// left out.
fn elements(partition: &Partition) -> Vec<Element> {
    let mut order = Vec::new();
    for tree in &partition.trees {
        if let Some(soma) = tree.soma {
            order.push(ElementKind::Soma(soma));
        }
        for id in tree.bfs() {
            if partition.path(id).is_some_and(NeuritePath::is_degenerate) {
                warn!(path = %id, "degenerate path not meshed");
                continue;
            }
            order.push(ElementKind::Path(id));
        }
    }
    order
        .into_iter()
        .enumerate()
        .map(|(i, kind)| Element { id: i as u32, kind })
        .collect()
}

struct Tessellator<'a> {
    graph: &'a SkeletonGraph,
    partition: &'a Partition,
    settings: &'a MeshingSettings,
}

impl Tessellator<'_> {
    fn path(&self, id: PathId) -> Result<&NeuritePath, MeshingError> {
        self.partition
            .path(id)
            .filter(|p| p.geometry_updated())
            .ok_or(MeshingError::MissingGeometry(id))
    }

    /// Mesh and analytic shape of `element` at radius factor `factor`.
    fn tessellate(&self, element: Element, factor: f64, phase: f64) -> Result<(Mesh, Primitive), MeshingError> {
        match element.kind {
            ElementKind::Soma(v) => {
                let soma = self.graph.vertex(v).ok_or(GraphError::UnknownVertex(v))?;
                let (centre, radius) = (soma.position, soma.radius * factor);
                let mesh = icosphere(centre, radius, self.settings.soma_refinements, phase, element.id);
                Ok((mesh, Primitive::Sphere { centre, radius }))
            }
            ElementKind::Path(id) => {
                let path = self.path(id)?;
                let sections: Vec<TubeSection> = path
                    .surfaces()
                    .iter()
                    .enumerate()
                    .map(|(k, surface)| TubeSection {
                        surface: surface.clone(),
                        arc_length: path.segment_arc_length(k),
                    })
                    .collect();
                let params = TubeParams::from_settings(self.settings, factor, phase, element.id);
                let mesh = tessellate_tube(&sections, &params)?;
                Ok((
                    mesh,
                    Primitive::Tube {
                        segments: path.surfaces().to_vec(),
                        factor,
                    },
                ))
            }
        }
    }

    /// Region the element can touch when it is merged.
    fn guard_box(&self, element: Element) -> Option<BoundingBox> {
        match element.kind {
            ElementKind::Soma(v) => self.graph.vertex(v).map(|s| {
                BoundingBox::around_sphere(s.position, s.radius * MAGNIFICATION_FACTOR + MAGNIFICATION_MARGIN)
            }),
            ElementKind::Path(id) => self.partition.path(id).and_then(NeuritePath::bounding_box),
        }
    }
}

/// Radius factor of attempt `attempt` (zero based).
fn radius_factor(settings: &MeshingSettings, attempt: u32) -> f64 {
    let extra = if settings.outer_loop_maxiter > 0 {
        attempt / settings.outer_loop_maxiter
    } else {
        0
    };
    settings.initial_radius_factor - f64::from(attempt + extra) * settings.radius_factor_decrement
}

enum Placement {
    Merged(MergeStats),
    Appended,
}

/// Merges `red` into `resident`. A disjoint element, or the first one, is
/// appended as a separate component.
fn place(
    resident: &mut Mesh,
    shapes: &[Primitive],
    red: Mesh,
    red_shape: &Primitive,
    params: &MergeParams,
) -> Result<Placement, MergeError> {
    if resident.is_empty() {
        resident.append(&red);
        return Ok(Placement::Appended);
    }
    match red_blue_merge(resident, shapes, red.clone(), red_shape, params) {
        Ok(out) => {
            *resident = out.mesh;
            Ok(Placement::Merged(out.stats))
        }
        Err(MergeError::InvariantViolation(Violation::NoContact)) => {
            resident.append(&red);
            Ok(Placement::Appended)
        }
        Err(err) => Err(err),
    }
}

/// Outer loop of one element.
///
/// `attempt_with` receives the radius factor and the phase of an attempt.
/// Merge failures are retried with the next radius factor until it drops
/// below [`RADIUS_FACTOR_FLOOR`]; any other error ends the loop at once.
/// Returns the factors tried and the stats of the successful attempt.
fn merge_with_retries<F>(
    settings: &MeshingSettings,
    element: u32,
    mut attempt_with: F,
) -> Result<(Vec<f64>, Option<MergeStats>), MeshingError>
where
    F: FnMut(f64, f64) -> Result<Result<Option<MergeStats>, MergeError>, MeshingError>,
{
    let mut radius_factors = Vec::new();
    let mut attempt = 0_u32;
    loop {
        let factor = radius_factor(settings, attempt);
        radius_factors.push(factor);
        match attempt_with(factor, f64::from(attempt) * GOLDEN_ANGLE)? {
            Ok(stats) => return Ok((radius_factors, stats)),
            Err(source) => {
                debug!(element, factor, %source, "merge attempt failed");
                attempt += 1;
                if radius_factor(settings, attempt) < RADIUS_FACTOR_FLOOR {
                    warn!(element, attempts = attempt, factor, %source, "element could not be merged");
                    return Err(MeshingError::OuterLoopExhausted {
                        element,
                        attempts: attempt,
                        last_factor: factor,
                        source,
                    });
                }
            }
        }
    }
}

/// Meshes the whole network into `out_path`.
///
/// # Errors
///
/// [`MeshingError::OuterLoopExhausted`] when an element cannot be merged at
/// any radius factor above the floor, and [`MeshingError::Mesh`] for
/// tessellation and output failures.
pub fn mesh_network(
    graph: &SkeletonGraph,
    partition: &Partition,
    settings: &MeshingSettings,
    out_path: impl AsRef<Path>,
) -> Result<MeshingReport, MeshingError> {
    let out_path = out_path.as_ref();
    let tess = Tessellator {
        graph,
        partition,
        settings,
    };
    let order = elements(partition);
    let params = MergeParams::from_settings(settings);
    let mut writer = ObjStreamWriter::create(out_path)?;
    let mut resident = Mesh::new();
    let mut shapes: Vec<Primitive> = Vec::with_capacity(order.len());
    let mut report = MeshingReport {
        path: out_path.to_path_buf(),
        elements: Vec::with_capacity(order.len()),
        faces_written: 0,
        faces_flushed: 0,
        flushes: 0,
    };

    for (position, &element) in order.iter().enumerate() {
        let (radius_factors, stats) = merge_with_retries(settings, element.id, |factor, phase| {
            let (red, red_shape) = tess.tessellate(element, factor, phase)?;
            let placed = place(&mut resident, &shapes, red, &red_shape, &params);
            if placed.is_ok() {
                shapes.push(red_shape);
            }
            Ok(placed.map(|placement| match placement {
                Placement::Merged(stats) => Some(stats),
                Placement::Appended => None,
            }))
        })?;
        if let [_, .., last] = radius_factors.as_slice() {
            info!(
                element = element.id,
                attempts = radius_factors.len(),
                factor = last,
                "element merged with reduced radius"
            );
        }
        report.elements.push(ElementReport {
            element: element.id,
            kind: element.kind,
            radius_factors,
            stats,
        });

        if let Some(limit) = settings.flush_face_limit {
            if resident.face_count() >= limit {
                let guards: Vec<BoundingBox> = order[position + 1..]
                    .iter()
                    .filter_map(|&e| tess.guard_box(e))
                    .collect();
                let flushed = flush(&mut writer, &mut resident, &guards)?;
                if flushed > 0 {
                    report.flushes += 1;
                    report.faces_flushed += flushed as u64;
                    debug!(flushed, resident = resident.face_count(), "resident mesh flushed");
                }
            }
        }
    }

    report.faces_written = writer.finish(&mut resident)?;
    info!(
        path = %out_path.display(),
        elements = report.elements.len(),
        faces = report.faces_written,
        "network mesh written"
    );
    Ok(report)
}

/// Streams the faces outside every guard box and evicts them.
fn flush(writer: &mut ObjStreamWriter, resident: &mut Mesh, guards: &[BoundingBox]) -> Result<usize, MeshingError> {
    let keep: Vec<bool> = (0..resident.face_count())
        .map(|f| {
            let bbox = resident.face_bbox(f);
            guards.iter().any(|g| g.intersects(&bbox))
        })
        .collect();
    let done: Vec<usize> = keep
        .iter()
        .enumerate()
        .filter_map(|(f, &k)| (!k).then_some(f))
        .collect();
    if done.is_empty() {
        return Ok(0);
    }
    writer.write_faces(resident, &done)?;
    resident.retain_faces(&keep);
    resident.compact();
    Ok(done.len())
}

/// Tessellates every soma and path separately at radius factor 1 and writes
/// them into one file.
///
/// Returns the number of faces written.
pub fn mesh_individual_surfaces(
    graph: &SkeletonGraph,
    partition: &Partition,
    settings: &MeshingSettings,
    out_path: impl AsRef<Path>,
) -> Result<usize, MeshingError> {
    let tess = Tessellator {
        graph,
        partition,
        settings,
    };
    let mut all = Mesh::new();
    for element in elements(partition) {
        let (mesh, _) = tess.tessellate(element, 1.0, 0.0)?;
        all.append(&mesh);
    }
    write_obj(out_path.as_ref(), &all)?;
    info!(path = %out_path.as_ref().display(), faces = all.face_count(), "modelling surfaces written");
    Ok(all.face_count())
}

#[cfg(test)]
mod tests;
