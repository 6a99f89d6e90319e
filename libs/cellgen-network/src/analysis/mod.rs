//! # Geometric Intersection Analysis
//!
//! Decides whether the modelling surfaces of a network are free of conflicts
//! that would make a consistent surface mesh impossible.
//!
//! ## Phases
//!
//! ```text
//! snapshot → broad phase (sweep and prune on x over magnified boxes)
//!          → narrow phase, one job per segment on a worker pool
//!          → sequential fold of the job results into the segment status
//! ```
//!
//! A pair of segments is evaluated by the segment with the lower edge id;
//! the fold mirrors the result onto the partner. Results do not depend on
//! the thread count.
//!
//! ## Checks per segment
//!
//! | Kind | Test |
//! |------|------|
//! | `smdv` | length below the neighbourhood radius |
//! | `pmdv` | non-adjacent path vertices closer than their radii |
//! | `spmdv` | end vertex inside a soma |
//! | `reg`, `lsi` | univariate clipping on the segment surface |
//! | `sons` | root segments must cross their soma, others must avoid all somata |
//! | `gsi` | non-adjacent segments of the same path |
//! | `nsns` | segments of different paths, related or independent |

pub mod status;

use std::collections::HashMap;

use cellgen_geometry::contact::{
    canal_contact, local_self_intersection, point_clearance, regularity, sphere_contact, Contact,
};
use cellgen_geometry::{BoundingBox, CanalSurface, SolverError, Vec3};
use config::settings::AnalysisSettings;
use rayon::prelude::*;
use tracing::{debug, info, trace};

use crate::error::AnalysisError;
use crate::graph::{EdgeId, SkeletonGraph, VertexId, VertexKind};
use crate::path::{Attachment, Partition, PathId};

use status::{LsiIsecInfo, NsnsContact, NsnsRelation, RegIsecInfo, SegmentContact, SomaContact};

/// Number of segments flagged per conflict kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConflictCounts {
    /// Path minimal distance violations.
    pub pmdv: usize,
    /// Soma-path minimal distance violations.
    pub spmdv: usize,
    /// Segment minimal distance violations.
    pub smdv: usize,
    /// Regularity violations.
    pub reg: usize,
    /// Local self-intersections.
    pub lsi: usize,
    /// Global self-intersections.
    pub gsi: usize,
    /// Broken required soma contacts.
    pub rc_sons: usize,
    /// Illegal soma contacts.
    pub ic_sons: usize,
    /// Broken required neurite contacts.
    pub rc_nsns: usize,
    /// Illegal contacts between related neighbours.
    pub icrn_nsns: usize,
    /// Illegal contacts between independent segments.
    pub icin_nsns: usize,
}

impl ConflictCounts {
    /// Sum over all kinds.
    pub fn total(&self) -> usize {
        self.pmdv
            + self.spmdv
            + self.smdv
            + self.reg
            + self.lsi
            + self.gsi
            + self.rc_sons
            + self.ic_sons
            + self.rc_nsns
            + self.icrn_nsns
            + self.icin_nsns
    }
}

/// Summary of one analysis run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnalysisReport {
    /// No conflict and no anomaly on any segment.
    pub clean: bool,
    /// Segments analysed.
    pub segments: usize,
    /// Segment pairs passed to the narrow phase.
    pub candidate_pairs: usize,
    /// Flagged segments per kind.
    pub counts: ConflictCounts,
    /// Solver failures, summed over all segments.
    pub anomalies: usize,
}

// =============================================================================
// SNAPSHOT
// =============================================================================

struct SegmentRecord {
    edge: EdgeId,
    path: PathId,
    index: usize,
    surface: CanalSurface,
    bbox: BoundingBox,
    src: Vec3,
    dst: Vec3,
    rmax_nb: f64,
}

struct SomaRecord {
    id: VertexId,
    centre: Vec3,
    radius: f64,
    bbox: BoundingBox,
}

struct PathRecord {
    soma: VertexId,
    start: VertexId,
    attachment: Option<Attachment>,
    positions: Vec<Vec3>,
    radii: Vec<f64>,
    /// Record index of each segment.
    segments: Vec<usize>,
}

struct Snapshot {
    segments: Vec<SegmentRecord>,
    somata: Vec<SomaRecord>,
    paths: Vec<PathRecord>,
    /// Segments of degenerate paths, reported as anomalies.
    degenerate: Vec<EdgeId>,
}

impl Snapshot {
    fn capture(graph: &SkeletonGraph, partition: &Partition) -> Result<Self, AnalysisError> {
        let somata = graph
            .vertices()
            .filter(|(_, v)| v.kind == VertexKind::Soma)
            .map(|(id, v)| SomaRecord {
                id,
                centre: v.position,
                radius: v.radius,
                bbox: BoundingBox::around_sphere(v.position, v.radius),
            })
            .collect();

        let mut segments = Vec::new();
        let mut degenerate = Vec::new();
        let mut paths = Vec::with_capacity(partition.len());
        for path in &partition.paths {
            if !path.geometry_updated() && !path.is_degenerate() {
                return Err(AnalysisError::MissingGeometry(path.id()));
            }
            let mut positions = Vec::with_capacity(path.num_vertices());
            let mut radii = Vec::with_capacity(path.num_vertices());
            for &v in path.vertices() {
                let vertex = graph.vertex(v).ok_or(AnalysisError::MissingGeometry(path.id()))?;
                positions.push(vertex.position);
                radii.push(vertex.radius);
            }
            let mut indices = Vec::with_capacity(path.num_edges());
            if path.is_degenerate() {
                degenerate.extend_from_slice(path.edges());
            }
            for (k, (&edge, surface)) in path.edges().iter().zip(path.surfaces()).enumerate() {
                let info = graph
                    .edge(edge)
                    .and_then(|e| e.segment())
                    .ok_or(AnalysisError::MissingGeometry(path.id()))?;
                indices.push(segments.len());
                segments.push(SegmentRecord {
                    edge,
                    path: path.id(),
                    index: k,
                    surface: surface.clone(),
                    bbox: path.magnified()[k].bounding_box(),
                    src: positions[k],
                    dst: positions[k + 1],
                    rmax_nb: info.src_rmax_nb.max(info.dst_rmax_nb),
                });
            }
            paths.push(PathRecord {
                soma: path.soma(),
                start: path.start(),
                attachment: path.attachment(),
                positions,
                radii,
                segments: indices,
            });
        }
        Ok(Self {
            segments,
            somata,
            paths,
            degenerate,
        })
    }

    fn path(&self, id: PathId) -> &PathRecord {
        &self.paths[id.0 as usize]
    }

    /// Returns true if `b` belongs to the neighbourhood of the branch vertex
    /// where the path of `a` starts: the parent segments incident to it or
    /// the first segment of another path starting there.
    fn in_start_neighbourhood(&self, a: &SegmentRecord, b: &SegmentRecord) -> bool {
        let pa = self.path(a.path);
        let parent_incident = pa.attachment.is_some_and(|att| {
            att.parent == b.path && (b.index + 1 == att.vertex_index || b.index == att.vertex_index)
        });
        let sibling_first = b.index == 0 && b.path != a.path && self.path(b.path).start == pa.start;
        parent_incident || sibling_first
    }

    /// `None` when contact between `a` and `b` is expected.
    fn relation(&self, a: &SegmentRecord, b: &SegmentRecord) -> Option<NsnsRelation> {
        for (x, y) in [(a, b), (b, a)] {
            if self.in_start_neighbourhood(x, y) {
                return (x.index != 0).then_some(NsnsRelation::RelatedNeighbour);
            }
        }
        Some(NsnsRelation::Independent)
    }
}

// =============================================================================
// BROAD PHASE
// =============================================================================

/// Candidate partners with a higher edge id for every segment, by box overlap.
fn sweep_and_prune(segments: &[SegmentRecord]) -> Vec<Vec<usize>> {
    let mut order: Vec<usize> = (0..segments.len()).collect();
    order.sort_by(|&i, &j| {
        segments[i]
            .bbox
            .min
            .x
            .total_cmp(&segments[j].bbox.min.x)
            .then(segments[i].edge.cmp(&segments[j].edge))
    });

    let mut partners = vec![Vec::new(); segments.len()];
    let mut active: Vec<usize> = Vec::new();
    for i in order {
        let bi = &segments[i].bbox;
        active.retain(|&j| segments[j].bbox.max.x >= bi.min.x);
        for &j in &active {
            if bi.intersects(&segments[j].bbox) {
                let (lo, hi) = if segments[i].edge < segments[j].edge { (i, j) } else { (j, i) };
                partners[lo].push(hi);
            }
        }
        active.push(i);
    }
    for list in &mut partners {
        list.sort_by_key(|&j| segments[j].edge);
    }
    partners
}

// =============================================================================
// NARROW PHASE
// =============================================================================

#[derive(Debug, Clone, Copy)]
enum PairKind {
    Gsi,
    Nsns(NsnsRelation),
}

#[derive(Debug, Clone, Copy)]
struct PairOutcome {
    partner: usize,
    contact: Contact,
    kind: PairKind,
}

#[derive(Debug, Default)]
struct SegmentOutcome {
    reg: Option<RegIsecInfo>,
    lsi: Option<LsiIsecInfo>,
    smdv: bool,
    pmdv: bool,
    spmdv: bool,
    rc_sons: bool,
    rc_nsns: bool,
    sons: Vec<SomaContact>,
    pairs: Vec<PairOutcome>,
    anomalies: u32,
}

impl SegmentOutcome {
    /// Keeps the value of a solver call, counting failures as anomalies.
    fn solved<T>(&mut self, result: Result<T, SolverError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                trace!(%err, "solver anomaly");
                self.anomalies += 1;
                None
            }
        }
    }
}

fn evaluate(snap: &Snapshot, i: usize, partners: &[usize], settings: &AnalysisSettings) -> SegmentOutcome {
    let seg = &snap.segments[i];
    let path = snap.path(seg.path);
    let mut out = SegmentOutcome::default();
    let (ueps, beps) = (settings.univar_eps, settings.bivar_eps);

    // distance checks
    out.smdv = seg.src.distance(seg.dst) < seg.rmax_nb;
    let k = seg.index;
    out.pmdv = (k + 2..path.positions.len())
        .any(|j| path.positions[k].distance(path.positions[j]) < path.radii[k] + path.radii[j]);
    out.spmdv = snap
        .somata
        .iter()
        .any(|s| s.centre.distance(seg.dst) < s.radius);

    // single surface
    if let Some(c) = out.solved(regularity(&seg.surface, ueps)).flatten() {
        out.reg = Some(RegIsecInfo { t: c.s, value: c.value });
    }
    if let Some(c) = out.solved(local_self_intersection(&seg.surface, ueps)).flatten() {
        out.lsi = Some(LsiIsecInfo { t: c.s, value: c.value });
    }

    // somata
    let root_segment = k == 0 && path.attachment.is_none();
    for soma in &snap.somata {
        if root_segment && soma.id == path.soma {
            let starts_inside = soma.centre.distance(seg.src) < soma.radius;
            let leaves = soma.centre.distance(seg.dst) > soma.radius;
            out.rc_sons = !(starts_inside && leaves);
            continue;
        }
        if !soma.bbox.intersects(&seg.bbox) {
            continue;
        }
        if let Some(c) = out.solved(sphere_contact(&seg.surface, soma.centre, soma.radius, ueps)).flatten() {
            out.sons.push(SomaContact {
                soma: soma.id,
                t: c.s,
                value: c.value,
            });
        }
    }

    // required contact with the parent path
    if let (0, Some(att)) = (k, path.attachment) {
        let parent = snap.path(att.parent);
        let incident = [att.vertex_index.checked_sub(1), Some(att.vertex_index)];
        for idx in incident.into_iter().flatten() {
            let Some(&p) = parent.segments.get(idx) else { continue };
            let clearance = out.solved(point_clearance(&snap.segments[p].surface, seg.dst, ueps));
            if clearance.is_some_and(|c| c < 0.0) {
                out.rc_nsns = true;
            }
        }
    }

    // pairs
    for &j in partners {
        let other = &snap.segments[j];
        let kind = if other.path == seg.path {
            if other.index.abs_diff(seg.index) < 2 {
                continue;
            }
            PairKind::Gsi
        } else {
            match snap.relation(seg, other) {
                Some(relation) => PairKind::Nsns(relation),
                None => continue,
            }
        };
        if let Some(contact) = out.solved(canal_contact(&seg.surface, &other.surface, ueps, beps)).flatten() {
            out.pairs.push(PairOutcome {
                partner: j,
                contact,
                kind,
            });
        }
    }
    out
}

// =============================================================================
// DRIVER
// =============================================================================

/// Analyses every segment of a parametrized partition.
///
/// Previous intersection status is replaced.
///
/// # Errors
///
/// [`AnalysisError`] if a path was never parametrized or the worker pool
/// cannot be started. Solver failures and segments of degenerate paths are
/// recorded as anomalies instead.
pub fn analyze(
    graph: &mut SkeletonGraph,
    partition: &Partition,
    settings: &AnalysisSettings,
) -> Result<AnalysisReport, AnalysisError> {
    let snap = Snapshot::capture(graph, partition)?;
    let partners = sweep_and_prune(&snap.segments);
    let candidate_pairs = partners.iter().map(Vec::len).sum();

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(settings.nthreads)
        .build()?;
    let outcomes: Vec<SegmentOutcome> = pool.install(|| {
        (0..snap.segments.len())
            .into_par_iter()
            .map(|i| evaluate(&snap, i, &partners[i], settings))
            .collect()
    });

    // sequential fold, mirrors pair results onto the partner
    let edge_of = |i: usize| snap.segments[i].edge;
    let mut statuses: HashMap<EdgeId, status::IntersectionStatus> =
        snap.segments.iter().map(|s| (s.edge, status::IntersectionStatus::default())).collect();
    for (i, out) in outcomes.iter().enumerate() {
        let this = edge_of(i);
        if let Some(st) = statuses.get_mut(&this) {
            st.update_reg(out.reg);
            st.update_lsi(out.lsi);
            st.set_distance_violations(out.smdv, out.pmdv, out.spmdv);
            if out.rc_sons {
                st.set_rc_sons();
            }
            if out.rc_nsns {
                st.set_rc_nsns();
            }
            for &c in &out.sons {
                st.add_sons_contact(c);
            }
            for _ in 0..out.anomalies {
                st.record_anomaly();
            }
        }
        for pair in &out.pairs {
            let contact = SegmentContact {
                partner: edge_of(pair.partner),
                s: pair.contact.s,
                t: pair.contact.t,
            };
            let mirrored = contact.mirrored(this);
            for (owner, c) in [(this, contact), (contact.partner, mirrored)] {
                let Some(st) = statuses.get_mut(&owner) else { continue };
                match pair.kind {
                    PairKind::Gsi => st.add_gsi_contact(c),
                    PairKind::Nsns(relation) => st.add_nsns_contact(NsnsContact { contact: c, relation }),
                }
            }
        }
    }

    let mut report = AnalysisReport {
        segments: snap.segments.len() + snap.degenerate.len(),
        candidate_pairs,
        ..AnalysisReport::default()
    };
    for &edge in &snap.degenerate {
        let mut st = status::IntersectionStatus::default();
        st.record_anomaly();
        report.anomalies += 1;
        if let Some(info) = graph.edge_mut(edge).and_then(|e| e.segment_mut()) {
            info.status = st;
        }
    }
    for seg in &snap.segments {
        let Some(st) = statuses.remove(&seg.edge) else { continue };
        let f = st.flags();
        let counts = &mut report.counts;
        for (flag, count) in [
            (f.pmdv, &mut counts.pmdv),
            (f.spmdv, &mut counts.spmdv),
            (f.smdv, &mut counts.smdv),
            (f.reg, &mut counts.reg),
            (f.lsi, &mut counts.lsi),
            (f.gsi, &mut counts.gsi),
            (f.rc_sons, &mut counts.rc_sons),
            (f.ic_sons, &mut counts.ic_sons),
            (f.rc_nsns, &mut counts.rc_nsns),
            (f.icrn_nsns, &mut counts.icrn_nsns),
            (f.icin_nsns, &mut counts.icin_nsns),
        ] {
            *count += usize::from(flag);
        }
        report.anomalies += st.anomalies() as usize;
        if let Some(info) = graph.edge_mut(seg.edge).and_then(|e| e.segment_mut()) {
            info.status = st;
        }
    }
    report.clean = report.counts.total() == 0 && report.anomalies == 0;

    if report.clean {
        info!(segments = report.segments, pairs = candidate_pairs, "network is clean");
    } else {
        info!(
            segments = report.segments,
            conflicts = report.counts.total(),
            anomalies = report.anomalies,
            "network is not clean"
        );
    }
    debug!(counts = ?report.counts, "analysis finished");
    Ok(report)
}

#[cfg(test)]
mod tests;
