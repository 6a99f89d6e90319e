//! SWC skeleton input.
//!
//! Each non-comment line holds one sample `id type x y z radius parent`,
//! with `parent = -1` for roots. Type 1 marks soma samples, 2 axon and 3/4
//! dendrites; other types are read as dendrites. Connected soma samples are
//! collapsed into one sphere at their centroid with their largest radius.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use cellgen_geometry::Vec3;
use tracing::debug;

use crate::error::SwcError;
use crate::graph::{SkeletonGraph, VertexId, VertexKind};

const SOMA_TYPE: i32 = 1;
const AXON_TYPE: i32 = 2;

#[derive(Debug, Clone, Copy)]
struct Sample {
    line: usize,
    id: i64,
    kind: i32,
    position: Vec3,
    radius: f64,
    parent: i64,
}

impl Sample {
    fn is_soma(&self) -> bool {
        self.kind == SOMA_TYPE
    }
}

/// Reads and validates an SWC file.
///
/// # Errors
///
/// [`SwcError`] for unreadable files, malformed lines and samples that do
/// not form a valid network.
pub fn read_swc(path: impl AsRef<Path>) -> Result<SkeletonGraph, SwcError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| SwcError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let graph = parse_swc(&text)?;
    debug!(path = %path.display(), vertices = graph.vertex_count(), cells = graph.cells().len(), "SWC read");
    Ok(graph)
}

/// Builds a network from SWC text.
///
/// # Example
///
/// ```rust
/// use cellgen_network::swc::parse_swc;
///
/// let g = parse_swc("1 1 0 0 0 5 -1\n2 3 4 0 0 1 1\n3 3 14 0 0 1 2\n").unwrap();
/// assert_eq!(g.cells().len(), 1);
/// assert_eq!(g.segment_count(), 1);
/// ```
pub fn parse_swc(text: &str) -> Result<SkeletonGraph, SwcError> {
    let samples = parse_samples(text)?;
    let mut index: HashMap<i64, usize> = HashMap::with_capacity(samples.len());
    for (i, s) in samples.iter().enumerate() {
        if index.insert(s.id, i).is_some() {
            return Err(SwcError::parse(s.line, format!("duplicate sample id {}", s.id)));
        }
    }
    let parent_of = |s: &Sample| -> Result<Option<usize>, SwcError> {
        if s.parent < 0 {
            return Ok(None);
        }
        index
            .get(&s.parent)
            .copied()
            .map(Some)
            .ok_or_else(|| SwcError::parse(s.line, format!("unknown parent id {}", s.parent)))
    };

    // connected soma samples share one representative
    let mut group: Vec<usize> = (0..samples.len()).collect();
    for (i, s) in samples.iter().enumerate() {
        if let Some(p) = parent_of(s)? {
            if s.is_soma() && samples[p].is_soma() {
                let (a, b) = (find(&mut group, i), find(&mut group, p));
                group[a.max(b)] = a.min(b);
            }
        }
    }

    let mut graph = SkeletonGraph::new();
    let mut vertex_of: Vec<Option<VertexId>> = vec![None; samples.len()];
    let mut members: HashMap<usize, Vec<usize>> = HashMap::new();
    let mut representatives = Vec::new();
    for (i, _) in samples.iter().enumerate().filter(|(_, s)| s.is_soma()) {
        let root = find(&mut group, i);
        let entry = members.entry(root).or_default();
        if entry.is_empty() {
            representatives.push(root);
        }
        entry.push(i);
    }
    for root in representatives {
        let group_members = members.get(&root).map(Vec::as_slice).unwrap_or_default();
        let centre = group_members.iter().map(|&i| samples[i].position).sum::<Vec3>() / group_members.len() as f64;
        let radius = group_members.iter().map(|&i| samples[i].radius).fold(0.0, f64::max);
        let soma = graph.add_vertex(centre, radius, VertexKind::Soma);
        for &i in group_members {
            vertex_of[i] = Some(soma);
        }
    }

    for (i, s) in samples.iter().enumerate().filter(|(_, s)| !s.is_soma()) {
        let kind = if s.kind == AXON_TYPE {
            VertexKind::Axon
        } else {
            VertexKind::Dendrite
        };
        vertex_of[i] = Some(graph.add_vertex(s.position, s.radius, kind));
    }

    for (i, s) in samples.iter().enumerate() {
        let (Some(p), Some(child)) = (parent_of(s)?, vertex_of[i]) else { continue };
        if s.is_soma() && samples[p].is_soma() {
            continue;
        }
        let parent = vertex_of[p].ok_or_else(|| SwcError::parse(s.line, "unresolved parent"))?;
        graph.add_edge(parent, child)?;
    }
    graph.validate()?;
    Ok(graph)
}

fn find(group: &mut [usize], mut i: usize) -> usize {
    while group[i] != i {
        group[i] = group[group[i]];
        i = group[i];
    }
    i
}

fn parse_samples(text: &str) -> Result<Vec<Sample>, SwcError> {
    let mut samples = Vec::new();
    for (n, raw) in text.lines().enumerate() {
        let line = n + 1;
        let content = raw.split('#').next().unwrap_or_default().trim();
        if content.is_empty() {
            continue;
        }
        let fields: Vec<&str> = content.split_whitespace().collect();
        if fields.len() < 7 {
            return Err(SwcError::parse(line, format!("expected 7 fields, found {}", fields.len())));
        }
        let int = |k: usize| {
            fields[k]
                .parse::<i64>()
                .map_err(|_| SwcError::parse(line, format!("invalid integer '{}'", fields[k])))
        };
        let float = |k: usize| {
            fields[k]
                .parse::<f64>()
                .map_err(|_| SwcError::parse(line, format!("invalid number '{}'", fields[k])))
        };
        samples.push(Sample {
            line,
            id: int(0)?,
            kind: int(1)? as i32,
            position: Vec3::new(float(2)?, float(3)?, float(4)?),
            radius: float(5)?,
            parent: int(6)?,
        });
    }
    Ok(samples)
}
