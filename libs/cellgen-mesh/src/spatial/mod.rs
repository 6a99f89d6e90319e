//! # Face Grid
//!
//! Uniform hash grid over triangle bounding boxes. The merger queries it for
//! the faces of one mesh that may touch an edge or face of the other.

use std::collections::HashMap;

use cellgen_geometry::{BoundingBox, Vec3};

use crate::mesh::Mesh;

/// Cell edge length relative to the mean face extent.
const CELL_SIZE_FACTOR: f64 = 2.0;

/// Lower bound on the cell edge length.
const MIN_CELL_SIZE: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CellCoord {
    x: i64,
    y: i64,
    z: i64,
}

impl CellCoord {
    fn from_position(pos: Vec3, cell_size: f64) -> Self {
        Self {
            x: (pos.x / cell_size).floor() as i64,
            y: (pos.y / cell_size).floor() as i64,
            z: (pos.z / cell_size).floor() as i64,
        }
    }
}

/// Hash grid mapping cells to face indices of one mesh.
#[derive(Debug)]
pub struct FaceGrid {
    grid: HashMap<CellCoord, Vec<usize>>,
    cell_size: f64,
    bounds: BoundingBox,
    face_count: usize,
}

impl FaceGrid {
    /// Indexes every face of `mesh`.
    pub fn from_mesh(mesh: &Mesh) -> Self {
        let face_count = mesh.face_count();
        let bounds = mesh.bounding_box();
        let mean_extent = if face_count == 0 {
            0.0
        } else {
            (0..face_count)
                .map(|f| {
                    let e = mesh.face_bbox(f).extent();
                    e.x.max(e.y).max(e.z)
                })
                .sum::<f64>()
                / face_count as f64
        };
        let cell_size = (mean_extent * CELL_SIZE_FACTOR).max(MIN_CELL_SIZE);

        let mut grid: HashMap<CellCoord, Vec<usize>> = HashMap::new();
        for f in 0..face_count {
            let bb = mesh.face_bbox(f);
            let lo = CellCoord::from_position(bb.min, cell_size);
            let hi = CellCoord::from_position(bb.max, cell_size);
            for x in lo.x..=hi.x {
                for y in lo.y..=hi.y {
                    for z in lo.z..=hi.z {
                        grid.entry(CellCoord { x, y, z }).or_default().push(f);
                    }
                }
            }
        }

        Self {
            grid,
            cell_size,
            bounds,
            face_count,
        }
    }

    /// Face indices whose cells overlap `query`, each reported once.
    pub fn query_box(&self, query: &BoundingBox) -> Vec<usize> {
        if self.face_count == 0 || !self.bounds.intersects(query) {
            return Vec::new();
        }
        let lo = CellCoord::from_position(query.min.max(self.bounds.min), self.cell_size);
        let hi = CellCoord::from_position(query.max.min(self.bounds.max), self.cell_size);

        let mut seen = vec![false; self.face_count];
        let mut result = Vec::new();
        for x in lo.x..=hi.x {
            for y in lo.y..=hi.y {
                for z in lo.z..=hi.z {
                    if let Some(faces) = self.grid.get(&CellCoord { x, y, z }) {
                        for &f in faces {
                            if !seen[f] {
                                seen[f] = true;
                                result.push(f);
                            }
                        }
                    }
                }
            }
        }
        result
    }

    /// Faces that may meet the segment `p`–`q`.
    pub fn query_segment(&self, p: Vec3, q: Vec3) -> Vec<usize> {
        self.query_box(&BoundingBox::from_points([p, q]))
    }

    /// Cell edge length chosen for the grid.
    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }
}
