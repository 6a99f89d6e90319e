//! # Wavefront OBJ
//!
//! Reading and writing of triangle meshes as ASCII OBJ (`v x y z`,
//! `f a b c`, one-based indices).
//!
//! The [`ObjStreamWriter`] writes a mesh in several installments: faces are
//! emitted as soon as they can no longer change, their vertices receive a
//! global index stored in [`VertexTag::flushed`](crate::VertexTag), and later
//! faces reuse that index.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use cellgen_geometry::Vec3;

use crate::error::{MeshError, MeshResult};
use crate::mesh::{FaceTag, Mesh, VertexTag};

/// Reads an OBJ file, triangulating polygons as fans.
///
/// Texture and normal references (`f 1/2/3 ...`) are ignored, negative
/// indices are resolved relative to the vertices read so far.
///
/// # Errors
///
/// [`MeshError::Io`] if the file cannot be read, [`MeshError::Parse`] for
/// malformed lines or out-of-range indices.
pub fn read_obj(path: impl AsRef<Path>) -> MeshResult<Mesh> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| MeshError::io(path, e))?;
    parse_obj(BufReader::new(file), path)
}

fn parse_obj<R: BufRead>(reader: R, path: &Path) -> MeshResult<Mesh> {
    let mut mesh = Mesh::new();
    let tag = VertexTag::new(0);
    for (lineno, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| MeshError::io(path, e))?;
        let number = lineno + 1;
        let mut parts = line.split_whitespace();
        match parts.next() {
            Some("v") => {
                let mut coord = [0.0; 3];
                for c in &mut coord {
                    let token = parts
                        .next()
                        .ok_or_else(|| MeshError::parse(number, "vertex needs three coordinates"))?;
                    *c = token
                        .parse()
                        .map_err(|_| MeshError::parse(number, format!("invalid coordinate \"{token}\"")))?;
                }
                mesh.add_vertex(Vec3::from_array(coord), tag);
            }
            Some("f") => {
                let count = mesh.vertex_count() as i64;
                let indices = parts
                    .map(|token| resolve_index(token, count, number))
                    .collect::<MeshResult<Vec<u32>>>()?;
                if indices.len() < 3 {
                    return Err(MeshError::parse(number, "face needs at least three vertices"));
                }
                for k in 1..indices.len() - 1 {
                    mesh.add_face([indices[0], indices[k], indices[k + 1]], FaceTag::default());
                }
            }
            _ => {}
        }
    }
    Ok(mesh)
}

fn resolve_index(token: &str, count: i64, line: usize) -> MeshResult<u32> {
    let head = token.split('/').next().unwrap_or(token);
    let raw: i64 = head
        .parse()
        .map_err(|_| MeshError::parse(line, format!("invalid index \"{token}\"")))?;
    let zero_based = if raw < 0 { count + raw } else { raw - 1 };
    if raw == 0 || zero_based < 0 || zero_based >= count {
        return Err(MeshError::parse(line, format!("index {raw} out of range")));
    }
    Ok(zero_based as u32)
}

/// Writes a complete mesh.
///
/// # Errors
///
/// [`MeshError::Io`] if the file cannot be written.
pub fn write_obj(path: impl AsRef<Path>, mesh: &Mesh) -> MeshResult<()> {
    let mut copy = mesh.clone();
    for v in 0..copy.vertex_count() as u32 {
        copy.vertex_tag_mut(v).flushed = None;
    }
    let mut writer = ObjStreamWriter::create(path)?;
    writer.finish(&mut copy)?;
    Ok(())
}

/// Incremental OBJ writer with global vertex numbering.
#[derive(Debug)]
pub struct ObjStreamWriter {
    path: PathBuf,
    out: BufWriter<File>,
    vertices_written: u64,
    faces_written: u64,
}

impl ObjStreamWriter {
    /// Creates (truncates) the output file.
    pub fn create(path: impl AsRef<Path>) -> MeshResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path).map_err(|e| MeshError::io(&path, e))?;
        Ok(Self {
            path,
            out: BufWriter::new(file),
            vertices_written: 0,
            faces_written: 0,
        })
    }

    /// Output path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of vertices written so far.
    pub fn vertices_written(&self) -> u64 {
        self.vertices_written
    }

    /// Number of faces written so far.
    pub fn faces_written(&self) -> u64 {
        self.faces_written
    }

    /// Writes the listed faces of `mesh`.
    ///
    /// Vertices without a global index are written first and tagged with it.
    /// The faces themselves stay in `mesh`; removing them is up to the caller.
    pub fn write_faces(&mut self, mesh: &mut Mesh, faces: &[usize]) -> MeshResult<()> {
        let mut lines = Vec::with_capacity(faces.len());
        for &f in faces {
            let mut global = [0_u64; 3];
            for (slot, v) in global.iter_mut().zip(mesh.face(f)) {
                *slot = match mesh.vertex_tag(v).flushed {
                    Some(index) => index,
                    None => {
                        let p = mesh.vertex(v);
                        writeln!(self.out, "v {} {} {}", p.x, p.y, p.z).map_err(|e| self.io(e))?;
                        self.vertices_written += 1;
                        mesh.vertex_tag_mut(v).flushed = Some(self.vertices_written);
                        self.vertices_written
                    }
                };
            }
            lines.push(global);
        }
        for [a, b, c] in lines {
            writeln!(self.out, "f {a} {b} {c}").map_err(|e| self.io(e))?;
        }
        self.faces_written += faces.len() as u64;
        Ok(())
    }

    /// Writes every remaining face of `mesh` and closes the file.
    ///
    /// Returns the total number of faces in the file.
    pub fn finish(mut self, mesh: &mut Mesh) -> MeshResult<u64> {
        let all: Vec<usize> = (0..mesh.face_count()).collect();
        self.write_faces(mesh, &all)?;
        self.out.flush().map_err(|e| self.io(e))?;
        Ok(self.faces_written)
    }

    fn io(&self, source: std::io::Error) -> MeshError {
        MeshError::io(&self.path, source)
    }
}
