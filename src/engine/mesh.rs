// Mesh asset and the two render-ready geometry views derived from it.
//
// Two-view architecture:
//   file → obj::parse() → positions + faces
//        → compute_smooth_normals()       → indexed view (shared vertices, one normal per vertex)
//        → compute_flat_representation()  → expanded view (3 vertices per triangle, one normal per face)
//
// Both views are built once at load time and never mutated afterwards.

use std::path::Path;

use glam::Vec3;

use super::error::MeshResult;
use super::obj;

// ============================================================================
// FACE NORMAL
// ============================================================================

/// Unit normal of the triangle (a, b, c) following the right-hand rule on its
/// winding. Degenerate (zero-area) triangles yield `Vec3::ZERO`, never NaN.
pub fn face_normal(a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    (b - a).cross(c - a).normalize_or_zero()
}

// ============================================================================
// SMOOTH NORMALS
// ============================================================================

/// Per-vertex normals for indexed (smooth) shading.
///
/// Algorithm:
///   1. Add each face's *unit* normal into the accumulator of its three corners.
///      Plain sum: no area or angle weighting.
///   2. Normalize each accumulator. Vertices no face touches stay at zero.
///
/// Faces must reference valid indices into `positions`.
pub fn compute_smooth_normals(positions: &[Vec3], faces: &[[u32; 3]]) -> Vec<Vec3> {
    let mut normal_accum: Vec<Vec3> = vec![Vec3::ZERO; positions.len()];

    for &[i0, i1, i2] in faces {
        let (i0, i1, i2) = (i0 as usize, i1 as usize, i2 as usize);
        let normal = face_normal(positions[i0], positions[i1], positions[i2]);
        normal_accum[i0] += normal;
        normal_accum[i1] += normal;
        normal_accum[i2] += normal;
    }

    normal_accum.iter().map(|n| n.normalize_or_zero()).collect()
}

// ============================================================================
// FLAT REPRESENTATION
// ============================================================================

/// Non-indexed geometry for flat shading: every triangle gets its own three
/// vertices so all three corners can carry the same normal.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatGeometry {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
}

impl FlatGeometry {
    pub fn vertex_count(&self) -> usize { self.positions.len() }
}

/// Expand `faces` into a flat vertex stream (triangle 0's corners first, then
/// triangle 1's, ...) and pair it with one replicated normal per triangle.
/// Both lists hold exactly `3 * faces.len()` entries.
pub fn compute_flat_representation(positions: &[Vec3], faces: &[[u32; 3]]) -> FlatGeometry {
    let expanded: Vec<Vec3> = faces
        .iter()
        .flat_map(|face| face.iter().map(|&i| positions[i as usize]))
        .collect();

    let normals: Vec<Vec3> = expanded
        .chunks_exact(3)
        .flat_map(|tri| {
            let n = face_normal(tri[0], tri[1], tri[2]);
            [n, n, n]
        })
        .collect();

    FlatGeometry { positions: expanded, normals }
}

// ============================================================================
// MESH ASSET
// ============================================================================

/// A parsed triangle mesh with both derived normal sets.
/// CPU-side only; `RenderableMesh::upload` turns it into GPU buffers.
#[derive(Debug, Clone)]
pub struct MeshAsset {
    positions: Vec<Vec3>,
    faces: Vec<[u32; 3]>,
    smooth_normals: Vec<Vec3>,
    flat: FlatGeometry,
}

impl MeshAsset {
    /// Parse `path` and derive the smooth and flat views.
    pub fn load(path: &Path) -> MeshResult<Self> {
        let data = obj::parse(path)?;
        let mesh = Self::from_parts(data.positions, data.faces);

        log::info!(
            "Loaded {}: {} vertices, {} triangles",
            path.display(),
            mesh.vertex_count(),
            mesh.face_count()
        );
        Ok(mesh)
    }

    /// Build from already-validated positions and 0-based triangle indices.
    pub fn from_parts(positions: Vec<Vec3>, faces: Vec<[u32; 3]>) -> Self {
        debug_assert!(
            faces.iter().flatten().all(|&i| (i as usize) < positions.len()),
            "face index out of range"
        );

        let smooth_normals = compute_smooth_normals(&positions, &faces);
        let flat = compute_flat_representation(&positions, &faces);

        let unreferenced = smooth_normals.iter().filter(|n| **n == Vec3::ZERO).count();
        if unreferenced > 0 {
            log::warn!("{} vertices have no usable normal (unreferenced or degenerate)", unreferenced);
        }
        let degenerate = flat.normals.chunks_exact(3).filter(|n| n[0] == Vec3::ZERO).count();
        if degenerate > 0 {
            log::warn!("{} degenerate triangles", degenerate);
        }

        Self { positions, faces, smooth_normals, flat }
    }

    pub fn positions(&self) -> &[Vec3] { &self.positions }
    pub fn faces(&self) -> &[[u32; 3]] { &self.faces }
    pub fn smooth_normals(&self) -> &[Vec3] { &self.smooth_normals }
    pub fn flat(&self) -> &FlatGeometry { &self.flat }

    pub fn vertex_count(&self) -> usize { self.positions.len() }
    pub fn face_count(&self) -> usize { self.faces.len() }

    /// Number of indices the smooth (indexed) draw consumes.
    pub fn index_count(&self) -> usize { self.faces.len() * 3 }

    // Raw byte views for wgpu buffer upload.

    pub fn position_bytes(&self) -> &[u8] { bytemuck::cast_slice(&self.positions) }
    pub fn smooth_normal_bytes(&self) -> &[u8] { bytemuck::cast_slice(&self.smooth_normals) }
    pub fn index_bytes(&self) -> &[u8] { bytemuck::cast_slice(&self.faces) }
    pub fn flat_position_bytes(&self) -> &[u8] { bytemuck::cast_slice(&self.flat.positions) }
    pub fn flat_normal_bytes(&self) -> &[u8] { bytemuck::cast_slice(&self.flat.normals) }
}

// ============================================================================
// TEST MESHES
// ============================================================================

/// Axis-aligned unit cube centred on the origin: 8 shared corners, 12 triangles,
/// CCW winding seen from outside.
#[cfg(test)]
pub fn unit_cube() -> MeshAsset {
    let positions = vec![
        Vec3::new(-0.5, -0.5,  0.5),
        Vec3::new( 0.5, -0.5,  0.5),
        Vec3::new( 0.5,  0.5,  0.5),
        Vec3::new(-0.5,  0.5,  0.5),
        Vec3::new(-0.5, -0.5, -0.5),
        Vec3::new( 0.5, -0.5, -0.5),
        Vec3::new( 0.5,  0.5, -0.5),
        Vec3::new(-0.5,  0.5, -0.5),
    ];
    // Every diagonal runs through corners 0, 2, 5, 7 so each corner gets the
    // same number of triangles from each of its three faces.
    let faces = vec![
        [0, 1, 2], [0, 2, 3],  // +Z
        [5, 4, 7], [5, 7, 6],  // -Z
        [0, 3, 7], [0, 7, 4],  // -X
        [5, 6, 2], [5, 2, 1],  // +X
        [2, 6, 7], [2, 7, 3],  // +Y
        [5, 1, 0], [5, 0, 4],  // -Y
    ];
    MeshAsset::from_parts(positions, faces)
}

/// Regular tetrahedron, outward winding.
#[cfg(test)]
pub fn tetrahedron() -> MeshAsset {
    let positions = vec![
        Vec3::new( 1.0,  1.0,  1.0),
        Vec3::new( 1.0, -1.0, -1.0),
        Vec3::new(-1.0,  1.0, -1.0),
        Vec3::new(-1.0, -1.0,  1.0),
    ];
    let faces = vec![[0, 1, 2], [0, 3, 1], [0, 2, 3], [1, 3, 2]];
    MeshAsset::from_parts(positions, faces)
}
