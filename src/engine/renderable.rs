// GPU side of a MeshAsset.
//
// Both geometry views are uploaded once and stay resident for the mesh's whole
// lifetime; switching shading is a flag flip, never a re-upload.
//
//   Smooth → GeometryView::Indexed    positions + normals + u32 indices, draw_indexed
//   Flat   → GeometryView::NonIndexed expanded positions + normals,      draw
//
// Buffers are released when the owning GeometryView drops, which covers every
// exit path including a failed upload halfway through.

use wgpu::util::DeviceExt;

use super::error::DeviceError;
use super::mesh::MeshAsset;

// ============================================================================
// VERTEX LAYOUT
// ============================================================================

// Positions and normals live in separate buffers:
//   slot 0 → @location(0) position: vec3<f32>
//   slot 1 → @location(1) normal:   vec3<f32>
const POSITION_ATTRIBUTES: [wgpu::VertexAttribute; 1] = [wgpu::VertexAttribute {
    offset: 0,
    shader_location: 0,
    format: wgpu::VertexFormat::Float32x3,
}];

const NORMAL_ATTRIBUTES: [wgpu::VertexAttribute; 1] = [wgpu::VertexAttribute {
    offset: 0,
    shader_location: 1,
    format: wgpu::VertexFormat::Float32x3,
}];

/// Vertex buffer layouts shared by both geometry views.
pub fn vertex_layouts() -> [wgpu::VertexBufferLayout<'static>; 2] {
    let stride = std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress;
    [
        wgpu::VertexBufferLayout {
            array_stride: stride,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &POSITION_ATTRIBUTES,
        },
        wgpu::VertexBufferLayout {
            array_stride: stride,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &NORMAL_ATTRIBUTES,
        },
    ]
}

// ============================================================================
// SHADING MODE / DRAW CALL
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShadingMode {
    #[default]
    Smooth,
    Flat,
}

impl ShadingMode {
    pub fn toggled(self) -> Self {
        match self {
            ShadingMode::Smooth => ShadingMode::Flat,
            ShadingMode::Flat => ShadingMode::Smooth,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ShadingMode::Smooth => "smooth",
            ShadingMode::Flat => "flat",
        }
    }
}

/// The single draw call a geometry view issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawCall {
    Indexed { index_count: u32 },
    NonIndexed { vertex_count: u32 },
}

impl DrawCall {
    /// Vertices the GPU processes for this call (indices for indexed draws).
    pub fn vertices_submitted(self) -> u32 {
        match self {
            DrawCall::Indexed { index_count } => index_count,
            DrawCall::NonIndexed { vertex_count } => vertex_count,
        }
    }

    pub fn triangle_count(self) -> u32 {
        self.vertices_submitted() / 3
    }
}

// ============================================================================
// GEOMETRY VIEWS
// ============================================================================

enum GeometryView {
    Indexed {
        positions: wgpu::Buffer,
        normals: wgpu::Buffer,
        indices: wgpu::Buffer,
        index_count: u32,
    },
    NonIndexed {
        positions: wgpu::Buffer,
        normals: wgpu::Buffer,
        vertex_count: u32,
    },
}

impl GeometryView {
    fn draw_call(&self) -> DrawCall {
        match self {
            GeometryView::Indexed { index_count, .. } => DrawCall::Indexed { index_count: *index_count },
            GeometryView::NonIndexed { vertex_count, .. } => DrawCall::NonIndexed { vertex_count: *vertex_count },
        }
    }

    fn record(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        match self {
            GeometryView::Indexed { positions, normals, indices, index_count } => {
                if *index_count == 0 {
                    return;
                }
                render_pass.set_vertex_buffer(0, positions.slice(..));
                render_pass.set_vertex_buffer(1, normals.slice(..));
                render_pass.set_index_buffer(indices.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..*index_count, 0, 0..1);
            }
            GeometryView::NonIndexed { positions, normals, vertex_count } => {
                if *vertex_count == 0 {
                    return;
                }
                render_pass.set_vertex_buffer(0, positions.slice(..));
                render_pass.set_vertex_buffer(1, normals.slice(..));
                render_pass.draw(0..*vertex_count, 0..1);
            }
        }
    }

    fn buffers(&self) -> Vec<&wgpu::Buffer> {
        match self {
            GeometryView::Indexed { positions, normals, indices, .. } => vec![positions, normals, indices],
            GeometryView::NonIndexed { positions, normals, .. } => vec![positions, normals],
        }
    }
}

impl Drop for GeometryView {
    fn drop(&mut self) {
        for buffer in self.buffers() {
            buffer.destroy();
        }
    }
}

// ============================================================================
// RENDERABLE MESH
// ============================================================================

/// A mesh resident on the GPU in both shading representations.
///
/// Owns its buffers exclusively and must not outlive the device that created
/// them. Dropping it (or calling `release`) frees all five buffers once.
pub struct RenderableMesh {
    smooth: GeometryView,
    flat: GeometryView,
    mode: ShadingMode,
}

impl RenderableMesh {
    /// Create both buffer groups from `asset`. Any device error aborts the
    /// upload; buffers created before the failure are released on return.
    pub fn upload(device: &wgpu::Device, asset: &MeshAsset) -> Result<Self, DeviceError> {
        let smooth = GeometryView::Indexed {
            positions: create_buffer(device, "Smooth Position Buffer", asset.position_bytes(), wgpu::BufferUsages::VERTEX)?,
            normals: create_buffer(device, "Smooth Normal Buffer", asset.smooth_normal_bytes(), wgpu::BufferUsages::VERTEX)?,
            indices: create_buffer(device, "Index Buffer", asset.index_bytes(), wgpu::BufferUsages::INDEX)?,
            index_count: asset.index_count() as u32,
        };

        let flat = GeometryView::NonIndexed {
            positions: create_buffer(device, "Flat Position Buffer", asset.flat_position_bytes(), wgpu::BufferUsages::VERTEX)?,
            normals: create_buffer(device, "Flat Normal Buffer", asset.flat_normal_bytes(), wgpu::BufferUsages::VERTEX)?,
            vertex_count: asset.flat().vertex_count() as u32,
        };

        let total: u64 = smooth.buffers().iter().chain(flat.buffers().iter()).map(|b| b.size()).sum();
        log::info!(
            "Uploaded mesh: {} indices (smooth), {} vertices (flat), {} bytes",
            asset.index_count(),
            asset.flat().vertex_count(),
            total
        );

        Ok(Self { smooth, flat, mode: ShadingMode::default() })
    }

    pub fn mode(&self) -> ShadingMode { self.mode }

    pub fn set_mode(&mut self, mode: ShadingMode) {
        if mode != self.mode {
            log::info!("Shading mode: {}", mode.label());
        }
        self.mode = mode;
    }

    pub fn toggle_mode(&mut self) {
        self.set_mode(self.mode.toggled());
    }

    /// The draw call `draw` will issue in the current mode.
    pub fn draw_call(&self) -> DrawCall {
        self.active().draw_call()
    }

    /// Record exactly one draw of the active view. The caller has already set
    /// the pipeline and bind groups.
    pub fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        self.active().record(render_pass);
    }

    /// Free the GPU buffers now instead of at scope exit.
    pub fn release(self) {
        drop(self);
    }

    fn active(&self) -> &GeometryView {
        match self.mode {
            ShadingMode::Smooth => &self.smooth,
            ShadingMode::Flat => &self.flat,
        }
    }
}

impl Drop for RenderableMesh {
    fn drop(&mut self) {
        log::debug!("Releasing mesh GPU buffers");
    }
}

/// Static (upload-once) buffer, with device errors caught through error scopes
/// instead of going to the uncaptured-error handler.
fn create_buffer(
    device: &wgpu::Device,
    label: &'static str,
    contents: &[u8],
    usage: wgpu::BufferUsages,
) -> Result<wgpu::Buffer, DeviceError> {
    device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
    device.push_error_scope(wgpu::ErrorFilter::Validation);

    let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents,
        usage,
    });

    let validation = pollster::block_on(device.pop_error_scope());
    let out_of_memory = pollster::block_on(device.pop_error_scope());

    match validation.or(out_of_memory) {
        Some(err) => {
            buffer.destroy();
            Err(DeviceError::Upload { label, source: err })
        }
        None => Ok(buffer),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::mesh::{tetrahedron, unit_cube};

    #[test]
    fn mode_toggles_alternate() {
        assert_eq!(ShadingMode::default(), ShadingMode::Smooth);
        let mut mode = ShadingMode::default();
        let mut seen = Vec::new();
        for _ in 0..4 {
            mode = mode.toggled();
            seen.push(mode);
        }
        assert_eq!(seen, vec![ShadingMode::Flat, ShadingMode::Smooth, ShadingMode::Flat, ShadingMode::Smooth]);
    }

    #[test]
    fn draw_call_counts() {
        let indexed = DrawCall::Indexed { index_count: 36 };
        let flat = DrawCall::NonIndexed { vertex_count: 36 };
        assert_eq!(indexed.triangle_count(), 12);
        assert_eq!(flat.triangle_count(), 12);
    }

    #[test]
    fn layouts_match_vec3_buffers() {
        let [positions, normals] = vertex_layouts();
        assert_eq!(positions.array_stride, 12);
        assert_eq!(normals.array_stride, 12);
        assert_eq!(positions.attributes[0].shader_location, 0);
        assert_eq!(normals.attributes[0].shader_location, 1);
    }

    // Needs a real (or software) adapter. Returns early on machines without one.
    fn headless_device() -> Option<(wgpu::Device, wgpu::Queue)> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::default());
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: None,
            force_fallback_adapter: false,
        }))?;
        pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor::default(), None)).ok()
    }

    #[test]
    fn upload_and_switch_modes() {
        let Some((device, _queue)) = headless_device() else {
            eprintln!("no graphics adapter, skipping");
            return;
        };

        let cube = unit_cube();
        let mut mesh = RenderableMesh::upload(&device, &cube).unwrap();

        assert_eq!(mesh.mode(), ShadingMode::Smooth);
        assert_eq!(mesh.draw_call(), DrawCall::Indexed { index_count: 36 });

        mesh.set_mode(ShadingMode::Flat);
        assert_eq!(mesh.mode(), ShadingMode::Flat);
        assert_eq!(mesh.draw_call(), DrawCall::NonIndexed { vertex_count: 36 });

        mesh.toggle_mode();
        assert_eq!(mesh.mode(), ShadingMode::Smooth);

        assert_eq!(mesh.smooth.buffers()[0].size(), cube.position_bytes().len() as u64);
        assert_eq!(mesh.flat.buffers()[0].size(), cube.flat_position_bytes().len() as u64);

        mesh.release();
    }

    #[test]
    fn both_modes_cover_same_triangles() {
        let Some((device, _queue)) = headless_device() else {
            eprintln!("no graphics adapter, skipping");
            return;
        };

        let mut mesh = RenderableMesh::upload(&device, &tetrahedron()).unwrap();
        let smooth = mesh.draw_call();
        mesh.toggle_mode();
        let flat = mesh.draw_call();

        assert_ne!(smooth, flat);
        assert_eq!(smooth.triangle_count(), 4);
        assert_eq!(flat.triangle_count(), 4);
    }
}
