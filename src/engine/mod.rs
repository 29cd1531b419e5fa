// Engine module - mesh loading, GPU residency and per-frame viewer state

pub mod camera;
pub mod debug_overlay;
pub mod error;
pub mod input;
pub mod mesh;
pub mod obj;
pub mod renderable;
pub mod scene;

// Re-export commonly used items
pub use error::DeviceError;
pub use mesh::MeshAsset;
pub use renderable::{RenderableMesh, ShadingMode};
pub use scene::Scene;
