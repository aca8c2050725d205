// Shrapnel Engine - Data-Oriented Programming (DOP) Architecture
//
// Instanced mesh rendering with uniform midpoint subdivision and
// per-triangle shrapnel simulation.
// - *_data.rs modules hold plain data
// - *_operations.rs modules hold the pure functions that transform it
// - renderer::boundary is the only seam to a real GPU
//
// For new code, prefer:
// - world_operations for driving a scene frame by frame
// - geometry / shrapnel operations for direct buffer work
// - renderer::HeadlessBackend when no GPU is available

// Constants module
pub mod constants;

// Core engine modules
pub mod config;
pub mod error;

// Essential systems
pub mod geometry;
pub mod mesh;
pub mod renderer;
pub mod shrapnel;
pub mod world;

pub use config::{EngineConfig, LightingConfig, SceneConfig, ShrapnelConfig, TangentConfig};
pub use error::{EngineError, EngineResult, OptionExt};
pub use geometry::{BufferKind, DirtyFlags, GeometryData, GeometrySource};
pub use mesh::{parse_mesh, MeshData, MeshParseError, Vertex};
pub use renderer::{
    CameraSource, FixedCamera, GpuBufferService, HeadlessBackend, RenderBackend, RendererData,
    ShaderHandle, ShaderService, UniformValue,
};
pub use shrapnel::ShrapnelData;
pub use world::{TouchEvent, TouchState, WorldData};
