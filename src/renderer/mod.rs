//! Renderer Module - Data-Oriented Programming (DOP) style
//!
//! - boundary.rs: traits for the shader, buffer and camera services
//! - renderer_data.rs: GPU handles and frame counters
//! - renderer_operations.rs: load / render / unload
//! - headless.rs: in-memory backend for tests and offline runs

pub mod boundary;
pub mod headless;
pub mod renderer_data;
pub mod renderer_operations;

pub use boundary::{
    AttributeBinding, BufferHandle, BufferTarget, CameraSource, GpuBufferService, RenderBackend,
    ShaderHandle, ShaderService, UniformValue,
};
pub use headless::{FixedCamera, GpuCall, HeadlessBackend};
pub use renderer_data::{GpuHandles, RenderStats, RendererData};
pub use renderer_operations::{
    compile_shader, create_renderer, is_loaded, lighting_uniforms, load, load_from_text,
    prepare_mesh, render, unload,
};
