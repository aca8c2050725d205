//! Render boundary
//!
//! The services the engine consumes but does not implement: shader
//! programs, GPU buffers and the camera. The engine decides when and what
//! to upload; implementations decide how.

use glam::{Mat4, Vec3, Vec4};

use crate::error::EngineResult;

/// Opaque linked shader program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderHandle(pub u32);

/// Opaque GPU buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    /// Per-vertex attribute data
    Array,
    /// Triangle-list indices
    ElementArray,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat4(Mat4),
}

/// Float attribute read from a bound array buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeBinding {
    pub location: u32,
    /// Floats per element (1..=4)
    pub components: u32,
    /// Bytes between consecutive elements
    pub stride: usize,
    /// Byte offset of the first element
    pub offset: usize,
}

pub trait ShaderService {
    /// Compile and link a program. Failure is fatal to loading.
    fn compile_and_link(&mut self, vertex_source: &str, fragment_source: &str)
        -> EngineResult<ShaderHandle>;

    /// Make `shader` current. Returns `false` if the handle is unknown.
    fn use_program(&mut self, shader: ShaderHandle) -> bool;

    /// Location of a named vertex attribute, `None` if the program lacks it
    fn attribute_location(&self, shader: ShaderHandle, name: &str) -> Option<u32>;

    fn set_uniform(&mut self, shader: ShaderHandle, name: &str, value: UniformValue);
}

pub trait GpuBufferService {
    /// Allocate a buffer able to hold `capacity` bytes
    fn create_buffer(
        &mut self,
        target: BufferTarget,
        capacity: usize,
        label: &str,
    ) -> EngineResult<BufferHandle>;

    /// Replace the buffer contents from offset 0
    fn upload_full(&mut self, buffer: BufferHandle, bytes: &[u8]) -> EngineResult<()>;

    fn bind_attribute(&mut self, buffer: BufferHandle, binding: &AttributeBinding);

    /// Draw `index_count` indices from `index_buffer` as a triangle list
    fn draw_indexed(&mut self, index_buffer: BufferHandle, index_count: usize);

    fn delete_buffer(&mut self, buffer: BufferHandle);
}

/// Anything that can both run shaders and hold buffers
pub trait RenderBackend: ShaderService + GpuBufferService {}

impl<T: ShaderService + GpuBufferService> RenderBackend for T {}

/// Camera matrices pushed once per frame
pub trait CameraSource {
    fn view_matrix(&self) -> Mat4;
    fn projection_matrix(&self) -> Mat4;
}
