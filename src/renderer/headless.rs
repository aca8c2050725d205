//! Headless render backend
//!
//! Implements the render boundary without a GPU. Every call is recorded,
//! buffer contents are kept in memory and uploads larger than the
//! reserved capacity are rejected. Used by the tests and the demo binary.

use std::collections::HashMap;

use glam::Mat4;

use super::boundary::{
    AttributeBinding, BufferHandle, BufferTarget, CameraSource, GpuBufferService, ShaderHandle,
    ShaderService, UniformValue,
};
use crate::constants::shader_names;
use crate::error::{EngineError, EngineResult};

/// One recorded boundary call
#[derive(Debug, Clone, PartialEq)]
pub enum GpuCall {
    CompileAndLink { shader: ShaderHandle },
    UseProgram { shader: ShaderHandle },
    SetUniform { name: String },
    CreateBuffer { buffer: BufferHandle, target: BufferTarget, capacity: usize },
    Upload { buffer: BufferHandle, bytes: usize },
    BindAttribute { buffer: BufferHandle, binding: AttributeBinding },
    DrawIndexed { buffer: BufferHandle, index_count: usize },
    DeleteBuffer { buffer: BufferHandle },
}

#[derive(Debug)]
struct HeadlessBuffer {
    target: BufferTarget,
    capacity: usize,
    contents: Vec<u8>,
}

#[derive(Debug, Default)]
pub struct HeadlessBackend {
    pub calls: Vec<GpuCall>,
    /// Make the next compile fail
    pub fail_compilation: bool,

    next_id: u32,
    programs: Vec<ShaderHandle>,
    current_program: Option<ShaderHandle>,
    buffers: HashMap<BufferHandle, HeadlessBuffer>,
    uniforms: HashMap<String, UniformValue>,
    attribute_locations: HashMap<&'static str, u32>,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        // Matrices take four locations each
        let layout = [
            (shader_names::IN_POSITION, 1),
            (shader_names::IN_COLOR, 1),
            (shader_names::IN_TEX_COORD, 1),
            (shader_names::IN_NORMAL, 1),
            (shader_names::IN_TANGENT, 1),
            (shader_names::IN_BITANGENT, 1),
            (shader_names::IN_TRANSFORM, 4),
            (shader_names::IN_NORMAL_MATRIX, 4),
        ];

        let mut attribute_locations = HashMap::new();
        let mut next = 0;
        for (name, width) in layout {
            attribute_locations.insert(name, next);
            next += width;
        }

        Self {
            attribute_locations,
            ..Default::default()
        }
    }

    fn allocate_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    pub fn live_buffer_count(&self) -> usize {
        self.buffers.len()
    }

    pub fn buffer_contents(&self, buffer: BufferHandle) -> Option<&[u8]> {
        self.buffers.get(&buffer).map(|b| b.contents.as_slice())
    }

    pub fn uniform(&self, name: &str) -> Option<UniformValue> {
        self.uniforms.get(name).copied()
    }

    /// Index count of the most recent draw
    pub fn last_draw(&self) -> Option<usize> {
        self.calls.iter().rev().find_map(|call| match call {
            GpuCall::DrawIndexed { index_count, .. } => Some(*index_count),
            _ => None,
        })
    }

    pub fn upload_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, GpuCall::Upload { .. }))
            .count()
    }
}

impl ShaderService for HeadlessBackend {
    fn compile_and_link(
        &mut self,
        vertex_source: &str,
        fragment_source: &str,
    ) -> EngineResult<ShaderHandle> {
        if self.fail_compilation {
            self.fail_compilation = false;
            return Err(EngineError::ShaderCompilation {
                source: format!("{} bytes vertex / {} bytes fragment", vertex_source.len(), fragment_source.len()),
                error: "headless compilation failure requested".to_string(),
            });
        }

        let shader = ShaderHandle(self.allocate_id());
        self.programs.push(shader);
        self.calls.push(GpuCall::CompileAndLink { shader });
        Ok(shader)
    }

    fn use_program(&mut self, shader: ShaderHandle) -> bool {
        if !self.programs.contains(&shader) {
            return false;
        }
        self.current_program = Some(shader);
        self.calls.push(GpuCall::UseProgram { shader });
        true
    }

    fn attribute_location(&self, shader: ShaderHandle, name: &str) -> Option<u32> {
        if !self.programs.contains(&shader) {
            return None;
        }
        self.attribute_locations.get(name).copied()
    }

    fn set_uniform(&mut self, shader: ShaderHandle, name: &str, value: UniformValue) {
        if self.current_program != Some(shader) {
            log::warn!("[HeadlessBackend::set_uniform] '{}' set on inactive program", name);
        }
        self.uniforms.insert(name.to_string(), value);
        self.calls.push(GpuCall::SetUniform {
            name: name.to_string(),
        });
    }
}

impl GpuBufferService for HeadlessBackend {
    fn create_buffer(
        &mut self,
        target: BufferTarget,
        capacity: usize,
        label: &str,
    ) -> EngineResult<BufferHandle> {
        if capacity == 0 {
            return Err(EngineError::BufferCreationFailed {
                size: capacity,
                usage: label.to_string(),
            });
        }

        let buffer = BufferHandle(self.allocate_id());
        self.buffers.insert(
            buffer,
            HeadlessBuffer {
                target,
                capacity,
                contents: Vec::new(),
            },
        );
        self.calls.push(GpuCall::CreateBuffer {
            buffer,
            target,
            capacity,
        });
        log::trace!("[HeadlessBackend::create_buffer] {} -> {:?}", label, buffer);
        Ok(buffer)
    }

    fn upload_full(&mut self, buffer: BufferHandle, bytes: &[u8]) -> EngineResult<()> {
        let stored = self
            .buffers
            .get_mut(&buffer)
            .ok_or_else(|| EngineError::ResourceNotFound {
                resource_type: "buffer".to_string(),
                id: format!("{:?}", buffer),
            })?;

        if bytes.len() > stored.capacity {
            return Err(EngineError::BufferAccess {
                index: bytes.len(),
                size: stored.capacity,
            });
        }

        stored.contents.clear();
        stored.contents.extend_from_slice(bytes);
        self.calls.push(GpuCall::Upload {
            buffer,
            bytes: bytes.len(),
        });
        Ok(())
    }

    fn bind_attribute(&mut self, buffer: BufferHandle, binding: &AttributeBinding) {
        match self.buffers.get(&buffer) {
            Some(stored) if stored.target == BufferTarget::Array => {}
            _ => log::warn!(
                "[HeadlessBackend::bind_attribute] {:?} is not an array buffer",
                buffer
            ),
        }
        self.calls.push(GpuCall::BindAttribute {
            buffer,
            binding: *binding,
        });
    }

    fn draw_indexed(&mut self, index_buffer: BufferHandle, index_count: usize) {
        self.calls.push(GpuCall::DrawIndexed {
            buffer: index_buffer,
            index_count,
        });
    }

    fn delete_buffer(&mut self, buffer: BufferHandle) {
        if self.buffers.remove(&buffer).is_some() {
            self.calls.push(GpuCall::DeleteBuffer { buffer });
        }
    }
}

/// Camera with fixed matrices
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedCamera {
    pub view: Mat4,
    pub projection: Mat4,
}

impl Default for FixedCamera {
    fn default() -> Self {
        Self {
            view: Mat4::IDENTITY,
            projection: Mat4::perspective_rh_gl(45f32.to_radians(), 16.0 / 9.0, 0.1, 100.0),
        }
    }
}

impl CameraSource for FixedCamera {
    fn view_matrix(&self) -> Mat4 {
        self.view
    }

    fn projection_matrix(&self) -> Mat4 {
        self.projection
    }
}
