//! Renderer Data - Pure DOP
//!
//! NO METHODS. Just data.
//! All transformations happen in renderer_operations.rs

use super::boundary::{BufferHandle, ShaderHandle};
use crate::config::LightingConfig;

/// GPU mirrors of the four geometry buffers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpuHandles {
    pub shader: ShaderHandle,
    pub vertices: BufferHandle,
    pub indices: BufferHandle,
    pub model_view: BufferHandle,
    pub normal_matrix: BufferHandle,
}

/// Running upload and draw counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub frames: u64,
    pub uploads: u64,
    pub bytes_uploaded: u64,
    pub draw_calls: u64,
    pub indices_drawn: u64,
}

#[derive(Debug, Clone, Default)]
pub struct RendererData {
    /// `None` until loaded
    pub handles: Option<GpuHandles>,
    pub lighting: LightingConfig,
    pub stats: RenderStats,
}
