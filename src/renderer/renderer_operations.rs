//! Renderer Operations - Pure DOP Functions
//!
//! Load / render / unload for instanced geometry against a
//! [`RenderBackend`]. A frame binds the program, pushes camera and
//! lighting uniforms, re-uploads every dirty buffer in full and issues
//! exactly one indexed draw covering all instances.

use super::boundary::{
    AttributeBinding, BufferHandle, BufferTarget, CameraSource, RenderBackend, ShaderHandle,
    UniformValue,
};
use super::renderer_data::{GpuHandles, RendererData};
use crate::config::{LightingConfig, TangentConfig};
use crate::constants::geometry::FLOATS_PER_MATRIX;
use crate::constants::shader_names;
use crate::error::{EngineError, EngineResult};
use crate::geometry::{
    buffer_bytes, buffer_capacity_bytes, clear_dirty, is_dirty, load_geometry, total_index_count,
    unload_geometry, BufferKind, GeometryData,
};
use crate::mesh::{offsets, orthogonalize_tangent_basis, parse_mesh, MeshData, VERTEX_STRIDE};

const MATRIX_STRIDE: usize = FLOATS_PER_MATRIX * std::mem::size_of::<f32>();
const MATRIX_COLUMN_BYTES: usize = MATRIX_STRIDE / 4;

pub fn create_renderer(lighting: LightingConfig) -> RendererData {
    RendererData {
        lighting,
        ..Default::default()
    }
}

/// Compile the program that will draw the geometry
pub fn compile_shader<B: RenderBackend + ?Sized>(
    backend: &mut B,
    vertex_source: &str,
    fragment_source: &str,
) -> EngineResult<ShaderHandle> {
    let shader = backend.compile_and_link(vertex_source, fragment_source)?;
    log::info!("[compile_shader] Linked program {:?}", shader);
    Ok(shader)
}

/// Parse mesh text and finish its tangent basis
pub fn prepare_mesh(mesh_text: &str, tangents: &TangentConfig) -> EngineResult<MeshData> {
    let mut mesh = parse_mesh(mesh_text)?;
    if tangents.orthogonalize {
        orthogonalize_tangent_basis(&mut mesh.vertices);
    }
    log::debug!(
        "[prepare_mesh] {} triangles, {} vertices",
        mesh.triangle_count(),
        mesh.vertices.len()
    );
    Ok(mesh)
}

/// Load geometry and create its GPU mirrors.
///
/// Each GPU buffer is created at the capacity of the deepest subdivision
/// level. On any failure the geometry is left unloaded.
pub fn load<B: RenderBackend + ?Sized>(
    renderer: &mut RendererData,
    geometry: &mut GeometryData,
    backend: &mut B,
    shader: ShaderHandle,
    mesh: &MeshData,
    instance_count: usize,
    subdivision_limit: u32,
) -> EngineResult<()> {
    if renderer.handles.is_some() {
        return Err(EngineError::StateError {
            expected: "unloaded renderer".to_string(),
            actual: "renderer already loaded".to_string(),
        });
    }

    load_geometry(geometry, mesh, instance_count, subdivision_limit)?;

    let handles = match create_gpu_buffers(geometry, backend, shader) {
        Ok(handles) => handles,
        Err(e) => {
            unload_geometry(geometry);
            return Err(e);
        }
    };

    bind_attributes(backend, &handles);
    renderer.handles = Some(handles);

    log::info!(
        "[load] Renderer ready: {} instances, subdivision limit {}",
        instance_count,
        subdivision_limit
    );
    Ok(())
}

/// Parse `mesh_text` and [`load`] it
#[allow(clippy::too_many_arguments)]
pub fn load_from_text<B: RenderBackend + ?Sized>(
    renderer: &mut RendererData,
    geometry: &mut GeometryData,
    backend: &mut B,
    shader: ShaderHandle,
    mesh_text: &str,
    tangents: &TangentConfig,
    instance_count: usize,
    subdivision_limit: u32,
) -> EngineResult<()> {
    let mesh = prepare_mesh(mesh_text, tangents)?;
    load(
        renderer,
        geometry,
        backend,
        shader,
        &mesh,
        instance_count,
        subdivision_limit,
    )
}

fn create_gpu_buffers<B: RenderBackend + ?Sized>(
    geometry: &GeometryData,
    backend: &mut B,
    shader: ShaderHandle,
) -> EngineResult<GpuHandles> {
    let mut created: Vec<BufferHandle> = Vec::with_capacity(BufferKind::ALL.len());

    for kind in BufferKind::ALL {
        let target = match kind {
            BufferKind::Indices => BufferTarget::ElementArray,
            _ => BufferTarget::Array,
        };
        let capacity = buffer_capacity_bytes(geometry, kind);

        match backend.create_buffer(target, capacity, kind.label()) {
            Ok(handle) => {
                log::debug!(
                    "[create_gpu_buffers] {} buffer {:?}: {} bytes reserved",
                    kind.label(),
                    handle,
                    capacity
                );
                created.push(handle);
            }
            Err(e) => {
                for handle in created {
                    backend.delete_buffer(handle);
                }
                return Err(e);
            }
        }
    }

    // Same order as BufferKind::ALL
    match *created.as_slice() {
        [model_view, normal_matrix, vertices, indices] => Ok(GpuHandles {
            shader,
            vertices,
            indices,
            model_view,
            normal_matrix,
        }),
        _ => Err(EngineError::Internal {
            message: format!("expected 4 GPU buffers, created {}", created.len()),
        }),
    }
}

/// Vertex attribute layout of [`crate::mesh::Vertex`]
fn vertex_attributes() -> [(&'static str, u32, usize); 6] {
    [
        (shader_names::IN_POSITION, 3, offsets::POSITION),
        (shader_names::IN_TEX_COORD, 2, offsets::UV),
        (shader_names::IN_NORMAL, 3, offsets::NORMAL),
        (shader_names::IN_COLOR, 4, offsets::COLOR),
        (shader_names::IN_TANGENT, 3, offsets::TANGENT),
        (shader_names::IN_BITANGENT, 3, offsets::BITANGENT),
    ]
}

fn bind_attributes<B: RenderBackend + ?Sized>(backend: &mut B, handles: &GpuHandles) {
    let shader = handles.shader;

    // Matrices occupy four consecutive vec4 locations
    for (name, buffer) in [
        (shader_names::IN_TRANSFORM, handles.model_view),
        (shader_names::IN_NORMAL_MATRIX, handles.normal_matrix),
    ] {
        let Some(location) = backend.attribute_location(shader, name) else {
            log::warn!("[bind_attributes] Shader has no attribute '{}'", name);
            continue;
        };
        for column in 0..4u32 {
            let binding = AttributeBinding {
                location: location + column,
                components: 4,
                stride: MATRIX_STRIDE,
                offset: column as usize * MATRIX_COLUMN_BYTES,
            };
            backend.bind_attribute(buffer, &binding);
        }
    }

    for (name, components, offset) in vertex_attributes() {
        let Some(location) = backend.attribute_location(shader, name) else {
            log::warn!("[bind_attributes] Shader has no attribute '{}'", name);
            continue;
        };
        let binding = AttributeBinding {
            location,
            components,
            stride: VERTEX_STRIDE,
            offset,
        };
        backend.bind_attribute(handles.vertices, &binding);
    }
}

/// Every lighting, fog and material uniform, by shader name
pub fn lighting_uniforms(lighting: &LightingConfig) -> Vec<(&'static str, UniformValue)> {
    use UniformValue::{Float, Vec3, Vec4};

    vec![
        ("RimLightColor", Vec3(lighting.rim_light_color)),
        ("RimLightStart", Float(lighting.rim_light_start)),
        ("RimLightEnd", Float(lighting.rim_light_end)),
        ("RimLightCoefficient", Float(lighting.rim_light_coefficient)),
        ("LightSourceAmbientColor", Vec3(lighting.light_source_ambient_color)),
        ("LightSourceDiffuseColor", Vec3(lighting.light_source_diffuse_color)),
        ("LightSourceSpecularColor", Vec3(lighting.light_source_specular_color)),
        ("LightSourcePosition_worldspace", Vec4(lighting.light_source_position)),
        ("LightSourceSpotDirection", Vec3(lighting.light_source_spot_direction)),
        ("LightSourceSpotExponent", Float(lighting.light_source_spot_exponent)),
        ("LightSourceSpotCutoff", Float(lighting.light_source_spot_cutoff)),
        ("LightSourceSpotCosCutoff", Float(lighting.light_source_spot_cos_cutoff)),
        ("LightSourceConstantAttenuation", Float(lighting.light_source_constant_attenuation)),
        ("LightSourceLinearAttenuation", Float(lighting.light_source_linear_attenuation)),
        ("LightSourceQuadraticAttenuation", Float(lighting.light_source_quadratic_attenuation)),
        ("LightAmbientColor", Vec3(lighting.light_ambient_color)),
        ("MaterialShininess", Float(lighting.material_shininess)),
        ("FogMaxDistance", Float(lighting.fog_max_distance)),
        ("FogMinDistance", Float(lighting.fog_min_distance)),
        ("FogColor", Vec3(lighting.fog_color)),
        ("FogDensity", Float(lighting.fog_density)),
    ]
}

fn buffer_handle(handles: &GpuHandles, kind: BufferKind) -> BufferHandle {
    match kind {
        BufferKind::Vertices => handles.vertices,
        BufferKind::Indices => handles.indices,
        BufferKind::ModelView => handles.model_view,
        BufferKind::NormalMatrix => handles.normal_matrix,
    }
}

/// Draw one frame
pub fn render<B, C>(
    renderer: &mut RendererData,
    geometry: &mut GeometryData,
    backend: &mut B,
    camera: &C,
) -> EngineResult<()>
where
    B: RenderBackend + ?Sized,
    C: CameraSource + ?Sized,
{
    let handles = renderer.handles.ok_or_else(|| EngineError::StateError {
        expected: "loaded renderer".to_string(),
        actual: "render called before load".to_string(),
    })?;

    if !backend.use_program(handles.shader) {
        return Err(EngineError::ResourceNotFound {
            resource_type: "shader".to_string(),
            id: format!("{:?}", handles.shader),
        });
    }

    backend.set_uniform(
        handles.shader,
        shader_names::MODEL_VIEW,
        UniformValue::Mat4(camera.view_matrix()),
    );
    backend.set_uniform(
        handles.shader,
        shader_names::PROJECTION,
        UniformValue::Mat4(camera.projection_matrix()),
    );
    for (name, value) in lighting_uniforms(&renderer.lighting) {
        backend.set_uniform(handles.shader, name, value);
    }

    for kind in BufferKind::ALL {
        if !is_dirty(geometry, kind) {
            continue;
        }
        let bytes = buffer_bytes(geometry, kind);
        backend.upload_full(buffer_handle(&handles, kind), bytes)?;

        renderer.stats.uploads += 1;
        renderer.stats.bytes_uploaded += bytes.len() as u64;
        log::trace!("[render] Uploaded {} ({} bytes)", kind.label(), bytes.len());

        clear_dirty(geometry, kind);
    }

    let index_count = total_index_count(geometry);
    backend.draw_indexed(handles.indices, index_count);

    renderer.stats.frames += 1;
    renderer.stats.draw_calls += 1;
    renderer.stats.indices_drawn += index_count as u64;

    Ok(())
}

/// Release GPU mirrors and CPU buffers
pub fn unload<B: RenderBackend + ?Sized>(
    renderer: &mut RendererData,
    geometry: &mut GeometryData,
    backend: &mut B,
) {
    if let Some(handles) = renderer.handles.take() {
        for kind in BufferKind::ALL {
            backend.delete_buffer(buffer_handle(&handles, kind));
        }
        log::info!(
            "[unload] Released GPU buffers after {} frames",
            renderer.stats.frames
        );
    }
    unload_geometry(geometry);
}

pub fn is_loaded(renderer: &RendererData) -> bool {
    renderer.handles.is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{create_geometry, set_instance_transform, subdivide};
    use crate::renderer::headless::{FixedCamera, GpuCall, HeadlessBackend};
    use glam::{Mat4, Vec3};

    const TRIANGLE: &str = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nvt 1 0\nvt 0 1\nvn 0 0 1\nf 1/1/1 2/2/1 3/3/1\n";

    fn loaded(instances: usize) -> (RendererData, GeometryData, HeadlessBackend) {
        let mut backend = HeadlessBackend::new();
        let shader = compile_shader(&mut backend, "vs", "fs").unwrap();
        let mut renderer = create_renderer(LightingConfig::default());
        let mut geometry = create_geometry();
        load_from_text(
            &mut renderer,
            &mut geometry,
            &mut backend,
            shader,
            TRIANGLE,
            &TangentConfig::default(),
            instances,
            2,
        )
        .unwrap();
        (renderer, geometry, backend)
    }

    #[test]
    fn test_load_with_orthogonalized_tangents() {
        use crate::geometry::GeometrySource;

        let tilted = TRIANGLE.replace("vn 0 0 1", "vn 0.6 0 0.8");
        let mut backend = HeadlessBackend::new();
        let shader = compile_shader(&mut backend, "vs", "fs").unwrap();

        let mut load_with = |orthogonalize: bool| {
            let mut renderer = create_renderer(LightingConfig::default());
            let mut geometry = create_geometry();
            load_from_text(
                &mut renderer,
                &mut geometry,
                &mut backend,
                shader,
                &tilted,
                &TangentConfig { orthogonalize },
                2,
                1,
            )
            .unwrap();
            geometry
        };

        let raw = load_with(false);
        assert_eq!(raw.tangent(1, 0), Some(Vec3::X));

        let refined = load_with(true);
        for vertex in 0..3 {
            let tangent = refined.tangent(1, vertex).unwrap();
            let normal = refined.normal(1, vertex).unwrap();
            assert!((tangent - Vec3::new(0.8, 0.0, -0.6)).length() < 1e-5);
            assert!(tangent.dot(normal).abs() < 1e-5);
        }
    }

    #[test]
    fn test_load_creates_four_buffers_and_binds_layout() {
        let (renderer, _geometry, backend) = loaded(2);

        assert!(is_loaded(&renderer));
        assert_eq!(backend.live_buffer_count(), 4);
        // 6 vertex attributes + 2 matrices of 4 columns
        let binds = backend
            .calls
            .iter()
            .filter(|c| matches!(c, GpuCall::BindAttribute { .. }))
            .count();
        assert_eq!(binds, 14);
    }

    #[test]
    fn test_first_frame_uploads_everything_then_nothing() {
        let (mut renderer, mut geometry, mut backend) = loaded(2);
        let camera = FixedCamera::default();

        render(&mut renderer, &mut geometry, &mut backend, &camera).unwrap();
        assert_eq!(renderer.stats.uploads, 4);
        assert!(geometry.dirty.is_empty());

        render(&mut renderer, &mut geometry, &mut backend, &camera).unwrap();
        assert_eq!(renderer.stats.uploads, 4);
        assert_eq!(renderer.stats.draw_calls, 2);
        assert_eq!(backend.last_draw(), Some(2 * 3));
    }

    #[test]
    fn test_only_dirty_buffers_are_uploaded() {
        let (mut renderer, mut geometry, mut backend) = loaded(2);
        let camera = FixedCamera::default();
        render(&mut renderer, &mut geometry, &mut backend, &camera).unwrap();
        backend.calls.clear();

        set_instance_transform(&mut geometry, 1, &Mat4::from_translation(Vec3::X));
        render(&mut renderer, &mut geometry, &mut backend, &camera).unwrap();

        let uploads: Vec<_> = backend
            .calls
            .iter()
            .filter_map(|c| match c {
                GpuCall::Upload { buffer, bytes } => Some((*buffer, *bytes)),
                _ => None,
            })
            .collect();
        let handles = renderer.handles.unwrap();
        assert_eq!(uploads, vec![(handles.model_view, 2 * 3 * 64)]);
    }

    #[test]
    fn test_uploads_fit_reserved_capacity_after_subdivision() {
        let (mut renderer, mut geometry, mut backend) = loaded(3);
        let camera = FixedCamera::default();

        assert!(subdivide(&mut geometry));
        assert!(subdivide(&mut geometry));
        render(&mut renderer, &mut geometry, &mut backend, &camera).unwrap();

        assert_eq!(backend.last_draw(), Some(3 * 3 * 16));
    }

    #[test]
    fn test_frame_pushes_camera_and_lighting() {
        let (mut renderer, mut geometry, mut backend) = loaded(1);
        let camera = FixedCamera {
            view: Mat4::from_translation(Vec3::Z),
            projection: Mat4::IDENTITY,
        };

        render(&mut renderer, &mut geometry, &mut backend, &camera).unwrap();

        assert_eq!(
            backend.uniform("modelView"),
            Some(UniformValue::Mat4(Mat4::from_translation(Vec3::Z)))
        );
        assert_eq!(
            backend.uniform("MaterialShininess"),
            Some(UniformValue::Float(1000.0))
        );
        assert_eq!(
            backend.uniform("FogColor"),
            Some(UniformValue::Vec3(Vec3::splat(0.7)))
        );
    }

    #[test]
    fn test_render_before_load_is_state_error() {
        let mut backend = HeadlessBackend::new();
        let mut renderer = create_renderer(LightingConfig::default());
        let mut geometry = create_geometry();

        let result = render(&mut renderer, &mut geometry, &mut backend, &FixedCamera::default());
        assert!(matches!(result, Err(EngineError::StateError { .. })));
    }

    #[test]
    fn test_double_load_is_rejected() {
        let (mut renderer, mut geometry, mut backend) = loaded(1);
        let shader = renderer.handles.unwrap().shader;

        let result = load_from_text(
            &mut renderer,
            &mut geometry,
            &mut backend,
            shader,
            TRIANGLE,
            &TangentConfig::default(),
            1,
            1,
        );
        assert!(matches!(result, Err(EngineError::StateError { .. })));
    }

    #[test]
    fn test_shader_failure_is_fatal() {
        let mut backend = HeadlessBackend::new();
        backend.fail_compilation = true;

        let result = compile_shader(&mut backend, "bad", "bad");
        assert!(matches!(result, Err(EngineError::ShaderCompilation { .. })));
    }

    #[test]
    fn test_broken_asset_is_fatal() {
        let mut backend = HeadlessBackend::new();
        let shader = compile_shader(&mut backend, "vs", "fs").unwrap();
        let mut renderer = create_renderer(LightingConfig::default());
        let mut geometry = create_geometry();

        let result = load_from_text(
            &mut renderer,
            &mut geometry,
            &mut backend,
            shader,
            "v 0 0 0\nf 1 2 3\n",
            &TangentConfig::default(),
            1,
            1,
        );
        assert!(matches!(result, Err(EngineError::MeshParse(_))));
        assert!(!geometry.loaded);
        assert_eq!(backend.live_buffer_count(), 0);
    }

    #[test]
    fn test_unload_releases_everything() {
        let (mut renderer, mut geometry, mut backend) = loaded(2);

        unload(&mut renderer, &mut geometry, &mut backend);

        assert!(!is_loaded(&renderer));
        assert!(!geometry.loaded);
        assert_eq!(backend.live_buffer_count(), 0);
    }
}
