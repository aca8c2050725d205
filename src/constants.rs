//! Engine-wide constants
//!
//! Grouped by concern. Configurable values only provide defaults here;
//! the live values come from `EngineConfig`.

/// Geometry layout constants
pub mod geometry {
    /// Floats in one column-major 4x4 matrix
    pub const FLOATS_PER_MATRIX: usize = 16;

    /// Vertices per triangle (triangle lists only)
    pub const VERTICES_PER_TRIANGLE: usize = 3;

    /// Each subdivision step splits one triangle into this many
    pub const SUBDIVISION_FACTOR: usize = 4;

    /// Column-major identity, the initial value of every transform slot
    pub const IDENTITY_MATRIX: [f32; FLOATS_PER_MATRIX] = [
        1.0, 0.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, //
        0.0, 0.0, 0.0, 1.0, //
    ];
}

/// Limits enforced by config validation
pub mod limits {
    /// Hard ceiling on subdivision depth. Every level quadruples memory.
    pub const MAX_SUBDIVISION_CEILING: u32 = 5;

    /// Hard ceiling on instance count
    pub const MAX_INSTANCE_CEILING: u32 = 1024;
}

/// Defaults taken from the original teapot scene
pub mod defaults {
    pub const MAX_INSTANCES: u32 = 10;
    pub const MAX_SUBDIVISIONS: u32 = 2;

    pub const SHRAPNEL_MASS: f32 = 1.0;
    pub const SHRAPNEL_MAX_SPEED: f32 = 1.0;
    pub const IMPULSE_MIN: f32 = 0.1;
    pub const IMPULSE_MAX: f32 = 10.0;

    pub const ROOT_ORIGIN: [f32; 3] = [0.0, 0.0, 5.0];
    pub const FIRST_INSTANCE_ORIGIN: [f32; 3] = [0.0, 0.0, -3.0];
    pub const INSTANCE_STEP: [f32; 3] = [0.0, 1.1, 3.0];
    pub const ROTATION_SPEED: f32 = 1.0;
}

/// Shader attribute and uniform names expected by the standard shader
pub mod shader_names {
    pub const IN_POSITION: &str = "inPosition";
    pub const IN_COLOR: &str = "inColor";
    pub const IN_TEX_COORD: &str = "inTexCoord";
    pub const IN_NORMAL: &str = "inNormal";
    pub const IN_TANGENT: &str = "inTangent";
    pub const IN_BITANGENT: &str = "inBiTangent";
    pub const IN_TRANSFORM: &str = "inTransform";
    pub const IN_NORMAL_MATRIX: &str = "inNormalMatrix";

    pub const MODEL_VIEW: &str = "modelView";
    pub const PROJECTION: &str = "projection";
}
