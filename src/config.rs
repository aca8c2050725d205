//! Engine configuration
//!
//! Loaded from TOML. Every field has a default, so an empty document is a
//! valid configuration that reproduces the stock teapot-style scene.

use std::path::Path;

use glam::{Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::constants::{defaults, limits};
use crate::error::{EngineError, EngineResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Upper bound on instances; also the visible-count ceiling
    pub max_instances: u32,
    /// Instances allocated at load
    pub instance_count: u32,
    pub max_subdivisions: u32,

    pub shrapnel: ShrapnelConfig,
    pub scene: SceneConfig,
    pub tangents: TangentConfig,
    pub lighting: LightingConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_instances: defaults::MAX_INSTANCES,
            instance_count: defaults::MAX_INSTANCES,
            max_subdivisions: defaults::MAX_SUBDIVISIONS,
            shrapnel: ShrapnelConfig::default(),
            scene: SceneConfig::default(),
            tangents: TangentConfig::default(),
            lighting: LightingConfig::default(),
        }
    }
}

/// Explosion and integration parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShrapnelConfig {
    pub mass: f32,
    pub max_speed: f32,
    /// Per-axis impulse magnitude range sampled on explode
    pub impulse_min: f32,
    pub impulse_max: f32,
    /// The instance whose triangles fly apart
    pub exploding_instance: u32,
    /// Fixed RNG seed; entropy when absent
    pub seed: Option<u64>,
}

impl Default for ShrapnelConfig {
    fn default() -> Self {
        Self {
            mass: defaults::SHRAPNEL_MASS,
            max_speed: defaults::SHRAPNEL_MAX_SPEED,
            impulse_min: defaults::IMPULSE_MIN,
            impulse_max: defaults::IMPULSE_MAX,
            exploding_instance: 0,
            seed: None,
        }
    }
}

/// Instance placement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub root_origin: Vec3,
    pub first_instance_origin: Vec3,
    /// Offset between consecutive instances
    pub instance_step: Vec3,
    /// Radians per unit of update step
    pub rotation_speed: f32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            root_origin: Vec3::from_array(defaults::ROOT_ORIGIN),
            first_instance_origin: Vec3::from_array(defaults::FIRST_INSTANCE_ORIGIN),
            instance_step: Vec3::from_array(defaults::INSTANCE_STEP),
            rotation_speed: defaults::ROTATION_SPEED,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TangentConfig {
    /// Run Gram-Schmidt orthogonalization after tangent derivation
    pub orthogonalize: bool,
}

/// Uniform values pushed to the shader every frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingConfig {
    pub rim_light_color: Vec3,
    pub rim_light_start: f32,
    pub rim_light_end: f32,
    pub rim_light_coefficient: f32,

    pub light_source_ambient_color: Vec3,
    pub light_source_diffuse_color: Vec3,
    pub light_source_specular_color: Vec3,
    pub light_source_position: Vec4,
    pub light_source_spot_direction: Vec3,
    pub light_source_spot_exponent: f32,
    pub light_source_spot_cutoff: f32,
    pub light_source_spot_cos_cutoff: f32,
    pub light_source_constant_attenuation: f32,
    pub light_source_linear_attenuation: f32,
    pub light_source_quadratic_attenuation: f32,

    pub light_ambient_color: Vec3,
    pub material_shininess: f32,

    pub fog_max_distance: f32,
    pub fog_min_distance: f32,
    pub fog_color: Vec3,
    pub fog_density: f32,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            rim_light_color: Vec3::ONE,
            rim_light_start: 0.0,
            rim_light_end: 1.0,
            rim_light_coefficient: 0.6,

            light_source_ambient_color: Vec3::ONE,
            light_source_diffuse_color: Vec3::ONE,
            light_source_specular_color: Vec3::ONE,
            light_source_position: Vec4::new(0.0, 0.0, -1.0, 1.0),
            light_source_spot_direction: Vec3::new(0.0, 0.0, 1.0),
            light_source_spot_exponent: 100.0,
            light_source_spot_cutoff: 180.0,
            light_source_spot_cos_cutoff: 30.0,
            light_source_constant_attenuation: 1.0,
            light_source_linear_attenuation: 0.045,
            light_source_quadratic_attenuation: 0.0075,

            light_ambient_color: Vec3::ONE,
            material_shininess: 1000.0,

            fog_max_distance: 10.0,
            fog_min_distance: 0.1,
            fog_color: Vec3::splat(0.7),
            fog_density: 1.0e-9,
        }
    }
}

fn invalid(field: &str, value: impl ToString, reason: &str) -> EngineError {
    EngineError::InvalidConfig {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

impl EngineConfig {
    pub fn from_toml_str(text: &str) -> EngineResult<Self> {
        let config: EngineConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| EngineError::IoError {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;

        log::info!("[EngineConfig::from_toml_file] Loading {}", path.display());
        Self::from_toml_str(&text)
    }

    /// Reject values the engine cannot run with
    pub fn validate(&self) -> EngineResult<()> {
        if self.instance_count == 0 {
            return Err(invalid("instance_count", 0, "at least one instance is required"));
        }
        if self.max_instances > limits::MAX_INSTANCE_CEILING {
            return Err(invalid(
                "max_instances",
                self.max_instances,
                "exceeds the instance ceiling",
            ));
        }
        if self.instance_count > self.max_instances {
            return Err(invalid(
                "instance_count",
                self.instance_count,
                "must not exceed max_instances",
            ));
        }
        if self.max_subdivisions > limits::MAX_SUBDIVISION_CEILING {
            return Err(invalid(
                "max_subdivisions",
                self.max_subdivisions,
                "exceeds the subdivision ceiling",
            ));
        }

        let shrapnel = &self.shrapnel;
        let finite = [
            ("shrapnel.mass", shrapnel.mass),
            ("shrapnel.max_speed", shrapnel.max_speed),
            ("shrapnel.impulse_min", shrapnel.impulse_min),
            ("shrapnel.impulse_max", shrapnel.impulse_max),
            ("scene.rotation_speed", self.scene.rotation_speed),
        ];
        if let Some((field, value)) = finite.iter().find(|(_, value)| !value.is_finite()) {
            return Err(invalid(field, value, "must be finite"));
        }

        if !(shrapnel.mass > 0.0) {
            return Err(invalid("shrapnel.mass", shrapnel.mass, "must be positive"));
        }
        if !(shrapnel.max_speed > 0.0) {
            return Err(invalid("shrapnel.max_speed", shrapnel.max_speed, "must be positive"));
        }
        if shrapnel.impulse_min > shrapnel.impulse_max {
            return Err(invalid(
                "shrapnel.impulse_min",
                shrapnel.impulse_min,
                "must not exceed impulse_max",
            ));
        }
        if shrapnel.exploding_instance >= self.instance_count {
            return Err(invalid(
                "shrapnel.exploding_instance",
                shrapnel.exploding_instance,
                "must name an allocated instance",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_yields_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.max_instances, 10);
        assert_eq!(config.max_subdivisions, 2);
        assert_eq!(config.scene.root_origin, Vec3::new(0.0, 0.0, 5.0));
        assert!(!config.tangents.orthogonalize);
    }

    #[test]
    fn test_partial_override() {
        let text = r#"
            instance_count = 3

            [shrapnel]
            mass = 2.5
            seed = 7

            [scene]
            instance_step = [1.0, 0.0, 0.0]
        "#;
        let config = EngineConfig::from_toml_str(text).unwrap();

        assert_eq!(config.instance_count, 3);
        assert_eq!(config.shrapnel.mass, 2.5);
        assert_eq!(config.shrapnel.seed, Some(7));
        assert_eq!(config.shrapnel.max_speed, 1.0);
        assert_eq!(config.scene.instance_step, Vec3::X);
        assert_eq!(config.lighting.material_shininess, 1000.0);
    }

    #[test]
    fn test_rejects_invalid_values() {
        let cases = [
            "instance_count = 0",
            "instance_count = 11",
            "max_subdivisions = 6",
            "[shrapnel]\nmass = 0.0",
            "[shrapnel]\nmax_speed = -1.0",
            "[shrapnel]\nimpulse_min = 5.0\nimpulse_max = 1.0",
            "instance_count = 2\n[shrapnel]\nexploding_instance = 2",
            "[shrapnel]\nimpulse_max = inf",
            "[shrapnel]\nimpulse_min = nan",
            "[shrapnel]\nimpulse_min = -inf",
            "[shrapnel]\nmass = inf",
            "[shrapnel]\nmax_speed = inf",
            "[scene]\nrotation_speed = nan",
        ];

        for text in cases {
            let result = EngineConfig::from_toml_str(text);
            assert!(
                matches!(result, Err(EngineError::InvalidConfig { .. })),
                "expected rejection for {:?}",
                text
            );
        }
    }

    #[test]
    fn test_infinite_impulse_names_the_field() {
        let text = "instance_count = 1\n[shrapnel]\nimpulse_max = inf\nseed = 1";
        match EngineConfig::from_toml_str(text) {
            Err(EngineError::InvalidConfig { field, .. }) => {
                assert_eq!(field, "shrapnel.impulse_max")
            }
            other => panic!("expected InvalidConfig, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_toml_is_deserialization_error() {
        let result = EngineConfig::from_toml_str("max_instances = \"many\"");
        assert!(matches!(result, Err(EngineError::DeserializationError { .. })));
    }

    #[test]
    fn test_loads_from_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_subdivisions = 3\n[tangents]\northogonalize = true").unwrap();

        let config = EngineConfig::from_toml_file(file.path()).unwrap();
        assert_eq!(config.max_subdivisions, 3);
        assert!(config.tangents.orthogonalize);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = EngineConfig::from_toml_file("/nonexistent/shrapnel.toml");
        assert!(matches!(result, Err(EngineError::IoError { .. })));
    }
}
