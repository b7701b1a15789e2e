use glam::Vec3;
use orbitview_input::OrbitSettings;
use orbitview_render::RendererOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub target: Vec3,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 43.0,
            near: 0.1,
            far: 1000.0,
            position: Vec3::new(20.0, 20.0, 20.0),
            target: Vec3::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CubeConfig {
    pub size: f32,
    /// `0xRRGGBB`
    pub color: u32,
    pub position: Vec3,
}

impl Default for CubeConfig {
    fn default() -> Self {
        Self {
            size: 5.0,
            color: 0xffffff,
            position: Vec3::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmbientLightConfig {
    pub color: u32,
    pub intensity: f32,
}

impl Default for AmbientLightConfig {
    fn default() -> Self {
        Self {
            color: 0xffffff,
            intensity: 0.4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointLightConfig {
    pub color: u32,
    pub intensity: f32,
    /// Range of the light; 0 means unlimited.
    pub distance: f32,
    pub decay: f32,
    pub position: Vec3,
}

impl Default for PointLightConfig {
    fn default() -> Self {
        Self {
            color: 0x00baff,
            intensity: 1.0,
            distance: 100.0,
            decay: 1.0,
            position: Vec3::new(15.0, 15.0, 15.0),
        }
    }
}

/// Everything `ApplicationContext::initialize` builds, with defaults for the
/// stock cube scene. Every field is optional in YAML.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub camera: CameraConfig,
    pub renderer: RendererOptions,
    pub cube: CubeConfig,
    pub ambient_light: AmbientLightConfig,
    pub point_light: PointLightConfig,
    pub controls: OrbitSettings,
}

impl SceneConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml_str(&text)?;
        tracing::debug!(path = %path.display(), "loaded scene config");
        Ok(config)
    }

    pub fn to_yaml_string(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));
        let cam = &self.camera;
        if !(cam.fov_degrees > 0.0 && cam.fov_degrees < 180.0) {
            return invalid(format!("camera.fov_degrees must be in (0, 180), got {}", cam.fov_degrees));
        }
        if cam.near <= 0.0 {
            return invalid(format!("camera.near must be positive, got {}", cam.near));
        }
        if cam.far <= cam.near {
            return invalid(format!(
                "camera.far ({}) must be greater than camera.near ({})",
                cam.far, cam.near
            ));
        }
        if cam.position == cam.target {
            return invalid("camera.position must differ from camera.target".into());
        }
        if self.cube.size <= 0.0 {
            return invalid(format!("cube.size must be positive, got {}", self.cube.size));
        }
        if self.ambient_light.intensity < 0.0 || self.point_light.intensity < 0.0 {
            return invalid("light intensities must not be negative".into());
        }
        if self.point_light.distance < 0.0 {
            return invalid(format!(
                "point_light.distance must not be negative, got {}",
                self.point_light.distance
            ));
        }
        let controls = &self.controls;
        if controls.min_distance > controls.max_distance {
            return invalid("controls.min_distance exceeds controls.max_distance".into());
        }
        if controls.min_polar_angle > controls.max_polar_angle {
            return invalid("controls.min_polar_angle exceeds controls.max_polar_angle".into());
        }
        Ok(())
    }
}
