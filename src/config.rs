//! Runtime configuration for the swarm.
//!
//! Every field has a default, so a configuration file only has to name what
//! it changes:
//!
//! ```toml
//! balls_per_side = 32
//!
//! [input]
//! model = "mouse"
//! track_while_held = true
//!
//! [attraction]
//! force_model = "inverse-square"
//!
//! [placement.stride]
//! kind = "jittered"
//! step = 0.2
//! jitter = 0.05
//! seed = 42
//!
//! [palette]
//! ball = 0xff8800
//! ```

use crate::{attraction::ForceModel, placement::PlacementStride};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Failed to read configuration file '{path}'")]
    ReadConfig {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration")]
    ParseConfig(#[source] toml::de::Error),

    #[error(
        "{balls_per_side} balls per side exceeds the limit of {max}",
        max = MAX_BALLS_PER_SIDE
    )]
    TooManyBalls { balls_per_side: usize },
}

/// Keeps `balls_per_side²` bodies within what one physics world can hold.
pub const MAX_BALLS_PER_SIDE: usize = 1024;

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwarmConfig {
    pub balls_per_side: usize,
    pub time_step: f32,
    pub window: WindowConfig,
    pub placement: PlacementConfig,
    pub ball: BallConfig,
    pub core: CoreConfig,
    pub attraction: AttractionConfig,
    pub input: InputConfig,
    pub camera: CameraConfig,
    pub lights: LightConfig,
    pub palette: Palette,
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self {
            balls_per_side: 40,
            time_step: 1.0 / 60.0,
            window: WindowConfig::default(),
            placement: PlacementConfig::default(),
            ball: BallConfig::default(),
            core: CoreConfig::default(),
            attraction: AttractionConfig::default(),
            input: InputConfig::default(),
            camera: CameraConfig::default(),
            lights: LightConfig::default(),
            palette: Palette::default(),
        }
    }
}

impl SwarmConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| Error::ReadConfig {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_toml_str(&contents)?;
        log::info!("Loaded configuration from '{}'", path.display());
        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents).map_err(Error::ParseConfig)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.balls_per_side > MAX_BALLS_PER_SIDE {
            return Err(Error::TooManyBalls {
                balls_per_side: self.balls_per_side,
            });
        }
        Ok(())
    }

    pub fn ball_count(&self) -> usize {
        self.balls_per_side.saturating_mul(self.balls_per_side)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Element id of the canvas to attach to on the web
    pub canvas_id: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Swarm".to_string(),
            width: 1280,
            height: 720,
            canvas_id: "main-canva".to_string(),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    pub radius: f64,
    pub stride: PlacementStride,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            radius: 2.0,
            stride: PlacementStride::default(),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BallConfig {
    pub radius: f32,
    pub mass: f32,
    pub restitution: f32,
}

impl Default for BallConfig {
    fn default() -> Self {
        Self {
            radius: 0.1,
            mass: 1.0,
            restitution: 0.01,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub half_extent: f32,
    pub mass: f32,
    pub restitution: f32,
    /// Starting Euler angles in degrees
    pub rotation: [f32; 3],
    /// Degrees added to the Y angle every frame
    pub spin_step: f32,
    pub visible: bool,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            half_extent: 0.6,
            mass: 2.0,
            restitution: 0.01,
            rotation: [45.0, 45.0, 45.0],
            spin_step: 0.1,
            visible: true,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttractionConfig {
    pub gravitational_constant: f32,
    pub force_model: ForceModel,
    pub min_distance: f32,
}

impl Default for AttractionConfig {
    fn default() -> Self {
        Self {
            gravitational_constant: crate::attraction::GRAVITATIONAL_CONSTANT,
            force_model: ForceModel::default(),
            min_distance: 1e-4,
        }
    }
}

#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InputModel {
    /// Mouse buttons and touches, with touch cancellation releasing the target
    #[default]
    Pointer,

    /// Mouse buttons and touch start/end only
    Mouse,
}

impl std::str::FromStr for InputModel {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value {
            "pointer" => Ok(Self::Pointer),
            "mouse" => Ok(Self::Mouse),
            other => Err(format!("Unknown input model '{other}'")),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub model: InputModel,
    pub pixels_per_unit: f32,
    pub track_while_held: bool,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            model: InputModel::default(),
            pixels_per_unit: 100.0,
            track_while_held: false,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: [f32; 3],
    pub target: [f32; 3],
    pub up: [f32; 3],
    /// Vertical field of view in degrees
    pub fov: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [0.0, -5.0, 0.0],
            target: [0.0, 0.0, 0.0],
            up: [0.0, 0.0, 1.0],
            fov: 75.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightConfig {
    pub point_position: [f32; 3],
    pub point_intensity: f32,
    /// Intensity of the directional light that shines from the camera
    pub camera_intensity: f32,
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            point_position: [0.0, -10.0, 0.0],
            point_intensity: 1.0,
            camera_intensity: 0.1,
        }
    }
}

/// Colors as `0xRRGGBB` sRGB values.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    pub background: u32,
    pub ball: u32,
    pub core: u32,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            background: 0x232428,
            ball: 0xdcdbd7,
            core: 0xffffff,
        }
    }
}

/// Converts a `0xRRGGBB` sRGB color into linear RGB.
pub fn hex_to_linear(hex: u32) -> nalgebra_glm::Vec3 {
    let channel = |shift: u32| {
        let value = ((hex >> shift) & 0xff) as f32 / 255.0;
        if value <= 0.04045 {
            value / 12.92
        } else {
            ((value + 0.055) / 1.055).powf(2.4)
        }
    };
    nalgebra_glm::vec3(channel(16), channel(8), channel(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = SwarmConfig::from_toml_str("").unwrap();
        assert_eq!(config, SwarmConfig::default());
        assert_eq!(config.ball_count(), 1600);
    }

    #[test]
    fn partial_document_overrides_only_named_keys() {
        let config = SwarmConfig::from_toml_str(
            r#"
            balls_per_side = 8

            [input]
            model = "mouse"

            [attraction]
            force_model = "inverse-square"

            [palette]
            ball = 0xff8800
            "#,
        )
        .unwrap();
        assert_eq!(config.balls_per_side, 8);
        assert_eq!(config.input.model, InputModel::Mouse);
        assert_eq!(config.input.pixels_per_unit, 100.0);
        assert_eq!(config.attraction.force_model, ForceModel::InverseSquare);
        assert_eq!(config.palette.ball, 0xff8800);
        assert_eq!(config.palette.background, 0x232428);
        assert_eq!(config.core, CoreConfig::default());
    }

    #[test]
    fn jittered_stride_is_parsed() {
        let config = SwarmConfig::from_toml_str(
            r#"
            [placement.stride]
            kind = "jittered"
            step = 0.2
            jitter = 0.05
            seed = 42
            "#,
        )
        .unwrap();
        assert_eq!(
            config.placement.stride,
            PlacementStride::Jittered {
                step: 0.2,
                jitter: 0.05,
                seed: 42
            }
        );
        assert_eq!(config.placement.radius, 2.0);
    }

    #[test]
    fn unknown_force_model_is_rejected() {
        let result = SwarmConfig::from_toml_str(
            r#"
            [attraction]
            force_model = "linear"
            "#,
        );
        assert!(matches!(result, Err(Error::ParseConfig(_))));
    }

    #[test]
    fn oversized_swarm_is_rejected() {
        let result = SwarmConfig::from_toml_str("balls_per_side = 5000");
        assert!(matches!(
            result,
            Err(Error::TooManyBalls {
                balls_per_side: 5000
            })
        ));

        let config = SwarmConfig {
            balls_per_side: usize::MAX,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        assert_eq!(config.ball_count(), usize::MAX);

        let config = SwarmConfig {
            balls_per_side: MAX_BALLS_PER_SIDE,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn missing_file_reports_its_path() {
        let error = SwarmConfig::load("does/not/exist.toml").unwrap_err();
        assert!(matches!(error, Error::ReadConfig { ref path, .. } if path.contains("exist.toml")));
    }

    #[test]
    fn serialized_defaults_parse_back() {
        let text = toml::to_string(&SwarmConfig::default()).unwrap();
        assert_eq!(SwarmConfig::from_toml_str(&text).unwrap(), SwarmConfig::default());
    }

    #[test]
    fn hex_colors_convert_to_linear() {
        assert_eq!(hex_to_linear(0x000000), nalgebra_glm::vec3(0.0, 0.0, 0.0));
        let white = hex_to_linear(0xffffff);
        assert!((white - nalgebra_glm::vec3(1.0, 1.0, 1.0)).norm() < 1e-6);
        let red = hex_to_linear(0xff0000);
        assert!(red.x > 0.99 && red.y == 0.0 && red.z == 0.0);
    }
}
