use bevy::prelude::*;
use bevy_log::info;
use pond::water::{DripSchedule, HeightField, WaterTuning};
use pond::Pond;
use ron::de::from_str;
use ron::ser::PrettyConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;

/// Widest water body a scene may declare, in world units.
pub const MAX_WATER_SPAN: f32 = 10_000.0;

/// A body of water: the still surface from `left` to `right`, `floor` below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaterConfig {
    pub surface: f32,
    pub left: f32,
    pub right: f32,
    pub floor: f32,
    pub tuning: WaterTuning,
}

impl Default for WaterConfig {
    fn default() -> Self {
        Self {
            surface: 6.5,
            left: 0.0,
            right: 25.0,
            floor: 0.0,
            tuning: WaterTuning::default(),
        }
    }
}

impl WaterConfig {
    pub fn to_field(&self) -> HeightField {
        HeightField::with_tuning(
            self.left,
            self.right - self.left,
            self.surface,
            self.floor,
            self.tuning,
        )
    }
}

/// Static box, bottom-left corner at `(x, y)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub friction: f32,
    pub restitution: f32,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 3.0,
            height: 1.0,
            friction: 0.6,
            restitution: 0.6,
        }
    }
}

/// Dynamic box with locked rotation, bottom-left corner at `(x, y)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyConfig {
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub mass: f32,
    pub friction: f32,
    pub restitution: f32,
}

impl Default for BodyConfig {
    fn default() -> Self {
        Self {
            name: "frog".into(),
            x: 6.0,
            y: 7.0,
            width: 1.0,
            height: 0.9,
            mass: 5.0,
            friction: 0.8,
            restitution: 0.2,
        }
    }
}

/// Thin walls enclosing `[0, width] x [0, height]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WallsConfig {
    pub width: f32,
    pub height: f32,
    pub thickness: f32,
    pub restitution: f32,
}

impl Default for WallsConfig {
    fn default() -> Self {
        Self {
            width: 25.0,
            height: 18.75,
            thickness: 0.15,
            restitution: 0.6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub name: String,
    /// Vertical gravity, negative is down
    pub gravity: f32,
    /// Rigid-body steps per tick
    pub substeps: u32,
    pub walls: Option<WallsConfig>,
    pub water: Vec<WaterConfig>,
    pub platforms: Vec<PlatformConfig>,
    pub bodies: Vec<BodyConfig>,
    pub drips: Vec<DripSchedule>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        let platform = |x: f32, y: f32| PlatformConfig {
            x,
            y,
            ..default()
        };

        Self {
            name: "pond".into(),
            gravity: -50.0,
            substeps: 3,
            walls: Some(WallsConfig::default()),
            water: vec![WaterConfig::default()],
            platforms: vec![
                platform(-1.0, 7.0),
                platform(5.0, 6.0),
                platform(5.0, 17.0),
                platform(13.0, 9.0),
            ],
            bodies: vec![BodyConfig::default()],
            drips: vec![DripSchedule {
                jitter: 0.5,
                ..default()
            }],
        }
    }
}

impl SceneConfig {
    /// Builds the pond holding one field per water entry, in order.
    pub fn build_pond(&self) -> Pond {
        let mut pond = Pond::new();
        for water in &self.water {
            pond.add_field(water.to_field());
        }
        pond
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.gravity.is_finite() {
            return Err(format!("gravity must be finite, got {}", self.gravity));
        }
        if !(1..=16).contains(&self.substeps) {
            return Err(format!(
                "substeps must be between 1 and 16, got {}",
                self.substeps
            ));
        }
        for (i, water) in self.water.iter().enumerate() {
            let values = [water.surface, water.left, water.right, water.floor];
            if values.iter().any(|v| !v.is_finite()) {
                return Err(format!("water {i} has non-finite coordinates"));
            }
            if water.right <= water.left {
                return Err(format!("water {i} must have right > left"));
            }
            if water.right - water.left > MAX_WATER_SPAN {
                return Err(format!(
                    "water {i} spans {} units, at most {} are allowed",
                    water.right - water.left,
                    MAX_WATER_SPAN
                ));
            }
            if water.surface < water.floor {
                return Err(format!("water {i} surface is below its floor"));
            }
        }
        for (i, platform) in self.platforms.iter().enumerate() {
            if !(platform.width > 0.0 && platform.height > 0.0) {
                return Err(format!("platform {i} must have a positive size"));
            }
        }
        for body in &self.bodies {
            if !(body.width > 0.0 && body.height > 0.0) {
                return Err(format!("body {} must have a positive size", body.name));
            }
            if !(body.mass > 0.0 && body.mass.is_finite()) {
                return Err(format!("body {} must have a positive mass", body.name));
            }
        }
        for (i, drip) in self.drips.iter().enumerate() {
            if drip.field >= self.water.len() {
                return Err(format!(
                    "drip {i} targets water {} but the scene has {}",
                    drip.field,
                    self.water.len()
                ));
            }
            if !(drip.period > 0.0 && drip.period.is_finite()) {
                return Err(format!("drip {i} must have a positive period"));
            }
        }
        Ok(())
    }
}

/// Load a scene from a ron file, falling back to the built-in pond when no
/// path is given or the file does not exist.
pub fn load_scene(path: Option<&Path>) -> Result<SceneConfig, Box<dyn std::error::Error>> {
    let Some(path) = path else {
        info!("No scene file given, using the default pond");
        return Ok(SceneConfig::default());
    };

    if !path.exists() {
        info!(
            "Scene file not found: {}. Using the default pond.",
            path.display()
        );
        return Ok(SceneConfig::default());
    }

    let contents: String = fs::read_to_string(path)?;
    let scene: SceneConfig = from_str(&contents)?;
    scene.validate()?;

    info!("Loaded scene {} from {}", scene.name, path.display());

    Ok(scene)
}

pub fn save_scene(scene: &SceneConfig, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let pretty_config = PrettyConfig::new()
        .with_depth_limit(4)
        .with_separate_tuple_members(true)
        .with_enumerate_arrays(false);

    let serialized = ron::ser::to_string_pretty(scene, pretty_config)?;
    let mut file = fs::File::create(path)?;
    file.write_all(serialized.as_bytes())?;
    info!("Scene written to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scene_is_valid() {
        let scene = SceneConfig::default();
        assert!(scene.validate().is_ok());
        assert_eq!(scene.platforms.len(), 4);

        let pond = scene.build_pond();
        assert_eq!(pond.len(), 1);
        assert_eq!(pond.fields()[0].sample_count(), 126);
        assert_eq!(pond.fields()[0].rest_level(), 6.5);
    }

    #[test]
    fn test_partial_scene_file() {
        let scene: SceneConfig = from_str(
            r#"(
                name: "tank",
                substeps: 2,
                water: [(surface: 3.0, left: 1.0, right: 11.0)],
                bodies: [(name: "crate", x: 4.0, y: 5.0, width: 1.0, height: 1.0, mass: 2.0)],
                drips: [],
            )"#,
        )
        .unwrap();

        assert_eq!(scene.name, "tank");
        assert_eq!(scene.substeps, 2);
        assert_eq!(scene.gravity, -50.0);
        assert_eq!(scene.water[0].floor, 0.0);
        assert_eq!(scene.water[0].tuning, WaterTuning::default());
        assert_eq!(scene.bodies[0].friction, 0.8);
        assert!(scene.validate().is_ok());
        assert_eq!(scene.build_pond().fields()[0].sample_count(), 51);
    }

    #[test]
    fn test_tuning_override() {
        let scene: SceneConfig = from_str(
            r#"(water: [(surface: 3.0, left: 0.0, right: 4.0, tuning: (subdivision: 10, damping: 0.25))])"#,
        )
        .unwrap();
        let tuning = scene.water[0].tuning;
        assert_eq!(tuning.subdivision, 10);
        assert_eq!(tuning.damping, 0.25);
        assert_eq!(tuning.water_drag, 20.0);
        assert_eq!(scene.build_pond().fields()[0].sample_count(), 41);
    }

    #[test]
    fn test_validation_errors() {
        let mut scene = SceneConfig::default();
        scene.water[0].right = -1.0;
        assert!(scene.validate().is_err());

        let mut scene = SceneConfig::default();
        scene.drips[0].field = 3;
        assert!(scene.validate().unwrap_err().contains("drip 0"));

        let mut scene = SceneConfig::default();
        scene.bodies[0].mass = 0.0;
        assert!(scene.validate().is_err());

        let mut scene = SceneConfig::default();
        scene.substeps = 0;
        assert!(scene.validate().is_err());

        let mut scene = SceneConfig::default();
        scene.water[0].left = -1.0e30;
        assert!(scene.validate().unwrap_err().contains("spans"));

        let mut scene = SceneConfig::default();
        scene.water[0].right = MAX_WATER_SPAN;
        assert!(scene.validate().is_ok());
    }

    #[test]
    fn test_missing_file_falls_back_to_default() {
        let scene = load_scene(Some(Path::new("/nonexistent/pond/scene.ron"))).unwrap();
        assert_eq!(scene, SceneConfig::default());
        assert_eq!(load_scene(None).unwrap(), SceneConfig::default());
    }

    #[test]
    fn test_scene_round_trips_through_file() {
        let path = std::env::temp_dir().join(format!("pond-scene-{}.ron", std::process::id()));
        let scene = SceneConfig::default();
        save_scene(&scene, &path).unwrap();
        let loaded = load_scene(Some(&path)).unwrap();
        let _ = fs::remove_file(&path);
        assert_eq!(loaded, scene);
    }
}
