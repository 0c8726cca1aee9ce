use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[allow(unused_imports)]
use crate::core::prelude::*;

pub const EPSILON: f64 = 1e-9;

// Camera.
pub const DEFAULT_SCALE: f64 = 25.0;
pub const MIN_SCALE: f64 = 10.0;
pub const MAX_SCALE: f64 = 100.0;
pub const ZOOM_OUT_FACTOR: f64 = 0.9;
pub const ZOOM_IN_FACTOR: f64 = 1.1;
pub const DRAG_SENSITIVITY: f64 = 0.01;
pub const OBLIQUE_DEPTH_FACTOR: f64 = 0.5;
pub const DEFAULT_DEPTH_OFFSET: f64 = 5.0;
pub const MIN_PERSPECTIVE_DENOMINATOR: f64 = 0.1;

// Scene extents, in model units.
pub const GRID_EXTENT: i32 = 200;
pub const GRID_STEP: usize = 25;
pub const AXIS_LENGTH: f64 = 150.0;
pub const AXIS_LABEL_OFFSET: f64 = 10.0;

// Scalar results are drawn as a short arrow along X.
pub const SCALAR_GRAPHIC_FACTOR: f64 = 0.1;
pub const ANGLE_GRAPHIC_FACTOR: f64 = 0.01;

pub const DEFAULT_VIEWPORT_WIDTH: f64 = 800.0;
pub const DEFAULT_VIEWPORT_HEIGHT: f64 = 600.0;

/// Storage key under which the history is persisted. There is exactly one per process.
pub const HISTORY_STORAGE_KEY: &str = "algebraLinearHistory";

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectionMode {
    /// `x - z/2`, `y + z/2` oblique projection. No foreshortening.
    #[default]
    Oblique,
    /// Divides by `depth_offset + z`.
    Perspective,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportSettings {
    pub width: f64,
    pub height: f64,
}

impl Default for ViewportSettings {
    fn default() -> Self {
        Self {
            width: DEFAULT_VIEWPORT_WIDTH,
            height: DEFAULT_VIEWPORT_HEIGHT,
        }
    }
}

/// Runtime settings, read from an optional TOML file. Every field has a default, so an empty
/// file (or no file at all) is valid.
///
/// ```
/// use vmatrix::core::config::{ProjectionMode, Settings};
/// let settings = Settings::from_toml_str("projection = \"perspective\"\ndefault_scale = 40.0").unwrap();
/// assert_eq!(settings.projection, ProjectionMode::Perspective);
/// assert_eq!(settings.default_scale, 40.0);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub projection: ProjectionMode,
    pub depth_offset: f64,
    pub default_scale: f64,
    pub viewport: ViewportSettings,
    pub log_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".vmatrix"),
            projection: ProjectionMode::default(),
            depth_offset: DEFAULT_DEPTH_OFFSET,
            default_scale: DEFAULT_SCALE,
            viewport: ViewportSettings::default(),
            log_file: None,
        }
    }
}

impl Settings {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let mut settings: Settings = toml::from_str(s).context("invalid settings")?;
        settings.sanitise();
        Ok(settings)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("could not read settings from {}", path.display()))?;
        Self::from_toml_str(&contents)
    }

    /// Loads `path` if given, otherwise the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    fn sanitise(&mut self) {
        if !(MIN_SCALE..=MAX_SCALE).contains(&self.default_scale) {
            warn!(
                "default_scale {} outside [{MIN_SCALE}, {MAX_SCALE}], clamping",
                self.default_scale
            );
            self.default_scale = if self.default_scale.is_nan() {
                DEFAULT_SCALE
            } else {
                self.default_scale.clamp(MIN_SCALE, MAX_SCALE)
            };
        }
        if self.depth_offset <= 0.0 || !self.depth_offset.is_finite() {
            warn!("depth_offset {} must be positive, using default", self.depth_offset);
            self.depth_offset = DEFAULT_DEPTH_OFFSET;
        }
        if self.viewport.width <= 0.0 || self.viewport.height <= 0.0 {
            warn!("viewport must have a positive size, using default");
            self.viewport = ViewportSettings::default();
        }
    }
}
