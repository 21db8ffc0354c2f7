//! Build options.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ViewmapError};

/// An RGBA color with components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    /// Red.
    pub r: f32,
    /// Green.
    pub g: f32,
    /// Blue.
    pub b: f32,
    /// Alpha.
    pub a: f32,
}

impl Color {
    /// Opaque color from RGB components.
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Mid grey, used for polygons no mesh material claims.
    pub const GREY: Color = Color::rgb(0.5, 0.5, 0.5);
}

impl Default for Color {
    fn default() -> Self {
        Self::GREY
    }
}

/// Dihedral angle window (degrees) for crease edges, inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CreaseAngle {
    /// Smallest face angle that counts as a crease.
    pub min: f64,
    /// Largest face angle that counts as a crease.
    pub max: f64,
}

impl Default for CreaseAngle {
    fn default() -> Self {
        Self {
            min: 80.0,
            max: 100.0,
        }
    }
}

impl CreaseAngle {
    /// Whether `angle` falls inside the window.
    pub fn contains(&self, angle: f64) -> bool {
        self.min <= angle && angle <= self.max
    }
}

/// Viewmap build parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewmapOptions {
    /// Face angle window for crease edges.
    pub crease_angle: CreaseAngle,
    /// Recompute mesh BVHs and inverse transforms before building.
    pub update_meshes: bool,
    /// Skip raycasting and mark every chain visible.
    pub ignore_visibility: bool,
    /// Fill color for polygons without a colored material.
    pub default_mesh_color: Color,
    /// Total occluder depth under which a chain is still visible.
    pub visibility_tolerance: f64,
    /// Regions with a signed area at or below this are discarded (pixels²).
    pub min_polygon_area: f64,
}

impl Default for ViewmapOptions {
    fn default() -> Self {
        Self {
            crease_angle: CreaseAngle::default(),
            update_meshes: true,
            ignore_visibility: false,
            default_mesh_color: Color::GREY,
            visibility_tolerance: 1e-5,
            min_polygon_area: 1e-10,
        }
    }
}

impl ViewmapOptions {
    /// Parse options from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Validate options.
    pub fn validate(&self) -> Result<()> {
        let CreaseAngle { min, max } = self.crease_angle;
        if !(0.0..=180.0).contains(&min) || !(0.0..=180.0).contains(&max) {
            return Err(ViewmapError::InvalidOptions(
                "crease_angle must lie between 0 and 180 degrees".into(),
            ));
        }
        if min > max {
            return Err(ViewmapError::InvalidOptions(
                "crease_angle.min must not exceed crease_angle.max".into(),
            ));
        }
        if self.visibility_tolerance.is_nan() || self.visibility_tolerance < 0.0 {
            return Err(ViewmapError::InvalidOptions(
                "visibility_tolerance must be non-negative".into(),
            ));
        }
        if self.min_polygon_area.is_nan() || self.min_polygon_area < 0.0 {
            return Err(ViewmapError::InvalidOptions(
                "min_polygon_area must be non-negative".into(),
            ));
        }
        Ok(())
    }
}
