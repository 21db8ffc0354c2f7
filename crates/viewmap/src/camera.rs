//! Perspective camera.
//!
//! Pixel coordinates have their origin at the top-left corner of the render
//! target with y pointing down, matching the image the renderer produces.

use nalgebra::{Isometry3, Perspective3};
use serde::{Deserialize, Serialize};
use viewmap_math::{Point2, Point3, Vec3};
use viewmap_mesh::Ray;

use crate::error::{Result, ViewmapError};

/// A perspective camera together with its render size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    /// Eye position in world space.
    pub position: Point3,
    /// Point the camera looks at.
    pub target: Point3,
    /// Approximate up direction.
    pub up: Vec3,
    /// Vertical field of view in degrees.
    pub fov_y: f64,
    /// Near clip distance.
    pub near: f64,
    /// Far clip distance.
    pub far: f64,
    /// Render width in pixels.
    pub width: f64,
    /// Render height in pixels.
    pub height: f64,
}

impl Camera {
    /// Camera at `position` looking at `target` with a +y up vector, a 45°
    /// field of view and a `width × height` render target.
    pub fn look_at(position: Point3, target: Point3, width: f64, height: f64) -> Self {
        Self {
            position,
            target,
            up: Vec3::y(),
            fov_y: 45.0,
            near: 0.01,
            far: 1000.0,
            width,
            height,
        }
    }

    /// Check that the camera defines a usable projection.
    pub fn validate(&self) -> Result<()> {
        if !(self.width > 0.0 && self.height > 0.0) {
            return Err(ViewmapError::InvalidCamera(
                "render size must be positive".into(),
            ));
        }
        if !(self.fov_y > 0.0 && self.fov_y < 180.0) {
            return Err(ViewmapError::InvalidCamera(
                "fov_y must be between 0 and 180 degrees".into(),
            ));
        }
        if !(self.near > 0.0 && self.far > self.near) {
            return Err(ViewmapError::InvalidCamera(
                "clip planes must satisfy 0 < near < far".into(),
            ));
        }
        let forward = self.target - self.position;
        if forward.norm() < 1e-12 {
            return Err(ViewmapError::InvalidCamera(
                "position and target coincide".into(),
            ));
        }
        if forward.cross(&self.up).norm() < 1e-12 {
            return Err(ViewmapError::InvalidCamera(
                "up vector is parallel to the view direction".into(),
            ));
        }
        Ok(())
    }

    /// World-to-camera transform.
    pub fn view(&self) -> Isometry3<f64> {
        Isometry3::look_at_rh(&self.position, &self.target, &self.up)
    }

    /// Camera-to-clip projection.
    pub fn projection(&self) -> Perspective3<f64> {
        Perspective3::new(
            self.width / self.height,
            self.fov_y.to_radians(),
            self.near,
            self.far,
        )
    }

    /// Project a world point to pixel coordinates.
    pub fn project(&self, p: &Point3) -> Point2 {
        let ndc = self.projection().project_point(&self.view().transform_point(p));
        Point2::new(
            (ndc.x + 1.0) * 0.5 * self.width,
            (1.0 - ndc.y) * 0.5 * self.height,
        )
    }

    /// Pixel coordinates to normalized device coordinates in `[-1, 1]²`.
    pub fn to_ndc(&self, pixel: &Point2) -> Point2 {
        Point2::new(
            pixel.x / self.width * 2.0 - 1.0,
            1.0 - pixel.y / self.height * 2.0,
        )
    }

    /// Ray from the eye through a pixel.
    pub fn ray_through_pixel(&self, pixel: &Point2) -> Ray {
        let ndc = self.to_ndc(pixel);
        let near = self
            .projection()
            .unproject_point(&Point3::new(ndc.x, ndc.y, -1.0));
        let world = self.view().inverse_transform_point(&near);
        Ray::new(self.position, world - self.position)
    }

    /// Euclidean distance from the eye to `p`.
    pub fn distance_to(&self, p: &Point3) -> f64 {
        (p - self.position).norm()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> Camera {
        Camera::look_at(Point3::new(0.0, 0.0, 10.0), Point3::origin(), 200.0, 100.0)
    }

    #[test]
    fn test_target_projects_to_center() {
        let cam = camera();
        let p = cam.project(&Point3::origin());
        assert!((p.x - 100.0).abs() < 1e-9);
        assert!((p.y - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_pixel_y_points_down() {
        let cam = camera();
        let above = cam.project(&Point3::new(0.0, 1.0, 0.0));
        let right = cam.project(&Point3::new(1.0, 0.0, 0.0));
        assert!(above.y < 50.0);
        assert!(right.x > 100.0);
    }

    #[test]
    fn test_ray_through_projected_point_hits_it() {
        let cam = camera();
        let p = Point3::new(1.5, -0.75, 2.0);
        let ray = cam.ray_through_pixel(&cam.project(&p));
        let t = (p - ray.origin).dot(ray.direction.as_ref());
        assert!((ray.at(t) - p).norm() < 1e-6);
    }

    #[test]
    fn test_ndc_corners() {
        let cam = camera();
        let tl = cam.to_ndc(&Point2::new(0.0, 0.0));
        assert!((tl.x + 1.0).abs() < 1e-12 && (tl.y - 1.0).abs() < 1e-12);
        assert!((cam.distance_to(&Point3::origin()) - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_validate() {
        assert!(camera().validate().is_ok());
        let mut bad = camera();
        bad.target = bad.position;
        assert!(matches!(bad.validate(), Err(ViewmapError::InvalidCamera(_))));
        let mut bad = camera();
        bad.width = 0.0;
        assert!(bad.validate().is_err());
    }
}
