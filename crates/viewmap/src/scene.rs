//! Scene meshes, materials and raycasting.

use std::ops::Deref;

use serde::{Deserialize, Serialize};
use tracing::debug;
use viewmap_math::{orient3d, Point3, Sign, Transform, Vec3};
use viewmap_mesh::{Bvh, FaceId, HalfEdgeMesh, Ray, RayHit, VertexId};

use crate::error::{Result, ViewmapError};
use crate::options::Color;

/// Index of a mesh in a [`Scene`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct MeshId(pub usize);

/// Which side of a face a material renders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    /// Counter-clockwise side only.
    #[default]
    Front,
    /// Clockwise side only.
    Back,
    /// Both sides.
    Double,
}

impl Side {
    /// Whether a hit on the given side of a face is seen.
    pub fn accepts(self, front_facing: bool) -> bool {
        match self {
            Side::Front => front_facing,
            Side::Back => !front_facing,
            Side::Double => true,
        }
    }
}

/// Surface appearance of one material group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Display name.
    pub name: String,
    /// Fill color; uncolored materials use the default mesh color.
    pub color: Option<Color>,
    /// Rendered side.
    pub side: Side,
}

impl Material {
    /// Front-sided material with a fill color.
    pub fn new(name: impl Into<String>, color: Color) -> Self {
        Self {
            name: name.into(),
            color: Some(color),
            side: Side::Front,
        }
    }
}

/// A triangle mesh placed in the world.
#[derive(Debug, Clone)]
pub struct SceneMesh {
    /// Display name.
    pub name: String,
    /// Geometry in the mesh's local frame.
    pub mesh: HalfEdgeMesh,
    /// Local-to-world transform.
    pub transform: Transform,
    /// Materials indexed by face material group.
    pub materials: Vec<Material>,
    inverse: Transform,
    bvh: Bvh,
}

impl SceneMesh {
    /// Place `mesh` in the world with the given local-to-world transform.
    pub fn new(name: impl Into<String>, mesh: HalfEdgeMesh, transform: Transform) -> Result<Self> {
        let name = name.into();
        let inverse = transform
            .inverse()
            .ok_or_else(|| ViewmapError::SingularTransform { mesh: name.clone() })?;
        let bvh = Bvh::build(&mesh);
        Ok(Self {
            name,
            mesh,
            transform,
            materials: Vec::new(),
            inverse,
            bvh,
        })
    }

    /// Replace the material list.
    pub fn with_materials(mut self, materials: Vec<Material>) -> Self {
        self.materials = materials;
        self
    }

    /// Recompute the inverse transform and the BVH after the geometry or
    /// transform changed.
    pub fn refresh(&mut self) -> Result<()> {
        self.inverse = self
            .transform
            .inverse()
            .ok_or_else(|| ViewmapError::SingularTransform {
                mesh: self.name.clone(),
            })?;
        self.bvh = Bvh::build(&self.mesh);
        Ok(())
    }

    /// World-to-local transform.
    pub fn inverse(&self) -> &Transform {
        &self.inverse
    }

    /// Triangle hierarchy in the local frame.
    pub fn bvh(&self) -> &Bvh {
        &self.bvh
    }

    /// World position of a vertex.
    pub fn world_point(&self, v: VertexId) -> Point3 {
        self.transform.apply_point(&self.mesh.vertices[v].point)
    }

    /// World positions of a triangle's corners.
    pub fn world_face_points(&self, face: FaceId) -> [Point3; 3] {
        self.mesh
            .face_points(face)
            .map(|p| self.transform.apply_point(&p))
    }

    /// World-space unit normal of a triangle.
    pub fn world_normal(&self, face: FaceId) -> Vec3 {
        let [a, b, c] = self.world_face_points(face);
        let n = (b - a).cross(&(c - a));
        let len = n.norm();
        if len > 0.0 {
            n / len
        } else {
            n
        }
    }

    /// Whether the triangle's front side faces `eye` (world space).
    pub fn is_front_facing(&self, face: FaceId, eye: &Point3) -> bool {
        let [a, b, c] = self.world_face_points(face);
        orient3d(&a, &b, &c, eye) == Sign::Positive
    }

    /// Material of a triangle's group, if defined.
    pub fn face_material(&self, face: FaceId) -> Option<&Material> {
        let group = self.mesh.faces.get(face)?.material;
        self.materials.get(group)
    }

    /// Side a triangle renders; faces without a material render their front.
    pub fn face_side(&self, face: FaceId) -> Side {
        self.face_material(face).map_or(Side::Front, |m| m.side)
    }

    /// All world-space hits of `ray`, sorted by distance.
    ///
    /// Hit parameters are world distances along the ray.
    pub fn raycast(&self, ray: &Ray) -> Vec<RayHit> {
        let local = Ray::new(
            self.inverse.apply_point(&ray.origin),
            self.inverse.apply_vec(ray.direction.as_ref()),
        );
        let mut hits: Vec<RayHit> = self
            .bvh
            .trace(&local)
            .into_iter()
            .map(|hit| {
                let point = self.transform.apply_point(&hit.point);
                let t = (point - ray.origin).dot(ray.direction.as_ref());
                let normal = self.transform.apply_normal(&hit.normal);
                RayHit::new(t, point, normal, hit.face_id, hit.front_facing)
            })
            .collect();
        hits.sort_by(|a, b| a.t.total_cmp(&b.t));
        hits
    }

    /// Nearest world-space hit on a rendered side.
    ///
    /// The local ray is an affine image of `ray`, so the nearest local hit
    /// is also the nearest world hit.
    pub fn raycast_first(&self, ray: &Ray) -> Option<RayHit> {
        let local = Ray::new(
            self.inverse.apply_point(&ray.origin),
            self.inverse.apply_vec(ray.direction.as_ref()),
        );
        let hit = self
            .bvh
            .trace_closest(&local, |hit| self.face_side(hit.face_id).accepts(hit.front_facing))?;
        let point = self.transform.apply_point(&hit.point);
        let t = (point - ray.origin).dot(ray.direction.as_ref());
        let normal = self.transform.apply_normal(&hit.normal);
        Some(RayHit::new(t, point, normal, hit.face_id, hit.front_facing))
    }
}

/// The meshes a viewmap is built from.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    meshes: Vec<SceneMesh>,
}

impl Scene {
    /// Empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a mesh and return its id.
    pub fn add_mesh(&mut self, mesh: SceneMesh) -> MeshId {
        self.meshes.push(mesh);
        MeshId(self.meshes.len() - 1)
    }

    /// Mesh by id.
    pub fn mesh(&self, id: MeshId) -> Option<&SceneMesh> {
        self.meshes.get(id.0)
    }

    /// Mutable mesh by id.
    pub fn mesh_mut(&mut self, id: MeshId) -> Option<&mut SceneMesh> {
        self.meshes.get_mut(id.0)
    }

    /// Number of meshes.
    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    /// Whether the scene has no meshes.
    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    /// Total triangle count.
    pub fn num_faces(&self) -> usize {
        self.meshes.iter().map(|m| m.mesh.num_faces()).sum()
    }

    /// Meshes with their ids.
    pub fn iter(&self) -> impl Iterator<Item = (MeshId, &SceneMesh)> {
        self.meshes.iter().enumerate().map(|(i, m)| (MeshId(i), m))
    }

    /// Refresh every mesh's inverse transform and BVH.
    pub fn refresh(&mut self) -> Result<()> {
        for mesh in &mut self.meshes {
            mesh.refresh()?;
        }
        debug!(meshes = self.meshes.len(), "refreshed scene meshes");
        Ok(())
    }

    /// Every hit on a rendered side, across all meshes, sorted by distance.
    pub fn raycast(&self, ray: &Ray) -> Vec<(MeshId, RayHit)> {
        let mut hits: Vec<(MeshId, RayHit)> = self
            .iter()
            .flat_map(|(id, mesh)| {
                mesh.raycast(ray)
                    .into_iter()
                    .filter(move |hit| mesh.face_side(hit.face_id).accepts(hit.front_facing))
                    .map(move |hit| (id, hit))
            })
            .collect();
        hits.sort_by(|a, b| a.1.t.total_cmp(&b.1.t));
        hits
    }

    /// Closest hit in front of the ray origin on a rendered side.
    pub fn raycast_first(&self, ray: &Ray) -> Option<(MeshId, RayHit)> {
        self.iter()
            .filter_map(|(id, mesh)| Some((id, mesh.raycast_first(ray)?)))
            .min_by(|a, b| a.1.t.total_cmp(&b.1.t))
    }

    /// Render every material double-sided until the guard drops.
    pub fn force_double_sided(&mut self) -> DoubleSidedGuard<'_> {
        let saved = self
            .meshes
            .iter_mut()
            .map(|mesh| {
                mesh.materials
                    .iter_mut()
                    .map(|m| std::mem::replace(&mut m.side, Side::Double))
                    .collect()
            })
            .collect();
        DoubleSidedGuard { scene: self, saved }
    }
}

/// Restores material sides when dropped.
pub struct DoubleSidedGuard<'a> {
    scene: &'a mut Scene,
    saved: Vec<Vec<Side>>,
}

impl DoubleSidedGuard<'_> {
    /// All hits along `ray`, both sides of every face.
    ///
    /// Faces without a material are included as well.
    pub fn raycast(&self, ray: &Ray) -> Vec<(MeshId, RayHit)> {
        let mut hits: Vec<(MeshId, RayHit)> = self
            .scene
            .iter()
            .flat_map(|(id, mesh)| mesh.raycast(ray).into_iter().map(move |hit| (id, hit)))
            .collect();
        hits.sort_by(|a, b| a.1.t.total_cmp(&b.1.t));
        hits
    }
}

impl Deref for DoubleSidedGuard<'_> {
    type Target = Scene;

    fn deref(&self) -> &Scene {
        &*self.scene
    }
}

impl Drop for DoubleSidedGuard<'_> {
    fn drop(&mut self) {
        for (mesh, sides) in self.scene.meshes.iter_mut().zip(&self.saved) {
            for (material, side) in mesh.materials.iter_mut().zip(sides) {
                material.side = *side;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use viewmap_mesh::primitives::{make_cube, make_plane};

    fn cube_scene(side: Side) -> Scene {
        let mut scene = Scene::new();
        let mesh = SceneMesh::new("cube", make_cube(2.0).unwrap(), Transform::identity())
            .unwrap()
            .with_materials(
                (0..6)
                    .map(|i| Material {
                        name: format!("side{i}"),
                        color: Some(Color::rgb(1.0, 0.0, 0.0)),
                        side,
                    })
                    .collect(),
            );
        scene.add_mesh(mesh);
        scene
    }

    #[test]
    fn test_raycast_in_world_space() {
        let mut scene = Scene::new();
        let mesh = SceneMesh::new(
            "plane",
            make_plane(2.0, 2.0).unwrap(),
            Transform::translation(0.0, 0.0, 3.0),
        )
        .unwrap();
        let id = scene.add_mesh(mesh);
        let ray = Ray::new(Point3::new(0.1, 0.2, 10.0), Vec3::new(0.0, 0.0, -1.0));
        let (hit_mesh, hit) = scene.raycast_first(&ray).unwrap();
        assert_eq!(hit_mesh, id);
        assert!((hit.t - 7.0).abs() < 1e-9);
        assert!((hit.point.z - 3.0).abs() < 1e-9);
        assert!(hit.front_facing);
    }

    #[test]
    fn test_scaled_mesh_reports_world_distance() {
        let mut scene = Scene::new();
        let mesh = SceneMesh::new(
            "cube",
            make_cube(1.0).unwrap(),
            Transform::scale(4.0, 4.0, 4.0),
        )
        .unwrap();
        scene.add_mesh(mesh);
        let ray = Ray::new(Point3::new(0.1, 0.3, 10.0), Vec3::new(0.0, 0.0, -1.0));
        let hits = scene.raycast(&ray);
        // Front side only: the top face at z = 2
        assert_eq!(hits.len(), 1);
        assert!((hits[0].1.t - 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_first_hit_picks_nearest_mesh() {
        let mut scene = Scene::new();
        scene.add_mesh(
            SceneMesh::new("low", make_plane(2.0, 2.0).unwrap(), Transform::identity()).unwrap(),
        );
        let high = scene.add_mesh(
            SceneMesh::new(
                "high",
                make_plane(2.0, 2.0).unwrap(),
                Transform::translation(0.0, 0.0, 1.0).then(&Transform::scale(2.0, 2.0, 2.0)),
            )
            .unwrap(),
        );
        let down = Ray::new(Point3::new(0.1, 0.2, 10.0), -Vec3::z());
        let (id, hit) = scene.raycast_first(&down).unwrap();
        assert_eq!(id, high);
        assert!((hit.t - 9.0).abs() < 1e-9);

        // From below only the low plane's back is seen, and backs are culled
        let up = Ray::new(Point3::new(0.1, 0.2, -10.0), Vec3::z());
        assert!(scene.raycast_first(&up).is_none());
    }

    #[test]
    fn test_sidedness_and_guard() {
        let mut scene = cube_scene(Side::Front);
        let ray = Ray::new(Point3::new(0.1, 0.3, 10.0), Vec3::new(0.0, 0.0, -1.0));
        assert_eq!(scene.raycast(&ray).len(), 1);
        {
            let guard = scene.force_double_sided();
            assert_eq!(guard.raycast(&ray).len(), 2);
            assert!(guard
                .iter()
                .all(|(_, m)| m.materials.iter().all(|mat| mat.side == Side::Double)));
        }
        assert_eq!(scene.raycast(&ray).len(), 1);
        let back = cube_scene(Side::Back);
        let (_, hit) = back.raycast_first(&ray).unwrap();
        assert!(!hit.front_facing);
        assert!((hit.point.z + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_front_facing_in_world_space() {
        let mesh = SceneMesh::new(
            "plane",
            make_plane(1.0, 1.0).unwrap(),
            Transform::rotation_x(std::f64::consts::PI),
        )
        .unwrap();
        let face = mesh.mesh.faces.keys().next().unwrap();
        // Flipped upside down: the front now faces -z
        assert!(mesh.is_front_facing(face, &Point3::new(0.0, 0.0, -5.0)));
        assert!(!mesh.is_front_facing(face, &Point3::new(0.0, 0.0, 5.0)));
        assert!((mesh.world_normal(face).z + 1.0).abs() < 1e-12);
    }
}
