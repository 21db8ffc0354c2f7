//! Benchmarks for full viewmap builds.

use criterion::{criterion_group, criterion_main, Criterion};
use viewmap::{Camera, Scene, SceneMesh, Viewmap, ViewmapOptions};
use viewmap_math::{Point3, Transform};
use viewmap_mesh::primitives::{make_cube, make_plane};

fn cube_on_plane() -> Viewmap {
    let mut scene = Scene::new();
    scene.add_mesh(
        SceneMesh::new("cube", make_cube(2.0).unwrap(), Transform::rotation_z(0.3)).unwrap(),
    );
    scene.add_mesh(
        SceneMesh::new("floor", make_plane(10.0, 10.0).unwrap(), Transform::identity()).unwrap(),
    );
    let camera = Camera::look_at(Point3::new(8.0, 6.0, 7.0), Point3::origin(), 1280.0, 720.0);
    Viewmap::new(scene, camera)
}

fn bench_build(c: &mut Criterion) {
    let options = ViewmapOptions::default();

    c.bench_function("build_cube", |b| {
        let mut scene = Scene::new();
        scene.add_mesh(
            SceneMesh::new("cube", make_cube(1.0).unwrap(), Transform::identity()).unwrap(),
        );
        let camera =
            Camera::look_at(Point3::new(10.0, 10.0, 10.0), Point3::origin(), 800.0, 600.0);
        let mut viewmap = Viewmap::new(scene, camera);
        b.iter(|| viewmap.build(&options).unwrap());
    });

    c.bench_function("build_cube_on_plane", |b| {
        let mut viewmap = cube_on_plane();
        b.iter(|| viewmap.build(&options).unwrap());
    });

    let cached = ViewmapOptions {
        update_meshes: false,
        ignore_visibility: true,
        ..Default::default()
    };
    c.bench_function("build_cube_on_plane_no_visibility", |b| {
        let mut viewmap = cube_on_plane();
        b.iter(|| viewmap.build(&cached).unwrap());
    });
}

criterion_group!(benches, bench_build);
criterion_main!(benches);
