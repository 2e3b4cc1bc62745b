// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Topology, point classification and nesting on whole meshes

mod common;

use anyhow::Result;
use approx::assert_relative_eq;
use nalgebra::{Matrix4, Point3, Vector3};
use polycsg::{
    build_polyhedron, build_polyhedron_with_config, classify_against_manifolds, classify_point,
    compute_manifold_embedding, ClassificationError, Error, KernelConfig, Parent, PointClass,
    Polyhedron, TopologyError,
};

fn face_centroid(poly: &Polyhedron, face: usize) -> Point3<f64> {
    let f = &poly.faces()[face];
    let sum = f
        .vertices
        .iter()
        .fold(Vector3::zeros(), |acc, &v| acc + poly.vertices()[v].position.coords);
    Point3::from(sum / f.vertices.len() as f64)
}

#[test]
fn test_unit_cube_scenario() -> Result<()> {
    let (positions, faces) = common::cube(0.0, 1.0);
    let poly = build_polyhedron(&positions, &faces)?;

    assert_eq!(poly.vertices().len(), 8);
    assert_eq!(poly.edges().len(), 12);
    assert_eq!(poly.manifold_count(), 1);
    assert!(poly.is_closed(0));

    let center = Point3::new(0.5, 0.5, 0.5);
    assert_eq!(classify_point(&poly, &center, None, false)?, PointClass::In);

    let far = Point3::new(100.0, -50.0, 3.0);
    assert_eq!(classify_point(&poly, &far, None, false)?, PointClass::Out);

    Ok(())
}

#[test]
fn test_vertices_are_on_the_surface() -> Result<()> {
    for (positions, faces) in [common::cube(-1.0, 2.0), common::uv_sphere(3.0, 8, 12)] {
        let poly = build_polyhedron(&positions, &faces)?;
        assert!(poly.is_closed(0));

        for vertex in poly.vertices() {
            assert_eq!(
                classify_point(&poly, &vertex.position, None, false)?,
                PointClass::On
            );
        }
    }
    Ok(())
}

#[test]
fn test_normal_perturbation_flips_inside_outside() -> Result<()> {
    for (positions, faces) in [common::cube(0.0, 2.0), common::uv_sphere(1.0, 6, 10)] {
        let poly = build_polyhedron(&positions, &faces)?;

        for f in 0..poly.faces().len() {
            let centroid = face_centroid(&poly, f);
            let normal = poly.faces()[f].plane.normal;

            assert_eq!(classify_point(&poly, &centroid, None, false)?, PointClass::On);
            assert_eq!(
                classify_point(&poly, &(centroid + normal * 1e-4), None, false)?,
                PointClass::Out
            );
            assert_eq!(
                classify_point(&poly, &(centroid - normal * 1e-4), None, false)?,
                PointClass::In
            );
            assert_eq!(
                classify_point(&poly, &(centroid - normal * 1e-4), None, true)?,
                PointClass::In
            );
        }
    }
    Ok(())
}

#[test]
fn test_classification_is_independent_of_ray_seed() -> Result<()> {
    let (positions, faces) = common::combine(vec![
        common::cube(-10.0, 10.0),
        common::cube(2.0, 4.0),
        common::uv_sphere(1.5, 6, 8),
    ]);
    let samples = [
        Point3::new(3.0, 3.0, 3.0),
        Point3::new(6.0, 6.0, 6.0),
        Point3::new(0.2, 0.1, 0.3),
        Point3::new(-15.0, 1.0, 1.0),
    ];

    let reference_poly = build_polyhedron(&positions, &faces)?;
    let reference: Vec<_> = samples
        .iter()
        .map(|p| classify_against_manifolds(&reference_poly, p))
        .collect::<std::result::Result<_, _>>()?;

    for seed in 1..10 {
        let config = KernelConfig {
            ray_seed: seed,
            ..KernelConfig::default()
        };
        let poly = build_polyhedron_with_config(&positions, &faces, config)?;
        for (sample, expected) in samples.iter().zip(&reference) {
            assert_eq!(&classify_against_manifolds(&poly, sample)?, expected);
        }
    }

    assert_eq!(reference[0][&1], PointClass::In);
    assert_eq!(reference[1][&1], PointClass::Out);
    assert_eq!(reference[1][&0], PointClass::In);
    assert_eq!(reference[2][&2], PointClass::In);
    assert_eq!(reference[3][&0], PointClass::Out);
    Ok(())
}

#[test]
fn test_embedding_of_nested_and_disjoint_solids() -> Result<()> {
    // Outer box holding a smaller box, which holds a sphere; a separate box
    // sits beside the outer one
    let (positions, faces) = common::combine(vec![
        common::cube(-10.0, 10.0),
        common::cube(-5.0, 5.0),
        common::uv_sphere(2.0, 6, 8),
        common::cube(20.0, 22.0),
    ]);
    let poly = build_polyhedron(&positions, &faces)?;
    assert_eq!(poly.manifold_count(), 4);

    let forest = compute_manifold_embedding(&poly)?;
    assert_eq!(forest.parent(0), Some(Parent::Root));
    assert_eq!(forest.parent(1), Some(Parent::Manifold(0)));
    assert_eq!(forest.parent(2), Some(Parent::Manifold(1)));
    assert_eq!(forest.parent(3), Some(Parent::Root));
    assert_eq!(forest.roots(), vec![0, 3]);
    assert_eq!(forest.ancestors(2), vec![1, 0]);
    Ok(())
}

#[test]
fn test_cavity_classification() -> Result<()> {
    // Solid shell: outer box with an inverted inner box as a cavity
    let (positions, faces) = common::combine(vec![common::cube(0.0, 6.0), common::cube(2.0, 4.0)]);
    let mut poly = build_polyhedron(&positions, &faces)?;
    poly.invert_manifolds(&[1]);

    let in_cavity = Point3::new(3.0, 3.0, 3.0);
    let in_wall = Point3::new(1.0, 1.0, 1.0);
    assert_eq!(classify_point(&poly, &in_cavity, None, false)?, PointClass::Out);
    assert_eq!(classify_point(&poly, &in_wall, None, false)?, PointClass::In);

    let classes = classify_against_manifolds(&poly, &in_cavity)?;
    assert_eq!(classes[&0], PointClass::In);
    assert_eq!(classes[&1], PointClass::Out);
    Ok(())
}

#[test]
fn test_transformed_polyhedron() -> Result<()> {
    let (positions, faces) = common::cube(0.0, 1.0);
    let mut poly = build_polyhedron(&positions, &faces)?;

    let matrix = Matrix4::new_translation(&Vector3::new(5.0, 0.0, 0.0))
        * Matrix4::new_rotation(Vector3::new(0.0, 0.0, 0.3));
    poly.transform(&matrix)?;

    let center = matrix.transform_point(&Point3::new(0.5, 0.5, 0.5));
    assert_eq!(classify_point(&poly, &center, None, false)?, PointClass::In);
    assert_eq!(
        classify_point(&poly, &Point3::new(0.5, 0.5, 0.5), None, false)?,
        PointClass::Out
    );
    assert_relative_eq!(poly.aabb().center(), center, epsilon = 1e-9);
    Ok(())
}

#[test]
fn test_topology_errors_surface_through_crate_error() {
    let positions = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
        Point3::new(0.0, -1.0, 0.0),
        Point3::new(0.0, 0.0, 1.0),
    ];
    let faces = vec![vec![0, 1, 2], vec![1, 0, 3], vec![0, 1, 4]];

    let err: Error = build_polyhedron(&positions, &faces).unwrap_err().into();
    assert!(matches!(
        err,
        Error::Topology(TopologyError::NonManifoldEdge { faces: 3, .. })
    ));
    assert!(err.to_string().contains("incident faces"));
}

#[test]
fn test_coincident_solids_cannot_be_nested() -> Result<()> {
    let (positions, faces) = common::combine(vec![common::cube(0.0, 1.0), common::cube(0.0, 1.0)]);
    let poly = build_polyhedron(&positions, &faces)?;
    assert_eq!(poly.manifold_count(), 2);

    assert_eq!(
        compute_manifold_embedding(&poly).unwrap_err(),
        ClassificationError::NoProbePoint { manifold: 0 }
    );
    Ok(())
}
