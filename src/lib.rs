// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Polyframe CSG Core
//!
//! Topology, point classification and polygon triangulation for constructive
//! solid geometry. Builds vertex/edge/face adjacency over a polygon soup,
//! classifies points against possibly nested closed manifolds by randomized
//! ray casting, and triangulates planar polygons with holes.

pub mod config;
pub mod error;
pub mod geometry;
pub mod polyhedron;
pub mod triangulate;

pub use config::KernelConfig;
pub use error::{
    BridgeError, ClassificationError, DegenerateInputError, Error, Result, TopologyError,
    TriangulationError,
};
pub use geometry::{BoundingBox, Plane};
pub use polyhedron::{
    Edge, Face, FaceHit, ManifoldEmbedding, NestingForest, Parent, PointClass, PointClassifier,
    Polyhedron, Vertex,
};
pub use triangulate::{MergedLoop, Triangle, Triangulator};

use nalgebra::{Point2, Point3};
use std::collections::BTreeMap;

/// Build a polyhedron from vertex positions and per-face vertex index loops
pub fn build_polyhedron(
    vertices: &[Point3<f64>],
    faces: &[Vec<usize>],
) -> std::result::Result<Polyhedron, TopologyError> {
    Polyhedron::new(vertices, faces)
}

/// Build a polyhedron with an explicit configuration
pub fn build_polyhedron_with_config(
    vertices: &[Point3<f64>],
    faces: &[Vec<usize>],
    config: KernelConfig,
) -> std::result::Result<Polyhedron, TopologyError> {
    Polyhedron::with_config(vertices, faces, config)
}

/// Classify a point as inside, on or outside the selected closed manifolds
pub fn classify_point(
    polyhedron: &Polyhedron,
    point: &Point3<f64>,
    manifold_filter: Option<&[usize]>,
    even_odd: bool,
) -> std::result::Result<PointClass, ClassificationError> {
    polyhedron.classify_point(point, manifold_filter, even_odd)
}

/// Classify a point against every closed manifold separately
pub fn classify_against_manifolds(
    polyhedron: &Polyhedron,
    point: &Point3<f64>,
) -> std::result::Result<BTreeMap<usize, PointClass>, ClassificationError> {
    polyhedron.classify_against_manifolds(point)
}

/// Compute which manifolds are nested inside which
pub fn compute_manifold_embedding(
    polyhedron: &Polyhedron,
) -> std::result::Result<NestingForest, ClassificationError> {
    polyhedron.compute_manifold_embedding()
}

/// Triangulate a simple polygon with the default configuration
pub fn triangulate(points: &[Point2<f64>]) -> std::result::Result<Vec<Triangle>, TriangulationError> {
    Triangulator::new().triangulate(points)
}

/// Bridge hole loops into an outer loop
pub fn incorporate_holes(
    loops: &[Vec<Point2<f64>>],
    outer: usize,
    holes: &[usize],
) -> std::result::Result<MergedLoop, BridgeError> {
    triangulate::incorporate_holes(loops, outer, holes)
}

/// Sort loops into outer and hole loops by signed area and bridge them
pub fn merge_polygons_and_holes(
    loops: &[Vec<Point2<f64>>],
) -> std::result::Result<Vec<MergedLoop>, BridgeError> {
    triangulate::merge_polygons_and_holes(loops)
}

/// Triangulate a polygon with holes, returning triangles as
/// `(loop, vertex)` references into `loops`
pub fn triangulate_with_holes(loops: &[Vec<Point2<f64>>]) -> Result<Vec<[(usize, usize); 3]>> {
    let mut result = Vec::new();
    for merged in merge_polygons_and_holes(loops)? {
        let triangles = triangulate(&merged.points(loops))?;
        result.extend(
            triangles
                .iter()
                .map(|t| t.indices.map(|i| merged.vertices[i])),
        );
    }
    Ok(result)
}
