// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Polyhedron topology: vertices, edges and faces with full adjacency,
//! manifold partitioning and point queries

mod classify;
mod connectivity;
mod embedding;

pub use classify::PointClassifier;
pub use connectivity::ConnectivityBuilder;
pub use embedding::{ManifoldEmbedding, NestingForest, Parent};

use crate::config::KernelConfig;
use crate::error::{ClassificationError, DegenerateInputError, TopologyError, TriangulationError};
use crate::geometry::{predicates, BoundingBox, Containment, Plane, Projection, SpatialIndex};
use crate::triangulate::Triangulator;
use nalgebra::{Matrix4, Point2, Point3};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Mesh vertex
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub position: Point3<f64>,
}

impl Vertex {
    pub fn new(position: Point3<f64>) -> Self {
        Self { position }
    }
}

/// Undirected edge, stored in the direction it was first traversed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub v1: usize,
    pub v2: usize,
}

impl Edge {
    pub fn new(v1: usize, v2: usize) -> Self {
        Self { v1, v2 }
    }

    /// Order-independent key
    pub fn key(&self) -> (usize, usize) {
        (self.v1.min(self.v2), self.v1.max(self.v2))
    }

    /// Whether a face walking `from -> to` runs along the stored direction
    pub fn is_forward(&self, from: usize, to: usize) -> bool {
        self.v1 == from && self.v2 == to
    }
}

/// Planar polygonal face
#[derive(Debug, Clone)]
pub struct Face {
    /// Vertex loop
    pub vertices: Vec<usize>,
    /// `edges[i]` joins `vertices[i]` and `vertices[i + 1]`
    pub edges: Vec<usize>,
    pub plane: Plane,
    pub bbox: BoundingBox,
    pub manifold_id: usize,
    projection: Projection,
    loop_2d: Vec<Point2<f64>>,
}

impl Face {
    fn new(
        vertices: Vec<usize>,
        edges: Vec<usize>,
        plane: Plane,
        positions: &[Point3<f64>],
        manifold_id: usize,
    ) -> Self {
        let mut face = Self {
            vertices,
            edges,
            plane,
            bbox: BoundingBox::empty(),
            manifold_id,
            projection: plane.projection(),
            loop_2d: Vec::new(),
        };
        face.refresh(plane, positions);
        face
    }

    /// Recompute derived data after the plane or vertex positions change
    fn refresh(&mut self, plane: Plane, positions: &[Point3<f64>]) {
        self.plane = plane;
        self.projection = plane.projection();
        self.bbox = BoundingBox::from_points(self.vertices.iter().map(|&v| &positions[v]));
        self.loop_2d = self
            .vertices
            .iter()
            .map(|&v| self.projection.project(&positions[v]))
            .collect();
    }

    pub fn corner_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    /// Face loop projected onto the plane's dominant axis
    pub fn loop_2d(&self) -> &[Point2<f64>] {
        &self.loop_2d
    }

    fn reverse(&mut self) {
        self.vertices.reverse();
        self.edges.reverse();
        self.edges.rotate_left(1);
        self.loop_2d.reverse();
        self.plane = self.plane.flipped();
        self.projection = self.plane.projection();
    }
}

/// Position of a point relative to a manifold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PointClass {
    Out,
    On,
    In,
}

impl PointClass {
    /// Swap inside and outside, as seen from an inverted solid
    pub fn inverted(self) -> Self {
        match self {
            PointClass::In => PointClass::Out,
            PointClass::Out => PointClass::In,
            PointClass::On => PointClass::On,
        }
    }
}

/// Result of intersecting a segment with a face
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FaceHit {
    Miss,
    /// Clean crossing of the face interior at parameter `t` along the segment
    Hit { t: f64, point: Point3<f64> },
    /// Segment touches an edge or vertex, lies in the plane or ends on it
    Degenerate,
}

/// Polyhedron with vertex/edge/face adjacency and per-manifold flags
#[derive(Debug, Clone)]
pub struct Polyhedron {
    pub(crate) vertices: Vec<Vertex>,
    pub(crate) edges: Vec<Edge>,
    pub(crate) faces: Vec<Face>,
    pub(crate) vertex_to_edge: Vec<Vec<usize>>,
    pub(crate) vertex_to_face: Vec<Vec<usize>>,
    /// Per edge, pairs of (forward face, backward face) slots
    pub(crate) edge_to_face: Vec<Vec<Option<usize>>>,
    pub(crate) manifold_is_closed: Vec<bool>,
    pub(crate) manifold_is_negative: Vec<bool>,
    pub(crate) aabb: BoundingBox,
    pub(crate) index: SpatialIndex,
    pub(crate) config: KernelConfig,
}

impl Polyhedron {
    /// Build topology from a vertex/face soup with default configuration
    pub fn new(positions: &[Point3<f64>], faces: &[Vec<usize>]) -> Result<Self, TopologyError> {
        ConnectivityBuilder::new(positions, faces).build()
    }

    pub fn with_config(
        positions: &[Point3<f64>],
        faces: &[Vec<usize>],
        config: KernelConfig,
    ) -> Result<Self, TopologyError> {
        ConnectivityBuilder::new(positions, faces)
            .with_config(config)
            .build()
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    pub fn vertex(&self, index: usize) -> Option<&Vertex> {
        self.vertices.get(index)
    }

    pub fn edge(&self, index: usize) -> Option<&Edge> {
        self.edges.get(index)
    }

    pub fn face(&self, index: usize) -> Option<&Face> {
        self.faces.get(index)
    }

    /// Sorted edges incident to a vertex
    pub fn vertex_edges(&self, vertex: usize) -> &[usize] {
        self.vertex_to_edge.get(vertex).map_or(&[], Vec::as_slice)
    }

    /// Sorted faces incident to a vertex
    pub fn vertex_faces(&self, vertex: usize) -> &[usize] {
        self.vertex_to_face.get(vertex).map_or(&[], Vec::as_slice)
    }

    /// Face slots of an edge: even slots hold faces running along the edge,
    /// odd slots faces running against it
    pub fn edge_faces(&self, edge: usize) -> &[Option<usize>] {
        self.edge_to_face.get(edge).map_or(&[], Vec::as_slice)
    }

    /// Number of faces incident to an edge
    pub fn edge_face_count(&self, edge: usize) -> usize {
        self.edge_faces(edge).iter().flatten().count()
    }

    pub fn find_edge(&self, v1: usize, v2: usize) -> Option<usize> {
        self.vertex_edges(v1)
            .iter()
            .copied()
            .find(|&e| self.edges[e].key() == (v1.min(v2), v1.max(v2)))
    }

    pub fn manifold_count(&self) -> usize {
        self.manifold_is_closed.len()
    }

    pub fn is_closed(&self, manifold: usize) -> bool {
        self.manifold_is_closed.get(manifold).copied().unwrap_or(false)
    }

    pub fn is_negative(&self, manifold: usize) -> bool {
        self.manifold_is_negative
            .get(manifold)
            .copied()
            .unwrap_or(false)
    }

    pub fn manifold_faces(&self, manifold: usize) -> impl Iterator<Item = usize> + '_ {
        self.faces
            .iter()
            .enumerate()
            .filter(move |(_, f)| f.manifold_id == manifold)
            .map(|(i, _)| i)
    }

    pub fn aabb(&self) -> &BoundingBox {
        &self.aabb
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    pub fn spatial_index(&self) -> &SpatialIndex {
        &self.index
    }

    pub(crate) fn position(&self, vertex: usize) -> &Point3<f64> {
        &self.vertices[vertex].position
    }

    /// Whether `point` lies on face `face` within tolerance, boundary included
    pub fn face_contains_point(&self, face: usize, point: &Point3<f64>) -> bool {
        let Some(f) = self.faces.get(face) else {
            return false;
        };
        let eps = self.config.epsilon;

        if f.plane.signed_distance(point).abs() > eps || !f.bbox.contains_point(point, eps) {
            return false;
        }

        let projected = f.projection.project(point);
        predicates::classify_in_polygon(&projected, &f.loop_2d, eps) != Containment::Outside
    }

    /// Intersect segment `a`-`b` with a face.
    ///
    /// Anything other than a clean crossing of the face interior is reported
    /// as [`FaceHit::Degenerate`].
    pub fn face_segment_intersection(&self, face: usize, a: &Point3<f64>, b: &Point3<f64>) -> FaceHit {
        let Some(f) = self.faces.get(face) else {
            return FaceHit::Miss;
        };
        let eps = self.config.epsilon;

        let da = f.plane.signed_distance(a);
        let db = f.plane.signed_distance(b);
        let a_on = da.abs() <= eps;
        let b_on = db.abs() <= eps;

        if a_on && b_on {
            return FaceHit::Degenerate;
        }
        if (da > eps && db > eps) || (da < -eps && db < -eps) {
            return FaceHit::Miss;
        }

        let (t, point) = if a_on {
            (0.0, *a)
        } else if b_on {
            (1.0, *b)
        } else {
            let t = da / (da - db);
            (t, a + (b - a) * t)
        };

        let projected = f.projection.project(&point);
        match predicates::classify_in_polygon(&projected, &f.loop_2d, eps) {
            Containment::Outside => FaceHit::Miss,
            Containment::Boundary => FaceHit::Degenerate,
            Containment::Inside if a_on || b_on => FaceHit::Degenerate,
            Containment::Inside => FaceHit::Hit { t, point },
        }
    }

    /// Manifold an edge belongs to, taken from its first incident face
    pub fn edge_manifold(&self, edge: usize) -> Option<usize> {
        self.edge_faces(edge)
            .iter()
            .flatten()
            .next()
            .map(|&f| self.faces[f].manifold_id)
    }

    /// Whether segment `a`-`b` passes within tolerance of an edge
    pub fn segment_grazes_edge(&self, edge: usize, a: &Point3<f64>, b: &Point3<f64>) -> bool {
        let Some(e) = self.edges.get(edge) else {
            return false;
        };
        segment_distance(a, b, self.position(e.v1), self.position(e.v2)) <= self.config.epsilon
    }

    /// Invert every manifold
    pub fn invert(&mut self) {
        let all: Vec<usize> = (0..self.manifold_count()).collect();
        self.invert_manifolds(&all);
    }

    /// Reverse face orientation of the given manifolds and toggle their
    /// negative flags
    pub fn invert_manifolds(&mut self, manifolds: &[usize]) {
        let selected: Vec<bool> = (0..self.manifold_count())
            .map(|m| manifolds.contains(&m))
            .collect();

        for face in self.faces.iter_mut() {
            if selected[face.manifold_id] {
                face.reverse();
            }
        }

        // All faces of an edge share a manifold
        for slots in self.edge_to_face.iter_mut() {
            let manifold = slots.iter().flatten().next().map(|&f| self.faces[f].manifold_id);
            if manifold.is_some_and(|m| selected[m]) {
                for pair in slots.chunks_mut(2) {
                    pair.swap(0, 1);
                }
            }
        }

        for (m, negative) in self.manifold_is_negative.iter_mut().enumerate() {
            if selected[m] {
                *negative = !*negative;
            }
        }
    }

    /// Apply an affine transform to all vertices, refitting planes and
    /// rebuilding the spatial index.
    ///
    /// Leaves the polyhedron untouched when a face collapses.
    pub fn transform(&mut self, matrix: &Matrix4<f64>) -> Result<(), DegenerateInputError> {
        let positions: Vec<Point3<f64>> = self
            .vertices
            .iter()
            .map(|v| matrix.transform_point(&v.position))
            .collect();

        if let Some(index) = positions.iter().position(|p| !p.iter().all(|c| c.is_finite())) {
            return Err(DegenerateInputError::NonFinite { index });
        }

        let planes = self
            .faces
            .iter()
            .enumerate()
            .map(|(i, f)| {
                let points: Vec<Point3<f64>> = f.vertices.iter().map(|&v| positions[v]).collect();
                Plane::from_loop(&points).ok_or(DegenerateInputError::ZeroLengthNormal { face: i })
            })
            .collect::<Result<Vec<_>, _>>()?;

        for (vertex, position) in self.vertices.iter_mut().zip(&positions) {
            vertex.position = *position;
        }
        for (face, plane) in self.faces.iter_mut().zip(planes) {
            face.refresh(plane, &positions);
        }
        self.rebuild_bounds();
        Ok(())
    }

    pub(crate) fn rebuild_bounds(&mut self) {
        self.aabb = self
            .faces
            .iter()
            .fold(BoundingBox::empty(), |acc, f| acc.union(&f.bbox));

        let face_boxes: Vec<BoundingBox> = self.faces.iter().map(|f| f.bbox).collect();
        let edge_boxes: Vec<BoundingBox> = self
            .edges
            .iter()
            .map(|e| BoundingBox::from_segment(self.position(e.v1), self.position(e.v2)))
            .collect();
        self.index = SpatialIndex::build(&face_boxes, &edge_boxes, self.config.epsilon);
    }

    /// Triangulate a face in its own winding, returning vertex id triples.
    ///
    /// Fails with [`TriangulationError::FaceOutOfRange`] for an unknown face.
    pub fn triangulate_face(&self, face: usize) -> Result<Vec<[usize; 3]>, TriangulationError> {
        let f = self.faces.get(face).ok_or(TriangulationError::FaceOutOfRange {
            face,
            count: self.faces.len(),
        })?;

        let triangles = Triangulator::with_config(self.config.clone()).triangulate(&f.loop_2d)?;
        Ok(triangles
            .iter()
            .map(|t| t.indices.map(|i| f.vertices[i]))
            .collect())
    }

    /// Classify a point against the whole polyhedron, see [`PointClassifier::classify_point`]
    pub fn classify_point(
        &self,
        point: &Point3<f64>,
        manifold_filter: Option<&[usize]>,
        even_odd: bool,
    ) -> Result<PointClass, ClassificationError> {
        PointClassifier::new(self).classify_point(point, manifold_filter, even_odd)
    }

    /// Classify a point against each closed manifold
    pub fn classify_against_manifolds(
        &self,
        point: &Point3<f64>,
    ) -> Result<BTreeMap<usize, PointClass>, ClassificationError> {
        PointClassifier::new(self).classify_against_all(point, false)
    }

    /// Nesting of manifolds inside one another
    pub fn compute_manifold_embedding(&self) -> Result<NestingForest, ClassificationError> {
        ManifoldEmbedding::new(self).compute()
    }
}

/// Shortest distance between segments p1-q1 and p2-q2
fn segment_distance(p1: &Point3<f64>, q1: &Point3<f64>, p2: &Point3<f64>, q2: &Point3<f64>) -> f64 {
    let d1 = q1 - p1;
    let d2 = q2 - p2;
    let r = p1 - p2;
    let a = d1.norm_squared();
    let e = d2.norm_squared();
    let f = d2.dot(&r);

    let (s, t) = if a == 0.0 && e == 0.0 {
        (0.0, 0.0)
    } else if a == 0.0 {
        (0.0, (f / e).clamp(0.0, 1.0))
    } else {
        let c = d1.dot(&r);
        if e == 0.0 {
            ((-c / a).clamp(0.0, 1.0), 0.0)
        } else {
            let b = d1.dot(&d2);
            let denom = a * e - b * b;
            let s = if denom > 0.0 {
                ((b * f - c * e) / denom).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let t = (b * s + f) / e;
            if t < 0.0 {
                ((-c / a).clamp(0.0, 1.0), 0.0)
            } else if t > 1.0 {
                (((b - c) / a).clamp(0.0, 1.0), 1.0)
            } else {
                (s, t)
            }
        }
    };

    ((p1 + d1 * s) - (p2 + d2 * t)).norm()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use approx::assert_relative_eq;

    pub(crate) fn cube_soup(min: f64, max: f64) -> (Vec<Point3<f64>>, Vec<Vec<usize>>) {
        let positions = vec![
            Point3::new(min, min, min),
            Point3::new(max, min, min),
            Point3::new(max, max, min),
            Point3::new(min, max, min),
            Point3::new(min, min, max),
            Point3::new(max, min, max),
            Point3::new(max, max, max),
            Point3::new(min, max, max),
        ];
        // Outward normals
        let faces = vec![
            vec![0, 3, 2, 1],
            vec![4, 5, 6, 7],
            vec![0, 1, 5, 4],
            vec![2, 3, 7, 6],
            vec![1, 2, 6, 5],
            vec![0, 4, 7, 3],
        ];
        (positions, faces)
    }

    pub(crate) fn cube(min: f64, max: f64) -> Polyhedron {
        let (positions, faces) = cube_soup(min, max);
        Polyhedron::new(&positions, &faces).unwrap()
    }

    #[test]
    fn test_cube_adjacency() {
        let poly = cube(0.0, 1.0);
        assert_eq!(poly.edges().len(), 12);
        assert_eq!(poly.manifold_count(), 1);
        assert!(poly.is_closed(0));
        assert!(!poly.is_negative(0));

        for v in 0..8 {
            assert_eq!(poly.vertex_edges(v).len(), 3);
            assert_eq!(poly.vertex_faces(v).len(), 3);
        }
        for e in 0..12 {
            let slots = poly.edge_faces(e);
            assert_eq!(slots.len() % 2, 0);
            assert_eq!(poly.edge_face_count(e), 2);
            // Consistent orientation puts one face on each side
            assert!(slots[0].is_some() && slots[1].is_some());
        }

        let bottom = poly.face(0).unwrap();
        assert_relative_eq!(bottom.plane.normal.z, -1.0);
        assert_eq!(poly.find_edge(6, 2), poly.find_edge(2, 6));
        assert!(poly.find_edge(0, 6).is_none());
    }

    #[test]
    fn test_face_contains_point() {
        let poly = cube(0.0, 1.0);
        assert!(poly.face_contains_point(1, &Point3::new(0.5, 0.5, 1.0)));
        assert!(poly.face_contains_point(1, &Point3::new(1.0, 1.0, 1.0)));
        assert!(!poly.face_contains_point(1, &Point3::new(0.5, 0.5, 0.9)));
        assert!(!poly.face_contains_point(1, &Point3::new(1.5, 0.5, 1.0)));
    }

    #[test]
    fn test_face_segment_intersection() {
        let poly = cube(0.0, 1.0);
        let hit = poly.face_segment_intersection(
            1,
            &Point3::new(0.3, 0.4, 0.0),
            &Point3::new(0.3, 0.4, 2.0),
        );
        match hit {
            FaceHit::Hit { t, point } => {
                assert_relative_eq!(t, 0.5);
                assert_relative_eq!(point.z, 1.0);
            }
            other => panic!("expected a hit, got {other:?}"),
        }

        // Through the top face's edge
        let grazing = poly.face_segment_intersection(
            1,
            &Point3::new(1.0, 0.5, 0.0),
            &Point3::new(1.0, 0.5, 2.0),
        );
        assert_eq!(grazing, FaceHit::Degenerate);

        let miss = poly.face_segment_intersection(
            1,
            &Point3::new(3.0, 0.5, 0.0),
            &Point3::new(3.0, 0.5, 2.0),
        );
        assert_eq!(miss, FaceHit::Miss);
    }

    #[test]
    fn test_invert_flips_planes_and_slots() {
        let mut poly = cube(0.0, 1.0);
        let before: Vec<_> = (0..12).map(|e| poly.edge_faces(e).to_vec()).collect();

        poly.invert();
        assert!(poly.is_negative(0));
        assert_relative_eq!(poly.face(1).unwrap().plane.normal.z, -1.0);

        for (e, slots) in before.iter().enumerate() {
            assert_eq!(poly.edge_faces(e)[0], slots[1]);
            assert_eq!(poly.edge_faces(e)[1], slots[0]);
        }

        // Face edges still line up with the reversed loop
        for face in poly.faces() {
            let n = face.corner_count();
            for i in 0..n {
                let key = poly.edges()[face.edges[i]].key();
                let (a, b) = (face.vertices[i], face.vertices[(i + 1) % n]);
                assert_eq!(key, (a.min(b), a.max(b)));
            }
        }
    }

    #[test]
    fn test_segment_grazing_an_edge() {
        let poly = cube(0.0, 1.0);
        let edge = poly.find_edge(0, 1).unwrap();
        assert_eq!(poly.edge_manifold(edge), Some(0));

        let (a, b) = (Point3::new(0.5, -1.0, -1.0), Point3::new(0.5, 1.0, 1.0));
        assert!(poly.spatial_index().find_edges_near_segment(&a, &b).contains(&edge));
        assert!(poly.segment_grazes_edge(edge, &a, &b));

        let (c, d) = (Point3::new(0.5, -1.0, -0.5), Point3::new(0.5, 1.0, -0.5));
        assert!(!poly.segment_grazes_edge(edge, &c, &d));

        // Parallel and offset by exactly one unit
        let (e, f) = (Point3::new(-2.0, 1.0, 0.0), Point3::new(3.0, 1.0, 0.0));
        assert_relative_eq!(
            segment_distance(&e, &f, &Point3::new(0.0, 0.0, 0.0), &Point3::new(1.0, 0.0, 0.0)),
            1.0
        );
        // Skew segments whose closest points are interior
        assert_relative_eq!(
            segment_distance(
                &Point3::new(0.0, 0.0, 0.0),
                &Point3::new(2.0, 0.0, 0.0),
                &Point3::new(1.0, -1.0, 3.0),
                &Point3::new(1.0, 1.0, 3.0),
            ),
            3.0
        );
    }

    #[test]
    fn test_transform_moves_everything() {
        let mut poly = cube(0.0, 1.0);
        let matrix = Matrix4::new_translation(&nalgebra::Vector3::new(10.0, 0.0, 0.0));
        poly.transform(&matrix).unwrap();

        assert_relative_eq!(poly.aabb().min.x, 10.0);
        assert_relative_eq!(poly.face(4).unwrap().plane.offset, -11.0);
        assert!(poly.face_contains_point(4, &Point3::new(11.0, 0.5, 0.5)));

        let collapse = Matrix4::new_nonuniform_scaling(&nalgebra::Vector3::new(0.0, 1.0, 1.0));
        assert!(poly.transform(&collapse).is_err());
        assert_relative_eq!(poly.aabb().min.x, 10.0);
    }

    #[test]
    fn test_triangulate_missing_face() {
        let poly = cube(0.0, 1.0);
        assert_eq!(
            poly.triangulate_face(6).unwrap_err(),
            TriangulationError::FaceOutOfRange { face: 6, count: 6 }
        );
    }

    #[test]
    fn test_triangulate_face_keeps_winding() {
        let poly = cube(0.0, 1.0);
        for f in 0..poly.faces().len() {
            let face = poly.face(f).unwrap();
            let triangles = poly.triangulate_face(f).unwrap();
            assert_eq!(triangles.len(), 2);
            for tri in triangles {
                let [a, b, c] = tri.map(|v| *poly.position(v));
                let normal = (b - a).cross(&(c - a)).normalize();
                assert_relative_eq!(normal.dot(&face.plane.normal), 1.0, epsilon = 1e-9);
            }
        }
    }
}
