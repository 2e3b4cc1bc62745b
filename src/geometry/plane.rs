// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Plane equations and planar projection of face loops

use nalgebra::{Point2, Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Plane `normal · p + offset = 0` with a unit normal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    pub normal: Vector3<f64>,
    pub offset: f64,
}

impl Plane {
    pub fn new(normal: Vector3<f64>, offset: f64) -> Self {
        Self { normal, offset }
    }

    /// Fit a plane to a polygon loop using Newell's method.
    ///
    /// The normal follows the right-hand rule over the loop order. Returns
    /// `None` when the loop has no area.
    pub fn from_loop(points: &[Point3<f64>]) -> Option<Self> {
        if points.len() < 3 {
            return None;
        }

        let mut normal = Vector3::<f64>::zeros();
        let mut centroid = Vector3::<f64>::zeros();
        for (i, current) in points.iter().enumerate() {
            let next = &points[(i + 1) % points.len()];
            normal.x += (current.y - next.y) * (current.z + next.z);
            normal.y += (current.z - next.z) * (current.x + next.x);
            normal.z += (current.x - next.x) * (current.y + next.y);
            centroid += current.coords;
        }

        let length = normal.norm();
        if length <= f64::MIN_POSITIVE || !length.is_finite() {
            return None;
        }
        let normal = normal / length;
        let centroid = centroid / points.len() as f64;

        Some(Self::new(normal, -normal.dot(&centroid)))
    }

    /// Signed distance; positive on the side the normal points to
    pub fn signed_distance(&self, point: &Point3<f64>) -> f64 {
        self.normal.dot(&point.coords) + self.offset
    }

    pub fn flipped(&self) -> Self {
        Self::new(-self.normal, -self.offset)
    }

    /// Axis along which the normal has its largest component
    pub fn dominant_axis(&self) -> usize {
        self.normal.iamax()
    }

    pub fn projection(&self) -> Projection {
        Projection::new(self)
    }
}

/// Drops the plane's dominant axis to map 3D points into 2D and back.
///
/// The remaining two axes keep cyclic order, so loops keep their winding when
/// the normal's dominant component is positive and reverse it otherwise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    plane: Plane,
    axis: usize,
}

impl Projection {
    pub fn new(plane: &Plane) -> Self {
        Self {
            plane: *plane,
            axis: plane.dominant_axis(),
        }
    }

    fn axes(&self) -> (usize, usize) {
        ((self.axis + 1) % 3, (self.axis + 2) % 3)
    }

    pub fn project(&self, point: &Point3<f64>) -> Point2<f64> {
        let (u, v) = self.axes();
        Point2::new(point[u], point[v])
    }

    /// Lift a 2D point back onto the plane
    pub fn unproject(&self, point: &Point2<f64>) -> Point3<f64> {
        let (u, v) = self.axes();
        let n = &self.plane.normal;
        let w = -(self.plane.offset + n[u] * point.x + n[v] * point.y) / n[self.axis];

        let mut result = Point3::origin();
        result[u] = point.x;
        result[v] = point.y;
        result[self.axis] = w;
        result
    }

    /// Whether projected loops keep their 3D winding
    pub fn preserves_winding(&self) -> bool {
        self.plane.normal[self.axis] > 0.0
    }
}
