// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Ray-cast point classification against closed manifolds
//!
//! A ray direction is only used when every face it meets is crossed cleanly
//! through its interior. Rays that graze an edge, a vertex or a face plane
//! are thrown away and a new random direction is drawn, so the parity count
//! never has to decide how to treat a touching hit.

use super::{FaceHit, PointClass, Polyhedron};
use crate::error::ClassificationError;
use ahash::AHashMap;
use log::{trace, warn};
use nalgebra::{Point3, Vector3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{BTreeMap, BTreeSet};

/// One clean crossing of a ray through a face
#[derive(Debug, Clone, Copy)]
struct Crossing {
    manifold: usize,
    t: f64,
    /// Ray leaves the manifold's solid side here
    exiting: bool,
}

/// Classifies points against a polyhedron's closed manifolds
pub struct PointClassifier<'a, R: Rng = StdRng> {
    poly: &'a Polyhedron,
    rng: R,
}

impl<'a> PointClassifier<'a, StdRng> {
    /// Classifier seeded from the polyhedron's configuration
    pub fn new(poly: &'a Polyhedron) -> Self {
        Self::with_rng(poly, StdRng::seed_from_u64(poly.config.ray_seed))
    }
}

impl<'a, R: Rng> PointClassifier<'a, R> {
    pub fn with_rng(poly: &'a Polyhedron, rng: R) -> Self {
        Self { poly, rng }
    }

    pub fn polyhedron(&self) -> &'a Polyhedron {
        self.poly
    }

    /// Classify `point` against every closed manifold.
    ///
    /// Manifolds the point lies on are reported [`PointClass::On`]; the rest
    /// are decided by crossing parity along one shared ray. Unless
    /// `ignore_orientation` is set, results for negative manifolds are
    /// inverted.
    pub fn classify_against_all(
        &mut self,
        point: &Point3<f64>,
        ignore_orientation: bool,
    ) -> Result<BTreeMap<usize, PointClass>, ClassificationError> {
        let poly = self.poly;
        let mut result = BTreeMap::new();

        let on = self.manifolds_on(point, |m| poly.is_closed(m));
        for &m in &on {
            result.insert(m, PointClass::On);
        }

        let pending: BTreeSet<usize> = (0..poly.manifold_count())
            .filter(|&m| poly.is_closed(m) && !on.contains(&m))
            .collect();
        if pending.is_empty() {
            return Ok(result);
        }

        let crossings = self.cast(point, |m| pending.contains(&m))?;
        let mut counts: AHashMap<usize, usize> = AHashMap::new();
        for crossing in &crossings {
            *counts.entry(crossing.manifold).or_insert(0) += 1;
        }

        for m in pending {
            let mut class = if counts.get(&m).copied().unwrap_or(0) % 2 == 1 {
                PointClass::In
            } else {
                PointClass::Out
            };
            if !ignore_orientation && poly.is_negative(m) {
                class = class.inverted();
            }
            result.insert(m, class);
        }

        Ok(result)
    }

    /// Classify `point` against the union of the selected closed manifolds.
    ///
    /// With `even_odd` the total crossing parity decides. Otherwise the
    /// nearest crossing decides: leaving a solid means the point is inside.
    pub fn classify_point(
        &mut self,
        point: &Point3<f64>,
        manifold_filter: Option<&[usize]>,
        even_odd: bool,
    ) -> Result<PointClass, ClassificationError> {
        let poly = self.poly;
        let eps = poly.config.epsilon;

        if !poly.aabb.contains_point(point, eps) {
            // Only valid for a lone inverted solid
            if poly.manifold_count() == 1 && poly.is_negative(0) {
                return Ok(PointClass::In);
            }
            return Ok(PointClass::Out);
        }

        let accept = |m: usize| poly.is_closed(m) && manifold_filter.map_or(true, |f| f.contains(&m));

        if !self.manifolds_on(point, accept).is_empty() {
            return Ok(PointClass::On);
        }

        let mut crossings = self.cast(point, accept)?;

        if even_odd {
            return Ok(if crossings.len() % 2 == 1 {
                PointClass::In
            } else {
                PointClass::Out
            });
        }

        crossings.sort_by(|a, b| a.t.total_cmp(&b.t));
        let mut running: AHashMap<usize, i32> = AHashMap::new();
        for crossing in &crossings {
            let count = running.entry(crossing.manifold).or_insert(0);
            *count += if crossing.exiting { -1 } else { 1 };
            if *count < 0 {
                return Ok(PointClass::In);
            }
            if *count > 0 {
                return Ok(PointClass::Out);
            }
        }

        Ok(PointClass::Out)
    }

    /// Manifolds with a face passing through `point`
    fn manifolds_on(&self, point: &Point3<f64>, accept: impl Fn(usize) -> bool) -> BTreeSet<usize> {
        let poly = self.poly;
        poly.index
            .find_faces_near_point(point)
            .into_iter()
            .filter(|&f| accept(poly.faces[f].manifold_id))
            .filter(|&f| poly.face_contains_point(f, point))
            .map(|f| poly.faces[f].manifold_id)
            .collect()
    }

    fn random_direction(&mut self) -> Vector3<f64> {
        loop {
            let v = Vector3::new(
                self.rng.gen_range(-1.0..1.0),
                self.rng.gen_range(-1.0..1.0),
                self.rng.gen_range(-1.0..1.0),
            );
            let length = v.norm();
            if length > 0.1 && length <= 1.0 {
                return v / length;
            }
        }
    }

    /// Cast random rays from `point` until one meets the accepted faces
    /// cleanly, returning its crossings
    fn cast(
        &mut self,
        point: &Point3<f64>,
        accept: impl Fn(usize) -> bool,
    ) -> Result<Vec<Crossing>, ClassificationError> {
        let poly = self.poly;
        let length = 2.0 * poly.aabb.diagonal() + (point - poly.aabb.center()).norm();
        let attempts = poly.config.max_ray_attempts;

        'rays: for attempt in 0..attempts {
            let direction = self.random_direction();
            let end = point + direction * length;
            for e in poly.index.find_edges_near_segment(point, &end) {
                let accepted = poly.edge_manifold(e).map_or(false, &accept);
                if accepted && poly.segment_grazes_edge(e, point, &end) {
                    trace!("ray attempt {} grazes edge {}, retrying", attempt, e);
                    continue 'rays;
                }
            }

            let mut crossings = Vec::new();
            for f in poly.index.find_faces_near_segment(point, &end) {
                let face = &poly.faces[f];
                if !accept(face.manifold_id) {
                    continue;
                }

                match poly.face_segment_intersection(f, point, &end) {
                    FaceHit::Miss => {}
                    FaceHit::Hit { t, .. } => crossings.push(Crossing {
                        manifold: face.manifold_id,
                        t,
                        exiting: direction.dot(&face.plane.normal) > 0.0,
                    }),
                    FaceHit::Degenerate => {
                        trace!("ray attempt {} grazes face {}, retrying", attempt, f);
                        continue 'rays;
                    }
                }
            }

            return Ok(crossings);
        }

        warn!(
            "no clean ray from ({}, {}, {}) after {} attempts",
            point.x, point.y, point.z, attempts
        );
        Err(ClassificationError::RayAttemptsExhausted { attempts })
    }
}
