// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Manifold nesting: which solids sit inside which

use super::{PointClass, PointClassifier, Polyhedron};
use crate::error::ClassificationError;
use crate::geometry::predicates;
use log::{debug, trace};
use nalgebra::Point3;
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Immediate container of a manifold
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Parent {
    /// Outside every manifold
    Root,
    Manifold(usize),
}

/// Parent of every manifold, forming a forest under [`Parent::Root`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NestingForest {
    parents: BTreeMap<usize, Parent>,
}

impl NestingForest {
    pub fn parent(&self, manifold: usize) -> Option<Parent> {
        self.parents.get(&manifold).copied()
    }

    /// Manifolds directly inside `parent`, ascending
    pub fn children(&self, parent: Parent) -> Vec<usize> {
        self.parents
            .iter()
            .filter(|(_, &p)| p == parent)
            .map(|(&m, _)| m)
            .collect()
    }

    pub fn roots(&self) -> Vec<usize> {
        self.children(Parent::Root)
    }

    /// Containing manifolds from the immediate parent outwards
    pub fn ancestors(&self, manifold: usize) -> Vec<usize> {
        let mut result = Vec::new();
        let mut current = self.parent(manifold);
        while let Some(Parent::Manifold(m)) = current {
            result.push(m);
            current = self.parent(m);
        }
        result
    }

    /// Nesting depth; 0 for manifolds directly under the root
    pub fn depth(&self, manifold: usize) -> Option<usize> {
        self.parents
            .contains_key(&manifold)
            .then(|| self.ancestors(manifold).len())
    }

    pub fn len(&self) -> usize {
        self.parents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, Parent)> + '_ {
        self.parents.iter().map(|(&m, &p)| (m, p))
    }
}

/// Computes a [`NestingForest`] by probing each manifold with the point classifier
pub struct ManifoldEmbedding<'a, R: Rng = StdRng> {
    classifier: PointClassifier<'a, R>,
}

impl<'a> ManifoldEmbedding<'a, StdRng> {
    pub fn new(poly: &'a Polyhedron) -> Self {
        Self {
            classifier: PointClassifier::new(poly),
        }
    }
}

impl<'a, R: Rng> ManifoldEmbedding<'a, R> {
    pub fn with_classifier(classifier: PointClassifier<'a, R>) -> Self {
        Self { classifier }
    }

    pub fn compute(mut self) -> Result<NestingForest, ClassificationError> {
        let poly = self.classifier.polyhedron();

        let mut pending: BTreeMap<usize, BTreeSet<Parent>> = BTreeMap::new();
        for manifold in 0..poly.manifold_count() {
            pending.insert(manifold, self.containers(manifold)?);
        }

        let mut forest = NestingForest::default();
        let mut confirmed: BTreeSet<Parent> = BTreeSet::new();
        let mut frontier: BTreeSet<Parent> = BTreeSet::from([Parent::Root]);

        while !pending.is_empty() {
            let mut peeled = BTreeSet::new();
            for (&manifold, containers) in &pending {
                let mut remaining = containers.difference(&confirmed);
                if let (Some(&parent), None) = (remaining.next(), remaining.next()) {
                    if frontier.contains(&parent) {
                        forest.parents.insert(manifold, parent);
                        peeled.insert(Parent::Manifold(manifold));
                    }
                }
            }

            if peeled.is_empty() {
                return Err(ClassificationError::EmbeddingStalled {
                    pending: pending.keys().copied().collect(),
                });
            }

            pending.retain(|&m, _| !peeled.contains(&Parent::Manifold(m)));
            confirmed.extend(frontier);
            frontier = peeled;
        }

        debug!("manifold nesting: {:?}", forest.parents);
        Ok(forest)
    }

    /// Root plus every other manifold containing `manifold`, judged from the
    /// first probe point no other manifold passes through
    fn containers(&mut self, manifold: usize) -> Result<BTreeSet<Parent>, ClassificationError> {
        for probe in self.probe_points(manifold) {
            let classes = self.classifier.classify_against_all(&probe, true)?;

            let ambiguous = classes
                .iter()
                .any(|(&m, &class)| m != manifold && class == PointClass::On);
            if ambiguous {
                trace!("probe {:?} for manifold {} touches another manifold", probe, manifold);
                continue;
            }

            let mut containers = BTreeSet::from([Parent::Root]);
            containers.extend(
                classes
                    .into_iter()
                    .filter(|&(m, class)| m != manifold && class == PointClass::In)
                    .map(|(m, _)| Parent::Manifold(m)),
            );
            return Ok(containers);
        }

        Err(ClassificationError::NoProbePoint { manifold })
    }

    /// Candidate probes in increasing cost: private vertices, midpoints of
    /// private edges, then face interior points
    fn probe_points(&self, manifold: usize) -> Vec<Point3<f64>> {
        let poly = self.classifier.polyhedron();

        let mut probes = Vec::new();

        for (v, vertex) in poly.vertices.iter().enumerate() {
            if owned_by(poly, manifold, poly.vertex_faces(v).iter().copied()) {
                probes.push(vertex.position);
            }
        }

        for (e, edge) in poly.edges.iter().enumerate() {
            if owned_by(poly, manifold, poly.edge_faces(e).iter().flatten().copied()) {
                probes.push(nalgebra::center(poly.position(edge.v1), poly.position(edge.v2)));
            }
        }

        for f in poly.manifold_faces(manifold) {
            let face = &poly.faces[f];
            if let Some(interior) = predicates::interior_point(face.loop_2d()) {
                probes.push(face.projection().unproject(&interior));
            }
        }

        probes
    }
}

/// Whether `faces` is non-empty and entirely within `manifold`
fn owned_by(poly: &Polyhedron, manifold: usize, faces: impl IntoIterator<Item = usize>) -> bool {
    let mut any = false;
    for f in faces {
        if poly.faces[f].manifold_id != manifold {
            return false;
        }
        any = true;
    }
    any
}
