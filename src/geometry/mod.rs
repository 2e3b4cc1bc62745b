// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry primitives - bounding boxes, planes, 2D predicates and spatial indexing

mod bbox;
mod plane;
pub mod predicates;
mod spatial;

pub use bbox::BoundingBox;
pub use plane::{Plane, Projection};
pub use predicates::Containment;
pub use spatial::{Bvh, BvhNode, SpatialIndex};
