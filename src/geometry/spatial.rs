// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Bounding volume hierarchies over faces and edges
//!
//! Queries are exact at the box level: an item is returned when its own box
//! meets the query region. Callers run exact geometric tests on the results.

use super::BoundingBox;
use nalgebra::Point3;

/// BVH node
#[derive(Debug, Clone)]
pub struct BvhNode {
    /// Bounding box of this node
    pub bbox: BoundingBox,
    /// Left child (None for leaf)
    pub left: Option<Box<BvhNode>>,
    /// Right child (None for leaf)
    pub right: Option<Box<BvhNode>>,
    /// Items and their boxes (only for leaf nodes)
    pub items: Vec<(usize, BoundingBox)>,
}

impl BvhNode {
    fn leaf(bbox: BoundingBox, items: Vec<(usize, BoundingBox)>) -> Self {
        Self {
            bbox,
            left: None,
            right: None,
            items,
        }
    }

    fn internal(bbox: BoundingBox, left: Box<BvhNode>, right: Box<BvhNode>) -> Self {
        Self {
            bbox,
            left: Some(left),
            right: Some(right),
            items: Vec::new(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }
}

/// Bounding volume hierarchy over indexed boxes
#[derive(Debug, Clone)]
pub struct Bvh {
    root: BvhNode,
}

impl Bvh {
    const MAX_DEPTH: usize = 32;
    const LEAF_SIZE: usize = 4;

    /// Build from `(item_index, bbox)` pairs
    pub fn build(items: Vec<(usize, BoundingBox)>) -> Self {
        if items.is_empty() {
            return Self {
                root: BvhNode::leaf(BoundingBox::empty(), Vec::new()),
            };
        }

        Self {
            root: Self::build_recursive(items, 0),
        }
    }

    fn build_recursive(mut items: Vec<(usize, BoundingBox)>, depth: usize) -> BvhNode {
        let bbox = items
            .iter()
            .fold(BoundingBox::empty(), |acc, (_, b)| acc.union(b));

        if items.len() <= Self::LEAF_SIZE || depth >= Self::MAX_DEPTH {
            return BvhNode::leaf(bbox, items);
        }

        // Split along the longest axis at the median centre
        let axis = bbox.size().imax();
        items.sort_by(|(_, a), (_, b)| a.center()[axis].total_cmp(&b.center()[axis]));

        let right_items = items.split_off(items.len() / 2);
        let left = Box::new(Self::build_recursive(items, depth + 1));
        let right = Box::new(Self::build_recursive(right_items, depth + 1));

        BvhNode::internal(bbox, left, right)
    }

    /// Items whose boxes intersect `bbox`
    pub fn query_box(&self, bbox: &BoundingBox) -> Vec<usize> {
        let mut result = Vec::new();
        Self::query_recursive(&self.root, &|node| node.intersects(bbox), &mut result);
        result
    }

    /// Items whose boxes (grown by `tolerance`) are crossed by segment `a`-`b`
    pub fn query_segment(&self, a: &Point3<f64>, b: &Point3<f64>, tolerance: f64) -> Vec<usize> {
        let mut result = Vec::new();
        Self::query_recursive(
            &self.root,
            &|node| node.intersects_segment(a, b, tolerance),
            &mut result,
        );
        result
    }

    fn query_recursive(
        node: &BvhNode,
        hit: &dyn Fn(&BoundingBox) -> bool,
        result: &mut Vec<usize>,
    ) {
        if node.bbox.is_empty() || !hit(&node.bbox) {
            return;
        }

        if node.is_leaf() {
            result.extend(
                node.items
                    .iter()
                    .filter(|(_, item_box)| hit(item_box))
                    .map(|(idx, _)| *idx),
            );
            return;
        }
        if let Some(ref left) = node.left {
            Self::query_recursive(left, hit, result);
        }
        if let Some(ref right) = node.right {
            Self::query_recursive(right, hit, result);
        }
    }

    pub fn root(&self) -> &BvhNode {
        &self.root
    }
}

/// Face and edge hierarchies of a polyhedron.
///
/// Item boxes are grown by the tolerance at build time so that grazing
/// queries still see the item.
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    faces: Bvh,
    edges: Bvh,
    tolerance: f64,
}

impl SpatialIndex {
    pub fn build(face_boxes: &[BoundingBox], edge_boxes: &[BoundingBox], tolerance: f64) -> Self {
        let grow = |boxes: &[BoundingBox]| {
            boxes
                .iter()
                .enumerate()
                .map(|(i, b)| (i, b.expanded(tolerance)))
                .collect::<Vec<_>>()
        };

        Self {
            faces: Bvh::build(grow(face_boxes)),
            edges: Bvh::build(grow(edge_boxes)),
            tolerance,
        }
    }

    pub fn find_faces_near_box(&self, bbox: &BoundingBox) -> Vec<usize> {
        self.faces.query_box(bbox)
    }

    pub fn find_faces_near_segment(&self, a: &Point3<f64>, b: &Point3<f64>) -> Vec<usize> {
        self.faces.query_segment(a, b, self.tolerance)
    }

    pub fn find_faces_near_point(&self, point: &Point3<f64>) -> Vec<usize> {
        self.find_faces_near_box(&BoundingBox::new(*point, *point))
    }

    pub fn find_edges_near_segment(&self, a: &Point3<f64>, b: &Point3<f64>) -> Vec<usize> {
        self.edges.query_segment(a, b, self.tolerance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_boxes(count: usize) -> Vec<BoundingBox> {
        (0..count)
            .map(|i| {
                let x = i as f64 * 2.0;
                BoundingBox::new(Point3::new(x, 0.0, 0.0), Point3::new(x + 1.0, 1.0, 1.0))
            })
            .collect()
    }

    #[test]
    fn test_bvh_splits_large_sets() {
        let items: Vec<_> = unit_boxes(20).into_iter().enumerate().collect();
        let bvh = Bvh::build(items);
        assert!(!bvh.root().is_leaf());
    }

    #[test]
    fn test_box_query_matches_brute_force() {
        let boxes = unit_boxes(20);
        let bvh = Bvh::build(boxes.iter().cloned().enumerate().collect());

        let query = BoundingBox::new(Point3::new(5.5, 0.5, 0.5), Point3::new(12.5, 0.6, 0.6));
        let mut found = bvh.query_box(&query);
        found.sort_unstable();

        let expected: Vec<usize> = boxes
            .iter()
            .enumerate()
            .filter(|(_, b)| b.intersects(&query))
            .map(|(i, _)| i)
            .collect();
        assert_eq!(found, expected);
        assert_eq!(found, vec![3, 4, 5, 6]);
    }

    #[test]
    fn test_leaf_items_are_filtered_individually() {
        // Few enough boxes for a single leaf whose union spans the gap
        let boxes = unit_boxes(3);
        let bvh = Bvh::build(boxes.iter().cloned().enumerate().collect());
        assert!(bvh.root().is_leaf());

        let gap = BoundingBox::new(Point3::new(1.25, 0.25, 0.25), Point3::new(1.75, 0.75, 0.75));
        assert!(bvh.root().bbox.intersects(&gap));
        assert!(bvh.query_box(&gap).is_empty());
        assert!(bvh
            .query_segment(&Point3::new(1.5, 0.5, -1.0), &Point3::new(1.5, 0.5, 2.0), 0.0)
            .is_empty());
        assert_eq!(
            bvh.query_segment(&Point3::new(-1.0, 0.5, 0.5), &Point3::new(6.0, 0.5, 0.5), 0.0),
            vec![0, 1, 2]
        );
    }

    #[test]
    fn test_segment_query() {
        let boxes = unit_boxes(10);
        let index = SpatialIndex::build(&boxes, &[], 1e-9);

        let mut hits = index.find_faces_near_segment(
            &Point3::new(4.5, 0.5, -1.0),
            &Point3::new(4.5, 0.5, 2.0),
        );
        hits.sort_unstable();
        assert_eq!(hits, vec![2]);

        assert!(index
            .find_edges_near_segment(&Point3::new(0.0, 0.0, 0.0), &Point3::new(1.0, 1.0, 1.0))
            .is_empty());
        assert_eq!(index.find_faces_near_point(&Point3::new(0.5, 0.5, 0.5)), vec![0]);
    }
}
