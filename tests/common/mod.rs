// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Shared mesh generators for integration tests

#![allow(dead_code)]

use nalgebra::Point3;
use std::f64::consts::PI;

pub type Soup = (Vec<Point3<f64>>, Vec<Vec<usize>>);

/// Axis-aligned cube with outward-facing quads
pub fn cube(min: f64, max: f64) -> Soup {
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

/// Latitude/longitude sphere: triangle fans at the poles, quads elsewhere
pub fn uv_sphere(radius: f64, stacks: usize, slices: usize) -> Soup {
    let mut positions = vec![Point3::new(0.0, 0.0, radius)];
    for i in 1..stacks {
        let theta = PI * i as f64 / stacks as f64;
        for j in 0..slices {
            let phi = 2.0 * PI * j as f64 / slices as f64;
            positions.push(Point3::new(
                radius * theta.sin() * phi.cos(),
                radius * theta.sin() * phi.sin(),
                radius * theta.cos(),
            ));
        }
    }
    positions.push(Point3::new(0.0, 0.0, -radius));
    let south = positions.len() - 1;

    let ring = |i: usize, j: usize| 1 + (i - 1) * slices + j % slices;

    let mut faces = Vec::new();
    for j in 0..slices {
        faces.push(vec![0, ring(1, j), ring(1, j + 1)]);
    }
    for i in 1..stacks - 1 {
        for j in 0..slices {
            faces.push(vec![ring(i, j), ring(i + 1, j), ring(i + 1, j + 1), ring(i, j + 1)]);
        }
    }
    for j in 0..slices {
        faces.push(vec![south, ring(stacks - 1, j + 1), ring(stacks - 1, j)]);
    }

    (positions, faces)
}

/// Concatenate soups, offsetting face indices
pub fn combine(soups: Vec<Soup>) -> Soup {
    let mut positions = Vec::new();
    let mut faces = Vec::new();
    for (p, f) in soups {
        let offset = positions.len();
        positions.extend(p);
        faces.extend(
            f.into_iter()
                .map(|face| face.into_iter().map(|v| v + offset).collect::<Vec<_>>()),
        );
    }
    (positions, faces)
}
