// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Error taxonomy for the CSG core
//!
//! Each failure domain has its own enum so callers can match on exactly the
//! failures an operation can produce. [`Error`] folds them together for code
//! that drives several stages at once.

use thiserror::Error;

/// Coincident, zero-length or non-finite geometry beyond tolerance.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DegenerateInputError {
    #[error("coordinate {index} is not finite")]
    NonFinite { index: usize },

    #[error("{what} has zero area")]
    ZeroArea { what: String },

    #[error("face {face} has a zero-length normal")]
    ZeroLengthNormal { face: usize },
}

/// Malformed vertex/face soup.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TopologyError {
    #[error("face {face} references vertex {vertex}, but only {count} vertices exist")]
    VertexOutOfRange {
        face: usize,
        vertex: usize,
        count: usize,
    },

    #[error("face {face} has {corners} corners; at least 3 are required")]
    DegenerateFace { face: usize, corners: usize },

    #[error("face {face} has a dangling edge at vertex {vertex}")]
    DanglingEdge { face: usize, vertex: usize },

    #[error("edge ({v1}, {v2}) has {faces} incident faces")]
    NonManifoldEdge { v1: usize, v2: usize, faces: usize },

    #[error("corner {corner} of face {face} resolves to {matches} edges")]
    AmbiguousCorner {
        face: usize,
        corner: usize,
        matches: usize,
    },

    #[error(transparent)]
    Degenerate(#[from] DegenerateInputError),
}

/// Point classification and manifold nesting failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClassificationError {
    #[error("no non-degenerate ray direction found after {attempts} attempts")]
    RayAttemptsExhausted { attempts: usize },

    #[error("no unambiguous probe point exists for manifold {manifold}")]
    NoProbePoint { manifold: usize },

    #[error("manifold nesting cannot make progress; pending manifolds {pending:?}")]
    EmbeddingStalled { pending: Vec<usize> },
}

/// Hole bridging failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BridgeError {
    #[error("no valid attachment point for hole loop {hole}")]
    NoAttachment { hole: usize },

    #[error("{count} outer loops in one batch; only a single outer loop is supported")]
    MultipleOuterLoops { count: usize },

    #[error("no outer loop among {count} loops")]
    NoOuterLoop { count: usize },

    #[error("loop index {index} is out of range")]
    InvalidLoopIndex { index: usize },

    #[error(transparent)]
    Degenerate(#[from] DegenerateInputError),
}

/// Triangulation failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TriangulationError {
    #[error("no valid diagonal in a loop of {remaining} vertices")]
    NoDiagonal { remaining: usize },

    #[error("face {face} is out of range; the polyhedron has {count} faces")]
    FaceOutOfRange { face: usize, count: usize },

    #[error(transparent)]
    Degenerate(#[from] DegenerateInputError),
}

/// Any error produced by the crate.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("topology error: {0}")]
    Topology(#[from] TopologyError),

    #[error("classification error: {0}")]
    Classification(#[from] ClassificationError),

    #[error("bridge error: {0}")]
    Bridge(#[from] BridgeError),

    #[error("triangulation error: {0}")]
    Triangulation(#[from] TriangulationError),

    #[error("degenerate input: {0}")]
    DegenerateInput(#[from] DegenerateInputError),
}

/// Result type for operations that span several stages.
pub type Result<T> = std::result::Result<T, Error>;
