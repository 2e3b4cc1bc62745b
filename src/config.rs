// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Kernel configuration: tolerances, ray retry budget and triangulation quality knobs

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file looked up by [`KernelConfig::load`]
pub const CONFIG_FILE: &str = "polycsg.toml";

/// Kernel configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    /// Tolerance for on-face, coplanarity and degeneracy tests
    pub epsilon: f64,
    /// Maximum number of random ray directions tried per classification
    pub max_ray_attempts: usize,
    /// Seed of the ray-direction generator
    pub ray_seed: u64,
    /// Score above which ear clipping continues greedily from a neighbour
    pub ear_quality_threshold: f64,
    /// Weight given to the better neighbouring ear when scoring a vertex
    pub lookahead_weight: f64,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            epsilon: 1e-8,
            max_ray_attempts: 64,
            ray_seed: 0x5eed_c0de,
            ear_quality_threshold: 0.25,
            lookahead_weight: 0.2,
        }
    }
}

impl KernelConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config: KernelConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides
    pub fn load() -> Result<Self> {
        let mut config = if PathBuf::from(CONFIG_FILE).exists() {
            Self::from_file(CONFIG_FILE)?
        } else {
            Self::default()
        };

        if let Ok(epsilon) = std::env::var("POLYCSG_EPSILON") {
            config.epsilon = epsilon
                .parse()
                .with_context(|| format!("Invalid POLYCSG_EPSILON: {}", epsilon))?;
        }

        if let Ok(attempts) = std::env::var("POLYCSG_MAX_RAY_ATTEMPTS") {
            config.max_ray_attempts = attempts
                .parse()
                .with_context(|| format!("Invalid POLYCSG_MAX_RAY_ATTEMPTS: {}", attempts))?;
        }

        if let Ok(seed) = std::env::var("POLYCSG_RAY_SEED") {
            config.ray_seed = seed
                .parse()
                .with_context(|| format!("Invalid POLYCSG_RAY_SEED: {}", seed))?;
        }

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))?;
        Ok(())
    }
}
