//! Runner configuration
//!
//! Defaults compare every implementation the host supports against the scalar
//! reference, in parallel, with a fixed input seed. Each setting can be
//! overridden from the environment:
//!
//! | variable                 | meaning                                   |
//! |--------------------------|-------------------------------------------|
//! | `SIMD_PARITY_REFERENCE`  | reference implementation, e.g. `scalar`   |
//! | `SIMD_PARITY_ARCHS`      | comma separated list, e.g. `scalar,avx2`  |
//! | `SIMD_PARITY_SEQUENTIAL` | `1` or `true` disables parallel execution |
//! | `SIMD_PARITY_SEED`       | seed for generated inputs                 |

use crate::arch::Arch;
use crate::error::{ParityError, Result};

/// Seed used when none is configured
pub const DEFAULT_SEED: u64 = 42;

pub const ENV_REFERENCE: &str = "SIMD_PARITY_REFERENCE";
pub const ENV_ARCHS: &str = "SIMD_PARITY_ARCHS";
pub const ENV_SEQUENTIAL: &str = "SIMD_PARITY_SEQUENTIAL";
pub const ENV_SEED: &str = "SIMD_PARITY_SEED";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParityConfig {
    /// Implementation every other one is compared against
    pub reference: Arch,
    /// Implementations to execute, the reference included
    pub archs: Vec<Arch>,
    /// Execute implementations on the rayon pool
    pub parallel: bool,
    pub seed: u64,
}

impl Default for ParityConfig {
    fn default() -> Self {
        Self {
            reference: Arch::Scalar,
            archs: Arch::available(),
            parallel: true,
            seed: DEFAULT_SEED,
        }
    }
}

impl ParityConfig {
    /// Defaults overridden by the `SIMD_PARITY_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(ENV_REFERENCE) {
            config.reference = value.parse()?;
        }
        if let Some(value) = lookup(ENV_ARCHS) {
            config.archs = value
                .split(',')
                .filter(|name| !name.trim().is_empty())
                .map(|name| name.parse::<Arch>())
                .collect::<Result<Vec<Arch>>>()?;
        }
        if let Some(value) = lookup(ENV_SEQUENTIAL) {
            config.parallel = !parse_flag(ENV_SEQUENTIAL, &value)?;
        }
        if let Some(value) = lookup(ENV_SEED) {
            config.seed = value.trim().parse().map_err(|_| {
                ParityError::InvalidConfig(format!("{} is not a u64: {:?}", ENV_SEED, value))
            })?;
        }

        tracing::debug!(?config, "loaded configuration");
        Ok(config)
    }

    pub fn with_reference(mut self, reference: Arch) -> Self {
        self.reference = reference;
        self
    }

    pub fn with_archs(mut self, archs: impl IntoIterator<Item = Arch>) -> Self {
        self.archs = archs.into_iter().collect();
        self
    }

    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Checks that the configuration can run on this host
    pub fn validate(&self) -> Result<()> {
        if self.archs.is_empty() {
            return Err(ParityError::InvalidConfig(
                "no implementations selected".to_string(),
            ));
        }
        if !self.archs.contains(&self.reference) {
            return Err(ParityError::InvalidConfig(format!(
                "reference {} is not among the selected implementations",
                self.reference
            )));
        }
        if let Some(&arch) = self.archs.iter().find(|a| !a.is_supported()) {
            return Err(ParityError::UnsupportedArch(arch));
        }
        Ok(())
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" | "" => Ok(false),
        _ => Err(ParityError::InvalidConfig(format!(
            "{} expects a boolean, got {:?}",
            key, value
        ))),
    }
}
