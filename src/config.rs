//! Generator configuration.

use core::{fmt, str::FromStr};
use std::{env, path::PathBuf};

use log::warn;

use crate::error::ConfigError;

/// Environment variable overriding [`GeneratorConfig::output_directory`].
pub const OUTPUT_DIR_VAR: &str = "TENSORREF_OUTPUT_DIR";
/// Environment variable overriding [`GeneratorConfig::default_dtype`].
pub const DTYPE_VAR: &str = "TENSORREF_DTYPE";
/// Environment variable overriding [`GeneratorConfig::seed`].
pub const SEED_VAR: &str = "TENSORREF_SEED";

/// Element type of generated value tensors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Dtype {
    #[default]
    Float32,
    Float64,
}

impl fmt::Display for Dtype {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Float32 => f.write_str("float32"),
            Self::Float64 => f.write_str("float64"),
        }
    }
}

impl FromStr for Dtype {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "float32" | "f32" => Ok(Self::Float32),
            "float64" | "f64" => Ok(Self::Float64),
            other => Err(ConfigError::UnsupportedDtype(other.to_owned())),
        }
    }
}

/// Everything a batch run needs besides the jobs themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Directory the fixtures are written to.
    pub output_directory: PathBuf,
    /// Element type used for value tensors.
    pub default_dtype: Dtype,
    /// Seed for the random inputs; `None` draws from system entropy.
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    #[inline]
    fn default() -> Self {
        Self {
            output_directory: PathBuf::from("data"),
            default_dtype: Dtype::default(),
            seed: None,
        }
    }
}

impl GeneratorConfig {
    /// Starts from [`GeneratorConfig::default`] and applies whichever of
    /// [`OUTPUT_DIR_VAR`], [`DTYPE_VAR`] and [`SEED_VAR`] are set. Values
    /// that do not parse are ignored with a warning.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(dir) = env::var_os(OUTPUT_DIR_VAR) {
            config.output_directory = PathBuf::from(dir);
        }
        if let Ok(value) = env::var(DTYPE_VAR) {
            match value.parse() {
                Ok(dtype) => config.default_dtype = dtype,
                Err(err) => warn!("ignoring {DTYPE_VAR}: {err}"),
            }
        }
        if let Ok(value) = env::var(SEED_VAR) {
            match value.parse() {
                Ok(seed) => config.seed = Some(seed),
                Err(err) => warn!("ignoring {SEED_VAR}={value}: {err}"),
            }
        }

        config
    }

    #[inline]
    #[must_use]
    pub fn with_output_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_directory = dir.into();
        self
    }

    #[inline]
    #[must_use]
    pub const fn with_dtype(mut self, dtype: Dtype) -> Self {
        self.default_dtype = dtype;
        self
    }

    #[inline]
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}
