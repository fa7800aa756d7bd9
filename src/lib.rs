//! Golden reference fixtures for tensor operations.
//!
//! `tensorref` samples random inputs, applies one tensor operation to them
//! and writes every tensor a downstream test suite needs (inputs,
//! intermediates and outputs) as a NumPy `.npy` file. Fixture names are
//! load-bearing: consumers locate them by exact name.
//!
//! ```no_run
//! use tensorref::{
//!     config::GeneratorConfig,
//!     generator::{FixtureSet, Generator},
//! };
//!
//! let config = GeneratorConfig::default().with_seed(0);
//! let mut generator = Generator::new(config);
//! let written = generator.run_configured(&FixtureSet::default_batch())?;
//! println!("{written} fixtures");
//! # Ok::<(), tensorref::error::FixtureError>(())
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod fixture;
pub mod generator;
pub mod logging;
pub mod pattern;
pub mod random;
pub mod tensor;
