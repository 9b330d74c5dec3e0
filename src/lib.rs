//! Differential testing of scalar and SIMD implementations of the same
//! vector kernels.
//!
//! Test code runs once per implementation ([`Arch`]) and records every output
//! vector into a [`TestResultsSet`]. The sets are then compared pairwise with
//! [`test_equal`]: integers must match bit for bit, floating-point values
//! within the ULP and signed-zero tolerance recorded with each result.
//! Verdicts are tallied in a [`SeqTestSuite`].
//!
//! ```no_run
//! use simd_parity::{cases, ParityConfig, ParityRunner};
//!
//! let config = ParityConfig::from_env()?;
//! let mut runner = ParityRunner::new(config.clone())?;
//! let suite = runner.run_all(&cases::builtin(config.seed), &mut std::io::stderr())?;
//! assert!(suite.success(), "{}", suite);
//! # Ok::<(), simd_parity::ParityError>(())
//! ```

pub mod arch;
pub mod cases;
pub mod compare;
pub mod config;
pub mod error;
pub mod results;
pub mod runner;
pub mod simd;
pub mod suite;
pub mod vector_type;

pub use arch::Arch;
pub use cases::ParityCase;
pub use compare::{
    compare_sets, test_equal, ulp_distance_f32, ulp_distance_f64, ComparisonReport,
    ElementMismatch, ElementValue, Mismatch, ResultSite, SkippedGroup,
};
pub use config::ParityConfig;
pub use error::{ParityError, Result};
pub use results::{TestResultsSet, Tolerance, VectorResult};
pub use runner::ParityRunner;
pub use simd::VectorKernels;
pub use suite::SeqTestSuite;
pub use vector_type::{Element, VectorType};
