//! # folio_core: Foundation for the Portfolio Analytics Engine
//!
//! ## Layer 1 (Foundation) Role
//!
//! folio_core is the bottom layer of the workspace, providing:
//! - Error taxonomy: `AnalyticsError`, `ValidationError` (`types::error`)
//! - Input data: `ReturnSeries` (`types::series`)
//! - Calendar frequencies: `Frequency` (`types::frequency`)
//! - Engine configuration: `EngineConfig` (`config`)
//! - Dense symmetric matrices with Cholesky and eigenvalues (`math::linalg`)
//! - Sample statistics and percentiles (`math::statistics`)
//! - Projected-gradient solver on the capped simplex (`math::solvers`)
//!
//! ## Zero Dependency Principle
//!
//! Layer 1 has no dependencies on other folio_* crates, and performs no I/O
//! apart from the optional configuration file loader.
//!
//! ## Usage Examples
//!
//! ```rust
//! use folio_core::math::linalg::SymmetricMatrix;
//! use folio_core::types::ReturnSeries;
//!
//! let series = ReturnSeries::new(
//!     vec!["AAA".to_string(), "BBB".to_string()],
//!     vec![vec![0.01, -0.02, 0.005], vec![0.002, 0.001, -0.001]],
//!     252,
//! )
//! .unwrap();
//! assert_eq!(series.n_assets(), 2);
//! assert_eq!(series.len(), 3);
//!
//! let cov = SymmetricMatrix::from_rows(&[vec![0.04, 0.01], vec![0.01, 0.09]]).unwrap();
//! let chol = cov.cholesky().unwrap();
//! assert!((chol.get(0, 0) - 0.2).abs() < 1e-12);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod config;
pub mod math;
pub mod types;

pub use config::{ConfigError, EngineConfig};
pub use types::{
    validate_weights, AnalyticsError, AnalyticsResult, Frequency, ReturnSeries, SolverError,
    ValidationError,
};
