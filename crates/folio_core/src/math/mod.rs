//! Mathematical building blocks.
//!
//! - [`linalg`]: Dense symmetric matrices, Cholesky factorisation and
//!   Jacobi eigenvalues
//! - [`statistics`]: Sample moments, percentiles and streaming return moments
//! - [`solvers`]: Projected-gradient minimisation on the capped simplex

pub mod linalg;
pub mod solvers;
pub mod statistics;
