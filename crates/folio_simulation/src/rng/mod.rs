//! # Random Number Generation
//!
//! Seeded generators for path simulation.
//!
//! - **Reproducibility**: every generator is seeded; an unseeded run draws
//!   its base seed once and reports it in the result
//! - **Independence**: one generator per path, derived from the base seed
//!   and the path index, so results do not depend on thread scheduling
//! - **Efficiency**: zero-allocation batch operations via `&mut [f64]`
//!
//! ## Module Structure
//!
//! - [`prng`]: Pseudo-random number generator wrapper with seed management

pub mod prng;

pub use prng::SimulationRng;
