//! Skateway Common - Shared types for the skateway telemetry simulator.
//!
//! Holds the reading value object, the synthetic generator, and the error
//! taxonomy. Everything network-facing lives in `skatewayd`.

pub mod error;
pub mod telemetry;

pub use error::*;
pub use telemetry::*;
