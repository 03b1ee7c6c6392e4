//! Dairy animal price estimation.
//!
//! Raw form inputs flow one way through [`pricing::InferencePipeline`]: validation and encoding,
//! feature scaling with a pre-fitted scaler, a pre-fitted regression model, and finally an
//! immutable [`pricing::ReportRecord`] ready for rendering.

pub mod config;
pub mod error;
pub mod pricing;
pub mod telemetry;
