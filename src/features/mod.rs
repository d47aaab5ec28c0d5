//! Feature preprocessing
//!
//! Standardization fitted on the training partition only.

pub mod scaling;

pub use scaling::StandardScaler;
