//! Feature construction for the residual corrector.

pub mod lag;

pub use lag::{future_rows, training_rows, LagFeatureRow};
