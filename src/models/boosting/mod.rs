//! Gradient-boosted regression trees.

mod model;
pub mod tree;

pub use model::{GradientBoostedRegressor, Objective};
pub use tree::{FeatureVector, RegressionTree, TreeParams};
