//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::error::{DataError, ModelFitError, Result};

/// Top-level configuration for aggregation, model fitting and serving.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// Transactions dated before this year are ignored.
    #[serde(default = "default_cutoff_year")]
    pub cutoff_year: i32,

    #[serde(default)]
    pub order: OrderConfig,

    #[serde(default)]
    pub corrector: CorrectorConfig,

    /// Share of training rows reserved for the diagnostic holdout; 0 disables it.
    #[serde(default = "default_holdout_fraction")]
    pub holdout_fraction: f64,

    /// Number of years returned by the default forecast.
    #[serde(default = "default_horizon")]
    pub horizon: usize,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            cutoff_year: default_cutoff_year(),
            order: OrderConfig::default(),
            corrector: CorrectorConfig::default(),
            holdout_fraction: default_holdout_fraction(),
            horizon: default_horizon(),
        }
    }
}

impl ForecastConfig {
    /// Parse a configuration from JSON; absent fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| DataError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values no model could be built from.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.holdout_fraction) {
            return Err(ModelFitError::InvalidParameter(format!(
                "holdout_fraction must be in [0, 1), got {}",
                self.holdout_fraction
            ))
            .into());
        }
        if self.horizon == 0 {
            return Err(ModelFitError::InvalidParameter("horizon must be positive".into()).into());
        }
        self.corrector.validate()
    }
}

/// ARIMA order triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderConfig {
    #[serde(default = "default_p")]
    pub p: usize,
    #[serde(default = "default_d")]
    pub d: usize,
    #[serde(default = "default_q")]
    pub q: usize,
}

impl Default for OrderConfig {
    fn default() -> Self {
        Self {
            p: default_p(),
            d: default_d(),
            q: default_q(),
        }
    }
}

/// Hyperparameters of the gradient-boosted residual corrector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectorConfig {
    #[serde(default = "default_n_estimators")]
    pub n_estimators: usize,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    #[serde(default = "default_l2_regularization")]
    pub l2_regularization: f64,
    #[serde(default = "default_min_samples_leaf")]
    pub min_samples_leaf: usize,
}

impl Default for CorrectorConfig {
    fn default() -> Self {
        Self {
            n_estimators: default_n_estimators(),
            learning_rate: default_learning_rate(),
            max_depth: default_max_depth(),
            l2_regularization: default_l2_regularization(),
            min_samples_leaf: default_min_samples_leaf(),
        }
    }
}

impl CorrectorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.n_estimators == 0 {
            return Err(
                ModelFitError::InvalidParameter("n_estimators must be positive".into()).into(),
            );
        }
        if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            return Err(ModelFitError::InvalidParameter(format!(
                "learning_rate must be in (0, 1], got {}",
                self.learning_rate
            ))
            .into());
        }
        if self.l2_regularization < 0.0 || !self.l2_regularization.is_finite() {
            return Err(ModelFitError::InvalidParameter(format!(
                "l2_regularization must be non-negative, got {}",
                self.l2_regularization
            ))
            .into());
        }
        if self.min_samples_leaf == 0 {
            return Err(
                ModelFitError::InvalidParameter("min_samples_leaf must be positive".into()).into(),
            );
        }
        Ok(())
    }
}

fn default_cutoff_year() -> i32 {
    2021
}
fn default_holdout_fraction() -> f64 {
    0.2
}
fn default_horizon() -> usize {
    4
}
fn default_p() -> usize {
    3
}
fn default_d() -> usize {
    2
}
fn default_q() -> usize {
    2
}
fn default_n_estimators() -> usize {
    100
}
fn default_learning_rate() -> f64 {
    0.1
}
fn default_max_depth() -> usize {
    6
}
fn default_l2_regularization() -> f64 {
    1.0
}
fn default_min_samples_leaf() -> usize {
    1
}
