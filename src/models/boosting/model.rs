//! Gradient-boosted tree ensemble predicting trend residuals from lag features.

use tracing::debug;

use crate::config::CorrectorConfig;
use crate::error::{ModelFitError, PredictError, Result};
use crate::features::LagFeatureRow;
use crate::models::boosting::tree::{FeatureVector, RegressionTree, TreeParams};
use crate::models::ResidualRegressor;

/// Training loss of the ensemble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Objective {
    /// `0.5 * (y - f)^2`
    #[default]
    SquaredError,
}

impl Objective {
    /// First and second derivative of the loss with respect to the prediction.
    fn gradient(&self, target: f64, prediction: f64) -> (f64, f64) {
        match self {
            Objective::SquaredError => (prediction - target, 1.0),
        }
    }
}

/// Boosted regression trees over `(lag1, lag2)`.
///
/// Starts from the mean label and adds `n_estimators` trees, each fitted to
/// the current gradients and shrunk by the learning rate. Training is fully
/// deterministic: rows are used in the order given and never resampled.
#[derive(Debug, Clone)]
pub struct GradientBoostedRegressor {
    config: CorrectorConfig,
    objective: Objective,
    base_score: Option<f64>,
    trees: Vec<RegressionTree>,
}

impl GradientBoostedRegressor {
    pub fn new(config: CorrectorConfig) -> Self {
        Self {
            config,
            objective: Objective::default(),
            base_score: None,
            trees: Vec::new(),
        }
    }

    pub fn with_objective(mut self, objective: Objective) -> Self {
        self.objective = objective;
        self
    }

    pub fn config(&self) -> &CorrectorConfig {
        &self.config
    }

    pub fn objective(&self) -> Objective {
        self.objective
    }

    /// Number of trees in the fitted ensemble.
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn base_score(&self) -> Option<f64> {
        self.base_score
    }

    fn tree_params(&self) -> TreeParams {
        TreeParams {
            max_depth: self.config.max_depth,
            l2_regularization: self.config.l2_regularization,
            min_samples_leaf: self.config.min_samples_leaf,
            ..Default::default()
        }
    }

    fn raw_predict(&self, base: f64, x: &FeatureVector) -> f64 {
        base + self
            .trees
            .iter()
            .map(|tree| self.config.learning_rate * tree.predict(x))
            .sum::<f64>()
    }
}

impl Default for GradientBoostedRegressor {
    fn default() -> Self {
        Self::new(CorrectorConfig::default())
    }
}

impl ResidualRegressor for GradientBoostedRegressor {
    fn fit(&mut self, rows: &[LagFeatureRow]) -> Result<()> {
        self.config.validate()?;
        if rows.is_empty() {
            return Err(ModelFitError::EmptyTrainingSet.into());
        }

        let mut features = Vec::with_capacity(rows.len());
        let mut targets = Vec::with_capacity(rows.len());
        for row in rows {
            let label = row.label.ok_or_else(|| {
                ModelFitError::InvalidParameter(format!("training row {} has no label", row.year))
            })?;
            if !(row.lag1.is_finite() && row.lag2.is_finite() && label.is_finite()) {
                return Err(ModelFitError::InvalidParameter(format!(
                    "training row {} has non-finite values",
                    row.year
                ))
                .into());
            }
            features.push(row.features());
            targets.push(label);
        }

        let base = targets.iter().sum::<f64>() / targets.len() as f64;
        let params = self.tree_params();
        let mut predictions = vec![base; targets.len()];
        let mut trees = Vec::with_capacity(self.config.n_estimators);

        for _ in 0..self.config.n_estimators {
            let (gradients, hessians): (Vec<f64>, Vec<f64>) = targets
                .iter()
                .zip(&predictions)
                .map(|(&y, &f)| self.objective.gradient(y, f))
                .unzip();

            let tree = RegressionTree::fit(&features, &gradients, &hessians, &params);
            for (pred, x) in predictions.iter_mut().zip(&features) {
                *pred += self.config.learning_rate * tree.predict(x);
            }
            trees.push(tree);
        }

        let train_rmse = (targets
            .iter()
            .zip(&predictions)
            .map(|(y, f)| (y - f).powi(2))
            .sum::<f64>()
            / targets.len() as f64)
            .sqrt();
        debug!(
            rows = rows.len(),
            trees = trees.len(),
            base_score = base,
            train_rmse,
            "fitted residual corrector"
        );

        self.base_score = Some(base);
        self.trees = trees;
        Ok(())
    }

    fn predict(&self, rows: &[LagFeatureRow]) -> Result<Vec<f64>> {
        let base = self.base_score.ok_or(PredictError::NotFitted)?;

        rows.iter()
            .map(|row| -> Result<f64> {
                if !(row.lag1.is_finite() && row.lag2.is_finite()) {
                    return Err(PredictError::MalformedFeatures(format!(
                        "non-finite lag for year {}: lag1={}, lag2={}",
                        row.year, row.lag1, row.lag2
                    ))
                    .into());
                }
                Ok(self.raw_predict(base, &row.features()))
            })
            .collect()
    }

    fn is_fitted(&self) -> bool {
        self.base_score.is_some()
    }

    fn name(&self) -> &str {
        "GradientBoostedRegressor"
    }
}
