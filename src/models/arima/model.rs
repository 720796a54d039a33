//! ARIMA trend model for yearly sales.

use tracing::{debug, warn};

use crate::config::OrderConfig;
use crate::core::YearlySeries;
use crate::error::{ModelFitError, PredictError, Result};
use crate::models::arima::diff::{difference, integrate};
use crate::models::TrendForecaster;
use crate::utils::optimization::{nelder_mead, NelderMeadConfig};

/// ARIMA model specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ARIMASpec {
    /// AR order (p)
    pub p: usize,
    /// Differencing order (d)
    pub d: usize,
    /// MA order (q)
    pub q: usize,
}

impl ARIMASpec {
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }

    /// Shortest series the model will fit: `p + d + q + 1`.
    pub fn min_observations(&self) -> usize {
        self.p + self.d + self.q + 1
    }

    /// A constant term is only estimated on undifferenced data.
    pub fn has_intercept(&self) -> bool {
        self.d == 0
    }

    /// Number of estimated parameters, innovation variance included.
    pub fn num_params(&self) -> usize {
        self.p + self.q + usize::from(self.has_intercept()) + 1
    }
}

impl Default for ARIMASpec {
    fn default() -> Self {
        OrderConfig::default().into()
    }
}

impl From<OrderConfig> for ARIMASpec {
    fn from(order: OrderConfig) -> Self {
        Self::new(order.p, order.d, order.q)
    }
}

/// ARIMA(p, d, q) fitted by conditional maximum likelihood.
///
/// The series is differenced `d` times and an ARMA(p, q) is fitted to the
/// result; pre-sample innovations are taken as zero. With the innovation
/// variance concentrated out, maximising the Gaussian likelihood is a
/// bounded Nelder-Mead search over the AR and MA coefficients.
#[derive(Debug, Clone)]
pub struct ARIMA {
    spec: ARIMASpec,
    ar_coefficients: Vec<f64>,
    ma_coefficients: Vec<f64>,
    intercept: f64,
    /// Observed series (for integration).
    original: Option<Vec<f64>>,
    differenced: Option<Vec<f64>>,
    /// One-step innovations on the differenced scale.
    innovations: Option<Vec<f64>>,
    /// One-step fitted values on the original scale.
    fitted: Option<Vec<f64>>,
    sigma2: Option<f64>,
    log_likelihood: Option<f64>,
    aic: Option<f64>,
    bic: Option<f64>,
    optimizer: NelderMeadConfig,
}

impl ARIMA {
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self::from_spec(ARIMASpec::new(p, d, q))
    }

    pub fn from_spec(spec: ARIMASpec) -> Self {
        Self {
            spec,
            ar_coefficients: vec![],
            ma_coefficients: vec![],
            intercept: 0.0,
            original: None,
            differenced: None,
            innovations: None,
            fitted: None,
            sigma2: None,
            log_likelihood: None,
            aic: None,
            bic: None,
            optimizer: NelderMeadConfig {
                max_iter: 2000,
                tolerance: 1e-8,
                initial_step: 0.1,
                ..Default::default()
            },
        }
    }

    /// Override the likelihood search settings.
    pub fn with_optimizer(mut self, optimizer: NelderMeadConfig) -> Self {
        self.optimizer = optimizer;
        self
    }

    pub fn spec(&self) -> ARIMASpec {
        self.spec
    }

    pub fn ar_coefficients(&self) -> &[f64] {
        &self.ar_coefficients
    }

    pub fn ma_coefficients(&self) -> &[f64] {
        &self.ma_coefficients
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Innovation variance estimate.
    pub fn sigma2(&self) -> Option<f64> {
        self.sigma2
    }

    pub fn log_likelihood(&self) -> Option<f64> {
        self.log_likelihood
    }

    pub fn aic(&self) -> Option<f64> {
        self.aic
    }

    pub fn bic(&self) -> Option<f64> {
        self.bic
    }

    /// Run the ARMA recursion over `diff_series` and return the innovations.
    ///
    /// Innovations before `max(p, q)` are zero.
    fn innovations_for(
        diff_series: &[f64],
        p: usize,
        q: usize,
        ar: &[f64],
        ma: &[f64],
        intercept: f64,
    ) -> Vec<f64> {
        let n = diff_series.len();
        let start = p.max(q);
        let mut innovations = vec![0.0; n];

        for t in start..n {
            let mut pred = intercept;
            for i in 0..p {
                pred += ar[i] * (diff_series[t - 1 - i] - intercept);
            }
            for i in 0..q {
                pred += ma[i] * innovations[t - 1 - i];
            }
            innovations[t] = diff_series[t] - pred;
        }

        innovations
    }

    /// Concentrated Gaussian log-likelihood of the innovations from `start` on.
    fn concentrated_log_likelihood(innovations: &[f64], start: usize) -> f64 {
        let used = &innovations[start..];
        let m = used.len() as f64;
        let css: f64 = used.iter().map(|e| e * e).sum();
        // Floor keeps a perfect in-sample fit from sending the likelihood to infinity.
        let sigma2 = (css / m).max(1e-12);
        -0.5 * m * ((2.0 * std::f64::consts::PI * sigma2).ln() + 1.0)
    }

    /// Split an optimiser vector into (intercept, ar, ma).
    fn unpack(&self, params: &[f64]) -> (f64, Vec<f64>, Vec<f64>) {
        let (p, q) = (self.spec.p, self.spec.q);
        let offset = usize::from(self.spec.has_intercept());
        let intercept = if offset == 1 { params[0] } else { 0.0 };
        (
            intercept,
            params[offset..offset + p].to_vec(),
            params[offset + p..offset + p + q].to_vec(),
        )
    }

    fn estimate_parameters(&mut self, diff_series: &[f64]) -> Result<()> {
        let p = self.spec.p;
        let q = self.spec.q;
        let start = p.max(q);
        let mean = diff_series.iter().sum::<f64>() / diff_series.len() as f64;

        if p == 0 && q == 0 {
            self.intercept = if self.spec.has_intercept() { mean } else { 0.0 };
            self.ar_coefficients = vec![];
            self.ma_coefficients = vec![];
            return Ok(());
        }

        let mut initial = Vec::with_capacity(self.spec.num_params());
        let mut bounds = Vec::with_capacity(self.spec.num_params());
        if self.spec.has_intercept() {
            initial.push(mean);
            bounds.push((f64::NEG_INFINITY, f64::INFINITY));
        }
        for i in 0..p + q {
            let lag = if i < p { i } else { i - p };
            initial.push(0.1 / (lag + 1) as f64);
            // Keeps AR terms stationary and MA terms invertible, coefficient-wise.
            bounds.push((-0.99, 0.99));
        }

        let result = nelder_mead(
            |params| {
                let (intercept, ar, ma) = self.unpack(params);
                let innovations = Self::innovations_for(diff_series, p, q, &ar, &ma, intercept);
                let ll = Self::concentrated_log_likelihood(&innovations, start);
                if ll.is_finite() {
                    -ll
                } else {
                    f64::MAX
                }
            },
            &initial,
            Some(bounds.as_slice()),
            self.optimizer.clone(),
        );

        if result.optimal_value == f64::MAX
            || !result.optimal_value.is_finite()
            || result.optimal_point.iter().any(|v| !v.is_finite())
        {
            return Err(ModelFitError::NonConvergence(format!(
                "likelihood search ended at a non-finite point after {} iterations",
                result.iterations
            ))
            .into());
        }

        if !result.converged {
            warn!(
                iterations = result.iterations,
                "ARIMA likelihood search stopped at the iteration cap"
            );
        }

        let (intercept, ar, ma) = self.unpack(&result.optimal_point);
        self.intercept = intercept;
        self.ar_coefficients = ar;
        self.ma_coefficients = ma;
        Ok(())
    }

    /// Derive innovations, original-scale fitted values and information criteria.
    fn calculate_fitted(&mut self, values: &[f64], diff_series: &[f64]) {
        let (p, d, q) = (self.spec.p, self.spec.d, self.spec.q);
        let start = p.max(q);

        let innovations = Self::innovations_for(
            diff_series,
            p,
            q,
            &self.ar_coefficients,
            &self.ma_coefficients,
            self.intercept,
        );

        // Differenced index t lines up with original index t + d, and the
        // one-step prediction there is the observation minus the innovation.
        // Warm-up points keep their observed value.
        let fitted: Vec<f64> = values
            .iter()
            .enumerate()
            .map(|(i, &y)| if i < d { y } else { y - innovations[i - d] })
            .collect();

        let ll = Self::concentrated_log_likelihood(&innovations, start);
        let m = (diff_series.len() - start) as f64;
        let k = self.spec.num_params() as f64;
        let css: f64 = innovations[start..].iter().map(|e| e * e).sum();

        self.sigma2 = Some(css / m);
        self.log_likelihood = Some(ll);
        self.aic = Some(-2.0 * ll + 2.0 * k);
        self.bic = Some(-2.0 * ll + k * m.ln());
        self.innovations = Some(innovations);
        self.fitted = Some(fitted);
    }
}

impl Default for ARIMA {
    fn default() -> Self {
        Self::from_spec(ARIMASpec::default())
    }
}

impl TrendForecaster for ARIMA {
    fn fit(&mut self, series: &YearlySeries) -> Result<()> {
        let values = series.totals();
        let needed = self.spec.min_observations();

        if values.len() < needed {
            return Err(ModelFitError::InsufficientData {
                needed,
                got: values.len(),
            }
            .into());
        }

        let diff_series = difference(&values, self.spec.d);
        self.estimate_parameters(&diff_series)?;
        self.calculate_fitted(&values, &diff_series);

        debug!(
            p = self.spec.p,
            d = self.spec.d,
            q = self.spec.q,
            ar = ?self.ar_coefficients,
            ma = ?self.ma_coefficients,
            log_likelihood = self.log_likelihood,
            "fitted ARIMA trend model"
        );

        self.differenced = Some(diff_series);
        self.original = Some(values);
        Ok(())
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.fitted.as_deref()
    }

    fn forecast(&self, steps: usize) -> Result<Vec<f64>> {
        let original = self.original.as_ref().ok_or(PredictError::NotFitted)?;
        let diff_series = self.differenced.as_ref().ok_or(PredictError::NotFitted)?;
        let innovations = self.innovations.as_ref().ok_or(PredictError::NotFitted)?;

        if steps == 0 {
            return Ok(Vec::new());
        }

        let p = self.spec.p;
        let q = self.spec.q;

        let mut extended_diff = diff_series.clone();
        let mut extended_innovations = innovations.clone();

        for _ in 0..steps {
            let t = extended_diff.len();
            let mut pred = self.intercept;

            for i in 0..p.min(t) {
                pred += self.ar_coefficients[i] * (extended_diff[t - 1 - i] - self.intercept);
            }
            // Future innovations have zero expectation.
            for i in 0..q.min(t) {
                pred += self.ma_coefficients[i] * extended_innovations[t - 1 - i];
            }

            extended_diff.push(pred);
            extended_innovations.push(0.0);
        }

        let forecast_diff = &extended_diff[diff_series.len()..];
        Ok(integrate(forecast_diff, original, self.spec.d))
    }

    fn name(&self) -> &str {
        "ARIMA"
    }
}
