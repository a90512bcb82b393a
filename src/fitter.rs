//! Fitter
//!
//! Trains a `QuantileBooster` on columns of a sample table, optionally holding
//! out part of the rows to check the coverage of the fitted quantile.
use crate::booster::{BoosterConfig, QuantileBooster};
use crate::data::Matrix;
use crate::errors::CalibrationError;
use crate::metric::{count_below, efficiency, mean_pinball_loss, EfficiencyProfile};
use crate::model::RegressionModel;
use crate::registry::BinningRegistry;
use crate::sampler::TrainTestSplit;
use crate::table::SampleTable;
use crate::utils::validate_quantile;
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// Coverage of a fitted quantile on held out rows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationReport {
    pub quantile: f64,
    pub n_test: usize,
    /// Held out rows whose target is strictly below the prediction.
    pub n_below: usize,
    pub efficiency: f64,
    pub pinball_loss: f64,
    pub profiles: Vec<EfficiencyProfile>,
}

#[derive(Debug, Clone)]
pub struct FitResult {
    pub booster: QuantileBooster,
    pub validation: Option<ValidationReport>,
}

/// Trains quantile boosters with fixed hyperparameters.
#[derive(Debug, Clone, Default)]
pub struct Fitter {
    /// Hyperparameters. The quantile is overridden by each `fit` call.
    pub config: BoosterConfig,
    pub split: TrainTestSplit,
    registry: Option<BinningRegistry>,
}

impl Fitter {
    pub fn new(config: BoosterConfig, split: TrainTestSplit) -> Self {
        Fitter {
            config,
            split,
            registry: None,
        }
    }

    /// Also report efficiency profiles along every input the registry knows.
    pub fn with_registry(mut self, registry: BinningRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Fit a booster targeting `quantile` of `target` given `inputs`.
    ///
    /// * `samples` - Table holding the columns.
    /// * `inputs` - Input columns, in model input order.
    /// * `target` - Target column, not one of the inputs.
    /// * `quantile` - Working point, strictly between 0 and 1.
    /// * `validate` - Train on 60% of the rows and report coverage on the rest.
    pub fn fit(
        &self,
        samples: &SampleTable,
        inputs: &[String],
        target: &str,
        quantile: f64,
        validate: bool,
    ) -> Result<QuantileBooster, CalibrationError> {
        Ok(self.fit_report(samples, inputs, target, quantile, validate)?.booster)
    }

    /// Same as `fit`, also returning the validation report when one was made.
    pub fn fit_report(
        &self,
        samples: &SampleTable,
        inputs: &[String],
        target: &str,
        quantile: f64,
        validate: bool,
    ) -> Result<FitResult, CalibrationError> {
        validate_quantile(quantile)?;
        check_columns(inputs, target)?;
        if samples.is_empty() {
            return Err(CalibrationError::DataShape("the sample table has no rows".to_string()));
        }
        let x = samples.select(inputs)?;
        let y = samples.resolve(target)?;
        let data = x.matrix();

        let cfg = BoosterConfig {
            quantile,
            ..self.config.clone()
        };
        let mut booster = QuantileBooster::new(cfg)?;

        let validation = if validate {
            let (train, test) = self.split.split(data.rows)?;
            debug!("Split {} rows into {} train and {} test rows", data.rows, train.len(), test.len());

            let train_buf = data.take_rows(&train);
            let train_y: Vec<f64> = train.iter().map(|i| y[*i]).collect();
            booster.fit(&Matrix::new(&train_buf, train.len(), data.cols), &train_y)?;

            let test_buf = data.take_rows(&test);
            let test_data = Matrix::new(&test_buf, test.len(), data.cols);
            let test_y: Vec<f64> = test.iter().map(|i| y[*i]).collect();
            Some(self.validate(&booster, &test_data, &test_y, inputs, quantile))
        } else {
            booster.fit(&data, &y)?;
            None
        };

        booster.insert_metadata("inputs".to_string(), inputs.join(","));
        booster.insert_metadata("target".to_string(), target.to_string());
        booster.insert_metadata("quantile".to_string(), quantile.to_string());
        Ok(FitResult { booster, validation })
    }

    fn validate(
        &self,
        booster: &QuantileBooster,
        data: &Matrix<f64>,
        y: &[f64],
        inputs: &[String],
        quantile: f64,
    ) -> ValidationReport {
        let yhat = booster.predict(data, true);
        let n_below = count_below(y, &yhat);
        let efficiency = efficiency(y, &yhat);
        let pinball_loss = mean_pinball_loss(y, &yhat, quantile);
        info!(
            "Efficiency on {} test rows: {:.4} (working point {}), mean pinball loss {:.6}",
            y.len(),
            efficiency,
            quantile,
            pinball_loss
        );

        let mut profiles = Vec::new();
        if let Some(registry) = &self.registry {
            for (j, name) in inputs.iter().enumerate() {
                let Some(spec) = registry.spec_for(name) else {
                    continue;
                };
                let profile = EfficiencyProfile::compute(name, data.get_col(j), y, &yhat, spec);
                for b in profile.bins.iter() {
                    debug!(
                        "efficiency vs {} [{}, {}): {:.4} ({} rows)",
                        name, b.low, b.high, b.efficiency, b.count
                    );
                }
                if let Some(w) = profile.worst_bin(quantile) {
                    info!(
                        "Largest efficiency deviation along {}: {:.4} in [{}, {})",
                        name, w.efficiency, w.low, w.high
                    );
                }
                profiles.push(profile);
            }
        }

        ValidationReport {
            quantile,
            n_test: y.len(),
            n_below,
            efficiency,
            pinball_loss,
            profiles,
        }
    }
}

fn check_columns(inputs: &[String], target: &str) -> Result<(), CalibrationError> {
    if inputs.is_empty() {
        return Err(CalibrationError::DataShape("at least one input column is required".to_string()));
    }
    for (i, name) in inputs.iter().enumerate() {
        if name == target {
            return Err(CalibrationError::DataShape(format!(
                "column '{}' is both an input and the target",
                name
            )));
        }
        if inputs[..i].contains(name) {
            return Err(CalibrationError::DataShape(format!("input column '{}' is repeated", name)));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use rand_distr::{Distribution, Normal};

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    fn synthetic(n: usize, seed: u64) -> SampleTable {
        let mut rng = StdRng::seed_from_u64(seed);
        let noise = Normal::new(0.0, 1.0).unwrap();
        let mut x = Vec::with_capacity(n);
        let mut z = Vec::with_capacity(n);
        let mut target = Vec::with_capacity(n);
        for _ in 0..n {
            let x_ = rng.gen_range(0.0..10.0);
            let z_ = rng.gen_range(0.0..10.0);
            x.push(x_);
            z.push(z_);
            target.push(x_ + (1.0 + 0.1 * x_) * noise.sample(&mut rng));
        }
        SampleTable::from_columns(vec![
            ("x".to_string(), x),
            ("z".to_string(), z),
            ("target".to_string(), target),
        ])
        .unwrap()
    }

    #[test]
    fn test_held_out_coverage() {
        let table = synthetic(20_000, 7);
        let fitter = Fitter::default();
        let result = fitter.fit_report(&table, &names(&["x", "z"]), "target", 0.9, true).unwrap();
        let report = result.validation.unwrap();
        assert_eq!(report.n_test, 8000);
        assert!((report.efficiency - 0.9).abs() < 0.02, "efficiency {}", report.efficiency);
        assert_eq!(report.efficiency, report.n_below as f64 / report.n_test as f64);
        assert!(report.pinball_loss > 0.0);
        assert!(report.profiles.is_empty());
        assert_eq!(result.booster.n_features, 2);
        assert_eq!(result.booster.get_metadata(&"inputs".to_string()), Some("x,z".to_string()));
    }

    #[test]
    fn test_profiles_from_registry() {
        let table = synthetic(2000, 3);
        let mut registry = BinningRegistry::empty();
        registry.register("x", 5, 0.0, 10.0).unwrap();
        let fitter = Fitter::default().with_registry(registry);
        let report = fitter
            .fit_report(&table, &names(&["x", "z"]), "target", 0.5, true)
            .unwrap()
            .validation
            .unwrap();
        assert_eq!(report.profiles.len(), 1);
        let profile = &report.profiles[0];
        assert_eq!(profile.variable, "x");
        assert_eq!(profile.bins.iter().map(|b| b.count).sum::<usize>(), report.n_test);
        let worst = profile.worst_bin(0.5).unwrap();
        assert!(profile
            .bins
            .iter()
            .all(|b| (b.efficiency - 0.5).abs() <= (worst.efficiency - 0.5).abs()));
    }

    #[test]
    fn test_no_validation_trains_on_all_rows() {
        let table = synthetic(500, 1);
        let fitter = Fitter::default();
        let result = fitter.fit_report(&table, &names(&["x"]), "target", 0.5, false).unwrap();
        assert!(result.validation.is_none());
        assert_eq!(result.booster.cfg.quantile, 0.5);
        assert_eq!(result.booster.trees.len(), 100);
    }

    #[test]
    fn test_fit_is_reproducible() {
        let table = synthetic(1000, 11);
        let fitter = Fitter::default();
        let a = fitter.fit(&table, &names(&["x", "z"]), "target", 0.9, true).unwrap();
        let b = fitter.fit(&table, &names(&["x", "z"]), "target", 0.9, true).unwrap();
        let probe = [4.2, 1.0];
        assert_eq!(a.predict_row(&probe), b.predict_row(&probe));
    }

    #[test]
    fn test_fit_errors() {
        let table = synthetic(100, 5);
        let fitter = Fitter::default();
        assert!(matches!(
            fitter.fit(&table, &names(&["x"]), "target", 1.0, false),
            Err(CalibrationError::InvalidQuantile(_))
        ));
        assert!(matches!(
            fitter.fit(&table, &names(&["x"]), "target", 0.0, false),
            Err(CalibrationError::InvalidQuantile(_))
        ));
        match fitter.fit(&table, &names(&["x", "rho"]), "target", 0.9, false) {
            Err(CalibrationError::DataShape(msg)) => assert!(msg.contains("'rho'")),
            _ => panic!("expected a data shape error"),
        }
        assert!(matches!(
            fitter.fit(&table, &names(&["x"]), "missing", 0.9, false),
            Err(CalibrationError::DataShape(_))
        ));
        assert!(matches!(
            fitter.fit(&table, &names(&["x", "target"]), "target", 0.9, false),
            Err(CalibrationError::DataShape(_))
        ));
        assert!(matches!(
            fitter.fit(&table, &[], "target", 0.9, false),
            Err(CalibrationError::DataShape(_))
        ));
        let empty = SampleTable::from_columns(vec![("x".to_string(), vec![]), ("target".to_string(), vec![])]).unwrap();
        assert!(matches!(
            fitter.fit(&empty, &names(&["x"]), "target", 0.9, false),
            Err(CalibrationError::DataShape(_))
        ));
    }
}
