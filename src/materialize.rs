//! Materialize
//!
//! Evaluate a fitted model at the bin centers of the registered binnings of its
//! inputs, producing a 2D or 3D lookup grid.
use crate::errors::CalibrationError;
use crate::grid::{function_to_grid2d, Axis, LookupGrid};
use crate::model::RegressionModel;
use crate::registry::{BinningRegistry, BinningSpec};
use log::{debug, warn};
use std::fmt;

/// Why no grid was produced. These are expected outcomes, not errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Only 2 or 3 variables can be stored as a grid.
    UnsupportedDimensionality(usize),
    /// The variable has no binning in the registry.
    MissingBinningSpec(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::UnsupportedDimensionality(n) => {
                write!(f, "unsupported dimensionality {}, only 2 or 3 variables can be stored as a grid", n)
            }
            SkipReason::MissingBinningSpec(name) => write!(f, "no binning registered for variable '{}'", name),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Materialized {
    Grid(LookupGrid),
    Skipped(SkipReason),
}

impl Materialized {
    pub fn grid(self) -> Option<LookupGrid> {
        match self {
            Materialized::Grid(g) => Some(g),
            Materialized::Skipped(_) => None,
        }
    }
}

/// Materialize `model` as a lookup grid named `name`.
///
/// * `model` - Fitted model taking `variables` as inputs, in order.
/// * `variables` - Names of the model inputs.
/// * `registry` - Binning of every variable.
/// * `name` - Name and title of the grid.
///
/// Returns a skip instead of a grid for anything but 2 or 3 variables, or when
/// one of them has no binning. Fails only if the model does not take
/// `variables.len()` inputs.
pub fn materialize<M: RegressionModel + ?Sized>(
    model: &M,
    variables: &[String],
    registry: &BinningRegistry,
    name: &str,
) -> Result<Materialized, CalibrationError> {
    if variables.len() != 2 && variables.len() != 3 {
        let reason = SkipReason::UnsupportedDimensionality(variables.len());
        warn!("Not materializing '{}': {}", name, reason);
        return Ok(Materialized::Skipped(reason));
    }
    let mut specs: Vec<BinningSpec> = Vec::with_capacity(variables.len());
    for v in variables {
        match registry.spec_for(v) {
            Some(s) => specs.push(*s),
            None => {
                let reason = SkipReason::MissingBinningSpec(v.clone());
                warn!("Not materializing '{}': {}", name, reason);
                return Ok(Materialized::Skipped(reason));
            }
        }
    }
    if model.n_features() != variables.len() {
        return Err(CalibrationError::DataShape(format!(
            "the model takes {} inputs but {} variables were given",
            model.n_features(),
            variables.len()
        )));
    }

    let grid = if specs.len() == 2 {
        function_to_grid2d(
            name,
            |v| model.predict_row(v),
            (variables[0].as_str(), specs[0]),
            (variables[1].as_str(), specs[1]),
        )
    } else {
        grid3d(model, variables, &specs, name)
    };
    debug!(
        "Materialized '{}' over {:?} with shape {:?}",
        name,
        variables,
        grid.shape()
    );
    Ok(Materialized::Grid(grid))
}

fn grid3d<M: RegressionModel + ?Sized>(model: &M, variables: &[String], specs: &[BinningSpec], name: &str) -> LookupGrid {
    let axes = variables
        .iter()
        .zip(specs)
        .map(|(v, s)| Axis::new(v, *s))
        .collect();
    let mut grid = LookupGrid::new(name, name, axes);
    let centers: Vec<Vec<f64>> = specs.iter().map(|s| s.centers()).collect();
    let mut point = [0.0; 3];
    for (ix, x) in centers[0].iter().enumerate() {
        point[0] = *x;
        for (iy, y) in centers[1].iter().enumerate() {
            point[1] = *y;
            for (iz, z) in centers[2].iter().enumerate() {
                point[2] = *z;
                grid.set(&[ix, iy, iz], model.predict_row(&point));
            }
        }
    }
    grid
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Linear {
        coefs: Vec<f64>,
    }

    impl RegressionModel for Linear {
        fn n_features(&self) -> usize {
            self.coefs.len()
        }
        fn predict_row(&self, row: &[f64]) -> f64 {
            row.iter().zip(self.coefs.iter()).map(|(x, c)| x * c).sum()
        }
    }

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_2d_matches_registry() {
        let registry = BinningRegistry::default();
        let model = Linear { coefs: vec![1.0, 1000.0] };
        let grid = materialize(&model, &names(&["abs(ieta)", "et"]), &registry, "regression")
            .unwrap()
            .grid()
            .unwrap();
        assert_eq!(grid.name, "regression");
        assert_eq!(grid.shape(), vec![30, 400]);
        assert_eq!(grid.axes[0].binning, *registry.spec_for("abs(ieta)").unwrap());
        assert_eq!(grid.axes[1].binning, *registry.spec_for("et").unwrap());
        assert_eq!(grid.axes[0].title, "abs(ieta)");
        // centers of the first bins are ieta = 1 and et = 1
        assert_eq!(grid.get(&[0, 0]), Some(1001.0));
        assert_eq!(grid.get(&[29, 399]), Some(30.0 + 400_000.0));
    }

    #[test]
    fn test_3d_bin_centers() {
        let mut registry = BinningRegistry::empty();
        registry.register("a", 2, 0.0, 2.0).unwrap();
        registry.register("b", 3, 0.0, 3.0).unwrap();
        registry.register("c", 4, 0.0, 1.0).unwrap();
        let model = Linear {
            coefs: vec![100.0, 10.0, 1.0],
        };
        let grid = materialize(&model, &names(&["a", "b", "c"]), &registry, "g3")
            .unwrap()
            .grid()
            .unwrap();
        assert_eq!(grid.shape(), vec![2, 3, 4]);
        assert_eq!(
            grid.axes.iter().map(|a| a.title.as_str()).collect::<Vec<_>>(),
            vec!["a", "b", "c"]
        );
        assert_eq!(grid.get(&[0, 0, 0]), Some(50.0 + 5.0 + 0.125));
        assert_eq!(grid.get(&[1, 2, 3]), Some(150.0 + 25.0 + 0.875));
        assert_eq!(grid.value_at(&[1.9, 0.1, 0.3]), Some(150.0 + 5.0 + 0.375));
    }

    #[test]
    fn test_unsupported_dimensionality() {
        let registry = BinningRegistry::default();
        let model = Linear { coefs: vec![1.0; 4] };
        let result = materialize(&model, &names(&["abs(ieta)", "et", "rho", "ntt"]), &registry, "g").unwrap();
        assert_eq!(result, Materialized::Skipped(SkipReason::UnsupportedDimensionality(4)));
        let model = Linear { coefs: vec![1.0] };
        let result = materialize(&model, &names(&["et"]), &registry, "g").unwrap();
        assert_eq!(result, Materialized::Skipped(SkipReason::UnsupportedDimensionality(1)));
    }

    #[test]
    fn test_missing_binning() {
        let registry = BinningRegistry::default();
        let model = Linear { coefs: vec![1.0; 2] };
        let result = materialize(&model, &names(&["et", "iso"]), &registry, "g").unwrap();
        assert_eq!(
            result,
            Materialized::Skipped(SkipReason::MissingBinningSpec("iso".to_string()))
        );
        assert!(SkipReason::MissingBinningSpec("iso".to_string())
            .to_string()
            .contains("'iso'"));
    }

    #[test]
    fn test_input_count_mismatch() {
        let registry = BinningRegistry::default();
        let model = Linear { coefs: vec![1.0; 3] };
        assert!(matches!(
            materialize(&model, &names(&["et", "rho"]), &registry, "g"),
            Err(CalibrationError::DataShape(_))
        ));
    }
}
