use crate::archive::ArchivedModelParameters;
use crate::checks;
use crate::grid::{GridSaveOutcome, GridSpec};
use crate::model_parameters::ModelParameters;
use crate::parameterizable::{self, Parameterizable, Selection};
use crate::unified::UnifiedModelParameters;
use crate::{Error, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use std::fmt;
use std::path::Path;

/// Model parameters of a Radial Basis Function Network (RBFN).
///
/// The output is a weighted sum of unnormalized Gaussian kernels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawRbfnParameters")]
pub struct RbfnParameters {
    centers: Array2<f64>,
    widths: Array2<f64>,
    weights: Array1<f64>,
    #[serde(rename = "parameterizable")]
    selection: Selection,
}
impl RbfnParameters {
    /// Makes a new `RbfnParameters` instance.
    ///
    /// `centers` and `widths` are `n_basis_functions × n_dims` matrices,
    /// and `weights` has one element per basis function.
    ///
    /// # Errors
    ///
    /// If the shapes are inconsistent, a value is not finite, or a width is not positive,
    /// an `ErrorKind::InvalidInput` error is returned.
    pub fn new(centers: Array2<f64>, widths: Array2<f64>, weights: Array1<f64>) -> Result<Self> {
        let this = Self {
            centers,
            widths,
            weights,
            selection: Selection::new(),
        };
        track!(this.validate())?;
        Ok(this)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        track!(checks::check_kernels(&self.centers, &self.widths))?;
        track!(checks::check_vector_len("weights", &self.weights, self.n_basis_functions()))?;
        Ok(())
    }

    /// Returns the number of basis functions.
    pub fn n_basis_functions(&self) -> usize {
        self.centers.nrows()
    }

    /// Returns the centers of the kernels (`n_basis_functions × n_dims`).
    pub fn centers(&self) -> &Array2<f64> {
        &self.centers
    }

    /// Returns the widths of the kernels (`n_basis_functions × n_dims`).
    pub fn widths(&self) -> &Array2<f64> {
        &self.widths
    }

    /// Returns the weight of each kernel.
    pub fn weights(&self) -> &Array1<f64> {
        &self.weights
    }

    // A weighted kernel is a line segment with zero slope.
    fn unified(&self) -> UnifiedModelParameters {
        UnifiedModelParameters::from_valid_parts(
            self.centers.clone(),
            self.widths.clone(),
            Array2::zeros(self.centers.dim()),
            self.weights.clone(),
            false,
            false,
        )
    }
}

#[derive(Deserialize)]
struct RawRbfnParameters {
    centers: Array2<f64>,
    widths: Array2<f64>,
    weights: Array1<f64>,
    #[serde(rename = "parameterizable")]
    selection: Selection,
}
impl TryFrom<RawRbfnParameters> for RbfnParameters {
    type Error = Error;

    fn try_from(raw: RawRbfnParameters) -> Result<Self> {
        let this = Self {
            centers: raw.centers,
            widths: raw.widths,
            weights: raw.weights,
            selection: raw.selection,
        };
        track!(this.validate())?;
        Ok(this)
    }
}
impl Parameterizable for RbfnParameters {
    fn parameter_layout(&self) -> Vec<(&'static str, usize)> {
        let n = self.centers.len();
        vec![
            ("centers", n),
            ("widths", n),
            ("weights", self.weights.len()),
        ]
    }

    fn parameter_vector_all(&self) -> Vec<f64> {
        self.centers
            .iter()
            .chain(self.widths.iter())
            .chain(self.weights.iter())
            .cloned()
            .collect()
    }

    fn set_parameter_vector_all(&mut self, values: &[f64]) -> Result<()> {
        let n = self.centers.len();
        let blocks = track!(parameterizable::split_blocks(
            values,
            &[n, n, self.weights.len()]
        ))?;

        let shape = self.centers.dim();
        let next = Self {
            centers: track!(checks::matrix_from_block(blocks[0], shape))?,
            widths: track!(checks::matrix_from_block(blocks[1], shape))?,
            weights: Array1::from(blocks[2].to_vec()),
            selection: self.selection.clone(),
        };
        track!(next.validate())?;
        *self = next;
        Ok(())
    }

    fn selection(&self) -> &Selection {
        &self.selection
    }

    fn selection_mut(&mut self) -> &mut Selection {
        &mut self.selection
    }
}
impl ModelParameters for RbfnParameters {
    fn clone_box(&self) -> Box<dyn ModelParameters> {
        Box::new(self.clone())
    }

    fn expected_input_dim(&self) -> usize {
        self.centers.ncols()
    }

    fn to_unified(&self) -> Option<UnifiedModelParameters> {
        Some(self.unified())
    }

    fn to_archive(&self) -> ArchivedModelParameters {
        ArchivedModelParameters::Rbfn(self.clone())
    }

    fn save_grid_data(
        &self,
        grid: &GridSpec,
        directory: &Path,
        overwrite: bool,
    ) -> Result<GridSaveOutcome> {
        track!(self.unified().save_grid_data(grid, directory, overwrite))
    }
}
impl fmt::Display for RbfnParameters {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            "RbfnParameters (n_basis_functions={}, expected_input_dim={})",
            self.n_basis_functions(),
            self.expected_input_dim()
        )?;
        writeln!(f, "centers=\n{}", self.centers)?;
        writeln!(f, "widths=\n{}", self.widths)?;
        write!(f, "weights={}", self.weights)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use trackable::result::TestResult;

    fn rbfn() -> Result<RbfnParameters> {
        RbfnParameters::new(
            array![[0.0, 0.0], [1.0, 1.0]],
            array![[0.5, 0.5], [0.5, 0.5]],
            array![2.0, -1.0],
        )
    }

    #[test]
    fn unified_response_is_weighted_kernel_sum() -> TestResult {
        let params = track!(rbfn())?;
        let unified = params.to_unified().expect("RBFN parameters are always unifiable");
        assert!(!unified.normalized_basis_functions());
        assert_eq!(unified.slopes(), &Array2::<f64>::zeros((2, 2)));

        let inputs = array![[0.0, 0.0], [0.5, 0.5], [1.0, 1.0]];
        let outputs = track!(unified.locally_weighted_lines(inputs.view()))?;
        let far = (-4.0f64).exp();
        let mid = (-1.0f64).exp();
        let expected = [2.0 - far, 2.0 * mid - mid, 2.0 * far - 1.0];
        for (o, e) in outputs.iter().zip(expected.iter()) {
            assert!((o - e).abs() < 1e-9, "{} != {}", o, e);
        }
        Ok(())
    }

    #[test]
    fn weights_are_optimizable_alone() -> TestResult {
        let mut params = track!(rbfn())?;
        assert_eq!(params.parameter_vector_all_size(), 10);

        track!(params.select_parameters(&["weights"]))?;
        assert_eq!(params.parameter_vector_selected(), vec![2.0, -1.0]);
        track!(params.set_parameter_vector_selected(&[0.5, 0.25]))?;
        assert_eq!(params.weights(), &array![0.5, 0.25]);
        assert_eq!(params.centers(), &array![[0.0, 0.0], [1.0, 1.0]]);
        Ok(())
    }

    #[test]
    fn grid_data_requires_matching_dimensionality() -> TestResult {
        let dir = track!(tempfile::tempdir().map_err(crate::Error::from))?;
        let params = track!(rbfn())?;

        let grid = track!(GridSpec::new(&[0.0], &[1.0], &[4]))?;
        assert!(params.save_grid_data(&grid, dir.path(), false).is_err());
        assert!(!dir.path().join(crate::grid::ACTIVATIONS_FILE).exists());

        let grid = track!(GridSpec::new(&[0.0, 0.0], &[1.0, 1.0], &[4, 3]))?;
        let outcome = track!(params.save_grid_data(&grid, dir.path(), false))?;
        assert_eq!(outcome, GridSaveOutcome::Written);
        assert!(!dir
            .path()
            .join(crate::grid::ACTIVATIONS_UNNORMALIZED_FILE)
            .exists());
        Ok(())
    }

    #[test]
    fn deserialization_checks_invariants() -> TestResult {
        let json = track!(serde_json::to_string(&track!(rbfn())?).map_err(crate::Error::from))?;
        let mut value: serde_json::Value =
            track!(serde_json::from_str(&json).map_err(crate::Error::from))?;
        value["widths"]["data"][1] = serde_json::json!(0.0);
        assert!(serde_json::from_value::<RbfnParameters>(value).is_err());

        let mut value: serde_json::Value =
            track!(serde_json::from_str(&json).map_err(crate::Error::from))?;
        value["weights"] = serde_json::json!({"v": 1, "dim": [3], "data": [1.0, 2.0, 3.0]});
        assert!(serde_json::from_value::<RbfnParameters>(value).is_err());
        Ok(())
    }
}
