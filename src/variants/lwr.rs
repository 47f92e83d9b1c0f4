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

/// Model parameters of a Locally Weighted Regression (LWR) function approximator.
///
/// Each of the `n_basis_functions` Gaussian kernels weights one line segment,
/// and the kernel activations are normalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawLwrParameters")]
pub struct LwrParameters {
    centers: Array2<f64>,
    widths: Array2<f64>,
    slopes: Array2<f64>,
    offsets: Array1<f64>,
    lines_pivot_at_max_activation: bool,
    #[serde(rename = "parameterizable")]
    selection: Selection,
}
impl LwrParameters {
    /// Makes a new `LwrParameters` instance.
    ///
    /// `centers`, `widths` and `slopes` are `n_basis_functions × n_dims` matrices,
    /// and `offsets` has one element per basis function (the value of each line segment at
    /// `x = 0`, or at the kernel center if `lines_pivot_at_max_activation` is `true`).
    ///
    /// # Errors
    ///
    /// If the shapes are inconsistent, a value is not finite, or a width is not positive,
    /// an `ErrorKind::InvalidInput` error is returned.
    pub fn new(
        centers: Array2<f64>,
        widths: Array2<f64>,
        slopes: Array2<f64>,
        offsets: Array1<f64>,
        lines_pivot_at_max_activation: bool,
    ) -> Result<Self> {
        let this = Self {
            centers,
            widths,
            slopes,
            offsets,
            lines_pivot_at_max_activation,
            selection: Selection::new(),
        };
        track!(this.validate())?;
        Ok(this)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        track!(checks::check_kernels(&self.centers, &self.widths))?;
        track!(checks::check_matrix_shape("slopes", &self.slopes, self.centers.dim()))?;
        track!(checks::check_vector_len("offsets", &self.offsets, self.n_basis_functions()))?;
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

    /// Returns the slopes of the line segments (`n_basis_functions × n_dims`).
    pub fn slopes(&self) -> &Array2<f64> {
        &self.slopes
    }

    /// Returns the offsets of the line segments.
    pub fn offsets(&self) -> &Array1<f64> {
        &self.offsets
    }

    /// Returns `true` if the line segments pivot around the kernel centers rather than `x = 0`.
    pub fn lines_pivot_at_max_activation(&self) -> bool {
        self.lines_pivot_at_max_activation
    }

    fn unified(&self) -> UnifiedModelParameters {
        UnifiedModelParameters::from_valid_parts(
            self.centers.clone(),
            self.widths.clone(),
            self.slopes.clone(),
            self.offsets.clone(),
            true,
            self.lines_pivot_at_max_activation,
        )
    }
}

#[derive(Deserialize)]
struct RawLwrParameters {
    centers: Array2<f64>,
    widths: Array2<f64>,
    slopes: Array2<f64>,
    offsets: Array1<f64>,
    lines_pivot_at_max_activation: bool,
    #[serde(rename = "parameterizable")]
    selection: Selection,
}
impl TryFrom<RawLwrParameters> for LwrParameters {
    type Error = Error;

    fn try_from(raw: RawLwrParameters) -> Result<Self> {
        let this = Self {
            centers: raw.centers,
            widths: raw.widths,
            slopes: raw.slopes,
            offsets: raw.offsets,
            lines_pivot_at_max_activation: raw.lines_pivot_at_max_activation,
            selection: raw.selection,
        };
        track!(this.validate())?;
        Ok(this)
    }
}
impl Parameterizable for LwrParameters {
    fn parameter_layout(&self) -> Vec<(&'static str, usize)> {
        let n = self.centers.len();
        vec![
            ("centers", n),
            ("widths", n),
            ("offsets", self.offsets.len()),
            ("slopes", n),
        ]
    }

    fn parameter_vector_all(&self) -> Vec<f64> {
        self.centers
            .iter()
            .chain(self.widths.iter())
            .chain(self.offsets.iter())
            .chain(self.slopes.iter())
            .cloned()
            .collect()
    }

    fn set_parameter_vector_all(&mut self, values: &[f64]) -> Result<()> {
        let n = self.centers.len();
        let blocks = track!(parameterizable::split_blocks(
            values,
            &[n, n, self.offsets.len(), n]
        ))?;

        let shape = self.centers.dim();
        let next = Self {
            centers: track!(checks::matrix_from_block(blocks[0], shape))?,
            widths: track!(checks::matrix_from_block(blocks[1], shape))?,
            offsets: Array1::from(blocks[2].to_vec()),
            slopes: track!(checks::matrix_from_block(blocks[3], shape))?,
            lines_pivot_at_max_activation: self.lines_pivot_at_max_activation,
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
impl ModelParameters for LwrParameters {
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
        ArchivedModelParameters::Lwr(self.clone())
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
impl fmt::Display for LwrParameters {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            "LwrParameters (n_basis_functions={}, expected_input_dim={}, lines_pivot_at_max_activation={})",
            self.n_basis_functions(),
            self.expected_input_dim(),
            self.lines_pivot_at_max_activation
        )?;
        writeln!(f, "centers=\n{}", self.centers)?;
        writeln!(f, "widths=\n{}", self.widths)?;
        writeln!(f, "slopes=\n{}", self.slopes)?;
        write!(f, "offsets={}", self.offsets)
    }
}
