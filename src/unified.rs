//! Unified model parameters.
//!
//! A set of Gaussian kernels, each weighting a line segment. Radial basis function networks,
//! locally weighted regression and similar approximators can all be expressed in this form,
//! which lets generic tooling handle them through a single code path.
use crate::archive::ArchivedModelParameters;
use crate::checks;
use crate::grid::{self, GridSaveOutcome, GridSpec};
use crate::model_parameters::ModelParameters;
use crate::parameterizable::{self, Parameterizable, Selection};
use crate::{Error, ErrorKind, Result};
use ndarray::{Array1, Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use std::fmt;
use std::path::Path;

/// Computes Gaussian kernel activations.
///
/// `centers` and `widths` are `n_basis_functions × n_dims` matrices and `inputs` is an
/// `n_samples × n_dims` matrix. The result is an `n_samples × n_basis_functions` matrix.
///
/// If `normalized` is `true`, each row is divided by its sum (rows summing to zero stay zero).
///
/// # Errors
///
/// If the shapes are inconsistent, an `ErrorKind::InvalidInput` error is returned.
pub fn kernel_activations(
    centers: ArrayView2<f64>,
    widths: ArrayView2<f64>,
    inputs: ArrayView2<f64>,
    normalized: bool,
) -> Result<Array2<f64>> {
    track_assert_eq!(centers.dim(), widths.dim(), ErrorKind::InvalidInput);
    track_assert_eq!(inputs.ncols(), centers.ncols(), ErrorKind::InvalidInput);

    let n_dims = centers.ncols();
    let mut activations =
        Array2::from_shape_fn((inputs.nrows(), centers.nrows()), |(s, b)| {
            let mut d2 = 0.0;
            for d in 0..n_dims {
                let z = (inputs[[s, d]] - centers[[b, d]]) / widths[[b, d]];
                d2 += z * z;
            }
            (-0.5 * d2).exp()
        });
    if normalized {
        for mut row in activations.rows_mut() {
            let sum = row.sum();
            if sum > 0.0 {
                row.mapv_inplace(|a| a / sum);
            }
        }
    }
    Ok(activations)
}

/// Unified model parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawUnifiedModelParameters")]
pub struct UnifiedModelParameters {
    centers: Array2<f64>,
    widths: Array2<f64>,
    slopes: Array2<f64>,
    offsets: Array1<f64>,
    normalized_basis_functions: bool,
    lines_pivot_at_max_activation: bool,
    #[serde(rename = "parameterizable")]
    selection: Selection,
}
impl UnifiedModelParameters {
    /// Makes a new `UnifiedModelParameters` instance.
    ///
    /// `centers`, `widths` and `slopes` are `n_basis_functions × n_dims` matrices,
    /// and `offsets` has one element per basis function.
    ///
    /// # Errors
    ///
    /// If one of the following conditions is satisfied, this function returns an `ErrorKind::InvalidInput` error:
    ///
    /// - there are no basis functions, or no input dimensions
    /// - the shapes are inconsistent
    /// - a value is not finite, or a width is not positive
    pub fn new(
        centers: Array2<f64>,
        widths: Array2<f64>,
        slopes: Array2<f64>,
        offsets: Array1<f64>,
        normalized_basis_functions: bool,
        lines_pivot_at_max_activation: bool,
    ) -> Result<Self> {
        let this = Self::from_valid_parts(
            centers,
            widths,
            slopes,
            offsets,
            normalized_basis_functions,
            lines_pivot_at_max_activation,
        );
        track!(this.validate())?;
        Ok(this)
    }

    pub(crate) fn from_valid_parts(
        centers: Array2<f64>,
        widths: Array2<f64>,
        slopes: Array2<f64>,
        offsets: Array1<f64>,
        normalized_basis_functions: bool,
        lines_pivot_at_max_activation: bool,
    ) -> Self {
        Self {
            centers,
            widths,
            slopes,
            offsets,
            normalized_basis_functions,
            lines_pivot_at_max_activation,
            selection: Selection::new(),
        }
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

    /// Returns `true` if kernel activations are normalized to sum to one.
    pub fn normalized_basis_functions(&self) -> bool {
        self.normalized_basis_functions
    }

    /// Returns `true` if the line segments pivot around the kernel centers rather than `x = 0`.
    pub fn lines_pivot_at_max_activation(&self) -> bool {
        self.lines_pivot_at_max_activation
    }

    /// Changes where the line segments pivot.
    ///
    /// The offsets are rewritten so that the represented function does not change.
    pub fn set_lines_pivot_at_max_activation(&mut self, lines_pivot_at_max_activation: bool) {
        if self.lines_pivot_at_max_activation == lines_pivot_at_max_activation {
            return;
        }
        for b in 0..self.n_basis_functions() {
            let shift = self.slopes.row(b).dot(&self.centers.row(b));
            if lines_pivot_at_max_activation {
                self.offsets[b] += shift;
            } else {
                self.offsets[b] -= shift;
            }
        }
        self.lines_pivot_at_max_activation = lines_pivot_at_max_activation;
    }

    /// Returns the kernel activations for `inputs` (`n_samples × n_basis_functions`).
    pub fn kernel_activations(&self, inputs: ArrayView2<f64>) -> Result<Array2<f64>> {
        track!(kernel_activations(
            self.centers.view(),
            self.widths.view(),
            inputs,
            self.normalized_basis_functions
        ))
    }

    /// Returns the unweighted output of each line segment (`n_samples × n_basis_functions`).
    pub fn lines(&self, inputs: ArrayView2<f64>) -> Result<Array2<f64>> {
        track_assert_eq!(inputs.ncols(), self.expected_input_dim(), ErrorKind::InvalidInput);

        let n_dims = self.expected_input_dim();
        let lines = Array2::from_shape_fn((inputs.nrows(), self.n_basis_functions()), |(s, b)| {
            let mut y = self.offsets[b];
            for d in 0..n_dims {
                let mut x = inputs[[s, d]];
                if self.lines_pivot_at_max_activation {
                    x -= self.centers[[b, d]];
                }
                y += self.slopes[[b, d]] * x;
            }
            y
        });
        Ok(lines)
    }

    /// Returns the sum of the line segments weighted by the kernel activations.
    pub fn locally_weighted_lines(&self, inputs: ArrayView2<f64>) -> Result<Array1<f64>> {
        let activations = track!(self.kernel_activations(inputs))?;
        let lines = track!(self.lines(inputs))?;
        Ok((activations * lines).sum_axis(Axis(1)))
    }
}

#[derive(Deserialize)]
struct RawUnifiedModelParameters {
    centers: Array2<f64>,
    widths: Array2<f64>,
    slopes: Array2<f64>,
    offsets: Array1<f64>,
    normalized_basis_functions: bool,
    lines_pivot_at_max_activation: bool,
    #[serde(rename = "parameterizable")]
    selection: Selection,
}
impl TryFrom<RawUnifiedModelParameters> for UnifiedModelParameters {
    type Error = Error;

    fn try_from(raw: RawUnifiedModelParameters) -> Result<Self> {
        let this = Self {
            centers: raw.centers,
            widths: raw.widths,
            slopes: raw.slopes,
            offsets: raw.offsets,
            normalized_basis_functions: raw.normalized_basis_functions,
            lines_pivot_at_max_activation: raw.lines_pivot_at_max_activation,
            selection: raw.selection,
        };
        track!(this.validate())?;
        Ok(this)
    }
}
impl Parameterizable for UnifiedModelParameters {
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
        let lengths = self
            .parameter_layout()
            .into_iter()
            .map(|(_, n)| n)
            .collect::<Vec<_>>();
        let blocks = track!(parameterizable::split_blocks(values, &lengths))?;

        let shape = self.centers.dim();
        let next = Self {
            centers: track!(checks::matrix_from_block(blocks[0], shape))?,
            widths: track!(checks::matrix_from_block(blocks[1], shape))?,
            offsets: Array1::from(blocks[2].to_vec()),
            slopes: track!(checks::matrix_from_block(blocks[3], shape))?,
            normalized_basis_functions: self.normalized_basis_functions,
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
impl ModelParameters for UnifiedModelParameters {
    fn clone_box(&self) -> Box<dyn ModelParameters> {
        Box::new(self.clone())
    }

    fn expected_input_dim(&self) -> usize {
        self.centers.ncols()
    }

    fn to_unified(&self) -> Option<UnifiedModelParameters> {
        Some(self.clone())
    }

    fn to_archive(&self) -> ArchivedModelParameters {
        ArchivedModelParameters::Unified(self.clone())
    }

    fn save_grid_data(
        &self,
        grid: &GridSpec,
        directory: &Path,
        overwrite: bool,
    ) -> Result<GridSaveOutcome> {
        track!(grid.check_dim(self.expected_input_dim()))?;

        let inputs = grid.inputs();
        let activations = track!(self.kernel_activations(inputs.view()))?;
        let lines = track!(self.lines(inputs.view()))?;
        let weighted_lines = (&activations * &lines)
            .sum_axis(Axis(1))
            .insert_axis(Axis(1));
        let n_samples_per_dim = Array2::from_shape_fn((1, grid.dim()), |(_, d)| {
            grid.axes()[d].samples() as f64
        });

        let unnormalized = if self.normalized_basis_functions {
            Some(track!(kernel_activations(
                self.centers.view(),
                self.widths.view(),
                inputs.view(),
                false
            ))?)
        } else {
            None
        };

        let mut matrices = vec![
            (grid::N_SAMPLES_PER_DIM_FILE, n_samples_per_dim.view()),
            (grid::INPUTS_GRID_FILE, inputs.view()),
            (grid::ACTIVATIONS_FILE, activations.view()),
            (grid::LINES_FILE, lines.view()),
            (grid::WEIGHTED_LINES_FILE, weighted_lines.view()),
        ];
        if let Some(unnormalized) = &unnormalized {
            matrices.push((grid::ACTIVATIONS_UNNORMALIZED_FILE, unnormalized.view()));
        }
        track!(grid::save_matrices(directory, &matrices, overwrite))
    }
}
impl fmt::Display for UnifiedModelParameters {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            "UnifiedModelParameters (n_basis_functions={}, expected_input_dim={}, normalized_basis_functions={}, lines_pivot_at_max_activation={})",
            self.n_basis_functions(),
            self.expected_input_dim(),
            self.normalized_basis_functions,
            self.lines_pivot_at_max_activation
        )?;
        writeln!(f, "centers=\n{}", self.centers)?;
        writeln!(f, "widths=\n{}", self.widths)?;
        writeln!(f, "slopes=\n{}", self.slopes)?;
        write!(f, "offsets={}", self.offsets)
    }
}
