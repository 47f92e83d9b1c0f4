//! Regular input grids and the diagnostic files sampled over them.
use crate::{ErrorKind, Result};
use ndarray::{Array2, ArrayView2};
use ordered_float::NotNan;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::num::NonZeroUsize;
use std::path::Path;

/// Number of samples along each grid dimension (one row).
pub const N_SAMPLES_PER_DIM_FILE: &str = "n_samples_per_dim.txt";

/// Grid points, one per row.
pub const INPUTS_GRID_FILE: &str = "inputs_grid.txt";

/// Kernel activations at each grid point.
pub const ACTIVATIONS_FILE: &str = "activations.txt";

/// Kernel activations before normalization (only written for normalized kernels).
pub const ACTIVATIONS_UNNORMALIZED_FILE: &str = "activations_unnormalized.txt";

/// Output of each line segment at each grid point.
pub const LINES_FILE: &str = "lines.txt";

/// Sum of the line segments weighted by the kernel activations.
pub const WEIGHTED_LINES_FILE: &str = "weighted_lines.txt";

/// All the files a grid-sampling request may produce.
pub const GRID_FILES: &[&str] = &[
    N_SAMPLES_PER_DIM_FILE,
    INPUTS_GRID_FILE,
    ACTIVATIONS_FILE,
    ACTIVATIONS_UNNORMALIZED_FILE,
    LINES_FILE,
    WEIGHTED_LINES_FILE,
];

/// Result of a grid-sampling request that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GridSaveOutcome {
    /// The sample data was written (replacing previous results if overwriting was requested).
    Written,

    /// The parameter object has no grid diagnostics; nothing was written.
    NotApplicable,

    /// Results already existed and overwriting was not requested; nothing was written.
    Refused,
}
impl GridSaveOutcome {
    /// Returns `true` unless the request was refused.
    pub fn is_success(self) -> bool {
        match self {
            GridSaveOutcome::Written | GridSaveOutcome::NotApplicable => true,
            GridSaveOutcome::Refused => false,
        }
    }
}

/// One axis of a regular grid.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GridAxis {
    low: NotNan<f64>,
    high: NotNan<f64>,
    samples: NonZeroUsize,
}
impl GridAxis {
    /// Makes a new `GridAxis` instance.
    ///
    /// # Errors
    ///
    /// If one of the following conditions is satisfied, this function returns an `ErrorKind::InvalidInput` error:
    ///
    /// - `low` or `high` is not a finite number
    /// - `low > high`
    /// - `samples` is `0`
    pub fn new(low: f64, high: f64, samples: usize) -> Result<Self> {
        track_assert!(low.is_finite(), ErrorKind::InvalidInput; low, high);
        track_assert!(high.is_finite(), ErrorKind::InvalidInput; low, high);
        track_assert!(low <= high, ErrorKind::InvalidInput; low, high);
        let samples = track_assert_some!(NonZeroUsize::new(samples), ErrorKind::InvalidInput);
        Ok(Self {
            low: NotNan::new(low).unwrap_or_else(|_| unreachable!()),
            high: NotNan::new(high).unwrap_or_else(|_| unreachable!()),
            samples,
        })
    }

    /// Returns the lower bound of this axis.
    pub fn low(&self) -> f64 {
        self.low.into_inner()
    }

    /// Returns the upper bound of this axis.
    pub fn high(&self) -> f64 {
        self.high.into_inner()
    }

    /// Returns the number of samples along this axis.
    pub fn samples(&self) -> usize {
        self.samples.get()
    }

    /// Returns the `i`-th sample. Both bounds are included; a single sample sits at `low`.
    pub fn sample(&self, i: usize) -> f64 {
        let n = self.samples();
        if n == 1 {
            return self.low();
        }
        let delta = (self.high() - self.low()) / (n - 1) as f64;
        self.low() + delta * i as f64
    }

    /// Returns an iterator over the evenly spaced samples of this axis.
    pub fn linspace(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.samples()).map(move |i| self.sample(i))
    }
}

/// Regular grid over an input space.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GridSpec {
    axes: Vec<GridAxis>,
}
impl GridSpec {
    /// Makes a new `GridSpec` instance from per-dimension bounds and sample counts.
    ///
    /// # Errors
    ///
    /// If the three slices are empty or differ in length, if one of the axes is invalid
    /// (see `GridAxis::new`), or if the grid has too many points to be addressed,
    /// an `ErrorKind::InvalidInput` error is returned.
    pub fn new(min: &[f64], max: &[f64], n_samples_per_dim: &[usize]) -> Result<Self> {
        track_assert!(!min.is_empty(), ErrorKind::InvalidInput);
        track_assert_eq!(min.len(), max.len(), ErrorKind::InvalidInput);
        track_assert_eq!(min.len(), n_samples_per_dim.len(), ErrorKind::InvalidInput);

        let axes = min
            .iter()
            .zip(max.iter())
            .zip(n_samples_per_dim.iter())
            .map(|((&low, &high), &n)| track!(GridAxis::new(low, high, n)))
            .collect::<Result<Vec<_>>>()?;

        let n_values = axes
            .iter()
            .try_fold(axes.len(), |acc, a| acc.checked_mul(a.samples()));
        track_assert_some!(n_values, ErrorKind::InvalidInput; n_samples_per_dim);
        Ok(Self { axes })
    }

    /// Returns the dimensionality of this grid.
    pub fn dim(&self) -> usize {
        self.axes.len()
    }

    /// Returns the axes of this grid.
    pub fn axes(&self) -> &[GridAxis] {
        &self.axes
    }

    /// Returns the number of samples along each dimension.
    pub fn n_samples_per_dim(&self) -> Vec<usize> {
        self.axes.iter().map(|a| a.samples()).collect()
    }

    /// Returns the total number of grid points.
    pub fn n_samples(&self) -> usize {
        self.axes.iter().map(|a| a.samples()).product()
    }

    /// Checks that this grid spans an input space of dimensionality `expected_dim`.
    pub fn check_dim(&self, expected_dim: usize) -> Result<()> {
        track_assert_eq!(self.dim(), expected_dim, ErrorKind::InvalidInput);
        Ok(())
    }

    /// Returns all grid points as an `n_samples × dim` matrix.
    ///
    /// Points are enumerated with the last dimension varying fastest.
    pub fn inputs(&self) -> Array2<f64> {
        let dim = self.dim();
        Array2::from_shape_fn((self.n_samples(), dim), |(row, col)| {
            let stride: usize = self.axes[col + 1..].iter().map(|a| a.samples()).product();
            let axis = &self.axes[col];
            axis.sample((row / stride) % axis.samples())
        })
    }
}

/// Writes each named matrix to a text file under `directory`.
///
/// If one of the files (or one of the `GRID_FILES`) already exists and `overwrite` is `false`,
/// a warning is logged, nothing is written and `GridSaveOutcome::Refused` is returned.
///
/// When overwriting, files in `GRID_FILES` that are not part of `matrices` are removed,
/// so that the directory only holds the results of this request.
pub fn save_matrices(
    directory: &Path,
    matrices: &[(&str, ArrayView2<f64>)],
    overwrite: bool,
) -> Result<GridSaveOutcome> {
    let stale = GRID_FILES
        .iter()
        .filter(|file| !matrices.iter().any(|(name, _)| name == *file))
        .map(|file| directory.join(file))
        .filter(|path| path.exists())
        .collect::<Vec<_>>();
    if !overwrite {
        let existing = matrices
            .iter()
            .map(|(name, _)| directory.join(name))
            .filter(|path| path.exists())
            .chain(stale)
            .collect::<Vec<_>>();
        if !existing.is_empty() {
            warn!(
                "Not overwriting existing grid data (pass `overwrite=true` to replace it): {:?}",
                existing
            );
            return Ok(GridSaveOutcome::Refused);
        }
        return track!(write_matrices(directory, matrices));
    }

    for path in stale {
        track!(fs::remove_file(&path).map_err(crate::Error::from); path)?;
        debug!("Removed stale grid data {:?}", path);
    }
    track!(write_matrices(directory, matrices))
}

fn write_matrices(
    directory: &Path,
    matrices: &[(&str, ArrayView2<f64>)],
) -> Result<GridSaveOutcome> {
    track!(fs::create_dir_all(directory).map_err(crate::Error::from); directory)?;
    for (name, matrix) in matrices {
        let path = directory.join(name);
        track!(write_matrix(&path, matrix); path)?;
        debug!("Wrote {}x{} matrix to {:?}", matrix.nrows(), matrix.ncols(), path);
    }
    Ok(GridSaveOutcome::Written)
}

fn write_matrix(path: &Path, matrix: &ArrayView2<f64>) -> Result<()> {
    let mut writer = BufWriter::new(track!(File::create(path).map_err(crate::Error::from))?);
    for row in matrix.rows() {
        let line = row
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        track!(writeln!(writer, "{}", line).map_err(crate::Error::from))?;
    }
    track!(writer.flush().map_err(crate::Error::from))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::{Level, LevelFilter, Log, Metadata, Record};
    use ndarray::array;
    use std::sync::{Mutex, Once};
    use trackable::result::TestResult;

    static RECORDS: Mutex<Vec<(Level, String)>> = Mutex::new(Vec::new());

    struct CapturingLogger;
    impl Log for CapturingLogger {
        fn enabled(&self, _: &Metadata) -> bool {
            true
        }

        fn log(&self, record: &Record) {
            if let Ok(mut records) = RECORDS.lock() {
                records.push((record.level(), record.args().to_string()));
            }
        }

        fn flush(&self) {}
    }

    fn capture_logs() {
        static LOGGER: CapturingLogger = CapturingLogger;
        static INIT: Once = Once::new();
        INIT.call_once(|| {
            if log::set_logger(&LOGGER).is_ok() {
                log::set_max_level(LevelFilter::Debug);
            }
        });
    }

    fn warnings_mentioning(needle: &str) -> usize {
        RECORDS
            .lock()
            .map(|records| {
                records
                    .iter()
                    .filter(|(level, message)| *level == Level::Warn && message.contains(needle))
                    .count()
            })
            .unwrap_or(0)
    }

    #[test]
    fn axis_includes_both_bounds() -> TestResult {
        let axis = track!(GridAxis::new(0.0, 1.0, 5))?;
        assert_eq!(
            axis.linspace().collect::<Vec<_>>(),
            vec![0.0, 0.25, 0.5, 0.75, 1.0]
        );

        let axis = track!(GridAxis::new(-2.0, 3.0, 1))?;
        assert_eq!(axis.linspace().collect::<Vec<_>>(), vec![-2.0]);
        Ok(())
    }

    #[test]
    fn invalid_grids_are_rejected() {
        assert!(GridSpec::new(&[], &[], &[]).is_err());
        assert!(GridSpec::new(&[0.0], &[1.0, 2.0], &[3]).is_err());
        assert!(GridSpec::new(&[0.0], &[1.0], &[3, 3]).is_err());
        assert!(GridSpec::new(&[1.0], &[0.0], &[3]).is_err());
        assert!(GridSpec::new(&[0.0], &[std::f64::INFINITY], &[3]).is_err());
        assert!(GridSpec::new(&[0.0], &[1.0], &[0]).is_err());

        let huge = [std::usize::MAX / 2, 3];
        assert!(GridSpec::new(&[0.0, 0.0], &[1.0, 1.0], &huge).is_err());
        let huge = [1 << 20; 4];
        assert!(GridSpec::new(&[0.0; 4], &[1.0; 4], &huge).is_err());
    }

    #[test]
    fn inputs_vary_last_dimension_fastest() -> TestResult {
        let grid = track!(GridSpec::new(&[0.0, 10.0], &[1.0, 12.0], &[2, 3]))?;
        assert_eq!(grid.n_samples(), 6);
        assert_eq!(grid.n_samples_per_dim(), vec![2, 3]);
        assert_eq!(
            grid.inputs(),
            array![
                [0.0, 10.0],
                [0.0, 11.0],
                [0.0, 12.0],
                [1.0, 10.0],
                [1.0, 11.0],
                [1.0, 12.0]
            ]
        );
        Ok(())
    }

    #[test]
    fn check_dim_works() -> TestResult {
        let grid = track!(GridSpec::new(&[0.0], &[1.0], &[5]))?;
        track!(grid.check_dim(1))?;
        assert!(grid.check_dim(2).is_err());
        Ok(())
    }

    #[test]
    fn save_matrices_honors_overwrite_flag() -> TestResult {
        let dir = track!(tempfile::tempdir().map_err(crate::Error::from))?;
        let out = dir.path().join("grid");
        let first = array![[1.0, 2.0], [3.0, 4.0]];
        let second = array![[5.0]];

        let outcome = track!(save_matrices(&out, &[("m.txt", first.view())], false))?;
        assert_eq!(outcome, GridSaveOutcome::Written);
        let text = track!(fs::read_to_string(out.join("m.txt")).map_err(crate::Error::from))?;
        assert_eq!(text, "1 2\n3 4\n");

        let outcome = track!(save_matrices(&out, &[("m.txt", second.view())], false))?;
        assert_eq!(outcome, GridSaveOutcome::Refused);
        assert!(!outcome.is_success());
        let text = track!(fs::read_to_string(out.join("m.txt")).map_err(crate::Error::from))?;
        assert_eq!(text, "1 2\n3 4\n");

        let outcome = track!(save_matrices(&out, &[("m.txt", second.view())], true))?;
        assert_eq!(outcome, GridSaveOutcome::Written);
        let text = track!(fs::read_to_string(out.join("m.txt")).map_err(crate::Error::from))?;
        assert_eq!(text, "5\n");
        Ok(())
    }

    #[test]
    fn refusal_logs_a_warning() -> TestResult {
        capture_logs();
        let dir = track!(tempfile::tempdir().map_err(crate::Error::from))?;
        let out = dir.path().join("warned");
        let matrix = array![[1.0]];

        track!(save_matrices(&out, &[(LINES_FILE, matrix.view())], false))?;
        assert_eq!(warnings_mentioning(&out.display().to_string()), 0);

        let outcome = track!(save_matrices(&out, &[(LINES_FILE, matrix.view())], false))?;
        assert_eq!(outcome, GridSaveOutcome::Refused);
        assert_eq!(warnings_mentioning(&out.display().to_string()), 1);
        Ok(())
    }

    #[test]
    fn overwriting_removes_stale_grid_files() -> TestResult {
        let dir = track!(tempfile::tempdir().map_err(crate::Error::from))?;
        let out = dir.path();
        let matrix = array![[1.0]];

        let all = [
            (ACTIVATIONS_FILE, matrix.view()),
            (ACTIVATIONS_UNNORMALIZED_FILE, matrix.view()),
        ];
        track!(save_matrices(out, &all, false))?;
        assert!(out.join(ACTIVATIONS_UNNORMALIZED_FILE).exists());

        let fewer = [(ACTIVATIONS_FILE, matrix.view())];
        let outcome = track!(save_matrices(out, &fewer, false))?;
        assert_eq!(outcome, GridSaveOutcome::Refused);

        let outcome = track!(save_matrices(out, &fewer, true))?;
        assert_eq!(outcome, GridSaveOutcome::Written);
        assert!(out.join(ACTIVATIONS_FILE).exists());
        assert!(!out.join(ACTIVATIONS_UNNORMALIZED_FILE).exists());
        Ok(())
    }
}
