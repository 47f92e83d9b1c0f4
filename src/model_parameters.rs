//! The contract shared by the parameters of all function approximators.
use crate::archive::ArchivedModelParameters;
use crate::grid::{GridSaveOutcome, GridSpec};
use crate::parameterizable::Parameterizable;
use crate::unified::UnifiedModelParameters;
use crate::Result;
use std::fmt;
use std::path::Path;

/// Model parameters of a function approximator.
///
/// Each approximator owns exactly one parameter object and keeps its own internal layout.
/// Through this trait (and its `Parameterizable` supertrait), generic code such as
/// optimizers, archives and plotting tools can handle any parameter object as a
/// `Box<dyn ModelParameters>` without knowing its concrete type.
///
/// This is a trait, so the "base" itself can never be instantiated:
///
/// ```compile_fail
/// use modelparams::ModelParameters;
///
/// let params: Box<dyn ModelParameters> = Box::new(());
/// ```
///
/// `fmt::Display` is the human-readable rendering of the parameters.
pub trait ModelParameters: Parameterizable + fmt::Debug + fmt::Display + Send + Sync {
    /// Returns a deep copy of this object.
    ///
    /// The copy shares no state with `self`.
    fn clone_box(&self) -> Box<dyn ModelParameters>;

    /// Returns the dimensionality of the inputs these parameters expect.
    ///
    /// The value never changes during the lifetime of the object.
    fn expected_input_dim(&self) -> usize;

    /// Converts this object to unified model parameters.
    ///
    /// `None` means that these parameters have no unified representation.
    /// Calling this method twice on an unchanged object yields equal values.
    fn to_unified(&self) -> Option<UnifiedModelParameters>;

    /// Returns the archived form of this object, which also records its concrete type.
    fn to_archive(&self) -> ArchivedModelParameters;

    /// Samples the response of the basis functions and line segments over `grid`,
    /// and saves the results to files under `directory`.
    ///
    /// The default implementation does nothing and returns `GridSaveOutcome::NotApplicable`.
    ///
    /// Implementations must not modify existing results unless `overwrite` is `true`;
    /// in that case they log a warning and return `GridSaveOutcome::Refused`.
    ///
    /// # Errors
    ///
    /// If the dimensionality of `grid` differs from `expected_input_dim()`,
    /// an `ErrorKind::InvalidInput` error is returned.
    /// Filesystem failures are reported as `ErrorKind::IoError` errors.
    fn save_grid_data(
        &self,
        grid: &GridSpec,
        directory: &Path,
        overwrite: bool,
    ) -> Result<GridSaveOutcome> {
        let _ = (grid, directory, overwrite);
        Ok(GridSaveOutcome::NotApplicable)
    }
}
impl Clone for Box<dyn ModelParameters> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}
impl PartialEq for dyn ModelParameters {
    /// Two objects are equal if they have the same concrete type and the same state.
    fn eq(&self, other: &Self) -> bool {
        self.to_archive() == other.to_archive()
    }
}
