//! A uniform parameter contract for function approximators.
//!
//! Function approximators (radial basis function networks, locally weighted regression, ...)
//! keep their parameters in very different layouts. This crate lets generic tools handle
//! all of them in the same way:
//!
//! - black-box optimizers see a flat vector of the selected parameters (`Parameterizable`)
//! - parameter objects can be cloned, compared, printed and archived through
//!   `Box<dyn ModelParameters>`
//! - kernel based parameters can be converted to a common form (`UnifiedModelParameters`)
//! - kernel responses can be sampled over a grid for plotting (`ModelParameters::save_grid_data`)
//!
//! # Examples
//!
//! ```
//! use modelparams::variants::RbfnParameters;
//! use modelparams::{ModelParameters, Parameterizable};
//! use ndarray::array;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let rbfn = RbfnParameters::new(
//!     array![[0.0], [1.0]],
//!     array![[0.5], [0.5]],
//!     array![1.0, -1.0],
//! )?;
//! let mut params: Box<dyn ModelParameters> = Box::new(rbfn);
//!
//! params.select_parameters(&["weights"])?;
//! assert_eq!(params.parameter_vector_selected(), vec![1.0, -1.0]);
//!
//! let copy = params.clone();
//! params.set_parameter_vector_selected(&[2.0, 3.0])?;
//! assert_eq!(copy.parameter_vector_selected(), vec![1.0, -1.0]);
//! assert!(params.to_unified().is_some());
//! # Ok(())
//! # }
//! ```
#[macro_use]
extern crate log;
#[macro_use]
extern crate trackable;

pub use self::error::{Error, ErrorKind};
pub use self::grid::{GridSaveOutcome, GridSpec};
pub use self::model_parameters::ModelParameters;
pub use self::parameterizable::{Parameterizable, Selection};
pub use self::unified::UnifiedModelParameters;

pub mod archive;
pub mod grid;
pub mod parameterizable;
pub mod unified;
pub mod variants;

mod checks;
mod error;
mod model_parameters;

/// This crate specific `Result` type.
pub type Result<T> = std::result::Result<T, Error>;
