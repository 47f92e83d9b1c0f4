use crate::archive::ArchivedModelParameters;
use crate::checks;
use crate::model_parameters::ModelParameters;
use crate::parameterizable::{self, Parameterizable, Selection};
use crate::unified::UnifiedModelParameters;
use crate::{Error, ErrorKind, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use std::fmt;

/// Model parameters of a linear model, `y = slopes · x + offset`.
///
/// A linear model has no kernels, so it has neither a unified form nor grid diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawLinearParameters")]
pub struct LinearParameters {
    slopes: Array1<f64>,
    offset: f64,
    #[serde(rename = "parameterizable")]
    selection: Selection,
}
impl LinearParameters {
    /// Makes a new `LinearParameters` instance.
    ///
    /// # Errors
    ///
    /// If `slopes` is empty or a value is not finite, an `ErrorKind::InvalidInput` error is returned.
    pub fn new(slopes: Array1<f64>, offset: f64) -> Result<Self> {
        let this = Self {
            slopes,
            offset,
            selection: Selection::new(),
        };
        track!(this.validate())?;
        Ok(this)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        track_assert!(!self.slopes.is_empty(), ErrorKind::InvalidInput);
        track!(checks::check_finite("slopes", self.slopes.iter()))?;
        track!(checks::check_finite("offset", Some(&self.offset)))?;
        Ok(())
    }

    /// Returns the slope along each input dimension.
    pub fn slopes(&self) -> &Array1<f64> {
        &self.slopes
    }

    /// Returns the value of the model at `x = 0`.
    pub fn offset(&self) -> f64 {
        self.offset
    }
}

#[derive(Deserialize)]
struct RawLinearParameters {
    slopes: Array1<f64>,
    offset: f64,
    #[serde(rename = "parameterizable")]
    selection: Selection,
}
impl TryFrom<RawLinearParameters> for LinearParameters {
    type Error = Error;

    fn try_from(raw: RawLinearParameters) -> Result<Self> {
        let this = Self {
            slopes: raw.slopes,
            offset: raw.offset,
            selection: raw.selection,
        };
        track!(this.validate())?;
        Ok(this)
    }
}
impl Parameterizable for LinearParameters {
    fn parameter_layout(&self) -> Vec<(&'static str, usize)> {
        vec![("slopes", self.slopes.len()), ("offset", 1)]
    }

    fn parameter_vector_all(&self) -> Vec<f64> {
        let mut values = self.slopes.to_vec();
        values.push(self.offset);
        values
    }

    fn set_parameter_vector_all(&mut self, values: &[f64]) -> Result<()> {
        let blocks = track!(parameterizable::split_blocks(
            values,
            &[self.slopes.len(), 1]
        ))?;
        let next = Self {
            slopes: Array1::from(blocks[0].to_vec()),
            offset: blocks[1][0],
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
impl ModelParameters for LinearParameters {
    fn clone_box(&self) -> Box<dyn ModelParameters> {
        Box::new(self.clone())
    }

    fn expected_input_dim(&self) -> usize {
        self.slopes.len()
    }

    fn to_unified(&self) -> Option<UnifiedModelParameters> {
        None
    }

    fn to_archive(&self) -> ArchivedModelParameters {
        ArchivedModelParameters::Linear(self.clone())
    }
}
impl fmt::Display for LinearParameters {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "LinearParameters (expected_input_dim={}) slopes={} offset={}",
            self.expected_input_dim(),
            self.slopes,
            self.offset
        )
    }
}
