//! Persistence of model parameters.
//!
//! Parameters are archived as JSON objects whose `"type"` field names the concrete
//! parameter type, so that loading an archive reconstructs the right type behind a
//! `Box<dyn ModelParameters>`. Archives carry no version information.
use crate::model_parameters::ModelParameters;
use crate::unified::UnifiedModelParameters;
use crate::variants::{LinearParameters, LwrParameters, RbfnParameters};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Archivable model parameters.
///
/// Each concrete parameter type must be registered here to be restorable from an archive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ArchivedModelParameters {
    Lwr(LwrParameters),
    Rbfn(RbfnParameters),
    Linear(LinearParameters),
    Unified(UnifiedModelParameters),
}
impl ArchivedModelParameters {
    /// Returns the name under which the concrete type is recorded in archives.
    pub fn type_name(&self) -> &'static str {
        match self {
            ArchivedModelParameters::Lwr(_) => "Lwr",
            ArchivedModelParameters::Rbfn(_) => "Rbfn",
            ArchivedModelParameters::Linear(_) => "Linear",
            ArchivedModelParameters::Unified(_) => "Unified",
        }
    }

    /// Checks the invariants of the archived parameters and returns them as a trait object.
    ///
    /// Deserialization already rejects inconsistent values as `ErrorKind::Serialization` errors.
    ///
    /// # Errors
    ///
    /// If the archived values are inconsistent (e.g., mismatched shapes or non-positive widths),
    /// an `ErrorKind::InvalidInput` error is returned.
    pub fn into_model_parameters(self) -> Result<Box<dyn ModelParameters>> {
        let params: Box<dyn ModelParameters> = match self {
            ArchivedModelParameters::Lwr(p) => {
                track!(p.validate())?;
                Box::new(p)
            }
            ArchivedModelParameters::Rbfn(p) => {
                track!(p.validate())?;
                Box::new(p)
            }
            ArchivedModelParameters::Linear(p) => {
                track!(p.validate())?;
                Box::new(p)
            }
            ArchivedModelParameters::Unified(p) => {
                track!(p.validate())?;
                Box::new(p)
            }
        };
        Ok(params)
    }
}

/// Encodes `params` as a JSON string.
pub fn to_json_string(params: &dyn ModelParameters) -> Result<String> {
    let json = track!(serde_json::to_string_pretty(&params.to_archive()).map_err(Error::from))?;
    Ok(json)
}

/// Decodes model parameters from a JSON string.
pub fn from_json_str(json: &str) -> Result<Box<dyn ModelParameters>> {
    let archived: ArchivedModelParameters =
        track!(serde_json::from_str(json).map_err(Error::from))?;
    track!(archived.into_model_parameters())
}

/// Writes `params` as JSON to `writer`.
pub fn write_to<W: Write>(writer: W, params: &dyn ModelParameters) -> Result<()> {
    track!(serde_json::to_writer_pretty(writer, &params.to_archive()).map_err(Error::from))?;
    Ok(())
}

/// Reads JSON encoded model parameters from `reader`.
pub fn read_from<R: Read>(reader: R) -> Result<Box<dyn ModelParameters>> {
    let archived: ArchivedModelParameters =
        track!(serde_json::from_reader(reader).map_err(Error::from))?;
    track!(archived.into_model_parameters())
}

/// Saves `params` to the file at `path`.
///
/// # Errors
///
/// If the file already exists and `overwrite` is `false`, an `ErrorKind::IoError` error is returned.
pub fn save_file<P: AsRef<Path>>(
    path: P,
    params: &dyn ModelParameters,
    overwrite: bool,
) -> Result<()> {
    let path = path.as_ref();
    let mut options = OpenOptions::new();
    options.write(true);
    if overwrite {
        options.create(true).truncate(true);
    } else {
        options.create_new(true);
    }
    let file = track!(options.open(path).map_err(Error::from); path)?;
    let mut writer = BufWriter::new(file);
    track!(write_to(&mut writer, params); path)?;
    track!(writer.flush().map_err(Error::from); path)?;
    debug!("Saved {} model parameters to {:?}", params.to_archive().type_name(), path);
    Ok(())
}

/// Loads model parameters from the file at `path`.
pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Box<dyn ModelParameters>> {
    let path = path.as_ref();
    let file = track!(File::open(path).map_err(Error::from); path)?;
    let params = track!(read_from(BufReader::new(file)); path)?;
    debug!("Loaded model parameters from {:?}", path);
    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameterizable::Parameterizable;
    use crate::ErrorKind;
    use ndarray::array;
    use trackable::result::TestResult;

    fn lwr() -> Result<LwrParameters> {
        LwrParameters::new(
            array![[0.0], [0.5], [1.0]],
            array![[0.2], [0.2], [0.2]],
            array![[1.0], [0.0], [-1.0]],
            array![0.0, 0.5, 1.0],
            true,
        )
    }

    #[test]
    fn round_trip_keeps_type_and_values() -> TestResult {
        let mut params = track!(lwr())?;
        track!(params.select_parameters(&["slopes", "offsets"]))?;
        let params: Box<dyn ModelParameters> = Box::new(params);

        let json = track!(to_json_string(params.as_ref()))?;
        let value: serde_json::Value = track!(serde_json::from_str(&json).map_err(Error::from))?;
        let mut keys = value
            .as_object()
            .map(|object| object.keys().map(String::as_str).collect::<Vec<_>>())
            .unwrap_or_default();
        keys.sort();
        assert_eq!(
            keys,
            [
                "centers",
                "lines_pivot_at_max_activation",
                "offsets",
                "parameterizable",
                "slopes",
                "type",
                "widths"
            ]
        );
        assert_eq!(value["type"], "Lwr");

        let restored = track!(from_json_str(&json))?;
        assert!(*restored == *params);
        assert_eq!(restored.to_archive().type_name(), "Lwr");
        assert_eq!(restored.parameter_vector_mask(), params.parameter_vector_mask());
        Ok(())
    }

    #[test]
    fn every_registered_type_round_trips() -> TestResult {
        let all: Vec<Box<dyn ModelParameters>> = vec![
            Box::new(track!(lwr())?),
            Box::new(track!(RbfnParameters::new(
                array![[0.0, 1.0]],
                array![[1.0, 1.0]],
                array![2.0]
            ))?),
            Box::new(track!(LinearParameters::new(array![1.0, 2.0], -1.0))?),
            Box::new(track!(UnifiedModelParameters::new(
                array![[0.0]],
                array![[1.0]],
                array![[2.0]],
                array![3.0],
                false,
                true
            ))?),
        ];
        for params in all {
            let mut buf = Vec::new();
            track!(write_to(&mut buf, params.as_ref()))?;
            let restored = track!(read_from(&buf[..]))?;
            assert!(*restored == *params, "{}", params);
        }
        Ok(())
    }

    #[test]
    fn file_round_trip_honors_overwrite() -> TestResult {
        let dir = track!(tempfile::tempdir().map_err(Error::from))?;
        let path = dir.path().join("params.json");
        let params = track!(lwr())?;

        track!(save_file(&path, &params, false))?;
        assert!(save_file(&path, &params, false).is_err());
        track!(save_file(&path, &params, true))?;

        let restored = track!(load_file(&path))?;
        assert_eq!(restored.to_archive(), ArchivedModelParameters::Lwr(params));
        Ok(())
    }

    #[test]
    fn invalid_archives_are_rejected() -> TestResult {
        let params = track!(lwr())?;
        let json = track!(to_json_string(&params))?;

        let unknown = json.replace("\"Lwr\"", "\"Gmr\"");
        assert!(from_json_str(&unknown).is_err());

        let mut value: serde_json::Value = track!(serde_json::from_str(&json).map_err(Error::from))?;
        value["widths"]["data"][1] = serde_json::json!(-1.0);
        let broken = value.to_string();
        let kind = from_json_str(&broken).err().map(|e| e.kind().clone());
        assert_eq!(kind, Some(ErrorKind::Serialization));

        assert!(from_json_str("{").is_err());
        Ok(())
    }
}
