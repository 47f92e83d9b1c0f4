//! Exposure of model parameters as flat numeric vectors.
//!
//! A black-box optimizer does not know anything about centers, widths or slopes.
//! It only sees a flat vector of `f64` values. `Parameterizable` defines how a
//! parameter object lays out its values in such a vector, and which contiguous
//! blocks of that vector are currently subject to optimization.
use crate::{ErrorKind, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Labels of the parameter blocks that are currently exposed to an optimizer.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    labels: BTreeSet<String>,
}
impl Selection {
    /// Makes an empty `Selection` instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the block labeled `label` is selected.
    pub fn contains(&self, label: &str) -> bool {
        self.labels.contains(label)
    }

    /// Returns `true` if no block is selected.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Returns an iterator over the selected labels in lexicographic order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(|l| l.as_str())
    }

    fn replace(&mut self, labels: BTreeSet<String>) {
        self.labels = labels;
    }
}

/// This trait allows for exposing parameters as a flat vector.
///
/// The all-values vector is a concatenation of labeled blocks, in the order
/// given by `parameter_layout`. Implementors provide the layout and the raw
/// get/set of that vector; selection and masking are provided on top.
pub trait Parameterizable {
    /// Returns the label and the length of each block of the all-values vector.
    fn parameter_layout(&self) -> Vec<(&'static str, usize)>;

    /// Returns all parameter values as a flat vector.
    fn parameter_vector_all(&self) -> Vec<f64>;

    /// Overwrites all parameter values.
    ///
    /// # Errors
    ///
    /// If the length of `values` differs from `parameter_vector_all_size()`,
    /// or if the new values break an invariant of the implementor,
    /// an `ErrorKind::InvalidInput` error is returned and `self` is left unchanged.
    fn set_parameter_vector_all(&mut self, values: &[f64]) -> Result<()>;

    /// Returns the current selection.
    fn selection(&self) -> &Selection;

    /// Returns a mutable reference to the current selection.
    fn selection_mut(&mut self) -> &mut Selection;

    /// Returns the labels that may be passed to `select_parameters`.
    fn selectable_parameters(&self) -> Vec<&'static str> {
        self.parameter_layout()
            .into_iter()
            .map(|(label, _)| label)
            .collect()
    }

    /// Returns the length of the all-values vector.
    fn parameter_vector_all_size(&self) -> usize {
        self.parameter_layout().into_iter().map(|(_, n)| n).sum()
    }

    /// Selects the blocks to be exposed by `parameter_vector_selected`.
    ///
    /// # Errors
    ///
    /// If one of `labels` is not selectable, an `ErrorKind::InvalidInput` error is returned
    /// and the previous selection is kept.
    fn select_parameters(&mut self, labels: &[&str]) -> Result<()> {
        let selectable = self.selectable_parameters();
        let mut selected = BTreeSet::new();
        for label in labels {
            track_assert!(
                selectable.iter().any(|s| s == label),
                ErrorKind::InvalidInput;
                label,
                selectable
            );
            selected.insert((*label).to_owned());
        }
        self.selection_mut().replace(selected);
        Ok(())
    }

    /// Returns a mask over the all-values vector.
    ///
    /// An element is `0` if its block is not selected, otherwise it is the
    /// 1-based position of its block label in `parameter_layout()`.
    fn parameter_vector_mask(&self) -> Vec<usize> {
        let selection = self.selection();
        let mut mask = Vec::with_capacity(self.parameter_vector_all_size());
        for (i, (label, n)) in self.parameter_layout().into_iter().enumerate() {
            let v = if selection.contains(label) { i + 1 } else { 0 };
            mask.extend(std::iter::repeat(v).take(n));
        }
        mask
    }

    /// Returns the length of the selected-values vector.
    fn parameter_vector_selected_size(&self) -> usize {
        self.parameter_vector_mask()
            .into_iter()
            .filter(|&m| m != 0)
            .count()
    }

    /// Returns the values of the selected blocks as a flat vector.
    fn parameter_vector_selected(&self) -> Vec<f64> {
        self.parameter_vector_all()
            .into_iter()
            .zip(self.parameter_vector_mask())
            .filter(|&(_, m)| m != 0)
            .map(|(v, _)| v)
            .collect()
    }

    /// Overwrites the values of the selected blocks, leaving the others untouched.
    ///
    /// # Errors
    ///
    /// If the length of `values` differs from `parameter_vector_selected_size()`,
    /// an `ErrorKind::InvalidInput` error is returned.
    fn set_parameter_vector_selected(&mut self, values: &[f64]) -> Result<()> {
        let mask = self.parameter_vector_mask();
        let expected = mask.iter().filter(|&&m| m != 0).count();
        track_assert_eq!(values.len(), expected, ErrorKind::InvalidInput);

        let mut all = self.parameter_vector_all();
        let mut values = values.iter();
        for (a, _) in all.iter_mut().zip(mask).filter(|&(_, m)| m != 0) {
            *a = *values.next().unwrap_or_else(|| unreachable!());
        }
        track!(self.set_parameter_vector_all(&all))
    }
}

/// Splits a flat vector into consecutive blocks of the given lengths.
pub(crate) fn split_blocks<'a>(
    values: &'a [f64],
    lengths: &[usize],
) -> Result<Vec<&'a [f64]>> {
    let total: usize = lengths.iter().sum();
    track_assert_eq!(values.len(), total, ErrorKind::InvalidInput);

    let mut blocks = Vec::with_capacity(lengths.len());
    let mut rest = values;
    for &n in lengths {
        let (block, tail) = rest.split_at(n);
        blocks.push(block);
        rest = tail;
    }
    Ok(blocks)
}
