//! Shape and value checks shared by the concrete parameter types.
use crate::{Error, ErrorKind, Result};
use ndarray::{Array1, Array2};
use trackable::error::ErrorKindExt;

pub(crate) fn check_finite<'a, I>(name: &str, values: I) -> Result<()>
where
    I: IntoIterator<Item = &'a f64>,
{
    for v in values {
        track_assert!(v.is_finite(), ErrorKind::InvalidInput; name, v);
    }
    Ok(())
}

/// Checks `centers` and `widths` of `n_basis_functions × n_dims` kernels.
pub(crate) fn check_kernels(centers: &Array2<f64>, widths: &Array2<f64>) -> Result<()> {
    track_assert!(centers.nrows() >= 1, ErrorKind::InvalidInput; centers.dim());
    track_assert!(centers.ncols() >= 1, ErrorKind::InvalidInput; centers.dim());
    track_assert_eq!(centers.dim(), widths.dim(), ErrorKind::InvalidInput);
    track!(check_finite("centers", centers.iter()))?;
    for w in widths.iter() {
        track_assert!(w.is_finite() && *w > 0.0, ErrorKind::InvalidInput; w);
    }
    Ok(())
}

pub(crate) fn check_matrix_shape(
    name: &str,
    matrix: &Array2<f64>,
    shape: (usize, usize),
) -> Result<()> {
    track_assert_eq!(matrix.dim(), shape, ErrorKind::InvalidInput; name);
    track!(check_finite(name, matrix.iter()))
}

pub(crate) fn check_vector_len(name: &str, vector: &Array1<f64>, len: usize) -> Result<()> {
    track_assert_eq!(vector.len(), len, ErrorKind::InvalidInput; name);
    track!(check_finite(name, vector.iter()))
}

pub(crate) fn matrix_from_block(block: &[f64], shape: (usize, usize)) -> Result<Array2<f64>> {
    Array2::from_shape_vec(shape, block.to_vec())
        .map_err(|e| Error::from(ErrorKind::InvalidInput.cause(e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn check_kernels_works() {
        let centers = array![[0.0], [1.0]];
        assert!(check_kernels(&centers, &array![[0.5], [0.5]]).is_ok());
        assert!(check_kernels(&centers, &array![[0.5], [0.0]]).is_err());
        assert!(check_kernels(&centers, &array![[0.5, 0.5], [0.5, 0.5]]).is_err());
        assert!(check_kernels(&array![[std::f64::NAN]], &array![[1.0]]).is_err());
        assert!(check_kernels(&Array2::zeros((0, 1)), &Array2::zeros((0, 1))).is_err());
    }

    #[test]
    fn matrix_from_block_is_row_major() {
        let m = matrix_from_block(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], (2, 3)).ok();
        assert_eq!(m, Some(array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]));
        assert!(matrix_from_block(&[1.0], (2, 3)).is_err());
    }
}
