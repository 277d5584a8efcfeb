//! Sparse incidence relations between simplices of two ranks.
//!
//! An [`Incidence`] of shape `[n_lower, n_upper]` has a non-zero entry `(i, j)`
//! when lower simplex `i` lies on the boundary of upper simplex `j`. `B2`
//! (edges × faces) is the relation the template layer is built on.
//!
//! The relation is held as a `nalgebra_sparse` CSR matrix. candle has no
//! sparse tensor type, so aggregation goes through `index_select` /
//! `index_add` on the index tensors produced here.

use candle_core::{DType, Device, Tensor};
use nalgebra as na;
use nalgebra_sparse as nas;

use crate::error::{Error, Result};

/// Immutable sparse relation. Explicit zeros are never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct Incidence {
    matrix: nas::CsrMatrix<f32>,
}

impl Incidence {
    /// Build a relation from `(row, col, value)` triplets.
    ///
    /// Duplicate coordinates are summed and entries that end up zero are dropped.
    pub fn from_triplets<I>(rows: usize, cols: usize, entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (usize, usize, f32)>,
    {
        let mut row_indices = Vec::new();
        let mut col_indices = Vec::new();
        let mut values = Vec::new();
        for (row, col, value) in entries {
            if row >= rows || col >= cols {
                return Err(Error::IndexOutOfBounds {
                    row,
                    col,
                    rows,
                    cols,
                });
            }
            row_indices.push(row);
            col_indices.push(col);
            values.push(value);
        }
        let coo = nas::CooMatrix::try_from_triplets(rows, cols, row_indices, col_indices, values)?;
        Ok(Self::from_csr(nas::CsrMatrix::from(&coo)))
    }

    /// Binary relation: every listed coordinate gets value `1.0`.
    pub fn from_pairs<I>(rows: usize, cols: usize, pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        Self::from_triplets(rows, cols, pairs.into_iter().map(|(r, c)| (r, c, 1.0)))
    }

    /// Wrap an existing CSR matrix, dropping explicit zeros.
    pub fn from_csr(matrix: nas::CsrMatrix<f32>) -> Self {
        Self {
            matrix: matrix.filter(|_, _, v| *v != 0.0),
        }
    }

    /// Re-sparsify a dense rank-2 tensor, keeping its non-zero entries.
    pub fn from_dense(dense: &Tensor) -> Result<Self> {
        let (rows, cols) = dense.dims2()?;
        let data = dense.to_dtype(DType::F32)?.to_vec2::<f32>()?.concat();
        let dense = na::DMatrix::from_row_slice(rows, cols, &data);
        Ok(Self::from_csr(nas::CsrMatrix::from(&dense)))
    }

    /// Dense `[rows, cols]` f32 tensor on `device`.
    pub fn to_dense(&self, device: &Device) -> Result<Tensor> {
        let cols = self.cols();
        let mut data = vec![0f32; self.rows() * cols];
        for (r, c, v) in self.matrix.triplet_iter() {
            data[r * cols + c] = *v;
        }
        Ok(Tensor::from_vec(data, (self.rows(), cols), device)?)
    }

    /// Exact sparse transpose.
    #[must_use]
    pub fn transpose(&self) -> Self {
        Self {
            matrix: self.matrix.transpose(),
        }
    }

    pub fn as_csr(&self) -> &nas::CsrMatrix<f32> {
        &self.matrix
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows(), self.cols())
    }

    /// Number of lower-rank simplices (target side of aggregation).
    pub fn rows(&self) -> usize {
        self.matrix.nrows()
    }

    /// Number of upper-rank simplices (source side of aggregation).
    pub fn cols(&self) -> usize {
        self.matrix.ncols()
    }

    pub fn nnz(&self) -> usize {
        self.matrix.nnz()
    }

    /// Stored entries in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, f32)> + '_ {
        self.matrix.triplet_iter().map(|(r, c, v)| (r, c, *v))
    }

    /// Per-row sum of values. For a binary relation this is the neighborhood
    /// size; signed relations can cancel to zero.
    pub fn row_sums(&self) -> Vec<f32> {
        self.matrix
            .row_iter()
            .map(|row| row.values().iter().sum())
            .collect()
    }

    pub(crate) fn row_index(&self, device: &Device) -> Result<Tensor> {
        let idx: Vec<u32> = self.iter().map(|(r, _, _)| r as u32).collect();
        Ok(Tensor::from_vec(idx, self.nnz(), device)?)
    }

    pub(crate) fn col_index(&self, device: &Device) -> Result<Tensor> {
        let idx: Vec<u32> = self.iter().map(|(_, c, _)| c as u32).collect();
        Ok(Tensor::from_vec(idx, self.nnz(), device)?)
    }

    /// Values as a `[nnz, 1]` column, ready to broadcast over channels.
    pub(crate) fn value_column(&self, device: &Device) -> Result<Tensor> {
        Ok(Tensor::from_slice(
            self.matrix.values(),
            (self.nnz(), 1),
            device,
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::bowtie;

    #[test]
    fn triplets_are_sorted_and_merged() {
        let inc =
            Incidence::from_triplets(2, 2, [(1, 0, 1.0), (0, 1, 2.0), (1, 0, 0.5), (0, 0, 0.0)])
                .unwrap();
        let entries: Vec<_> = inc.iter().collect();
        assert_eq!(entries, vec![(0, 1, 2.0), (1, 0, 1.5)]);
        assert_eq!(inc.nnz(), 2);
    }

    #[test]
    fn cancelling_duplicates_are_dropped() {
        let inc = Incidence::from_triplets(2, 2, [(0, 0, 1.0), (0, 0, -1.0), (1, 1, 2.0)]).unwrap();
        assert_eq!(inc.iter().collect::<Vec<_>>(), vec![(1, 1, 2.0)]);
    }

    #[test]
    fn out_of_bounds_entry_is_rejected() {
        let err = Incidence::from_pairs(2, 2, [(0, 2)]).unwrap_err();
        assert!(matches!(err, Error::IndexOutOfBounds { row: 0, col: 2, .. }));
    }

    #[test]
    fn dense_roundtrip_preserves_entries() {
        let inc = bowtie();
        let dense = inc.to_dense(&Device::Cpu).unwrap();
        assert_eq!(dense.dims(), &[5, 2]);
        let back = Incidence::from_dense(&dense).unwrap();
        assert_eq!(back, inc);
    }

    #[test]
    fn transpose_swaps_coordinates() {
        let inc = bowtie();
        let t = inc.transpose();
        assert_eq!(t.shape(), (2, 5));
        for (r, c, v) in inc.iter() {
            assert!(t.iter().any(|e| e == (c, r, v)));
        }
        assert_eq!(t.transpose(), inc);
    }

    #[test]
    fn dense_transpose_matches_sparse_transpose() {
        let inc = bowtie();
        let dense_t = inc.to_dense(&Device::Cpu).unwrap().t().unwrap();
        assert_eq!(Incidence::from_dense(&dense_t).unwrap(), inc.transpose());
    }

    #[test]
    fn row_sums_count_neighbors() {
        assert_eq!(bowtie().row_sums(), vec![1.0, 1.0, 2.0, 1.0, 1.0]);
        assert_eq!(bowtie().transpose().row_sums(), vec![3.0, 3.0]);
    }

    #[test]
    fn signed_rows_can_sum_to_zero() {
        let inc = Incidence::from_triplets(2, 2, [(0, 0, 1.0), (1, 0, -1.0), (1, 1, 1.0)]).unwrap();
        assert_eq!(inc.row_sums(), vec![1.0, 0.0]);
        assert_eq!(inc.nnz(), 3);
    }

    #[test]
    fn index_tensors_follow_stored_order() {
        let inc = bowtie();
        let rows = inc.row_index(&Device::Cpu).unwrap().to_vec1::<u32>().unwrap();
        let cols = inc.col_index(&Device::Cpu).unwrap().to_vec1::<u32>().unwrap();
        assert_eq!(rows, vec![0, 1, 2, 2, 3, 4]);
        assert_eq!(cols, vec![0, 0, 0, 1, 1, 1]);
        assert_eq!(inc.value_column(&Device::Cpu).unwrap().dims(), &[6, 1]);
    }
}
