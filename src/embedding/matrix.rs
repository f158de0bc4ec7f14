//! Dense row-major `f32` matrix used for enrollment embeddings and prototype sets.

use rkyv::{Archive, Deserialize as RkyvDeserialize, Serialize as RkyvSerialize};
use serde::{Deserialize, Serialize};

use super::error::{EmbeddingError, EmbeddingResult};
use super::vector::{l2_norm, normalize_in_place};

/// Row-major matrix of `rows × dim` floats.
///
/// Prototype sets are `k × D`; enrollment batches are `n × D`.
///
/// # Example
/// ```rust
/// use neurokey::Matrix;
///
/// let m = Matrix::from_rows(vec![vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap();
/// assert_eq!(m.rows(), 2);
/// assert_eq!(m.row(1), &[0.0, 1.0]);
/// ```
#[derive(
    Archive, RkyvDeserialize, RkyvSerialize, Serialize, Deserialize, Debug, Clone, PartialEq,
)]
#[serde(try_from = "RawMatrix")]
pub struct Matrix {
    rows: u32,
    dim: u32,
    data: Vec<f32>,
}

/// Unchecked serde form; converted through [`Matrix::new`].
#[derive(Deserialize)]
struct RawMatrix {
    rows: usize,
    dim: usize,
    data: Vec<f32>,
}

impl TryFrom<RawMatrix> for Matrix {
    type Error = EmbeddingError;

    fn try_from(raw: RawMatrix) -> EmbeddingResult<Self> {
        Matrix::new(raw.rows, raw.dim, raw.data)
    }
}

impl Matrix {
    /// Wraps a flat buffer. `data.len()` must equal `rows * dim`.
    pub fn new(rows: usize, dim: usize, data: Vec<f32>) -> EmbeddingResult<Self> {
        if dim == 0 {
            return Err(EmbeddingError::InvalidShape {
                reason: "dimension must be non-zero".to_string(),
            });
        }
        if data.len() != rows * dim {
            return Err(EmbeddingError::InvalidShape {
                reason: format!(
                    "buffer holds {} values, expected {} ({} x {})",
                    data.len(),
                    rows * dim,
                    rows,
                    dim
                ),
            });
        }
        Ok(Self {
            rows: rows as u32,
            dim: dim as u32,
            data,
        })
    }

    /// Builds a matrix from equally sized rows.
    pub fn from_rows(rows: Vec<Vec<f32>>) -> EmbeddingResult<Self> {
        let dim = rows.first().map(Vec::len).unwrap_or(0);
        let n = rows.len();
        let mut data = Vec::with_capacity(n * dim);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != dim {
                return Err(EmbeddingError::InvalidShape {
                    reason: format!("row {} has {} values, expected {}", i, row.len(), dim),
                });
            }
            data.extend(row);
        }
        Self::new(n, dim, data)
    }

    /// Builds a matrix with `k` copies of `row`.
    pub fn replicate(row: &[f32], k: usize) -> EmbeddingResult<Self> {
        let data = row.iter().copied().cycle().take(row.len() * k).collect();
        Self::new(k, row.len(), data)
    }

    pub fn rows(&self) -> usize {
        self.rows as usize
    }

    pub fn dim(&self) -> usize {
        self.dim as usize
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }

    /// Returns row `i`. Panics if `i >= rows()`.
    pub fn row(&self, i: usize) -> &[f32] {
        let dim = self.dim();
        &self.data[i * dim..(i + 1) * dim]
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[f32]> {
        self.data.chunks_exact(self.dim())
    }

    pub fn to_rows(&self) -> Vec<Vec<f32>> {
        self.iter_rows().map(<[f32]>::to_vec).collect()
    }

    /// Column-wise mean (accumulated in `f64`).
    pub fn mean_row(&self) -> Vec<f32> {
        let dim = self.dim();
        let mut acc = vec![0.0f64; dim];
        for row in self.iter_rows() {
            for (a, &v) in acc.iter_mut().zip(row) {
                *a += v as f64;
            }
        }
        let n = self.rows().max(1) as f64;
        acc.into_iter().map(|a| (a / n) as f32).collect()
    }

    /// Column-wise median; even counts average the two middle values.
    pub fn median_row(&self) -> Vec<f32> {
        let n = self.rows();
        (0..self.dim())
            .map(|j| {
                let mut column: Vec<f32> = self.iter_rows().map(|r| r[j]).collect();
                column.sort_by(f32::total_cmp);
                match n {
                    0 => 0.0,
                    _ if n % 2 == 1 => column[n / 2],
                    _ => ((column[n / 2 - 1] as f64 + column[n / 2] as f64) / 2.0) as f32,
                }
            })
            .collect()
    }

    /// Appends rows from `other`; dimensions must match.
    pub fn append(&mut self, other: &Matrix) -> EmbeddingResult<()> {
        if other.dim != self.dim {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dim(),
                actual: other.dim(),
            });
        }
        self.data.extend_from_slice(&other.data);
        self.rows += other.rows;
        Ok(())
    }

    /// Divides each row by `(‖row‖ + epsilon)`.
    pub fn normalize_rows(&mut self) {
        let dim = self.dim();
        for row in self.data.chunks_exact_mut(dim) {
            normalize_in_place(row);
        }
    }

    /// L2 norm of every row.
    pub fn row_norms(&self) -> Vec<f32> {
        self.iter_rows().map(l2_norm).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_wrong_length() {
        assert!(Matrix::new(2, 3, vec![0.0; 5]).is_err());
        assert!(Matrix::new(1, 0, vec![]).is_err());
    }

    #[test]
    fn test_json_goes_through_shape_checks() {
        assert!(serde_json::from_str::<Matrix>(r#"{"rows":1,"dim":0,"data":[]}"#).is_err());
        assert!(serde_json::from_str::<Matrix>(r#"{"rows":2,"dim":2,"data":[1.0]}"#).is_err());

        let m = Matrix::from_rows(vec![vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap();
        let back: Matrix = serde_json::from_str(&serde_json::to_string(&m).unwrap()).unwrap();
        assert_eq!(back, m);
    }

    #[test]
    fn test_from_rows_rejects_ragged() {
        let err = Matrix::from_rows(vec![vec![1.0, 2.0], vec![1.0]]).unwrap_err();
        assert!(matches!(err, EmbeddingError::InvalidShape { .. }));
    }

    #[test]
    fn test_replicate() {
        let m = Matrix::replicate(&[0.5, 0.25], 3).unwrap();
        assert_eq!(m.rows(), 3);
        for row in m.iter_rows() {
            assert_eq!(row, &[0.5, 0.25]);
        }
    }

    #[test]
    fn test_mean_and_median() {
        let m = Matrix::from_rows(vec![vec![1.0, 10.0], vec![2.0, 20.0], vec![6.0, 30.0]])
            .unwrap();
        assert_eq!(m.mean_row(), vec![3.0, 20.0]);
        assert_eq!(m.median_row(), vec![2.0, 20.0]);

        let even = Matrix::from_rows(vec![vec![1.0], vec![3.0]]).unwrap();
        assert_eq!(even.median_row(), vec![2.0]);
    }

    #[test]
    fn test_append_checks_dim() {
        let mut a = Matrix::from_rows(vec![vec![1.0, 0.0]]).unwrap();
        let b = Matrix::from_rows(vec![vec![0.0, 1.0]]).unwrap();
        a.append(&b).unwrap();
        assert_eq!(a.rows(), 2);

        let c = Matrix::from_rows(vec![vec![1.0]]).unwrap();
        assert!(a.append(&c).is_err());
    }

    #[test]
    fn test_normalize_rows() {
        let mut m = Matrix::from_rows(vec![vec![3.0, 4.0], vec![0.0, 2.0]]).unwrap();
        m.normalize_rows();
        for norm in m.row_norms() {
            assert!((norm - 1.0).abs() < 1e-6);
        }
    }
}
