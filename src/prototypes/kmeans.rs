//! Seeded k-means (k-means++ initialisation, Lloyd iterations).
//!
//! Runs `n_init` independent initialisations from one seeded RNG and keeps the
//! lowest-inertia result, so identical input and seed give identical centroids.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::constants::KMEANS_TOLERANCE;
use crate::embedding::Matrix;

use super::error::{PrototypeError, PrototypeResult};

/// Result of one k-means fit.
#[derive(Debug, Clone)]
pub struct KMeansFit {
    pub centroids: Matrix,
    /// Cluster index per input row.
    pub labels: Vec<usize>,
    /// Sum of squared distances to the assigned centroid.
    pub inertia: f64,
    pub iterations: usize,
}

#[derive(Debug, Clone)]
pub struct KMeans {
    k: usize,
    seed: u64,
    n_init: usize,
    max_iter: usize,
}

impl KMeans {
    pub fn new(k: usize, seed: u64, n_init: usize, max_iter: usize) -> Self {
        Self {
            k,
            seed,
            n_init: n_init.max(1),
            max_iter: max_iter.max(1),
        }
    }

    /// Clusters the rows of `data` into `k` centroids. Requires `rows >= k >= 1`.
    pub fn fit(&self, data: &Matrix) -> PrototypeResult<KMeansFit> {
        let n = data.rows();
        if self.k == 0 || n < self.k {
            return Err(PrototypeError::InvalidInput {
                reason: format!("k-means needs at least k={} rows, got {}", self.k, n),
            });
        }

        let tol = KMEANS_TOLERANCE * mean_feature_variance(data);
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut best: Option<KMeansFit> = None;

        for run in 0..self.n_init {
            let init = init_plus_plus(data, self.k, &mut rng);
            let fit = self.lloyd(data, init, tol)?;
            debug!(run, inertia = fit.inertia, iterations = fit.iterations, "k-means run");
            if best.as_ref().is_none_or(|b| fit.inertia < b.inertia) {
                best = Some(fit);
            }
        }

        best.ok_or_else(|| PrototypeError::InvalidInput {
            reason: "k-means produced no result".to_string(),
        })
    }

    fn lloyd(&self, data: &Matrix, mut centroids: Vec<Vec<f64>>, tol: f64) -> PrototypeResult<KMeansFit> {
        let dim = data.dim();
        let n = data.rows();
        let mut labels = vec![0usize; n];
        let mut iterations = 0;

        for iter in 0..self.max_iter {
            iterations = iter + 1;
            assign(data, &centroids, &mut labels);

            let mut sums = vec![vec![0.0f64; dim]; self.k];
            let mut counts = vec![0usize; self.k];
            for (row, &c) in data.iter_rows().zip(&labels) {
                counts[c] += 1;
                for (s, &v) in sums[c].iter_mut().zip(row) {
                    *s += v as f64;
                }
            }

            // Empty clusters take the farthest point of a cluster that can spare one.
            for c in 0..self.k {
                if counts[c] > 0 {
                    continue;
                }
                let Some(far) = farthest_point(data, &centroids, &labels, &counts) else {
                    continue;
                };
                let old = labels[far];
                counts[old] -= 1;
                for (s, &v) in sums[old].iter_mut().zip(data.row(far)) {
                    *s -= v as f64;
                }
                labels[far] = c;
                counts[c] = 1;
                sums[c] = data.row(far).iter().map(|&v| v as f64).collect();
            }

            let mut shift = 0.0;
            for c in 0..self.k {
                // Still empty: keep the previous centroid.
                if counts[c] == 0 {
                    continue;
                }
                let count = counts[c] as f64;
                for (j, s) in sums[c].iter().enumerate() {
                    let updated = s / count;
                    shift += (updated - centroids[c][j]).powi(2);
                    centroids[c][j] = updated;
                }
            }

            if shift <= tol {
                break;
            }
        }

        assign(data, &centroids, &mut labels);
        let inertia = data
            .iter_rows()
            .zip(&labels)
            .map(|(row, &c)| sq_dist(row, &centroids[c]))
            .sum();

        let flat = centroids
            .into_iter()
            .flat_map(|c| c.into_iter().map(|v| v as f32))
            .collect();

        Ok(KMeansFit {
            centroids: Matrix::new(self.k, dim, flat)?,
            labels,
            inertia,
            iterations,
        })
    }
}

fn sq_dist(row: &[f32], centroid: &[f64]) -> f64 {
    row.iter()
        .zip(centroid)
        .map(|(&x, &c)| (x as f64 - c).powi(2))
        .sum()
}

fn nearest(row: &[f32], centroids: &[Vec<f64>]) -> (usize, f64) {
    centroids
        .iter()
        .enumerate()
        .map(|(i, c)| (i, sq_dist(row, c)))
        .fold((0, f64::INFINITY), |best, cur| if cur.1 < best.1 { cur } else { best })
}

fn assign(data: &Matrix, centroids: &[Vec<f64>], labels: &mut [usize]) {
    for (row, label) in data.iter_rows().zip(labels.iter_mut()) {
        *label = nearest(row, centroids).0;
    }
}

/// Farthest row from its centroid among clusters holding more than one row.
fn farthest_point(
    data: &Matrix,
    centroids: &[Vec<f64>],
    labels: &[usize],
    counts: &[usize],
) -> Option<usize> {
    data.iter_rows()
        .zip(labels)
        .enumerate()
        .filter(|(_, (_, c))| counts[**c] > 1)
        .map(|(i, (row, &c))| (i, sq_dist(row, &centroids[c])))
        .fold(None, |best: Option<(usize, f64)>, cur| match best {
            Some(b) if b.1 >= cur.1 => Some(b),
            _ => Some(cur),
        })
        .map(|(i, _)| i)
}

fn mean_feature_variance(data: &Matrix) -> f64 {
    let mean = data.mean_row();
    let n = data.rows().max(1) as f64;
    let total: f64 = data
        .iter_rows()
        .map(|row| {
            row.iter()
                .zip(&mean)
                .map(|(&x, &m)| (x as f64 - m as f64).powi(2))
                .sum::<f64>()
        })
        .sum();
    total / (n * data.dim() as f64)
}

/// k-means++: first centre uniform, the rest sampled proportionally to squared distance.
fn init_plus_plus(data: &Matrix, k: usize, rng: &mut StdRng) -> Vec<Vec<f64>> {
    let n = data.rows();
    let to_f64 = |row: &[f32]| row.iter().map(|&v| v as f64).collect::<Vec<f64>>();

    let mut centroids = Vec::with_capacity(k);
    centroids.push(to_f64(data.row(rng.gen_range(0..n))));

    let mut dists: Vec<f64> = data.iter_rows().map(|r| sq_dist(r, &centroids[0])).collect();

    while centroids.len() < k {
        let total: f64 = dists.iter().sum();
        let pick = if total > 0.0 {
            let mut target = rng.gen_range(0.0..total);
            let mut chosen = n - 1;
            for (i, &d) in dists.iter().enumerate() {
                if target < d {
                    chosen = i;
                    break;
                }
                target -= d;
            }
            chosen
        } else {
            rng.gen_range(0..n)
        };

        let centre = to_f64(data.row(pick));
        for (d, row) in dists.iter_mut().zip(data.iter_rows()) {
            *d = d.min(sq_dist(row, &centre));
        }
        centroids.push(centre);
    }

    centroids
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_blobs() -> Matrix {
        Matrix::from_rows(vec![
            vec![1.0, 0.0],
            vec![0.9, 0.1],
            vec![1.1, -0.1],
            vec![0.0, 1.0],
            vec![0.1, 0.9],
            vec![-0.1, 1.1],
        ])
        .unwrap()
    }

    #[test]
    fn test_separates_two_blobs() {
        let fit = KMeans::new(2, 42, 10, 300).fit(&two_blobs()).unwrap();

        assert_eq!(fit.labels[0], fit.labels[1]);
        assert_eq!(fit.labels[0], fit.labels[2]);
        assert_eq!(fit.labels[3], fit.labels[4]);
        assert_ne!(fit.labels[0], fit.labels[3]);

        let mut centroids = fit.centroids.to_rows();
        centroids.sort_by(|a, b| b[0].total_cmp(&a[0]));
        assert!((centroids[0][0] - 1.0).abs() < 1e-5);
        assert!((centroids[1][1] - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_deterministic_for_seed() {
        let a = KMeans::new(2, 7, 5, 100).fit(&two_blobs()).unwrap();
        let b = KMeans::new(2, 7, 5, 100).fit(&two_blobs()).unwrap();
        assert_eq!(a.centroids, b.centroids);
        assert_eq!(a.labels, b.labels);
    }

    #[test]
    fn test_identical_points() {
        let data = Matrix::from_rows(vec![vec![0.5, 0.5]; 4]).unwrap();
        let fit = KMeans::new(2, 42, 3, 50).fit(&data).unwrap();
        assert_eq!(fit.centroids.rows(), 2);
        assert!(fit.inertia.abs() < 1e-12);
        for row in fit.centroids.iter_rows() {
            assert_eq!(row, &[0.5, 0.5]);
        }
    }

    #[test]
    fn test_duplicate_rows_never_empty_a_singleton_cluster() {
        let data = Matrix::from_rows(vec![
            vec![1.0, 0.0],
            vec![0.0, 1.0],
            vec![0.0, 1.0],
        ])
        .unwrap();

        for max_iter in 1..=6 {
            let fit = KMeans::new(3, 1, 1, max_iter).fit(&data).unwrap();
            assert!(
                fit.centroids.as_slice().iter().all(|v| v.is_finite()),
                "max_iter={} centroids={:?}",
                max_iter,
                fit.centroids
            );
        }
        let a = KMeans::new(3, 1, 1, 301).fit(&data).unwrap();
        let b = KMeans::new(3, 1, 1, 300).fit(&data).unwrap();
        assert!(a.centroids.as_slice().iter().all(|v| v.is_finite()));
        assert!(b.centroids.as_slice().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_too_few_rows() {
        let data = Matrix::from_rows(vec![vec![1.0, 0.0]]).unwrap();
        assert!(KMeans::new(2, 42, 1, 10).fit(&data).is_err());
    }
}
