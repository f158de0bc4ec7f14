//! Deterministic synthetic embeddings.
//!
//! User `u` lives around a unit centre spread evenly over dimensions
//! `[u * BLOCK, (u + 1) * BLOCK)`, so centres of different users are orthogonal.

use neurokey::embedding::Matrix;
use neurokey::embedding::vector::normalized;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const DIM: usize = 32;
pub const BLOCK: usize = 4;
pub const MAX_USERS: usize = DIM / BLOCK;
pub const NOISE: f32 = 0.08;

pub fn axis(i: usize) -> Vec<f32> {
    let mut v = vec![0.0; DIM];
    v[i] = 1.0;
    v
}

pub fn centre(user: usize) -> Vec<f32> {
    assert!(user < MAX_USERS, "only {} users fit in {} dims", MAX_USERS, DIM);
    let mut v = vec![0.0; DIM];
    for x in &mut v[user * BLOCK..(user + 1) * BLOCK] {
        *x = 1.0;
    }
    normalized(&v)
}

/// `n` noisy unit-norm samples around `user`'s centre.
pub fn samples(user: usize, n: usize, seed: u64) -> Matrix {
    let mut rng = StdRng::seed_from_u64(seed ^ ((user as u64) << 32));
    let c = centre(user);
    let rows = (0..n)
        .map(|_| {
            let v: Vec<f32> = c.iter().map(|x| x + rng.gen_range(-NOISE..NOISE)).collect();
            normalized(&v)
        })
        .collect();
    Matrix::from_rows(rows).expect("fixture rows share a width")
}

/// Unit vectors with no relation to any user centre.
pub fn random_units(n: usize, seed: u64) -> Matrix {
    let mut rng = StdRng::seed_from_u64(seed);
    let rows = (0..n)
        .map(|_| {
            let v: Vec<f32> = (0..DIM).map(|_| rng.gen_range(-1.0..1.0)).collect();
            normalized(&v)
        })
        .collect();
    Matrix::from_rows(rows).expect("fixture rows share a width")
}
