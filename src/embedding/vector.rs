use crate::constants::{COSINE_EPSILON, UNIT_NORM_TOLERANCE};

#[inline]
pub fn dot(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(&x, &y)| x as f64 * y as f64)
        .sum()
}

#[inline]
pub fn l2_norm(v: &[f32]) -> f32 {
    dot(v, v).sqrt() as f32
}

/// Divides `v` by `(‖v‖ + COSINE_EPSILON)`. A zero vector stays zero.
pub fn normalize_in_place(v: &mut [f32]) {
    let denom = dot(v, v).sqrt() + COSINE_EPSILON;
    for x in v.iter_mut() {
        *x = (*x as f64 / denom) as f32;
    }
}

pub fn normalized(v: &[f32]) -> Vec<f32> {
    let mut out = v.to_vec();
    normalize_in_place(&mut out);
    out
}

/// Checks the encoder's unit-norm contract within [`UNIT_NORM_TOLERANCE`].
pub fn is_unit_norm(v: &[f32]) -> bool {
    (l2_norm(v) - 1.0).abs() <= UNIT_NORM_TOLERANCE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_has_unit_norm() {
        let v = normalized(&[3.0, 4.0, 12.0]);
        assert!(is_unit_norm(&v));
        assert!((l2_norm(&v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_vector_stays_zero() {
        let v = normalized(&[0.0, 0.0]);
        assert_eq!(v, vec![0.0, 0.0]);
        assert!(!is_unit_norm(&v));
    }

    #[test]
    fn test_dot() {
        assert_eq!(dot(&[1.0, 2.0], &[3.0, 4.0]), 11.0);
    }
}
