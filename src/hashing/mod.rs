//! BLAKE3 helpers for artifact integrity and deterministic seeding.

use blake3::Hasher;

use crate::embedding::Trial;

/// Full 32-byte digest of an artifact payload.
#[inline]
pub fn hash_payload(payload: &[u8]) -> [u8; 32] {
    *blake3::hash(payload).as_bytes()
}

/// Hashes a trial's shape and samples.
pub fn hash_trial(trial: &Trial) -> u64 {
    let mut hasher = Hasher::new();
    hasher.update(&(trial.channels as u64).to_le_bytes());
    hasher.update(&(trial.samples as u64).to_le_bytes());
    for v in &trial.data {
        hasher.update(&v.to_le_bytes());
    }
    let hash = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[0..8]);
    u64::from_le_bytes(bytes)
}

/// Short hex fingerprint of an embedding, safe to log instead of the raw vector.
pub fn embedding_fingerprint(embedding: &[f32]) -> String {
    let mut hasher = Hasher::new();
    for v in embedding {
        hasher.update(&v.to_le_bytes());
    }
    hasher.finalize().to_hex()[..16].to_string()
}
